pub mod access;
pub mod admin;
pub mod api;
pub mod container;
pub mod docker;
pub mod executor;
pub mod reader;
pub mod reconcile;

#[cfg(any(feature = "test-fixtures", test))]
pub mod fixtures;

pub use access::{AccessError, AccessGrant, AccessPolicy, AccessRegistry, AllowList};
pub use admin::{AdminCommand, AdminCommandError};
pub use container::{ContainerListing, ContainerRecord, ParseError};
pub use executor::{CommandOutput, ExecError, RemoteExecutor};
pub use reader::{ContainerReader, ReadError};
pub use reconcile::{ContainerView, CycleOutcome, Dashboard, DashboardEvent, LogTail, poll_once};
