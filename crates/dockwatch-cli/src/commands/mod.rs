pub mod access;
pub mod admin;
pub mod containers;
pub mod exec;
pub mod logs;
pub mod serve;
pub mod watch;
pub mod whoami;
