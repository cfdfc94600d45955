//! Shared helpers for the HTTP integration tests.
//!
//! Each integration test compiles this module separately, so some helpers
//! appear unused in some test binaries.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use dockwatch_core::fixtures::MockExecutor;
use dockwatch_core::{AccessPolicy, AccessRegistry, AllowList, ContainerReader};
use dockwatch_server::http::{self, ApiSettings, AppState};
use dockwatch_server::{DashboardFeed, Poller, SharedFeed};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

pub const IDENTITY_HEADER: &str = "x-auth-request-user";
pub const ADMIN: &str = "alice";

pub const WEB_LINE: &str = "abc123def4567890\tnginx:latest\tUp 2 hours\tweb-1\trunning";
pub const WORKER_LINE: &str =
    "def456\tapp:1.2\tExited (0) 3 hours ago\tworker-1\texited";
pub const PORTAINER_LINE: &str = "fff000\tportainer/agent\tUp 5 days\tportainer-agent\trunning";

pub struct TestServer {
    pub addr: SocketAddr,
    pub mock: Arc<MockExecutor>,
    pub policy: AccessPolicy,
    pub feed: SharedFeed,
    pub reader: ContainerReader,
    server: JoinHandle<()>,
}

impl TestServer {
    pub async fn start(enable_execute: bool) -> Self {
        let mock = Arc::new(MockExecutor::new());
        let reader = ContainerReader::new(mock.clone());
        let policy = AccessPolicy::new(AllowList::parse(ADMIN), Arc::new(AccessRegistry::new()));
        let feed = DashboardFeed::new().shared();
        let settings = ApiSettings {
            identity_header: IDENTITY_HEADER.to_string(),
            log_tail_lines: 10,
            enable_execute,
        };
        let state = AppState::new(reader.clone(), policy.clone(), feed.clone(), settings);

        let app = http::app(state);
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", 0))
            .await
            .expect("bind listener");
        let addr = listener.local_addr().expect("local addr");
        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve");
        });

        Self {
            addr,
            mock,
            policy,
            feed,
            reader,
            server,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    pub fn get(&self, path: &str, user: Option<&str>) -> reqwest::RequestBuilder {
        with_user(reqwest::Client::new().get(self.url(path)), user)
    }

    pub fn post(&self, path: &str, user: Option<&str>) -> reqwest::RequestBuilder {
        with_user(reqwest::Client::new().post(self.url(path)), user)
    }

    /// Run one reconciliation cycle against the shared feed.
    pub async fn poll(&self) -> usize {
        let (_tx, rx) = broadcast::channel(1);
        Poller::new(
            self.reader.clone(),
            self.feed.clone(),
            Duration::from_secs(60),
            10,
            rx,
        )
        .run_cycle()
        .await
    }

    pub async fn stop(self) {
        self.server.abort();
        let _ = self.server.await;
    }
}

fn with_user(req: reqwest::RequestBuilder, user: Option<&str>) -> reqwest::RequestBuilder {
    match user {
        Some(user) => req.header(IDENTITY_HEADER, user),
        None => req,
    }
}
