pub mod api;
pub mod auth;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use dockwatch_core::{AccessPolicy, ContainerReader};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::feed::SharedFeed;

/// Request-handling knobs taken from [`ServerConfig`].
#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub identity_header: String,
    pub log_tail_lines: usize,
    pub enable_execute: bool,
}

impl From<&ServerConfig> for ApiSettings {
    fn from(config: &ServerConfig) -> Self {
        Self {
            identity_header: config.identity_header.clone(),
            log_tail_lines: config.log_tail_lines,
            enable_execute: config.enable_execute,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub reader: ContainerReader,
    pub policy: AccessPolicy,
    pub feed: SharedFeed,
    pub settings: Arc<ApiSettings>,
}

impl AppState {
    pub fn new(
        reader: ContainerReader,
        policy: AccessPolicy,
        feed: SharedFeed,
        settings: ApiSettings,
    ) -> Self {
        Self {
            reader,
            policy,
            feed,
            settings: Arc::new(settings),
        }
    }
}

/// Full application router: API under `/api`, docs under `/api/docs`.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/api/docs").url("/api/openapi.json", api::openapi()))
        .nest("/api", api::router(&state))
        .with_state(state)
}

pub fn spawn_http_server(
    addr: SocketAddr,
    state: AppState,
    shutdown_tx: broadcast::Sender<()>,
) -> JoinHandle<Result<(), ServerError>> {
    let app = app(state);
    let shutdown_rx = shutdown_tx.subscribe();
    tokio::spawn(async move {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;
        // Port 0 binds resolve to the real port here.
        let addr = listener.local_addr().unwrap_or(addr);
        serve(listener, addr, app, shutdown_rx).await
    })
}

pub async fn serve(
    listener: tokio::net::TcpListener,
    addr: SocketAddr,
    app: Router,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), ServerError> {
    tracing::info!("HTTP server listening on http://{}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.recv().await;
        })
        .await
        .map_err(|source| ServerError::Serve { addr, source })
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use dockwatch_core::fixtures::MockExecutor;
    use dockwatch_core::{AccessRegistry, AllowList};
    use tower::ServiceExt;

    use super::*;
    use crate::feed::DashboardFeed;

    fn test_state() -> AppState {
        AppState::new(
            ContainerReader::new(Arc::new(MockExecutor::new())),
            AccessPolicy::new(AllowList::parse("alice"), Arc::new(AccessRegistry::new())),
            DashboardFeed::new().shared(),
            ApiSettings::from(&ServerConfig::default()),
        )
    }

    fn test_app() -> Router {
        app(test_state())
    }

    #[tokio::test]
    async fn http_server_stops_on_shutdown() {
        let (shutdown_tx, _) = broadcast::channel(1);
        let handle = spawn_http_server(
            SocketAddr::from(([127, 0, 0, 1], 0)),
            test_state(),
            shutdown_tx.clone(),
        );
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        shutdown_tx.send(()).unwrap();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn serves_openapi_document() {
        let response = test_app()
            .oneshot(
                Request::builder()
                    .uri("/api/openapi.json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn only_the_identity_header_identifies() {
        let response = test_app()
            .oneshot(
                Request::builder()
                    .uri("/api/current-user")
                    .header("x-forwarded-user", "alice")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = test_app()
            .oneshot(
                Request::builder()
                    .uri("/api/current-user")
                    .header(crate::config::DEFAULT_IDENTITY_HEADER, "alice")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
