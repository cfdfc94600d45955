use axum::body::Bytes;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router, middleware};
use dockwatch_core::access::DEFAULT_GRANT_HOURS;
use dockwatch_core::api::{
    CurrentUserResponse, DashboardSnapshot, ErrorBody, EventsPage, ExecuteRequest, GrantRequest,
    GrantResponse, HealthResponse, LogsResponse, MessageResponse, RevokeRequest,
};
use dockwatch_core::docker::validate_container_id;
use dockwatch_core::{AccessGrant, CommandOutput, ContainerRecord, ReadError};
use serde::Deserialize;
use utoipa::{IntoParams, OpenApi};

use super::AppState;
use super::auth::{self, CurrentUser};

/// Upper bound for `?lines=` on the logs endpoint.
pub const MAX_LOG_LINES: usize = 5000;

pub const LOGS_UNAVAILABLE: &str = "Failed to fetch logs";

pub fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/docker/containers", get(list_containers))
        .route("/docker/logs/{container_id}", get(container_logs))
        .route("/docker/execute", post(execute))
        .route("/current-user", get(current_user))
        .route("/grant-access", post(grant_access))
        .route("/revoke-access", post(revoke_access))
        .route("/temp-access", get(temp_access))
        .route("/dashboard", get(dashboard))
        .route("/dashboard/events", get(dashboard_events))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_user,
        ))
        .route("/health", get(health))
}

#[derive(OpenApi)]
#[openapi(
    info(title = "dockwatch", description = "Container status dashboard API"),
    paths(
        health,
        list_containers,
        container_logs,
        execute,
        current_user,
        grant_access,
        revoke_access,
        temp_access,
        dashboard,
        dashboard_events,
    ),
    components(schemas(ErrorBody))
)]
struct ApiDoc;

pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

#[derive(Debug)]
pub enum ApiError {
    Invalid(String),
    Unauthenticated,
    Forbidden(String),
    NotFound,
    Upstream(String),
}

impl ApiError {
    fn bad_request(msg: impl Into<String>) -> Self {
        ApiError::Invalid(msg.into())
    }

    fn admin_only() -> Self {
        ApiError::Forbidden("Only allow-listed users can manage access".into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::Invalid(msg) => (StatusCode::BAD_REQUEST, "invalid_request", msg),
            ApiError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                "unauthenticated",
                "Not authenticated".to_string(),
            ),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg),
            ApiError::NotFound => (StatusCode::NOT_FOUND, "not_found", "Not found".to_string()),
            ApiError::Upstream(msg) => (StatusCode::BAD_GATEWAY, "remote_error", msg),
        };
        let body = ErrorBody {
            code: code.to_string(),
            message,
        };
        (status, Json(body)).into_response()
    }
}

fn parse_body<T: serde::de::DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| ApiError::bad_request(format!("decode json: {e}")))
}

#[utoipa::path(get, path = "/api/health", responses((status = 200, body = HealthResponse)))]
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[utoipa::path(
    get,
    path = "/api/docker/containers",
    responses((status = 200, description = "Empty when the remote host cannot be read", body = Vec<ContainerRecord>))
)]
async fn list_containers(State(state): State<AppState>) -> Json<Vec<ContainerRecord>> {
    Json(state.reader.containers_or_empty().await)
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LogsQuery {
    /// Number of trailing lines, defaults to the configured tail length.
    pub lines: Option<usize>,
}

#[utoipa::path(
    get,
    path = "/api/docker/logs/{container_id}",
    params(("container_id" = String, Path), LogsQuery),
    responses(
        (status = 200, body = LogsResponse),
        (status = 400, body = ErrorBody),
    )
)]
async fn container_logs(
    State(state): State<AppState>,
    Path(container_id): Path<String>,
    Query(query): Query<LogsQuery>,
) -> Result<Json<LogsResponse>, ApiError> {
    let lines = query.lines.unwrap_or(state.settings.log_tail_lines);
    if lines == 0 || lines > MAX_LOG_LINES {
        return Err(ApiError::bad_request(format!(
            "lines must be between 1 and {MAX_LOG_LINES}"
        )));
    }
    validate_container_id(&container_id).map_err(|e| ApiError::bad_request(e.to_string()))?;

    let logs = match state.reader.container_logs(&container_id, lines).await {
        Ok(logs) => logs,
        Err(ReadError::InvalidId(err)) => return Err(ApiError::bad_request(err.to_string())),
        Err(err) => {
            tracing::warn!(container = %container_id, "log fetch failed: {err}");
            LOGS_UNAVAILABLE.to_string()
        }
    };
    Ok(Json(LogsResponse { logs }))
}

#[utoipa::path(
    post,
    path = "/api/docker/execute",
    request_body = ExecuteRequest,
    responses(
        (status = 200, body = CommandOutput),
        (status = 403, body = ErrorBody),
        (status = 404, description = "Endpoint disabled", body = ErrorBody),
        (status = 502, body = ErrorBody),
    )
)]
async fn execute(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    body: Bytes,
) -> Result<Json<CommandOutput>, ApiError> {
    if !state.settings.enable_execute {
        return Err(ApiError::NotFound);
    }
    if !state.policy.is_admin(&user) {
        return Err(ApiError::Forbidden(
            "Only allow-listed users can execute commands".into(),
        ));
    }
    let req: ExecuteRequest = parse_body(&body)?;
    if req.command.trim().is_empty() {
        return Err(ApiError::bad_request("command must not be empty"));
    }
    let executor = state.reader.executor();
    tracing::warn!(
        user = %user,
        host = executor.target(),
        command = %req.command,
        "executing remote command"
    );
    let output = executor
        .run_command(&req.command)
        .await
        .map_err(|e| ApiError::Upstream(e.to_string()))?;
    Ok(Json(output))
}

#[utoipa::path(
    get,
    path = "/api/current-user",
    responses(
        (status = 200, body = CurrentUserResponse),
        (status = 401, body = ErrorBody),
        (status = 403, body = ErrorBody),
    )
)]
async fn current_user(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Json<CurrentUserResponse> {
    Json(CurrentUserResponse { username: user })
}

#[utoipa::path(
    post,
    path = "/api/grant-access",
    request_body = GrantRequest,
    responses(
        (status = 200, body = GrantResponse),
        (status = 400, body = ErrorBody),
        (status = 403, body = ErrorBody),
    )
)]
async fn grant_access(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    body: Bytes,
) -> Result<Json<GrantResponse>, ApiError> {
    if !state.policy.is_admin(&user) {
        return Err(ApiError::admin_only());
    }
    let req: GrantRequest = parse_body(&body)?;
    let hours = req.duration.unwrap_or(DEFAULT_GRANT_HOURS);
    let grant = state
        .policy
        .registry()
        .grant(&req.username, hours)
        .map_err(|e| ApiError::bad_request(e.to_string()))?;
    tracing::info!(by = %user, username = %grant.username, "access granted");
    Ok(Json(GrantResponse {
        message: format!(
            "Temporary access granted to {} for {} hours",
            grant.username, hours
        ),
        expires_at: grant.expires_at,
    }))
}

#[utoipa::path(
    post,
    path = "/api/revoke-access",
    request_body = RevokeRequest,
    responses(
        (status = 200, body = MessageResponse),
        (status = 403, body = ErrorBody),
    )
)]
async fn revoke_access(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    body: Bytes,
) -> Result<Json<MessageResponse>, ApiError> {
    if !state.policy.is_admin(&user) {
        return Err(ApiError::admin_only());
    }
    let req: RevokeRequest = parse_body(&body)?;
    let username = req.username.trim();
    if username.is_empty() {
        return Err(ApiError::bad_request("username must not be empty"));
    }
    let removed = state.policy.registry().revoke(username);
    tracing::info!(by = %user, username, removed, "access revoke requested");
    Ok(Json(MessageResponse {
        message: format!("Access revoked for {username}"),
    }))
}

#[utoipa::path(
    get,
    path = "/api/temp-access",
    responses(
        (status = 200, body = Vec<AccessGrant>),
        (status = 403, body = ErrorBody),
    )
)]
async fn temp_access(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<Vec<AccessGrant>>, ApiError> {
    if !state.policy.is_admin(&user) {
        return Err(ApiError::admin_only());
    }
    Ok(Json(state.policy.registry().list_active()))
}

#[utoipa::path(get, path = "/api/dashboard", responses((status = 200, body = DashboardSnapshot)))]
async fn dashboard(State(state): State<AppState>) -> Json<DashboardSnapshot> {
    Json(state.feed.read().await.snapshot())
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EventsQuery {
    /// Last sequence number the client has applied.
    pub since: Option<u64>,
    /// Epoch of the snapshot `since` belongs to.
    pub epoch: Option<u64>,
}

#[utoipa::path(
    get,
    path = "/api/dashboard/events",
    params(EventsQuery),
    responses((status = 200, body = EventsPage))
)]
async fn dashboard_events(
    State(state): State<AppState>,
    Query(query): Query<EventsQuery>,
) -> Json<EventsPage> {
    Json(state.feed.read().await.events_since(query.since.unwrap_or(0), query.epoch))
}
