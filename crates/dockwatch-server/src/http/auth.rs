//! Request identity.
//!
//! Authentication itself happens in front of this server (an OAuth proxy).
//! The proxy forwards the authenticated username in a configured header;
//! this module only reads it and applies the access policy.

use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;

use super::AppState;
use super::api::ApiError;

/// Username of the authorized caller, inserted by [`require_user`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser(pub String);

/// Username carried by the identity header, if any.
pub fn username(headers: &HeaderMap, header: &str) -> Option<String> {
    headers
        .get(header)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

pub fn is_authenticated(headers: &HeaderMap, header: &str) -> bool {
    username(headers, header).is_some()
}

/// Reject unauthenticated (401) and unauthorized (403) callers.
///
/// Authorization is re-evaluated on every request, so a revoked or expired
/// temporary grant takes effect immediately.
pub async fn require_user(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = state.settings.identity_header.as_str();
    let Some(user) = username(req.headers(), header) else {
        return Err(ApiError::Unauthenticated);
    };
    if !state.policy.is_authorized(&user) {
        tracing::info!(user = %user, "rejected unauthorized user");
        return Err(ApiError::Forbidden("Unauthorized user".into()));
    }
    req.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(req).await)
}
