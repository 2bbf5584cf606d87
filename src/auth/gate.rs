use std::sync::Arc;

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::server::AppState;
use crate::types::User;

/// Extractor that requires an authenticated user. Resolving the token also
/// slides the session window forward.
pub struct RequireUser {
    pub token: String,
    pub user: User,
}

/// Extractor that requires an authenticated admin. Every failure surfaces
/// as not-found so admin-only resources never reveal whether they exist.
pub struct RequireAdmin {
    pub token: String,
    pub user: User,
}

#[derive(Debug)]
enum GateFailure {
    Unauthenticated,
    Internal,
}

#[derive(Debug)]
pub enum GateError {
    Unauthenticated,
    NotFound,
    Internal,
}

impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            GateError::Unauthenticated => (StatusCode::UNAUTHORIZED, "Authentication required"),
            GateError::NotFound => (StatusCode::NOT_FOUND, "Not found"),
            GateError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error"),
        };

        let body = json!({ "data": null, "error": message });
        let mut response = (status, Json(body)).into_response();

        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                "WWW-Authenticate",
                "Bearer realm=\"shellac\"".parse().unwrap(),
            );
        }

        response
    }
}

/// Resolves the bearer token to its user without refreshing the session.
/// The caller decides whether the request qualifies for a `touch`.
fn resolve_user(parts: &Parts, state: &Arc<AppState>) -> Result<(String, User), GateFailure> {
    let token = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or(GateFailure::Unauthenticated)?
        .to_string();

    let user_id = state
        .sessions
        .resolve(&token)
        .ok_or(GateFailure::Unauthenticated)?;

    // A session for a user that no longer exists is invalid; the entry is
    // left to age out on its own.
    let user = state
        .store
        .get_user(user_id)
        .map_err(|_| GateFailure::Internal)?
        .ok_or(GateFailure::Unauthenticated)?;

    Ok((token, user))
}

impl FromRequestParts<Arc<AppState>> for RequireUser {
    type Rejection = GateError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let (token, user) = resolve_user(parts, state).map_err(|e| match e {
            GateFailure::Unauthenticated => GateError::Unauthenticated,
            GateFailure::Internal => GateError::Internal,
        })?;

        state.sessions.touch(&token, user.user_id);
        Ok(RequireUser { token, user })
    }
}

impl FromRequestParts<Arc<AppState>> for RequireAdmin {
    type Rejection = GateError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let (token, user) = resolve_user(parts, state).map_err(|e| match e {
            GateFailure::Unauthenticated => GateError::NotFound,
            GateFailure::Internal => GateError::Internal,
        })?;

        if !user.is_admin {
            return Err(GateError::NotFound);
        }

        state.sessions.touch(&token, user.user_id);
        Ok(RequireAdmin { token, user })
    }
}
