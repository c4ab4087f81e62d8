//! Unlock, lock and status endpoints
//!
//! These issue and retire the sessions that the realtime gate checks.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;

use pd_core::time::current_time_millis;
use pd_core::token::verify_password;
use pd_core::{InvalidateError, SESSION_HEADER};

use crate::state::ServerState;

/// User id given to sessions unlocked without a client id
pub const DEFAULT_USER: &str = "local";

/// Permission tier granted on unlock
pub const UNLOCK_PERMISSIONS: [&str; 1] = ["admin"];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockRequest {
    pub password: String,
    #[serde(default)]
    pub client_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockResponse {
    pub token: String,
    pub expires_at: u64,
    pub user_id: String,
    pub permissions: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub is_valid: bool,
    pub is_locked: bool,
    pub user_id: String,
    pub expires_at: u64,
    pub remaining_seconds: u64,
}

pub fn routes(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/unlock", post(unlock))
        .route("/lock", post(lock))
        .route("/status", get(status))
        .with_state(state)
}

fn session_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

async fn unlock(State(state): State<Arc<ServerState>>, Json(req): Json<UnlockRequest>) -> Response {
    let Some(digest) = state.config.auth.password_sha256.as_deref() else {
        tracing::warn!("Unlock attempted but no password is configured");
        return error_response(StatusCode::UNAUTHORIZED, "Invalid password");
    };

    if !verify_password(&req.password, digest) {
        tracing::warn!("Unlock rejected: wrong password");
        return error_response(StatusCode::UNAUTHORIZED, "Invalid password");
    }

    let user_id = req
        .client_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_USER.to_string());
    let session = state.sessions.issue(user_id, UNLOCK_PERMISSIONS);
    tracing::info!("Session unlocked for {}", session.user_id);

    Json(UnlockResponse {
        token: session.token,
        expires_at: session.expires_at,
        user_id: session.user_id,
        permissions: session.permissions.into_iter().collect(),
    })
    .into_response()
}

async fn lock(State(state): State<Arc<ServerState>>, headers: HeaderMap) -> Response {
    let Some(token) = session_token(&headers) else {
        return error_response(StatusCode::BAD_REQUEST, "Session token header missing");
    };

    match state.sessions.invalidate(token) {
        Ok(receipt) => {
            tracing::info!("Session locked");
            Json(receipt).into_response()
        }
        Err(InvalidateError::NotFound) => {
            error_response(StatusCode::NOT_FOUND, "Session not found")
        }
    }
}

async fn status(State(state): State<Arc<ServerState>>, headers: HeaderMap) -> Response {
    match state.sessions.validate(session_token(&headers)) {
        Ok(session) => {
            let now = current_time_millis();
            Json(StatusResponse {
                is_valid: true,
                is_locked: session.is_locked,
                remaining_seconds: session.remaining_secs_at(now),
                user_id: session.user_id,
                expires_at: session.expires_at,
            })
            .into_response()
        }
        Err(e) => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": e.to_string(), "reason": e.code() })),
        )
            .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use pd_core::config::ServerConfig;
    use pd_core::token::password_digest;
    use serde_json::Value;
    use std::time::Duration;
    use tower::ServiceExt;

    fn state_with_password(password: Option<&str>, ttl: Duration) -> Arc<ServerState> {
        let mut config = ServerConfig::default();
        config.session_ttl = ttl;
        config.auth.password_sha256 = password.map(password_digest);
        Arc::new(ServerState::new(config))
    }

    async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn unlock_request(body: Value) -> Request<Body> {
        Request::post("/unlock")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn with_token(req: axum::http::request::Builder, token: &str) -> Request<Body> {
        req.header(SESSION_HEADER, token).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_unlock_status_lock_cycle() {
        let state = state_with_password(Some("hunter2"), Duration::from_secs(60));

        let (code, body) = send(
            routes(state.clone()),
            unlock_request(json!({ "password": "hunter2", "clientId": "laptop" })),
        )
        .await;
        assert_eq!(code, StatusCode::OK);
        assert_eq!(body["userId"], "laptop");
        assert_eq!(body["permissions"], json!(["admin"]));
        let token = body["token"].as_str().unwrap().to_string();

        let (code, body) = send(routes(state.clone()), with_token(Request::get("/status"), &token)).await;
        assert_eq!(code, StatusCode::OK);
        assert_eq!(body["isValid"], true);
        assert_eq!(body["isLocked"], false);
        assert!(body["remainingSeconds"].as_u64().unwrap() <= 60);

        let (code, body) = send(routes(state.clone()), with_token(Request::post("/lock"), &token)).await;
        assert_eq!(code, StatusCode::OK);
        assert!(body["lockedAt"].is_u64());

        let (code, body) = send(routes(state.clone()), with_token(Request::get("/status"), &token)).await;
        assert_eq!(code, StatusCode::UNAUTHORIZED);
        assert_eq!(body["reason"], "INVALID");

        let (code, _) = send(routes(state), with_token(Request::post("/lock"), &token)).await;
        assert_eq!(code, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unlock_defaults_user_id() {
        let state = state_with_password(Some("pw"), Duration::from_secs(60));
        let (code, body) = send(routes(state), unlock_request(json!({ "password": "pw" }))).await;
        assert_eq!(code, StatusCode::OK);
        assert_eq!(body["userId"], DEFAULT_USER);
    }

    #[tokio::test]
    async fn test_unlock_rejections() {
        let state = state_with_password(Some("right"), Duration::from_secs(60));
        let (code, _) = send(routes(state.clone()), unlock_request(json!({ "password": "wrong" }))).await;
        assert_eq!(code, StatusCode::UNAUTHORIZED);
        assert!(state.sessions.is_empty());

        let state = state_with_password(None, Duration::from_secs(60));
        let (code, _) = send(routes(state), unlock_request(json!({ "password": "" }))).await;
        assert_eq!(code, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_missing_header() {
        let state = state_with_password(Some("pw"), Duration::from_secs(60));

        let req = Request::post("/lock").body(Body::empty()).unwrap();
        let (code, _) = send(routes(state.clone()), req).await;
        assert_eq!(code, StatusCode::BAD_REQUEST);

        let req = Request::get("/status").body(Body::empty()).unwrap();
        let (code, body) = send(routes(state), req).await;
        assert_eq!(code, StatusCode::UNAUTHORIZED);
        assert_eq!(body["reason"], "MISSING");
    }

    #[tokio::test]
    async fn test_status_reports_expired_once() {
        let state = state_with_password(Some("pw"), Duration::from_millis(1));
        let (_, body) = send(routes(state.clone()), unlock_request(json!({ "password": "pw" }))).await;
        let token = body["token"].as_str().unwrap().to_string();

        tokio::time::sleep(Duration::from_millis(20)).await;

        let (code, body) = send(routes(state.clone()), with_token(Request::get("/status"), &token)).await;
        assert_eq!(code, StatusCode::UNAUTHORIZED);
        assert_eq!(body["reason"], "EXPIRED");

        let (_, body) = send(routes(state), with_token(Request::get("/status"), &token)).await;
        assert_eq!(body["reason"], "INVALID");
    }
}
