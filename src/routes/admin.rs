//! Admin export route.
//!
//! `GET /admin/download-signups` streams the signup ledger to a caller
//! holding the deployment's admin bearer token. This path is independent of
//! the OAuth login flow and carries no session or cookie state.

use std::io::ErrorKind;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Deserialize;

use crate::AppState;

#[derive(Debug, Deserialize)]
struct DownloadQuery {
    token: Option<String>,
}

/// Bearer token from the Authorization header, if one is presented.
fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(|t| t.trim().to_string())
}

/// GET /download-signups - Download the signup ledger as a CSV attachment.
///
/// 403 when no admin token is configured (export disabled), 401 on a
/// missing or mismatched token, 404 before the first signup. The header
/// token takes precedence over `?token=` when both are supplied.
async fn download_signups(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<DownloadQuery>,
) -> Response {
    let Some(expected) = &state.config.admin.token else {
        return (
            StatusCode::FORBIDDEN,
            "Admin download not configured on this host.",
        )
            .into_response();
    };

    // Header overrides query when both are present.
    let presented = bearer_token(&headers).or(query.token);
    match presented {
        Some(token) if token == *expected => {}
        _ => return StatusCode::UNAUTHORIZED.into_response(),
    }

    let bytes = match tokio::fs::read(state.ledger.path()).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return (StatusCode::NOT_FOUND, "No signups recorded yet.").into_response();
        }
        Err(e) => {
            tracing::error!("Failed to read signup ledger: {}", e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"signups.csv\"",
            ),
        ],
        bytes,
    )
        .into_response()
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/download-signups", get(download_signups))
        .with_state(state)
}
