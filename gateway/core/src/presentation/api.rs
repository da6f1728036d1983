// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use crate::domain::gateway::{AccessError, AssetDownload, AssetGateway};
use crate::domain::permission::{AnonymousUser, UserContext};
use crate::infrastructure::auth::StaticUserDirectory;
use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tower_http::trace::TraceLayer;

pub struct AppState {
    pub gateway: Arc<AssetGateway>,
    pub users: Arc<StaticUserDirectory>,
    /// Redirect target for unauthenticated callers; 401 when unset
    pub login_url: Option<String>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(gateway: Arc<AssetGateway>, users: Arc<StaticUserDirectory>) -> Self {
        Self {
            gateway,
            users,
            login_url: None,
            start_time: Instant::now(),
        }
    }

    pub fn with_login_url(mut self, login_url: Option<String>) -> Self {
        self.login_url = login_url;
        self
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/files/{*path}", get(download_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

async fn health_handler(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "volumes": state.gateway.registry().len(),
        "uptime_seconds": state.start_time.elapsed().as_secs(),
    }))
}

async fn download_handler(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
    headers: HeaderMap,
) -> Response {
    let user: &dyn UserContext = match bearer_token(&headers).and_then(|t| state.users.lookup(t)) {
        Some(user) => user,
        None => &AnonymousUser,
    };

    match state.gateway.open(&path, user).await {
        Ok(download) => download_response(download),
        Err(e) => access_error_response(e, state.login_url.as_deref()),
    }
}

/// Token from an `Authorization: Bearer <token>` header
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

fn download_response(download: AssetDownload) -> Response {
    let AssetDownload { file, stream } = download;

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, file.mime_type.as_str())
        .header(header::CONTENT_LENGTH, stream.content_length)
        .header(header::CONTENT_DISPOSITION, file.content_disposition())
        .body(Body::from_stream(stream.body));

    match response {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(filename = %file.filename, error = %e, "Failed to build download response");
            access_error_response(
                AccessError::Io(std::io::Error::other(e.to_string())),
                None,
            )
        }
    }
}

fn access_error_response(error: AccessError, login_url: Option<&str>) -> Response {
    match error {
        AccessError::NotFound => (StatusCode::NOT_FOUND, error.to_string()).into_response(),
        AccessError::AuthenticationRequired => match login_url {
            Some(url) => (StatusCode::FOUND, [(header::LOCATION, url.to_string())]).into_response(),
            None => (
                StatusCode::UNAUTHORIZED,
                [(header::WWW_AUTHENTICATE, "Bearer")],
                error.to_string(),
            )
                .into_response(),
        },
        AccessError::Io(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, error.to_string()).into_response()
        }
    }
}
