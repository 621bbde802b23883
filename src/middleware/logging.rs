//! Logging middleware
//!
//! Provides request logging functionality.

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use log::{info, warn};
use std::time::Instant;

/// Log every request with its final status and duration
pub async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let started = Instant::now();

    let response = next.run(request).await;
    let status = response.status();
    let elapsed = started.elapsed();

    if status.is_client_error() || status.is_server_error() {
        warn!("{} {} -> {} ({:?})", method, uri, status, elapsed);
    } else {
        info!("{} {} -> {} ({:?})", method, uri, status, elapsed);
    }
    response
}
