//! HTTP response helpers
//!
//! Redirects back to the directory page carrying a status message, plain
//! text error responses, and download headers.

use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Redirect, Response};

use crate::error::FileManagerError;
use crate::error::handlers::{error_to_status, handle_error};

/// Query key for a failure message on the directory page
pub const ERROR_KEY: &str = "error";
/// Query key for a success message on the directory page
pub const SUCCESS_KEY: &str = "success";

/// URL of the directory page for `path`
pub fn page_url(path: &str) -> String {
    format!("/?path={}", urlencoding::encode(path))
}

/// URL of the directory page for `path` with a message attached
pub fn page_url_with_message(path: &str, key: &str, message: &str) -> String {
    format!(
        "{}&{}={}",
        page_url(path),
        key,
        urlencoding::encode(message)
    )
}

/// 303 redirect to the directory page with an error message
pub fn redirect_error(path: &str, message: &str) -> Response {
    Redirect::to(&page_url_with_message(path, ERROR_KEY, message)).into_response()
}

/// 303 redirect to the directory page with a success message
pub fn redirect_success(path: &str, message: &str) -> Response {
    Redirect::to(&page_url_with_message(path, SUCCESS_KEY, message)).into_response()
}

/// Plain text error response
pub fn error_response(status: StatusCode, message: &str) -> Response {
    (status, message.to_string()).into_response()
}

/// Logs `err` and turns it into a plain text response with a matching status
pub fn failure_response(err: FileManagerError) -> Response {
    handle_error(&err);
    error_response(error_to_status(&err), &err.to_string())
}

/// `Content-Disposition: attachment` with an ASCII fallback name and the
/// exact UTF-8 name in `filename*`
pub fn attachment_header(file_name: &str) -> HeaderValue {
    let fallback: String = file_name
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let value = format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(file_name)
    );
    HeaderValue::from_str(&value)
        .unwrap_or_else(|_| HeaderValue::from_static("attachment; filename=\"download\""))
}

/// Headers for a download response
pub fn download_headers(
    file_name: &str,
    content_type: &'static str,
) -> [(header::HeaderName, HeaderValue); 2] {
    [
        (header::CONTENT_TYPE, HeaderValue::from_static(content_type)),
        (header::CONTENT_DISPOSITION, attachment_header(file_name)),
    ]
}
