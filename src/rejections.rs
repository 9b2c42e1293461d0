use axum::{
    body::Body,
    extract::rejection::JsonRejection,
    http::{header, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use rust_i18n::t;
use serde::Serialize;

use crate::{extractors, names};

/// Errors returned by handlers. Messages are translation keys under `error.`;
/// `Internal` carries a log message and always answers with `error.internal`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("invalid input: {0}")]
    Input(&'static str),
    #[error("unauthorized: {0}")]
    Unauthorized(&'static str),
    #[error("forbidden: {0}")]
    Forbidden(&'static str),
    #[error("not found: {0}")]
    NotFound(&'static str),
    #[error("too many attempts, retry after {retry_after_secs}s")]
    TooManyRequests { retry_after_secs: u64 },
    #[error("internal error: {0}")]
    Internal(&'static str),
}

/// Attached to error responses so [`localize_errors`] can re-render the body
/// in the caller's language.
#[derive(Clone, Copy)]
struct ErrorMessage {
    code: &'static str,
    key: &'static str,
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, &'static str) {
        match self {
            AppError::Input(key) => (StatusCode::BAD_REQUEST, "INPUT_ERROR", *key),
            AppError::Unauthorized(key) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", *key),
            AppError::Forbidden(key) => (StatusCode::FORBIDDEN, "FORBIDDEN", *key),
            AppError::NotFound(key) => (StatusCode::NOT_FOUND, "NOT_FOUND", *key),
            AppError::TooManyRequests { .. } => (
                StatusCode::TOO_MANY_REQUESTS,
                "TOO_MANY_REQUESTS",
                "error.too_many_attempts",
            ),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_SERVER_ERROR",
                "error.internal",
            ),
        }
    }
}

fn error_body(code: &'static str, key: &str, locale: &str) -> Json<ErrorBody> {
    Json(ErrorBody {
        error: code,
        message: t!(key, locale = locale).to_string(),
    })
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, key) = self.parts();

        let mut response =
            (status, error_body(code, key, names::DEFAULT_LOCALE)).into_response();

        if let AppError::TooManyRequests { retry_after_secs } = self {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(retry_after_secs));
        }

        response.extensions_mut().insert(ErrorMessage { code, key });
        response
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!("rejected request body: {rejection}");
        AppError::Input("error.malformed_body")
    }
}

/// Re-render error bodies in the locale of the request.
pub async fn localize_errors(req: Request<Body>, next: Next) -> Response {
    let locale = extractors::locale_from_headers(req.headers());
    let response = next.run(req).await;

    let Some(message) = response.extensions().get::<ErrorMessage>().copied() else {
        return response;
    };
    if locale == names::DEFAULT_LOCALE {
        return response;
    }

    let (mut parts, _) = response.into_parts();
    parts.headers.remove(header::CONTENT_LENGTH);
    let body = error_body(message.code, message.key, locale).into_response();
    Response::from_parts(parts, body.into_body())
}

pub trait ResultExt<T> {
    /// Log the error and turn it into a 500 carrying `msg`.
    fn reject(self, msg: &'static str) -> Result<T, AppError>;
}

impl<T, E: std::fmt::Display> ResultExt<T> for Result<T, E> {
    fn reject(self, msg: &'static str) -> Result<T, AppError> {
        self.map_err(|e| {
            tracing::error!("{msg}: {e}");
            AppError::Internal(msg)
        })
    }
}

pub trait OptionExt<T> {
    fn or_not_found(self, key: &'static str) -> Result<T, AppError>;
}

impl<T> OptionExt<T> for Option<T> {
    fn or_not_found(self, key: &'static str) -> Result<T, AppError> {
        self.ok_or(AppError::NotFound(key))
    }
}
