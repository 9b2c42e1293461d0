use std::convert::Infallible;

use axum::{
    extract::{FromRequest, FromRequestParts},
    http::{header, request::Parts, HeaderMap},
};
use axum_extra::extract::CookieJar;

use crate::{db::models::AuthUser, names, rejections::AppError, AppState};

/// JSON body extractor whose rejection is an [`AppError`].
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// Locale of a request: the `lang` cookie, then the `Accept-Language`
/// header, then `"en"`.
pub fn locale_from_headers(headers: &HeaderMap) -> &'static str {
    let jar = CookieJar::from_headers(headers);
    jar.get(names::LOCALE_COOKIE_NAME)
        .and_then(|c| match_supported_locale(c.value()))
        .or_else(|| {
            headers
                .get(header::ACCEPT_LANGUAGE)
                .and_then(|v| v.to_str().ok())
                .and_then(locale_from_accept_language)
        })
        .unwrap_or(names::DEFAULT_LOCALE)
}

/// Match a language tag against supported locales, returning the locale string.
fn match_supported_locale(lang: &str) -> Option<&'static str> {
    let primary = lang.split('-').next().unwrap_or(lang).to_ascii_lowercase();
    names::SUPPORTED_LOCALES
        .iter()
        .find(|supported| **supported == primary)
        .copied()
}

/// Parse an `Accept-Language` header and return the best matching supported locale.
fn locale_from_accept_language(header: &str) -> Option<&'static str> {
    let mut entries: Vec<(&str, f32)> = header
        .split(',')
        .map(|entry| {
            let entry = entry.trim();
            if let Some((lang, params)) = entry.split_once(';') {
                let q = params
                    .split(';')
                    .find_map(|p| p.trim().strip_prefix("q="))
                    .and_then(|v| v.trim().parse::<f32>().ok())
                    .unwrap_or(1.0);
                (lang.trim(), q)
            } else {
                (entry, 1.0)
            }
        })
        .collect();
    entries.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    entries
        .iter()
        .find_map(|(lang, _)| match_supported_locale(lang))
}

/// The session token of the request: a bearer token, else the session cookie.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());

    bearer.or_else(|| {
        CookieJar::from_headers(headers)
            .get(names::USER_SESSION_COOKIE_NAME)
            .map(|c| c.value().to_string())
    })
}

/// Raw session token, if the request carries one. Not validated.
pub struct SessionToken(pub Option<String>);

impl<S: Send + Sync> FromRequestParts<S> for SessionToken {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(SessionToken(session_token(&parts.headers)))
    }
}

/// Guard extractor that verifies the session token against the database.
/// Carries the authenticated user's info for use in handlers.
pub struct AuthGuard(pub AuthUser);

impl FromRequestParts<AppState> for AuthGuard {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = session_token(&parts.headers) else {
            return Err(AppError::Unauthorized("error.unauthorized"));
        };

        match state.db.get_user_by_session(&token).await {
            Ok(Some(user)) => Ok(AuthGuard(user)),
            Ok(None) => Err(AppError::Unauthorized("error.unauthorized")),
            Err(e) => {
                tracing::error!("could not look up session: {e}");
                Err(AppError::Internal("could not look up session"))
            }
        }
    }
}
