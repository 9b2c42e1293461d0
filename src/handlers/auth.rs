use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::{
    db::models::AuthUser,
    extractors::{AppJson, AuthGuard, SessionToken},
    names,
    rate_limit::Throttle,
    rejections::{AppError, ResultExt},
    services::auth::{normalize_email, LoginOutcome, RegisterOutcome},
    utils, AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(names::REGISTER_URL, post(register))
        .route(names::LOGIN_URL, post(login))
        .route(names::LOGOUT_URL, post(logout))
        .route(names::ME_URL, get(me))
}

#[derive(Deserialize)]
struct RegisterBody {
    email: String,
    password: String,
    display_name: String,
}

#[derive(Deserialize)]
struct LoginBody {
    email: String,
    password: String,
}

#[derive(Serialize)]
struct SessionResponse {
    token: String,
    user: AuthUser,
}

fn throttle(state: &AppState, email: &str) -> Result<(), AppError> {
    match state.login_limiter.check(&normalize_email(email)) {
        Throttle::Allowed => Ok(()),
        Throttle::Blocked { retry_after_secs } => {
            tracing::warn!("too many auth attempts, retry in {retry_after_secs}s");
            Err(AppError::TooManyRequests { retry_after_secs })
        }
    }
}

async fn session_response(
    state: &AppState,
    status: StatusCode,
    token: String,
) -> Result<Response, AppError> {
    let user = state
        .db
        .get_user_by_session(&token)
        .await
        .reject("could not load session user")?
        .ok_or(AppError::Internal("session vanished after creation"))?;

    let cookie = utils::cookie(
        names::USER_SESSION_COOKIE_NAME,
        &token,
        state.config.secure_cookies,
    );

    Ok((
        status,
        [(header::SET_COOKIE, cookie)],
        Json(SessionResponse { token, user }),
    )
        .into_response())
}

async fn register(
    State(state): State<AppState>,
    AppJson(body): AppJson<RegisterBody>,
) -> Result<Response, AppError> {
    throttle(&state, &body.email)?;

    let outcome = state
        .auth
        .register(&body.email, &body.password, &body.display_name)
        .await
        .reject("could not register user")?;

    match outcome {
        RegisterOutcome::LoggedIn(token) => {
            session_response(&state, StatusCode::CREATED, token).await
        }
        RegisterOutcome::EmptyFields => Err(AppError::Input("error.empty_fields")),
        RegisterOutcome::InvalidEmail => Err(AppError::Input("error.invalid_email")),
        RegisterOutcome::EmailTaken => Err(AppError::Input("error.email_taken")),
        RegisterOutcome::WeakPassword => Err(AppError::Input("error.weak_password")),
    }
}

async fn login(
    State(state): State<AppState>,
    AppJson(body): AppJson<LoginBody>,
) -> Result<Response, AppError> {
    throttle(&state, &body.email)?;

    let outcome = state
        .auth
        .login(&body.email, &body.password)
        .await
        .reject("could not log in")?;

    match outcome {
        LoginOutcome::Success(token) => {
            state.login_limiter.reset(&normalize_email(&body.email));
            session_response(&state, StatusCode::OK, token).await
        }
        LoginOutcome::InvalidCredentials => {
            Err(AppError::Unauthorized("error.invalid_credentials"))
        }
    }
}

async fn logout(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
) -> Result<Response, AppError> {
    if let Some(token) = token {
        state
            .auth
            .logout(&token)
            .await
            .reject("could not delete session")?;
    }

    let cookie = utils::expired_cookie(
        names::USER_SESSION_COOKIE_NAME,
        state.config.secure_cookies,
    );
    Ok((StatusCode::NO_CONTENT, [(header::SET_COOKIE, cookie)]).into_response())
}

async fn me(AuthGuard(user): AuthGuard) -> Json<AuthUser> {
    Json(user)
}
