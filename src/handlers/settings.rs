use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::{
    db::{models::Theme, models::Visibility, NotificationUpdate, PrivacyUpdate},
    extractors::{AppJson, AuthGuard},
    names,
    rejections::{AppError, ResultExt},
    services::auth::ChangePasswordOutcome,
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            names::PROFILE_SETTINGS_URL,
            get(get_profile).put(update_profile),
        )
        .route(names::THEME_SETTINGS_URL, get(get_theme).put(update_theme))
        .route(
            names::NOTIFICATION_SETTINGS_URL,
            get(get_notifications).patch(update_notifications),
        )
        .route(
            names::PRIVACY_SETTINGS_URL,
            get(get_privacy).patch(update_privacy),
        )
        .route(names::PASSWORD_SETTINGS_URL, put(change_password))
}

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct Profile {
    email: String,
    display_name: String,
    bio: String,
    native_language: Option<String>,
}

async fn get_profile(
    AuthGuard(user): AuthGuard,
    State(state): State<AppState>,
) -> Result<Json<Profile>, AppError> {
    let settings = state
        .db
        .user_settings(user.id)
        .await
        .reject("could not load settings")?;

    Ok(Json(Profile {
        email: user.email,
        display_name: user.display_name,
        bio: settings.bio,
        native_language: settings.native_language,
    }))
}

#[derive(Deserialize)]
struct ProfileBody {
    display_name: String,
    #[serde(default)]
    bio: String,
    #[serde(default)]
    native_language: Option<String>,
}

async fn update_profile(
    AuthGuard(user): AuthGuard,
    State(state): State<AppState>,
    AppJson(body): AppJson<ProfileBody>,
) -> Result<Json<Profile>, AppError> {
    let display_name = body.display_name.trim();
    if display_name.is_empty() {
        return Err(AppError::Input("error.display_name_required"));
    }
    if display_name.chars().count() > names::MAX_DISPLAY_NAME_LENGTH {
        return Err(AppError::Input("error.display_name_too_long"));
    }
    let bio = body.bio.trim();
    if bio.chars().count() > names::MAX_BIO_LENGTH {
        return Err(AppError::Input("error.bio_too_long"));
    }
    let native_language = body
        .native_language
        .as_deref()
        .map(str::trim)
        .filter(|l| !l.is_empty());

    state
        .db
        .update_profile(user.id, display_name, bio, native_language)
        .await
        .reject("could not update profile")?;

    Ok(Json(Profile {
        email: user.email,
        display_name: display_name.to_string(),
        bio: bio.to_string(),
        native_language: native_language.map(str::to_string),
    }))
}

// ---------------------------------------------------------------------------
// Theme
// ---------------------------------------------------------------------------

#[derive(Serialize, Deserialize)]
struct ThemeBody {
    theme: Theme,
}

async fn get_theme(
    AuthGuard(user): AuthGuard,
    State(state): State<AppState>,
) -> Result<Json<ThemeBody>, AppError> {
    let settings = state
        .db
        .user_settings(user.id)
        .await
        .reject("could not load settings")?;
    Ok(Json(ThemeBody {
        theme: settings.theme,
    }))
}

async fn update_theme(
    AuthGuard(user): AuthGuard,
    State(state): State<AppState>,
    AppJson(body): AppJson<ThemeBody>,
) -> Result<Json<ThemeBody>, AppError> {
    state
        .db
        .update_theme(user.id, body.theme)
        .await
        .reject("could not update theme")?;
    Ok(Json(body))
}

// ---------------------------------------------------------------------------
// Notifications and privacy
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct Notifications {
    email_notifications: bool,
    lesson_reminders: bool,
    weekly_digest: bool,
}

#[derive(Serialize)]
struct Privacy {
    profile_visibility: Visibility,
    show_progress: bool,
}

async fn notifications(state: &AppState, user_id: i64) -> Result<Notifications, AppError> {
    let s = state
        .db
        .user_settings(user_id)
        .await
        .reject("could not load settings")?;
    Ok(Notifications {
        email_notifications: s.email_notifications,
        lesson_reminders: s.lesson_reminders,
        weekly_digest: s.weekly_digest,
    })
}

async fn privacy(state: &AppState, user_id: i64) -> Result<Privacy, AppError> {
    let s = state
        .db
        .user_settings(user_id)
        .await
        .reject("could not load settings")?;
    Ok(Privacy {
        profile_visibility: s.profile_visibility,
        show_progress: s.show_progress,
    })
}

async fn get_notifications(
    AuthGuard(user): AuthGuard,
    State(state): State<AppState>,
) -> Result<Json<Notifications>, AppError> {
    Ok(Json(notifications(&state, user.id).await?))
}

async fn update_notifications(
    AuthGuard(user): AuthGuard,
    State(state): State<AppState>,
    AppJson(update): AppJson<NotificationUpdate>,
) -> Result<Json<Notifications>, AppError> {
    state
        .db
        .update_notifications(user.id, update)
        .await
        .reject("could not update notification settings")?;
    Ok(Json(notifications(&state, user.id).await?))
}

async fn get_privacy(
    AuthGuard(user): AuthGuard,
    State(state): State<AppState>,
) -> Result<Json<Privacy>, AppError> {
    Ok(Json(privacy(&state, user.id).await?))
}

async fn update_privacy(
    AuthGuard(user): AuthGuard,
    State(state): State<AppState>,
    AppJson(update): AppJson<PrivacyUpdate>,
) -> Result<Json<Privacy>, AppError> {
    state
        .db
        .update_privacy(user.id, update)
        .await
        .reject("could not update privacy settings")?;
    Ok(Json(privacy(&state, user.id).await?))
}

// ---------------------------------------------------------------------------
// Password
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct ChangePasswordBody {
    current_password: String,
    new_password: String,
}

async fn change_password(
    AuthGuard(user): AuthGuard,
    State(state): State<AppState>,
    AppJson(body): AppJson<ChangePasswordBody>,
) -> Result<StatusCode, AppError> {
    let outcome = state
        .auth
        .change_password(user.id, &body.current_password, &body.new_password)
        .await
        .reject("could not change password")?;

    match outcome {
        ChangePasswordOutcome::Success => Ok(StatusCode::NO_CONTENT),
        ChangePasswordOutcome::EmptyFields => Err(AppError::Input("error.empty_fields")),
        ChangePasswordOutcome::WeakPassword => Err(AppError::Input("error.weak_password")),
        ChangePasswordOutcome::IncorrectPassword => {
            Err(AppError::Forbidden("error.incorrect_password"))
        }
    }
}
