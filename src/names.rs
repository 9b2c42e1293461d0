pub const USER_SESSION_COOKIE_NAME: &str = "user_session";

pub const HEALTH_URL: &str = "/api/health";
pub const REGISTER_URL: &str = "/api/auth/register";
pub const LOGIN_URL: &str = "/api/auth/login";
pub const LOGOUT_URL: &str = "/api/auth/logout";
pub const ME_URL: &str = "/api/auth/me";

pub const CAREERS_URL: &str = "/api/careers";
pub const CAREER_MODULES_URL: &str = "/api/careers/{slug}/modules";
pub const CAREER_MODULE_URL: &str = "/api/careers/{slug}/modules/{module_id}";
pub const LESSON_URL: &str = "/api/careers/{slug}/modules/{module_id}/lessons/{lesson_id}";
pub const COMPLETE_LESSON_URL: &str =
    "/api/careers/{slug}/modules/{module_id}/lessons/{lesson_id}/complete";

pub const MODULE_ASSESSMENTS_URL: &str = "/api/modules/{module_id}/assessments";
pub const ASSESSMENT_URL: &str = "/api/assessments/{id}";
pub const SUBMIT_ASSESSMENT_URL: &str = "/api/assessments/{id}/submit";
pub const ASSESSMENT_RESULTS_URL: &str = "/api/assessments/{id}/results";

pub const PROGRESS_URL: &str = "/api/progress";
pub const MODULE_PROGRESS_URL: &str = "/api/progress/{module_id}";

pub const PROFILE_SETTINGS_URL: &str = "/api/settings/profile";
pub const THEME_SETTINGS_URL: &str = "/api/settings/theme";
pub const NOTIFICATION_SETTINGS_URL: &str = "/api/settings/notifications";
pub const PRIVACY_SETTINGS_URL: &str = "/api/settings/privacy";
pub const PASSWORD_SETTINGS_URL: &str = "/api/settings/password";

/// Cache key for a user's module listing of one career.
pub fn module_cache_key(user_id: i64, career_slug: &str) -> String {
    format!("{user_id}:{career_slug}")
}

/// Prefix covering every cached listing of a user.
pub fn module_cache_prefix(user_id: i64) -> String {
    format!("{user_id}:")
}

// Profile limits
pub const MAX_DISPLAY_NAME_LENGTH: usize = 80;
pub const MAX_BIO_LENGTH: usize = 500;
pub const MAX_TIME_SPENT_SECONDS: i64 = 24 * 60 * 60;

// i18n
pub const LOCALE_COOKIE_NAME: &str = "lang";
pub const DEFAULT_LOCALE: &str = "en";
pub const SUPPORTED_LOCALES: &[&str] = &["en", "es"];
