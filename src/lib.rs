rust_i18n::i18n!("locales", fallback = "en");

pub mod cache;
pub mod clock;
pub mod db;
pub mod extractors;
pub mod handlers;
pub mod models;
pub mod names;
pub mod progress;
pub mod rate_limit;
pub mod rejections;
pub mod scoring;
pub mod services;
pub mod streak;
pub mod utils;

use std::sync::{Arc, Mutex};

use axum::{
    http::{header, Method},
    middleware, Router,
};
use chrono::{Duration, FixedOffset, Offset, Utc};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use cache::TtlCache;
use clock::SharedClock;
use handlers::careers::ModuleListing;
use rate_limit::KeyedRateLimiter;
use services::auth::AuthService;

/// Runtime knobs, filled from the command line in `main`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub secure_cookies: bool,
    /// Offset used to cut activity into calendar days for streaks.
    pub streak_offset: FixedOffset,
    pub module_cache_ttl: Duration,
    pub login_max_attempts: usize,
    pub login_window: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            secure_cookies: false,
            streak_offset: Utc.fix(),
            module_cache_ttl: Duration::seconds(cache::DEFAULT_TTL_SECS),
            login_max_attempts: rate_limit::DEFAULT_MAX_ATTEMPTS,
            login_window: Duration::seconds(rate_limit::DEFAULT_WINDOW_SECS),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db: db::Db,
    pub auth: AuthService,
    pub clock: SharedClock,
    pub module_cache: Arc<Mutex<TtlCache<Vec<ModuleListing>>>>,
    pub login_limiter: Arc<KeyedRateLimiter>,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(db: db::Db, config: AppConfig, clock: SharedClock) -> Self {
        let module_cache = TtlCache::new(config.module_cache_ttl, clock.clone());
        let login_limiter = KeyedRateLimiter::new(
            config.login_max_attempts,
            config.login_window,
            clock.clone(),
        );

        Self {
            auth: AuthService::new(db.clone(), clock.clone()),
            db,
            clock,
            module_cache: Arc::new(Mutex::new(module_cache)),
            login_limiter: Arc::new(login_limiter),
            config,
        }
    }

    /// Drop every cached module listing of a user.
    pub fn invalidate_modules(&self, user_id: i64) {
        let mut cache = self
            .module_cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        cache.invalidate_prefix(&names::module_cache_prefix(user_id));
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .max_age(std::time::Duration::from_secs(60 * 60));

    Router::new()
        .merge(handlers::health::routes())
        .merge(handlers::auth::routes())
        .merge(handlers::careers::routes())
        .merge(handlers::assessments::routes())
        .merge(handlers::progress::routes())
        .merge(handlers::settings::routes())
        .layer(middleware::from_fn(rejections::localize_errors))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
