use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use chrono::{Duration, FixedOffset};
use clap::Parser;
use color_eyre::eyre::{eyre, WrapErr};
use fluentpath::{clock::SystemClock, db::Db, models::Careers, AppConfig, AppState};
use tokio::net::TcpListener;

#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// SQLite database url.
    #[arg(long, env, default_value = "sqlite:fluentpath.db")]
    database_url: String,

    /// The address to bind to.
    #[arg(short, long, env, default_value = "127.0.0.1:1414")]
    address: String,

    /// Mark session cookies as `Secure`.
    #[arg(long, env, default_value_t = false)]
    secure_cookies: bool,

    /// JSON file of careers to import at startup.
    #[arg(long, env)]
    seed: Option<PathBuf>,

    /// UTC offset, in minutes, that defines a calendar day for streaks.
    #[arg(long, env, default_value_t = 0, allow_negative_numbers = true)]
    streak_utc_offset_minutes: i32,

    #[arg(long, env, default_value_t = fluentpath::cache::DEFAULT_TTL_SECS)]
    module_cache_ttl_secs: i64,

    #[arg(long, env, default_value_t = fluentpath::rate_limit::DEFAULT_MAX_ATTEMPTS)]
    login_max_attempts: usize,

    #[arg(long, env, default_value_t = fluentpath::rate_limit::DEFAULT_WINDOW_SECS)]
    login_window_secs: i64,
}

impl Args {
    fn config(&self) -> color_eyre::Result<AppConfig> {
        let streak_offset = self
            .streak_utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| eyre!("streak offset out of range"))?;
        let module_cache_ttl = Duration::try_seconds(self.module_cache_ttl_secs)
            .ok_or_else(|| eyre!("module cache ttl out of range"))?;
        let login_window = Duration::try_seconds(self.login_window_secs)
            .ok_or_else(|| eyre!("login window out of range"))?;

        Ok(AppConfig {
            secure_cookies: self.secure_cookies,
            streak_offset,
            module_cache_ttl,
            login_max_attempts: self.login_max_attempts,
            login_window,
        })
    }
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    dotenvy::dotenv().ok();

    let filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "fluentpath=debug,tower_http=info".to_owned());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(tracing_subscriber::fmt::format::FmtSpan::CLOSE)
        .init();

    let args = Args::parse();
    let config = args.config()?;

    let db = Db::new(&args.database_url).await?;

    if let Some(path) = &args.seed {
        seed(&db, path).await?;
    }

    let state = AppState::new(db, config, Arc::new(SystemClock));
    let app = fluentpath::router(state);

    let listener = TcpListener::bind(&args.address).await?;
    tracing::info!("listening on {}", args.address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server shut down");
    Ok(())
}

async fn seed(db: &Db, path: &Path) -> color_eyre::Result<()> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .wrap_err_with(|| format!("could not read seed file {}", path.display()))?;
    let careers: Careers = serde_json::from_str(&raw).wrap_err("invalid seed file")?;

    for career in careers {
        let slug = career.slug.clone();
        if let Some(id) = db.load_career(career).await? {
            tracing::info!(%slug, id, "career imported");
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("could not listen for ctrl-c: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("could not listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
