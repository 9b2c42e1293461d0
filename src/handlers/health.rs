use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::{names, utils, AppState};

pub fn routes() -> Router<AppState> {
    Router::new().route(names::HEALTH_URL, get(health))
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<Health> {
    Json(Health {
        status: "ok",
        version: utils::VERSION,
    })
}
