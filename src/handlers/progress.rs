use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;

use crate::{
    extractors::AuthGuard,
    names,
    progress::Completion,
    rejections::{AppError, OptionExt, ResultExt},
    streak::{self, Streaks},
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(names::PROGRESS_URL, get(overview))
        .route(names::MODULE_PROGRESS_URL, get(module_progress))
}

#[derive(Serialize)]
struct Overview {
    lessons_completed: i64,
    modules_completed: i64,
    time_spent_seconds: i64,
    assessments_taken: i64,
    assessments_passed: i64,
    average_score: Option<i64>,
    #[serde(flatten)]
    streaks: Streaks,
}

async fn overview(
    AuthGuard(user): AuthGuard,
    State(state): State<AppState>,
) -> Result<Json<Overview>, AppError> {
    let totals = state
        .db
        .student_totals(user.id)
        .await
        .reject("could not load progress totals")?;
    let counts = state
        .db
        .module_lesson_counts(user.id, None)
        .await
        .reject("could not count lessons")?;
    let assessments = state
        .db
        .assessment_totals(user.id)
        .await
        .reject("could not load assessment totals")?;
    let activity = state
        .db
        .activity_timestamps(user.id)
        .await
        .reject("could not load activity")?;

    let modules_completed = counts
        .iter()
        .map(|c| Completion::new(c.completed_lessons as usize, c.total_lessons as usize))
        .filter(Completion::is_complete)
        .count() as i64;

    let streaks = streak::compute(&activity, state.clock.now(), state.config.streak_offset);

    Ok(Json(Overview {
        lessons_completed: totals.lessons_completed,
        modules_completed,
        time_spent_seconds: totals.time_spent_seconds,
        assessments_taken: assessments.taken,
        assessments_passed: assessments.passed,
        average_score: assessments.average_score.map(|avg| avg.round() as i64),
        streaks,
    }))
}

#[derive(Serialize)]
struct ModuleProgress {
    module_id: i64,
    #[serde(flatten)]
    completion: Completion,
    time_spent_seconds: i64,
}

async fn module_progress(
    AuthGuard(user): AuthGuard,
    State(state): State<AppState>,
    Path(module_id): Path<i64>,
) -> Result<Json<ModuleProgress>, AppError> {
    let module = state
        .db
        .module(module_id)
        .await
        .reject("could not load module")?
        .or_not_found("error.module_not_found")?;

    let lessons = state
        .db
        .published_lessons(module.id)
        .await
        .reject("could not load lessons")?;
    let completed = state
        .db
        .completed_lesson_ids(user.id, module.id)
        .await
        .reject("could not load completed lessons")?;
    let time_spent_seconds = state
        .db
        .module_time_spent(user.id, module.id)
        .await
        .reject("could not load time spent")?;

    let ids: Vec<i64> = lessons.iter().map(|l| l.id).collect();

    Ok(Json(ModuleProgress {
        module_id: module.id,
        completion: Completion::from_ids(&ids, &completed),
        time_spent_seconds,
    }))
}
