use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::{
    db::models::{Career, Lesson, LessonAsset, LessonSummary, Module, ProgressRecord},
    extractors::{AppJson, AuthGuard},
    names,
    progress::{self, Completion},
    rejections::{AppError, OptionExt, ResultExt},
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(names::CAREERS_URL, get(list_careers))
        .route(names::CAREER_MODULES_URL, get(list_modules))
        .route(names::CAREER_MODULE_URL, get(get_module))
        .route(names::LESSON_URL, get(get_lesson))
        .route(names::COMPLETE_LESSON_URL, post(complete_lesson))
}

/// One module of a career as seen by a student. Cached per user and career.
#[derive(Clone, Debug, Serialize)]
pub struct ModuleListing {
    #[serde(flatten)]
    pub module: Module,
    #[serde(flatten)]
    pub completion: Completion,
    pub prerequisites: Vec<i64>,
    pub is_unlocked: bool,
}

async fn list_careers(
    _guard: AuthGuard,
    State(state): State<AppState>,
) -> Result<Json<Vec<Career>>, AppError> {
    let careers = state.db.careers().await.reject("could not load careers")?;
    Ok(Json(careers))
}

async fn career(state: &AppState, slug: &str) -> Result<Career, AppError> {
    state
        .db
        .career_by_slug(slug)
        .await
        .reject("could not load career")?
        .or_not_found("error.career_not_found")
}

/// Resolve a module and check it belongs to the career named by `slug`.
async fn career_module(
    state: &AppState,
    slug: &str,
    module_id: i64,
) -> Result<(Career, Module), AppError> {
    let career = career(state, slug).await?;
    let module = state
        .db
        .module(module_id)
        .await
        .reject("could not load module")?
        .filter(|m| m.career_id == career.id)
        .or_not_found("error.module_not_found")?;

    Ok((career, module))
}

/// Module listings of a career for one student, served from the cache when fresh.
async fn module_listings(
    state: &AppState,
    user_id: i64,
    career: &Career,
) -> Result<Vec<ModuleListing>, AppError> {
    let key = names::module_cache_key(user_id, &career.slug);
    let prefix = names::module_cache_prefix(user_id);
    let generation = {
        let mut cache = state
            .module_cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(listings) = cache.get(&key) {
            tracing::debug!(%key, "module listing served from cache");
            return Ok(listings);
        }
        cache.generation(&prefix)
    };

    let modules = state
        .db
        .modules_for_career(career.id)
        .await
        .reject("could not load modules")?;
    let prerequisites = state
        .db
        .prerequisites_for_career(career.id)
        .await
        .reject("could not load prerequisites")?;
    let counts = state
        .db
        .module_lesson_counts(user_id, Some(career.id))
        .await
        .reject("could not count lessons")?;

    let completions: HashMap<i64, Completion> = counts
        .iter()
        .map(|c| {
            let completion =
                Completion::new(c.completed_lessons as usize, c.total_lessons as usize);
            (c.module_id, completion)
        })
        .collect();

    let mut required: HashMap<i64, Vec<i64>> = HashMap::new();
    for p in &prerequisites {
        required.entry(p.module_id).or_default().push(p.prerequisite_id);
    }

    let listings: Vec<ModuleListing> = modules
        .into_iter()
        .map(|module| {
            let prerequisites = required.remove(&module.id).unwrap_or_default();
            let completion = completions
                .get(&module.id)
                .copied()
                .unwrap_or_else(|| Completion::new(0, 0));
            ModuleListing {
                is_unlocked: progress::is_unlocked(&prerequisites, &completions),
                module,
                completion,
                prerequisites,
            }
        })
        .collect();

    let mut cache = state
        .module_cache
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    if !cache.set_if_unchanged(key, listings.clone(), &prefix, generation) {
        tracing::debug!(user_id, "progress changed during listing, not cached");
    }

    Ok(listings)
}

async fn list_modules(
    AuthGuard(user): AuthGuard,
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Vec<ModuleListing>>, AppError> {
    let career = career(&state, &slug).await?;
    let listings = module_listings(&state, user.id, &career).await?;
    Ok(Json(listings))
}

#[derive(Serialize)]
struct LessonEntry {
    #[serde(flatten)]
    lesson: LessonSummary,
    completed: bool,
}

#[derive(Serialize)]
struct ModuleDetail {
    #[serde(flatten)]
    listing: ModuleListing,
    lessons: Vec<LessonEntry>,
}

async fn get_module(
    AuthGuard(user): AuthGuard,
    State(state): State<AppState>,
    Path((slug, module_id)): Path<(String, i64)>,
) -> Result<Json<ModuleDetail>, AppError> {
    let (career, module) = career_module(&state, &slug, module_id).await?;

    let listing = module_listings(&state, user.id, &career)
        .await?
        .into_iter()
        .find(|l| l.module.id == module.id)
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

    let lessons = lessons
        .into_iter()
        .map(|lesson| LessonEntry {
            completed: completed.contains(&lesson.id),
            lesson,
        })
        .collect();

    Ok(Json(ModuleDetail { listing, lessons }))
}

#[derive(Serialize)]
struct LessonDetail {
    #[serde(flatten)]
    lesson: Lesson,
    assets: Vec<LessonAsset>,
    previous_lesson_id: Option<i64>,
    next_lesson_id: Option<i64>,
    progress: Option<ProgressRecord>,
}

/// Neighbours of `lesson_id` in reading order.
fn neighbours(lessons: &[LessonSummary], lesson_id: i64) -> (Option<i64>, Option<i64>) {
    let Some(index) = lessons.iter().position(|l| l.id == lesson_id) else {
        return (None, None);
    };
    let previous = index.checked_sub(1).map(|i| lessons[i].id);
    let next = lessons.get(index + 1).map(|l| l.id);
    (previous, next)
}

async fn get_lesson(
    AuthGuard(user): AuthGuard,
    State(state): State<AppState>,
    Path((slug, module_id, lesson_id)): Path<(String, i64, i64)>,
) -> Result<Json<LessonDetail>, AppError> {
    let (_, module) = career_module(&state, &slug, module_id).await?;

    let lesson = state
        .db
        .published_lesson(module.id, lesson_id)
        .await
        .reject("could not load lesson")?
        .or_not_found("error.lesson_not_found")?;

    let assets = state
        .db
        .lesson_assets(lesson.id)
        .await
        .reject("could not load lesson assets")?;
    let siblings = state
        .db
        .published_lessons(module.id)
        .await
        .reject("could not load lessons")?;
    let (previous_lesson_id, next_lesson_id) = neighbours(&siblings, lesson.id);
    let progress = state
        .db
        .progress_record(user.id, lesson.id)
        .await
        .reject("could not load progress")?;

    Ok(Json(LessonDetail {
        lesson,
        assets,
        previous_lesson_id,
        next_lesson_id,
        progress,
    }))
}

#[derive(Deserialize)]
struct CompleteLessonBody {
    #[serde(default)]
    time_spent_seconds: i64,
    #[serde(default)]
    score: Option<i64>,
}

#[derive(Serialize)]
struct CompleteLessonResponse {
    progress: ProgressRecord,
    module: Completion,
}

async fn complete_lesson(
    AuthGuard(user): AuthGuard,
    State(state): State<AppState>,
    Path((slug, module_id, lesson_id)): Path<(String, i64, i64)>,
    AppJson(body): AppJson<CompleteLessonBody>,
) -> Result<Json<CompleteLessonResponse>, AppError> {
    if !(0..=names::MAX_TIME_SPENT_SECONDS).contains(&body.time_spent_seconds) {
        return Err(AppError::Input("error.invalid_time_spent"));
    }
    if body.score.is_some_and(|s| !(0..=100).contains(&s)) {
        return Err(AppError::Input("error.invalid_score"));
    }

    let (_, module) = career_module(&state, &slug, module_id).await?;
    let lesson = state
        .db
        .published_lesson(module.id, lesson_id)
        .await
        .reject("could not load lesson")?
        .or_not_found("error.lesson_not_found")?;

    let progress = state
        .db
        .upsert_progress(
            user.id,
            lesson.id,
            state.clock.now(),
            body.time_spent_seconds,
            body.score,
        )
        .await
        .reject("could not record progress")?;

    state.invalidate_modules(user.id);

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
    let ids: Vec<i64> = lessons.iter().map(|l| l.id).collect();

    Ok(Json(CompleteLessonResponse {
        progress,
        module: Completion::from_ids(&ids, &completed),
    }))
}
