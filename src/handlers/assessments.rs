use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    db::models::{Assessment, AssessmentQuestion, AssessmentResult, NewAssessmentResult, QuestionKind},
    extractors::{AppJson, AuthGuard},
    names,
    rejections::{AppError, OptionExt, ResultExt},
    scoring::{self, AnswerKey, QuestionOutcome, ScoringError, SubmittedAnswer},
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(names::MODULE_ASSESSMENTS_URL, get(list_assessments))
        .route(names::ASSESSMENT_URL, get(get_assessment))
        .route(names::SUBMIT_ASSESSMENT_URL, post(submit_assessment))
        .route(names::ASSESSMENT_RESULTS_URL, get(list_results))
}

#[derive(Serialize)]
struct AssessmentView {
    id: i64,
    module_id: i64,
    title: String,
    description: String,
    passing_score: i64,
}

impl From<Assessment> for AssessmentView {
    fn from(a: Assessment) -> Self {
        Self {
            id: a.id,
            module_id: a.module_id,
            title: a.title,
            description: a.description,
            passing_score: a.passing_score.unwrap_or(scoring::DEFAULT_PASSING_SCORE),
        }
    }
}

/// A question as shown to students: everything but the answer.
#[derive(Serialize)]
struct QuestionView {
    id: i64,
    position: i64,
    prompt: String,
    kind: QuestionKind,
    options: Vec<String>,
}

impl From<AssessmentQuestion> for QuestionView {
    fn from(q: AssessmentQuestion) -> Self {
        Self {
            id: q.id,
            position: q.position,
            prompt: q.prompt,
            kind: q.kind,
            options: q.options.0,
        }
    }
}

#[derive(Serialize)]
struct AssessmentDetail {
    #[serde(flatten)]
    assessment: AssessmentView,
    questions: Vec<QuestionView>,
}

async fn assessment(state: &AppState, id: i64) -> Result<Assessment, AppError> {
    state
        .db
        .assessment(id)
        .await
        .reject("could not load assessment")?
        .or_not_found("error.assessment_not_found")
}

async fn list_assessments(
    _guard: AuthGuard,
    State(state): State<AppState>,
    Path(module_id): Path<i64>,
) -> Result<Json<Vec<AssessmentView>>, AppError> {
    state
        .db
        .module(module_id)
        .await
        .reject("could not load module")?
        .or_not_found("error.module_not_found")?;

    let assessments = state
        .db
        .assessments_for_module(module_id)
        .await
        .reject("could not load assessments")?;

    Ok(Json(assessments.into_iter().map(Into::into).collect()))
}

async fn get_assessment(
    _guard: AuthGuard,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<AssessmentDetail>, AppError> {
    let assessment = assessment(&state, id).await?;
    let questions = state
        .db
        .assessment_questions(assessment.id)
        .await
        .reject("could not load questions")?;

    Ok(Json(AssessmentDetail {
        assessment: assessment.into(),
        questions: questions.into_iter().map(Into::into).collect(),
    }))
}

#[derive(Deserialize)]
struct SubmitBody {
    answers: Vec<SubmittedAnswer>,
    #[serde(default)]
    started_at: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
struct SubmitResponse {
    result_id: i64,
    score: i64,
    passed: bool,
    passing_score: i64,
    correct_count: usize,
    answered_count: usize,
    questions: Vec<QuestionOutcome>,
}

async fn submit_assessment(
    AuthGuard(user): AuthGuard,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    AppJson(body): AppJson<SubmitBody>,
) -> Result<(StatusCode, Json<SubmitResponse>), AppError> {
    if body.answers.is_empty() {
        return Err(AppError::Input("error.empty_answers"));
    }

    let assessment = assessment(&state, id).await?;
    let questions = state
        .db
        .assessment_questions(assessment.id)
        .await
        .reject("could not load questions")?;

    let key: Vec<AnswerKey<'_>> = questions
        .iter()
        .map(|q| AnswerKey {
            question_id: q.id,
            correct_answer: &q.correct_answer,
        })
        .collect();

    let card = scoring::grade(&key, &body.answers, assessment.passing_score).map_err(|e| match e {
        ScoringError::NoAnswers => AppError::Input("error.empty_answers"),
    })?;

    let result_id = state
        .db
        .insert_assessment_result(NewAssessmentResult {
            student_id: user.id,
            assessment_id: assessment.id,
            score: card.score,
            passed: card.passed,
            correct_count: card.correct as i64,
            answered_count: card.answered as i64,
            started_at: body.started_at,
            completed_at: state.clock.now(),
        })
        .await
        .reject("could not save assessment result")?;

    Ok((
        StatusCode::CREATED,
        Json(SubmitResponse {
            result_id,
            score: card.score,
            passed: card.passed,
            passing_score: card.passing_score,
            correct_count: card.correct,
            answered_count: card.answered,
            questions: card.outcomes,
        }),
    ))
}

async fn list_results(
    AuthGuard(user): AuthGuard,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<AssessmentResult>>, AppError> {
    let assessment = assessment(&state, id).await?;
    let results = state
        .db
        .assessment_results(user.id, assessment.id)
        .await
        .reject("could not load assessment results")?;

    Ok(Json(results))
}
