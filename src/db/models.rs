// Database model structs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct AuthUser {
    pub id: i64,
    pub email: String,
    pub display_name: String,
}

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct Career {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub description: String,
}

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct Module {
    pub id: i64,
    pub career_id: i64,
    pub title: String,
    pub description: String,
    pub order_index: i64,
}

#[derive(sqlx::FromRow)]
pub struct Prerequisite {
    pub module_id: i64,
    pub prerequisite_id: i64,
}

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct LessonSummary {
    pub id: i64,
    pub module_id: i64,
    pub title: String,
    pub position: i64,
    pub duration_minutes: i64,
}

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct Lesson {
    pub id: i64,
    pub module_id: i64,
    pub title: String,
    pub position: i64,
    pub duration_minutes: i64,
    pub is_published: bool,
    pub content: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum MediaType {
    Audio,
    Image,
    Video,
    Document,
}

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct LessonAsset {
    pub id: i64,
    pub lesson_id: i64,
    pub media_type: MediaType,
    pub url: String,
    pub size_bytes: i64,
    pub duration_seconds: Option<i64>,
}

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct Assessment {
    pub id: i64,
    pub module_id: i64,
    pub title: String,
    pub description: String,
    pub passing_score: Option<i64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum QuestionKind {
    MultipleChoice,
    Text,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct AssessmentQuestion {
    pub id: i64,
    pub assessment_id: i64,
    pub position: i64,
    pub prompt: String,
    pub kind: QuestionKind,
    pub options: Json<Vec<String>>,
    pub correct_answer: String,
}

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct AssessmentResult {
    pub id: i64,
    pub student_id: i64,
    pub assessment_id: i64,
    pub score: i64,
    pub passed: bool,
    pub correct_count: i64,
    pub answered_count: i64,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: DateTime<Utc>,
}

pub struct NewAssessmentResult {
    pub student_id: i64,
    pub assessment_id: i64,
    pub score: i64,
    pub passed: bool,
    pub correct_count: i64,
    pub answered_count: i64,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct ProgressRecord {
    pub lesson_id: i64,
    pub completed_at: DateTime<Utc>,
    pub time_spent_seconds: i64,
    pub score: Option<i64>,
}

/// Published lesson total and one student's completions for a module.
#[derive(Debug, sqlx::FromRow)]
pub struct ModuleLessonCounts {
    pub module_id: i64,
    pub total_lessons: i64,
    pub completed_lessons: i64,
}

#[derive(Debug, sqlx::FromRow)]
pub struct StudentTotals {
    pub lessons_completed: i64,
    pub time_spent_seconds: i64,
}

#[derive(Debug, sqlx::FromRow)]
pub struct AssessmentTotals {
    pub taken: i64,
    pub passed: i64,
    pub average_score: Option<f64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    System,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
}

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct UserSettings {
    pub bio: String,
    pub native_language: Option<String>,
    pub theme: Theme,
    pub email_notifications: bool,
    pub lesson_reminders: bool,
    pub weekly_digest: bool,
    pub profile_visibility: Visibility,
    pub show_progress: bool,
}
