//! Shapes of the JSON content file imported with `--seed`.

use serde::Deserialize;

use crate::db::{MediaType, QuestionKind};

pub type Careers = Vec<CareerImport>;

#[derive(Deserialize)]
pub struct CareerImport {
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub modules: Vec<ModuleImport>,
}

#[derive(Deserialize)]
pub struct ModuleImport {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub order_index: i64,
    /// Titles of modules in the same career that must be completed first.
    #[serde(default)]
    pub prerequisites: Vec<String>,
    #[serde(default)]
    pub lessons: Vec<LessonImport>,
    #[serde(default)]
    pub assessments: Vec<AssessmentImport>,
}

#[derive(Deserialize)]
pub struct LessonImport {
    pub title: String,
    pub position: i64,
    #[serde(default)]
    pub duration_minutes: i64,
    #[serde(default = "published_by_default")]
    pub is_published: bool,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub assets: Vec<AssetImport>,
}

fn published_by_default() -> bool {
    true
}

#[derive(Deserialize)]
pub struct AssetImport {
    pub media_type: MediaType,
    pub url: String,
    #[serde(default)]
    pub size_bytes: i64,
    pub duration_seconds: Option<i64>,
}

#[derive(Deserialize)]
pub struct AssessmentImport {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub passing_score: Option<i64>,
    pub questions: Vec<QuestionImport>,
}

#[derive(Deserialize)]
pub struct QuestionImport {
    pub prompt: String,
    #[serde(default = "multiple_choice")]
    pub kind: QuestionKind,
    #[serde(default)]
    pub options: Vec<String>,
    pub correct_answer: String,
}

fn multiple_choice() -> QuestionKind {
    QuestionKind::MultipleChoice
}
