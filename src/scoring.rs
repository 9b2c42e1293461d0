use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub const DEFAULT_PASSING_SCORE: i64 = 70;

/// The parts of a stored question needed to grade it.
pub struct AnswerKey<'a> {
    pub question_id: i64,
    pub correct_answer: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmittedAnswer {
    pub question_id: i64,
    #[serde(default)]
    pub selected_answer: Option<String>,
    #[serde(default)]
    pub text_answer: Option<String>,
}

impl SubmittedAnswer {
    /// `selected_answer` wins when both are present.
    pub fn value(&self) -> Option<&str> {
        self.selected_answer
            .as_deref()
            .or(self.text_answer.as_deref())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuestionOutcome {
    pub question_id: i64,
    pub correct: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreCard {
    pub correct: usize,
    pub answered: usize,
    pub score: i64,
    pub passing_score: i64,
    pub passed: bool,
    pub outcomes: Vec<QuestionOutcome>,
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ScoringError {
    #[error("no answers were submitted")]
    NoAnswers,
}

/// `round(part / whole * 100)` with halves rounded up, in integer arithmetic.
/// `whole == 0` gives 0.
pub fn percentage(part: usize, whole: usize) -> i64 {
    if whole == 0 {
        return 0;
    }
    let part = part.min(whole) as i64;
    let whole = whole as i64;
    (200 * part + whole) / (2 * whole)
}

/// Grade a submission against its answer key.
///
/// Answers are compared with plain string equality. An answer naming a
/// question that is not part of the assessment counts as incorrect. The
/// score is taken over the number of submitted answers.
pub fn grade(
    key: &[AnswerKey<'_>],
    answers: &[SubmittedAnswer],
    passing_score: Option<i64>,
) -> Result<ScoreCard, ScoringError> {
    if answers.is_empty() {
        return Err(ScoringError::NoAnswers);
    }

    let by_id: HashMap<i64, &str> = key
        .iter()
        .map(|k| (k.question_id, k.correct_answer))
        .collect();

    let outcomes: Vec<QuestionOutcome> = answers
        .iter()
        .map(|a| {
            let correct = match (by_id.get(&a.question_id), a.value()) {
                (Some(expected), Some(given)) => *expected == given,
                _ => false,
            };
            QuestionOutcome {
                question_id: a.question_id,
                correct,
            }
        })
        .collect();

    let correct = outcomes.iter().filter(|o| o.correct).count();
    let answered = outcomes.len();
    let score = percentage(correct, answered);
    let passing_score = passing_score.unwrap_or(DEFAULT_PASSING_SCORE);

    Ok(ScoreCard {
        correct,
        answered,
        score,
        passing_score,
        passed: score >= passing_score,
        outcomes,
    })
}
