use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::scoring::percentage;

/// Completed vs total lessons of a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Completion {
    pub total_lessons: i64,
    pub completed_lessons: i64,
    pub completion_percentage: i64,
}

impl Completion {
    pub fn new(completed: usize, total: usize) -> Self {
        let completed = completed.min(total);
        Self {
            total_lessons: total as i64,
            completed_lessons: completed as i64,
            completion_percentage: percentage(completed, total),
        }
    }

    /// Count how many of `lesson_ids` appear in `completed_ids`.
    pub fn from_ids(lesson_ids: &[i64], completed_ids: &HashSet<i64>) -> Self {
        let done = lesson_ids
            .iter()
            .filter(|id| completed_ids.contains(id))
            .count();
        Self::new(done, lesson_ids.len())
    }

    /// A module without lessons is never complete.
    pub fn is_complete(&self) -> bool {
        self.total_lessons > 0 && self.completed_lessons >= self.total_lessons
    }
}

/// A module is unlocked when all of its prerequisites are complete.
/// Prerequisites missing from `completions` count as incomplete.
pub fn is_unlocked(prerequisites: &[i64], completions: &HashMap<i64, Completion>) -> bool {
    prerequisites
        .iter()
        .all(|id| completions.get(id).is_some_and(Completion::is_complete))
}
