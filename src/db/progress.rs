use std::collections::HashSet;

use chrono::{DateTime, Utc};
use color_eyre::Result;

use super::models::{ModuleLessonCounts, ProgressRecord, StudentTotals};
use super::Db;

impl Db {
    /// Record a lesson completion. Completing the same lesson again updates the
    /// existing row; a missing score keeps the previous one.
    pub async fn upsert_progress(
        &self,
        student_id: i64,
        lesson_id: i64,
        completed_at: DateTime<Utc>,
        time_spent_seconds: i64,
        score: Option<i64>,
    ) -> Result<ProgressRecord> {
        let record = sqlx::query_as::<_, ProgressRecord>(
            r#"
            INSERT INTO student_progress (student_id, lesson_id, completed_at, time_spent_seconds, score)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(student_id, lesson_id) DO UPDATE SET
                completed_at = excluded.completed_at,
                time_spent_seconds = excluded.time_spent_seconds,
                score = COALESCE(excluded.score, student_progress.score)
            RETURNING lesson_id, completed_at, time_spent_seconds, score
            "#,
        )
        .bind(student_id)
        .bind(lesson_id)
        .bind(completed_at)
        .bind(time_spent_seconds)
        .bind(score)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!("progress recorded for student={student_id} lesson={lesson_id}");
        Ok(record)
    }

    pub async fn progress_record(
        &self,
        student_id: i64,
        lesson_id: i64,
    ) -> Result<Option<ProgressRecord>> {
        let record = sqlx::query_as::<_, ProgressRecord>(
            r#"
            SELECT lesson_id, completed_at, time_spent_seconds, score
            FROM student_progress
            WHERE student_id = ? AND lesson_id = ?
            "#,
        )
        .bind(student_id)
        .bind(lesson_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Ids of the lessons in a module the student has completed.
    pub async fn completed_lesson_ids(&self, student_id: i64, module_id: i64) -> Result<HashSet<i64>> {
        let ids: Vec<i64> = sqlx::query_scalar(
            r#"
            SELECT p.lesson_id
            FROM student_progress p
            JOIN lessons l ON l.id = p.lesson_id
            WHERE p.student_id = ? AND l.module_id = ?
            "#,
        )
        .bind(student_id)
        .bind(module_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids.into_iter().collect())
    }

    /// Time spent on the lessons of one module.
    pub async fn module_time_spent(&self, student_id: i64, module_id: i64) -> Result<i64> {
        let seconds: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(p.time_spent_seconds), 0)
            FROM student_progress p
            JOIN lessons l ON l.id = p.lesson_id
            WHERE p.student_id = ? AND l.module_id = ? AND l.is_published = 1
            "#,
        )
        .bind(student_id)
        .bind(module_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(seconds)
    }

    /// Published lesson totals and the student's completions for every module,
    /// optionally restricted to one career.
    pub async fn module_lesson_counts(
        &self,
        student_id: i64,
        career_id: Option<i64>,
    ) -> Result<Vec<ModuleLessonCounts>> {
        let counts = sqlx::query_as::<_, ModuleLessonCounts>(
            r#"
            SELECT
                m.id AS module_id,
                COUNT(l.id) AS total_lessons,
                COUNT(p.id) AS completed_lessons
            FROM modules m
            LEFT JOIN lessons l ON l.module_id = m.id AND l.is_published = 1
            LEFT JOIN student_progress p ON p.lesson_id = l.id AND p.student_id = ?
            WHERE ? IS NULL OR m.career_id = ?
            GROUP BY m.id
            ORDER BY m.id
            "#,
        )
        .bind(student_id)
        .bind(career_id)
        .bind(career_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(counts)
    }

    /// Completion timestamps of every lesson the student finished.
    pub async fn activity_timestamps(&self, student_id: i64) -> Result<Vec<DateTime<Utc>>> {
        let timestamps: Vec<DateTime<Utc>> = sqlx::query_scalar(
            "SELECT completed_at FROM student_progress WHERE student_id = ? ORDER BY completed_at DESC",
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(timestamps)
    }

    /// Lessons completed and time spent, counting published lessons only.
    pub async fn student_totals(&self, student_id: i64) -> Result<StudentTotals> {
        let totals = sqlx::query_as::<_, StudentTotals>(
            r#"
            SELECT
                COUNT(p.id) AS lessons_completed,
                COALESCE(SUM(p.time_spent_seconds), 0) AS time_spent_seconds
            FROM student_progress p
            JOIN lessons l ON l.id = p.lesson_id
            WHERE p.student_id = ? AND l.is_published = 1
            "#,
        )
        .bind(student_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(totals)
    }
}
