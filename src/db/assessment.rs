use color_eyre::Result;

use super::models::{
    Assessment, AssessmentQuestion, AssessmentResult, AssessmentTotals, NewAssessmentResult,
};
use super::Db;

impl Db {
    pub async fn assessments_for_module(&self, module_id: i64) -> Result<Vec<Assessment>> {
        let assessments = sqlx::query_as::<_, Assessment>(
            r#"
            SELECT id, module_id, title, description, passing_score
            FROM assessments
            WHERE module_id = ?
            ORDER BY id
            "#,
        )
        .bind(module_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(assessments)
    }

    pub async fn assessment(&self, assessment_id: i64) -> Result<Option<Assessment>> {
        let assessment = sqlx::query_as::<_, Assessment>(
            "SELECT id, module_id, title, description, passing_score FROM assessments WHERE id = ?",
        )
        .bind(assessment_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(assessment)
    }

    pub async fn assessment_questions(&self, assessment_id: i64) -> Result<Vec<AssessmentQuestion>> {
        let questions = sqlx::query_as::<_, AssessmentQuestion>(
            r#"
            SELECT id, assessment_id, position, prompt, kind, options, correct_answer
            FROM assessment_questions
            WHERE assessment_id = ?
            ORDER BY position, id
            "#,
        )
        .bind(assessment_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(questions)
    }

    pub async fn insert_assessment_result(&self, result: NewAssessmentResult) -> Result<i64> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO student_assessment_results
                (student_id, assessment_id, score, passed, correct_count, answered_count, started_at, completed_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(result.student_id)
        .bind(result.assessment_id)
        .bind(result.score)
        .bind(result.passed)
        .bind(result.correct_count)
        .bind(result.answered_count)
        .bind(result.started_at)
        .bind(result.completed_at)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(
            "assessment result saved: id={id} student={} assessment={} score={} passed={}",
            result.student_id,
            result.assessment_id,
            result.score,
            result.passed
        );
        Ok(id)
    }

    /// A student's attempts at one assessment, newest first.
    pub async fn assessment_results(
        &self,
        student_id: i64,
        assessment_id: i64,
    ) -> Result<Vec<AssessmentResult>> {
        let results = sqlx::query_as::<_, AssessmentResult>(
            r#"
            SELECT id, student_id, assessment_id, score, passed, correct_count, answered_count,
                   started_at, completed_at
            FROM student_assessment_results
            WHERE student_id = ? AND assessment_id = ?
            ORDER BY id DESC
            "#,
        )
        .bind(student_id)
        .bind(assessment_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(results)
    }

    /// Counts distinct assessments: taken, passed at least once, and the
    /// average of each assessment's best score.
    pub async fn assessment_totals(&self, student_id: i64) -> Result<AssessmentTotals> {
        let totals = sqlx::query_as::<_, AssessmentTotals>(
            r#"
            SELECT
                COUNT(*) AS taken,
                COALESCE(SUM(passed), 0) AS passed,
                AVG(best_score) AS average_score
            FROM (
                SELECT assessment_id, MAX(score) AS best_score, MAX(passed) AS passed
                FROM student_assessment_results
                WHERE student_id = ?
                GROUP BY assessment_id
            )
            "#,
        )
        .bind(student_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(totals)
    }
}
