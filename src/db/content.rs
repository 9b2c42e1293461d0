use std::collections::HashMap;

use color_eyre::{eyre::OptionExt, Result};
use sqlx::types::Json;

use super::models::{Career, Lesson, LessonAsset, LessonSummary, Module, Prerequisite};
use super::Db;
use crate::models::CareerImport;

impl Db {
    /// Insert a career with its modules, lessons, assets and assessments in a
    /// single transaction. A career whose slug already exists is left alone and
    /// `None` is returned.
    pub async fn load_career(&self, career: CareerImport) -> Result<Option<i64>> {
        let mut tx = self.pool.begin().await?;

        let existing: Option<i64> = sqlx::query_scalar("SELECT id FROM careers WHERE slug = ?")
            .bind(&career.slug)
            .fetch_optional(&mut *tx)
            .await?;
        if existing.is_some() {
            tracing::info!(slug = %career.slug, "career already present, skipping import");
            return Ok(None);
        }

        let career_id: i64 = sqlx::query_scalar(
            "INSERT INTO careers (slug, title, description) VALUES (?, ?, ?) RETURNING id",
        )
        .bind(&career.slug)
        .bind(&career.title)
        .bind(&career.description)
        .fetch_one(&mut *tx)
        .await?;

        let mut module_ids: HashMap<&str, i64> = HashMap::new();

        for module in &career.modules {
            let module_id: i64 = sqlx::query_scalar(
                "INSERT INTO modules (career_id, title, description, order_index) VALUES (?, ?, ?, ?) RETURNING id",
            )
            .bind(career_id)
            .bind(&module.title)
            .bind(&module.description)
            .bind(module.order_index)
            .fetch_one(&mut *tx)
            .await?;
            module_ids.insert(module.title.as_str(), module_id);

            for lesson in &module.lessons {
                let lesson_id: i64 = sqlx::query_scalar(
                    r#"
                    INSERT INTO lessons (module_id, title, position, duration_minutes, is_published, content)
                    VALUES (?, ?, ?, ?, ?, ?)
                    RETURNING id
                    "#,
                )
                .bind(module_id)
                .bind(&lesson.title)
                .bind(lesson.position)
                .bind(lesson.duration_minutes)
                .bind(lesson.is_published)
                .bind(&lesson.content)
                .fetch_one(&mut *tx)
                .await?;

                for asset in &lesson.assets {
                    sqlx::query(
                        "INSERT INTO lesson_assets (lesson_id, media_type, url, size_bytes, duration_seconds) VALUES (?, ?, ?, ?, ?)",
                    )
                    .bind(lesson_id)
                    .bind(asset.media_type)
                    .bind(&asset.url)
                    .bind(asset.size_bytes)
                    .bind(asset.duration_seconds)
                    .execute(&mut *tx)
                    .await?;
                }
            }

            for assessment in &module.assessments {
                let assessment_id: i64 = sqlx::query_scalar(
                    "INSERT INTO assessments (module_id, title, description, passing_score) VALUES (?, ?, ?, ?) RETURNING id",
                )
                .bind(module_id)
                .bind(&assessment.title)
                .bind(&assessment.description)
                .bind(assessment.passing_score)
                .fetch_one(&mut *tx)
                .await?;

                for (position, question) in assessment.questions.iter().enumerate() {
                    sqlx::query(
                        r#"
                        INSERT INTO assessment_questions (assessment_id, position, prompt, kind, options, correct_answer)
                        VALUES (?, ?, ?, ?, ?, ?)
                        "#,
                    )
                    .bind(assessment_id)
                    .bind(position as i64)
                    .bind(&question.prompt)
                    .bind(question.kind)
                    .bind(Json(&question.options))
                    .bind(&question.correct_answer)
                    .execute(&mut *tx)
                    .await?;
                }
            }
        }

        // Prerequisites refer to modules by title, so they go in once every
        // module of the career has an id.
        for module in &career.modules {
            let module_id = module_ids[module.title.as_str()];
            for title in &module.prerequisites {
                let prerequisite_id = *module_ids
                    .get(title.as_str())
                    .ok_or_eyre(format!("unknown prerequisite module '{title}'"))?;
                sqlx::query(
                    "INSERT INTO module_prerequisites (module_id, prerequisite_id) VALUES (?, ?)",
                )
                .bind(module_id)
                .bind(prerequisite_id)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;

        tracing::info!(
            "new career imported: id={career_id}, slug={}, modules={}",
            career.slug,
            career.modules.len()
        );
        Ok(Some(career_id))
    }

    pub async fn careers(&self) -> Result<Vec<Career>> {
        let careers = sqlx::query_as::<_, Career>(
            "SELECT id, slug, title, description FROM careers ORDER BY title",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(careers)
    }

    pub async fn career_by_slug(&self, slug: &str) -> Result<Option<Career>> {
        let career = sqlx::query_as::<_, Career>(
            "SELECT id, slug, title, description FROM careers WHERE slug = ?",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(career)
    }

    pub async fn modules_for_career(&self, career_id: i64) -> Result<Vec<Module>> {
        let modules = sqlx::query_as::<_, Module>(
            r#"
            SELECT id, career_id, title, description, order_index
            FROM modules
            WHERE career_id = ?
            ORDER BY order_index, id
            "#,
        )
        .bind(career_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(modules)
    }

    pub async fn prerequisites_for_career(&self, career_id: i64) -> Result<Vec<Prerequisite>> {
        let prerequisites = sqlx::query_as::<_, Prerequisite>(
            r#"
            SELECT p.module_id, p.prerequisite_id
            FROM module_prerequisites p
            JOIN modules m ON m.id = p.module_id
            WHERE m.career_id = ?
            ORDER BY p.module_id, p.prerequisite_id
            "#,
        )
        .bind(career_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(prerequisites)
    }

    pub async fn module(&self, module_id: i64) -> Result<Option<Module>> {
        let module = sqlx::query_as::<_, Module>(
            "SELECT id, career_id, title, description, order_index FROM modules WHERE id = ?",
        )
        .bind(module_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(module)
    }

    /// Published lessons of a module in reading order.
    pub async fn published_lessons(&self, module_id: i64) -> Result<Vec<LessonSummary>> {
        let lessons = sqlx::query_as::<_, LessonSummary>(
            r#"
            SELECT id, module_id, title, position, duration_minutes
            FROM lessons
            WHERE module_id = ? AND is_published = 1
            ORDER BY position, id
            "#,
        )
        .bind(module_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lessons)
    }

    pub async fn published_lesson(&self, module_id: i64, lesson_id: i64) -> Result<Option<Lesson>> {
        let lesson = sqlx::query_as::<_, Lesson>(
            r#"
            SELECT id, module_id, title, position, duration_minutes, is_published, content
            FROM lessons
            WHERE id = ? AND module_id = ? AND is_published = 1
            "#,
        )
        .bind(lesson_id)
        .bind(module_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(lesson)
    }

    pub async fn lesson_assets(&self, lesson_id: i64) -> Result<Vec<LessonAsset>> {
        let assets = sqlx::query_as::<_, LessonAsset>(
            r#"
            SELECT id, lesson_id, media_type, url, size_bytes, duration_seconds
            FROM lesson_assets
            WHERE lesson_id = ?
            ORDER BY id
            "#,
        )
        .bind(lesson_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(assets)
    }
}
