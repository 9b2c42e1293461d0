use color_eyre::Result;
use serde::Deserialize;

use super::models::{Theme, UserSettings, Visibility};
use super::Db;

/// Fields of the notification settings; `None` leaves a flag unchanged.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NotificationUpdate {
    pub email_notifications: Option<bool>,
    pub lesson_reminders: Option<bool>,
    pub weekly_digest: Option<bool>,
}

/// Fields of the privacy settings; `None` leaves a field unchanged.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PrivacyUpdate {
    pub profile_visibility: Option<Visibility>,
    pub show_progress: Option<bool>,
}

impl Db {
    /// Settings for a user, created with defaults on first access.
    pub async fn user_settings(&self, user_id: i64) -> Result<UserSettings> {
        sqlx::query("INSERT OR IGNORE INTO user_settings (user_id) VALUES (?)")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        let settings = sqlx::query_as::<_, UserSettings>(
            r#"
            SELECT bio, native_language, theme, email_notifications, lesson_reminders,
                   weekly_digest, profile_visibility, show_progress
            FROM user_settings
            WHERE user_id = ?
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(settings)
    }

    pub async fn update_profile(
        &self,
        user_id: i64,
        display_name: &str,
        bio: &str,
        native_language: Option<&str>,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE users SET display_name = ? WHERE id = ?")
            .bind(display_name)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO user_settings (user_id, bio, native_language) VALUES (?, ?, ?)
            ON CONFLICT(user_id) DO UPDATE SET
                bio = excluded.bio,
                native_language = excluded.native_language
            "#,
        )
        .bind(user_id)
        .bind(bio)
        .bind(native_language)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!("profile updated for user_id={user_id}");
        Ok(())
    }

    pub async fn update_theme(&self, user_id: i64, theme: Theme) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO user_settings (user_id, theme) VALUES (?, ?)
            ON CONFLICT(user_id) DO UPDATE SET theme = excluded.theme
            "#,
        )
        .bind(user_id)
        .bind(theme)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn update_notifications(&self, user_id: i64, update: NotificationUpdate) -> Result<()> {
        self.user_settings(user_id).await?;

        sqlx::query(
            r#"
            UPDATE user_settings SET
                email_notifications = COALESCE(?, email_notifications),
                lesson_reminders = COALESCE(?, lesson_reminders),
                weekly_digest = COALESCE(?, weekly_digest)
            WHERE user_id = ?
            "#,
        )
        .bind(update.email_notifications)
        .bind(update.lesson_reminders)
        .bind(update.weekly_digest)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn update_privacy(&self, user_id: i64, update: PrivacyUpdate) -> Result<()> {
        self.user_settings(user_id).await?;

        sqlx::query(
            r#"
            UPDATE user_settings SET
                profile_visibility = COALESCE(?, profile_visibility),
                show_progress = COALESCE(?, show_progress)
            WHERE user_id = ?
            "#,
        )
        .bind(update.profile_visibility)
        .bind(update.show_progress)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
