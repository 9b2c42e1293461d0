use chrono::{DateTime, Utc};
use color_eyre::Result;

use crate::clock::SharedClock;
use crate::db::models::AuthUser;
use crate::db::Db;

// ---------------------------------------------------------------------------
// AuthRepository trait (DIP: service defines the abstraction it needs)
// ---------------------------------------------------------------------------

#[cfg_attr(test, mockall::automock)]
pub trait AuthRepository: Send + Sync {
    fn email_exists(&self, email: &str) -> impl std::future::Future<Output = Result<bool>> + Send;

    fn create_user(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
        now: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<i64>> + Send;

    fn create_user_session(
        &self,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<String>> + Send;

    fn verify_user_password(
        &self,
        email: &str,
        password: &str,
    ) -> impl std::future::Future<Output = Result<bool>> + Send;

    fn find_user_by_email(
        &self,
        email: &str,
    ) -> impl std::future::Future<Output = Result<Option<AuthUser>>> + Send;

    fn delete_user_session(
        &self,
        session_id: &str,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    fn change_password(
        &self,
        user_id: i64,
        current_password: &str,
        new_password: &str,
    ) -> impl std::future::Future<Output = Result<bool>> + Send;
}

impl AuthRepository for Db {
    async fn email_exists(&self, email: &str) -> Result<bool> {
        Db::email_exists(self, email).await
    }

    async fn create_user(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
        now: DateTime<Utc>,
    ) -> Result<i64> {
        Db::create_user(self, email, password, display_name, now).await
    }

    async fn create_user_session(&self, user_id: i64, now: DateTime<Utc>) -> Result<String> {
        Db::create_user_session(self, user_id, now).await
    }

    async fn verify_user_password(&self, email: &str, password: &str) -> Result<bool> {
        Db::verify_user_password(self, email, password).await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<AuthUser>> {
        Db::find_user_by_email(self, email).await
    }

    async fn delete_user_session(&self, session_id: &str) -> Result<()> {
        Db::delete_user_session(self, session_id).await
    }

    async fn change_password(
        &self,
        user_id: i64,
        current_password: &str,
        new_password: &str,
    ) -> Result<bool> {
        Db::change_password(self, user_id, current_password, new_password).await
    }
}

// ---------------------------------------------------------------------------
// Outcome enums
// ---------------------------------------------------------------------------

pub enum RegisterOutcome {
    /// User created and session started. Contains the session token.
    LoggedIn(String),
    /// Required fields were empty.
    EmptyFields,
    /// Email does not look like an address.
    InvalidEmail,
    /// Email already in use.
    EmailTaken,
    /// Password does not meet minimum requirements.
    WeakPassword,
}

pub enum LoginOutcome {
    /// Login succeeded. Contains the session token.
    Success(String),
    /// Password was incorrect (or email not found).
    InvalidCredentials,
}

pub enum ChangePasswordOutcome {
    Success,
    EmptyFields,
    WeakPassword,
    IncorrectPassword,
}

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Emails are stored and compared trimmed and lower-cased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.'),
        None => false,
    }
}

// ---------------------------------------------------------------------------
// AuthService
// ---------------------------------------------------------------------------

pub struct AuthService<R: AuthRepository = Db> {
    repo: R,
    clock: SharedClock,
}

impl<R: AuthRepository + Clone> Clone for AuthService<R> {
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            clock: self.clock.clone(),
        }
    }
}

impl<R: AuthRepository> AuthService<R> {
    pub fn new(repo: R, clock: SharedClock) -> Self {
        Self { repo, clock }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome> {
        let email = normalize_email(email);
        let verified = self.repo.verify_user_password(&email, password).await?;

        if !verified {
            return Ok(LoginOutcome::InvalidCredentials);
        }

        let user =
            self.repo.find_user_by_email(&email).await?.ok_or_else(|| {
                color_eyre::eyre::eyre!("user not found after password verification")
            })?;

        let session_token = self
            .repo
            .create_user_session(user.id, self.clock.now())
            .await?;

        Ok(LoginOutcome::Success(session_token))
    }

    pub async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<RegisterOutcome> {
        let email = normalize_email(email);
        let display_name = display_name.trim();

        if email.is_empty() || password.is_empty() || display_name.is_empty() {
            return Ok(RegisterOutcome::EmptyFields);
        }

        if !looks_like_email(&email) {
            return Ok(RegisterOutcome::InvalidEmail);
        }

        if password.len() < MIN_PASSWORD_LENGTH {
            return Ok(RegisterOutcome::WeakPassword);
        }

        let exists = self.repo.email_exists(&email).await?;
        if exists {
            return Ok(RegisterOutcome::EmailTaken);
        }

        let now = self.clock.now();
        let user_id = self
            .repo
            .create_user(&email, password, display_name, now)
            .await?;
        let session_token = self.repo.create_user_session(user_id, now).await?;

        Ok(RegisterOutcome::LoggedIn(session_token))
    }

    pub async fn logout(&self, session_id: &str) -> Result<()> {
        self.repo.delete_user_session(session_id).await
    }

    pub async fn change_password(
        &self,
        user_id: i64,
        current_password: &str,
        new_password: &str,
    ) -> Result<ChangePasswordOutcome> {
        if current_password.is_empty() || new_password.is_empty() {
            return Ok(ChangePasswordOutcome::EmptyFields);
        }

        if new_password.len() < MIN_PASSWORD_LENGTH {
            return Ok(ChangePasswordOutcome::WeakPassword);
        }

        let changed = self
            .repo
            .change_password(user_id, current_password, new_password)
            .await?;

        if changed {
            Ok(ChangePasswordOutcome::Success)
        } else {
            Ok(ChangePasswordOutcome::IncorrectPassword)
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
