pub mod assessments;
pub mod auth;
pub mod careers;
pub mod health;
pub mod progress;
pub mod settings;
