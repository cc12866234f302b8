//! Application-wide error types.

use thiserror::Error;

use crate::assistant::rules::RuleError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),

    #[error("rule table error: {0}")]
    Rules(#[from] RuleError),

    #[error("logger error: {0}")]
    Logger(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
