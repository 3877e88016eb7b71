use thiserror::Error;

use crate::storage::StoreError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid category: {0:?}")]
    InvalidCategory(String),

    #[error(
        "Unknown period: {0:?} (expected today, yesterday, this-week, last-week, this-month or last-month)"
    )]
    UnknownPeriod(String),

    #[error("User limit reached ({0} users max)")]
    UserLimitReached(usize),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}
