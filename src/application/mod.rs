mod error;
mod reporting;
mod service;

pub use error::AppError;
pub use reporting::{
    BudgetLine, BudgetReport, CategoryTotal, EMPTY_REPORT, SpendReport, UserDigest,
};
pub use service::ExpenseService;
