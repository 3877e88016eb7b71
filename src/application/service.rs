use std::path::PathBuf;

use chrono::DateTime;
use chrono_tz::Tz;
use tracing::{debug, warn};

use crate::domain::{
    Expense, Paise, ReportPeriod, format_paise, month_bounds, month_key, normalize_category,
    week_bounds,
};
use crate::storage::{ExpenseStore, MAX_USERS};

use super::AppError;
use super::reporting::{BudgetLine, BudgetReport, SpendReport, UserDigest};

/// Application service providing high-level operations over the expense
/// store. This is the primary interface for any client (bot handler, CLI).
pub struct ExpenseService {
    store: ExpenseStore,
}

impl ExpenseService {
    pub fn new(store: ExpenseStore) -> Self {
        Self { store }
    }

    /// Open a service over the given data directory. Directories are created
    /// lazily on first write.
    pub fn open(data_dir: impl Into<PathBuf>) -> Self {
        Self::new(ExpenseStore::new(data_dir))
    }

    /// Register the user on first contact, subject to the user cap.
    pub fn ensure_user(&self, user: &str, chat_id: Option<i64>) -> Result<(), AppError> {
        if self.store.ensure_user(user, chat_id)? {
            Ok(())
        } else {
            Err(AppError::UserLimitReached(MAX_USERS))
        }
    }

    /// Validate and append one expense. The partition it lands in follows
    /// from `spent_at`, so backdated entries file under their own week.
    pub fn record_expense(
        &self,
        user: &str,
        amount_paise: Paise,
        category: &str,
        note: Option<String>,
        spent_at: DateTime<Tz>,
    ) -> Result<Expense, AppError> {
        if amount_paise <= 0 {
            return Err(AppError::InvalidAmount(format_paise(amount_paise)));
        }
        let category =
            normalize_category(category).ok_or_else(|| AppError::InvalidCategory(category.to_string()))?;
        self.ensure_user(user, None)?;

        let mut expense = Expense::new(spent_at, amount_paise, category);
        if let Some(note) = note {
            expense = expense.with_note(note);
        }
        self.store.append(user, &expense)?;
        debug!(user, category = %expense.category, amount = expense.amount_paise, "recorded expense");
        Ok(expense)
    }

    /// Per-category totals for `start <= spent_at <= end`. Unreadable
    /// partitions are logged and reported as reduced coverage; the query
    /// itself never fails, so a fully unreadable window reads as empty.
    pub fn summarize(&self, user: &str, start: DateTime<Tz>, end: DateTime<Tz>) -> SpendReport {
        let loaded = self.store.load_between(user, start, end);
        let mut skipped = Vec::with_capacity(loaded.skipped.len());
        for skip in &loaded.skipped {
            warn!(user, partition = %skip.key, error = %skip.error, "skipping unreadable partition");
            skipped.push(skip.key.to_string());
        }
        SpendReport::aggregate(start, end, &loaded.records, skipped)
    }

    /// Summary over a named period, windowed from the caller's reference
    /// instant.
    pub fn summarize_period(
        &self,
        user: &str,
        period: ReportPeriod,
        now: DateTime<Tz>,
    ) -> SpendReport {
        let (start, end) = period.bounds(now);
        self.summarize(user, start, end)
    }

    /// This month's spend against each configured budget limit.
    pub fn budget_status(&self, user: &str, now: DateTime<Tz>) -> Result<BudgetReport, AppError> {
        let config = self.store.user_config(user)?;
        let (start, end) = month_bounds(now);
        let report = self.summarize(user, start, end);

        let lines = config
            .budgets
            .iter()
            .map(|(category, &limit)| BudgetLine {
                category: category.clone(),
                limit,
                spent: report
                    .totals
                    .iter()
                    .find(|t| &t.category == category)
                    .map(|t| t.total)
                    .unwrap_or(0),
            })
            .collect();
        Ok(BudgetReport {
            month: month_key(now),
            lines,
        })
    }

    /// Set one monthly budget limit. Registers the user if needed, so the
    /// user cap applies here too.
    pub fn set_budget(
        &self,
        user: &str,
        category: &str,
        limit: Paise,
    ) -> Result<(), AppError> {
        if limit <= 0 {
            return Err(AppError::InvalidAmount(format_paise(limit)));
        }
        let category =
            normalize_category(category).ok_or_else(|| AppError::InvalidCategory(category.to_string()))?;
        self.ensure_user(user, None)?;
        self.store.set_budget(user, &category, limit)?;
        Ok(())
    }

    /// The Mon–Sun digest for every known user. A user whose config cannot
    /// be read is skipped with a warning rather than failing the whole run.
    pub fn weekly_digest(&self, now: DateTime<Tz>) -> Result<Vec<UserDigest>, AppError> {
        let (start, end) = week_bounds(now);
        let mut digests = Vec::new();
        for user in self.store.users()? {
            let config = match self.store.user_config(&user) {
                Ok(config) => config,
                Err(error) => {
                    warn!(user = %user, %error, "skipping user with unreadable config");
                    continue;
                }
            };
            let report = self.summarize(&user, start, end);
            digests.push(UserDigest {
                text: report.render_digest(),
                chat_id: config.chat_id,
                user,
            });
        }
        Ok(digests)
    }

    /// Delete everything stored for the user.
    pub fn wipe_user(&self, user: &str) -> Result<(), AppError> {
        self.store.wipe_user(user)?;
        debug!(user, "wiped all user data");
        Ok(())
    }
}
