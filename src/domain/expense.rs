use chrono::DateTime;
use chrono_tz::Tz;

use super::Paise;

/// Longest category label accepted, matching the chat grammar.
pub const MAX_CATEGORY_LEN: usize = 31;

/// A single reported expense. Expenses are immutable once written and carry
/// no identifier: a record is known only by its position within its
/// partition file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expense {
    /// When the money was spent, in the canonical zone.
    pub spent_at: DateTime<Tz>,
    /// Amount in paise (always positive).
    pub amount_paise: Paise,
    /// Short lowercase label, e.g. "food" or "auto rickshaw".
    pub category: String,
    /// Optional free-text note.
    pub note: Option<String>,
}

impl Expense {
    pub fn new(spent_at: DateTime<Tz>, amount_paise: Paise, category: impl Into<String>) -> Self {
        assert!(amount_paise > 0, "Expense amount must be positive");
        Self {
            spent_at,
            amount_paise,
            category: category.into(),
            note: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Normalize a raw category label: trim, lowercase, and reject anything that
/// is not a letter followed by letters, digits, underscores, hyphens or
/// spaces, at most 31 characters total.
pub fn normalize_category(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.len() > MAX_CATEGORY_LEN {
        return None;
    }
    let mut chars = trimmed.chars();
    if !chars.next().is_some_and(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == ' ') {
        return None;
    }
    Some(trimmed.to_ascii_lowercase())
}
