use std::collections::BTreeMap;
use std::fmt::Write as _;

use chrono::DateTime;
use chrono_tz::Tz;
use serde::Serialize;

use crate::domain::{Expense, Paise, format_rupees};

pub const EMPTY_REPORT: &str = "No expenses for the selected period.";

#[derive(Debug, Clone, Serialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total: Paise,
}

/// Per-category spend over a closed time window. Categories with no matching
/// records are absent; `skipped_partitions` names the ledger files the totals
/// could not see.
#[derive(Debug, Clone, Serialize)]
pub struct SpendReport {
    pub from_date: DateTime<Tz>,
    pub to_date: DateTime<Tz>,
    pub totals: Vec<CategoryTotal>,
    pub grand_total: Paise,
    pub skipped_partitions: Vec<String>,
}

impl SpendReport {
    /// Fold records into per-category totals, largest first. Ties are broken
    /// by category name so the same records always render the same report.
    pub fn aggregate(
        from_date: DateTime<Tz>,
        to_date: DateTime<Tz>,
        records: &[Expense],
        skipped_partitions: Vec<String>,
    ) -> Self {
        let mut by_category: BTreeMap<&str, Paise> = BTreeMap::new();
        for expense in records {
            *by_category.entry(expense.category.as_str()).or_insert(0) += expense.amount_paise;
        }

        let mut totals: Vec<CategoryTotal> = by_category
            .into_iter()
            .map(|(category, total)| CategoryTotal {
                category: category.to_string(),
                total,
            })
            .collect();
        totals.sort_by(|a, b| b.total.cmp(&a.total).then(a.category.cmp(&b.category)));
        let grand_total = totals.iter().map(|t| t.total).sum();

        Self {
            from_date,
            to_date,
            totals,
            grand_total,
            skipped_partitions,
        }
    }

    /// True when the window matched no records at all. A zero `grand_total`
    /// cannot occur otherwise, since stored amounts are positive.
    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    /// Chat-ready body: the category list, or the fixed empty sentinel.
    pub fn render(&self) -> String {
        if self.is_empty() {
            return EMPTY_REPORT.to_string();
        }
        let mut out = String::from("*Summary (₹ per category)*");
        for line in &self.totals {
            let _ = write!(out, "\n- {}: {}", line.category, format_rupees(line.total));
        }
        out
    }

    /// The weekly digest body: period header plus the category list.
    pub fn render_digest(&self) -> String {
        format!(
            "*Weekly Summary (Mon–Sun)*\nPeriod: {} → {}\n\n{}",
            self.from_date.format("%Y-%m-%d"),
            self.to_date.format("%Y-%m-%d"),
            self.render()
        )
    }
}

/// One budgeted category: configured monthly limit against spend so far.
#[derive(Debug, Clone, Serialize)]
pub struct BudgetLine {
    pub category: String,
    pub limit: Paise,
    pub spent: Paise,
}

impl BudgetLine {
    pub fn is_over(&self) -> bool {
        self.spent > self.limit
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BudgetReport {
    pub month: String,
    pub lines: Vec<BudgetLine>,
}

impl BudgetReport {
    pub fn render(&self) -> String {
        if self.lines.is_empty() {
            return "No budgets configured.".to_string();
        }
        let mut out = String::from("*Budget status (this month)*");
        for line in &self.lines {
            let _ = write!(
                out,
                "\n- {}: {} / {}{}",
                line.category,
                format_rupees(line.spent),
                format_rupees(line.limit),
                if line.is_over() { " (over)" } else { "" }
            );
        }
        out
    }
}

/// What the transport should deliver to one user after the weekly run.
#[derive(Debug, Clone, Serialize)]
pub struct UserDigest {
    pub user: String,
    pub chat_id: Option<i64>,
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Expense;
    use crate::domain::clock::ist;
    use chrono::NaiveDate;

    fn d(day: u32) -> chrono::DateTime<Tz> {
        ist(NaiveDate::from_ymd_opt(2026, 1, day).unwrap(), 12, 0, 0)
    }

    #[test]
    fn test_totals_sort_descending_with_name_tiebreak() {
        let records = vec![
            Expense::new(d(5), 3000, "travel"),
            Expense::new(d(5), 10000, "food"),
            Expense::new(d(6), 5000, "food"),
            Expense::new(d(6), 15000, "rent"),
        ];
        let report = SpendReport::aggregate(d(1), d(31), &records, Vec::new());

        let order: Vec<(&str, Paise)> = report
            .totals
            .iter()
            .map(|t| (t.category.as_str(), t.total))
            .collect();
        assert_eq!(
            order,
            vec![("food", 15000), ("rent", 15000), ("travel", 3000)]
        );
        assert_eq!(report.grand_total, 33000);
    }

    #[test]
    fn test_render_matches_chat_format() {
        let records = vec![
            Expense::new(d(5), 10000, "food"),
            Expense::new(d(6), 5000, "food"),
            Expense::new(d(6), 3000, "travel"),
        ];
        let report = SpendReport::aggregate(d(1), d(31), &records, Vec::new());
        assert_eq!(
            report.render(),
            "*Summary (₹ per category)*\n- food: ₹150.00\n- travel: ₹30.00"
        );
    }

    #[test]
    fn test_empty_report_renders_sentinel() {
        let report = SpendReport::aggregate(d(1), d(31), &[], Vec::new());
        assert!(report.is_empty());
        assert_eq!(report.render(), EMPTY_REPORT);
    }

    #[test]
    fn test_digest_header_carries_period() {
        let report = SpendReport::aggregate(d(5), d(11), &[], Vec::new());
        let text = report.render_digest();
        assert!(text.starts_with("*Weekly Summary (Mon–Sun)*\nPeriod: 2026-01-05 → 2026-01-11\n\n"));
        assert!(text.ends_with(EMPTY_REPORT));
    }

    #[test]
    fn test_budget_render_flags_overrun() {
        let report = BudgetReport {
            month: "2026_01".to_string(),
            lines: vec![
                BudgetLine {
                    category: "food".to_string(),
                    limit: 200000,
                    spent: 245000,
                },
                BudgetLine {
                    category: "travel".to_string(),
                    limit: 50000,
                    spent: 0,
                },
            ],
        };
        assert_eq!(
            report.render(),
            "*Budget status (this month)*\n- food: ₹2450.00 / ₹2000.00 (over)\n- travel: ₹0.00 / ₹500.00"
        );
    }

    #[test]
    fn test_no_budgets_renders_hint() {
        let report = BudgetReport {
            month: "2026_01".to_string(),
            lines: Vec::new(),
        };
        assert_eq!(report.render(), "No budgets configured.");
    }
}
