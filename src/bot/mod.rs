mod session;

pub use session::{Flow, Session, SessionStore};

use chrono::DateTime;
use chrono_tz::Tz;
use tracing::warn;

use crate::application::{AppError, ExpenseService};
use crate::domain::{Paise, ReportPeriod, format_rupees, normalize_category, parse_paise};

pub const MENU: &str = "Index Menu:\n\
1. expensethisweek\n\
2. expenselastweek\n\
3. expensethismonth\n\
4. expenselastmonth\n\
5. budgetstatus\n\
6. delete all my data\n\
7. help\n\
\n\
Send only a number after I show this menu.\n\
Or send expense in format: amount category (e.g., 200 food)";

pub const HELP: &str = "Send 'amount category' (e.g., 200 food) to record an expense.\n\
Amounts take up to two decimals; categories start with a letter.\n\
Right after the menu, a bare number 1-7 picks that entry.\n\
All dates are IST; weeks run Mon-Sun.";

pub const USER_LIMIT_REPLY: &str = "Sorry, this bot is not accepting more users (>5).";

const WIPE_CONFIRM_PROMPT: &str =
    "This will delete ALL your data. Reply 'yes' within 10 minutes to confirm.";

/// One classified chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Incoming {
    /// "amount category", e.g. "200 food" or "99.50 auto rickshaw".
    Expense { amount_paise: Paise, category: String },
    /// A bare menu digit, 1 through 7.
    MenuChoice(u8),
    /// A "yes", only meaningful while a wipe confirmation is pending.
    Confirm,
    /// Anything else; answered with the menu.
    Other,
}

/// Classify a message. The expense form is an integer-or-decimal amount (at
/// most two fraction digits), whitespace, then a category that starts with a
/// letter and stays within the stored label rules.
pub fn parse_message(text: &str) -> Incoming {
    let text = text.trim();

    if text.eq_ignore_ascii_case("yes") {
        return Incoming::Confirm;
    }
    if text.len() == 1 {
        if let Some(digit @ 1..=7) = text.chars().next().and_then(|c| c.to_digit(10)) {
            return Incoming::MenuChoice(digit as u8);
        }
    }
    if let Some((amount_token, rest)) = text.split_once(char::is_whitespace) {
        if let (Some(amount_paise), Some(category)) =
            (parse_amount_token(amount_token), normalize_category(rest))
        {
            return Incoming::Expense {
                amount_paise,
                category,
            };
        }
    }
    Incoming::Other
}

/// Amount grammar: digits, optionally followed by a dot and one or two more
/// digits. Stricter than the money parser, which also tolerates sign and
/// extra decimals.
fn parse_amount_token(token: &str) -> Option<Paise> {
    let (int_part, frac_part) = match token.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (token, None),
    };
    if int_part.is_empty() || !int_part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if let Some(frac) = frac_part {
        if frac.is_empty() || frac.len() > 2 || !frac.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
    }
    parse_paise(token).ok()
}

/// The full dispatch: register the sender, classify the message, and answer
/// it. Every path returns a reply string for the transport to deliver.
pub fn handle_message(
    service: &ExpenseService,
    sessions: &mut SessionStore,
    user: &str,
    chat_id: Option<i64>,
    text: &str,
    now: DateTime<Tz>,
) -> String {
    if let Err(error) = service.ensure_user(user, chat_id) {
        return match error {
            AppError::UserLimitReached(_) => USER_LIMIT_REPLY.to_string(),
            other => {
                warn!(user, error = %other, "could not register user");
                other.to_string()
            }
        };
    }

    let flow = sessions.flow(user, now);
    match parse_message(text) {
        Incoming::Confirm if flow == Flow::AwaitingWipeConfirm => {
            sessions.clear(user);
            match service.wipe_user(user) {
                Ok(()) => "All your data has been deleted.".to_string(),
                Err(error) => error.to_string(),
            }
        }
        Incoming::Expense {
            amount_paise,
            category,
        } => {
            sessions.clear(user);
            match service.record_expense(user, amount_paise, &category, None, now) {
                Ok(expense) => format!(
                    "Saved {} in '{}'.",
                    format_rupees(expense.amount_paise),
                    expense.category
                ),
                Err(error) => error.to_string(),
            }
        }
        Incoming::MenuChoice(choice) if flow == Flow::MenuOffered => {
            answer_menu_choice(service, sessions, user, choice, now)
        }
        // Stale digits, stray confirmations and everything unrecognized
        // re-offer the menu.
        _ => {
            sessions.set(user, Flow::MenuOffered, now);
            MENU.to_string()
        }
    }
}

fn answer_menu_choice(
    service: &ExpenseService,
    sessions: &mut SessionStore,
    user: &str,
    choice: u8,
    now: DateTime<Tz>,
) -> String {
    match choice {
        1..=4 => {
            let period = match choice {
                1 => ReportPeriod::ThisWeek,
                2 => ReportPeriod::LastWeek,
                3 => ReportPeriod::ThisMonth,
                _ => ReportPeriod::LastMonth,
            };
            // Answering a report keeps the menu offer fresh, so the user can
            // pick another number right away.
            sessions.set(user, Flow::MenuOffered, now);
            let report = service.summarize_period(user, period, now);
            format!(
                "Period: {} → {}\n{}",
                report.from_date.format("%Y-%m-%d"),
                report.to_date.format("%Y-%m-%d"),
                report.render()
            )
        }
        5 => {
            sessions.set(user, Flow::MenuOffered, now);
            match service.budget_status(user, now) {
                Ok(report) => report.render(),
                Err(error) => error.to_string(),
            }
        }
        6 => {
            sessions.set(user, Flow::AwaitingWipeConfirm, now);
            WIPE_CONFIRM_PROMPT.to_string()
        }
        _ => {
            sessions.set(user, Flow::MenuOffered, now);
            HELP.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expense_messages_parse() {
        assert_eq!(
            parse_message("200 food"),
            Incoming::Expense {
                amount_paise: 20000,
                category: "food".to_string()
            }
        );
        assert_eq!(
            parse_message("  99.50  Auto Rickshaw "),
            Incoming::Expense {
                amount_paise: 9950,
                category: "auto rickshaw".to_string()
            }
        );
        assert_eq!(
            parse_message("12.5 chai"),
            Incoming::Expense {
                amount_paise: 1250,
                category: "chai".to_string()
            }
        );
    }

    #[test]
    fn test_bad_expense_shapes_are_other() {
        // no category
        assert_eq!(parse_message("200"), Incoming::Other);
        // category first
        assert_eq!(parse_message("food 200"), Incoming::Other);
        // three decimals
        assert_eq!(parse_message("12.999 chai"), Incoming::Other);
        // trailing dot
        assert_eq!(parse_message("12. chai"), Incoming::Other);
        // signed amount
        assert_eq!(parse_message("-5 food"), Incoming::Other);
        // category starting with a digit
        assert_eq!(parse_message("200 4wheeler"), Incoming::Other);
        // category too long
        assert_eq!(
            parse_message("200 abcdefghijklmnopqrstuvwxyzabcdefgh"),
            Incoming::Other
        );
        assert_eq!(parse_message(""), Incoming::Other);
    }

    #[test]
    fn test_menu_digits_parse() {
        assert_eq!(parse_message("1"), Incoming::MenuChoice(1));
        assert_eq!(parse_message(" 7 "), Incoming::MenuChoice(7));
        assert_eq!(parse_message("0"), Incoming::Other);
        assert_eq!(parse_message("8"), Incoming::Other);
        assert_eq!(parse_message("12"), Incoming::Other);
    }

    #[test]
    fn test_confirmation_parses_case_insensitively() {
        assert_eq!(parse_message("yes"), Incoming::Confirm);
        assert_eq!(parse_message("YES"), Incoming::Confirm);
        assert_eq!(parse_message("Yes "), Incoming::Confirm);
        assert_eq!(parse_message("yes please"), Incoming::Other);
    }
}
