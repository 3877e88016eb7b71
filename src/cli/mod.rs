use std::io::{self, BufRead, Write};
use std::sync::Once;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use chrono_tz::Tz;
use clap::{Parser, Subcommand};

use crate::application::{AppError, ExpenseService};
use crate::bot::{self, SessionStore};
use crate::domain::clock::{self, now_ist};
use crate::domain::{ReportPeriod, format_rupees, parse_paise};

/// Kharcha - chat-driven expense tracker
#[derive(Parser)]
#[command(name = "kharcha")]
#[command(about = "A personal expense tracker driven by short chat messages")]
#[command(version)]
pub struct Cli {
    /// Data directory holding the per-user ledgers
    #[arg(short, long, default_value = "data")]
    pub data_dir: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Inject one chat message and print the bot's reply
    Send {
        /// User the message is from
        user: String,

        /// Message text, e.g. "200 food" or "1"
        #[arg(required = true)]
        text: Vec<String>,
    },

    /// Chat with the bot on the console
    Chat {
        /// User to chat as
        user: String,
    },

    /// Record an expense directly, bypassing the chat grammar
    Record {
        /// User the expense belongs to
        user: String,

        /// Amount in rupees (e.g., "200" or "99.50")
        amount: String,

        /// Category label (e.g., "food")
        category: String,

        /// Free-text note
        #[arg(short, long)]
        note: Option<String>,

        /// Backdate to this day at midnight IST (YYYY-MM-DD, defaults to now)
        #[arg(long)]
        date: Option<String>,
    },

    /// Print a period summary for one user
    Report {
        /// User to report on
        user: String,

        /// Period: today, yesterday, this-week, last-week, this-month, last-month
        #[arg(short, long, default_value = "this-week")]
        period: String,

        /// Output format: text, json
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Budget management commands
    #[command(subcommand)]
    Budget(BudgetCommands),

    /// Print the weekly Mon-Sun digest for every user
    Digest,

    /// Delete all data for one user
    Wipe {
        /// User to wipe
        user: String,

        /// Confirm the wipe
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum BudgetCommands {
    /// Set a monthly limit for a category
    Set {
        /// User the budget belongs to
        user: String,

        /// Category label (e.g., "food")
        category: String,

        /// Monthly limit in rupees (e.g., "2000")
        amount: String,
    },

    /// Show this month's spend against each configured limit
    Status {
        /// User to report on
        user: String,
    },
}

static TRACING_INIT: Once = Once::new();

/// Initializes the global tracing subscriber with sensible defaults.
/// Replies print to stdout, so log output goes to stderr.
pub fn init_tracing(verbose: bool) {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{EnvFilter, fmt};

        let default_directive = if verbose { "kharcha=debug" } else { "kharcha=info" };
        let filter =
            EnvFilter::from_default_env().add_directive(default_directive.parse().unwrap());

        fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init();
    });
}

impl Cli {
    pub fn run(self) -> Result<()> {
        let service = ExpenseService::open(&self.data_dir);

        match self.command {
            Commands::Send { user, text } => {
                run_send_command(&service, &user, &text.join(" "))?;
            }

            Commands::Chat { user } => {
                run_chat_command(&service, &user)?;
            }

            Commands::Record {
                user,
                amount,
                category,
                note,
                date,
            } => {
                let amount_paise =
                    parse_paise(&amount).context("Invalid amount format. Use '200' or '99.50'")?;

                let spent_at = match date {
                    Some(date_str) => parse_ist_date(&date_str).with_context(|| {
                        format!("Invalid date format '{}'. Use YYYY-MM-DD", date_str)
                    })?,
                    None => now_ist(),
                };

                let expense = service.record_expense(&user, amount_paise, &category, note, spent_at)?;
                println!(
                    "Recorded {} in '{}' at {}",
                    format_rupees(expense.amount_paise),
                    expense.category,
                    expense.spent_at.format("%Y-%m-%d %H:%M:%S")
                );
            }

            Commands::Report {
                user,
                period,
                format,
            } => {
                run_report_command(&service, &user, &period, &format)?;
            }

            Commands::Budget(budget_cmd) => {
                run_budget_command(&service, budget_cmd)?;
            }

            Commands::Digest => {
                run_digest_command(&service)?;
            }

            Commands::Wipe { user, yes } => {
                if !yes {
                    anyhow::bail!("Refusing to wipe all data for '{}' without --yes", user);
                }
                service.wipe_user(&user)?;
                println!("Wiped all data for '{}'", user);
            }
        }

        Ok(())
    }
}

fn run_send_command(service: &ExpenseService, user: &str, text: &str) -> Result<()> {
    let mut sessions = SessionStore::new();
    let reply = bot::handle_message(service, &mut sessions, user, None, text, now_ist());
    println!("{}", reply);
    Ok(())
}

fn run_chat_command(service: &ExpenseService, user: &str) -> Result<()> {
    let mut sessions = SessionStore::new();
    let mut lines = io::stdin().lock().lines();

    println!("Chatting as '{}'. Type 'exit' to leave.", user);
    loop {
        print!("> ");
        io::stdout().flush().context("Failed to flush stdout")?;

        let Some(line) = lines.next() else { break };
        let line = line.context("Failed to read from stdin")?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "exit" || line == "quit" {
            break;
        }

        let reply = bot::handle_message(service, &mut sessions, user, None, line, now_ist());
        println!("{}", reply);
    }
    Ok(())
}

fn run_report_command(
    service: &ExpenseService,
    user: &str,
    period_str: &str,
    format: &str,
) -> Result<()> {
    let period = ReportPeriod::from_str(period_str)
        .ok_or_else(|| AppError::UnknownPeriod(period_str.to_string()))?;
    let report = service.summarize_period(user, period, now_ist());

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        "text" => {
            println!(
                "Period: {} → {}",
                report.from_date.format("%Y-%m-%d"),
                report.to_date.format("%Y-%m-%d")
            );
            println!("{}", report.render());
            if !report.skipped_partitions.is_empty() {
                eprintln!(
                    "Warning: {} partition(s) could not be read: {}",
                    report.skipped_partitions.len(),
                    report.skipped_partitions.join(", ")
                );
            }
        }
        other => {
            anyhow::bail!("Invalid format '{}'. Valid formats: text, json", other);
        }
    }
    Ok(())
}

fn run_budget_command(service: &ExpenseService, cmd: BudgetCommands) -> Result<()> {
    match cmd {
        BudgetCommands::Set {
            user,
            category,
            amount,
        } => {
            let limit =
                parse_paise(&amount).context("Invalid amount format. Use '2000.00' or '2000'")?;
            service.set_budget(&user, &category, limit)?;
            println!(
                "Set budget for '{}': {} per month",
                category,
                format_rupees(limit)
            );
        }

        BudgetCommands::Status { user } => {
            let report = service.budget_status(&user, now_ist())?;
            println!("{}", report.render());
        }
    }
    Ok(())
}

fn run_digest_command(service: &ExpenseService) -> Result<()> {
    let digests = service.weekly_digest(now_ist())?;
    if digests.is_empty() {
        println!("No users yet.");
        return Ok(());
    }
    for digest in digests {
        match digest.chat_id {
            Some(chat_id) => println!("--- {} (chat {}) ---", digest.user, chat_id),
            None => println!("--- {} (no chat id) ---", digest.user),
        }
        println!("{}\n", digest.text);
    }
    Ok(())
}

fn parse_ist_date(date_str: &str) -> Result<chrono::DateTime<Tz>> {
    let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .context("Date must be in YYYY-MM-DD format")?;
    Ok(clock::ist(date, 0, 0, 0))
}
