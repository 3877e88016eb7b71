use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::domain::clock::IST;
use crate::domain::{Expense, Paise, PartitionKey, WEEKS_PER_MONTH, format_paise, parse_paise};

/// Hard cap on the number of user directories; new users beyond this are
/// refused at first contact.
pub const MAX_USERS: usize = 5;

/// How timestamps are written into partition files: naive wall-clock time in
/// the canonical zone.
const STORED_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const CSV_HEADER: [&str; 4] = ["date_ist", "amount", "category", "note"];

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Invalid user key: {0:?}")]
    InvalidUser(String),

    #[error("Failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Unreadable csv in {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Bad row {line} in {}: {reason}", path.display())]
    BadRow {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("Bad user config {}: {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Per-user settings stored next to the partition directories as
/// `config.json`: the chat handle the transport delivers to, and per-category
/// monthly budget limits in paise.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserConfig {
    #[serde(default)]
    pub chat_id: Option<i64>,
    #[serde(default)]
    pub budgets: BTreeMap<String, Paise>,
}

/// A partition that could not be read while answering a query. The query
/// carries on without it; the error is surfaced for logging, never raised.
#[derive(Debug)]
pub struct SkippedPartition {
    pub key: PartitionKey,
    pub error: StoreError,
}

/// Outcome of loading a time range: every record that could be read, plus
/// the partitions that had to be skipped.
#[derive(Debug, Default)]
pub struct Loaded {
    pub records: Vec<Expense>,
    pub skipped: Vec<SkippedPartition>,
}

/// File-backed expense store. One CSV file per (user, month, week bucket)
/// under `<root>/<user>/<YYYY_MM>/wk_<1..5>.csv`, with a `config.json` per
/// user. Records are append-only; the only delete is a whole-user wipe.
pub struct ExpenseStore {
    root: PathBuf,
}

impl ExpenseStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn user_dir(&self, user: &str) -> PathBuf {
        self.root.join(user)
    }

    fn config_path(&self, user: &str) -> PathBuf {
        self.user_dir(user).join("config.json")
    }

    fn partition_path(&self, user: &str, key: &PartitionKey) -> PathBuf {
        self.user_dir(user).join(key.month_dir()).join(key.file_name())
    }

    /// User keys become path components, so only plain identifier-ish names
    /// are allowed through.
    fn check_user(&self, user: &str) -> Result<(), StoreError> {
        let ok = !user.is_empty()
            && user.len() <= 64
            && user
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if ok {
            Ok(())
        } else {
            Err(StoreError::InvalidUser(user.to_string()))
        }
    }

    /// Number of user directories currently on disk.
    pub fn user_count(&self) -> Result<usize, StoreError> {
        Ok(self.users()?.len())
    }

    /// All known users, sorted.
    pub fn users(&self) -> Result<Vec<String>, StoreError> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let entries = fs::read_dir(&self.root).map_err(|source| StoreError::Io {
            path: self.root.clone(),
            source,
        })?;
        let mut users = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| StoreError::Io {
                path: self.root.clone(),
                source,
            })?;
            if entry.path().is_dir() {
                users.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        users.sort();
        Ok(users)
    }

    /// Create the user's directory and a fresh config on first contact.
    /// Returns `false` when the user is new but the user cap is already
    /// reached; existing users always pass.
    pub fn ensure_user(&self, user: &str, chat_id: Option<i64>) -> Result<bool, StoreError> {
        self.check_user(user)?;
        let dir = self.user_dir(user);
        if !dir.exists() && self.user_count()? >= MAX_USERS {
            return Ok(false);
        }
        fs::create_dir_all(&dir).map_err(|source| StoreError::Io {
            path: dir.clone(),
            source,
        })?;
        if !self.config_path(user).exists() {
            self.save_user_config(
                user,
                &UserConfig {
                    chat_id,
                    budgets: BTreeMap::new(),
                },
            )?;
        }
        Ok(true)
    }

    /// Append one expense to the partition derived from its own timestamp.
    pub fn append(&self, user: &str, expense: &Expense) -> Result<(), StoreError> {
        self.check_user(user)?;
        let key = PartitionKey::for_timestamp(expense.spent_at);
        let month_dir = self.user_dir(user).join(key.month_dir());
        fs::create_dir_all(&month_dir).map_err(|source| StoreError::Io {
            path: month_dir.clone(),
            source,
        })?;
        let path = month_dir.join(key.file_name());

        let is_new = !path.exists();
        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&path)
            .map_err(|source| StoreError::Io {
                path: path.clone(),
                source,
            })?;
        let mut writer = csv::Writer::from_writer(BufWriter::new(file));
        if is_new {
            writer
                .write_record(CSV_HEADER)
                .map_err(|source| StoreError::Csv {
                    path: path.clone(),
                    source,
                })?;
        }
        writer
            .write_record([
                expense.spent_at.format(STORED_TIME_FORMAT).to_string(),
                format_paise(expense.amount_paise),
                expense.category.clone(),
                expense.note.clone().unwrap_or_default(),
            ])
            .map_err(|source| StoreError::Csv {
                path: path.clone(),
                source,
            })?;
        writer.flush().map_err(|source| StoreError::Io { path, source })
    }

    /// Load every record in one partition. A missing file (or month
    /// directory, or user directory) contributes zero records; an unreadable
    /// file or any malformed row fails the whole partition.
    pub fn load_partition(
        &self,
        user: &str,
        key: &PartitionKey,
    ) -> Result<Vec<Expense>, StoreError> {
        self.check_user(user)?;
        let path = self.partition_path(user, key);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        let mut reader = csv::Reader::from_reader(BufReader::new(file));
        let mut expenses = Vec::new();
        for (i, row) in reader.records().enumerate() {
            // +2 for the header line and zero-indexing
            let line = i + 2;
            let row = row.map_err(|source| StoreError::Csv {
                path: path.clone(),
                source,
            })?;
            expenses.push(parse_row(&path, line, &row)?);
        }
        Ok(expenses)
    }

    /// Load every readable record with `start <= spent_at <= end`. The month
    /// partitions of both endpoints are consulted (a window never spans more
    /// than two months); partitions that fail to read are collected, not
    /// propagated.
    pub fn load_between(&self, user: &str, start: DateTime<Tz>, end: DateTime<Tz>) -> Loaded {
        let mut loaded = Loaded::default();
        if self.check_user(user).is_err() {
            warn!(user, "ignoring query for invalid user key");
            return loaded;
        }

        let mut months = vec![(start.year(), start.month())];
        let end_month = (end.year(), end.month());
        if !months.contains(&end_month) {
            months.push(end_month);
        }

        for (year, month) in months {
            for week in 1..=WEEKS_PER_MONTH {
                let key = PartitionKey::new(year, month, week);
                match self.load_partition(user, &key) {
                    Ok(rows) => loaded.records.extend(
                        rows.into_iter()
                            .filter(|e| e.spent_at >= start && e.spent_at <= end),
                    ),
                    Err(error) => loaded.skipped.push(SkippedPartition { key, error }),
                }
            }
        }
        loaded
    }

    /// Read the user's config; a user without one yet gets the defaults.
    pub fn user_config(&self, user: &str) -> Result<UserConfig, StoreError> {
        self.check_user(user)?;
        let path = self.config_path(user);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(UserConfig::default()),
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        serde_json::from_reader(BufReader::new(file))
            .map_err(|source| StoreError::Config { path, source })
    }

    pub fn save_user_config(&self, user: &str, config: &UserConfig) -> Result<(), StoreError> {
        self.check_user(user)?;
        let dir = self.user_dir(user);
        fs::create_dir_all(&dir).map_err(|source| StoreError::Io {
            path: dir,
            source,
        })?;
        let path = self.config_path(user);
        let json = serde_json::to_string_pretty(config).map_err(|source| StoreError::Config {
            path: path.clone(),
            source,
        })?;
        fs::write(&path, json).map_err(|source| StoreError::Io { path, source })
    }

    /// Set one budget limit, creating the config if the user has none yet.
    pub fn set_budget(
        &self,
        user: &str,
        category: &str,
        limit: Paise,
    ) -> Result<(), StoreError> {
        let mut config = self.user_config(user)?;
        config.budgets.insert(category.to_string(), limit);
        self.save_user_config(user, &config)
    }

    /// Delete everything stored for a user. Wiping an unknown user is a
    /// no-op.
    pub fn wipe_user(&self, user: &str) -> Result<(), StoreError> {
        self.check_user(user)?;
        let dir = self.user_dir(user);
        if dir.exists() {
            fs::remove_dir_all(&dir).map_err(|source| StoreError::Io { path: dir, source })?;
        }
        Ok(())
    }
}

fn parse_row(path: &Path, line: usize, row: &csv::StringRecord) -> Result<Expense, StoreError> {
    let bad = |reason: String| StoreError::BadRow {
        path: path.to_path_buf(),
        line,
        reason,
    };

    let raw_time = row.get(0).unwrap_or("");
    let spent_at = parse_stored_timestamp(raw_time)
        .ok_or_else(|| bad(format!("unparseable timestamp {raw_time:?}")))?;

    let raw_amount = row.get(1).unwrap_or("");
    let amount_paise =
        parse_paise(raw_amount).map_err(|e| bad(format!("bad amount {raw_amount:?}: {e}")))?;
    if amount_paise <= 0 {
        return Err(bad(format!("non-positive amount {raw_amount:?}")));
    }

    let category = row.get(2).unwrap_or("").trim();
    if category.is_empty() {
        return Err(bad("missing category".to_string()));
    }

    // The note column is absent in ledgers written before it existed.
    let note = row
        .get(3)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from);

    Ok(Expense {
        spent_at,
        amount_paise,
        category: category.to_string(),
        note,
    })
}

/// Normalize a stored timestamp to the canonical zone. Offset-bearing
/// strings are converted; naive ones are taken to already be canonical-zone
/// wall-clock time.
fn parse_stored_timestamp(s: &str) -> Option<DateTime<Tz>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&IST));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, STORED_TIME_FORMAT) {
        return IST.from_local_datetime(&naive).single();
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return IST.from_local_datetime(&date.and_hms_opt(0, 0, 0)?).single();
    }
    None
}
