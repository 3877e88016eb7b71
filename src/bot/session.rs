use std::collections::HashMap;

use chrono::{DateTime, Duration};
use chrono_tz::Tz;

/// Where a user currently stands in a multi-step exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Flow {
    #[default]
    Idle,
    /// The numbered menu was just shown; a bare digit selects an entry.
    MenuOffered,
    /// "delete all my data" was chosen; waiting for a "yes".
    AwaitingWipeConfirm,
}

#[derive(Debug, Clone, Copy)]
pub struct Session {
    pub flow: Flow,
    pub touched_at: DateTime<Tz>,
}

/// In-memory conversational state, keyed by user. State older than the TTL
/// reads as `Idle`, so a stale menu offer or wipe confirmation simply
/// lapses.
pub struct SessionStore {
    ttl: Duration,
    sessions: HashMap<String, Session>,
}

impl SessionStore {
    pub const DEFAULT_TTL_MINUTES: i64 = 10;

    pub fn new() -> Self {
        Self::with_ttl(Duration::minutes(Self::DEFAULT_TTL_MINUTES))
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            sessions: HashMap::new(),
        }
    }

    /// Current flow for the user. Expired sessions are purged on access.
    pub fn flow(&mut self, user: &str, now: DateTime<Tz>) -> Flow {
        match self.sessions.get(user) {
            Some(session) if now - session.touched_at <= self.ttl => session.flow,
            Some(_) => {
                self.sessions.remove(user);
                Flow::Idle
            }
            None => Flow::Idle,
        }
    }

    /// Move the user to a new flow state, restarting its expiry clock.
    pub fn set(&mut self, user: &str, flow: Flow, now: DateTime<Tz>) {
        self.sessions.insert(
            user.to_string(),
            Session {
                flow,
                touched_at: now,
            },
        );
    }

    pub fn clear(&mut self, user: &str) {
        self.sessions.remove(user);
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
