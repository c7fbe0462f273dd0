use std::sync::Arc;

use parking_lot::Mutex;

use crate::constants::{
    BLOCK_DURATION_MINUTES, DAY_MS, HOUR_MS, MAX_SUBMISSIONS_PER_DAY, MAX_SUBMISSIONS_PER_HOUR,
    MINUTE_MS,
};
use crate::infrastructure::clock::Clock;
use crate::infrastructure::storage::StateStore;

/// Storage key for the JSON array of successful-submission timestamps.
pub const SUBMISSIONS_KEY: &str = "form_submissions";

/// Storage key for the stringified epoch-millis block expiry.
pub const BLOCKED_KEY: &str = "blocked_until";

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateDecision {
    Allowed,
    Blocked { message: String },
}

impl RateDecision {
    pub fn allowed(&self) -> bool {
        matches!(self, RateDecision::Allowed)
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            RateDecision::Allowed => None,
            RateDecision::Blocked { message } => Some(message),
        }
    }
}

/// Client-side submission throttle: a rolling submission history plus a
/// single block-until timestamp, both persisted through [`StateStore`].
///
/// Advisory only. Nothing here is server-verified; a non-browser client can
/// bypass it trivially. Real enforcement belongs to the receiving server.
///
/// All read-modify-write sequences run under one mutex, so concurrent
/// `can_submit`/`record_submission` calls cannot interleave on the shared
/// history.
pub struct RateLimiter {
    store: Arc<dyn StateStore>,
    clock: Arc<dyn Clock>,
    lock: Mutex<()>,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn StateStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            lock: Mutex::new(()),
        }
    }

    /// Decides whether a new submission attempt is allowed.
    ///
    /// An active block always wins, with a minutes-remaining message. Past
    /// that, hitting the hourly threshold imposes a block of
    /// [`BLOCK_DURATION_MINUTES`]; hitting the daily threshold imposes twice
    /// that. Expired blocks are cleared lazily here.
    pub fn can_submit(&self) -> RateDecision {
        let _guard = self.lock.lock();
        let now = self.clock.now_millis();

        if let Some(blocked_until) = self.blocked_until() {
            if now < blocked_until {
                let minutes_left = (blocked_until - now + MINUTE_MS - 1) / MINUTE_MS;
                return RateDecision::Blocked {
                    message: format!("Too many attempts. Try again in {} minute(s).", minutes_left),
                };
            }
            self.store.remove(BLOCKED_KEY);
        }

        let submissions = self.submissions();

        let hour_ago = now - HOUR_MS;
        let recent_hour = submissions.iter().filter(|&&t| t > hour_ago).count();
        if recent_hour >= MAX_SUBMISSIONS_PER_HOUR {
            self.set_block(BLOCK_DURATION_MINUTES, now);
            return RateDecision::Blocked {
                message: "Too many attempts in the last hour. Please try again later.".to_string(),
            };
        }

        let day_ago = now - DAY_MS;
        let recent_day = submissions.iter().filter(|&&t| t > day_ago).count();
        if recent_day >= MAX_SUBMISSIONS_PER_DAY {
            self.set_block(BLOCK_DURATION_MINUTES * 2, now);
            return RateDecision::Blocked {
                message: "Daily submission limit reached. Please try again tomorrow.".to_string(),
            };
        }

        RateDecision::Allowed
    }

    /// Records one successful submission and prunes history older than 24 h.
    pub fn record_submission(&self) {
        let _guard = self.lock.lock();
        let now = self.clock.now_millis();

        let mut submissions = self.submissions();
        submissions.push(now);

        let day_ago = now - DAY_MS;
        submissions.retain(|&t| t > day_ago);

        self.persist_submissions(&submissions);
    }

    /// Imposes a temporary block ending `minutes` from now. An existing block
    /// is overwritten, never merged.
    pub fn block_user(&self, minutes: i64) {
        let _guard = self.lock.lock();
        self.set_block(minutes, self.clock.now_millis());
    }

    /// Wipes both the submission history and any block.
    pub fn clear_history(&self) {
        let _guard = self.lock.lock();
        self.store.remove(SUBMISSIONS_KEY);
        self.store.remove(BLOCKED_KEY);
    }

    fn set_block(&self, minutes: i64, now: i64) {
        let blocked_until = now + minutes * MINUTE_MS;
        self.store.set(BLOCKED_KEY, &blocked_until.to_string());
    }

    fn blocked_until(&self) -> Option<i64> {
        self.store.get(BLOCKED_KEY)?.parse().ok()
    }

    /// Submission history, tolerating absent or corrupt stored state.
    fn submissions(&self) -> Vec<i64> {
        let Some(raw) = self.store.get(SUBMISSIONS_KEY) else {
            return Vec::new();
        };
        match serde_json::from_str(&raw) {
            Ok(submissions) => submissions,
            Err(err) => {
                tracing::warn!("discarding corrupt submission history: {err}");
                Vec::new()
            }
        }
    }

    fn persist_submissions(&self, submissions: &[i64]) {
        match serde_json::to_string(submissions) {
            Ok(serialized) => self.store.set(SUBMISSIONS_KEY, &serialized),
            Err(err) => tracing::error!("failed to serialize submission history: {err}"),
        }
    }
}
