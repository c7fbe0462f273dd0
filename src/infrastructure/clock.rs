use chrono::{DateTime, Utc};

/// Time source seam. The rate limiter and CSRF lifecycle only ever read time
/// through this trait so expiry behavior can be driven by a simulated clock
/// in tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    fn now_millis(&self) -> i64 {
        self.now().timestamp_millis()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
