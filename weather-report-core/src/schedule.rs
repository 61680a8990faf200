//! Once-a-day trigger at a fixed local wall-clock time.

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{Days, Local, NaiveDateTime, NaiveTime};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailySchedule {
    at: NaiveTime,
}

impl DailySchedule {
    pub fn new(at: NaiveTime) -> Self {
        Self { at }
    }

    /// Accepts `HH:MM` or `HH:MM:SS`.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        NaiveTime::parse_from_str(s, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
            .map(Self::new)
            .with_context(|| format!("Invalid daily trigger time '{s}', expected HH:MM or HH:MM:SS"))
    }

    pub fn at(&self) -> NaiveTime {
        self.at
    }

    /// First trigger strictly after `now`: today's if it is still ahead, else tomorrow's.
    pub fn next_after(&self, now: NaiveDateTime) -> NaiveDateTime {
        let today = now.date().and_time(self.at);
        if today > now {
            today
        } else {
            now.date()
                .checked_add_days(Days::new(1))
                .unwrap_or(now.date())
                .and_time(self.at)
        }
    }
}

/// Wall clock the runner reads between triggers.
pub fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Time left until `target`, zero if it has already passed.
pub fn until(target: NaiveDateTime, now: NaiveDateTime) -> Duration {
    (target - now).to_std().unwrap_or(Duration::ZERO)
}

/// Suspend until the local clock reaches `target`.
///
/// The clock is re-read after every wake-up so a suspended machine or a DST
/// shift cannot fire the trigger early.
pub async fn sleep_until(target: NaiveDateTime) {
    loop {
        let left = until(target, local_now());
        if left.is_zero() {
            return;
        }
        tokio::time::sleep(left).await;
    }
}
