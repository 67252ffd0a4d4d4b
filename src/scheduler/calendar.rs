//! Wall-clock arithmetic for the daily voting window.

use crate::config::WindowConfig;
use crate::error::{BotError, Result};
use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveTime, TimeDelta, Utc, Weekday};
use std::time::Duration;

/// Source of the current instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Daily open and close times at a fixed UTC offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyWindow {
    open: NaiveTime,
    close: NaiveTime,
    offset: FixedOffset,
}

impl DailyWindow {
    pub fn new(open: NaiveTime, close: NaiveTime, offset: FixedOffset) -> Self {
        Self {
            open,
            close,
            offset,
        }
    }

    /// Build from config.
    ///
    /// # Errors
    ///
    /// Returns [`BotError::Config`] for out-of-range times or offsets.
    pub fn from_config(config: &WindowConfig) -> Result<Self> {
        let open = config
            .open_time()
            .ok_or_else(|| BotError::Config("invalid window open time".to_owned()))?;
        let close = config
            .close_time()
            .ok_or_else(|| BotError::Config("invalid window close time".to_owned()))?;
        let offset = config
            .offset()
            .ok_or_else(|| BotError::Config("invalid window utc offset".to_owned()))?;
        Ok(Self::new(open, close, offset))
    }

    pub fn open_time(&self) -> NaiveTime {
        self.open
    }

    pub fn close_time(&self) -> NaiveTime {
        self.close
    }

    /// `now` in the window's reference offset.
    pub fn local(&self, now: DateTime<Utc>) -> DateTime<FixedOffset> {
        now.with_timezone(&self.offset)
    }

    /// Local calendar date of `now`.
    pub fn local_date(&self, now: DateTime<Utc>) -> NaiveDate {
        self.local(now).date_naive()
    }

    fn at(&self, date: NaiveDate, time: NaiveTime) -> DateTime<FixedOffset> {
        let shift = TimeDelta::seconds(i64::from(self.offset.local_minus_utc()));
        let naive_utc = date.and_time(time) - shift;
        DateTime::from_naive_utc_and_offset(naive_utc, self.offset)
    }

    /// The first open instant strictly after `now`.
    pub fn next_open_after(&self, now: DateTime<Utc>) -> DateTime<FixedOffset> {
        let today = self.local_date(now);
        let candidate = self.at(today, self.open);
        if candidate > now {
            return candidate;
        }
        match today.succ_opt() {
            Some(tomorrow) => self.at(tomorrow, self.open),
            None => candidate,
        }
    }

    /// Close instant on the local date `date`.
    pub fn close_on(&self, date: NaiveDate) -> DateTime<FixedOffset> {
        self.at(date, self.close)
    }

    /// Time left until today's close, zero if it has already passed.
    pub fn close_delay(&self, now: DateTime<Utc>) -> Duration {
        delay_until(now, self.close_on(self.local_date(now)))
    }
}

/// Duration from `now` to `target`, clamped at zero.
pub fn delay_until(now: DateTime<Utc>, target: DateTime<FixedOffset>) -> Duration {
    target
        .signed_duration_since(now)
        .to_std()
        .unwrap_or(Duration::ZERO)
}

/// Monday through Friday.
pub fn is_business_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}
