//! Daily voting window scheduler.
//!
//! Opens the poll at a fixed local time on weekdays and closes it at a fixed
//! local time, once per calendar day.

pub mod calendar;
pub mod runner;

pub use calendar::{Clock, DailyWindow, SystemClock};
pub use runner::{OpenOutcome, WindowScheduler};
