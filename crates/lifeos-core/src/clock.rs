//! Calendar clock port.
//!
//! Every date-eligibility rule ("no past-dated creation", "future tasks are
//! locked") compares against *today*, so the engines take the current date
//! through a trait instead of reading the system clock inline.

use chrono::NaiveDate;

/// Source of the current calendar date.
pub trait Clock: Send + Sync {
    /// Today's date.
    fn today(&self) -> NaiveDate;
}

/// Production clock reading the UTC system date.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        chrono::Utc::now().date_naive()
    }
}

/// Deterministic clock pinned to a fixed date, for tests.
#[derive(Clone, Copy, Debug)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}
