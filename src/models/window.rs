//! Time windows that statistics are computed over.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Invalid window parameters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WindowError {
    #[error("month must be between 1 and 12, got {0}")]
    InvalidMonth(u32),

    #[error("year and month must be given together")]
    Incomplete,
}

/// Calendar used to decide what "today" is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Calendar {
    #[default]
    Utc,
    /// The server's local time zone
    Local,
}

impl Calendar {
    pub fn today(&self) -> NaiveDate {
        match self {
            Calendar::Utc => chrono::Utc::now().date_naive(),
            Calendar::Local => chrono::Local::now().date_naive(),
        }
    }
}

impl std::fmt::Display for Calendar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Calendar::Utc => write!(f, "utc"),
            Calendar::Local => write!(f, "local"),
        }
    }
}

/// A calendar month of a specific year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    /// Month is 1-based (January = 1).
    pub fn new(year: i32, month: u32) -> Result<Self, WindowError> {
        if !(1..=12).contains(&month) {
            return Err(WindowError::InvalidMonth(month));
        }
        Ok(Self { year, month })
    }

    /// The month a date falls in.
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

impl std::fmt::Display for YearMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Which records a summary covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeWindow {
    /// The month containing "today", resolved at call time
    CurrentMonth,
    /// An explicitly chosen month
    Month(YearMonth),
    /// Every record
    AllTime,
}

impl TimeWindow {
    pub fn month(year: i32, month: u32) -> Result<Self, WindowError> {
        YearMonth::new(year, month).map(TimeWindow::Month)
    }

    /// Build a window from optional query parameters.
    ///
    /// Both present selects that month, neither selects the current month.
    pub fn from_parts(year: Option<i32>, month: Option<u32>) -> Result<Self, WindowError> {
        match (year, month) {
            (Some(year), Some(month)) => Self::month(year, month),
            (None, None) => Ok(TimeWindow::CurrentMonth),
            _ => Err(WindowError::Incomplete),
        }
    }

    /// Pin a `CurrentMonth` window to the month of `today`.
    pub fn resolve(&self, today: NaiveDate) -> Option<YearMonth> {
        match self {
            TimeWindow::CurrentMonth => Some(YearMonth::of(today)),
            TimeWindow::Month(ym) => Some(*ym),
            TimeWindow::AllTime => None,
        }
    }

    pub fn contains(&self, date: NaiveDate, today: NaiveDate) -> bool {
        match self.resolve(today) {
            Some(ym) => ym.contains(date),
            None => true,
        }
    }
}
