use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::worker::error::WorkerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntervalUnit {
    Seconds,
    Minutes,
    Hours,
    Days,
    Weeks,
}

impl IntervalUnit {
    fn from_char(c: char) -> Option<Self> {
        match c {
            'S' => Some(IntervalUnit::Seconds),
            'M' => Some(IntervalUnit::Minutes),
            'H' => Some(IntervalUnit::Hours),
            'D' => Some(IntervalUnit::Days),
            'W' => Some(IntervalUnit::Weeks),
            _ => None,
        }
    }

    fn as_char(&self) -> char {
        match self {
            IntervalUnit::Seconds => 'S',
            IntervalUnit::Minutes => 'M',
            IntervalUnit::Hours => 'H',
            IntervalUnit::Days => 'D',
            IntervalUnit::Weeks => 'W',
        }
    }

    fn seconds(&self) -> u64 {
        match self {
            IntervalUnit::Seconds => 1,
            IntervalUnit::Minutes => 60,
            IntervalUnit::Hours => 60 * 60,
            IntervalUnit::Days => 24 * 60 * 60,
            IntervalUnit::Weeks => 7 * 24 * 60 * 60,
        }
    }
}

/// Job interval written as `<n><unit>`, e.g. `30S`, `1M`, `12H`, `1D`, `2W`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Interval {
    pub count: u64,
    pub unit: IntervalUnit,
}

impl Interval {
    pub fn new(count: u64, unit: IntervalUnit) -> Self {
        Self { count, unit }
    }

    pub fn parse(input: &str) -> Result<Self, WorkerError> {
        let invalid = |reason: &str| WorkerError::InvalidInterval {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = input.trim();
        let mut chars = trimmed.chars();
        let unit_char = chars.next_back().ok_or_else(|| invalid("empty interval"))?;
        let unit = IntervalUnit::from_char(unit_char).ok_or_else(|| invalid("unit must be one of S, M, H, D, W"))?;

        let digits = chars.as_str();
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid("count must be a positive integer"));
        }
        let count: u64 = digits.parse().map_err(|_| invalid("count is out of range"))?;
        if count == 0 {
            return Err(invalid("count must be greater than zero"));
        }
        if count.checked_mul(unit.seconds()).is_none() {
            return Err(invalid("interval is out of range"));
        }
        Ok(Self { count, unit })
    }

    pub fn as_duration(&self) -> Duration {
        Duration::from_secs(self.count.saturating_mul(self.unit.seconds()))
    }
}

impl FromStr for Interval {
    type Err = WorkerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Interval::parse(s)
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.count, self.unit.as_char())
    }
}
