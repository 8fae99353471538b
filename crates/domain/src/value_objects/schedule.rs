//! Start/end time window.

use chrono::{DateTime, Duration, Utc};
use common::{Failure, Outcome, ValueObject};
use serde::{Deserialize, Serialize};

/// A time window whose end is strictly after its start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl DateRange {
    pub fn create(start: DateTime<Utc>, end: DateTime<Utc>) -> Outcome<Self> {
        if end <= start {
            return Err(Failure::validation("End date must be after start date"));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Returns true if `instant` falls inside the window (inclusive).
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant <= self.end
    }

    /// Returns true if the window starts after `now`.
    pub fn starts_after(&self, now: DateTime<Utc>) -> bool {
        self.start > now
    }
}

impl ValueObject for DateRange {}

#[cfg(test)]
mod tests {
    use super::*;
    use common::OutcomeExt;

    #[test]
    fn test_valid_range() {
        let start = Utc::now();
        let range = DateRange::create(start, start + Duration::hours(3)).unwrap();
        assert_eq!(range.duration(), Duration::hours(3));
        assert!(range.contains(start + Duration::hours(1)));
        assert!(!range.contains(start + Duration::hours(4)));
    }

    #[test]
    fn test_end_must_follow_start() {
        let start = Utc::now();
        assert_eq!(
            DateRange::create(start, start).messages(),
            vec!["End date must be after start date"]
        );
        assert!(DateRange::create(start, start - Duration::minutes(1)).is_err());
    }
}
