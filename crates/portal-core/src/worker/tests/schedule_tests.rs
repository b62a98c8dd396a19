use std::time::Duration;

use crate::worker::{Interval, IntervalUnit, WorkerError};

#[test]
fn test_parse_units() {
    assert_eq!(Interval::parse("30S").unwrap().as_duration(), Duration::from_secs(30));
    assert_eq!(Interval::parse("1M").unwrap().as_duration(), Duration::from_secs(60));
    assert_eq!(Interval::parse("12H").unwrap().as_duration(), Duration::from_secs(12 * 3600));
    assert_eq!(Interval::parse("1D").unwrap().as_duration(), Duration::from_secs(86_400));
    assert_eq!(
        " 2W ".parse::<Interval>().unwrap(),
        Interval::new(2, IntervalUnit::Weeks)
    );
}

#[test]
fn test_display_matches_input_form() {
    assert_eq!(Interval::new(5, IntervalUnit::Minutes).to_string(), "5M");
}

#[test]
fn test_rejects_malformed_intervals() {
    for input in ["", "M", "0M", "-1M", "1.5H", "10m", "10X", "99999999999999999999S", "18446744073709551615W"] {
        assert!(
            matches!(Interval::parse(input), Err(WorkerError::InvalidInterval { .. })),
            "{input:?} should be rejected"
        );
    }
}
