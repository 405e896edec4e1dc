//! Property-based tests for the progress projector
//!
//! Run with: cargo test -p order-tracking projection_properties

use chrono::{Duration, TimeZone, Utc};
use order_tracking::{OrderSnapshot, ProgressProjector};
use proptest::prelude::*;
use serde_json::json;

fn in_progress(total: u32, started_minutes_ago: i64) -> (OrderSnapshot, chrono::DateTime<Utc>) {
    let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    let started = now - Duration::minutes(started_minutes_ago);
    let payload = json!({
        "status": "in_progress",
        "total_duration": total,
        "started_at": started.to_rfc3339(),
    });
    (OrderSnapshot::from_value(&payload, now, now).unwrap(), now)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Percentage stays in range and remaining never exceeds the total
    #[test]
    fn projection_bounded(total in 0u32..600, ago in -120i64..2000) {
        let (snapshot, now) = in_progress(total, ago);
        let projection = ProgressProjector::default().project(&snapshot, now);
        prop_assert!(projection.progress_percent <= 100);
        prop_assert!(projection.remaining_minutes <= total);
    }

    /// Time only moves the projection down
    #[test]
    fn projection_monotonic(total in 1u32..600, ago in 0i64..700, step in 0i64..120) {
        let projector = ProgressProjector::default();
        let (snapshot, now) = in_progress(total, ago);
        let earlier = projector.project(&snapshot, now);
        let later = projector.project(&snapshot, now + Duration::minutes(step));
        prop_assert!(later.progress_percent <= earlier.progress_percent);
        prop_assert!(later.remaining_minutes <= earlier.remaining_minutes);
    }

    /// Remaining minutes is the total minus whole elapsed minutes
    #[test]
    fn remaining_matches_elapsed(total in 1u32..600, ago in 0i64..600) {
        let (snapshot, now) = in_progress(total, ago);
        let projection = ProgressProjector::default().project(&snapshot, now);
        let expected = (i64::from(total) - ago).max(0) as u32;
        prop_assert_eq!(projection.remaining_minutes, expected);
    }
}
