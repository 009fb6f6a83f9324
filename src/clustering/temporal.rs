use chrono::{DateTime, Duration, Utc};

use crate::clustering::types::{Event, LifecycleState};

/// True when `last_activity` falls outside the retention window ending at `clock`
pub fn outside_retention(
    last_activity: DateTime<Utc>,
    clock: DateTime<Utc>,
    retention: Duration,
) -> bool {
    last_activity + retention < clock
}

/// Lifecycle of a promoted event relative to the registry clock.
///
/// Events never go back to FORMING; dormancy only affects reporting.
pub fn event_lifecycle(event: &Event, clock: DateTime<Utc>, retention: Duration) -> LifecycleState {
    if outside_retention(event.last_seen(), clock, retention) {
        LifecycleState::Dormant
    } else {
        LifecycleState::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::article::fixtures::base_time;

    #[test]
    fn test_retention_boundary_is_inclusive() {
        let start = base_time();
        let retention = Duration::days(14);
        assert!(!outside_retention(start, start + Duration::days(14), retention));
        assert!(outside_retention(
            start,
            start + Duration::days(14) + Duration::seconds(1),
            retention
        ));
    }
}
