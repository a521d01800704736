//! Clock access.
//!
//! Events carry UTC instants; time-window conditions compare against the
//! wall clock of the machine running the hub.

use chrono::{DateTime, Local, NaiveTime, Utc};

/// UTC instant stamped on events and automation runs.
pub type Timestamp = DateTime<Utc>;

#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// Local wall-clock time of day, as used by `time_range` conditions.
#[must_use]
pub fn local_time_of_day() -> NaiveTime {
    Local::now().time()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_move_forward_between_calls() {
        let first = now();
        let second = now();
        assert!(second >= first);
    }

    #[test]
    fn should_agree_with_local_clock_to_the_second() {
        let ours = local_time_of_day();
        let theirs = Local::now().time();
        let drift = (theirs - ours).num_seconds().abs();
        // Midnight rollover between the two reads.
        assert!(drift <= 1 || drift >= 86_399);
    }
}
