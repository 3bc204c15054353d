//! Backoff schedule: decides the delay between attempts.

use std::time::Duration;

/// Fixed per-attempt delay table.
///
/// The delay after a failed attempt is looked up by attempt index; indices
/// past the end of the table reuse the last (largest) entry.
///
/// Default table: 1s, 3s, 9s.
/// - attempt 0 fails -> wait 1s
/// - attempt 1 fails -> wait 3s
/// - attempt 2 fails -> wait 9s
/// - attempt 3+ fails -> wait 9s
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackoffSchedule {
    delays: Vec<Duration>,
}

impl BackoffSchedule {
    /// Build a schedule from an explicit table. An empty table means "no delay".
    pub fn new(delays: Vec<Duration>) -> Self {
        Self { delays }
    }

    pub fn from_secs(secs: &[u64]) -> Self {
        Self::new(secs.iter().copied().map(Duration::from_secs).collect())
    }

    /// Delay to wait after attempt `attempt` (0-indexed) failed.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let idx = attempt as usize;
        self.delays
            .get(idx)
            .or_else(|| self.delays.last())
            .copied()
            .unwrap_or(Duration::ZERO)
    }

    pub fn delays(&self) -> &[Duration] {
        &self.delays
    }
}

impl Default for BackoffSchedule {
    fn default() -> Self {
        Self::from_secs(&[1, 3, 9])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, 1)]
    #[case(1, 3)]
    #[case(2, 9)]
    #[case(3, 9)]
    #[case(50, 9)]
    fn default_table_is_clamped_to_last(#[case] attempt: u32, #[case] secs: u64) {
        let schedule = BackoffSchedule::default();
        assert_eq!(schedule.delay_for(attempt), Duration::from_secs(secs));
    }

    #[test]
    fn custom_table() {
        let schedule = BackoffSchedule::from_secs(&[2, 4]);
        assert_eq!(schedule.delay_for(0), Duration::from_secs(2));
        assert_eq!(schedule.delay_for(1), Duration::from_secs(4));
        assert_eq!(schedule.delay_for(7), Duration::from_secs(4));
    }

    #[test]
    fn empty_table_never_waits() {
        let schedule = BackoffSchedule::new(vec![]);
        assert_eq!(schedule.delay_for(0), Duration::ZERO);
        assert_eq!(schedule.delay_for(3), Duration::ZERO);
    }
}
