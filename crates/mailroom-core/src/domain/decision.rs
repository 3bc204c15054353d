//! Decision model: what to do after a failed attempt.
//!
//! This module defines the Decision type (what to do next) and the Decider
//! trait (how to pick it from the attempt number and the failure class).

use std::fmt;
use std::time::Duration;

use super::backoff::BackoffSchedule;
use super::errors::ErrorKind;

/// Why a task was given up on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    /// The error was classified terminal; remaining attempts were not used.
    Permanent,

    /// Every permitted attempt failed.
    Exhausted { attempts: u32 },
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Permanent => f.write_str("permanent error"),
            FailureReason::Exhausted { attempts } => {
                write!(f, "failed after {attempts} attempts")
            }
        }
    }
}

/// The next action for a task whose attempt just failed.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Wait `delay`, then make attempt `next_attempt`.
    Retry { delay: Duration, next_attempt: u32 },

    /// Stop and record the task as failed.
    Fail { reason: FailureReason },
}

/// Picks the next action after a failure.
///
/// Deciders are pure: given the attempt index, the attempt ceiling and the
/// failure class they return the next action without side effects. The
/// runner carries the decision out.
pub trait Decider: Send + Sync {
    /// # Arguments
    /// * `attempt` - index of the attempt that just failed (0-indexed)
    /// * `max_retries` - attempt ceiling from the task record
    /// * `kind` - classification of the failure
    fn decide(&self, attempt: u32, max_retries: u32, kind: ErrorKind) -> Decision;
}

/// Terminal errors stop immediately, the last permitted attempt stops, and
/// everything else retries after the schedule's delay.
#[derive(Debug, Clone, Default)]
pub struct DefaultDecider {
    backoff: BackoffSchedule,
}

impl DefaultDecider {
    pub fn new(backoff: BackoffSchedule) -> Self {
        Self { backoff }
    }
}

impl Decider for DefaultDecider {
    fn decide(&self, attempt: u32, max_retries: u32, kind: ErrorKind) -> Decision {
        if kind == ErrorKind::Terminal {
            return Decision::Fail {
                reason: FailureReason::Permanent,
            };
        }
        if attempt + 1 >= max_retries {
            return Decision::Fail {
                reason: FailureReason::Exhausted {
                    attempts: max_retries,
                },
            };
        }
        Decision::Retry {
            delay: self.backoff.delay_for(attempt),
            next_attempt: attempt + 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::first(0, 1)]
    #[case::second(1, 3)]
    fn retryable_failure_with_budget_left_retries(#[case] attempt: u32, #[case] secs: u64) {
        let decider = DefaultDecider::default();
        let decision = decider.decide(attempt, 3, ErrorKind::Retryable);
        assert_eq!(
            decision,
            Decision::Retry {
                delay: Duration::from_secs(secs),
                next_attempt: attempt + 1,
            }
        );
    }

    #[test]
    fn last_attempt_fails_as_exhausted() {
        let decider = DefaultDecider::default();
        let decision = decider.decide(2, 3, ErrorKind::Retryable);
        assert_eq!(
            decision,
            Decision::Fail {
                reason: FailureReason::Exhausted { attempts: 3 }
            }
        );
    }

    #[rstest]
    #[case(0)]
    #[case(1)]
    #[case(2)]
    fn terminal_failure_stops_at_any_attempt(#[case] attempt: u32) {
        let decider = DefaultDecider::default();
        let decision = decider.decide(attempt, 3, ErrorKind::Terminal);
        assert_eq!(
            decision,
            Decision::Fail {
                reason: FailureReason::Permanent
            }
        );
    }

    #[test]
    fn single_attempt_budget_never_retries() {
        let decider = DefaultDecider::default();
        assert!(matches!(
            decider.decide(0, 1, ErrorKind::Retryable),
            Decision::Fail { .. }
        ));
    }

    #[test]
    fn reasons_render_for_humans() {
        assert_eq!(FailureReason::Permanent.to_string(), "permanent error");
        assert_eq!(
            FailureReason::Exhausted { attempts: 3 }.to_string(),
            "failed after 3 attempts"
        );
    }
}
