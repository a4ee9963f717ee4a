//! Retry policy for the classifier call chain, kept as a small explicit
//! state machine so the policy is testable without HTTP in the loop.

/// One slot in the attempt chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt {
    Primary,
    PrimaryRetry,
    Fallback,
}

/// How an attempt failed. Transient covers the upstream's overloaded or
/// cold-starting statuses; network errors, other non-success statuses,
/// and undecodable bodies are permanent for that attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptFailure {
    Transient,
    Permanent,
}

/// Next move after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Try the given attempt immediately.
    Proceed(Attempt),
    /// Sleep the configured backoff, then try the given attempt.
    BackoffThen(Attempt),
    /// Chain exhausted; the caller falls back to neutral.
    GiveUp,
}

/// Only a transient primary failure earns the backoff-and-retry; the
/// retry itself and the fallback endpoint get no second chances.
pub fn next_step(attempt: Attempt, failure: AttemptFailure) -> Step {
    match (attempt, failure) {
        (Attempt::Primary, AttemptFailure::Transient) => Step::BackoffThen(Attempt::PrimaryRetry),
        (Attempt::Primary, AttemptFailure::Permanent) => Step::Proceed(Attempt::Fallback),
        (Attempt::PrimaryRetry, _) => Step::Proceed(Attempt::Fallback),
        (Attempt::Fallback, _) => Step::GiveUp,
    }
}

pub fn is_transient_status(status: u16) -> bool {
    matches!(status, 502 | 503 | 504)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_primary_failure_backs_off_and_retries() {
        assert_eq!(
            next_step(Attempt::Primary, AttemptFailure::Transient),
            Step::BackoffThen(Attempt::PrimaryRetry)
        );
    }

    #[test]
    fn permanent_primary_failure_skips_straight_to_fallback() {
        assert_eq!(
            next_step(Attempt::Primary, AttemptFailure::Permanent),
            Step::Proceed(Attempt::Fallback)
        );
    }

    #[test]
    fn retry_gets_no_second_backoff() {
        assert_eq!(
            next_step(Attempt::PrimaryRetry, AttemptFailure::Transient),
            Step::Proceed(Attempt::Fallback)
        );
        assert_eq!(
            next_step(Attempt::PrimaryRetry, AttemptFailure::Permanent),
            Step::Proceed(Attempt::Fallback)
        );
    }

    #[test]
    fn fallback_failure_ends_the_chain() {
        assert_eq!(next_step(Attempt::Fallback, AttemptFailure::Transient), Step::GiveUp);
        assert_eq!(next_step(Attempt::Fallback, AttemptFailure::Permanent), Step::GiveUp);
    }

    #[test]
    fn transient_statuses() {
        assert!(is_transient_status(502));
        assert!(is_transient_status(503));
        assert!(is_transient_status(504));
        assert!(!is_transient_status(500));
        assert!(!is_transient_status(404));
        assert!(!is_transient_status(200));
    }
}
