//! When a clinic REST call is tried again.
//!
//! Only reads and deletes are retried. A create or update replayed after a
//! lost response could book the same rendez-vous or record the same paiement
//! twice, so POST and PUT get exactly one attempt.

use backon::ExponentialBuilder;
use reqwest::Method;
use std::time::Duration;

/// Backoff for idempotent clinic calls
///
/// Short enough that a dashboard refresh still feels interactive:
/// 250ms doubling to at most 4s, four retries, with jitter.
#[must_use]
pub fn default_backoff_builder() -> ExponentialBuilder {
    ExponentialBuilder::default()
        .with_min_delay(Duration::from_millis(250))
        .with_max_delay(Duration::from_secs(4))
        .with_max_times(4)
        .with_factor(2.0)
        .with_jitter()
}

/// Whether replaying `method` leaves the backend unchanged
#[must_use]
pub fn is_idempotent(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::DELETE)
}

/// Backoff to use for one call; no retries for writes
#[must_use]
pub fn backoff_for(method: &Method, backoff: ExponentialBuilder) -> ExponentialBuilder {
    if is_idempotent(method) {
        backoff
    } else {
        backoff.with_max_times(0)
    }
}

/// Statuses worth another attempt: request timeout, rate limit, server side
///
/// 409 is not among them: a conflict (duplicate CIN, taken slot) stays a
/// conflict.
#[must_use]
pub const fn is_retryable_status(code: u16) -> bool {
    matches!(code, 408 | 429 | 500..=599)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_backend_statuses_retry() {
        for code in [408, 429, 500, 502, 503, 504] {
            assert!(is_retryable_status(code), "{code} should retry");
        }
    }

    #[test]
    fn client_errors_and_conflicts_do_not_retry() {
        for code in [200, 204, 400, 401, 403, 404, 409, 422] {
            assert!(!is_retryable_status(code), "{code} should not retry");
        }
    }

    #[test]
    fn only_reads_and_deletes_are_idempotent() {
        assert!(is_idempotent(&Method::GET));
        assert!(is_idempotent(&Method::DELETE));
        assert!(!is_idempotent(&Method::POST));
        assert!(!is_idempotent(&Method::PUT));
    }
}
