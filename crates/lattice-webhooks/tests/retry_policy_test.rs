//! Delivery retry policy vectors.

use lattice_webhooks::{retry_delay, should_retry, DISABLE_THRESHOLD, MAX_RETRIES};

/// The k-th failure schedules the k-th entry of the backoff table.
#[test]
fn test_backoff_table() {
    let expected = [(1, 1), (2, 5), (3, 30), (4, 300), (5, 1800)];
    for (attempt, delay) in expected {
        assert_eq!(retry_delay(attempt), delay, "attempt {attempt}");
    }
}

/// Past the table the delay stays at its maximum.
#[test]
fn test_backoff_caps_at_30_minutes() {
    assert_eq!(retry_delay(6), 1800);
    assert_eq!(retry_delay(99), 1800);
}

/// A delivery is retried at most five times.
#[test]
fn test_retry_budget() {
    for count in 0..MAX_RETRIES {
        assert!(should_retry(count, Some(503)));
    }
    assert!(!should_retry(MAX_RETRIES, Some(503)));
}

/// Client errors are terminal except 429.
#[test]
fn test_4xx_terminal_except_rate_limit() {
    for status in [400, 401, 403, 404, 422] {
        assert!(!should_retry(0, Some(status)), "HTTP {status}");
    }
    assert!(should_retry(0, Some(429)));
}

/// Transport-level failures (no status) retry within the budget.
#[test]
fn test_transport_errors_retry() {
    assert!(should_retry(0, None));
    assert!(should_retry(4, None));
    assert!(!should_retry(5, None));
}

/// Ten consecutive failures is the disable threshold; six is not.
#[test]
fn test_disable_threshold_value() {
    assert_eq!(DISABLE_THRESHOLD, 10);
    assert!(6 < DISABLE_THRESHOLD);
}
