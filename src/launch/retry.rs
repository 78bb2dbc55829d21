//! Bounded retry loop shared by the runtime wait, the background model
//! poll, and the readiness check.

use std::thread;
use std::time::Duration;

/// Call `check` up to `max_attempts` times, sleeping `interval` between
/// attempts. Returns true as soon as a check passes, false once the budget
/// is spent. Never sleeps after the final attempt.
pub fn poll_until(
    max_attempts: u32,
    interval: Duration,
    mut check: impl FnMut() -> bool,
) -> bool {
    for attempt in 1..=max_attempts {
        if check() {
            return true;
        }
        if attempt < max_attempts {
            thread::sleep(interval);
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_succeeds_on_nth_attempt() {
        let mut calls = 0;
        let ok = poll_until(5, Duration::ZERO, || {
            calls += 1;
            calls == 3
        });
        assert!(ok);
        assert_eq!(calls, 3, "stops probing once satisfied");
    }

    #[test]
    fn test_exhausts_budget() {
        let mut calls = 0;
        let ok = poll_until(4, Duration::ZERO, || {
            calls += 1;
            false
        });
        assert!(!ok);
        assert_eq!(calls, 4);
    }

    #[test]
    fn test_zero_attempts_never_calls() {
        let ok = poll_until(0, Duration::ZERO, || panic!("must not be called"));
        assert!(!ok);
    }
}
