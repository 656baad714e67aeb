use std::fmt::Debug;
use std::time::Duration;

use anyhow::{Result, ensure};

/// Scripted delay window of `performance_glitch_user`: at least this long...
pub const GLITCH_DELAY_MIN: Duration = Duration::from_secs(4);
/// ...and strictly less than this.
pub const GLITCH_DELAY_MAX: Duration = Duration::from_secs(10);

/// Fail with `"<what>: expected <expected>, got <actual>"` unless equal.
pub fn expect_eq<T: PartialEq + Debug>(what: &str, actual: T, expected: T) -> Result<()> {
    ensure!(
        actual == expected,
        "{what}: expected {expected:?}, got {actual:?}"
    );
    Ok(())
}

/// Check an elapsed time falls in `[GLITCH_DELAY_MIN, GLITCH_DELAY_MAX)`.
pub fn expect_glitch_delay(what: &str, elapsed: Duration) -> Result<()> {
    ensure!(
        elapsed >= GLITCH_DELAY_MIN && elapsed < GLITCH_DELAY_MAX,
        "{what} took {}ms, expected between {}ms and {}ms",
        elapsed.as_millis(),
        GLITCH_DELAY_MIN.as_millis(),
        GLITCH_DELAY_MAX.as_millis()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_values_pass() {
        assert!(expect_eq("badge", 1, 1).is_ok());
    }

    #[test]
    fn mismatch_names_expectation() {
        let err = expect_eq("cart badge", 0, 1).unwrap_err();
        assert_eq!(err.to_string(), "cart badge: expected 1, got 0");
    }

    #[test]
    fn glitch_window_bounds() {
        assert!(expect_glitch_delay("login", Duration::from_millis(3999)).is_err());
        assert!(expect_glitch_delay("login", Duration::from_secs(4)).is_ok());
        assert!(expect_glitch_delay("login", Duration::from_millis(9999)).is_ok());
        let err = expect_glitch_delay("sort", Duration::from_secs(10)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "sort took 10000ms, expected between 4000ms and 10000ms"
        );
    }
}
