//! Minimum spacing between two reporting cycles.

/// Cycles starting less than this many milliseconds after the previous one
/// are skipped.
pub const MIN_REPORT_INTERVAL_MILLIS: i64 = 1000;

/// Remembers when the last cycle ran. A fresh guard never skips.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CadenceGuard {
    last_run_millis: i64,
}

impl CadenceGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_run_millis(&self) -> i64 {
        self.last_run_millis
    }

    pub fn too_soon(&self, now_millis: i64) -> bool {
        now_millis.saturating_sub(self.last_run_millis) < MIN_REPORT_INTERVAL_MILLIS
    }

    pub fn record(&mut self, now_millis: i64) {
        self.last_run_millis = now_millis;
    }
}

#[cfg(test)]
mod tests {
    use similar_asserts::assert_eq;

    use super::*;

    #[test]
    fn fresh_guard_lets_the_first_cycle_through() {
        let guard = CadenceGuard::new();
        assert_eq!(guard.last_run_millis(), 0);
        assert!(!guard.too_soon(1_700_000_000_000));
    }

    #[test]
    fn boundary_is_exclusive() {
        let mut guard = CadenceGuard::new();
        guard.record(10_000);

        assert!(guard.too_soon(10_000));
        assert!(guard.too_soon(10_999));
        assert!(!guard.too_soon(11_000));
    }

    #[test]
    fn clock_going_backwards_is_too_soon() {
        let mut guard = CadenceGuard::new();
        guard.record(10_000);
        assert!(guard.too_soon(9_000));
    }

    #[test]
    fn extreme_clock_readings_do_not_overflow() {
        let mut guard = CadenceGuard::new();
        guard.record(i64::MAX);
        assert!(guard.too_soon(i64::MIN));

        guard.record(i64::MIN);
        assert!(!guard.too_soon(i64::MAX));
    }
}
