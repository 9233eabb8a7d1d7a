//! Cooperative progress reporting and cancellation.
//!
//! Long-running kernel operations accept an optional callback that receives
//! a completion fraction in `[0, 1]`. Returning `false` asks the operation to
//! stop at its next milestone and hand back partial results.

/// Progress callback: receives a fraction in `[0, 1]`, returns `false` to cancel.
pub type ProgressFn<'a> = &'a mut dyn FnMut(f64) -> bool;

/// Wraps an optional progress callback and enforces monotonic fractions.
pub struct Progress<'a> {
    callback: Option<ProgressFn<'a>>,
    last: f64,
    cancelled: bool,
}

impl<'a> Progress<'a> {
    /// Wrap an optional callback.
    pub fn new(callback: Option<ProgressFn<'a>>) -> Self {
        Self {
            callback,
            last: 0.0,
            cancelled: false,
        }
    }

    /// A reporter without a callback; never cancels.
    pub fn none() -> Self {
        Self::new(None)
    }

    /// Report a milestone. Returns `true` if the operation should continue.
    ///
    /// Fractions are clamped to `[0, 1]` and never go backwards. Once the
    /// callback has requested cancellation it is not invoked again.
    pub fn report(&mut self, fraction: f64) -> bool {
        if self.cancelled {
            return false;
        }
        let fraction = if fraction.is_nan() {
            self.last
        } else {
            fraction.clamp(self.last, 1.0)
        };
        self.last = fraction;
        if let Some(cb) = self.callback.as_mut() {
            if !cb(fraction) {
                self.cancelled = true;
            }
        }
        !self.cancelled
    }

    /// True once the callback has returned `false`.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Last fraction that was reported.
    pub fn fraction(&self) -> f64 {
        self.last
    }
}

impl std::fmt::Debug for Progress<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Progress")
            .field("has_callback", &self.callback.is_some())
            .field("last", &self.last)
            .field("cancelled", &self.cancelled)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fractions_are_monotonic() {
        let mut seen = Vec::new();
        let mut cb = |f: f64| {
            seen.push(f);
            true
        };
        let mut progress = Progress::new(Some(&mut cb));
        assert!(progress.report(0.5));
        assert!(progress.report(0.25));
        assert!(progress.report(2.0));
        drop(progress);
        assert_eq!(seen, vec![0.5, 0.5, 1.0]);
    }

    #[test]
    fn test_cancellation_sticks() {
        let mut calls = 0;
        let mut cb = |f: f64| {
            calls += 1;
            f < 0.3
        };
        let mut progress = Progress::new(Some(&mut cb));
        assert!(progress.report(0.1));
        assert!(!progress.report(0.4));
        assert!(!progress.report(0.5));
        assert!(progress.is_cancelled());
        drop(progress);
        assert_eq!(calls, 2);
    }

    #[test]
    fn test_none_never_cancels() {
        let mut progress = Progress::none();
        assert!(progress.report(1.0));
        assert!(!progress.is_cancelled());
    }
}
