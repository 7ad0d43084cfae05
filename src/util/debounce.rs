//! Consecutive-sample button debouncer.

/// Stabilizes a noisy digital sample into a debounced boolean state: a
/// candidate state must be observed `threshold` consecutive samples in a
/// row before it replaces the current one.
pub struct Debouncer {
    current_state: bool,
    counter: u8,
    threshold: u8,
}

impl Debouncer {
    /// 3-sample threshold, a safe default for typical mechanical switches.
    pub fn new() -> Self {
        Self::with_threshold(3)
    }

    pub fn with_threshold(threshold: u8) -> Self {
        Self { current_state: false, counter: 0, threshold }
    }

    /// Feeds one new sample, returns the debounced state.
    pub fn update(&mut self, sample: bool) -> bool {
        if sample == self.current_state {
            self.counter = 0;
        } else {
            self.counter = self.counter.saturating_add(1);
            if self.counter >= self.threshold {
                self.current_state = sample;
                self.counter = 0;
            }
        }
        self.current_state
    }

    pub fn state(&self) -> bool {
        self.current_state
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn holds_state_until_threshold_reached() {
        let mut d = Debouncer::with_threshold(3);
        assert!(!d.update(true));
        assert!(!d.update(true));
        assert!(d.update(true));
        assert!(d.update(true));
    }

    #[test]
    fn noise_below_threshold_does_not_flip_state() {
        let mut d = Debouncer::with_threshold(3);
        d.update(true);
        d.update(true);
        assert!(!d.update(false));
        assert!(d.update(true));
    }
}
