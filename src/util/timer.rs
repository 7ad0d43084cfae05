//! A target-monotonic-time wait, the only suspension primitive the engine
//! uses. Connect state machines (Wii U Pro, Wiimote) and keepalive
//! schedules are built from this.

/// Fires once `now_ms` reaches the deadline set by the last `arm` call.
#[derive(Debug, Clone, Copy, Default)]
pub struct StepTimer {
    deadline_ms: Option<u64>,
}

impl StepTimer {
    pub fn new() -> Self {
        Self { deadline_ms: None }
    }

    /// Arms the timer to fire `delay_ms` from `now_ms`.
    pub fn arm(&mut self, now_ms: u64, delay_ms: u64) {
        self.deadline_ms = Some(now_ms.saturating_add(delay_ms));
    }

    pub fn disarm(&mut self) {
        self.deadline_ms = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline_ms.is_some()
    }

    /// True exactly once the deadline has passed; does not disarm itself
    /// (callers re-arm explicitly on the next state transition, matching
    /// the "retries and timeouts are data, not code" design note).
    pub fn expired(&self, now_ms: u64) -> bool {
        matches!(self.deadline_ms, Some(d) if now_ms >= d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expires_only_after_deadline() {
        let mut t = StepTimer::new();
        assert!(!t.is_armed());
        t.arm(1000, 500);
        assert!(!t.expired(1499));
        assert!(t.expired(1500));
        assert!(t.expired(2000));
    }
}
