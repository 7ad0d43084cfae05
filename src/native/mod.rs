//! Native host drivers: SNES/NES shift-register, N64/GC
//! joybus, and NEOGEO GPIO-matrix polling. Each is polled at a fixed,
//! mode-specific rate and reports failures through a shared debounce
//! counter so a handful of dropped polls doesn't read as a disconnect.

pub mod gc;
pub mod n64;
pub mod nes;
pub mod neogeo;
pub mod snes;

use crate::event::CanonicalEvent;

/// A fixed-capacity raw sample: enough bytes for the widest native wire
/// format (GC joybus, 8 bytes) with shorter ones just using a shorter `len`.
#[derive(Debug, Clone, Copy)]
pub struct Frame {
    pub bytes: [u8; 8],
    pub len: u8,
}

impl Frame {
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }
}

/// A raw one-shot read of the wire. `Err` represents one failed/timed-out
/// poll, not necessarily a disconnect — that judgment is
/// [`PollFailureTracker`]'s job.
pub trait PortReader {
    fn read_frame(&mut self) -> Result<Frame, ()>;
}

/// Debounces brief wire glitches: a real disconnect is declared only after
/// `THRESHOLD` consecutive failed polls.
pub struct PollFailureTracker {
    consecutive_failures: u32,
    was_connected: bool,
}

const DISCONNECT_THRESHOLD: u32 = 30;

impl PollFailureTracker {
    pub fn new() -> Self {
        Self { consecutive_failures: 0, was_connected: false }
    }

    /// Feeds one poll result; returns `true` exactly on the poll that first
    /// crosses the disconnect threshold (i.e. once, not on every poll after).
    pub fn record(&mut self, ok: bool) -> bool {
        if ok {
            self.consecutive_failures = 0;
            self.was_connected = true;
            false
        } else {
            self.consecutive_failures += 1;
            if self.was_connected && self.consecutive_failures == DISCONNECT_THRESHOLD {
                self.was_connected = false;
                true
            } else {
                false
            }
        }
    }

    pub fn is_connected(&self) -> bool {
        self.was_connected
    }
}

impl Default for PollFailureTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Common shape every native console module implements: a fixed poll rate,
/// a raw-to-canonical mapper, and disconnect-neutral-replay.
pub trait NativeDriver {
    /// Poll period in milliseconds (SNES/NES/N64 ≈16ms/60Hz, GC ≈8ms/125Hz).
    fn poll_period_ms(&self) -> u32;

    /// Reads the wire once and maps to a canonical event, or `None` if it's
    /// not yet time to poll or the read failed without crossing the
    /// disconnect threshold.
    fn poll(&mut self, now_ms: u32) -> Option<CanonicalEvent>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disconnect_fires_once_at_threshold() {
        let mut tracker = PollFailureTracker::new();
        tracker.record(true);
        assert!(tracker.is_connected());
        for _ in 0..DISCONNECT_THRESHOLD - 1 {
            assert!(!tracker.record(false));
        }
        assert!(tracker.record(false), "30th consecutive failure declares disconnect");
        assert!(!tracker.is_connected());
        assert!(!tracker.record(false), "must not refire every subsequent failure");
    }

    #[test]
    fn a_single_good_poll_resets_the_failure_count() {
        let mut tracker = PollFailureTracker::new();
        tracker.record(true);
        for _ in 0..20 {
            tracker.record(false);
        }
        tracker.record(true);
        for _ in 0..DISCONNECT_THRESHOLD - 1 {
            assert!(!tracker.record(false));
        }
    }
}
