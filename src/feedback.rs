//! Feedback service: per-slot rumble/LED/RGB state with dirty
//! flags as the sole producer/consumer synchronization. Output-mode
//! decoders write state and set a dirty flag; source drivers poll in their
//! `task` and clear the flag once transmitted. No other synchronization
//! exists — this is deliberately the only channel from sink back to source.

use crate::player::MAX_SLOTS;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedbackState {
    pub rumble_l: u8,
    pub rumble_r: u8,
    pub led_pattern: u8,
    pub led_rgb: (u8, u8, u8),
    pub rumble_dirty: bool,
    pub led_dirty: bool,
}

pub struct FeedbackService {
    slots: [FeedbackState; MAX_SLOTS],
}

impl FeedbackService {
    pub fn new() -> Self {
        Self { slots: [FeedbackState::default(); MAX_SLOTS] }
    }

    pub fn set_rumble(&mut self, idx: usize, l: u8, r: u8) {
        if let Some(s) = self.slots.get_mut(idx) {
            s.rumble_l = l;
            s.rumble_r = r;
            s.rumble_dirty = true;
        }
    }

    pub fn set_led_player(&mut self, idx: usize, pattern: u8) {
        if let Some(s) = self.slots.get_mut(idx) {
            s.led_pattern = pattern;
            s.led_dirty = true;
        }
    }

    pub fn set_led_rgb(&mut self, idx: usize, r: u8, g: u8, b: u8) {
        if let Some(s) = self.slots.get_mut(idx) {
            s.led_rgb = (r, g, b);
            s.led_dirty = true;
        }
    }

    pub fn get(&self, idx: usize) -> Option<FeedbackState> {
        self.slots.get(idx).copied()
    }

    pub fn is_rumble_dirty(&self, idx: usize) -> bool {
        self.slots.get(idx).is_some_and(|s| s.rumble_dirty)
    }

    pub fn is_led_dirty(&self, idx: usize) -> bool {
        self.slots.get(idx).is_some_and(|s| s.led_dirty)
    }

    pub fn clear_rumble_dirty(&mut self, idx: usize) {
        if let Some(s) = self.slots.get_mut(idx) {
            s.rumble_dirty = false;
        }
    }

    pub fn clear_led_dirty(&mut self, idx: usize) {
        if let Some(s) = self.slots.get_mut(idx) {
            s.led_dirty = false;
        }
    }

    /// Clears all feedback for a slot, e.g. when its player disconnects.
    pub fn reset_slot(&mut self, idx: usize) {
        if let Some(s) = self.slots.get_mut(idx) {
            *s = FeedbackState::default();
        }
    }
}

impl Default for FeedbackService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_rumble_marks_dirty_until_cleared() {
        let mut fb = FeedbackService::new();
        fb.set_rumble(0, 0xFF, 0x00);
        assert!(fb.is_rumble_dirty(0));
        fb.clear_rumble_dirty(0);
        assert!(!fb.is_rumble_dirty(0));
        assert_eq!(fb.get(0).unwrap().rumble_l, 0xFF);
    }

    #[test]
    fn led_and_rumble_dirty_flags_are_independent() {
        let mut fb = FeedbackService::new();
        fb.set_rumble(1, 1, 1);
        fb.set_led_player(1, 0b1001);
        assert!(fb.is_rumble_dirty(1));
        assert!(fb.is_led_dirty(1));
        fb.clear_rumble_dirty(1);
        assert!(!fb.is_rumble_dirty(1));
        assert!(fb.is_led_dirty(1));
    }
}
