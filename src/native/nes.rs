//! NES controller driver. 8 data bits, MSB-first,
//! `MSB=A`. Polled on NES's 60Hz hard timer.

use super::{NativeDriver, PollFailureTracker, PortReader};
use crate::event::{Button, CanonicalEvent, DeviceKind, Transport};
use crate::util::timer::StepTimer;

pub const POLL_PERIOD_MS: u32 = 16;

/// MSB-first: A, B, Select, Start, Up, Down, Left, Right.
const BIT_ORDER: [Button; 8] = [Button::B4, Button::B1, Button::S1, Button::S2, Button::DPAD_UP, Button::DPAD_DOWN, Button::DPAD_LEFT, Button::DPAD_RIGHT];

pub struct NesDriver<R: PortReader> {
    port: R,
    source_address: u8,
    instance: u8,
    tracker: PollFailureTracker,
    timer: StepTimer,
}

impl<R: PortReader> NesDriver<R> {
    pub fn new(port: R, source_address: u8, instance: u8) -> Self {
        Self { port, source_address, instance, tracker: PollFailureTracker::new(), timer: StepTimer::new() }
    }
}

impl<R: PortReader> NativeDriver for NesDriver<R> {
    fn poll_period_ms(&self) -> u32 {
        POLL_PERIOD_MS
    }

    fn poll(&mut self, now_ms: u32) -> Option<CanonicalEvent> {
        if self.timer.is_armed() && !self.timer.expired(now_ms as u64) {
            return None;
        }
        self.timer.arm(now_ms as u64, POLL_PERIOD_MS as u64);

        let frame = self.port.read_frame();
        if self.tracker.record(frame.is_ok()) {
            return Some(CanonicalEvent::neutral(self.source_address, self.instance, DeviceKind::Gamepad, Transport::Native));
        }
        let frame = frame.ok()?;
        if frame.len < 1 {
            return None;
        }
        let raw = !frame.bytes[0];
        let mut event = CanonicalEvent::make_event(self.source_address, self.instance, DeviceKind::Gamepad, Transport::Native);
        for (bit, flag) in BIT_ORDER.iter().enumerate() {
            if raw & (1 << (7 - bit)) != 0 {
                event.buttons |= *flag;
            }
        }
        Some(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedReader(u8);
    impl PortReader for FixedReader {
        fn read_frame(&mut self) -> Result<super::super::Frame, ()> {
            Ok(super::super::Frame { bytes: [self.0, 0, 0, 0, 0, 0, 0, 0], len: 1 })
        }
    }

    #[test]
    fn a_button_decodes_from_msb() {
        let mut d = NesDriver::new(FixedReader(0x7F), 0, 0); // all but bit7 (A) low->pressed pattern
        let event = d.poll(0).unwrap();
        assert!(event.buttons.contains(Button::B4));
        assert!(!event.buttons.contains(Button::B1));
    }
}
