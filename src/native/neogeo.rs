//! NEOGEO DB15 driver. A direct active-low GPIO button
//! matrix rather than a shift/joybus protocol — no latch/clock timing, so
//! it's read every tick rather than on a fixed period.

use super::{NativeDriver, PollFailureTracker, PortReader};
use crate::event::{Button, CanonicalEvent, DeviceKind, Transport};

pub const POLL_PERIOD_MS: u32 = 0;

/// Active-low matrix bit order: Up, Down, Left, Right, A, B, C, D.
const BIT_ORDER: [Button; 8] = [Button::DPAD_UP, Button::DPAD_DOWN, Button::DPAD_LEFT, Button::DPAD_RIGHT, Button::B1, Button::B2, Button::B3, Button::B4];

pub struct NeoGeoDriver<R: PortReader> {
    port: R,
    source_address: u8,
    instance: u8,
    tracker: PollFailureTracker,
}

impl<R: PortReader> NeoGeoDriver<R> {
    pub fn new(port: R, source_address: u8, instance: u8) -> Self {
        Self { port, source_address, instance, tracker: PollFailureTracker::new() }
    }
}

impl<R: PortReader> NativeDriver for NeoGeoDriver<R> {
    fn poll_period_ms(&self) -> u32 {
        POLL_PERIOD_MS
    }

    fn poll(&mut self, _now_ms: u32) -> Option<CanonicalEvent> {
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
            if raw & (1 << bit) != 0 {
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
    fn active_low_matrix_decodes_directly() {
        let mut d = NeoGeoDriver::new(FixedReader(!0x01), 0, 0); // Up line pulled low
        let event = d.poll(0).unwrap();
        assert!(event.buttons.contains(Button::DPAD_UP));
    }
}
