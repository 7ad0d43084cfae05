//! N64 controller driver. 1-wire open-drain joybus; a 4-byte
//! response to poll command `0x40 03 00 02 00 00 00 00`: two button bytes
//! then signed X/Y stick bytes. Polled at 60Hz.

use super::{NativeDriver, PollFailureTracker, PortReader};
use crate::event::{axis, Button, CanonicalEvent, DeviceKind, Transport};
use crate::util::timer::StepTimer;

pub const POLL_PERIOD_MS: u32 = 16;
pub const POLL_COMMAND: [u8; 8] = [0x40, 0x03, 0x00, 0x02, 0x00, 0x00, 0x00, 0x00];

const BYTE0: [Button; 8] = [Button::DPAD_RIGHT, Button::DPAD_LEFT, Button::DPAD_DOWN, Button::DPAD_UP, Button::S2, Button::A1, Button::L1, Button::B1];

pub struct N64Driver<R: PortReader> {
    port: R,
    source_address: u8,
    instance: u8,
    tracker: PollFailureTracker,
    timer: StepTimer,
}

impl<R: PortReader> N64Driver<R> {
    pub fn new(port: R, source_address: u8, instance: u8) -> Self {
        Self { port, source_address, instance, tracker: PollFailureTracker::new(), timer: StepTimer::new() }
    }
}

impl<R: PortReader> NativeDriver for N64Driver<R> {
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
        if frame.len < 4 {
            return None;
        }
        let mut event = CanonicalEvent::make_event(self.source_address, self.instance, DeviceKind::Gamepad, Transport::Native);
        for (bit, flag) in BYTE0.iter().enumerate() {
            if frame.bytes[0] & (1 << (7 - bit)) != 0 {
                event.buttons |= *flag;
            }
        }
        // C-buttons live in the low nibble of byte1; bits 4-5 are L/R.
        if frame.bytes[1] & 0x20 != 0 {
            event.buttons |= Button::L1;
        }
        if frame.bytes[1] & 0x10 != 0 {
            event.buttons |= Button::R1;
        }
        // C-buttons are mapped onto the right stick axes rather than extra
        // digital bits, since the canonical vocabulary has no C-button slot.
        let cx = (frame.bytes[1] & 0x02 != 0) as i32 - (frame.bytes[1] & 0x01 != 0) as i32;
        let cy = (frame.bytes[1] & 0x08 != 0) as i32 - (frame.bytes[1] & 0x04 != 0) as i32;
        event.analog[axis::RX] = (128 + cx * 100).clamp(0, 255) as u8;
        event.analog[axis::RY] = (128 - cy * 100).clamp(0, 255) as u8;

        let stick_x = frame.bytes[2] as i8;
        let stick_y = frame.bytes[3] as i8;
        event.analog[axis::LX] = (stick_x as i32 + 128).clamp(0, 255) as u8;
        event.analog[axis::LY] = (128 - stick_y as i32).clamp(0, 255) as u8;
        event.clamp_axes();
        Some(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedReader([u8; 4]);
    impl PortReader for FixedReader {
        fn read_frame(&mut self) -> Result<super::super::Frame, ()> {
            Ok(super::super::Frame { bytes: [self.0[0], self.0[1], self.0[2], self.0[3], 0, 0, 0, 0], len: 4 })
        }
    }

    #[test]
    fn a_button_and_centered_stick_decode() {
        let mut d = N64Driver::new(FixedReader([0x01, 0x00, 0x00, 0x00]), 0, 0);
        let event = d.poll(0).unwrap();
        assert!(event.buttons.contains(Button::B1));
        assert_eq!(event.analog[axis::LX], 128);
    }
}
