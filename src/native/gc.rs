//! GameCube controller driver. Same joybus wire primitive
//! as N64 but an 8-byte response (buttons, main stick, C-stick, two analog
//! triggers), polled at 125Hz.

use super::{NativeDriver, PollFailureTracker, PortReader};
use crate::event::{axis, Button, CanonicalEvent, DeviceKind, Transport};
use crate::util::timer::StepTimer;

pub const POLL_PERIOD_MS: u32 = 8;

const BYTE0: [Button; 8] = [Button::S2, Button::A1, Button::L1, Button::R1, Button::DPAD_LEFT, Button::DPAD_RIGHT, Button::DPAD_DOWN, Button::DPAD_UP];
const BYTE1: [Button; 8] = [Button::B1, Button::B2, Button::B3, Button::B4, Button::S1, Button::L3, Button::R3, Button::L2];

pub struct GcDriver<R: PortReader> {
    port: R,
    source_address: u8,
    instance: u8,
    tracker: PollFailureTracker,
    timer: StepTimer,
}

impl<R: PortReader> GcDriver<R> {
    pub fn new(port: R, source_address: u8, instance: u8) -> Self {
        Self { port, source_address, instance, tracker: PollFailureTracker::new(), timer: StepTimer::new() }
    }
}

impl<R: PortReader> NativeDriver for GcDriver<R> {
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
        if frame.len < 8 {
            return None;
        }
        let mut event = CanonicalEvent::make_event(self.source_address, self.instance, DeviceKind::Gamepad, Transport::Native);
        for (bit, flag) in BYTE0.iter().enumerate() {
            if frame.bytes[0] & (1 << (7 - bit)) != 0 {
                event.buttons |= *flag;
            }
        }
        for (bit, flag) in BYTE1.iter().enumerate() {
            if frame.bytes[1] & (1 << (7 - bit)) != 0 {
                event.buttons |= *flag;
            }
        }
        event.analog[axis::LX] = frame.bytes[2];
        event.analog[axis::LY] = 255 - frame.bytes[3];
        event.analog[axis::RX] = frame.bytes[4];
        event.analog[axis::RY] = 255 - frame.bytes[5];
        event.clamp_axes();
        event.analog[axis::L2] = frame.bytes[6];
        event.analog[axis::R2] = frame.bytes[7];
        Some(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedReader([u8; 8]);
    impl PortReader for FixedReader {
        fn read_frame(&mut self) -> Result<super::super::Frame, ()> {
            Ok(super::super::Frame { bytes: self.0, len: 8 })
        }
    }

    #[test]
    fn a_button_and_sticks_decode() {
        let mut d = GcDriver::new(FixedReader([0, 0x80, 128, 128, 128, 128, 0, 0]), 0, 0);
        let event = d.poll(0).unwrap();
        assert!(event.buttons.contains(Button::B1));
        assert_eq!(event.analog[axis::LX], 128);
        assert_eq!(event.analog[axis::LY], 127, "Y axis inverted to HID convention");
    }
}
