//! SNES controller driver. 12µs latch / 6µs shift clock
//! shift-register protocol; 16 data bits, MSB-first, `MSB=B` per the wire
//! spec. Polled at 60Hz. Timing itself lives in the platform's
//! [`PortReader`](super::PortReader) implementation — this module only
//! maps the 16 decoded bits to a canonical event.

use super::{NativeDriver, PollFailureTracker, PortReader};
use crate::event::{Button, CanonicalEvent, DeviceKind, Transport};
use crate::util::timer::StepTimer;

pub const POLL_PERIOD_MS: u32 = 16;

/// MSB-first bit order: B, Y, Select, Start, Up, Down, Left, Right, A, X,
/// L, R, then 4 unused high bits.
const BIT_ORDER: [Button; 12] = [
    Button::B1,
    Button::B3,
    Button::S1,
    Button::S2,
    Button::DPAD_UP,
    Button::DPAD_DOWN,
    Button::DPAD_LEFT,
    Button::DPAD_RIGHT,
    Button::B2,
    Button::B4,
    Button::L1,
    Button::R1,
];

pub struct SnesDriver<R: PortReader> {
    port: R,
    source_address: u8,
    instance: u8,
    tracker: PollFailureTracker,
    timer: StepTimer,
}

impl<R: PortReader> SnesDriver<R> {
    pub fn new(port: R, source_address: u8, instance: u8) -> Self {
        Self { port, source_address, instance, tracker: PollFailureTracker::new(), timer: StepTimer::new() }
    }
}

impl<R: PortReader> NativeDriver for SnesDriver<R> {
    fn poll_period_ms(&self) -> u32 {
        POLL_PERIOD_MS
    }

    fn poll(&mut self, now_ms: u32) -> Option<CanonicalEvent> {
        if self.timer.is_armed() && !self.timer.expired(now_ms as u64) {
            return None;
        }
        self.timer.arm(now_ms as u64, POLL_PERIOD_MS as u64);

        let frame = self.port.read_frame();
        let disconnected = self.tracker.record(frame.is_ok());
        if disconnected {
            return Some(CanonicalEvent::neutral(self.source_address, self.instance, DeviceKind::Gamepad, Transport::Native));
        }
        let frame = frame.ok()?;
        if frame.len < 2 {
            return None;
        }
        // Active-low on the wire: a 0 bit means pressed.
        let raw = !u16::from_be_bytes([frame.bytes[0], frame.bytes[1]]);
        let mut event = CanonicalEvent::make_event(self.source_address, self.instance, DeviceKind::Gamepad, Transport::Native);
        for (bit, flag) in BIT_ORDER.iter().enumerate() {
            // MSB first: bit 0 of BIT_ORDER is the top bit (15) of raw.
            if raw & (1 << (15 - bit)) != 0 {
                event.buttons |= *flag;
            }
        }
        Some(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedReader(Result<[u8; 2], ()>);
    impl PortReader for FixedReader {
        fn read_frame(&mut self) -> Result<super::super::Frame, ()> {
            self.0.map(|bytes| super::super::Frame { bytes: [bytes[0], bytes[1], 0, 0, 0, 0, 0, 0], len: 2 })
        }
    }

    #[test]
    fn all_bits_low_means_every_button_pressed() {
        let mut d = SnesDriver::new(FixedReader(Ok([0x00, 0x00])), 0, 0);
        let event = d.poll(0).unwrap();
        assert!(event.buttons.contains(Button::B1));
        assert!(event.buttons.contains(Button::R1));
    }

    #[test]
    fn sustained_failures_emit_a_neutral_disconnect_event() {
        let mut d = SnesDriver::new(FixedReader(Err(())), 0, 0);
        d.tracker.record(true);
        let mut last = None;
        for tick in 0..30u32 {
            last = d.poll(tick * POLL_PERIOD_MS);
        }
        assert!(last.unwrap().buttons.is_empty());
    }
}
