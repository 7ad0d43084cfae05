//! 8BitDo Ultimate BLE driver. Hand-rolled parser for the 11-byte report
//! 0x03; byte layout follows the vendor's own documented report table.

use super::{ConnectIdentity, Driver, Outbound};
use crate::event::{axis, Button, CanonicalEvent, DeviceKind, Transport};
use crate::feedback::FeedbackState;

const REPORT_ID_INPUT: u8 = 0x03;
const REPORT_ID_RUMBLE: u8 = 0x05;

/// Hat value → (up, right, down, left); 8BitDo reuses the same
/// 8-entry-plus-released convention on its own hat nibble.
fn decode_hat(value: u8) -> (bool, bool, bool, bool) {
    crate::descriptor::decode_hat(value)
}

pub struct EightBitDoUltimateDriver {
    source_address: u8,
    instance: u8,
    last_rumble: (u8, u8),
}

impl EightBitDoUltimateDriver {
    pub fn new(source_address: u8, instance: u8) -> Self {
        Self { source_address, instance, last_rumble: (0, 0) }
    }
}

impl Driver for EightBitDoUltimateDriver {
    fn init(&mut self, _now_ms: u32) -> bool {
        true
    }

    fn process_report(&mut self, bytes: &[u8], _now_ms: u32) -> Option<CanonicalEvent> {
        // bytes[0] is the report ID; the logical payload is bytes[1..11].
        if bytes.len() < 11 || bytes[0] != REPORT_ID_INPUT {
            return None;
        }
        let mut event = CanonicalEvent::make_event(self.source_address, self.instance, DeviceKind::Gamepad, Transport::BtBle);

        let (up, right, down, left) = decode_hat(bytes[1] >> 4);
        if up {
            event.buttons |= Button::DPAD_UP;
        }
        if right {
            event.buttons |= Button::DPAD_RIGHT;
        }
        if down {
            event.buttons |= Button::DPAD_DOWN;
        }
        if left {
            event.buttons |= Button::DPAD_LEFT;
        }

        event.analog[axis::LX] = bytes[2];
        event.analog[axis::LY] = bytes[3];
        event.analog[axis::RX] = bytes[4];
        event.analog[axis::RY] = bytes[5];
        event.clamp_axes();

        // Trigger channel assignment follows the original's comment, not
        // its byte-table ordering.
        event.analog[axis::L2] = bytes[6];
        event.analog[axis::R2] = bytes[7];

        let buttons1 = bytes[8];
        let buttons2 = bytes[9];
        const BUTTONS1: [Button; 8] = [Button::B1, Button::B2, Button::B3, Button::B4, Button::L1, Button::R1, Button::L2, Button::R2];
        const BUTTONS2: [Button; 8] = [Button::S1, Button::S2, Button::L3, Button::R3, Button::A1, Button::A2, Button::A3, Button::A4];
        for (bit, flag) in BUTTONS1.iter().enumerate() {
            if buttons1 & (1 << bit) != 0 {
                event.buttons |= *flag;
            }
        }
        for (bit, flag) in BUTTONS2.iter().enumerate() {
            if buttons2 & (1 << bit) != 0 {
                event.buttons |= *flag;
            }
        }

        event.battery_level = bytes[10];
        Some(event)
    }

    fn task(&mut self, _now_ms: u32, feedback: &FeedbackState) -> Option<Outbound> {
        if !feedback.rumble_dirty {
            return None;
        }
        let scaled = (scale_to_100(feedback.rumble_l), scale_to_100(feedback.rumble_r));
        if scaled == self.last_rumble {
            return None;
        }
        self.last_rumble = scaled;
        Some(Outbound::new(REPORT_ID_RUMBLE, &[scaled.0, scaled.1, scaled.0, scaled.1]))
    }

    fn disconnect(&mut self) -> (u8, u8) {
        (self.source_address, self.instance)
    }
}

fn scale_to_100(v: u8) -> u8 {
    ((v as u16 * 100) / 255) as u8
}

pub fn matches(identity: &ConnectIdentity) -> bool {
    identity.is_ble && identity.vid == 0x2dc8 && matches!(identity.pid, 0x3015 | 0x3016 | 0x3017)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_press_a_matches_spec_scenario_one() {
        let mut d = EightBitDoUltimateDriver::new(0, 0);
        let report = [0x03, 0x08, 0x80, 0x80, 0x80, 0x80, 0x00, 0x00, 0x01, 0x00, 0x50];
        let event = d.process_report(&report, 0).unwrap();
        assert!(!(event.buttons & Button::DPAD_UP).is_empty());
        assert!(!(event.buttons & Button::B1).is_empty());
        assert_eq!(event.analog, [128, 128, 128, 128, 0, 0]);
        assert_eq!(event.battery_level, 80);
    }

    #[test]
    fn short_report_is_rejected() {
        let mut d = EightBitDoUltimateDriver::new(0, 0);
        assert!(d.process_report(&[0x03, 0x00], 0).is_none());
    }

    #[test]
    fn rumble_outbound_scales_to_0_100_and_dedupes() {
        let mut d = EightBitDoUltimateDriver::new(0, 0);
        let fb = FeedbackState { rumble_l: 255, rumble_r: 0, rumble_dirty: true, ..Default::default() };
        let out = d.task(0, &fb).unwrap();
        assert_eq!(out.bytes()[0], 100);
        assert!(d.task(0, &fb).is_none(), "unchanged rumble must not resend");
    }
}
