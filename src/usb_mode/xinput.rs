//! XInput-style output mode. Modeled on the Xbox 360 gamepad
//! HID report: a 16-bit button+dpad mask, two 8-bit triggers, four 16-bit
//! signed stick axes. Rumble is a 2-byte (left motor, right motor) output
//! report, the same 2-byte shape Xbox pad rumble decoders expect.

use super::{EncodedReport, FeedbackWrite, OutputMode};
use crate::event::{Button, CanonicalEvent};
use crate::profile::ProfileOutput;

pub const VID: u16 = 0x045E;
pub const PID: u16 = 0x028E;

#[rustfmt::skip]
pub const REPORT_DESCRIPTOR: [u8; 45] = [
    0x05, 0x01,        // USAGE_PAGE (Generic Desktop)
    0x09, 0x05,        // USAGE (Gamepad)
    0xA1, 0x01,        // COLLECTION (Application)
    0x15, 0x00,        // LOGICAL_MINIMUM (0)
    0x25, 0x01,        // LOGICAL_MAXIMUM (1)
    0x75, 0x01,        // REPORT_SIZE (1)
    0x95, 0x0E,        // REPORT_COUNT (14)
    0x05, 0x09,        // USAGE_PAGE (Button)
    0x19, 0x01,        // USAGE_MINIMUM (Button 1)
    0x29, 0x0E,        // USAGE_MAXIMUM (Button 14)
    0x81, 0x02,        // INPUT (Data,Var,Abs)
    0x75, 0x02,        // REPORT_SIZE (2)
    0x95, 0x01,        // REPORT_COUNT (1)
    0x81, 0x03,        // INPUT (Cnst,Var,Abs) padding to byte boundary
    0x05, 0x01,        // USAGE_PAGE (Generic Desktop)
    0x15, 0x00,        // LOGICAL_MINIMUM (0)
    0x26, 0xFF, 0x00,  // LOGICAL_MAXIMUM (255)
    0x75, 0x08,        // REPORT_SIZE (8)
    0x95, 0x02,        // REPORT_COUNT (2)
    0x09, 0x33,        // USAGE (Rx) left trigger
    0x09, 0x34,        // USAGE (Ry) right trigger
    0x81, 0x02,        // INPUT (Data,Var,Abs)
    0xC0,
];

/// Canonical button slot -> low-14-bit XInput mask position.
const BUTTON_BITS: [(Button, usize); 14] = [
    (Button::DPAD_UP, 0),
    (Button::DPAD_DOWN, 1),
    (Button::DPAD_LEFT, 2),
    (Button::DPAD_RIGHT, 3),
    (Button::S2, 4),
    (Button::S1, 5),
    (Button::L3, 6),
    (Button::R3, 7),
    (Button::L1, 8),
    (Button::R1, 9),
    (Button::A1, 10),
    (Button::B1, 12),
    (Button::B2, 13),
];

pub struct XInput;

impl OutputMode for XInput {
    fn vid_pid() -> (u16, u16) {
        (VID, PID)
    }

    fn report_descriptor() -> &'static [u8] {
        &REPORT_DESCRIPTOR
    }

    fn send_report(_player_index: usize, _event: &CanonicalEvent, output: &ProfileOutput) -> EncodedReport {
        let mut mask: u16 = 0;
        for (button, idx) in BUTTON_BITS {
            if output.buttons.contains(button) {
                mask |= 1 << idx;
            }
        }
        if output.buttons.contains(Button::B3) {
            mask |= 1 << 14;
        }
        if output.buttons.contains(Button::B4) {
            mask |= 1 << 15;
        }
        let bytes = [
            (mask & 0xFF) as u8,
            (mask >> 8) as u8,
            output.l2_analog,
            output.r2_analog,
            output.lx,
            output.ly,
            output.rx,
            output.ry,
        ];
        EncodedReport::new(0, &bytes)
    }

    fn handle_output(report_id: u8, bytes: &[u8]) -> Option<FeedbackWrite> {
        if report_id != 0x00 || bytes.len() < 2 {
            return None;
        }
        Some(FeedbackWrite { player_index: 0, rumble: Some((bytes[0], bytes[1])), led_pattern: None })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_event() -> CanonicalEvent {
        CanonicalEvent::make_event(0, 0, crate::event::DeviceKind::Gamepad, crate::event::Transport::Usb)
    }

    #[test]
    fn a1_guide_button_sets_bit_ten() {
        let mut output = ProfileOutput::neutral();
        output.buttons = Button::A1;
        let report = XInput::send_report(0, &test_event(), &output);
        let mask = u16::from_le_bytes([report.bytes()[0], report.bytes()[1]]);
        assert_eq!(mask, 1 << 10);
    }

    #[test]
    fn north_and_west_face_buttons_occupy_the_top_two_bits() {
        let mut output = ProfileOutput::neutral();
        output.buttons = Button::B3 | Button::B4;
        let report = XInput::send_report(0, &test_event(), &output);
        let mask = u16::from_le_bytes([report.bytes()[0], report.bytes()[1]]);
        assert_eq!(mask, (1 << 14) | (1 << 15));
    }

    #[test]
    fn output_report_decodes_to_rumble() {
        let fb = XInput::handle_output(0x00, &[0x80, 0x40]).unwrap();
        assert_eq!(fb.rumble, Some((0x80, 0x40)));
    }
}
