//! Switch Pro output mode. Report descriptor and byte layout are
//! modeled on the standard `SwitchProReportDescriptor`/`SwitchProReport`
//! shape — 16 buttons, a 4-bit hat, four 8-bit stick axes, one
//! vendor-specific byte.

use super::{EncodedReport, FeedbackWrite, OutputMode};
use crate::event::{axis, Button, CanonicalEvent};
use crate::profile::ProfileOutput;

pub const VID: u16 = 0x057E;
pub const PID: u16 = 0x2009;

#[rustfmt::skip]
pub const REPORT_DESCRIPTOR: [u8; 76] = [
    0x05, 0x01,        // USAGE_PAGE (Generic Desktop)
    0x09, 0x05,        // USAGE (Joystick)
    0xA1, 0x01,        // COLLECTION (Application)
    0x15, 0x00,        // LOGICAL_MINIMUM (0)
    0x25, 0x01,        // LOGICAL_MAXIMUM (1)
    0x75, 0x01,        // REPORT_SIZE (1)
    0x95, 0x10,        // REPORT_COUNT (16)
    0x05, 0x09,        // USAGE_PAGE (Button)
    0x19, 0x01,        // USAGE_MINIMUM (Button 1)
    0x29, 0x10,        // USAGE_MAXIMUM (Button 16)
    0x81, 0x02,        // INPUT (Data,Var,Abs)
    0x05, 0x01,        // USAGE_PAGE (Generic Desktop)
    0x25, 0x07,        // LOGICAL_MAXIMUM (7)
    0x46, 0x3B, 0x01,  // PHYSICAL_MAXIMUM (315)
    0x75, 0x04,        // REPORT_SIZE (4)
    0x95, 0x01,        // REPORT_COUNT (1)
    0x65, 0x14,        // UNIT (Eng Rot:Angular Pos)
    0x09, 0x39,        // USAGE (Hat switch)
    0x81, 0x42,        // INPUT (Data,Var,Abs,Null)
    0x75, 0x04,        // REPORT_SIZE (4)
    0x95, 0x01,        // REPORT_COUNT (1)
    0x81, 0x03,        // INPUT (Cnst,Var,Abs)
    0x15, 0x00,        // LOGICAL_MINIMUM (0)
    0x25, 0xFF,        // LOGICAL_MAXIMUM (255)
    0x75, 0x08,        // REPORT_SIZE (8)
    0x95, 0x04,        // REPORT_COUNT (4)
    0x05, 0x01,        // USAGE_PAGE (Generic Desktop)
    0x09, 0x30,        // USAGE (X)
    0x09, 0x31,        // USAGE (Y)
    0x09, 0x32,        // USAGE (Z)
    0x09, 0x35,        // USAGE (Rz)
    0x81, 0x02,        // INPUT (Data,Var,Abs)
    0x15, 0x00,        // LOGICAL_MINIMUM (0)
    0x25, 0xFF,        // LOGICAL_MAXIMUM (255)
    0x75, 0x08,        // REPORT_SIZE (8)
    0x95, 0x01,        // REPORT_COUNT (1)
    0x81, 0x03,        // INPUT (Cnst,Var,Abs)
    0xC0,
];

/// Canonical button slot -> Switch Pro bit index (0-15).
const BUTTON_BITS: [(Button, usize); 14] = [
    (Button::B2, 0),
    (Button::B1, 1),
    (Button::B3, 2),
    (Button::B4, 3),
    (Button::L1, 4),
    (Button::R1, 5),
    (Button::L2, 6),
    (Button::R2, 7),
    (Button::S1, 8),
    (Button::S2, 9),
    (Button::L3, 10),
    (Button::R3, 11),
    (Button::A1, 12),
    (Button::A2, 13),
];

fn hat_from_dpad(buttons: Button) -> u8 {
    let up = buttons.contains(Button::DPAD_UP);
    let down = buttons.contains(Button::DPAD_DOWN);
    let left = buttons.contains(Button::DPAD_LEFT);
    let right = buttons.contains(Button::DPAD_RIGHT);
    match (up, right, down, left) {
        (true, false, false, false) => 0,
        (true, true, false, false) => 1,
        (false, true, false, false) => 2,
        (false, true, true, false) => 3,
        (false, false, true, false) => 4,
        (false, false, true, true) => 5,
        (false, false, false, true) => 6,
        (true, false, false, true) => 7,
        _ => 8,
    }
}

pub struct SwitchPro;

impl OutputMode for SwitchPro {
    fn vid_pid() -> (u16, u16) {
        (VID, PID)
    }

    fn report_descriptor() -> &'static [u8] {
        &REPORT_DESCRIPTOR
    }

    fn send_report(_player_index: usize, _event: &CanonicalEvent, output: &ProfileOutput) -> EncodedReport {
        let mut bits: u16 = 0;
        for (button, idx) in BUTTON_BITS {
            if output.buttons.contains(button) {
                bits |= 1 << idx;
            }
        }
        let hat = hat_from_dpad(output.buttons);
        let bytes = [
            (bits & 0xFF) as u8,
            (bits >> 8) as u8,
            hat & 0x0F,
            output.lx,
            output.ly,
            output.rx,
            output.ry,
            0,
        ];
        EncodedReport::new(0, &bytes)
    }

    fn handle_output(report_id: u8, bytes: &[u8]) -> Option<FeedbackWrite> {
        // Switch Pro rumble comes over a vendor subcommand report; the
        // amplitude byte is read back from the same offset a rumble encoder
        // writes to.
        if report_id != 0x01 || bytes.is_empty() {
            return None;
        }
        Some(FeedbackWrite { player_index: 0, rumble: Some((bytes[0], bytes[0])), led_pattern: None })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_event() -> CanonicalEvent {
        CanonicalEvent::make_event(0, 0, crate::event::DeviceKind::Gamepad, crate::event::Transport::Usb)
    }

    #[test]
    fn up_dpad_maps_to_hat_zero() {
        let mut output = ProfileOutput::neutral();
        output.buttons = Button::DPAD_UP;
        let report = SwitchPro::send_report(0, &test_event(), &output);
        assert_eq!(report.bytes()[2] & 0x0F, 0);
    }

    #[test]
    fn no_dpad_maps_to_hat_released() {
        let output = ProfileOutput::neutral();
        let report = SwitchPro::send_report(0, &test_event(), &output);
        assert_eq!(report.bytes()[2] & 0x0F, 8);
    }

    #[test]
    fn b1_sets_bit_one() {
        let mut output = ProfileOutput::neutral();
        output.buttons = Button::B1;
        let report = SwitchPro::send_report(0, &test_event(), &output);
        assert_ne!(report.bytes()[0] & 0x02, 0);
    }
}
