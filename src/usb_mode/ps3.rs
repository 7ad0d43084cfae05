//! PS3 (DualShock 3) output mode. Report 0x01
//! layout: 3 button bytes, 4 stick axes, the 12-entry analog pressure table
//! in [`crate::event::PRESSURE_ORDER`] order, 8 motion bytes (accel x/y/z,
//! gyro z, then padding — DS3 only exposes one gyro axis), battery level.

use super::{EncodedReport, FeedbackWrite, OutputMode};
use crate::event::{Button, CanonicalEvent, PRESSURE_ORDER};
use crate::profile::ProfileOutput;

pub const VID: u16 = 0x054C;
pub const PID: u16 = 0x0268;

#[rustfmt::skip]
pub const REPORT_DESCRIPTOR: [u8; 50] = [
    0x05, 0x01,        // USAGE_PAGE (Generic Desktop)
    0x09, 0x05,        // USAGE (Gamepad)
    0xA1, 0x01,        // COLLECTION (Application)
    0x15, 0x00,        // LOGICAL_MINIMUM (0)
    0x25, 0x01,        // LOGICAL_MAXIMUM (1)
    0x75, 0x01,        // REPORT_SIZE (1)
    0x95, 0x14,        // REPORT_COUNT (20) buttons incl. dpad, padded to byte
    0x05, 0x09,        // USAGE_PAGE (Button)
    0x19, 0x01,        // USAGE_MINIMUM (Button 1)
    0x29, 0x14,        // USAGE_MAXIMUM (Button 20)
    0x81, 0x02,        // INPUT (Data,Var,Abs)
    0x15, 0x00,        // LOGICAL_MINIMUM (0)
    0x25, 0xFF,        // LOGICAL_MAXIMUM (255)
    0x75, 0x08,        // REPORT_SIZE (8)
    0x95, 0x04,        // REPORT_COUNT (4) sticks
    0x05, 0x01,        // USAGE_PAGE (Generic Desktop)
    0x09, 0x30,        // USAGE (X)
    0x09, 0x31,        // USAGE (Y)
    0x09, 0x32,        // USAGE (Z)
    0x09, 0x35,        // USAGE (Rz)
    0x81, 0x02,        // INPUT (Data,Var,Abs)
    0x95, 0x0C,        // REPORT_COUNT (12) pressure table
    0x09, 0x20,        // USAGE (vendor pressure)
    0x81, 0x02,        // INPUT (Data,Var,Abs)
    0xC0,
];

/// Canonical button slot -> low 20-bit PS3 mask position (dpad first, then
/// face/shoulder/stick/system buttons in the layout a DS3 decoder expects
/// on the input side).
const BUTTON_BITS: [(Button, usize); 17] = [
    (Button::S1, 0),
    (Button::L3, 1),
    (Button::R3, 2),
    (Button::S2, 3),
    (Button::DPAD_UP, 4),
    (Button::DPAD_RIGHT, 5),
    (Button::DPAD_DOWN, 6),
    (Button::DPAD_LEFT, 7),
    (Button::L2, 8),
    (Button::R2, 9),
    (Button::L1, 10),
    (Button::R1, 11),
    (Button::B4, 12),
    (Button::B2, 13),
    (Button::B1, 14),
    (Button::B3, 15),
    (Button::A1, 16),
];

pub struct Ps3;

impl OutputMode for Ps3 {
    fn vid_pid() -> (u16, u16) {
        (VID, PID)
    }

    fn report_descriptor() -> &'static [u8] {
        &REPORT_DESCRIPTOR
    }

    fn send_report(_player_index: usize, event: &CanonicalEvent, output: &ProfileOutput) -> EncodedReport {
        let mut mask: u32 = 0;
        for (button, idx) in BUTTON_BITS {
            if output.buttons.contains(button) {
                mask |= 1 << idx;
            }
        }
        let mut bytes = [0u8; 7];
        bytes[0] = (mask & 0xFF) as u8;
        bytes[1] = ((mask >> 8) & 0xFF) as u8;
        bytes[2] = ((mask >> 16) & 0xFF) as u8;
        bytes[3] = output.lx;
        bytes[4] = output.ly;
        bytes[5] = output.rx;
        bytes[6] = output.ry;

        let pressure = output.pressure.unwrap_or_else(|| {
            let mut table = [0u8; 12];
            for (i, button) in PRESSURE_ORDER.iter().enumerate() {
                if output.buttons.contains(*button) {
                    table[i] = 255;
                }
            }
            table
        });

        // Accel x/y/z as the top byte of each signed axis, one gyro axis
        // (DS3 exposes yaw only), then a padding byte to round out 8.
        let motion = [
            (event.accel[0] >> 8) as u8,
            (event.accel[1] >> 8) as u8,
            (event.accel[2] >> 8) as u8,
            (event.gyro[2] >> 8) as u8,
            0,
            0,
            0,
            0,
        ];

        let mut full = [0u8; 28];
        full[..7].copy_from_slice(&bytes);
        full[7..19].copy_from_slice(&pressure);
        full[19..27].copy_from_slice(&motion);
        full[27] = event.battery_level;
        EncodedReport::new(0x01, &full)
    }

    fn handle_output(report_id: u8, bytes: &[u8]) -> Option<FeedbackWrite> {
        // Sony's output report carries the rumble motors at a fixed offset
        // and the LED bitmask a few bytes later, per the standard DS3 0x01
        // output control layout.
        if report_id != 0x01 || bytes.len() < 5 {
            return None;
        }
        Some(FeedbackWrite { player_index: 0, rumble: Some((bytes[2], bytes[4])), led_pattern: bytes.get(9).copied() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_event() -> CanonicalEvent {
        CanonicalEvent::make_event(0, 0, crate::event::DeviceKind::Gamepad, crate::event::Transport::Usb)
    }

    #[test]
    fn s1_select_sets_bit_zero() {
        let mut output = ProfileOutput::neutral();
        output.buttons = Button::S1;
        let report = Ps3::send_report(0, &test_event(), &output);
        assert_eq!(report.bytes()[0] & 0x01, 0x01);
    }

    #[test]
    fn pressure_defaults_to_digital_press_when_profile_has_none() {
        let mut output = ProfileOutput::neutral();
        output.buttons = Button::B1;
        let report = Ps3::send_report(0, &test_event(), &output);
        assert_eq!(report.bytes()[7 + 10], 255);
    }

    #[test]
    fn explicit_pressure_table_passes_through() {
        let mut output = ProfileOutput::neutral();
        output.pressure = Some([7; 12]);
        let report = Ps3::send_report(0, &test_event(), &output);
        assert_eq!(report.bytes()[7], 7);
    }

    #[test]
    fn battery_level_passes_through_from_the_event() {
        let mut event = test_event();
        event.battery_level = 80;
        let output = ProfileOutput::neutral();
        let report = Ps3::send_report(0, &event, &output);
        assert_eq!(report.bytes()[27], 80);
    }
}
