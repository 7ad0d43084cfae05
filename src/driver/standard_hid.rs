//! Shared driver for the DualShock / Xbox / Switch Pro / DS3 family: each
//! follows the same report shape, so one fixed DS4-style layout covers the
//! family closely enough that only the VID/PID matcher and pressure-table
//! flag vary per vendor.

use super::{ConnectIdentity, Driver, Outbound};
use crate::event::{axis, Button, CanonicalEvent, DeviceKind, PRESSURE_ORDER, Transport};
use crate::feedback::FeedbackState;

const SONY_VID: u16 = 0x054C;
const MICROSOFT_VID: u16 = 0x045E;
const NINTENDO_VID: u16 = 0x057E;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Family {
    DualShock,
    Xbox,
    SwitchPro,
    Ds3,
}

pub struct StandardHidDriver {
    source_address: u8,
    instance: u8,
    family: Family,
    last_rumble: (u8, u8),
}

impl StandardHidDriver {
    pub fn new(source_address: u8, instance: u8, identity: &ConnectIdentity) -> Self {
        let family = if identity.vid == SONY_VID && identity.pid == 0x0268 {
            Family::Ds3
        } else if identity.vid == SONY_VID {
            Family::DualShock
        } else if identity.vid == MICROSOFT_VID {
            Family::Xbox
        } else {
            Family::SwitchPro
        };
        Self { source_address, instance, family, last_rumble: (0, 0) }
    }
}

impl Driver for StandardHidDriver {
    fn init(&mut self, _now_ms: u32) -> bool {
        true
    }

    fn process_report(&mut self, bytes: &[u8], _now_ms: u32) -> Option<CanonicalEvent> {
        // Common DS4-shaped layout: [id, lx, ly, rx, ry, dpad_hat|buttons_hi<<4,
        // buttons_mid, buttons_lo|triggers_digital, l2_analog, r2_analog, battery].
        if bytes.len() < 10 {
            return None;
        }
        let mut event = CanonicalEvent::make_event(self.source_address, self.instance, DeviceKind::Gamepad, Transport::Usb);

        event.analog[axis::LX] = bytes[1];
        event.analog[axis::LY] = bytes[2];
        event.analog[axis::RX] = bytes[3];
        event.analog[axis::RY] = bytes[4];
        event.clamp_axes();

        let (up, right, down, left) = crate::descriptor::decode_hat(bytes[5] & 0x0F);
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

        const FACE: [Button; 4] = [Button::B3, Button::B1, Button::B2, Button::B4];
        for (bit, flag) in FACE.iter().enumerate() {
            if bytes[5] & (0x10 << bit) != 0 {
                event.buttons |= *flag;
            }
        }

        const SHOULDERS_AND_STICKS: [Button; 8] = [Button::L1, Button::R1, Button::L2, Button::R2, Button::S1, Button::S2, Button::L3, Button::R3];
        for (bit, flag) in SHOULDERS_AND_STICKS.iter().enumerate() {
            if bytes[6] & (1 << bit) != 0 {
                event.buttons |= *flag;
            }
        }

        if bytes[7] & 0x01 != 0 {
            event.buttons |= Button::A1;
        }

        event.analog[axis::L2] = bytes[8];
        event.analog[axis::R2] = bytes[9];

        if self.family == Family::DualShock || self.family == Family::Ds3 {
            event.has_pressure = true;
            for (i, button) in PRESSURE_ORDER.iter().enumerate() {
                event.pressure[i] = if event.buttons.contains(*button) { 0xFF } else { 0x00 };
            }
        }

        if bytes.len() > 10 {
            event.battery_level = bytes[10];
        }
        Some(event)
    }

    fn task(&mut self, _now_ms: u32, feedback: &FeedbackState) -> Option<Outbound> {
        if !feedback.rumble_dirty {
            return None;
        }
        let rumble = (feedback.rumble_l, feedback.rumble_r);
        if rumble == self.last_rumble {
            return None;
        }
        self.last_rumble = rumble;
        Some(Outbound::new(0x01, &[rumble.0, rumble.1]))
    }

    fn disconnect(&mut self) -> (u8, u8) {
        (self.source_address, self.instance)
    }
}

pub fn matches(identity: &ConnectIdentity) -> bool {
    matches!(identity.vid, SONY_VID | MICROSOFT_VID | NINTENDO_VID)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dualshock_report_sets_pressure_table_from_buttons() {
        let identity = ConnectIdentity { name: b"", class_of_device: 0, vid: SONY_VID, pid: 0x05C4, is_ble: false };
        let mut d = StandardHidDriver::new(1, 0, &identity);
        let report = [0x01, 128, 128, 128, 128, 0x20, 0, 0, 0, 0];
        let event = d.process_report(&report, 0).unwrap();
        assert!(event.buttons.contains(Button::B1));
        assert!(event.has_pressure);
        assert_eq!(event.pressure[10], 0xFF, "B1 sits at pressure-table index 10");
    }

    #[test]
    fn xbox_family_has_no_pressure_table() {
        let identity = ConnectIdentity { name: b"", class_of_device: 0, vid: MICROSOFT_VID, pid: 0x02EA, is_ble: false };
        let mut d = StandardHidDriver::new(1, 0, &identity);
        let report = [0x01, 128, 128, 128, 128, 0, 0, 0, 0, 0];
        let event = d.process_report(&report, 0).unwrap();
        assert!(!event.has_pressure);
    }
}
