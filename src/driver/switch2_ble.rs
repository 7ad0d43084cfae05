//! Nintendo Switch 2 BLE driver. 64-byte report, buttons at
//! bytes 4-7, sticks packed as four 12-bit values at bytes 10-15. Stick
//! centers are auto-calibrated from the first 4 reports before any input is
//! forwarded, since the family ships without a fixed documented center.

use super::{ConnectIdentity, Driver, Outbound};
use crate::event::{axis, Button, CanonicalEvent, DeviceKind, Transport};
use crate::feedback::FeedbackState;

const CALIBRATION_SAMPLES: u8 = 4;

/// Per-controller axis half-range; GC main stick and C-stick use narrower
/// ranges than the Pro 2's symmetric sticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    Pro2,
    GameCube,
}

impl Variant {
    fn range(self) -> i32 {
        match self {
            Variant::Pro2 => 1610,
            Variant::GameCube => 1225,
        }
    }
}

struct Calibration {
    samples_seen: u8,
    sum: [i32; 4],
    center: [i32; 4],
}

impl Calibration {
    fn new() -> Self {
        Self { samples_seen: 0, sum: [0; 4], center: [2048; 4] }
    }

    fn feed(&mut self, raw: [u16; 4]) -> bool {
        if self.samples_seen >= CALIBRATION_SAMPLES {
            return true;
        }
        for (s, r) in self.sum.iter_mut().zip(raw.iter()) {
            *s += *r as i32;
        }
        self.samples_seen += 1;
        if self.samples_seen == CALIBRATION_SAMPLES {
            for (c, s) in self.center.iter_mut().zip(self.sum.iter()) {
                *c = *s / CALIBRATION_SAMPLES as i32;
            }
            true
        } else {
            false
        }
    }
}

pub struct Switch2BleDriver {
    source_address: u8,
    instance: u8,
    variant: Variant,
    calibration: Calibration,
}

impl Switch2BleDriver {
    pub fn new(source_address: u8, instance: u8, identity: &ConnectIdentity) -> Self {
        let variant = if identity.pid == 0x2073 { Variant::GameCube } else { Variant::Pro2 };
        Self { source_address, instance, variant, calibration: Calibration::new() }
    }

    fn scale(&self, raw: u16, center: i32) -> u8 {
        let range = self.variant.range();
        let delta = raw as i32 - center;
        let clamped = delta.clamp(-range, range);
        let scaled = 128 + (clamped * 127) / range;
        scaled.clamp(0, 255) as u8
    }
}

fn unpack_12bit(bytes: &[u8]) -> [u16; 4] {
    // LX/LY pair packed across bytes[0..3], RX/RY pair across bytes[3..6];
    // each value clipped to 12 bits (see DESIGN.md).
    let lx = (bytes[0] as u16) | ((bytes[1] as u16 & 0x0F) << 8);
    let ly = ((bytes[1] as u16) >> 4) | ((bytes[2] as u16) << 4);
    let rx = (bytes[3] as u16) | ((bytes[4] as u16 & 0x0F) << 8);
    let ry = ((bytes[4] as u16) >> 4) | ((bytes[5] as u16) << 4);
    [lx & 0x0FFF, ly & 0x0FFF, rx & 0x0FFF, ry & 0x0FFF]
}

impl Driver for Switch2BleDriver {
    fn init(&mut self, _now_ms: u32) -> bool {
        true
    }

    fn process_report(&mut self, bytes: &[u8], _now_ms: u32) -> Option<CanonicalEvent> {
        // Some hosts prepend an 0xA1 HID-INPUT header; tolerate either framing.
        let payload: &[u8] = if bytes.first() == Some(&0xA1) { &bytes[1..] } else { bytes };
        if payload.len() < 16 {
            return None;
        }

        let raw_sticks = unpack_12bit(&payload[10..16]);
        if !self.calibration.feed(raw_sticks) {
            return None;
        }

        let mut event = CanonicalEvent::make_event(self.source_address, self.instance, DeviceKind::Gamepad, Transport::BtBle);

        event.analog[axis::LX] = self.scale(raw_sticks[0], self.calibration.center[0]);
        // Y axes inverted to HID convention: up is the low raw value.
        event.analog[axis::LY] = 255 - self.scale(raw_sticks[1], self.calibration.center[1]);
        event.analog[axis::RX] = self.scale(raw_sticks[2], self.calibration.center[2]);
        event.analog[axis::RY] = 255 - self.scale(raw_sticks[3], self.calibration.center[3]);
        event.clamp_axes();

        let raw_buttons = u32::from_le_bytes([payload[4], payload[5], payload[6], payload[7]]);
        let mut buttons = Button::from_bits_truncate(raw_buttons);
        if self.variant == Variant::GameCube {
            // GC variant swaps L1<->L2 and R1<->R2.
            let l1 = buttons.contains(Button::L1);
            let l2 = buttons.contains(Button::L2);
            let r1 = buttons.contains(Button::R1);
            let r2 = buttons.contains(Button::R2);
            buttons.set(Button::L1, l2);
            buttons.set(Button::L2, l1);
            buttons.set(Button::R1, r2);
            buttons.set(Button::R2, r1);
        }
        event.buttons = buttons;
        Some(event)
    }

    fn task(&mut self, _now_ms: u32, _feedback: &FeedbackState) -> Option<Outbound> {
        None
    }

    fn disconnect(&mut self) -> (u8, u8) {
        (self.source_address, self.instance)
    }
}

impl PartialEq for Variant {
    fn eq(&self, other: &Self) -> bool {
        core::mem::discriminant(self) == core::mem::discriminant(other)
    }
}
impl Eq for Variant {}

pub fn matches(identity: &ConnectIdentity) -> bool {
    identity.is_ble && identity.vid == 0x0553
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report_with_sticks(center_raw: u16) -> [u8; 16] {
        let mut r = [0u8; 16];
        let sticks = [center_raw; 4];
        r[10] = sticks[0] as u8;
        r[11] = ((sticks[0] >> 8) as u8 & 0x0F) | (((sticks[1] & 0x0F) as u8) << 4);
        r[12] = (sticks[1] >> 4) as u8;
        r[13] = sticks[2] as u8;
        r[14] = ((sticks[2] >> 8) as u8 & 0x0F) | (((sticks[3] & 0x0F) as u8) << 4);
        r[15] = (sticks[3] >> 4) as u8;
        r
    }

    #[test]
    fn first_four_reports_are_absorbed_as_calibration() {
        let identity = ConnectIdentity { name: b"", class_of_device: 0, vid: 0x0553, pid: 0x2069, is_ble: true };
        let mut d = Switch2BleDriver::new(1, 0, &identity);
        let report = report_with_sticks(2048);
        assert!(d.process_report(&report, 0).is_none());
        assert!(d.process_report(&report, 0).is_none());
        assert!(d.process_report(&report, 0).is_none());
        assert!(d.process_report(&report, 0).is_some());
    }

    #[test]
    fn centered_stick_after_calibration_reads_128() {
        let identity = ConnectIdentity { name: b"", class_of_device: 0, vid: 0x0553, pid: 0x2069, is_ble: true };
        let mut d = Switch2BleDriver::new(1, 0, &identity);
        let report = report_with_sticks(2048);
        for _ in 0..4 {
            d.process_report(&report, 0);
        }
        let event = d.process_report(&report, 0).unwrap();
        assert_eq!(event.analog[axis::LX], 128);
    }

    #[test]
    fn gamecube_variant_swaps_shoulder_pairs() {
        let identity = ConnectIdentity { name: b"", class_of_device: 0, vid: 0x0553, pid: 0x2073, is_ble: true };
        let mut d = Switch2BleDriver::new(1, 0, &identity);
        let mut report = report_with_sticks(2048);
        report[4..8].copy_from_slice(&(Button::L1.bits()).to_le_bytes());
        for _ in 0..4 {
            d.process_report(&report, 0);
        }
        let event = d.process_report(&report, 0).unwrap();
        assert!(event.buttons.contains(Button::L2));
        assert!(!event.buttons.contains(Button::L1));
    }
}
