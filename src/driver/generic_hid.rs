//! Generic HID gamepad driver. The fallback matcher: wins a
//! connection only when no vendor driver claimed it first (registry order
//! in [`super::Registry::bind`]).

use super::{ConnectIdentity, Driver, Outbound};
use crate::descriptor::{self, DescriptorError, ReportItem};
use crate::event::{axis, Button, CanonicalEvent, DeviceKind, Transport};
use crate::feedback::FeedbackState;
use heapless::Vec;

/// DirectInput button index remap: swaps the reported order so B1 lands on
/// the south face once ≥10 buttons are present. Physical buttons are
/// 1-based in the descriptor's USAGE range.
const DIRECTINPUT_REMAP: [Button; 12] = [
    Button::B3,
    Button::B1,
    Button::B2,
    Button::B4,
    Button::L1,
    Button::R1,
    Button::L2,
    Button::R2,
    Button::S1,
    Button::S2,
    Button::L3,
    Button::R3,
];

pub struct GenericHidDriver {
    source_address: u8,
    instance: u8,
    items: Vec<ReportItem, { descriptor::MAX_ITEMS }>,
    button_count: usize,
}

impl GenericHidDriver {
    pub fn new(source_address: u8, instance: u8) -> Self {
        Self { source_address, instance, items: Vec::new(), button_count: 0 }
    }

    /// Parses the connection's report descriptor; falls back to the
    /// hardcoded 6-byte layout on malformed input.
    pub fn set_descriptor(&mut self, bytes: &[u8]) -> Result<(), DescriptorError> {
        self.items = descriptor::parse(bytes)?;
        self.button_count = self.items.iter().filter(|i| i.usage_page == 0x0009).count();
        Ok(())
    }

    fn decode_with_descriptor(&self, report: &[u8]) -> Option<CanonicalEvent> {
        let mut event = CanonicalEvent::make_event(self.source_address, self.instance, DeviceKind::Gamepad, Transport::Usb);

        let mut button_index = 0usize;
        for item in &self.items {
            if item.usage_page == 0x0009 {
                let val = descriptor::extract_value(report, item).ok()?;
                if val != 0 {
                    let physical = button_index + 1;
                    if self.button_count >= 10 && physical <= DIRECTINPUT_REMAP.len() {
                        event.buttons |= DIRECTINPUT_REMAP[physical - 1];
                    } else {
                        event.buttons |= passthrough_bit(physical);
                    }
                }
                button_index += 1;
            } else if item.usage_page == 0x0001 && item.usage == 0x0039 {
                let val = descriptor::extract_value(report, item).ok()? as u8;
                let (up, right, down, left) = descriptor::decode_hat(val);
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
            } else if item.usage_page == 0x0001 {
                let idx = match item.usage {
                    0x0030 => Some(axis::LX),
                    0x0031 => Some(axis::LY),
                    0x0032 => Some(axis::RX),
                    0x0035 => Some(axis::RY),
                    _ => None,
                };
                if let Some(idx) = idx {
                    let val = descriptor::extract_value(report, item).ok()?;
                    event.analog[idx] = descriptor::scale_axis(val, item.logical_max);
                }
            }
        }
        event.clamp_axes();
        Some(event)
    }

    fn decode_fallback(&self, report: &[u8]) -> Option<CanonicalEvent> {
        if report.len() < descriptor::FALLBACK_STICK_BYTES.end {
            return None;
        }
        let mut event = CanonicalEvent::make_event(self.source_address, self.instance, DeviceKind::Gamepad, Transport::Usb);
        let raw = u16::from_le_bytes([report[0], report[1]]);
        event.buttons = Button::from_bits_truncate(raw as u32);
        event.analog[axis::LX] = report[2];
        event.analog[axis::LY] = report[3];
        event.analog[axis::RX] = report[4];
        event.analog[axis::RY] = report[5];
        event.clamp_axes();
        Some(event)
    }
}

fn passthrough_bit(physical: usize) -> Button {
    Button::from_bits_truncate(1u32 << (physical - 1).min(31))
}

impl Driver for GenericHidDriver {
    fn init(&mut self, _now_ms: u32) -> bool {
        true
    }

    fn process_report(&mut self, bytes: &[u8], _now_ms: u32) -> Option<CanonicalEvent> {
        if self.items.is_empty() {
            self.decode_fallback(bytes)
        } else {
            self.decode_with_descriptor(bytes)
        }
    }

    fn task(&mut self, _now_ms: u32, _feedback: &FeedbackState) -> Option<Outbound> {
        None
    }

    fn disconnect(&mut self) -> (u8, u8) {
        (self.source_address, self.instance)
    }
}

pub fn matches(_identity: &ConnectIdentity) -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_layout_decodes_when_no_descriptor_set() {
        let mut d = GenericHidDriver::new(1, 0);
        let report = [0x01, 0x00, 0x80, 0x80, 0x80, 0x80];
        let event = d.process_report(&report, 0).unwrap();
        assert!(!(event.buttons & Button::from_bits_truncate(1)).is_empty());
        assert_eq!(event.analog[axis::LX], 128);
    }

    #[test]
    fn short_fallback_report_is_dropped() {
        let mut d = GenericHidDriver::new(1, 0);
        assert!(d.process_report(&[0x01], 0).is_none());
    }
}
