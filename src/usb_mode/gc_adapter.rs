//! Official GameCube USB adapter output mode. Unlike the other
//! four modes this multiplexes all 4 controller ports into one 37-byte IN
//! report and needs an explicit rearm of its OUT endpoint after the host's
//! one-time "start polling" command, so it doesn't fit the plain
//! [`super::OutputMode`] shape used by the single-port modes.

use crate::event::Button;
use crate::profile::ProfileOutput;
use crate::usb_mode::{EncodedReport, FeedbackWrite};

pub const VID: u16 = 0x057E;
pub const PID: u16 = 0x0337;

/// Host-to-device "start polling" command the real adapter's firmware waits
/// for before it begins pushing IN reports.
pub const START_POLLING_COMMAND: u8 = 0x13;

#[rustfmt::skip]
pub const REPORT_DESCRIPTOR: [u8; 9] = [
    0x06, 0x00, 0xFF,  // USAGE_PAGE (Vendor Defined)
    0x09, 0x01,        // USAGE (Vendor 1)
    0xA1, 0x01,        // COLLECTION (Application)
    0x81, 0x00,        // raw opaque vendor IN report, decoded by host driver
];

const BUTTON_BITS_LOW: [(Button, usize); 8] =
    [(Button::S2, 0), (Button::A1, 1), (Button::L1, 2), (Button::R1, 3), (Button::DPAD_LEFT, 4), (Button::DPAD_RIGHT, 5), (Button::DPAD_DOWN, 6), (Button::DPAD_UP, 7)];
const BUTTON_BITS_HIGH: [(Button, usize); 7] = [(Button::B1, 0), (Button::B2, 1), (Button::B3, 2), (Button::B4, 3), (Button::S1, 4), (Button::L3, 5), (Button::R3, 6)];

/// Per-port connection + last-output state held across frames so one port's
/// `send_report` doesn't clobber the other three ports' data before the
/// mux'd report is built.
#[derive(Debug, Clone, Copy, Default)]
struct PortState {
    connected: bool,
    output: Option<ProfileOutput>,
}

pub struct GcAdapter {
    ports: [PortState; 4],
    polling_started: bool,
}

impl GcAdapter {
    pub fn new() -> Self {
        Self { ports: [PortState::default(); 4], polling_started: false }
    }

    pub fn vid_pid() -> (u16, u16) {
        (VID, PID)
    }

    pub fn report_descriptor() -> &'static [u8] {
        &REPORT_DESCRIPTOR
    }

    pub fn set_connected(&mut self, port: usize, connected: bool) {
        if let Some(p) = self.ports.get_mut(port) {
            p.connected = connected;
            if !connected {
                p.output = None;
            }
        }
    }

    /// Records one port's latest profile output. Call once per port per
    /// tick, then [`Self::build_report`] once to emit the multiplexed frame.
    pub fn send_report(&mut self, port: usize, output: &ProfileOutput) {
        if let Some(p) = self.ports.get_mut(port) {
            p.output = Some(*output);
        }
    }

    /// Builds the full 37-byte mux'd report: a leading `0x21` type byte then
    /// four 9-byte port blocks (type, 2 button bytes, 2 stick axes, 2
    /// C-stick axes, 2 analog triggers).
    pub fn build_report(&self) -> EncodedReport {
        let mut bytes = [0u8; 37];
        bytes[0] = 0x21;
        for (i, port) in self.ports.iter().enumerate() {
            let base = 1 + i * 9;
            if !port.connected {
                bytes[base] = 0x00;
                continue;
            }
            bytes[base] = 0x14; // wired, no rumble-pack-present flag
            let output = port.output.unwrap_or_else(ProfileOutput::neutral);
            let mut low: u8 = 0;
            for (button, idx) in BUTTON_BITS_LOW {
                if output.buttons.contains(button) {
                    low |= 1 << idx;
                }
            }
            let mut high: u8 = 0;
            for (button, idx) in BUTTON_BITS_HIGH {
                if output.buttons.contains(button) {
                    high |= 1 << idx;
                }
            }
            bytes[base + 1] = low;
            bytes[base + 2] = high;
            bytes[base + 3] = output.lx;
            bytes[base + 4] = output.ly;
            bytes[base + 5] = output.rx;
            bytes[base + 6] = output.ry;
            bytes[base + 7] = output.l2_analog;
            bytes[base + 8] = output.r2_analog;
        }
        EncodedReport::new(0, &bytes)
    }

    /// Decodes the one-byte host-to-device command. Real hardware re-arms
    /// its OUT endpoint immediately after consuming this so the next
    /// polling-start command isn't missed.
    pub fn handle_output(&mut self, bytes: &[u8]) -> Option<FeedbackWrite> {
        if bytes.first() == Some(&START_POLLING_COMMAND) {
            self.polling_started = true;
        }
        None
    }

    pub fn is_polling(&self) -> bool {
        self.polling_started
    }
}

impl Default for GcAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disconnected_port_reports_zero_type_byte() {
        let adapter = GcAdapter::new();
        let report = adapter.build_report();
        assert_eq!(report.bytes()[1], 0x00);
    }

    #[test]
    fn connected_port_carries_through_button_state() {
        let mut adapter = GcAdapter::new();
        adapter.set_connected(0, true);
        let mut output = ProfileOutput::neutral();
        output.buttons = Button::B1;
        adapter.send_report(0, &output);
        let report = adapter.build_report();
        assert_eq!(report.bytes()[1], 0x14);
        assert_ne!(report.bytes()[3] & 0x01, 0);
    }

    #[test]
    fn start_polling_command_flips_the_flag() {
        let mut adapter = GcAdapter::new();
        assert!(!adapter.is_polling());
        adapter.handle_output(&[START_POLLING_COMMAND]);
        assert!(adapter.is_polling());
    }
}
