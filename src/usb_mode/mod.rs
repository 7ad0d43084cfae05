//! USB device modes. Each emulated console is a self-contained
//! module exposing its device/report descriptors plus pure encode/decode
//! functions; actually driving a USB peripheral (a board-specific
//! `usb-device`/`usbd-hid` class wiring) is a board-level concern
//! downstream of this crate, which stays hardware-agnostic like the rest
//! of the engine.

pub mod gc_adapter;
pub mod pcemini;
pub mod ps3;
pub mod switch_pro;
pub mod xinput;

use crate::event::CanonicalEvent;
use crate::profile::ProfileOutput;

/// A decoded host-to-device write: feedback for one player slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedbackWrite {
    pub player_index: usize,
    pub rumble: Option<(u8, u8)>,
    pub led_pattern: Option<u8>,
}

/// A fixed-capacity encoded report, since no mode's report exceeds the 64
/// byte HID IN endpoint limit.
#[derive(Debug, Clone, Copy)]
pub struct EncodedReport {
    pub report_id: u8,
    pub data: [u8; 64],
    pub len: u8,
}

impl EncodedReport {
    pub fn new(report_id: u8, bytes: &[u8]) -> Self {
        let mut data = [0u8; 64];
        let len = bytes.len().min(64);
        data[..len].copy_from_slice(&bytes[..len]);
        Self { report_id, data, len: len as u8 }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data[..self.len as usize]
    }
}

/// Shape every output-mode module implements. `event` supplies
/// the motion/battery fields a profile's button/analog output doesn't
/// carry; `output` supplies the profile-transformed buttons and axes. The
/// source signature also names a separate `buttons` parameter, which this
/// trait drops as redundant with `output.buttons`.
pub trait OutputMode {
    fn vid_pid() -> (u16, u16);
    fn report_descriptor() -> &'static [u8];
    fn send_report(player_index: usize, event: &CanonicalEvent, output: &ProfileOutput) -> EncodedReport;
    fn handle_output(report_id: u8, bytes: &[u8]) -> Option<FeedbackWrite>;
}

/// Compiled-in output modes, cycled by the user-button mode-switch facility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Ps3,
    GcAdapter,
    PcEngineMini,
    XInput,
    SwitchPro,
}

pub const MODE_CYCLE: [Mode; 5] = [Mode::SwitchPro, Mode::XInput, Mode::Ps3, Mode::PcEngineMini, Mode::GcAdapter];

impl Mode {
    pub fn next(self) -> Mode {
        let idx = MODE_CYCLE.iter().position(|m| *m == self).unwrap_or(0);
        MODE_CYCLE[(idx + 1) % MODE_CYCLE.len()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_cycle_wraps_around() {
        let mut m = Mode::GcAdapter;
        for _ in 0..MODE_CYCLE.len() {
            m = m.next();
        }
        assert_eq!(m, Mode::GcAdapter);
    }
}
