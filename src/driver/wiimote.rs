//! Wiimote driver. Same Bluetooth Classic transport and wire
//! primitives as [`super::wiiu_pro`], but a different core button layout and
//! up to four hot-swappable extensions, plus bare-Wiimote orientation
//! handling (pointing vs sideways NES-style grip) when no extension is
//! attached.

use super::{ConnectIdentity, Driver, Outbound};
use crate::event::{axis, Button, CanonicalEvent, DeviceKind, Transport};
use crate::feedback::FeedbackState;
use crate::util::timer::StepTimer;

const STEP_TIMEOUT_MS: u64 = 1000;
const MAX_RETRIES: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extension {
    None,
    Nunchuk,
    Classic,
    ClassicMini,
    Guitar,
    /// Identified as a Wii U Pro shell; full handling lives in
    /// [`super::wiiu_pro`] — this driver only records the identity.
    WiiUPro,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Auto,
    ForcedHorizontal,
    ForcedVertical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SubchainState {
    Idle,
    SendInit1,
    WaitInit1Ack,
    SendInit2,
    WaitInit2Ack,
    ReadType,
    WaitTypeResp,
    SendReportMode,
    WaitReportModeAck,
    Ready,
}

pub struct WiimoteDriver {
    source_address: u8,
    instance: u8,
    extension: Extension,
    subchain: SubchainState,
    timer: StepTimer,
    retries: u8,
    orientation: Orientation,
    is_horizontal: bool,
}

impl WiimoteDriver {
    pub fn new(source_address: u8, instance: u8) -> Self {
        Self {
            source_address,
            instance,
            extension: Extension::None,
            subchain: SubchainState::Idle,
            timer: StepTimer::new(),
            retries: 0,
            orientation: Orientation::Auto,
            is_horizontal: false,
        }
    }

    /// A status report's extension flag (byte 2, bit 1) toggled: 1 restarts
    /// the extension-init subchain, 0 hot-swaps back to bare-Wiimote mode.
    fn handle_status(&mut self, ext_present: bool, now_ms: u32) {
        if ext_present {
            self.subchain = SubchainState::SendInit1;
            self.retries = 0;
            self.timer.arm(now_ms as u64, STEP_TIMEOUT_MS);
        } else {
            self.extension = Extension::None;
            self.subchain = SubchainState::Idle;
        }
    }

    fn identify_extension(id_bytes: &[u8]) -> Extension {
        match id_bytes {
            [0xA4, 0x20, 0x00, 0x00] => Extension::Nunchuk,
            [0xA4, 0x20, 0x01, 0x01] => Extension::Classic,
            [0xA4, 0x20, 0x01, 0x03] => Extension::Guitar,
            [0xA4, 0x20, 0x01, 0x20] => Extension::WiiUPro,
            _ => Extension::None,
        }
    }

    fn update_orientation(&mut self, accel_x: u8) {
        if self.orientation != Orientation::Auto {
            self.is_horizontal = self.orientation == Orientation::ForcedHorizontal;
            return;
        }
        let delta = (accel_x as i16 - 128).unsigned_abs();
        if delta >= 20 {
            self.is_horizontal = true;
        } else if delta < 12 {
            self.is_horizontal = false;
        }
    }

    fn decode_core(&self, byte1: u8, byte2: u8) -> Button {
        // Canonical bit-for-bit core layout, inverted-free (core bits are
        // active-high on the Wiimote, unlike the Wii U Pro extension bytes).
        let mut buttons = Button::empty();
        if byte1 & 0x01 != 0 {
            buttons |= Button::DPAD_LEFT;
        }
        if byte1 & 0x02 != 0 {
            buttons |= Button::DPAD_RIGHT;
        }
        if byte1 & 0x04 != 0 {
            buttons |= Button::DPAD_DOWN;
        }
        if byte1 & 0x08 != 0 {
            buttons |= Button::DPAD_UP;
        }
        if byte1 & 0x10 != 0 {
            buttons |= Button::S2; // Plus
        }
        if byte2 & 0x01 != 0 {
            buttons |= Button::B2; // Two
        }
        if byte2 & 0x02 != 0 {
            buttons |= Button::B1; // One
        }
        if byte2 & 0x04 != 0 {
            buttons |= Button::B3; // B (trigger)
        }
        if byte2 & 0x08 != 0 {
            buttons |= Button::B4; // A
        }
        if byte2 & 0x10 != 0 {
            buttons |= Button::S1; // Minus
        }
        if byte2 & 0x80 != 0 {
            buttons |= Button::A1; // Home
        }

        if self.is_horizontal {
            rotate_horizontal(buttons)
        } else {
            buttons
        }
    }
}

fn rotate_horizontal(buttons: Button) -> Button {
    let mut out = buttons & !(Button::DPAD_UP | Button::DPAD_DOWN | Button::DPAD_LEFT | Button::DPAD_RIGHT | Button::B1 | Button::B2 | Button::B3 | Button::B4);
    if buttons.contains(Button::DPAD_UP) {
        out |= Button::DPAD_LEFT;
    }
    if buttons.contains(Button::DPAD_LEFT) {
        out |= Button::DPAD_DOWN;
    }
    if buttons.contains(Button::DPAD_DOWN) {
        out |= Button::DPAD_RIGHT;
    }
    if buttons.contains(Button::DPAD_RIGHT) {
        out |= Button::DPAD_UP;
    }
    if buttons.contains(Button::B1) {
        out |= Button::B3;
    }
    if buttons.contains(Button::B3) {
        out |= Button::B1;
    }
    if buttons.contains(Button::B2) {
        out |= Button::B4;
    }
    if buttons.contains(Button::B4) {
        out |= Button::B2;
    }
    out
}

fn decode_nunchuk(ext: &[u8], event: &mut CanonicalEvent) {
    event.analog[axis::RX] = ext[0];
    event.analog[axis::RY] = 255 - ext[1];
    event.clamp_axes();
    let flags = ext[5];
    if flags & 0x02 == 0 {
        event.buttons |= Button::L1; // Z
    }
    if flags & 0x01 == 0 {
        event.buttons |= Button::L2; // C
    }
}

fn decode_classic(ext: &[u8], event: &mut CanonicalEvent) {
    event.analog[axis::LX] = (ext[0] & 0x3F) << 2;
    event.analog[axis::LY] = (ext[1] & 0x3F) << 2;
    event.analog[axis::RX] = ((ext[0] >> 6) | ((ext[1] >> 5) & 0x06) | ((ext[2] >> 3) & 0x18)) << 3;
    event.analog[axis::RY] = (ext[2] & 0x1F) << 3;
    event.clamp_axes();
    let b4 = !ext[4];
    let b5 = !ext[5];
    if b4 & 0x80 != 0 {
        event.buttons |= Button::DPAD_RIGHT;
    }
    if b4 & 0x40 != 0 {
        event.buttons |= Button::DPAD_DOWN;
    }
    if b4 & 0x20 != 0 {
        event.buttons |= Button::L2;
    }
    if b4 & 0x10 != 0 {
        event.buttons |= Button::R2;
    }
    if b4 & 0x08 != 0 {
        event.buttons |= Button::S2;
    }
    if b4 & 0x04 != 0 {
        event.buttons |= Button::A1;
    }
    if b4 & 0x02 != 0 {
        event.buttons |= Button::S1;
    }
    if b4 & 0x01 != 0 {
        event.buttons |= Button::L3;
    }
    if b5 & 0x80 != 0 {
        event.buttons |= Button::R3;
    }
    if b5 & 0x40 != 0 {
        event.buttons |= Button::B4;
    }
    if b5 & 0x20 != 0 {
        event.buttons |= Button::B2;
    }
    if b5 & 0x10 != 0 {
        event.buttons |= Button::B1;
    }
    if b5 & 0x08 != 0 {
        event.buttons |= Button::B3;
    }
    if b5 & 0x04 != 0 {
        event.buttons |= Button::L1;
    }
    if b5 & 0x02 != 0 {
        event.buttons |= Button::DPAD_UP;
    }
    if b5 & 0x01 != 0 {
        event.buttons |= Button::DPAD_LEFT;
    }
}

fn decode_classic_mini_digital(ext: &[u8], event: &mut CanonicalEvent) {
    // NES/SNES Classic Mini extension reports digital-only, same bit
    // positions as the Classic Controller's two button bytes.
    decode_classic(ext, event);
}

impl Driver for WiimoteDriver {
    fn init(&mut self, _now_ms: u32) -> bool {
        true
    }

    fn process_report(&mut self, bytes: &[u8], now_ms: u32) -> Option<CanonicalEvent> {
        if bytes.is_empty() {
            return None;
        }
        match bytes[0] {
            0x20 if bytes.len() >= 3 => {
                let ext_present = bytes[2] & 0x02 != 0;
                self.handle_status(ext_present, now_ms);
                None
            }
            0x22 => {
                match self.subchain {
                    SubchainState::WaitInit1Ack => {
                        self.subchain = SubchainState::SendInit2;
                        self.retries = 0;
                    }
                    SubchainState::WaitInit2Ack => {
                        self.subchain = SubchainState::ReadType;
                        self.retries = 0;
                    }
                    SubchainState::WaitReportModeAck => {
                        self.subchain = SubchainState::Ready;
                    }
                    _ => {}
                }
                None
            }
            0x21 if bytes.len() >= 12 && self.subchain == SubchainState::WaitTypeResp => {
                self.extension = Self::identify_extension(&bytes[8..12]);
                self.subchain = SubchainState::SendReportMode;
                None
            }
            0x30 if bytes.len() >= 3 => {
                let mut event = CanonicalEvent::make_event(self.source_address, self.instance, DeviceKind::Gamepad, Transport::BtClassic);
                event.buttons = self.decode_core(bytes[1], bytes[2]);
                Some(event)
            }
            0x35 if bytes.len() >= 11 => {
                let mut event = CanonicalEvent::make_event(self.source_address, self.instance, DeviceKind::Gamepad, Transport::BtClassic);
                event.buttons = self.decode_core(bytes[1], bytes[2]);
                self.update_orientation(bytes[3]);
                let ext = &bytes[5..11];
                match self.extension {
                    Extension::Nunchuk => decode_nunchuk(ext, &mut event),
                    Extension::Classic => decode_classic(ext, &mut event),
                    Extension::ClassicMini => decode_classic_mini_digital(ext, &mut event),
                    Extension::Guitar => decode_classic(ext, &mut event),
                    Extension::None | Extension::WiiUPro => {}
                }
                Some(event)
            }
            _ => None,
        }
    }

    fn task(&mut self, now_ms: u32, _feedback: &FeedbackState) -> Option<Outbound> {
        if !self.timer.is_armed() || !self.timer.expired(now_ms as u64) {
            return None;
        }
        match self.subchain {
            SubchainState::SendInit1 => {
                self.subchain = SubchainState::WaitInit1Ack;
                self.timer.arm(now_ms as u64, STEP_TIMEOUT_MS);
                Some(Outbound::new(0x16, &[0x04, 0xA4, 0x00, 0xF0, 0x01, 0x55]))
            }
            SubchainState::WaitInit1Ack | SubchainState::WaitInit2Ack | SubchainState::WaitTypeResp | SubchainState::WaitReportModeAck => {
                self.retries += 1;
                if self.retries > MAX_RETRIES {
                    self.subchain = SubchainState::Idle;
                    self.timer.disarm();
                } else {
                    self.timer.arm(now_ms as u64, STEP_TIMEOUT_MS);
                }
                None
            }
            SubchainState::SendInit2 => {
                self.subchain = SubchainState::WaitInit2Ack;
                self.timer.arm(now_ms as u64, STEP_TIMEOUT_MS);
                Some(Outbound::new(0x16, &[0x04, 0xA4, 0x00, 0xFB, 0x01, 0x00]))
            }
            SubchainState::ReadType => {
                self.subchain = SubchainState::WaitTypeResp;
                self.timer.arm(now_ms as u64, STEP_TIMEOUT_MS);
                Some(Outbound::new(0x17, &[0x04, 0xA4, 0x00, 0xFA, 0x00, 0x06]))
            }
            SubchainState::SendReportMode => {
                self.subchain = SubchainState::WaitReportModeAck;
                self.timer.arm(now_ms as u64, STEP_TIMEOUT_MS);
                Some(Outbound::new(0x12, &[0x00, 0x35]))
            }
            SubchainState::Idle | SubchainState::Ready => {
                self.timer.disarm();
                None
            }
        }
    }

    fn disconnect(&mut self) -> (u8, u8) {
        (self.source_address, self.instance)
    }
}

pub fn matches(identity: &ConnectIdentity) -> bool {
    !identity.is_ble && identity.name.windows(7).any(|w| w == b"Nintend") && !identity.name.windows(7).any(|w| w == b"Wii U P")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn horizontal_mode_swaps_core_buttons_and_suppresses_dpad_rotation() {
        let mut d = WiimoteDriver::new(0, 0);
        d.update_orientation(101 + 128 - 128); // delta 101 >= 20 -> horizontal
        assert!(d.is_horizontal);
        let buttons = d.decode_core(0, 0x08); // A pressed
        assert!(buttons.contains(Button::B2), "horizontal grip swaps A (B4) onto the B2 slot");
        assert!(!buttons.contains(Button::B4));
    }

    #[test]
    fn ext_flag_zero_hot_swaps_back_to_bare_wiimote() {
        let mut d = WiimoteDriver::new(0, 0);
        d.extension = Extension::Nunchuk;
        d.handle_status(false, 0);
        assert_eq!(d.extension, Extension::None);
        assert_eq!(d.subchain, SubchainState::Idle);
    }

    #[test]
    fn extension_identity_table_matches_nunchuk_and_classic() {
        assert_eq!(WiimoteDriver::identify_extension(&[0xA4, 0x20, 0x00, 0x00]), Extension::Nunchuk);
        assert_eq!(WiimoteDriver::identify_extension(&[0xA4, 0x20, 0x01, 0x01]), Extension::Classic);
        assert_eq!(WiimoteDriver::identify_extension(&[0xA4, 0x20, 0x01, 0x20]), Extension::WiiUPro);
    }

    #[test]
    fn core_only_report_decodes_dpad_and_buttons() {
        let mut d = WiimoteDriver::new(0, 0);
        let event = d.process_report(&[0x30, 0x08, 0x08], 0).unwrap();
        assert!(event.buttons.contains(Button::DPAD_UP));
        assert!(event.buttons.contains(Button::B4));
    }
}
