//! Canonical input event: the normalized per-frame snapshot every driver
//! produces and every output mode consumes. Grounded on a flat
//! button-array-plus-two-stick-tuples controller state, generalized to the
//! full cross-transport button vocabulary and optional motion/pressure/
//! battery fields the data model calls for.

use bitflags::bitflags;

bitflags! {
    /// Named bitfield over the semantic button vocabulary. Active-high: a
    /// set bit means pressed. Values are fixed across drivers and output
    /// modes so a profile's remap table can talk about `Button::B1` instead
    /// of a vendor-specific bit position.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Button: u32 {
        const DPAD_UP    = 1 << 0;
        const DPAD_DOWN  = 1 << 1;
        const DPAD_LEFT  = 1 << 2;
        const DPAD_RIGHT = 1 << 3;
        /// South face button (Xbox A / Switch B / PlayStation Cross).
        const B1 = 1 << 4;
        /// East face button (Xbox B / Switch A / PlayStation Circle).
        const B2 = 1 << 5;
        /// West face button (Xbox X / Switch Y / PlayStation Square).
        const B3 = 1 << 6;
        /// North face button (Xbox Y / Switch X / PlayStation Triangle).
        const B4 = 1 << 7;
        const L1 = 1 << 8;
        const R1 = 1 << 9;
        const L2 = 1 << 10;
        const R2 = 1 << 11;
        const L3 = 1 << 12;
        const R3 = 1 << 13;
        /// Select / Back / Minus.
        const S1 = 1 << 14;
        /// Start / Menu / Plus.
        const S2 = 1 << 15;
        /// Guide / Home / PS button.
        const A1 = 1 << 16;
        /// Capture / screenshot button.
        const A2 = 1 << 17;
        const A3 = 1 << 18;
        const A4 = 1 << 19;
    }
}

/// Canonical order of the 12-slot DS2-style pressure table.
pub const PRESSURE_ORDER: [Button; 12] = [
    Button::DPAD_UP,
    Button::DPAD_RIGHT,
    Button::DPAD_DOWN,
    Button::DPAD_LEFT,
    Button::L2,
    Button::R2,
    Button::L1,
    Button::R1,
    Button::B4,
    Button::B2,
    Button::B1,
    Button::B3,
];

/// Canonical 4-bit LED pattern per 1-based player index (`PLAYER_LEDS[0]` is
/// unused padding so the array can be indexed directly by player number).
pub const PLAYER_LEDS: [u8; 8] = [
    0b0000, 0b0001, 0b0011, 0b0111, 0b1111, 0b1001, 0b1010, 0b1011,
];

/// Axis indices into [`CanonicalEvent::analog`].
pub mod axis {
    pub const LX: usize = 0;
    pub const LY: usize = 1;
    pub const RX: usize = 2;
    pub const RY: usize = 3;
    pub const L2: usize = 4;
    pub const R2: usize = 5;
}

/// What kind of logical device produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    Gamepad,
    Keyboard,
    Mouse,
    Arcade,
    AdapterPort,
}

/// Which wire class a connection arrived over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Usb,
    BtClassic,
    BtBle,
    Native,
}

/// A fixed-size snapshot of one logical controller at one instant. Never
/// retained by the callee of `router.submit_input` — it lives on the
/// driver's stack for the duration of that call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanonicalEvent {
    pub source_address: u8,
    pub instance: u8,
    pub kind: DeviceKind,
    pub transport: Transport,
    pub buttons: Button,
    /// LX, LY, RX, RY, L2, R2. Sticks centered at 128, triggers released at 0.
    pub analog: [u8; 6],
    pub has_motion: bool,
    pub accel: [i16; 3],
    pub gyro: [i16; 3],
    pub has_pressure: bool,
    pub pressure: [u8; 12],
    pub battery_level: u8,
    pub battery_charging: bool,
}

impl CanonicalEvent {
    /// Builds a zeroed event with sentinel defaults: sticks centered at 128,
    /// triggers released at 0, no buttons, no motion/pressure.
    pub fn make_event(source_address: u8, instance: u8, kind: DeviceKind, transport: Transport) -> Self {
        Self {
            source_address,
            instance,
            kind,
            transport,
            buttons: Button::empty(),
            analog: [128, 128, 128, 128, 0, 0],
            has_motion: false,
            accel: [0; 3],
            gyro: [0; 3],
            has_pressure: false,
            pressure: [0; 12],
            battery_level: 0,
            battery_charging: false,
        }
    }

    /// Replays a zeroed (neutral) event for `source`/`instance` so an output
    /// tick emits a clean report after disconnect.
    pub fn neutral(source_address: u8, instance: u8, kind: DeviceKind, transport: Transport) -> Self {
        Self::make_event(source_address, instance, kind, transport)
    }

    /// Clamps stick axes to `[1,255]` (0 is a reserved "sentinel absent"
    /// value) and leaves trigger axes as full `[0,255]`. Drivers call this
    /// once after populating `analog` from a raw report.
    pub fn clamp_axes(&mut self) {
        for axis in &mut self.analog[axis::LX..=axis::RY] {
            if *axis == 0 {
                *axis = 1;
            }
        }
    }

    /// Validates the invariants a submitted event must uphold (stick axes
    /// never zero, motion data zeroed unless `has_motion`). Intended for
    /// debug assertions and tests, not the hot path.
    pub fn check_invariants(&self) -> bool {
        let sticks_ok = self.analog[axis::LX..=axis::RY].iter().all(|&v| (1..=255).contains(&v));
        let motion_ok = self.has_motion || (self.accel == [0; 3] && self.gyro == [0; 3]);
        sticks_ok && motion_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn make_event_has_sentinel_defaults() {
        let e = CanonicalEvent::make_event(1, 0, DeviceKind::Gamepad, Transport::Usb);
        assert_eq!(e.analog, [128, 128, 128, 128, 0, 0]);
        assert!(e.buttons.is_empty());
        assert!(!e.has_motion);
        assert!(e.check_invariants());
    }

    #[test]
    fn clamp_axes_rejects_zero_on_sticks_only() {
        let mut e = CanonicalEvent::make_event(1, 0, DeviceKind::Gamepad, Transport::Usb);
        e.analog = [0, 0, 0, 0, 0, 0];
        e.clamp_axes();
        assert_eq!(&e.analog[axis::LX..=axis::RY], &[1, 1, 1, 1]);
        assert_eq!(e.analog[axis::L2], 0);
        assert_eq!(e.analog[axis::R2], 0);
    }

    #[test]
    fn player_leds_match_spec_examples() {
        assert_eq!(PLAYER_LEDS[1], 0b0001);
        assert_eq!(PLAYER_LEDS[5], 0b1001);
    }

    #[test]
    fn pressure_order_matches_canonical_sequence() {
        assert_eq!(PRESSURE_ORDER[0], Button::DPAD_UP);
        assert_eq!(PRESSURE_ORDER[11], Button::B3);
    }
}
