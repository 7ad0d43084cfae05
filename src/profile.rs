//! Profile engine: button remap, combo pre-pass, SOCD cleaning,
//! stick pipeline, trigger behavior and pressure table, applied in that
//! fixed order to turn a driver's raw buttons/analog into the
//! profile-transformed output the router stores or exclusive-taps out.
//!
//! The SOCD cleaner tracks the same last-input/first-input bookkeeping a
//! fixed left/right+up/down cleaner would, generalized to the canonical
//! `Button` bitset the rest of this crate uses.

use crate::event::{axis, Button, PRESSURE_ORDER};

pub const MAX_BUTTON_MAPS: usize = 24;
pub const MAX_COMBO_MAPS: usize = 8;
pub const MAX_STICK_MODIFIERS: usize = 4;

/// SOCD (Simultaneous Opposing Cardinal Directions) resolution policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocdMode {
    Neutral,
    LastWin,
    FirstWin,
    UpPriority,
    SecondInputPriority,
}

/// Per-axis-pair SOCD state. One instance handles left/right, a second
/// handles up/down, factored so either axis can be cleaned independently.
#[derive(Debug, Clone, Copy)]
pub struct SocdAxis {
    mode: SocdMode,
    last: (bool, bool),
    first_was_low: bool,
}

impl SocdAxis {
    pub fn new(mode: SocdMode) -> Self {
        Self { mode, last: (false, false), first_was_low: true }
    }

    /// Resolves one frame of `(low, high)` (e.g. `(left, right)` or
    /// `(up, down)`) into a conflict-free pair.
    pub fn resolve(&mut self, low: bool, high: bool) -> (bool, bool) {
        let resolved = if low && high {
            match self.mode {
                SocdMode::Neutral => (false, false),
                SocdMode::UpPriority => (true, false),
                SocdMode::LastWin => {
                    if self.last == (true, false) {
                        (false, true)
                    } else if self.last == (false, true) {
                        (true, false)
                    } else {
                        (false, true)
                    }
                }
                SocdMode::FirstWin => {
                    if self.first_was_low {
                        (true, false)
                    } else {
                        (false, true)
                    }
                }
                SocdMode::SecondInputPriority => {
                    if self.last == (true, false) {
                        (false, true)
                    } else if self.last == (false, true) {
                        (true, false)
                    } else {
                        (false, false)
                    }
                }
            }
        } else {
            if low && !high && self.last != (true, false) {
                self.first_was_low = true;
            } else if !low && high && self.last != (false, true) {
                self.first_was_low = false;
            }
            (low, high)
        };
        self.last = (low, high);
        resolved
    }
}

/// What happens to a raw button bit during remap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemapAction {
    Passthrough,
    Disabled,
    RemapTo(Button),
    /// Remaps to `Button` and also forces the named analog axis to `value`
    /// (e.g. L1 -> L2 with a full-scale trigger pull).
    RemapWithAnalog(Button, usize, u8),
}

#[derive(Debug, Clone, Copy)]
pub struct ButtonMap {
    pub input: Button,
    pub action: RemapAction,
}

/// A combo entry: when `required` is fully held (and, if `exclusive`,
/// nothing else extra is held besides `required`/`ignored`), `output` is
/// asserted. If `consumes`, the `required` bits are cleared from the raw
/// button state before the remap pass sees them.
#[derive(Debug, Clone, Copy)]
pub struct ComboMap {
    pub required: Button,
    pub output: Button,
    pub exclusive: bool,
    pub ignored: Button,
    pub consumes: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerBehavior {
    Passthrough,
    DigitalOnly { threshold: u8 },
    AnalogOnly,
    Disabled,
}

/// Conditions stick scaling on a held button (e.g. "L3 held -> half speed").
#[derive(Debug, Clone, Copy)]
pub struct StickModifier {
    pub condition: Button,
    pub scale_percent: u8,
}

#[derive(Debug, Clone, Copy)]
pub struct Profile {
    pub button_maps: [Option<ButtonMap>; MAX_BUTTON_MAPS],
    pub combo_maps: [Option<ComboMap>; MAX_COMBO_MAPS],
    pub left_trigger: TriggerBehavior,
    pub right_trigger: TriggerBehavior,
    pub stick_modifiers: [Option<StickModifier>; MAX_STICK_MODIFIERS],
    pub sensitivity_percent: u8,
    pub deadzone: u8,
    pub lr_socd: SocdMode,
    pub ud_socd: SocdMode,
}

impl Profile {
    /// A profile that passes every button and axis through unchanged, with
    /// up-priority SOCD on the D-pad — the router's startup default.
    pub const fn passthrough() -> Self {
        Self {
            button_maps: [None; MAX_BUTTON_MAPS],
            combo_maps: [None; MAX_COMBO_MAPS],
            left_trigger: TriggerBehavior::Passthrough,
            right_trigger: TriggerBehavior::Passthrough,
            stick_modifiers: [None; MAX_STICK_MODIFIERS],
            sensitivity_percent: 100,
            deadzone: 8,
            lr_socd: SocdMode::Neutral,
            ud_socd: SocdMode::UpPriority,
        }
    }
}

/// Result of [`ProfileEngine::apply`]: buttons and axes ready for an output
/// mode encoder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfileOutput {
    pub buttons: Button,
    pub lx: u8,
    pub ly: u8,
    pub rx: u8,
    pub ry: u8,
    pub l2_analog: u8,
    pub r2_analog: u8,
    pub pressure: Option<[u8; 12]>,
}

impl ProfileOutput {
    /// Centered sticks, released triggers, no buttons — the output an
    /// output-mode encoder sends after a disconnect or before first input.
    pub fn neutral() -> Self {
        Self { buttons: Button::empty(), lx: 128, ly: 128, rx: 128, ry: 128, l2_analog: 0, r2_analog: 0, pressure: None }
    }
}

/// Carries the mutable SOCD bookkeeping across frames for one player slot.
/// Everything else in a [`Profile`] is static read-only data, so only this needs to live per-slot rather than per-profile.
#[derive(Debug, Clone, Copy)]
pub struct ProfileEngineState {
    lr: SocdAxis,
    ud: SocdAxis,
}

impl ProfileEngineState {
    pub fn new(profile: &Profile) -> Self {
        Self { lr: SocdAxis::new(profile.lr_socd), ud: SocdAxis::new(profile.ud_socd) }
    }
}

fn apply_deadzone(v: i16, deadzone: u8) -> u8 {
    let centered = v - 128;
    if centered.unsigned_abs() < deadzone as u16 {
        128
    } else {
        v.clamp(0, 255) as u8
    }
}

fn scale_around_center(v: u8, percent: u8) -> u8 {
    let centered = v as i32 - 128;
    let scaled = centered * percent as i32 / 100;
    (128 + scaled).clamp(0, 255) as u8
}

/// Applies a profile to one frame of raw input.
pub fn apply(
    profile: &Profile,
    state: &mut ProfileEngineState,
    raw_buttons: Button,
    analog: [u8; 6],
    has_pressure: bool,
) -> ProfileOutput {
    let mut raw = raw_buttons;
    let mut out = Button::empty();

    // 1. Combo pre-pass.
    for slot in profile.combo_maps.iter().flatten() {
        let required_held = (raw & slot.required) == slot.required;
        let extras_clear = (raw & !(slot.required | slot.ignored)).is_empty();
        if required_held && (!slot.exclusive || extras_clear) {
            out |= slot.output;
            if slot.consumes {
                raw &= !slot.required;
            }
        }
    }

    // 2. Button remap.
    for bit_index in 0..32u32 {
        let bit = Button::from_bits_truncate(1 << bit_index);
        if !(raw & bit).is_empty() {
            let action = profile
                .button_maps
                .iter()
                .flatten()
                .find(|m| m.input == bit)
                .map(|m| m.action)
                .unwrap_or(RemapAction::Passthrough);
            match action {
                RemapAction::Passthrough => out |= bit,
                RemapAction::Disabled => {}
                RemapAction::RemapTo(target) => out |= target,
                RemapAction::RemapWithAnalog(target, _, _) => out |= target,
            }
        }
    }
    let mut analog = analog;
    for bit_index in 0..32u32 {
        let bit = Button::from_bits_truncate(1 << bit_index);
        if !(raw & bit).is_empty() {
            if let Some(m) = profile.button_maps.iter().flatten().find(|m| m.input == bit) {
                if let RemapAction::RemapWithAnalog(_, axis_idx, value) = m.action {
                    analog[axis_idx] = value;
                }
            }
        }
    }

    // 3. SOCD cleaning on the D-pad.
    let (left, right) = state.lr.resolve(!(raw & Button::DPAD_LEFT).is_empty(), !(raw & Button::DPAD_RIGHT).is_empty());
    let (up, down) = state.ud.resolve(!(raw & Button::DPAD_UP).is_empty(), !(raw & Button::DPAD_DOWN).is_empty());
    out.set(Button::DPAD_LEFT, left);
    out.set(Button::DPAD_RIGHT, right);
    out.set(Button::DPAD_UP, up);
    out.set(Button::DPAD_DOWN, down);

    // 4. Stick pipeline: sensitivity, modifiers, deadzone/clamp.
    let mut sensitivity = profile.sensitivity_percent;
    for modifier in profile.stick_modifiers.iter().flatten() {
        if !(raw & modifier.condition).is_empty() {
            sensitivity = sensitivity.saturating_mul(modifier.scale_percent) / 100;
        }
    }
    let lx = apply_deadzone(scale_around_center(analog[axis::LX], sensitivity) as i16, profile.deadzone);
    let ly = apply_deadzone(scale_around_center(analog[axis::LY], sensitivity) as i16, profile.deadzone);
    let rx = apply_deadzone(scale_around_center(analog[axis::RX], sensitivity) as i16, profile.deadzone);
    let ry = apply_deadzone(scale_around_center(analog[axis::RY], sensitivity) as i16, profile.deadzone);

    // 5. Trigger behavior per side.
    let (l2_bit, l2_analog) = trigger_behavior(profile.left_trigger, !(raw & Button::L2).is_empty(), analog[axis::L2]);
    let (r2_bit, r2_analog) = trigger_behavior(profile.right_trigger, !(raw & Button::R2).is_empty(), analog[axis::R2]);
    out.set(Button::L2, l2_bit);
    out.set(Button::R2, r2_bit);

    // 6. Pressure table.
    let pressure = if has_pressure {
        let mut table = [0u8; 12];
        for (slot, bit) in table.iter_mut().zip(PRESSURE_ORDER.iter()) {
            *slot = if !(out & *bit).is_empty() { 255 } else { 0 };
        }
        Some(table)
    } else {
        None
    };

    ProfileOutput { buttons: out, lx, ly, rx, ry, l2_analog, r2_analog, pressure }
}

fn trigger_behavior(behavior: TriggerBehavior, raw_bit: bool, raw_analog: u8) -> (bool, u8) {
    match behavior {
        TriggerBehavior::Passthrough => (raw_bit, raw_analog),
        TriggerBehavior::DigitalOnly { threshold } => (raw_analog >= threshold, 0),
        TriggerBehavior::AnalogOnly => (false, raw_analog),
        TriggerBehavior::Disabled => (false, 0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn socd_up_priority_resolves_conflict_to_up() {
        let mut axis = SocdAxis::new(SocdMode::UpPriority);
        assert_eq!(axis.resolve(true, true), (true, false));
    }

    #[test]
    fn socd_neutral_zeroes_both() {
        let mut axis = SocdAxis::new(SocdMode::Neutral);
        assert_eq!(axis.resolve(true, true), (false, false));
    }

    #[test]
    fn socd_last_win_prefers_newest_press() {
        let mut axis = SocdAxis::new(SocdMode::LastWin);
        axis.resolve(true, false); // left held
        assert_eq!(axis.resolve(true, true), (false, true)); // right just pressed wins
    }

    #[test]
    fn exclusive_combo_fires_only_without_extra_bits() {
        let mut profile = Profile::passthrough();
        profile.combo_maps[0] = Some(ComboMap {
            required: Button::S1 | Button::S2,
            output: Button::A1,
            exclusive: true,
            ignored: Button::empty(),
            consumes: true,
        });
        let mut state = ProfileEngineState::new(&profile);
        let out = apply(&profile, &mut state, Button::S1 | Button::S2, [128; 6], false);
        assert!(!(out.buttons & Button::A1).is_empty());
        assert!((out.buttons & (Button::S1 | Button::S2)).is_empty());

        let mut state2 = ProfileEngineState::new(&profile);
        let out2 = apply(&profile, &mut state2, Button::S1 | Button::S2 | Button::B1, [128; 6], false);
        assert!((out2.buttons & Button::A1).is_empty());
        assert!(!(out2.buttons & Button::B1).is_empty());
    }

    #[test]
    fn digital_only_trigger_zeroes_analog() {
        let mut profile = Profile::passthrough();
        profile.right_trigger = TriggerBehavior::DigitalOnly { threshold: 200 };
        let mut state = ProfileEngineState::new(&profile);
        let mut analog = [128u8; 6];
        analog[axis::R2] = 250;
        let out = apply(&profile, &mut state, Button::empty(), analog, false);
        assert!(!(out.buttons & Button::R2).is_empty());
        assert_eq!(out.r2_analog, 0);
    }

    #[test]
    fn pressure_table_follows_canonical_order() {
        let profile = Profile::passthrough();
        let mut state = ProfileEngineState::new(&profile);
        let out = apply(&profile, &mut state, Button::B1, [128; 6], true);
        let pressure = out.pressure.unwrap();
        assert_eq!(pressure[10], 255); // B1 is slot index 10 in PRESSURE_ORDER
    }

    #[test]
    fn deterministic_for_fixed_input() {
        let profile = Profile::passthrough();
        let mut s1 = ProfileEngineState::new(&profile);
        let mut s2 = ProfileEngineState::new(&profile);
        let a = apply(&profile, &mut s1, Button::B1, [200; 6], false);
        let b = apply(&profile, &mut s2, Button::B1, [200; 6], false);
        assert_eq!(a, b);
    }
}
