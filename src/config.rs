//! Compile-time configuration: pinout tables and default SOCD resolution
//! rules, baked into the firmware binary. Pin tables are inlined by hand
//! under a `PinoutConfig::get_digital_pins()` style shape, selected by the
//! `alternate_pinout` Cargo feature.

use crate::profile::SocdMode;

/// Digital, analog and "special" (mode button, lock pin) pin tables for the
/// native GPIO host drivers and the onboard-button surface. Selected at
/// compile time by the `alternate_pinout` feature.
pub struct PinoutConfig;

#[cfg(not(feature = "alternate_pinout"))]
impl PinoutConfig {
    pub fn get_digital_pins() -> &'static [(&'static str, u8)] {
        &[
            ("button_a", 2), ("button_b", 3), ("button_x", 4), ("button_y", 5),
            ("button_l", 6), ("button_r", 7), ("button_zl", 8), ("button_zr", 9),
            ("button_plus", 10), ("button_minus", 11), ("button_home", 12),
            ("button_capture", 14), ("button_l3", 15), ("button_r3", 16),
            ("dpad_up", 17), ("dpad_down", 18), ("dpad_left", 19), ("dpad_right", 20),
        ]
    }

    pub fn get_analog_pins() -> &'static [(&'static str, u8)] {
        &[("left_stick_x", 0), ("left_stick_y", 1), ("right_stick_x", 2), ("right_stick_y", 3)]
    }

    pub fn get_special_pins() -> &'static [(&'static str, u8)] {
        &[("mode_button", 21), ("lock_pin", 33)]
    }
}

#[cfg(feature = "alternate_pinout")]
impl PinoutConfig {
    pub fn get_digital_pins() -> &'static [(&'static str, u8)] {
        // A/B swapped, capture/L3/R3 unavailable on this pinout variant.
        &[
            ("button_a", 3), ("button_b", 2), ("button_x", 4), ("button_y", 5),
            ("button_l", 6), ("button_r", 7), ("button_zl", 8), ("button_zr", 9),
            ("button_plus", 10), ("button_minus", 11), ("button_home", 12),
            ("dpad_up", 17), ("dpad_down", 18), ("dpad_left", 19), ("dpad_right", 20),
        ]
    }

    pub fn get_analog_pins() -> &'static [(&'static str, u8)] {
        &[("left_stick_x", 0), ("left_stick_y", 1), ("right_stick_x", 2), ("right_stick_y", 3)]
    }

    pub fn get_special_pins() -> &'static [(&'static str, u8)] {
        &[("mode_button", 21)]
    }
}

/// Default SOCD resolution rules, keyed by axis pair name. The actual
/// cleaning algorithm lives in [`crate::profile`]'s `SocdAxis`.
pub struct SocdConfig;

impl SocdConfig {
    pub fn default_lr() -> SocdMode {
        SocdMode::Neutral
    }

    pub fn default_ud() -> SocdMode {
        SocdMode::UpPriority
    }

    /// Per-pair overrides keyed by `"left_right"` / `"up_down"`. Empty by
    /// default; a profile author can extend this table per product.
    pub fn get_custom_overrides() -> &'static [(&'static str, SocdMode)] {
        &[]
    }

    pub fn get_method_for_pair(pair: &str) -> SocdMode {
        for (name, mode) in Self::get_custom_overrides() {
            if *name == pair {
                return *mode;
            }
        }
        match pair {
            "left_right" => Self::default_lr(),
            "up_down" => Self::default_ud(),
            _ => SocdMode::Neutral,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digital_pins_cover_all_buttons() {
        assert!(PinoutConfig::get_digital_pins().len() >= 14);
    }

    #[test]
    fn default_socd_methods_match_fighting_game_convention() {
        assert_eq!(SocdConfig::get_method_for_pair("up_down"), SocdMode::UpPriority);
        assert_eq!(SocdConfig::get_method_for_pair("left_right"), SocdMode::Neutral);
    }
}
