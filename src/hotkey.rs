//! Hotkey / combo / cheat-code detection.
//!
//! A fixed-capacity registry of hold-state machines, one per player plus
//! one global accumulator that ORs every player's raw buttons together
//! each tick and is evaluated (then zeroed) in a second pass, split into
//! a per-player check and a global check.

use crate::event::Button;
use heapless::Vec;

pub const MAX_HOTKEYS: usize = 16;
pub const MAX_PLAYERS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Fires once, the instant held time first reaches `duration_ms`.
    OnHold,
    /// Fires on release, if held for at least `duration_ms`.
    OnRelease,
    /// Fires on release, if held for less than `duration_ms` (a tap).
    OnTap,
}

#[derive(Debug, Clone, Copy)]
pub struct HotkeyDef {
    pub buttons: Button,
    pub trigger: Trigger,
    pub duration_ms: u32,
    /// Global hotkeys match the OR of every player's buttons; per-player
    /// hotkeys match one player's buttons and fire with that player index.
    pub global: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fired {
    pub hotkey_id: usize,
    /// Player index, or `0xFF` for a global hotkey (mirrors the original's
    /// sentinel for "no specific player").
    pub player: u8,
    pub held_ms: u32,
}

#[derive(Debug, Clone, Copy, Default)]
struct HoldState {
    holding: bool,
    hold_start_ms: u32,
    triggered: bool,
}

struct Slot {
    def: HotkeyDef,
    active: bool,
    per_player: [HoldState; MAX_PLAYERS],
    global_state: HoldState,
}

/// Registry of hotkeys plus per-player/global hold state. `register`
/// rejects past `MAX_HOTKEYS` rather than growing (fixed-array, no
/// allocation, matching the rest of the engine); `unregister` only flips a
/// liveness flag so ids stay stable.
pub struct HotkeyRegistry {
    slots: Vec<Slot, MAX_HOTKEYS>,
    global_buttons: Button,
}

impl HotkeyRegistry {
    pub fn new() -> Self {
        Self { slots: Vec::new(), global_buttons: Button::empty() }
    }

    /// Registers a hotkey, returning its stable id, or `None` if the
    /// registry is full.
    pub fn register(&mut self, def: HotkeyDef) -> Option<usize> {
        let id = self.slots.len();
        self.slots
            .push(Slot { def, active: true, per_player: [HoldState::default(); MAX_PLAYERS], global_state: HoldState::default() })
            .ok()?;
        Some(id)
    }

    pub fn unregister(&mut self, id: usize) {
        if let Some(slot) = self.slots.get_mut(id) {
            slot.active = false;
        }
    }

    pub fn reset_player(&mut self, player: usize) {
        for slot in &mut self.slots {
            if let Some(s) = slot.per_player.get_mut(player) {
                *s = HoldState::default();
            }
        }
    }

    /// Feeds one player's raw buttons for this tick, firing any matching
    /// per-player (non-global) hotkeys, and folding the buttons into the
    /// global accumulator for the following `check_global` call.
    pub fn check_player(&mut self, player: usize, buttons: Button, now_ms: u32, out: &mut Vec<Fired, MAX_HOTKEYS>) {
        self.global_buttons |= buttons;
        if player >= MAX_PLAYERS {
            return;
        }
        for (id, slot) in self.slots.iter_mut().enumerate() {
            if !slot.active || slot.def.global {
                continue;
            }
            let state = &mut slot.per_player[player];
            step(id, player as u8, &slot.def, state, buttons, now_ms, out);
        }
    }

    /// Evaluates global-scoped hotkeys against the accumulated OR of every
    /// player's buttons this tick, then resets the accumulator for the
    /// next tick (the original's two-phase `hotkeys_check_global` shape).
    pub fn check_global(&mut self, now_ms: u32, out: &mut Vec<Fired, MAX_HOTKEYS>) {
        let buttons = self.global_buttons;
        for (id, slot) in self.slots.iter_mut().enumerate() {
            if !slot.active || !slot.def.global {
                continue;
            }
            step(id, 0xFF, &slot.def, &mut slot.global_state, buttons, now_ms, out);
        }
        self.global_buttons = Button::empty();
    }
}

impl Default for HotkeyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn step(
    id: usize,
    player: u8,
    def: &HotkeyDef,
    state: &mut HoldState,
    buttons: Button,
    now_ms: u32,
    out: &mut Vec<Fired, MAX_HOTKEYS>,
) {
    let matched = (buttons & def.buttons) == def.buttons;
    if matched {
        if !state.holding {
            state.hold_start_ms = now_ms;
            state.triggered = false;
        }
        state.holding = true;
        if def.trigger == Trigger::OnHold && !state.triggered {
            let held_ms = now_ms.saturating_sub(state.hold_start_ms);
            if held_ms >= def.duration_ms {
                let _ = out.push(Fired { hotkey_id: id, player, held_ms });
                state.triggered = true;
            }
        }
    } else {
        if state.holding {
            let held_ms = now_ms.saturating_sub(state.hold_start_ms);
            match def.trigger {
                Trigger::OnRelease if held_ms >= def.duration_ms => {
                    let _ = out.push(Fired { hotkey_id: id, player, held_ms });
                }
                Trigger::OnTap if held_ms < def.duration_ms => {
                    let _ = out.push(Fired { hotkey_id: id, player, held_ms });
                }
                _ => {}
            }
        }
        state.holding = false;
        state.triggered = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn on_hold_fires_once_at_threshold_and_rearms_after_release() {
        let mut reg = HotkeyRegistry::new();
        let id = reg.register(HotkeyDef { buttons: Button::S1 | Button::S2, trigger: Trigger::OnHold, duration_ms: 1000, global: false }).unwrap();

        let mut fired = Vec::new();
        reg.check_player(0, Button::S1 | Button::S2, 0, &mut fired);
        assert!(fired.is_empty());
        reg.check_player(0, Button::S1 | Button::S2, 999, &mut fired);
        assert!(fired.is_empty());
        reg.check_player(0, Button::S1 | Button::S2, 1000, &mut fired);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].hotkey_id, id);
        fired.clear();
        reg.check_player(0, Button::S1 | Button::S2, 1500, &mut fired);
        assert!(fired.is_empty(), "must not re-fire while still held");

        reg.check_player(0, Button::empty(), 1600, &mut fired);
        reg.check_player(0, Button::S1 | Button::S2, 1700, &mut fired);
        reg.check_player(0, Button::S1 | Button::S2, 2700, &mut fired);
        assert_eq!(fired.len(), 1, "must re-arm after a release");
    }

    #[test]
    fn on_tap_requires_a_quick_release() {
        let mut reg = HotkeyRegistry::new();
        reg.register(HotkeyDef { buttons: Button::B1, trigger: Trigger::OnTap, duration_ms: 300, global: false }).unwrap();
        let mut fired = Vec::new();
        reg.check_player(0, Button::B1, 0, &mut fired);
        reg.check_player(0, Button::empty(), 100, &mut fired);
        assert_eq!(fired.len(), 1);
    }

    #[test]
    fn global_hotkey_sees_or_of_all_players_then_resets() {
        let mut reg = HotkeyRegistry::new();
        reg.register(HotkeyDef { buttons: Button::A1, trigger: Trigger::OnHold, duration_ms: 0, global: true }).unwrap();
        let mut fired = Vec::new();
        reg.check_player(0, Button::empty(), 10, &mut fired);
        reg.check_player(1, Button::A1, 10, &mut fired);
        reg.check_global(10, &mut fired);
        assert_eq!(fired.len(), 1);
        fired.clear();
        reg.check_player(0, Button::empty(), 20, &mut fired);
        reg.check_global(20, &mut fired);
        assert!(fired.is_empty(), "accumulator must reset between ticks");
    }

    #[test]
    fn registering_past_capacity_fails() {
        let mut reg = HotkeyRegistry::new();
        for _ in 0..MAX_HOTKEYS {
            assert!(reg.register(HotkeyDef { buttons: Button::B1, trigger: Trigger::OnHold, duration_ms: 0, global: false }).is_some());
        }
        assert!(reg.register(HotkeyDef { buttons: Button::B1, trigger: Trigger::OnHold, duration_ms: 0, global: false }).is_none());
    }
}
