//! Router: the hot path from a driver's canonical event to a
//! profile-transformed output, by way of player-slot assignment and an
//! optional fan-in merge. Exclusively owns the routing table and the
//! outputs array — nothing else may write `outputs[]`.

use crate::event::{Button, CanonicalEvent};
use crate::player::PlayerManager;
use crate::profile::{apply, Profile, ProfileEngineState, ProfileOutput};
use heapless::Vec;

pub const MAX_TARGETS: usize = 4;
pub const MAX_PORTS: usize = crate::player::MAX_SLOTS;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutingMode {
    /// Each source kind routes to one target, port 0.
    Simple,
    /// App-provided entries (same table shape, just populated explicitly).
    Explicit,
    /// All inputs of the same source kind collapse onto one player slot.
    Merged,
}

#[derive(Debug, Clone, Copy)]
pub struct RouteEntry {
    pub source_kind: crate::event::DeviceKind,
    pub target: u8,
    pub target_port: u8,
}

/// An exclusive tap bypasses the stored `outputs[]` array entirely and is
/// invoked directly with the profile output — how latency-critical native
/// outputs (GPIO NEOGEO, joybus) skip the periodic output encoder.
pub type ExclusiveTap = fn(target: u8, port: u8, output: ProfileOutput);

pub struct Router {
    routes: Vec<RouteEntry, 16>,
    mode: RoutingMode,
    outputs: [[Option<ProfileOutput>; MAX_PORTS]; MAX_TARGETS],
    dirty: [[bool; MAX_PORTS]; MAX_TARGETS],
    exclusive_taps: [Option<ExclusiveTap>; MAX_TARGETS],
    player_manager: PlayerManager,
    profile: Profile,
    profile_states: [ProfileEngineState; MAX_PORTS],
}

impl Router {
    pub fn new(mode: RoutingMode, player_manager: PlayerManager, profile: Profile) -> Self {
        Self {
            routes: Vec::new(),
            mode,
            outputs: [[None; MAX_PORTS]; MAX_TARGETS],
            dirty: [[false; MAX_PORTS]; MAX_TARGETS],
            exclusive_taps: [None; MAX_TARGETS],
            player_manager,
            profile_states: [ProfileEngineState::new(&profile); MAX_PORTS],
            profile,
        }
    }

    pub fn add_route(&mut self, entry: RouteEntry) -> Result<(), RouteEntry> {
        self.routes.push(entry)
    }

    pub fn set_exclusive_tap(&mut self, target: u8, tap: ExclusiveTap) {
        if let Some(slot) = self.exclusive_taps.get_mut(target as usize) {
            *slot = Some(tap);
        }
    }

    fn target_for(&self, kind: crate::event::DeviceKind) -> Option<u8> {
        self.routes.iter().find(|r| r.source_kind == kind).map(|r| r.target)
    }

    /// The hot path: resolves a player slot, applies the active profile,
    /// and either fires an exclusive tap or writes into `outputs[]`.
    pub fn submit_input(&mut self, event: &CanonicalEvent) {
        let Some(target) = self.target_for(event.kind) else { return };
        let trigger = !event.buttons.is_empty();
        let Some(port) = self.player_manager.find_or_assign(event.source_address, event.instance, trigger) else { return };
        if port >= MAX_PORTS {
            return;
        }

        let (raw_buttons, analog) = match self.mode {
            RoutingMode::Merged => {
                let prior = self.outputs[target as usize][port];
                let merged_buttons = prior.map(|p| p.buttons).unwrap_or_default() | event.buttons;
                let merged_analog = merge_analog(prior, event);
                (merged_buttons, merged_analog)
            }
            _ => (event.buttons, event.analog),
        };

        let output = apply(&self.profile, &mut self.profile_states[port], raw_buttons, analog, event.has_pressure);

        if let Some(tap) = self.exclusive_taps[target as usize] {
            tap(target, port as u8, output);
            return;
        }
        self.outputs[target as usize][port] = Some(output);
        self.dirty[target as usize][port] = true;
    }

    /// Replays a neutral event for a disconnected source so the next
    /// output tick emits a clean report instead of a stuck button.
    pub fn device_disconnected(&mut self, source_address: u8, instance: u8) {
        let Some(idx) = self.player_manager.remove_by_source(source_address, instance) else { return };
        for target in 0..MAX_TARGETS {
            if idx < MAX_PORTS {
                self.outputs[target][idx] = Some(ProfileOutput::neutral());
                self.dirty[target][idx] = true;
            }
        }
    }

    pub fn take_output(&mut self, target: u8, port: usize) -> Option<ProfileOutput> {
        let t = target as usize;
        if t >= MAX_TARGETS || port >= MAX_PORTS || !self.dirty[t][port] {
            return None;
        }
        self.dirty[t][port] = false;
        self.outputs[t][port]
    }

    pub fn player_manager(&self) -> &PlayerManager {
        &self.player_manager
    }
}

fn merge_analog(prior: Option<ProfileOutput>, event: &CanonicalEvent) -> [u8; 6] {
    let mut merged = event.analog;
    if let Some(p) = prior {
        let prior_axes = [p.lx, p.ly, p.rx, p.ry, p.l2_analog, p.r2_analog];
        for (m, existing) in merged.iter_mut().zip(prior_axes.iter()) {
            let from_center = |v: u8| (v as i16 - 128).unsigned_abs();
            if from_center(*existing) > from_center(*m) {
                *m = *existing;
            }
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{DeviceKind, Transport};
    use crate::player::SlotMode;

    fn router(mode: RoutingMode) -> Router {
        let mut r = Router::new(mode, PlayerManager::new(SlotMode::Fixed, true), Profile::passthrough());
        r.add_route(RouteEntry { source_kind: DeviceKind::Gamepad, target: 0, target_port: 0 }).unwrap();
        r
    }

    #[test]
    fn merged_routing_ors_buttons_from_two_sources() {
        let mut r = router(RoutingMode::Merged);
        let mut a = CanonicalEvent::make_event(1, 0, DeviceKind::Gamepad, Transport::Usb);
        a.buttons = Button::B1;
        let mut b = CanonicalEvent::make_event(2, 0, DeviceKind::Gamepad, Transport::Usb);
        b.buttons = Button::B2;
        r.submit_input(&a);
        r.submit_input(&b);
        let out = r.take_output(0, 0).unwrap();
        assert!(!(out.buttons & Button::B1).is_empty());
        assert!(!(out.buttons & Button::B2).is_empty());
    }

    #[test]
    fn disconnect_replays_neutral_event() {
        let mut r = router(RoutingMode::Simple);
        let mut a = CanonicalEvent::make_event(1, 0, DeviceKind::Gamepad, Transport::Usb);
        a.buttons = Button::B1;
        r.submit_input(&a);
        r.take_output(0, 0);
        r.device_disconnected(1, 0);
        let out = r.take_output(0, 0).unwrap();
        assert!(out.buttons.is_empty());
        assert_eq!(out.lx, 128);
    }

    #[test]
    fn no_auto_assign_without_a_button_transition_drops_the_event() {
        let mut r = router(RoutingMode::Simple);
        let e = CanonicalEvent::make_event(1, 0, DeviceKind::Gamepad, Transport::Usb);
        r.submit_input(&e);
        assert!(r.take_output(0, 0).is_none());
    }

    #[test]
    fn exclusive_tap_bypasses_stored_outputs() {
        use core::sync::atomic::{AtomicBool, Ordering};
        static TAPPED: AtomicBool = AtomicBool::new(false);
        fn tap(_t: u8, _p: u8, _o: ProfileOutput) {
            TAPPED.store(true, Ordering::SeqCst);
        }
        let mut r = router(RoutingMode::Simple);
        r.set_exclusive_tap(0, tap);
        let mut e = CanonicalEvent::make_event(1, 0, DeviceKind::Gamepad, Transport::Usb);
        e.buttons = Button::B1;
        r.submit_input(&e);
        assert!(TAPPED.load(Ordering::SeqCst));
        assert!(r.take_output(0, 0).is_none());
    }
}
