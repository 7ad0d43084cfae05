//! Per-vendor driver layer.
//!
//! A real `Driver` trait per vendor plus a sum-type registry
//! (`DriverInstance`) held in a fixed array — no heap, no `dyn`, and the
//! "first match wins, generic HID last" ordering contract is enforced by
//! array position alone.

pub mod eightbitdo_ultimate;
pub mod generic_hid;
pub mod standard_hid;
pub mod switch2_ble;
pub mod wiimote;
pub mod wiiu_pro;

use crate::event::CanonicalEvent;
use heapless::Vec;

/// Identifies an incoming connection before any driver instance exists.
/// Borrowed only for the duration of a `matches` call — nothing here is
/// retained.
#[derive(Debug, Clone, Copy)]
pub struct ConnectIdentity<'a> {
    pub name: &'a [u8],
    pub class_of_device: u32,
    pub vid: u16,
    pub pid: u16,
    pub is_ble: bool,
}

/// A device-to-host write a driver wants sent on its next opportunity:
/// output reports (rumble, LED, memory writes), keepalives, init steps.
#[derive(Debug, Clone, Copy)]
pub struct Outbound {
    pub report_id: u8,
    pub data: [u8; 23],
    pub len: u8,
}

impl Outbound {
    pub fn new(report_id: u8, bytes: &[u8]) -> Self {
        let mut data = [0u8; 23];
        let len = bytes.len().min(23);
        data[..len].copy_from_slice(&bytes[..len]);
        Self { report_id, data, len: len as u8 }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data[..self.len as usize]
    }
}

/// Per-connection driver instance. `init`/`process_report`/`task`/
/// `disconnect` mirror the original's four lifecycle entry points exactly
///.
pub trait Driver {
    /// Attaches per-instance state; `false` means no slot free / reject.
    fn init(&mut self, now_ms: u32) -> bool;

    /// Decodes one raw report. While the connect state machine is not yet
    /// `ready`, a driver may instead consume the bytes as an init response
    /// and return `None`.
    fn process_report(&mut self, bytes: &[u8], now_ms: u32) -> Option<CanonicalEvent>;

    /// Invoked once per main-loop tick; advances init state machines, emits
    /// keepalives, and polls the feedback service for pending writes.
    fn task(&mut self, now_ms: u32, feedback: &crate::feedback::FeedbackState) -> Option<Outbound>;

    /// Clears any state tied to this connection; returns the player slot
    /// key the caller should release.
    fn disconnect(&mut self) -> (u8, u8);
}

/// Sum type over every supported driver's per-instance state. Avoids `dyn`
/// and heap allocation while still giving each vendor its own `Driver` impl.
pub enum DriverInstance {
    GenericHid(generic_hid::GenericHidDriver),
    EightBitDoUltimate(eightbitdo_ultimate::EightBitDoUltimateDriver),
    Switch2Ble(switch2_ble::Switch2BleDriver),
    WiiUPro(wiiu_pro::WiiUProDriver),
    Wiimote(wiimote::WiimoteDriver),
    StandardHid(standard_hid::StandardHidDriver),
}

impl DriverInstance {
    pub fn init(&mut self, now_ms: u32) -> bool {
        match self {
            Self::GenericHid(d) => d.init(now_ms),
            Self::EightBitDoUltimate(d) => d.init(now_ms),
            Self::Switch2Ble(d) => d.init(now_ms),
            Self::WiiUPro(d) => d.init(now_ms),
            Self::Wiimote(d) => d.init(now_ms),
            Self::StandardHid(d) => d.init(now_ms),
        }
    }

    pub fn process_report(&mut self, bytes: &[u8], now_ms: u32) -> Option<CanonicalEvent> {
        match self {
            Self::GenericHid(d) => d.process_report(bytes, now_ms),
            Self::EightBitDoUltimate(d) => d.process_report(bytes, now_ms),
            Self::Switch2Ble(d) => d.process_report(bytes, now_ms),
            Self::WiiUPro(d) => d.process_report(bytes, now_ms),
            Self::Wiimote(d) => d.process_report(bytes, now_ms),
            Self::StandardHid(d) => d.process_report(bytes, now_ms),
        }
    }

    pub fn task(&mut self, now_ms: u32, feedback: &crate::feedback::FeedbackState) -> Option<Outbound> {
        match self {
            Self::GenericHid(d) => d.task(now_ms, feedback),
            Self::EightBitDoUltimate(d) => d.task(now_ms, feedback),
            Self::Switch2Ble(d) => d.task(now_ms, feedback),
            Self::WiiUPro(d) => d.task(now_ms, feedback),
            Self::Wiimote(d) => d.task(now_ms, feedback),
            Self::StandardHid(d) => d.task(now_ms, feedback),
        }
    }

    pub fn disconnect(&mut self) -> (u8, u8) {
        match self {
            Self::GenericHid(d) => d.disconnect(),
            Self::EightBitDoUltimate(d) => d.disconnect(),
            Self::Switch2Ble(d) => d.disconnect(),
            Self::WiiUPro(d) => d.disconnect(),
            Self::Wiimote(d) => d.disconnect(),
            Self::StandardHid(d) => d.disconnect(),
        }
    }
}

pub const MAX_CONNECTIONS: usize = 8;

/// Ordered driver registry: `bind` tries each matcher in array order and
/// the first hit wins. Generic HID is registered last so it only catches
/// what no vendor driver claimed.
pub struct Registry {
    connections: Vec<(u8, u8, DriverInstance), MAX_CONNECTIONS>,
}

impl Registry {
    pub fn new() -> Self {
        Self { connections: Vec::new() }
    }

    /// Constructs and registers a driver instance for a new connection,
    /// trying vendor matchers before falling back to generic HID.
    pub fn bind(&mut self, source_address: u8, instance: u8, identity: ConnectIdentity, now_ms: u32) -> bool {
        let mut drv = if eightbitdo_ultimate::matches(&identity) {
            DriverInstance::EightBitDoUltimate(eightbitdo_ultimate::EightBitDoUltimateDriver::new(source_address, instance))
        } else if switch2_ble::matches(&identity) {
            DriverInstance::Switch2Ble(switch2_ble::Switch2BleDriver::new(source_address, instance, &identity))
        } else if wiiu_pro::matches(&identity) {
            DriverInstance::WiiUPro(wiiu_pro::WiiUProDriver::new(source_address, instance))
        } else if wiimote::matches(&identity) {
            DriverInstance::Wiimote(wiimote::WiimoteDriver::new(source_address, instance))
        } else if standard_hid::matches(&identity) {
            DriverInstance::StandardHid(standard_hid::StandardHidDriver::new(source_address, instance, &identity))
        } else {
            DriverInstance::GenericHid(generic_hid::GenericHidDriver::new(source_address, instance))
        };

        if !drv.init(now_ms) {
            return false;
        }
        self.connections.push((source_address, instance, drv)).is_ok()
    }

    pub fn find_mut(&mut self, source_address: u8, instance: u8) -> Option<&mut DriverInstance> {
        self.connections.iter_mut().find(|(s, i, _)| *s == source_address && *i == instance).map(|(_, _, d)| d)
    }

    pub fn remove(&mut self, source_address: u8, instance: u8) -> Option<DriverInstance> {
        let idx = self.connections.iter().position(|(s, i, _)| *s == source_address && *i == instance)?;
        let (_, _, drv) = self.connections.swap_remove(idx);
        Some(drv)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut (u8, u8, DriverInstance)> {
        self.connections.iter_mut()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unrecognized_identity_binds_generic_hid_last() {
        let mut reg = Registry::new();
        let identity = ConnectIdentity { name: b"Unknown Pad", class_of_device: 0, vid: 0x9999, pid: 0x0001, is_ble: false };
        assert!(reg.bind(1, 0, identity, 0));
        assert!(matches!(reg.find_mut(1, 0).unwrap(), DriverInstance::GenericHid(_)));
    }

    #[test]
    fn eightbitdo_identity_binds_vendor_driver() {
        let mut reg = Registry::new();
        let identity = ConnectIdentity { name: b"8BitDo Ultimate", class_of_device: 0, vid: 0x2dc8, pid: 0x3015, is_ble: true };
        assert!(reg.bind(2, 0, identity, 0));
        assert!(matches!(reg.find_mut(2, 0).unwrap(), DriverInstance::EightBitDoUltimate(_)));
    }
}
