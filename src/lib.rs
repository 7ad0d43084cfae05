//! Multi-transport controller translation engine.
//!
//! Ingests gamepad input from USB HID, Bluetooth Classic HID, Bluetooth LE
//! HID and native console wire protocols, normalizes it to a canonical
//! event, and republishes it to emulated USB consoles or native wire
//! outputs. See `DESIGN.md` for the module-by-module grounding ledger.
#![cfg_attr(not(feature = "std"), no_std)]

pub mod hal;
pub mod error;
pub mod event;
pub mod config;
pub mod util;
pub mod descriptor;
pub mod driver;
pub mod native;
pub mod player;
pub mod feedback;
pub mod profile;
pub mod hotkey;
pub mod router;
pub mod usb_mode;
pub mod storage;
pub mod engine;

pub use engine::Engine;
pub use event::{CanonicalEvent, Button, Transport, DeviceKind};
pub use error::{ConnectError, ReportError, StorageError, ConfigError};
