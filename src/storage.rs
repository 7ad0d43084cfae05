//! Persisted settings: a single fixed-layout blob in a keyed
//! store, saved on a 5 s debounce timer. Hand-rolled byte encode/decode —
//! no serialization crate in the stack reaches into `no_std` without an
//! allocator, so this follows the same plain-byte-table style `config.rs`
//! uses rather than pulling one in.

use crate::error::StorageError;
use crate::profile::SocdMode;
use crate::util::timer::StepTimer;

pub const MAGIC: u32 = 0x4743_5052;
pub const MAX_CUSTOM_PROFILES: usize = 4;
const SAVE_DEBOUNCE_MS: u64 = 5_000;

/// One custom profile's persisted shape: just the two SOCD rules, since the
/// remap/combo/stick tables are compiled in statically on [`crate::profile::Profile`]
/// instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersistedProfile {
    pub lr_socd: SocdMode,
    pub ud_socd: SocdMode,
}

impl PersistedProfile {
    fn encode(&self, out: &mut [u8]) {
        out[0] = encode_socd(self.lr_socd);
        out[1] = encode_socd(self.ud_socd);
    }

    fn decode(bytes: &[u8]) -> Self {
        Self { lr_socd: decode_socd(bytes[0]), ud_socd: decode_socd(bytes[1]) }
    }
}

fn encode_socd(mode: SocdMode) -> u8 {
    match mode {
        SocdMode::Neutral => 0,
        SocdMode::LastWin => 1,
        SocdMode::FirstWin => 2,
        SocdMode::UpPriority => 3,
        SocdMode::SecondInputPriority => 4,
    }
}

fn decode_socd(byte: u8) -> SocdMode {
    match byte {
        1 => SocdMode::LastWin,
        2 => SocdMode::FirstWin,
        3 => SocdMode::UpPriority,
        4 => SocdMode::SecondInputPriority,
        _ => SocdMode::Neutral,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WiimoteOrientMode {
    Auto,
    ForcedHorizontal,
    ForcedVertical,
}

/// The full persisted state. `sequence` increments on every
/// accepted save, so a host tool reading the blob out-of-band can detect a
/// torn write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    pub sequence: u32,
    pub active_profile_index: u8,
    pub custom_profile_count: u8,
    pub custom_profiles: [PersistedProfile; MAX_CUSTOM_PROFILES],
    pub wiimote_orient_mode: WiimoteOrientMode,
}

impl Settings {
    pub fn defaults() -> Self {
        Self {
            sequence: 0,
            active_profile_index: 0,
            custom_profile_count: 0,
            custom_profiles: [PersistedProfile { lr_socd: SocdMode::Neutral, ud_socd: SocdMode::UpPriority }; MAX_CUSTOM_PROFILES],
            wiimote_orient_mode: WiimoteOrientMode::Auto,
        }
    }
}

/// Blob layout: magic(4) + sequence(4) + active_profile_index(1) +
/// custom_profile_count(1) + orient_mode(1) + profiles(2 bytes each).
pub const BLOB_LEN: usize = 4 + 4 + 1 + 1 + 1 + MAX_CUSTOM_PROFILES * 2;

pub fn encode(settings: &Settings, out: &mut [u8; BLOB_LEN]) {
    out[0..4].copy_from_slice(&MAGIC.to_le_bytes());
    out[4..8].copy_from_slice(&settings.sequence.to_le_bytes());
    out[8] = settings.active_profile_index;
    out[9] = settings.custom_profile_count;
    out[10] = match settings.wiimote_orient_mode {
        WiimoteOrientMode::Auto => 0,
        WiimoteOrientMode::ForcedHorizontal => 1,
        WiimoteOrientMode::ForcedVertical => 2,
    };
    for (i, profile) in settings.custom_profiles.iter().enumerate() {
        profile.encode(&mut out[11 + i * 2..11 + i * 2 + 2]);
    }
}

pub fn decode(bytes: &[u8]) -> Result<Settings, StorageError> {
    if bytes.len() < BLOB_LEN {
        return Err(StorageError::ReadFailed);
    }
    let magic = u32::from_le_bytes(bytes[0..4].try_into().unwrap());
    if magic != MAGIC {
        return Err(StorageError::ReadFailed);
    }
    let sequence = u32::from_le_bytes(bytes[4..8].try_into().unwrap());
    let active_profile_index = bytes[8];
    let custom_profile_count = bytes[9];
    let wiimote_orient_mode = match bytes[10] {
        1 => WiimoteOrientMode::ForcedHorizontal,
        2 => WiimoteOrientMode::ForcedVertical,
        _ => WiimoteOrientMode::Auto,
    };
    let mut custom_profiles = [PersistedProfile { lr_socd: SocdMode::Neutral, ud_socd: SocdMode::Neutral }; MAX_CUSTOM_PROFILES];
    for (i, slot) in custom_profiles.iter_mut().enumerate() {
        *slot = PersistedProfile::decode(&bytes[11 + i * 2..11 + i * 2 + 2]);
    }
    Ok(Settings { sequence, active_profile_index, custom_profile_count, custom_profiles, wiimote_orient_mode })
}

/// Read/write surface a backing keyed store implements — a byte-slice
/// flash page, a littlefs file, or a host-side fake for tests.
pub trait Backend {
    fn read(&self, out: &mut [u8; BLOB_LEN]) -> Result<(), StorageError>;
    fn write(&mut self, data: &[u8; BLOB_LEN]) -> Result<(), StorageError>;
}

/// Debounced settings store: callers mutate `current` then
/// call `mark_dirty`; `task` only actually writes once 5 s have passed
/// since the last mark, coalescing bursts of changes into one write.
pub struct Storage<B: Backend> {
    backend: B,
    current: Settings,
    timer: StepTimer,
}

impl<B: Backend> Storage<B> {
    /// Loads from `backend`, falling back to defaults on any read error
    /// (magic mismatch or short read).
    pub fn load(backend: B) -> Self {
        let mut buf = [0u8; BLOB_LEN];
        let current = match backend.read(&mut buf) {
            Ok(()) => decode(&buf).unwrap_or_else(|_| Settings::defaults()),
            Err(_) => Settings::defaults(),
        };
        Self { backend, current, timer: StepTimer::new() }
    }

    pub fn current(&self) -> &Settings {
        &self.current
    }

    /// Applies a mutation and (re)arms the debounce timer so `task` writes
    /// it out 5 s from now, without running the write itself. Extra calls
    /// before the debounce elapses replace the pending value rather than
    /// queuing multiple writes.
    pub fn update(&mut self, now_ms: u64, f: impl FnOnce(&mut Settings)) {
        f(&mut self.current);
        self.timer.arm(now_ms, SAVE_DEBOUNCE_MS);
    }

    /// Drives the debounce timer; writes and bumps `sequence` once it
    /// expires. A write failure leaves the timer disarmed without bumping
    /// the sequence — the next `update` re-arms it.
    pub fn task(&mut self, now_ms: u64) -> Result<(), StorageError> {
        if !self.timer.is_armed() || !self.timer.expired(now_ms) {
            return Ok(());
        }
        self.timer.disarm();
        self.current.sequence = self.current.sequence.wrapping_add(1);
        let mut buf = [0u8; BLOB_LEN];
        encode(&self.current, &mut buf);
        self.backend.write(&buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeBackend {
        blob: Option<[u8; BLOB_LEN]>,
        fail_write: bool,
    }

    impl Backend for FakeBackend {
        fn read(&self, out: &mut [u8; BLOB_LEN]) -> Result<(), StorageError> {
            match self.blob {
                Some(b) => {
                    *out = b;
                    Ok(())
                }
                None => Err(StorageError::ReadFailed),
            }
        }

        fn write(&mut self, data: &[u8; BLOB_LEN]) -> Result<(), StorageError> {
            if self.fail_write {
                return Err(StorageError::WriteFailed);
            }
            self.blob = Some(*data);
            Ok(())
        }
    }

    #[test]
    fn missing_blob_falls_back_to_defaults() {
        let storage = Storage::load(FakeBackend { blob: None, fail_write: false });
        assert_eq!(storage.current().sequence, 0);
        assert_eq!(storage.current().active_profile_index, 0);
    }

    #[test]
    fn magic_mismatch_falls_back_to_defaults() {
        let mut blob = [0u8; BLOB_LEN];
        blob[0..4].copy_from_slice(&0xDEAD_BEEFu32.to_le_bytes());
        let storage = Storage::load(FakeBackend { blob: Some(blob), fail_write: false });
        assert_eq!(storage.current().active_profile_index, 0);
    }

    #[test]
    fn round_trips_a_saved_value() {
        let mut storage = Storage::load(FakeBackend { blob: None, fail_write: false });
        storage.update(0, |s| s.active_profile_index = 2);
        storage.task(0).unwrap();
        let reloaded = Storage::load(FakeBackend { blob: storage.backend.blob, fail_write: false });
        assert_eq!(reloaded.current().active_profile_index, 2);
        assert_eq!(reloaded.current().sequence, 1);
    }

    #[test]
    fn write_is_debounced_for_five_seconds() {
        let mut storage = Storage::load(FakeBackend { blob: None, fail_write: false });
        storage.update(0, |s| s.active_profile_index = 1);
        storage.task(1000).unwrap();
        assert!(storage.backend.blob.is_none(), "must not write before the debounce elapses");
        storage.task(5000).unwrap();
        assert!(storage.backend.blob.is_some());
    }

    #[test]
    fn failed_write_keeps_the_change_pending_for_next_update() {
        let mut storage = Storage::load(FakeBackend { blob: None, fail_write: true });
        storage.update(0, |s| s.active_profile_index = 3);
        assert!(storage.task(5000).is_err());
        storage.backend.fail_write = false;
        storage.update(5000, |s| s.active_profile_index = 3);
        storage.task(10_000).unwrap();
        assert_eq!(storage.backend.blob.unwrap()[8], 3);
    }
}
