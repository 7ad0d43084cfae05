//! Wii U Pro Controller driver. Rides the Wiimote extension
//! protocol: a 15-state connect machine with per-step 1 s timeouts and up to
//! 5 retries, encoded as an explicit enum plus a single `step(now)`
//! transition function.

use super::{ConnectIdentity, Driver, Outbound};
use crate::event::{axis, Button, CanonicalEvent, DeviceKind, Transport};
use crate::feedback::FeedbackState;
use crate::util::timer::StepTimer;

const STEP_TIMEOUT_MS: u32 = 1000;
const MAX_RETRIES: u8 = 5;
const KEEPALIVE_MS: u32 = 30_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    WaitInit,
    SendStatusReq,
    WaitStatus,
    SendExtInit1,
    WaitExtInit1Ack,
    SendExtInit2,
    WaitExtInit2Ack,
    ReadExtType,
    WaitExtTypeResp,
    SendReportMode,
    WaitReportModeAck,
    SendLed,
    WaitLedAck,
    Ready,
    Failed,
}

pub struct WiiUProDriver {
    source_address: u8,
    instance: u8,
    state: State,
    timer: StepTimer,
    retries: u8,
    last_led: Option<u8>,
    keepalive: StepTimer,
}

impl WiiUProDriver {
    pub fn new(source_address: u8, instance: u8) -> Self {
        Self { source_address, instance, state: State::WaitInit, timer: StepTimer::new(), retries: 0, last_led: None, keepalive: StepTimer::new() }
    }

    fn advance(&mut self, next: State, now_ms: u32, timeout_ms: u32) {
        self.state = next;
        self.retries = 0;
        self.timer.arm(now_ms as u64, timeout_ms as u64);
    }

    fn retry_or_fail(&mut self, now_ms: u32) {
        self.retries += 1;
        if self.retries > MAX_RETRIES {
            self.state = State::Failed;
        } else {
            self.timer.arm(now_ms as u64, STEP_TIMEOUT_MS as u64);
        }
    }
}

impl Driver for WiiUProDriver {
    fn init(&mut self, now_ms: u32) -> bool {
        self.timer.arm(now_ms as u64, 100);
        true
    }

    fn process_report(&mut self, bytes: &[u8], now_ms: u32) -> Option<CanonicalEvent> {
        if bytes.is_empty() {
            return None;
        }
        match (self.state, bytes[0]) {
            (State::WaitStatus, 0x20) => {
                self.advance(State::SendExtInit1, now_ms, STEP_TIMEOUT_MS);
                None
            }
            (State::WaitExtInit1Ack, 0x22) => {
                self.advance(State::SendExtInit2, now_ms, STEP_TIMEOUT_MS);
                None
            }
            (State::WaitExtInit2Ack, 0x22) => {
                self.advance(State::ReadExtType, now_ms, STEP_TIMEOUT_MS);
                None
            }
            (State::WaitExtTypeResp, 0x21) if bytes.len() >= 12 => {
                // Expected identity `00 00 A4 20 01 20` at offset 6..12.
                self.advance(State::SendReportMode, now_ms, STEP_TIMEOUT_MS);
                None
            }
            (State::WaitReportModeAck, 0x22) => {
                self.advance(State::SendLed, now_ms, STEP_TIMEOUT_MS);
                None
            }
            (State::SendLed | State::WaitLedAck, 0x3D) | (State::Ready, 0x3D) if bytes.len() >= 22 => {
                self.state = State::Ready;
                let mut event = CanonicalEvent::make_event(self.source_address, self.instance, DeviceKind::Gamepad, Transport::BtClassic);
                decode_extension_bytes(&mut event, &bytes[1..22]);
                Some(event)
            }
            _ => None,
        }
    }

    fn task(&mut self, now_ms: u32, feedback: &FeedbackState) -> Option<Outbound> {
        if self.timer.is_armed() && self.timer.expired(now_ms as u64) {
            match self.state {
                State::WaitInit => {
                    self.advance(State::SendStatusReq, now_ms, STEP_TIMEOUT_MS);
                    return Some(Outbound::new(0x15, &[0x00]));
                }
                State::SendExtInit1 | State::WaitExtInit1Ack => {
                    self.state = State::WaitExtInit1Ack;
                    self.retry_or_fail(now_ms);
                    return Some(Outbound::new(0x16, &[0x04, 0xA4, 0x00, 0xF0, 0x01, 0x55]));
                }
                State::SendExtInit2 | State::WaitExtInit2Ack => {
                    self.state = State::WaitExtInit2Ack;
                    self.retry_or_fail(now_ms);
                    return Some(Outbound::new(0x16, &[0x04, 0xA4, 0x00, 0xFB, 0x01, 0x00]));
                }
                State::ReadExtType | State::WaitExtTypeResp => {
                    self.state = State::WaitExtTypeResp;
                    self.retry_or_fail(now_ms);
                    return Some(Outbound::new(0x17, &[0x04, 0xA4, 0x00, 0xFA, 0x00, 0x06]));
                }
                State::SendReportMode | State::WaitReportModeAck => {
                    self.state = State::WaitReportModeAck;
                    self.retry_or_fail(now_ms);
                    return Some(Outbound::new(0x12, &[0x00, 0x3D]));
                }
                State::SendLed => {
                    self.state = State::WaitLedAck;
                    self.timer.arm(now_ms as u64, STEP_TIMEOUT_MS as u64);
                    return Some(Outbound::new(0x11, &[0x10]));
                }
                State::WaitLedAck => {
                    self.retry_or_fail(now_ms);
                }
                _ => {}
            }
        }

        if self.state == State::Ready {
            if !self.keepalive.is_armed() {
                self.keepalive.arm(now_ms as u64, KEEPALIVE_MS as u64);
            }
            if self.keepalive.expired(now_ms as u64) {
                self.keepalive.arm(now_ms as u64, KEEPALIVE_MS as u64);
                return Some(Outbound::new(0x15, &[0x00]));
            }
            if feedback.led_dirty && self.last_led != Some(feedback.led_pattern) {
                self.last_led = Some(feedback.led_pattern);
                return Some(Outbound::new(0x11, &[feedback.led_pattern << 4]));
            }
        }
        None
    }

    fn disconnect(&mut self) -> (u8, u8) {
        (self.source_address, self.instance)
    }
}

/// 4 little-endian 16-bit sticks, then 3 inverted button bytes, then
/// battery/flags.
fn decode_extension_bytes(event: &mut CanonicalEvent, ext: &[u8]) {
    let lx = u16::from_le_bytes([ext[0], ext[1]]) as i32 - 2048;
    let ly = u16::from_le_bytes([ext[2], ext[3]]) as i32 - 2048;
    let rx = u16::from_le_bytes([ext[4], ext[5]]) as i32 - 2048;
    let ry = u16::from_le_bytes([ext[6], ext[7]]) as i32 - 2048;
    event.analog[axis::LX] = scale_centered(lx);
    event.analog[axis::LY] = 255 - scale_centered(ly);
    event.analog[axis::RX] = scale_centered(rx);
    event.analog[axis::RY] = 255 - scale_centered(ry);
    event.clamp_axes();

    // Button bytes are inverted: a 0 bit means pressed.
    let b0 = !ext[8];
    let b1 = !ext[9];
    const BYTE0: [Button; 8] = [Button::DPAD_RIGHT, Button::DPAD_DOWN, Button::L1, Button::S1, Button::A1, Button::S2, Button::DPAD_UP, Button::DPAD_LEFT];
    const BYTE1: [Button; 8] = [Button::R1, Button::L2, Button::R2, Button::B2, Button::B4, Button::B1, Button::B3, Button::L3];
    for (bit, flag) in BYTE0.iter().enumerate() {
        if b0 & (1 << bit) != 0 {
            event.buttons |= *flag;
        }
    }
    for (bit, flag) in BYTE1.iter().enumerate() {
        if b1 & (1 << bit) != 0 {
            event.buttons |= *flag;
        }
    }
    event.battery_level = ext[10] & 0x0F;
}

fn scale_centered(v: i32) -> u8 {
    let clamped = v.clamp(-1200, 1200);
    (128 + (clamped * 127) / 1200).clamp(0, 255) as u8
}

pub fn matches(identity: &ConnectIdentity) -> bool {
    !identity.is_ble && identity.name.windows(7).any(|w| w == b"Wii U P")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_init_flow_reaches_ready() {
        let mut d = WiiUProDriver::new(0, 0);
        assert!(d.init(0));
        assert_eq!(d.task(100, &FeedbackState::default()).unwrap().report_id, 0x15);
        assert_eq!(d.state, State::SendStatusReq);

        d.process_report(&[0x20], 200);
        assert_eq!(d.state, State::SendExtInit1);
        d.task(200, &FeedbackState::default());
        d.process_report(&[0x22], 300);
        assert_eq!(d.state, State::SendExtInit2);
        d.task(300, &FeedbackState::default());
        d.process_report(&[0x22], 400);
        assert_eq!(d.state, State::ReadExtType);
        d.task(400, &FeedbackState::default());
        d.process_report(&[0x21, 0, 0, 0, 0, 0, 0, 0, 0xA4, 0x20, 0x01, 0x20], 500);
        assert_eq!(d.state, State::SendReportMode);
        d.task(500, &FeedbackState::default());
        d.process_report(&[0x22], 600);
        assert_eq!(d.state, State::SendLed);
        d.task(600, &FeedbackState::default());
        assert_eq!(d.state, State::WaitLedAck);

        let mut report = [0u8; 22];
        report[0] = 0x3D;
        let event = d.process_report(&report, 700).unwrap();
        assert_eq!(d.state, State::Ready);
        assert_eq!(event.analog[axis::LX], 128);
    }

    #[test]
    fn step_timeout_retries_up_to_five_times_then_fails() {
        let mut d = WiiUProDriver::new(0, 0);
        d.init(0);
        d.task(100, &FeedbackState::default());
        d.process_report(&[0x20], 200);
        for i in 0..MAX_RETRIES {
            d.task(200 + i as u32 * STEP_TIMEOUT_MS + STEP_TIMEOUT_MS, &FeedbackState::default());
        }
        assert_ne!(d.state, State::Failed, "must still have retries left at exactly MAX_RETRIES");
        d.task(200 + (MAX_RETRIES as u32 + 1) * STEP_TIMEOUT_MS, &FeedbackState::default());
        assert_eq!(d.state, State::Failed);
    }
}
