//! An in-process watch that answers what the phone sends.

use std::collections::VecDeque;

use parking_lot::Mutex;
use tracing::{debug, trace};
use wristlink_protocol::{
    CMD_DIAL_MARKET, CMD_GET_BATTERY_LEVEL, CMD_GET_DEVICE_INFO, CMD_RESOURCE_UPGRADE,
    CMD_TIME_POSITION_AND_COLOR, MARKET_ENVELOPE_OVERHEAD, RESOURCE_ENVELOPE_OVERHEAD, STATUS_OK,
    TRANSFER_OP_CONFIG, TRANSFER_OP_DATA, TRANSFER_OP_QUERY,
};
use wristlink_transfer::Transport;

use crate::config::DeviceConfig;

/// What the simulated watch saw.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchReport {
    pub frames_received: u64,
    pub acks_sent: u64,
    pub acks_dropped: u64,
    /// Packets announced by the last configuration frame.
    pub announced_packets: u16,
    /// Asset bytes reassembled from in-order data packets.
    pub asset: Vec<u8>,
    /// Raw `[dial_type, position, color]` of the last `0xE1`.
    pub dial_style: Option<[u8; 3]>,
}

#[derive(Default)]
struct WatchState {
    report: WatchReport,
    /// Acks produced so far, dropped or not.
    ack_count: u64,
    /// Next data packet index to append.
    expected: u16,
}

/// Transport that is also the watch on the other end.
///
/// Replies queue up until [`SimulatedWatch::take_replies`] collects them, so
/// the caller decides when "inbound" frames arrive.
pub struct SimulatedWatch {
    device: DeviceConfig,
    replies: Mutex<VecDeque<Vec<u8>>>,
    state: Mutex<WatchState>,
}

impl SimulatedWatch {
    pub fn new(device: DeviceConfig) -> Self {
        SimulatedWatch {
            device,
            replies: Mutex::new(VecDeque::new()),
            state: Mutex::new(WatchState::default()),
        }
    }

    pub fn device(&self) -> &DeviceConfig {
        &self.device
    }

    /// Drain every queued reply.
    pub fn take_replies(&self) -> Vec<Vec<u8>> {
        self.replies.lock().drain(..).collect()
    }

    pub fn report(&self) -> WatchReport {
        self.state.lock().report.clone()
    }

    fn receive(&self, frame: &[u8]) {
        let mut state = self.state.lock();
        state.report.frames_received += 1;
        let Some((&id, payload)) = frame.split_first() else {
            return;
        };

        let reply = match id {
            CMD_GET_BATTERY_LEVEL => Some(vec![id, self.device.battery_level, 0]),
            CMD_GET_DEVICE_INFO => Some(self.device_info_frame()),
            CMD_TIME_POSITION_AND_COLOR => {
                if let [dial_type, position, color, ..] = payload {
                    state.report.dial_style = Some([*dial_type, *position, *color]);
                }
                None
            }
            CMD_DIAL_MARKET | CMD_RESOURCE_UPGRADE => self.transfer_reply(&mut state, id, payload),
            _ => {
                trace!("SimulatedWatch: no reply for 0x{:02X}", id);
                None
            }
        };

        if let Some(reply) = reply {
            self.replies.lock().push_back(reply);
        }
    }

    fn transfer_reply(&self, state: &mut WatchState, id: u8, payload: &[u8]) -> Option<Vec<u8>> {
        match payload {
            [TRANSFER_OP_QUERY, ..] => Some(vec![id, TRANSFER_OP_QUERY, 0, 0]),
            [TRANSFER_OP_CONFIG, hi, lo, ..] => {
                state.report.announced_packets = u16::from_be_bytes([*hi, *lo]);
                state.report.asset.clear();
                state.expected = 0;
                self.ack(state, vec![id, TRANSFER_OP_CONFIG, STATUS_OK])
            }
            [TRANSFER_OP_DATA, hi, lo, ..] => {
                let index = u16::from_be_bytes([*hi, *lo]);
                // Overhead counts the id byte, which `payload` no longer has.
                let header = if id == CMD_DIAL_MARKET {
                    MARKET_ENVELOPE_OVERHEAD - 1
                } else {
                    RESOURCE_ENVELOPE_OVERHEAD - 1
                };
                if index == state.expected && payload.len() >= header {
                    state.report.asset.extend_from_slice(&payload[header..]);
                    state.expected += 1;
                }
                self.ack(state, vec![id, TRANSFER_OP_DATA, *hi, *lo, STATUS_OK])
            }
            _ => None,
        }
    }

    fn ack(&self, state: &mut WatchState, frame: Vec<u8>) -> Option<Vec<u8>> {
        state.ack_count += 1;
        let every = u64::from(self.device.drop_every);
        if every > 0 && state.ack_count % every == 0 {
            state.report.acks_dropped += 1;
            debug!("SimulatedWatch: dropping ack #{}", state.ack_count);
            return None;
        }
        state.report.acks_sent += 1;
        Some(frame)
    }

    fn device_info_frame(&self) -> Vec<u8> {
        let screen = self.device.screen();
        let serial = self.device.serial.as_bytes();
        let serial = &serial[..serial.len().min(u8::MAX as usize)];
        let mut frame = vec![CMD_GET_DEVICE_INFO, 1, 0, 1, 0, screen.shape as u8];
        frame.extend_from_slice(&screen.width.to_be_bytes());
        frame.extend_from_slice(&screen.height.to_be_bytes());
        frame.push(serial.len() as u8);
        frame.extend_from_slice(serial);
        frame
    }
}

impl Transport for SimulatedWatch {
    fn send(&self, frame: &[u8]) -> bool {
        self.receive(frame);
        true
    }

    fn current_mtu(&self) -> Option<u16> {
        (self.device.mtu > 0).then_some(self.device.mtu)
    }
}

impl std::fmt::Debug for SimulatedWatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulatedWatch")
            .field("device", &self.device)
            .field("queued", &self.replies.lock().len())
            .finish()
    }
}
