//! Typed events and the subscription bus that delivers them.

use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;

use crate::error::ProtocolError;
use crate::switches::{NotificationSwitches, SettingSwitches};
use crate::types::*;

/// Which transfer envelope an acknowledgement belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransferChannel {
    /// Watch-face market transfers (`0xE0`).
    Market,
    /// Firmware resource transfers (`0xE2`).
    Resource,
}

/// Acknowledgement frames of the two transfer envelopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferAck {
    /// Reply to a query: current dial number or resource version.
    Query { channel: TransferChannel, value: u16 },
    /// Reply to the configuration frame.
    Config { channel: TransferChannel, ok: bool },
    /// Reply to one data packet.
    Packet {
        channel: TransferChannel,
        index: u16,
        ok: bool,
    },
}

impl TransferAck {
    pub fn channel(&self) -> TransferChannel {
        match self {
            TransferAck::Query { channel, .. }
            | TransferAck::Config { channel, .. }
            | TransferAck::Packet { channel, .. } => *channel,
        }
    }
}

/// One event per inbound frame, or per MTU report.
#[derive(Debug, Clone, PartialEq)]
pub enum ProtocolEvent {
    BatteryUpdated(BatteryStatus),
    BrightnessUpdated(u8),
    LanguageUpdated(u8),
    DoNotDisturbUpdated(DoNotDisturb),
    /// The watch asks the phone to ring.
    FindPhoneRequested,
    TimeFormatUpdated(TimeFormat),
    DeviceInfoUpdated(DeviceInfo),
    PersonalInfoUpdated(PersonalInfo),
    SettingSwitchesUpdated(SettingSwitches),
    NotificationSwitchesUpdated(NotificationSwitches),
    /// Status reply to a set/delete operation.
    CommandAcknowledged { command: u8, success: bool },
    AlarmCountUpdated { count: u8, can_use: u8 },
    AlarmUpdated(Alarm),
    AlarmRemoved { id: u8 },
    ReminderUpdated(Reminder),
    /// The watch pressed the remote shutter.
    RemotePhotoRequested { action: u8 },
    SleepUpdated(SleepSummary),
    HealthReadingUpdated(HealthRecord),
    ActivityUpdated(Activity),
    TransferAck(TransferAck),
    MtuUpdated(u16),
    /// An identifier with no registered handler. Nothing was changed.
    Unrecognized { id: u8, len: usize },
    /// A known identifier whose payload failed to decode. Nothing was changed.
    DecodeFailed { id: u8, error: ProtocolError },
}

impl ProtocolEvent {
    /// True for the diagnostic events that carry no device data.
    pub fn is_diagnostic(&self) -> bool {
        matches!(
            self,
            ProtocolEvent::Unrecognized { .. } | ProtocolEvent::DecodeFailed { .. }
        )
    }
}

/// Fan-out of events to any number of channel subscribers.
///
/// Publishing with no subscribers is a no-op. Subscribers that dropped their
/// receiver are pruned on the next publish.
pub struct EventBus<E> {
    subscribers: Mutex<Vec<Sender<E>>>,
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        EventBus {
            subscribers: Mutex::new(Vec::new()),
        }
    }
}

impl<E: Clone> EventBus<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new listener.
    pub fn subscribe(&self) -> Receiver<E> {
        let (tx, rx) = crossbeam_channel::unbounded();
        self.subscribers.lock().push(tx);
        rx
    }

    /// Deliver `event` to every live subscriber. Returns how many received it.
    pub fn publish(&self, event: E) -> usize {
        let mut subs = self.subscribers.lock();
        subs.retain(|tx| tx.send(event.clone()).is_ok());
        subs.len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}

impl<E> std::fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscribers.lock().len())
            .finish()
    }
}
