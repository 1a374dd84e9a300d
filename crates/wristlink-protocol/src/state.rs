//! Local mirror of the watch's state.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};

use crate::error::{ProtocolError, Result};
use crate::events::{ProtocolEvent, TransferAck, TransferChannel};
use crate::switches::{NotificationSwitches, SettingSwitches};
use crate::types::*;

/// Last-known device values.
///
/// Every field is updated as a whole from one decoded response. Fields stay
/// `None` until the watch has reported them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceState {
    pub battery: Option<BatteryStatus>,
    pub brightness: Option<u8>,
    pub language: Option<u8>,
    pub time_format: Option<TimeFormat>,
    pub do_not_disturb: Option<DoNotDisturb>,
    pub device_info: Option<DeviceInfo>,
    pub screen: Option<ScreenInfo>,
    pub personal_info: Option<PersonalInfo>,
    pub setting_switches: SettingSwitches,
    pub notification_switches: NotificationSwitches,
    pub alarm_count: u8,
    pub alarm_can_use: u8,
    pub alarms: BTreeMap<u8, Alarm>,
    pub long_sit: Option<Reminder>,
    pub drink_water: Option<Reminder>,
    pub sleep: Option<SleepSummary>,
    pub heart_rate: Option<HealthRecord>,
    pub oxygen: Option<HealthRecord>,
    pub blood_pressure: Option<HealthRecord>,
    pub activity: Option<Activity>,
    pub mtu: Option<u16>,
    pub current_dial: Option<u16>,
    pub resource_version: Option<u16>,
}

impl DeviceState {
    /// Fold one event into the state. Returns whether anything changed.
    pub fn apply(&mut self, event: &ProtocolEvent) -> bool {
        match event {
            ProtocolEvent::BatteryUpdated(b) => replace(&mut self.battery, Some(*b)),
            ProtocolEvent::BrightnessUpdated(v) => replace(&mut self.brightness, Some(*v)),
            ProtocolEvent::LanguageUpdated(v) => replace(&mut self.language, Some(*v)),
            ProtocolEvent::TimeFormatUpdated(v) => replace(&mut self.time_format, Some(*v)),
            ProtocolEvent::DoNotDisturbUpdated(v) => replace(&mut self.do_not_disturb, Some(*v)),
            ProtocolEvent::DeviceInfoUpdated(info) => {
                let screen = replace(&mut self.screen, Some(info.screen));
                let language = replace(&mut self.language, Some(info.language));
                replace(&mut self.device_info, Some(info.clone())) | screen | language
            }
            ProtocolEvent::PersonalInfoUpdated(p) => replace(&mut self.personal_info, Some(*p)),
            ProtocolEvent::SettingSwitchesUpdated(set) => {
                replace(&mut self.setting_switches, set.clone())
            }
            ProtocolEvent::NotificationSwitchesUpdated(set) => {
                replace(&mut self.notification_switches, set.clone())
            }
            ProtocolEvent::AlarmCountUpdated { count, can_use } => {
                let a = replace(&mut self.alarm_count, *count);
                replace(&mut self.alarm_can_use, *can_use) | a
            }
            ProtocolEvent::AlarmUpdated(alarm) => {
                self.alarms.insert(alarm.id, *alarm) != Some(*alarm)
            }
            ProtocolEvent::AlarmRemoved { id } => self.alarms.remove(id).is_some(),
            ProtocolEvent::ReminderUpdated(r) => match r.kind {
                ReminderKind::LongSit => replace(&mut self.long_sit, Some(*r)),
                ReminderKind::DrinkWater => replace(&mut self.drink_water, Some(*r)),
            },
            ProtocolEvent::SleepUpdated(s) => replace(&mut self.sleep, Some(*s)),
            ProtocolEvent::HealthReadingUpdated(record) => {
                let slot = match record.reading.kind() {
                    HealthKind::Heart => &mut self.heart_rate,
                    HealthKind::Oxygen => &mut self.oxygen,
                    HealthKind::Pressure => &mut self.blood_pressure,
                };
                replace(slot, Some(*record))
            }
            ProtocolEvent::ActivityUpdated(a) => replace(&mut self.activity, Some(*a)),
            ProtocolEvent::MtuUpdated(mtu) => replace(&mut self.mtu, Some(*mtu)),
            ProtocolEvent::TransferAck(TransferAck::Query { channel, value }) => match channel {
                TransferChannel::Market => replace(&mut self.current_dial, Some(*value)),
                TransferChannel::Resource => replace(&mut self.resource_version, Some(*value)),
            },
            ProtocolEvent::TransferAck(_)
            | ProtocolEvent::FindPhoneRequested
            | ProtocolEvent::RemotePhotoRequested { .. }
            | ProtocolEvent::CommandAcknowledged { .. }
            | ProtocolEvent::Unrecognized { .. }
            | ProtocolEvent::DecodeFailed { .. } => false,
        }
    }

    /// Screen geometry, if the watch is one that can take a watch face.
    pub fn supported_screen(&self) -> Result<ScreenInfo> {
        match self.screen {
            Some(screen) if screen.is_known() => Ok(screen),
            _ => Err(ProtocolError::DeviceNotSupported("screen geometry unknown")),
        }
    }

    /// Image size a custom watch face should be rendered at.
    pub fn recommended_image_size(&self) -> Result<(u16, u16)> {
        Ok(self.supported_screen()?.recommended_image_size())
    }
}

fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        false
    } else {
        *slot = value;
        true
    }
}

/// Single-writer store that hands out whole snapshots.
///
/// Readers clone an `Arc` and never see a half-applied update. Writers are
/// serialized and swap in a fresh copy.
#[derive(Debug, Default)]
pub struct StateStore {
    current: RwLock<Arc<DeviceState>>,
    writer: Mutex<()>,
}

impl StateStore {
    pub fn new(initial: DeviceState) -> Self {
        StateStore {
            current: RwLock::new(Arc::new(initial)),
            writer: Mutex::new(()),
        }
    }

    /// The latest complete state.
    pub fn snapshot(&self) -> Arc<DeviceState> {
        Arc::clone(&self.current.read())
    }

    /// Apply `f` to a copy of the state and publish the copy.
    pub fn update<R>(&self, f: impl FnOnce(&mut DeviceState) -> R) -> R {
        let _guard = self.writer.lock();
        let mut next = DeviceState::clone(&self.snapshot());
        let out = f(&mut next);
        *self.current.write() = Arc::new(next);
        out
    }
}
