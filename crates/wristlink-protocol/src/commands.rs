//! Commands that can be sent to the watch.

use crate::constants::*;
use crate::error::Result;
use crate::frame::CommandFrame;
use crate::switches::{flags_to_bytes, NotificationSwitches, SettingSwitches};
use crate::types::*;

/// Configuration frame of a watch-face market transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarketConfig {
    /// Number of data packets that will follow.
    pub total_packets: u16,
    /// Total asset size in bytes.
    pub total_size: u32,
    /// MTU the packets were sized for.
    pub mtu: u16,
    pub dial_type: DialType,
    /// Market catalogue number of the dial.
    pub dial_num: u16,
    /// Whether the dial comes from local storage rather than the market.
    pub local: bool,
    pub type_value: u8,
    pub dial_type_value: u8,
}

/// One data packet of a watch-face market transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketPacket {
    pub index: u16,
    /// Sub-file index inside a multi-file dial.
    pub bin: u8,
    /// Progress 0-100 after this packet.
    pub progress: u8,
    pub last: bool,
    pub data: Vec<u8>,
}

/// Configuration frame of a firmware resource transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceConfig {
    pub total_packets: u16,
    pub total_size: u32,
    pub mtu: u16,
}

/// One data packet of a firmware resource transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourcePacket {
    pub index: u16,
    pub progress: u8,
    pub last: bool,
    pub data: Vec<u8>,
}

/// Commands that can be sent to the watch.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Set the watch clock.
    SyncTime {
        /// Offset from UTC in hours.
        timezone: i8,
        /// Seconds since the Unix epoch.
        utc_seconds: u32,
    },
    GetBatteryLevel,
    QueryBrightness,
    SetBrightness(u8),
    QueryLanguage,
    SetLanguage(u8),
    GetDeviceInfo,
    ResetToFactory,
    /// Start or stop the band's find-me vibration.
    FindBand { start: bool },
    QueryPersonalInfo,
    SetPersonalInfo(PersonalInfo),
    QueryDoNotDisturb,
    SetDoNotDisturb(DoNotDisturb),
    QueryTimeFormat,
    SetTimeFormat(TimeFormat),
    QuerySettingSwitches,
    SetSettingSwitches(SettingSwitches),
    /// Query number of alarms and free slots.
    QueryAlarmCount,
    QueryAlarm { id: u8 },
    SetAlarm(Alarm),
    DeleteAlarm { id: u8 },
    QueryReminder(ReminderKind),
    SetReminder(Reminder),
    QueryNotificationSwitches,
    SetNotificationSwitches(NotificationSwitches),
    DisconnectBluetooth,
    /// Forward a phone notification.
    PushMessage {
        action: u8,
        control: u8,
        /// Source app or message category.
        kind: u8,
        content: String,
    },
    /// Write a contact slot.
    SetContact {
        index: u8,
        name: String,
        phone: String,
    },
    /// Start or stop an on-demand measurement.
    StartTest { kind: HealthKind, start: bool },
    QueryNewestHeartData(HealthKind),
    QueryNewestHealthData,
    QuerySleep,
    /// Style a custom dial's clock.
    SetTimePositionAndColor {
        dial_type: DialType,
        position: TimePosition,
        color: DialColor,
    },
    ShowQrCode { kind: u8, text: String },
    /// Ask which market dial is installed.
    QueryCurrentDial,
    DialMarketConfig(MarketConfig),
    DialMarketData(MarketPacket),
    /// Ask for the installed resource version.
    QueryResourceVersion,
    ResourceConfig(ResourceConfig),
    ResourceData(ResourcePacket),
}

impl Command {
    /// Get the command identifier byte.
    pub fn code(&self) -> u8 {
        match self {
            Command::SyncTime { .. } => CMD_SYNC_TIME,
            Command::GetBatteryLevel => CMD_GET_BATTERY_LEVEL,
            Command::QueryBrightness | Command::SetBrightness(_) => CMD_SCREEN_BRIGHTNESS,
            Command::QueryLanguage | Command::SetLanguage(_) => CMD_DEVICE_LANGUAGE,
            Command::GetDeviceInfo => CMD_GET_DEVICE_INFO,
            Command::ResetToFactory => CMD_RESET_TO_FACTORY,
            Command::FindBand { .. } => CMD_FIND_BAND,
            Command::QueryPersonalInfo | Command::SetPersonalInfo(_) => CMD_PERSONAL_INFO,
            Command::QueryDoNotDisturb | Command::SetDoNotDisturb(_) => CMD_DO_NOT_DISTURB,
            Command::QueryTimeFormat | Command::SetTimeFormat(_) => CMD_TIME_FORMAT,
            Command::QuerySettingSwitches | Command::SetSettingSwitches(_) => CMD_SWITCH_STATUS,
            Command::QueryAlarmCount
            | Command::QueryAlarm { .. }
            | Command::SetAlarm(_)
            | Command::DeleteAlarm { .. } => CMD_ALARM_INFO,
            Command::QueryReminder(_) | Command::SetReminder(_) => CMD_REMINDER_INFO,
            Command::QueryNotificationSwitches | Command::SetNotificationSwitches(_) => {
                CMD_SWITCH_TABLE_EXTENSION
            }
            Command::DisconnectBluetooth => CMD_DISCONNECT_BT,
            Command::PushMessage { .. } => CMD_MESSAGE_PUSH,
            Command::SetContact { .. } => CMD_CONTACT_INFO,
            Command::StartTest { .. } => CMD_START_TEST,
            Command::QueryNewestHeartData(_) => CMD_NEWEST_HEART_DATA,
            Command::QueryNewestHealthData => CMD_NEWEST_HEALTH_DATA,
            Command::QuerySleep => CMD_SLEEP_MONITORING,
            Command::SetTimePositionAndColor { .. } => CMD_TIME_POSITION_AND_COLOR,
            Command::ShowQrCode { .. } => CMD_QR_CODE,
            Command::QueryCurrentDial | Command::DialMarketConfig(_) | Command::DialMarketData(_) => {
                CMD_DIAL_MARKET
            }
            Command::QueryResourceVersion
            | Command::ResourceConfig(_)
            | Command::ResourceData(_) => CMD_RESOURCE_UPGRADE,
        }
    }

    /// Build the frame for this command.
    pub fn to_frame(&self) -> Result<CommandFrame> {
        let f = CommandFrame::new(self.code());
        let frame = match self {
            Command::SyncTime {
                timezone,
                utc_seconds,
            } => f.i8(*timezone).u32(*utc_seconds),

            Command::GetBatteryLevel
            | Command::GetDeviceInfo
            | Command::ResetToFactory
            | Command::DisconnectBluetooth
            | Command::QueryNewestHealthData
            | Command::QuerySleep => f,

            Command::QueryBrightness
            | Command::QueryLanguage
            | Command::QueryPersonalInfo
            | Command::QueryDoNotDisturb
            | Command::QueryTimeFormat
            | Command::QuerySettingSwitches
            | Command::QueryNotificationSwitches => f.u8(OP_QUERY),

            Command::SetBrightness(v) | Command::SetLanguage(v) => f.u8(OP_SET).u8(*v),

            Command::FindBand { start } => f.u8(if *start { 0 } else { 1 }),

            Command::SetPersonalInfo(p) => f
                .u8(OP_SET)
                .u8(p.age)
                .u8(p.height_cm)
                .u8(p.weight_kg)
                .u8(p.gender as u8),

            Command::SetDoNotDisturb(d) => f
                .u8(OP_SET)
                .flag(d.enabled)
                .u8(d.start.hour)
                .u8(d.start.minute)
                .u8(d.end.hour)
                .u8(d.end.minute),

            Command::SetTimeFormat(tf) => f.u8(OP_SET).u8(*tf as u8),

            Command::SetSettingSwitches(set) => f
                .u8(OP_SET)
                .block(flags_to_bytes(set, SETTINGS_SWITCH_BYTES)?),

            Command::QueryAlarmCount => f.u8(ALARM_OP_COUNT),
            Command::QueryAlarm { id } => f.u8(ALARM_OP_QUERY).u8(*id),
            Command::SetAlarm(a) => f
                .u8(ALARM_OP_SET)
                .u8(a.id)
                .flag(a.enabled)
                .u8(a.time.hour)
                .u8(a.time.minute)
                .u8(a.repeat.0),
            Command::DeleteAlarm { id } => f.u8(ALARM_OP_DELETE).u8(*id),

            Command::QueryReminder(kind) => f.u8(OP_QUERY).u8(*kind as u8),
            Command::SetReminder(r) => f
                .u8(OP_SET)
                .u8(r.kind as u8)
                .flag(r.enabled)
                .u8(r.start.hour)
                .u8(r.start.minute)
                .u8(r.end.hour)
                .u8(r.end.minute)
                .u16(r.interval_minutes),

            Command::SetNotificationSwitches(set) => f
                .u8(OP_SET)
                .block(flags_to_bytes(set, NOTIFICATION_SWITCH_BYTES)?),

            Command::PushMessage {
                action,
                control,
                kind,
                content,
            } => f
                .u8(*action)
                .u8(*control)
                .u8(*kind)
                .string(content.as_str(), MAX_MESSAGE_LEN),

            Command::SetContact { index, name, phone } => f
                .u8(OP_SET)
                .u8(*index)
                .string(name.as_str(), MAX_CONTACT_NAME_LEN)
                .string(phone.as_str(), MAX_CONTACT_PHONE_LEN),

            Command::StartTest { kind, start } => f.u8(*kind as u8).flag(*start),
            Command::QueryNewestHeartData(kind) => f.u8(*kind as u8),

            Command::SetTimePositionAndColor {
                dial_type,
                position,
                color,
            } => f.u8(*dial_type as u8).u8(*position as u8).u8(*color as u8),

            Command::ShowQrCode { kind, text } => {
                f.u8(*kind).string(text.as_str(), MAX_QR_CODE_LEN)
            }

            Command::QueryCurrentDial | Command::QueryResourceVersion => f.u8(TRANSFER_OP_QUERY),

            Command::DialMarketConfig(c) => f
                .u8(TRANSFER_OP_CONFIG)
                .u16(c.total_packets)
                .u32(c.total_size)
                .u16(c.mtu)
                .u8(c.dial_type as u8)
                .u16(c.dial_num)
                .flag(c.local)
                .u8(c.type_value)
                .u8(c.dial_type_value),

            Command::DialMarketData(p) => f
                .u8(TRANSFER_OP_DATA)
                .u16(p.index)
                .u8(p.bin)
                .u8(p.progress)
                .u8(control_byte(p.last))
                .block(p.data.as_slice()),

            Command::ResourceConfig(c) => f
                .u8(TRANSFER_OP_CONFIG)
                .u16(c.total_packets)
                .u32(c.total_size)
                .u16(c.mtu),

            Command::ResourceData(p) => f
                .u8(TRANSFER_OP_DATA)
                .u16(p.index)
                .u8(p.progress)
                .u8(control_byte(p.last))
                .block(p.data.as_slice()),
        };
        Ok(frame)
    }

    /// Encode the command to bytes.
    pub fn encode(&self) -> Result<Vec<u8>> {
        self.to_frame()?.encode()
    }
}

fn control_byte(last: bool) -> u8 {
    if last {
        CONTROL_FINAL
    } else {
        CONTROL_CONTINUE
    }
}

/// The per-alarm queries that together read the whole alarm table.
///
/// The caller sends these one at a time, typically after an alarm count
/// response, and the dispatcher handles each reply independently.
pub fn query_all_alarms(count: u8) -> Vec<Command> {
    (0..count).map(|id| Command::QueryAlarm { id }).collect()
}
