//! Decoders for frames received from the watch.
//!
//! Each decoder reads one payload window into exactly one [`ProtocolEvent`].
//! A decoder either returns a complete event or an error; nothing is applied
//! until it returns, so a short or malformed frame never yields a partial
//! update. Trailing bytes beyond the fields a decoder knows are ignored.

use crate::constants::*;
use crate::error::{ProtocolError, Result};
use crate::events::{ProtocolEvent, TransferAck, TransferChannel};
use crate::frame::PayloadReader;
use crate::switches::bytes_to_flags;
use crate::types::*;

/// Signature of a payload decoder.
pub type Decoder = fn(&mut PayloadReader<'_>) -> Result<ProtocolEvent>;

/// Every inbound identifier with a decoder.
pub const DECODERS: &[(u8, Decoder)] = &[
    (CMD_GET_BATTERY_LEVEL, decode_battery),
    (CMD_SCREEN_BRIGHTNESS, decode_brightness),
    (CMD_DEVICE_LANGUAGE, decode_language),
    (CMD_DO_NOT_DISTURB, decode_do_not_disturb),
    (CMD_FIND_PHONE, decode_find_phone),
    (CMD_TIME_FORMAT, decode_time_format),
    (CMD_GET_DEVICE_INFO, decode_device_info),
    (CMD_PERSONAL_INFO, decode_personal_info),
    (CMD_SWITCH_STATUS, decode_setting_switches),
    (CMD_ALARM_INFO, decode_alarm),
    (CMD_REMINDER_INFO, decode_reminder),
    (CMD_SWITCH_TABLE_EXTENSION, decode_notification_switches),
    (CMD_REMOTE_PHOTO, decode_remote_photo),
    (CMD_SLEEP_MONITORING, decode_sleep),
    (CMD_START_TEST, decode_test_result),
    (CMD_NEWEST_HEALTH_DATA, decode_activity),
    (CMD_NEWEST_HEART_DATA, decode_newest_heart),
    (CMD_DIAL_MARKET, decode_market_ack),
    (CMD_RESOURCE_UPGRADE, decode_resource_ack),
];

fn is_ok(status: u8) -> bool {
    status == STATUS_OK
}

fn time(r: &mut PayloadReader<'_>) -> Result<TimeOfDay> {
    let hour = r.u8()?;
    let minute = r.u8()?;
    Ok(TimeOfDay::new(hour, minute))
}

/// Read the op byte of a query/set style frame.
fn settings_op(r: &mut PayloadReader<'_>, command: u8) -> Result<u8> {
    let op = r.u8()?;
    if op != OP_QUERY && op != OP_SET {
        return Err(ProtocolError::UnknownOperation { command, op });
    }
    Ok(op)
}

fn ack(command: u8, status: u8) -> ProtocolEvent {
    ProtocolEvent::CommandAcknowledged {
        command,
        success: is_ok(status),
    }
}

fn decode_battery(r: &mut PayloadReader<'_>) -> Result<ProtocolEvent> {
    let level = r.u8()?;
    let charging = r.bool()?;
    Ok(ProtocolEvent::BatteryUpdated(BatteryStatus { level, charging }))
}

fn decode_brightness(r: &mut PayloadReader<'_>) -> Result<ProtocolEvent> {
    settings_op(r, CMD_SCREEN_BRIGHTNESS)?;
    Ok(ProtocolEvent::BrightnessUpdated(r.u8()?))
}

fn decode_language(r: &mut PayloadReader<'_>) -> Result<ProtocolEvent> {
    settings_op(r, CMD_DEVICE_LANGUAGE)?;
    Ok(ProtocolEvent::LanguageUpdated(r.u8()?))
}

fn decode_do_not_disturb(r: &mut PayloadReader<'_>) -> Result<ProtocolEvent> {
    settings_op(r, CMD_DO_NOT_DISTURB)?;
    let enabled = r.bool()?;
    let start = time(r)?;
    let end = time(r)?;
    Ok(ProtocolEvent::DoNotDisturbUpdated(DoNotDisturb {
        enabled,
        start,
        end,
    }))
}

fn decode_find_phone(_r: &mut PayloadReader<'_>) -> Result<ProtocolEvent> {
    Ok(ProtocolEvent::FindPhoneRequested)
}

fn decode_time_format(r: &mut PayloadReader<'_>) -> Result<ProtocolEvent> {
    settings_op(r, CMD_TIME_FORMAT)?;
    let raw = r.u8()?;
    let format = TimeFormat::from_u8(raw)
        .ok_or_else(|| ProtocolError::InvalidData(format!("unknown time format {}", raw)))?;
    Ok(ProtocolEvent::TimeFormatUpdated(format))
}

fn decode_device_info(r: &mut PayloadReader<'_>) -> Result<ProtocolEvent> {
    let watch_type = r.u8()?;
    let language = r.u8()?;
    let firmware_major = r.u8()?;
    let firmware_minor = r.u8()?;
    let raw_shape = r.u8()?;
    let shape = ScreenShape::from_u8(raw_shape)
        .ok_or_else(|| ProtocolError::InvalidData(format!("unknown screen shape {}", raw_shape)))?;
    let width = r.u16()?;
    let height = r.u16()?;
    let serial = r.string(MAX_SERIAL_LEN)?;
    Ok(ProtocolEvent::DeviceInfoUpdated(DeviceInfo {
        watch_type,
        language,
        firmware_major,
        firmware_minor,
        serial,
        screen: ScreenInfo {
            shape,
            width,
            height,
        },
    }))
}

fn decode_personal_info(r: &mut PayloadReader<'_>) -> Result<ProtocolEvent> {
    settings_op(r, CMD_PERSONAL_INFO)?;
    let age = r.u8()?;
    let height_cm = r.u8()?;
    let weight_kg = r.u8()?;
    let gender = Gender::from_u8(r.u8()?);
    Ok(ProtocolEvent::PersonalInfoUpdated(PersonalInfo {
        age,
        height_cm,
        weight_kg,
        gender,
    }))
}

fn decode_setting_switches(r: &mut PayloadReader<'_>) -> Result<ProtocolEvent> {
    match settings_op(r, CMD_SWITCH_STATUS)? {
        OP_QUERY => {
            let bytes = r.bytes(SETTINGS_SWITCH_BYTES)?;
            Ok(ProtocolEvent::SettingSwitchesUpdated(bytes_to_flags(bytes)))
        }
        _ => Ok(ack(CMD_SWITCH_STATUS, r.u8()?)),
    }
}

fn decode_alarm(r: &mut PayloadReader<'_>) -> Result<ProtocolEvent> {
    match r.u8()? {
        ALARM_OP_COUNT => {
            let count = r.u8()?;
            let can_use = r.u8()?;
            Ok(ProtocolEvent::AlarmCountUpdated { count, can_use })
        }
        ALARM_OP_QUERY => {
            let id = r.u8()?;
            let enabled = r.bool()?;
            let time = time(r)?;
            let repeat = Weekdays(r.u8()?);
            Ok(ProtocolEvent::AlarmUpdated(Alarm {
                id,
                enabled,
                time,
                repeat,
            }))
        }
        ALARM_OP_SET => {
            let _id = r.u8()?;
            Ok(ack(CMD_ALARM_INFO, r.u8()?))
        }
        ALARM_OP_DELETE => {
            let id = r.u8()?;
            let status = r.u8()?;
            if is_ok(status) {
                Ok(ProtocolEvent::AlarmRemoved { id })
            } else {
                Ok(ack(CMD_ALARM_INFO, status))
            }
        }
        op => Err(ProtocolError::UnknownOperation {
            command: CMD_ALARM_INFO,
            op,
        }),
    }
}

fn reminder_kind(r: &mut PayloadReader<'_>) -> Result<ReminderKind> {
    let raw = r.u8()?;
    ReminderKind::from_u8(raw)
        .ok_or_else(|| ProtocolError::InvalidData(format!("unknown reminder kind {}", raw)))
}

fn decode_reminder(r: &mut PayloadReader<'_>) -> Result<ProtocolEvent> {
    match settings_op(r, CMD_REMINDER_INFO)? {
        OP_QUERY => {
            let kind = reminder_kind(r)?;
            let enabled = r.bool()?;
            let start = time(r)?;
            let end = time(r)?;
            let interval_minutes = r.u16()?;
            Ok(ProtocolEvent::ReminderUpdated(Reminder {
                kind,
                enabled,
                start,
                end,
                interval_minutes,
            }))
        }
        _ => {
            reminder_kind(r)?;
            Ok(ack(CMD_REMINDER_INFO, r.u8()?))
        }
    }
}

fn decode_notification_switches(r: &mut PayloadReader<'_>) -> Result<ProtocolEvent> {
    match settings_op(r, CMD_SWITCH_TABLE_EXTENSION)? {
        OP_QUERY => {
            let bytes = r.bytes(NOTIFICATION_SWITCH_BYTES)?;
            Ok(ProtocolEvent::NotificationSwitchesUpdated(bytes_to_flags(bytes)))
        }
        _ => Ok(ack(CMD_SWITCH_TABLE_EXTENSION, r.u8()?)),
    }
}

fn decode_remote_photo(r: &mut PayloadReader<'_>) -> Result<ProtocolEvent> {
    Ok(ProtocolEvent::RemotePhotoRequested { action: r.u8()? })
}

fn decode_sleep(r: &mut PayloadReader<'_>) -> Result<ProtocolEvent> {
    let deep_minutes = r.u16()?;
    let light_minutes = r.u16()?;
    let awake_minutes = r.u16()?;
    Ok(ProtocolEvent::SleepUpdated(SleepSummary {
        deep_minutes,
        light_minutes,
        awake_minutes,
    }))
}

fn health_kind(r: &mut PayloadReader<'_>) -> Result<HealthKind> {
    let raw = r.u8()?;
    HealthKind::from_u8(raw)
        .ok_or_else(|| ProtocolError::InvalidData(format!("unknown health kind {}", raw)))
}

fn decode_test_result(r: &mut PayloadReader<'_>) -> Result<ProtocolEvent> {
    let kind = health_kind(r)?;
    let v1 = r.u8()?;
    let v2 = r.u8()?;
    Ok(ProtocolEvent::HealthReadingUpdated(HealthRecord {
        reading: HealthReading::from_values(kind, v1, v2),
        timestamp: None,
    }))
}

fn decode_newest_heart(r: &mut PayloadReader<'_>) -> Result<ProtocolEvent> {
    let kind = health_kind(r)?;
    let timestamp = r.u32()?;
    let v1 = r.u8()?;
    let v2 = r.u8()?;
    Ok(ProtocolEvent::HealthReadingUpdated(HealthRecord {
        reading: HealthReading::from_values(kind, v1, v2),
        timestamp: Some(timestamp),
    }))
}

fn decode_activity(r: &mut PayloadReader<'_>) -> Result<ProtocolEvent> {
    let steps = r.u32()?;
    let calories = r.u32()?;
    let distance_m = r.u32()?;
    Ok(ProtocolEvent::ActivityUpdated(Activity {
        steps,
        calories,
        distance_m,
    }))
}

fn decode_transfer_ack(
    r: &mut PayloadReader<'_>,
    command: u8,
    channel: TransferChannel,
) -> Result<ProtocolEvent> {
    let ack = match r.u8()? {
        TRANSFER_OP_QUERY => TransferAck::Query {
            channel,
            value: r.u16()?,
        },
        TRANSFER_OP_CONFIG => TransferAck::Config {
            channel,
            ok: is_ok(r.u8()?),
        },
        TRANSFER_OP_DATA => {
            let index = r.u16()?;
            let ok = is_ok(r.u8()?);
            TransferAck::Packet { channel, index, ok }
        }
        op => return Err(ProtocolError::UnknownOperation { command, op }),
    };
    Ok(ProtocolEvent::TransferAck(ack))
}

fn decode_market_ack(r: &mut PayloadReader<'_>) -> Result<ProtocolEvent> {
    decode_transfer_ack(r, CMD_DIAL_MARKET, TransferChannel::Market)
}

fn decode_resource_ack(r: &mut PayloadReader<'_>) -> Result<ProtocolEvent> {
    decode_transfer_ack(r, CMD_RESOURCE_UPGRADE, TransferChannel::Resource)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::switches::NotificationSwitch;

    fn run(id: u8, payload: &[u8]) -> Result<ProtocolEvent> {
        let (_, decoder) = DECODERS.iter().find(|(code, _)| *code == id).unwrap();
        decoder(&mut PayloadReader::new(payload))
    }

    #[test]
    fn test_decoder_table_has_no_duplicates() {
        let mut ids: Vec<u8> = DECODERS.iter().map(|(id, _)| *id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), DECODERS.len());
    }

    #[test]
    fn test_battery() {
        assert_eq!(
            run(CMD_GET_BATTERY_LEVEL, &[85, 1]).unwrap(),
            ProtocolEvent::BatteryUpdated(BatteryStatus { level: 85, charging: true })
        );
        assert!(matches!(
            run(CMD_GET_BATTERY_LEVEL, &[85]),
            Err(ProtocolError::FrameTooShort { expected: 2, actual: 1 })
        ));
    }

    #[test]
    fn test_device_info() {
        let mut payload = vec![3, 1, 2, 7, 2, 0x01, 0x68, 0x01, 0x68, 4];
        payload.extend_from_slice(b"W123");
        let event = run(CMD_GET_DEVICE_INFO, &payload).unwrap();
        let ProtocolEvent::DeviceInfoUpdated(info) = event else {
            panic!("unexpected {:?}", event);
        };
        assert_eq!(info.firmware_version(), "2.7");
        assert_eq!(info.serial, "W123");
        assert_eq!(info.screen.shape, ScreenShape::Round);
        assert_eq!(info.screen.width, 360);
    }

    #[test]
    fn test_device_info_truncated_serial() {
        let payload = [3, 1, 2, 7, 1, 0, 240, 0, 240, 10, b'A'];
        assert!(matches!(
            run(CMD_GET_DEVICE_INFO, &payload),
            Err(ProtocolError::FrameTooShort { .. })
        ));
    }

    #[test]
    fn test_notification_switch_query() {
        let event = run(CMD_SWITCH_TABLE_EXTENSION, &[OP_QUERY, 0b10, 0, 0, 0]).unwrap();
        let ProtocolEvent::NotificationSwitchesUpdated(set) = event else {
            panic!("unexpected {:?}", event);
        };
        assert!(set.contains(NotificationSwitch::IncomingCall));
        assert_eq!(set.len(), 1);
        assert_eq!(
            run(CMD_SWITCH_TABLE_EXTENSION, &[OP_SET, 0]).unwrap(),
            ProtocolEvent::CommandAcknowledged { command: 0x86, success: true }
        );
        assert!(run(CMD_SWITCH_TABLE_EXTENSION, &[OP_QUERY, 0, 0]).is_err());
    }

    #[test]
    fn test_alarm_ops() {
        assert_eq!(
            run(CMD_ALARM_INFO, &[0, 3, 5]).unwrap(),
            ProtocolEvent::AlarmCountUpdated { count: 3, can_use: 5 }
        );
        assert_eq!(
            run(CMD_ALARM_INFO, &[1, 2, 1, 6, 45, 0x7F]).unwrap(),
            ProtocolEvent::AlarmUpdated(Alarm {
                id: 2,
                enabled: true,
                time: TimeOfDay::new(6, 45),
                repeat: Weekdays::EVERY_DAY,
            })
        );
        assert_eq!(
            run(CMD_ALARM_INFO, &[3, 2, 0]).unwrap(),
            ProtocolEvent::AlarmRemoved { id: 2 }
        );
        assert_eq!(
            run(CMD_ALARM_INFO, &[3, 2, 1]).unwrap(),
            ProtocolEvent::CommandAcknowledged { command: 0x83, success: false }
        );
        assert_eq!(
            run(CMD_ALARM_INFO, &[9]).unwrap_err(),
            ProtocolError::UnknownOperation { command: 0x83, op: 9 }
        );
    }

    #[test]
    fn test_reminder_query() {
        let event = run(CMD_REMINDER_INFO, &[0, 0, 1, 9, 0, 18, 0, 0, 60]).unwrap();
        assert_eq!(
            event,
            ProtocolEvent::ReminderUpdated(Reminder::preset(ReminderKind::LongSit))
        );
        assert!(run(CMD_REMINDER_INFO, &[0, 5, 1, 9, 0, 18, 0, 0, 60]).is_err());
    }

    #[test]
    fn test_health_frames() {
        assert_eq!(
            run(CMD_NEWEST_HEART_DATA, &[2, 0x65, 0, 0, 0, 121, 79]).unwrap(),
            ProtocolEvent::HealthReadingUpdated(HealthRecord {
                reading: HealthReading::Pressure { systolic: 121, diastolic: 79 },
                timestamp: Some(0x6500_0000),
            })
        );
        assert_eq!(
            run(CMD_SLEEP_MONITORING, &[0, 90, 1, 44, 0, 15]).unwrap(),
            ProtocolEvent::SleepUpdated(SleepSummary {
                deep_minutes: 90,
                light_minutes: 300,
                awake_minutes: 15,
            })
        );
    }

    #[test]
    fn test_transfer_acks() {
        assert_eq!(
            run(CMD_DIAL_MARKET, &[2, 0, 4, 0]).unwrap(),
            ProtocolEvent::TransferAck(TransferAck::Packet {
                channel: TransferChannel::Market,
                index: 4,
                ok: true,
            })
        );
        assert_eq!(
            run(CMD_RESOURCE_UPGRADE, &[1, 3]).unwrap(),
            ProtocolEvent::TransferAck(TransferAck::Config {
                channel: TransferChannel::Resource,
                ok: false,
            })
        );
        assert_eq!(
            run(CMD_RESOURCE_UPGRADE, &[0, 0x01, 0x02]).unwrap(),
            ProtocolEvent::TransferAck(TransferAck::Query {
                channel: TransferChannel::Resource,
                value: 0x0102,
            })
        );
    }

    #[test]
    fn test_trailing_bytes_ignored() {
        assert_eq!(
            run(CMD_REMOTE_PHOTO, &[1, 0xEE, 0xEE]).unwrap(),
            ProtocolEvent::RemotePhotoRequested { action: 1 }
        );
    }
}
