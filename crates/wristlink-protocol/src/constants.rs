//! Protocol constants
//!
//! Command identifiers, operation bytes, status codes and field limits used by
//! the watch protocol. Identifiers are shared by requests and the responses
//! that answer them.

// ============================================================================
// Basic device control (0x50 - 0x5D)
// ============================================================================

/// Sync phone time to the watch.
pub const CMD_SYNC_TIME: u8 = 0x50;
/// Query battery level and charging state.
pub const CMD_GET_BATTERY_LEVEL: u8 = 0x51;
/// Query or set screen brightness.
pub const CMD_SCREEN_BRIGHTNESS: u8 = 0x52;
/// Query or set device language.
pub const CMD_DEVICE_LANGUAGE: u8 = 0x53;
/// Query or set metric/imperial unit format.
pub const CMD_DEVICE_UNIT_FORMAT: u8 = 0x54;
/// Restore factory settings.
pub const CMD_RESET_TO_FACTORY: u8 = 0x55;
/// Set screen timeout.
pub const CMD_SCREEN_TIMEOUT: u8 = 0x56;
/// Query or set do-not-disturb window.
pub const CMD_DO_NOT_DISTURB: u8 = 0x57;
/// Make the band vibrate/ring.
pub const CMD_FIND_BAND: u8 = 0x58;
/// Sent by the watch to make the phone ring.
pub const CMD_FIND_PHONE: u8 = 0x59;
/// Set weather temperature unit.
pub const CMD_WEATHER_UNIT: u8 = 0x5A;
/// Query or set 12/24 hour time format.
pub const CMD_TIME_FORMAT: u8 = 0x5B;
/// Query device information.
pub const CMD_GET_DEVICE_INFO: u8 = 0x5C;
/// Tell the watch which phone platform is connected.
pub const CMD_SET_APP_INFO: u8 = 0x5D;

// ============================================================================
// Personal info (0x70)
// ============================================================================

/// Query or set the wearer's profile.
pub const CMD_PERSONAL_INFO: u8 = 0x70;

// ============================================================================
// Switches and settings (0x80 - 0x87)
// ============================================================================

/// Query or set the 2-byte settings switch word.
pub const CMD_SWITCH_STATUS: u8 = 0x80;
/// Bind or unbind the device.
pub const CMD_BIND_DEVICE: u8 = 0x81;
/// Unbind notification.
pub const CMD_UNBIND_NOTIFY: u8 = 0x82;
/// Alarm table operations.
pub const CMD_ALARM_INFO: u8 = 0x83;
/// Long-sit / drink-water reminders.
pub const CMD_REMINDER_INFO: u8 = 0x85;
/// Query or set the 4-byte notification switch word.
pub const CMD_SWITCH_TABLE_EXTENSION: u8 = 0x86;
/// Ask the watch to drop the Bluetooth link.
pub const CMD_DISCONNECT_BT: u8 = 0x87;

// ============================================================================
// Multimedia (0x90 - 0x91)
// ============================================================================

/// Music playback control.
pub const CMD_MUSIC_CONTROL: u8 = 0x90;
/// Remote camera shutter.
pub const CMD_REMOTE_PHOTO: u8 = 0x91;

// ============================================================================
// Notifications and weather (0xA0 - 0xA6)
// ============================================================================

/// Push a notification message.
pub const CMD_MESSAGE_PUSH: u8 = 0xA0;
/// Push weather information.
pub const CMD_WEATHER_INFO: u8 = 0xA1;
/// Query or set a contact entry.
pub const CMD_CONTACT_INFO: u8 = 0xA4;
/// Mute an incoming call.
pub const CMD_INCOMING_CALL_MUTE: u8 = 0xA6;

// ============================================================================
// Health (0xB0 - 0xCA)
// ============================================================================

/// Query or set activity targets.
pub const CMD_TARGET_SETTINGS: u8 = 0xB0;
/// Multi-sport mode records.
pub const CMD_MULTI_SPORT_DATA: u8 = 0xB3;
/// Query last night's sleep summary.
pub const CMD_SLEEP_MONITORING: u8 = 0xB5;
/// Set automatic sleep monitoring window.
pub const CMD_AUTO_SLEEP_MONITORING: u8 = 0xB6;
/// Start or stop a heart/oxygen/pressure measurement.
pub const CMD_START_TEST: u8 = 0xC5;
/// Query today's activity totals.
pub const CMD_NEWEST_HEALTH_DATA: u8 = 0xC7;
/// Query step records in a time range.
pub const CMD_STEP_DATA: u8 = 0xC8;
/// Query sleep records in a time range.
pub const CMD_HISTORY_SLEEP_DATA: u8 = 0xC9;
/// Query the latest heart/oxygen/pressure reading.
pub const CMD_NEWEST_HEART_DATA: u8 = 0xCA;

// ============================================================================
// Dials and resources (0xE0 - 0xE3)
// ============================================================================

/// Watch-face (dial) market transfer.
pub const CMD_DIAL_MARKET: u8 = 0xE0;
/// Set time position and colour of a custom dial.
pub const CMD_TIME_POSITION_AND_COLOR: u8 = 0xE1;
/// Firmware resource upgrade transfer.
pub const CMD_RESOURCE_UPGRADE: u8 = 0xE2;
/// Show a QR code on the watch.
pub const CMD_QR_CODE: u8 = 0xE3;

// ============================================================================
// Operation bytes
// ============================================================================

/// Query the current value.
pub const OP_QUERY: u8 = 0x00;
/// Write a new value.
pub const OP_SET: u8 = 0x01;

/// Alarm: query count and free slots.
pub const ALARM_OP_COUNT: u8 = 0x00;
/// Alarm: query one alarm.
pub const ALARM_OP_QUERY: u8 = 0x01;
/// Alarm: write one alarm.
pub const ALARM_OP_SET: u8 = 0x02;
/// Alarm: delete one alarm.
pub const ALARM_OP_DELETE: u8 = 0x03;

/// Transfer: query the currently installed asset.
pub const TRANSFER_OP_QUERY: u8 = 0x00;
/// Transfer: configuration frame.
pub const TRANSFER_OP_CONFIG: u8 = 0x01;
/// Transfer: data frame.
pub const TRANSFER_OP_DATA: u8 = 0x02;

/// Data frame control flag: more packets follow.
pub const CONTROL_CONTINUE: u8 = 0x00;
/// Data frame control flag: last packet.
pub const CONTROL_FINAL: u8 = 0x01;

/// Status byte meaning success.
pub const STATUS_OK: u8 = 0x00;

// ============================================================================
// Envelope sizes
// ============================================================================

/// Market data frame header: id, op, packet:u16, bin, progress, control.
pub const MARKET_ENVELOPE_OVERHEAD: usize = 7;
/// Resource data frame header: id, op, packet:u16, progress, control.
pub const RESOURCE_ENVELOPE_OVERHEAD: usize = 6;

// ============================================================================
// Field limits
// ============================================================================

/// Maximum bytes of a pushed message body.
pub const MAX_MESSAGE_LEN: usize = 120;
/// Maximum bytes of a contact name.
pub const MAX_CONTACT_NAME_LEN: usize = 20;
/// Maximum bytes of a contact phone number.
pub const MAX_CONTACT_PHONE_LEN: usize = 20;
/// Maximum bytes of a QR code string.
pub const MAX_QR_CODE_LEN: usize = 200;
/// Maximum bytes of a serial number in the device info response.
pub const MAX_SERIAL_LEN: usize = 32;

/// Number of bytes in the settings switch word.
pub const SETTINGS_SWITCH_BYTES: usize = 2;
/// Number of bytes in the notification switch word.
pub const NOTIFICATION_SWITCH_BYTES: usize = 4;
