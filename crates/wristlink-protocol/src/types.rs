//! Value types carried by commands and responses.

use serde::{Deserialize, Serialize};

/// Wall-clock time of day as sent on the wire (hour, minute).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct TimeOfDay {
    pub hour: u8,
    pub minute: u8,
}

impl TimeOfDay {
    /// Create a time of day. Values are not range-checked; the watch clamps.
    pub const fn new(hour: u8, minute: u8) -> Self {
        TimeOfDay { hour, minute }
    }

    /// Minutes since midnight.
    pub fn minutes(&self) -> u16 {
        self.hour as u16 * 60 + self.minute as u16
    }
}

impl std::fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

// ============================================================================
// Alarms
// ============================================================================

/// Weekday repeat bitmap: bit 0 is Monday, bit 6 is Sunday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Weekdays(pub u8);

impl Weekdays {
    /// Fire once, no repeat.
    pub const NONE: Weekdays = Weekdays(0);
    /// Monday to Friday.
    pub const WORKDAYS: Weekdays = Weekdays(0b0001_1111);
    /// Every day.
    pub const EVERY_DAY: Weekdays = Weekdays(0b0111_1111);

    /// Whether the alarm repeats on `day` (0 = Monday).
    pub fn contains(&self, day: u8) -> bool {
        day < 7 && self.0 & (1 << day) != 0
    }
}

/// One entry of the watch's alarm table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alarm {
    pub id: u8,
    pub enabled: bool,
    pub time: TimeOfDay,
    pub repeat: Weekdays,
}

// ============================================================================
// Reminders
// ============================================================================

/// Which periodic reminder a frame refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ReminderKind {
    LongSit = 0,
    DrinkWater = 1,
}

impl ReminderKind {
    /// Parse the wire byte.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(ReminderKind::LongSit),
            1 => Some(ReminderKind::DrinkWater),
            _ => None,
        }
    }
}

/// A periodic reminder window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    pub kind: ReminderKind,
    pub enabled: bool,
    pub start: TimeOfDay,
    pub end: TimeOfDay,
    pub interval_minutes: u16,
}

impl Reminder {
    /// The enabled default for a reminder kind.
    ///
    /// Long-sit: 09:00-18:00 every 60 minutes. Drink-water: 08:00-20:00
    /// every 120 minutes.
    pub fn preset(kind: ReminderKind) -> Self {
        match kind {
            ReminderKind::LongSit => Reminder {
                kind,
                enabled: true,
                start: TimeOfDay::new(9, 0),
                end: TimeOfDay::new(18, 0),
                interval_minutes: 60,
            },
            ReminderKind::DrinkWater => Reminder {
                kind,
                enabled: true,
                start: TimeOfDay::new(8, 0),
                end: TimeOfDay::new(20, 0),
                interval_minutes: 120,
            },
        }
    }

    /// The same window with the reminder switched off.
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// Do-not-disturb window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DoNotDisturb {
    pub enabled: bool,
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

// ============================================================================
// Profile and device
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Gender {
    #[default]
    Male = 0,
    Female = 1,
}

impl Gender {
    /// Parse the wire byte; anything non-zero is treated as female.
    pub fn from_u8(value: u8) -> Self {
        if value == 0 {
            Gender::Male
        } else {
            Gender::Female
        }
    }
}

/// The wearer's profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PersonalInfo {
    pub age: u8,
    pub height_cm: u8,
    pub weight_kg: u8,
    pub gender: Gender,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BatteryStatus {
    /// Charge level 0-100.
    pub level: u8,
    pub charging: bool,
}

/// 12 or 24 hour clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TimeFormat {
    Hour12 = 0,
    #[default]
    Hour24 = 1,
}

impl TimeFormat {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(TimeFormat::Hour12),
            1 => Some(TimeFormat::Hour24),
            _ => None,
        }
    }
}

/// Physical screen outline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScreenShape {
    Square = 1,
    Round = 2,
}

impl ScreenShape {
    /// Parse the device-info shape byte.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(ScreenShape::Square),
            2 => Some(ScreenShape::Round),
            _ => None,
        }
    }
}

/// Screen geometry reported by the watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenInfo {
    pub shape: ScreenShape,
    pub width: u16,
    pub height: u16,
}

impl ScreenInfo {
    /// Default panel of the supported watch family.
    pub const DEFAULT: ScreenInfo = ScreenInfo {
        shape: ScreenShape::Square,
        width: 240,
        height: 240,
    };

    /// Image size a watch face should be rendered at.
    ///
    /// Round panels display a centred square, so both sides take the shorter
    /// dimension.
    pub fn recommended_image_size(&self) -> (u16, u16) {
        match self.shape {
            ScreenShape::Square => (self.width, self.height),
            ScreenShape::Round => {
                let side = self.width.min(self.height);
                (side, side)
            }
        }
    }

    /// A zero dimension means the watch has not reported a usable screen.
    pub fn is_known(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

/// Static device description from the device-info query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub watch_type: u8,
    pub language: u8,
    pub firmware_major: u8,
    pub firmware_minor: u8,
    pub serial: String,
    pub screen: ScreenInfo,
}

impl DeviceInfo {
    /// Firmware version as `major.minor`.
    pub fn firmware_version(&self) -> String {
        format!("{}.{}", self.firmware_major, self.firmware_minor)
    }
}

// ============================================================================
// Health
// ============================================================================

/// Which measurement a health frame refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HealthKind {
    Heart = 0,
    Oxygen = 1,
    Pressure = 2,
}

impl HealthKind {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(HealthKind::Heart),
            1 => Some(HealthKind::Oxygen),
            2 => Some(HealthKind::Pressure),
            _ => None,
        }
    }
}

/// A single measurement value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthReading {
    Heart { bpm: u8 },
    Oxygen { percent: u8 },
    Pressure { systolic: u8, diastolic: u8 },
}

impl HealthReading {
    /// Build a reading from the `kind v1 v2` triple used on the wire.
    pub fn from_values(kind: HealthKind, v1: u8, v2: u8) -> Self {
        match kind {
            HealthKind::Heart => HealthReading::Heart { bpm: v1 },
            HealthKind::Oxygen => HealthReading::Oxygen { percent: v1 },
            HealthKind::Pressure => HealthReading::Pressure {
                systolic: v1,
                diastolic: v2,
            },
        }
    }

    pub fn kind(&self) -> HealthKind {
        match self {
            HealthReading::Heart { .. } => HealthKind::Heart,
            HealthReading::Oxygen { .. } => HealthKind::Oxygen,
            HealthReading::Pressure { .. } => HealthKind::Pressure,
        }
    }
}

/// A reading with the watch timestamp, when the frame carries one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthRecord {
    pub reading: HealthReading,
    /// Seconds since the Unix epoch, watch clock.
    pub timestamp: Option<u32>,
}

/// Last night's sleep, in minutes per stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SleepSummary {
    pub deep_minutes: u16,
    pub light_minutes: u16,
    pub awake_minutes: u16,
}

impl SleepSummary {
    /// Time asleep (deep plus light).
    pub fn asleep_minutes(&self) -> u32 {
        self.deep_minutes as u32 + self.light_minutes as u32
    }
}

/// Today's activity totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Activity {
    pub steps: u32,
    pub calories: u32,
    pub distance_m: u32,
}

// ============================================================================
// Dials
// ============================================================================

/// Origin of a watch face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DialType {
    #[default]
    Market = 0,
    Custom = 1,
}

/// Where the clock is drawn on a custom dial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TimePosition {
    None = 0,
    TopLeft = 1,
    BottomLeft = 2,
    TopRight = 3,
    BottomRight = 4,
    #[default]
    Center = 5,
}

/// Clock colour on a custom dial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DialColor {
    #[default]
    White = 0,
    Black = 1,
    Yellow = 2,
    Orange = 3,
    Pink = 4,
    Purple = 5,
    Blue = 6,
    Cyan = 7,
    Green = 8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reminder_presets() {
        let sit = Reminder::preset(ReminderKind::LongSit);
        assert!(sit.enabled);
        assert_eq!(sit.start, TimeOfDay::new(9, 0));
        assert_eq!(sit.end, TimeOfDay::new(18, 0));
        assert_eq!(sit.interval_minutes, 60);

        let water = Reminder::preset(ReminderKind::DrinkWater).disabled();
        assert!(!water.enabled);
        assert_eq!(water.start.to_string(), "08:00");
        assert_eq!(water.end.to_string(), "20:00");
        assert_eq!(water.interval_minutes, 120);
    }

    #[test]
    fn test_recommended_image_size() {
        let square = ScreenInfo { shape: ScreenShape::Square, width: 240, height: 280 };
        assert_eq!(square.recommended_image_size(), (240, 280));
        let round = ScreenInfo { shape: ScreenShape::Round, width: 466, height: 480 };
        assert_eq!(round.recommended_image_size(), (466, 466));
        assert!(!ScreenInfo { width: 0, ..square }.is_known());
    }

    #[test]
    fn test_weekdays() {
        assert!(Weekdays::WORKDAYS.contains(0));
        assert!(!Weekdays::WORKDAYS.contains(5));
        assert!(Weekdays::EVERY_DAY.contains(6));
        assert!(!Weekdays::EVERY_DAY.contains(7));
    }

    #[test]
    fn test_health_reading_from_values() {
        assert_eq!(
            HealthReading::from_values(HealthKind::Pressure, 120, 80),
            HealthReading::Pressure { systolic: 120, diastolic: 80 }
        );
        assert_eq!(HealthReading::from_values(HealthKind::Heart, 72, 0).kind(), HealthKind::Heart);
    }
}
