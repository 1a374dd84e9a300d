//! Bitmask registry for multi-byte switch words.
//!
//! A switch group is a run of 1-4 bytes where each registered flag owns one
//! bit. Bit 0 is the least significant bit of its byte. The registries below
//! are static and exhaustive; bits that no flag owns are written as zero and
//! ignored when reading.

use std::collections::BTreeSet;
use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use crate::constants::{NOTIFICATION_SWITCH_BYTES, SETTINGS_SWITCH_BYTES};
use crate::error::{ProtocolError, Result};

/// Location of one named flag inside a switch group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwitchWord<F> {
    /// The flag stored at this location.
    pub flag: F,
    /// Byte index within the group.
    pub byte: usize,
    /// Bit index within the byte (0 = LSB).
    pub bit: u8,
}

impl<F> SwitchWord<F> {
    const fn at(flag: F, byte: usize, bit: u8) -> Self {
        SwitchWord { flag, byte, bit }
    }
}

/// A flag type with a static registry of bit positions.
pub trait SwitchFlag: Copy + Ord + Debug + 'static {
    /// Every registered flag and where it lives.
    const REGISTRY: &'static [SwitchWord<Self>];
    /// Native group size on the wire.
    const GROUP_SIZE: usize;
}

/// A set of enabled flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SwitchSet<F: Ord>(BTreeSet<F>);

impl<F: Ord> Default for SwitchSet<F> {
    fn default() -> Self {
        SwitchSet(BTreeSet::new())
    }
}

impl<F: Ord + Copy> SwitchSet<F> {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable a flag.
    pub fn insert(&mut self, flag: F) -> bool {
        self.0.insert(flag)
    }

    /// Disable a flag.
    pub fn remove(&mut self, flag: F) -> bool {
        self.0.remove(&flag)
    }

    /// Whether a flag is enabled.
    pub fn contains(&self, flag: F) -> bool {
        self.0.contains(&flag)
    }

    /// Number of enabled flags.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if no flag is enabled.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Enabled flags in order.
    pub fn iter(&self) -> impl Iterator<Item = F> + '_ {
        self.0.iter().copied()
    }
}

impl<F: Ord> FromIterator<F> for SwitchSet<F> {
    fn from_iter<I: IntoIterator<Item = F>>(iter: I) -> Self {
        SwitchSet(iter.into_iter().collect())
    }
}

/// Pack a flag set into `group_size` bytes.
///
/// Fails if an enabled flag lives in a byte beyond the group.
pub fn flags_to_bytes<F: SwitchFlag>(set: &SwitchSet<F>, group_size: usize) -> Result<Vec<u8>> {
    let mut out = vec![0u8; group_size];
    for word in F::REGISTRY {
        if !set.contains(word.flag) {
            continue;
        }
        if word.byte >= group_size {
            return Err(ProtocolError::SwitchGroupTooSmall {
                byte: word.byte,
                group_size,
            });
        }
        out[word.byte] |= 1 << word.bit;
    }
    Ok(out)
}

/// Unpack a switch group into the set of registered flags that are on.
pub fn bytes_to_flags<F: SwitchFlag>(bytes: &[u8]) -> SwitchSet<F> {
    F::REGISTRY
        .iter()
        .filter(|w| bytes.get(w.byte).is_some_and(|b| b & (1 << w.bit) != 0))
        .map(|w| w.flag)
        .collect()
}

// ============================================================================
// Settings switches (0x80, 2 bytes)
// ============================================================================

/// Device settings carried in the 2-byte switch status word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SettingSwitch {
    AntiLost,
    RaiseToWake,
    AutoSync,
    SleepMonitoring,
    MessageReminder,
    ExerciseDataUpload,
    GoalAchievement,
    MessageScreenDisplay,
    Sound,
    Vibration,
    HealthDataUpload,
    MessageVibration,
}

const SETTING_REGISTRY: &[SwitchWord<SettingSwitch>] = &[
    SwitchWord::at(SettingSwitch::AntiLost, 0, 0),
    SwitchWord::at(SettingSwitch::RaiseToWake, 0, 1),
    SwitchWord::at(SettingSwitch::AutoSync, 0, 2),
    SwitchWord::at(SettingSwitch::SleepMonitoring, 0, 3),
    SwitchWord::at(SettingSwitch::MessageReminder, 0, 4),
    SwitchWord::at(SettingSwitch::ExerciseDataUpload, 0, 5),
    SwitchWord::at(SettingSwitch::GoalAchievement, 0, 6),
    SwitchWord::at(SettingSwitch::MessageScreenDisplay, 0, 7),
    SwitchWord::at(SettingSwitch::Sound, 1, 0),
    SwitchWord::at(SettingSwitch::Vibration, 1, 1),
    SwitchWord::at(SettingSwitch::HealthDataUpload, 1, 2),
    SwitchWord::at(SettingSwitch::MessageVibration, 1, 3),
];

impl SwitchFlag for SettingSwitch {
    const REGISTRY: &'static [SwitchWord<Self>] = SETTING_REGISTRY;
    const GROUP_SIZE: usize = SETTINGS_SWITCH_BYTES;
}

// ============================================================================
// Notification switches (0x86, 4 bytes)
// ============================================================================

/// Per-app notification forwarding flags in the 4-byte extension table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum NotificationSwitch {
    NullMessage,
    IncomingCall,
    MissedCall,
    Messages,
    Email,
    Schedule,
    Facetime,
    QQ,
    Skype,
    Wechat,
    Whatsapp,
    Gmail,
    Hangout,
    Inbox,
    Line,
    Twitter,
    Facebook,
    FacebookMessenger,
    Instagram,
    Weibo,
    Kakaotalk,
    FacebookPageManager,
    Viber,
    VkClient,
    Telegram,
    Snapchat,
    DingTalk,
    Alipay,
    Tiktok,
    LinkedIn,
}

const NOTIFICATION_REGISTRY: &[SwitchWord<NotificationSwitch>] = &[
    // p0
    SwitchWord::at(NotificationSwitch::NullMessage, 0, 0),
    SwitchWord::at(NotificationSwitch::IncomingCall, 0, 1),
    SwitchWord::at(NotificationSwitch::MissedCall, 0, 2),
    SwitchWord::at(NotificationSwitch::Messages, 0, 3),
    SwitchWord::at(NotificationSwitch::Email, 0, 4),
    SwitchWord::at(NotificationSwitch::Schedule, 0, 5),
    SwitchWord::at(NotificationSwitch::Facetime, 0, 6),
    SwitchWord::at(NotificationSwitch::QQ, 0, 7),
    // p1
    SwitchWord::at(NotificationSwitch::Skype, 1, 0),
    SwitchWord::at(NotificationSwitch::Wechat, 1, 1),
    SwitchWord::at(NotificationSwitch::Whatsapp, 1, 2),
    SwitchWord::at(NotificationSwitch::Gmail, 1, 3),
    SwitchWord::at(NotificationSwitch::Hangout, 1, 4),
    SwitchWord::at(NotificationSwitch::Inbox, 1, 5),
    SwitchWord::at(NotificationSwitch::Line, 1, 6),
    SwitchWord::at(NotificationSwitch::Twitter, 1, 7),
    // p2
    SwitchWord::at(NotificationSwitch::Facebook, 2, 0),
    SwitchWord::at(NotificationSwitch::FacebookMessenger, 2, 1),
    SwitchWord::at(NotificationSwitch::Instagram, 2, 2),
    SwitchWord::at(NotificationSwitch::Weibo, 2, 3),
    SwitchWord::at(NotificationSwitch::Kakaotalk, 2, 4),
    SwitchWord::at(NotificationSwitch::FacebookPageManager, 2, 5),
    SwitchWord::at(NotificationSwitch::Viber, 2, 6),
    SwitchWord::at(NotificationSwitch::VkClient, 2, 7),
    // p3, top two bits unused
    SwitchWord::at(NotificationSwitch::Telegram, 3, 0),
    SwitchWord::at(NotificationSwitch::Snapchat, 3, 1),
    SwitchWord::at(NotificationSwitch::DingTalk, 3, 2),
    SwitchWord::at(NotificationSwitch::Alipay, 3, 3),
    SwitchWord::at(NotificationSwitch::Tiktok, 3, 4),
    SwitchWord::at(NotificationSwitch::LinkedIn, 3, 5),
];

impl SwitchFlag for NotificationSwitch {
    const REGISTRY: &'static [SwitchWord<Self>] = NOTIFICATION_REGISTRY;
    const GROUP_SIZE: usize = NOTIFICATION_SWITCH_BYTES;
}

/// Enabled settings switches.
pub type SettingSwitches = SwitchSet<SettingSwitch>;
/// Enabled notification switches.
pub type NotificationSwitches = SwitchSet<NotificationSwitch>;
