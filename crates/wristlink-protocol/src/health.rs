//! Health record sink.

use crate::events::ProtocolEvent;
use crate::types::{Activity, HealthReading, HealthRecord, SleepSummary};

/// Destination for health measurements decoded from the watch.
///
/// Every method has a no-op default so a store only implements what it keeps.
/// Calls happen on the dispatcher's thread after the state update.
pub trait HealthStore: Send + Sync {
    fn record_heart_rate(&self, _bpm: u8, _timestamp: Option<u32>) {}

    fn record_oxygen(&self, _percent: u8, _timestamp: Option<u32>) {}

    fn record_blood_pressure(&self, _systolic: u8, _diastolic: u8, _timestamp: Option<u32>) {}

    fn record_sleep(&self, _summary: &SleepSummary) {}

    fn record_activity(&self, _activity: &Activity) {}
}

/// A store that drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullHealthStore;

impl HealthStore for NullHealthStore {}

/// Forward the health content of `event`, if any. Returns whether it had any.
pub fn forward(store: &dyn HealthStore, event: &ProtocolEvent) -> bool {
    match event {
        ProtocolEvent::HealthReadingUpdated(HealthRecord { reading, timestamp }) => {
            match *reading {
                HealthReading::Heart { bpm } => store.record_heart_rate(bpm, *timestamp),
                HealthReading::Oxygen { percent } => store.record_oxygen(percent, *timestamp),
                HealthReading::Pressure {
                    systolic,
                    diastolic,
                } => store.record_blood_pressure(systolic, diastolic, *timestamp),
            }
            true
        }
        ProtocolEvent::SleepUpdated(summary) => {
            store.record_sleep(summary);
            true
        }
        ProtocolEvent::ActivityUpdated(activity) => {
            store.record_activity(activity);
            true
        }
        _ => false,
    }
}
