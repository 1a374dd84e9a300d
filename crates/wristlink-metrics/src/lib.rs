//! Metric declarations for the wristlink stack.
//!
//! Every metric the protocol, asset and transfer crates emit is declared here
//! as a [`Metric`] constant, so names and label keys live in one place. The
//! `metrics` crate is re-exported; with no recorder installed every call is a
//! no-op.
//!
//! ```rust,ignore
//! use wristlink_metrics::{describe_metrics, labels, metric_defs};
//!
//! describe_metrics();
//! metrics::counter!(metric_defs::FRAMES_DISPATCHED.name, &labels::command(0x51)).increment(1);
//! ```

pub use metrics;

use metrics::{describe_counter, describe_gauge, describe_histogram, Unit};

/// Counter, gauge or histogram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Counter,
    Gauge,
    Histogram,
}

impl MetricKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
            MetricKind::Histogram => "histogram",
        }
    }
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A metric name with its kind, description, unit and label keys.
///
/// ```rust
/// use wristlink_metrics::{Metric, MetricKind};
/// use metrics::Unit;
///
/// const RETRIES: Metric = Metric::counter("wristlink.transfer.retries")
///     .with_description("Packets resent")
///     .with_unit(Unit::Count)
///     .with_labels(&["kind"]);
///
/// assert_eq!(RETRIES.kind, MetricKind::Counter);
/// ```
#[derive(Debug, Clone)]
pub struct Metric {
    pub name: &'static str,
    pub kind: MetricKind,
    pub description: &'static str,
    pub unit: Option<Unit>,
    pub labels: &'static [&'static str],
}

impl Metric {
    const fn new(name: &'static str, kind: MetricKind) -> Self {
        Metric {
            name,
            kind,
            description: "",
            unit: None,
            labels: &[],
        }
    }

    pub const fn counter(name: &'static str) -> Self {
        Self::new(name, MetricKind::Counter)
    }

    pub const fn gauge(name: &'static str) -> Self {
        Self::new(name, MetricKind::Gauge)
    }

    pub const fn histogram(name: &'static str) -> Self {
        Self::new(name, MetricKind::Histogram)
    }

    pub const fn with_description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    pub const fn with_unit(mut self, unit: Unit) -> Self {
        self.unit = Some(unit);
        self
    }

    pub const fn with_labels(mut self, labels: &'static [&'static str]) -> Self {
        self.labels = labels;
        self
    }

    /// Register the description with the installed recorder. Metrics
    /// declared without a unit are described as counts.
    pub fn describe(&self) {
        let unit = self.unit.unwrap_or(Unit::Count);
        match self.kind {
            MetricKind::Counter => describe_counter!(self.name, unit, self.description),
            MetricKind::Gauge => describe_gauge!(self.name, unit, self.description),
            MetricKind::Histogram => describe_histogram!(self.name, unit, self.description),
        }
    }

    /// Unit as printed in `wristlink metrics` listings.
    pub fn unit_str(&self) -> &'static str {
        self.unit.map_or("", |unit| unit.as_str())
    }
}

/// All metric definitions.
pub mod metric_defs {
    use super::{Metric, Unit};

    /// Label on per-command metrics: identifier as `0xNN`.
    pub const COMMAND_LABELS: &[&str] = &["command"];
    /// Label on transfer metrics: `market` or `resource`.
    pub const TRANSFER_LABELS: &[&str] = &["kind"];

    // ========================================================================
    // Dispatcher
    // ========================================================================

    pub const FRAMES_DISPATCHED: Metric = Metric::counter("wristlink.dispatch.frames")
        .with_description("Inbound frames decoded and applied")
        .with_unit(Unit::Count)
        .with_labels(COMMAND_LABELS);

    pub const FRAMES_UNRECOGNIZED: Metric = Metric::counter("wristlink.dispatch.unrecognized")
        .with_description("Inbound frames with no registered handler")
        .with_unit(Unit::Count)
        .with_labels(COMMAND_LABELS);

    pub const DECODE_ERRORS: Metric = Metric::counter("wristlink.dispatch.decode_errors")
        .with_description("Inbound frames rejected as malformed")
        .with_unit(Unit::Count)
        .with_labels(COMMAND_LABELS);

    // ========================================================================
    // Transfer engine
    // ========================================================================

    pub const PACKETS_SENT: Metric = Metric::counter("wristlink.transfer.packets_sent")
        .with_description("Data packets handed to the transport, including resends")
        .with_unit(Unit::Count)
        .with_labels(TRANSFER_LABELS);

    pub const PACKET_RETRIES: Metric = Metric::counter("wristlink.transfer.retries")
        .with_description("Packets resent after a missing ack or rejected send")
        .with_unit(Unit::Count)
        .with_labels(TRANSFER_LABELS);

    pub const TRANSFERS_COMPLETED: Metric = Metric::counter("wristlink.transfer.completed")
        .with_description("Transfers acknowledged to the last packet")
        .with_unit(Unit::Count)
        .with_labels(TRANSFER_LABELS);

    pub const TRANSFERS_FAILED: Metric = Metric::counter("wristlink.transfer.failed")
        .with_description("Transfers that ran out of retries")
        .with_unit(Unit::Count)
        .with_labels(TRANSFER_LABELS);

    pub const TRANSFERS_CANCELLED: Metric = Metric::counter("wristlink.transfer.cancelled")
        .with_description("Transfers cancelled by the caller")
        .with_unit(Unit::Count)
        .with_labels(TRANSFER_LABELS);

    /// Histogram of asset sizes handed to the transfer engine.
    pub const TRANSFER_BYTES: Metric = Metric::histogram("wristlink.transfer.asset_bytes")
        .with_description("Size of transferred assets")
        .with_unit(Unit::Bytes)
        .with_labels(TRANSFER_LABELS);

    // ========================================================================
    // Asset codec
    // ========================================================================

    pub const COMPRESSION_ATTEMPTS: Metric = Metric::counter("wristlink.codec.attempts")
        .with_description("Lossy encoder invocations")
        .with_unit(Unit::Count);

    pub const ENCODED_SIZE: Metric = Metric::histogram("wristlink.codec.encoded_bytes")
        .with_description("Size of the accepted encoder output")
        .with_unit(Unit::Bytes);

    /// Every metric, in listing order.
    pub const ALL: &[&Metric] = &[
        &FRAMES_DISPATCHED,
        &FRAMES_UNRECOGNIZED,
        &DECODE_ERRORS,
        &PACKETS_SENT,
        &PACKET_RETRIES,
        &TRANSFERS_COMPLETED,
        &TRANSFERS_FAILED,
        &TRANSFERS_CANCELLED,
        &TRANSFER_BYTES,
        &COMPRESSION_ATTEMPTS,
        &ENCODED_SIZE,
    ];
}

/// Label sets matching the keys declared in [`metric_defs`].
///
/// Pass by reference to the `metrics` macros.
pub mod labels {
    /// `command=0xNN`.
    pub fn command(id: u8) -> [(&'static str, String); 1] {
        [("command", format!("0x{:02X}", id))]
    }

    /// `kind=<transfer kind>`.
    pub fn transfer(kind: &str) -> [(&'static str, String); 1] {
        [("kind", kind.to_string())]
    }
}

/// Describe every metric. Call once after installing a recorder.
pub fn describe_metrics() {
    for metric in metric_defs::ALL {
        metric.describe();
    }
}
