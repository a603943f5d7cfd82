use crate::domain::errors::ProtocolError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Gauge,
    Counter,
}

impl MetricKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Gauge => "gauge",
            MetricKind::Counter => "counter",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricKind {
    type Err = ProtocolError;

    /// Kind tags are case-sensitive on the wire.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gauge" => Ok(MetricKind::Gauge),
            "counter" => Ok(MetricKind::Counter),
            other => Err(ProtocolError::UnsupportedKind(other.to_string())),
        }
    }
}

/// A single reading: a gauge magnitude or a counter increment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricValue {
    Gauge(f64),
    Counter(i64),
}

impl MetricValue {
    pub fn kind(&self) -> MetricKind {
        match self {
            MetricValue::Gauge(_) => MetricKind::Gauge,
            MetricValue::Counter(_) => MetricKind::Counter,
        }
    }

    /// Counter increment carried by this value (zero for gauges).
    pub fn delta(&self) -> i64 {
        match self {
            MetricValue::Counter(delta) => *delta,
            MetricValue::Gauge(_) => 0,
        }
    }

    /// Gauge magnitude carried by this value (zero for counters).
    pub fn gauge(&self) -> f64 {
        match self {
            MetricValue::Gauge(value) => *value,
            MetricValue::Counter(_) => 0.0,
        }
    }
}

impl fmt::Display for MetricValue {
    /// Gauges use the shortest decimal form that round-trips; counters print as integers.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Gauge(value) => write!(f, "{}", value),
            MetricValue::Counter(delta) => write!(f, "{}", delta),
        }
    }
}

/// Named update applied to a repository.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricUpdate {
    pub name: String,
    pub value: MetricValue,
}

impl MetricUpdate {
    pub fn new(name: impl Into<String>, value: MetricValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Stored state of one metric name.
///
/// Both accumulators are kept regardless of `kind`, matching the snapshot
/// file layout and the SQL table. Only the field selected by `kind` is
/// meaningful to readers; see [`MetricRecord::value`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    #[serde(default, skip_serializing_if = "is_zero_i64")]
    pub delta: i64,
    #[serde(default, skip_serializing_if = "is_zero_f64")]
    pub value: f64,
    #[serde(rename = "type")]
    pub kind: MetricKind,
}

impl MetricRecord {
    pub fn new(value: MetricValue) -> Self {
        Self {
            delta: value.delta(),
            value: value.gauge(),
            kind: value.kind(),
        }
    }

    /// Applies the accumulation law: counters add, gauges replace.
    ///
    /// The stored kind always follows the incoming update, even when the
    /// name previously held the other kind. The counter accumulator is not
    /// reset on such a change. Counter overflow wraps.
    pub fn apply(&mut self, update: MetricValue) {
        self.delta = self.delta.wrapping_add(update.delta());
        self.value = update.gauge();
        self.kind = update.kind();
    }

    pub fn value(&self) -> MetricValue {
        match self.kind {
            MetricKind::Gauge => MetricValue::Gauge(self.value),
            MetricKind::Counter => MetricValue::Counter(self.delta),
        }
    }
}

/// Point-in-time copy of a repository, ordered by metric name.
pub type MetricSnapshot = BTreeMap<String, MetricRecord>;

fn is_zero_i64(v: &i64) -> bool {
    *v == 0
}

fn is_zero_f64(v: &f64) -> bool {
    *v == 0.0
}
