use crate::domain::errors::ProtocolError;
use crate::domain::protocol::signing::Signer;
use crate::domain::types::{MetricKind, MetricRecord, MetricUpdate, MetricValue};
use serde::{Deserialize, Serialize};

/// Transport form of a metric, shared by the single and batch JSON encodings
/// and by value queries.
///
/// `kind` stays a plain string so that an unrecognised kind decodes and can be
/// reported as unsupported rather than as a malformed body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WireMetric {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

impl WireMetric {
    /// Encodes an update, populating only the field that matches its kind.
    pub fn from_update(update: &MetricUpdate, signer: &Signer) -> Self {
        Self::from_value(&update.name, update.value, signer)
    }

    /// Query response for a stored record.
    pub fn from_record(id: &str, record: &MetricRecord, signer: &Signer) -> Self {
        Self::from_value(id, record.value(), signer)
    }

    fn from_value(id: &str, value: MetricValue, signer: &Signer) -> Self {
        let (delta, gauge) = match value {
            MetricValue::Counter(d) => (Some(d), None),
            MetricValue::Gauge(v) => (None, Some(v)),
        };
        Self {
            id: id.to_string(),
            kind: value.kind().as_str().to_string(),
            delta,
            value: gauge,
            hash: signer.sign(id, &value),
        }
    }

    /// Structural validation. The field not selected by the kind is ignored.
    pub fn validate(&self) -> Result<MetricUpdate, ProtocolError> {
        if self.id.trim().is_empty() {
            return Err(ProtocolError::EmptyId);
        }

        let value = match self.kind.parse::<MetricKind>()? {
            MetricKind::Gauge => self.value.map(MetricValue::Gauge),
            MetricKind::Counter => self.delta.map(MetricValue::Counter),
        }
        .ok_or_else(|| ProtocolError::MissingValue {
            id: self.id.clone(),
        })?;

        Ok(MetricUpdate::new(self.id.clone(), value))
    }

    /// Validation followed by signature verification.
    pub fn authenticate(&self, signer: &Signer) -> Result<MetricUpdate, ProtocolError> {
        let update = self.validate()?;
        signer.verify(&update.name, &update.value, self.hash.as_deref())?;
        Ok(update)
    }
}

/// Decodes a single JSON object body.
pub fn decode_one(body: &[u8]) -> Result<WireMetric, ProtocolError> {
    serde_json::from_slice(body).map_err(|e| ProtocolError::Malformed(e.to_string()))
}

/// Decodes a JSON array body.
pub fn decode_batch(body: &[u8]) -> Result<Vec<WireMetric>, ProtocolError> {
    serde_json::from_slice(body).map_err(|e| ProtocolError::Malformed(e.to_string()))
}

/// Validates and authenticates every element before returning any update,
/// so that a single bad element rejects the whole batch.
pub fn authenticate_batch(
    metrics: &[WireMetric],
    signer: &Signer,
) -> Result<Vec<MetricUpdate>, ProtocolError> {
    metrics.iter().map(|m| m.authenticate(signer)).collect()
}
