//! HMAC-SHA256 signatures for wire metrics.
//!
//! The signed message is `"{id}:{kind}:{magnitude}"`, with gauges rendered to
//! six decimal places and counters as plain integers. Signatures travel as
//! lowercase hex.

use crate::domain::errors::ProtocolError;
use crate::domain::types::MetricValue;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;

type HmacSha256 = Hmac<Sha256>;

/// Canonical string covered by a metric signature
pub fn canonical_string(id: &str, value: &MetricValue) -> String {
    match value {
        MetricValue::Gauge(v) => format!("{}:gauge:{:.6}", id, v),
        MetricValue::Counter(d) => format!("{}:counter:{}", id, d),
    }
}

fn mac_for(key: &[u8], id: &str, value: &MetricValue) -> HmacSha256 {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(canonical_string(id, value).as_bytes());
    mac
}

/// Lowercase hex HMAC-SHA256 of the canonical string
pub fn sign(key: &[u8], id: &str, value: &MetricValue) -> String {
    hex::encode(mac_for(key, id, value).finalize().into_bytes())
}

/// Checks `hash` against a freshly computed signature.
///
/// Non-hex input is rejected. The digest comparison is constant-time
/// (`Mac::verify_slice`).
pub fn verify(key: &[u8], id: &str, value: &MetricValue, hash: &str) -> bool {
    let Ok(expected) = hex::decode(hash) else {
        return false;
    };
    mac_for(key, id, value).verify_slice(&expected).is_ok()
}

/// Shared-key signer. An empty key disables both signing and verification.
#[derive(Clone, Default)]
pub struct Signer {
    key: Option<Vec<u8>>,
}

impl Signer {
    pub fn new(key: &str) -> Self {
        if key.is_empty() {
            return Self::disabled();
        }
        Self {
            key: Some(key.as_bytes().to_vec()),
        }
    }

    pub fn disabled() -> Self {
        Self { key: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.key.is_some()
    }

    pub fn sign(&self, id: &str, value: &MetricValue) -> Option<String> {
        self.key.as_deref().map(|key| sign(key, id, value))
    }

    /// With a key configured, a missing hash is treated like a wrong one.
    pub fn verify(
        &self,
        id: &str,
        value: &MetricValue,
        hash: Option<&str>,
    ) -> Result<(), ProtocolError> {
        let Some(key) = self.key.as_deref() else {
            return Ok(());
        };

        match hash {
            Some(hash) if verify(key, id, value, hash) => Ok(()),
            _ => Err(ProtocolError::BadSignature { id: id.to_string() }),
        }
    }
}

impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signer")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}
