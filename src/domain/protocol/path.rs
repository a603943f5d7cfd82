//! Path encoding: `/update/{kind}/{name}/{value}`.
//!
//! Carries no signature.

use crate::domain::errors::ProtocolError;
use crate::domain::types::{MetricKind, MetricUpdate, MetricValue};
use percent_encoding::{AsciiSet, CONTROLS};

// Everything that would end or confuse a single path segment.
const PATH_SEGMENT_ENCODING_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'\\')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Parses the three path segments of a plain update.
///
/// The kind is checked before the value, so an unknown kind wins over a bad
/// number. Gauges must be finite: `NaN` and infinities have no JSON form and
/// would poison the snapshot file.
pub fn parse_update(kind: &str, name: &str, raw: &str) -> Result<MetricUpdate, ProtocolError> {
    let kind = kind.parse::<MetricKind>()?;

    if name.trim().is_empty() {
        return Err(ProtocolError::EmptyId);
    }

    let value = match kind {
        MetricKind::Gauge => raw
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(MetricValue::Gauge)
            .ok_or_else(|| ProtocolError::InvalidNumber(raw.to_string()))?,
        MetricKind::Counter => raw
            .parse::<i64>()
            .map(MetricValue::Counter)
            .map_err(|_| ProtocolError::InvalidNumber(raw.to_string()))?,
    };

    Ok(MetricUpdate::new(name, value))
}

/// Path (relative to the server root) for sending `update` in plain form.
/// The name is percent-encoded as one segment.
pub fn update_path(update: &MetricUpdate) -> String {
    format!(
        "/update/{}/{}/{}",
        update.value.kind(),
        percent_encoding::utf8_percent_encode(&update.name, PATH_SEGMENT_ENCODING_SET),
        update.value
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_gauge_and_counter() {
        assert_eq!(
            parse_update("gauge", "Alloc", "3459.5").unwrap(),
            MetricUpdate::new("Alloc", MetricValue::Gauge(3459.5))
        );
        assert_eq!(
            parse_update("counter", "PollCount", "-3").unwrap(),
            MetricUpdate::new("PollCount", MetricValue::Counter(-3))
        );
    }

    #[test]
    fn test_counter_rejects_fraction() {
        assert!(matches!(
            parse_update("counter", "PollCount", "1.5"),
            Err(ProtocolError::InvalidNumber(_))
        ));
    }

    #[test]
    fn test_gauge_rejects_non_finite() {
        for raw in ["NaN", "nan", "inf", "-inf", "infinity", "1e999"] {
            assert!(
                matches!(
                    parse_update("gauge", "Bad", raw),
                    Err(ProtocolError::InvalidNumber(_))
                ),
                "accepted {}",
                raw
            );
        }
    }

    #[test]
    fn test_update_path_encodes_name() {
        let update = MetricUpdate::new("disk /dev/sda?#1", MetricValue::Counter(3));
        assert_eq!(
            update_path(&update),
            "/update/counter/disk%20%2Fdev%2Fsda%3F%231/3"
        );
    }

    #[test]
    fn test_unknown_kind_checked_first() {
        assert!(matches!(
            parse_update("unknown", "metric", "not-a-number"),
            Err(ProtocolError::UnsupportedKind(_))
        ));
    }

    #[test]
    fn test_update_path_round_trips_through_parser() {
        let update = MetricUpdate::new("RandomValue", MetricValue::Gauge(0.25));
        let path = update_path(&update);
        assert_eq!(path, "/update/gauge/RandomValue/0.25");

        let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();
        assert_eq!(
            parse_update(segments[1], segments[2], segments[3]).unwrap(),
            update
        );
    }
}
