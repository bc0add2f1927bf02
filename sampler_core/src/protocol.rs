//! Line protocol spoken by the bench firmware.
//!
//! Each reading is one ASCII line tagged with a channel marker. Fields are
//! whitespace-delimited; the 3rd field is the reading and the 5th the device
//! timestamp in milliseconds:
//!
//! ```text
//! HX7T 0 0.500000 0 1200 0
//! ```
//!
//! Torque comes from two load cells and arrives as two consecutive `HX7M`
//! lines that are averaged into one sample.
use std::borrow::Cow;

use sampler_traits::Channel;
use serde::Serialize;

use crate::error::DecodeError;
use crate::util::midpoint_u64;

const VALUE_FIELD: usize = 2;
const TIMESTAMP_FIELD: usize = 4;

/// One decoded reading. Only produced by this module.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sample {
    #[serde(serialize_with = "channel_name")]
    pub channel: Channel,
    pub timestamp_ms: u64,
    pub value: f64,
}

impl Sample {
    pub(crate) fn new(channel: Channel, timestamp_ms: u64, value: f64) -> Self {
        Self {
            channel,
            timestamp_ms,
            value,
        }
    }
}

fn channel_name<S: serde::Serializer>(c: &Channel, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(c.name())
}

/// Which channel a raw line belongs to, if any. Markers are matched as
/// substrings in the order thrust, torque, speed.
pub fn classify(line: &str) -> Option<Channel> {
    Channel::ALL.into_iter().find(|c| line.contains(c.marker()))
}

/// How many consecutive lines make up the reading that starts with `first`.
pub fn lines_needed(first: &str) -> usize {
    match classify(first) {
        Some(Channel::Torque) => 2,
        _ => 1,
    }
}

/// Raw device bytes as text without the line terminator.
pub fn line_text(raw: &[u8]) -> Cow<'_, str> {
    match String::from_utf8_lossy(raw) {
        Cow::Borrowed(s) => Cow::Borrowed(s.trim_end_matches(['\r', '\n'])),
        Cow::Owned(s) => Cow::Owned(s.trim_end_matches(['\r', '\n']).to_string()),
    }
}

/// Parse `(|timestamp|, |value|)` from one tagged line.
fn parse_reading(line: &str) -> Result<(u64, f64), DecodeError> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    let value_field = fields
        .get(VALUE_FIELD)
        .ok_or_else(|| DecodeError::malformed(line, "missing value field"))?;
    let ts_field = fields
        .get(TIMESTAMP_FIELD)
        .ok_or_else(|| DecodeError::malformed(line, "missing timestamp field"))?;

    let value: f64 = value_field
        .parse()
        .map_err(|e| DecodeError::malformed(line, format!("value {value_field:?}: {e}")))?;
    if !value.is_finite() {
        return Err(DecodeError::malformed(line, "value is not finite"));
    }
    let ts: i64 = ts_field
        .parse()
        .map_err(|e| DecodeError::malformed(line, format!("timestamp {ts_field:?}: {e}")))?;

    Ok((ts.unsigned_abs(), value.abs()))
}

/// Decode one reading from `lines`.
///
/// - `Ok(None)`: the first line carries no marker (status chatter, blank).
/// - Thrust/speed use only the first line.
/// - Torque needs the first two lines, both tagged `HX7M`; the sample is
///   their mean value at their mean timestamp.
pub fn decode(lines: &[&str]) -> Result<Option<Sample>, DecodeError> {
    let Some(first) = lines.first() else {
        return Ok(None);
    };
    let Some(channel) = classify(first) else {
        return Ok(None);
    };

    match channel {
        Channel::Thrust | Channel::Speed => {
            let (ts, value) = parse_reading(first)?;
            Ok(Some(Sample::new(channel, ts, value)))
        }
        Channel::Torque => {
            let second = lines
                .get(1)
                .ok_or_else(|| DecodeError::malformed(first, "torque reading without partner line"))?;
            if !second.contains(Channel::Torque.marker()) {
                return Err(DecodeError::malformed(
                    second,
                    "expected the second HX7M line of a torque pair",
                ));
            }
            let (t1, v1) = parse_reading(first)?;
            let (t2, v2) = parse_reading(second)?;
            Ok(Some(Sample::new(
                Channel::Torque,
                midpoint_u64(t1, t2),
                (v1 + v2) / 2.0,
            )))
        }
    }
}

/// Decode a recorded transcript. Untagged lines are skipped; every tagged
/// reading yields either a sample or the reason it was rejected.
pub fn decode_transcript<'a, I>(lines: I) -> Vec<Result<Sample, DecodeError>>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut out = Vec::new();
    let mut it = lines.into_iter().peekable();
    while let Some(line) = it.next() {
        let decoded = if lines_needed(line) == 2 {
            match it.next_if(|l| l.contains(Channel::Torque.marker())) {
                Some(partner) => decode(&[line, partner]),
                None => decode(&[line]),
            }
        } else {
            decode(&[line])
        };
        match decoded {
            Ok(Some(s)) => out.push(Ok(s)),
            Ok(None) => {}
            Err(e) => out.push(Err(e)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn thrust_line_from_the_bench() {
        let s = decode(&["HX7T 0 0.500000 0 1200 0"]).unwrap().unwrap();
        assert_eq!(s.channel, Channel::Thrust);
        assert_eq!(s.timestamp_ms, 1200);
        assert_eq!(s.value, 0.5);
    }

    #[test]
    fn negative_fields_are_taken_by_magnitude() {
        let s = decode(&["RPMp 0 -4200.5 0 -77 0"]).unwrap().unwrap();
        assert_eq!(s.channel, Channel::Speed);
        assert_eq!(s.timestamp_ms, 77);
        assert_eq!(s.value, 4200.5);
    }

    #[test]
    fn torque_pairs_are_averaged() {
        let s = decode(&["HX7M 1 0.02 0 100 0", "HX7M 2 -0.04 0 111 0"])
            .unwrap()
            .unwrap();
        assert_eq!(s.channel, Channel::Torque);
        assert_eq!(s.timestamp_ms, 105);
        assert!((s.value - 0.03).abs() < 1e-12);
    }

    #[rstest]
    #[case(&["HX7M 1 0.02 0 100 0"][..])]
    #[case(&["HX7M 1 0.02 0 100 0", "HX7T 0 0.5 0 110 0"][..])]
    #[case(&["HX7M 1 0.02 0 100 0", "HX7M 2 x 0 110 0"][..])]
    fn broken_torque_pairs_are_malformed(#[case] lines: &[&str]) {
        assert!(matches!(decode(lines), Err(DecodeError::Malformed { .. })));
    }

    #[rstest]
    #[case("HX7T 0 abc 0 1200 0")]
    #[case("HX7T 0 0.5 0 12.5 0")]
    #[case("HX7T 0 0.5")]
    #[case("HX7T")]
    #[case("RPMp 0 inf 0 10 0")]
    #[case("HX7T 0 NaN 0 10 0")]
    fn bad_fields_are_malformed(#[case] line: &str) {
        assert!(matches!(decode(&[line]), Err(DecodeError::Malformed { .. })));
    }

    #[rstest]
    #[case("Scale ready")]
    #[case("")]
    #[case("hx7t lowercase is not a marker 1 2")]
    fn untagged_lines_are_not_samples(#[case] line: &str) {
        assert_eq!(decode(&[line]), Ok(None));
    }

    #[test]
    fn empty_input_is_not_a_sample() {
        assert_eq!(decode(&[]), Ok(None));
    }

    #[test]
    fn torque_needs_two_lines() {
        assert_eq!(lines_needed("HX7M 1 0.1 0 5 0"), 2);
        assert_eq!(lines_needed("HX7T 0 0.1 0 5 0"), 1);
        assert_eq!(lines_needed("noise"), 1);
    }

    #[test]
    fn line_text_strips_terminators_and_replaces_bad_utf8() {
        assert_eq!(line_text(b"HX7T 0 1 0 2 0\r\n"), "HX7T 0 1 0 2 0");
        let lossy = line_text(&[b'H', 0xff, b'\n']);
        assert_eq!(lossy, "H\u{fffd}");
    }

    #[test]
    fn transcript_pairs_torque_and_reports_errors_in_order() {
        let lines = [
            "boot v1.2",
            "HX7T 0 0.25 0 10 0",
            "HX7M 1 0.01 0 20 0",
            "HX7M 2 0.03 0 30 0",
            "HX7T 0 oops 0 40 0",
            "RPMp 0 3000 0 50 0",
        ];
        let out = decode_transcript(lines);
        assert_eq!(out.len(), 4);
        assert_eq!(out[0].as_ref().unwrap().channel, Channel::Thrust);
        let torque = out[1].as_ref().unwrap();
        assert_eq!(torque.timestamp_ms, 25);
        assert!((torque.value - 0.02).abs() < 1e-12);
        assert!(out[2].is_err());
        assert_eq!(out[3].as_ref().unwrap().value, 3000.0);
    }

    #[test]
    fn samples_serialize_with_channel_names() {
        let s = Sample::new(Channel::Speed, 5, 1.5);
        let json = serde_json::to_string(&s).unwrap();
        assert_eq!(json, r#"{"channel":"speed","timestamp_ms":5,"value":1.5}"#);
    }
}
