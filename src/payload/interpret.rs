//! Payload interpretation through field tables.
//!
//! Decoding a packet only restores raw frame bytes. This module gives
//! them meaning: every rule in a [`FieldTable`] is applied to the
//! packet and the results come back as a sorted record of named
//! values, ready for JSON serialization.

use std::collections::BTreeMap;

use crate::error::{DecodeError, Result};
use crate::protocol::Packet;

use super::spec::{FieldSpec, FieldTable, FieldValue};

/// Decode a packet's payload into named field values.
///
/// The record maps field names to values in name order. A rule that
/// addresses a frame or byte the packet does not have fails the whole
/// decode with [`DecodeError::RuleOutOfRange`]; rules never panic on
/// malformed tables.
///
/// # Example
///
/// ```
/// use vbus_stream::payload::{decode_payload, FieldTable};
/// use vbus_stream::protocol::{Header, Packet};
///
/// let table = FieldTable::from_json(
///     r#"{"S1": {"type": "numeric", "frame": 0, "bytes": [0, 1], "multiplier": 0.1}}"#,
/// )
/// .unwrap();
///
/// let mut packet = Packet::new(Header::new(0, 0, 0x0100, 1));
/// packet.decode_frames(&[0x10, 0x00, 0x00, 0x00, 0x00, 0x6F]).unwrap();
///
/// let record = decode_payload(&packet, &table).unwrap();
/// assert_eq!(record["S1"].as_number(), Some(1.6));
/// ```
pub fn decode_payload(packet: &Packet, table: &FieldTable) -> Result<BTreeMap<String, FieldValue>> {
    let mut record = BTreeMap::new();
    for (name, spec) in table.iter() {
        let value = apply_rule(packet, spec).ok_or_else(|| DecodeError::RuleOutOfRange {
            field: name.to_string(),
        })?;
        record.insert(name.to_string(), value);
    }
    Ok(record)
}

/// Apply one rule to a packet, `None` if it addresses missing data.
fn apply_rule(packet: &Packet, spec: &FieldSpec) -> Option<FieldValue> {
    match spec {
        FieldSpec::Numeric {
            frame,
            bytes,
            multiplier,
            unsigned,
        } => {
            let raw = raw_number(packet, *frame, bytes, !*unsigned)?;
            Some(FieldValue::Number(raw as f64 * multiplier))
        }
        FieldSpec::Time { frame, offset } => {
            let high = offset.checked_add(1)?;
            let minutes = raw_number(packet, *frame, &[*offset, high], true)?;
            Some(FieldValue::Text(render_time(minutes)))
        }
        FieldSpec::Compound { parts } => {
            let mut total = 0.0;
            for part in parts {
                let raw = raw_number(packet, part.frame, &part.bytes, true)?;
                total += raw as f64 * part.multiplier;
            }
            Some(FieldValue::Number(total))
        }
        FieldSpec::Bitmask { frame, offset } => {
            let mask = raw_number(packet, *frame, &[*offset], false)?;
            Some(FieldValue::Text(format!("{mask:08b}")))
        }
    }
}

/// Reassemble an integer from addressed frame bytes.
///
/// Offsets are listed least significant first and only the final byte
/// carries the sign, matching the wire convention for sensor values.
/// An empty offset list reads as zero.
fn raw_number(packet: &Packet, frame: usize, offsets: &[usize], signed: bool) -> Option<i64> {
    let data = packet.frames.get(frame)?.data;
    let last = offsets.len().saturating_sub(1);
    let mut value = 0i64;
    for (position, &offset) in offsets.iter().enumerate() {
        // An i64 absorbs at most eight addressed bytes.
        if position >= 8 {
            return None;
        }
        let raw = i64::from(*data.get(offset)?);
        let byte = if signed && position == last && raw > 127 {
            raw - 256
        } else {
            raw
        };
        value += byte << (8 * position);
    }
    Some(value)
}

/// Render a signed minute counter as "hours:minutes".
fn render_time(minutes: i64) -> String {
    format!("{}:{}", minutes.div_euclid(60), minutes.rem_euclid(60))
}
