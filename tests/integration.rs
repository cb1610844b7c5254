//! Integration tests for vbus-stream.
//!
//! These tests run the full pipeline: synthesized controller traffic in,
//! chunked feeds through the stream decoder, field-table interpretation
//! out to JSON records.

use vbus_stream::protocol::{build_packet, Frame, Header, COMMAND_DATA_TO_SLAVE};
use vbus_stream::{DecodeError, DecodeEvent, FieldTable, StreamDecoder};

/// Field table for a two-collector solar station: four sensors, two
/// pump speeds, relay and error masks, a clock, and a split energy
/// counter.
const STATION_TABLE: &str = r#"{
    "S1": {"type": "numeric", "frame": 0, "bytes": [0, 1], "multiplier": 0.1},
    "S2": {"type": "numeric", "frame": 0, "bytes": [2, 3], "multiplier": 0.1},
    "S3": {"type": "numeric", "frame": 1, "bytes": [0, 1], "multiplier": 0.1},
    "S4": {"type": "numeric", "frame": 1, "bytes": [2, 3], "multiplier": 0.1},
    "Speed1": {"type": "numeric", "frame": 2, "bytes": [0], "multiplier": 1},
    "Speed2": {"type": "numeric", "frame": 2, "bytes": [1], "multiplier": 1},
    "Relays": {"type": "bitmask", "frame": 2, "offset": 2},
    "Errors": {"type": "bitmask", "frame": 2, "offset": 3},
    "Time": {"type": "time", "frame": 3, "offset": 0},
    "Energy": {"type": "compound", "parts": [
        {"frame": 5, "bytes": [0, 1], "multiplier": 1},
        {"frame": 5, "bytes": [2, 3], "multiplier": 1000},
        {"frame": 6, "bytes": [0, 1], "multiplier": 1000000}
    ]}
}"#;

fn station_table() -> FieldTable {
    FieldTable::from_json(STATION_TABLE).unwrap()
}

/// Synthesize one cyclic sensor packet for the station table:
/// S1 20.5, S2 32.0, S3 -0.1, S4 1.6, pump 1 at 100%, relays 00000101,
/// clock at 125 minutes, energy 1 MWh + 2 kWh + 10 Wh.
fn station_packet() -> Vec<u8> {
    let frames = [
        Frame::new([0xCD, 0x00, 0x40, 0x01]),
        Frame::new([0xFF, 0xFF, 0x10, 0x00]),
        Frame::new([0x64, 0x00, 0x05, 0x00]),
        Frame::new([0x7D, 0x00, 0x00, 0x00]),
        Frame::new([0x00, 0x00, 0x00, 0x00]),
        Frame::new([0x0A, 0x00, 0x02, 0x00]),
        Frame::new([0x01, 0x00, 0x00, 0x00]),
    ];
    let header = Header::new(0x0010, 0x4221, COMMAND_DATA_TO_SLAVE, frames.len() as u8);
    build_packet(&header, &frames)
}

fn packets_of(events: Vec<DecodeEvent>) -> Vec<vbus_stream::Packet> {
    events
        .into_iter()
        .filter_map(|event| match event {
            DecodeEvent::Packet(packet) => Some(packet),
            _ => None,
        })
        .collect()
}

/// Test the full path from stream bytes to a JSON record.
#[test]
fn test_stream_to_json_record() {
    let mut decoder = StreamDecoder::new();
    let packets = packets_of(decoder.feed(&station_packet()));
    assert_eq!(packets.len(), 1);

    let record = packets[0].decode_payload(&station_table()).unwrap();
    let json = serde_json::to_string(&record).unwrap();
    assert_eq!(
        json,
        r#"{"Energy":1002010.0,"Errors":"00000000","Relays":"00000101","S1":20.5,"S2":32.0,"S3":-0.1,"S4":1.6,"Speed1":100.0,"Speed2":0.0,"Time":"2:5"}"#
    );
}

/// Test the canonical minimal stream: a command 0x0100 header followed
/// by one all-zero frame, both with hand-checked checksums.
#[test]
fn test_minimal_packet_end_to_end() {
    // Header byte sum is 0x12, so the checksum octet is 0x6D; the
    // all-zero frame checksums to 0x7F.
    let stream = [
        0xAA, 0x00, 0x00, 0x00, 0x00, 0x10, 0x00, 0x01, 0x01, 0x6D, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x7F,
    ];
    let table = FieldTable::from_json(
        r#"{"S1": {"type": "numeric", "frame": 0, "bytes": [0, 1], "multiplier": 0.1}}"#,
    )
    .unwrap();

    let mut decoder = StreamDecoder::new();
    let packets = packets_of(decoder.feed(&stream));
    assert_eq!(packets.len(), 1);
    assert_eq!(packets[0].destination_address(), 0x0000);
    assert_eq!(packets[0].source_address(), 0x0000);
    assert_eq!(packets[0].command(), 0x0100);
    assert_eq!(packets[0].frame_count(), 1);
    assert_eq!(packets[0].frames[0].data(), [0x00, 0x00, 0x00, 0x00]);

    let record = packets[0].decode_payload(&table).unwrap();
    assert_eq!(record["S1"].as_number(), Some(0.0));
}

/// Test that serial-style chunked reads decode identically to one feed.
#[test]
fn test_chunked_serial_reads() {
    let stream = station_packet();

    let mut whole = StreamDecoder::new();
    let reference = packets_of(whole.feed(&stream));

    let mut decoder = StreamDecoder::new();
    let mut packets = Vec::new();
    for chunk in stream.chunks(5) {
        packets.extend(packets_of(decoder.feed(chunk)));
    }

    assert_eq!(packets, reference);
}

/// Test byte-at-a-time feeding through the whole pipeline.
#[test]
fn test_byte_at_a_time_full_pipeline() {
    let stream = station_packet();
    let mut decoder = StreamDecoder::new();

    let mut packets = Vec::new();
    for &byte in &stream {
        packets.extend(packets_of(decoder.feed(&[byte])));
    }

    assert_eq!(packets.len(), 1);
    let record = packets[0].decode_payload(&station_table()).unwrap();
    assert_eq!(record["S1"].as_number(), Some(20.5));
    assert_eq!(record["Time"].as_text(), Some("2:5"));
}

/// Test filtering decoded packets on the cyclic data command before
/// interpretation, the way a logger consumes a live bus.
#[test]
fn test_command_filtering_flow() {
    let mut stream = station_packet();
    // A second packet with a different command; its single frame does
    // not fit the station table and must never reach interpretation.
    let other = build_packet(
        &Header::new(0x0010, 0x4221, 0x0200, 1),
        &[Frame::new([0x01, 0x02, 0x03, 0x04])],
    );
    stream.extend_from_slice(&other);
    stream.extend_from_slice(&station_packet());

    let table = station_table();
    let mut decoder = StreamDecoder::new();
    let mut records = Vec::new();
    for packet in packets_of(decoder.feed(&stream)) {
        if packet.is_data_to_slave() {
            records.push(packet.decode_payload(&table).unwrap());
        }
    }

    assert_eq!(records.len(), 2);
    assert_eq!(records[0], records[1]);
}

/// Test that a corrupted burst between packets is reported and skipped.
#[test]
fn test_corrupted_capture_recovers() {
    let mut stream = station_packet();
    // A fake sync followed by a stub with a bogus version octet.
    stream.extend_from_slice(&[0xAA, 0x01, 0x02, 0x03, 0x04, 0x55]);
    stream.extend_from_slice(&station_packet());

    let mut decoder = StreamDecoder::new();
    let events = decoder.feed(&stream);

    assert_eq!(events.len(), 3);
    assert!(matches!(events[0], DecodeEvent::Packet(_)));
    assert_eq!(
        events[1],
        DecodeEvent::Error(DecodeError::UnrecognizedProtocolVersion(0x55))
    );
    assert!(matches!(events[2], DecodeEvent::Packet(_)));
}

/// Test that datagram traffic between packets surfaces as an error
/// event without breaking packet decoding around it.
#[test]
fn test_datagram_traffic_is_flagged_not_fatal() {
    let mut stream = station_packet();
    let mut datagram = vec![0xAA, 0x00, 0x00, 0x00, 0x00, 0x20];
    datagram.extend_from_slice(&[0x00; 10]);
    stream.extend_from_slice(&datagram);
    stream.extend_from_slice(&station_packet());

    let mut decoder = StreamDecoder::new();
    let events = decoder.feed(&stream);

    assert_eq!(events.len(), 3);
    assert!(matches!(events[0], DecodeEvent::Packet(_)));
    assert_eq!(
        events[1],
        DecodeEvent::Error(DecodeError::DatagramNotImplemented)
    );
    assert!(matches!(events[2], DecodeEvent::Packet(_)));
}

/// Test that interpreter arithmetic matches reference scaling for
/// values whose decimal form is not exactly representable.
#[test]
fn test_scaled_values_match_reference_math() {
    // S2 raw 483, S4 raw 8888.
    let frames = [
        Frame::new([0x00, 0x00, 0xE3, 0x01]),
        Frame::new([0x00, 0x00, 0xB8, 0x22]),
    ];
    let header = Header::new(0x0010, 0x4221, COMMAND_DATA_TO_SLAVE, 2);
    let stream = build_packet(&header, &frames);

    let table = FieldTable::from_json(
        r#"{
            "S2": {"type": "numeric", "frame": 0, "bytes": [2, 3], "multiplier": 0.1},
            "S4": {"type": "numeric", "frame": 1, "bytes": [2, 3], "multiplier": 0.1}
        }"#,
    )
    .unwrap();

    let mut decoder = StreamDecoder::new();
    let packets = packets_of(decoder.feed(&stream));
    let record = packets[0].decode_payload(&table).unwrap();

    assert_eq!(record["S2"].as_number(), Some(483.0 * 0.1));
    assert_eq!(record["S4"].as_number(), Some(8888.0 * 0.1));
}
