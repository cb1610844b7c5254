//! Decode a VBus capture file or character device into JSON records.
//!
//! Reads the stream in 512-byte chunks, decodes packets, filters for
//! cyclic sensor data, and prints one JSON record per packet. Without a
//! table argument a two-collector solar station layout is assumed; any
//! field table JSON file can be supplied instead.
//!
//! ```text
//! decode_file <capture-or-device> [field-table.json]
//! RUST_LOG=vbus_stream=debug decode_file /dev/ttyUSB0
//! ```

use std::env;
use std::fs::File;
use std::io::Read;

use vbus_stream::{DecodeEvent, FieldTable, StreamDecoder};

/// Field table for a two-collector solar station.
const DEFAULT_TABLE: &str = r#"{
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

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut args = env::args().skip(1);
    let path = args
        .next()
        .ok_or("usage: decode_file <capture-or-device> [field-table.json]")?;
    let table = match args.next() {
        Some(table_path) => FieldTable::from_json(&std::fs::read_to_string(table_path)?)?,
        None => FieldTable::from_json(DEFAULT_TABLE)?,
    };

    let mut source = File::open(&path)?;
    let mut decoder = StreamDecoder::new();
    let mut chunk = [0u8; 512];

    loop {
        let read = source.read(&mut chunk)?;
        if read == 0 {
            break;
        }
        for event in decoder.feed(&chunk[..read]) {
            match event {
                DecodeEvent::Packet(packet) if packet.is_data_to_slave() => {
                    let record = packet.decode_payload(&table)?;
                    println!("{}", serde_json::to_string(&record)?);
                }
                DecodeEvent::Packet(packet) => {
                    tracing::debug!("Ignoring packet with command 0x{:04X}", packet.command());
                }
                DecodeEvent::Datagram(_) => {}
                DecodeEvent::Error(error) => {
                    tracing::warn!("Stream fault: {}", error);
                }
            }
        }
    }

    Ok(())
}
