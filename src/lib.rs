//! # vbus-stream
//!
//! Streaming decoder for the VBus protocol spoken by solar-thermal
//! controllers over their serial telemetry port.
//!
//! The crate takes the raw byte stream as it arrives (from a serial
//! device, socket, or capture file, in chunks of any size), recovers
//! checksum-verified packets from it, and interprets their payloads
//! through declarative field tables into named sensor values.
//!
//! ## Architecture
//!
//! - **Protocol layer**: sync-byte framing, the 9-byte header, septet
//!   frame unpacking, and the incremental [`StreamDecoder`]
//! - **Payload layer**: JSON field tables mapping frame bytes to named,
//!   scaled values
//!
//! ## Example
//!
//! ```
//! use vbus_stream::{DecodeEvent, FieldTable, StreamDecoder};
//!
//! let table = FieldTable::from_json(
//!     r#"{"S1": {"type": "numeric", "frame": 0, "bytes": [0, 1], "multiplier": 0.1}}"#,
//! )
//! .unwrap();
//!
//! let stream = [
//!     0xAA, 0x00, 0x00, 0x00, 0x00, 0x10, 0x00, 0x01, 0x01, 0x6D,
//!     0x10, 0x00, 0x00, 0x00, 0x00, 0x6F,
//! ];
//!
//! let mut decoder = StreamDecoder::new();
//! for event in decoder.feed(&stream) {
//!     if let DecodeEvent::Packet(packet) = event {
//!         let record = packet.decode_payload(&table).unwrap();
//!         assert_eq!(record["S1"].as_number(), Some(1.6));
//!     }
//! }
//! ```

pub mod error;
pub mod payload;
pub mod protocol;

pub use error::DecodeError;
pub use payload::{FieldSpec, FieldTable, FieldValue};
pub use protocol::{DecodeEvent, Frame, Header, Packet, StreamDecoder};
