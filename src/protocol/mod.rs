//! Protocol module - wire format, framing, and the stream decoder.
//!
//! This module implements the receive side of the VBus wire protocol:
//! - 9-byte header encoding/decoding with 7-bit checksums
//! - Septet frame packing/unpacking via the MSB extension byte
//! - Incremental stream decoder that survives arbitrary chunking

mod decoder;
mod frame;
mod wire_format;

pub use decoder::{DecodeEvent, StreamDecoder};
pub use frame::{build_packet, Datagram, Frame, Packet};
pub use wire_format::{
    checksum, Header, COMMAND_DATA_TO_SLAVE, DATAGRAM_HEADER_LENGTH, FRAME_DATA_LENGTH,
    FRAME_LENGTH, HEADER_STUB_LENGTH, MAX_FRAME_SECTION_LENGTH, PACKET_HEADER_LENGTH, SYNC_BYTE,
    VERSION_DATAGRAM, VERSION_PACKET, VERSION_PROTOCOL_3,
};
