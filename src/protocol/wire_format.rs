//! Wire format constants, checksum, and header encoding/decoding.
//!
//! Implements the 9-byte packet header that follows the 0xAA sync byte:
//! ```text
//! ┌───────────┬───────────┬─────────┬───────────┬────────┬──────────┐
//! │ Dest addr │ Src addr  │ Version │ Command   │ Frames │ Checksum │
//! │ 2 bytes   │ 2 bytes   │ 1 byte  │ 2 bytes   │ 1 byte │ 1 byte   │
//! │ uint16 LE │ uint16 LE │         │ uint16 LE │        │          │
//! └───────────┴───────────┴─────────┴───────────┴────────┴──────────┘
//! ```
//!
//! All multi-byte integers are Little Endian. Every byte after the sync
//! byte keeps its most significant bit clear; the checksum covers the
//! eight bytes before it.

use crate::error::{DecodeError, Result};

/// Synchronization byte that starts every packet and datagram.
pub const SYNC_BYTE: u8 = 0xAA;

/// Bytes needed after sync before the protocol version is known.
pub const HEADER_STUB_LENGTH: usize = 5;

/// Version 1.0 packet header size in bytes, sync byte excluded.
pub const PACKET_HEADER_LENGTH: usize = 9;

/// Version 2.0 datagram header size in bytes, sync byte excluded.
pub const DATAGRAM_HEADER_LENGTH: usize = 15;

/// Data frame size on the wire (4 septets, MSB extension, checksum).
pub const FRAME_LENGTH: usize = 6;

/// Unpacked payload bytes carried by one frame.
pub const FRAME_DATA_LENGTH: usize = 4;

/// Largest possible frame section (the frame count octet maxes at 255).
pub const MAX_FRAME_SECTION_LENGTH: usize = 255 * FRAME_LENGTH;

/// Protocol version octet for version 1.0 packets.
pub const VERSION_PACKET: u8 = 0x10;

/// Protocol version octet for version 2.0 datagrams.
pub const VERSION_DATAGRAM: u8 = 0x20;

/// Protocol version octet for generation 3.0, recognized but unsupported.
pub const VERSION_PROTOCOL_3: u8 = 0x30;

/// Command used by controllers for cyclic sensor data addressed to a slave.
pub const COMMAND_DATA_TO_SLAVE: u16 = 0x0100;

/// Compute the VBus checksum of a byte run.
///
/// The checksum is the one's complement of the byte sum, truncated to
/// seven bits so it can never collide with the sync byte.
///
/// # Example
///
/// ```
/// use vbus_stream::protocol::checksum;
///
/// assert_eq!(checksum(&[0x00, 0x00, 0x00, 0x00, 0x10, 0x00, 0x01, 0x01]), 0x6D);
/// assert_eq!(checksum(&[]), 0x7F);
/// ```
pub fn checksum(data: &[u8]) -> u8 {
    let sum = data.iter().fold(0u8, |sum, &byte| sum.wrapping_add(byte));
    !sum & 0x7F
}

/// Decoded version 1.0 packet header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Address of the device the packet is directed at.
    pub destination_address: u16,
    /// Address of the device that sent the packet.
    pub source_address: u16,
    /// Protocol version octet (0x10 for decodable packets).
    pub protocol_version: u8,
    /// Command identifier (see [`COMMAND_DATA_TO_SLAVE`]).
    pub command: u16,
    /// Number of 6-byte data frames that follow the header.
    pub frame_count: u8,
}

impl Header {
    /// Create a new version 1.0 packet header.
    pub fn new(destination_address: u16, source_address: u16, command: u16, frame_count: u8) -> Self {
        Self {
            destination_address,
            source_address,
            protocol_version: VERSION_PACKET,
            command,
            frame_count,
        }
    }

    /// Encode the header to its 9-byte wire form, checksum included.
    ///
    /// # Example
    ///
    /// ```
    /// use vbus_stream::protocol::Header;
    ///
    /// let header = Header::new(0x0000, 0x0000, 0x0100, 1);
    /// assert_eq!(header.encode(), [0x00, 0x00, 0x00, 0x00, 0x10, 0x00, 0x01, 0x01, 0x6D]);
    /// ```
    pub fn encode(&self) -> [u8; PACKET_HEADER_LENGTH] {
        let mut buf = [0u8; PACKET_HEADER_LENGTH];
        buf[0..2].copy_from_slice(&self.destination_address.to_le_bytes());
        buf[2..4].copy_from_slice(&self.source_address.to_le_bytes());
        buf[4] = self.protocol_version;
        buf[5..7].copy_from_slice(&self.command.to_le_bytes());
        buf[7] = self.frame_count;
        buf[8] = checksum(&buf[..PACKET_HEADER_LENGTH - 1]);
        buf
    }

    /// Decode a header from its 9-byte wire form (Little Endian).
    ///
    /// The trailing checksum octet is verified against the eight bytes
    /// before it.
    ///
    /// # Panics
    ///
    /// Panics if `raw` is shorter than [`PACKET_HEADER_LENGTH`].
    ///
    /// # Example
    ///
    /// ```
    /// use vbus_stream::protocol::Header;
    ///
    /// let raw = [0x00, 0x00, 0x00, 0x00, 0x10, 0x00, 0x01, 0x01, 0x6D];
    /// let header = Header::decode(&raw).unwrap();
    /// assert_eq!(header.command, 0x0100);
    /// assert_eq!(header.frame_count, 1);
    /// ```
    pub fn decode(raw: &[u8]) -> Result<Self> {
        debug_assert!(raw.len() >= PACKET_HEADER_LENGTH);
        let expected = raw[PACKET_HEADER_LENGTH - 1];
        let calculated = checksum(&raw[..PACKET_HEADER_LENGTH - 1]);
        if expected != calculated {
            return Err(DecodeError::HeaderChecksumMismatch {
                expected,
                calculated,
            });
        }
        Ok(Self {
            destination_address: u16::from_le_bytes([raw[0], raw[1]]),
            source_address: u16::from_le_bytes([raw[2], raw[3]]),
            protocol_version: raw[4],
            command: u16::from_le_bytes([raw[5], raw[6]]),
            frame_count: raw[7],
        })
    }

    /// Check if this packet carries cyclic sensor data for a slave.
    #[inline]
    pub fn is_data_to_slave(&self) -> bool {
        self.command == COMMAND_DATA_TO_SLAVE
    }
}
