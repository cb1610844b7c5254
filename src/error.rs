//! Error types for vbus-stream.

use thiserror::Error;

/// Main error type for all VBus decoding operations.
///
/// Stream-level faults (framing, checksums, version detection) are also
/// carried inside [`DecodeEvent::Error`](crate::protocol::DecodeEvent), so
/// the enum is cheap to clone and compare.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// A non-sync byte with the most significant bit set arrived where
    /// payload septets were expected.
    #[error("Received a byte with MSB set: 0x{0:02X}")]
    FramingError(u8),

    /// Protocol version 0x30 was detected. The version is recognized but
    /// decoding it is out of scope.
    #[error("Protocol version 3.0 is not supported")]
    UnsupportedProtocolVersion,

    /// The version octet matched no known protocol generation.
    #[error("Unrecognized protocol version: 0x{0:02X}")]
    UnrecognizedProtocolVersion(u8),

    /// The packet header checksum did not match the received octet.
    #[error("Checksum mismatch: 0x{expected:02X} != 0x{calculated:02X}")]
    HeaderChecksumMismatch {
        /// Checksum octet taken from the wire.
        expected: u8,
        /// Checksum computed over the received header bytes.
        calculated: u8,
    },

    /// The frame section length does not match the header's frame count.
    #[error("Frame count and amount of data do not match: expected {expected} bytes, got {actual}")]
    FrameCountMismatch {
        /// Byte length implied by the header's frame count.
        expected: usize,
        /// Byte length actually supplied.
        actual: usize,
    },

    /// A data frame failed its checksum.
    #[error("Checksum mismatch in frame {index}: 0x{expected:02X} != 0x{calculated:02X}")]
    FrameChecksumMismatch {
        /// 1-based frame number within the packet.
        index: usize,
        /// Checksum octet taken from the wire.
        expected: u8,
        /// Checksum computed over the received frame bytes.
        calculated: u8,
    },

    /// Version 0x20 traffic was routed to the datagram path, which is a
    /// declared stub.
    #[error("VBus datagrams are not supported yet")]
    DatagramNotImplemented,

    /// A field rule addressed a frame or byte offset outside the packet.
    #[error("Field rule '{field}' addresses data outside the packet")]
    RuleOutOfRange {
        /// Name of the offending field table entry.
        field: String,
    },
}

/// Result type alias using DecodeError.
pub type Result<T> = std::result::Result<T, DecodeError>;
