//! Data frames, packets, and the datagram stub.
//!
//! A version 1.0 packet carries its payload in 6-byte frames. Each frame
//! holds four septets (payload bytes with their most significant bit
//! stripped), one MSB extension byte that redistributes the stripped
//! bits, and a checksum. Unpacking restores the original 4 bytes.
//!
//! # Example
//!
//! ```
//! use vbus_stream::protocol::{Frame, Header, Packet};
//!
//! let frame = Frame::new([0x80, 0x10, 0x00, 0xFF]);
//! let wire = frame.pack();
//! assert_eq!(Frame::unpack(&wire, 1).unwrap(), frame);
//!
//! let mut packet = Packet::new(Header::new(0x0000, 0x0000, 0x0100, 1));
//! packet.decode_frames(&[0x10, 0x00, 0x00, 0x00, 0x00, 0x6F]).unwrap();
//! assert_eq!(packet.frames[0].data(), [0x10, 0x00, 0x00, 0x00]);
//! ```

use std::collections::BTreeMap;

use crate::error::{DecodeError, Result};
use crate::payload::{FieldTable, FieldValue};

use super::wire_format::{
    checksum, Header, FRAME_DATA_LENGTH, FRAME_LENGTH, PACKET_HEADER_LENGTH, SYNC_BYTE,
};

/// One unpacked data frame (4 payload bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    /// Payload bytes with their most significant bits restored.
    pub data: [u8; FRAME_DATA_LENGTH],
}

impl Frame {
    /// Create a frame from already unpacked payload bytes.
    pub fn new(data: [u8; FRAME_DATA_LENGTH]) -> Self {
        Self { data }
    }

    /// Unpack a frame from its 6-byte wire form.
    ///
    /// Verifies the trailing checksum, then restores the most
    /// significant bit of each septet from the extension byte. `number`
    /// is the 1-based position of this frame inside its packet and is
    /// only used in checksum error reports.
    ///
    /// # Panics
    ///
    /// Panics if `wire` is shorter than [`FRAME_LENGTH`].
    pub fn unpack(wire: &[u8], number: usize) -> Result<Self> {
        debug_assert!(wire.len() >= FRAME_LENGTH);
        let expected = wire[FRAME_LENGTH - 1];
        let calculated = checksum(&wire[..FRAME_LENGTH - 1]);
        if expected != calculated {
            return Err(DecodeError::FrameChecksumMismatch {
                index: number,
                expected,
                calculated,
            });
        }
        let extension = wire[FRAME_DATA_LENGTH];
        let mut data = [0u8; FRAME_DATA_LENGTH];
        for (bit, septet) in data.iter_mut().enumerate() {
            *septet = wire[bit] | if extension & (1 << bit) != 0 { 0x80 } else { 0x00 };
        }
        Ok(Self { data })
    }

    /// Pack the frame into its 6-byte wire form, checksum included.
    ///
    /// The inverse of [`Frame::unpack`]: strips the most significant bit
    /// of each payload byte into the extension byte so that no emitted
    /// byte can be mistaken for the sync byte.
    pub fn pack(&self) -> [u8; FRAME_LENGTH] {
        let mut wire = [0u8; FRAME_LENGTH];
        let mut extension = 0u8;
        for (bit, &byte) in self.data.iter().enumerate() {
            wire[bit] = byte & 0x7F;
            if byte & 0x80 != 0 {
                extension |= 1 << bit;
            }
        }
        wire[FRAME_DATA_LENGTH] = extension;
        wire[FRAME_LENGTH - 1] = checksum(&wire[..FRAME_LENGTH - 1]);
        wire
    }

    /// Get the unpacked payload bytes.
    #[inline]
    pub fn data(&self) -> [u8; FRAME_DATA_LENGTH] {
        self.data
    }
}

/// A complete version 1.0 packet: header plus unpacked data frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Decoded header.
    pub header: Header,
    /// Unpacked data frames, in wire order.
    pub frames: Vec<Frame>,
}

impl Packet {
    /// Create a packet whose frames have not been decoded yet.
    pub fn new(header: Header) -> Self {
        Self {
            frames: Vec::with_capacity(header.frame_count as usize),
            header,
        }
    }

    /// Decode the frame section that followed this packet's header.
    ///
    /// `data` must hold exactly `frame_count * 6` bytes. Every frame is
    /// checksum-verified and unpacked; on any failure the packet's frame
    /// list is left untouched.
    pub fn decode_frames(&mut self, data: &[u8]) -> Result<()> {
        let expected = self.header.frame_count as usize * FRAME_LENGTH;
        if data.len() != expected {
            return Err(DecodeError::FrameCountMismatch {
                expected,
                actual: data.len(),
            });
        }
        let mut frames = Vec::with_capacity(self.header.frame_count as usize);
        for (index, wire) in data.chunks_exact(FRAME_LENGTH).enumerate() {
            frames.push(Frame::unpack(wire, index + 1)?);
        }
        self.frames = frames;
        Ok(())
    }

    /// Interpret this packet's payload through a field table.
    ///
    /// Convenience wrapper around [`crate::payload::decode_payload`].
    pub fn decode_payload(&self, table: &FieldTable) -> Result<BTreeMap<String, FieldValue>> {
        crate::payload::decode_payload(self, table)
    }

    /// Check if every announced frame has been decoded.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.frames.len() == self.header.frame_count as usize
    }

    /// Get the destination address.
    #[inline]
    pub fn destination_address(&self) -> u16 {
        self.header.destination_address
    }

    /// Get the source address.
    #[inline]
    pub fn source_address(&self) -> u16 {
        self.header.source_address
    }

    /// Get the command identifier.
    #[inline]
    pub fn command(&self) -> u16 {
        self.header.command
    }

    /// Get the announced frame count.
    #[inline]
    pub fn frame_count(&self) -> u8 {
        self.header.frame_count
    }

    /// Check if this packet carries cyclic sensor data for a slave.
    #[inline]
    pub fn is_data_to_slave(&self) -> bool {
        self.header.is_data_to_slave()
    }
}

/// A version 2.0 datagram.
///
/// Datagram traffic is detected on the stream so that it does not
/// corrupt packet decoding, but its body is not interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Datagram;

impl Datagram {
    /// Decode a datagram from its 15-byte wire form.
    ///
    /// Always fails with [`DecodeError::DatagramNotImplemented`]; the
    /// type exists so version 0x20 traffic has a place to land once
    /// datagram decoding is built.
    pub fn decode(_raw: &[u8]) -> Result<Self> {
        Err(DecodeError::DatagramNotImplemented)
    }
}

/// Build a complete packet as a single byte vector.
///
/// Emits the sync byte, the encoded header, and every frame in wire
/// form. The header's frame count must match the number of frames.
///
/// # Example
///
/// ```
/// use vbus_stream::protocol::{build_packet, Frame, Header, SYNC_BYTE};
///
/// let header = Header::new(0x0010, 0x4221, 0x0100, 1);
/// let bytes = build_packet(&header, &[Frame::new([0xCD, 0x00, 0x00, 0x00])]);
/// assert_eq!(bytes.len(), 1 + 9 + 6);
/// assert_eq!(bytes[0], SYNC_BYTE);
/// ```
pub fn build_packet(header: &Header, frames: &[Frame]) -> Vec<u8> {
    debug_assert_eq!(header.frame_count as usize, frames.len());
    let mut buf = Vec::with_capacity(1 + PACKET_HEADER_LENGTH + frames.len() * FRAME_LENGTH);
    buf.push(SYNC_BYTE);
    buf.extend_from_slice(&header.encode());
    for frame in frames {
        buf.extend_from_slice(&frame.pack());
    }
    buf
}
