//! Incremental decoder for the raw VBus byte stream.
//!
//! Implements a per-byte state machine anchored on the 0xAA sync byte:
//! - `WaitSync`: discard bytes until a sync byte arrives
//! - `DetectHeaderType`: read 5 bytes, dispatch on the version octet
//! - `DecodeHeader1`: validate the 9-byte version 1.0 packet header
//! - `DecodeHeader2`: hand the 15-byte datagram header to the stub
//! - `DecodeFrames`: collect and unpack `frame_count` data frames
//!
//! A sync byte restarts header detection from any state, and a byte
//! with its MSB set is a framing error in any state, so the decoder
//! recovers from corruption at the next packet boundary.
//!
//! # Example
//!
//! ```
//! use vbus_stream::protocol::{DecodeEvent, StreamDecoder};
//!
//! let mut decoder = StreamDecoder::new();
//! let stream = [
//!     0xAA, 0x00, 0x00, 0x00, 0x00, 0x10, 0x00, 0x01, 0x01, 0x6D,
//!     0x10, 0x00, 0x00, 0x00, 0x00, 0x6F,
//! ];
//!
//! // Chunk boundaries are arbitrary; state survives across calls.
//! let mut events = decoder.feed(&stream[..7]);
//! events.extend(decoder.feed(&stream[7..]));
//!
//! assert_eq!(events.len(), 1);
//! assert!(matches!(events[0], DecodeEvent::Packet(_)));
//! ```

use bytes::{BufMut, BytesMut};

use super::frame::{Datagram, Packet};
use super::wire_format::{
    Header, DATAGRAM_HEADER_LENGTH, FRAME_LENGTH, HEADER_STUB_LENGTH, MAX_FRAME_SECTION_LENGTH,
    PACKET_HEADER_LENGTH, SYNC_BYTE, VERSION_DATAGRAM, VERSION_PACKET, VERSION_PROTOCOL_3,
};
use crate::error::DecodeError;

/// State machine for stream decoding.
#[derive(Debug, Clone)]
enum State {
    /// Discarding bytes until a sync byte arrives.
    WaitSync,
    /// Sync seen, accumulating the 5 bytes that carry the version octet.
    DetectHeaderType,
    /// Version 0x10 detected, accumulating the 9-byte packet header.
    DecodeHeader1,
    /// Version 0x20 detected, accumulating the 15-byte datagram header.
    DecodeHeader2,
    /// Header accepted, accumulating the pending packet's frame section.
    DecodeFrames { pending: Packet },
}

/// Event emitted by [`StreamDecoder::feed`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeEvent {
    /// A packet passed every checksum and was fully unpacked.
    Packet(Packet),
    /// A datagram was decoded. Never produced while [`Datagram`] stays a
    /// stub; version 0x20 traffic surfaces as an error instead.
    Datagram(Datagram),
    /// A stream-level fault. The decoder has already resynchronized, so
    /// feeding may simply continue.
    Error(DecodeError),
}

/// Incremental decoder for a raw VBus byte stream.
///
/// Bytes are pushed in with [`feed`](Self::feed) in whatever chunks the
/// transport delivers; decoding state survives across calls. Completed
/// packets and stream faults come back as [`DecodeEvent`]s in wire
/// order, so a dropped byte corrupts at most the packet it belongs to.
pub struct StreamDecoder {
    /// Bytes accumulated for the current header or frame section.
    buf: BytesMut,
    /// Current decoding state.
    state: State,
}

impl StreamDecoder {
    /// Create a decoder waiting for the first sync byte.
    ///
    /// The internal buffer is sized for the largest possible frame
    /// section, so steady-state decoding does not reallocate.
    pub fn new() -> Self {
        Self {
            buf: BytesMut::with_capacity(MAX_FRAME_SECTION_LENGTH),
            state: State::WaitSync,
        }
    }

    /// Feed a chunk of raw stream bytes and collect decode events.
    ///
    /// This is the main API for processing incoming data. The chunk may
    /// split headers and frames at any position, down to one byte per
    /// call; partial input is buffered internally for the next feed.
    ///
    /// # Arguments
    ///
    /// * `data` - Raw bytes from the serial port, socket, or capture
    ///
    /// # Returns
    ///
    /// Every packet, datagram, and fault completed by this chunk, in
    /// wire order (may be empty while a packet is still in flight).
    pub fn feed(&mut self, data: &[u8]) -> Vec<DecodeEvent> {
        let mut events = Vec::new();
        for &byte in data {
            self.feed_byte(byte, &mut events);
        }
        events
    }

    /// Advance the state machine by one byte.
    fn feed_byte(&mut self, byte: u8, events: &mut Vec<DecodeEvent>) {
        // A sync byte restarts header detection from any state; an
        // unfinished packet is abandoned without an event.
        if byte == SYNC_BYTE {
            tracing::trace!("Sync byte received, restarting header detection");
            self.buf.clear();
            self.state = State::DetectHeaderType;
            return;
        }

        // Every non-sync byte on the wire keeps its MSB clear.
        if byte & 0x80 != 0 {
            tracing::debug!("Framing error: byte 0x{:02X} has MSB set", byte);
            self.buf.clear();
            self.state = State::WaitSync;
            events.push(DecodeEvent::Error(DecodeError::FramingError(byte)));
            return;
        }

        let state = std::mem::replace(&mut self.state, State::WaitSync);
        self.state = match state {
            State::WaitSync => State::WaitSync,
            State::DetectHeaderType => {
                self.buf.put_u8(byte);
                if self.buf.len() < HEADER_STUB_LENGTH {
                    State::DetectHeaderType
                } else {
                    self.detect_header_type(events)
                }
            }
            State::DecodeHeader1 => {
                self.buf.put_u8(byte);
                if self.buf.len() < PACKET_HEADER_LENGTH {
                    State::DecodeHeader1
                } else {
                    self.decode_packet_header(events)
                }
            }
            State::DecodeHeader2 => {
                self.buf.put_u8(byte);
                if self.buf.len() < DATAGRAM_HEADER_LENGTH {
                    State::DecodeHeader2
                } else {
                    self.decode_datagram_header(events)
                }
            }
            State::DecodeFrames { pending } => {
                self.buf.put_u8(byte);
                if self.buf.len() < pending.header.frame_count as usize * FRAME_LENGTH {
                    State::DecodeFrames { pending }
                } else {
                    self.decode_frame_section(pending, events)
                }
            }
        };
    }

    /// Dispatch on the version octet once the header stub is complete.
    ///
    /// The buffered stub bytes are kept when a longer header follows,
    /// since the header checksum covers them too.
    fn detect_header_type(&mut self, events: &mut Vec<DecodeEvent>) -> State {
        match self.buf[HEADER_STUB_LENGTH - 1] {
            VERSION_PACKET => State::DecodeHeader1,
            VERSION_DATAGRAM => State::DecodeHeader2,
            VERSION_PROTOCOL_3 => {
                self.buf.clear();
                events.push(DecodeEvent::Error(DecodeError::UnsupportedProtocolVersion));
                State::WaitSync
            }
            version => {
                self.buf.clear();
                events.push(DecodeEvent::Error(DecodeError::UnrecognizedProtocolVersion(
                    version,
                )));
                State::WaitSync
            }
        }
    }

    /// Validate a complete 9-byte packet header.
    fn decode_packet_header(&mut self, events: &mut Vec<DecodeEvent>) -> State {
        let decoded = Header::decode(&self.buf);
        self.buf.clear();
        match decoded {
            Ok(header) => {
                tracing::trace!(
                    "Accepted packet header: source 0x{:04X}, command 0x{:04X}, {} frames",
                    header.source_address,
                    header.command,
                    header.frame_count
                );
                let pending = Packet::new(header);
                if header.frame_count == 0 {
                    // No frame bytes follow, the packet is already complete.
                    events.push(DecodeEvent::Packet(pending));
                    State::WaitSync
                } else {
                    State::DecodeFrames { pending }
                }
            }
            Err(error) => {
                tracing::debug!("Discarding packet header: {}", error);
                events.push(DecodeEvent::Error(error));
                State::WaitSync
            }
        }
    }

    /// Unpack a complete frame section into the pending packet.
    fn decode_frame_section(
        &mut self,
        mut pending: Packet,
        events: &mut Vec<DecodeEvent>,
    ) -> State {
        let result = pending.decode_frames(&self.buf);
        self.buf.clear();
        match result {
            Ok(()) => {
                tracing::debug!(
                    "Decoded packet: command 0x{:04X}, {} frames",
                    pending.header.command,
                    pending.frames.len()
                );
                events.push(DecodeEvent::Packet(pending));
            }
            Err(error) => {
                tracing::debug!("Discarding packet: {}", error);
                events.push(DecodeEvent::Error(error));
            }
        }
        State::WaitSync
    }

    /// Hand a complete 15-byte datagram header to the datagram stub.
    fn decode_datagram_header(&mut self, events: &mut Vec<DecodeEvent>) -> State {
        let decoded = Datagram::decode(&self.buf);
        self.buf.clear();
        match decoded {
            Ok(datagram) => events.push(DecodeEvent::Datagram(datagram)),
            Err(error) => events.push(DecodeEvent::Error(error)),
        }
        State::WaitSync
    }

    /// Drop any partial input and return to sync scanning.
    pub fn clear(&mut self) {
        self.buf.clear();
        self.state = State::WaitSync;
    }

    /// Get the current state for debugging.
    #[cfg(test)]
    fn state_name(&self) -> &'static str {
        match &self.state {
            State::WaitSync => "WaitSync",
            State::DetectHeaderType => "DetectHeaderType",
            State::DecodeHeader1 => "DecodeHeader1",
            State::DecodeHeader2 => "DecodeHeader2",
            State::DecodeFrames { .. } => "DecodeFrames",
        }
    }
}

impl Default for StreamDecoder {
    fn default() -> Self {
        Self::new()
    }
}
