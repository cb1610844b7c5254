//! Emit a synthetic VBus byte stream to stdout.
//!
//! Generates a run of checksum-valid sensor packets with slowly varying
//! readings, plus the occasional burst of line noise, so the
//! decode_file demo has something realistic to chew on:
//!
//! ```text
//! synth_stream > capture.bin
//! decode_file capture.bin
//! ```

use std::io::{self, Write};

use vbus_stream::protocol::{build_packet, Frame, Header, COMMAND_DATA_TO_SLAVE};

/// Frames for one cyclic packet: sensors S1-S4, pump speeds, relay and
/// error masks, clock, and energy counters.
fn sensor_frames(step: u16) -> [Frame; 7] {
    let s1 = 200 + step;
    let s2 = 480 + 2 * step;
    let s3 = 0xFFFF_u16;
    let s4 = 163;
    let minutes = 8 * 60 + step;
    [
        Frame::new([s1 as u8, (s1 >> 8) as u8, s2 as u8, (s2 >> 8) as u8]),
        Frame::new([s3 as u8, (s3 >> 8) as u8, s4 as u8, (s4 >> 8) as u8]),
        Frame::new([0x64, 0x00, 0x05, 0x00]),
        Frame::new([minutes as u8, (minutes >> 8) as u8, 0x00, 0x00]),
        Frame::new([0x00, 0x00, 0x00, 0x00]),
        Frame::new([0x0A, 0x00, 0x02, 0x00]),
        Frame::new([0x01, 0x00, 0x00, 0x00]),
    ]
}

fn main() -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    for step in 0..16u16 {
        let frames = sensor_frames(step);
        let header = Header::new(0x0010, 0x4221, COMMAND_DATA_TO_SLAVE, frames.len() as u8);
        out.write_all(&build_packet(&header, &frames))?;

        // Line noise between packets; the decoder skips it.
        if step % 5 == 4 {
            out.write_all(&[0x00, 0x13, 0x7F])?;
        }
    }

    out.flush()
}
