//! LabelWriter raster command stream.
//!
//! A print job is a synchronization prefix, a fixed header describing the
//! label geometry and quality, then every raster line of every copy framed
//! by a `SYN` byte, each copy closed by a form feed.

use log::debug;

use crate::{bitmap::Bitmap, error::Error};

const ESC: u8 = 0x1B;
const SYN: u8 = 0x16;

/// Number of `ESC` bytes sent before the reset.
///
/// Must exceed the longest raster line the firmware may still be waiting
/// for (84 bytes), so the printer falls back to command parsing.
pub const SYNC_LENGTH: usize = 313;

pub const RESET: [u8; 2] = [ESC, b'@'];
pub const DOT_TAB: [u8; 2] = [ESC, b'B'];
pub const BYTES_PER_LINE: [u8; 2] = [ESC, b'D'];
pub const LABEL_LENGTH: [u8; 2] = [ESC, b'L'];
/// 300x300 dpi text quality.
pub const TEXT_SPEED_MODE: [u8; 2] = [ESC, b'h'];
pub const DENSITY_NORMAL: [u8; 2] = [ESC, b'e'];
/// Feed to tear-off position, ends the job.
pub const FORM_FEED: [u8; 2] = [ESC, b'E'];
/// Feed to the start of the next label.
pub const SHORT_FORM_FEED: [u8; 2] = [ESC, b'G'];
pub const RASTER_LINE: u8 = SYN;

const MAX_BYTES_PER_LINE: usize = u8::MAX as usize;
const MAX_LABEL_LENGTH: usize = u16::MAX as usize;

/// Build the complete command stream for `copies` prints of `bitmap`.
///
/// The result depends only on the arguments, encoding the same bitmap twice
/// yields identical bytes. Nothing is produced when validation fails.
pub fn encode(bitmap: &Bitmap, copies: u32) -> Result<Vec<u8>, Error> {
    if bitmap.is_empty() {
        return Err(Error::InvalidArgument("bitmap has no pixels".to_string()));
    }
    if copies == 0 {
        return Err(Error::InvalidArgument(
            "copies must be at least 1".to_string(),
        ));
    }

    let geometry = bitmap.geometry();
    let line_width = geometry.line_width_bytes();
    if line_width > MAX_BYTES_PER_LINE {
        return Err(Error::ProtocolConstraint {
            field: "bytes per line",
            value: line_width,
            max: MAX_BYTES_PER_LINE,
        });
    }
    if geometry.line_count > MAX_LABEL_LENGTH {
        return Err(Error::ProtocolConstraint {
            field: "label length",
            value: geometry.line_count,
            max: MAX_LABEL_LENGTH,
        });
    }

    let line_count = geometry.line_count as u16;
    let mut buf: Vec<u8> = Vec::with_capacity(
        SYNC_LENGTH + 16 + (line_width + 1) * geometry.line_count * copies as usize,
    );

    buf.append(&mut [ESC; SYNC_LENGTH].to_vec());
    buf.extend_from_slice(&RESET);
    buf.extend_from_slice(&DOT_TAB); // ESC B : Set dot tab
    buf.push(0x00);
    buf.extend_from_slice(&BYTES_PER_LINE); // ESC D : Set bytes per line
    buf.push(line_width as u8);
    buf.extend_from_slice(&LABEL_LENGTH); // ESC L : Set label length
    buf.extend_from_slice(&line_count.to_be_bytes());
    buf.extend_from_slice(&TEXT_SPEED_MODE);
    buf.extend_from_slice(&DENSITY_NORMAL);

    debug!(
        "label geometry: {} bytes per line, {} lines, {} copies",
        line_width, line_count, copies
    );

    for copy in 1..=copies {
        for row in bitmap.rows() {
            buf.push(RASTER_LINE);
            buf.extend_from_slice(row);
        }
        if copy == copies {
            buf.extend_from_slice(&FORM_FEED);
        } else {
            buf.extend_from_slice(&SHORT_FORM_FEED);
        }
    }

    debug!("command buffer is {} bytes", buf.len());
    Ok(buf)
}
