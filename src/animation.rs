//! Animated GIF / WebP detection from raw bytes.
//!
//! No frames are decoded. Both checks look at container structure only:
//!
//! - **WebP**: an extended (`VP8X`) header at offset 12 whose flag byte at
//!   offset 20 has the animation bit (`0x02`) set.
//! - **GIF**: at least two graphic control extensions directly followed by an
//!   image descriptor or another extension, i.e. non-overlapping matches of
//!   `00 21 F9 04 ?? ?? ?? ?? 00 (2C|21)`.
//!
//! File-backed records are never read whole: WebP needs 21 bytes and the GIF
//! scan walks 100 KiB windows until it has seen two frames.

use crate::error::Result;
use crate::format::ImageFormat;
use crate::manager::ImageManager;
use crate::record::{ImageData, ImageRecord};
use std::io::{self, Read};

/// GIF scan window for file-backed records.
pub const GIF_WINDOW: u64 = 100 * 1024;

/// Bytes of a WebP file needed to read the `VP8X` flags.
const WEBP_HEADER_LEN: u64 = 21;

/// Length of one frame marker.
const GCE_MARKER_LEN: usize = 10;

pub fn is_animated(format: ImageFormat, bytes: &[u8]) -> bool {
    match format {
        ImageFormat::Webp => webp_is_animated(bytes),
        ImageFormat::Gif => count_gif_frames(bytes) >= 2,
        _ => false,
    }
}

pub fn webp_is_animated(header: &[u8]) -> bool {
    header.get(12..16) == Some(b"VP8X".as_slice())
        && header.get(20).is_some_and(|flags| flags & 0x02 != 0)
}

fn is_gce_marker(window: &[u8]) -> bool {
    matches!(
        window,
        [0x00, 0x21, 0xF9, 0x04, _, _, _, _, 0x00, 0x2C | 0x21, ..]
    )
}

/// Count non-overlapping frame markers. Returns the count and the offset just
/// past the last match (0 when nothing matched).
fn scan_gif_markers(bytes: &[u8]) -> (usize, usize) {
    let mut count = 0;
    let mut last_end = 0;
    let mut i = 0;
    while i + GCE_MARKER_LEN <= bytes.len() {
        if is_gce_marker(&bytes[i..]) {
            count += 1;
            i += GCE_MARKER_LEN;
            last_end = i;
        } else {
            i += 1;
        }
    }
    (count, last_end)
}

/// Number of frame markers in an in-memory GIF.
pub fn count_gif_frames(bytes: &[u8]) -> usize {
    scan_gif_markers(bytes).0
}

/// Count frame markers from a reader in [`GIF_WINDOW`] windows, stopping once
/// `stop_at` markers were seen. Markers straddling a window boundary are
/// found because the unmatched tail of each window is carried forward.
pub fn gif_frames_from_reader<R: Read>(mut reader: R, stop_at: usize) -> io::Result<usize> {
    let mut frames = 0;
    let mut buffer: Vec<u8> = Vec::new();

    while frames < stop_at {
        let read = reader
            .by_ref()
            .take(GIF_WINDOW)
            .read_to_end(&mut buffer)?;
        if read == 0 {
            break;
        }

        let (count, last_end) = scan_gif_markers(&buffer);
        frames += count;

        // Keep at most one marker length minus a byte, and never bytes that
        // already belonged to a match.
        let keep_from = last_end.max(buffer.len().saturating_sub(GCE_MARKER_LEN - 1));
        buffer.drain(..keep_from);
    }

    Ok(frames)
}

impl ImageManager {
    /// Whether the record is an animated GIF or WebP.
    pub fn is_animated(&self, record: &ImageRecord) -> Result<bool> {
        let path = match record.data() {
            ImageData::Inline(bytes) => return Ok(is_animated(record.format(), bytes)),
            ImageData::File(path) => path,
        };

        match record.format() {
            ImageFormat::Webp => {
                let mut header = Vec::with_capacity(WEBP_HEADER_LEN as usize);
                self.fs
                    .open(path)?
                    .take(WEBP_HEADER_LEN)
                    .read_to_end(&mut header)?;
                Ok(webp_is_animated(&header))
            }
            ImageFormat::Gif => Ok(gif_frames_from_reader(self.fs.open(path)?, 2)? >= 2),
            _ => Ok(false),
        }
    }
}
