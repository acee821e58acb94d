//! Moving luma/chroma gradient used as synthetic frame content.
//!
//! Every sample is a pure function of its coordinates and the frame index, so
//! any frame can be regenerated and checked pixel by pixel. All arithmetic is
//! modulo 256, done with `u8` wrapping ops.

use crate::frame::FrameBuffer;

/// Luma sample: `(x + y + 3 * frame_index) mod 256`.
pub fn luma(x: usize, y: usize, frame_index: i64) -> u8 {
    (x as u8)
        .wrapping_add(y as u8)
        .wrapping_add((frame_index as u8).wrapping_mul(3))
}

/// Cb sample: `(128 + y + 2 * frame_index) mod 256`.
pub fn cb(_x: usize, y: usize, frame_index: i64) -> u8 {
    128u8
        .wrapping_add(y as u8)
        .wrapping_add((frame_index as u8).wrapping_mul(2))
}

/// Cr sample: `(64 + x + 5 * frame_index) mod 256`.
pub fn cr(x: usize, _y: usize, frame_index: i64) -> u8 {
    64u8.wrapping_add(x as u8)
        .wrapping_add((frame_index as u8).wrapping_mul(5))
}

/// Paints the pattern for `frame_index` into `frame`.
///
/// Chroma covers `width / 2` by `height / 2` samples. Row padding is left as
/// it was.
pub fn generate<F: FrameBuffer + ?Sized>(frame: &mut F, frame_index: i64) {
    let (width, height) = frame.dimensions();
    let (width, height) = (width as usize, height as usize);

    fill_plane(frame, 0, width, height, |x, y| luma(x, y, frame_index));
    fill_plane(frame, 1, width / 2, height / 2, |x, y| cb(x, y, frame_index));
    fill_plane(frame, 2, width / 2, height / 2, |x, y| cr(x, y, frame_index));
}

fn fill_plane<F: FrameBuffer + ?Sized>(
    frame: &mut F,
    index: usize,
    width: usize,
    height: usize,
    sample: impl Fn(usize, usize) -> u8,
) {
    let (data, stride) = frame.plane_mut(index);
    if width == 0 || height == 0 || stride < width {
        return;
    }
    for (y, row) in data.chunks_mut(stride).take(height).enumerate() {
        for (x, px) in row[..width].iter_mut().enumerate() {
            *px = sample(x, y);
        }
    }
}
