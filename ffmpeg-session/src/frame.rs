use crate::error::{Result, SessionError};

/// A planar YUV 4:2:0 picture the pattern generator can paint into.
///
/// Plane 0 is full resolution luma, planes 1 and 2 are the half resolution
/// chroma planes. Rows are `stride` bytes apart; bytes past the visible width
/// of a row are padding.
pub trait FrameBuffer {
    fn dimensions(&self) -> (u32, u32);

    /// Returns the plane bytes and its line stride.
    fn plane_mut(&mut self, index: usize) -> (&mut [u8], usize);

    fn set_timestamp(&mut self, pts: i64);

    fn timestamp(&self) -> Option<i64>;

    /// Makes sure the buffer is not shared with the encoder before it is
    /// refilled.
    fn prepare_write(&mut self) -> Result<()>;
}

impl FrameBuffer for ffmpeg_next::frame::Video {
    fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    fn plane_mut(&mut self, index: usize) -> (&mut [u8], usize) {
        let stride = self.stride(index);
        (self.data_mut(index), stride)
    }

    fn set_timestamp(&mut self, pts: i64) {
        self.set_pts(Some(pts));
    }

    fn timestamp(&self) -> Option<i64> {
        self.pts()
    }

    fn prepare_write(&mut self) -> Result<()> {
        let ret = unsafe { ffmpeg_next::ffi::av_frame_make_writable(self.as_mut_ptr()) };
        if ret < 0 {
            return Err(SessionError::NotWritable(format!(
                "av_frame_make_writable: {}",
                ffmpeg_next::Error::from(ret)
            )));
        }
        Ok(())
    }
}

/// Heap-backed YUV 4:2:0 frame, used where no codec is involved.
#[derive(Debug, Clone)]
pub struct PlanarFrame {
    width: u32,
    height: u32,
    planes: [Vec<u8>; 3],
    strides: [usize; 3],
    pts: Option<i64>,
}

impl PlanarFrame {
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_padding(width, height, 0)
    }

    /// Allocates every row `padding` bytes wider than its visible width.
    pub fn with_padding(width: u32, height: u32, padding: usize) -> Self {
        let (cw, ch) = (width.div_ceil(2) as usize, height.div_ceil(2) as usize);
        let strides = [width as usize + padding, cw + padding, cw + padding];
        let rows = [height as usize, ch, ch];
        let planes = [
            vec![0u8; strides[0] * rows[0]],
            vec![0u8; strides[1] * rows[1]],
            vec![0u8; strides[2] * rows[2]],
        ];
        Self {
            width,
            height,
            planes,
            strides,
            pts: None,
        }
    }

    pub fn plane(&self, index: usize) -> &[u8] {
        &self.planes[index]
    }

    pub fn stride(&self, index: usize) -> usize {
        self.strides[index]
    }

    /// Sample at `(x, y)` of the given plane.
    pub fn sample(&self, index: usize, x: usize, y: usize) -> u8 {
        self.planes[index][y * self.strides[index] + x]
    }
}

impl FrameBuffer for PlanarFrame {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn plane_mut(&mut self, index: usize) -> (&mut [u8], usize) {
        (&mut self.planes[index], self.strides[index])
    }

    fn set_timestamp(&mut self, pts: i64) {
        self.pts = Some(pts);
    }

    fn timestamp(&self) -> Option<i64> {
        self.pts
    }

    fn prepare_write(&mut self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_planar_frame_layout() {
        let frame = PlanarFrame::with_padding(5, 3, 4);
        assert_eq!(frame.dimensions(), (5, 3));
        assert_eq!(frame.stride(0), 9);
        // odd sizes round the chroma planes up
        assert_eq!(frame.stride(1), 7);
        assert_eq!(frame.plane(0).len(), 27);
        assert_eq!(frame.plane(2).len(), 14);
        assert_eq!(frame.timestamp(), None);
    }

    #[test]
    fn test_ffmpeg_frame_buffer() {
        let mut frame =
            ffmpeg_next::frame::Video::new(ffmpeg_next::format::Pixel::YUV420P, 64, 48);
        assert_eq!(frame.dimensions(), (64, 48));
        frame.prepare_write().unwrap();
        let (luma, stride) = frame.plane_mut(0);
        assert!(stride >= 64);
        assert!(luma.len() >= stride * 48);
        frame.set_timestamp(7);
        assert_eq!(FrameBuffer::timestamp(&frame), Some(7));
    }
}
