/// Converts the painted YUV 4:2:0 frame into the encoder's pixel layout.
pub struct Scaler {
    context: ffmpeg_next::software::scaling::Context,
}

impl Scaler {
    pub fn new(context: ffmpeg_next::software::scaling::Context) -> Self {
        Self { context }
    }

    /// `dst` is allocated on first use and reused afterwards.
    pub fn run(
        &mut self,
        frame: &ffmpeg_next::frame::Video,
        dst: &mut ffmpeg_next::frame::Video,
    ) -> Result<(), ffmpeg_next::Error> {
        self.context.run(frame, dst)
    }
}

#[cfg(test)]
mod tests {
    use ffmpeg_next::format::Pixel;

    use super::*;
    use crate::{frame::FrameBuffer, pattern};

    #[test]
    fn test_convert_to_rgb() {
        let context = ffmpeg_next::software::scaling::Context::get(
            Pixel::YUV420P,
            32,
            16,
            Pixel::RGB24,
            32,
            16,
            ffmpeg_next::software::scaling::flag::Flags::BILINEAR,
        )
        .unwrap();
        let mut scaler = Scaler::new(context);

        let mut src = ffmpeg_next::frame::Video::new(Pixel::YUV420P, 32, 16);
        pattern::generate(&mut src, 3);
        let mut dst = ffmpeg_next::frame::Video::empty();
        scaler.run(&src, &mut dst).unwrap();

        assert_eq!(dst.format(), Pixel::RGB24);
        assert_eq!(dst.dimensions(), (32, 16));
        assert!(dst.data(0).len() >= 32 * 3 * 16);
    }
}
