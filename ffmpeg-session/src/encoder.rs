use ffmpeg_next::{Rational, format::Pixel};

use crate::{
    backend::Receive,
    error::{Result, SessionError},
    format::Negotiated,
    packet::EncodedPacket,
    scaler::Scaler,
    session::Settings,
};

/// Pixel layout the pattern is painted in.
pub const SOURCE_FORMAT: Pixel = Pixel::YUV420P;

pub struct VideoEncoder {
    inner: ffmpeg_next::codec::encoder::Video,
    time_base: Rational,
    width: u32,
    height: u32,
    /// Set when the encoder wants another layout than [`SOURCE_FORMAT`].
    scaler: Option<Scaler>,
    converted: ffmpeg_next::frame::Video,
}

impl VideoEncoder {
    pub fn open(negotiated: &Negotiated, settings: &Settings) -> Result<Self> {
        let context = ffmpeg_next::codec::Context::new_with_codec(negotiated.codec);
        let mut encoder = context.encoder().video().map_err(|e| {
            SessionError::from_alloc(e, "allocate codec context", SessionError::Resource)
        })?;

        let time_base = Rational::new(1, settings.frame_rate);
        encoder.set_width(settings.width);
        encoder.set_height(settings.height);
        encoder.set_format(negotiated.pixel_format);
        encoder.set_time_base(time_base);
        encoder.set_frame_rate(Some(Rational::new(settings.frame_rate, 1)));
        encoder.set_bit_rate(settings.bit_rate());
        // intra only, no reordering
        encoder.set_gop(0);
        encoder.set_max_b_frames(0);
        if negotiated.global_header {
            encoder.set_flags(ffmpeg_next::codec::Flags::GLOBAL_HEADER);
        }

        let encoder = encoder.open().map_err(|e| {
            SessionError::from_alloc(
                e,
                &format!("open codec {}", negotiated.codec.name()),
                SessionError::UnsupportedFormat,
            )
        })?;
        log::info!(
            "encoder opened: {} {}x{} {:?} @ {} fps, {} bps",
            negotiated.codec.name(),
            settings.width,
            settings.height,
            negotiated.pixel_format,
            settings.frame_rate,
            settings.bit_rate()
        );

        let encoder_time_base: Rational = unsafe { (*encoder.0.as_ptr()).time_base.into() };

        let scaler = if negotiated.pixel_format != SOURCE_FORMAT {
            log::debug!(
                "converting frames from {:?} to {:?}",
                SOURCE_FORMAT,
                negotiated.pixel_format
            );
            let context = ffmpeg_next::software::scaling::Context::get(
                SOURCE_FORMAT,
                settings.width,
                settings.height,
                negotiated.pixel_format,
                settings.width,
                settings.height,
                ffmpeg_next::software::scaling::flag::Flags::BILINEAR,
            )
            .map_err(|e| SessionError::from_alloc(e, "create scaler", SessionError::Resource))?;
            Some(Scaler::new(context))
        } else {
            None
        };

        Ok(Self {
            inner: encoder,
            time_base: if encoder_time_base.denominator() > 0 {
                encoder_time_base
            } else {
                time_base
            },
            width: settings.width,
            height: settings.height,
            scaler,
            converted: ffmpeg_next::frame::Video::empty(),
        })
    }

    pub fn time_base(&self) -> Rational {
        self.time_base
    }

    pub fn as_context(&self) -> &ffmpeg_next::codec::encoder::Video {
        &self.inner
    }

    pub fn alloc_frame(&self) -> Result<ffmpeg_next::frame::Video> {
        let frame = ffmpeg_next::frame::Video::new(SOURCE_FORMAT, self.width, self.height);
        if frame.is_empty() {
            return Err(SessionError::Resource(format!(
                "allocate {}x{} frame",
                self.width, self.height
            )));
        }
        Ok(frame)
    }

    pub fn send_frame(&mut self, frame: &ffmpeg_next::frame::Video) -> Result<()> {
        let sending = match self.scaler.as_mut() {
            Some(scaler) => {
                scaler
                    .run(frame, &mut self.converted)
                    .map_err(|e| SessionError::Encode(format!("convert frame: {}", e)))?;
                // Copy over PTS from the source frame.
                self.converted.set_pts(frame.pts());
                &self.converted
            }
            None => frame,
        };
        self.inner
            .send_frame(sending)
            .map_err(|e| SessionError::Encode(format!("send frame: {}", e)))
    }

    pub fn send_eof(&mut self) -> Result<()> {
        self.inner
            .send_eof()
            .map_err(|e| SessionError::Encode(format!("send eof: {}", e)))
    }

    pub fn receive_packet(&mut self) -> Result<Receive<EncodedPacket>> {
        let mut packet = ffmpeg_next::codec::packet::Packet::empty();
        match self.inner.receive_packet(&mut packet) {
            Ok(()) => Ok(Receive::Unit(EncodedPacket::from((packet, self.time_base)))),
            Err(ffmpeg_next::Error::Other { errno })
                if errno == ffmpeg_next::util::error::EAGAIN =>
            {
                Ok(Receive::Again)
            }
            Err(ffmpeg_next::Error::Eof) => Ok(Receive::Eof),
            Err(e) => Err(SessionError::Encode(format!("receive packet: {}", e))),
        }
    }
}
