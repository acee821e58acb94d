//! The seam between the session driver and the library that actually encodes
//! and muxes.

use crate::{
    encoder::VideoEncoder,
    error::{Result, SessionError},
    format,
    frame::FrameBuffer,
    output::AvOutput,
    packet::{EncodedPacket, EncodedUnit},
    session::Settings,
};

/// Outcome of one request for encoder output.
#[derive(Debug)]
pub enum Receive<U> {
    Unit(U),
    /// Nothing ready until more input arrives.
    Again,
    /// Encoder fully drained after end of input.
    Eof,
}

/// An opened encoder plus container writer.
///
/// A backend value exists only between a successful open and the end of the
/// session; dropping it releases everything it acquired.
pub trait Backend {
    type Frame: FrameBuffer;
    type Unit: EncodedUnit;

    /// Allocates the frame the session refills on every tick.
    fn alloc_frame(&mut self) -> Result<Self::Frame>;

    fn send_frame(&mut self, frame: &Self::Frame) -> Result<()>;

    fn send_eof(&mut self) -> Result<()>;

    fn receive(&mut self) -> Result<Receive<Self::Unit>>;

    /// Forwards one unit to the container.
    fn write(&mut self, unit: Self::Unit) -> Result<()>;

    fn write_trailer(&mut self) -> Result<()>;
}

/// FFmpeg encoder and muxer for one video stream.
pub struct FfmpegBackend {
    encoder: VideoEncoder,
    output: AvOutput,
    /// Allocated before the output exists, handed out once.
    frame: Option<ffmpeg_next::frame::Video>,
}

impl FfmpegBackend {
    /// Negotiates, opens the codec, creates the output and writes the
    /// container header.
    ///
    /// The output file is only created once the codec is open and the frame
    /// is allocated. If the stream or the header cannot be set up the
    /// half-written file is removed.
    pub fn open(settings: &Settings) -> Result<Self> {
        let negotiated = format::negotiate(&settings.path, &settings.codec)?;
        log::debug!("negotiated {:?}", negotiated);

        let encoder = VideoEncoder::open(&negotiated, settings)?;
        let frame = encoder.alloc_frame()?;

        let mut output = AvOutput::create(&settings.path, &negotiated)?;
        let setup = output
            .add_stream(&negotiated, &encoder)
            .and_then(|_| output.write_header());
        if let Err(e) = setup {
            output.discard();
            return Err(e);
        }

        Ok(Self {
            encoder,
            output,
            frame: Some(frame),
        })
    }
}

impl Backend for FfmpegBackend {
    type Frame = ffmpeg_next::frame::Video;
    type Unit = EncodedPacket;

    fn alloc_frame(&mut self) -> Result<Self::Frame> {
        self.frame
            .take()
            .ok_or_else(|| SessionError::Resource("frame already handed out".to_string()))
    }

    fn send_frame(&mut self, frame: &Self::Frame) -> Result<()> {
        self.encoder.send_frame(frame)
    }

    fn send_eof(&mut self) -> Result<()> {
        self.encoder.send_eof()
    }

    fn receive(&mut self) -> Result<Receive<Self::Unit>> {
        self.encoder.receive_packet()
    }

    fn write(&mut self, unit: Self::Unit) -> Result<()> {
        self.output.write_packet(unit)
    }

    fn write_trailer(&mut self) -> Result<()> {
        self.output.finish()
    }
}

#[cfg(test)]
#[path = "backend_test.rs"]
mod backend_test;
