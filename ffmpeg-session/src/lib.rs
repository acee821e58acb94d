//! Drives an FFmpeg encoder and muxer to write a synthetic test-pattern
//! video, one reusable frame at a time.

/// Registers FFmpeg components. Call once at startup before opening a
/// session.
pub fn init() -> anyhow::Result<()> {
    ffmpeg_next::init().map_err(|e| anyhow::anyhow!("ffmpeg_next init: {}", e))
}

pub mod backend;
pub mod encoder;
pub mod error;
pub mod format;
pub mod frame;
pub mod metadata;
pub mod output;
pub mod packet;
pub mod pattern;
pub mod scaler;
pub mod session;

pub use backend::{Backend, FfmpegBackend, Receive};
pub use error::SessionError;
pub use metadata::probe;
pub use session::{Session, Settings, Submitted, Summary};

/// Opens an FFmpeg-backed session: negotiates the format, opens the codec
/// and the output file and writes the container header.
pub fn open(settings: Settings) -> error::Result<Session<FfmpegBackend>> {
    let mut session = Session::new(settings);
    session.open(FfmpegBackend::open)?;
    Ok(session)
}
