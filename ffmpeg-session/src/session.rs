use crate::{
    backend::{Backend, Receive},
    error::{Result, SessionError},
    frame::FrameBuffer,
    packet::EncodedUnit,
    pattern,
};

pub const DEFAULT_BIT_RATE: usize = 6_000_000;
/// Used instead of [`DEFAULT_BIT_RATE`] for one frame per second.
pub const SLIDESHOW_BIT_RATE: usize = 4_000_000;

#[derive(Debug, Clone)]
pub struct Settings {
    pub path: String,
    /// Encoder name (`libx264`) or container short name (`mp4`).
    pub codec: String,
    pub width: u32,
    pub height: u32,
    pub frame_rate: i32,
    /// `None` derives the rate from `frame_rate`.
    pub bit_rate: Option<usize>,
}

impl Settings {
    pub fn new(path: impl Into<String>, codec: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            codec: codec.into(),
            ..Default::default()
        }
    }

    pub fn bit_rate(&self) -> usize {
        match self.bit_rate {
            Some(rate) => rate,
            None if self.frame_rate == 1 => SLIDESHOW_BIT_RATE,
            None => DEFAULT_BIT_RATE,
        }
    }

    /// 4:2:0 chroma needs even dimensions.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 || self.width % 2 != 0 || self.height % 2 != 0 {
            return Err(SessionError::UnsupportedFormat(format!(
                "resolution {}x{} must be non-zero and even",
                self.width, self.height
            )));
        }
        if self.frame_rate <= 0 {
            return Err(SessionError::UnsupportedFormat(format!(
                "invalid frame rate {}",
                self.frame_rate
            )));
        }
        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            path: String::new(),
            codec: "libx264".to_string(),
            width: 720,
            height: 480,
            frame_rate: 25,
            bit_rate: None,
        }
    }
}

/// What one [`Session::submit_frame`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Submitted {
    /// Presentation timestamp given to the frame.
    pub pts: i64,
    /// Units the encoder released and the container took.
    pub units: usize,
}

/// Totals reported by [`Session::close`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub frames: i64,
    pub units: u64,
    /// Units that only came out when the encoder was flushed.
    pub flushed: usize,
}

enum State<B: Backend> {
    Unopened,
    Opened(Opened<B>),
    Closed { frames: i64 },
}

struct Opened<B: Backend> {
    backend: B,
    /// Refilled in place on every tick.
    frame: B::Frame,
    frame_count: i64,
    units: u64,
}

impl<B: Backend> Opened<B> {
    /// Forwards every ready unit to the container. While frames are still
    /// coming `Again` ends the drain and `Eof` is a fault; after end of input
    /// it is the other way round.
    fn drain(&mut self, flushing: bool) -> Result<usize> {
        let mut written = 0;
        loop {
            match self.backend.receive()? {
                Receive::Unit(unit) => {
                    log::trace!(
                        "unit pts: {:?}, size: {}, key: {}",
                        unit.pts(),
                        unit.size(),
                        unit.is_key()
                    );
                    self.backend.write(unit)?;
                    written += 1;
                    self.units += 1;
                }
                Receive::Again if !flushing => return Ok(written),
                Receive::Eof if flushing => return Ok(written),
                Receive::Again => {
                    return Err(SessionError::Encode(
                        "encoder wants more input after end of input".to_string(),
                    ));
                }
                Receive::Eof => {
                    return Err(SessionError::Encode(format!(
                        "encoder reached end of stream at frame {} before input ended",
                        self.frame_count
                    )));
                }
            }
        }
    }
}

/// One encode run: `Unopened -> Opened -> Closed`.
///
/// The session owns the backend and the reusable frame. Operations called in
/// the wrong state fail with a lifecycle error and change nothing.
pub struct Session<B: Backend> {
    settings: Settings,
    state: State<B>,
}

impl<B: Backend> Session<B> {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            state: State::Unopened,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, State::Opened(_))
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.state, State::Closed { .. })
    }

    /// Frames submitted so far; while open also the timestamp the next frame
    /// gets. Kept after close.
    pub fn frame_count(&self) -> i64 {
        match &self.state {
            State::Unopened => 0,
            State::Opened(opened) => opened.frame_count,
            State::Closed { frames } => *frames,
        }
    }

    /// Opens the backend through `connect` and allocates the reusable frame.
    ///
    /// When this fails the session stays unopened and whatever `connect`
    /// acquired has already been released.
    pub fn open<F>(&mut self, connect: F) -> Result<()>
    where
        F: FnOnce(&Settings) -> Result<B>,
    {
        match self.state {
            State::Unopened => {}
            State::Opened(_) => return Err(SessionError::AlreadyOpen),
            State::Closed { .. } => return Err(SessionError::Closed),
        }
        self.settings.validate()?;

        log::info!(
            "opening {} with {} ({}x{} @ {} fps)",
            self.settings.path,
            self.settings.codec,
            self.settings.width,
            self.settings.height,
            self.settings.frame_rate
        );
        let mut backend = connect(&self.settings)?;
        let frame = backend.alloc_frame()?;

        self.state = State::Opened(Opened {
            backend,
            frame,
            frame_count: 0,
            units: 0,
        });
        Ok(())
    }

    /// Paints the next frame, encodes it and writes whatever the encoder
    /// releases. The frame's timestamp is the number of frames submitted
    /// before it.
    pub fn submit_frame(&mut self) -> Result<Submitted> {
        let opened = match &mut self.state {
            State::Opened(opened) => opened,
            State::Unopened => return Err(SessionError::NotOpened),
            State::Closed { .. } => return Err(SessionError::Closed),
        };

        let pts = opened.frame_count;
        opened.frame.prepare_write()?;
        pattern::generate(&mut opened.frame, pts);
        opened.frame.set_timestamp(pts);

        opened.backend.send_frame(&opened.frame)?;
        let units = opened.drain(false)?;
        opened.frame_count += 1;

        log::debug!("frame {} submitted, {} units written", pts, units);
        Ok(Submitted { pts, units })
    }

    /// Flushes the encoder, writes the trailer and releases the backend.
    ///
    /// Works once per successful open. The session is closed afterwards even
    /// if flushing fails.
    pub fn close(&mut self) -> Result<Summary> {
        let mut opened = match std::mem::replace(&mut self.state, State::Unopened) {
            State::Opened(opened) => opened,
            State::Unopened => return Err(SessionError::NotOpened),
            closed @ State::Closed { .. } => {
                self.state = closed;
                return Err(SessionError::Closed);
            }
        };
        self.state = State::Closed {
            frames: opened.frame_count,
        };

        opened.backend.send_eof()?;
        let flushed = opened.drain(true)?;
        opened.backend.write_trailer()?;

        let summary = Summary {
            frames: opened.frame_count,
            units: opened.units,
            flushed,
        };
        log::info!(
            "closed {}: {} frames, {} units ({} on flush)",
            self.settings.path,
            summary.frames,
            summary.units,
            summary.flushed
        );
        Ok(summary)
    }
}

impl<B: Backend> Drop for Session<B> {
    fn drop(&mut self) {
        if let State::Opened(opened) = &self.state {
            log::warn!(
                "session for {} dropped after {} frames without close, trailer not written",
                self.settings.path,
                opened.frame_count
            );
        }
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;
