use std::{ffi::CString, ptr};

use ffmpeg_next::{Rational, ffi};

use crate::{
    encoder::VideoEncoder,
    error::{Result, SessionError},
    format::Negotiated,
    packet::EncodedPacket,
};

/// Container writer for a single video stream.
pub struct AvOutput {
    inner: ffmpeg_next::format::context::Output,
    path: String,
    no_file: bool,
    stream_index: usize,
    /// Source time base of the packets handed to [`AvOutput::write_packet`].
    encoder_time_base: Rational,
    /// Only valid once the header is written; the muxer may change it.
    stream_time_base: Rational,
    have_written_header: bool,
    have_written_trailer: bool,
}

impl AvOutput {
    /// Allocates the muxer context for the negotiated container and, unless
    /// the muxer handles its own I/O, opens `path` for writing.
    pub fn create(path: &str, negotiated: &Negotiated) -> Result<Self> {
        let io_error = |reason: String| SessionError::Io {
            path: path.to_string(),
            reason,
        };
        let c_path = CString::new(path).map_err(|e| io_error(e.to_string()))?;
        let c_format = CString::new(negotiated.format_name.as_str())
            .map_err(|e| SessionError::UnsupportedFormat(e.to_string()))?;

        let mut ps = ptr::null_mut();
        let ret = unsafe {
            ffi::avformat_alloc_output_context2(
                &mut ps,
                ptr::null_mut(),
                c_format.as_ptr(),
                c_path.as_ptr(),
            )
        };
        if ret < 0 {
            return Err(SessionError::from_alloc(
                ffmpeg_next::Error::from(ret),
                "allocate output context",
                SessionError::Resource,
            ));
        }
        if ps.is_null() {
            return Err(SessionError::Resource("allocate output context".to_string()));
        }
        // pb stays null for no-file muxers; avio_close(NULL) on drop is a no-op
        let mut output = unsafe { ffmpeg_next::format::context::Output::wrap(ps) };

        if !negotiated.no_file {
            let ret = unsafe {
                ffi::avio_open(
                    &mut (*output.as_mut_ptr()).pb,
                    c_path.as_ptr(),
                    ffi::AVIO_FLAG_WRITE,
                )
            };
            if ret < 0 {
                return Err(SessionError::from_alloc(
                    ffmpeg_next::Error::from(ret),
                    "open output",
                    io_error,
                ));
            }
        }

        Ok(Self {
            inner: output,
            path: path.to_string(),
            no_file: negotiated.no_file,
            stream_index: 0,
            encoder_time_base: Rational::new(0, 1),
            stream_time_base: Rational::new(0, 1),
            have_written_header: false,
            have_written_trailer: false,
        })
    }

    pub fn add_stream(&mut self, negotiated: &Negotiated, encoder: &VideoEncoder) -> Result<()> {
        let mut stream = self.inner.add_stream(negotiated.codec).map_err(|e| {
            SessionError::from_alloc(e, "add stream", SessionError::Resource)
        })?;
        stream.set_parameters(encoder.as_context());
        stream.set_time_base(encoder.time_base());
        self.stream_index = stream.index();
        self.encoder_time_base = encoder.time_base();
        Ok(())
    }

    pub fn write_header(&mut self) -> Result<()> {
        self.inner
            .write_header()
            .map_err(|e| SessionError::io(&self.path, "write header", e))?;
        self.have_written_header = true;
        self.stream_time_base = self
            .inner
            .stream(self.stream_index)
            .map(|stream| stream.time_base())
            .ok_or_else(|| SessionError::Resource("stream missing after header".to_string()))?;
        log::debug!(
            "header written to {}, stream time base {}/{}",
            self.path,
            self.stream_time_base.numerator(),
            self.stream_time_base.denominator()
        );
        if log::log_enabled!(log::Level::Debug) {
            ffmpeg_next::format::context::output::dump(&self.inner, 0, Some(&self.path));
        }
        Ok(())
    }

    pub fn write_packet(&mut self, mut packet: EncodedPacket) -> Result<()> {
        if !self.have_written_header {
            return Err(SessionError::io(&self.path, "write packet", "header not written"));
        }
        let time_base = packet.time_base();
        let p = packet.get_mut();
        p.set_stream(self.stream_index);
        p.set_position(-1);
        p.rescale_ts(time_base, self.stream_time_base);
        p.write_interleaved(&mut self.inner)
            .map_err(|e| SessionError::io(&self.path, "write packet", e))
    }

    pub fn finish(&mut self) -> Result<()> {
        if self.have_written_header && !self.have_written_trailer {
            self.have_written_trailer = true;
            self.inner
                .write_trailer()
                .map_err(|e| SessionError::io(&self.path, "write trailer", e))?;
        }
        Ok(())
    }

    /// Closes the output and deletes whatever was written so far. Muxers that
    /// do their own I/O never had `path` opened, so nothing is removed.
    pub fn discard(self) {
        let path = self.path.clone();
        let no_file = self.no_file;
        drop(self);
        if !no_file {
            if let Err(e) = std::fs::remove_file(&path) {
                log::warn!("could not remove partial output {}: {}", path, e);
            }
        }
    }
}
