//! Reads a finished output back and summarises what ended up in it.

use std::fmt;

#[derive(Debug, Clone)]
pub struct StreamInfo {
    pub index: usize,
    pub codec_name: String,
    /// `Some((width, height))` for video streams.
    pub size: Option<(u32, u32)>,
    /// Packets demuxed from this stream.
    pub packets: u64,
}

#[derive(Debug, Clone)]
pub struct MediaInfo {
    /// Demuxer name, e.g. "mov,mp4,m4a,3gp,3g2,mj2".
    pub container: String,
    pub duration_sec: Option<f64>,
    pub streams: Vec<StreamInfo>,
}

impl MediaInfo {
    pub fn first_video(&self) -> Option<&StreamInfo> {
        self.streams.iter().find(|s| s.size.is_some())
    }
}

impl fmt::Display for MediaInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.duration_sec {
            Some(d) => write!(f, "{}, {:.3}s", self.container, d)?,
            None => write!(f, "{}, unknown duration", self.container)?,
        }
        for s in &self.streams {
            write!(f, "\n  #{} {}", s.index, s.codec_name)?;
            if let Some((w, h)) = s.size {
                write!(f, " {}x{}", w, h)?;
            }
            write!(f, ", {} packets", s.packets)?;
        }
        Ok(())
    }
}

/// Opens `path`, counts its packets per stream and reports codec and size.
pub fn probe(path: &str) -> anyhow::Result<MediaInfo> {
    let mut input = ffmpeg_next::format::input(path)?;

    // in 1/AV_TIME_BASE seconds
    let duration = input.duration();
    let duration_sec = (duration != ffmpeg_next::ffi::AV_NOPTS_VALUE as i64 && duration > 0)
        .then(|| duration as f64 / f64::from(ffmpeg_next::ffi::AV_TIME_BASE));

    let mut streams: Vec<StreamInfo> = input
        .streams()
        .map(|stream| {
            let params = stream.parameters();
            let size = (params.medium() == ffmpeg_next::media::Type::Video).then(|| unsafe {
                let raw = &*params.as_ptr();
                (raw.width.max(0) as u32, raw.height.max(0) as u32)
            });
            StreamInfo {
                index: stream.index(),
                codec_name: params.id().name().to_string(),
                size,
                packets: 0,
            }
        })
        .collect();

    for (stream, _packet) in input.packets() {
        if let Some(info) = streams.get_mut(stream.index()) {
            info.packets += 1;
        }
    }

    Ok(MediaInfo {
        container: input.format().name().to_string(),
        duration_sec,
        streams,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file() {
        crate::init().unwrap();
        assert!(probe("/nonexistent/testcard-missing.mp4").is_err());
    }

    #[test]
    fn test_display() {
        let info = MediaInfo {
            container: "avi".to_string(),
            duration_sec: Some(1.0),
            streams: vec![StreamInfo {
                index: 0,
                codec_name: "mpeg4".to_string(),
                size: Some((64, 48)),
                packets: 10,
            }],
        };
        assert_eq!(info.to_string(), "avi, 1.000s\n  #0 mpeg4 64x48, 10 packets");
        assert_eq!(info.first_video().map(|s| s.index), Some(0));

        let unknown = MediaInfo {
            duration_sec: None,
            streams: Vec::new(),
            ..info
        };
        assert_eq!(unknown.to_string(), "avi, unknown duration");
        assert!(unknown.first_video().is_none());
    }
}
