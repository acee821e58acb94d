//! Codec/container negotiation.
//!
//! Everything here only queries FFmpeg's registries; no file is touched, so a
//! failed negotiation never leaves an output behind.

use std::ffi::{CStr, CString};

use ffmpeg_next::format::Pixel;

use crate::error::{Result, SessionError};

/// Outputs whose name ends with this get a packed RGB pixel layout.
pub const RGB_SUFFIX: &str = "gif";

/// True iff `suffix` is a trailing substring of `candidate`. An empty suffix
/// always matches.
pub fn ends_with(candidate: &str, suffix: &str) -> bool {
    candidate.ends_with(suffix)
}

/// Result of resolving a codec selector against a target path.
pub struct Negotiated {
    /// Short name of the muxer, e.g. `mp4`.
    pub format_name: String,
    pub codec: ffmpeg_next::Codec,
    pub pixel_format: Pixel,
    /// Container wants codec extradata in the stream header.
    pub global_header: bool,
    /// Container writes no file of its own.
    pub no_file: bool,
}

impl std::fmt::Debug for Negotiated {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Negotiated")
            .field("format_name", &self.format_name)
            .field("codec", &self.codec.name())
            .field("pixel_format", &self.pixel_format)
            .field("global_header", &self.global_header)
            .field("no_file", &self.no_file)
            .finish()
    }
}

/// Resolves `selector` (an encoder name or a container short name) for
/// `path`.
pub fn negotiate(path: &str, selector: &str) -> Result<Negotiated> {
    let oformat = guess_format(selector, path)?;
    let (format_name, default_codec, flags) = unsafe {
        (
            CStr::from_ptr((*oformat).name).to_string_lossy().into_owned(),
            ffmpeg_next::codec::Id::from((*oformat).video_codec),
            (*oformat).flags,
        )
    };
    log::debug!(
        "guessed container {} for {} (default video codec {:?})",
        format_name,
        path,
        default_codec
    );

    let codec = match ffmpeg_next::encoder::find_by_name(selector) {
        Some(codec) => codec,
        None => ffmpeg_next::encoder::find(default_codec)
            .filter(|_| is_muxer_name(selector))
            .ok_or_else(|| {
                SessionError::UnsupportedFormat(format!(
                    "no encoder or container named {}",
                    selector
                ))
            })?,
    };
    if !codec.is_video() {
        return Err(SessionError::UnsupportedFormat(format!(
            "{} is not a video encoder",
            codec.name()
        )));
    }

    let accepted = unsafe {
        ffmpeg_next::ffi::avformat_query_codec(
            oformat,
            codec.id().into(),
            ffmpeg_next::ffi::FF_COMPLIANCE_NORMAL as i32,
        )
    };
    match accepted {
        0 => {
            return Err(SessionError::UnsupportedFormat(format!(
                "container {} cannot carry {}",
                format_name,
                codec.name()
            )));
        }
        n if n < 0 => log::debug!(
            "container {} does not know whether it can carry {}, trying anyway",
            format_name,
            codec.name()
        ),
        _ => {}
    }

    let pixel_format = pixel_format_for(&codec, path);

    Ok(Negotiated {
        format_name,
        pixel_format,
        global_header: flags & ffmpeg_next::ffi::AVFMT_GLOBALHEADER as i32 != 0,
        no_file: flags & ffmpeg_next::ffi::AVFMT_NOFILE as i32 != 0,
        codec,
    })
}

/// Picks packed RGB for `gif` targets and planar YUV otherwise, falling back to
/// the first format the encoder lists when it cannot take the preferred one.
pub fn pixel_format_for(codec: &ffmpeg_next::Codec, path: &str) -> Pixel {
    let preferred = if ends_with(path, RGB_SUFFIX) {
        Pixel::RGB24
    } else {
        Pixel::YUV420P
    };
    let supported: Vec<Pixel> = codec
        .video()
        .ok()
        .and_then(|video| video.formats())
        .map(|formats| formats.collect())
        .unwrap_or_default();

    match supported.first() {
        Some(first) if !supported.contains(&preferred) => {
            log::info!(
                "{} does not take {:?}, using {:?}",
                codec.name(),
                preferred,
                first
            );
            *first
        }
        _ => preferred,
    }
}

fn guess_format(
    selector: &str,
    path: &str,
) -> Result<*const ffmpeg_next::ffi::AVOutputFormat> {
    let short_name = CString::new(selector)
        .map_err(|_| SessionError::UnsupportedFormat(format!("invalid name {:?}", selector)))?;
    let file_name = CString::new(path)
        .map_err(|_| SessionError::UnsupportedFormat(format!("invalid path {:?}", path)))?;
    let oformat = unsafe {
        ffmpeg_next::ffi::av_guess_format(
            short_name.as_ptr(),
            file_name.as_ptr(),
            std::ptr::null(),
        )
    };
    if oformat.is_null() {
        return Err(SessionError::UnsupportedFormat(format!(
            "no container for {} ({})",
            path, selector
        )));
    }
    Ok(oformat as *const _)
}

fn is_muxer_name(name: &str) -> bool {
    let Ok(short_name) = CString::new(name) else {
        return false;
    };
    let oformat = unsafe {
        ffmpeg_next::ffi::av_guess_format(short_name.as_ptr(), std::ptr::null(), std::ptr::null())
    };
    !oformat.is_null()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ends_with() {
        assert!(ends_with("anything", ""));
        assert!(ends_with("", ""));
        assert!(!ends_with("a", "ab"));
        assert!(ends_with("video.gif", "gif"));
        assert!(!ends_with("video.mp4", "gif"));
        assert!(ends_with("gif", "gif"));
        // the match has to be trailing, not just contained
        assert!(!ends_with("gif.mp4", "gif"));
        assert!(!ends_with("video.gifs", "gif"));
    }

    #[test]
    fn test_unknown_selector() {
        crate::init().unwrap();
        let err = negotiate("out.mp4", "not-a-codec").unwrap_err();
        assert!(matches!(err, SessionError::UnsupportedFormat(_)), "{}", err);
    }

    #[test]
    fn test_no_container_for_path() {
        crate::init().unwrap();
        let err = negotiate("out.not-a-container", "mpeg4").unwrap_err();
        assert!(matches!(err, SessionError::UnsupportedFormat(_)), "{}", err);
    }

    #[test]
    fn test_non_video_encoder() {
        crate::init().unwrap();
        if ffmpeg_next::encoder::find_by_name("aac").is_none() {
            eprintln!("skip: aac encoder not available");
            return;
        }
        let err = negotiate("out.mp4", "aac").unwrap_err();
        assert!(matches!(err, SessionError::UnsupportedFormat(_)), "{}", err);
    }

    #[test]
    fn test_encoder_name() {
        crate::init().unwrap();
        if ffmpeg_next::encoder::find_by_name("mpeg4").is_none() {
            eprintln!("skip: mpeg4 encoder not available");
            return;
        }
        let negotiated = negotiate("out.mp4", "mpeg4").unwrap();
        assert_eq!(negotiated.format_name, "mp4");
        assert_eq!(negotiated.codec.name(), "mpeg4");
        assert_eq!(negotiated.pixel_format, Pixel::YUV420P);
        assert!(negotiated.global_header);
        assert!(!negotiated.no_file);
    }

    #[test]
    fn test_container_name_uses_default_codec() {
        crate::init().unwrap();
        let Some(default) = ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::MPEG1VIDEO) else {
            eprintln!("skip: mpeg1video encoder not available");
            return;
        };
        let negotiated = negotiate("out.mpg", "mpeg").unwrap();
        assert_eq!(negotiated.format_name, "mpeg");
        assert_eq!(negotiated.codec.id(), default.id());
    }

    #[test]
    fn test_null_muxer_writes_no_file() {
        crate::init().unwrap();
        if ffmpeg_next::encoder::find_by_name("wrapped_avframe").is_none() {
            eprintln!("skip: wrapped_avframe encoder not available");
            return;
        }
        let negotiated = negotiate("out%03d.null", "null").unwrap();
        assert_eq!(negotiated.format_name, "null");
        assert!(negotiated.no_file);
    }

    #[test]
    fn test_gif_gets_rgb_layout() {
        crate::init().unwrap();
        let Some(codec) = ffmpeg_next::encoder::find_by_name("gif") else {
            eprintln!("skip: gif encoder not available");
            return;
        };
        let pixel = pixel_format_for(&codec, "out.gif");
        assert_ne!(pixel, Pixel::YUV420P);
        let supported: Vec<Pixel> = codec.video().unwrap().formats().unwrap().collect();
        assert!(supported.contains(&pixel));
    }
}
