use thiserror::Error;

/// Failures surfaced by a [`Session`](crate::session::Session) and its backend.
///
/// Every variant carries the stage that failed so the caller can report it
/// without extra bookkeeping. No variant is retried by the library.
#[derive(Error, Debug)]
pub enum SessionError {
    /// The codec/container pairing could not be negotiated.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// A context, stream or frame could not be allocated.
    #[error("resource allocation failed: {0}")]
    Resource(String),

    /// The target could not be opened or written.
    #[error("i/o error on {path}: {reason}")]
    Io { path: String, reason: String },

    /// The encoder reported a hard failure while submitting or draining.
    #[error("encode error: {0}")]
    Encode(String),

    /// The reusable frame could not be prepared for mutation.
    #[error("frame not writable: {0}")]
    NotWritable(String),

    #[error("session is not open")]
    NotOpened,

    #[error("session is already open")]
    AlreadyOpen,

    #[error("session is closed")]
    Closed,
}

impl SessionError {
    /// Maps an FFmpeg error raised during allocation. Out-of-memory codes
    /// become [`SessionError::Resource`], anything else goes through `other`.
    pub(crate) fn from_alloc(
        err: ffmpeg_next::Error,
        stage: &str,
        other: impl FnOnce(String) -> SessionError,
    ) -> Self {
        match err {
            ffmpeg_next::Error::Other { errno } if errno == ffmpeg_next::util::error::ENOMEM => {
                SessionError::Resource(format!("{}: {}", stage, err))
            }
            err => other(format!("{}: {}", stage, err)),
        }
    }

    pub(crate) fn io(path: &str, stage: &str, err: impl std::fmt::Display) -> Self {
        SessionError::Io {
            path: path.to_string(),
            reason: format!("{}: {}", stage, err),
        }
    }

    /// True for the lifecycle errors raised before any collaborator call.
    pub fn is_lifecycle(&self) -> bool {
        matches!(
            self,
            SessionError::NotOpened | SessionError::AlreadyOpen | SessionError::Closed
        )
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enomem_maps_to_resource() {
        let err = ffmpeg_next::Error::Other {
            errno: ffmpeg_next::util::error::ENOMEM,
        };
        let mapped = SessionError::from_alloc(err, "alloc frame", SessionError::Encode);
        assert!(matches!(mapped, SessionError::Resource(ref m) if m.starts_with("alloc frame")));
    }

    #[test]
    fn test_other_codes_use_fallback() {
        let mapped = SessionError::from_alloc(
            ffmpeg_next::Error::InvalidData,
            "open codec",
            SessionError::UnsupportedFormat,
        );
        assert!(matches!(mapped, SessionError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_lifecycle_errors() {
        assert!(SessionError::NotOpened.is_lifecycle());
        assert!(SessionError::Closed.is_lifecycle());
        assert!(!SessionError::Encode("x".into()).is_lifecycle());
        assert_eq!(
            SessionError::io("out.mp4", "open output", "Permission denied").to_string(),
            "i/o error on out.mp4: open output: Permission denied"
        );
    }
}
