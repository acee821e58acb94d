use std::sync::LazyLock;

use ffmpeg_session::Settings;

/// Fixed parameters of a run; the command line only picks the target and
/// the codec.
pub struct TestcardConfig {
    width: u32,
    height: u32,
    frame_rate: i32,
    duration_secs: u32,
}

impl TestcardConfig {
    pub fn new(width: u32, height: u32, frame_rate: i32, duration_secs: u32) -> Self {
        Self {
            width,
            height,
            frame_rate,
            duration_secs,
        }
    }

    /// Number of frames to encode.
    pub fn frames(&self) -> usize {
        self.frame_rate.max(0) as usize * self.duration_secs as usize
    }

    pub fn settings(&self, path: &str, codec: &str) -> Settings {
        Settings {
            width: self.width,
            height: self.height,
            frame_rate: self.frame_rate,
            ..Settings::new(path, codec)
        }
    }

    /// `program <output file> <codec name>`; extra arguments are ignored.
    pub fn settings_from_args(&self, args: &[String]) -> Option<Settings> {
        match args {
            [_, path, codec, ..] => Some(self.settings(path, codec)),
            _ => None,
        }
    }
}

pub fn config() -> &'static TestcardConfig {
    static CONFIG: LazyLock<TestcardConfig> = LazyLock::new(|| TestcardConfig::new(720, 480, 25, 1));
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_defaults() {
        let config = config();
        assert_eq!(config.frames(), 25);
        let settings = config.settings("test.mp4", "libx264");
        assert_eq!((settings.width, settings.height), (720, 480));
        assert_eq!(settings.frame_rate, 25);
        assert_eq!(settings.bit_rate(), 6_000_000);
    }

    #[test]
    fn test_args() {
        let config = config();
        assert!(config.settings_from_args(&args(&["testcard"])).is_none());
        assert!(config.settings_from_args(&args(&["testcard", "out.mp4"])).is_none());

        let settings = config
            .settings_from_args(&args(&["testcard", "out.mp4", "libx264"]))
            .unwrap();
        assert_eq!(settings.path, "out.mp4");
        assert_eq!(settings.codec, "libx264");

        let settings = config
            .settings_from_args(&args(&["testcard", "out.gif", "gif", "extra"]))
            .unwrap();
        assert_eq!(settings.codec, "gif");
    }

    #[test]
    fn test_one_frame_per_second() {
        let config = TestcardConfig::new(320, 240, 1, 3);
        assert_eq!(config.frames(), 3);
        assert_eq!(config.settings("a.mp4", "mpeg4").bit_rate(), 4_000_000);
    }
}
