use std::{fmt, path::Path};

use serde::{Deserialize, Serialize};

use crate::{backend::Key, Result};

/// Smallest width or height the engine will open a surface with.
pub const MIN_DIMENSION: u32 = 10;

/// 8-bit RGB colour triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    pub const WHITE: Rgb = Rgb(255, 255, 255);
    pub const RED: Rgb = Rgb(255, 0, 0);
    pub const GREEN: Rgb = Rgb(0, 255, 0);

    /// Returns the colour as an opaque RGBA pixel.
    pub fn rgba(self) -> [u8; 4] {
        [self.0, self.1, self.2, 0xff]
    }
}

/// Verbosity levels accepted by the `log_level` setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Parses a level name, case-insensitively. `warning` and `critical` are
    /// accepted as aliases for `warn` and `error`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "trace" => Some(Self::Trace),
            "debug" => Some(Self::Debug),
            "info" => Some(Self::Info),
            "warn" | "warning" => Some(Self::Warn),
            "error" | "critical" => Some(Self::Error),
            _ => None,
        }
    }

    /// Directive string understood by `tracing_subscriber::EnvFilter`.
    pub fn as_directive(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_directive())
    }
}

/// PCM encodings the audio path can emit. Only signed 16-bit is produced
/// by the synthesizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleFormat {
    #[default]
    I16,
}

impl SampleFormat {
    pub fn bytes_per_sample(self) -> usize {
        match self {
            Self::I16 => 2,
        }
    }
}

/// Complete engine configuration. Every field is optional in the serialized
/// form and falls back to the value from [`ScopeConfig::default`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScopeConfig {
    pub width: u32,
    pub height: u32,
    pub caption: String,
    pub algorithm_name: Option<String>,
    pub background: Rgb,
    pub log_level: Option<String>,
    pub sound_duration: f64,
    pub sonification: bool,
    pub update_factor: u64,
    pub display_rate: bool,
    pub display_time: bool,
    pub display_iterations: bool,
    pub bar_color: Rgb,
    pub highlight_color: Rgb,
    pub allow_pause: bool,
    pub pause_key: Key,
    pub frame_rate: u32,
    pub audio: AudioConfig,
}

impl Default for ScopeConfig {
    fn default() -> Self {
        Self {
            width: 500,
            height: 500,
            caption: "Display".to_string(),
            algorithm_name: None,
            background: Rgb::BLACK,
            log_level: None,
            sound_duration: 0.1,
            sonification: false,
            update_factor: 1,
            display_rate: true,
            display_time: true,
            display_iterations: true,
            bar_color: Rgb::WHITE,
            highlight_color: Rgb::RED,
            allow_pause: true,
            pause_key: Key::Space,
            frame_rate: 30,
            audio: AudioConfig::default(),
        }
    }
}

impl ScopeConfig {
    pub fn from_json_str(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Resolves `log_level`, reporting whether the configured value had to be
    /// replaced by the default.
    pub fn resolve_log_level(&self) -> (LogLevel, bool) {
        match self.log_level.as_deref() {
            None => (LogLevel::default(), false),
            Some(raw) => match LogLevel::parse(raw) {
                Some(level) => (level, false),
                None => (LogLevel::default(), true),
            },
        }
    }
}

/// Settings for tone synthesis and the audio output device.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub sample_rate: u32,
    pub frames_per_buffer: usize,
    pub channels: u16,
    pub sample_format: SampleFormat,
    pub amplitude: f64,
    pub cutoff_frequency: f64,
    /// Attack time in seconds.
    pub attack: f64,
    /// Decay time in seconds.
    pub decay: f64,
    /// Sustain level in `[0, 1]`.
    pub sustain: f64,
    /// Release time in seconds.
    pub release: f64,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            frames_per_buffer: 1024,
            channels: 1,
            sample_format: SampleFormat::I16,
            amplitude: 32_767.0,
            cutoff_frequency: 5_000.0,
            attack: 0.1,
            decay: 0.2,
            sustain: 0.5,
            release: 0.1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = ScopeConfig::from_json_str(
            r#"{ "width": 1000, "sonification": true, "audio": { "cutoff_frequency": 2000.0 } }"#,
        )
        .unwrap();

        assert_eq!(config.width, 1000);
        assert_eq!(config.height, 500);
        assert!(config.sonification);
        assert_eq!(config.audio.cutoff_frequency, 2000.0);
        assert_eq!(config.audio.sample_rate, 44_100);
        assert_eq!(config.pause_key, Key::Space);
    }

    #[test]
    fn unknown_log_level_falls_back_to_info() {
        let config = ScopeConfig {
            log_level: Some("verbose".to_string()),
            ..Default::default()
        };
        assert_eq!(config.resolve_log_level(), (LogLevel::Info, true));

        let config = ScopeConfig {
            log_level: Some("WARNING".to_string()),
            ..Default::default()
        };
        assert_eq!(config.resolve_log_level(), (LogLevel::Warn, false));
    }

    #[test]
    fn colours_deserialize_from_triples() {
        let config = ScopeConfig::from_json_str(r#"{ "bar_color": [10, 20, 30] }"#).unwrap();
        assert_eq!(config.bar_color, Rgb(10, 20, 30));
    }
}
