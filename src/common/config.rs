use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;
use thiserror::Error;

use super::pixel::SurfacePixel;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("partition row {partition} must lie inside the screen height {height}")]
    Partition { partition: usize, height: usize },
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// mmap the video device
    #[default]
    Device,
    /// In-memory surface mirrored into a desktop window
    Window,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub backend: Backend,
    pub devices: DeviceConfig,
    pub screen: ScreenConfig,
    pub glyphs: GlyphConfig,
    pub timer: TimerConfig,
    pub monitor: MonitorConfig,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct DeviceConfig {
    pub video: PathBuf,
    pub serial: String,
    pub timer: PathBuf,
    pub baud_rate: u32,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            video: PathBuf::from("/dev/vga_driver"),
            serial: String::from("/dev/ttyPS0"),
            timer: PathBuf::from("/dev/timer_driver"),
            baud_rate: 115_200,
        }
    }
}

#[derive(Deserialize, Debug, Clone, Copy)]
#[serde(default)]
pub struct ScreenConfig {
    pub width: usize,
    pub height: usize,
    /// First row of the status region; rows above it scroll.
    pub partition: usize,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            partition: 394,
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct GlyphConfig {
    pub sheet: PathBuf,
    pub sheet_width: usize,
    pub sheet_height: usize,
    pub cell_width: usize,
    pub cell_height: usize,
    pub glyph_width: usize,
    pub glyph_height: usize,
    /// Lines that get one extra pixel of spacing below them.
    pub padded_lines: usize,
}

impl Default for GlyphConfig {
    fn default() -> Self {
        Self {
            sheet: PathBuf::from("example2.raw"),
            sheet_width: 192,
            sheet_height: 368,
            cell_width: 12,
            cell_height: 23,
            glyph_width: 10,
            glyph_height: 21,
            padded_lines: 17,
        }
    }
}

#[derive(Deserialize, Debug, Clone, Copy)]
#[serde(default)]
pub struct TimerConfig {
    pub frequency_hz: u32,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            frequency_hz: 100_000_000,
        }
    }
}

#[derive(Deserialize, Debug, Clone, Copy)]
#[serde(default)]
pub struct MonitorConfig {
    pub sample_period_ms: u64,
    pub background: u32,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            sample_period_ms: 250,
            background: 0xFF9C_3C13,
        }
    }
}

impl MonitorConfig {
    pub fn sample_period(&self) -> Duration {
        Duration::from_millis(self.sample_period_ms)
    }

    pub fn background(&self) -> SurfacePixel {
        SurfacePixel(self.background)
    }
}

impl Config {
    pub fn from_toml(path: &Path, text: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        Self::from_toml(path, &text)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.screen.partition == 0 || self.screen.partition >= self.screen.height {
            return Err(ConfigError::Partition {
                partition: self.screen.partition,
                height: self.screen.height,
            });
        }
        Ok(())
    }
}
