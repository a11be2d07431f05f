use crate::renderer::FrameFormat;
use crate::scene::Rgba;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AppConfig {
    pub render: RenderConfig,
    pub video: VideoConfig,
    #[serde(default)]
    pub assets: AssetsConfig,
    #[serde(default)]
    pub timeline: TimelineConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RenderConfig {
    pub output_dir: PathBuf,
    pub frame_format: FrameFormat,
    /// Run FFmpeg over the frames after rendering
    pub encode: bool,
    pub video_path: PathBuf,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct VideoConfig {
    pub resolution: String,
    pub fps: u32,
    pub background: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct AssetsConfig {
    /// Root for relative image paths; the timeline's directory when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_path: Option<PathBuf>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct TimelineConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            render: RenderConfig {
                output_dir: PathBuf::from("output"),
                frame_format: FrameFormat::Ppm,
                encode: false,
                video_path: PathBuf::from("output.mp4"),
            },
            video: VideoConfig {
                resolution: "1920x1080".to_string(),
                fps: 30,
                background: "#000000".to_string(),
            },
            assets: AssetsConfig::default(),
            timeline: TimelineConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from("storyboard")
    }

    /// Load defaults, then `<name>.toml` if present, then `STORYBOARD__*` variables
    pub fn load_from(name: &str) -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            .set_default("render.output_dir", "output")?
            .set_default("render.frame_format", "ppm")?
            .set_default("render.encode", false)?
            .set_default("render.video_path", "output.mp4")?
            .set_default("video.resolution", "1920x1080")?
            .set_default("video.fps", 30)?
            .set_default("video.background", "#000000")?
            .add_source(config::File::with_name(name).required(false))
            // e.g. STORYBOARD__VIDEO__FPS=60
            .add_source(
                config::Environment::with_prefix("STORYBOARD")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }
}

impl VideoConfig {
    pub fn dimensions(&self) -> Result<(u32, u32)> {
        parse_resolution(&self.resolution)
    }

    pub fn background_rgba(&self) -> Result<Rgba> {
        parse_hex_color(&self.background)
    }
}

/// Parse `WIDTHxHEIGHT`, e.g. `1280x720`
pub fn parse_resolution(value: &str) -> Result<(u32, u32)> {
    let Some((w, h)) = value.trim().split_once(['x', 'X']) else {
        bail!("Invalid resolution '{}', expected WIDTHxHEIGHT", value);
    };
    let width: u32 = w
        .trim()
        .parse()
        .with_context(|| format!("Invalid width in resolution '{}'", value))?;
    let height: u32 = h
        .trim()
        .parse()
        .with_context(|| format!("Invalid height in resolution '{}'", value))?;
    if width == 0 || height == 0 {
        bail!("Resolution must be non-zero, got '{}'", value);
    }
    Ok((width, height))
}

/// Parse `#RRGGBB` into an opaque color
pub fn parse_hex_color(value: &str) -> Result<Rgba> {
    let hex = value.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        bail!("Invalid color '{}', expected #RRGGBB", value);
    }
    let channel = |i: usize| {
        u8::from_str_radix(&hex[i..i + 2], 16)
            .with_context(|| format!("Invalid color '{}', expected #RRGGBB", value))
    };
    Ok([channel(0)?, channel(2)?, channel(4)?, 255])
}
