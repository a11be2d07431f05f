use anyhow::{bail, Context, Result};
use std::path::Path;
use std::process::Command;

/// Turns a numbered frame sequence into an H.264 video with an external FFmpeg
#[derive(Debug, Clone, Copy)]
pub struct VideoEncoder {
    fps: u32,
    dimensions: (u32, u32),
}

impl VideoEncoder {
    pub fn new(fps: u32, dimensions: (u32, u32)) -> Self {
        Self { fps, dimensions }
    }

    pub fn is_available() -> bool {
        Command::new("ffmpeg").arg("-version").output().is_ok()
    }

    /// FFmpeg invocation reading `frame_pattern` (printf-style, e.g. `frame_%d.png`)
    pub fn command(&self, frame_pattern: &Path, output_path: &Path) -> Command {
        let (width, height) = self.dimensions;
        let mut cmd = Command::new("ffmpeg");
        cmd.args(["-y", "-loglevel", "error", "-f", "image2", "-framerate"])
            .arg(self.fps.to_string())
            .arg("-i")
            .arg(frame_pattern)
            .args(["-c:v", "libx264", "-pix_fmt", "yuv420p", "-s"])
            .arg(format!("{}x{}", width, height))
            .arg(output_path);
        cmd
    }

    pub fn encode(&self, frame_pattern: &Path, output_path: &Path) -> Result<()> {
        if !Self::is_available() {
            bail!("FFmpeg not found. Install ffmpeg or render without --encode.");
        }

        log::info!("Encoding video to {}", output_path.display());
        let status = self
            .command(frame_pattern, output_path)
            .status()
            .context("Failed to execute ffmpeg")?;

        if !status.success() {
            bail!("FFmpeg encoding failed with {}", status);
        }
        Ok(())
    }
}
