use super::stage::{Animation, Stage};
use crate::renderer::{Compositor, FrameBuffer};
use crate::scene::{Rgba, SceneObject};
use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const MAX_FPS: u32 = 240;
/// Longest single fade or hold a stage will rasterize
pub const MAX_SPAN_SECONDS: f64 = 24.0 * 60.0 * 60.0;

/// On-disk format for rendered frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FrameFormat {
    #[default]
    Ppm,
    Png,
}

impl FrameFormat {
    pub fn extension(self) -> &'static str {
        match self {
            FrameFormat::Ppm => "ppm",
            FrameFormat::Png => "png",
        }
    }
}

/// Stage that rasterizes every animation step into numbered frame files
pub struct FrameStage {
    buffer: FrameBuffer,
    fps: u32,
    background: Rgba,
    output_dir: PathBuf,
    format: FrameFormat,
    frame: u32,
    on_stage: Vec<(SceneObject, f32)>,
}

impl FrameStage {
    pub fn new(
        output_dir: &Path,
        (width, height): (u32, u32),
        fps: u32,
        background: Rgba,
        format: FrameFormat,
    ) -> Result<Self> {
        if fps == 0 || fps > MAX_FPS {
            anyhow::bail!("FPS must be between 1 and {}, got {}", MAX_FPS, fps);
        }
        if width == 0 || height == 0 {
            anyhow::bail!("Resolution must be non-zero, got {}x{}", width, height);
        }
        std::fs::create_dir_all(output_dir).with_context(|| {
            format!("Failed to create output directory: {}", output_dir.display())
        })?;

        Ok(Self {
            buffer: FrameBuffer::new(width, height),
            fps,
            background,
            output_dir: output_dir.to_path_buf(),
            format,
            frame: 0,
            on_stage: Vec::new(),
        })
    }

    /// Number of frames spanning `seconds`; any positive span gets at least one
    pub fn frames_for(&self, seconds: f64) -> Result<u32> {
        if !seconds.is_finite() || seconds > MAX_SPAN_SECONDS {
            anyhow::bail!(
                "Cannot render a span of {}s, the limit is {}s",
                seconds,
                MAX_SPAN_SECONDS
            );
        }
        if seconds <= 0.0 {
            Ok(0)
        } else {
            Ok(((seconds * self.fps as f64).round() as u32).max(1))
        }
    }

    pub fn frames_written(&self) -> u32 {
        self.frame
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.buffer.dimensions()
    }

    /// printf-style pattern of the written frames, as FFmpeg's image2 demuxer expects
    pub fn frame_pattern(&self) -> PathBuf {
        self.output_dir
            .join(format!("frame_%d.{}", self.format.extension()))
    }

    fn frame_path(&self, frame: u32) -> PathBuf {
        self.output_dir
            .join(format!("frame_{}.{}", frame, self.format.extension()))
    }

    /// Compose the objects currently on stage and write the next frame
    fn render_frame(&mut self) -> Result<()> {
        self.buffer.clear(self.background);
        for (object, opacity) in &self.on_stage {
            Compositor::draw_object(&mut self.buffer, object, *opacity);
        }

        let path = self.frame_path(self.frame);
        match self.format {
            FrameFormat::Ppm => self.buffer.save_ppm(&path)?,
            FrameFormat::Png => self.buffer.save_png(&path)?,
        }

        if self.frame % self.fps.saturating_mul(5) == 0 {
            log::debug!("Rendered frame {}", self.frame);
        }
        self.frame += 1;
        Ok(())
    }
}

impl Stage for FrameStage {
    fn play(&mut self, animation: Animation<'_>, run_time: f64) -> Result<()> {
        let frames = self.frames_for(run_time)?;

        match animation {
            Animation::FadeIn(object) => {
                self.on_stage.push((object.clone(), 0.0));
                let idx = self.on_stage.len() - 1;
                for i in 1..=frames {
                    self.on_stage[idx].1 = i as f32 / frames as f32;
                    self.render_frame()?;
                }
                self.on_stage[idx].1 = 1.0;
            }
            Animation::FadeOut(objects) => {
                let leaving = |candidate: &SceneObject| objects.iter().any(|o| o.id == candidate.id);
                for i in 1..=frames {
                    let opacity = 1.0 - i as f32 / frames as f32;
                    for (object, alpha) in self.on_stage.iter_mut() {
                        if leaving(&*object) {
                            *alpha = opacity;
                        }
                    }
                    self.render_frame()?;
                }
                self.on_stage.retain(|(object, _)| !leaving(object));
            }
        }

        Ok(())
    }

    fn wait(&mut self, duration: f64) -> Result<()> {
        for _ in 0..self.frames_for(duration)? {
            self.render_frame()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Shape;
    use crate::templates::TemplateKind;

    fn white_square(id: usize) -> SceneObject {
        let mut object = SceneObject::new(TemplateKind::HighlightText, 0.0).with_id(id);
        object.push(Shape::Rect {
            x: 0.0,
            y: 0.0,
            width: 1920.0,
            height: 1080.0,
            color: [255, 255, 255, 255],
            filled: true,
        });
        object
    }

    #[test]
    fn test_frames_for() {
        let dir = tempfile::tempdir().unwrap();
        let stage = FrameStage::new(dir.path(), (16, 9), 30, [0, 0, 0, 255], FrameFormat::Ppm)
            .unwrap();

        assert_eq!(stage.frames_for(0.0).unwrap(), 0);
        assert_eq!(stage.frames_for(-1.0).unwrap(), 0);
        assert_eq!(stage.frames_for(0.001).unwrap(), 1);
        assert_eq!(stage.frames_for(0.5).unwrap(), 15);
        assert_eq!(stage.frames_for(2.0).unwrap(), 60);
    }

    #[test]
    fn test_rejects_unbounded_spans() {
        let dir = tempfile::tempdir().unwrap();
        let mut stage =
            FrameStage::new(dir.path(), (16, 9), 30, [0, 0, 0, 255], FrameFormat::Ppm).unwrap();

        assert!(stage.frames_for(MAX_SPAN_SECONDS).is_ok());
        assert!(stage.frames_for(1e12).is_err());
        assert!(stage.frames_for(f64::INFINITY).is_err());
        assert!(stage.wait(1e12).is_err());
        assert_eq!(stage.frames_written(), 0);
    }

    #[test]
    fn test_fade_cycle_writes_frames() {
        let dir = tempfile::tempdir().unwrap();
        let mut stage =
            FrameStage::new(dir.path(), (16, 9), 10, [0, 0, 0, 255], FrameFormat::Png).unwrap();
        let object = white_square(1);

        stage.play(Animation::FadeIn(&object), 0.5).unwrap();
        stage.wait(0.3).unwrap();
        stage
            .play(Animation::FadeOut(std::slice::from_ref(&object)), 0.2)
            .unwrap();

        assert_eq!(stage.frames_written(), 5 + 3 + 2);
        assert!(dir.path().join("frame_0.png").exists());
        assert!(dir.path().join("frame_9.png").exists());
        assert!(!dir.path().join("frame_10.png").exists());

        // Fully faded in while holding
        let held = image::open(dir.path().join("frame_6.png")).unwrap().to_rgba8();
        assert_eq!(held.get_pixel(8, 4).0, [255, 255, 255, 255]);

        // Gone after the fade-out completes
        let last = image::open(dir.path().join("frame_9.png")).unwrap().to_rgba8();
        assert_eq!(last.get_pixel(8, 4).0, [0, 0, 0, 255]);
        assert!(stage.on_stage.is_empty());
    }

    #[test]
    fn test_rejects_out_of_range_fps() {
        let dir = tempfile::tempdir().unwrap();
        assert!(FrameStage::new(dir.path(), (16, 9), 0, [0, 0, 0, 255], FrameFormat::Ppm).is_err());
        assert!(
            FrameStage::new(dir.path(), (16, 9), u32::MAX, [0, 0, 0, 255], FrameFormat::Ppm)
                .is_err()
        );
        assert!(
            FrameStage::new(dir.path(), (16, 9), MAX_FPS, [0, 0, 0, 255], FrameFormat::Ppm)
                .is_ok()
        );
    }

    #[test]
    fn test_frame_pattern() {
        let dir = tempfile::tempdir().unwrap();
        let stage = FrameStage::new(dir.path(), (16, 9), 30, [0, 0, 0, 255], FrameFormat::Ppm)
            .unwrap();
        assert_eq!(stage.frame_pattern(), dir.path().join("frame_%d.ppm"));
    }
}
