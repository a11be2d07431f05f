use crate::scene::Rgba;
use anyhow::{Context, Result};
use image::RgbaImage;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Opaque RGBA canvas that frames are composited into
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    image: RgbaImage,
}

impl FrameBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
        }
    }

    pub fn clear(&mut self, color: Rgba) {
        for pixel in self.image.pixels_mut() {
            pixel.0 = color;
        }
    }

    /// Out-of-bounds writes are ignored
    pub fn set_pixel(&mut self, x: u32, y: u32, color: Rgba) {
        if let Some(pixel) = self.image.get_pixel_mut_checked(x, y) {
            pixel.0 = color;
        }
    }

    pub fn get_pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        self.image.get_pixel_checked(x, y).map(|pixel| pixel.0)
    }

    /// Source-over blend; the result stays opaque
    pub fn blend_pixel(&mut self, x: u32, y: u32, color: Rgba) {
        if color[3] == 0 {
            return;
        }
        let Some(pixel) = self.image.get_pixel_mut_checked(x, y) else {
            return;
        };

        let alpha = color[3] as f32 / 255.0;
        let mix = |src: u8, dst: u8| (src as f32 * alpha + dst as f32 * (1.0 - alpha)) as u8;
        let dst = pixel.0;
        pixel.0 = [
            mix(color[0], dst[0]),
            mix(color[1], dst[1]),
            mix(color[2], dst[2]),
            255,
        ];
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    pub fn as_image(&self) -> &RgbaImage {
        &self.image
    }

    /// Binary PPM (P6); alpha is dropped
    pub fn save_ppm(&self, path: &Path) -> Result<()> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create frame file: {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        let (width, height) = self.dimensions();

        write!(writer, "P6\n{} {}\n255\n", width, height)?;
        for pixel in self.image.pixels() {
            writer.write_all(&pixel.0[..3])?;
        }

        writer.flush()?;
        Ok(())
    }

    pub fn save_png(&self, path: &Path) -> Result<()> {
        self.image
            .save_with_format(path, image::ImageFormat::Png)
            .with_context(|| format!("Failed to write frame file: {}", path.display()))
    }
}
