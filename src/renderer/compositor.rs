use crate::renderer::FrameBuffer;
use crate::scene::{SceneObject, Shape, CANVAS_HEIGHT, CANVAS_WIDTH, GLYPH_ASPECT};
use image::RgbaImage;
use unicode_segmentation::UnicodeSegmentation;

/// Draws scene objects into a frame buffer
pub struct Compositor;

/// Scale an RGBA color's alpha by `opacity`
fn fade(color: [u8; 4], opacity: f32) -> [u8; 4] {
    let alpha = (color[3] as f32 * opacity.clamp(0.0, 1.0)).round() as u8;
    [color[0], color[1], color[2], alpha]
}

impl Compositor {
    /// Draw every shape of `object` at the given opacity, mapping the logical
    /// canvas onto the buffer's resolution
    pub fn draw_object(buffer: &mut FrameBuffer, object: &SceneObject, opacity: f32) {
        if opacity <= 0.0 {
            return;
        }
        let (width, height) = buffer.dimensions();
        let sx = width as f32 / CANVAS_WIDTH;
        let sy = height as f32 / CANVAS_HEIGHT;
        let thickness_scale = sx.min(sy);

        for shape in &object.shapes {
            match shape {
                Shape::Text {
                    content,
                    x,
                    y,
                    size,
                    color,
                } => Self::draw_text_placeholder(
                    buffer,
                    content,
                    (x * sx) as i32,
                    (y * sy) as i32,
                    size * thickness_scale,
                    fade(*color, opacity),
                ),
                Shape::Rect {
                    x,
                    y,
                    width,
                    height,
                    color,
                    filled,
                } => {
                    let (px, py) = ((x * sx) as i32, (y * sy) as i32);
                    let (pw, ph) = ((width * sx).max(1.0) as u32, (height * sy).max(1.0) as u32);
                    if *filled {
                        Self::fill_rect(buffer, px, py, pw, ph, fade(*color, opacity));
                    } else {
                        let t = (3.0 * thickness_scale).max(1.0) as u32;
                        Self::stroke_rect(buffer, px, py, pw, ph, t, fade(*color, opacity));
                    }
                }
                Shape::Line {
                    from,
                    to,
                    thickness,
                    color,
                } => Self::draw_line(
                    buffer,
                    (from.0 * sx, from.1 * sy),
                    (to.0 * sx, to.1 * sy),
                    thickness * thickness_scale,
                    fade(*color, opacity),
                ),
                Shape::Polyline {
                    points,
                    thickness,
                    color,
                } => {
                    for pair in points.windows(2) {
                        Self::draw_line(
                            buffer,
                            (pair[0].0 * sx, pair[0].1 * sy),
                            (pair[1].0 * sx, pair[1].1 * sy),
                            thickness * thickness_scale,
                            fade(*color, opacity),
                        );
                    }
                }
                Shape::Image {
                    image,
                    x,
                    y,
                    width,
                    height,
                } => Self::draw_image(
                    buffer,
                    image,
                    (x * sx) as i32,
                    (y * sy) as i32,
                    (width * sx) as u32,
                    (height * sy) as u32,
                    opacity,
                ),
            }
        }
    }

    /// Fill rectangle with color
    pub fn fill_rect(
        buffer: &mut FrameBuffer,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        color: [u8; 4],
    ) {
        let (buf_width, buf_height) = buffer.dimensions();

        for dy in 0..height {
            for dx in 0..width {
                let px = x + dx as i32;
                let py = y + dy as i32;

                if px >= 0 && py >= 0 && (px as u32) < buf_width && (py as u32) < buf_height {
                    buffer.blend_pixel(px as u32, py as u32, color);
                }
            }
        }
    }

    /// Outline a rectangle; the border grows inwards
    pub fn stroke_rect(
        buffer: &mut FrameBuffer,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        thickness: u32,
        color: [u8; 4],
    ) {
        let t = thickness.min(width / 2).min(height / 2).max(1);
        Self::fill_rect(buffer, x, y, width, t, color);
        Self::fill_rect(buffer, x, y + height.saturating_sub(t) as i32, width, t, color);
        Self::fill_rect(buffer, x, y + t as i32, t, height.saturating_sub(2 * t), color);
        Self::fill_rect(
            buffer,
            x + width.saturating_sub(t) as i32,
            y + t as i32,
            t,
            height.saturating_sub(2 * t),
            color,
        );
    }

    /// Draw a segment of the given thickness. Each pixel is blended at most once.
    pub fn draw_line(
        buffer: &mut FrameBuffer,
        from: (f32, f32),
        to: (f32, f32),
        thickness: f32,
        color: [u8; 4],
    ) {
        let (buf_width, buf_height) = buffer.dimensions();
        let radius = (thickness / 2.0).max(0.5);

        let min_x = (from.0.min(to.0) - radius).floor().max(0.0) as u32;
        let min_y = (from.1.min(to.1) - radius).floor().max(0.0) as u32;
        let max_x = ((from.0.max(to.0) + radius).ceil().max(0.0) as u32).min(buf_width);
        let max_y = ((from.1.max(to.1) + radius).ceil().max(0.0) as u32).min(buf_height);

        let (dx, dy) = (to.0 - from.0, to.1 - from.1);
        let len_sq = dx * dx + dy * dy;

        for py in min_y..max_y {
            for px in min_x..max_x {
                let (cx, cy) = (px as f32 + 0.5, py as f32 + 0.5);
                let t = if len_sq == 0.0 {
                    0.0
                } else {
                    (((cx - from.0) * dx + (cy - from.1) * dy) / len_sq).clamp(0.0, 1.0)
                };
                let (nx, ny) = (from.0 + t * dx, from.1 + t * dy);
                let dist_sq = (cx - nx).powi(2) + (cy - ny).powi(2);
                if dist_sq <= radius * radius {
                    buffer.blend_pixel(px, py, color);
                }
            }
        }
    }

    /// Draw text as one block per grapheme cluster; whitespace leaves a gap
    pub fn draw_text_placeholder(
        buffer: &mut FrameBuffer,
        text: &str,
        x: i32,
        y: i32,
        size: f32,
        color: [u8; 4],
    ) {
        let advance = size * GLYPH_ASPECT;
        let glyph_w = (advance * 0.8).max(1.0) as u32;
        let glyph_h = (size * 0.75).max(1.0) as u32;
        let baseline_offset = (size * 0.15) as i32;

        for (i, grapheme) in text.graphemes(true).enumerate() {
            if grapheme.trim().is_empty() {
                continue;
            }
            let gx = x + (i as f32 * advance) as i32;
            Self::fill_rect(buffer, gx, y + baseline_offset, glyph_w, glyph_h, color);
        }
    }

    /// Nearest-neighbour blit of `image` scaled into the target rectangle
    pub fn draw_image(
        buffer: &mut FrameBuffer,
        image: &RgbaImage,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        opacity: f32,
    ) {
        if width == 0 || height == 0 || image.width() == 0 || image.height() == 0 {
            return;
        }
        let (buf_width, buf_height) = buffer.dimensions();

        for dy in 0..height {
            let py = y + dy as i32;
            if py < 0 || py as u32 >= buf_height {
                continue;
            }
            let src_y = (dy as u64 * image.height() as u64 / height as u64) as u32;
            for dx in 0..width {
                let px = x + dx as i32;
                if px < 0 || px as u32 >= buf_width {
                    continue;
                }
                let src_x = (dx as u64 * image.width() as u64 / width as u64) as u32;
                let pixel = image.get_pixel(src_x, src_y).0;
                buffer.blend_pixel(px as u32, py as u32, fade(pixel, opacity));
            }
        }
    }
}
