use crate::templates::TemplateKind;
use image::RgbaImage;
use std::sync::Arc;
use unicode_segmentation::UnicodeSegmentation;

/// Logical canvas templates lay out on; stages scale it to the output resolution
pub const CANVAS_WIDTH: f32 = 1920.0;
pub const CANVAS_HEIGHT: f32 = 1080.0;

/// Glyph cell width as a fraction of the font size
pub const GLYPH_ASPECT: f32 = 0.6;

pub type Rgba = [u8; 4];

pub const WHITE: Rgba = [255, 255, 255, 255];
pub const GREY: Rgba = [170, 170, 170, 255];
pub const ACCENT: Rgba = [88, 196, 221, 255];
pub const HIGHLIGHT: Rgba = [255, 214, 10, 160];

/// Primitive drawable, in canvas coordinates
#[derive(Debug, Clone)]
pub enum Shape {
    Text {
        content: String,
        x: f32,
        y: f32,
        size: f32,
        color: Rgba,
    },
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: Rgba,
        filled: bool,
    },
    Line {
        from: (f32, f32),
        to: (f32, f32),
        thickness: f32,
        color: Rgba,
    },
    Polyline {
        points: Vec<(f32, f32)>,
        thickness: f32,
        color: Rgba,
    },
    Image {
        image: Arc<RgbaImage>,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
}

impl Shape {
    /// Text whose top-left corner sits at `(x, y)`
    pub fn text(content: impl Into<String>, x: f32, y: f32, size: f32, color: Rgba) -> Self {
        Shape::Text {
            content: content.into(),
            x,
            y,
            size,
            color,
        }
    }

    /// Text horizontally centred on `cx`
    pub fn centered_text(content: impl Into<String>, cx: f32, y: f32, size: f32, color: Rgba) -> Self {
        let content = content.into();
        let x = cx - text_width(&content, size) / 2.0;
        Shape::text(content, x, y, size, color)
    }
}

/// Width of a run of text, measured in grapheme clusters
pub fn text_width(text: &str, size: f32) -> f32 {
    text.graphemes(true).count() as f32 * size * GLYPH_ASPECT
}

/// Renderable produced by a template constructor
#[derive(Debug, Clone)]
pub struct SceneObject {
    pub id: usize,
    pub template: TemplateKind,
    /// Passed through from the timeline entry untouched
    pub timestamp: f64,
    pub shapes: Vec<Shape>,
}

impl SceneObject {
    pub fn new(template: TemplateKind, timestamp: f64) -> Self {
        Self {
            id: 0,
            template,
            timestamp,
            shapes: Vec::new(),
        }
    }

    pub fn push(&mut self, shape: Shape) -> &mut Self {
        self.shapes.push(shape);
        self
    }

    pub fn with_id(mut self, id: usize) -> Self {
        self.id = id;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_width_counts_graphemes() {
        assert!((text_width("abc", 10.0) - 18.0).abs() < 1e-3);
        // "é" written as e + combining accent is one cluster
        assert!((text_width("e\u{301}", 10.0) - 6.0).abs() < 1e-3);
    }

    #[test]
    fn test_centered_text() {
        match Shape::centered_text("abcd", 100.0, 0.0, 10.0, WHITE) {
            Shape::Text { x, .. } => assert!((x - 88.0).abs() < 1e-3),
            other => panic!("Expected text shape, got {:?}", other),
        }
    }
}
