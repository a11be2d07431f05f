//! Constructors behind each [`TemplateKind`]. Layout is done on the logical
//! canvas; the stage takes care of scaling.

use super::expression::Expr;
use super::{TemplateContext, TemplateKind};
use crate::errors::TemplateError;
use crate::scene::{
    text_width, SceneObject, Shape, ACCENT, CANVAS_HEIGHT, CANVAS_WIDTH, GLYPH_ASPECT, GREY,
    HIGHLIGHT, WHITE,
};
use std::path::Path;
use std::sync::Arc;
use unicode_segmentation::UnicodeSegmentation;

const TITLE_SIZE: f32 = 96.0;
const HEADING_SIZE: f32 = 64.0;
const BODY_SIZE: f32 = 44.0;
const MARGIN: f32 = 160.0;
const LINE_SPACING: f32 = 1.5;

const PLOT_RANGE: (f64, f64) = (-10.0, 10.0);
const PLOT_SAMPLES: usize = 241;

fn require_text(content: &str) -> Result<&str, TemplateError> {
    let text = content.trim();
    if text.is_empty() {
        Err(TemplateError::EmptyContent)
    } else {
        Ok(text)
    }
}

fn non_empty_lines(content: &str) -> Result<Vec<&str>, TemplateError> {
    let lines: Vec<&str> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    if lines.is_empty() {
        Err(TemplateError::EmptyContent)
    } else {
        Ok(lines)
    }
}

/// Greedy word wrap to `max_width` canvas units
fn wrap(text: &str, size: f32, max_width: f32) -> Vec<String> {
    let max_cols = ((max_width / (size * GLYPH_ASPECT)) as usize).max(1);
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let needed = current.graphemes(true).count()
            + usize::from(!current.is_empty())
            + word.graphemes(true).count();
        if !current.is_empty() && needed > max_cols {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Top y that vertically centres `count` lines of `size`
fn stacked_top(count: usize, size: f32) -> f32 {
    (CANVAS_HEIGHT - count as f32 * size * LINE_SPACING) / 2.0
}

fn centered_block(object: &mut SceneObject, lines: &[String], size: f32, color: [u8; 4]) {
    let top = stacked_top(lines.len(), size);
    for (i, line) in lines.iter().enumerate() {
        let y = top + i as f32 * size * LINE_SPACING;
        object.push(Shape::centered_text(line.as_str(), CANVAS_WIDTH / 2.0, y, size, color));
    }
}

fn wrap_all(lines: &[&str], size: f32, max_width: f32) -> Vec<String> {
    lines
        .iter()
        .flat_map(|line| wrap(line, size, max_width))
        .collect()
}

/// Left-aligned list with a marker column; returns the y after the last row
fn marked_list(
    object: &mut SceneObject,
    items: &[&str],
    top: f32,
    marker: impl Fn(usize) -> Option<String>,
) -> f32 {
    let row = BODY_SIZE * LINE_SPACING;
    let text_x = MARGIN + BODY_SIZE * 2.0;
    let mut y = top;

    for (i, item) in items.iter().enumerate() {
        match marker(i) {
            Some(label) => {
                object.push(Shape::text(label, MARGIN, y, BODY_SIZE, ACCENT));
            }
            None => {
                let dot = BODY_SIZE * 0.3;
                object.push(Shape::Rect {
                    x: MARGIN + dot,
                    y: y + (BODY_SIZE - dot) / 2.0,
                    width: dot,
                    height: dot,
                    color: ACCENT,
                    filled: true,
                });
            }
        }
        for (j, line) in wrap(item, BODY_SIZE, CANVAS_WIDTH - text_x - MARGIN)
            .into_iter()
            .enumerate()
        {
            if j > 0 {
                y += row;
            }
            object.push(Shape::text(line, text_x, y, BODY_SIZE, WHITE));
        }
        y += row;
    }
    y
}

pub fn text_intro(
    content: &str,
    timestamp: f64,
    _ctx: &TemplateContext,
) -> Result<SceneObject, TemplateError> {
    let lines = non_empty_lines(require_text(content)?)?;
    let mut object = SceneObject::new(TemplateKind::TextIntro, timestamp);

    let title = wrap(lines[0], TITLE_SIZE, CANVAS_WIDTH - 2.0 * MARGIN);
    let subtitle = wrap_all(&lines[1..], BODY_SIZE, CANVAS_WIDTH - 2.0 * MARGIN);
    let height = title.len() as f32 * TITLE_SIZE * LINE_SPACING
        + subtitle.len() as f32 * BODY_SIZE * LINE_SPACING;
    let mut y = (CANVAS_HEIGHT - height) / 2.0;

    let mut widest: f32 = 0.0;
    for line in &title {
        widest = widest.max(text_width(line, TITLE_SIZE));
        object.push(Shape::centered_text(line.as_str(), CANVAS_WIDTH / 2.0, y, TITLE_SIZE, WHITE));
        y += TITLE_SIZE * LINE_SPACING;
    }

    let rule_y = y - TITLE_SIZE * (LINE_SPACING - 1.0) / 2.0;
    object.push(Shape::Line {
        from: ((CANVAS_WIDTH - widest) / 2.0, rule_y),
        to: ((CANVAS_WIDTH + widest) / 2.0, rule_y),
        thickness: 4.0,
        color: ACCENT,
    });

    for line in &subtitle {
        object.push(Shape::centered_text(line.as_str(), CANVAS_WIDTH / 2.0, y, BODY_SIZE, GREY));
        y += BODY_SIZE * LINE_SPACING;
    }

    Ok(object)
}

pub fn text_outro(
    content: &str,
    timestamp: f64,
    _ctx: &TemplateContext,
) -> Result<SceneObject, TemplateError> {
    let lines = non_empty_lines(require_text(content)?)?;
    let mut object = SceneObject::new(TemplateKind::TextOutro, timestamp);

    let wrapped = wrap_all(&lines, HEADING_SIZE, CANVAS_WIDTH - 2.0 * MARGIN);
    let top = stacked_top(wrapped.len(), HEADING_SIZE);
    object.push(Shape::Line {
        from: (CANVAS_WIDTH / 2.0 - 120.0, top - HEADING_SIZE),
        to: (CANVAS_WIDTH / 2.0 + 120.0, top - HEADING_SIZE),
        thickness: 4.0,
        color: ACCENT,
    });
    centered_block(&mut object, &wrapped, HEADING_SIZE, WHITE);

    Ok(object)
}

pub fn bullet_points(
    content: &str,
    timestamp: f64,
    _ctx: &TemplateContext,
) -> Result<SceneObject, TemplateError> {
    let items = non_empty_lines(content)?;
    let mut object = SceneObject::new(TemplateKind::BulletPoints, timestamp);

    let top = stacked_top(items.len(), BODY_SIZE);
    marked_list(&mut object, &items, top, |_| None);

    Ok(object)
}

/// First line is the image path, anything after it a caption
pub fn image_display(
    content: &str,
    timestamp: f64,
    ctx: &TemplateContext,
) -> Result<SceneObject, TemplateError> {
    let lines = non_empty_lines(content)?;
    let path = ctx.resolve(Path::new(lines[0]));
    let image = image::open(&path)
        .map_err(|source| TemplateError::Image {
            path: path.clone(),
            source,
        })?
        .to_rgba8();

    let mut object = SceneObject::new(TemplateKind::ImageDisplay, timestamp);
    let caption = wrap_all(&lines[1..], BODY_SIZE, CANVAS_WIDTH - 2.0 * MARGIN);
    let caption_height = caption.len() as f32 * BODY_SIZE * LINE_SPACING;

    let (w, h) = (image.width().max(1) as f32, image.height().max(1) as f32);
    let max_w = CANVAS_WIDTH - 2.0 * MARGIN;
    let max_h = CANVAS_HEIGHT - 2.0 * MARGIN * 0.75 - caption_height;
    let scale = (max_w / w).min(max_h / h);
    let (width, height) = (w * scale, h * scale);
    let x = (CANVAS_WIDTH - width) / 2.0;
    let y = (CANVAS_HEIGHT - height - caption_height) / 2.0;

    object.push(Shape::Image {
        image: Arc::new(image),
        x,
        y,
        width,
        height,
    });

    let mut caption_y = y + height + BODY_SIZE * (LINE_SPACING - 1.0);
    for line in &caption {
        object.push(Shape::centered_text(line.as_str(), CANVAS_WIDTH / 2.0, caption_y, BODY_SIZE, GREY));
        caption_y += BODY_SIZE * LINE_SPACING;
    }

    Ok(object)
}

pub fn equation_display(
    content: &str,
    timestamp: f64,
    _ctx: &TemplateContext,
) -> Result<SceneObject, TemplateError> {
    let lines: Vec<String> = non_empty_lines(content)?
        .into_iter()
        .map(String::from)
        .collect();
    let mut object = SceneObject::new(TemplateKind::EquationDisplay, timestamp);

    let widest = lines
        .iter()
        .map(|line| text_width(line, HEADING_SIZE))
        .fold(0.0_f32, f32::max);
    let padding = HEADING_SIZE;
    let height = lines.len() as f32 * HEADING_SIZE * LINE_SPACING;
    let top = stacked_top(lines.len(), HEADING_SIZE);

    object.push(Shape::Rect {
        x: (CANVAS_WIDTH - widest) / 2.0 - padding,
        y: top - padding / 2.0,
        width: widest + 2.0 * padding,
        height: height + padding / 2.0,
        color: ACCENT,
        filled: false,
    });
    centered_block(&mut object, &lines, HEADING_SIZE, WHITE);

    Ok(object)
}

pub fn step_by_step(
    content: &str,
    timestamp: f64,
    _ctx: &TemplateContext,
) -> Result<SceneObject, TemplateError> {
    let steps = non_empty_lines(content)?;
    let mut object = SceneObject::new(TemplateKind::StepByStep, timestamp);

    let top = stacked_top(steps.len(), BODY_SIZE);
    marked_list(&mut object, &steps, top, |i| Some(format!("{}.", i + 1)));

    Ok(object)
}

/// Plots `y = f(x)` over a fixed window, autoscaling the y axis
pub fn graph_plot(
    content: &str,
    timestamp: f64,
    _ctx: &TemplateContext,
) -> Result<SceneObject, TemplateError> {
    let equation = require_text(content)?;
    let expr = Expr::parse(equation)?;
    let mut object = SceneObject::new(TemplateKind::GraphPlot, timestamp);

    let (x_min, x_max) = PLOT_RANGE;
    let samples: Vec<(f64, f64)> = (0..PLOT_SAMPLES)
        .map(|i| {
            let x = x_min + (x_max - x_min) * i as f64 / (PLOT_SAMPLES - 1) as f64;
            (x, expr.eval(x))
        })
        .collect();

    let finite = samples.iter().map(|&(_, y)| y).filter(|y| y.is_finite());
    let (mut y_min, mut y_max) = finite.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), y| {
        (lo.min(y), hi.max(y))
    });
    if !y_min.is_finite() || !y_max.is_finite() {
        (y_min, y_max) = (-1.0, 1.0);
    } else if (y_max - y_min).abs() < 1e-9 {
        y_min -= 1.0;
        y_max += 1.0;
    }

    let area_x = MARGIN;
    let area_y = MARGIN;
    let area_w = CANVAS_WIDTH - 2.0 * MARGIN;
    let area_h = CANVAS_HEIGHT - 2.0 * MARGIN;
    let to_canvas = |x: f64, y: f64| -> (f32, f32) {
        let px = area_x as f64 + (x - x_min) / (x_max - x_min) * area_w as f64;
        let py = area_y as f64 + (y_max - y) / (y_max - y_min) * area_h as f64;
        (px as f32, py as f32)
    };

    object.push(Shape::text(equation, MARGIN, MARGIN / 3.0, BODY_SIZE, WHITE));

    // Axes through the origin when it is in view, otherwise along the frame
    let axis_y = if (y_min..=y_max).contains(&0.0) { 0.0 } else { y_min };
    let axis_x = if (x_min..=x_max).contains(&0.0) { 0.0 } else { x_min };
    object.push(Shape::Line {
        from: to_canvas(x_min, axis_y),
        to: to_canvas(x_max, axis_y),
        thickness: 2.0,
        color: GREY,
    });
    object.push(Shape::Line {
        from: to_canvas(axis_x, y_min),
        to: to_canvas(axis_x, y_max),
        thickness: 2.0,
        color: GREY,
    });

    let mut segment = Vec::new();
    for &(x, y) in &samples {
        if y.is_finite() {
            segment.push(to_canvas(x, y));
        } else if !segment.is_empty() {
            object.push(Shape::Polyline {
                points: std::mem::take(&mut segment),
                thickness: 4.0,
                color: ACCENT,
            });
        }
    }
    if !segment.is_empty() {
        object.push(Shape::Polyline {
            points: segment,
            thickness: 4.0,
            color: ACCENT,
        });
    }

    Ok(object)
}

pub fn highlight_text(
    content: &str,
    timestamp: f64,
    _ctx: &TemplateContext,
) -> Result<SceneObject, TemplateError> {
    let lines = non_empty_lines(require_text(content)?)?;
    let mut object = SceneObject::new(TemplateKind::HighlightText, timestamp);

    let wrapped = wrap_all(&lines, HEADING_SIZE, CANVAS_WIDTH - 2.0 * MARGIN);
    let top = stacked_top(wrapped.len(), HEADING_SIZE);
    for (i, line) in wrapped.iter().enumerate() {
        let width = text_width(line, HEADING_SIZE);
        let y = top + i as f32 * HEADING_SIZE * LINE_SPACING;
        object.push(Shape::Rect {
            x: (CANVAS_WIDTH - width) / 2.0 - 12.0,
            y: y - 8.0,
            width: width + 24.0,
            height: HEADING_SIZE + 16.0,
            color: HIGHLIGHT,
            filled: true,
        });
    }
    centered_block(&mut object, &wrapped, HEADING_SIZE, WHITE);

    Ok(object)
}

/// `from -> to`, drawn as two expressions joined by an arrow
pub fn transformation(
    content: &str,
    timestamp: f64,
    _ctx: &TemplateContext,
) -> Result<SceneObject, TemplateError> {
    let text = require_text(content)?;
    let (from, to) = text
        .split_once("->")
        .map(|(a, b)| (a.trim(), b.trim()))
        .filter(|(a, b)| !a.is_empty() && !b.is_empty())
        .ok_or_else(|| TemplateError::Shape {
            expected: "'<from> -> <to>'",
            found: text.to_string(),
        })?;
    let mut object = SceneObject::new(TemplateKind::Transformation, timestamp);

    let quarter = CANVAS_WIDTH / 4.0;
    let column = quarter * 1.5;
    let y = (CANVAS_HEIGHT - HEADING_SIZE) / 2.0;
    for (cx, side) in [(quarter, from), (CANVAS_WIDTH - quarter, to)] {
        let lines = wrap(side, HEADING_SIZE, column);
        let top = stacked_top(lines.len(), HEADING_SIZE);
        for (i, line) in lines.iter().enumerate() {
            let ly = top + i as f32 * HEADING_SIZE * LINE_SPACING;
            object.push(Shape::centered_text(line.as_str(), cx, ly, HEADING_SIZE, WHITE));
        }
    }

    let mid_y = y + HEADING_SIZE / 2.0;
    let (start, end) = (CANVAS_WIDTH / 2.0 - 120.0, CANVAS_WIDTH / 2.0 + 120.0);
    object.push(Shape::Line {
        from: (start, mid_y),
        to: (end, mid_y),
        thickness: 6.0,
        color: ACCENT,
    });
    for dy in [-24.0, 24.0] {
        object.push(Shape::Line {
            from: (end - 32.0, mid_y + dy),
            to: (end, mid_y),
            thickness: 6.0,
            color: ACCENT,
        });
    }

    Ok(object)
}

/// `term: definition`; without a colon the whole text sits under a generic heading
pub fn definition_box(
    content: &str,
    timestamp: f64,
    _ctx: &TemplateContext,
) -> Result<SceneObject, TemplateError> {
    let text = require_text(content)?;
    let (term, body) = match text.split_once(':') {
        Some((term, body)) if !term.trim().is_empty() && !body.trim().is_empty() => {
            (term.trim(), body.trim())
        }
        _ => ("Definition", text),
    };
    let mut object = SceneObject::new(TemplateKind::DefinitionBox, timestamp);

    let box_w = CANVAS_WIDTH - 4.0 * MARGIN;
    let padding = BODY_SIZE;
    let body_lines = wrap(body, BODY_SIZE, box_w - 2.0 * padding);
    let box_h = HEADING_SIZE * LINE_SPACING
        + body_lines.len() as f32 * BODY_SIZE * LINE_SPACING
        + 2.0 * padding;
    let box_x = 2.0 * MARGIN;
    let box_y = (CANVAS_HEIGHT - box_h) / 2.0;

    object.push(Shape::Rect {
        x: box_x,
        y: box_y,
        width: box_w,
        height: box_h,
        color: ACCENT,
        filled: false,
    });
    object.push(Shape::text(term, box_x + padding, box_y + padding, HEADING_SIZE, ACCENT));

    let mut y = box_y + padding + HEADING_SIZE * LINE_SPACING;
    for line in body_lines {
        object.push(Shape::text(line, box_x + padding, y, BODY_SIZE, WHITE));
        y += BODY_SIZE * LINE_SPACING;
    }

    Ok(object)
}

pub fn proof_steps(
    content: &str,
    timestamp: f64,
    _ctx: &TemplateContext,
) -> Result<SceneObject, TemplateError> {
    let steps = non_empty_lines(content)?;
    let mut object = SceneObject::new(TemplateKind::ProofSteps, timestamp);

    let rows = steps.len() + 1;
    let top = stacked_top(rows, BODY_SIZE);
    object.push(Shape::text("Proof.", MARGIN, top - HEADING_SIZE, HEADING_SIZE, ACCENT));
    let end = marked_list(&mut object, &steps, top, |i| Some(format!("({})", i + 1)));
    object.push(Shape::text(
        "∎",
        CANVAS_WIDTH - MARGIN - BODY_SIZE,
        end,
        BODY_SIZE,
        WHITE,
    ));

    Ok(object)
}

/// `left|right`, rendered as two columns split by a divider
pub fn comparison(
    content: &str,
    timestamp: f64,
    _ctx: &TemplateContext,
) -> Result<SceneObject, TemplateError> {
    let text = require_text(content)?;
    let (left, right) = text
        .split_once('|')
        .map(|(a, b)| (a.trim(), b.trim()))
        .filter(|(a, b)| !a.is_empty() && !b.is_empty())
        .ok_or_else(|| TemplateError::Shape {
            expected: "'<left>|<right>'",
            found: text.to_string(),
        })?;
    let mut object = SceneObject::new(TemplateKind::Comparison, timestamp);

    object.push(Shape::Line {
        from: (CANVAS_WIDTH / 2.0, MARGIN),
        to: (CANVAS_WIDTH / 2.0, CANVAS_HEIGHT - MARGIN),
        thickness: 3.0,
        color: GREY,
    });

    let column = CANVAS_WIDTH / 2.0 - 1.5 * MARGIN;
    for (cx, side) in [(CANVAS_WIDTH / 4.0, left), (CANVAS_WIDTH * 0.75, right)] {
        let lines: Vec<String> = side
            .lines()
            .flat_map(|line| wrap(line, BODY_SIZE, column))
            .collect();
        let top = stacked_top(lines.len(), BODY_SIZE);
        for (i, line) in lines.iter().enumerate() {
            let y = top + i as f32 * BODY_SIZE * LINE_SPACING;
            object.push(Shape::centered_text(line.as_str(), cx, y, BODY_SIZE, WHITE));
        }
    }

    Ok(object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn ctx() -> TemplateContext {
        TemplateContext::default()
    }

    fn texts(object: &SceneObject) -> Vec<&str> {
        object
            .shapes
            .iter()
            .filter_map(|shape| match shape {
                Shape::Text { content, .. } => Some(content.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_wrap() {
        let lines = wrap("one two three four", 10.0, 66.0); // 11 columns
        assert_eq!(lines, vec!["one two", "three four"]);
        assert_eq!(wrap("", 10.0, 60.0), Vec::<String>::new());
    }

    #[test]
    fn test_text_templates_reject_blank_content() {
        assert!(matches!(
            text_intro("   ", 0.0, &ctx()),
            Err(TemplateError::EmptyContent)
        ));
        assert!(matches!(
            bullet_points("\n\n", 0.0, &ctx()),
            Err(TemplateError::EmptyContent)
        ));
    }

    #[test]
    fn test_timestamp_is_passed_through() {
        let object = text_outro("Bye", 42.5, &ctx()).unwrap();
        assert_eq!(object.timestamp, 42.5);
        assert_eq!(object.template, TemplateKind::TextOutro);
    }

    #[test]
    fn test_bullet_points_one_marker_per_line() {
        let object = bullet_points("a\n\nb\nc", 0.0, &ctx()).unwrap();
        assert_eq!(texts(&object), vec!["a", "b", "c"]);
        let markers = object
            .shapes
            .iter()
            .filter(|s| matches!(s, Shape::Rect { filled: true, .. }))
            .count();
        assert_eq!(markers, 3);
    }

    #[test]
    fn test_step_by_step_numbers_steps() {
        let object = step_by_step("first\nsecond", 0.0, &ctx()).unwrap();
        assert_eq!(texts(&object), vec!["1.", "first", "2.", "second"]);
    }

    #[test]
    fn test_comparison_requires_separator() {
        let object = comparison("2x+3|7", 0.0, &ctx()).unwrap();
        assert_eq!(texts(&object), vec!["2x+3", "7"]);

        assert!(matches!(
            comparison("no separator", 0.0, &ctx()),
            Err(TemplateError::Shape { .. })
        ));
    }

    #[test]
    fn test_transformation_requires_arrow() {
        let object = transformation("A -> B", 0.0, &ctx()).unwrap();
        assert_eq!(texts(&object), vec!["A", "B"]);
        assert!(transformation("A to B", 0.0, &ctx()).is_err());
    }

    #[test]
    fn test_definition_box_term_split() {
        let object = definition_box("Limit: the value approached", 0.0, &ctx()).unwrap();
        assert_eq!(texts(&object), vec!["Limit", "the value approached"]);

        let object = definition_box("no colon here", 0.0, &ctx()).unwrap();
        assert_eq!(texts(&object), vec!["Definition", "no colon here"]);
    }

    #[test]
    fn test_graph_plot() {
        let object = graph_plot("y = x^2", 0.0, &ctx()).unwrap();
        let curves: Vec<_> = object
            .shapes
            .iter()
            .filter_map(|s| match s {
                Shape::Polyline { points, .. } => Some(points.len()),
                _ => None,
            })
            .collect();
        assert_eq!(curves, vec![PLOT_SAMPLES]);
        assert_eq!(texts(&object), vec!["y = x^2"]);
    }

    #[test]
    fn test_graph_plot_splits_at_discontinuities() {
        // ln is undefined for x <= 0
        let object = graph_plot("ln(x)", 0.0, &ctx()).unwrap();
        let curves = object
            .shapes
            .iter()
            .filter(|s| matches!(s, Shape::Polyline { .. }))
            .count();
        assert_eq!(curves, 1);
    }

    #[test]
    fn test_graph_plot_rejects_bad_expression() {
        assert!(matches!(
            graph_plot("y = x +* 2", 0.0, &ctx()),
            Err(TemplateError::Expression(_))
        ));
    }

    #[test]
    fn test_image_display() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dot.png");
        RgbaImage::from_pixel(4, 2, Rgba([255, 0, 0, 255]))
            .save(&path)
            .unwrap();

        let ctx = TemplateContext::new(dir.path());
        let object = image_display("dot.png\nA red dot", 1.0, &ctx).unwrap();
        match &object.shapes[0] {
            Shape::Image { width, height, .. } => {
                assert!((width / height - 2.0).abs() < 1e-3);
            }
            other => panic!("Expected image, got {:?}", other),
        }
        assert_eq!(texts(&object), vec!["A red dot"]);
    }

    #[test]
    fn test_image_display_missing_file() {
        assert!(matches!(
            image_display("missing.png", 0.0, &ctx()),
            Err(TemplateError::Image { .. })
        ));
    }
}
