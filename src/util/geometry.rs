// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Geometric utility functions.
//!
//! Converts between pixel coordinates and the percentage coordinates
//! annotations are stored in, and lays every annotation kind out as a
//! concrete pixel-space [`Primitive`]. The editor canvas and the export
//! flattener both draw from these primitives, so a shape looks the same
//! on screen and in the exported guide.

use crate::models::annotation::{Annotation, AnnotationId, Point, Shape};
use crate::util::color::{self, Rgba};

/// Fixed pixel sizes of the annotation styles, at a unit of 1.0.
pub mod metrics {
    /// Border of box and circle annotations.
    pub const STROKE: f32 = 3.0;
    pub const BOX_RADIUS: f32 = 4.0;
    pub const HIGHLIGHT_RADIUS: f32 = 2.0;
    pub const HIGHLIGHT_OPACITY: f32 = 0.3;
    pub const BLUR_RADIUS: f32 = 4.0;

    pub const ARROW_THICKNESS: f32 = 3.0;
    /// Head triangle extent along the shaft.
    pub const ARROW_HEAD_LENGTH: f32 = 12.0;
    pub const ARROW_HEAD_HALF_WIDTH: f32 = 6.0;
    /// How far the head tip reaches past the end of the shaft.
    pub const ARROW_HEAD_OVERHANG: f32 = 8.0;
    /// Head centreline offset from the shaft centreline.
    pub const ARROW_HEAD_SHIFT: f32 = -0.5;

    pub const CALLOUT_DIAMETER: f32 = 32.0;
    pub const CALLOUT_FONT_SIZE: f32 = 16.0;

    pub const CURSOR_DOT_DIAMETER: f32 = 16.0;
    /// Ring centre offset from the dot centre, on both axes.
    pub const CURSOR_RING_OFFSET: f32 = 3.0;
    /// Ring radius measured to the middle of its stroke.
    pub const CURSOR_RING_RADIUS: f32 = 21.5;
    pub const CURSOR_RING_STROKE: f32 = 3.0;
    pub const CURSOR_RING_OPACITY: f32 = 0.5;

    /// Average glyph advance as a fraction of the font size, for bounds.
    pub const GLYPH_ADVANCE: f32 = 0.6;

    /// Ellipse bezier approximation constant: 4/3 * (sqrt(2) - 1)
    pub const BEZIER_K: f32 = 0.552_284_8;
}

/// Point in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PixelPoint {
    pub x: f32,
    pub y: f32,
}

impl PixelPoint {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Rectangle in pixel coordinates with non-negative size.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PixelRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl PixelRect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn from_center(center: PixelPoint, half_width: f32, half_height: f32) -> Self {
        Self::new(
            center.x - half_width,
            center.y - half_height,
            half_width * 2.0,
            half_height * 2.0,
        )
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> PixelPoint {
        PixelPoint::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Shrink by `amount` on every side, never below zero size.
    pub fn inset(&self, amount: f32) -> Self {
        let dx = amount.min(self.width / 2.0);
        let dy = amount.min(self.height / 2.0);
        Self::new(
            self.x + dx,
            self.y + dy,
            self.width - dx * 2.0,
            self.height - dy * 2.0,
        )
    }

    pub fn expand(&self, amount: f32) -> Self {
        Self::new(
            self.x - amount,
            self.y - amount,
            self.width + amount * 2.0,
            self.height + amount * 2.0,
        )
    }

    pub fn contains(&self, p: PixelPoint) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }

    fn union_point(self, p: PixelPoint) -> Self {
        let x = self.x.min(p.x);
        let y = self.y.min(p.y);
        Self::new(x, y, self.right().max(p.x) - x, self.bottom().max(p.y) - y)
    }
}

/// Where and how large an image is drawn.
///
/// `unit` scales the fixed pixel sizes (stroke widths, badges, glyphs):
/// 1.0 on an unzoomed canvas, the raster scale when flattening.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub origin: PixelPoint,
    pub width: f32,
    pub height: f32,
    pub unit: f32,
}

impl Frame {
    pub fn new(origin: PixelPoint, width: f32, height: f32, unit: f32) -> Self {
        Self { origin, width, height, unit }
    }

    /// Frame covering a raster of `width` x `height` pixels.
    pub fn raster(width: u32, height: u32, unit: f32) -> Self {
        Self::new(PixelPoint::default(), width as f32, height as f32, unit)
    }

    /// Convert a percentage point to pixel coordinates.
    pub fn to_pixels(&self, point: Point) -> PixelPoint {
        PixelPoint::new(
            self.origin.x + (point.x as f32 / 100.0) * self.width,
            self.origin.y + (point.y as f32 / 100.0) * self.height,
        )
    }

    /// Convert a pointer position to percentages of this frame.
    pub fn to_percent(&self, pixel: PixelPoint) -> Point {
        percent_position(pixel, self.origin, self.width, self.height)
    }
}

/// `(client - origin) / size * 100` on both axes.
pub fn percent_position(client: PixelPoint, origin: PixelPoint, width: f32, height: f32) -> Point {
    Point::new(
        ((client.x - origin.x) / width * 100.0) as f64,
        ((client.y - origin.y) / height * 100.0) as f64,
    )
}

/// Text placement for labels: top-left origin, font size in pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelLayout {
    pub origin: PixelPoint,
    pub text: String,
    pub size: f32,
    pub color: Rgba,
}

/// A concrete, pixel-space visual for one annotation.
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    /// Stroked rounded rectangle; the stroke stays inside `rect`.
    Outline { rect: PixelRect, radius: f32, stroke: f32, color: Rgba },
    /// Stroked ellipse inscribed in `rect`; the stroke stays inside.
    Ellipse { rect: PixelRect, stroke: f32, color: Rgba },
    /// Filled rounded rectangle.
    Fill { rect: PixelRect, radius: f32, color: Rgba },
    /// Shaft quad and head triangle, already rotated.
    Arrow { shaft: [PixelPoint; 4], head: [PixelPoint; 3], color: Rgba },
    Label(LabelLayout),
    Badge { center: PixelPoint, radius: f32, number: Option<u32>, text_size: f32, fill: Rgba },
    Cursor {
        dot_center: PixelPoint,
        dot_radius: f32,
        ring_center: PixelPoint,
        ring_radius: f32,
        ring_stroke: f32,
        color: Rgba,
        ring_color: Rgba,
    },
}

fn region_rect(frame: &Frame, x: f64, y: f64, width: f64, height: f64) -> PixelRect {
    let top_left = frame.to_pixels(Point::new(x, y));
    PixelRect::new(
        top_left.x,
        top_left.y,
        width as f32 / 100.0 * frame.width,
        height as f32 / 100.0 * frame.height,
    )
}

/// Lay an annotation out in `frame`.
pub fn layout(annotation: &Annotation, frame: &Frame) -> Primitive {
    use metrics::*;

    let color = Rgba::from_hex(&annotation.color);
    let unit = frame.unit;

    match &annotation.shape {
        Shape::Box(region) => {
            let b = region.normalized();
            Primitive::Outline {
                rect: region_rect(frame, b.left, b.top, b.width, b.height),
                radius: BOX_RADIUS * unit,
                stroke: STROKE * unit,
                color,
            }
        }
        Shape::Circle(region) => {
            let b = region.normalized();
            Primitive::Ellipse {
                rect: region_rect(frame, b.left, b.top, b.width, b.height),
                stroke: STROKE * unit,
                color,
            }
        }
        Shape::Highlight(region) => {
            let b = region.normalized();
            Primitive::Fill {
                rect: region_rect(frame, b.left, b.top, b.width, b.height),
                radius: HIGHLIGHT_RADIUS * unit,
                color: color.with_opacity(HIGHLIGHT_OPACITY),
            }
        }
        Shape::Blur(region) => {
            let b = region.normalized();
            Primitive::Fill {
                rect: region_rect(frame, b.left, b.top, b.width, b.height),
                radius: BLUR_RADIUS * unit,
                color: color::REDACT,
            }
        }
        Shape::Arrow(arrow) => {
            // Length is a share of the frame width, rotation comes from
            // percentage space.
            let length = arrow.length() as f32 / 100.0 * frame.width;
            let (sin, cos) = (arrow.angle_degrees() as f32).to_radians().sin_cos();
            let anchor = frame.to_pixels(Point::new(arrow.x, arrow.y));
            let half = ARROW_THICKNESS * unit / 2.0;
            let pivot = PixelPoint::new(anchor.x, anchor.y + half);
            let local = |u: f32, v: f32| {
                PixelPoint::new(pivot.x + u * cos - v * sin, pivot.y + u * sin + v * cos)
            };

            let head_base = length + (ARROW_HEAD_OVERHANG - ARROW_HEAD_LENGTH) * unit;
            let head_tip = length + ARROW_HEAD_OVERHANG * unit;
            let shift = ARROW_HEAD_SHIFT * unit;
            let spread = ARROW_HEAD_HALF_WIDTH * unit;

            Primitive::Arrow {
                shaft: [local(0.0, -half), local(length, -half), local(length, half), local(0.0, half)],
                head: [
                    local(head_base, shift - spread),
                    local(head_tip, shift),
                    local(head_base, shift + spread),
                ],
                color,
            }
        }
        Shape::Text(label) => Primitive::Label(LabelLayout {
            origin: frame.to_pixels(Point::new(label.x, label.y)),
            text: label.text.clone(),
            size: label.font_size() * unit,
            color,
        }),
        Shape::Callout(callout) => Primitive::Badge {
            center: frame.to_pixels(Point::new(callout.x, callout.y)),
            radius: CALLOUT_DIAMETER / 2.0 * unit,
            number: Some(callout.number).filter(|n| *n > 0),
            text_size: CALLOUT_FONT_SIZE * unit,
            fill: color,
        },
        Shape::Cursor(point) => {
            let center = frame.to_pixels(*point);
            let offset = CURSOR_RING_OFFSET * unit;
            Primitive::Cursor {
                dot_center: center,
                dot_radius: CURSOR_DOT_DIAMETER / 2.0 * unit,
                ring_center: PixelPoint::new(center.x + offset, center.y + offset),
                ring_radius: CURSOR_RING_RADIUS * unit,
                ring_stroke: CURSOR_RING_STROKE * unit,
                color,
                ring_color: color.with_opacity(CURSOR_RING_OPACITY),
            }
        }
    }
}

impl Primitive {
    /// Pixel-space bounding box.
    pub fn bounds(&self) -> PixelRect {
        match self {
            Primitive::Outline { rect, .. }
            | Primitive::Ellipse { rect, .. }
            | Primitive::Fill { rect, .. } => *rect,
            Primitive::Arrow { shaft, head, .. } => shaft
                .iter()
                .chain(head.iter())
                .fold(PixelRect::new(shaft[0].x, shaft[0].y, 0.0, 0.0), |r, p| {
                    r.union_point(*p)
                }),
            Primitive::Label(label) => PixelRect::new(
                label.origin.x,
                label.origin.y,
                label.text.chars().count() as f32 * label.size * metrics::GLYPH_ADVANCE,
                label.size * 1.2,
            ),
            Primitive::Badge { center, radius, .. } => PixelRect::from_center(*center, *radius, *radius),
            Primitive::Cursor { ring_center, ring_radius, ring_stroke, .. } => {
                let outer = ring_radius + ring_stroke / 2.0;
                PixelRect::from_center(*ring_center, outer, outer)
            }
        }
    }

    /// Whether `point` lands on this primitive, within `tolerance` pixels.
    pub fn hit(&self, point: PixelPoint, tolerance: f32) -> bool {
        match self {
            Primitive::Arrow { shaft, head, .. } => {
                let start = midpoint(shaft[0], shaft[3]);
                let tip = head[1];
                let half = distance(shaft[0], shaft[3]) / 2.0;
                distance_to_segment(point, start, tip) <= half + tolerance
            }
            _ => self.bounds().expand(tolerance).contains(point),
        }
    }

    /// Stroke centreline rectangle for outlined shapes.
    pub fn stroke_rect(rect: &PixelRect, stroke: f32) -> PixelRect {
        rect.inset(stroke / 2.0)
    }
}

/// Topmost annotation under `point`, ignoring previews.
pub fn hit_test(annotations: &[Annotation], frame: &Frame, point: PixelPoint) -> Option<AnnotationId> {
    let tolerance = 4.0 * frame.unit;
    annotations
        .iter()
        .rev()
        .filter(|a| !a.is_preview())
        .find(|a| layout(a, frame).hit(point, tolerance))
        .map(|a| a.id)
}

/// Polyline approximation of the ellipse inscribed in `rect`.
pub fn ellipse_points(rect: &PixelRect, segments: usize) -> Vec<PixelPoint> {
    let center = rect.center();
    let (rx, ry) = (rect.width / 2.0, rect.height / 2.0);
    (0..segments)
        .map(|i| {
            let t = i as f32 / segments as f32 * std::f32::consts::TAU;
            PixelPoint::new(center.x + rx * t.cos(), center.y + ry * t.sin())
        })
        .collect()
}

fn midpoint(a: PixelPoint, b: PixelPoint) -> PixelPoint {
    PixelPoint::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0)
}

fn distance(a: PixelPoint, b: PixelPoint) -> f32 {
    (a.x - b.x).hypot(a.y - b.y)
}

fn distance_to_segment(p: PixelPoint, a: PixelPoint, b: PixelPoint) -> f32 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return distance(p, a);
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
    distance(p, PixelPoint::new(a.x + t * dx, a.y + t * dy))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::annotation::{Arrow, Callout, Region, TextLabel};
    use proptest::prelude::*;

    fn frame() -> Frame {
        Frame::raster(1000, 500, 1.0)
    }

    #[test]
    fn test_percent_pixel_roundtrip() {
        let frame = Frame::new(PixelPoint::new(20.0, 40.0), 800.0, 600.0, 1.0);
        let percent = frame.to_percent(PixelPoint::new(420.0, 340.0));
        assert!((percent.x - 50.0).abs() < 1e-4);
        assert!((percent.y - 50.0).abs() < 1e-4);

        let back = frame.to_pixels(percent);
        assert!((back.x - 420.0).abs() < 0.001);
        assert!((back.y - 340.0).abs() < 0.001);
    }

    #[test]
    fn test_percent_corners() {
        let origin = PixelPoint::new(0.0, 0.0);
        let tl = percent_position(origin, origin, 1920.0, 1080.0);
        assert_eq!((tl.x, tl.y), (0.0, 0.0));
        let br = percent_position(PixelPoint::new(1920.0, 1080.0), origin, 1920.0, 1080.0);
        assert_eq!((br.x, br.y), (100.0, 100.0));
    }

    #[test]
    fn test_box_drawn_up_left_lands_on_normalized_rect() {
        let annotation = Annotation::new(
            "#EF4444",
            Shape::Box(Region { x: 50.0, y: 50.0, width: -20.0, height: -10.0 }),
        );
        match layout(&annotation, &frame()) {
            Primitive::Outline { rect, stroke, .. } => {
                assert_eq!(rect, PixelRect::new(300.0, 200.0, 200.0, 50.0));
                assert_eq!(stroke, metrics::STROKE);
            }
            other => panic!("unexpected primitive {:?}", other),
        }
    }

    #[test]
    fn test_blur_ignores_annotation_color() {
        let annotation = Annotation::new("#EF4444", Shape::Blur(Region { x: 0.0, y: 0.0, width: 10.0, height: 10.0 }));
        match layout(&annotation, &frame()) {
            Primitive::Fill { color, .. } => assert_eq!(color, color::REDACT),
            other => panic!("unexpected primitive {:?}", other),
        }
    }

    #[test]
    fn test_horizontal_arrow_layout() {
        let annotation = Annotation::new(
            "#000000",
            Shape::Arrow(Arrow { x: 10.0, y: 50.0, end_x: Some(30.0), end_y: Some(50.0) }),
        );
        match layout(&annotation, &frame()) {
            Primitive::Arrow { shaft, head, .. } => {
                // 20% of 1000px, starting at x = 100
                assert!((shaft[1].x - 300.0).abs() < 1e-3);
                assert!((head[1].x - (300.0 + metrics::ARROW_HEAD_OVERHANG)).abs() < 1e-3);
                assert!((head[0].x - 296.0).abs() < 1e-3);
            }
            other => panic!("unexpected primitive {:?}", other),
        }
    }

    #[test]
    fn test_callout_badge_is_centered_on_anchor() {
        let annotation = Annotation::new("#3B82F6", Shape::Callout(Callout { x: 50.0, y: 50.0, number: 3 }));
        let primitive = layout(&annotation, &frame());
        let bounds = primitive.bounds();
        assert_eq!(bounds.center(), PixelPoint::new(500.0, 250.0));
        assert_eq!(bounds.width, metrics::CALLOUT_DIAMETER);
    }

    #[test]
    fn test_cursor_size_does_not_depend_on_frame() {
        let annotation = Annotation::new("#000000", Shape::Cursor(Point::new(10.0, 10.0)));
        let small = layout(&annotation, &Frame::raster(200, 100, 1.0)).bounds();
        let large = layout(&annotation, &Frame::raster(4000, 3000, 1.0)).bounds();
        assert_eq!(small.width, large.width);
        assert_eq!(small.height, large.height);
    }

    #[test]
    fn test_text_defaults_font_size() {
        let annotation = Annotation::new(
            "#000000",
            Shape::Text(TextLabel { x: 0.0, y: 0.0, text: "Click".into(), font_size: None }),
        );
        match layout(&annotation, &Frame::raster(100, 100, 2.0)) {
            Primitive::Label(label) => assert_eq!(label.size, 32.0),
            other => panic!("unexpected primitive {:?}", other),
        }
    }

    #[test]
    fn test_hit_test_prefers_topmost_and_skips_previews() {
        let below = Annotation::new("#000000", Shape::Box(Region { x: 0.0, y: 0.0, width: 50.0, height: 50.0 }));
        let above = Annotation::new("#000000", Shape::Highlight(Region { x: 10.0, y: 10.0, width: 10.0, height: 10.0 }));
        let preview = Annotation::preview("#000000", Shape::Box(Region { x: 0.0, y: 0.0, width: 100.0, height: 100.0 }));
        let annotations = vec![below.clone(), above.clone(), preview];

        let frame = frame();
        assert_eq!(hit_test(&annotations, &frame, PixelPoint::new(150.0, 75.0)), Some(above.id));
        assert_eq!(hit_test(&annotations, &frame, PixelPoint::new(400.0, 200.0)), Some(below.id));
        assert_eq!(hit_test(&annotations, &frame, PixelPoint::new(900.0, 450.0)), None);
    }

    #[test]
    fn test_arrow_hit_uses_shaft_distance() {
        let arrow = Annotation::new(
            "#000000",
            Shape::Arrow(Arrow { x: 0.0, y: 0.0, end_x: Some(50.0), end_y: Some(100.0) }),
        );
        let frame = Frame::raster(100, 100, 1.0);
        let primitive = layout(&arrow, &frame);
        assert!(primitive.hit(PixelPoint::new(1.0, 3.0), 4.0));
        assert!(!primitive.hit(PixelPoint::new(90.0, 5.0), 4.0));
    }

    proptest! {
        #[test]
        fn normalized_region_is_never_negative(
            x in -50.0f64..150.0, y in -50.0f64..150.0,
            w in -100.0f64..100.0, h in -100.0f64..100.0,
        ) {
            let b = Region { x, y, width: w, height: h }.normalized();
            prop_assert!(b.width >= 0.0);
            prop_assert!(b.height >= 0.0);
            prop_assert_eq!(b.left, x.min(x + w));
            prop_assert_eq!(b.top, y.min(y + h));
        }

        #[test]
        fn arrow_polar_round_trip(
            x in 0.0f64..100.0, y in 0.0f64..100.0,
            end_x in 0.0f64..100.0, end_y in 0.0f64..100.0,
        ) {
            let arrow = Arrow { x, y, end_x: Some(end_x), end_y: Some(end_y) };
            let rebuilt = Arrow::from_polar(x, y, arrow.angle_degrees(), arrow.length());
            let end = rebuilt.end();
            prop_assert!((end.x - end_x).abs() < 1e-9);
            prop_assert!((end.y - end_y).abs() < 1e-9);
        }

        #[test]
        fn region_layout_has_non_negative_size(
            w in -100.0f64..100.0, h in -100.0f64..100.0,
        ) {
            let annotation = Annotation::new("#000000", Shape::Circle(Region { x: 50.0, y: 50.0, width: w, height: h }));
            let rect = layout(&annotation, &frame()).bounds();
            prop_assert!(rect.width >= 0.0);
            prop_assert!(rect.height >= 0.0);
        }
    }
}
