// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Flattening of a step's screenshot and annotations into one raster.
//!
//! Shapes are drawn with tiny-skia. Text (text annotations and callout
//! numbers) is returned as [`RasterLabel`]s so the document can set it as
//! real text over the image.

use crate::config::ExportConfig;
use crate::error::{GuideError, Result};
use crate::io::media;
use crate::models::project::Step;
use crate::util::color::Rgba;
use crate::util::geometry::{self, metrics, Frame, PixelPoint, PixelRect, Primitive};
use image::{imageops, RgbaImage};
use tiny_skia::{FillRule, Paint, Path, PathBuilder, Pixmap, Stroke, Transform};

/// How a label's `origin` relates to its text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelAnchor {
    TopLeft,
    Center,
}

/// Text to set over the flattened raster, in raster pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterLabel {
    pub text: String,
    pub origin: PixelPoint,
    pub size: f32,
    pub color: Rgba,
    pub anchor: LabelAnchor,
    /// Draw a soft dark copy under the text.
    pub shadow: bool,
}

/// A step's screenshot with its annotations burned in.
pub struct Flattened {
    pub image: RgbaImage,
    pub labels: Vec<RasterLabel>,
}

/// Produces the raster that represents a step in the exported guide.
pub trait Flattener {
    fn flatten(&self, step: &Step) -> Result<Flattened>;
}

/// Renders at `min(natural width, reference_width) * raster_scale`.
#[derive(Debug, Clone)]
pub struct SkiaFlattener {
    reference_width: u32,
    raster_scale: f32,
}

impl SkiaFlattener {
    pub fn new(config: &ExportConfig) -> Self {
        Self {
            reference_width: config.reference_width.max(1),
            raster_scale: config.raster_scale.max(0.1),
        }
    }

    /// Output raster size for a screenshot of the given natural size.
    pub fn raster_size(&self, width: u32, height: u32) -> (u32, u32) {
        let display_width = width.min(self.reference_width) as f32;
        let display_height = display_width * height as f32 / width.max(1) as f32;
        (
            ((display_width * self.raster_scale).round() as u32).max(1),
            ((display_height * self.raster_scale).round() as u32).max(1),
        )
    }
}

impl Flattener for SkiaFlattener {
    fn flatten(&self, step: &Step) -> Result<Flattened> {
        let screenshot = media::decode_data_url(&step.image_url)?;
        let (width, height) = self.raster_size(screenshot.width(), screenshot.height());

        let resized = imageops::resize(&screenshot, width, height, imageops::FilterType::Triangle);
        let mut image = RgbaImage::from_pixel(width, height, image::Rgba([255, 255, 255, 255]));
        imageops::overlay(&mut image, &resized, 0, 0);

        let frame = Frame::raster(width, height, self.raster_scale);
        let primitives: Vec<Primitive> = step
            .annotations
            .iter()
            .filter(|a| !a.is_preview())
            .map(|a| geometry::layout(a, &frame))
            .collect();

        let mut labels = Vec::new();
        with_pixmap(&mut image, |pixmap| {
            for primitive in &primitives {
                draw_primitive(pixmap, primitive, self.raster_scale, &mut labels);
            }
        })?;

        log::debug!(
            "Flattened step {:?} at {}x{} with {} labels",
            step.id,
            width,
            height,
            labels.len()
        );
        Ok(Flattened { image, labels })
    }
}

/// Run `f` on a pixmap view of an opaque image and copy the pixels back.
fn with_pixmap(img: &mut RgbaImage, f: impl FnOnce(&mut Pixmap)) -> Result<()> {
    let (w, h) = (img.width(), img.height());
    let size = tiny_skia::IntSize::from_wh(w, h)
        .ok_or_else(|| GuideError::Export(format!("invalid raster size {}x{}", w, h)))?;
    let mut pixmap = Pixmap::from_vec(img.as_raw().clone(), size)
        .ok_or_else(|| GuideError::Export("failed to allocate raster".to_string()))?;

    f(&mut pixmap);

    img.copy_from_slice(pixmap.data());
    Ok(())
}

fn paint(color: Rgba) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, color.a);
    paint.anti_alias = true;
    paint
}

fn shadow(unit: f32) -> (Rgba, f32) {
    (Rgba::BLACK.with_opacity(0.3), 2.0 * unit)
}

fn draw_primitive(pixmap: &mut Pixmap, primitive: &Primitive, unit: f32, labels: &mut Vec<RasterLabel>) {
    match primitive {
        Primitive::Outline { rect, radius, stroke, color } => {
            let centre = Primitive::stroke_rect(rect, *stroke);
            let radius = (radius - stroke / 2.0).max(0.0);
            if let Some(path) = rounded_rect_path(&centre, radius) {
                stroke_path(pixmap, &path, *color, *stroke);
            }
        }
        Primitive::Ellipse { rect, stroke, color } => {
            let centre = Primitive::stroke_rect(rect, *stroke);
            if let Some(path) = ellipse_path(&centre) {
                stroke_path(pixmap, &path, *color, *stroke);
            }
        }
        Primitive::Fill { rect, radius, color } => {
            if let Some(path) = rounded_rect_path(rect, *radius) {
                fill_path(pixmap, &path, *color);
            }
        }
        Primitive::Arrow { shaft, head, color } => {
            for points in [&shaft[..], &head[..]] {
                if let Some(path) = polygon_path(points) {
                    fill_path(pixmap, &path, *color);
                }
            }
        }
        Primitive::Label(label) => labels.push(RasterLabel {
            text: label.text.clone(),
            origin: label.origin,
            size: label.size,
            color: label.color,
            anchor: LabelAnchor::TopLeft,
            shadow: true,
        }),
        Primitive::Badge { center, radius, number, text_size, fill } => {
            let (shadow_color, drop) = shadow(unit);
            let rect = PixelRect::from_center(*center, *radius, *radius);
            let dropped = PixelRect { y: rect.y + drop, ..rect };
            if let Some(path) = ellipse_path(&dropped) {
                fill_path(pixmap, &path, shadow_color);
            }
            if let Some(path) = ellipse_path(&rect) {
                fill_path(pixmap, &path, *fill);
            }
            if let Some(number) = number {
                labels.push(RasterLabel {
                    text: number.to_string(),
                    origin: *center,
                    size: *text_size,
                    color: Rgba::WHITE,
                    anchor: LabelAnchor::Center,
                    shadow: false,
                });
            }
        }
        Primitive::Cursor {
            dot_center,
            dot_radius,
            ring_center,
            ring_radius,
            ring_stroke,
            color,
            ring_color,
        } => {
            let ring = PixelRect::from_center(*ring_center, *ring_radius, *ring_radius);
            if let Some(path) = ellipse_path(&ring) {
                stroke_path(pixmap, &path, *ring_color, *ring_stroke);
            }

            let (shadow_color, drop) = shadow(unit);
            let dot = PixelRect::from_center(*dot_center, *dot_radius, *dot_radius);
            let dropped = PixelRect { y: dot.y + drop, ..dot };
            if let Some(path) = ellipse_path(&dropped) {
                fill_path(pixmap, &path, shadow_color);
            }
            if let Some(path) = ellipse_path(&dot) {
                fill_path(pixmap, &path, *color);
            }
        }
    }
}

fn stroke_path(pixmap: &mut Pixmap, path: &Path, color: Rgba, width: f32) {
    let stroke = Stroke { width, ..Default::default() };
    pixmap.stroke_path(path, &paint(color), &stroke, Transform::identity(), None);
}

fn fill_path(pixmap: &mut Pixmap, path: &Path, color: Rgba) {
    pixmap.fill_path(path, &paint(color), FillRule::Winding, Transform::identity(), None);
}

fn polygon_path(points: &[PixelPoint]) -> Option<Path> {
    let (first, rest) = points.split_first()?;
    let mut pb = PathBuilder::new();
    pb.move_to(first.x, first.y);
    for p in rest {
        pb.line_to(p.x, p.y);
    }
    pb.close();
    pb.finish()
}

/// Ellipse inscribed in `rect`, as four cubic bezier arcs.
fn ellipse_path(rect: &PixelRect) -> Option<Path> {
    let PixelPoint { x: cx, y: cy } = rect.center();
    let (rx, ry) = (rect.width / 2.0, rect.height / 2.0);
    if rx <= 0.0 || ry <= 0.0 {
        return None;
    }
    let kx = rx * metrics::BEZIER_K;
    let ky = ry * metrics::BEZIER_K;

    let mut pb = PathBuilder::new();
    pb.move_to(cx, cy - ry);
    pb.cubic_to(cx + kx, cy - ry, cx + rx, cy - ky, cx + rx, cy);
    pb.cubic_to(cx + rx, cy + ky, cx + kx, cy + ry, cx, cy + ry);
    pb.cubic_to(cx - kx, cy + ry, cx - rx, cy + ky, cx - rx, cy);
    pb.cubic_to(cx - rx, cy - ky, cx - kx, cy - ry, cx, cy - ry);
    pb.close();
    pb.finish()
}

fn rounded_rect_path(rect: &PixelRect, radius: f32) -> Option<Path> {
    if rect.width <= 0.0 || rect.height <= 0.0 {
        return None;
    }
    let r = radius.min(rect.width / 2.0).min(rect.height / 2.0).max(0.0);
    if r == 0.0 {
        return tiny_skia::Rect::from_xywh(rect.x, rect.y, rect.width, rect.height).map(PathBuilder::from_rect);
    }

    let k = r * metrics::BEZIER_K;
    let (left, top, right, bottom) = (rect.x, rect.y, rect.right(), rect.bottom());

    let mut pb = PathBuilder::new();
    pb.move_to(left + r, top);
    pb.line_to(right - r, top);
    pb.cubic_to(right - r + k, top, right, top + r - k, right, top + r);
    pb.line_to(right, bottom - r);
    pb.cubic_to(right, bottom - r + k, right - r + k, bottom, right - r, bottom);
    pb.line_to(left + r, bottom);
    pb.cubic_to(left + r - k, bottom, left, bottom - r + k, left, bottom - r);
    pb.line_to(left, top + r);
    pb.cubic_to(left, top + r - k, left + r - k, top, left + r, top);
    pb.close();
    pb.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::media::tests::png_data_url;
    use crate::models::annotation::{Annotation, Callout, Point, Region, Shape, TextLabel};
    use crate::util::color::REDACT;

    const BACKGROUND: [u8; 3] = [200, 220, 240];

    fn assert_rgb_near(px: &image::Rgba<u8>, expected: [u8; 3]) {
        for (got, want) in px.0[..3].iter().zip(expected) {
            assert!(got.abs_diff(want) <= 2, "pixel {:?}, expected {:?}", px, expected);
        }
    }

    fn flattener() -> SkiaFlattener {
        SkiaFlattener::new(&ExportConfig::default())
    }

    fn step_with(width: u32, height: u32, annotations: Vec<Annotation>) -> Step {
        let mut step = Step::new(0, png_data_url(width, height), "shot.png".into());
        step.annotations = annotations;
        step
    }

    #[test]
    fn test_raster_size_caps_reference_width() {
        let f = flattener();
        assert_eq!(f.raster_size(100, 50), (200, 100));
        assert_eq!(f.raster_size(1600, 900), (1600, 900));
        assert_eq!(f.raster_size(800, 600), (1600, 1200));
    }

    #[test]
    fn test_box_border_is_burned_in() {
        let step = step_with(
            100,
            50,
            vec![Annotation::new("#EF4444", Shape::Box(Region { x: 10.0, y: 10.0, width: 50.0, height: 50.0 }))],
        );
        let flat = flattener().flatten(&step).unwrap();
        assert_eq!(flat.image.dimensions(), (200, 100));

        let border = flat.image.get_pixel(22, 35);
        assert!(border[0] > 200 && border[1] < 120, "border pixel {:?}", border);

        // Inside the box the screenshot is untouched.
        assert_rgb_near(flat.image.get_pixel(60, 35), BACKGROUND);
        assert!(flat.labels.is_empty());
    }

    #[test]
    fn test_blur_covers_region_with_redaction_color() {
        let step = step_with(
            100,
            100,
            vec![Annotation::new("#10B981", Shape::Blur(Region { x: 60.0, y: 60.0, width: -40.0, height: -40.0 }))],
        );
        let flat = flattener().flatten(&step).unwrap();
        assert_rgb_near(flat.image.get_pixel(80, 80), [REDACT.r, REDACT.g, REDACT.b]);
    }

    #[test]
    fn test_text_and_callout_become_labels() {
        let step = step_with(
            400,
            200,
            vec![
                Annotation::new(
                    "#000000",
                    Shape::Text(TextLabel { x: 5.0, y: 5.0, text: "Click here".into(), font_size: None }),
                ),
                Annotation::new("#3B82F6", Shape::Callout(Callout { x: 50.0, y: 50.0, number: 2 })),
                Annotation::new("#3B82F6", Shape::Cursor(Point::new(20.0, 20.0))),
            ],
        );
        let flat = flattener().flatten(&step).unwrap();
        assert_eq!(flat.labels.len(), 2);

        let text = &flat.labels[0];
        assert_eq!(text.text, "Click here");
        assert_eq!(text.size, 32.0);
        assert_eq!(text.origin, PixelPoint::new(40.0, 20.0));
        assert_eq!(text.anchor, LabelAnchor::TopLeft);

        let number = &flat.labels[1];
        assert_eq!(number.text, "2");
        assert_eq!(number.anchor, LabelAnchor::Center);
        assert_eq!(number.color, Rgba::WHITE);

        // Badge fill sits under the number.
        assert_rgb_near(flat.image.get_pixel(400, 200), [0x3B, 0x82, 0xF6]);
    }

    #[test]
    fn test_previews_are_not_flattened() {
        let step = step_with(
            100,
            100,
            vec![Annotation::preview("#000000", Shape::Blur(Region { x: 0.0, y: 0.0, width: 100.0, height: 100.0 }))],
        );
        let flat = flattener().flatten(&step).unwrap();
        assert_rgb_near(flat.image.get_pixel(100, 100), BACKGROUND);
    }

    #[test]
    fn test_bad_image_is_an_error() {
        let step = Step::new(0, "data:text/plain;base64,aGVsbG8=".into(), "notes.txt".into());
        assert!(matches!(flattener().flatten(&step), Err(GuideError::ImageDecode(_))));
    }
}
