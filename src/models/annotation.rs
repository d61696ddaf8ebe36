// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation data structures.
//!
//! Annotations are markers attached to a step's screenshot. Every spatial
//! value is a percentage of the image width (x, width, end_x) or height
//! (y, height, end_y), so the same annotation lands in the same place no
//! matter how large the screenshot is displayed.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Font size used by text annotations that don't carry one.
pub const DEFAULT_FONT_SIZE: f32 = 16.0;

/// Unique identifier of an annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnotationId(pub Uuid);

impl AnnotationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Synthetic id carried by the shape that is still being drawn.
    pub const fn preview() -> Self {
        Self(Uuid::nil())
    }

    pub fn is_preview(&self) -> bool {
        self.0.is_nil()
    }
}

impl Default for AnnotationId {
    fn default() -> Self {
        Self::new()
    }
}

/// A 2D point in percentage coordinates (0.0 to 100.0 over the image).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn offset_to(&self, other: Point) -> Point {
        Point::new(other.x - self.x, other.y - self.y)
    }
}

/// Rectangle-like shape as drawn: the start corner plus a signed size.
///
/// A drag up or to the left produces negative width/height; use
/// [`Region::normalized`] to get the visual rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Region {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
}

/// Axis-aligned rectangle with non-negative size, in percentages.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Region {
    pub fn normalized(&self) -> Bounds {
        Bounds {
            left: self.x.min(self.x + self.width),
            top: self.y.min(self.y + self.height),
            width: self.width.abs(),
            height: self.height.abs(),
        }
    }
}

/// Arrow from (x, y) toward (end_x, end_y).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Arrow {
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_y: Option<f64>,
}

impl Arrow {
    /// End point, falling back to the start for unset coordinates.
    pub fn end(&self) -> Point {
        Point::new(self.end_x.unwrap_or(self.x), self.end_y.unwrap_or(self.y))
    }

    pub fn has_end(&self) -> bool {
        self.end_x.is_some() && self.end_y.is_some()
    }

    /// Rotation of the shaft in degrees, measured in percentage space.
    pub fn angle_degrees(&self) -> f64 {
        let end = self.end();
        (end.y - self.y).atan2(end.x - self.x).to_degrees()
    }

    /// Shaft length in percentage units.
    pub fn length(&self) -> f64 {
        let end = self.end();
        (end.x - self.x).hypot(end.y - self.y)
    }

    /// Rebuild an arrow from its anchor, rotation and length.
    #[cfg(test)]
    pub fn from_polar(x: f64, y: f64, angle_degrees: f64, length: f64) -> Self {
        let (sin, cos) = angle_degrees.to_radians().sin_cos();
        Self {
            x,
            y,
            end_x: Some(x + length * cos),
            end_y: Some(y + length * sin),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextLabel {
    pub x: f64,
    pub y: f64,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f32>,
}

impl TextLabel {
    pub fn font_size(&self) -> f32 {
        self.font_size.unwrap_or(DEFAULT_FONT_SIZE)
    }
}

/// Numbered badge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Callout {
    pub x: f64,
    pub y: f64,
    pub number: u32,
}

/// Geometry of an annotation, one variant per kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Shape {
    Box(Region),
    Circle(Region),
    Arrow(Arrow),
    Text(TextLabel),
    Highlight(Region),
    Callout(Callout),
    Blur(Region),
    Cursor(Point),
}

/// Kind of annotation, without its geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationKind {
    Box,
    Circle,
    Arrow,
    Text,
    Highlight,
    Callout,
    Blur,
    Cursor,
}

impl AnnotationKind {
    pub fn label(self) -> &'static str {
        match self {
            AnnotationKind::Box => "Box",
            AnnotationKind::Circle => "Circle",
            AnnotationKind::Arrow => "Arrow",
            AnnotationKind::Text => "Text",
            AnnotationKind::Highlight => "Highlight",
            AnnotationKind::Callout => "Callout",
            AnnotationKind::Blur => "Blur",
            AnnotationKind::Cursor => "Cursor",
        }
    }
}

impl Shape {
    pub fn kind(&self) -> AnnotationKind {
        match self {
            Shape::Box(_) => AnnotationKind::Box,
            Shape::Circle(_) => AnnotationKind::Circle,
            Shape::Arrow(_) => AnnotationKind::Arrow,
            Shape::Text(_) => AnnotationKind::Text,
            Shape::Highlight(_) => AnnotationKind::Highlight,
            Shape::Callout(_) => AnnotationKind::Callout,
            Shape::Blur(_) => AnnotationKind::Blur,
            Shape::Cursor(_) => AnnotationKind::Cursor,
        }
    }

    /// The (x, y) anchor every kind carries.
    pub fn anchor(&self) -> Point {
        match self {
            Shape::Box(r) | Shape::Circle(r) | Shape::Highlight(r) | Shape::Blur(r) => {
                Point::new(r.x, r.y)
            }
            Shape::Arrow(a) => Point::new(a.x, a.y),
            Shape::Text(t) => Point::new(t.x, t.y),
            Shape::Callout(c) => Point::new(c.x, c.y),
            Shape::Cursor(p) => *p,
        }
    }

    /// Move the anchor to `to`, carrying the rest of the shape along.
    pub fn move_anchor(&mut self, to: Point) {
        let delta = self.anchor().offset_to(to);
        match self {
            Shape::Box(r) | Shape::Circle(r) | Shape::Highlight(r) | Shape::Blur(r) => {
                r.x = to.x;
                r.y = to.y;
            }
            Shape::Arrow(a) => {
                a.x = to.x;
                a.y = to.y;
                a.end_x = a.end_x.map(|v| v + delta.x);
                a.end_y = a.end_y.map(|v| v + delta.y);
            }
            Shape::Text(t) => {
                t.x = to.x;
                t.y = to.y;
            }
            Shape::Callout(c) => {
                c.x = to.x;
                c.y = to.y;
            }
            Shape::Cursor(p) => *p = to,
        }
    }

    pub fn region(&self) -> Option<&Region> {
        match self {
            Shape::Box(r) | Shape::Circle(r) | Shape::Highlight(r) | Shape::Blur(r) => Some(r),
            _ => None,
        }
    }
}

/// An annotation placed on a step's screenshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: AnnotationId,
    pub color: String,
    #[serde(flatten)]
    pub shape: Shape,
}

impl Annotation {
    /// Create a new annotation with a fresh id.
    pub fn new(color: impl Into<String>, shape: Shape) -> Self {
        Self {
            id: AnnotationId::new(),
            color: color.into(),
            shape,
        }
    }

    /// Annotation used to show a shape that is still being drawn.
    pub fn preview(color: impl Into<String>, shape: Shape) -> Self {
        Self {
            id: AnnotationId::preview(),
            color: color.into(),
            shape,
        }
    }

    pub fn kind(&self) -> AnnotationKind {
        self.shape.kind()
    }

    pub fn is_preview(&self) -> bool {
        self.id.is_preview()
    }
}
