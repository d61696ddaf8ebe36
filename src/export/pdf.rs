// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Page-oriented document output.
//!
//! [`GuideDocument`] is the small drawing surface the export renderer
//! needs. Coordinates are millimetres from the top-left corner of the page;
//! text is positioned by its baseline. [`PdfDocument`] writes A4 portrait
//! pages with lopdf.

use super::text::{encode_win_ansi, Font, PT_TO_MM};
use crate::error::{GuideError, Result};
use crate::util::color::Rgba;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, RgbaImage};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use std::collections::BTreeMap;

pub const A4_WIDTH: f32 = 210.0;
pub const A4_HEIGHT: f32 = 297.0;

const MM_TO_PT: f32 = 1.0 / PT_TO_MM;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub font: Font,
    /// Size in points.
    pub size: f32,
    pub color: Rgba,
    pub align: Align,
}

impl TextStyle {
    pub fn new(font: Font, size: f32, color: Rgba) -> Self {
        Self { font, size, color, align: Align::Left }
    }

    pub fn centered(self) -> Self {
        Self { align: Align::Center, ..self }
    }
}

/// Rectangle on the page in millimetres, top-left origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Drawing surface of an exported guide.
pub trait GuideDocument {
    /// Page width and height in millimetres.
    fn page_size(&self) -> (f32, f32);

    /// Start a new page; drawing continues on it.
    fn add_page(&mut self);

    fn page_count(&self) -> usize;

    /// Draw one line of text with its baseline at `baseline`.
    fn text(&mut self, text: &str, x: f32, baseline: f32, style: &TextStyle);

    /// Place an opaque raster scaled to `bounds`.
    fn image(&mut self, image: &RgbaImage, bounds: PageRect) -> Result<()>;

    /// Serialize the finished document.
    fn finish(self) -> Result<Vec<u8>>
    where
        Self: Sized;
}

#[derive(Default)]
struct Page {
    operations: Vec<Operation>,
    images: Vec<(String, ObjectId)>,
}

/// A4 portrait PDF built with lopdf. Starts with one empty page.
pub struct PdfDocument {
    doc: Document,
    pages: Vec<Page>,
    fonts: BTreeMap<Font, String>,
    jpeg_quality: u8,
    image_count: usize,
}

impl PdfDocument {
    pub fn new(jpeg_quality: u8) -> Self {
        Self {
            doc: Document::with_version("1.7"),
            pages: vec![Page::default()],
            fonts: BTreeMap::new(),
            jpeg_quality: jpeg_quality.clamp(1, 100),
            image_count: 0,
        }
    }

    fn current(&mut self) -> &mut Page {
        if self.pages.is_empty() {
            self.pages.push(Page::default());
        }
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    fn font_name(&mut self, font: Font) -> String {
        let next = self.fonts.len() + 1;
        self.fonts.entry(font).or_insert_with(|| format!("F{}", next)).clone()
    }

    fn encode_jpeg(&self, image: &RgbaImage) -> Result<Vec<u8>> {
        let rgb = DynamicImage::ImageRgba8(image.clone()).to_rgb8();
        let mut bytes = Vec::new();
        JpegEncoder::new_with_quality(&mut bytes, self.jpeg_quality)
            .encode_image(&rgb)
            .map_err(|e| GuideError::Export(format!("JPEG encoding failed: {}", e)))?;
        Ok(bytes)
    }
}

fn real(v: f32) -> Object {
    Object::Real(v)
}

impl GuideDocument for PdfDocument {
    fn page_size(&self) -> (f32, f32) {
        (A4_WIDTH, A4_HEIGHT)
    }

    fn add_page(&mut self) {
        self.pages.push(Page::default());
    }

    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn text(&mut self, text: &str, x: f32, baseline: f32, style: &TextStyle) {
        if text.is_empty() {
            return;
        }

        let x = match style.align {
            Align::Left => x,
            Align::Center => x - style.font.text_width(text, style.size) / 2.0,
        };
        let font = self.font_name(style.font);
        let (r, g, b) = style.color.to_unit_rgb();

        self.current().operations.extend([
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![Object::Name(font.into_bytes()), real(style.size)]),
            Operation::new("rg", vec![real(r), real(g), real(b)]),
            Operation::new("Td", vec![real(x * MM_TO_PT), real((A4_HEIGHT - baseline) * MM_TO_PT)]),
            Operation::new(
                "Tj",
                vec![Object::String(encode_win_ansi(text), StringFormat::Hexadecimal)],
            ),
            Operation::new("ET", vec![]),
        ]);
    }

    fn image(&mut self, image: &RgbaImage, bounds: PageRect) -> Result<()> {
        let jpeg = self.encode_jpeg(image)?;
        let stream = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => image.width() as i64,
                "Height" => image.height() as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "DCTDecode",
            },
            jpeg,
        );
        let image_id = self.doc.add_object(stream);
        self.image_count += 1;
        let name = format!("Im{}", self.image_count);

        let page = self.current();
        page.operations.extend([
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    real(bounds.width * MM_TO_PT),
                    real(0.0),
                    real(0.0),
                    real(bounds.height * MM_TO_PT),
                    real(bounds.x * MM_TO_PT),
                    real((A4_HEIGHT - bounds.y - bounds.height) * MM_TO_PT),
                ],
            ),
            Operation::new("Do", vec![Object::Name(name.clone().into_bytes())]),
            Operation::new("Q", vec![]),
        ]);
        page.images.push((name, image_id));
        Ok(())
    }

    fn finish(mut self) -> Result<Vec<u8>> {
        let pages_id = self.doc.new_object_id();

        let mut fonts = Dictionary::new();
        for (font, name) in &self.fonts {
            let font_id = self.doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => font.base_font(),
                "Encoding" => "WinAnsiEncoding",
            });
            fonts.set(name.as_bytes().to_vec(), Object::Reference(font_id));
        }

        let mut kids = Vec::with_capacity(self.pages.len());
        for page in std::mem::take(&mut self.pages) {
            let content = Content { operations: page.operations };
            let encoded = content
                .encode()
                .map_err(|e| GuideError::Export(format!("content stream: {}", e)))?;
            let content_id = self.doc.add_object(Stream::new(Dictionary::new(), encoded));

            let mut xobjects = Dictionary::new();
            for (name, id) in page.images {
                xobjects.set(name.into_bytes(), Object::Reference(id));
            }

            let page_id = self.doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => Object::Reference(pages_id),
                "MediaBox" => vec![
                    0.into(),
                    0.into(),
                    real(A4_WIDTH * MM_TO_PT),
                    real(A4_HEIGHT * MM_TO_PT),
                ],
                "Resources" => dictionary! {
                    "Font" => fonts.clone(),
                    "XObject" => xobjects,
                },
                "Contents" => Object::Reference(content_id),
            });
            kids.push(Object::Reference(page_id));
        }

        let count = kids.len() as i64;
        self.doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );
        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => Object::Reference(pages_id),
        });
        self.doc.trailer.set("Root", Object::Reference(catalog_id));

        let mut buffer = Vec::new();
        self.doc
            .save_to(&mut buffer)
            .map_err(|e| GuideError::Export(format!("failed to write PDF: {}", e)))?;
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::text::FontFace;

    fn style() -> TextStyle {
        TextStyle::new(Font::regular(FontFace::Helvetica), 12.0, Rgba::BLACK)
    }

    #[test]
    fn test_new_document_has_one_page() {
        let doc = PdfDocument::new(80);
        assert_eq!(doc.page_count(), 1);
        assert_eq!(doc.page_size(), (A4_WIDTH, A4_HEIGHT));

        let bytes = doc.finish().unwrap();
        assert!(bytes.starts_with(b"%PDF-1.7"));
        let parsed = Document::load_mem(&bytes).unwrap();
        assert_eq!(parsed.get_pages().len(), 1);
    }

    #[test]
    fn test_pages_text_and_images_survive_parsing() {
        let mut doc = PdfDocument::new(80);
        doc.text("Title", 105.0, 60.0, &style().centered());
        doc.add_page();
        doc.text("Step", 15.0, 20.0, &TextStyle::new(Font::bold(FontFace::Times), 18.0, Rgba::grey(60)));
        let image = RgbaImage::from_pixel(40, 20, image::Rgba([10, 20, 30, 255]));
        doc.image(&image, PageRect { x: 15.0, y: 30.0, width: 180.0, height: 90.0 }).unwrap();
        assert_eq!(doc.page_count(), 2);

        let bytes = doc.finish().unwrap();
        let parsed = Document::load_mem(&bytes).unwrap();
        let pages = parsed.get_pages();
        assert_eq!(pages.len(), 2);

        let second = pages[&2];
        let content = parsed.get_page_content(second).unwrap();
        let ops = Content::decode(&content).unwrap().operations;
        assert!(ops.iter().any(|op| op.operator == "Do"));
        assert!(ops.iter().any(|op| op.operator == "Tj"));
    }

    #[test]
    fn test_fonts_are_registered_once() {
        let mut doc = PdfDocument::new(80);
        doc.text("a", 0.0, 10.0, &style());
        doc.text("b", 0.0, 20.0, &style());
        doc.text("c", 0.0, 30.0, &TextStyle::new(Font::bold(FontFace::Helvetica), 12.0, Rgba::BLACK));
        assert_eq!(doc.fonts.len(), 2);
    }

    #[test]
    fn test_empty_text_draws_nothing() {
        let mut doc = PdfDocument::new(80);
        doc.text("", 0.0, 10.0, &style());
        assert!(doc.pages[0].operations.is_empty());
        assert!(doc.fonts.is_empty());
    }
}
