// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! PDF guide export.
//!
//! A guide is a title page followed by one page per step: the step
//! number, title and instructions above the flattened screenshot. Export
//! reads a snapshot of the project and never changes it.

pub mod flatten;
pub mod pdf;
pub mod text;

use crate::config::ExportConfig;
use crate::error::Result;
use crate::models::project::{Project, Settings, Step};
use crate::util::color::Rgba;
use chrono::NaiveDate;
use flatten::{Flattened, Flattener, LabelAnchor, SkiaFlattener};
use pdf::{GuideDocument, PageRect, PdfDocument, TextStyle};
use text::{Font, FontFace, PT_TO_MM};

pub const MARGIN: f32 = 15.0;

/// Advance per wrapped instruction line, in millimetres.
const INSTRUCTION_LINE: f32 = 5.0;

/// Fraction of the font size between a label's top and its baseline.
const LABEL_ASCENT: f32 = 0.85;
/// Offset that optically centres digits on a badge.
const LABEL_CENTER_DROP: f32 = 0.35;

/// File name offered when saving a project's guide.
pub fn export_file_name(project_name: &str) -> String {
    let stem: String = project_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("{}_guide.pdf", stem)
}

/// Lays a project out onto a [`GuideDocument`].
pub struct ExportRenderer<F: Flattener> {
    flattener: F,
}

impl<F: Flattener> ExportRenderer<F> {
    pub fn new(flattener: F) -> Self {
        Self { flattener }
    }

    /// Draw the whole guide. The document must be on its first, empty page.
    pub fn render<D: GuideDocument>(&self, project: &Project, date: NaiveDate, doc: &mut D) {
        let fonts = PageFonts::new(&project.settings);

        self.title_page(project, date, &fonts, doc);

        let mut steps: Vec<&Step> = project.steps.iter().collect();
        steps.sort_by_key(|s| s.order);
        for (index, step) in steps.into_iter().enumerate() {
            self.step_pages(index, step, &project.settings, &fonts, doc);
        }

        log::info!(
            "Rendered guide '{}' with {} steps on {} pages",
            project.name,
            project.steps.len(),
            doc.page_count()
        );
    }

    fn title_page<D: GuideDocument>(&self, project: &Project, date: NaiveDate, fonts: &PageFonts, doc: &mut D) {
        let (width, height) = doc.page_size();
        let center = width / 2.0;
        let content_width = width - MARGIN * 2.0;

        doc.text(
            &project.name,
            center,
            60.0,
            &TextStyle::new(fonts.regular, 28.0, Rgba::BLACK).centered(),
        );

        if !project.description.is_empty() {
            let style = TextStyle::new(fonts.regular, 14.0, Rgba::grey(100)).centered();
            let mut y = 80.0;
            for line in text::wrap(&project.description, style.font, style.size, content_width) {
                doc.text(&line, center, y, &style);
                y += text::line_height(style.size);
            }
        }

        let footer = TextStyle::new(fonts.regular, 12.0, Rgba::grey(150)).centered();
        doc.text(&format!("{} steps", project.steps.len()), center, height - 40.0, &footer);
        doc.text(
            &format!("Generated on {}", date.format("%-m/%-d/%Y")),
            center,
            height - 30.0,
            &footer,
        );
    }

    fn step_pages<D: GuideDocument>(
        &self,
        index: usize,
        step: &Step,
        settings: &Settings,
        fonts: &PageFonts,
        doc: &mut D,
    ) {
        let (width, height) = doc.page_size();
        let content_width = width - MARGIN * 2.0;

        new_page(doc, settings, fonts);
        let mut y = MARGIN;

        if settings.show_step_numbers {
            let primary = Rgba::from_hex(&settings.primary_color);
            doc.text(
                &format!("STEP {}", index + 1),
                MARGIN,
                y + 5.0,
                &TextStyle::new(fonts.bold, 12.0, primary),
            );
            y += 10.0;
        }

        doc.text(&step.title, MARGIN, y + 5.0, &TextStyle::new(fonts.bold, 18.0, Rgba::BLACK));
        y += 15.0;

        if !step.instructions.is_empty() {
            let style = TextStyle::new(fonts.regular, 11.0, Rgba::grey(60));
            for line in text::wrap(&step.instructions, style.font, style.size, content_width) {
                if y > height - MARGIN {
                    new_page(doc, settings, fonts);
                    y = MARGIN + INSTRUCTION_LINE;
                }
                doc.text(&line, MARGIN, y, &style);
                y += INSTRUCTION_LINE;
            }
            y += 10.0;
        }

        if step.image_url.is_empty() {
            return;
        }

        let flattened = match self.flattener.flatten(step) {
            Ok(flattened) => flattened,
            Err(e) => {
                log::error!("Error rendering screenshot for step {}: {}", index + 1, e);
                return;
            }
        };

        let raster_width = flattened.image.width().max(1) as f32;
        let image_height = flattened.image.height() as f32 / raster_width * content_width;
        if image_height > height - y - MARGIN {
            new_page(doc, settings, fonts);
            y = MARGIN;
        }

        let bounds = PageRect { x: MARGIN, y, width: content_width, height: image_height };
        if let Err(e) = doc.image(&flattened.image, bounds) {
            log::error!("Error placing screenshot for step {}: {}", index + 1, e);
            return;
        }
        place_labels(doc, &flattened, bounds, fonts);
    }
}

/// Faces used on every page, picked from the project's font family.
struct PageFonts {
    regular: Font,
    bold: Font,
    header: Font,
}

impl PageFonts {
    fn new(settings: &Settings) -> Self {
        let face = FontFace::from_family(&settings.font_family);
        Self {
            regular: Font::regular(face),
            bold: Font::bold(face),
            header: Font::regular(face),
        }
    }
}

/// Start a step page, with header and footer when the project has them.
fn new_page<D: GuideDocument>(doc: &mut D, settings: &Settings, fonts: &PageFonts) {
    doc.add_page();
    let (width, height) = doc.page_size();
    let style = TextStyle::new(fonts.header, 9.0, Rgba::grey(120)).centered();

    if !settings.header_text.is_empty() {
        doc.text(&settings.header_text, width / 2.0, MARGIN / 2.0 + 2.0, &style);
    }
    if !settings.footer_text.is_empty() {
        doc.text(&settings.footer_text, width / 2.0, height - MARGIN / 2.0, &style);
    }
}

/// Set the flattener's labels as text over the placed image.
fn place_labels<D: GuideDocument>(doc: &mut D, flattened: &Flattened, bounds: PageRect, fonts: &PageFonts) {
    // Millimetres per raster pixel.
    let scale = bounds.width / flattened.image.width().max(1) as f32;

    for label in &flattened.labels {
        let size_mm = label.size * scale;
        let size_pt = size_mm / PT_TO_MM;
        let x = bounds.x + label.origin.x * scale;

        let (style, baseline) = match label.anchor {
            LabelAnchor::TopLeft => (
                TextStyle::new(fonts.bold, size_pt, label.color),
                bounds.y + label.origin.y * scale + size_mm * LABEL_ASCENT,
            ),
            LabelAnchor::Center => (
                TextStyle::new(fonts.bold, size_pt, label.color).centered(),
                bounds.y + label.origin.y * scale + size_mm * LABEL_CENTER_DROP,
            ),
        };

        if label.shadow {
            let drop = size_mm * 0.06;
            let shadow = TextStyle { color: Rgba::grey(90), ..style };
            doc.text(&label.text, x + drop, baseline + drop, &shadow);
        }
        doc.text(&label.text, x, baseline, &style);
    }
}

/// Render `project` to PDF bytes with the default flattener.
pub fn export_pdf(project: &Project, config: &ExportConfig, date: NaiveDate) -> Result<Vec<u8>> {
    let renderer = ExportRenderer::new(SkiaFlattener::new(config));
    let mut doc = PdfDocument::new(config.jpeg_quality);
    renderer.render(project, date, &mut doc);
    doc.finish()
}
