// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Built-in PDF fonts, text measurement and line wrapping.
//!
//! Only the standard Type1 faces are used, so no font files are embedded.
//! Widths come from the Helvetica metrics; Times is measured with the same
//! table, which is close enough for wrapping.

/// Millimetres per PDF point.
pub const PT_TO_MM: f32 = 25.4 / 72.0;

/// Baseline-to-baseline distance as a multiple of the font size.
pub const LINE_HEIGHT_FACTOR: f32 = 1.15;

/// Helvetica advance widths for ASCII 32..=126, in 1/1000 em.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0'..'9'
    278, 278, 584, 584, 584, 556, 1015, // ':'..'@'
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // 'A'..'M'
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // 'N'..'Z'
    278, 278, 278, 469, 556, 333, // '['..'`'
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // 'a'..'m'
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // 'n'..'z'
    334, 260, 334, 584, // '{'..'~'
];

const COURIER_WIDTH: u16 = 600;
const FALLBACK_WIDTH: u16 = 556;
/// Bold glyphs run a little wider than the regular table.
const BOLD_FACTOR: f32 = 1.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FontFace {
    Helvetica,
    Times,
    Courier,
}

impl FontFace {
    /// Pick the built-in face closest to a CSS-style font family list.
    pub fn from_family(family: &str) -> Self {
        let family = family.to_ascii_lowercase();
        if family.contains("mono") || family.contains("courier") {
            FontFace::Courier
        } else if family.contains("times") || family.contains("georgia") {
            FontFace::Times
        } else if family.contains("serif") && !family.contains("sans") {
            FontFace::Times
        } else {
            FontFace::Helvetica
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Font {
    pub face: FontFace,
    pub bold: bool,
}

impl Font {
    pub const fn regular(face: FontFace) -> Self {
        Self { face, bold: false }
    }

    pub const fn bold(face: FontFace) -> Self {
        Self { face, bold: true }
    }

    /// PostScript name of the standard Type1 font.
    pub fn base_font(&self) -> &'static str {
        match (self.face, self.bold) {
            (FontFace::Helvetica, false) => "Helvetica",
            (FontFace::Helvetica, true) => "Helvetica-Bold",
            (FontFace::Times, false) => "Times-Roman",
            (FontFace::Times, true) => "Times-Bold",
            (FontFace::Courier, false) => "Courier",
            (FontFace::Courier, true) => "Courier-Bold",
        }
    }

    fn char_width(&self, c: char) -> f32 {
        let width = match self.face {
            FontFace::Courier => COURIER_WIDTH,
            FontFace::Helvetica | FontFace::Times => match c as u32 {
                code @ 32..=126 => HELVETICA_WIDTHS[(code - 32) as usize],
                _ => FALLBACK_WIDTH,
            },
        } as f32;

        if self.bold && self.face != FontFace::Courier {
            width * BOLD_FACTOR
        } else {
            width
        }
    }

    /// Width of `text` in millimetres at `size` points.
    pub fn text_width(&self, text: &str, size: f32) -> f32 {
        let units: f32 = text.chars().map(|c| self.char_width(c)).sum();
        units / 1000.0 * size * PT_TO_MM
    }
}

/// Line advance in millimetres for a font size in points.
pub fn line_height(size: f32) -> f32 {
    size * LINE_HEIGHT_FACTOR * PT_TO_MM
}

/// Break `text` into lines no wider than `max_width` millimetres.
///
/// Explicit newlines always break. Words wider than a line are split
/// between characters.
pub fn wrap(text: &str, font: Font, size: f32, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut line = String::new();

        for word in paragraph.split_whitespace() {
            let candidate = if line.is_empty() {
                word.to_string()
            } else {
                format!("{} {}", line, word)
            };

            if font.text_width(&candidate, size) <= max_width {
                line = candidate;
                continue;
            }

            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }

            if font.text_width(word, size) <= max_width {
                line = word.to_string();
            } else {
                for c in word.chars() {
                    line.push(c);
                    if font.text_width(&line, size) > max_width && line.chars().count() > 1 {
                        line.pop();
                        lines.push(std::mem::take(&mut line));
                        line.push(c);
                    }
                }
            }
        }

        lines.push(line);
    }

    lines
}

/// Encode text for a WinAnsiEncoding font. Unmappable characters become `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\u{20}'..='\u{7e}' | '\u{a0}'..='\u{ff}' => c as u8,
            '\t' => b' ',
            '\u{20ac}' => 0x80,
            '\u{2026}' => 0x85,
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201c}' => 0x93,
            '\u{201d}' => 0x94,
            '\u{2022}' => 0x95,
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            '\u{2122}' => 0x99,
            _ => b'?',
        })
        .collect()
}
