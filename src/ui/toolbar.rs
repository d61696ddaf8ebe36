// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Toolbar and tool selection UI.
//!
//! Tool buttons with their keyboard shortcuts, the annotation color
//! palette and the zoom controls.

use crate::editor::{AnnotationEditor, Tool};
use crate::util::color::{Rgba, PALETTE};

fn tool_icon(tool: Tool) -> &'static str {
    match tool {
        Tool::Select => "⬆",
        Tool::Callout => "①",
        Tool::Box => "▭",
        Tool::Circle => "◯",
        Tool::Arrow => "➡",
        Tool::Cursor => "◉",
        Tool::Text => "T",
        Tool::Highlight => "▇",
        Tool::Blur => "▒",
    }
}

/// Display the toolbar for the annotation editor.
pub fn show(ui: &mut egui::Ui, editor: &mut AnnotationEditor) {
    ui.horizontal(|ui| {
        ui.spacing_mut().item_spacing.x = 6.0;

        for tool in Tool::ALL {
            let label = format!("{} {}", tool_icon(tool), tool.label());
            let hint = format!("{} ({})", tool.label(), tool.shortcut().to_ascii_uppercase());
            if ui
                .selectable_label(editor.tool() == tool, label)
                .on_hover_text(hint)
                .clicked()
            {
                editor.set_tool(tool);
            }
        }

        ui.separator();

        for hex in PALETTE {
            let c = Rgba::from_hex(hex);
            let fill = egui::Color32::from_rgb(c.r, c.g, c.b);
            let selected = editor.color().eq_ignore_ascii_case(hex);

            let (rect, response) = ui.allocate_exact_size(egui::vec2(18.0, 18.0), egui::Sense::click());
            ui.painter().circle_filled(rect.center(), 8.0, fill);
            if selected {
                ui.painter()
                    .circle_stroke(rect.center(), 9.5, egui::Stroke::new(2.0, ui.visuals().strong_text_color()));
            }
            if response.on_hover_text(hex).clicked() {
                editor.set_color(hex);
            }
        }

        ui.separator();

        if ui.button("−").on_hover_text("Zoom out (-)").clicked() {
            editor.zoom_mut().zoom_out();
        }
        if ui
            .button(format!("{:.0}%", editor.zoom().factor() * 100.0))
            .on_hover_text("Reset zoom (0)")
            .clicked()
        {
            editor.zoom_mut().reset();
        }
        if ui.button("+").on_hover_text("Zoom in (+)").clicked() {
            editor.zoom_mut().zoom_in();
        }

        ui.separator();

        let hint = match editor.tool() {
            Tool::Select => "Click an annotation to select it, drag to move it",
            Tool::Callout | Tool::Cursor => "Click to place",
            Tool::Text => "Click where the text should go",
            Tool::Arrow => "Drag from the start to the tip",
            Tool::Box | Tool::Circle | Tool::Highlight | Tool::Blur => "Drag to draw",
        };
        ui.label(egui::RichText::new(hint).italics().weak());
    });
}
