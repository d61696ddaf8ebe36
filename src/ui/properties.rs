// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Step properties panel.
//!
//! Edits the selected step's title and instructions and lists its
//! annotations, which can be selected or deleted from here.

use crate::models::annotation::{AnnotationId, Shape};
use crate::models::project::Step;
use crate::store::StepUpdate;
use crate::util::color::Rgba;

/// Result of properties panel interaction.
pub enum PropertiesAction {
    None,
    UpdateStep(StepUpdate),
    SelectAnnotation(AnnotationId),
    DeleteAnnotation(AnnotationId),
}

/// Display the properties panel for `step`.
pub fn show(ui: &mut egui::Ui, step: Option<&Step>, selected: Option<AnnotationId>) -> PropertiesAction {
    let mut action = PropertiesAction::None;

    ui.heading("Step");
    ui.separator();

    let Some(step) = step else {
        ui.label(egui::RichText::new("Select a step to edit it").weak());
        return action;
    };

    ui.label("Title");
    let mut title = step.title.clone();
    if ui.text_edit_singleline(&mut title).changed() {
        action = PropertiesAction::UpdateStep(StepUpdate { title: Some(title), ..Default::default() });
    }

    ui.add_space(6.0);
    ui.label("Instructions");
    let mut instructions = step.instructions.clone();
    let response = ui.add(
        egui::TextEdit::multiline(&mut instructions)
            .desired_rows(4)
            .hint_text("Describe what to do in this step..."),
    );
    if response.changed() {
        action = PropertiesAction::UpdateStep(StepUpdate { instructions: Some(instructions), ..Default::default() });
    }

    ui.add_space(10.0);
    ui.heading(format!("Annotations ({})", step.annotations.len()));
    ui.separator();

    if step.annotations.is_empty() {
        ui.label(egui::RichText::new("Pick a tool and draw on the screenshot").weak());
        return action;
    }

    egui::ScrollArea::vertical().show(ui, |ui| {
        for annotation in &step.annotations {
            ui.horizontal(|ui| {
                let c = Rgba::from_hex(&annotation.color);
                let (rect, _) = ui.allocate_exact_size(egui::vec2(12.0, 12.0), egui::Sense::hover());
                ui.painter().rect_filled(rect, 2.0, egui::Color32::from_rgb(c.r, c.g, c.b));

                let text = match &annotation.shape {
                    Shape::Text(label) => format!("Text: {}", label.text),
                    Shape::Callout(callout) => format!("Callout {}", callout.number),
                    shape => shape.kind().label().to_string(),
                };

                if ui.selectable_label(selected == Some(annotation.id), text).clicked() {
                    action = PropertiesAction::SelectAnnotation(annotation.id);
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.small_button("🗑").on_hover_text("Delete annotation").clicked() {
                        action = PropertiesAction::DeleteAnnotation(annotation.id);
                    }
                });
            });
        }
    });

    action
}
