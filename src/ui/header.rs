// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Editor header: back to projects, inline rename and export.

use crate::models::project::Project;

pub enum HeaderAction {
    None,
    Back,
    Rename(String),
    OpenExport,
}

/// `rename` holds the name being edited, if a rename is in progress.
pub fn show(ui: &mut egui::Ui, project: &Project, rename: &mut Option<String>) -> HeaderAction {
    let mut action = HeaderAction::None;

    ui.horizontal(|ui| {
        if ui.button("⬅ Projects").clicked() {
            action = HeaderAction::Back;
        }
        ui.separator();

        match rename {
            Some(name) => {
                let response = ui.text_edit_singleline(name);
                let submitted = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                if ui.button("Save").clicked() || submitted {
                    let trimmed = name.trim().to_string();
                    if !trimmed.is_empty() && trimmed != project.name {
                        action = HeaderAction::Rename(trimmed);
                    }
                    *rename = None;
                } else if ui.button("Cancel").clicked() || ui.input(|i| i.key_pressed(egui::Key::Escape)) {
                    *rename = None;
                }
            }
            None => {
                let title = ui.add(
                    egui::Label::new(egui::RichText::new(&project.name).heading()).sense(egui::Sense::click()),
                );
                if title.on_hover_text("Click to rename").clicked() {
                    *rename = Some(project.name.clone());
                }
                ui.label(egui::RichText::new(format!("{} steps", project.steps.len())).weak());
            }
        }

        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if ui.button("📄 Export PDF").clicked() {
                action = HeaderAction::OpenExport;
            }
        });
    });

    action
}
