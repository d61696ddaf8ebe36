// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Ordered list of the project's steps.

use crate::models::project::{Project, StepId};
use std::collections::HashMap;

pub enum StepListAction {
    None,
    AddScreenshots,
    Select(StepId),
    Delete(StepId),
    Move { id: StepId, to: usize },
}

const THUMBNAIL_WIDTH: f32 = 150.0;

/// What the list shows besides the steps themselves.
pub struct StepListView<'a> {
    pub thumbnails: &'a HashMap<StepId, (egui::TextureHandle, [u32; 2])>,
    /// Files still being read
    pub pending_uploads: usize,
    /// Files are being dragged over the window
    pub files_hovered: bool,
}

pub fn show(ui: &mut egui::Ui, project: &Project, selected: Option<StepId>, view: &StepListView) -> StepListAction {
    let mut action = StepListAction::None;
    let thumbnails = view.thumbnails;

    ui.horizontal(|ui| {
        ui.heading("Steps");
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if ui.button("＋ Add").on_hover_text("Add screenshots").clicked() {
                action = StepListAction::AddScreenshots;
            }
        });
    });
    ui.separator();

    if view.files_hovered {
        egui::Frame::group(ui.style())
            .fill(ui.visuals().selection.bg_fill.linear_multiply(0.3))
            .show(ui, |ui| {
                ui.set_min_width(ui.available_width());
                ui.label("Drop screenshots to add steps");
            });
    }

    if view.pending_uploads > 0 {
        ui.horizontal(|ui| {
            ui.spinner();
            ui.label(format!("Reading {} file(s)...", view.pending_uploads));
        });
    }

    if project.steps.is_empty() {
        ui.label(egui::RichText::new("Add or drop screenshots to create steps").weak());
        return action;
    }

    let last = project.steps.len() - 1;
    egui::ScrollArea::vertical().show(ui, |ui| {
        for (index, step) in project.steps.iter().enumerate() {
            let is_selected = selected == Some(step.id);
            let frame = egui::Frame::group(ui.style()).fill(if is_selected {
                ui.visuals().selection.bg_fill.linear_multiply(0.4)
            } else {
                egui::Color32::TRANSPARENT
            });

            frame.show(ui, |ui| {
                ui.horizontal(|ui| {
                    let title = format!("{}. {}", index + 1, step.title);
                    if ui.selectable_label(is_selected, title).clicked() {
                        action = StepListAction::Select(step.id);
                    }
                });

                if let Some((texture, [w, h])) = thumbnails.get(&step.id) {
                    let size = egui::vec2(THUMBNAIL_WIDTH, THUMBNAIL_WIDTH * *h as f32 / (*w).max(1) as f32);
                    let response = ui.add(egui::Image::new((texture.id(), size)).sense(egui::Sense::click()));
                    if response.clicked() {
                        action = StepListAction::Select(step.id);
                    }
                }

                ui.horizontal(|ui| {
                    if !step.annotations.is_empty() {
                        ui.label(egui::RichText::new(format!("{} annotations", step.annotations.len())).small().weak());
                    }
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.small_button("🗑").on_hover_text("Delete step").clicked() {
                            action = StepListAction::Delete(step.id);
                        }
                        if ui.add_enabled(index < last, egui::Button::new("⏷").small()).clicked() {
                            action = StepListAction::Move { id: step.id, to: index + 1 };
                        }
                        if ui.add_enabled(index > 0, egui::Button::new("⏶").small()).clicked() {
                            action = StepListAction::Move { id: step.id, to: index - 1 };
                        }
                    });
                });
            });
            ui.add_space(4.0);
        }
    });

    action
}
