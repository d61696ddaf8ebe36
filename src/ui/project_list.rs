// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Start screen: saved projects and the new-project form.

use crate::models::project::{Project, ProjectId};

pub enum ProjectListAction {
    None,
    Create { name: String, description: String },
    Open(ProjectId),
    Delete(ProjectId),
}

/// Inputs of the new-project form, kept across frames.
#[derive(Default)]
pub struct NewProjectForm {
    pub name: String,
    pub description: String,
}

pub fn show(ui: &mut egui::Ui, projects: &[Project], form: &mut NewProjectForm) -> ProjectListAction {
    let mut action = ProjectListAction::None;

    ui.vertical_centered(|ui| {
        ui.add_space(20.0);
        ui.heading(egui::RichText::new("Step Guide Builder").size(28.0));
        ui.label(
            egui::RichText::new("Turn screenshots into step-by-step guides")
                .color(egui::Color32::from_gray(150)),
        );
        ui.add_space(20.0);
    });

    ui.group(|ui| {
        ui.label(egui::RichText::new("New project").strong());
        ui.horizontal(|ui| {
            ui.label("Name");
            ui.text_edit_singleline(&mut form.name);
        });
        ui.horizontal(|ui| {
            ui.label("Description");
            ui.text_edit_singleline(&mut form.description);
        });

        let name = form.name.trim();
        if ui.add_enabled(!name.is_empty(), egui::Button::new("Create")).clicked() {
            action = ProjectListAction::Create {
                name: name.to_string(),
                description: form.description.trim().to_string(),
            };
            *form = NewProjectForm::default();
        }
    });

    ui.add_space(16.0);
    ui.heading(format!("Projects ({})", projects.len()));
    ui.separator();

    if projects.is_empty() {
        ui.label(egui::RichText::new("No projects yet").weak());
        return action;
    }

    egui::ScrollArea::vertical().show(ui, |ui| {
        for project in projects {
            ui.group(|ui| {
                ui.horizontal(|ui| {
                    ui.vertical(|ui| {
                        if ui.link(egui::RichText::new(&project.name).strong()).clicked() {
                            action = ProjectListAction::Open(project.id);
                        }
                        if !project.description.is_empty() {
                            ui.label(egui::RichText::new(&project.description).weak());
                        }
                        ui.label(
                            egui::RichText::new(format!(
                                "{} steps · updated {}",
                                project.steps.len(),
                                project.updated_at.format("%Y-%m-%d %H:%M")
                            ))
                            .small()
                            .weak(),
                        );
                    });
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("Delete").clicked() {
                            action = ProjectListAction::Delete(project.id);
                        }
                        if ui.button("Open").clicked() {
                            action = ProjectListAction::Open(project.id);
                        }
                    });
                });
            });
        }
    });

    action
}
