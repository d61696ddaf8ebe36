// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Export dialog: guide preview, export settings and the export button.

use crate::models::project::Project;
use crate::store::SettingsUpdate;
use crate::util::color::{Rgba, PALETTE};

pub enum ExportPanelAction {
    None,
    UpdateSettings(SettingsUpdate),
    Export,
    Close,
}

const FONT_FAMILIES: [(&str, &str); 3] = [
    ("Sans-serif", "Inter, sans-serif"),
    ("Serif", "Georgia, serif"),
    ("Monospace", "JetBrains Mono, monospace"),
];

/// Show the export window. Exporting is disabled without steps or while
/// an export is already running.
pub fn show(ctx: &egui::Context, project: &Project, exporting: bool, date: &str) -> ExportPanelAction {
    let mut action = ExportPanelAction::None;
    let mut open = true;
    let settings = &project.settings;

    egui::Window::new("Export Guide")
        .collapsible(false)
        .resizable(false)
        .default_width(420.0)
        .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
        .open(&mut open)
        .show(ctx, |ui| {
            ui.add_enabled_ui(!exporting, |ui| {
                // Preview card
                egui::Frame::group(ui.style()).show(ui, |ui| {
                    ui.set_min_width(380.0);
                    ui.vertical_centered(|ui| {
                        ui.heading(&project.name);
                        if !project.description.is_empty() {
                            ui.label(egui::RichText::new(&project.description).weak());
                        }
                        ui.add_space(8.0);
                        ui.label(format!("{} steps", project.steps.len()));
                        ui.label(egui::RichText::new(format!("Generated on {}", date)).small().weak());
                    });
                });

                ui.add_space(8.0);
                ui.label(egui::RichText::new("Settings").strong());

                let mut show_numbers = settings.show_step_numbers;
                if ui.checkbox(&mut show_numbers, "Show step numbers").changed() {
                    action = ExportPanelAction::UpdateSettings(SettingsUpdate {
                        show_step_numbers: Some(show_numbers),
                        ..Default::default()
                    });
                }

                ui.horizontal(|ui| {
                    ui.label("Primary color");
                    for hex in PALETTE {
                        let c = Rgba::from_hex(hex);
                        let selected = settings.primary_color.eq_ignore_ascii_case(hex);
                        let button = egui::Button::new("  ")
                            .fill(egui::Color32::from_rgb(c.r, c.g, c.b))
                            .selected(selected);
                        if ui.add(button).on_hover_text(hex).clicked() {
                            action = ExportPanelAction::UpdateSettings(SettingsUpdate {
                                primary_color: Some(hex.to_string()),
                                ..Default::default()
                            });
                        }
                    }
                });

                ui.horizontal(|ui| {
                    ui.label("Font");
                    let current = FONT_FAMILIES
                        .iter()
                        .find(|(_, family)| *family == settings.font_family)
                        .map(|(name, _)| *name)
                        .unwrap_or(settings.font_family.as_str());
                    egui::ComboBox::from_id_source("font_family")
                        .selected_text(current)
                        .show_ui(ui, |ui| {
                            for (name, family) in FONT_FAMILIES {
                                if ui.selectable_label(settings.font_family == family, name).clicked() {
                                    action = ExportPanelAction::UpdateSettings(SettingsUpdate {
                                        font_family: Some(family.to_string()),
                                        ..Default::default()
                                    });
                                }
                            }
                        });
                });

                ui.horizontal(|ui| {
                    ui.label("Header");
                    let mut header = settings.header_text.clone();
                    if ui.text_edit_singleline(&mut header).changed() {
                        action = ExportPanelAction::UpdateSettings(SettingsUpdate {
                            header_text: Some(header),
                            ..Default::default()
                        });
                    }
                });
                ui.horizontal(|ui| {
                    ui.label("Footer");
                    let mut footer = settings.footer_text.clone();
                    if ui.text_edit_singleline(&mut footer).changed() {
                        action = ExportPanelAction::UpdateSettings(SettingsUpdate {
                            footer_text: Some(footer),
                            ..Default::default()
                        });
                    }
                });

                ui.add_space(8.0);
                ui.label(egui::RichText::new("Summary").strong());
                ui.label(format!("Steps: {}", project.steps.len()));
                ui.label(format!("Annotations: {}", project.annotation_count()));
            });

            ui.separator();
            ui.horizontal(|ui| {
                let can_export = !project.steps.is_empty() && !exporting;
                let label = if exporting { "Exporting..." } else { "Export PDF" };
                if ui.add_enabled(can_export, egui::Button::new(label)).clicked() {
                    action = ExportPanelAction::Export;
                }
                if exporting {
                    ui.spinner();
                }
                if project.steps.is_empty() {
                    ui.label(egui::RichText::new("Add at least one step to export").weak());
                }
            });
        });

    if !open && !exporting {
        action = ExportPanelAction::Close;
    }
    action
}
