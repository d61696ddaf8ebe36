// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Main application state and egui App implementation.
//!
//! `GuideApp` owns the store and the annotation editor, runs uploads,
//! screenshot decoding and PDF export on background threads, and routes
//! the actions returned by the UI panels to the store.

use crate::config::AppConfig;
use crate::editor::{AnnotationEditor, EditorAction, EditorKey, Mode};
use crate::export;
use crate::io::media::{self, LoadedImage, UploadOutcome};
use crate::models::project::StepId;
use crate::store::{AnnotationUpdate, GuideStore, ProjectUpdate};
use crate::ui::{canvas, export_panel, header, project_list, properties, step_list, toolbar};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, Sender};

type DecodeResult = (StepId, Result<LoadedImage, String>);

/// Main application state.
pub struct GuideApp {
    config: AppConfig,
    store: GuideStore,
    editor: AnnotationEditor,

    new_project: project_list::NewProjectForm,
    /// Project name being edited in the header
    rename: Option<String>,
    /// Text typed into the text-annotation prompt
    text_input: String,

    /// Decoded screenshots, by step
    textures: HashMap<StepId, (egui::TextureHandle, [u32; 2])>,
    decoding: HashSet<StepId>,
    /// Screenshots that failed to decode; not retried
    undecodable: HashSet<StepId>,
    decode_tx: Sender<DecodeResult>,
    decode_rx: Receiver<DecodeResult>,

    upload_tx: Sender<UploadOutcome>,
    upload_rx: Receiver<UploadOutcome>,
    pending_uploads: usize,

    export_open: bool,
    /// Running export; `Some` while the export thread works
    export_job: Option<Receiver<Result<PathBuf, String>>>,

    /// Step the editor state belongs to
    editing_step: Option<StepId>,
}

impl GuideApp {
    pub fn new(config: AppConfig, store: GuideStore) -> Self {
        let (decode_tx, decode_rx) = channel();
        let (upload_tx, upload_rx) = channel();
        Self {
            config,
            store,
            editor: AnnotationEditor::new(),
            new_project: project_list::NewProjectForm::default(),
            rename: None,
            text_input: String::new(),
            textures: HashMap::new(),
            decoding: HashSet::new(),
            undecodable: HashSet::new(),
            decode_tx,
            decode_rx,
            upload_tx,
            upload_rx,
            pending_uploads: 0,
            export_open: false,
            export_job: None,
            editing_step: None,
        }
    }

    fn exporting(&self) -> bool {
        self.export_job.is_some()
    }

    /// Ask for screenshots and read them in the background.
    fn pick_screenshots(&mut self) {
        if let Some(paths) = rfd::FileDialog::new()
            .add_filter("Images", &["png", "jpg", "jpeg", "gif", "bmp", "webp", "tiff", "tif"])
            .pick_files()
        {
            self.queue_uploads(paths.into_iter().map(Into::into).collect());
        }
    }

    fn queue_uploads(&mut self, sources: Vec<media::UploadSource>) {
        self.pending_uploads += sources.len();
        media::spawn_uploads(sources, &self.upload_tx);
    }

    /// Files dropped on the window become steps of the open project.
    fn accept_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped = ctx.input(|i| i.raw.dropped_files.clone());
        if dropped.is_empty() || self.store.current_project().is_none() {
            return;
        }
        let sources = media::dropped_sources(&dropped);
        if !sources.is_empty() {
            self.queue_uploads(sources);
        }
    }

    /// Turn finished uploads into steps, in the order they complete.
    fn poll_uploads(&mut self) {
        while let Ok(outcome) = self.upload_rx.try_recv() {
            self.pending_uploads = self.pending_uploads.saturating_sub(1);
            match outcome {
                Ok(Some(image)) => {
                    if let Err(e) = self.store.add_step(image.data_url, image.name) {
                        log::error!("Failed to add step: {}", e);
                    }
                }
                Ok(None) => {}
                Err(e) => log::warn!("{}", e),
            }
        }
    }

    /// Start decoding screenshots that have no texture yet.
    fn request_textures(&mut self) {
        let Some(project) = self.store.current_project() else {
            return;
        };

        let live: HashSet<StepId> = project.steps.iter().map(|s| s.id).collect();
        self.textures.retain(|id, _| live.contains(id));
        self.undecodable.retain(|id| live.contains(id));

        for step in &project.steps {
            if self.textures.contains_key(&step.id)
                || self.undecodable.contains(&step.id)
                || !self.decoding.insert(step.id)
            {
                continue;
            }
            let id = step.id;
            let url = step.image_url.clone();
            let sender = self.decode_tx.clone();
            std::thread::spawn(move || {
                let result = media::load_data_url(&url).map_err(|e| e.to_string());
                let _ = sender.send((id, result));
            });
        }
    }

    fn poll_textures(&mut self, ctx: &egui::Context) {
        while let Ok((id, result)) = self.decode_rx.try_recv() {
            self.decoding.remove(&id);
            match result {
                Ok(image) => {
                    let size = [image.width as usize, image.height as usize];
                    let color_image = egui::ColorImage::from_rgba_unmultiplied(size, &image.pixels);
                    let texture = ctx.load_texture(format!("step-{}", id.0), color_image, egui::TextureOptions::LINEAR);
                    self.textures.insert(id, (texture, [image.width, image.height]));
                }
                Err(e) => {
                    log::error!("Failed to decode screenshot for step {}: {}", id.0, e);
                    self.undecodable.insert(id);
                }
            }
        }
    }

    fn apply_editor_action(&mut self, action: EditorAction) {
        let Some(step_id) = self.store.selected_step_id() else {
            return;
        };
        let result = match action {
            EditorAction::None => return,
            EditorAction::Add { color, shape } => self.store.add_annotation(step_id, &color, shape).map(|_| ()),
            EditorAction::Move { id, shape } => self.store.update_annotation(
                step_id,
                id,
                AnnotationUpdate { shape: Some(shape), ..Default::default() },
            ),
            EditorAction::Delete(id) => self.store.delete_annotation(step_id, id),
        };
        if let Err(e) = result {
            log::error!("Annotation change failed: {}", e);
        }
    }

    /// Editor shortcuts. Ignored while a text field has focus.
    fn handle_keys(&mut self, ctx: &egui::Context) {
        let text_focused = ctx.wants_keyboard_input();
        let keys: Vec<EditorKey> = ctx.input(|i| {
            let mut keys = Vec::new();
            if i.key_pressed(egui::Key::Escape) {
                keys.push(EditorKey::Escape);
            }
            if i.key_pressed(egui::Key::Delete) {
                keys.push(EditorKey::Delete);
            }
            if i.key_pressed(egui::Key::Backspace) {
                keys.push(EditorKey::Backspace);
            }
            if !i.modifiers.command {
                for event in &i.events {
                    if let egui::Event::Text(text) = event {
                        keys.extend(text.chars().map(EditorKey::Char));
                    }
                }
            }
            keys
        });

        for key in keys {
            let action = self.editor.key(key, text_focused);
            self.apply_editor_action(action);
        }
    }

    fn show_text_prompt(&mut self, ctx: &egui::Context) {
        if !matches!(self.editor.mode(), Mode::PendingText { .. }) {
            return;
        }

        let mut submitted = None;
        egui::Window::new("Add text")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                let response = ui.text_edit_singleline(&mut self.text_input);
                response.request_focus();
                let enter = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                let escape = ui.input(|i| i.key_pressed(egui::Key::Escape));
                ui.horizontal(|ui| {
                    if ui.button("Add").clicked() || enter {
                        submitted = Some(Some(std::mem::take(&mut self.text_input)));
                    }
                    if ui.button("Cancel").clicked() || escape {
                        submitted = Some(None);
                    }
                });
            });

        if let Some(text) = submitted {
            self.text_input.clear();
            let action = self.editor.submit_text(text);
            self.apply_editor_action(action);
        }
    }

    /// Ask where to save and export the open project on a worker thread.
    fn start_export(&mut self) {
        if self.exporting() {
            return;
        }
        let Some(project) = self.store.current_project().cloned() else {
            return;
        };
        let Some(path) = rfd::FileDialog::new()
            .add_filter("PDF", &["pdf"])
            .set_file_name(export::export_file_name(&project.name))
            .save_file()
        else {
            return;
        };

        let config = self.config.export.clone();
        let (sender, receiver) = channel();
        self.export_job = Some(receiver);

        std::thread::spawn(move || {
            let result = (|| -> anyhow::Result<PathBuf> {
                let date = chrono::Local::now().date_naive();
                let bytes = export::export_pdf(&project, &config, date)?;
                std::fs::write(&path, bytes)?;
                Ok(path)
            })();
            let _ = sender.send(result.map_err(|e| e.to_string()));
        });
    }

    fn poll_export(&mut self) {
        let Some(ref receiver) = self.export_job else {
            return;
        };
        let Ok(result) = receiver.try_recv() else {
            return;
        };
        self.export_job = None;

        match result {
            Ok(path) => log::info!("Exported guide to {}", path.display()),
            Err(e) => {
                log::error!("Failed to export PDF: {}", e);
                rfd::MessageDialog::new()
                    .set_level(rfd::MessageLevel::Error)
                    .set_title("Export failed")
                    .set_description(format!("Failed to export PDF. Please try again.\n\n{}", e))
                    .set_buttons(rfd::MessageButtons::Ok)
                    .show();
            }
        }
    }

    fn show_project_list(&mut self, ctx: &egui::Context) {
        let action = egui::CentralPanel::default()
            .show(ctx, |ui| project_list::show(ui, self.store.projects(), &mut self.new_project))
            .inner;

        let result = match action {
            project_list::ProjectListAction::None => Ok(()),
            project_list::ProjectListAction::Create { name, description } => {
                self.store.create_project(&name, &description).map(|_| ())
            }
            project_list::ProjectListAction::Open(id) => self.store.set_current_project(Some(id)),
            project_list::ProjectListAction::Delete(id) => {
                let name = self.store.project(id).map(|p| p.name.clone()).unwrap_or_default();
                let confirmed = rfd::MessageDialog::new()
                    .set_level(rfd::MessageLevel::Warning)
                    .set_title("Delete project")
                    .set_description(format!("Delete \"{}\"? This cannot be undone.", name))
                    .set_buttons(rfd::MessageButtons::YesNo)
                    .show();
                if confirmed == rfd::MessageDialogResult::Yes {
                    self.store.delete_project(id)
                } else {
                    Ok(())
                }
            }
        };
        if let Err(e) = result {
            log::error!("{}", e);
        }
    }

    fn show_editor(&mut self, ctx: &egui::Context) {
        let Some(project) = self.store.current_project() else {
            return;
        };

        // Keep a step selected while the project has any.
        if self.store.selected_step().is_none() {
            let first = project.steps.first().map(|s| s.id);
            self.store.set_selected_step(first);
        }
        if self.editing_step != self.store.selected_step_id() {
            self.editing_step = self.store.selected_step_id();
            self.editor.reset_for_step();
        }

        let Some(project) = self.store.current_project() else {
            return;
        };

        let header_action = egui::TopBottomPanel::top("header")
            .show(ctx, |ui| header::show(ui, project, &mut self.rename))
            .inner;
        match header_action {
            header::HeaderAction::Back => {
                if let Err(e) = self.store.set_current_project(None) {
                    log::error!("{}", e);
                }
                self.export_open = false;
                return;
            }
            header::HeaderAction::Rename(name) => {
                let id = project.id;
                let update = ProjectUpdate { name: Some(name), ..Default::default() };
                if let Err(e) = self.store.update_project(id, update) {
                    log::error!("{}", e);
                }
            }
            header::HeaderAction::OpenExport => self.export_open = true,
            header::HeaderAction::None => {}
        }

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            toolbar::show(ui, &mut self.editor);
        });

        let Some(project) = self.store.current_project() else {
            return;
        };
        let selected = self.store.selected_step_id();
        let view = step_list::StepListView {
            thumbnails: &self.textures,
            pending_uploads: self.pending_uploads,
            files_hovered: ctx.input(|i| !i.raw.hovered_files.is_empty()),
        };
        let steps_action = egui::SidePanel::left("steps")
            .default_width(190.0)
            .show(ctx, |ui| step_list::show(ui, project, selected, &view))
            .inner;

        let result = match steps_action {
            step_list::StepListAction::None => Ok(()),
            step_list::StepListAction::AddScreenshots => {
                self.pick_screenshots();
                Ok(())
            }
            step_list::StepListAction::Select(id) => {
                self.store.set_selected_step(Some(id));
                Ok(())
            }
            step_list::StepListAction::Delete(id) => self.store.delete_step(id),
            step_list::StepListAction::Move { id, to } => self.store.move_step(id, to),
        };
        if let Err(e) = result {
            log::error!("{}", e);
        }

        let properties_action = egui::SidePanel::right("properties")
            .default_width(260.0)
            .show(ctx, |ui| properties::show(ui, self.store.selected_step(), self.editor.selected()))
            .inner;

        match properties_action {
            properties::PropertiesAction::UpdateStep(update) => {
                if let Some(step_id) = self.store.selected_step_id() {
                    if let Err(e) = self.store.update_step(step_id, update) {
                        log::error!("{}", e);
                    }
                }
            }
            properties::PropertiesAction::SelectAnnotation(id) => self.editor.select(Some(id)),
            properties::PropertiesAction::DeleteAnnotation(id) => {
                if self.editor.selected() == Some(id) {
                    self.editor.select(None);
                }
                self.apply_editor_action(EditorAction::Delete(id));
            }
            properties::PropertiesAction::None => {}
        }

        let actions = egui::CentralPanel::default()
            .show(ctx, |ui| match self.store.selected_step() {
                Some(step) => {
                    let screenshot = match self.textures.get(&step.id) {
                        Some(texture) => canvas::Screenshot::Ready(texture),
                        None if self.undecodable.contains(&step.id) => canvas::Screenshot::Unreadable,
                        None => canvas::Screenshot::Loading,
                    };
                    canvas::show(ui, step, screenshot, &mut self.editor)
                }
                None => {
                    ui.centered_and_justified(|ui| {
                        ui.label(
                            egui::RichText::new("Add screenshots to start building your guide")
                                .size(16.0)
                                .color(egui::Color32::from_gray(180)),
                        );
                    });
                    Vec::new()
                }
            })
            .inner;
        for action in actions {
            self.apply_editor_action(action);
        }

        self.show_text_prompt(ctx);

        if !self.export_open {
            self.handle_keys(ctx);
        }
    }

    fn show_export_panel(&mut self, ctx: &egui::Context) {
        if !self.export_open {
            return;
        }
        let Some(project) = self.store.current_project() else {
            self.export_open = false;
            return;
        };

        let date = chrono::Local::now().date_naive().format("%-m/%-d/%Y").to_string();
        match export_panel::show(ctx, project, self.exporting(), &date) {
            export_panel::ExportPanelAction::UpdateSettings(update) => {
                if let Err(e) = self.store.update_settings(update) {
                    log::error!("{}", e);
                }
            }
            export_panel::ExportPanelAction::Export => self.start_export(),
            export_panel::ExportPanelAction::Close => self.export_open = false,
            export_panel::ExportPanelAction::None => {}
        }
    }
}

impl eframe::App for GuideApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.accept_dropped_files(ctx);
        self.poll_uploads();
        self.poll_export();
        self.request_textures();
        self.poll_textures(ctx);

        // Keep polling while background work is running
        if self.pending_uploads > 0 || !self.decoding.is_empty() || self.exporting() {
            ctx.request_repaint();
        }

        if self.store.current_project().is_none() {
            self.show_project_list(ctx);
            return;
        }

        self.show_editor(ctx);
        self.show_export_panel(ctx);
    }
}
