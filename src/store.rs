// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Project store with write-through persistence.
//!
//! The store owns every project and writes the whole state to its
//! [`StorageBackend`] after each mutation. There is no rollback: if a write
//! fails, the in-memory change stays and the error is returned, so the next
//! successful write catches storage up (last write wins).

use crate::error::{GuideError, Result};
use crate::io::storage::{MemoryStorage, StorageBackend};
use crate::models::{
    annotation::{Annotation, AnnotationId, Shape},
    project::{Project, ProjectId, Settings, Step, StepId},
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Everything that survives a restart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub current_project_id: Option<ProjectId>,
}

/// Fields of a project to overwrite; `None` leaves a field alone.
#[derive(Debug, Clone, Default)]
pub struct ProjectUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct StepUpdate {
    pub title: Option<String>,
    pub instructions: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct AnnotationUpdate {
    pub shape: Option<Shape>,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SettingsUpdate {
    pub primary_color: Option<String>,
    pub font_family: Option<String>,
    pub show_step_numbers: Option<bool>,
    pub header_text: Option<String>,
    pub footer_text: Option<String>,
}

impl SettingsUpdate {
    fn apply(self, settings: &mut Settings) {
        if let Some(v) = self.primary_color {
            settings.primary_color = v;
        }
        if let Some(v) = self.font_family {
            settings.font_family = v;
        }
        if let Some(v) = self.show_step_numbers {
            settings.show_step_numbers = v;
        }
        if let Some(v) = self.header_text {
            settings.header_text = v;
        }
        if let Some(v) = self.footer_text {
            settings.footer_text = v;
        }
    }
}

/// In-memory project tree synced to durable storage.
pub struct GuideStore {
    backend: Box<dyn StorageBackend>,
    state: PersistedState,
    selected_step: Option<StepId>,
}

impl GuideStore {
    /// Open a store, loading whatever the backend saved last.
    pub fn open(backend: Box<dyn StorageBackend>) -> Result<Self> {
        let state = backend.load()?.unwrap_or_default();
        log::info!("Loaded {} project(s) from storage", state.projects.len());
        Ok(Self {
            backend,
            state,
            selected_step: None,
        })
    }

    /// Store backed by memory only.
    pub fn in_memory() -> Self {
        Self {
            backend: Box::new(MemoryStorage::new()),
            state: PersistedState::default(),
            selected_step: None,
        }
    }

    fn persist(&mut self) -> Result<()> {
        self.backend.save(&self.state).map_err(|e| {
            log::error!("Failed to persist guide state: {}", e);
            e
        })
    }

    /// Run `f` on the open project, refresh its timestamp and persist.
    fn with_current<T>(&mut self, f: impl FnOnce(&mut Project) -> Result<T>) -> Result<T> {
        let id = self.state.current_project_id.ok_or(GuideError::NoCurrentProject)?;
        let project = self
            .state
            .projects
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(GuideError::UnknownProject(id))?;
        let value = f(project)?;
        project.touch();
        self.persist()?;
        Ok(value)
    }

    fn with_step<T>(&mut self, step_id: StepId, f: impl FnOnce(&mut Step) -> Result<T>) -> Result<T> {
        self.with_current(|project| {
            let step = project.step_mut(step_id).ok_or(GuideError::UnknownStep(step_id))?;
            f(step)
        })
    }

    pub fn projects(&self) -> &[Project] {
        &self.state.projects
    }

    pub fn project(&self, id: ProjectId) -> Option<&Project> {
        self.state.projects.iter().find(|p| p.id == id)
    }

    #[cfg(test)]
    pub fn current_project_id(&self) -> Option<ProjectId> {
        self.state.current_project_id
    }

    pub fn current_project(&self) -> Option<&Project> {
        self.state.current_project_id.and_then(|id| self.project(id))
    }

    pub fn selected_step_id(&self) -> Option<StepId> {
        self.selected_step
    }

    pub fn selected_step(&self) -> Option<&Step> {
        let step_id = self.selected_step?;
        self.current_project()?.step(step_id)
    }

    /// Create a project and make it the open one.
    pub fn create_project(&mut self, name: &str, description: &str) -> Result<ProjectId> {
        let project = Project::new(name, description);
        let id = project.id;
        self.state.projects.push(project);
        self.state.current_project_id = Some(id);
        self.selected_step = None;
        log::info!("Created project {:?} ({})", name, id.0);
        self.persist()?;
        Ok(id)
    }

    pub fn update_project(&mut self, id: ProjectId, update: ProjectUpdate) -> Result<()> {
        let project = self
            .state
            .projects
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(GuideError::UnknownProject(id))?;
        if let Some(name) = update.name {
            project.name = name;
        }
        if let Some(description) = update.description {
            project.description = description;
        }
        project.touch();
        self.persist()
    }

    pub fn delete_project(&mut self, id: ProjectId) -> Result<()> {
        let before = self.state.projects.len();
        self.state.projects.retain(|p| p.id != id);
        if self.state.projects.len() == before {
            return Err(GuideError::UnknownProject(id));
        }
        if self.state.current_project_id == Some(id) {
            self.state.current_project_id = None;
            self.selected_step = None;
        }
        log::info!("Deleted project {}", id.0);
        self.persist()
    }

    /// Open a project (or close the open one with `None`).
    pub fn set_current_project(&mut self, id: Option<ProjectId>) -> Result<()> {
        if let Some(id) = id {
            if self.project(id).is_none() {
                return Err(GuideError::UnknownProject(id));
            }
        }
        self.state.current_project_id = id;
        self.selected_step = None;
        self.persist()
    }

    /// Append a step to the open project and select it.
    pub fn add_step(&mut self, image_url: String, image_name: String) -> Result<StepId> {
        let step_id = self.with_current(|project| {
            let step = Step::new(project.steps.len(), image_url, image_name);
            let id = step.id;
            project.steps.push(step);
            Ok(id)
        })?;
        self.selected_step = Some(step_id);
        Ok(step_id)
    }

    pub fn update_step(&mut self, step_id: StepId, update: StepUpdate) -> Result<()> {
        self.with_step(step_id, |step| {
            if let Some(title) = update.title {
                step.title = title;
            }
            if let Some(instructions) = update.instructions {
                step.instructions = instructions;
            }
            Ok(())
        })
    }

    /// Remove a step; the remaining steps are renumbered densely.
    pub fn delete_step(&mut self, step_id: StepId) -> Result<()> {
        self.with_current(|project| {
            let before = project.steps.len();
            project.steps.retain(|s| s.id != step_id);
            if project.steps.len() == before {
                return Err(GuideError::UnknownStep(step_id));
            }
            project.renumber_steps();
            Ok(())
        })?;
        if self.selected_step == Some(step_id) {
            self.selected_step = None;
        }
        Ok(())
    }

    /// Put the steps in the order given by `new_order`, which must name every
    /// step of the open project exactly once.
    pub fn reorder_steps(&mut self, new_order: &[StepId]) -> Result<()> {
        self.with_current(|project| {
            if new_order.len() != project.steps.len() {
                return Err(GuideError::InvalidOrder(format!(
                    "expected {} ids, got {}",
                    project.steps.len(),
                    new_order.len()
                )));
            }
            let unique: HashSet<StepId> = new_order.iter().copied().collect();
            if unique.len() != new_order.len() {
                return Err(GuideError::InvalidOrder("duplicate step id".to_string()));
            }

            let mut remaining = std::mem::take(&mut project.steps);
            let mut reordered = Vec::with_capacity(remaining.len());
            for id in new_order {
                match remaining.iter().position(|s| s.id == *id) {
                    Some(index) => reordered.push(remaining.swap_remove(index)),
                    None => {
                        // Put things back before bailing out.
                        reordered.append(&mut remaining);
                        project.steps = reordered;
                        project.steps.sort_by_key(|s| s.order);
                        return Err(GuideError::UnknownStep(*id));
                    }
                }
            }
            project.steps = reordered;
            project.renumber_steps();
            Ok(())
        })
    }

    /// Move one step to `target_index`, shifting the steps in between.
    pub fn move_step(&mut self, step_id: StepId, target_index: usize) -> Result<()> {
        let project = self.current_project().ok_or(GuideError::NoCurrentProject)?;
        let mut order: Vec<StepId> = project.steps.iter().map(|s| s.id).collect();
        let from = order
            .iter()
            .position(|id| *id == step_id)
            .ok_or(GuideError::UnknownStep(step_id))?;
        let moved = order.remove(from);
        order.insert(target_index.min(order.len()), moved);
        self.reorder_steps(&order)
    }

    pub fn set_selected_step(&mut self, step_id: Option<StepId>) {
        self.selected_step = step_id;
    }

    /// Add an annotation to a step of the open project.
    pub fn add_annotation(&mut self, step_id: StepId, color: &str, shape: Shape) -> Result<AnnotationId> {
        self.with_step(step_id, |step| {
            let annotation = Annotation::new(color, shape);
            let id = annotation.id;
            log::debug!("Adding {:?} annotation to step {}", annotation.kind(), step.order + 1);
            step.annotations.push(annotation);
            Ok(id)
        })
    }

    pub fn update_annotation(
        &mut self,
        step_id: StepId,
        annotation_id: AnnotationId,
        update: AnnotationUpdate,
    ) -> Result<()> {
        self.with_step(step_id, |step| {
            let annotation = step
                .annotation_mut(annotation_id)
                .ok_or(GuideError::UnknownAnnotation(annotation_id))?;
            if let Some(shape) = update.shape {
                annotation.shape = shape;
            }
            if let Some(color) = update.color {
                annotation.color = color;
            }
            Ok(())
        })
    }

    pub fn delete_annotation(&mut self, step_id: StepId, annotation_id: AnnotationId) -> Result<()> {
        self.with_step(step_id, |step| {
            let before = step.annotations.len();
            step.annotations.retain(|a| a.id != annotation_id);
            if step.annotations.len() == before {
                return Err(GuideError::UnknownAnnotation(annotation_id));
            }
            Ok(())
        })
    }

    /// Change settings of the open project.
    pub fn update_settings(&mut self, update: SettingsUpdate) -> Result<()> {
        self.with_current(|project| {
            update.apply(&mut project.settings);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::annotation::{Callout, Point, Region};
    use proptest::prelude::*;

    fn store_with_steps(count: usize) -> (GuideStore, Vec<StepId>) {
        let mut store = GuideStore::in_memory();
        store.create_project("Login Flow", "").unwrap();
        let ids = (0..count)
            .map(|i| store.add_step(format!("data:image/png;base64,{}", i), format!("{}.png", i)).unwrap())
            .collect();
        (store, ids)
    }

    fn orders(store: &GuideStore) -> Vec<usize> {
        store.current_project().unwrap().steps.iter().map(|s| s.order).collect()
    }

    fn ids(store: &GuideStore) -> Vec<StepId> {
        store.current_project().unwrap().steps.iter().map(|s| s.id).collect()
    }

    #[test]
    fn test_mutations_write_through_and_reload() {
        let storage = MemoryStorage::new();
        let mut store = GuideStore::open(Box::new(storage.clone())).unwrap();
        let project_id = store.create_project("Release", "Steps to ship").unwrap();
        let step_id = store.add_step("data:image/png;base64,AA==".into(), "a.png".into()).unwrap();
        store
            .update_step(step_id, StepUpdate { title: Some("Open the menu".into()), ..Default::default() })
            .unwrap();

        let reopened = GuideStore::open(Box::new(storage)).unwrap();
        assert_eq!(reopened.current_project_id(), Some(project_id));
        let project = reopened.current_project().unwrap();
        assert_eq!(project.steps[0].title, "Open the menu");
        assert_eq!(project.description, "Steps to ship");
    }

    #[test]
    fn test_step_mutations_require_open_project() {
        let mut store = GuideStore::in_memory();
        assert!(matches!(
            store.add_step(String::new(), String::new()),
            Err(GuideError::NoCurrentProject)
        ));
    }

    #[test]
    fn test_add_step_selects_it_and_titles_it() {
        let (store, ids) = store_with_steps(2);
        assert_eq!(store.selected_step_id(), Some(ids[1]));
        assert_eq!(store.selected_step().unwrap().title, "Step 2");
    }

    #[test]
    fn test_delete_step_renumbers_densely() {
        let (mut store, step_ids) = store_with_steps(4);
        store.delete_step(step_ids[1]).unwrap();
        assert_eq!(orders(&store), vec![0, 1, 2]);
        assert_eq!(ids(&store), vec![step_ids[0], step_ids[2], step_ids[3]]);
    }

    #[test]
    fn test_delete_selected_step_clears_selection() {
        let (mut store, step_ids) = store_with_steps(2);
        store.delete_step(step_ids[1]).unwrap();
        assert_eq!(store.selected_step_id(), None);
    }

    #[test]
    fn test_reorder_rejects_non_permutations() {
        let (mut store, step_ids) = store_with_steps(3);
        let before = ids(&store);

        let duplicate = vec![step_ids[0], step_ids[0], step_ids[1]];
        assert!(matches!(store.reorder_steps(&duplicate), Err(GuideError::InvalidOrder(_))));

        let short = vec![step_ids[0], step_ids[1]];
        assert!(matches!(store.reorder_steps(&short), Err(GuideError::InvalidOrder(_))));

        let unknown = vec![step_ids[0], step_ids[1], StepId::new()];
        assert!(matches!(store.reorder_steps(&unknown), Err(GuideError::UnknownStep(_))));

        assert_eq!(ids(&store), before);
        assert_eq!(orders(&store), vec![0, 1, 2]);
    }

    #[test]
    fn test_move_step_splices() {
        let (mut store, step_ids) = store_with_steps(4);
        store.move_step(step_ids[0], 2).unwrap();
        assert_eq!(ids(&store), vec![step_ids[1], step_ids[2], step_ids[0], step_ids[3]]);
        store.move_step(step_ids[3], 0).unwrap();
        assert_eq!(ids(&store), vec![step_ids[3], step_ids[1], step_ids[2], step_ids[0]]);
        store.move_step(step_ids[3], 99).unwrap();
        assert_eq!(ids(&store)[3], step_ids[3]);
        assert_eq!(orders(&store), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_callout_numbers_keep_gaps_after_delete() {
        let (mut store, step_ids) = store_with_steps(1);
        let step_id = step_ids[0];
        let mut callouts = Vec::new();
        for _ in 0..3 {
            let number = store.selected_step().unwrap().next_callout_number();
            let shape = Shape::Callout(Callout { x: 10.0, y: 10.0, number });
            callouts.push(store.add_annotation(step_id, "#EF4444", shape).unwrap());
        }
        store.delete_annotation(step_id, callouts[1]).unwrap();

        let step = store.selected_step().unwrap();
        assert_eq!(step.callout_numbers(), vec![1, 3]);
        assert_eq!(step.next_callout_number(), 3);
    }

    #[test]
    fn test_update_annotation_and_settings() {
        let (mut store, step_ids) = store_with_steps(1);
        let id = store
            .add_annotation(step_ids[0], "#EF4444", Shape::Cursor(Point::new(5.0, 5.0)))
            .unwrap();
        store
            .update_annotation(
                step_ids[0],
                id,
                AnnotationUpdate {
                    shape: Some(Shape::Box(Region { x: 1.0, y: 2.0, width: 3.0, height: 4.0 })),
                    color: Some("#000000".into()),
                },
            )
            .unwrap();
        store
            .update_settings(SettingsUpdate { show_step_numbers: Some(false), ..Default::default() })
            .unwrap();

        let project = store.current_project().unwrap();
        let annotation = project.steps[0].annotation(id).unwrap();
        assert_eq!(annotation.color, "#000000");
        assert!(matches!(annotation.shape, Shape::Box(_)));
        assert!(!project.settings.show_step_numbers);
        assert_eq!(project.settings.primary_color, "#3B82F6");
    }

    #[test]
    fn test_delete_current_project_closes_it() {
        let mut store = GuideStore::in_memory();
        let first = store.create_project("One", "").unwrap();
        let second = store.create_project("Two", "").unwrap();
        store.delete_project(second).unwrap();
        assert_eq!(store.current_project_id(), None);
        assert_eq!(store.projects().len(), 1);
        store.set_current_project(Some(first)).unwrap();
        assert_eq!(store.current_project().unwrap().name, "One");
        assert!(matches!(store.delete_project(second), Err(GuideError::UnknownProject(_))));
    }

    proptest! {
        #[test]
        fn reorder_by_permutation_keeps_every_step(
            perm in Just((0..6usize).collect::<Vec<_>>()).prop_shuffle()
        ) {
            let (mut store, step_ids) = store_with_steps(6);
            let new_order: Vec<StepId> = perm.iter().map(|i| step_ids[*i]).collect();
            store.reorder_steps(&new_order).unwrap();

            prop_assert_eq!(ids(&store), new_order);
            prop_assert_eq!(orders(&store), (0..6).collect::<Vec<_>>());
        }

        #[test]
        fn delete_keeps_relative_order(victim in 0..5usize) {
            let (mut store, step_ids) = store_with_steps(5);
            store.delete_step(step_ids[victim]).unwrap();

            let expected: Vec<StepId> = step_ids.iter().copied().filter(|id| *id != step_ids[victim]).collect();
            prop_assert_eq!(ids(&store), expected);
            prop_assert_eq!(orders(&store), (0..4).collect::<Vec<_>>());
        }
    }
}
