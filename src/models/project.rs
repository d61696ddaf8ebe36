// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Project, step and settings data.
//!
//! A project owns its steps and each step owns its annotations. Step
//! `order` fields are kept dense (0..n-1) by every operation that adds,
//! removes or reorders steps.

use super::annotation::{Annotation, AnnotationId, AnnotationKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(pub Uuid);

impl ProjectId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ProjectId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepId(pub Uuid);

impl StepId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for StepId {
    fn default() -> Self {
        Self::new()
    }
}

/// Export and presentation settings of a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub primary_color: String,
    pub font_family: String,
    pub show_step_numbers: bool,
    pub header_text: String,
    pub footer_text: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            primary_color: "#3B82F6".to_string(),
            font_family: "Inter, sans-serif".to_string(),
            show_step_numbers: true,
            header_text: String::new(),
            footer_text: String::new(),
        }
    }
}

/// One screenshot plus its title, instructions and annotations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    pub id: StepId,
    pub order: usize,
    /// Encoded screenshot as a `data:` URL.
    pub image_url: String,
    #[serde(default)]
    pub image_name: String,
    pub title: String,
    #[serde(default)]
    pub instructions: String,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

impl Step {
    /// Create a step at position `order` with the default title.
    pub fn new(order: usize, image_url: String, image_name: String) -> Self {
        Self {
            id: StepId::new(),
            order,
            image_url,
            image_name,
            title: format!("Step {}", order + 1),
            instructions: String::new(),
            annotations: Vec::new(),
        }
    }

    pub fn annotation(&self, id: AnnotationId) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.id == id)
    }

    pub fn annotation_mut(&mut self, id: AnnotationId) -> Option<&mut Annotation> {
        self.annotations.iter_mut().find(|a| a.id == id)
    }

    /// Number the next callout would get. Existing numbers are never
    /// reassigned, so deleting a callout leaves a gap.
    pub fn next_callout_number(&self) -> u32 {
        let existing = self
            .annotations
            .iter()
            .filter(|a| a.kind() == AnnotationKind::Callout)
            .count();
        existing as u32 + 1
    }

    /// Callout numbers in drawing order.
    #[cfg(test)]
    pub fn callout_numbers(&self) -> Vec<u32> {
        self.annotations
            .iter()
            .filter_map(|a| match &a.shape {
                super::annotation::Shape::Callout(c) => Some(c.number),
                _ => None,
            })
            .collect()
    }
}

/// A named collection of ordered steps plus export settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub steps: Vec<Step>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub settings: Settings,
}

impl Project {
    /// Create an empty project with default settings.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: ProjectId::new(),
            name: name.into(),
            description: description.into(),
            steps: Vec::new(),
            created_at: now,
            updated_at: now,
            settings: Settings::default(),
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn step(&self, id: StepId) -> Option<&Step> {
        self.steps.iter().find(|s| s.id == id)
    }

    pub fn step_mut(&mut self, id: StepId) -> Option<&mut Step> {
        self.steps.iter_mut().find(|s| s.id == id)
    }

    pub fn annotation_count(&self) -> usize {
        self.steps.iter().map(|s| s.annotations.len()).sum()
    }

    /// Reassign `order` so it matches each step's position.
    pub fn renumber_steps(&mut self) {
        for (index, step) in self.steps.iter_mut().enumerate() {
            step.order = index;
        }
    }
}
