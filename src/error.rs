// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Error types shared by the store, media and export modules.

use crate::models::{
    annotation::AnnotationId,
    project::{ProjectId, StepId},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GuideError {
    #[error("No project is open")]
    NoCurrentProject,

    #[error("Unknown project {0:?}")]
    UnknownProject(ProjectId),

    #[error("Unknown step {0:?}")]
    UnknownStep(StepId),

    #[error("Unknown annotation {0:?}")]
    UnknownAnnotation(AnnotationId),

    #[error("Step order must be a permutation of the current steps: {0}")]
    InvalidOrder(String),

    #[error("Failed to decode image: {0}")]
    ImageDecode(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Export failed: {0}")]
    Export(String),
}

pub type Result<T> = std::result::Result<T, GuideError>;
