// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Guide data model: projects, steps and annotations.

pub mod annotation;
pub mod project;
