// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! UI components for the guide builder.

pub mod canvas;
pub mod export_panel;
pub mod header;
pub mod project_list;
pub mod properties;
pub mod step_list;
pub mod toolbar;
