// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Shared helpers: coordinate geometry and colors.

pub mod color;
pub mod geometry;
