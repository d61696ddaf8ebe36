// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! I/O operations for screenshots, storage and data files.

pub mod media;
pub mod serialization;
pub mod storage;
