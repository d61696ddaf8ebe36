// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Step Guide Builder
//!
//! A desktop application for turning screenshots into annotated,
//! step-by-step guides and exporting them as PDF documents.

mod app;
mod config;
mod editor;
mod error;
mod export;
mod io;
mod models;
mod store;
mod ui;
mod util;

use anyhow::Result;
use app::GuideApp;
use config::AppConfig;
use io::storage::FileStorage;
use store::GuideStore;

fn main() -> Result<()> {
    // Initialize logging
    env_logger::init();

    let config = AppConfig::load()?;
    let storage_path = config.storage_path();
    log::info!("Using storage file {}", storage_path.display());

    // A broken storage file is left untouched; this session is not saved.
    let store = match FileStorage::new(&storage_path).and_then(|s| GuideStore::open(Box::new(s))) {
        Ok(store) => store,
        Err(e) => {
            log::error!(
                "Failed to open {}: {}. Changes in this session will not be saved.",
                storage_path.display(),
                e
            );
            GuideStore::in_memory()
        }
    };

    // Configure egui options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([900.0, 600.0])
            .with_title("Step Guide Builder"),
        ..Default::default()
    };

    // Run the application
    eframe::run_native(
        "Step Guide Builder",
        options,
        Box::new(move |_cc| Ok(Box::new(GuideApp::new(config, store)))),
    )
    .map_err(|e| anyhow::anyhow!("Application error: {}", e))?;

    Ok(())
}
