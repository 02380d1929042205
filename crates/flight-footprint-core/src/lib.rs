// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

pub mod catalog;
pub mod config;
pub mod dataset;
pub mod emissions;
pub mod export;
pub mod geo;
pub mod history;
pub mod index;
pub mod service;
pub mod source;
pub mod store;
pub mod suggest;
pub mod telemetry;

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FootprintError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Airport dataset is missing required columns (code, latitude, longitude); found header: [{}]", found.join(", "))]
    Schema { found: Vec<String> },
    #[error("Airport dataset contains no valid rows")]
    EmptyDataset,
    #[error("Unknown airport code: {0}")]
    UnknownAirport(String),
    #[error("{0}")]
    Validation(String),
    #[error("Airport database is not loaded yet")]
    NotReady,
    #[error("No entries to export")]
    NothingToExport,
    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<std::io::Error> for FootprintError {
    fn from(e: std::io::Error) -> Self {
        FootprintError::Io(e.to_string())
    }
}

impl FootprintError {
    /// True for errors the user can fix by changing the submitted form.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            FootprintError::UnknownAirport(_) | FootprintError::Validation(_)
        )
    }
}

/// Per-user configuration directory shared by the config file, history and exports.
pub fn get_config_root() -> PathBuf {
    directories::ProjectDirs::from("org", "flight-footprint", "Flight-Footprint")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".flight-footprint"))
}
