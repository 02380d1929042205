// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

//! Holder for the live airport index.
//!
//! The index is built off to the side and swapped in whole, so readers only
//! ever see a complete index or none at all.

use crate::dataset::DatasetParser;
use crate::index::{AirportIndex, AirportRecord};
use crate::source::DatasetSource;
use crate::suggest::{self, Suggestion};
use crate::FootprintError;
use log::{error, info};
use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Clone, PartialEq)]
pub enum CatalogStatus {
    NotLoaded,
    Loading,
    Ready { airports: usize },
    Failed(String),
}

impl fmt::Display for CatalogStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogStatus::NotLoaded => write!(f, "Airport database not loaded"),
            CatalogStatus::Loading => write!(f, "Loading airport database…"),
            CatalogStatus::Ready { airports } => write!(f, "Loaded {} airports", airports),
            CatalogStatus::Failed(reason) => write!(f, "Failed to load airport database: {}", reason),
        }
    }
}

struct CatalogState {
    index: Option<Arc<AirportIndex>>,
    status: CatalogStatus,
}

pub struct AirportCatalog {
    state: RwLock<CatalogState>,
}

impl Default for AirportCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl AirportCatalog {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(CatalogState {
                index: None,
                status: CatalogStatus::NotLoaded,
            }),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, CatalogState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, CatalogState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Fetches and parses a dataset, then swaps the new index in.
    ///
    /// On failure the catalog is left empty and not ready. Returns the number
    /// of airports loaded.
    pub fn load(&self, source: &dyn DatasetSource) -> Result<usize, FootprintError> {
        self.write().status = CatalogStatus::Loading;
        info!("Loading airport database — source={}", source.describe());

        let result = source.fetch_text().and_then(|text| self.build(&text));
        self.finish(result)
    }

    /// Same as [`load`](Self::load) for text that is already in memory.
    pub fn load_from_text(&self, text: &str) -> Result<usize, FootprintError> {
        self.write().status = CatalogStatus::Loading;
        let result = self.build(text);
        self.finish(result)
    }

    fn build(&self, text: &str) -> Result<AirportIndex, FootprintError> {
        let parsed = DatasetParser::parse(text)?;
        info!(
            "Parsed airport dataset — records={} skipped={} duplicates={}",
            parsed.records.len(),
            parsed.skipped,
            parsed.duplicates
        );
        Ok(AirportIndex::from_records(parsed.records))
    }

    fn finish(&self, result: Result<AirportIndex, FootprintError>) -> Result<usize, FootprintError> {
        let mut state = self.write();
        match result {
            Ok(index) => {
                let airports = index.len();
                state.index = Some(Arc::new(index));
                state.status = CatalogStatus::Ready { airports };
                info!("Airport database ready — airports={}", airports);
                Ok(airports)
            }
            Err(e) => {
                error!("Airport database failed to load — error={}", e);
                state.index = None;
                state.status = CatalogStatus::Failed(e.to_string());
                Err(e)
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        self.read().index.is_some()
    }

    pub fn status(&self) -> CatalogStatus {
        self.read().status.clone()
    }

    /// Shared handle to the current index; stays valid across reloads.
    pub fn snapshot(&self) -> Result<Arc<AirportIndex>, FootprintError> {
        self.read().index.clone().ok_or(FootprintError::NotReady)
    }

    /// Exact code lookup. `None` when the code is unknown or nothing is loaded.
    pub fn lookup(&self, code: &str) -> Option<AirportRecord> {
        self.read()
            .index
            .as_ref()
            .and_then(|index| index.lookup(code).cloned())
    }

    /// Ranked suggestions; empty until the catalog is ready.
    pub fn suggest(&self, query: &str) -> Vec<Suggestion> {
        match self.snapshot() {
            Ok(index) => suggest::suggest(&index, query),
            Err(_) => Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.read().index.as_ref().map_or(0, |index| index.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
