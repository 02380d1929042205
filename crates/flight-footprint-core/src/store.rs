// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::history::HistoryEntry;
use crate::FootprintError;
use anyhow::{Context, Result};
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub const HISTORY_FILE_NAME: &str = "flight_history_v1.json";

/// Ordered history of submissions, newest first.
pub trait HistoryStore {
    /// All entries. Missing or unreadable data yields an empty history.
    fn load_all(&self) -> Vec<HistoryEntry>;

    /// Replaces the stored history with `entries`.
    fn save_all(&self, entries: &[HistoryEntry]) -> Result<(), FootprintError>;

    fn clear(&self) -> Result<(), FootprintError>;
}

fn storage_error(e: anyhow::Error) -> FootprintError {
    FootprintError::Storage(format!("{:#}", e))
}

#[derive(Debug, Default)]
struct StoredHistory {
    entries: Vec<HistoryEntry>,
    unreadable: usize,
}

/// History kept as a pretty-printed JSON array on disk.
#[derive(Debug, Clone)]
pub struct JsonHistoryStore {
    path: PathBuf,
}

impl Default for JsonHistoryStore {
    fn default() -> Self {
        Self::new(crate::get_config_root().join(HISTORY_FILE_NAME))
    }
}

impl JsonHistoryStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the file entry by entry; entries that do not deserialize are
    /// counted and skipped instead of failing the whole history.
    fn read(&self) -> Result<StoredHistory> {
        let mut stored = StoredHistory::default();
        if !self.path.exists() {
            return Ok(stored);
        }

        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        if content.trim().is_empty() {
            return Ok(stored);
        }

        let values: Vec<serde_json::Value> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", self.path.display()))?;
        for (position, value) in values.into_iter().enumerate() {
            match serde_json::from_value::<HistoryEntry>(value) {
                Ok(entry) => stored.entries.push(entry.with_derived_labels()),
                Err(e) => {
                    warn!("Skipping unreadable history entry — position={} error={}", position, e);
                    stored.unreadable += 1;
                }
            }
        }
        Ok(stored)
    }

    fn write(&self, entries: &[HistoryEntry]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).context("Failed to create history directory")?;
            }
        }

        let content =
            serde_json::to_string_pretty(entries).context("Failed to serialize history")?;
        fs::write(&self.path, content)
            .with_context(|| format!("Failed to write {}", self.path.display()))
    }
}

impl HistoryStore for JsonHistoryStore {
    fn load_all(&self) -> Vec<HistoryEntry> {
        match self.read() {
            Ok(stored) => {
                debug!(
                    "Loaded history — path={} entries={} unreadable={}",
                    self.path.display(),
                    stored.entries.len(),
                    stored.unreadable
                );
                stored.entries
            }
            Err(e) => {
                warn!("History unreadable, starting empty — error={:#}", e);
                Vec::new()
            }
        }
    }

    /// Refuses to overwrite a file holding anything it could not read, so a
    /// damaged history is only ever removed by [`clear`](HistoryStore::clear).
    fn save_all(&self, entries: &[HistoryEntry]) -> Result<(), FootprintError> {
        match self.read() {
            Ok(stored) if stored.unreadable == 0 => {}
            Ok(stored) => {
                return Err(FootprintError::Storage(format!(
                    "{} has {} unreadable entries; fix the file or clear the history before saving",
                    self.path.display(),
                    stored.unreadable
                )))
            }
            Err(e) => {
                return Err(FootprintError::Storage(format!(
                    "{:#}; fix the file or clear the history before saving",
                    e
                )))
            }
        }
        self.write(entries).map_err(storage_error)
    }

    fn clear(&self) -> Result<(), FootprintError> {
        if !self.path.exists() {
            return Ok(());
        }
        fs::remove_file(&self.path)
            .with_context(|| format!("Failed to remove {}", self.path.display()))
            .map_err(storage_error)
    }
}

/// Volatile store, mainly for tests and one-shot CLI runs.
#[derive(Debug, Default)]
pub struct MemoryHistoryStore {
    entries: Mutex<Vec<HistoryEntry>>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HistoryStore for MemoryHistoryStore {
    fn load_all(&self) -> Vec<HistoryEntry> {
        self.entries
            .lock()
            .map(|e| e.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    fn save_all(&self, entries: &[HistoryEntry]) -> Result<(), FootprintError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|_| FootprintError::Storage("history lock poisoned".to_string()))?;
        *guard = entries.to_vec();
        Ok(())
    }

    fn clear(&self) -> Result<(), FootprintError> {
        self.save_all(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emissions::{CabinClass, HaulClass, TripType};
    use chrono::NaiveDate;

    fn entry(name: &str) -> HistoryEntry {
        HistoryEntry {
            employee_name: name.to_string(),
            submitted_sgt: "30-12-2025 22:30 SGT".to_string(),
            flight_date: NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
            from: "SIN".to_string(),
            to: "NRT".to_string(),
            passengers: 1,
            trip_type: TripType::OneWay,
            cabin_class: CabinClass::Economy,
            great_circle_km: 5356.59,
            uplifted_one_way_km: 5785.11,
            haul: HaulClass::LongHaul,
            base_factor: 0.11,
            cabin_multiplier: 1.0,
            adjusted_factor: 0.11,
            trip_multiplier: 1.0,
            emissions_kg: 636.363,
            route_name: "Singapore – Tokyo".to_string(),
            route_iata: "SIN – NRT".to_string(),
            trip_label: "One Way (×1)".to_string(),
            cabin_label: "Economy (×1)".to_string(),
            haul_label: "Long-haul (0.11)".to_string(),
        }
    }

    #[test]
    fn test_json_store_roundtrip() {
        let tmp = tempfile::tempdir().unwrap();
        let store = JsonHistoryStore::new(tmp.path().join("nested").join(HISTORY_FILE_NAME));

        assert!(store.load_all().is_empty());
        store.save_all(&[entry("B"), entry("A")]).unwrap();

        let loaded = store.load_all();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].employee_name, "B");
        assert_eq!(loaded[1], entry("A"));
    }

    #[test]
    fn test_json_store_corrupt_file_is_kept() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(HISTORY_FILE_NAME);
        fs::write(&path, "{not json").unwrap();

        let store = JsonHistoryStore::new(&path);
        assert!(store.load_all().is_empty());

        assert!(matches!(
            store.save_all(&[entry("A")]),
            Err(FootprintError::Storage(_))
        ));
        assert_eq!(fs::read_to_string(&path).unwrap(), "{not json");

        store.clear().unwrap();
        store.save_all(&[entry("A")]).unwrap();
        assert_eq!(store.load_all().len(), 1);
    }

    #[test]
    fn test_json_store_skips_only_bad_entries() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(HISTORY_FILE_NAME);

        let mut odd_cabin = serde_json::to_value(entry("Odd")).unwrap();
        odd_cabin["cabinClass"] = "Premium Economy".into();
        let mut broken = serde_json::to_value(entry("Broken")).unwrap();
        broken.as_object_mut().unwrap().remove("emissionsKg");
        let raw = serde_json::to_string_pretty(&vec![
            serde_json::to_value(entry("Good")).unwrap(),
            odd_cabin,
            broken,
        ])
        .unwrap();
        fs::write(&path, &raw).unwrap();

        let store = JsonHistoryStore::new(&path);
        let loaded = store.load_all();
        let names: Vec<&str> = loaded.iter().map(|e| e.employee_name.as_str()).collect();
        assert_eq!(names, vec!["Good", "Odd"]);
        assert_eq!(loaded[1].cabin_class, CabinClass::PremiumEconomy);

        assert!(matches!(
            store.save_all(&loaded),
            Err(FootprintError::Storage(_))
        ));
        assert_eq!(fs::read_to_string(&path).unwrap(), raw);
    }

    #[test]
    fn test_json_store_clear() {
        let tmp = tempfile::tempdir().unwrap();
        let store = JsonHistoryStore::new(tmp.path().join(HISTORY_FILE_NAME));
        store.clear().unwrap();

        store.save_all(&[entry("A")]).unwrap();
        store.clear().unwrap();
        assert!(store.load_all().is_empty());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryHistoryStore::new();
        store.save_all(&[entry("A")]).unwrap();
        assert_eq!(store.load_all().len(), 1);
        store.clear().unwrap();
        assert!(store.load_all().is_empty());
    }
}
