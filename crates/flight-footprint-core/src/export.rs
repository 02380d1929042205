// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::history::HistoryEntry;
use crate::FootprintError;
use log::info;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

pub const CSV_HEADERS: [&str; 12] = [
    "Employee",
    "Submitted (SGT)",
    "Flight Date (dd-mm-yyyy)",
    "From – To",
    "From – To (IATA)",
    "Trip Type (× Multiplier)",
    "Cabin Class (× Multiplier)",
    "Passengers",
    "Great-circle Distance (km)",
    "Uplifted Distance (km) (×1.08)",
    "Haul & Base Factor (kg CO₂e / passenger-km)",
    "Total Emissions (kg CO₂e)",
];

const BOM: &str = "\u{feff}";

/// Renders the history as CSV text, BOM first, newest entry first.
pub fn render_csv(entries: &[HistoryEntry]) -> Result<String, FootprintError> {
    if entries.is_empty() {
        return Err(FootprintError::NothingToExport);
    }

    let mut wtr = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Necessary)
        .from_writer(Vec::new());

    let write_err = |e: csv::Error| FootprintError::Io(format!("CSV encoding failed: {}", e));
    wtr.write_record(CSV_HEADERS).map_err(write_err)?;
    for entry in entries {
        wtr.write_record(entry.csv_row()).map_err(write_err)?;
    }

    let bytes = wtr
        .into_inner()
        .map_err(|e| FootprintError::Io(format!("CSV encoding failed: {}", e)))?;
    let body = String::from_utf8(bytes)
        .map_err(|e| FootprintError::Io(format!("CSV encoding failed: {}", e)))?;

    Ok(format!("{}{}", BOM, body))
}

/// `flight-footprint-<millis>.csv`
pub fn export_file_name(now: SystemTime) -> String {
    let millis = now
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    format!("flight-footprint-{}.csv", millis)
}

/// Destination for rendered export files.
pub trait ExportSink {
    /// Stores `contents` under `file_name`, returning where it went.
    fn emit(&self, file_name: &str, contents: &str) -> Result<PathBuf, FootprintError>;
}

/// Writes export files into a directory, creating it if needed.
#[derive(Debug, Clone)]
pub struct DirectoryExportSink {
    dir: PathBuf,
}

impl DirectoryExportSink {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }
}

impl ExportSink for DirectoryExportSink {
    fn emit(&self, file_name: &str, contents: &str) -> Result<PathBuf, FootprintError> {
        fs::create_dir_all(&self.dir)
            .map_err(|e| FootprintError::Io(format!("{}: {}", self.dir.display(), e)))?;

        let path = self.dir.join(file_name);
        fs::write(&path, contents)
            .map_err(|e| FootprintError::Io(format!("{}: {}", path.display(), e)))?;

        info!("Exported history — path={} bytes={}", path.display(), contents.len());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emissions::{CabinClass, HaulClass, TripType};
    use chrono::NaiveDate;
    use std::time::Duration;

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
    fn test_empty_history_is_error() {
        assert!(matches!(render_csv(&[]), Err(FootprintError::NothingToExport)));
    }

    #[test]
    fn test_render_csv_layout() {
        let csv = render_csv(&[entry("Ada")]).unwrap();
        assert!(csv.starts_with('\u{feff}'));

        let mut lines = csv.trim_start_matches('\u{feff}').lines();
        assert_eq!(lines.next().unwrap(), CSV_HEADERS.join(","));
        assert_eq!(
            lines.next().unwrap(),
            "Ada,30-12-2025 22:30 SGT,15-01-2026,Singapore – Tokyo,SIN – NRT,One Way (×1),Economy (×1),1,5356.59,5785.11,Long-haul (0.11),636.363"
        );
        assert!(lines.next().is_none());
    }

    #[test]
    fn test_render_csv_quotes_when_needed() {
        let csv = render_csv(&[entry("Smith, \"Jo\"")]).unwrap();
        assert!(csv.contains("\n\"Smith, \"\"Jo\"\"\",30-12-2025"), "{}", csv);
    }

    #[test]
    fn test_export_file_name() {
        let at = UNIX_EPOCH + Duration::from_millis(1_767_105_000_000);
        assert_eq!(export_file_name(at), "flight-footprint-1767105000000.csv");
    }

    #[test]
    fn test_directory_sink_creates_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let sink = DirectoryExportSink::new(tmp.path().join("exports"));
        let path = sink.emit("out.csv", "a,b\n").unwrap();
        assert_eq!(path, tmp.path().join("exports").join("out.csv"));
        assert_eq!(fs::read_to_string(path).unwrap(), "a,b\n");
    }
}
