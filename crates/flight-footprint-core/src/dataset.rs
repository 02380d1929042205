// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

//! Parser for the airport reference dataset.
//!
//! The dataset is a comma separated table with a header row. Column names vary
//! between exports (`iata` vs `code`, `lat` vs `latitude`, ...), so the header
//! is resolved against a small synonym table instead of fixed positions.

use crate::index::AirportRecord;
use crate::FootprintError;
use log::{debug, warn};
use std::collections::HashSet;

const CODE_HEADERS: &[&str] = &["iata", "iata_code", "code", "airport_code", "iata_id"];
const LAT_HEADERS: &[&str] = &["lat", "latitude", "latitude_deg"];
const LON_HEADERS: &[&str] = &["lon", "lng", "long", "longitude", "longitude_deg"];
const NAME_HEADERS: &[&str] = &["name", "airport", "airport_name"];
const CITY_HEADERS: &[&str] = &["city", "municipality", "town"];
const COUNTRY_HEADERS: &[&str] = &["country", "country_name", "iso_country", "country_code"];

/// Output of a successful parse, with counters for what was filtered out.
#[derive(Debug, Clone, Default)]
pub struct ParsedDataset {
    pub records: Vec<AirportRecord>,
    /// Rows dropped for a code that is not three letters or digits, or
    /// unusable coordinates.
    pub skipped: usize,
    /// Rows dropped because an earlier row already used the same code.
    pub duplicates: usize,
}

pub struct DatasetParser;

impl DatasetParser {
    /// Parses raw dataset text into airport records.
    ///
    /// Invalid rows are skipped. The first occurrence of a code wins.
    pub fn parse(text: &str) -> Result<ParsedDataset, FootprintError> {
        if text.trim_start_matches('\u{feff}').trim().is_empty() {
            return Err(FootprintError::EmptyDataset);
        }

        let mut rows = read_rows(text).into_iter();
        let header = rows.next().ok_or(FootprintError::EmptyDataset)?;
        let columns = ColumnMap::resolve(&header)?;

        let mut parsed = ParsedDataset::default();
        let mut seen = HashSet::new();

        // Line numbers are 1-based and count the header.
        for (line, row) in rows.enumerate().map(|(i, r)| (i + 2, r)) {
            match columns.record_from(&row) {
                Some(record) => {
                    if seen.insert(record.code.clone()) {
                        parsed.records.push(record);
                    } else {
                        debug!("Dropping duplicate airport code — code={} line={}", record.code, line);
                        parsed.duplicates += 1;
                    }
                }
                None => {
                    debug!("Skipping invalid dataset row — line={}", line);
                    parsed.skipped += 1;
                }
            }
        }

        if parsed.records.is_empty() {
            return Err(FootprintError::EmptyDataset);
        }

        Ok(parsed)
    }
}

/// Splits dataset text into rows of fields.
///
/// Handles quoted fields, doubled quotes, CRLF line endings and a leading BOM.
/// A trailing row without a final newline is still returned.
pub fn read_rows(text: &str) -> Vec<Vec<String>> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(false)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for result in rdr.records() {
        match result {
            Ok(record) => rows.push(record.iter().map(|f| f.to_string()).collect()),
            Err(e) => warn!("Unreadable dataset row — error={}", e),
        }
    }
    rows
}

fn normalize_header(raw: &str) -> String {
    raw.trim()
        .trim_start_matches('\u{feff}')
        .to_lowercase()
        .split(|c: char| c.is_whitespace() || c == '-' || c == '.')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

fn find_column(header: &[String], synonyms: &[&str]) -> Option<usize> {
    synonyms
        .iter()
        .find_map(|name| header.iter().position(|h| h == name))
}

fn parse_coordinate(raw: &str) -> Option<f64> {
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[derive(Debug)]
struct ColumnMap {
    code: usize,
    lat: usize,
    lon: usize,
    name: Option<usize>,
    city: Option<usize>,
    country: Option<usize>,
}

impl ColumnMap {
    fn resolve(raw_header: &[String]) -> Result<Self, FootprintError> {
        let header: Vec<String> = raw_header.iter().map(|h| normalize_header(h)).collect();

        let required = (
            find_column(&header, CODE_HEADERS),
            find_column(&header, LAT_HEADERS),
            find_column(&header, LON_HEADERS),
        );

        match required {
            (Some(code), Some(lat), Some(lon)) => Ok(Self {
                code,
                lat,
                lon,
                name: find_column(&header, NAME_HEADERS),
                city: find_column(&header, CITY_HEADERS),
                country: find_column(&header, COUNTRY_HEADERS),
            }),
            _ => Err(FootprintError::Schema { found: header }),
        }
    }

    fn record_from(&self, row: &[String]) -> Option<AirportRecord> {
        let field = |i: usize| row.get(i).map(|s| s.trim()).unwrap_or("");
        let optional = |idx: Option<usize>| idx.map(|i| field(i).to_string()).unwrap_or_default();

        let code = field(self.code).to_uppercase();
        if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphanumeric()) {
            return None;
        }

        let latitude = parse_coordinate(field(self.lat))?;
        let longitude = parse_coordinate(field(self.lon))?;

        Some(AirportRecord {
            code,
            latitude,
            longitude,
            name: optional(self.name),
            city: optional(self.city),
            country: optional(self.country),
        })
    }
}
