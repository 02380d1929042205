// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirportRecord {
    pub code: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub country: String,
}

impl AirportRecord {
    /// Most human-friendly single name for this airport: city, then country,
    /// then airport name, then the bare code.
    pub fn place_name(&self) -> &str {
        [&self.city, &self.country, &self.name]
            .into_iter()
            .map(|s| s.trim())
            .find(|s| !s.is_empty())
            .unwrap_or(self.code.as_str())
    }
}

/// One row of the denormalized search corpus.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchEntry {
    pub code: String,
    /// Uppercased `code name city country`.
    pub searchable_text: String,
}

impl SearchEntry {
    fn from_record(record: &AirportRecord) -> Self {
        let searchable_text = format!(
            "{} {} {} {}",
            record.code, record.name, record.city, record.country
        )
        .to_uppercase();
        Self {
            code: record.code.clone(),
            searchable_text,
        }
    }
}

/// Immutable airport lookup table built in one pass from parsed records.
#[derive(Debug, Default)]
pub struct AirportIndex {
    airports: HashMap<String, AirportRecord>,
    search: Vec<SearchEntry>,
}

impl AirportIndex {
    /// Builds the index. If `records` repeats a code, the first record is kept.
    pub fn from_records(records: Vec<AirportRecord>) -> Self {
        let mut airports = HashMap::with_capacity(records.len());
        for record in records {
            airports.entry(record.code.clone()).or_insert(record);
        }

        let mut search: Vec<SearchEntry> = airports.values().map(SearchEntry::from_record).collect();
        search.sort_by(|a, b| a.code.cmp(&b.code));

        Self { airports, search }
    }

    /// Exact code lookup, case-insensitive.
    pub fn lookup(&self, code: &str) -> Option<&AirportRecord> {
        self.airports.get(&code.trim().to_uppercase())
    }

    /// Search entries ordered by code.
    pub fn search_corpus(&self) -> &[SearchEntry] {
        &self.search
    }

    pub fn len(&self) -> usize {
        self.airports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.airports.is_empty()
    }
}
