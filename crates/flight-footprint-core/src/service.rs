// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

//! Submit, list, clear and export, wired to the pluggable collaborators.

use crate::catalog::{AirportCatalog, CatalogStatus};
use crate::emissions::EmissionsCalculator;
use crate::export::{self, ExportSink};
use crate::history::{build_entry, result_detail, result_headline, FlightSubmission, HistoryEntry};
use crate::source::DatasetSource;
use crate::store::HistoryStore;
use crate::suggest::Suggestion;
use crate::telemetry::TelemetrySink;
use crate::FootprintError;
use chrono::{DateTime, Utc};
use log::info;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

/// What a successful submission shows the user.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionOutcome {
    pub entry: HistoryEntry,
    /// e.g. `636.4 kg CO₂e`
    pub headline: String,
    /// e.g. `5785 km · Long-haul · Economy`
    pub detail: String,
}

pub struct FootprintService {
    catalog: AirportCatalog,
    calculator: EmissionsCalculator,
    store: Box<dyn HistoryStore>,
    telemetry: Box<dyn TelemetrySink>,
    telemetry_secret: String,
}

impl FootprintService {
    pub fn new(
        calculator: EmissionsCalculator,
        store: Box<dyn HistoryStore>,
        telemetry: Box<dyn TelemetrySink>,
        telemetry_secret: &str,
    ) -> Self {
        Self {
            catalog: AirportCatalog::new(),
            calculator,
            store,
            telemetry,
            telemetry_secret: telemetry_secret.to_string(),
        }
    }

    pub fn load_airports(&self, source: &dyn DatasetSource) -> Result<usize, FootprintError> {
        self.catalog.load(source)
    }

    pub fn status(&self) -> CatalogStatus {
        self.catalog.status()
    }

    pub fn suggest(&self, query: &str) -> Vec<Suggestion> {
        self.catalog.suggest(query)
    }

    /// Validates and calculates a submission, records it at the top of the
    /// history and reports it to telemetry.
    ///
    /// Nothing is stored unless the calculation succeeds.
    pub fn submit(
        &self,
        submission: &FlightSubmission,
        now: DateTime<Utc>,
    ) -> Result<SubmissionOutcome, FootprintError> {
        let index = self.catalog.snapshot()?;
        let route = submission.validate()?;

        let result = self.calculator.calculate(
            &index,
            &route.origin,
            &route.destination,
            submission.passengers,
            submission.trip_type,
            submission.cabin_class,
        )?;

        let entry = build_entry(submission, &route, &result, &index, now);

        let mut history = self.store.load_all();
        history.insert(0, entry.clone());
        self.store.save_all(&history)?;

        info!(
            "Recorded flight — route={} kg={} entries={}",
            entry.route_iata,
            entry.emissions_kg,
            history.len()
        );

        self.telemetry
            .send(&entry.telemetry_payload(&self.telemetry_secret));

        Ok(SubmissionOutcome {
            headline: result_headline(&result),
            detail: result_detail(&result, submission.cabin_class),
            entry,
        })
    }

    /// Newest first.
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.store.load_all()
    }

    pub fn clear_history(&self) -> Result<(), FootprintError> {
        self.store.clear()?;
        info!("History cleared");
        Ok(())
    }

    /// Gives background telemetry deliveries up to `limit` to finish.
    pub fn flush_telemetry(&self, limit: Duration) -> usize {
        self.telemetry.flush(limit)
    }

    /// Renders the history as CSV and hands it to `sink` under a timestamped name.
    pub fn export(&self, sink: &dyn ExportSink, now: SystemTime) -> Result<PathBuf, FootprintError> {
        let contents = export::render_csv(&self.store.load_all())?;
        sink.emit(&export::export_file_name(now), &contents)
    }
}
