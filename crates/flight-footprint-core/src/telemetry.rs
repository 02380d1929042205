// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

//! Best-effort reporting of submissions to an external spreadsheet webhook.
//!
//! A [`TelemetrySink`] never returns an error and never blocks the caller.
//! Delivery problems are logged and otherwise dropped.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

const WEBHOOK_TIMEOUT_SECS: u64 = 10;

/// Row sent to the spreadsheet integration. Key names are fixed by the receiver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryPayload {
    pub secret: String,
    pub employee: String,
    pub submitted_sgt: String,
    pub flight_date: String,
    pub from_to_name: String,
    pub from_to_iata: String,
    pub trip_type_label: String,
    pub cabin_class_label: String,
    pub passengers: u32,
    pub great_circle_km: f64,
    pub uplifted_distance_km: f64,
    pub haul_base_factor: String,
    pub total_emissions_kg: f64,
}

pub trait TelemetrySink {
    /// Hands the payload off for delivery. Must not block and must not fail.
    fn send(&self, payload: &TelemetryPayload);

    /// Waits up to `limit` for in-flight deliveries, e.g. before process exit.
    /// Returns the number of deliveries still running.
    fn flush(&self, _limit: Duration) -> usize {
        0
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTelemetry;

impl TelemetrySink for NoopTelemetry {
    fn send(&self, _payload: &TelemetryPayload) {}
}

/// Writes the payload to the log instead of the network.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogTelemetry;

impl TelemetrySink for LogTelemetry {
    fn send(&self, payload: &TelemetryPayload) {
        match serde_json::to_string(payload) {
            Ok(body) => info!("Telemetry payload — {}", body),
            Err(e) => warn!("Telemetry payload could not be serialized — error={}", e),
        }
    }
}

/// Posts payloads to a webhook from a background thread.
///
/// Tries a JSON post first and falls back to a `text/plain` body, which some
/// script hosts accept when they reject the JSON content type.
pub struct WebhookTelemetry {
    url: String,
    timeout: Duration,
    pending: Mutex<Vec<JoinHandle<()>>>,
}

impl WebhookTelemetry {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            timeout: Duration::from_secs(WEBHOOK_TIMEOUT_SECS),
            pending: Mutex::new(Vec::new()),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn deliver(url: &str, timeout: Duration, body: String) {
        let client = match reqwest::blocking::Client::builder().timeout(timeout).build() {
            Ok(c) => c,
            Err(e) => {
                warn!("Telemetry client could not be built — error={}", e);
                return;
            }
        };

        let primary = client
            .post(url)
            .header("Content-Type", "application/json")
            .body(body.clone())
            .send()
            .and_then(|r| r.error_for_status());

        match primary {
            Ok(_) => debug!("Telemetry delivered — url={}", url),
            Err(e) => {
                debug!("Telemetry JSON post failed, retrying as text — error={}", e);
                let fallback = client
                    .post(url)
                    .header("Content-Type", "text/plain;charset=UTF-8")
                    .body(body)
                    .send()
                    .and_then(|r| r.error_for_status());
                if let Err(e) = fallback {
                    warn!("Telemetry logging failed — url={} error={}", url, e);
                }
            }
        }
    }
}

impl TelemetrySink for WebhookTelemetry {
    fn send(&self, payload: &TelemetryPayload) {
        let body = match serde_json::to_string(payload) {
            Ok(b) => b,
            Err(e) => {
                warn!("Telemetry payload could not be serialized — error={}", e);
                return;
            }
        };

        let url = self.url.clone();
        let timeout = self.timeout;
        let spawned = std::thread::Builder::new()
            .name("telemetry".to_string())
            .spawn(move || Self::deliver(&url, timeout, body));

        match spawned {
            Ok(handle) => match self.pending.lock() {
                Ok(mut pending) => {
                    pending.retain(|h| !h.is_finished());
                    pending.push(handle);
                }
                Err(poisoned) => poisoned.into_inner().push(handle),
            },
            Err(e) => warn!("Telemetry thread could not be started — error={}", e),
        }
    }

    fn flush(&self, limit: Duration) -> usize {
        let handles: Vec<JoinHandle<()>> = match self.pending.lock() {
            Ok(mut pending) => pending.drain(..).collect(),
            Err(poisoned) => poisoned.into_inner().drain(..).collect(),
        };

        let deadline = Instant::now() + limit;
        let mut unfinished = 0;
        for handle in handles {
            while !handle.is_finished() && Instant::now() < deadline {
                std::thread::sleep(Duration::from_millis(20));
            }
            if handle.is_finished() {
                let _ = handle.join();
            } else {
                unfinished += 1;
            }
        }
        if unfinished > 0 {
            warn!("Telemetry deliveries still pending at flush — count={}", unfinished);
        }
        unfinished
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> TelemetryPayload {
        TelemetryPayload {
            secret: "s3cret".to_string(),
            employee: "Ada".to_string(),
            submitted_sgt: "30-12-2025 22:30 SGT".to_string(),
            flight_date: "15-01-2026".to_string(),
            from_to_name: "Singapore – Tokyo".to_string(),
            from_to_iata: "SIN – NRT".to_string(),
            trip_type_label: "One Way (×1)".to_string(),
            cabin_class_label: "Economy (×1)".to_string(),
            passengers: 1,
            great_circle_km: 5356.59,
            uplifted_distance_km: 5785.11,
            haul_base_factor: "Long-haul (0.11)".to_string(),
            total_emissions_kg: 636.363,
        }
    }

    #[test]
    fn test_payload_keys() {
        let value = serde_json::to_value(payload()).unwrap();
        let obj = value.as_object().unwrap();
        for key in [
            "secret",
            "employee",
            "submittedSgt",
            "flightDate",
            "fromToName",
            "fromToIata",
            "tripTypeLabel",
            "cabinClassLabel",
            "passengers",
            "greatCircleKm",
            "upliftedDistanceKm",
            "haulBaseFactor",
            "totalEmissionsKg",
        ] {
            assert!(obj.contains_key(key), "missing key {}", key);
        }
        assert_eq!(obj.len(), 13);
        assert_eq!(obj["totalEmissionsKg"], 636.363);
    }

    #[test]
    fn test_unreachable_webhook_does_not_fail() {
        // Port 9 on localhost refuses connections; send must still return.
        let sink = WebhookTelemetry::new("http://127.0.0.1:9/hook")
            .with_timeout(Duration::from_millis(500));
        sink.send(&payload());
        assert_eq!(sink.flush(Duration::from_secs(5)), 0);
    }

    #[test]
    fn test_noop_and_log_sinks() {
        NoopTelemetry.send(&payload());
        LogTelemetry.send(&payload());
    }
}
