// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

//! Submitted flights and the history entries built from them.
//!
//! A [`HistoryEntry`] is the one record every output is derived from: the
//! on-screen summary, the persisted history, the CSV export row and the
//! telemetry payload.

use crate::emissions::{CabinClass, CalculationResult, HaulClass, TripType};
use crate::index::AirportIndex;
use crate::suggest::extract_code;
use crate::telemetry::TelemetryPayload;
use crate::FootprintError;
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

const SGT_OFFSET_SECS: i32 = 8 * 3600;

/// One filled-in flight form, before any validation.
#[derive(Debug, Clone, PartialEq)]
pub struct FlightSubmission {
    pub employee_name: String,
    pub flight_date: NaiveDate,
    /// Free text as typed or picked from suggestions, e.g. `"SIN – Changi"`.
    pub origin: String,
    pub destination: String,
    pub passengers: u32,
    pub trip_type: TripType,
    pub cabin_class: CabinClass,
}

/// Airport codes extracted from a validated submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRoute {
    pub origin: String,
    pub destination: String,
}

impl FlightSubmission {
    /// Checks the form and extracts the two airport codes.
    ///
    /// Does not check that the codes exist; the calculator reports unknown
    /// airports.
    pub fn validate(&self) -> Result<ResolvedRoute, FootprintError> {
        if self.employee_name.trim().is_empty() {
            return Err(FootprintError::Validation(
                "Employee name is required".to_string(),
            ));
        }

        let origin = extract_code(&self.origin).ok_or_else(|| {
            FootprintError::Validation(format!(
                "Origin needs a 3-letter airport code: {:?}",
                self.origin.trim()
            ))
        })?;
        let destination = extract_code(&self.destination).ok_or_else(|| {
            FootprintError::Validation(format!(
                "Destination needs a 3-letter airport code: {:?}",
                self.destination.trim()
            ))
        })?;

        if origin == destination {
            return Err(FootprintError::Validation(format!(
                "Origin and destination must be different airports ({})",
                origin
            )));
        }

        if self.passengers == 0 {
            return Err(FootprintError::Validation(
                "Passengers must be at least 1".to_string(),
            ));
        }

        Ok(ResolvedRoute {
            origin,
            destination,
        })
    }
}

/// Persisted record of one calculation. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub employee_name: String,
    pub submitted_sgt: String,
    #[serde(rename = "flightDateISO")]
    pub flight_date: NaiveDate,
    pub from: String,
    pub to: String,
    pub passengers: u32,
    pub trip_type: TripType,
    pub cabin_class: CabinClass,
    pub great_circle_km: f64,
    pub uplifted_one_way_km: f64,
    pub haul: HaulClass,
    pub base_factor: f64,
    pub cabin_multiplier: f64,
    #[serde(default)]
    pub adjusted_factor: f64,
    pub trip_multiplier: f64,
    pub emissions_kg: f64,
    #[serde(default)]
    pub route_name: String,
    #[serde(default)]
    pub route_iata: String,
    #[serde(default)]
    pub trip_label: String,
    #[serde(default)]
    pub cabin_label: String,
    #[serde(default)]
    pub haul_label: String,
}

/// Assembles a history entry. Pure: the clock is passed in.
pub fn build_entry(
    submission: &FlightSubmission,
    route: &ResolvedRoute,
    result: &CalculationResult,
    index: &AirportIndex,
    submitted_at: DateTime<Utc>,
) -> HistoryEntry {
    let place = |code: &str| {
        index
            .lookup(code)
            .map(|a| a.place_name().to_string())
            .unwrap_or_else(|| code.to_string())
    };

    HistoryEntry {
        employee_name: submission.employee_name.trim().to_string(),
        submitted_sgt: format_sgt(submitted_at),
        flight_date: submission.flight_date,
        from: route.origin.clone(),
        to: route.destination.clone(),
        passengers: submission.passengers,
        trip_type: submission.trip_type,
        cabin_class: submission.cabin_class,
        great_circle_km: round_to(result.great_circle_km, 2),
        uplifted_one_way_km: round_to(result.uplifted_one_way_km, 2),
        haul: result.haul,
        base_factor: round_to(result.base_factor, 2),
        cabin_multiplier: round_to(result.cabin_multiplier, 2),
        adjusted_factor: round_to(result.adjusted_factor, 3),
        trip_multiplier: result.trip_multiplier,
        emissions_kg: round_to(result.total_emissions_kg, 3),
        route_name: format!("{} – {}", place(&route.origin), place(&route.destination)),
        route_iata: format!("{} – {}", route.origin, route.destination),
        trip_label: multiplier_label(submission.trip_type.display_name(), result.trip_multiplier),
        cabin_label: multiplier_label(
            submission.cabin_class.display_name(),
            round_to(result.cabin_multiplier, 2),
        ),
        haul_label: haul_label(result.haul, result.base_factor),
    }
}

impl HistoryEntry {
    /// Fills labels missing from entries saved before labels were stored.
    /// Without an index the route name falls back to the codes.
    pub fn with_derived_labels(mut self) -> Self {
        if self.route_iata.is_empty() {
            self.route_iata = format!("{} – {}", self.from, self.to);
        }
        if self.route_name.is_empty() {
            self.route_name = self.route_iata.clone();
        }
        if self.trip_label.is_empty() {
            self.trip_label = multiplier_label(self.trip_type.display_name(), self.trip_multiplier);
        }
        if self.cabin_label.is_empty() {
            self.cabin_label =
                multiplier_label(self.cabin_class.display_name(), self.cabin_multiplier);
        }
        if self.haul_label.is_empty() {
            self.haul_label = haul_label(self.haul, self.base_factor);
        }
        if self.adjusted_factor == 0.0 {
            self.adjusted_factor = round_to(self.base_factor * self.cabin_multiplier, 3);
        }
        self
    }

    pub fn flight_date_label(&self) -> String {
        self.flight_date.format("%d-%m-%Y").to_string()
    }

    /// Fields in export column order.
    pub fn csv_row(&self) -> Vec<String> {
        vec![
            self.employee_name.clone(),
            self.submitted_sgt.clone(),
            self.flight_date_label(),
            self.route_name.clone(),
            self.route_iata.clone(),
            self.trip_label.clone(),
            self.cabin_label.clone(),
            self.passengers.to_string(),
            self.great_circle_km.to_string(),
            self.uplifted_one_way_km.to_string(),
            self.haul_label.clone(),
            self.emissions_kg.to_string(),
        ]
    }

    pub fn telemetry_payload(&self, secret: &str) -> TelemetryPayload {
        TelemetryPayload {
            secret: secret.to_string(),
            employee: self.employee_name.clone(),
            submitted_sgt: self.submitted_sgt.clone(),
            flight_date: self.flight_date_label(),
            from_to_name: self.route_name.clone(),
            from_to_iata: self.route_iata.clone(),
            trip_type_label: self.trip_label.clone(),
            cabin_class_label: self.cabin_label.clone(),
            passengers: self.passengers,
            great_circle_km: self.great_circle_km,
            uplifted_distance_km: self.uplifted_one_way_km,
            haul_base_factor: self.haul_label.clone(),
            total_emissions_kg: self.emissions_kg,
        }
    }

    /// `employee | submitted | FROM → TO | Cabin · Trip · N pax | kg`
    pub fn summary_line(&self) -> String {
        format!(
            "{} | {} | {} → {} | {} · {} · {} pax | {}",
            self.employee_name,
            self.submitted_sgt,
            self.from,
            self.to,
            self.cabin_class.display_name(),
            self.trip_type.display_name(),
            self.passengers,
            format_fixed(self.emissions_kg, 1)
        )
    }
}

/// `636.4 kg CO₂e`, from the unrounded total.
pub fn result_headline(result: &CalculationResult) -> String {
    format!("{} kg CO₂e", format_fixed(result.total_emissions_kg, 1))
}

/// `5785 km · Long-haul · Economy`, from the unrounded uplifted distance.
pub fn result_detail(result: &CalculationResult, cabin: CabinClass) -> String {
    format!(
        "{} km · {} · {}",
        format_fixed(result.uplifted_one_way_km, 0),
        result.haul,
        cabin.display_name()
    )
}

/// Fixed-point text with ties rounded away from zero; `{:.N}` alone
/// rounds exact ties to even.
pub fn format_fixed(value: f64, places: usize) -> String {
    format!("{:.*}", places, round_to(value, places as i32))
}

/// `dd-mm-yyyy HH:MM SGT` in Singapore time (UTC+08:00, no DST).
pub fn format_sgt(at: DateTime<Utc>) -> String {
    let sgt = FixedOffset::east_opt(SGT_OFFSET_SECS).expect("UTC+8 is a valid offset");
    at.with_timezone(&sgt).format("%d-%m-%Y %H:%M SGT").to_string()
}

pub fn round_to(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale).round() / scale
}

fn multiplier_label(name: &str, multiplier: f64) -> String {
    format!("{} (×{})", name, multiplier)
}

fn haul_label(haul: HaulClass, base_factor: f64) -> String {
    format!("{} ({:.2})", haul, base_factor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emissions::EmissionsCalculator;
    use crate::index::AirportRecord;
    use chrono::TimeZone;

    fn index() -> AirportIndex {
        AirportIndex::from_records(vec![
            AirportRecord {
                code: "SIN".into(),
                latitude: 1.3644,
                longitude: 103.9915,
                name: "Singapore Changi Airport".into(),
                city: "Singapore".into(),
                country: "Singapore".into(),
            },
            AirportRecord {
                code: "NRT".into(),
                latitude: 35.7647,
                longitude: 140.3864,
                name: "Narita International Airport".into(),
                city: "Tokyo".into(),
                country: "Japan".into(),
            },
        ])
    }

    fn submission() -> FlightSubmission {
        FlightSubmission {
            employee_name: "  Ada Lovelace ".into(),
            flight_date: NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
            origin: "SIN – Singapore Changi Airport, Singapore".into(),
            destination: "nrt".into(),
            passengers: 1,
            trip_type: TripType::OneWay,
            cabin_class: CabinClass::Economy,
        }
    }

    fn build(sub: &FlightSubmission) -> HistoryEntry {
        let index = index();
        let route = sub.validate().unwrap();
        let result = EmissionsCalculator::default()
            .calculate(
                &index,
                &route.origin,
                &route.destination,
                sub.passengers,
                sub.trip_type,
                sub.cabin_class,
            )
            .unwrap();
        let at = Utc.with_ymd_and_hms(2025, 12, 30, 14, 30, 0).unwrap();
        build_entry(sub, &route, &result, &index, at)
    }

    #[test]
    fn test_validate_extracts_codes() {
        let route = submission().validate().unwrap();
        assert_eq!(route.origin, "SIN");
        assert_eq!(route.destination, "NRT");
    }

    #[test]
    fn test_validate_rejections() {
        let mut s = submission();
        s.employee_name = "   ".into();
        assert!(matches!(s.validate(), Err(FootprintError::Validation(_))));

        let mut s = submission();
        s.origin = "??".into();
        assert!(matches!(s.validate(), Err(FootprintError::Validation(_))));

        let mut s = submission();
        s.destination = "sin".into();
        match s.validate() {
            Err(FootprintError::Validation(msg)) => assert!(msg.contains("different"), "{}", msg),
            other => panic!("expected validation error, got {:?}", other),
        }

        let mut s = submission();
        s.passengers = 0;
        assert!(matches!(s.validate(), Err(FootprintError::Validation(_))));
    }

    #[test]
    fn test_build_entry_sin_nrt() {
        let entry = build(&submission());
        assert_eq!(entry.employee_name, "Ada Lovelace");
        assert_eq!(entry.submitted_sgt, "30-12-2025 22:30 SGT");
        assert_eq!(entry.flight_date_label(), "15-01-2026");
        assert_eq!(entry.route_iata, "SIN – NRT");
        assert_eq!(entry.route_name, "Singapore – Tokyo");
        assert_eq!(entry.great_circle_km, 5356.59);
        assert_eq!(entry.uplifted_one_way_km, 5785.11);
        assert_eq!(entry.haul, HaulClass::LongHaul);
        assert_eq!(entry.base_factor, 0.11);
        assert_eq!(entry.adjusted_factor, 0.11);
        assert_eq!(entry.emissions_kg, 636.363);
        assert_eq!(entry.trip_label, "One Way (×1)");
        assert_eq!(entry.cabin_label, "Economy (×1)");
        assert_eq!(entry.haul_label, "Long-haul (0.11)");
    }

    #[test]
    fn test_headline_and_detail_use_raw_values() {
        let index = index();
        let sub = submission();
        let route = sub.validate().unwrap();
        let mut result = EmissionsCalculator::default()
            .calculate(
                &index,
                &route.origin,
                &route.destination,
                1,
                sub.trip_type,
                sub.cabin_class,
            )
            .unwrap();
        assert_eq!(result_headline(&result), "636.4 kg CO₂e");
        assert_eq!(result_detail(&result, sub.cabin_class), "5785 km · Long-haul · Economy");

        // Stored rounding (636.25, 5785.5) must not leak into the display.
        result.total_emissions_kg = 636.2504;
        result.uplifted_one_way_km = 5785.4996;
        assert_eq!(result_headline(&result), "636.3 kg CO₂e");
        assert_eq!(
            result_detail(&result, CabinClass::First),
            "5785 km · Long-haul · First Class"
        );
    }

    #[test]
    fn test_format_fixed_rounds_ties_up() {
        assert_eq!(format_fixed(636.25, 1), "636.3");
        assert_eq!(format_fixed(0.5, 0), "1");
        assert_eq!(format_fixed(2.5, 0), "3");
        assert_eq!(format_fixed(636.363, 1), "636.4");
        assert_eq!(format_fixed(12.0, 1), "12.0");

        let mut entry = build(&submission());
        entry.emissions_kg = 636.25;
        assert!(entry.summary_line().ends_with("| 636.3"), "{}", entry.summary_line());
    }

    #[test]
    fn test_labels_for_round_trip_business() {
        let mut s = submission();
        s.trip_type = TripType::RoundTrip;
        s.cabin_class = CabinClass::Business;
        s.passengers = 2;
        let entry = build(&s);
        assert_eq!(entry.trip_label, "Round Trip (×2)");
        assert_eq!(entry.cabin_label, "Business Class (×1.5)");
        assert_eq!(entry.adjusted_factor, 0.165);
        assert_eq!(entry.emissions_kg, 3818.175);
        assert_eq!(
            entry.summary_line(),
            "Ada Lovelace | 30-12-2025 22:30 SGT | SIN → NRT | Business Class · Round Trip · 2 pax | 3818.2"
        );
    }

    #[test]
    fn test_csv_row_and_payload_agree() {
        let entry = build(&submission());
        let row = entry.csv_row();
        assert_eq!(row.len(), 12);
        assert_eq!(row[2], "15-01-2026");
        assert_eq!(row[3], "Singapore – Tokyo");
        assert_eq!(row[8], "5356.59");
        assert_eq!(row[11], "636.363");

        let payload = entry.telemetry_payload("s3cret");
        assert_eq!(payload.secret, "s3cret");
        assert_eq!(payload.from_to_iata, row[4]);
        assert_eq!(payload.trip_type_label, row[5]);
        assert_eq!(payload.haul_base_factor, row[10]);
        assert_eq!(payload.total_emissions_kg, 636.363);
    }

    #[test]
    fn test_serde_keys_and_legacy_entry() {
        let entry = build(&submission());
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["flightDateISO"], "2026-01-15");
        assert_eq!(value["cabinClass"], "economy");
        assert_eq!(value["tripType"], "one-way");
        assert_eq!(value["haul"], "Long-haul");

        let legacy = r#"{
            "employeeName": "Grace",
            "submittedSgt": "01-02-2025 09:05 SGT",
            "flightDateISO": "2025-02-03",
            "from": "SIN",
            "to": "NRT",
            "passengers": 1,
            "tripType": "round-trip",
            "cabinClass": "premium",
            "greatCircleKm": 5356.59,
            "upliftedOneWayKm": 5785.11,
            "haul": "Long-haul",
            "baseFactor": 0.11,
            "cabinMultiplier": 1.2,
            "tripMultiplier": 2,
            "emissionsKg": 1527.269
        }"#;
        let old: HistoryEntry = serde_json::from_str::<HistoryEntry>(legacy)
            .unwrap()
            .with_derived_labels();
        assert_eq!(old.cabin_class, CabinClass::PremiumEconomy);
        assert_eq!(old.route_iata, "SIN – NRT");
        assert_eq!(old.route_name, "SIN – NRT");
        assert_eq!(old.trip_label, "Round Trip (×2)");
        assert_eq!(old.cabin_label, "Premium Economy (×1.2)");
        assert_eq!(old.haul_label, "Long-haul (0.11)");
        assert_eq!(old.adjusted_factor, 0.132);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(5356.587121, 2), 5356.59);
        assert_eq!(round_to(636.36254999, 3), 636.363);
        assert_eq!(round_to(0.165, 3), 0.165);
    }
}
