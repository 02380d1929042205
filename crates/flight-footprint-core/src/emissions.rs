// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

//! Per-flight CO₂e model.
//!
//! `total = great_circle * uplift * base_factor(haul) * cabin * passengers * trip`
//!
//! All coefficients come from [`EmissionsConfig`], so alternate tables can be
//! injected from the config file or from tests.

use crate::geo::distance_km;
use crate::index::AirportIndex;
use crate::FootprintError;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HaulClass {
    #[serde(rename = "Short-haul")]
    ShortHaul,
    #[serde(rename = "Long-haul")]
    LongHaul,
}

impl fmt::Display for HaulClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HaulClass::ShortHaul => write!(f, "Short-haul"),
            HaulClass::LongHaul => write!(f, "Long-haul"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TripType {
    #[default]
    OneWay,
    RoundTrip,
}

impl TripType {
    /// Lenient parse of a form selection. Anything that is not a round trip is one way.
    pub fn from_selection(value: &str) -> Self {
        match value.trim().to_lowercase().replace(['_', ' '], "-").as_str() {
            "round-trip" | "roundtrip" | "round" | "return" => TripType::RoundTrip,
            _ => TripType::OneWay,
        }
    }

    pub fn multiplier(self) -> f64 {
        match self {
            TripType::OneWay => 1.0,
            TripType::RoundTrip => 2.0,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            TripType::OneWay => "One Way",
            TripType::RoundTrip => "Round Trip",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CabinClass {
    #[default]
    Economy,
    PremiumEconomy,
    Business,
    First,
}

impl CabinClass {
    /// Lenient parse of a form selection. Unknown values fall back to economy.
    pub fn from_selection(value: &str) -> Self {
        match value.trim().to_lowercase().replace(['_', ' '], "-").as_str() {
            "premium" | "premium-economy" => CabinClass::PremiumEconomy,
            "business" | "business-class" => CabinClass::Business,
            "first" | "first-class" => CabinClass::First,
            _ => CabinClass::Economy,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            CabinClass::Economy => "Economy",
            CabinClass::PremiumEconomy => "Premium Economy",
            CabinClass::Business => "Business Class",
            CabinClass::First => "First Class",
        }
    }
}

// Stored selections go through `from_selection`; unknown strings never fail.
impl<'de> Deserialize<'de> for TripType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(TripType::from_selection(&raw))
    }
}

impl<'de> Deserialize<'de> for CabinClass {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(CabinClass::from_selection(&raw))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CabinMultipliers {
    pub economy: f64,
    pub premium_economy: f64,
    pub business: f64,
    pub first: f64,
}

impl Default for CabinMultipliers {
    fn default() -> Self {
        Self {
            economy: 1.0,
            premium_economy: 1.2,
            business: 1.5,
            first: 2.0,
        }
    }
}

impl CabinMultipliers {
    pub fn get(&self, cabin: CabinClass) -> f64 {
        match cabin {
            CabinClass::Economy => self.economy,
            CabinClass::PremiumEconomy => self.premium_economy,
            CabinClass::Business => self.business,
            CabinClass::First => self.first,
        }
    }
}

/// Coefficient table for the emissions model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmissionsConfig {
    /// Applied to great-circle distance for routing, taxi and climb inefficiency.
    pub uplift_factor: f64,
    /// Uplifted one-way distance at or above which a flight is long-haul.
    pub haul_threshold_km: f64,
    /// kg CO₂e per passenger-km.
    pub short_haul_factor: f64,
    pub long_haul_factor: f64,
    pub cabin_multipliers: CabinMultipliers,
}

impl Default for EmissionsConfig {
    fn default() -> Self {
        Self {
            uplift_factor: 1.08,
            haul_threshold_km: 3700.0,
            short_haul_factor: 0.15,
            long_haul_factor: 0.11,
            cabin_multipliers: CabinMultipliers::default(),
        }
    }
}

impl EmissionsConfig {
    pub fn classify_haul(&self, uplifted_km: f64) -> HaulClass {
        if uplifted_km < self.haul_threshold_km {
            HaulClass::ShortHaul
        } else {
            HaulClass::LongHaul
        }
    }

    pub fn base_factor(&self, haul: HaulClass) -> f64 {
        match haul {
            HaulClass::ShortHaul => self.short_haul_factor,
            HaulClass::LongHaul => self.long_haul_factor,
        }
    }

    /// Multiplier for a raw cabin selection string; unknown selections get economy.
    pub fn cabin_multiplier(&self, selection: &str) -> f64 {
        self.cabin_multipliers.get(CabinClass::from_selection(selection))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalculationResult {
    pub great_circle_km: f64,
    pub uplifted_one_way_km: f64,
    pub haul: HaulClass,
    pub base_factor: f64,
    pub cabin_multiplier: f64,
    pub adjusted_factor: f64,
    pub trip_multiplier: f64,
    pub total_emissions_kg: f64,
}

#[derive(Debug, Clone, Default)]
pub struct EmissionsCalculator {
    config: EmissionsConfig,
}

impl EmissionsCalculator {
    pub fn new(config: EmissionsConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EmissionsConfig {
        &self.config
    }

    /// Resolves both airports in `index` and estimates the flight's emissions.
    ///
    /// Fails with [`FootprintError::UnknownAirport`] if either code is missing.
    pub fn calculate(
        &self,
        index: &AirportIndex,
        origin: &str,
        destination: &str,
        passengers: u32,
        trip: TripType,
        cabin: CabinClass,
    ) -> Result<CalculationResult, FootprintError> {
        let a = index
            .lookup(origin)
            .ok_or_else(|| FootprintError::UnknownAirport(origin.trim().to_uppercase()))?;
        let b = index
            .lookup(destination)
            .ok_or_else(|| FootprintError::UnknownAirport(destination.trim().to_uppercase()))?;

        let great_circle_km = distance_km(a.latitude, a.longitude, b.latitude, b.longitude);
        Ok(self.estimate(great_circle_km, passengers, trip, cabin))
    }

    /// Applies the model to an already known great-circle distance.
    pub fn estimate(
        &self,
        great_circle_km: f64,
        passengers: u32,
        trip: TripType,
        cabin: CabinClass,
    ) -> CalculationResult {
        let uplifted_one_way_km = great_circle_km * self.config.uplift_factor;
        let haul = self.config.classify_haul(uplifted_one_way_km);
        let base_factor = self.config.base_factor(haul);
        let cabin_multiplier = self.config.cabin_multipliers.get(cabin);
        let adjusted_factor = base_factor * cabin_multiplier;
        let trip_multiplier = trip.multiplier();
        let total_emissions_kg =
            uplifted_one_way_km * adjusted_factor * passengers as f64 * trip_multiplier;

        CalculationResult {
            great_circle_km,
            uplifted_one_way_km,
            haul,
            base_factor,
            cabin_multiplier,
            adjusted_factor,
            trip_multiplier,
            total_emissions_kg,
        }
    }
}
