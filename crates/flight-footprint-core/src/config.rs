// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::emissions::EmissionsConfig;
use crate::store::HISTORY_FILE_NAME;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "config.json";
pub const DEFAULT_DATASET: &str = "airports_iata_latlon.csv";
pub const DEFAULT_TELEMETRY_SECRET: &str = "flight-carbon-emission-tracker";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Webhook URL. No endpoint means telemetry is only logged.
    pub endpoint: Option<String>,
    pub secret: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            secret: DEFAULT_TELEMETRY_SECRET.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Path or `http(s)://` URL of the airport dataset.
    pub dataset: String,
    pub history_path: PathBuf,
    pub export_dir: PathBuf,
    pub telemetry: TelemetryConfig,
    /// Replaces the built-in emission coefficients when present.
    pub emissions: Option<EmissionsConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let root = crate::get_config_root();
        Self {
            dataset: DEFAULT_DATASET.to_string(),
            history_path: root.join(HISTORY_FILE_NAME),
            export_dir: root.join("exports"),
            telemetry: TelemetryConfig::default(),
            emissions: None,
        }
    }
}

impl AppConfig {
    pub fn default_path() -> PathBuf {
        crate::get_config_root().join(CONFIG_FILE_NAME)
    }

    /// Reads the config file; a missing file gives the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).context("Failed to create config directory")?;
            }
        }

        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
    }

    pub fn emissions_config(&self) -> EmissionsConfig {
        self.emissions.clone().unwrap_or_default()
    }
}
