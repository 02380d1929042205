// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::FootprintError;
use flate2::read::GzDecoder;
use log::{debug, info, warn};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const FETCH_TIMEOUT_SECS: u64 = 30;

/// Where the airport reference dataset comes from.
pub trait DatasetSource {
    /// Human readable location, used in logs and status messages.
    fn describe(&self) -> String;

    /// Returns the raw dataset text.
    fn fetch_text(&self) -> Result<String, FootprintError>;
}

/// Picks a source from a configured location: `http(s)://` URLs are fetched,
/// anything else is treated as a local path.
pub fn source_for(location: &str) -> Box<dyn DatasetSource> {
    let trimmed = location.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        Box::new(HttpSource::new(trimmed))
    } else {
        Box::new(FileSource::new(trimmed))
    }
}

/// Local CSV file, optionally gzip compressed (`.gz` extension).
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl DatasetSource for FileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn fetch_text(&self) -> Result<String, FootprintError> {
        let io_err = |e: std::io::Error| FootprintError::Io(format!("{}: {}", self.path.display(), e));

        let mut file = File::open(&self.path).map_err(io_err)?;
        let mut bytes = Vec::new();

        if self.path.extension().is_some_and(|ext| ext == "gz") {
            debug!("Reading gzip compressed airport dataset — path={}", self.path.display());
            GzDecoder::new(file).read_to_end(&mut bytes).map_err(io_err)?;
        } else {
            file.read_to_end(&mut bytes).map_err(io_err)?;
        }

        Ok(decode_lossy(bytes, &self.describe()))
    }
}

/// Decodes dataset bytes as UTF-8, replacing invalid sequences with U+FFFD.
fn decode_lossy(bytes: Vec<u8>, origin: &str) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            warn!(
                "Airport dataset is not valid UTF-8, replacing bad bytes — source={} offset={}",
                origin,
                e.utf8_error().valid_up_to()
            );
            String::from_utf8_lossy(e.as_bytes()).into_owned()
        }
    }
}

/// Remote CSV resource fetched over HTTP.
#[derive(Debug, Clone)]
pub struct HttpSource {
    url: String,
    timeout: Duration,
}

impl HttpSource {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            timeout: Duration::from_secs(FETCH_TIMEOUT_SECS),
        }
    }

    /// Appends a `v=<millis>` query parameter so intermediate caches never
    /// serve a stale copy.
    pub fn cache_busted_url(&self, now: SystemTime) -> String {
        let millis = now
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        let sep = if self.url.contains('?') { '&' } else { '?' };
        format!("{}{}v={}", self.url, sep, millis)
    }
}

impl DatasetSource for HttpSource {
    fn describe(&self) -> String {
        self.url.clone()
    }

    fn fetch_text(&self) -> Result<String, FootprintError> {
        let url = self.cache_busted_url(SystemTime::now());
        info!("Fetching airport dataset — url={}", url);

        let fetch = || -> Result<String, reqwest::Error> {
            let client = reqwest::blocking::Client::builder()
                .timeout(self.timeout)
                .build()?;
            client.get(&url).send()?.error_for_status()?.text()
        };

        let text = fetch().map_err(|e| FootprintError::Io(format!("{}: {}", self.url, e)))?;
        debug!("Downloaded airport dataset — bytes={}", text.len());
        Ok(text)
    }
}

/// Dataset held in memory; useful for embedding and tests.
#[derive(Debug, Clone)]
pub struct InlineSource {
    text: String,
}

impl InlineSource {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl DatasetSource for InlineSource {
    fn describe(&self) -> String {
        "<inline>".to_string()
    }

    fn fetch_text(&self) -> Result<String, FootprintError> {
        Ok(self.text.clone())
    }
}
