// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::index::AirportIndex;
use regex::Regex;
use std::sync::OnceLock;

/// Upper bound on returned suggestions, also used as the scan cap.
pub const MAX_SUGGESTIONS: usize = 12;

#[derive(Debug, Clone, PartialEq)]
pub struct Suggestion {
    pub code: String,
    /// True when the code itself starts with the query.
    pub prefix_match: bool,
    /// Picker text, e.g. `SIN – Singapore Changi Airport, Singapore`.
    pub label: String,
}

/// Returns up to [`MAX_SUGGESTIONS`] airports matching free text.
///
/// Matches are collected in corpus (code) order until the cap is hit, then
/// code-prefix matches are ranked ahead of substring-only matches.
pub fn suggest(index: &AirportIndex, query: &str) -> Vec<Suggestion> {
    let q = query.trim().to_uppercase();
    if q.is_empty() {
        return Vec::new();
    }

    let mut hits: Vec<(&str, bool)> = index
        .search_corpus()
        .iter()
        .filter_map(|entry| {
            let prefix = entry.code.starts_with(&q);
            (prefix || entry.searchable_text.contains(&q)).then_some((entry.code.as_str(), prefix))
        })
        .take(MAX_SUGGESTIONS)
        .collect();

    hits.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    hits.truncate(MAX_SUGGESTIONS);

    hits.into_iter()
        .map(|(code, prefix_match)| Suggestion {
            code: code.to_string(),
            prefix_match,
            label: label_for(index, code),
        })
        .collect()
}

fn label_for(index: &AirportIndex, code: &str) -> String {
    let Some(record) = index.lookup(code) else {
        return code.to_string();
    };
    let details: Vec<&str> = [&record.name, &record.city, &record.country]
        .into_iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();
    if details.is_empty() {
        code.to_string()
    } else {
        format!("{} – {}", code, details.join(", "))
    }
}

/// Pulls an airport code out of decorated input such as `"SIN - Singapore Changi"`.
///
/// Returns the first run of exactly three ASCII letters/digits that is bounded by
/// non-alphanumeric characters or the ends of the string, uppercased.
pub fn extract_code(text: &str) -> Option<String> {
    static CODE_RE: OnceLock<Regex> = OnceLock::new();
    let re = CODE_RE.get_or_init(|| {
        Regex::new(r"(?:^|[^A-Za-z0-9])([A-Za-z0-9]{3})(?:[^A-Za-z0-9]|$)")
            .expect("airport code pattern is valid")
    });

    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_uppercase())
}
