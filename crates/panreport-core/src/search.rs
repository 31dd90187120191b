// ── Search and filter ──
//
// Linear scans over cached payloads. Search looks for a substring in every
// top-level field of every cached report; filter keeps the items of one
// report whose fields contain all the given values. Both compare
// case-insensitively.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::cache::{FilteredView, ReportCache};
use crate::error::CoreError;

/// Matches found in one report.
#[derive(Debug, Clone, Serialize)]
pub struct ReportMatches {
    pub matches: Vec<Value>,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    /// Only reports with at least one match appear here.
    pub results: BTreeMap<String, ReportMatches>,
    pub term: String,
    pub reports_searched: usize,
    pub reports_with_matches: usize,
    pub found: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct FilterResult {
    pub result: Vec<Value>,
    pub count: usize,
    pub total: usize,
    pub filtered: bool,
}

/// Plain text of a field value for matching.
///
/// Unlike export rendering this keeps the raw form: `true`, not `Yes`.
pub fn match_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn contains_ci(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

/// Search every cached report for `term`.
pub fn search(cache: &ReportCache, term: &str) -> Result<SearchResult, CoreError> {
    if term.is_empty() {
        return Err(CoreError::validation("search term cannot be empty"));
    }
    let needle = term.to_lowercase();

    let snapshot = cache.snapshot();
    let mut results = BTreeMap::new();
    for (report_type, payload) in &snapshot {
        let matches: Vec<Value> = payload
            .items()
            .into_iter()
            .filter(|item| item_matches_term(item, &needle))
            .collect();
        if !matches.is_empty() {
            results.insert(
                report_type.clone(),
                ReportMatches {
                    count: matches.len(),
                    matches,
                },
            );
        }
    }

    debug!(
        term,
        searched = snapshot.len(),
        matched = results.len(),
        "search complete"
    );
    Ok(SearchResult {
        reports_searched: snapshot.len(),
        reports_with_matches: results.len(),
        found: !results.is_empty(),
        term: term.to_owned(),
        results,
    })
}

fn item_matches_term(item: &Value, needle: &str) -> bool {
    match item {
        Value::Object(map) => map.values().any(|v| contains_ci(&match_text(v), needle)),
        other => contains_ci(&match_text(other), needle),
    }
}

/// Filter one cached report and remember the subset as its filtered view.
pub fn filter(
    cache: &ReportCache,
    report_type: &str,
    filters: &BTreeMap<String, String>,
) -> Result<FilterResult, CoreError> {
    let (payload, generation) = cache.get_with_generation(report_type)?;

    let active: Vec<(&String, &String, String)> = filters
        .iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(field, value)| (field, value, value.to_lowercase()))
        .collect();

    let items = match payload.as_ref() {
        panreport_api::ReportPayload::Structured(Value::Array(items)) => items.clone(),
        _ => match payload.as_record() {
            Some(record) => vec![Value::Object(record)],
            None => {
                return Err(CoreError::UnsupportedShape {
                    operation: "filter".into(),
                    shape: payload.shape(),
                });
            }
        },
    };
    let total = items.len();

    if active.is_empty() {
        return Ok(FilterResult {
            count: total,
            total,
            result: items,
            filtered: false,
        });
    }

    let matched: Vec<Value> = items
        .into_iter()
        .filter(|item| {
            let Value::Object(map) = item else {
                return false;
            };
            active.iter().all(|(field, _, needle)| {
                map.get(field.as_str())
                    .is_some_and(|v| contains_ci(&match_text(v), needle))
            })
        })
        .collect();

    let view = FilteredView {
        report_type: report_type.to_owned(),
        items: Arc::new(matched.clone()),
        filters: active
            .iter()
            .map(|(field, value, _)| ((*field).clone(), (*value).clone()))
            .collect(),
        parent_generation: generation,
    };
    if !cache.store_view(view) {
        debug!(report_type, "report refreshed during filter, view not stored");
    }

    debug!(report_type, total, matched = matched.len(), "filter applied");
    Ok(FilterResult {
        count: matched.len(),
        total,
        result: matched,
        filtered: true,
    })
}
