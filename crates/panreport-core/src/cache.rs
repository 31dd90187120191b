// ── Report cache ──
//
// Session-scoped store of the last payload fetched per report type, plus the
// filtered views derived from them. Every write bumps a global generation;
// a filtered view remembers the generation of the payload it was computed
// from and is treated as absent once that payload is replaced.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use panreport_api::ReportPayload;
use serde_json::Value;
use tracing::debug;

use crate::error::CoreError;

/// Suffix appended to a report type to name its filtered view.
pub const FILTERED_SUFFIX: &str = "_filtered";

#[derive(Debug, Clone)]
struct CachedReport {
    payload: Arc<ReportPayload>,
    generation: u64,
    fetched_at: DateTime<Utc>,
}

/// Subset of a cached report produced by a filter.
#[derive(Debug, Clone)]
pub struct FilteredView {
    pub report_type: String,
    pub items: Arc<Vec<Value>>,
    pub filters: BTreeMap<String, String>,
    /// Generation of the parent payload the view was computed from.
    pub parent_generation: u64,
}

impl FilteredView {
    /// Name under which the view is exported, e.g. `securityRules_filtered`.
    pub fn name(&self) -> String {
        filtered_name(&self.report_type)
    }

    pub fn payload(&self) -> ReportPayload {
        ReportPayload::Structured(Value::Array(self.items.as_ref().clone()))
    }
}

pub fn filtered_name(report_type: &str) -> String {
    format!("{report_type}{FILTERED_SUFFIX}")
}

#[derive(Debug, Default)]
pub struct ReportCache {
    reports: DashMap<String, CachedReport>,
    views: DashMap<String, FilteredView>,
    generation: AtomicU64,
}

impl ReportCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a payload, replacing any previous one and its filtered view.
    /// Returns the generation stamped on the entry.
    pub fn put(&self, report_type: &str, payload: impl Into<Arc<ReportPayload>>) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        self.reports.insert(
            report_type.to_owned(),
            CachedReport {
                payload: payload.into(),
                generation,
                fetched_at: Utc::now(),
            },
        );
        if self.views.remove(report_type).is_some() {
            debug!(report_type, "dropped filtered view of refreshed report");
        }
        generation
    }

    pub fn get(&self, report_type: &str) -> Result<Arc<ReportPayload>, CoreError> {
        self.get_with_generation(report_type).map(|(payload, _)| payload)
    }

    pub fn get_with_generation(
        &self,
        report_type: &str,
    ) -> Result<(Arc<ReportPayload>, u64), CoreError> {
        self.reports
            .get(report_type)
            .map(|entry| (Arc::clone(&entry.payload), entry.generation))
            .ok_or_else(|| CoreError::no_data(report_type))
    }

    pub fn fetched_at(&self, report_type: &str) -> Option<DateTime<Utc>> {
        self.reports.get(report_type).map(|entry| entry.fetched_at)
    }

    pub fn contains(&self, report_type: &str) -> bool {
        self.reports.contains_key(report_type)
    }

    /// Cached report types, sorted.
    pub fn report_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.reports.iter().map(|e| e.key().clone()).collect();
        types.sort();
        types
    }

    /// All base payloads, sorted by report type.
    pub fn snapshot(&self) -> Vec<(String, Arc<ReportPayload>)> {
        let mut entries: Vec<_> = self
            .reports
            .iter()
            .map(|e| (e.key().clone(), Arc::clone(&e.payload)))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    pub fn clear(&self) {
        self.reports.clear();
        self.views.clear();
    }

    // ── Filtered views ───────────────────────────────────────────────

    /// Store a view if its parent is still the current payload.
    ///
    /// Returns `false` when the parent was replaced (or evicted) after the
    /// view was computed.
    pub fn store_view(&self, view: FilteredView) -> bool {
        // Hold the parent entry so a concurrent `put` can't slip in between
        // the generation check and the insert.
        let Some(parent) = self.reports.get(&view.report_type) else {
            return false;
        };
        if parent.generation != view.parent_generation {
            return false;
        }
        self.views.insert(view.report_type.clone(), view);
        true
    }

    /// Current filtered view of `report_type`.
    pub fn view(&self, report_type: &str) -> Result<FilteredView, CoreError> {
        let view = self.views.get(report_type).map(|v| v.clone());
        let current = self.reports.get(report_type).map(|e| e.generation);

        match (view, current) {
            (Some(view), Some(generation)) if view.parent_generation == generation => Ok(view),
            (Some(_), _) => {
                self.views.remove(report_type);
                Err(CoreError::no_data(filtered_name(report_type)))
            }
            (None, _) => Err(CoreError::no_data(filtered_name(report_type))),
        }
    }
}
