//! Mirrors of the entities served by the classification backend, plus the
//! derived lookups and field-level comparators the dashboard widgets use
//! for change suppression.

use serde::Deserialize;
use std::collections::BTreeMap;

/// Neutral badge color used when a record's type is not in the types map.
pub const FALLBACK_COLOR: &str = "#6B7280";

/// A classification category. Reference data, fetched and never mutated.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WasteType {
    pub id: u64,
    pub label: String,
    pub display_name: String,
    pub color: String,
}

/// One detection event produced by the recognition system.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WasteRecord {
    pub id: u64,
    #[serde(default)]
    pub type_id: u64,
    #[serde(rename = "type")]
    pub type_label: String,
    pub confidence: u8,
    pub timestamp: String,
    #[serde(default)]
    pub image: String,
}

/// Client-held query parameters for the history endpoint. Never persisted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordFilter {
    pub waste_types: Vec<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl RecordFilter {
    /// Query pairs for the fields actually present. Absent fields are
    /// omitted entirely, never sent as empty strings.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if !self.waste_types.is_empty() {
            pairs.push(("waste_types", self.waste_types.join(",")));
        }
        if let Some(start) = &self.start_date {
            pairs.push(("start_date", start.clone()));
        }
        if let Some(end) = &self.end_date {
            pairs.push(("end_date", end.clone()));
        }
        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        pairs
    }
}

/// Envelope returned by the paginated records endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Paginated<T> {
    pub results: Vec<T>,
    pub count: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub current_page: u32,
}

/// `totalItems` plus one `<label>Count` entry per waste type.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StatsReport {
    #[serde(flatten)]
    pub counts: BTreeMap<String, u64>,
}

impl StatsReport {
    pub fn total_items(&self) -> u64 {
        self.counts.get("totalItems").copied().unwrap_or(0)
    }

    pub fn count_for(&self, label: &str) -> u64 {
        self.counts.get(&format!("{label}Count")).copied().unwrap_or(0)
    }
}

/// One slice of the distribution pie: item count and share per type.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DistributionSlice {
    pub name: String,
    pub value: u64,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub percentage: u32,
}

/// Average classification confidence per type.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ConfidencePoint {
    pub name: String,
    pub confidence: u8,
    #[serde(default)]
    pub color: String,
}

/// One day of the trend series: per-label counts plus `total`, keyed by a
/// preformatted date label ("Apr 03").
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TrendPoint {
    pub date: String,
    #[serde(flatten)]
    pub counts: BTreeMap<String, u64>,
}

impl TrendPoint {
    pub fn total(&self) -> u64 {
        self.counts.get("total").copied().unwrap_or(0)
    }

    pub fn count_for(&self, label: &str) -> u64 {
        self.counts.get(label).copied().unwrap_or(0)
    }
}

/// Types folded by label, so a record's display name and color can be
/// resolved without a second round trip.
#[derive(Debug, Clone, Default)]
pub struct WasteTypeMap {
    by_label: BTreeMap<String, WasteType>,
}

impl WasteTypeMap {
    pub fn from_types(types: &[WasteType]) -> Self {
        let by_label = types
            .iter()
            .fold(BTreeMap::new(), |mut map, waste_type| {
                map.insert(waste_type.label.clone(), waste_type.clone());
                map
            });
        Self { by_label }
    }

    pub fn get(&self, label: &str) -> Option<&WasteType> {
        self.by_label.get(label)
    }

    pub fn len(&self) -> usize {
        self.by_label.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_label.is_empty()
    }

    /// Display name for a label, falling back to a derived capitalization
    /// when the label is unknown to the types map.
    pub fn display_name(&self, label: &str) -> String {
        match self.by_label.get(label) {
            Some(waste_type) => waste_type.display_name.clone(),
            None => fallback_display_name(label),
        }
    }

    pub fn color(&self, label: &str) -> &str {
        self.by_label
            .get(label)
            .map_or(FALLBACK_COLOR, |waste_type| waste_type.color.as_str())
    }
}

/// Derived display name for a label with no matching waste type: the label
/// with its first character uppercased ("unknown" -> "Unknown").
pub fn fallback_display_name(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Builds the distribution locally from types plus the stats report, for
/// the stat cards row. Percentages are rounded like the backend rounds.
pub fn derive_distribution(types: &[WasteType], stats: &StatsReport) -> Vec<DistributionSlice> {
    let total = stats.total_items();
    types
        .iter()
        .map(|waste_type| {
            let count = stats.count_for(&waste_type.label);
            let percentage = if total > 0 {
                ((count as f64 / total as f64) * 100.0).round() as u32
            } else {
                0
            };
            DistributionSlice {
                name: waste_type.display_name.clone(),
                value: count,
                color: waste_type.color.clone(),
                percentage,
            }
        })
        .collect()
}

/// Resolves a record image against the media base URL. Absolute URLs pass
/// through untouched.
pub fn resolve_image_url(media_base: &str, image: &str) -> String {
    if image.is_empty() || image.starts_with("http://") || image.starts_with("https://") {
        image.to_string()
    } else {
        format!(
            "{}/{}",
            media_base.trim_end_matches('/'),
            image.trim_start_matches('/')
        )
    }
}

/// Renders an ISO-8601 timestamp for display; unparseable input is shown
/// as received rather than dropped.
pub fn format_timestamp(timestamp: &str) -> String {
    match chrono::DateTime::parse_from_rfc3339(timestamp) {
        Ok(parsed) => parsed.format("%Y-%m-%d %H:%M:%S").to_string(),
        Err(_) => timestamp.to_string(),
    }
}

// Field-level comparators used by the pollers. Each compares only the
// fields that matter for the widget in question, so cosmetic differences
// (image URLs regenerating, colors) cannot cause a redraw.

pub fn same_stats(a: &StatsReport, b: &StatsReport) -> bool {
    a.counts == b.counts
}

pub fn same_distribution(a: &[DistributionSlice], b: &[DistributionSlice]) -> bool {
    a.len() == b.len()
        && a.iter()
            .zip(b)
            .all(|(new, old)| new.name == old.name && new.value == old.value)
}

pub fn same_confidence(a: &[ConfidencePoint], b: &[ConfidencePoint]) -> bool {
    a.len() == b.len()
        && a.iter()
            .zip(b)
            .all(|(new, old)| new.name == old.name && new.confidence == old.confidence)
}

pub fn same_records(a: &[WasteRecord], b: &[WasteRecord]) -> bool {
    a.len() == b.len()
        && a.iter().zip(b).all(|(new, old)| {
            new.id == old.id
                && new.confidence == old.confidence
                && new.type_label == old.type_label
                && new.timestamp == old.timestamp
        })
}

/// Trend rows compare every count column (including `total`) but not the
/// date labels, which shift daily without representing new data.
pub fn same_trend(a: &[TrendPoint], b: &[TrendPoint]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(new, old)| new.counts == old.counts)
}
