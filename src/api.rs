//! Remote data gateway for the classification backend's REST API.
//!
//! One method per resource. Collection endpoints may answer with either a
//! bare JSON array or a `{"results": [...]}` envelope depending on the
//! backend's pagination settings; both normalize to the bare collection.
//! Only the records endpoint keeps its pagination envelope.

use crate::error::{Result, WastewatchError};
use crate::model::{
    resolve_image_url, ConfidencePoint, DistributionSlice, Paginated, RecordFilter, StatsReport,
    TrendPoint, WasteRecord, WasteType, WasteTypeMap,
};
use serde::de::DeserializeOwned;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::blocking::Client,
    base_url: String,
    media_base_url: String,
}

impl ApiClient {
    /// Builds a client with a hard request timeout so a hung request can
    /// never block a later poll tick.
    pub fn new(base_url: &str, media_base_url: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            media_base_url: media_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn waste_types(&self) -> Result<Vec<WasteType>> {
        self.get_collection("/api/waste-types/", &[])
    }

    /// Types folded by label for display-name/color lookups.
    pub fn types_map(&self) -> Result<WasteTypeMap> {
        Ok(WasteTypeMap::from_types(&self.waste_types()?))
    }

    /// Filtered, paginated history. Returns the full envelope so callers
    /// can drive page navigation.
    pub fn waste_records(&self, filter: &RecordFilter) -> Result<Paginated<WasteRecord>> {
        self.get_json("/api/waste-records/", &filter.query_pairs())
    }

    pub fn waste_stats(&self) -> Result<StatsReport> {
        self.get_json("/api/waste-stats/", &[])
    }

    pub fn waste_distribution(&self) -> Result<Vec<DistributionSlice>> {
        self.get_collection("/api/waste-distribution/", &[])
    }

    pub fn waste_confidence(&self) -> Result<Vec<ConfidencePoint>> {
        self.get_collection("/api/waste-confidence/", &[])
    }

    pub fn waste_over_time(&self) -> Result<Vec<TrendPoint>> {
        self.get_collection("/api/waste-over-time/", &[])
    }

    pub fn recent_detections(&self, limit: u32) -> Result<Vec<WasteRecord>> {
        self.get_collection("/api/recent-detections/", &[("limit", limit.to_string())])
    }

    /// Submits a detection as multipart form data, the way the on-device
    /// uploader reports classifications.
    pub fn create_record(
        &self,
        type_id: u64,
        confidence: u8,
        image: Option<&Path>,
    ) -> Result<WasteRecord> {
        let mut form = reqwest::blocking::multipart::Form::new()
            .text("type_id", type_id.to_string())
            .text("confidence", confidence.to_string());
        if let Some(path) = image {
            form = form.file("image", path).map_err(WastewatchError::Io)?;
        }

        let url = format!("{}/api/waste-records/", self.base_url);
        let response = self.http.post(&url).multipart(form).send()?;
        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            return Err(WastewatchError::Http {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body)
            .map_err(|e| WastewatchError::Malformed(format!("waste-records: {e}")))
    }

    /// Resolves a record's image against the configured media base URL.
    pub fn media_url(&self, image: &str) -> String {
        resolve_image_url(&self.media_base_url, image)
    }

    fn get_text(&self, path: &str, query: &[(&str, String)]) -> Result<String> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.http.get(&url);
        if !query.is_empty() {
            request = request.query(query);
        }

        let response = request.send()?;
        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            return Err(WastewatchError::Http {
                status: status.as_u16(),
                body,
            });
        }

        Ok(body)
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let body = self.get_text(path, query)?;
        serde_json::from_str(&body).map_err(|e| WastewatchError::Malformed(format!("{path}: {e}")))
    }

    fn get_collection<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>> {
        let body = self.get_text(path, query)?;
        let value: serde_json::Value = serde_json::from_str(&body)
            .map_err(|e| WastewatchError::Malformed(format!("{path}: {e}")))?;
        normalize_collection(path, value)
    }
}

/// Accepts either a bare array or a `results` envelope. Any other shape is
/// treated as an empty collection rather than an error, so one odd response
/// cannot wedge a widget.
fn normalize_collection<T: DeserializeOwned>(
    path: &str,
    value: serde_json::Value,
) -> Result<Vec<T>> {
    let items = match value {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Object(mut map) => match map.remove("results") {
            Some(serde_json::Value::Array(items)) => items,
            _ => {
                tracing::warn!("unexpected response shape from {path}");
                return Ok(Vec::new());
            }
        },
        _ => {
            tracing::warn!("unexpected response shape from {path}");
            return Ok(Vec::new());
        }
    };

    items
        .into_iter()
        .map(|item| {
            serde_json::from_value(item)
                .map_err(|e| WastewatchError::Malformed(format!("{path}: {e}")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_bare_array() {
        let value: serde_json::Value = serde_json::from_str(
            r##"[{"id":1,"label":"plastic","display_name":"Plastic","color":"#3B82F6"}]"##,
        )
        .unwrap();

        let types: Vec<WasteType> = normalize_collection("/api/waste-types/", value).unwrap();
        assert_eq!(types.len(), 1);
        assert_eq!(types[0].label, "plastic");
    }

    #[test]
    fn normalizes_results_envelope() {
        let value: serde_json::Value = serde_json::from_str(
            r##"{"count":1,"results":[{"id":1,"label":"paper","display_name":"Paper","color":"#EAB308"}]}"##,
        )
        .unwrap();

        let types: Vec<WasteType> = normalize_collection("/api/waste-types/", value).unwrap();
        assert_eq!(types.len(), 1);
        assert_eq!(types[0].display_name, "Paper");
    }

    #[test]
    fn unexpected_shape_yields_empty_collection() {
        let value = serde_json::json!({"detail": "throttled"});
        let types: Vec<WasteType> = normalize_collection("/api/waste-types/", value).unwrap();
        assert!(types.is_empty());

        let value = serde_json::json!(42);
        let types: Vec<WasteType> = normalize_collection("/api/waste-types/", value).unwrap();
        assert!(types.is_empty());
    }

    #[test]
    fn malformed_item_is_an_error() {
        let value = serde_json::json!([{"id": "not-a-number"}]);
        let result: Result<Vec<WasteType>> = normalize_collection("/api/waste-types/", value);
        assert!(matches!(result, Err(WastewatchError::Malformed(_))));
    }

    #[test]
    fn paginated_records_deserialize() {
        let page: Paginated<WasteRecord> = serde_json::from_str(
            r#"{
                "results": [{"id":7,"type_id":1,"type":"plastic","confidence":92,
                             "timestamp":"2025-04-03T12:00:00Z","image":"/media/7.jpg"}],
                "count": 41, "next": "http://host/api/waste-records/?page=2",
                "previous": null, "total_pages": 3, "current_page": 1
            }"#,
        )
        .unwrap();

        assert_eq!(page.count, 41);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.results[0].type_label, "plastic");
    }

    #[test]
    fn stats_report_flattens_counts() {
        let stats: StatsReport =
            serde_json::from_str(r#"{"totalItems": 10, "plasticCount": 7, "paperCount": 3}"#)
                .unwrap();
        assert_eq!(stats.total_items(), 10);
        assert_eq!(stats.count_for("plastic"), 7);
        assert_eq!(stats.count_for("glass"), 0);
    }
}
