//! Validation for user-supplied settings before they reach the gateway or
//! the dashboard loop.

use crate::error::{Result, WastewatchError};

/// Minimum allowed refresh interval in milliseconds.
pub const MIN_REFRESH_INTERVAL: u64 = 1_000;

/// Maximum allowed refresh interval in milliseconds.
pub const MAX_REFRESH_INTERVAL: u64 = 60_000;

/// Maximum history page size accepted by the backend.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Maximum recent-detections feed length.
pub const MAX_RECENT_LIMIT: u32 = 50;

/// Minimum request timeout in seconds. Zero would fail every request.
pub const MIN_REQUEST_TIMEOUT: u64 = 1;

/// Maximum request timeout in seconds; longer than any poll interval.
pub const MAX_REQUEST_TIMEOUT: u64 = 120;

/// Accepts http/https URLs with a host part and no whitespace or control
/// characters.
pub fn validate_server_url(url: &str) -> Result<()> {
    let rest = url
        .strip_prefix("http://")
        .or_else(|| url.strip_prefix("https://"))
        .ok_or_else(|| {
            WastewatchError::Config(format!(
                "Server URL must start with http:// or https:// (got '{url}')"
            ))
        })?;

    if rest.is_empty() || rest.starts_with('/') {
        return Err(WastewatchError::Config(
            "Server URL is missing a host".to_string(),
        ));
    }

    if url.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(WastewatchError::Config(
            "Server URL contains whitespace or control characters".to_string(),
        ));
    }

    Ok(())
}

pub fn validate_refresh_interval(interval_ms: u64) -> Result<()> {
    if interval_ms < MIN_REFRESH_INTERVAL {
        return Err(WastewatchError::Config(format!(
            "Refresh interval too small (minimum {MIN_REFRESH_INTERVAL}ms)"
        )));
    }
    if interval_ms > MAX_REFRESH_INTERVAL {
        return Err(WastewatchError::Config(format!(
            "Refresh interval too large (maximum {MAX_REFRESH_INTERVAL}ms)"
        )));
    }
    Ok(())
}

pub fn validate_page_size(page_size: u32) -> Result<()> {
    if page_size == 0 || page_size > MAX_PAGE_SIZE {
        return Err(WastewatchError::Config(format!(
            "Page size must be between 1 and {MAX_PAGE_SIZE}"
        )));
    }
    Ok(())
}

pub fn validate_recent_limit(limit: u32) -> Result<()> {
    if limit == 0 || limit > MAX_RECENT_LIMIT {
        return Err(WastewatchError::Config(format!(
            "Recent detections limit must be between 1 and {MAX_RECENT_LIMIT}"
        )));
    }
    Ok(())
}

/// Filter dates are sent verbatim to the backend, so only well-formed
/// `YYYY-MM-DD` values are let through.
pub fn validate_date(date: &str) -> Result<()> {
    chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map(|_| ())
        .map_err(|_| {
            WastewatchError::Config(format!("Invalid date '{date}' (expected YYYY-MM-DD)"))
        })
}

/// Waste type labels are stable keys: lowercase alphanumerics plus
/// hyphen/underscore.
pub fn validate_type_label(label: &str) -> Result<()> {
    if label.is_empty() {
        return Err(WastewatchError::Config(
            "Waste type label cannot be empty".to_string(),
        ));
    }
    if !label
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(WastewatchError::Config(format!(
            "Invalid characters in waste type label '{label}'"
        )));
    }
    Ok(())
}

pub fn validate_timeout(seconds: u64) -> Result<()> {
    if seconds < MIN_REQUEST_TIMEOUT || seconds > MAX_REQUEST_TIMEOUT {
        return Err(WastewatchError::Config(format!(
            "Request timeout must be between {MIN_REQUEST_TIMEOUT} and {MAX_REQUEST_TIMEOUT} seconds"
        )));
    }
    Ok(())
}

pub fn validate_confidence(confidence: u8) -> Result<()> {
    if confidence > 100 {
        return Err(WastewatchError::Config(
            "Confidence must be a percentage between 0 and 100".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_url_validation() {
        assert!(validate_server_url("http://localhost:8000").is_ok());
        assert!(validate_server_url("https://waste.example.com").is_ok());
        assert!(validate_server_url("ftp://host").is_err());
        assert!(validate_server_url("http://").is_err());
        assert!(validate_server_url("http://host with space").is_err());
    }

    #[test]
    fn refresh_interval_bounds() {
        assert!(validate_refresh_interval(5_000).is_ok());
        assert!(validate_refresh_interval(999).is_err());
        assert!(validate_refresh_interval(60_001).is_err());
    }

    #[test]
    fn page_size_bounds() {
        assert!(validate_page_size(20).is_ok());
        assert!(validate_page_size(0).is_err());
        assert!(validate_page_size(101).is_err());
    }

    #[test]
    fn date_format() {
        assert!(validate_date("2025-04-03").is_ok());
        assert!(validate_date("03/04/2025").is_err());
        assert!(validate_date("2025-13-40").is_err());
    }

    #[test]
    fn type_labels() {
        assert!(validate_type_label("plastic").is_ok());
        assert!(validate_type_label("mixed_paper").is_ok());
        assert!(validate_type_label("").is_err());
        assert!(validate_type_label("plastic bottles").is_err());
    }

    #[test]
    fn timeout_bounds() {
        assert!(validate_timeout(10).is_ok());
        assert!(validate_timeout(0).is_err());
        assert!(validate_timeout(121).is_err());
    }

    #[test]
    fn confidence_percentage() {
        assert!(validate_confidence(100).is_ok());
        assert!(validate_confidence(101).is_err());
    }
}
