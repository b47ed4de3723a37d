//! Table configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimviewError};
use crate::layout::MIN_ROW_SIZE;

/// Default number of overscan rows on each side of the visible range.
pub const DEFAULT_OVERSCAN: i64 = 3;

/// Per-table configuration, loadable from JSON (camelCase keys, all optional).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TableConfig {
    /// Extra rows rendered above and below the viewport (negative = 0)
    pub overscan: i64,
    /// Size assumed for rows not yet measured (defaults to the tallest
    /// column estimate)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_estimate: Option<f64>,
    /// Floor applied to every measured size
    pub min_row_size: f64,
    /// Initial viewport extent
    pub viewport_extent: f64,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            overscan: DEFAULT_OVERSCAN,
            row_estimate: None,
            min_row_size: MIN_ROW_SIZE,
            viewport_extent: 0.0,
        }
    }
}

impl TableConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    #[must_use]
    pub fn with_overscan(mut self, overscan: i64) -> Self {
        self.overscan = overscan;
        self
    }

    #[must_use]
    pub fn with_row_estimate(mut self, estimate: f64) -> Self {
        self.row_estimate = Some(estimate);
        self
    }

    #[must_use]
    pub fn with_viewport_extent(mut self, extent: f64) -> Self {
        self.viewport_extent = extent;
        self
    }

    /// Reject sizes the layout cannot work with.
    pub fn validate(&self) -> Result<()> {
        if !self.min_row_size.is_finite() || self.min_row_size <= 0.0 {
            return Err(SimviewError::InvalidConfig(format!(
                "minRowSize must be positive, got {}",
                self.min_row_size
            )));
        }
        if let Some(estimate) = self.row_estimate {
            if !estimate.is_finite() || estimate <= 0.0 {
                return Err(SimviewError::InvalidConfig(format!(
                    "rowEstimate must be positive, got {estimate}"
                )));
            }
        }
        if !self.viewport_extent.is_finite() {
            return Err(SimviewError::InvalidConfig(
                "viewportExtent must be finite".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_json() {
        let config = TableConfig::from_json("{}").unwrap();
        assert_eq!(config, TableConfig::default());
        assert_eq!(config.overscan, DEFAULT_OVERSCAN);
    }

    #[test]
    fn test_camel_case_keys() {
        let config =
            TableConfig::from_json(r#"{"overscan": -2, "rowEstimate": 28, "viewportExtent": 640}"#)
                .unwrap();
        assert_eq!(config.overscan, -2);
        assert_eq!(config.row_estimate, Some(28.0));
        assert_eq!(config.viewport_extent, 640.0);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(TableConfig::from_json(r#"{"minRowSize": 0}"#).is_err());
        assert!(TableConfig::from_json(r#"{"rowEstimate": -5}"#).is_err());
        assert!(TableConfig::default().with_row_estimate(f64::NAN).validate().is_err());
        assert!(TableConfig::from_json("[1, 2]").is_err());
    }
}
