use crate::error::{ReportError, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Rectangular read window applied when a sheet is loaded into a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct GridBounds {
    pub max_rows: usize,
    pub max_cols: usize,
}

impl GridBounds {
    /// Window used by the report extraction path.
    pub const EXTRACTION: GridBounds = GridBounds {
        max_rows: 60,
        max_cols: 50,
    };

    /// Wider window used when surveying unknown sheets.
    pub const SURVEY: GridBounds = GridBounds {
        max_rows: 80,
        max_cols: 55,
    };
}

impl Default for GridBounds {
    fn default() -> Self {
        Self::EXTRACTION
    }
}

/// Row labels of the line items the extractor reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct LineItemLabels {
    pub sales: String,
    pub cost: String,
    pub labor_cost: String,
    pub operating_cf: String,
    pub rent: String,
    pub lease: String,
    pub fee: String,
}

impl Default for LineItemLabels {
    fn default() -> Self {
        Self {
            sales: "売上".to_string(),
            cost: "原価".to_string(),
            labor_cost: "人件費".to_string(),
            operating_cf: "営業CF".to_string(),
            rent: "地代家賃".to_string(),
            lease: "リース料".to_string(),
            fee: "支払手数料".to_string(),
        }
    }
}

/// Describes where a sheet keeps its headers and line items.
///
/// The defaults match the monthly report sheets: year labels on row 2, the
/// 実績 marker on row 3, month names on row 4 and line-item names in column AM.
/// Every field can be overridden per store so that differently shaped sheets can
/// share the same detectors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct LayoutProfile {
    #[schemars(description = "0-based row holding year labels such as 2026年")]
    pub year_row: usize,

    #[schemars(description = "0-based row holding the actual/forecast marker")]
    pub marker_row: usize,

    #[schemars(description = "0-based row holding month labels such as 1月")]
    pub month_row: usize,

    #[schemars(description = "Marker text identifying realized (actual) columns")]
    pub actual_marker: String,

    #[schemars(description = "Label column candidates, tried in order")]
    pub label_candidates: Vec<usize>,

    #[schemars(description = "Column used when no candidate holds a required label")]
    pub label_fallback: usize,

    #[schemars(description = "First row (inclusive) inspected when probing label candidates")]
    pub label_probe_start: usize,

    #[schemars(description = "Last row (exclusive) inspected when probing label candidates")]
    pub label_probe_end: usize,

    #[schemars(description = "Labels of which at least one must appear in the label column")]
    pub required_labels: Vec<String>,

    #[schemars(description = "First row (inclusive) scanned for line items")]
    pub item_first_row: usize,

    #[schemars(description = "Row ceiling (exclusive) for the line-item scan")]
    pub item_row_ceiling: usize,

    #[schemars(description = "Maximum number of monthly columns in the trailing window")]
    pub window_months: usize,

    pub line_items: LineItemLabels,

    pub bounds: GridBounds,
}

impl Default for LayoutProfile {
    fn default() -> Self {
        Self {
            year_row: 1,
            marker_row: 2,
            month_row: 3,
            actual_marker: "実績".to_string(),
            label_candidates: vec![38, 1, 2],
            label_fallback: 38,
            label_probe_start: 5,
            label_probe_end: 15,
            required_labels: vec![
                "売上".to_string(),
                "原価".to_string(),
                "粗利益".to_string(),
                "人件費".to_string(),
            ],
            item_first_row: 5,
            item_row_ceiling: 60,
            window_months: 13,
            line_items: LineItemLabels::default(),
            bounds: GridBounds::EXTRACTION,
        }
    }
}

impl LayoutProfile {
    pub fn validate(&self) -> Result<()> {
        let header_rows = [self.year_row, self.marker_row, self.month_row];
        if let Some(row) = header_rows.iter().find(|r| **r >= self.bounds.max_rows) {
            return Err(ReportError::InvalidLayout(format!(
                "header row {} lies outside the {}-row read window",
                row, self.bounds.max_rows
            )));
        }

        if self.label_probe_end < self.label_probe_start {
            return Err(ReportError::InvalidLayout(format!(
                "label probe window {}..{} is reversed",
                self.label_probe_start, self.label_probe_end
            )));
        }

        if self.item_row_ceiling < self.item_first_row {
            return Err(ReportError::InvalidLayout(format!(
                "item scan window {}..{} is reversed",
                self.item_first_row, self.item_row_ceiling
            )));
        }

        if self.window_months == 0 {
            return Err(ReportError::InvalidLayout(
                "window_months must be at least 1".to_string(),
            ));
        }

        if self.required_labels.is_empty() {
            return Err(ReportError::InvalidLayout(
                "required_labels must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

/// Where a store's report workbook lives and how its sheet is laid out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StoreEntry {
    pub file_id: String,
    pub sheet_name: String,
    #[serde(default)]
    pub layout: Option<LayoutProfile>,
}

impl StoreEntry {
    pub fn new(file_id: impl Into<String>, sheet_name: impl Into<String>) -> Self {
        Self {
            file_id: file_id.into(),
            sheet_name: sheet_name.into(),
            layout: None,
        }
    }

    pub fn layout(&self) -> LayoutProfile {
        self.layout.clone().unwrap_or_default()
    }
}

/// Store name to workbook mapping, loaded from deployment configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StoreRegistry {
    #[serde(default)]
    pub stores: BTreeMap<String, StoreEntry>,
}

impl StoreRegistry {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let registry: StoreRegistry = serde_json::from_str(json)?;
        registry.validate()?;
        Ok(registry)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn insert(&mut self, store_name: impl Into<String>, entry: StoreEntry) {
        self.stores.insert(store_name.into(), entry);
    }

    pub fn get(&self, store_name: &str) -> Result<&StoreEntry> {
        self.stores
            .get(store_name)
            .ok_or_else(|| ReportError::StoreNotFound(store_name.to_string()))
    }

    pub fn store_names(&self) -> Vec<&str> {
        self.stores.keys().map(String::as_str).collect()
    }

    fn validate(&self) -> Result<()> {
        for (name, entry) in &self.stores {
            if let Some(layout) = &entry.layout {
                layout.validate().map_err(|e| {
                    ReportError::InvalidLayout(format!("store \"{}\": {}", name, e))
                })?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout_is_valid() {
        let layout = LayoutProfile::default();
        assert!(layout.validate().is_ok());
        assert_eq!(layout.label_candidates, vec![38, 1, 2]);
        assert_eq!(layout.window_months, 13);
    }

    #[test]
    fn test_layout_rejects_header_outside_window() {
        let layout = LayoutProfile {
            month_row: 70,
            ..LayoutProfile::default()
        };
        assert!(matches!(
            layout.validate(),
            Err(ReportError::InvalidLayout(_))
        ));
    }

    #[test]
    fn test_registry_from_json_with_partial_layout() {
        let json = r#"{
            "stores": {
                "かね子": { "file_id": "abc123", "sheet_name": "かね子報告書" },
                "紗心": {
                    "file_id": "def456",
                    "sheet_name": "紗心　報告書",
                    "layout": { "label_candidates": [2, 1], "label_fallback": 2 }
                }
            }
        }"#;

        let registry = StoreRegistry::from_json_str(json).unwrap();
        assert_eq!(registry.store_names(), vec!["かね子", "紗心"]);

        let kaneko = registry.get("かね子").unwrap();
        assert_eq!(kaneko.layout(), LayoutProfile::default());

        let sashin = registry.get("紗心").unwrap().layout();
        assert_eq!(sashin.label_candidates, vec![2, 1]);
        assert_eq!(sashin.actual_marker, "実績");
        assert_eq!(sashin.line_items.sales, "売上");
    }

    #[test]
    fn test_registry_unknown_store() {
        let registry = StoreRegistry::default();
        assert!(matches!(
            registry.get("missing"),
            Err(ReportError::StoreNotFound(name)) if name == "missing"
        ));
    }

    #[test]
    fn test_registry_rejects_invalid_layout() {
        let json = r#"{ "stores": { "x": { "file_id": "1", "sheet_name": "s", "layout": { "window_months": 0 } } } }"#;
        assert!(StoreRegistry::from_json_str(json).is_err());
    }
}
