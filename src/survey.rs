//! Structural survey of report sheets whose layout is not yet known.
//!
//! Used when onboarding a new store workbook: it lists the report sheets, locates the
//! totals column and the month columns before it, and dumps every line item's numeric
//! values so the right sheet name and layout profile can be chosen.

use crate::config::{GridBounds, LayoutProfile};
use crate::error::Result;
use crate::extractor::MonthColumn;
use crate::grid::{load_grid, open_workbook_bytes, CellValue, Grid};
use crate::layout::resolve_year;
use crate::utils::parse_month_token;
use calamine::Reader;
use log::{debug, info};
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::OnceLock;

pub const REPORT_SHEET_MARKER: &str = "報告書";
pub const TOTAL_MARKER: &str = "合計";

const FIRST_DATA_COL: usize = 3;
const SCAN_END_WITHOUT_TOTAL: usize = 50;
const KEPT_MONTH_COLUMNS: usize = 14;
const CATEGORY_COL: usize = 1;
const ITEM_COL: usize = 2;
const FIRST_ITEM_ROW: usize = 4;

fn bare_month_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+月$").expect("valid regex"))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurveyItem {
    pub category: String,
    /// Numeric cell values keyed by `{year}_{month}`; non-numeric cells are `None`.
    pub values: BTreeMap<String, Option<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetSurvey {
    pub total_col: Option<usize>,
    pub latest_col: Option<usize>,
    pub latest_year: Option<String>,
    pub latest_month: Option<u32>,
    /// The most recent month columns left of the totals column, oldest first.
    pub month_columns: Vec<MonthColumn>,
    pub items: BTreeMap<String, SurveyItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkbookSurvey {
    pub sheet_names: Vec<String>,
    pub report_sheets: Vec<String>,
    pub sheets: BTreeMap<String, SheetSurvey>,
}

fn find_total_column(grid: &Grid, profile: &LayoutProfile) -> Option<usize> {
    let width = grid.row(profile.marker_row).len();
    (0..width).find(|&col| {
        grid.text(profile.marker_row, col).contains(TOTAL_MARKER)
            || grid.text(profile.month_row, col).contains(TOTAL_MARKER)
    })
}

fn survey_month_columns(grid: &Grid, profile: &LayoutProfile, end: usize) -> Vec<MonthColumn> {
    (FIRST_DATA_COL..end)
        .filter_map(|col| {
            let header = grid.text(profile.month_row, col);
            if !bare_month_regex().is_match(&header) {
                return None;
            }
            Some(MonthColumn {
                col,
                year: resolve_year(grid, profile, col).unwrap_or_default(),
                month: parse_month_token(&header)?,
            })
        })
        .collect()
}

/// Surveys one loaded sheet. Returns `None` when the sheet has no header rows.
pub fn survey_grid(grid: &Grid, profile: &LayoutProfile) -> Option<SheetSurvey> {
    if grid.row_count() <= profile.month_row {
        return None;
    }

    let total_col = find_total_column(grid, profile);
    let latest_col = total_col.filter(|&c| c > 0).map(|c| c - 1);
    let latest_year = latest_col.and_then(|col| resolve_year(grid, profile, col));
    let latest_month =
        latest_col.and_then(|col| parse_month_token(&grid.text(profile.month_row, col)));

    let end = total_col
        .filter(|&c| c > 0)
        .unwrap_or(SCAN_END_WITHOUT_TOTAL);
    let all_months = survey_month_columns(grid, profile, end);

    let mut items = BTreeMap::new();
    for row in FIRST_ITEM_ROW..grid.row_count() {
        let category = grid.text(row, CATEGORY_COL).trim().to_string();
        let name = grid.text(row, ITEM_COL).trim().to_string();
        if name.is_empty() || name == category {
            continue;
        }

        let values = all_months
            .iter()
            .map(|mc| {
                let value = match grid.cell(row, mc.col) {
                    CellValue::Number(n) => Some(*n),
                    _ => None,
                };
                (format!("{}_{}", mc.year, mc.month), value)
            })
            .collect();
        items.insert(name, SurveyItem { category, values });
    }

    let skip = all_months.len().saturating_sub(KEPT_MONTH_COLUMNS);
    let month_columns: Vec<MonthColumn> = all_months.into_iter().skip(skip).collect();

    debug!(
        "Survey: total column {:?}, latest column {:?}, {} month columns, {} items",
        total_col,
        latest_col,
        month_columns.len(),
        items.len()
    );

    Some(SheetSurvey {
        total_col,
        latest_col,
        latest_year,
        latest_month,
        month_columns,
        items,
    })
}

/// Surveys every sheet whose name contains 報告書.
pub fn survey_workbook(bytes: &[u8], profile: &LayoutProfile) -> Result<WorkbookSurvey> {
    let mut workbook = open_workbook_bytes(bytes)?;
    let sheet_names = workbook.sheet_names();
    let report_sheets: Vec<String> = sheet_names
        .iter()
        .filter(|name| name.contains(REPORT_SHEET_MARKER))
        .cloned()
        .collect();

    info!(
        "Workbook has {} sheets, {} report sheets",
        sheet_names.len(),
        report_sheets.len()
    );

    let mut sheets = BTreeMap::new();
    for name in &report_sheets {
        let grid = load_grid(&mut workbook, name, GridBounds::SURVEY)?;
        if let Some(survey) = survey_grid(&grid, profile) {
            info!(
                "{}: latest {}年{}月, {} items",
                name,
                survey.latest_year.as_deref().unwrap_or("?"),
                survey
                    .latest_month
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "?".to_string()),
                survey.items.len()
            );
            sheets.insert(name.clone(), survey);
        }
    }

    Ok(WorkbookSurvey {
        sheet_names,
        report_sheets,
        sheets,
    })
}
