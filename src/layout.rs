//! Header and label-column detection over a loaded grid.

use crate::config::LayoutProfile;
use crate::grid::Grid;
use crate::utils::{parse_month_token, parse_year_token};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// The latest closed ("実績" or unmarked) month column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatestMonth {
    pub col: usize,
    /// Bare four-digit year, empty when the year row carries no label up to this column.
    pub year: String,
    pub month: u32,
}

/// How the label column was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelColumn {
    Detected(usize),
    Fallback(usize),
}

impl LabelColumn {
    pub fn index(&self) -> usize {
        match self {
            LabelColumn::Detected(col) | LabelColumn::Fallback(col) => *col,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, LabelColumn::Fallback(_))
    }
}

/// Scans the year row backward from `col` (inclusive) and returns the first year found.
pub fn resolve_year(grid: &Grid, profile: &LayoutProfile, col: usize) -> Option<String> {
    (0..=col)
        .rev()
        .find_map(|c| parse_year_token(&grid.text(profile.year_row, c)))
}

/// Finds the rightmost column that carries a month token and an "actual" or blank marker.
///
/// Returns `None` when no column qualifies; the caller decides whether that is fatal.
pub fn detect_latest_month_column(grid: &Grid, profile: &LayoutProfile) -> Option<LatestMonth> {
    let month_row = grid.row(profile.month_row);

    let mut latest: Option<(usize, u32)> = None;
    for (col, cell) in month_row.iter().enumerate() {
        let Some(month) = parse_month_token(&cell.as_text()) else {
            continue;
        };

        let marker = grid.text(profile.marker_row, col);
        if marker != profile.actual_marker && !marker.is_empty() {
            continue;
        }

        latest = Some((col, month));
    }

    let (col, month) = latest?;
    let year = resolve_year(grid, profile, col).unwrap_or_default();
    debug!(
        "Latest month column: index {} ({}年{}月)",
        col, year, month
    );

    Some(LatestMonth { col, year, month })
}

/// Picks the first candidate column whose probe rows contain a required label.
///
/// Falls back to the profile's default column when no candidate matches.
pub fn detect_label_column(grid: &Grid, profile: &LayoutProfile) -> LabelColumn {
    for &col in &profile.label_candidates {
        let has_key = (profile.label_probe_start..profile.label_probe_end).any(|row| {
            let label = grid.text(row, col);
            let label = label.trim();
            profile.required_labels.iter().any(|req| req == label)
        });

        if has_key {
            debug!("Label column detected at index {}", col);
            return LabelColumn::Detected(col);
        }
    }

    warn!(
        "No label column candidate {:?} holds a required label; falling back to index {}",
        profile.label_candidates, profile.label_fallback
    );
    LabelColumn::Fallback(profile.label_fallback)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::CellValue;

    fn header_grid(years: &[&str], markers: &[&str], months: &[&str]) -> Grid {
        let to_row = |cells: &[&str]| cells.iter().map(|s| CellValue::from(*s)).collect();
        Grid::from_rows(vec![
            vec![],
            to_row(years),
            to_row(markers),
            to_row(months),
        ])
    }

    #[test]
    fn test_rightmost_actual_column_wins() {
        let grid = header_grid(
            &["", "2025年", "", "", "2026年"],
            &["", "実績", "実績", "", "実績"],
            &["", "11月", "12月", "合計", "1月"],
        );
        let latest = detect_latest_month_column(&grid, &LayoutProfile::default()).unwrap();
        assert_eq!(latest.col, 4);
        assert_eq!(latest.month, 1);
        assert_eq!(latest.year, "2026");
    }

    #[test]
    fn test_forecast_columns_are_skipped() {
        let grid = header_grid(
            &["", "2025年"],
            &["", "実績", "実績", "予測", "計画"],
            &["", "10月", "11月", "12月", "1月"],
        );
        let latest = detect_latest_month_column(&grid, &LayoutProfile::default()).unwrap();
        assert_eq!(latest.col, 2);
        assert_eq!(latest.month, 11);
        assert_eq!(latest.year, "2025");
    }

    #[test]
    fn test_blank_marker_is_accepted() {
        let grid = header_grid(&[], &["", "実績"], &["", "3月", "4月(30日)"]);
        let latest = detect_latest_month_column(&grid, &LayoutProfile::default()).unwrap();
        assert_eq!(latest.col, 2);
        assert_eq!(latest.month, 4);
        assert_eq!(latest.year, "");
    }

    #[test]
    fn test_no_month_column_is_not_found() {
        let grid = header_grid(&["2026年"], &["実績"], &["合計", "特記事項"]);
        assert!(detect_latest_month_column(&grid, &LayoutProfile::default()).is_none());

        let forecast_only = header_grid(&[], &["予測"], &["1月"]);
        assert!(detect_latest_month_column(&forecast_only, &LayoutProfile::default()).is_none());
    }

    #[test]
    fn test_resolve_year_scans_backward() {
        let grid = header_grid(&["", "2024年", "", "2025年 ", "", ""], &[], &[]);
        let profile = LayoutProfile::default();
        assert_eq!(resolve_year(&grid, &profile, 0), None);
        assert_eq!(resolve_year(&grid, &profile, 2).as_deref(), Some("2024"));
        assert_eq!(resolve_year(&grid, &profile, 5).as_deref(), Some("2025"));
    }

    fn label_grid(col: usize, row: usize, label: &str) -> Grid {
        let mut rows = vec![vec![CellValue::Empty; col + 1]; row + 1];
        rows[row][col] = CellValue::from(label);
        Grid::from_rows(rows)
    }

    #[test]
    fn test_label_column_prefers_first_matching_candidate() {
        let grid = label_grid(38, 5, "売上");
        assert_eq!(
            detect_label_column(&grid, &LayoutProfile::default()),
            LabelColumn::Detected(38)
        );

        let grid = label_grid(2, 7, " 人件費 ");
        assert_eq!(
            detect_label_column(&grid, &LayoutProfile::default()),
            LabelColumn::Detected(2)
        );
    }

    #[test]
    fn test_label_column_ignores_rows_outside_probe_window() {
        let grid = label_grid(1, 20, "売上");
        let label = detect_label_column(&grid, &LayoutProfile::default());
        assert!(label.is_fallback());
        assert_eq!(label.index(), 38);
    }

    #[test]
    fn test_label_candidates_are_configurable() {
        let grid = label_grid(4, 6, "粗利益");
        let profile = LayoutProfile {
            label_candidates: vec![4],
            label_fallback: 0,
            ..LayoutProfile::default()
        };
        assert_eq!(detect_label_column(&grid, &profile), LabelColumn::Detected(4));
    }
}
