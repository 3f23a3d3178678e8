use crate::config::LayoutProfile;
use crate::grid::Grid;
use crate::schema::{MomTrend, MonthlyRecord};
use crate::utils::{
    month_label, parse_month_token, parse_year_token, ratio_percent, round1, to_thousands,
};
use log::{debug, warn};
use serde::Serialize;
use std::collections::HashMap;

/// Line-item label to the first row holding it.
#[derive(Debug, Clone, Default)]
pub struct ItemRowMap {
    rows: HashMap<String, usize>,
}

impl ItemRowMap {
    pub fn build(grid: &Grid, label_col: usize, profile: &LayoutProfile) -> Self {
        let mut rows = HashMap::new();
        let end = grid.row_count().min(profile.item_row_ceiling);

        for row in profile.item_first_row..end {
            let label = grid.text(row, label_col);
            let label = label.trim();
            if label.is_empty() {
                continue;
            }
            rows.entry(label.to_string()).or_insert(row);
        }

        Self { rows }
    }

    pub fn row_of(&self, label: &str) -> Option<usize> {
        self.rows.get(label).copied()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Raw value of `label` in `col`; a missing item reads as 0.
    pub fn value(&self, grid: &Grid, label: &str, col: usize) -> f64 {
        self.row_of(label)
            .map(|row| grid.number(row, col))
            .unwrap_or(0.0)
    }
}

/// A data column inside the trailing window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthColumn {
    pub col: usize,
    pub year: String,
    pub month: u32,
}

impl MonthColumn {
    pub fn label(&self) -> String {
        month_label(&self.year, self.month)
    }
}

/// Raw (unscaled) figures read for one month.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RawMonthFigures {
    pub sales: f64,
    pub cost: f64,
    pub labor_cost: f64,
    pub operating_cf: f64,
    pub rent: f64,
    pub lease: f64,
    pub fee: f64,
}

impl RawMonthFigures {
    pub fn read(grid: &Grid, items: &ItemRowMap, profile: &LayoutProfile, col: usize) -> Self {
        let labels = &profile.line_items;
        Self {
            sales: items.value(grid, &labels.sales, col),
            cost: items.value(grid, &labels.cost, col),
            labor_cost: items.value(grid, &labels.labor_cost, col),
            operating_cf: items.value(grid, &labels.operating_cf, col),
            rent: items.value(grid, &labels.rent, col),
            lease: items.value(grid, &labels.lease, col),
            fee: items.value(grid, &labels.fee, col),
        }
    }

    /// Normalizes to thousands and derives the FLR ratios.
    pub fn into_record(self, month: String) -> MonthlyRecord {
        let f_cost_rate = round1(ratio_percent(self.cost, self.sales));
        let l_cost_rate = round1(ratio_percent(self.labor_cost, self.sales));
        let r_cost_rate = round1(ratio_percent(self.rent + self.lease + self.fee, self.sales));

        MonthlyRecord {
            month,
            sales: to_thousands(self.sales),
            cost: to_thousands(self.cost),
            labor_cost: to_thousands(self.labor_cost),
            operating_cf: to_thousands(self.operating_cf),
            profit_rate: round1(ratio_percent(self.operating_cf, self.sales)),
            f_cost_rate,
            l_cost_rate,
            r_cost_rate,
            flr_total: round1(f_cost_rate + l_cost_rate + r_cost_rate),
            mom_trend: MomTrend::NoPrior,
        }
    }
}

/// Walks left from `latest_col` collecting up to `window_months` month columns,
/// returned oldest first.
///
/// Years come from the nearest year label at or left of each column. A column with no
/// such label inherits the year of the column collected just before it.
pub fn collect_month_columns(
    grid: &Grid,
    profile: &LayoutProfile,
    latest_col: usize,
) -> Vec<MonthColumn> {
    let nearest_year: Vec<Option<String>> = (0..=latest_col)
        .scan(None, |last: &mut Option<String>, col| {
            if let Some(year) = parse_year_token(&grid.text(profile.year_row, col)) {
                *last = Some(year);
            }
            Some(last.clone())
        })
        .collect();

    let mut carried = String::new();
    let mut columns = Vec::with_capacity(profile.window_months);

    for col in (0..=latest_col).rev() {
        if columns.len() >= profile.window_months {
            break;
        }
        let Some(month) = parse_month_token(&grid.text(profile.month_row, col)) else {
            continue;
        };

        if let Some(year) = &nearest_year[col] {
            carried = year.clone();
        }
        columns.push(MonthColumn {
            col,
            year: carried.clone(),
            month,
        });
    }

    columns.reverse();
    columns
}

/// Extracts the trailing monthly series ending at `latest_col`.
pub fn extract_monthly_records(
    grid: &Grid,
    profile: &LayoutProfile,
    label_col: usize,
    latest_col: usize,
) -> Vec<MonthlyRecord> {
    let items = ItemRowMap::build(grid, label_col, profile);
    debug!(
        "Item-row map holds {} labels from column {}",
        items.len(),
        label_col
    );

    let labels = &profile.line_items;
    for required in [&labels.sales, &labels.cost, &labels.labor_cost, &labels.operating_cf] {
        if items.row_of(required).is_none() {
            warn!("Line item \"{}\" not found; treating it as zero", required);
        }
    }

    let columns = collect_month_columns(grid, profile, latest_col);
    debug!("Collected {} monthly columns", columns.len());

    columns
        .iter()
        .map(|mc| RawMonthFigures::read(grid, &items, profile, mc.col).into_record(mc.label()))
        .collect()
}
