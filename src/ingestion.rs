//! The two input paths: a P&L sheet inside an xlsx workbook, and fixed-column CSV text.
//! Both produce a chronological series with month-over-month trends already applied.

use crate::config::LayoutProfile;
use crate::error::{ReportError, Result};
use crate::extractor::extract_monthly_records;
use crate::grid::open_sheet_grid;
use crate::layout::{detect_label_column, detect_latest_month_column, LabelColumn, LatestMonth};
use crate::metrics::{apply_mom_trends, SummarySource};
use crate::schema::{MomTrend, MonthlyRecord};
use crate::utils::{parse_number, round1, round_half_up};
use csv::{ReaderBuilder, StringRecord, Trim};
use log::{debug, info};

/// Column order of the CSV export:
/// month, sales, cost, labor cost, operating CF (thousands), profit, F, L, R rates (%).
pub const CSV_COLUMNS: [&str; 9] = [
    "month",
    "sales",
    "cost",
    "laborCost",
    "operatingCF",
    "profitRate",
    "fCostRate",
    "lCostRate",
    "rCostRate",
];

/// A series extracted from one workbook sheet, with the detection results it was
/// built from.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkbookSeries {
    pub sheet_name: String,
    pub latest: LatestMonth,
    pub label_column: LabelColumn,
    pub records: Vec<MonthlyRecord>,
}

impl WorkbookSeries {
    pub fn summary_source(&self) -> SummarySource {
        SummarySource::Spreadsheet {
            year: self.latest.year.clone(),
            month: self.latest.month,
        }
    }
}

/// Loads `sheet_name` from the workbook bytes and extracts its trailing monthly series.
///
/// A missing sheet or an undetectable latest-month column is an error; everything
/// else (missing items, unparsable cells) degrades to zero.
pub fn records_from_workbook(
    bytes: &[u8],
    sheet_name: &str,
    profile: &LayoutProfile,
) -> Result<WorkbookSeries> {
    profile.validate()?;
    let grid = open_sheet_grid(bytes, sheet_name, profile.bounds)?;

    let label_column = detect_label_column(&grid, profile);
    let latest = detect_latest_month_column(&grid, profile).ok_or_else(|| {
        ReportError::LatestMonthNotFound {
            sheet: sheet_name.to_string(),
        }
    })?;

    let records = extract_monthly_records(&grid, profile, label_column.index(), latest.col);
    if records.is_empty() {
        return Err(ReportError::EmptySeries);
    }

    info!(
        "Extracted {} months from \"{}\" ({} to {})",
        records.len(),
        sheet_name,
        records[0].month,
        records[records.len() - 1].month
    );

    Ok(WorkbookSeries {
        sheet_name: sheet_name.to_string(),
        latest,
        label_column,
        records: apply_mom_trends(records),
    })
}

fn numeric_field(row: &StringRecord, index: usize) -> f64 {
    row.get(index).map(parse_number).unwrap_or(0.0)
}

fn record_from_csv_row(row: &StringRecord) -> MonthlyRecord {
    let f_cost_rate = numeric_field(row, 6);
    let l_cost_rate = numeric_field(row, 7);
    let r_cost_rate = numeric_field(row, 8);

    MonthlyRecord {
        month: row.get(0).unwrap_or_default().to_string(),
        sales: round_half_up(numeric_field(row, 1)),
        cost: round_half_up(numeric_field(row, 2)),
        labor_cost: round_half_up(numeric_field(row, 3)),
        operating_cf: round_half_up(numeric_field(row, 4)),
        profit_rate: numeric_field(row, 5),
        f_cost_rate,
        l_cost_rate,
        r_cost_rate,
        flr_total: round1(f_cost_rate + l_cost_rate + r_cost_rate),
        mom_trend: MomTrend::NoPrior,
    }
}

/// Parses the fixed-column CSV export. The first row is a header; short rows read
/// their missing columns as 0. Every data row becomes a record, including one whose
/// month cell is empty.
pub fn parse_csv_records(text: &str) -> Result<Vec<MonthlyRecord>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.trim().as_bytes());

    let mut records = Vec::new();
    for (line, row) in reader.records().enumerate() {
        let row = row?;
        if row.get(0).map_or(true, str::is_empty) {
            debug!("CSV row {} has no month label", line + 2);
        }
        if row.len() < CSV_COLUMNS.len() {
            debug!(
                "CSV row {} has {} of {} columns; missing values read as 0",
                line + 2,
                row.len(),
                CSV_COLUMNS.len()
            );
        }
        records.push(record_from_csv_row(&row));
    }

    debug!("Parsed {} records from CSV", records.len());
    Ok(apply_mom_trends(records))
}
