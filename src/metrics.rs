//! Derived metrics over an extracted monthly series: the prior-year average row,
//! month-over-month trend classification, the summary snapshot and the
//! year-over-year comparison block.
//!
//! Summary and YoY figures depend on where the series came from. Workbook-extracted
//! series compare the latest month against the same month of the previous year; CSV
//! series compare against the trailing average and the preceding month. The two are
//! kept as separate strategies behind [`SummarySource`].

use crate::error::{ReportError, Result};
use crate::schema::{MomTrend, MonthlyRecord, SummaryData, YoyChange, YoyComparison, YoyRow};
use crate::utils::{format_percent, ratio_percent, round1, round_half_up};

pub const PRIOR_YEAR_AVERAGE_LABEL: &str = "前年度平均";

/// Which ingestion path produced the series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummarySource {
    /// Extracted from a workbook; `year`/`month` are those of the latest column.
    Spreadsheet { year: String, month: u32 },
    /// Parsed from fixed-column CSV text.
    Csv,
}

fn mean(records: &[MonthlyRecord], field: impl Fn(&MonthlyRecord) -> f64) -> f64 {
    records.iter().map(field).sum::<f64>() / records.len() as f64
}

/// Average of every record except the last, as a table row labelled 前年度平均.
///
/// Returns `None` when there is no record before the latest one.
pub fn prior_year_average(records: &[MonthlyRecord]) -> Option<MonthlyRecord> {
    let (_, prior) = records.split_last()?;
    if prior.is_empty() {
        return None;
    }

    let avg = |f: fn(&MonthlyRecord) -> i64| round_half_up(mean(prior, |r| f(r) as f64));
    let avg_rate = |f: fn(&MonthlyRecord) -> f64| round1(mean(prior, f));

    Some(MonthlyRecord {
        month: PRIOR_YEAR_AVERAGE_LABEL.to_string(),
        sales: avg(|r| r.sales),
        cost: avg(|r| r.cost),
        labor_cost: avg(|r| r.labor_cost),
        operating_cf: avg(|r| r.operating_cf),
        profit_rate: avg_rate(|r| r.profit_rate),
        f_cost_rate: avg_rate(|r| r.f_cost_rate),
        l_cost_rate: avg_rate(|r| r.l_cost_rate),
        r_cost_rate: avg_rate(|r| r.r_cost_rate),
        flr_total: avg_rate(|r| r.flr_total),
        mom_trend: MomTrend::NoPrior,
    })
}

/// Classifies a month-over-month change of the FLR total (in points).
// Both bands at or below -0.5 map to 改善; a separate strong-improvement tier has
// never been defined for the report.
#[allow(clippy::if_same_then_else)]
pub fn classify_trend(flr_diff: f64) -> MomTrend {
    if flr_diff <= -2.0 {
        MomTrend::Improved
    } else if flr_diff <= -0.5 {
        MomTrend::Improved
    } else if flr_diff <= 0.5 {
        MomTrend::Steady
    } else if flr_diff <= 2.0 {
        MomTrend::SlightlyWorse
    } else {
        MomTrend::Worse
    }
}

/// Returns the series with each record's trend set against its predecessor.
pub fn apply_mom_trends(records: Vec<MonthlyRecord>) -> Vec<MonthlyRecord> {
    let mut previous_flr: Option<f64> = None;
    records
        .into_iter()
        .map(|record| {
            let mom_trend = match previous_flr {
                Some(prev) => classify_trend(record.flr_total - prev),
                None => MomTrend::NoPrior,
            };
            previous_flr = Some(record.flr_total);
            MonthlyRecord { mom_trend, ..record }
        })
        .collect()
}

/// Record with the same month one year before the latest column, matched on the
/// "yy/m月" label: same month suffix, different year prefix.
pub fn find_prior_year_record<'a>(
    records: &'a [MonthlyRecord],
    year: &str,
    month: u32,
) -> Option<&'a MonthlyRecord> {
    let suffix = format!("/{}月", month);
    let current_prefix: String = year.chars().skip(2).collect();
    records
        .iter()
        .find(|r| r.month.contains(&suffix) && !r.month.starts_with(&current_prefix))
}

/// Record twelve positions before `index`, clamped to the first record.
pub fn twelve_back(records: &[MonthlyRecord], index: usize) -> Option<&MonthlyRecord> {
    records.get(index.saturating_sub(12))
}

pub fn calculate_summary(records: &[MonthlyRecord], source: &SummarySource) -> Result<SummaryData> {
    let latest = records.last().ok_or(ReportError::EmptySeries)?;
    Ok(match source {
        SummarySource::Spreadsheet { year, month } => {
            spreadsheet_summary(latest, find_prior_year_record(records, year, *month))
        }
        SummarySource::Csv => csv_summary(records, latest),
    })
}

pub fn calculate_yoy(records: &[MonthlyRecord], source: &SummarySource) -> Result<YoyComparison> {
    let latest = records.last().ok_or(ReportError::EmptySeries)?;
    Ok(match source {
        SummarySource::Spreadsheet { year, month } => {
            spreadsheet_yoy(latest, find_prior_year_record(records, year, *month))
        }
        SummarySource::Csv => {
            let prior = twelve_back(records, records.len() - 1).unwrap_or(latest);
            csv_yoy(latest, prior)
        }
    })
}

fn spreadsheet_summary(latest: &MonthlyRecord, prior: Option<&MonthlyRecord>) -> SummaryData {
    let cur_sales = latest.sales * 1000;
    let prev_sales = prior.map(|p| p.sales * 1000).unwrap_or(0);
    let prev_profit = prior.map(|p| p.profit_rate).unwrap_or(0.0);

    let sales_yoy_label = if prev_sales > 0 {
        format!(
            "(前年同月比 {}%)",
            format_percent(ratio_percent((cur_sales - prev_sales) as f64, prev_sales as f64))
        )
    } else {
        String::new()
    };

    SummaryData {
        sales: cur_sales,
        sales_yoy_label,
        operating_profit_rate: latest.profit_rate,
        profit_rate_yoy_change: if prev_profit != 0.0 {
            round1(latest.profit_rate - prev_profit)
        } else {
            0.0
        },
        operating_cf: latest.operating_cf * 1000,
        f_cost_rate: latest.f_cost_rate,
        f_cost_rate_change: prior
            .map(|p| round1(latest.f_cost_rate - p.f_cost_rate))
            .unwrap_or(0.0),
        flr_cost_rate: latest.flr_total,
        flr_cost_rate_change: prior
            .map(|p| round1(latest.flr_total - p.flr_total))
            .unwrap_or(0.0),
    }
}

fn csv_summary(records: &[MonthlyRecord], latest: &MonthlyRecord) -> SummaryData {
    let prior = &records[..records.len() - 1];
    let previous_month = prior.last();

    let (sales_yoy_label, profit_rate_yoy_change) = if prior.is_empty() {
        (String::new(), 0.0)
    } else {
        let avg_sales = mean(prior, |r| r.sales as f64);
        let avg_profit = mean(prior, |r| r.profit_rate);
        let label = if avg_sales > 0.0 {
            format!(
                "前年平均比 {}%",
                format_percent(ratio_percent(latest.sales as f64 - avg_sales, avg_sales))
            )
        } else {
            String::new()
        };
        (label, round1(latest.profit_rate - avg_profit))
    };

    SummaryData {
        sales: latest.sales * 1000,
        sales_yoy_label,
        operating_profit_rate: latest.profit_rate,
        profit_rate_yoy_change,
        operating_cf: latest.operating_cf * 1000,
        f_cost_rate: latest.f_cost_rate,
        f_cost_rate_change: previous_month
            .map(|p| round1(latest.f_cost_rate - p.f_cost_rate))
            .unwrap_or(0.0),
        flr_cost_rate: latest.flr_total,
        flr_cost_rate_change: previous_month
            .map(|p| round1(latest.flr_total - p.flr_total))
            .unwrap_or(0.0),
    }
}

fn yoy_rate(change: i64, base: i64) -> f64 {
    round1(ratio_percent(change as f64, base as f64))
}

fn spreadsheet_yoy(latest: &MonthlyRecord, prior: Option<&MonthlyRecord>) -> YoyComparison {
    let previous_year = YoyRow {
        sales: prior.map(|p| p.sales * 1000).unwrap_or(0),
        operating_cf: prior.map(|p| p.operating_cf * 1000).unwrap_or(0),
        profit_rate: prior.map(|p| p.profit_rate).unwrap_or(0.0),
    };
    let current_year = YoyRow {
        sales: latest.sales * 1000,
        operating_cf: latest.operating_cf * 1000,
        profit_rate: latest.profit_rate,
    };

    let sales_amount = current_year.sales - previous_year.sales;
    let cf_amount = current_year.operating_cf - previous_year.operating_cf;
    let profit_rate_change = if previous_year.profit_rate != 0.0 {
        round1(current_year.profit_rate - previous_year.profit_rate)
    } else {
        0.0
    };

    YoyComparison {
        change: YoyChange {
            sales_amount,
            sales_rate: yoy_rate(sales_amount, previous_year.sales),
            cf_amount,
            cf_rate: yoy_rate(cf_amount, previous_year.operating_cf),
            profit_rate_change,
        },
        previous_year,
        current_year,
    }
}

fn csv_yoy(latest: &MonthlyRecord, prior: &MonthlyRecord) -> YoyComparison {
    let sales_amount = (latest.sales - prior.sales) * 1000;
    let cf_amount = (latest.operating_cf - prior.operating_cf) * 1000;

    YoyComparison {
        previous_year: YoyRow {
            sales: prior.sales * 1000,
            operating_cf: prior.operating_cf * 1000,
            profit_rate: prior.profit_rate,
        },
        current_year: YoyRow {
            sales: latest.sales * 1000,
            operating_cf: latest.operating_cf * 1000,
            profit_rate: latest.profit_rate,
        },
        change: YoyChange {
            sales_amount,
            sales_rate: yoy_rate(sales_amount, prior.sales * 1000),
            cf_amount,
            cf_rate: yoy_rate(cf_amount, prior.operating_cf * 1000),
            profit_rate_change: round1(latest.profit_rate - prior.profit_rate),
        },
    }
}
