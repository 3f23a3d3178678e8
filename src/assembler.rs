//! Composition of the final report payload.

use crate::config::LayoutProfile;
use crate::error::{ReportError, Result};
use crate::ingestion::{parse_csv_records, records_from_workbook};
use crate::metrics::{calculate_summary, calculate_yoy, SummarySource};
use crate::schema::{CommentSection, MonthlyRecord, ReportData};
use chrono::{Local, NaiveDate};
use log::debug;

pub const PLACEHOLDER_COMMENT_ID: &str = "default-1";
pub const PLACEHOLDER_COMMENT_TITLE: &str = "データ取得完了";

/// Report month and period labels, e.g. "2026年1月" and "2026年1月度".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPeriod {
    pub report_month: String,
    pub report_period: String,
}

impl ReportPeriod {
    /// Labels for a detected latest column. An unknown year leaves only the month.
    pub fn from_year_month(year: &str, month: u32) -> Self {
        let report_month = if year.is_empty() {
            format!("{}月", month)
        } else {
            format!("{}年{}月", year, month)
        };
        Self::from_label(report_month)
    }

    /// Labels for a caller-supplied month such as "2026年1月".
    pub fn from_label(report_month: impl Into<String>) -> Self {
        let report_month = report_month.into();
        Self {
            report_period: format!("{}度", report_month),
            report_month,
        }
    }
}

/// Creation date as shown in the report header, e.g. "2026年2月5日".
pub fn format_created_date(date: NaiveDate) -> String {
    date.format("%Y年%-m月%-d日").to_string()
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn placeholder_comment(store_name: &str, period: &ReportPeriod) -> CommentSection {
    CommentSection {
        id: PLACEHOLDER_COMMENT_ID.to_string(),
        title: PLACEHOLDER_COMMENT_TITLE.to_string(),
        content: format!(
            "{} {}のPLデータを読み込みました。AIコメント生成ボタンで分析コメントを生成できます。",
            store_name, period.report_month
        ),
    }
}

pub fn assemble_report(
    store_name: &str,
    period: ReportPeriod,
    created: NaiveDate,
    records: Vec<MonthlyRecord>,
    source: &SummarySource,
) -> Result<ReportData> {
    if records.is_empty() {
        return Err(ReportError::EmptySeries);
    }

    let summary = calculate_summary(&records, source)?;
    let yoy_comparison = calculate_yoy(&records, source)?;
    let comments = vec![placeholder_comment(store_name, &period)];

    debug!(
        "Assembled report for {} {} with {} months",
        store_name,
        period.report_month,
        records.len()
    );

    Ok(ReportData {
        store_name: store_name.to_string(),
        report_month: period.report_month,
        report_period: period.report_period,
        created_date: format_created_date(created),
        summary,
        yoy_comparison,
        monthly_trend: records,
        comments,
    })
}

/// Full workbook path: extract `sheet_name`, derive metrics, assemble.
pub fn build_report_from_xlsx(
    bytes: &[u8],
    store_name: &str,
    sheet_name: &str,
    profile: &LayoutProfile,
    created: NaiveDate,
) -> Result<ReportData> {
    let series = records_from_workbook(bytes, sheet_name, profile)?;
    let source = series.summary_source();
    let period = ReportPeriod::from_year_month(&series.latest.year, series.latest.month);
    assemble_report(store_name, period, created, series.records, &source)
}

/// CSV path: the report month is supplied by the caller rather than detected.
pub fn build_report_from_csv(
    text: &str,
    store_name: &str,
    report_month: &str,
    created: NaiveDate,
) -> Result<ReportData> {
    let records = parse_csv_records(text)?;
    assemble_report(
        store_name,
        ReportPeriod::from_label(report_month),
        created,
        records,
        &SummarySource::Csv,
    )
}
