//! # PL Report Builder
//!
//! A library for turning a store's monthly P&L workbook into a report payload: a
//! trailing 13-month series, FLR cost ratios, a headline summary and a year-over-year
//! comparison.
//!
//! ## Core Concepts
//!
//! - **Layout detection**: the P&L sheet is hand-maintained, so the latest closed month
//!   column (marked 実績) and the line-item label column are located at run time
//! - **Monthly records**: currency normalized to thousands, ratios to one decimal
//! - **FLR**: food (F), labor (L) and rent/fixed (R) cost as a share of sales
//! - **Degradation**: missing items and unparsable cells read as zero; only structural
//!   failures (missing sheet, no latest month) are errors
//!
//! ## Example
//!
//! ```rust,ignore
//! use pl_report_builder::*;
//! use std::sync::Arc;
//!
//! let registry = StoreRegistry::from_path("stores.json")?;
//! let source = StaticSource::from_path("file-1", "かね子.xlsx")?;
//!
//! let generator = ReportGenerator::new(registry, Arc::new(source));
//! let report = generator.generate("かね子").await?;
//!
//! println!("{}", serde_json::to_string_pretty(&report)?);
//! ```

pub mod assembler;
pub mod commentary;
pub mod config;
pub mod error;
pub mod extractor;
pub mod grid;
pub mod ingestion;
pub mod layout;
pub mod metrics;
pub mod schema;
pub mod source;
pub mod survey;
pub mod utils;

pub use assembler::{
    assemble_report, build_report_from_csv, build_report_from_xlsx, format_created_date,
    ReportPeriod,
};
pub use commentary::{CommentaryGenerator, CommentaryInput};
pub use config::{GridBounds, LayoutProfile, LineItemLabels, StoreEntry, StoreRegistry};
pub use error::{ReportError, Result};
pub use ingestion::{parse_csv_records, records_from_workbook, WorkbookSeries};
pub use layout::{detect_label_column, detect_latest_month_column, LabelColumn, LatestMonth};
pub use metrics::{
    apply_mom_trends, calculate_summary, calculate_yoy, classify_trend, prior_year_average,
    SummarySource,
};
pub use schema::*;
pub use source::{SpreadsheetSource, StaticSource};
pub use survey::{survey_workbook, SheetSurvey, WorkbookSurvey};

#[cfg(feature = "remote")]
pub use source::HttpProxySource;

#[cfg(feature = "gemini")]
pub use commentary::gemini::GeminiCommentary;

use chrono::NaiveDate;
use log::{debug, info, warn};
use std::sync::Arc;

/// Resolves a store, fetches its workbook once and builds the report, optionally
/// replacing the placeholder comment with generated commentary.
pub struct ReportGenerator {
    registry: StoreRegistry,
    source: Arc<dyn SpreadsheetSource>,
    commentary: Option<Arc<dyn CommentaryGenerator>>,
}

impl ReportGenerator {
    pub fn new(registry: StoreRegistry, source: Arc<dyn SpreadsheetSource>) -> Self {
        Self {
            registry,
            source,
            commentary: None,
        }
    }

    pub fn with_commentary(mut self, generator: Arc<dyn CommentaryGenerator>) -> Self {
        self.commentary = Some(generator);
        self
    }

    pub fn registry(&self) -> &StoreRegistry {
        &self.registry
    }

    pub async fn generate(&self, store_name: &str) -> Result<ReportData> {
        self.generate_on(store_name, assembler::today()).await
    }

    /// Same as [`generate`](Self::generate) with an explicit creation date.
    pub async fn generate_on(&self, store_name: &str, created: NaiveDate) -> Result<ReportData> {
        let entry = self.registry.get(store_name)?;
        info!(
            "Generating report for {} (sheet \"{}\")",
            store_name, entry.sheet_name
        );

        let bytes = self.source.fetch(&entry.file_id).await?;
        debug!("Fetched {} bytes for file {}", bytes.len(), entry.file_id);

        let mut report = build_report_from_xlsx(
            &bytes,
            store_name,
            &entry.sheet_name,
            &entry.layout(),
            created,
        )?;

        if let Some(generator) = &self.commentary {
            attach_commentary(generator.as_ref(), &mut report).await;
        }

        info!(
            "Report ready: {} {}, {} months, {} comment sections",
            report.store_name,
            report.report_month,
            report.monthly_trend.len(),
            report.comments.len()
        );
        Ok(report)
    }
}

/// Replaces the report's comments with generated sections.
///
/// Generation failures never fail the report; the existing comments are kept and
/// `false` is returned.
pub async fn attach_commentary(
    generator: &dyn CommentaryGenerator,
    report: &mut ReportData,
) -> bool {
    let Some(input) = CommentaryInput::from_report(report) else {
        return false;
    };

    match generator.generate(&input).await {
        Ok(sections) if !sections.is_empty() => {
            report.comments = sections;
            true
        }
        Ok(_) => {
            warn!("Commentary generator returned no sections; keeping placeholder");
            false
        }
        Err(e) => {
            warn!("Commentary generation failed: {}", e);
            false
        }
    }
}
