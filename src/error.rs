use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Workbook could not be read: {0}")]
    WorkbookError(String),

    #[error("Sheet \"{0}\" not found in workbook")]
    SheetNotFound(String),

    #[error("Latest month column could not be detected in sheet \"{sheet}\"")]
    LatestMonthNotFound { sheet: String },

    #[error("No monthly records available to build a report")]
    EmptySeries,

    #[error("No file registered for store \"{0}\"")]
    StoreNotFound(String),

    #[error("Invalid layout profile: {0}")]
    InvalidLayout(String),

    #[error("Spreadsheet transport error: {0}")]
    TransportError(String),

    #[error("Commentary generation failed: {0}")]
    CommentaryError(String),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[cfg(any(feature = "remote", feature = "gemini"))]
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, ReportError>;
