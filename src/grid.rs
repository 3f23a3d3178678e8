//! Bounded, value-only snapshots of a worksheet.

use crate::config::GridBounds;
use crate::error::{ReportError, Result};
use calamine::{Data, Range, Reader, Xlsx};
use log::debug;
use std::io::Cursor;

/// A resolved cell. Formula cells arrive as their cached result; anything else
/// (booleans, dates, error values, formulas without a cached result) is `Empty`.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    Number(f64),
    Text(String),
    #[default]
    Empty,
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.is_empty(),
            CellValue::Number(_) => false,
        }
    }

    /// Textual rendering used for header and label matching.
    pub fn as_text(&self) -> String {
        match self {
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    n.to_string()
                }
            }
            CellValue::Empty => String::new(),
        }
    }

    /// Numeric coercion: numbers as-is, text through [`crate::utils::parse_number`], empty as 0.
    pub fn as_number(&self) -> f64 {
        match self {
            CellValue::Number(n) if n.is_finite() => *n,
            CellValue::Number(_) => 0.0,
            CellValue::Text(s) => crate::utils::parse_number(s),
            CellValue::Empty => 0.0,
        }
    }
}

impl From<&Data> for CellValue {
    fn from(data: &Data) -> Self {
        match data {
            Data::Float(f) => CellValue::Number(*f),
            Data::Int(i) => CellValue::Number(*i as f64),
            Data::String(s) => CellValue::Text(s.clone()),
            _ => CellValue::Empty,
        }
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        if value.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(value.to_string())
        }
    }
}

/// Row-major, 0-indexed snapshot anchored at cell A1.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Grid {
    rows: Vec<Vec<CellValue>>,
}

static EMPTY: CellValue = CellValue::Empty;

impl Grid {
    pub fn from_rows(rows: Vec<Vec<CellValue>>) -> Self {
        Self { rows }
    }

    /// Reads the `bounds` window of a calamine range, anchored at A1 regardless of
    /// where the range's used area starts.
    pub fn from_range(range: &Range<Data>, bounds: GridBounds) -> Self {
        let used_rows = range
            .end()
            .map(|(row, _)| row as usize + 1)
            .unwrap_or(0)
            .min(bounds.max_rows);

        let rows = (0..used_rows)
            .map(|row| {
                (0..bounds.max_cols)
                    .map(|col| {
                        range
                            .get_value((row as u32, col as u32))
                            .map(CellValue::from)
                            .unwrap_or_default()
                    })
                    .collect()
            })
            .collect();

        Self { rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn row(&self, row: usize) -> &[CellValue] {
        self.rows.get(row).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn cell(&self, row: usize, col: usize) -> &CellValue {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY)
    }

    pub fn text(&self, row: usize, col: usize) -> String {
        self.cell(row, col).as_text()
    }

    pub fn number(&self, row: usize, col: usize) -> f64 {
        self.cell(row, col).as_number()
    }
}

/// Opens an xlsx document held in memory.
pub fn open_workbook_bytes(bytes: &[u8]) -> Result<Xlsx<Cursor<Vec<u8>>>> {
    Xlsx::new(Cursor::new(bytes.to_vec()))
        .map_err(|e| ReportError::WorkbookError(e.to_string()))
}

/// Loads one named sheet of an open workbook into a bounded grid.
pub fn load_grid(
    workbook: &mut Xlsx<Cursor<Vec<u8>>>,
    sheet_name: &str,
    bounds: GridBounds,
) -> Result<Grid> {
    if !workbook.sheet_names().iter().any(|name| name == sheet_name) {
        return Err(ReportError::SheetNotFound(sheet_name.to_string()));
    }

    let range = workbook
        .worksheet_range(sheet_name)
        .map_err(|e| ReportError::WorkbookError(e.to_string()))?;

    let grid = Grid::from_range(&range, bounds);
    debug!(
        "Loaded sheet \"{}\" into a {}x{} grid",
        sheet_name,
        grid.row_count(),
        bounds.max_cols
    );
    Ok(grid)
}

/// Convenience wrapper: open `bytes` and load `sheet_name`.
pub fn open_sheet_grid(bytes: &[u8], sheet_name: &str, bounds: GridBounds) -> Result<Grid> {
    let mut workbook = open_workbook_bytes(bytes)?;
    load_grid(&mut workbook, sheet_name, bounds)
}
