// Sheet readers - workbook (calamine) and CSV inputs behind one trait

use crate::error::LoadError;
use calamine::{open_workbook_auto, Data, Reader};
use chrono::{NaiveDateTime, Timelike};
use std::borrow::Cow;
use std::fs::File;
use std::path::Path;

// ============================================================================
// CORE TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Csv,
    Workbook,
}

impl InputFormat {
    pub fn name(&self) -> &str {
        match self {
            InputFormat::Csv => "CSV",
            InputFormat::Workbook => "Workbook",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    /// Line in the source (header = line 1)
    pub line: usize,
    pub cells: Vec<String>,
}

/// Header row plus string cells, in sheet order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<TableRow>,
}

impl Table {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.trim() == name)
    }
}

/// Reads one sheet of a tabular file.
///
/// Implementations convert every cell to its string form and must not
/// reinterpret text cells (account numbers like "007" stay as written).
pub trait SheetReader: Send + Sync {
    fn read(&self, path: &Path, sheet: &str) -> Result<Table, LoadError>;

    fn format(&self) -> InputFormat;
}

// ============================================================================
// FACTORY FUNCTIONS
// ============================================================================

/// Pick the input format from the file extension
pub fn detect_format(path: &Path) -> Result<InputFormat, LoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "csv" | "tsv" => Ok(InputFormat::Csv),
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Ok(InputFormat::Workbook),
        _ => Err(LoadError::UnsupportedFormat(path.to_path_buf())),
    }
}

pub fn get_reader(format: InputFormat) -> Box<dyn SheetReader> {
    match format {
        InputFormat::Csv => Box::new(CsvReader::new()),
        InputFormat::Workbook => Box::new(WorkbookReader::new()),
    }
}

// ============================================================================
// CSV
// ============================================================================

/// CSV/TSV reader. CSV has no sheets, so the sheet name is ignored.
pub struct CsvReader;

impl CsvReader {
    pub fn new() -> Self {
        CsvReader
    }
}

impl Default for CsvReader {
    fn default() -> Self {
        Self::new()
    }
}

impl SheetReader for CsvReader {
    fn read(&self, path: &Path, _sheet: &str) -> Result<Table, LoadError> {
        let file = File::open(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let is_tsv = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("tsv"));

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .delimiter(if is_tsv { b'\t' } else { b',' })
            .from_reader(file);

        let csv_err = |source: csv::Error| LoadError::Csv {
            path: path.to_path_buf(),
            source,
        };

        // Cells are decoded lossily: invalid UTF-8 becomes U+FFFD instead of an error
        let headers: Vec<String> = reader
            .byte_headers()
            .map_err(csv_err)?
            .iter()
            .map(|h| {
                String::from_utf8_lossy(h)
                    .trim()
                    .trim_start_matches('\u{feff}')
                    .to_string()
            })
            .collect();

        let mut rows = Vec::new();
        let mut replaced = 0usize;
        for (idx, result) in reader.byte_records().enumerate() {
            let record = result.map_err(csv_err)?;
            let line = record
                .position()
                .map(|p| p.line() as usize)
                .unwrap_or(idx + 2);

            let mut cells = Vec::with_capacity(headers.len().max(record.len()));
            for field in record.iter() {
                let text = String::from_utf8_lossy(field);
                if let Cow::Owned(_) = text {
                    replaced += 1;
                }
                cells.push(text.into_owned());
            }
            cells.resize(headers.len().max(cells.len()), String::new());
            rows.push(TableRow { line, cells });
        }

        if replaced > 0 {
            tracing::warn!(
                path = %path.display(),
                fields = replaced,
                "CSV is not valid UTF-8; replaced undecodable bytes"
            );
        }

        tracing::debug!(path = %path.display(), rows = rows.len(), "read CSV");
        Ok(Table { headers, rows })
    }

    fn format(&self) -> InputFormat {
        InputFormat::Csv
    }
}

// ============================================================================
// WORKBOOK
// ============================================================================

/// Excel/ODS reader backed by calamine
pub struct WorkbookReader;

impl WorkbookReader {
    pub fn new() -> Self {
        WorkbookReader
    }
}

impl Default for WorkbookReader {
    fn default() -> Self {
        Self::new()
    }
}

impl SheetReader for WorkbookReader {
    fn read(&self, path: &Path, sheet: &str) -> Result<Table, LoadError> {
        if !path.exists() {
            return Err(LoadError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
            });
        }

        let workbook_err = |message: String| LoadError::Workbook {
            path: path.to_path_buf(),
            message,
        };

        let mut workbook = open_workbook_auto(path).map_err(|e| workbook_err(e.to_string()))?;

        let available = workbook.sheet_names();
        if !available.iter().any(|name| name == sheet) {
            return Err(LoadError::SheetNotFound {
                sheet: sheet.to_string(),
                available,
            });
        }

        let range = workbook
            .worksheet_range(sheet)
            .map_err(|e| workbook_err(e.to_string()))?;

        // Range may start below row 0 when leading rows are empty
        let first_line = range.start().map(|(row, _)| row as usize + 1).unwrap_or(1);

        let mut headers = Vec::new();
        let mut rows = Vec::new();
        let mut header_found = false;

        for (offset, row) in range.rows().enumerate() {
            let cells: Vec<String> = row.iter().map(cell_to_string).collect();

            if !header_found {
                if cells.iter().all(|c| c.trim().is_empty()) {
                    continue;
                }
                headers = cells.iter().map(|c| c.trim().to_string()).collect();
                header_found = true;
                continue;
            }

            rows.push(TableRow {
                line: first_line + offset,
                cells,
            });
        }

        tracing::debug!(
            path = %path.display(),
            sheet,
            rows = rows.len(),
            "read workbook sheet"
        );
        Ok(Table { headers, rows })
    }

    fn format(&self) -> InputFormat {
        InputFormat::Workbook
    }
}

/// String form of a workbook cell.
///
/// Whole-number floats print without a trailing ".0" or exponent, so an
/// account number stored as 12345.0 comes out as "12345".
pub fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => format_float(*f),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(format_datetime)
            .unwrap_or_else(|| format_float(dt.as_f64())),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
    }
}

pub fn format_float(value: f64) -> String {
    // f64's Display never switches to exponent form and drops ".0"
    if value == 0.0 {
        return "0".to_string();
    }
    value.to_string()
}

pub fn format_datetime(dt: NaiveDateTime) -> String {
    if dt.hour() == 0 && dt.minute() == 0 && dt.second() == 0 {
        dt.format("%Y-%m-%d").to_string()
    } else {
        dt.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

// ============================================================================
// TESTS
// ============================================================================
