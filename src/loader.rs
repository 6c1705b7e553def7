// Loader/Normalizer - schema check, cell cleanup, incomplete-row removal

use crate::error::LoadError;
use crate::record::{
    CleanedRow, RawRow, COL_ACCOUNT_NUMBER, COL_CONTRACT_END_DATE, COL_CUSTOMER_NAME,
    COL_EMAIL_ADDRESS, COL_PHYSICAL_ADDRESS, COL_PRODUCT, REQUIRED_COLUMNS,
};
use crate::source::{detect_format, get_reader, Table, TableRow};
use std::path::Path;

#[derive(Debug, Clone, Default)]
pub struct LoadOutput {
    /// Rows with all identity fields present, in source order
    pub rows: Vec<CleanedRow>,
    pub warnings: Vec<String>,
    /// Data rows read, before any were dropped
    pub total_rows: usize,
}

/// Read one sheet and clean it.
///
/// Fails only when the file can't be read or a required column is missing.
pub fn load(path: &Path, sheet: &str) -> Result<LoadOutput, LoadError> {
    let format = detect_format(path)?;
    let reader = get_reader(format);
    let table = reader.read(path, sheet)?;

    tracing::info!(
        path = %path.display(),
        format = format.name(),
        rows = table.rows.len(),
        "loaded input"
    );

    load_table(&table)
}

/// Column positions resolved once from the header row
struct Columns {
    customer_name: usize,
    email_address: usize,
    physical_address: usize,
    account_id: usize,
    product_name: Option<usize>,
    contract_end_date: Option<usize>,
}

impl Columns {
    fn resolve(table: &Table) -> Result<Columns, LoadError> {
        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|name| table.column_index(name).is_none())
            .map(|name| name.to_string())
            .collect();

        if !missing.is_empty() {
            return Err(LoadError::Schema {
                missing,
                available: table.headers.iter().map(|h| h.trim().to_string()).collect(),
            });
        }

        let required = |name: &str| table.column_index(name).unwrap_or_default();

        Ok(Columns {
            customer_name: required(COL_CUSTOMER_NAME),
            email_address: required(COL_EMAIL_ADDRESS),
            physical_address: required(COL_PHYSICAL_ADDRESS),
            account_id: required(COL_ACCOUNT_NUMBER),
            product_name: table.column_index(COL_PRODUCT),
            contract_end_date: table.column_index(COL_CONTRACT_END_DATE),
        })
    }

    fn raw_row(&self, row: &TableRow) -> RawRow {
        let cell = |idx: usize| {
            row.cells
                .get(idx)
                .map(|c| c.trim().to_string())
                .unwrap_or_default()
        };
        let optional = |idx: Option<usize>| idx.map(&cell).unwrap_or_default();

        RawRow {
            customer_name: cell(self.customer_name),
            email_address: cell(self.email_address),
            physical_address: cell(self.physical_address),
            account_id: cell(self.account_id),
            product_name: optional(self.product_name),
            contract_end_date: optional(self.contract_end_date),
            line_number: row.line,
        }
    }
}

/// Clean an already-read table
pub fn load_table(table: &Table) -> Result<LoadOutput, LoadError> {
    let columns = Columns::resolve(table)?;

    let mut rows = Vec::with_capacity(table.rows.len());
    let mut dropped = 0usize;

    for table_row in &table.rows {
        // Unused columns count too: a row is only blank if nothing is in it
        if table_row.cells.iter().all(|c| c.trim().is_empty()) {
            continue;
        }

        let raw = columns.raw_row(table_row);
        match CleanedRow::from_raw(&raw) {
            Some(cleaned) => rows.push(cleaned),
            None => {
                dropped += 1;
                tracing::debug!(line = raw.line_number, "dropped row missing required fields");
            }
        }
    }

    let mut warnings = Vec::new();
    if dropped > 0 {
        warnings.push(format!("Dropped {} row(s) missing required fields.", dropped));
    }

    Ok(LoadOutput {
        rows,
        warnings,
        total_rows: table.rows.len(),
    })
}

// ============================================================================
// TESTS
// ============================================================================
