// Customer records - one row per product in, one aggregate per account out

use serde::{Deserialize, Serialize};

// ============================================================================
// COLUMN NAMES
// ============================================================================

pub const COL_CUSTOMER_NAME: &str = "Customer Name";
pub const COL_EMAIL_ADDRESS: &str = "Email Address";
pub const COL_PHYSICAL_ADDRESS: &str = "Physical Address";
pub const COL_ACCOUNT_NUMBER: &str = "Account Number";
pub const COL_PRODUCT: &str = "Product";
pub const COL_CONTRACT_END_DATE: &str = "Contract End Date";

/// Columns that must exist in the header row
pub const REQUIRED_COLUMNS: [&str; 4] = [
    COL_CUSTOMER_NAME,
    COL_EMAIL_ADDRESS,
    COL_PHYSICAL_ADDRESS,
    COL_ACCOUNT_NUMBER,
];

/// Shown when a product row has no usable end date
pub const MISSING_END_DATE: &str = "N/A";

pub const RENEWAL_BASE_URL: &str = "https://example.com/renew";

// ============================================================================
// PLACEHOLDERS
// ============================================================================

/// True for cells that are present but carry no value: "", "none", "nan"
/// (case-insensitive, ignoring surrounding whitespace).
pub fn is_placeholder(value: &str) -> bool {
    let v = value.trim();
    v.is_empty() || v.eq_ignore_ascii_case("none") || v.eq_ignore_ascii_case("nan")
}

/// Trimmed value, or None when it is a placeholder
pub fn present(value: &str) -> Option<&str> {
    if is_placeholder(value) {
        None
    } else {
        Some(value.trim())
    }
}

// ============================================================================
// ROWS
// ============================================================================

/// One spreadsheet row, every cell already converted to a string
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRow {
    pub customer_name: String,
    pub email_address: String,
    pub physical_address: String,
    pub account_id: String,
    pub product_name: String,
    pub contract_end_date: String,

    /// Line in the source sheet (header = line 1)
    pub line_number: usize,
}

/// A trimmed row whose four identity fields are all present.
///
/// Product fields may still hold placeholders; the aggregator decides what
/// they contribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanedRow {
    pub customer_name: String,
    pub email_address: String,
    pub physical_address: String,
    pub account_id: String,
    pub product_name: String,
    pub contract_end_date: String,
    pub line_number: usize,
}

impl CleanedRow {
    /// Trim every field and reject the row if any identity field is missing
    pub fn from_raw(raw: &RawRow) -> Option<CleanedRow> {
        Some(CleanedRow {
            customer_name: present(&raw.customer_name)?.to_string(),
            email_address: present(&raw.email_address)?.to_string(),
            physical_address: present(&raw.physical_address)?.to_string(),
            account_id: present(&raw.account_id)?.to_string(),
            product_name: raw.product_name.trim().to_string(),
            contract_end_date: raw.contract_end_date.trim().to_string(),
            line_number: raw.line_number,
        })
    }

    /// The product line this row contributes, if any
    pub fn product(&self) -> Option<ProductEntry> {
        let name = present(&self.product_name)?;
        let end = present(&self.contract_end_date).unwrap_or(MISSING_END_DATE);
        Some(ProductEntry {
            name: name.to_string(),
            contract_end_date: end.to_string(),
        })
    }
}

// ============================================================================
// AGGREGATES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductEntry {
    pub name: String,
    pub contract_end_date: String,
}

/// One billing account with its resolved identity and products.
/// `products` is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerAggregate {
    pub customer_name: String,
    pub email_address: String,
    pub account_id: String,
    pub physical_address: String,
    pub renewal_link: String,
    pub products: Vec<ProductEntry>,
}

/// Renewal URL for an account; the id is percent-encoded
pub fn renewal_link(account_id: &str) -> String {
    format!(
        "{}?acct={}",
        RENEWAL_BASE_URL,
        urlencoding::encode(account_id)
    )
}

// ============================================================================
// TESTS
// ============================================================================
