// Sample input - one row per product, with the edge cases the loader and
// aggregator have to handle

use crate::record::{
    COL_ACCOUNT_NUMBER, COL_CONTRACT_END_DATE, COL_CUSTOMER_NAME, COL_EMAIL_ADDRESS,
    COL_PHYSICAL_ADDRESS, COL_PRODUCT,
};
use anyhow::{Context, Result};
use std::path::Path;

const PRODUCTS: [&str; 4] = ["IP VPN", "DIA", "IOA", "Wavelengths"];

const END_DATES: [&str; 4] = ["2025-03-15", "2025-04-22", "2025-05-10", "2025-06-30"];

struct SampleCustomer {
    name: &'static str,
    email: &'static str,
    address: &'static str,
    account: &'static str,
    /// Write placeholder products instead of real ones
    no_products: bool,
}

const CUSTOMERS: [SampleCustomer; 8] = [
    SampleCustomer {
        name: "Acme Corporation",
        email: "it-admin@acmecorp.com",
        address: "1500 Technology Drive, Austin, TX 78701",
        account: "LUM001",
        no_products: false,
    },
    SampleCustomer {
        name: "Global Manufacturing Inc",
        email: "network.ops@globalmanufacturing.com",
        address: "2200 Industrial Blvd, Detroit, MI 48201",
        account: "LUM002",
        no_products: false,
    },
    // Dropped by the loader: no address
    SampleCustomer {
        name: "Metro Healthcare System",
        email: "cio@metrohealthcare.org",
        address: "",
        account: "LUM003",
        no_products: false,
    },
    SampleCustomer {
        name: "First National Bank",
        email: "infrastructure@firstnationalbank.com",
        address: "100 Financial Plaza, Charlotte, NC 28202",
        account: "LUM004",
        no_products: false,
    },
    SampleCustomer {
        name: "Very Long Business Name Technologies International Group LLC",
        email: "very.long.email.address@verylongbusinessname.com",
        address: "9999 Very Long Address Name Street, Some Very Long City Name, ST 12345",
        account: "LUM005",
        no_products: false,
    },
    // Dropped by the loader: no account number
    SampleCustomer {
        name: "Missing Account Company",
        email: "contact@missingaccount.com",
        address: "500 Test Street, Test City, TS 12345",
        account: "",
        no_products: false,
    },
    // Skipped by the aggregator: only placeholder products
    SampleCustomer {
        name: "Placeholder Products LLC",
        email: "ops@placeholderproducts.com",
        address: "42 Empty Lane, Nowhere, NV 89001",
        account: "LUM007",
        no_products: true,
    },
    // Same name as LUM001, separate account
    SampleCustomer {
        name: "Acme Corporation",
        email: "billing@acmecorp.com",
        address: "77 Second Campus Way, Austin, TX 78702",
        account: "LUM008",
        no_products: false,
    },
];

/// Write the sample dataset as CSV, returning the number of data rows
pub fn write_sample(path: &Path) -> Result<usize> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create sample file: {}", path.display()))?;

    writer.write_record([
        COL_CUSTOMER_NAME,
        COL_EMAIL_ADDRESS,
        COL_PHYSICAL_ADDRESS,
        COL_ACCOUNT_NUMBER,
        COL_PRODUCT,
        COL_CONTRACT_END_DATE,
    ])?;

    let mut rows = 0;
    for (c_idx, customer) in CUSTOMERS.iter().enumerate() {
        for (p_idx, product) in PRODUCTS.iter().enumerate() {
            let (product, end_date) = if customer.no_products {
                (["", "None", "nan", "NaN"][p_idx], "")
            } else {
                (*product, END_DATES[(c_idx + p_idx) % END_DATES.len()])
            };

            writer.write_record([
                customer.name,
                customer.email,
                customer.address,
                customer.account,
                product,
                end_date,
            ])?;
            rows += 1;
        }
    }

    // A fully blank row, dropped silently
    writer.write_record(["", "", "", "", "", ""])?;
    rows += 1;

    writer.flush()?;
    tracing::info!(path = %path.display(), rows, "wrote sample data");
    Ok(rows)
}

// ============================================================================
// TESTS
// ============================================================================
