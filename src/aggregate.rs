// Aggregator - one customer per account, products in row order
//
// Identity policy: name, email and address come from the first row of an
// account. Later rows that disagree are not merged; the disagreement is
// logged and the first row wins.

use crate::record::{renewal_link, CleanedRow, CustomerAggregate, ProductEntry};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AggregateOutput {
    /// Ordered by account id
    pub customers: Vec<CustomerAggregate>,
    /// Human-readable processing log, one line per account plus conflicts
    pub log: Vec<String>,
}

/// Group cleaned rows by account and build customer aggregates.
///
/// Pure: the same rows always produce the same output.
pub fn aggregate(rows: &[CleanedRow]) -> AggregateOutput {
    let mut groups: BTreeMap<&str, Vec<&CleanedRow>> = BTreeMap::new();
    for row in rows {
        groups.entry(row.account_id.as_str()).or_default().push(row);
    }

    let mut output = AggregateOutput::default();

    for (account_id, group) in groups {
        let Some(first) = group.first() else {
            continue;
        };

        let conflicts = identity_conflicts(first, &group[1..]);
        if !conflicts.is_empty() {
            output.log.push(format!(
                "Account {}: Conflicting identity fields ({}); using first row",
                account_id,
                conflicts.join(", ")
            ));
        }

        let products: Vec<ProductEntry> = group.iter().filter_map(|row| row.product()).collect();

        if products.is_empty() {
            tracing::debug!(account_id, rows = group.len(), "account has no valid products");
            output
                .log
                .push(format!("Account {}: Skipped - no valid products", account_id));
            continue;
        }

        output.log.push(format!(
            "Account {}: Processed {} with {} products",
            account_id,
            first.customer_name,
            products.len()
        ));

        output.customers.push(CustomerAggregate {
            customer_name: first.customer_name.clone(),
            email_address: first.email_address.clone(),
            account_id: account_id.to_string(),
            physical_address: first.physical_address.clone(),
            renewal_link: renewal_link(account_id),
            products,
        });
    }

    output
}

/// Identity fields where any later row differs from the first
fn identity_conflicts(first: &CleanedRow, rest: &[&CleanedRow]) -> Vec<&'static str> {
    let mut fields = Vec::new();
    if rest.iter().any(|r| r.customer_name != first.customer_name) {
        fields.push("customer name");
    }
    if rest.iter().any(|r| r.email_address != first.email_address) {
        fields.push("email address");
    }
    if rest.iter().any(|r| r.physical_address != first.physical_address) {
        fields.push("physical address");
    }
    fields
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_table;
    use crate::source::{Table, TableRow};

    fn row(name: &str, email: &str, addr: &str, acct: &str, product: &str, end: &str) -> CleanedRow {
        CleanedRow {
            customer_name: name.to_string(),
            email_address: email.to_string(),
            physical_address: addr.to_string(),
            account_id: acct.to_string(),
            product_name: product.to_string(),
            contract_end_date: end.to_string(),
            line_number: 0,
        }
    }

    fn acme(acct: &str, product: &str, end: &str) -> CleanedRow {
        row("Acme", "a@x.com", "1 St", acct, product, end)
    }

    #[test]
    fn test_two_products_one_customer() {
        let rows = vec![
            acme("A1", "VPN", "2025-03-01"),
            acme("A1", "DIA", ""),
        ];

        let out = aggregate(&rows);
        assert_eq!(out.customers.len(), 1);

        let c = &out.customers[0];
        assert_eq!(c.account_id, "A1");
        assert_eq!(c.customer_name, "Acme");
        assert_eq!(c.email_address, "a@x.com");
        assert_eq!(c.physical_address, "1 St");
        assert_eq!(c.renewal_link, "https://example.com/renew?acct=A1");
        assert_eq!(
            c.products,
            vec![
                ProductEntry {
                    name: "VPN".to_string(),
                    contract_end_date: "2025-03-01".to_string()
                },
                ProductEntry {
                    name: "DIA".to_string(),
                    contract_end_date: "N/A".to_string()
                },
            ]
        );
        assert_eq!(out.log, vec!["Account A1: Processed Acme with 2 products"]);
    }

    #[test]
    fn test_account_without_products_skipped() {
        let rows = vec![
            row("Bravo", "b@x.com", "2 St", "B2", "", "2025-01-01"),
            row("Bravo", "b@x.com", "2 St", "B2", "", ""),
        ];

        let out = aggregate(&rows);
        assert!(out.customers.is_empty());
        assert_eq!(out.log, vec!["Account B2: Skipped - no valid products"]);
    }

    #[test]
    fn test_placeholder_products_ignored() {
        let rows = vec![
            acme("A1", "", ""),
            acme("A1", "None", ""),
            acme("A1", "NaN", ""),
            acme("A1", "nan", ""),
            acme("A1", "VPN", "nan"),
        ];

        let out = aggregate(&rows);
        assert_eq!(out.customers[0].products.len(), 1);
        assert_eq!(out.customers[0].products[0].name, "VPN");
        assert_eq!(out.customers[0].products[0].contract_end_date, "N/A");
    }

    #[test]
    fn test_duplicate_products_kept_in_order() {
        let rows = vec![
            acme("A1", "VPN", "2025-03-01"),
            acme("A1", "DIA", "2025-04-01"),
            acme("A1", "VPN", "2025-03-01"),
        ];

        let out = aggregate(&rows);
        let names: Vec<&str> = out.customers[0]
            .products
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(names, vec!["VPN", "DIA", "VPN"]);
    }

    #[test]
    fn test_groups_sorted_by_account_rows_keep_encounter_order() {
        let rows = vec![
            acme("C3", "IOA", ""),
            acme("A1", "Wavelengths", ""),
            acme("C3", "DIA", ""),
            acme("B2", "VPN", ""),
            acme("A1", "VPN", ""),
        ];

        let out = aggregate(&rows);
        let accounts: Vec<&str> = out.customers.iter().map(|c| c.account_id.as_str()).collect();
        assert_eq!(accounts, vec!["A1", "B2", "C3"]);

        let a1: Vec<&str> = out.customers[0].products.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(a1, vec!["Wavelengths", "VPN"]);
        let c3: Vec<&str> = out.customers[2].products.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(c3, vec!["IOA", "DIA"]);
    }

    #[test]
    fn test_same_name_distinct_accounts_not_merged() {
        let rows = vec![
            acme("A1", "VPN", ""),
            row("Acme", "other@x.com", "9 Rd", "A2", "DIA", ""),
        ];

        let out = aggregate(&rows);
        assert_eq!(out.customers.len(), 2);
        assert_eq!(out.customers[0].account_id, "A1");
        assert_eq!(out.customers[1].account_id, "A2");
        assert_eq!(out.customers[1].email_address, "other@x.com");
    }

    #[test]
    fn test_numeric_looking_accounts_not_coalesced() {
        let rows = vec![acme("007", "VPN", ""), acme("7.0", "DIA", ""), acme("7", "IOA", "")];

        let out = aggregate(&rows);
        let accounts: Vec<&str> = out.customers.iter().map(|c| c.account_id.as_str()).collect();
        assert_eq!(accounts, vec!["007", "7", "7.0"]);
        assert_eq!(out.customers[0].renewal_link, "https://example.com/renew?acct=007");
    }

    #[test]
    fn test_first_row_identity_wins_and_conflict_logged() {
        let rows = vec![
            row("Acme", "a@x.com", "1 St", "A1", "VPN", ""),
            row("Acme Corp", "a@x.com", "2 St", "A1", "DIA", ""),
        ];

        let out = aggregate(&rows);
        let c = &out.customers[0];
        assert_eq!(c.customer_name, "Acme");
        assert_eq!(c.physical_address, "1 St");
        assert_eq!(
            out.log,
            vec![
                "Account A1: Conflicting identity fields (customer name, physical address); using first row",
                "Account A1: Processed Acme with 2 products",
            ]
        );
    }

    #[test]
    fn test_account_id_is_percent_encoded_in_link() {
        let out = aggregate(&[acme("A&B=1 2", "VPN", "")]);
        assert_eq!(
            out.customers[0].renewal_link,
            "https://example.com/renew?acct=A%26B%3D1%202"
        );
        assert_eq!(out.customers[0].account_id, "A&B=1 2");
    }

    #[test]
    fn test_aggregate_is_idempotent() {
        let rows = vec![
            acme("B2", "VPN", "2025-03-01"),
            acme("A1", "DIA", ""),
            row("Zed", "z@x.com", "3 St", "Z9", "", ""),
            acme("A1", "IOA", "2025-05-10"),
        ];

        let first = aggregate(&rows);
        let second = aggregate(&rows);
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_grouping_partitions_rows() {
        let rows = vec![
            acme("A1", "VPN", ""),
            acme("B2", "", ""),
            acme("A1", "DIA", ""),
            acme("C3", "IOA", ""),
            acme("B2", "none", ""),
        ];

        let out = aggregate(&rows);

        let skipped: Vec<&str> = out
            .log
            .iter()
            .filter_map(|line| {
                line.strip_prefix("Account ")?
                    .strip_suffix(": Skipped - no valid products")
            })
            .collect();
        assert_eq!(skipped, vec!["B2"]);

        // Every row's account is either retained once or skipped once, never both
        for r in &rows {
            let retained = out
                .customers
                .iter()
                .filter(|c| c.account_id == r.account_id)
                .count();
            let dropped = skipped.iter().filter(|a| **a == r.account_id).count();
            assert_eq!(retained + dropped, 1, "account {}", r.account_id);
        }

        let retained_products: usize = out.customers.iter().map(|c| c.products.len()).sum();
        let skipped_rows = rows
            .iter()
            .filter(|r| skipped.contains(&r.account_id.as_str()))
            .count();
        assert_eq!(retained_products + skipped_rows, rows.len());
    }

    #[test]
    fn test_empty_account_row_never_becomes_a_group() {
        let table = Table {
            headers: [
                "Customer Name",
                "Email Address",
                "Physical Address",
                "Account Number",
                "Product",
                "Contract End Date",
            ]
            .iter()
            .map(|h| h.to_string())
            .collect(),
            rows: vec![
                TableRow {
                    line: 2,
                    cells: ["Acme", "a@x.com", "1 St", "", "VPN", ""]
                        .iter()
                        .map(|c| c.to_string())
                        .collect(),
                },
                TableRow {
                    line: 3,
                    cells: ["Beta", "b@x.com", "2 St", "B1", "DIA", ""]
                        .iter()
                        .map(|c| c.to_string())
                        .collect(),
                },
            ],
        };

        let loaded = load_table(&table).unwrap();
        let out = aggregate(&loaded.rows);
        assert_eq!(out.customers.len(), 1);
        assert_eq!(out.customers[0].account_id, "B1");
        assert!(out.log.iter().all(|l| !l.starts_with("Account :")));
    }

    #[test]
    fn test_empty_input() {
        let out = aggregate(&[]);
        assert!(out.customers.is_empty());
        assert!(out.log.is_empty());
    }
}
