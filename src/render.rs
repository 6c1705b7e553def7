// Email rendering - compiled askama template per customer

use crate::error::RenderError;
use crate::record::{CustomerAggregate, ProductEntry};
use anyhow::{Context, Result};
use askama::Template;
use std::fs;
use std::path::{Path, PathBuf};

/// Turns one customer into an HTML document.
///
/// The preview server only sees the resulting strings, so any renderer can be
/// swapped in here.
pub trait EmailRenderer: Send + Sync {
    fn render(&self, customer: &CustomerAggregate) -> Result<String, RenderError>;
}

/// Fields handed to `templates/renewal_email.html`
#[derive(Template)]
#[template(path = "renewal_email.html")]
struct RenewalEmail<'a> {
    customer_name: &'a str,
    account_id: &'a str,
    renewal_link: &'a str,
    physical_address: &'a str,
    products: &'a [ProductEntry],
}

/// Default renderer using the built-in renewal template
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateRenderer;

impl TemplateRenderer {
    pub fn new() -> Self {
        TemplateRenderer
    }
}

impl EmailRenderer for TemplateRenderer {
    fn render(&self, customer: &CustomerAggregate) -> Result<String, RenderError> {
        let email = RenewalEmail {
            customer_name: &customer.customer_name,
            account_id: &customer.account_id,
            renewal_link: &customer.renewal_link,
            physical_address: &customer.physical_address,
            products: &customer.products,
        };

        email.render().map_err(|source| RenderError::Template {
            account_id: customer.account_id.clone(),
            source,
        })
    }
}

/// Render every customer, keeping input order
pub fn render_all(
    renderer: &dyn EmailRenderer,
    customers: &[CustomerAggregate],
) -> Result<Vec<String>, RenderError> {
    customers.iter().map(|c| renderer.render(c)).collect()
}

// ============================================================================
// FILE OUTPUT
// ============================================================================

/// Filesystem-friendly fragment: spaces become underscores, max 30 chars
pub fn simple_filename(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            ' ' => '_',
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '-',
            other => other,
        })
        .take(30)
        .collect()
}

pub fn output_filename(customer: &CustomerAggregate) -> String {
    format!(
        "customer_{}_{}.html",
        simple_filename(&customer.customer_name),
        simple_filename(&customer.account_id)
    )
}

/// Write rendered emails next to each other in `dir`, returning the paths
pub fn write_emails(
    dir: &Path,
    customers: &[CustomerAggregate],
    emails: &[String],
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;

    let mut written = Vec::with_capacity(emails.len());
    for (customer, html) in customers.iter().zip(emails) {
        let path = dir.join(output_filename(customer));
        fs::write(&path, html)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        tracing::debug!(path = %path.display(), "wrote email");
        written.push(path);
    }

    Ok(written)
}

// ============================================================================
// TESTS
// ============================================================================
