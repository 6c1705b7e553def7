use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use renewal_preview::logging::init_logging;
use renewal_preview::sample::write_sample;
use renewal_preview::{
    aggregate, load, open_tabs, render_all, shutdown_signal, write_emails, AggregateOutput,
    PreviewConfig, PreviewServer, TemplateRenderer,
};

#[derive(Parser)]
#[command(name = "renewal-preview", version)]
#[command(about = "Preview personalized renewal emails in the browser (no files needed)")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Input spreadsheet (.xlsx, .xls, .ods or .csv)
    #[arg(long, default_value = "customers.xlsx")]
    input: PathBuf,

    /// Sheet to read from a workbook (ignored for CSV)
    #[arg(long, default_value = "Sheet1")]
    sheet: String,

    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    #[arg(long, default_value_t = 8000)]
    port: u16,

    /// Don't open browser tabs
    #[arg(long)]
    no_open: bool,

    /// Preview only the first N customers (N >= 1)
    #[arg(long)]
    limit: Option<NonZeroUsize>,

    /// Also write each rendered email to this directory
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Export customer records as JSON
    #[arg(long)]
    json: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a sample customers CSV covering the common edge cases
    Sample {
        #[arg(short, long, default_value = "customers.csv")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match &cli.command {
        Some(Commands::Sample { output }) => run_sample(output),
        None => run_preview(&cli).await,
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_sample(output: &Path) -> Result<ExitCode> {
    let rows = write_sample(output)?;
    println!("✓ Created sample file: {} ({} rows)", output.display(), rows);
    println!("  Preview with: renewal-preview --input {}", output.display());
    Ok(ExitCode::SUCCESS)
}

async fn run_preview(cli: &Cli) -> Result<ExitCode> {
    // 1. Load and clean
    let loaded = load(&cli.input, &cli.sheet)?;
    for warning in &loaded.warnings {
        println!("Warning: {}", warning);
    }

    // 2. Group into customers
    let mut processed = aggregate(&loaded.rows);
    if let Some(limit) = cli.limit {
        apply_limit(&mut processed, limit);
    }
    if processed.customers.is_empty() {
        for line in &processed.log {
            println!("- {}", line);
        }
        println!("No valid customers found.");
        return Ok(ExitCode::FAILURE);
    }
    let customers = processed.customers;

    if let Some(path) = &cli.json {
        let json = serde_json::to_string_pretty(&customers)?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write JSON export: {}", path.display()))?;
        println!("✓ Exported {} customers to {}", customers.len(), path.display());
    }

    // 3. Render
    let emails = render_all(&TemplateRenderer::new(), &customers)?;

    if let Some(dir) = &cli.out_dir {
        let written = write_emails(dir, &customers, &emails)?;
        println!("✓ Wrote {} email files to {}", written.len(), dir.display());
    }

    // 4. Serve and open tabs
    let config = PreviewConfig {
        host: cli.host.clone(),
        port: cli.port,
        open_browser: !cli.no_open,
    };

    let server = PreviewServer::new(emails);
    let bound = server.bind(&config.bind_addr()).await?;
    let base_url = bound.base_url();

    let opened = if config.open_browser {
        open_tabs(&base_url, server.len())
    } else {
        0
    };

    println!("\nSummary");
    println!("Rows in input: {}", loaded.total_rows);
    println!("Customers processed: {}", customers.len());
    println!("Browser tabs opened: {}", opened);
    println!("Server running at: {}/ (Ctrl+C to stop)", base_url);
    for line in &processed.log {
        println!("- {}", line);
    }

    bound.serve_until(shutdown_signal()).await?;
    println!("\nShutting down server.");

    Ok(ExitCode::SUCCESS)
}

/// Keep the first `limit` customers, noting the cut in the log
fn apply_limit(processed: &mut AggregateOutput, limit: NonZeroUsize) {
    let limit = limit.get();
    if processed.customers.len() > limit {
        processed.customers.truncate(limit);
        processed
            .log
            .push(format!("Limited preview to first {} customers", limit));
    }
}

// ============================================================================
// TESTS
// ============================================================================
