// Renewal Preview - Core Library
// Spreadsheet rows → customer aggregates → rendered emails → local preview

pub mod aggregate;
pub mod error;
pub mod loader;
pub mod logging;
pub mod record;
pub mod render;
pub mod sample;
pub mod server;
pub mod source;

// Re-export commonly used types
pub use aggregate::{aggregate, AggregateOutput};
pub use error::{LoadError, RenderError};
pub use loader::{load, load_table, LoadOutput};
pub use record::{
    is_placeholder, renewal_link, CleanedRow, CustomerAggregate, ProductEntry, RawRow,
    REQUIRED_COLUMNS,
};
pub use render::{render_all, write_emails, EmailRenderer, TemplateRenderer};
pub use server::{open_tabs, shutdown_signal, BoundServer, PreviewConfig, PreviewServer};
pub use source::{detect_format, get_reader, InputFormat, SheetReader, Table, TableRow};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
