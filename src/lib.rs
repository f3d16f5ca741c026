//! Document numbering and GST arithmetic for small-business invoices and quotations
//!
//! The core of this crate is two sets of pure functions:
//! - [`numbering`] derives the next `<PREFIX>-<YEAR>-<seq>` number for a new document from the
//!   numbers already issued.
//! - [`calc`] and [`words`] compute line amounts, subtotal, CGST/SGST, grand total, currency
//!   strings and the grand total spelled out in the Indian numbering system.
//!
//! Around them sit the [`Document`] model, a [`DocumentStore`] for persistence, CSV reports in
//! [`export`], [`DashboardStats`] and HTML/PDF rendering of a document with the issuing company's
//! [`CompanySettings`].
//!
//! # Example
//!
//! ```rust
//! use billbook::{
//!     CustomerBuilder, DocumentBuilder, DocumentKind, LineItemBuilder, NumberingPolicy,
//! };
//!
//! let now = chrono::DateTime::parse_from_rfc3339("2025-03-14T10:00:00+05:30").unwrap();
//! let policy = NumberingPolicy::default();
//! let number = policy.next_number(&[], DocumentKind::Invoice, now);
//! assert_eq!(number, "INV-2025-001");
//!
//! let doc = DocumentBuilder::default()
//!     .document_type(policy.storage_type(DocumentKind::Invoice))
//!     .document_number(number)
//!     .customer(CustomerBuilder::default().name("Acme Traders").build().unwrap())
//!     .add_line(
//!         LineItemBuilder::default()
//!             .id("1")
//!             .description("Steel bracket")
//!             .quantity(10)
//!             .rate(100)
//!             .build().unwrap())
//!     .created_at(now)
//!     .build().unwrap();
//! assert_eq!(doc.amount_in_words(), "RUPEES ONE THOUSAND ONE HUNDRED EIGHTY ONLY");
//! ```

pub mod calc;
pub mod document;
pub mod error;
pub mod export;
pub mod numbering;
pub mod settings;
pub mod stats;
pub mod store;
pub mod template_env;
pub mod words;

#[cfg(test)]
mod fixtures;

use std::{
    net::TcpListener,
    process::{Child, Command, Stdio},
    thread,
    time::Duration,
};

use base64::{Engine, engine::general_purpose};
pub use calc::{Totals, format_currency, grand_total, line_amount, subtotal, tax_amount};
pub use document::{
    Customer, CustomerBuilder, CustomerBuilderError, Document, DocumentBuilder,
    DocumentBuilderError, DocumentKind, DocumentPatch, DocumentType, LineItem, LineItemBuilder,
    LineItemBuilderError, Status,
};
pub use error::{Error, ValidationError};
pub use numbering::NumberingPolicy;
pub use settings::{CompanySettings, CompanySettingsBuilder, CompanySettingsBuilderError};
pub use stats::DashboardStats;
pub use store::{DocumentStore, JsonFileStore, MemoryStore};
pub use words::{amount_in_words, number_to_words};

use error::AddContext;
use fantoccini::{
    Client, ClientBuilder,
    wd::{PrintConfigurationBuilder, PrintMargins, PrintSize},
};
use serde_json::Map;
use tracing::{debug, info};

use crate::template_env::{render_template, setup_template_env};

const CHROMEDRIVER_PORT: u16 = 4444;

/// Spawn `chromedriver` on port 4444 and wait until it accepts connections.
///
/// The caller owns the returned process and should kill it once done printing.
pub fn start_chromedriver() -> Result<Child, crate::Error> {
    if is_port_in_use(CHROMEDRIVER_PORT) {
        return Err(
            crate::Error::from(format!("Port {CHROMEDRIVER_PORT} is already in use"))
                .add_context("starting chromedriver"),
        );
    }

    let mut child = Command::new("chromedriver")
        .arg(format!("--port={CHROMEDRIVER_PORT}"))
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(crate::Error::from)
        .add_context("starting chromedriver")?;

    for _ in 0..100 {
        if is_port_in_use(CHROMEDRIVER_PORT) {
            debug!(pid = child.id(), "chromedriver is listening");
            return Ok(child);
        }

        if child
            .try_wait()
            .map_err(crate::Error::from)
            .add_context("starting chromedriver")?
            .is_some()
        {
            return Err(
                crate::Error::from(String::from("Chromedriver has stopped unexpectedly"))
                    .add_context("starting chromedriver"),
            );
        }

        thread::sleep(Duration::from_millis(10));
    }

    if !is_port_in_use(CHROMEDRIVER_PORT) {
        child
            .kill()
            .map_err(crate::Error::from)
            .add_context("starting chromedriver")?;
        return Err(crate::Error::from(format!(
            "Chromedriver failed to bind to port {CHROMEDRIVER_PORT}"
        ))
        .add_context("starting chromedriver"));
    }

    Ok(child)
}

fn is_port_in_use(port: u16) -> bool {
    TcpListener::bind(format!("localhost:{port}")).is_err()
}

async fn connect_to_client() -> Result<Client, fantoccini::error::NewSessionError> {
    let mut caps = Map::new();
    caps.insert(
        "goog:chromeOptions".to_string(),
        serde_json::json!({
            "args": ["--headless"]
        }),
    );
    ClientBuilder::native()
        .capabilities(caps)
        .connect(&format!("http://localhost:{CHROMEDRIVER_PORT}"))
        .await
}

/// Render `document` to a standalone HTML page.
///
/// The heading is the title of `kind` when given, so a stored invoice can be printed as a
/// purchase order or performa invoice; otherwise it is the stored [`DocumentType`].
///
/// # Errors
/// Returns `Err(crate::Error)` if the template environment cannot be set up or rendering fails.
pub fn render_html(
    document: &Document,
    settings: &CompanySettings,
    kind: Option<DocumentKind>,
) -> Result<String, crate::Error> {
    let title = kind
        .map(|k| k.title())
        .unwrap_or_else(|| document.document_type().as_str());
    let template_env = setup_template_env()
        .map_err(crate::Error::from)
        .add_context("setting up templating environment")?;
    render_template(&template_env, document, settings, title)
        .map_err(crate::Error::from)
        .add_context("rendering html template")
}

/// Generate an A4 PDF byte array from a [`Document`]
///
/// This renders the document with [`render_html`], navigates a headless browser to the rendered
/// HTML, prints the page as a PDF and returns the resulting bytes. A chromedriver must already be
/// listening on port 4444, see [`start_chromedriver`].
///
/// # Errors
///
/// Returns `Err(crate::Error)` if any step fails:
/// - connecting to the headless browser [`Client`]
/// - rendering the HTML template
/// - navigating the browser to the generated data URL
/// - configuring the print job or printing to PDF
pub async fn generate_pdf(
    document: &Document,
    settings: &CompanySettings,
    kind: Option<DocumentKind>,
) -> Result<Vec<u8>, crate::Error> {
    let client = connect_to_client()
        .await
        .map_err(crate::Error::from)
        .add_context("connecting to client")
        .add_context("generating pdf")?;
    let render = render_html(document, settings, kind).add_context("generating pdf")?;
    let encoded = general_purpose::STANDARD.encode(render.as_bytes());
    let data_url = format!("data:text/html;base64,{encoded}");
    client
        .goto(&data_url)
        .await
        .map_err(crate::Error::from)
        .add_context("navigating to address")
        .add_context("printing pdf")?;
    let pdf = client
        .print(
            PrintConfigurationBuilder::default()
                .margins(PrintMargins {
                    top: 0.5,
                    left: 0.5,
                    right: 0.5,
                    bottom: 0.5,
                })
                .size(PrintSize::A4)
                .build()
                .map_err(crate::Error::from)
                .add_context("configuring printer")
                .add_context("printing pdf")?,
        )
        .await
        .map_err(crate::Error::from)
        .add_context("printing pdf")?;
    info!(
        number = document.document_number(),
        bytes = pdf.len(),
        "pdf generated"
    );
    Ok(pdf)
}
