use std::{
    fs,
    io::{self, Read, Write},
    path::{Path, PathBuf},
};

use bigdecimal::BigDecimal;
use billbook::{
    Customer, Document, DocumentBuilder, DocumentKind, LineItem, NumberingPolicy, Status,
    document::{deserialize_optional_bigdecimal, parse_date},
    error::AddContext,
};
use chrono::{DateTime, FixedOffset, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Deserialize;

fn read_until_eof() -> io::Result<String> {
    let mut input = String::new();
    io::stdin().read_to_string(&mut input)?;
    Ok(input)
}

/// Read JSON input from `path`, or from stdin when no path is given.
pub fn read_input(path: Option<&Path>) -> Result<String, billbook::Error> {
    match path {
        Some(path) => fs::read_to_string(path)
            .map_err(billbook::Error::from)
            .add_context(&format!(
                "reading data from file '{}'",
                path.to_str().unwrap_or("UNKNOWN")
            )),
        None => read_until_eof()
            .map_err(billbook::Error::from)
            .add_context("reading data from stdin"),
    }
}

/// Write `bytes` to `out`, or to stdout when no path is given.
pub fn write_output(out: Option<&Path>, bytes: &[u8]) -> Result<(), billbook::Error> {
    match out {
        Some(path) => fs::write(path, bytes)
            .map_err(billbook::Error::from)
            .add_context(&format!("writing '{}'", path.to_string_lossy())),
        None => {
            let mut stdout = io::stdout();
            stdout
                .write_all(bytes)
                .map_err(billbook::Error::from)
                .add_context("writing to stdout")?;
            stdout
                .flush()
                .map_err(billbook::Error::from)
                .add_context("flushing stdout")
        }
    }
}

#[derive(Debug, Parser)]
#[command(about = "Invoices and quotations with CGST/SGST")]
pub struct Cli {
    /// Directory holding documents.json and settings.json
    #[arg(long, env = "BILLBOOK_DATA_DIR", default_value = "billbook-data")]
    pub data_dir: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the number the next document of KIND would get
    NextNumber { kind: DocumentKind },

    /// Create a document from a JSON draft and print it
    Create {
        /// Path to the JSON draft, stdin when omitted
        #[arg(short, long)]
        data: Option<PathBuf>,
    },

    /// List stored documents
    List,

    /// Print one document as JSON
    Show { id: i64 },

    /// Change the status of a document
    SetStatus { id: i64, status: Status },

    /// Permanently delete a document
    Delete { id: i64 },

    /// Spell an amount in words, rounded to whole rupees
    Words { amount: String },

    /// Print dashboard statistics as JSON
    Stats,

    /// Export a CSV report
    ExportCsv {
        #[arg(value_enum)]
        report: Report,

        /// Document id, required by the items report
        #[arg(long)]
        id: Option<i64>,

        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Render a document as HTML
    Html {
        id: i64,

        /// Print the document under another heading, e.g. purchase-order
        #[arg(long)]
        kind: Option<DocumentKind>,

        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Print a document to PDF through chromedriver
    Pdf {
        id: i64,

        #[arg(long)]
        kind: Option<DocumentKind>,

        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Show or replace the company settings
    Settings {
        #[command(subcommand)]
        command: SettingsCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum SettingsCommand {
    Show,
    /// Replace settings with a JSON object; missing fields use the defaults
    Set {
        #[arg(short, long)]
        data: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Report {
    Documents,
    Items,
    Payments,
    Summary,
}

fn default_kind() -> DocumentKind {
    DocumentKind::Invoice
}

/// Input for `create`. Everything derived (number, id, totals) is filled in on creation.
#[derive(Debug, Deserialize)]
pub struct Draft {
    #[serde(default = "default_kind")]
    pub kind: DocumentKind,
    pub customer: Customer,
    #[serde(default)]
    pub items: Vec<LineItem>,
    #[serde(default, deserialize_with = "deserialize_optional_bigdecimal")]
    pub cgst_rate: Option<BigDecimal>,
    #[serde(default, deserialize_with = "deserialize_optional_bigdecimal")]
    pub sgst_rate: Option<BigDecimal>,
    /// `dd-mm-yyyy`
    #[serde(default)]
    pub issue_date: Option<String>,
    /// `dd-mm-yyyy`
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub po_number: Option<String>,
    #[serde(default)]
    pub status: Option<Status>,
}

fn parse_draft_date(field: &str, value: &str) -> Result<NaiveDate, billbook::Error> {
    parse_date(value).map_err(|e| {
        billbook::Error::from(format!("invalid {field} '{value}', expected dd-mm-yyyy: {e}"))
    })
}

impl Draft {
    pub fn parse(raw: &str) -> Result<Draft, billbook::Error> {
        serde_json::from_str(raw)
            .map_err(billbook::Error::from)
            .add_context("parsing document draft")
    }

    /// Number and build the document against the documents already stored.
    pub fn into_document(
        self,
        policy: &NumberingPolicy,
        existing: &[Document],
        now: DateTime<FixedOffset>,
    ) -> Result<Document, billbook::Error> {
        let number = policy.next_number(existing, self.kind, now);
        let mut builder = DocumentBuilder::default()
            .document_type(policy.storage_type(self.kind))
            .document_number(number)
            .customer(self.customer)
            .created_at(now);
        for item in self.items {
            builder = builder.add_line(item);
        }
        if let Some(rate) = self.cgst_rate {
            builder = builder.cgst_rate(rate);
        }
        if let Some(rate) = self.sgst_rate {
            builder = builder.sgst_rate(rate);
        }
        if let Some(date) = self.issue_date {
            builder = builder.issue_date(parse_draft_date("issue date", &date)?);
        }
        if let Some(date) = self.due_date {
            builder = builder.due_date(parse_draft_date("due date", &date)?);
        }
        if let Some(po_number) = self.po_number {
            builder = builder.po_number(po_number);
        }
        if let Some(status) = self.status {
            builder = builder.status(status);
        }
        builder
            .build()
            .map_err(|e| billbook::Error::from(e.to_string()))
            .add_context("building document")
    }
}
