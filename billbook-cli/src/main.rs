use std::{path::Path, process::Child, str::FromStr};

use bigdecimal::BigDecimal;
use billbook::{
    CompanySettings, DashboardStats, DocumentKind, DocumentPatch, DocumentStore, JsonFileStore,
    NumberingPolicy, amount_in_words,
    calc::round_to_rupees,
    document::format_date,
    error::AddContext,
    export, format_currency, generate_pdf, render_html, start_chromedriver,
};
use chrono::{DateTime, FixedOffset, Local};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, Draft, Report, SettingsCommand, read_input, write_output};

mod cli;

fn kill_chrome(chrome_process: &mut Child) -> Result<(), billbook::Error> {
    chrome_process
        .kill()
        .map_err(billbook::Error::from)
        .add_context("killing chromedriver process from cli")?;
    Ok(())
}

fn to_json(value: &impl serde::Serialize) -> Result<String, billbook::Error> {
    let mut json = serde_json::to_string_pretty(value)
        .map_err(billbook::Error::from)
        .add_context("serializing output")?;
    json.push('\n');
    Ok(json)
}

async fn print_pdf(
    store: &JsonFileStore,
    id: i64,
    kind: Option<DocumentKind>,
    out: Option<&Path>,
) -> Result<(), billbook::Error> {
    let document = store.find_document(id).add_context("printing pdf")?;
    let settings = store.settings_or_default()?;
    let mut chrome_process = start_chromedriver().add_context("starting chromedriver in cli")?;
    let data = generate_pdf(&document, &settings, kind)
        .await
        .or_else(|e| {
            kill_chrome(&mut chrome_process)?;
            Err(e)
        })
        .add_context(&format!("document id: {id}"))?;
    kill_chrome(&mut chrome_process)?;
    write_output(out, &data)
}

async fn run(cli: Cli, now: DateTime<FixedOffset>) -> Result<(), billbook::Error> {
    let mut store = JsonFileStore::new(&cli.data_dir);
    let policy = NumberingPolicy::default();
    debug!(data_dir = %store.dir().to_string_lossy(), "opened store");

    match cli.command {
        Command::NextNumber { kind } => {
            let existing = store.list_documents()?;
            println!("{}", policy.next_number(&existing, kind, now));
        }
        Command::Create { data } => {
            let raw = read_input(data.as_deref())?;
            let existing = store.list_documents()?;
            let document = Draft::parse(&raw)?
                .into_document(&policy, &existing, now)
                .add_context("creating document")?;
            store.save_document(document.clone())?;
            print!("{}", to_json(&document)?);
        }
        Command::List => {
            for d in store.list_documents()? {
                println!(
                    "{}\t{}\t{}\t{}\t{}\t{}",
                    d.id(),
                    d.document_number(),
                    format_date(d.issue_date()),
                    d.customer().name(),
                    format_currency(d.total_amount()),
                    d.status()
                );
            }
        }
        Command::Show { id } => {
            print!("{}", to_json(&store.find_document(id)?)?);
        }
        Command::SetStatus { id, status } => {
            let document = store.update_document(id, DocumentPatch::status(status))?;
            println!("{} is now {}", document.document_number(), document.status());
        }
        Command::Delete { id } => {
            store.delete_document(id)?;
        }
        Command::Words { amount } => {
            let amount = BigDecimal::from_str(&amount)
                .map_err(|e| billbook::Error::from(format!("'{amount}' is not a number: {e}")))?;
            println!("{}", amount_in_words(&round_to_rupees(&amount))?);
        }
        Command::Stats => {
            let stats = DashboardStats::compute(&store.list_documents()?, now);
            print!("{}", to_json(&stats)?);
        }
        Command::ExportCsv { report, id, out } => {
            let documents = store.list_documents()?;
            let csv = match report {
                Report::Documents => export::documents_csv(&documents)?,
                Report::Payments => export::payments_csv(&documents, now.date_naive())?,
                Report::Summary => export::summary_csv(&documents)?,
                Report::Items => {
                    let id = id.ok_or_else(|| {
                        billbook::Error::from(String::from("the items report needs --id"))
                    })?;
                    export::items_csv(&store.find_document(id)?)?
                }
            };
            write_output(out.as_deref(), csv.as_bytes())?;
        }
        Command::Html { id, kind, out } => {
            let document = store.find_document(id)?;
            let html = render_html(&document, &store.settings_or_default()?, kind)?;
            write_output(out.as_deref(), html.as_bytes())?;
        }
        Command::Pdf { id, kind, out } => {
            print_pdf(&store, id, kind, out.as_deref()).await?;
        }
        Command::Settings { command } => match command {
            SettingsCommand::Show => {
                print!("{}", to_json(&store.settings_or_default()?)?);
            }
            SettingsCommand::Set { data } => {
                let raw = read_input(data.as_deref())?;
                let settings: CompanySettings = serde_json::from_str(&raw)
                    .map_err(billbook::Error::from)
                    .add_context("parsing settings JSON")?;
                store.save_settings(settings)?;
            }
        },
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), billbook::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    run(cli, Local::now().fixed_offset())
        .await
        .add_context("running billbook")
}
