use std::str::FromStr;

use bigdecimal::BigDecimal;
use minijinja::{ErrorKind, context};

use crate::{calc::format_currency, document::Document, settings::CompanySettings};

/// Line item rows printed on one A4 page before the table continues on the next.
pub const ROWS_PER_PAGE: usize = 21;

const DOCUMENT_TEMPLATE: &str = "document.html";

/// Template filter turning a serialized decimal string into `₹ 0.00` form.
fn currency(value: String) -> Result<String, minijinja::Error> {
    BigDecimal::from_str(&value)
        .map(|amount| format_currency(&amount))
        .map_err(|e| {
            minijinja::Error::new(
                ErrorKind::InvalidOperation,
                format!("'{value}' is not a decimal amount: {e}"),
            )
        })
}

pub fn setup_template_env() -> Result<minijinja::Environment<'static>, minijinja::Error> {
    let mut env = minijinja::Environment::new();
    env.add_template(
        DOCUMENT_TEMPLATE,
        include_str!("../templates/document.html"),
    )?;
    env.add_filter("currency", currency);
    Ok(env)
}

/// Render `document` as a printable HTML page headed with `title`.
///
/// Line items are split into pages of [`ROWS_PER_PAGE`]; the tax table, amount in words, bank
/// details and terms follow the last page. A document without line items still renders one page.
pub fn render_template(
    env: &minijinja::Environment<'static>,
    document: &Document,
    settings: &CompanySettings,
    title: &str,
) -> Result<String, minijinja::Error> {
    let template = env.get_template(DOCUMENT_TEMPLATE)?;
    let mut pages: Vec<_> = document.line_items().chunks(ROWS_PER_PAGE).collect();
    if pages.is_empty() {
        pages.push(&[]);
    }
    template.render(context! {
        title => title,
        document => document,
        settings => settings,
        pages => pages,
        rows_per_page => ROWS_PER_PAGE,
    })
}
