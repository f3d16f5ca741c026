//! Shared builders for unit tests.

use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, FixedOffset};

use crate::document::{
    Customer, CustomerBuilder, Document, DocumentBuilder, DocumentType, LineItem, LineItemBuilder,
    Status,
};

pub(crate) fn created_at() -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339("2025-03-14T10:00:00+05:30").unwrap()
}

pub(crate) fn customer(name: &str) -> Customer {
    CustomerBuilder::default()
        .name(name)
        .address("12 MG Road, Pune")
        .phone("+91 98220 00000")
        .build()
        .unwrap()
}

pub(crate) fn item(id: &str, quantity: &str, rate: &str) -> LineItem {
    LineItemBuilder::default()
        .id(id)
        .description(format!("Item {id}"))
        .hsn_code("8471")
        .quantity(BigDecimal::from_str(quantity).unwrap())
        .rate(BigDecimal::from_str(rate).unwrap())
        .build()
        .unwrap()
}

/// An invoice for 2 x 500 + 3 x 250.50 at 9% + 9%, created 14-03-2025.
pub(crate) fn sample_document(number: &str) -> Document {
    DocumentBuilder::default()
        .document_type(DocumentType::Invoice)
        .document_number(number)
        .customer(customer("Acme Traders"))
        .add_line(item("1", "2", "500"))
        .add_line(item("2", "3", "250.50"))
        .created_at(created_at())
        .build()
        .unwrap()
}

/// A single-line document worth exactly `total` with no tax.
pub(crate) fn flat_document(
    id: i64,
    document_type: DocumentType,
    number: &str,
    total: &str,
    status: Status,
    created_at: &str,
) -> Document {
    DocumentBuilder::default()
        .id(id)
        .document_type(document_type)
        .document_number(number)
        .customer(customer("Globex"))
        .add_line(item("1", "1", total))
        .cgst_rate(0)
        .sgst_rate(0)
        .status(status)
        .created_at(DateTime::parse_from_rfc3339(created_at).unwrap())
        .build()
        .unwrap()
}
