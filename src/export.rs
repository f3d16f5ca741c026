//! CSV reports over stored documents.
//!
//! Each function returns the complete CSV text, header row first. Money columns are rounded
//! half-up to two decimal places; missing customer contact details are written as `-`.

use bigdecimal::BigDecimal;
use chrono::NaiveDate;

use crate::{
    Error,
    calc::format_amount,
    document::{Document, Status, format_date},
    error::AddContext,
};

const MISSING: &str = "-";

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<String, Error> {
    let bytes = writer
        .into_inner()
        .map_err(|e| Error::from(e.into_error()))
        .add_context("flushing csv writer")?;
    String::from_utf8(bytes).map_err(|e| Error::from(e.to_string()))
}

/// Whole days between `due_date` and `today`, or zero if the document is not yet due.
pub fn days_overdue(due_date: NaiveDate, today: NaiveDate) -> i64 {
    (today - due_date).num_days().max(0)
}

/// One row per document.
pub fn documents_csv(documents: &[Document]) -> Result<String, Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "Document #",
        "Type",
        "Date",
        "Due Date",
        "Customer",
        "Customer Email",
        "Customer Phone",
        "Subtotal",
        "CGST (%)",
        "SGST (%)",
        "Total GST",
        "Total Amount",
        "Status",
        "Items Count",
        "Created On",
    ])?;
    for d in documents {
        let customer = d.customer();
        writer.write_record([
            d.document_number().to_string(),
            d.document_type().to_string(),
            format_date(d.issue_date()),
            format_date(d.due_date()),
            customer.name().to_string(),
            customer.email().unwrap_or(MISSING).to_string(),
            customer.phone().unwrap_or(MISSING).to_string(),
            format_amount(d.subtotal()),
            d.cgst_rate().to_string(),
            d.sgst_rate().to_string(),
            format_amount(d.total_tax()),
            format_amount(d.total_amount()),
            d.status().to_string(),
            d.line_items().len().to_string(),
            d.created_at().to_rfc3339(),
        ])?;
    }
    finish(writer).add_context("exporting documents csv")
}

/// One row per line item of `document`.
pub fn items_csv(document: &Document) -> Result<String, Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "Document #",
        "Description",
        "HSN",
        "Unit",
        "Quantity",
        "Rate",
        "Amount",
        "Customer",
        "Date",
    ])?;
    for item in document.line_items() {
        writer.write_record([
            document.document_number().to_string(),
            item.description().to_string(),
            item.hsn_code().to_string(),
            item.unit().to_string(),
            item.quantity().to_string(),
            format_amount(item.rate()),
            format_amount(item.amount()),
            document.customer().name().to_string(),
            format_date(document.issue_date()),
        ])?;
    }
    finish(writer).add_context("exporting items csv")
}

/// Pending and paid documents with how long each has been overdue as of `today`.
pub fn payments_csv(documents: &[Document], today: NaiveDate) -> Result<String, Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "Document #",
        "Type",
        "Customer",
        "Due Date",
        "Amount Due",
        "Status",
        "Days Overdue",
        "Email",
    ])?;
    for d in documents
        .iter()
        .filter(|d| matches!(d.status(), Status::Pending | Status::Paid))
    {
        writer.write_record([
            d.document_number().to_string(),
            d.document_type().to_string(),
            d.customer().name().to_string(),
            format_date(d.due_date()),
            format_amount(d.total_amount()),
            d.status().to_string(),
            days_overdue(d.due_date(), today).to_string(),
            d.customer().email().unwrap_or(MISSING).to_string(),
        ])?;
    }
    finish(writer).add_context("exporting payments csv")
}

/// Headline figures followed by a short listing of every document.
pub fn summary_csv(documents: &[Document]) -> Result<String, Error> {
    let sum_with_status = |status: Status| {
        documents
            .iter()
            .filter(|d| d.status() == status)
            .map(Document::total_amount)
            .sum::<BigDecimal>()
    };

    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(Vec::new());
    writer.write_record(["INVOICE SUMMARY", ""])?;
    writer.write_record(["Total Documents".to_string(), documents.len().to_string()])?;
    writer.write_record([
        "Total Revenue".to_string(),
        format_amount(&sum_with_status(Status::Paid)),
    ])?;
    writer.write_record([
        "Pending Amount".to_string(),
        format_amount(&sum_with_status(Status::Pending)),
    ])?;
    writer.write_record(["", ""])?;
    writer.write_record([
        "Document #",
        "Type",
        "Date",
        "Customer",
        "Total Amount",
        "Status",
    ])?;
    for d in documents {
        writer.write_record([
            d.document_number().to_string(),
            d.document_type().to_string(),
            format_date(d.issue_date()),
            d.customer().name().to_string(),
            format_amount(d.total_amount()),
            d.status().to_string(),
        ])?;
    }
    finish(writer).add_context("exporting summary csv")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        document::DocumentType,
        fixtures::{flat_document, sample_document},
    };

    fn lines(csv: &str) -> Vec<&str> {
        csv.lines().collect()
    }

    #[test]
    fn overdue_days_never_go_negative() {
        let due = NaiveDate::from_ymd_opt(2025, 4, 13).unwrap();
        assert_eq!(days_overdue(due, NaiveDate::from_ymd_opt(2025, 4, 20).unwrap()), 7);
        assert_eq!(days_overdue(due, NaiveDate::from_ymd_opt(2025, 4, 1).unwrap()), 0);
    }

    #[test]
    fn documents_report_rounds_money_and_fills_missing_contacts() {
        let csv = documents_csv(&[sample_document("INV-2025-001")]).unwrap();
        let rows = lines(&csv);
        assert_eq!(rows.len(), 2);
        assert!(rows[0].starts_with("Document #,Type,Date,Due Date,Customer"));
        assert_eq!(
            rows[1],
            "INV-2025-001,INVOICE,14-03-2025,13-04-2025,Acme Traders,-,+91 98220 00000,\
             1751.50,9,9,315.27,2066.77,Pending,2,2025-03-14T10:00:00+05:30"
        );
    }

    #[test]
    fn items_report_has_one_row_per_line() {
        let csv = items_csv(&sample_document("INV-2025-001")).unwrap();
        let rows = lines(&csv);
        assert_eq!(rows.len(), 3);
        assert_eq!(
            rows[2],
            "INV-2025-001,Item 2,8471,Pcs,3,250.50,751.50,Acme Traders,14-03-2025"
        );
    }

    #[test]
    fn payments_report_skips_drafts() {
        let docs = [
            flat_document(1, DocumentType::Invoice, "INV-2025-001", "100", Status::Pending, "2025-01-01T10:00:00+05:30"),
            flat_document(2, DocumentType::Invoice, "INV-2025-002", "100", Status::Draft, "2025-01-01T10:00:00+05:30"),
            flat_document(3, DocumentType::Invoice, "INV-2025-003", "100", Status::Paid, "2025-01-01T10:00:00+05:30"),
        ];
        // due 31-01-2025
        let csv = payments_csv(&docs, NaiveDate::from_ymd_opt(2025, 2, 10).unwrap()).unwrap();
        let rows = lines(&csv);
        assert_eq!(rows.len(), 3);
        assert_eq!(
            rows[1],
            "INV-2025-001,INVOICE,Globex,31-01-2025,100.00,Pending,10,-"
        );
        assert!(rows[2].starts_with("INV-2025-003,"));
    }

    #[test]
    fn empty_summary_keeps_two_decimals() {
        let csv = summary_csv(&[]).unwrap();
        let rows = lines(&csv);
        assert_eq!(rows[1], "Total Documents,0");
        assert_eq!(rows[2], "Total Revenue,0.00");
        assert_eq!(rows[3], "Pending Amount,0.00");
    }

    #[test]
    fn zero_rate_documents_print_zero_tax_with_decimals() {
        let doc = flat_document(1, DocumentType::Invoice, "INV-2025-001", "0", Status::Pending, "2025-01-01T10:00:00+05:30");
        let csv = documents_csv(&[doc]).unwrap();
        assert!(lines(&csv)[1].contains(",0.00,0,0,0.00,0.00,Pending,"));
    }

    #[test]
    fn summary_report_totals_by_status() {
        let docs = [
            flat_document(1, DocumentType::Invoice, "INV-2025-001", "100.10", Status::Paid, "2025-01-01T10:00:00+05:30"),
            flat_document(2, DocumentType::Quotation, "QUO-2025-001", "40", Status::Pending, "2025-01-01T10:00:00+05:30"),
        ];
        let csv = summary_csv(&docs).unwrap();
        let rows = lines(&csv);
        assert_eq!(rows[0], "INVOICE SUMMARY,");
        assert_eq!(rows[1], "Total Documents,2");
        assert_eq!(rows[2], "Total Revenue,100.10");
        assert_eq!(rows[3], "Pending Amount,40.00");
        assert_eq!(rows[5], "Document #,Type,Date,Customer,Total Amount,Status");
        assert_eq!(rows.len(), 8);
    }
}
