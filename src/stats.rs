//! Dashboard summary over a snapshot of documents.

use bigdecimal::BigDecimal;
use chrono::Datelike;
use serde::Serialize;

use crate::document::{Document, DocumentType, Status, serialize_bigdecimal};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardStats {
    pub total_invoices: usize,
    /// Sum of paid invoice totals
    #[serde(serialize_with = "serialize_bigdecimal")]
    pub total_revenue: BigDecimal,
    pub pending_invoices: usize,
    /// Paid invoices created in the month of `now`
    #[serde(serialize_with = "serialize_bigdecimal")]
    pub this_month_revenue: BigDecimal,
    pub total_quotations: usize,
    #[serde(serialize_with = "serialize_bigdecimal")]
    pub total_quotation_value: BigDecimal,
    pub pending_quotations: usize,
    #[serde(serialize_with = "serialize_bigdecimal")]
    pub this_month_quotation_value: BigDecimal,
}

fn total<'a>(documents: impl Iterator<Item = &'a Document>) -> BigDecimal {
    documents.map(Document::total_amount).sum()
}

impl DashboardStats {
    /// Summarize `documents`. `now` decides which calendar month counts as "this month".
    pub fn compute(documents: &[Document], now: impl Datelike) -> DashboardStats {
        let in_current_month = |d: &&Document| {
            let created = d.created_at();
            created.year() == now.year() && created.month() == now.month()
        };
        let of_type = |document_type: DocumentType| {
            documents
                .iter()
                .filter(move |d| d.document_type() == document_type)
        };
        let count_status = |document_type: DocumentType, status: Status| {
            of_type(document_type)
                .filter(|d| d.status() == status)
                .count()
        };

        DashboardStats {
            total_invoices: of_type(DocumentType::Invoice).count(),
            total_revenue: total(
                of_type(DocumentType::Invoice).filter(|d| d.status() == Status::Paid),
            ),
            pending_invoices: count_status(DocumentType::Invoice, Status::Pending),
            this_month_revenue: total(
                of_type(DocumentType::Invoice)
                    .filter(|d| d.status() == Status::Paid)
                    .filter(in_current_month),
            ),
            total_quotations: of_type(DocumentType::Quotation).count(),
            total_quotation_value: total(of_type(DocumentType::Quotation)),
            pending_quotations: count_status(DocumentType::Quotation, Status::Pending),
            this_month_quotation_value: total(
                of_type(DocumentType::Quotation).filter(in_current_month),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::fixtures::flat_document;

    #[test]
    fn empty_snapshot_is_all_zero() {
        let stats = DashboardStats::compute(&[], NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());
        assert_eq!(stats.total_invoices, 0);
        assert_eq!(stats.total_revenue, BigDecimal::from(0));
        assert_eq!(stats.this_month_quotation_value, BigDecimal::from(0));
    }

    #[test]
    fn splits_by_type_status_and_month() {
        let doc = |id: i64, document_type: DocumentType, total: &str, status: Status, created_at: &str| {
            let number = format!("DOC-{id}");
            flat_document(id, document_type, &number, total, status, created_at)
        };
        let docs = [
            doc(1, DocumentType::Invoice, "1000", Status::Paid, "2025-03-02T10:00:00+05:30"),
            doc(2, DocumentType::Invoice, "500", Status::Paid, "2025-02-20T10:00:00+05:30"),
            doc(3, DocumentType::Invoice, "700", Status::Pending, "2025-03-05T10:00:00+05:30"),
            doc(4, DocumentType::Invoice, "50", Status::Draft, "2025-03-06T10:00:00+05:30"),
            doc(5, DocumentType::Quotation, "300", Status::Pending, "2025-03-07T10:00:00+05:30"),
            doc(6, DocumentType::Quotation, "200", Status::Draft, "2024-03-07T10:00:00+05:30"),
        ];
        let stats = DashboardStats::compute(&docs, NaiveDate::from_ymd_opt(2025, 3, 15).unwrap());

        assert_eq!(stats.total_invoices, 4);
        assert_eq!(stats.total_revenue, BigDecimal::from(1500));
        assert_eq!(stats.pending_invoices, 1);
        assert_eq!(stats.this_month_revenue, BigDecimal::from(1000));
        assert_eq!(stats.total_quotations, 2);
        assert_eq!(stats.total_quotation_value, BigDecimal::from(500));
        assert_eq!(stats.pending_quotations, 1);
        assert_eq!(stats.this_month_quotation_value, BigDecimal::from(300));
    }
}
