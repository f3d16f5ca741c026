//! Sequential document numbers of the form `<PREFIX>-<YEAR>-<sequence>`.
//!
//! Numbering is derived from a snapshot of existing documents supplied by the caller. Nothing here
//! reads the clock or touches storage, so two callers that read the same snapshot will compute
//! the same number. Guarding against that race is up to whoever persists the result.

use chrono::Datelike;
use tracing::debug;

use crate::document::{Document, DocumentKind, DocumentType};

/// How one [`DocumentKind`] is stored and numbered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindRule {
    pub storage_type: DocumentType,
    pub prefix: String,
}

impl KindRule {
    fn new(storage_type: DocumentType, prefix: &str) -> Self {
        KindRule {
            storage_type,
            prefix: prefix.to_string(),
        }
    }
}

/// Mapping from the kind of document a user creates to the type it is stored as and the prefix
/// its numbers use.
///
/// The default stores purchase orders and performa invoices as invoices and numbers them from
/// the `INV` sequence. Give them their own prefix with [`NumberingPolicy::with_rule`] to keep
/// their sequences apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberingPolicy {
    invoice: KindRule,
    quotation: KindRule,
    purchase_order: KindRule,
    performa_invoice: KindRule,
}

impl Default for NumberingPolicy {
    fn default() -> Self {
        NumberingPolicy {
            invoice: KindRule::new(DocumentType::Invoice, "INV"),
            quotation: KindRule::new(DocumentType::Quotation, "QUO"),
            purchase_order: KindRule::new(DocumentType::Invoice, "INV"),
            performa_invoice: KindRule::new(DocumentType::Invoice, "INV"),
        }
    }
}

impl NumberingPolicy {
    /// Replace the rule for `kind`.
    ///
    /// # Example
    /// ```rust
    /// use billbook::{DocumentKind, DocumentType, NumberingPolicy};
    ///
    /// let policy = NumberingPolicy::default()
    ///     .with_rule(DocumentKind::PurchaseOrder, DocumentType::Invoice, "PO");
    /// assert_eq!(policy.prefix(DocumentKind::PurchaseOrder), "PO");
    /// assert_eq!(policy.storage_type(DocumentKind::PurchaseOrder), DocumentType::Invoice);
    /// ```
    pub fn with_rule(
        mut self,
        kind: DocumentKind,
        storage_type: DocumentType,
        prefix: impl Into<String>,
    ) -> Self {
        *self.rule_mut(kind) = KindRule {
            storage_type,
            prefix: prefix.into(),
        };
        self
    }

    pub fn rule(&self, kind: DocumentKind) -> &KindRule {
        match kind {
            DocumentKind::Invoice => &self.invoice,
            DocumentKind::Quotation => &self.quotation,
            DocumentKind::PurchaseOrder => &self.purchase_order,
            DocumentKind::PerformaInvoice => &self.performa_invoice,
        }
    }

    fn rule_mut(&mut self, kind: DocumentKind) -> &mut KindRule {
        match kind {
            DocumentKind::Invoice => &mut self.invoice,
            DocumentKind::Quotation => &mut self.quotation,
            DocumentKind::PurchaseOrder => &mut self.purchase_order,
            DocumentKind::PerformaInvoice => &mut self.performa_invoice,
        }
    }

    pub fn prefix(&self, kind: DocumentKind) -> &str {
        &self.rule(kind).prefix
    }

    /// The [`DocumentType`] a document of this kind is persisted as.
    pub fn storage_type(&self, kind: DocumentKind) -> DocumentType {
        self.rule(kind).storage_type
    }

    /// Compute the next unused number for `kind` in the calendar year of `now`.
    ///
    /// # Example
    /// ```rust
    /// use chrono::NaiveDate;
    /// use billbook::{DocumentKind, NumberingPolicy};
    ///
    /// let now = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
    /// let number = NumberingPolicy::default().next_number(&[], DocumentKind::Invoice, now);
    /// assert_eq!(number, "INV-2025-001");
    /// ```
    pub fn next_number(
        &self,
        existing: &[Document],
        kind: DocumentKind,
        now: impl Datelike,
    ) -> String {
        next_number_for_prefix(
            existing.iter().map(Document::document_number),
            self.prefix(kind),
            now.year(),
        )
    }
}

/// Compute `<prefix>-<year>-<max + 1>` over the numbers that start with `<prefix>-<year>`.
///
/// The sequence of each match is its trailing run of digits. Matches without one are skipped.
/// Sequences are compared and incremented as decimal strings, so the counter has no upper bound.
/// The result is zero-padded to at least three digits and widens past 999.
pub fn next_number_for_prefix<'a>(
    numbers: impl IntoIterator<Item = &'a str>,
    prefix: &str,
    year: i32,
) -> String {
    let scope = format!("{prefix}-{year}");
    let max = numbers
        .into_iter()
        .filter(|number| number.starts_with(&scope))
        .filter_map(|number| {
            let sequence = trailing_sequence(number);
            if sequence.is_none() {
                debug!(number, "skipping document number without a trailing sequence");
            }
            sequence
        })
        .max_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)))
        .unwrap_or("0");
    format!("{scope}-{:0>3}", increment(max))
}

/// Trailing ASCII digits of `number` without leading zeros; `"0"` for an all-zero run.
fn trailing_sequence(number: &str) -> Option<&str> {
    let head = number.trim_end_matches(|c: char| c.is_ascii_digit());
    let digits = &number[head.len()..];
    if digits.is_empty() {
        return None;
    }
    let significant = digits.trim_start_matches('0');
    Some(if significant.is_empty() { "0" } else { significant })
}

// digits must be a non-empty run of ASCII digits
fn increment(digits: &str) -> String {
    let mut out: Vec<u8> = digits.bytes().collect();
    for d in out.iter_mut().rev() {
        if *d == b'9' {
            *d = b'0';
        } else {
            *d += 1;
            return String::from_utf8_lossy(&out).into_owned();
        }
    }
    format!("1{}", String::from_utf8_lossy(&out))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use proptest::prelude::*;

    use super::*;
    use crate::fixtures::sample_document;

    fn jan_first(year: i32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, 1, 1).unwrap()
    }

    #[test]
    fn empty_history_starts_at_one() {
        let policy = NumberingPolicy::default();
        assert_eq!(
            policy.next_number(&[], DocumentKind::Invoice, jan_first(2025)),
            "INV-2025-001"
        );
        assert_eq!(
            policy.next_number(&[], DocumentKind::Quotation, jan_first(2025)),
            "QUO-2025-001"
        );
    }

    #[test]
    fn continues_after_the_highest_sequence() {
        let docs = [
            sample_document("INV-2025-001"),
            sample_document("INV-2025-007"),
            sample_document("INV-2025-abc"),
        ];
        let now = NaiveDate::from_ymd_opt(2025, 6, 30).unwrap();
        assert_eq!(
            NumberingPolicy::default().next_number(&docs, DocumentKind::Invoice, now),
            "INV-2025-008"
        );
    }

    #[test]
    fn other_years_and_prefixes_are_ignored() {
        let numbers = ["INV-2024-041", "QUO-2025-009", "INV-2025-002"];
        assert_eq!(
            next_number_for_prefix(numbers, "INV", 2025),
            "INV-2025-003"
        );
        assert_eq!(
            next_number_for_prefix(numbers, "QUO", 2025),
            "QUO-2025-010"
        );
        assert_eq!(
            next_number_for_prefix(numbers, "INV", 2026),
            "INV-2026-001"
        );
    }

    #[test]
    fn padding_widens_instead_of_truncating() {
        assert_eq!(
            next_number_for_prefix(["INV-2025-999"], "INV", 2025),
            "INV-2025-1000"
        );
        assert_eq!(
            next_number_for_prefix(["INV-2025-1041"], "INV", 2025),
            "INV-2025-1042"
        );
    }

    #[test]
    fn sequences_beyond_u64_keep_counting() {
        assert_eq!(
            next_number_for_prefix(["INV-2025-99999999999999999999999", "INV-2025-004"], "INV", 2025),
            "INV-2025-100000000000000000000000"
        );
        let existing = format!("INV-2025-{}", u64::MAX);
        assert_eq!(
            next_number_for_prefix([existing.as_str()], "INV", 2025),
            "INV-2025-18446744073709551616"
        );
    }

    #[test]
    fn leading_zeros_do_not_outrank_larger_sequences() {
        assert_eq!(
            next_number_for_prefix(["INV-2025-0009", "INV-2025-012", "INV-2025-000"], "INV", 2025),
            "INV-2025-013"
        );
    }

    #[test]
    fn every_kind_has_a_rule() {
        let policy = NumberingPolicy::default();
        for kind in DocumentKind::ALL {
            let expected = format!("{}-2025-001", policy.prefix(kind));
            assert_eq!(policy.next_number(&[], kind, jan_first(2025)), expected);
        }
    }

    #[test]
    fn aliases_share_the_invoice_sequence_by_default() {
        let docs = [sample_document("INV-2025-012")];
        let policy = NumberingPolicy::default();
        for kind in [DocumentKind::PurchaseOrder, DocumentKind::PerformaInvoice] {
            assert_eq!(policy.storage_type(kind), DocumentType::Invoice);
            assert_eq!(policy.next_number(&docs, kind, jan_first(2025)), "INV-2025-013");
        }
    }

    #[test]
    fn custom_prefix_keeps_sequences_apart() {
        let docs = [sample_document("INV-2025-012"), sample_document("PO-2025-002")];
        let policy = NumberingPolicy::default()
            .with_rule(DocumentKind::PurchaseOrder, DocumentType::Invoice, "PO");
        assert_eq!(
            policy.next_number(&docs, DocumentKind::PurchaseOrder, jan_first(2025)),
            "PO-2025-003"
        );
        assert_eq!(
            policy.next_number(&docs, DocumentKind::Invoice, jan_first(2025)),
            "INV-2025-013"
        );
    }

    proptest! {
        #[test]
        fn next_exceeds_every_existing_sequence(seqs in prop::collection::vec(0u64..100_000, 0..20)) {
            let numbers: Vec<String> = seqs.iter().map(|s| format!("INV-2025-{s:03}")).collect();
            let next = next_number_for_prefix(numbers.iter().map(String::as_str), "INV", 2025);
            let expected = seqs.iter().max().copied().unwrap_or(0) + 1;
            prop_assert_eq!(next, format!("INV-2025-{expected:03}"));
        }
    }
}
