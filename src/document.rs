//! Business document domain types and serialization helpers.
//!
//! This module defines the structures used to represent invoices, quotations, purchase orders
//! and performa invoices: the [`Document`] itself, its [`Customer`] and its ordered
//! [`LineItem`]s. Amounts are exact [`BigDecimal`] values serialized as strings, calendar dates
//! are serialized as `dd-mm-yyyy` and timestamps as RFC 3339.
//!
//! Every derived figure (a line item's `amount`, a document's [`Totals`]) is recomputed whenever
//! its inputs change and again when a stored record is deserialized, so a value read back from
//! storage can never disagree with its own line items.

use std::{collections::HashSet, fmt::Display, str::FromStr};

use bigdecimal::BigDecimal;
use chrono::{DateTime, Days, FixedOffset, NaiveDate};
use derive_builder::Builder;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{
    calc::{Totals, line_amount},
    error::ValidationError,
};

/// Display and storage format for issue and due dates.
pub const DATE_FORMAT: &str = "%d-%m-%Y";

/// Days between issue date and due date when the caller does not pick one.
pub const DEFAULT_PAYMENT_TERM_DAYS: u64 = 30;

/// CGST percentage applied when a document is built without an explicit rate.
pub const DEFAULT_CGST_RATE: u32 = 9;

/// SGST percentage applied when a document is built without an explicit rate.
pub const DEFAULT_SGST_RATE: u32 = 9;

const DEFAULT_UNIT: &str = "Pcs";

pub(crate) fn serialize_bigdecimal<S>(value: &BigDecimal, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&value.to_string())
}

fn serialize_datetime<S>(value: &DateTime<FixedOffset>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&value.to_rfc3339())
}

fn serialize_date<S>(value: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format_date(*value))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DecimalRepr {
    Text(String),
    Number(serde_json::Number),
}

impl DecimalRepr {
    fn parse(self) -> Result<BigDecimal, bigdecimal::ParseBigDecimalError> {
        match self {
            DecimalRepr::Text(s) => BigDecimal::from_str(s.trim()),
            DecimalRepr::Number(n) => BigDecimal::from_str(&n.to_string()),
        }
    }
}

/// Deserialize a [`BigDecimal`] written either as a JSON string (`"12.50"`) or a JSON number.
pub fn deserialize_bigdecimal<'de, D>(deserializer: D) -> Result<BigDecimal, D::Error>
where
    D: Deserializer<'de>,
{
    DecimalRepr::deserialize(deserializer)?
        .parse()
        .map_err(serde::de::Error::custom)
}

/// Like [`deserialize_bigdecimal`], for optional fields. Pair with `#[serde(default)]`.
pub fn deserialize_optional_bigdecimal<'de, D>(
    deserializer: D,
) -> Result<Option<BigDecimal>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<DecimalRepr>::deserialize(deserializer)?
        .map(DecimalRepr::parse)
        .transpose()
        .map_err(serde::de::Error::custom)
}

fn deserialize_datetime<'de, D>(deserializer: D) -> Result<DateTime<FixedOffset>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    DateTime::parse_from_rfc3339(&s).map_err(serde::de::Error::custom)
}

fn deserialize_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse_date(&s).map_err(serde::de::Error::custom)
}

/// Format a date the way it is printed on documents, `dd-mm-yyyy`.
///
/// # Example
/// ```rust
/// use chrono::NaiveDate;
/// use billbook::document::format_date;
///
/// let date = NaiveDate::from_ymd_opt(2025, 4, 7).unwrap();
/// assert_eq!(format_date(date), "07-04-2025");
/// ```
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Parse a `dd-mm-yyyy` date.
pub fn parse_date(s: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
}

/// The due date used when none is given: [`DEFAULT_PAYMENT_TERM_DAYS`] after `issue_date`.
pub fn default_due_date(issue_date: NaiveDate) -> NaiveDate {
    issue_date
        .checked_add_days(Days::new(DEFAULT_PAYMENT_TERM_DAYS))
        .unwrap_or(NaiveDate::MAX)
}

fn normalize_variant(s: &str) -> String {
    s.trim().to_ascii_uppercase().replace(['-', ' '], "_")
}

/// The kind of document a user asks to create.
///
/// Purchase orders and performa invoices are presentation variants. Which [`DocumentType`] they
/// are stored as, and which number prefix they draw from, is decided by
/// [`crate::numbering::NumberingPolicy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentKind {
    Invoice,
    Quotation,
    PurchaseOrder,
    PerformaInvoice,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 4] = [
        DocumentKind::Invoice,
        DocumentKind::Quotation,
        DocumentKind::PurchaseOrder,
        DocumentKind::PerformaInvoice,
    ];

    /// Heading printed at the top of the document.
    pub fn title(&self) -> &'static str {
        match self {
            DocumentKind::Invoice => "INVOICE",
            DocumentKind::Quotation => "QUOTATION",
            DocumentKind::PurchaseOrder => "PURCHASE ORDER",
            DocumentKind::PerformaInvoice => "PERFORMA INVOICE",
        }
    }
}

impl Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.title())
    }
}

impl FromStr for DocumentKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_variant(s).as_str() {
            "INVOICE" | "INV" => Ok(DocumentKind::Invoice),
            "QUOTATION" | "QUO" => Ok(DocumentKind::Quotation),
            "PURCHASE_ORDER" | "PO" => Ok(DocumentKind::PurchaseOrder),
            "PERFORMA_INVOICE" | "PROFORMA_INVOICE" | "PI" => Ok(DocumentKind::PerformaInvoice),
            _ => Err(ValidationError::UnknownVariant {
                kind: "document kind",
                value: s.to_string(),
            }),
        }
    }
}

/// The type a document is persisted as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentType {
    Invoice,
    Quotation,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Invoice => "INVOICE",
            DocumentType::Quotation => "QUOTATION",
        }
    }
}

impl Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Conventional lifecycle is Draft -> Pending -> Paid, but any value may be set directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    Paid,
    Pending,
    Draft,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Paid => "Paid",
            Status::Pending => "Pending",
            Status::Draft => "Draft",
        }
    }
}

impl Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Status {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_variant(s).as_str() {
            "PAID" => Ok(Status::Paid),
            "PENDING" => Ok(Status::Pending),
            "DRAFT" => Ok(Status::Draft),
            _ => Err(ValidationError::UnknownVariant {
                kind: "status",
                value: s.to_string(),
            }),
        }
    }
}

/// A single document line: what was sold, its HSN classification code, unit of measure,
/// quantity and rate. `amount` is always `quantity * rate`.
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
#[builder(setter(into), pattern = "owned", build_fn(skip))]
#[serde(try_from = "LineItemRecord")]
pub struct LineItem {
    id: String,
    description: String,
    hsn_code: String,
    unit: String,
    #[serde(serialize_with = "serialize_bigdecimal")]
    quantity: BigDecimal,
    #[serde(serialize_with = "serialize_bigdecimal")]
    rate: BigDecimal,
    #[builder(setter(skip))]
    #[serde(serialize_with = "serialize_bigdecimal")]
    amount: BigDecimal,
}

/// Stored shape of a [`LineItem`]. Any stored `amount` is ignored and recomputed.
#[derive(Deserialize)]
struct LineItemRecord {
    id: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    hsn_code: String,
    #[serde(default = "default_unit")]
    unit: String,
    #[serde(deserialize_with = "deserialize_bigdecimal")]
    quantity: BigDecimal,
    #[serde(deserialize_with = "deserialize_bigdecimal")]
    rate: BigDecimal,
}

fn default_unit() -> String {
    DEFAULT_UNIT.to_string()
}

impl TryFrom<LineItemRecord> for LineItem {
    type Error = ValidationError;

    fn try_from(record: LineItemRecord) -> Result<Self, Self::Error> {
        let amount = line_amount(&record.quantity, &record.rate)?;
        Ok(LineItem {
            id: record.id,
            description: record.description,
            hsn_code: record.hsn_code,
            unit: record.unit,
            quantity: record.quantity,
            rate: record.rate,
            amount,
        })
    }
}

impl LineItemBuilder {
    /// Validate builder fields and compute the `amount` for the line item.
    ///
    /// `hsn_code` defaults to an empty string and `unit` to `Pcs`.
    ///
    /// # Errors
    /// * [`LineItemBuilderError::UninitializedField`] if `id`, `description`, `quantity` or
    ///   `rate` is missing
    /// * [`LineItemBuilderError::ValidationError`] if quantity or rate is negative
    ///
    /// # Example
    /// ```rust
    /// use bigdecimal::BigDecimal;
    /// use billbook::LineItemBuilder;
    ///
    /// let item = LineItemBuilder::default()
    ///     .id("1")
    ///     .description("Steel bracket")
    ///     .quantity(4)
    ///     .rate(250)
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(item.amount(), &BigDecimal::from(1000));
    /// ```
    pub fn build(self) -> Result<LineItem, LineItemBuilderError> {
        let id = self
            .id
            .ok_or(LineItemBuilderError::UninitializedField("id"))?;
        let description = self
            .description
            .ok_or(LineItemBuilderError::UninitializedField("description"))?;
        let quantity = self
            .quantity
            .ok_or(LineItemBuilderError::UninitializedField("quantity"))?;
        let rate = self
            .rate
            .ok_or(LineItemBuilderError::UninitializedField("rate"))?;
        let amount = line_amount(&quantity, &rate)
            .map_err(|e| LineItemBuilderError::ValidationError(e.to_string()))?;

        Ok(LineItem {
            id,
            description,
            hsn_code: self.hsn_code.unwrap_or_default(),
            unit: self.unit.unwrap_or_else(default_unit),
            quantity,
            rate,
            amount,
        })
    }
}

impl LineItem {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn hsn_code(&self) -> &str {
        &self.hsn_code
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn quantity(&self) -> &BigDecimal {
        &self.quantity
    }

    pub fn rate(&self) -> &BigDecimal {
        &self.rate
    }

    /// Return the computed amount for this line item equal to `quantity * rate`
    pub fn amount(&self) -> &BigDecimal {
        &self.amount
    }

    /// Change the quantity and recompute `amount`. On error the item is left unchanged.
    pub fn set_quantity(&mut self, quantity: BigDecimal) -> Result<(), ValidationError> {
        self.amount = line_amount(&quantity, &self.rate)?;
        self.quantity = quantity;
        Ok(())
    }

    /// Change the rate and recompute `amount`. On error the item is left unchanged.
    pub fn set_rate(&mut self, rate: BigDecimal) -> Result<(), ValidationError> {
        self.amount = line_amount(&self.quantity, &rate)?;
        self.rate = rate;
        Ok(())
    }
}

/// The party a document is addressed to
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
#[builder(setter(strip_option, into), pattern = "owned")]
pub struct Customer {
    name: String,
    #[builder(default)]
    #[serde(default)]
    address: String,
    #[builder(default)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    contact: Option<String>,
    #[builder(default)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    phone: Option<String>,
    #[builder(default)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    email: Option<String>,
}

impl Customer {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Name of the contact person at the customer, if any.
    pub fn contact(&self) -> Option<&str> {
        self.contact.as_deref()
    }

    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }
}

/// Document top level model
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
#[builder(setter(strip_option, into), pattern = "owned", build_fn(skip))]
#[serde(try_from = "DocumentRecord")]
pub struct Document {
    id: i64,
    document_type: DocumentType,
    document_number: String,
    #[serde(serialize_with = "serialize_date")]
    issue_date: NaiveDate,
    #[serde(serialize_with = "serialize_date")]
    due_date: NaiveDate,
    customer: Customer,
    #[serde(skip_serializing_if = "Option::is_none")]
    po_number: Option<String>,
    line_items: Vec<LineItem>,
    #[serde(serialize_with = "serialize_bigdecimal")]
    cgst_rate: BigDecimal,
    #[serde(serialize_with = "serialize_bigdecimal")]
    sgst_rate: BigDecimal,
    #[builder(setter(skip))]
    #[serde(flatten)]
    totals: Totals,
    status: Status,
    #[serde(serialize_with = "serialize_datetime")]
    created_at: DateTime<FixedOffset>,
}

/// Stored shape of a [`Document`]. Stored totals are ignored and recomputed; line item ids must
/// be unique.
#[derive(Deserialize)]
struct DocumentRecord {
    id: i64,
    document_type: DocumentType,
    document_number: String,
    #[serde(deserialize_with = "deserialize_date")]
    issue_date: NaiveDate,
    #[serde(deserialize_with = "deserialize_date")]
    due_date: NaiveDate,
    customer: Customer,
    #[serde(default)]
    po_number: Option<String>,
    #[serde(default)]
    line_items: Vec<LineItem>,
    #[serde(deserialize_with = "deserialize_bigdecimal")]
    cgst_rate: BigDecimal,
    #[serde(deserialize_with = "deserialize_bigdecimal")]
    sgst_rate: BigDecimal,
    status: Status,
    #[serde(deserialize_with = "deserialize_datetime")]
    created_at: DateTime<FixedOffset>,
}

fn ensure_unique_line_ids(items: &[LineItem]) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    match items.iter().find(|item| !seen.insert(item.id())) {
        Some(item) => Err(ValidationError::DuplicateLineId(item.id().to_string())),
        None => Ok(()),
    }
}

impl TryFrom<DocumentRecord> for Document {
    type Error = ValidationError;

    fn try_from(record: DocumentRecord) -> Result<Self, Self::Error> {
        ensure_unique_line_ids(&record.line_items)?;
        let totals = Totals::compute(&record.line_items, &record.cgst_rate, &record.sgst_rate);
        Ok(Document {
            id: record.id,
            document_type: record.document_type,
            document_number: record.document_number,
            issue_date: record.issue_date,
            due_date: record.due_date,
            customer: record.customer,
            po_number: record.po_number,
            line_items: record.line_items,
            cgst_rate: record.cgst_rate,
            sgst_rate: record.sgst_rate,
            totals,
            status: record.status,
            created_at: record.created_at,
        })
    }
}

/// The fields of a saved [`Document`] that may still change. `None` leaves a field as is.
///
/// Applying a patch that touches line items or rates recomputes every total together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentPatch {
    pub customer: Option<Customer>,
    pub line_items: Option<Vec<LineItem>>,
    pub cgst_rate: Option<BigDecimal>,
    pub sgst_rate: Option<BigDecimal>,
    pub status: Option<Status>,
    pub due_date: Option<NaiveDate>,
    pub po_number: Option<String>,
}

impl DocumentPatch {
    /// A patch that only changes the status.
    pub fn status(status: Status) -> Self {
        DocumentPatch {
            status: Some(status),
            ..Default::default()
        }
    }
}

impl Document {
    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn document_type(&self) -> DocumentType {
        self.document_type
    }

    pub fn document_number(&self) -> &str {
        &self.document_number
    }

    pub fn issue_date(&self) -> NaiveDate {
        self.issue_date
    }

    pub fn due_date(&self) -> NaiveDate {
        self.due_date
    }

    pub fn customer(&self) -> &Customer {
        &self.customer
    }

    pub fn po_number(&self) -> Option<&str> {
        self.po_number.as_deref()
    }

    /// Return a reference to the document's line items, in display order.
    pub fn line_items(&self) -> &[LineItem] {
        &self.line_items
    }

    pub fn cgst_rate(&self) -> &BigDecimal {
        &self.cgst_rate
    }

    pub fn sgst_rate(&self) -> &BigDecimal {
        &self.sgst_rate
    }

    pub fn totals(&self) -> &Totals {
        &self.totals
    }

    pub fn subtotal(&self) -> &BigDecimal {
        self.totals.subtotal()
    }

    pub fn cgst_amount(&self) -> &BigDecimal {
        self.totals.cgst_amount()
    }

    pub fn sgst_amount(&self) -> &BigDecimal {
        self.totals.sgst_amount()
    }

    pub fn total_tax(&self) -> &BigDecimal {
        self.totals.total_tax()
    }

    pub fn total_amount(&self) -> &BigDecimal {
        self.totals.total_amount()
    }

    pub fn amount_in_words(&self) -> &str {
        self.totals.amount_in_words()
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn created_at(&self) -> DateTime<FixedOffset> {
        self.created_at
    }

    /// Apply the mutable fields of `patch` and recompute all totals.
    ///
    /// # Errors
    /// [`ValidationError::DuplicateLineId`] if the new line items repeat an id. The document is
    /// left unchanged.
    ///
    /// # Example
    /// ```rust
    /// use bigdecimal::BigDecimal;
    /// use billbook::{CustomerBuilder, DocumentBuilder, DocumentPatch, DocumentType, LineItemBuilder};
    ///
    /// let mut doc = DocumentBuilder::default()
    ///     .document_type(DocumentType::Invoice)
    ///     .document_number("INV-2025-001")
    ///     .customer(CustomerBuilder::default().name("Acme").build().unwrap())
    ///     .add_line(
    ///         LineItemBuilder::default()
    ///             .id("1")
    ///             .description("Widget")
    ///             .quantity(1)
    ///             .rate(100)
    ///             .build().unwrap())
    ///     .created_at(chrono::DateTime::parse_from_rfc3339("2025-01-01T10:00:00+05:30").unwrap())
    ///     .build().unwrap();
    /// assert_eq!(doc.total_amount(), &BigDecimal::from(118));
    ///
    /// doc.apply(DocumentPatch {
    ///     cgst_rate: Some(BigDecimal::from(0)),
    ///     sgst_rate: Some(BigDecimal::from(0)),
    ///     ..Default::default()
    /// }).unwrap();
    /// assert_eq!(doc.total_amount(), &BigDecimal::from(100));
    /// ```
    pub fn apply(&mut self, patch: DocumentPatch) -> Result<(), ValidationError> {
        if let Some(line_items) = &patch.line_items {
            ensure_unique_line_ids(line_items)?;
        }
        if let Some(customer) = patch.customer {
            self.customer = customer;
        }
        if let Some(line_items) = patch.line_items {
            self.line_items = line_items;
        }
        if let Some(rate) = patch.cgst_rate {
            self.cgst_rate = rate;
        }
        if let Some(rate) = patch.sgst_rate {
            self.sgst_rate = rate;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(due_date) = patch.due_date {
            self.due_date = due_date;
        }
        if let Some(po_number) = patch.po_number {
            self.po_number = Some(po_number);
        }
        self.recompute();
        Ok(())
    }

    /// Recompute subtotal, taxes, grand total and amount in words from line items and rates.
    pub fn recompute(&mut self) {
        self.totals = Totals::compute(&self.line_items, &self.cgst_rate, &self.sgst_rate);
    }
}

impl DocumentBuilder {
    /// Add a [`LineItem`] to the builder's internal list.
    ///
    /// # Example
    /// ```rust
    /// use billbook::{DocumentBuilder, LineItemBuilder};
    ///
    /// let line_item = LineItemBuilder::default()
    ///     .id("1")
    ///     .description("Installation")
    ///     .quantity(1)
    ///     .rate(1500)
    ///     .build().unwrap();
    /// let builder = DocumentBuilder::default().add_line(line_item);
    /// ```
    pub fn add_line(self, line: LineItem) -> Self {
        match self.line_items {
            Some(mut l) => {
                l.push(line);
                Self {
                    line_items: Some(l),
                    ..self
                }
            }
            None => Self {
                line_items: Some(vec![line]),
                ..self
            },
        }
    }

    /// Finalize the builder into a [`Document`], computing its [`Totals`].
    ///
    /// Missing optional fields are filled with these defaults:
    /// * `id` is `created_at` in milliseconds since the epoch.
    /// * `issue_date` is the calendar date of `created_at`, `due_date` is
    ///   [`DEFAULT_PAYMENT_TERM_DAYS`] later.
    /// * `cgst_rate` and `sgst_rate` are [`DEFAULT_CGST_RATE`] and [`DEFAULT_SGST_RATE`].
    /// * `line_items` is empty and `status` is [`Status::Pending`].
    ///
    /// The builder never reads the clock; `created_at` must be supplied.
    ///
    /// # Errors
    /// * [`DocumentBuilderError::UninitializedField`] if `document_type`, `document_number`,
    ///   `customer` or `created_at` is missing
    /// * [`DocumentBuilderError::ValidationError`] if two line items share an id
    pub fn build(self) -> Result<Document, DocumentBuilderError> {
        let created_at = self
            .created_at
            .ok_or(DocumentBuilderError::UninitializedField("created_at"))?;
        let document_type = self
            .document_type
            .ok_or(DocumentBuilderError::UninitializedField("document_type"))?;
        let document_number = self
            .document_number
            .ok_or(DocumentBuilderError::UninitializedField("document_number"))?;
        let customer = self
            .customer
            .ok_or(DocumentBuilderError::UninitializedField("customer"))?;
        let id = self.id.unwrap_or_else(|| created_at.timestamp_millis());
        let issue_date = self.issue_date.unwrap_or_else(|| created_at.date_naive());
        let due_date = self
            .due_date
            .unwrap_or_else(|| default_due_date(issue_date));
        let po_number = self.po_number.unwrap_or(None);
        let line_items = self.line_items.unwrap_or_default();
        ensure_unique_line_ids(&line_items)
            .map_err(|e| DocumentBuilderError::ValidationError(e.to_string()))?;
        let cgst_rate = self
            .cgst_rate
            .unwrap_or_else(|| BigDecimal::from(DEFAULT_CGST_RATE));
        let sgst_rate = self
            .sgst_rate
            .unwrap_or_else(|| BigDecimal::from(DEFAULT_SGST_RATE));
        let status = self.status.unwrap_or(Status::Pending);

        let totals = Totals::compute(&line_items, &cgst_rate, &sgst_rate);
        Ok(Document {
            id,
            document_type,
            document_number,
            issue_date,
            due_date,
            customer,
            po_number,
            line_items,
            cgst_rate,
            sgst_rate,
            totals,
            status,
            created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{created_at, customer, item, sample_document};

    #[test]
    fn test_deserialize_bigdecimal() {
        #[derive(Deserialize)]
        struct Wrap {
            #[serde(deserialize_with = "super::deserialize_bigdecimal")]
            bd: BigDecimal,
        }

        let w: Wrap = serde_json::from_value(serde_json::json!({"bd": "12.50"})).unwrap();
        assert_eq!(w.bd, BigDecimal::from_str("12.5").unwrap());
        let w: Wrap = serde_json::from_value(serde_json::json!({"bd": 7})).unwrap();
        assert_eq!(w.bd, BigDecimal::from(7));
        let x = serde_json::from_value::<Wrap>(serde_json::json!({"bd": "reee"}));
        assert!(x.is_err())
    }

    #[test]
    fn dates_use_day_month_year() {
        let date = NaiveDate::from_ymd_opt(2025, 12, 3).unwrap();
        assert_eq!(format_date(date), "03-12-2025");
        assert_eq!(parse_date("03-12-2025").unwrap(), date);
        assert!(parse_date("2025-12-03").is_err());
        assert_eq!(
            default_due_date(date),
            NaiveDate::from_ymd_opt(2026, 1, 2).unwrap()
        );
    }

    #[test]
    fn kind_and_status_parse_loosely() {
        assert_eq!(
            "purchase-order".parse::<DocumentKind>().unwrap(),
            DocumentKind::PurchaseOrder
        );
        assert_eq!(
            "Performa Invoice".parse::<DocumentKind>().unwrap(),
            DocumentKind::PerformaInvoice
        );
        assert_eq!("paid".parse::<Status>().unwrap(), Status::Paid);
        assert!("overdue".parse::<Status>().is_err());
    }

    #[test]
    fn line_item_builder_success_and_accessors() {
        let rate = BigDecimal::from_str("9.50").unwrap();
        let item = LineItemBuilder::default()
            .id("a")
            .description("Gadget")
            .hsn_code("8471")
            .quantity(2)
            .rate(rate.clone())
            .build()
            .unwrap();

        assert_eq!(item.quantity(), &BigDecimal::from(2));
        assert_eq!(item.description(), "Gadget");
        assert_eq!(item.hsn_code(), "8471");
        assert_eq!(item.unit(), "Pcs");
        assert_eq!(item.rate(), &rate);
        assert_eq!(item.amount(), &BigDecimal::from(19));
    }

    #[test]
    fn line_item_builder_rejects_missing_and_negative_fields() {
        let _ = LineItemBuilder::default()
            .id("x")
            .description("Y")
            .quantity(1)
            .build()
            .unwrap_err();

        let err = LineItemBuilder::default()
            .id("x")
            .description("Y")
            .quantity(-1)
            .rate(5)
            .build()
            .unwrap_err();
        assert!(matches!(err, LineItemBuilderError::ValidationError(_)));
    }

    #[test]
    fn changing_quantity_or_rate_recomputes_amount() {
        let mut line = item("1", "3", "10");
        line.set_quantity(BigDecimal::from(5)).unwrap();
        assert_eq!(line.amount(), &BigDecimal::from(50));
        line.set_rate(BigDecimal::from_str("2.5").unwrap()).unwrap();
        assert_eq!(line.amount(), &BigDecimal::from_str("12.5").unwrap());

        assert!(line.set_rate(BigDecimal::from(-1)).is_err());
        assert_eq!(line.amount(), &BigDecimal::from_str("12.5").unwrap());
    }

    #[test]
    fn document_builder_computes_totals_and_defaults() {
        let doc = sample_document("INV-2025-001");

        // 2 * 500 + 3 * 250.50 = 1751.50
        assert_eq!(doc.subtotal(), &BigDecimal::from_str("1751.50").unwrap());
        assert_eq!(doc.cgst_amount(), &BigDecimal::from_str("157.635").unwrap());
        assert_eq!(doc.sgst_amount(), &BigDecimal::from_str("157.635").unwrap());
        assert_eq!(doc.total_tax(), &BigDecimal::from_str("315.27").unwrap());
        assert_eq!(doc.total_amount(), &BigDecimal::from_str("2066.77").unwrap());
        assert_eq!(
            doc.amount_in_words(),
            "RUPEES TWO THOUSAND SIXTY SEVEN ONLY"
        );

        assert_eq!(doc.id(), created_at().timestamp_millis());
        assert_eq!(doc.issue_date(), created_at().date_naive());
        assert_eq!(doc.due_date(), default_due_date(doc.issue_date()));
        assert_eq!(doc.status(), Status::Pending);
    }

    #[test]
    fn document_builder_missing_required_fields_fails() {
        let _ = DocumentBuilder::default()
            .document_type(DocumentType::Invoice)
            .document_number("INV-2025-001")
            .customer(customer("Acme"))
            .build()
            .unwrap_err();

        let _ = DocumentBuilder::default()
            .document_number("INV-2025-001")
            .customer(customer("Acme"))
            .created_at(created_at())
            .build()
            .unwrap_err();
    }

    #[test]
    fn serialized_document_uses_strings_and_flat_totals() {
        let doc = sample_document("INV-2025-004");
        let json = serde_json::to_value(&doc).unwrap();

        assert_eq!(json["document_type"], "INVOICE");
        assert_eq!(json["issue_date"], "14-03-2025");
        assert_eq!(json["subtotal"], "1751.50");
        let total = BigDecimal::from_str(json["total_amount"].as_str().unwrap()).unwrap();
        assert_eq!(&total, doc.total_amount());
        assert_eq!(json["line_items"][0]["amount"], "1000");
        assert_eq!(json["status"], "Pending");
    }

    #[test]
    fn deserializing_recomputes_tampered_totals() {
        let doc = sample_document("INV-2025-004");
        let mut json = serde_json::to_value(&doc).unwrap();
        json["total_amount"] = serde_json::json!("1.00");
        json["line_items"][0]["amount"] = serde_json::json!("999999");

        let restored: Document = serde_json::from_value(json).unwrap();
        assert_eq!(restored, doc);
    }

    #[test]
    fn deserializing_rejects_negative_line_items() {
        let doc = sample_document("INV-2025-004");
        let mut json = serde_json::to_value(&doc).unwrap();
        json["line_items"][0]["quantity"] = serde_json::json!("-2");
        assert!(serde_json::from_value::<Document>(json).is_err());
    }

    #[test]
    fn patch_recomputes_every_total() {
        let mut doc = sample_document("INV-2025-004");
        doc.apply(DocumentPatch {
            line_items: Some(vec![item("9", "1", "1000")]),
            cgst_rate: Some(BigDecimal::from(6)),
            sgst_rate: Some(BigDecimal::from(6)),
            status: Some(Status::Paid),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(doc.subtotal(), &BigDecimal::from(1000));
        assert_eq!(doc.total_tax(), &BigDecimal::from(120));
        assert_eq!(doc.total_amount(), &BigDecimal::from(1120));
        assert_eq!(
            doc.amount_in_words(),
            "RUPEES ONE THOUSAND ONE HUNDRED TWENTY ONLY"
        );
        assert_eq!(doc.status(), Status::Paid);
        assert_eq!(doc.document_number(), "INV-2025-004");
    }

    #[test]
    fn duplicate_line_ids_are_rejected() {
        let err = DocumentBuilder::default()
            .document_type(DocumentType::Invoice)
            .document_number("INV-2025-005")
            .customer(customer("Acme"))
            .add_line(item("1", "1", "10"))
            .add_line(item("1", "2", "20"))
            .created_at(created_at())
            .build()
            .unwrap_err();
        assert!(matches!(err, DocumentBuilderError::ValidationError(_)));

        let mut doc = sample_document("INV-2025-005");
        let before = doc.clone();
        let err = doc
            .apply(DocumentPatch {
                line_items: Some(vec![item("x", "1", "10"), item("x", "1", "10")]),
                status: Some(Status::Paid),
                ..Default::default()
            })
            .unwrap_err();
        assert_eq!(err, ValidationError::DuplicateLineId("x".to_string()));
        assert_eq!(doc, before);

        let mut json = serde_json::to_value(&before).unwrap();
        json["line_items"][1]["id"] = serde_json::json!("1");
        assert!(serde_json::from_value::<Document>(json).is_err());
    }

    #[test]
    fn customer_optional_fields_are_omitted() {
        let c = CustomerBuilder::default()
            .name("Acme")
            .email("accounts@acme.test")
            .build()
            .unwrap();
        let json = serde_json::to_value(&c).unwrap();
        assert!(json.get("phone").is_none());
        assert_eq!(json["email"], "accounts@acme.test");
        assert_eq!(c.address(), "");
    }
}
