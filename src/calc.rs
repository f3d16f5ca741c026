//! Line, tax and grand total arithmetic.
//!
//! Every function here is pure and works on exact [`BigDecimal`] values, so there is no hidden
//! rounding anywhere until an amount is formatted for display with [`format_currency`] or rounded
//! to whole rupees for [`crate::words`].
//!
//! Rounding rule: half-up, ties away from zero (`0.125` -> `0.13`, `2.5` -> `3`).

use bigdecimal::{BigDecimal, RoundingMode, num_bigint::BigInt};
use serde::Serialize;
use tracing::warn;

use crate::{
    document::{LineItem, serialize_bigdecimal},
    error::ValidationError,
    words::amount_in_words,
};

/// Prefix used by [`format_currency`].
pub const CURRENCY_SYMBOL: &str = "₹";

fn ensure_non_negative(field: &'static str, value: &BigDecimal) -> Result<(), ValidationError> {
    if *value < BigDecimal::from(0) {
        return Err(ValidationError::Negative {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

/// Compute a line amount as `quantity * rate`.
///
/// # Errors
/// [`ValidationError::Negative`] if either input is negative. A negative quantity or rate has no
/// business meaning on these documents and is rejected rather than clamped.
///
/// # Example
/// ```rust
/// use std::str::FromStr;
/// use bigdecimal::BigDecimal;
/// use billbook::calc::line_amount;
///
/// let amount = line_amount(&BigDecimal::from(3), &BigDecimal::from_str("12.50").unwrap()).unwrap();
/// assert_eq!(amount, BigDecimal::from_str("37.5").unwrap());
/// assert!(line_amount(&BigDecimal::from(-1), &BigDecimal::from(1)).is_err());
/// ```
pub fn line_amount(quantity: &BigDecimal, rate: &BigDecimal) -> Result<BigDecimal, ValidationError> {
    ensure_non_negative("quantity", quantity)?;
    ensure_non_negative("rate", rate)?;
    Ok(quantity * rate)
}

/// Sum of the line amounts. An empty slice yields zero.
pub fn subtotal(items: &[LineItem]) -> BigDecimal {
    items.iter().map(LineItem::amount).sum()
}

/// Compute `subtotal * rate_percent / 100`.
///
/// The rate is not clamped to `[0, 100]`; range checks belong to whoever collects the rate.
pub fn tax_amount(subtotal: &BigDecimal, rate_percent: &BigDecimal) -> BigDecimal {
    // multiplying by 0.01 keeps the result exact with a fixed, positive scale
    let one_percent = BigDecimal::new(BigInt::from(1), 2);
    subtotal * rate_percent * one_percent
}

/// Compute `subtotal + cgst_amount + sgst_amount` exactly.
pub fn grand_total(
    subtotal: &BigDecimal,
    cgst_amount: &BigDecimal,
    sgst_amount: &BigDecimal,
) -> BigDecimal {
    subtotal + cgst_amount + sgst_amount
}

/// Round `amount` half-up to two decimal places, without a currency symbol.
pub fn format_amount(amount: &BigDecimal) -> String {
    // Display drops the scale of zero, so pad explicitly
    format!("{:.2}", amount.with_scale_round(2, RoundingMode::HalfUp))
}

/// Format `amount` for display as `₹ <amount>` with exactly two decimal places.
///
/// # Example
/// ```rust
/// use std::str::FromStr;
/// use bigdecimal::BigDecimal;
/// use billbook::calc::format_currency;
///
/// assert_eq!(format_currency(&BigDecimal::from_str("1234.5").unwrap()), "₹ 1234.50");
/// assert_eq!(format_currency(&BigDecimal::from_str("0.125").unwrap()), "₹ 0.13");
/// ```
pub fn format_currency(amount: &BigDecimal) -> String {
    format!("{CURRENCY_SYMBOL} {}", format_amount(amount))
}

/// Round `amount` half-up to whole rupees.
pub fn round_to_rupees(amount: &BigDecimal) -> BigDecimal {
    amount.with_scale_round(0, RoundingMode::HalfUp)
}

/// All derived financial figures of a document, computed together in one step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Totals {
    #[serde(serialize_with = "serialize_bigdecimal")]
    subtotal: BigDecimal,
    #[serde(serialize_with = "serialize_bigdecimal")]
    cgst_amount: BigDecimal,
    #[serde(serialize_with = "serialize_bigdecimal")]
    sgst_amount: BigDecimal,
    #[serde(serialize_with = "serialize_bigdecimal")]
    total_tax: BigDecimal,
    #[serde(serialize_with = "serialize_bigdecimal")]
    total_amount: BigDecimal,
    amount_in_words: String,
}

impl Totals {
    /// Compute subtotal, both tax components, total tax, grand total and the grand total in
    /// words (rounded half-up to whole rupees first).
    ///
    /// A negative grand total can only come from a negative tax rate; it has no words form and
    /// leaves `amount_in_words` empty.
    pub fn compute(items: &[LineItem], cgst_rate: &BigDecimal, sgst_rate: &BigDecimal) -> Totals {
        let subtotal = subtotal(items);
        let cgst_amount = tax_amount(&subtotal, cgst_rate);
        let sgst_amount = tax_amount(&subtotal, sgst_rate);
        let total_tax = &cgst_amount + &sgst_amount;
        let total_amount = grand_total(&subtotal, &cgst_amount, &sgst_amount);
        let amount_in_words = match amount_in_words(&round_to_rupees(&total_amount)) {
            Ok(words) => words,
            Err(e) => {
                warn!(error = %e, "grand total has no words form");
                String::new()
            }
        };

        Totals {
            subtotal,
            cgst_amount,
            sgst_amount,
            total_tax,
            total_amount,
            amount_in_words,
        }
    }

    pub fn subtotal(&self) -> &BigDecimal {
        &self.subtotal
    }

    pub fn cgst_amount(&self) -> &BigDecimal {
        &self.cgst_amount
    }

    pub fn sgst_amount(&self) -> &BigDecimal {
        &self.sgst_amount
    }

    /// `cgst_amount + sgst_amount`
    pub fn total_tax(&self) -> &BigDecimal {
        &self.total_tax
    }

    pub fn total_amount(&self) -> &BigDecimal {
        &self.total_amount
    }

    pub fn amount_in_words(&self) -> &str {
        &self.amount_in_words
    }
}
