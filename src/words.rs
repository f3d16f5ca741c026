//! Whole rupee amounts in words, on the Indian numbering scale.
//!
//! Amounts are split into crore (10^7), lakh (10^5), thousand and a final 0..=999 group. Each
//! group is spelled with the same hundreds/tens/ones routine and followed by its scale name;
//! empty groups are left out. The crore count is itself spelled recursively, so very large
//! amounts read as e.g. `ONE THOUSAND CRORE` rather than running off the end of the tables.

use bigdecimal::{BigDecimal, ToPrimitive};

use crate::error::ValidationError;

const ONES: [&str; 10] = [
    "", "ONE", "TWO", "THREE", "FOUR", "FIVE", "SIX", "SEVEN", "EIGHT", "NINE",
];
const TEENS: [&str; 10] = [
    "TEN",
    "ELEVEN",
    "TWELVE",
    "THIRTEEN",
    "FOURTEEN",
    "FIFTEEN",
    "SIXTEEN",
    "SEVENTEEN",
    "EIGHTEEN",
    "NINETEEN",
];
const TENS: [&str; 10] = [
    "", "", "TWENTY", "THIRTY", "FORTY", "FIFTY", "SIXTY", "SEVENTY", "EIGHTY", "NINETY",
];

const CRORE: u64 = 10_000_000;
const LAKH: u64 = 100_000;
const THOUSAND: u64 = 1_000;

/// Spell out a whole rupee amount as it is printed on legal documents.
///
/// `0` is `ZERO`; anything else is `RUPEES <words> ONLY`, uppercase, single-spaced.
///
/// # Example
/// ```rust
/// use billbook::words::number_to_words;
///
/// assert_eq!(number_to_words(0), "ZERO");
/// assert_eq!(number_to_words(100_000), "RUPEES ONE LAKH ONLY");
/// assert_eq!(
///     number_to_words(1_234_567),
///     "RUPEES TWELVE LAKH THIRTY FOUR THOUSAND FIVE HUNDRED SIXTY SEVEN ONLY"
/// );
/// ```
pub fn number_to_words(amount: u64) -> String {
    if amount == 0 {
        return String::from("ZERO");
    }
    let mut words = Vec::new();
    push_indian(amount, &mut words);
    format!("RUPEES {} ONLY", words.join(" "))
}

/// Validate a decimal amount and spell it with [`number_to_words`].
///
/// The amount must already be rounded to whole rupees; see [`crate::calc::round_to_rupees`].
///
/// # Errors
/// * [`ValidationError::Negative`] for amounts below zero
/// * [`ValidationError::NotWhole`] for amounts with a fractional part
/// * [`ValidationError::OutOfRange`] for amounts that do not fit in a `u64`
pub fn amount_in_words(amount: &BigDecimal) -> Result<String, ValidationError> {
    if *amount < BigDecimal::from(0) {
        return Err(ValidationError::Negative {
            field: "amount",
            value: amount.to_string(),
        });
    }
    if amount.with_scale(0) != *amount {
        return Err(ValidationError::NotWhole(amount.to_string()));
    }
    let whole = amount
        .to_u64()
        .ok_or_else(|| ValidationError::OutOfRange(amount.to_string()))?;
    Ok(number_to_words(whole))
}

fn push_indian(mut n: u64, words: &mut Vec<&'static str>) {
    let crore = n / CRORE;
    if crore > 0 {
        push_indian(crore, words);
        words.push("CRORE");
        n %= CRORE;
    }
    for (scale, name) in [(LAKH, "LAKH"), (THOUSAND, "THOUSAND")] {
        let count = n / scale;
        if count > 0 {
            push_hundreds(count, words);
            words.push(name);
            n %= scale;
        }
    }
    push_hundreds(n, words);
}

// n < 1000
fn push_hundreds(mut n: u64, words: &mut Vec<&'static str>) {
    if n > 99 {
        words.push(ONES[(n / 100) as usize]);
        words.push("HUNDRED");
        n %= 100;
    }
    if n > 19 {
        words.push(TENS[(n / 10) as usize]);
        n %= 10;
    } else if n >= 10 {
        words.push(TEENS[(n - 10) as usize]);
        return;
    }
    if n > 0 {
        words.push(ONES[n as usize]);
    }
}
