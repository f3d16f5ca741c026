//! Company identity, contact and bank details printed on every document.

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Company details used when rendering documents. Missing fields fall back to the
/// [`Default`] placeholders, both when building and when reading a partial settings file.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[builder(setter(strip_option, into), pattern = "owned", default)]
#[serde(default)]
pub struct CompanySettings {
    pub company_name: String,
    pub company_address: String,
    pub company_phone: String,
    pub company_email: String,
    pub company_website: String,
    /// Path or data URL of the logo shown in the document header
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_logo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gst_number: Option<String>,
    pub bank_name: String,
    pub bank_account: String,
    pub bank_ifsc: String,
    pub terms_and_conditions: Vec<String>,
}

impl Default for CompanySettings {
    fn default() -> Self {
        let placeholder = || String::from("-");
        CompanySettings {
            company_name: String::from("YOUR COMPANY NAME"),
            company_address: String::from("Set company details in Settings"),
            company_phone: placeholder(),
            company_email: placeholder(),
            company_website: placeholder(),
            company_logo: None,
            gst_number: None,
            bank_name: placeholder(),
            bank_account: placeholder(),
            bank_ifsc: placeholder(),
            terms_and_conditions: vec![
                String::from("Payment due within 30 days"),
                String::from("Goods once sold will not be taken back"),
            ],
        }
    }
}

impl CompanySettingsBuilder {
    /// Append one line to the terms and conditions, keeping their order.
    pub fn add_term(self, term: impl Into<String>) -> Self {
        let mut terms = self.terms_and_conditions.unwrap_or_default();
        terms.push(term.into());
        Self {
            terms_and_conditions: Some(terms),
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_falls_back_to_placeholders() {
        let settings = CompanySettingsBuilder::default()
            .company_name("Shree Engineering Works")
            .gst_number("27AAAAA0000A1Z5")
            .build()
            .unwrap();
        assert_eq!(settings.company_name, "Shree Engineering Works");
        assert_eq!(settings.gst_number.as_deref(), Some("27AAAAA0000A1Z5"));
        assert_eq!(settings.bank_ifsc, "-");
        assert_eq!(settings.terms_and_conditions.len(), 2);
    }

    #[test]
    fn add_term_keeps_order() {
        let settings = CompanySettingsBuilder::default()
            .add_term("Interest at 18% after due date")
            .add_term("Subject to Pune jurisdiction")
            .build()
            .unwrap();
        assert_eq!(
            settings.terms_and_conditions,
            vec![
                "Interest at 18% after due date".to_string(),
                "Subject to Pune jurisdiction".to_string()
            ]
        );
    }

    #[test]
    fn partial_json_uses_defaults() {
        let settings: CompanySettings =
            serde_json::from_value(serde_json::json!({"company_name": "Acme"})).unwrap();
        assert_eq!(settings.company_name, "Acme");
        assert_eq!(settings.company_address, "Set company details in Settings");
        assert!(settings.company_logo.is_none());
    }
}
