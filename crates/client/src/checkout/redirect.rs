//! Payment handoff as an explicit external redirect.
//!
//! The gateway needs the browser itself to POST the signed parameters, so the
//! handoff cannot be an API call. [`ExternalRedirect`] carries what the
//! browser must send; [`ExternalRedirect::render_html`] turns it into a page
//! whose hidden form submits itself on load.

use askama::Template;
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::api::types::PaymentInitiation;

/// A hidden form field posted to the payment gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormField {
    pub name: String,
    pub value: String,
}

/// A full-page POST the user agent must perform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalRedirect {
    pub target_url: Url,
    pub form_fields: Vec<FormField>,
}

#[derive(Template)]
#[template(path = "payment_redirect.html")]
struct PaymentRedirectPage<'a> {
    target_url: &'a str,
    fields: &'a [FormField],
}

impl ExternalRedirect {
    /// Build the redirect from the backend's payment initiation.
    ///
    /// Parameter values are passed through: strings as-is, `null` as empty,
    /// anything else in its JSON form.
    #[must_use]
    pub fn from_payment(payment: PaymentInitiation) -> Self {
        let form_fields = payment
            .params
            .into_iter()
            .map(|(name, value)| FormField {
                name,
                value: match value {
                    Value::String(s) => s,
                    Value::Null => String::new(),
                    other => other.to_string(),
                },
            })
            .collect();

        Self {
            target_url: payment.payu_url,
            form_fields,
        }
    }

    /// Value of a form field.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        self.form_fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
    }

    /// Render an HTML page that auto-submits the hidden form.
    ///
    /// # Errors
    ///
    /// Returns an error if template rendering fails.
    pub fn render_html(&self) -> askama::Result<String> {
        PaymentRedirectPage {
            target_url: self.target_url.as_str(),
            fields: &self.form_fields,
        }
        .render()
    }
}
