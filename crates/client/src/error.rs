//! Error tracking helpers with Sentry integration.
//!
//! The client never panics on backend failures; errors flow back as values.
//! These helpers attach the trail of cart and checkout actions to Sentry so a
//! failed checkout can be diagnosed from the captured event.

use shopfront_core::{Email, UserId};

use crate::api::{ApiError, ErrorKind};

/// Capture an API error to Sentry when it is worth reporting.
///
/// Validation and authorization failures are user-caused and only logged.
/// Returns the Sentry event id for captured errors.
pub fn capture_api_error(context: &str, err: &ApiError) -> Option<sentry::types::Uuid> {
    match err.kind() {
        ErrorKind::Validation | ErrorKind::Authorization => {
            tracing::debug!(error = %err, context, "Not reporting user-caused error");
            None
        }
        ErrorKind::Network | ErrorKind::Business | ErrorKind::Decode => {
            let event_id = sentry::capture_error(err);
            tracing::error!(
                error = %err,
                context,
                sentry_event_id = %event_id,
                "Storefront API error"
            );
            Some(event_id)
        }
    }
}

/// Attach the signed-in shopper to every later Sentry event, or detach it
/// when `shopper` is `None`.
pub fn report_as_shopper(shopper: Option<(&UserId, &Email)>) {
    let user = shopper.map(|(user_id, email)| sentry::User {
        id: Some(user_id.to_string()),
        email: Some(email.as_str().to_owned()),
        ..Default::default()
    });
    sentry::configure_scope(|scope| scope.set_user(user));
}

/// Which flow a breadcrumb belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trail {
    Cart,
    Checkout,
}

impl Trail {
    const fn category(self) -> &'static str {
        match self {
            Self::Cart => "cart",
            Self::Checkout => "checkout",
        }
    }

    /// Leave a breadcrumb on this trail. `fields` become breadcrumb data.
    pub fn mark(self, message: &str, fields: &[(&str, &str)]) {
        sentry::add_breadcrumb(sentry::Breadcrumb {
            category: Some(self.category().to_owned()),
            message: Some(message.to_owned()),
            data: fields
                .iter()
                .map(|&(key, value)| (key.to_owned(), value.into()))
                .collect(),
            ..Default::default()
        });
    }
}
