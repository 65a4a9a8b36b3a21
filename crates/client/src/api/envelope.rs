//! Response envelope normalization.
//!
//! The storefront backend is inconsistent about wrapping payloads. A body may
//! arrive as `{"data": {"data": T}}`, `{"data": T}` or a bare `T`. [`Envelope`]
//! accepts all three, trying them in that precedence order, so callers only
//! ever see `T`.

use serde::Deserialize;

/// One of the three shapes a successful response body can take.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Envelope<T> {
    /// `{"data": {"data": T}}`
    Nested { data: Inner<T> },
    /// `{"data": T}`
    Wrapped { data: T },
    /// `T`
    Bare(T),
}

/// Inner `{"data": T}` object of a nested envelope.
#[derive(Debug, Deserialize)]
pub struct Inner<T> {
    data: T,
}

impl<T> Envelope<T> {
    /// Unwrap the payload.
    pub fn into_inner(self) -> T {
        match self {
            Self::Nested { data } => data.data,
            Self::Wrapped { data } | Self::Bare(data) => data,
        }
    }
}

/// Parse a response body, unwrapping whichever envelope it uses.
///
/// # Errors
///
/// Returns the JSON error if the body matches none of the shapes.
pub fn unwrap_body<T>(body: &str) -> Result<T, serde_json::Error>
where
    T: for<'de> Deserialize<'de>,
{
    serde_json::from_str::<Envelope<T>>(body).map(Envelope::into_inner)
}
