//! Newtype IDs for type-safe entity references.
//!
//! The storefront backend issues opaque string identifiers (document ids), so
//! every ID wraps a `String`. Use the `define_id!` macro to create wrappers that
//! prevent accidentally mixing IDs from different entity types.

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Conversion methods: `new()`, `as_str()`, `into_inner()`
/// - `From<String>`, `From<&str>` and `Display` implementations
///
/// # Example
///
/// ```rust
/// # use shopfront_core::define_id;
/// define_id!(UserId);
/// define_id!(OrderId);
///
/// let user_id = UserId::new("65f1c0");
/// let order_id = OrderId::new("65f1c0");
///
/// // These are different types, so this won't compile:
/// // let _: UserId = order_id;
/// assert_eq!(user_id.as_str(), order_id.as_str());
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from any string-like value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the underlying string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the ID and return the inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

// Define standard entity IDs
define_id!(UserId);
define_id!(ProductId);
define_id!(OrderId);
define_id!(OrderLineId);

/// Returned when a backend document carries no id under either key.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("document has neither `_id` nor `id`")]
pub struct MissingDocumentId;

/// The id keys of a backend document.
///
/// Documents may carry `_id`, `id`, or both (virtuals enabled); `_id` wins.
/// Flatten this into wire structs. A serde alias rejects documents that send
/// both keys.
#[derive(Debug, Clone, PartialEq, Eq, ::serde::Deserialize)]
#[serde(bound(deserialize = "T: ::serde::Deserialize<'de>"))]
pub struct DocumentKeys<T> {
    #[serde(default, rename = "_id")]
    document_id: Option<T>,
    #[serde(default)]
    id: Option<T>,
}

impl<T> DocumentKeys<T> {
    /// The document id, if either key was present.
    #[must_use]
    pub fn into_id(self) -> Option<T> {
        self.document_id.or(self.id)
    }

    /// The document id.
    ///
    /// # Errors
    ///
    /// Returns [`MissingDocumentId`] if neither key was present.
    pub fn require(self) -> Result<T, MissingDocumentId> {
        self.into_id().ok_or(MissingDocumentId)
    }
}
