//! Catalog products as seen by the client.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use super::id::{DocumentKeys, MissingDocumentId, ProductId};
use super::price::Price;

/// Product category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Clothing,
    Accessories,
    Shoes,
    Bags,
    /// Any category this client does not know about.
    #[serde(other)]
    Other,
}

impl Category {
    /// Query-string / wire name of the category.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Clothing => "clothing",
            Self::Accessories => "accessories",
            Self::Shoes => "shoes",
            Self::Bags => "bags",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category filter used when browsing the catalog.
///
/// `All` means no category constraint is sent to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    /// The category to send as a query parameter, if any.
    #[must_use]
    pub const fn category(&self) -> Option<Category> {
        match self {
            Self::All => None,
            Self::Only(category) => Some(*category),
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "all" => Ok(Self::All),
            "clothing" => Ok(Self::Only(Category::Clothing)),
            "accessories" => Ok(Self::Only(Category::Accessories)),
            "shoes" => Ok(Self::Only(Category::Shoes)),
            "bags" => Ok(Self::Only(Category::Bags)),
            other => Err(format!("unknown category: {other}")),
        }
    }
}

/// A catalog product. Immutable from the client's perspective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "ProductDocument")]
pub struct Product {
    /// Backend document id (`_id` on the wire, `id` in the static catalog).
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    pub category: Category,
    /// Image URI.
    pub image: String,
    pub description: String,
    pub rating: f64,
    pub in_stock: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductDocument {
    #[serde(flatten)]
    keys: DocumentKeys<ProductId>,
    name: String,
    price: Price,
    #[serde(default = "default_category")]
    category: Category,
    #[serde(default)]
    image: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    rating: f64,
    #[serde(default = "default_in_stock")]
    in_stock: bool,
}

impl TryFrom<ProductDocument> for Product {
    type Error = MissingDocumentId;

    fn try_from(doc: ProductDocument) -> Result<Self, Self::Error> {
        Ok(Self {
            id: doc.keys.require()?,
            name: doc.name,
            price: doc.price,
            category: doc.category,
            image: doc.image,
            description: doc.description,
            rating: doc.rating,
            in_stock: doc.in_stock,
        })
    }
}

const fn default_category() -> Category {
    Category::Other
}

const fn default_in_stock() -> bool {
    true
}
