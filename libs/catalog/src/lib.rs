//! Static storefront catalog.
//!
//! A [`Catalog`] maps shop identifiers to a [`Shop`]: the recipient that receives order
//! notifications plus the ordered list of [`Item`]s offered. Catalogs are built once at
//! start-up (usually from a YAML file via [`Catalog::load`]) and are read-only afterwards.

mod price;

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

pub use price::Price;

/// Currency prefix used when a catalog file does not name one.
pub const DEFAULT_CURRENCY: &str = "$";

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("read catalog {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse catalog {origin}")]
    Parse {
        origin: String,
        #[source]
        source: serde_yaml_bw::Error,
    },
    #[error("invalid shop id {0:?}: ids must be non-empty and contain no whitespace")]
    InvalidShopId(String),
    #[error("shop {0:?} has no owner_id")]
    MissingOwner(String),
    #[error("shop {shop:?} item #{index}: {reason}")]
    InvalidItem {
        shop: String,
        index: usize,
        reason: &'static str,
    },
}

/// Opaque identifier of a chat that receives order notifications.
///
/// Telegram accepts either a numeric chat id or a public `@username`; both are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RecipientId(String);

impl RecipientId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecipientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for RecipientId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Numeric(i64),
            Text(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Numeric(id) => RecipientId(id.to_string()),
            Raw::Text(id) => RecipientId(id.trim().to_string()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Item {
    pub name: String,
    #[serde(default)]
    pub tag: String,
    pub price: Price,
    pub image: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Shop {
    pub owner_id: RecipientId,
    #[serde(default)]
    pub items: Vec<Item>,
}

impl Shop {
    pub fn item(&self, index: usize) -> Option<&Item> {
        self.items.get(index)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Catalog {
    #[serde(default = "default_currency")]
    currency: String,
    #[serde(default)]
    shops: BTreeMap<String, Shop>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            currency: default_currency(),
            shops: BTreeMap::new(),
        }
    }
}

impl Catalog {
    /// Builds a validated catalog from in-memory shop definitions.
    pub fn new(
        currency: impl Into<String>,
        shops: impl IntoIterator<Item = (String, Shop)>,
    ) -> Result<Self, CatalogError> {
        let catalog = Self {
            currency: currency.into(),
            shops: shops.into_iter().collect(),
        };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Reads and validates a YAML catalog file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::parse(&raw, &path.display().to_string())?;
        debug!(
            path = %path.display(),
            shops = catalog.shops.len(),
            "catalog loaded"
        );
        Ok(catalog)
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self, CatalogError> {
        Self::parse(raw, "<inline>")
    }

    fn parse(raw: &str, origin: &str) -> Result<Self, CatalogError> {
        let catalog: Catalog =
            serde_yaml_bw::from_str(raw).map_err(|source| CatalogError::Parse {
                origin: origin.to_string(),
                source,
            })?;
        catalog.validate()?;
        Ok(catalog)
    }

    fn validate(&self) -> Result<(), CatalogError> {
        for (id, shop) in &self.shops {
            if id.is_empty() || id.chars().any(char::is_whitespace) {
                return Err(CatalogError::InvalidShopId(id.clone()));
            }
            if shop.owner_id.as_str().is_empty() {
                return Err(CatalogError::MissingOwner(id.clone()));
            }
            for (index, item) in shop.items.iter().enumerate() {
                let reason = if item.name.trim().is_empty() {
                    Some("name is empty")
                } else if item.image.trim().is_empty() {
                    Some("image is empty")
                } else {
                    None
                };
                if let Some(reason) = reason {
                    return Err(CatalogError::InvalidItem {
                        shop: id.clone(),
                        index,
                        reason,
                    });
                }
            }
        }
        Ok(())
    }

    /// Looks up a shop; an unknown id is an ordinary `None`.
    pub fn lookup(&self, shop_id: &str) -> Option<&Shop> {
        self.shops.get(shop_id)
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn shop_ids(&self) -> impl Iterator<Item = &str> {
        self.shops.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.shops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shops.is_empty()
    }
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}
