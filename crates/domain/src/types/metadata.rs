//! Token metadata document schema.
//!
//! The off-chain document a token URI points at is locked to
//! `{name, description, image, attributes[]}` where each attribute is
//! `{trait_type, value}`. Wallets and marketplaces parse exactly this shape.

use serde::{Deserialize, Serialize};

/// An attribute value: free text or a number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TraitValue {
    Text(String),
    Number(u64),
}

/// A single `{trait_type, value}` attribute entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraitEntry {
    pub trait_type: String,
    pub value: TraitValue,
}

impl TraitEntry {
    pub fn text(trait_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            trait_type: trait_type.into(),
            value: TraitValue::Text(value.into()),
        }
    }

    pub fn number(trait_type: impl Into<String>, value: u64) -> Self {
        Self {
            trait_type: trait_type.into(),
            value: TraitValue::Number(value),
        }
    }
}

/// The schema-locked metadata document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    pub name: String,
    pub description: String,
    /// HTTP-resolvable image URL (wallets prefer gateway URLs over the
    /// canonical scheme).
    pub image: String,
    pub attributes: Vec<TraitEntry>,
}

impl TokenMetadata {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        image: impl Into<String>,
        attributes: Vec<TraitEntry>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            image: image.into(),
            attributes,
        }
    }
}
