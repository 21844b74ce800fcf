//! Processing categories.
//!
//! A category selects which prompt/parameter bundle the enhancement run uses.
//! Wire tags are the Portuguese identifiers the web client sends.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Wire tags
// ---------------------------------------------------------------------------

pub const TAG_FOOD: &str = "alimentos";
pub const TAG_VEHICLES: &str = "veiculos";
pub const TAG_REAL_ESTATE: &str = "imoveis";
pub const TAG_PRODUCTS: &str = "produtos";

// ---------------------------------------------------------------------------
// Enum
// ---------------------------------------------------------------------------

/// Category of photograph being enhanced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingType {
    Food,
    Vehicles,
    RealEstate,
    Products,
}

impl ProcessingType {
    pub const ALL: [ProcessingType; 4] = [
        ProcessingType::Food,
        ProcessingType::Vehicles,
        ProcessingType::RealEstate,
        ProcessingType::Products,
    ];

    /// Parse a wire tag. Returns `None` for any other string; matching is
    /// exact.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            TAG_FOOD => Some(Self::Food),
            TAG_VEHICLES => Some(Self::Vehicles),
            TAG_REAL_ESTATE => Some(Self::RealEstate),
            TAG_PRODUCTS => Some(Self::Products),
            _ => None,
        }
    }

    /// Wire tag, also used as the `category` key in `category_prompt_settings`.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Food => TAG_FOOD,
            Self::Vehicles => TAG_VEHICLES,
            Self::RealEstate => TAG_REAL_ESTATE,
            Self::Products => TAG_PRODUCTS,
        }
    }
}

impl fmt::Display for ProcessingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}
