//! Speed-class and item-ruleset categories.
//!
//! Every recorded time belongs to exactly one (speed class, item ruleset)
//! combination. Encoding the pair as enums makes invalid combinations
//! unrepresentable instead of a runtime lookup miss on free-form strings.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors for category values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CategoryError {
    /// Unknown speed class label.
    #[error("invalid speed class: {value}")]
    InvalidSpeedClass { value: String },

    /// Unknown item ruleset label.
    #[error("invalid item ruleset: {value}")]
    InvalidItemRule { value: String },
}

/// The game's speed multiplier class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeedClass {
    /// 150cc, the standard time-trial class.
    #[serde(rename = "150cc")]
    Cc150,
    /// 200cc, the fast class.
    #[serde(rename = "200cc")]
    Cc200,
}

impl SpeedClass {
    /// String representation used in storage and on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cc150 => "150cc",
            Self::Cc200 => "200cc",
        }
    }
}

impl fmt::Display for SpeedClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SpeedClass {
    type Err = CategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "150cc" | "150" => Ok(Self::Cc150),
            "200cc" | "200" => Ok(Self::Cc200),
            _ => Err(CategoryError::InvalidSpeedClass {
                value: s.to_string(),
            }),
        }
    }
}

/// The item-usage convention a time was set under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemRule {
    /// Unrestricted item use (mushrooms allowed).
    Shrooms,
    /// No-item time attack.
    Nita,
}

impl ItemRule {
    /// String representation used in storage and on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Shrooms => "shrooms",
            Self::Nita => "nita",
        }
    }
}

impl fmt::Display for ItemRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ItemRule {
    type Err = CategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "shrooms" => Ok(Self::Shrooms),
            "nita" => Ok(Self::Nita),
            _ => Err(CategoryError::InvalidItemRule {
                value: s.to_string(),
            }),
        }
    }
}

/// A (speed class, item ruleset) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Category {
    pub speed: SpeedClass,
    pub items: ItemRule,
}

impl Category {
    /// All valid combinations, in a stable order.
    pub const ALL: [Self; 4] = [
        Self {
            speed: SpeedClass::Cc150,
            items: ItemRule::Shrooms,
        },
        Self {
            speed: SpeedClass::Cc150,
            items: ItemRule::Nita,
        },
        Self {
            speed: SpeedClass::Cc200,
            items: ItemRule::Shrooms,
        },
        Self {
            speed: SpeedClass::Cc200,
            items: ItemRule::Nita,
        },
    ];

    #[must_use]
    pub const fn new(speed: SpeedClass, items: ItemRule) -> Self {
        Self { speed, items }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.speed, self.items)
    }
}
