//! Asset records and collections
//!
//! Assets are built once per run by the [`AssetRegistry`] and never mutated.
//! Collection order is the column order of every downstream matrix.

mod registry;

pub use registry::{AssetRegistry, AssetSpec, DEFAULT_CRYPTO_EXCHANGE};

use crate::error::{PortfolioError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Supported asset classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetType {
    Stock,
    Etf,
    Crypto,
    Bond,
}

impl AssetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stock => "stock",
            Self::Etf => "etf",
            Self::Crypto => "crypto",
            Self::Bond => "bond",
        }
    }
}

impl FromStr for AssetType {
    type Err = PortfolioError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "stock" => Ok(Self::Stock),
            "etf" => Ok(Self::Etf),
            "crypto" => Ok(Self::Crypto),
            "bond" => Ok(Self::Bond),
            _ => Err(PortfolioError::UnknownAssetType(s.to_string())),
        }
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Class-specific attributes
#[derive(Debug, Clone, PartialEq)]
pub enum AssetDetails {
    Stock { sector: Option<String> },
    Etf { category: Option<String> },
    Crypto { exchange: String },
    Bond {
        coupon_rate: Option<f64>,
        maturity_years: Option<u32>,
    },
}

/// A single tradable instrument
#[derive(Debug, Clone, PartialEq)]
pub struct Asset {
    name: String,
    symbol: String,
    details: AssetDetails,
}

impl Asset {
    pub(crate) fn new(name: String, symbol: String, details: AssetDetails) -> Self {
        Self {
            name,
            symbol,
            details,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn details(&self) -> &AssetDetails {
        &self.details
    }

    pub fn asset_type(&self) -> AssetType {
        match self.details {
            AssetDetails::Stock { .. } => AssetType::Stock,
            AssetDetails::Etf { .. } => AssetType::Etf,
            AssetDetails::Crypto { .. } => AssetType::Crypto,
            AssetDetails::Bond { .. } => AssetType::Bond,
        }
    }

    /// Name plus class-specific fields; unset fields are reported as null
    pub fn metadata(&self) -> Map<String, Value> {
        let mut meta = Map::new();
        meta.insert("name".into(), Value::from(self.name.clone()));
        match &self.details {
            AssetDetails::Stock { sector } => {
                meta.insert("sector".into(), sector.clone().map_or(Value::Null, Value::from));
            }
            AssetDetails::Etf { category } => {
                meta.insert("category".into(), category.clone().map_or(Value::Null, Value::from));
            }
            AssetDetails::Crypto { exchange } => {
                meta.insert("exchange".into(), Value::from(exchange.clone()));
            }
            AssetDetails::Bond {
                coupon_rate,
                maturity_years,
            } => {
                meta.insert("coupon_rate".into(), coupon_rate.map_or(Value::Null, Value::from));
                meta.insert(
                    "maturity_years".into(),
                    maturity_years.map_or(Value::Null, Value::from),
                );
            }
        }
        meta
    }

    pub fn describe(&self) -> AssetDescription {
        AssetDescription {
            symbol: self.symbol.clone(),
            asset_type: self.asset_type(),
            metadata: self.metadata(),
        }
    }
}

/// Flat, serializable view of an asset
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssetDescription {
    pub symbol: String,
    #[serde(rename = "type")]
    pub asset_type: AssetType,
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

/// Ordered set of assets with unique symbols
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssetCollection {
    assets: Vec<Asset>,
}

impl AssetCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an asset, rejecting a symbol that is already present
    pub fn add(&mut self, asset: Asset) -> Result<()> {
        if self.contains(asset.symbol()) {
            return Err(PortfolioError::DuplicateSymbol(asset.symbol().to_string()));
        }
        self.assets.push(asset);
        Ok(())
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.assets.iter().any(|a| a.symbol() == symbol)
    }

    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    pub fn symbols(&self) -> Vec<String> {
        self.assets.iter().map(|a| a.symbol().to_string()).collect()
    }

    pub fn describe(&self) -> Vec<AssetDescription> {
        self.assets.iter().map(Asset::describe).collect()
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}
