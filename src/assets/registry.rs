//! Construction of typed assets from raw specifications

use super::{Asset, AssetCollection, AssetDetails, AssetType};
use crate::error::{PortfolioError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Venue recorded for crypto assets that do not name one
pub const DEFAULT_CRYPTO_EXCHANGE: &str = "Binance";

/// Raw asset specification as supplied by the caller
///
/// ```json
/// {"asset_type": "bond", "name": "10Y Treasury", "symbol": "DGS10", "coupon_rate": 0.04}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetSpec {
    #[serde(alias = "type", alias = "asset")]
    pub asset_type: String,
    #[serde(default)]
    pub name: String,
    pub symbol: String,
    /// Class-specific fields (sector, category, exchange, coupon_rate, maturity_years)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AssetSpec {
    pub fn new(asset_type: &str, name: &str, symbol: &str) -> Self {
        Self {
            asset_type: asset_type.to_string(),
            name: name.to_string(),
            symbol: symbol.to_string(),
            extra: Map::new(),
        }
    }

    pub fn with_field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.extra.insert(key.to_string(), value.into());
        self
    }

    /// Read specs from a JSON file holding either a list or `{"assets": [...]}`
    pub fn load_file(path: &str) -> Result<Vec<AssetSpec>> {
        let path = shellexpand::tilde(path).into_owned();
        let content = std::fs::read_to_string(&path)?;
        Self::parse_list(&content)
    }

    pub fn parse_list(content: &str) -> Result<Vec<AssetSpec>> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum SpecFile {
            List(Vec<AssetSpec>),
            Wrapped { assets: Vec<AssetSpec> },
        }

        Ok(match serde_json::from_str::<SpecFile>(content)? {
            SpecFile::List(specs) | SpecFile::Wrapped { assets: specs } => specs,
        })
    }
}

/// Stateless asset factory
pub struct AssetRegistry;

impl AssetRegistry {
    /// Build one asset. `asset_type` is matched case-insensitively.
    pub fn create(
        asset_type: &str,
        name: &str,
        symbol: &str,
        extra: &Map<String, Value>,
    ) -> Result<Asset> {
        let kind: AssetType = asset_type.parse()?;

        let symbol = symbol.trim();
        if symbol.is_empty() {
            return Err(PortfolioError::InvalidAssetSpec(format!(
                "empty symbol for {} asset '{}'",
                kind, name
            )));
        }
        let name = if name.trim().is_empty() { symbol } else { name.trim() };

        let details = match kind {
            AssetType::Stock => AssetDetails::Stock {
                sector: string_field(extra, "sector")?,
            },
            AssetType::Etf => AssetDetails::Etf {
                category: string_field(extra, "category")?,
            },
            AssetType::Crypto => AssetDetails::Crypto {
                exchange: string_field(extra, "exchange")?
                    .unwrap_or_else(|| DEFAULT_CRYPTO_EXCHANGE.to_string()),
            },
            AssetType::Bond => AssetDetails::Bond {
                coupon_rate: f64_field(extra, "coupon_rate")?,
                maturity_years: u32_field(extra, "maturity_years")?,
            },
        };

        Ok(Asset::new(name.to_string(), symbol.to_string(), details))
    }

    pub fn from_spec(spec: &AssetSpec) -> Result<Asset> {
        Self::create(&spec.asset_type, &spec.name, &spec.symbol, &spec.extra)
    }

    /// Build a collection, failing on the first invalid spec
    pub fn build_collection(specs: &[AssetSpec]) -> Result<AssetCollection> {
        let mut collection = AssetCollection::new();
        for spec in specs {
            collection.add(Self::from_spec(spec)?)?;
        }
        Ok(collection)
    }
}

fn field<'a>(extra: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    extra.get(key).filter(|v| !v.is_null())
}

fn string_field(extra: &Map<String, Value>, key: &str) -> Result<Option<String>> {
    match field(extra, key) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(invalid_field(key, "a string", other)),
    }
}

fn f64_field(extra: &Map<String, Value>, key: &str) -> Result<Option<f64>> {
    match field(extra, key) {
        None => Ok(None),
        Some(v) => v
            .as_f64()
            .map(Some)
            .ok_or_else(|| invalid_field(key, "a number", v)),
    }
}

fn u32_field(extra: &Map<String, Value>, key: &str) -> Result<Option<u32>> {
    match field(extra, key) {
        None => Ok(None),
        Some(v) => v
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| invalid_field(key, "a non-negative integer", v)),
    }
}

fn invalid_field(key: &str, expected: &str, got: &Value) -> PortfolioError {
    PortfolioError::InvalidAssetSpec(format!("field '{}' must be {}, got {}", key, expected, got))
}
