//! Valuable catalog: the static registry of valuable types.
//!
//! RULE: models are created once and never mutated. Everything else
//! refers to a valuable by its `ValuableType` key and looks the model up.

use crate::error::{FountainError, FountainResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Closed set of valuable categories.
/// Variants are appended only; save files key on the snake_case name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValuableType {
    Coin,
    Gem,
    Fiduciary,
}

impl ValuableType {
    pub const ALL: [ValuableType; 3] = [Self::Coin, Self::Gem, Self::Fiduciary];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Coin      => "coin",
            Self::Gem       => "gem",
            Self::Fiduciary => "fiduciary",
        }
    }
}

impl fmt::Display for ValuableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ValuableType {
    type Err = FountainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| FountainError::UnknownValuable { name: s.to_string() })
    }
}

/// Singular/plural display noun.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Noun {
    pub singular: String,
    pub plural:   String,
}

impl Noun {
    pub fn new(singular: &str, plural: &str) -> Self {
        Self { singular: singular.into(), plural: plural.into() }
    }

    pub fn for_count(&self, count: u64) -> &str {
        if count == 1 { &self.singular } else { &self.plural }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValuableModel {
    pub valuable_type: ValuableType,
    /// Karma yielded when redeemed at base price.
    pub base_value:    i64,
    pub display_name:  Noun,
}

#[derive(Debug, Clone, Deserialize)]
struct ValuablesFile {
    valuables: Vec<ValuableModel>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValuableCatalog {
    models: BTreeMap<ValuableType, ValuableModel>,
}

impl ValuableCatalog {
    /// Build from a list of models. Rejects a type listed twice.
    pub fn from_models(models: Vec<ValuableModel>) -> FountainResult<Self> {
        let mut map = BTreeMap::new();
        for model in models {
            let valuable_type = model.valuable_type;
            if map.insert(valuable_type, model).is_some() {
                return Err(FountainError::DuplicateValuable { valuable_type });
            }
        }
        Ok(Self { models: map })
    }

    /// Load from `{data_dir}/valuables.json`.
    /// In tests, use ValuableCatalog::standard().
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let path = format!("{data_dir}/valuables.json");
        let content = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let file: ValuablesFile = serde_json::from_str(&content)?;
        let catalog = Self::from_models(file.valuables)?;
        log::debug!("catalog: loaded {} valuables from {path}", catalog.models.len());
        Ok(catalog)
    }

    /// The built-in catalog.
    pub fn standard() -> Self {
        let models = [
            (ValuableType::Coin,      1,   Noun::new("Coin", "Coins")),
            (ValuableType::Gem,       10,  Noun::new("Gem", "Gems")),
            (ValuableType::Fiduciary, 100, Noun::new("Fiduciary", "Fiduciaries")),
        ]
        .into_iter()
        .map(|(valuable_type, base_value, display_name)| {
            (valuable_type, ValuableModel { valuable_type, base_value, display_name })
        })
        .collect();
        Self { models }
    }

    pub fn lookup(&self, valuable_type: ValuableType) -> FountainResult<&ValuableModel> {
        self.models
            .get(&valuable_type)
            .ok_or(FountainError::CatalogMiss { valuable_type })
    }

    pub fn face_value(&self, valuable_type: ValuableType) -> FountainResult<i64> {
        Ok(self.lookup(valuable_type)?.base_value)
    }

    /// Every registered type, in declaration order.
    pub fn all_types(&self) -> impl Iterator<Item = ValuableType> + '_ {
        self.models.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_catalog_covers_every_type() {
        let catalog = ValuableCatalog::standard();
        let types: Vec<_> = catalog.all_types().collect();
        assert_eq!(types, ValuableType::ALL.to_vec());
        assert_eq!(catalog.face_value(ValuableType::Coin).unwrap(), 1);
    }

    #[test]
    fn lookup_miss_is_an_error() {
        let catalog = ValuableCatalog::from_models(vec![ValuableModel {
            valuable_type: ValuableType::Coin,
            base_value:    1,
            display_name:  Noun::new("Coin", "Coins"),
        }])
        .unwrap();
        let err = catalog.lookup(ValuableType::Gem).unwrap_err();
        assert!(matches!(err, FountainError::CatalogMiss { valuable_type: ValuableType::Gem }));
    }

    #[test]
    fn duplicate_models_are_rejected() {
        let coin = ValuableModel {
            valuable_type: ValuableType::Coin,
            base_value:    1,
            display_name:  Noun::new("Coin", "Coins"),
        };
        let err = ValuableCatalog::from_models(vec![coin.clone(), coin]).unwrap_err();
        assert!(matches!(err, FountainError::DuplicateValuable { .. }));
    }

    #[test]
    fn names_parse_back() {
        for t in ValuableType::ALL {
            assert_eq!(t.name().parse::<ValuableType>().unwrap(), t);
        }
        assert!("doubloon".parse::<ValuableType>().is_err());
    }

    #[test]
    fn noun_picks_plural() {
        let noun = Noun::new("Gem", "Gems");
        assert_eq!(noun.for_count(1), "Gem");
        assert_eq!(noun.for_count(0), "Gems");
        assert_eq!(noun.for_count(7), "Gems");
    }
}
