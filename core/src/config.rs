use crate::{catalog::ValuableType, types::millis};
use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaveConfig {
    pub save_dir:          String,
    /// File extension, without the dot.
    pub extension:         String,
    /// Newest N files per nickname survive each save.
    pub backup_save_slots: usize,
    pub re_save_delay_ms:  u64,
    /// How many times `load` may create-and-retry before giving up.
    pub load_retry_limit:  u32,
}

impl Default for SaveConfig {
    fn default() -> Self {
        Self {
            save_dir:          "./saves".into(),
            extension:         "json".into(),
            backup_save_slots: 10,
            re_save_delay_ms:  1_000,
            load_retry_limit:  3,
        }
    }
}

impl SaveConfig {
    pub fn re_save_delay(&self) -> TimeDelta {
        millis(self.re_save_delay_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Backlog cap per throw-to-throw session, copied into each new Hand.
    pub generate_time_limit_ms: u64,
    /// Rate (items/second) each valuable starts with in a new save.
    /// Types not listed start at zero.
    pub starting_rates:         BTreeMap<ValuableType, f64>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            generate_time_limit_ms: 60_000,
            starting_rates:         [(ValuableType::Coin, 1.0)].into(),
        }
    }
}

impl GenerationConfig {
    pub fn generate_time_limit(&self) -> TimeDelta {
        millis(self.generate_time_limit_ms)
    }

    pub fn starting_rate(&self, valuable_type: ValuableType) -> f64 {
        self.starting_rates.get(&valuable_type).copied().unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FountainConfig {
    pub save:       SaveConfig,
    pub generation: GenerationConfig,
}

impl FountainConfig {
    /// Load from a JSON file. Missing keys fall back to defaults.
    /// In tests, use FountainConfig::default_test().
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults pointed at `save_dir`, for tests that need their own directory.
    pub fn default_test(save_dir: &str) -> Self {
        Self {
            save: SaveConfig { save_dir: save_dir.into(), ..SaveConfig::default() },
            generation: GenerationConfig::default(),
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.save.backup_save_slots == 0 {
            anyhow::bail!("save.backup_save_slots must be at least 1");
        }
        if self.save.extension.is_empty() || self.save.extension.contains('.') {
            anyhow::bail!("save.extension must be a bare extension, got '{}'", self.save.extension);
        }
        for (valuable_type, rate) in &self.generation.starting_rates {
            if !rate.is_finite() || *rate < 0.0 {
                anyhow::bail!("generation.starting_rates.{valuable_type} must be finite and >= 0, got {rate}");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: FountainConfig =
            serde_json::from_str(r#"{ "save": { "backup_save_slots": 4 } }"#).unwrap();
        assert_eq!(config.save.backup_save_slots, 4);
        assert_eq!(config.save.re_save_delay(), TimeDelta::seconds(1));
        assert_eq!(config.generation.starting_rate(ValuableType::Coin), 1.0);
        assert_eq!(config.generation.starting_rate(ValuableType::Gem), 0.0);
    }

    #[test]
    fn rejects_zero_backup_slots() {
        let mut config = FountainConfig::default();
        config.save.backup_save_slots = 0;
        assert!(config.validate().is_err());
    }
}
