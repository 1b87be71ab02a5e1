//! Simulation tuning: selection multipliers, thresholds and starting stats.
//!
//! Every knob has a default matching live balance, so an empty JSON object
//! is a valid config. Hosts override only what they need.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::stats::{PopulationBounds, StatDeltas, WorldStats};

/// Weight multipliers applied per category in the non-crisis draw.
/// Must stay ordered opportunity > narrative > general.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionWeights {
    pub opportunity: u32,
    pub narrative: u32,
    pub general: u32,
}

impl Default for SelectionWeights {
    fn default() -> Self {
        Self {
            opportunity: 3,
            narrative: 2,
            general: 1,
        }
    }
}

/// Any one of these puts the settlement in crisis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrisisThresholds {
    pub morale_below: i32,
    pub supplies_below: i32,
    pub threat_above: i32,
}

impl Default for CrisisThresholds {
    fn default() -> Self {
        Self {
            morale_below: 30,
            supplies_below: 30,
            threat_above: 70,
        }
    }
}

impl CrisisThresholds {
    pub fn is_crisis(&self, stats: &WorldStats) -> bool {
        stats.morale < self.morale_below
            || stats.supplies < self.supplies_below
            || stats.threat > self.threat_above
    }
}

/// All of these must hold for opportunities to enter the draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StabilityThresholds {
    pub morale_above: i32,
    pub supplies_above: i32,
    pub threat_below: i32,
}

impl Default for StabilityThresholds {
    fn default() -> Self {
        Self {
            morale_above: 50,
            supplies_above: 50,
            threat_below: 50,
        }
    }
}

impl StabilityThresholds {
    pub fn is_stable(&self, stats: &WorldStats) -> bool {
        stats.morale > self.morale_above
            && stats.supplies > self.supplies_above
            && stats.threat < self.threat_below
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub selection: SelectionWeights,
    pub crisis: CrisisThresholds,
    pub stability: StabilityThresholds,
    /// Daily probability of a random disaster.
    pub disaster_chance: f64,
    pub population_floor: i32,
    /// Cap before housing projects add capacity.
    pub population_base_cap: i32,
    /// Stats for day 1 and after a reset.
    pub genesis: WorldStats,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            selection: SelectionWeights::default(),
            crisis: CrisisThresholds::default(),
            stability: StabilityThresholds::default(),
            disaster_chance: 0.15,
            population_floor: 10,
            population_base_cap: 50,
            genesis: WorldStats::default(),
        }
    }
}

impl SimConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let w = &self.selection;
        if !(w.opportunity > w.narrative && w.narrative > w.general && w.general > 0) {
            return Err(ConfigError::MultiplierOrder {
                opportunity: w.opportunity,
                narrative: w.narrative,
                general: w.general,
            });
        }
        if !(0.0..=1.0).contains(&self.disaster_chance) {
            return Err(ConfigError::DisasterChance(self.disaster_chance));
        }
        if self.population_floor > self.population_base_cap {
            return Err(ConfigError::PopulationBounds {
                floor: self.population_floor,
                cap: self.population_base_cap,
            });
        }
        Ok(())
    }

    /// Genesis stats forced into range: core stats to 0–100, population to
    /// the base bounds.
    pub fn genesis_stats(&self) -> WorldStats {
        self.genesis
            .apply(&StatDeltas::ZERO, &self.population_bounds(0))
    }

    /// Population bounds once `capacity_bonus` from projects is added.
    pub fn population_bounds(&self, capacity_bonus: i32) -> PopulationBounds {
        PopulationBounds {
            floor: self.population_floor,
            cap: self.population_base_cap + capacity_bonus,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(SimConfig::default().validate().is_ok());
    }

    #[test]
    fn test_empty_json_uses_defaults() {
        let config = SimConfig::from_json_str("{}").unwrap();
        assert_eq!(config, SimConfig::default());
    }

    #[test]
    fn test_partial_override() {
        let config =
            SimConfig::from_json_str(r#"{"selection": {"opportunity": 5}, "disaster_chance": 0.0}"#)
                .unwrap();
        assert_eq!(config.selection.opportunity, 5);
        assert_eq!(config.selection.narrative, 2);
        assert_eq!(config.disaster_chance, 0.0);
    }

    #[test]
    fn test_rejects_reordered_multipliers() {
        let err = SimConfig::from_json_str(r#"{"selection": {"opportunity": 2, "narrative": 2}}"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::MultiplierOrder { .. }));
    }

    #[test]
    fn test_rejects_bad_chance_and_population() {
        assert!(matches!(
            SimConfig::from_json_str(r#"{"disaster_chance": 1.5}"#),
            Err(ConfigError::DisasterChance(_))
        ));
        assert!(matches!(
            SimConfig::from_json_str(r#"{"population_floor": 60}"#),
            Err(ConfigError::PopulationBounds { .. })
        ));
    }

    #[test]
    fn test_thresholds() {
        let crisis = CrisisThresholds::default();
        assert!(crisis.is_crisis(&WorldStats::new(29, 80, 30)));
        assert!(crisis.is_crisis(&WorldStats::new(70, 80, 71)));
        assert!(!crisis.is_crisis(&WorldStats::new(30, 30, 70)));

        let stability = StabilityThresholds::default();
        assert!(stability.is_stable(&WorldStats::new(51, 51, 49)));
        assert!(!stability.is_stable(&WorldStats::new(50, 80, 20)));
    }

    #[test]
    fn test_out_of_range_genesis_is_clamped() {
        let config = SimConfig::from_json_str(
            r#"{"genesis": {"morale": 500, "supplies": -20, "threat": 30, "population": 3}}"#,
        )
        .unwrap();
        let stats = config.genesis_stats();
        assert_eq!((stats.morale, stats.supplies, stats.threat), (100, 0, 30));
        assert_eq!(stats.population, 10);
        assert!(stats.in_bounds());
    }

    #[test]
    fn test_population_bounds_with_bonus() {
        let bounds = SimConfig::default().population_bounds(20);
        assert_eq!(bounds, PopulationBounds { floor: 10, cap: 70 });
    }
}
