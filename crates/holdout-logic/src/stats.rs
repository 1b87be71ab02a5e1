//! World stats: the settlement's morale, supplies, threat and population.
//!
//! A `WorldStats` value is never mutated in place by the simulation: each
//! day derives a new snapshot from the previous one plus deltas. Morale,
//! supplies and threat live on a 0–100 scale and are clamped after every
//! change. Population has a floor of 10 and a soft cap that completed
//! projects can raise.

use serde::{Deserialize, Serialize};

/// Lower bound for morale, supplies and threat.
pub const STAT_MIN: i32 = 0;
/// Upper bound for morale, supplies and threat.
pub const STAT_MAX: i32 = 100;

/// Clamp a core stat into `[STAT_MIN, STAT_MAX]`.
pub fn clamp_stat(value: i32) -> i32 {
    value.clamp(STAT_MIN, STAT_MAX)
}

/// Signed changes to the world stats.
///
/// Population is optional on event options and defaults to zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatDeltas {
    #[serde(default)]
    pub morale: i32,
    #[serde(default)]
    pub supplies: i32,
    #[serde(default)]
    pub threat: i32,
    #[serde(default)]
    pub population: i32,
}

impl StatDeltas {
    pub const ZERO: StatDeltas = StatDeltas {
        morale: 0,
        supplies: 0,
        threat: 0,
        population: 0,
    };

    /// Deltas for the three core stats, no population change.
    pub const fn new(morale: i32, supplies: i32, threat: i32) -> Self {
        Self {
            morale,
            supplies,
            threat,
            population: 0,
        }
    }

    pub fn with_population(mut self, population: i32) -> Self {
        self.population = population;
        self
    }

    /// Component-wise sum.
    pub fn plus(self, other: StatDeltas) -> StatDeltas {
        StatDeltas {
            morale: self.morale + other.morale,
            supplies: self.supplies + other.supplies,
            threat: self.threat + other.threat,
            population: self.population + other.population,
        }
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

/// Inclusive population bounds for one day transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopulationBounds {
    pub floor: i32,
    pub cap: i32,
}

impl PopulationBounds {
    pub fn clamp(&self, population: i32) -> i32 {
        // An oversized floor wins over a shrunken cap.
        population.min(self.cap).max(self.floor)
    }
}

impl Default for PopulationBounds {
    fn default() -> Self {
        Self { floor: 10, cap: 50 }
    }
}

/// The settlement's state at the start or end of a day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldStats {
    pub morale: i32,
    pub supplies: i32,
    pub threat: i32,
    pub population: i32,
    #[serde(default)]
    pub last_event_summary: String,
}

impl Default for WorldStats {
    fn default() -> Self {
        Self {
            morale: 70,
            supplies: 80,
            threat: 30,
            population: 20,
            last_event_summary: "Genesis".to_string(),
        }
    }
}

impl WorldStats {
    pub fn new(morale: i32, supplies: i32, threat: i32) -> Self {
        Self {
            morale: clamp_stat(morale),
            supplies: clamp_stat(supplies),
            threat: clamp_stat(threat),
            ..Self::default()
        }
    }

    pub fn with_population(mut self, population: i32) -> Self {
        self.population = population;
        self
    }

    /// Derive the next snapshot: add `deltas`, clamp the core stats to
    /// 0–100 and population to `bounds`. The summary is carried over.
    pub fn apply(&self, deltas: &StatDeltas, bounds: &PopulationBounds) -> WorldStats {
        WorldStats {
            morale: clamp_stat(self.morale.saturating_add(deltas.morale)),
            supplies: clamp_stat(self.supplies.saturating_add(deltas.supplies)),
            threat: clamp_stat(self.threat.saturating_add(deltas.threat)),
            population: bounds.clamp(self.population.saturating_add(deltas.population)),
            last_event_summary: self.last_event_summary.clone(),
        }
    }

    /// Same as [`apply`](Self::apply) for the core stats only; population is
    /// left untouched.
    pub fn apply_core(&self, deltas: &StatDeltas) -> WorldStats {
        WorldStats {
            morale: clamp_stat(self.morale.saturating_add(deltas.morale)),
            supplies: clamp_stat(self.supplies.saturating_add(deltas.supplies)),
            threat: clamp_stat(self.threat.saturating_add(deltas.threat)),
            population: self.population,
            last_event_summary: self.last_event_summary.clone(),
        }
    }

    /// Any stat in the danger zone used for disaster amplification.
    pub fn is_strained(&self) -> bool {
        self.supplies < 40 || self.morale < 40 || self.threat > 60
    }

    /// True when all three core stats are within 0–100.
    pub fn in_bounds(&self) -> bool {
        [self.morale, self.supplies, self.threat]
            .iter()
            .all(|v| (STAT_MIN..=STAT_MAX).contains(v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_clamps_core_stats() {
        let stats = WorldStats::new(95, 5, 50);
        let next = stats.apply(
            &StatDeltas::new(40, -40, 1000),
            &PopulationBounds::default(),
        );
        assert_eq!(next.morale, 100);
        assert_eq!(next.supplies, 0);
        assert_eq!(next.threat, 100);
        assert!(next.in_bounds());
    }

    #[test]
    fn test_apply_population_bounds() {
        let stats = WorldStats::new(50, 50, 50).with_population(12);
        let bounds = PopulationBounds { floor: 10, cap: 50 };
        let shrunk = stats.apply(&StatDeltas::ZERO.with_population(-5), &bounds);
        assert_eq!(shrunk.population, 10);
        let grown = stats.apply(&StatDeltas::ZERO.with_population(100), &bounds);
        assert_eq!(grown.population, 50);
    }

    #[test]
    fn test_apply_does_not_mutate_source() {
        let stats = WorldStats::default();
        let _ = stats.apply(&StatDeltas::new(-10, -10, 10), &PopulationBounds::default());
        assert_eq!(stats, WorldStats::default());
    }

    #[test]
    fn test_new_clamps_inputs() {
        let stats = WorldStats::new(-5, 150, 100);
        assert_eq!((stats.morale, stats.supplies, stats.threat), (0, 100, 100));
    }

    #[test]
    fn test_deltas_plus() {
        let sum = StatDeltas::new(1, 2, 3).plus(StatDeltas::new(-1, -2, -3).with_population(2));
        assert_eq!(sum, StatDeltas::ZERO.with_population(2));
        assert!(!sum.is_zero());
    }

    #[test]
    fn test_strained() {
        assert!(!WorldStats::new(70, 80, 30).is_strained());
        assert!(WorldStats::new(39, 80, 30).is_strained());
        assert!(WorldStats::new(70, 80, 61).is_strained());
    }
}
