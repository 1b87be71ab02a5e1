//! Error types for catalog loading, configuration and the day driver.
//!
//! Nothing inside a day transition can fail: clamping and fallback
//! templates absorb bad state. Errors only come from loading external
//! content or from misusing the [`Simulation`](crate::simulation::Simulation).

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::resolution::Ending;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("failed to parse custom templates: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read custom templates from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("template {id} needs at least two options, found {found}")]
    TooFewOptions { id: String, found: usize },
    #[error("template {id} repeats option key {key}")]
    DuplicateOption { id: String, key: String },
    #[error("template {id} has zero weight")]
    ZeroWeight { id: String },
    #[error("template {id} weight {weight} exceeds the maximum of {max}")]
    WeightTooLarge { id: String, weight: u32, max: u32 },
    #[error("template {id} has invalid {stat} bounds {min}..={max}")]
    InvalidBounds {
        id: String,
        stat: &'static str,
        min: i32,
        max: i32,
    },
    #[error("template id {id} is already in the pool")]
    DuplicateTemplate { id: String },
    #[error("template id must not be empty")]
    EmptyId,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse simulation config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read simulation config from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(
        "selection multipliers must satisfy opportunity > narrative > general > 0, got {opportunity}/{narrative}/{general}"
    )]
    MultiplierOrder {
        opportunity: u32,
        narrative: u32,
        general: u32,
    },
    #[error("disaster chance {0} is outside 0..=1")]
    DisasterChance(f64),
    #[error("population floor {floor} exceeds base cap {cap}")]
    PopulationBounds { floor: i32, cap: i32 },
}

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("failed to parse project catalog: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read project catalog from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("duplicate project id {id}")]
    Duplicate { id: u32 },
    #[error("project {id} has zero cost")]
    ZeroCost { id: u32 },
    #[error("project {id} buff value {value} is outside 0..={max}")]
    BuffValue { id: u32, value: i32, max: i32 },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SimError {
    #[error("simulation ended on day {day}: {ending}")]
    Ended { day: u32, ending: Ending },
    #[error("no completed day to rewind")]
    NothingToRewind,
}
