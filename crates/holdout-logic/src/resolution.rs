//! Vote resolution — tally, winner, stat deltas and endings.
//!
//! The winner is the option with the most votes; ties go to the
//! lexicographically smallest key, independent of vote arrival order.
//! With no votes at all the event's first option wins (positional, not
//! alphabetical).

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog::EventTemplate;
use crate::stats::{PopulationBounds, StatDeltas, WorldStats};

/// One voter's choice for the current day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub voter: u64,
    pub option: String,
}

impl Vote {
    pub fn new(voter: u64, option: &str) -> Self {
        Self {
            voter,
            option: option.to_string(),
        }
    }
}

/// Option key → vote count. Ordered by key so ties break alphabetically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteTally {
    counts: BTreeMap<String, u32>,
}

impl VoteTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count raw votes. A voter who voted more than once is counted once,
    /// for their latest vote.
    pub fn from_votes(votes: &[Vote]) -> Self {
        let mut latest: HashMap<u64, &str> = HashMap::new();
        for vote in votes {
            latest.insert(vote.voter, vote.option.as_str());
        }
        let mut tally = Self::new();
        for option in latest.into_values() {
            tally.add(option, 1);
        }
        tally
    }

    pub fn add(&mut self, option: &str, count: u32) {
        if count > 0 {
            *self.counts.entry(option.to_string()).or_insert(0) += count;
        }
    }

    pub fn count(&self, option: &str) -> u32 {
        self.counts.get(option).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u32 {
        self.counts.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.counts.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Keys with votes that are not options of `event`.
    pub fn unknown_options<'a>(&'a self, event: &EventTemplate) -> Vec<&'a str> {
        self.counts
            .keys()
            .filter(|k| event.find_option(k).is_none())
            .map(String::as_str)
            .collect()
    }

    /// Highest count, smallest key among ties. `None` when empty.
    pub fn leader(&self) -> Option<&str> {
        let mut best: Option<(&str, u32)> = None;
        for (key, count) in self.iter() {
            // Keys ascend, so strict `>` keeps the smallest tied key.
            if best.map_or(true, |(_, c)| count > c) {
                best = Some((key, count));
            }
        }
        best.map(|(k, _)| k)
    }
}

impl<'a> FromIterator<(&'a str, u32)> for VoteTally {
    fn from_iter<I: IntoIterator<Item = (&'a str, u32)>>(iter: I) -> Self {
        let mut tally = Self::new();
        for (option, count) in iter {
            tally.add(option, count);
        }
        tally
    }
}

/// How the settlement fell. Checked in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ending {
    /// Morale reached zero.
    HopeLost,
    /// Supplies reached zero.
    Starvation,
    /// Threat reached 100.
    Overrun,
}

impl Ending {
    /// The first ending whose condition holds, if any.
    pub fn check(stats: &WorldStats) -> Option<Ending> {
        if stats.morale <= 0 {
            Some(Ending::HopeLost)
        } else if stats.supplies <= 0 {
            Some(Ending::Starvation)
        } else if stats.threat >= 100 {
            Some(Ending::Overrun)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Ending::HopeLost => "hope lost",
            Ending::Starvation => "starvation",
            Ending::Overrun => "overrun",
        }
    }
}

impl fmt::Display for Ending {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of resolving one day's vote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub new_stats: WorldStats,
    pub chosen_option: String,
    pub chosen_label: String,
    pub deltas: StatDeltas,
    pub ending: Option<Ending>,
}

/// Key of the winning option: tally leader, else the event's first option.
pub fn winning_option<'a>(tally: &'a VoteTally, event: &'a EventTemplate) -> Option<&'a str> {
    tally
        .leader()
        .or_else(|| event.options.first().map(|o| o.key.as_str()))
}

/// Resolve `tally` against `event` starting from `stats`.
///
/// Core stats are clamped to 0–100, population to `population`. Endings
/// are reported in the result, never raised.
pub fn resolve_day(
    tally: &VoteTally,
    event: &EventTemplate,
    stats: &WorldStats,
    population: &PopulationBounds,
) -> Resolution {
    let key = winning_option(tally, event).unwrap_or_default().to_string();
    let (label, deltas) = match event.find_option(&key) {
        Some(option) => (option.label.clone(), option.deltas),
        None => {
            log::warn!(
                "Winning key {:?} is not an option of {}; applying no change",
                key,
                event.id
            );
            (key.clone(), StatDeltas::ZERO)
        }
    };

    let mut new_stats = stats.apply(&deltas, population);
    new_stats.last_event_summary = format!("Community chose: {}", label);
    let ending = Ending::check(&new_stats);

    log::info!(
        "Resolved {} with {} ({} votes of {}): morale {} supplies {} threat {}",
        event.id,
        key,
        tally.count(&key),
        tally.total(),
        new_stats.morale,
        new_stats.supplies,
        new_stats.threat
    );
    if let Some(ending) = ending {
        log::info!("Simulation reached an ending: {}", ending);
    }

    Resolution {
        new_stats,
        chosen_option: key,
        chosen_label: label,
        deltas,
        ending,
    }
}
