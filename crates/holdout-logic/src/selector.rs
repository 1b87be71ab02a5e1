//! Event selection — which template governs the coming day.
//!
//! Priority policy over the templates available under the current stats:
//!
//! 1. **Crisis override**: if any stat is critical and a crisis template is
//!    available, pick uniformly among crises only.
//! 2. **Weighted draw** otherwise: opportunities (only while the settlement
//!    is stable) at `weight × opportunity`, narratives at
//!    `weight × narrative`, general templates at `weight × general`.
//! 3. **Fallbacks**: the first available template of any category, then the
//!    fixed [`fallback_template`]. Selection never fails.

use rand::distributions::WeightedIndex;
use rand::prelude::*;

use crate::catalog::{EventCategory, EventTemplate, TemplatePool};
use crate::config::SimConfig;
use crate::stats::WorldStats;
use crate::templates::fallback_template;

/// Available templates partitioned by category, pool order preserved.
#[derive(Debug, Default)]
pub struct CategoryBuckets<'a> {
    pub crisis: Vec<&'a EventTemplate>,
    pub opportunity: Vec<&'a EventTemplate>,
    pub narrative: Vec<&'a EventTemplate>,
    pub general: Vec<&'a EventTemplate>,
}

impl<'a> CategoryBuckets<'a> {
    pub fn partition(available: &[&'a EventTemplate]) -> Self {
        let mut buckets = Self::default();
        for &t in available {
            match t.category {
                EventCategory::Crisis => buckets.crisis.push(t),
                EventCategory::Opportunity => buckets.opportunity.push(t),
                EventCategory::Narrative => buckets.narrative.push(t),
                EventCategory::General => buckets.general.push(t),
            }
        }
        buckets
    }
}

/// `weight × multiplier`, widened and capped at `u32::MAX` so any number
/// of candidates can be summed in `u64`.
fn effective_weight(weight: u32, multiplier: u32) -> u64 {
    (u64::from(weight) * u64::from(multiplier)).min(u64::from(u32::MAX))
}

/// Candidates and effective weights for the non-crisis draw.
pub fn weighted_candidates<'a>(
    buckets: &CategoryBuckets<'a>,
    stats: &WorldStats,
    config: &SimConfig,
) -> Vec<(&'a EventTemplate, u64)> {
    let w = &config.selection;
    let mut pool = Vec::new();
    if config.stability.is_stable(stats) {
        pool.extend(
            buckets
                .opportunity
                .iter()
                .map(|&t| (t, effective_weight(t.weight, w.opportunity))),
        );
    }
    pool.extend(
        buckets
            .narrative
            .iter()
            .map(|&t| (t, effective_weight(t.weight, w.narrative))),
    );
    pool.extend(
        buckets
            .general
            .iter()
            .map(|&t| (t, effective_weight(t.weight, w.general))),
    );
    pool
}

/// Pick the template for `day_number` given the stats the day starts with.
pub fn select_template<R: Rng + ?Sized>(
    pool: &TemplatePool,
    stats: &WorldStats,
    day_number: u32,
    config: &SimConfig,
    rng: &mut R,
) -> EventTemplate {
    let available = pool.available(stats, day_number);
    let Some(&first_available) = available.first() else {
        log::warn!(
            "No template available on day {} (morale {}, supplies {}, threat {}); using fallback",
            day_number,
            stats.morale,
            stats.supplies,
            stats.threat
        );
        return fallback_template();
    };

    let buckets = CategoryBuckets::partition(&available);

    if config.crisis.is_crisis(stats) {
        if let Some(&crisis) = buckets.crisis.choose(rng) {
            log::debug!("Crisis override selected {}", crisis.id);
            return crisis.clone();
        }
    }

    let candidates = weighted_candidates(&buckets, stats, config);
    let weights: Vec<u64> = candidates.iter().map(|(_, w)| *w).collect();
    match WeightedIndex::new(&weights) {
        Ok(dist) => {
            let (chosen, weight) = candidates[dist.sample(rng)];
            log::debug!(
                "Selected {} (effective weight {} of {})",
                chosen.id,
                weight,
                weights.iter().sum::<u64>()
            );
            chosen.clone()
        }
        // Empty weighted pool: only crises or unstable-world opportunities remain.
        Err(_) => first_available.clone(),
    }
}
