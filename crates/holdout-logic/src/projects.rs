//! Community projects, long builds that grant permanent buffs.
//!
//! The community votes on which project to build; the winner becomes the
//! single active project and accrues production every day until its cost
//! is met. Completed projects are summed into [`ProjectBuffs`], which the
//! passive mechanics read every night.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ProjectError;
use crate::stats::WorldStats;

/// What a completed project improves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuffKind {
    #[serde(alias = "morale")]
    MoraleBuff,
    #[serde(alias = "supplies")]
    SuppliesBuff,
    #[serde(alias = "threat")]
    ThreatReduction,
    /// Percentage off all overnight decay.
    DecayReduction,
    ProductionBonus,
    PopulationCapacity,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Production needed to complete.
    pub cost: u32,
    pub buff_type: BuffKind,
    pub buff_value: i32,
}

impl Project {
    fn new(id: u32, name: &str, description: &str, cost: u32, buff_type: BuffKind, buff_value: i32) -> Self {
        Self {
            id,
            name: name.to_string(),
            description: description.to_string(),
            cost,
            buff_type,
            buff_value,
        }
    }
}

/// Largest buff a single project may grant.
pub const MAX_BUFF_VALUE: i32 = 100;

/// Sum of completed-project effects. Recomputed each transition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectBuffs {
    pub morale_buff: i32,
    pub supplies_buff: i32,
    pub threat_reduction: i32,
    pub decay_reduction: i32,
    pub production_bonus: i32,
    pub population_capacity: i32,
}

impl ProjectBuffs {
    pub fn from_completed(completed: &[Project]) -> Self {
        let mut buffs = Self::default();
        for project in completed {
            let slot = match project.buff_type {
                BuffKind::MoraleBuff => &mut buffs.morale_buff,
                BuffKind::SuppliesBuff => &mut buffs.supplies_buff,
                BuffKind::ThreatReduction => &mut buffs.threat_reduction,
                BuffKind::DecayReduction => &mut buffs.decay_reduction,
                BuffKind::ProductionBonus => &mut buffs.production_bonus,
                BuffKind::PopulationCapacity => &mut buffs.population_capacity,
            };
            *slot = slot.saturating_add(project.buff_value);
        }
        buffs
    }
}

/// Production points the settlement puts into its active project today.
pub fn daily_production(stats: &WorldStats, buffs: &ProjectBuffs) -> i32 {
    // 0.15 × morale + 0.15 × supplies, truncated
    let base = (stats.morale + stats.supplies) * 15 / 100;
    let mut total = base + buffs.production_bonus;
    if stats.population < 15 {
        total = total * 7 / 10;
    }
    if stats.morale < 20 || stats.supplies < 20 {
        total = total * 3 / 10;
    }
    total
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveProject {
    pub project: Project,
    pub progress: i32,
}

/// Result of one day's production.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionReport {
    pub project_id: u32,
    pub name: String,
    pub production: i32,
    pub progress: i32,
    pub cost: u32,
    pub completed: bool,
}

/// Active and completed projects for one settlement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectLedger {
    pub active: Option<ActiveProject>,
    pub completed: Vec<Project>,
}

impl ProjectLedger {
    pub fn buffs(&self) -> ProjectBuffs {
        ProjectBuffs::from_completed(&self.completed)
    }

    pub fn is_completed(&self, id: u32) -> bool {
        self.completed.iter().any(|p| p.id == id)
    }

    /// Start `project` unless one is already active. Returns whether it started.
    pub fn start(&mut self, project: Project) -> bool {
        if self.active.is_some() {
            return false;
        }
        log::info!("Project started: {}", project.name);
        self.active = Some(ActiveProject {
            project,
            progress: 0,
        });
        true
    }

    /// Start the most-voted project when nothing is active.
    ///
    /// `votes` holds one project id per ballot and is drained whenever it is
    /// counted. Ties go to the smallest id. A winner that is already
    /// completed or missing from `catalog` starts nothing.
    pub fn start_by_vote(&mut self, votes: &mut Vec<u32>, catalog: &ProjectCatalog) -> Option<&Project> {
        if self.active.is_some() || votes.is_empty() {
            return None;
        }
        let mut tally: BTreeMap<u32, u32> = BTreeMap::new();
        for id in votes.drain(..) {
            *tally.entry(id).or_insert(0) += 1;
        }
        let mut winner: Option<(u32, u32)> = None;
        for (&id, &count) in &tally {
            if winner.map_or(true, |(_, c)| count > c) {
                winner = Some((id, count));
            }
        }
        let (winner_id, _) = winner?;

        if self.is_completed(winner_id) {
            log::warn!("Winning project {} already completed, skipping", winner_id);
            return None;
        }
        let Some(project) = catalog.find(winner_id) else {
            log::warn!("Winning project {} is not in the catalog", winner_id);
            return None;
        };
        self.start(project.clone());
        self.active.as_ref().map(|a| &a.project)
    }

    /// Add `production` to the active project, completing it when the cost
    /// is met. `None` when nothing is being built.
    pub fn apply_production(&mut self, production: i32) -> Option<ProductionReport> {
        let active = self.active.as_mut()?;
        active.progress = active.progress.saturating_add(production);
        let completed = i64::from(active.progress) >= i64::from(active.project.cost);
        let report = ProductionReport {
            project_id: active.project.id,
            name: active.project.name.clone(),
            production,
            progress: active.progress,
            cost: active.project.cost,
            completed,
        };
        if completed {
            if let Some(done) = self.active.take() {
                log::info!("Project completed: {}", done.project.name);
                self.completed.push(done.project);
            }
        } else {
            log::info!("Project production: +{} ({}/{})", production, report.progress, report.cost);
        }
        Some(report)
    }
}

/// The set of projects the community can choose from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectCatalog {
    pub projects: Vec<Project>,
}

impl Default for ProjectCatalog {
    fn default() -> Self {
        Self {
            projects: builtin_projects(),
        }
    }
}

impl ProjectCatalog {
    pub fn new(projects: Vec<Project>) -> Result<Self, ProjectError> {
        let mut seen = HashSet::new();
        for p in &projects {
            if !seen.insert(p.id) {
                return Err(ProjectError::Duplicate { id: p.id });
            }
            if p.cost == 0 {
                return Err(ProjectError::ZeroCost { id: p.id });
            }
            if !(0..=MAX_BUFF_VALUE).contains(&p.buff_value) {
                return Err(ProjectError::BuffValue {
                    id: p.id,
                    value: p.buff_value,
                    max: MAX_BUFF_VALUE,
                });
            }
        }
        Ok(Self { projects })
    }

    /// Parse a JSON array of projects.
    pub fn from_json_str(json: &str) -> Result<Self, ProjectError> {
        let projects: Vec<Project> = serde_json::from_str(json)?;
        Self::new(projects)
    }

    pub fn from_file(path: &Path) -> Result<Self, ProjectError> {
        let contents = fs::read_to_string(path).map_err(|source| ProjectError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    pub fn find(&self, id: u32) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }
}

/// Default project list, balanced against overnight decay.
pub fn builtin_projects() -> Vec<Project> {
    use BuffKind::*;
    vec![
        Project::new(1, "Sustainable Farm", "Establishes reliable food production.", 150, SuppliesBuff, 3),
        Project::new(2, "Medical Clinic", "Basic healthcare facilities.", 180, MoraleBuff, 2),
        Project::new(3, "Defensive Walls", "Fortified perimeter.", 200, ThreatReduction, 3),
        Project::new(4, "Workshop", "Tool repair and creation facility.", 140, ProductionBonus, 8),
        Project::new(5, "Water Purification", "Clean water system.", 160, DecayReduction, 15),
        Project::new(6, "Community Center", "Social gathering space.", 130, MoraleBuff, 3),
        Project::new(7, "Storage Depot", "Organized storage prevents spoilage and theft.", 120, SuppliesBuff, 2),
        Project::new(8, "Guard Tower", "Watchtower with patrol schedule.", 170, ThreatReduction, 4),
        Project::new(9, "Greenhouse", "Year-round growing facility.", 220, SuppliesBuff, 5),
        Project::new(10, "Training Ground", "Combat and survival training area.", 190, DecayReduction, 20),
        Project::new(11, "Radio Tower", "Long-range communication.", 250, ThreatReduction, 5),
        Project::new(12, "Housing Expansion", "Additional living quarters.", 180, PopulationCapacity, 20),
        Project::new(13, "Armory", "Weapons storage and maintenance.", 240, ThreatReduction, 6),
        Project::new(14, "School", "Education for the next generation.", 200, MoraleBuff, 4),
        Project::new(15, "Power Generator", "Reliable electricity.", 300, ProductionBonus, 15),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(id: u32, cost: u32, buff_type: BuffKind, value: i32) -> Project {
        Project::new(id, &format!("P{}", id), "", cost, buff_type, value)
    }

    #[test]
    fn test_buffs_sum_by_kind() {
        let buffs = ProjectBuffs::from_completed(&[
            project(1, 10, BuffKind::MoraleBuff, 2),
            project(2, 10, BuffKind::MoraleBuff, 3),
            project(3, 10, BuffKind::DecayReduction, 15),
            project(4, 10, BuffKind::PopulationCapacity, 20),
        ]);
        assert_eq!(buffs.morale_buff, 5);
        assert_eq!(buffs.decay_reduction, 15);
        assert_eq!(buffs.population_capacity, 20);
        assert_eq!(buffs.supplies_buff, 0);
    }

    #[test]
    fn test_legacy_buff_aliases() {
        let json = r#"[{"id": 1, "name": "Old", "cost": 5, "buff_type": "threat", "buff_value": 2}]"#;
        let catalog = ProjectCatalog::from_json_str(json).unwrap();
        assert_eq!(catalog.projects[0].buff_type, BuffKind::ThreatReduction);
    }

    #[test]
    fn test_daily_production() {
        let buffs = ProjectBuffs::default();
        // (70 + 80) * 0.15 = 22.5 -> 22
        assert_eq!(daily_production(&WorldStats::new(70, 80, 30), &buffs), 22);
        // small population: 22 * 0.7 = 15.4 -> 15
        let small = WorldStats::new(70, 80, 30).with_population(14);
        assert_eq!(daily_production(&small, &buffs), 15);
        // starving: (70 + 10) * 0.15 = 12, * 0.3 = 3.6 -> 3
        assert_eq!(daily_production(&WorldStats::new(70, 10, 30), &buffs), 3);
        let bonus = ProjectBuffs {
            production_bonus: 8,
            ..ProjectBuffs::default()
        };
        assert_eq!(daily_production(&WorldStats::new(70, 80, 30), &bonus), 30);
    }

    #[test]
    fn test_production_completes_project() {
        let mut ledger = ProjectLedger::default();
        assert!(ledger.apply_production(10).is_none());
        assert!(ledger.start(project(7, 30, BuffKind::SuppliesBuff, 2)));
        assert!(!ledger.start(project(8, 30, BuffKind::SuppliesBuff, 2)));

        let first = ledger.apply_production(20).unwrap();
        assert!(!first.completed);
        assert_eq!(first.progress, 20);

        let second = ledger.apply_production(15).unwrap();
        assert!(second.completed);
        assert!(ledger.active.is_none());
        assert!(ledger.is_completed(7));
        assert_eq!(ledger.buffs().supplies_buff, 2);
    }

    #[test]
    fn test_huge_cost_does_not_complete_early() {
        let json = r#"[{"id": 1, "name": "Sky Bridge", "cost": 4294967295, "buff_type": "morale", "buff_value": 1}]"#;
        let catalog = ProjectCatalog::from_json_str(json).unwrap();
        let mut ledger = ProjectLedger::default();
        assert!(ledger.start(catalog.find(1).unwrap().clone()));
        let report = ledger.apply_production(22).unwrap();
        assert!(!report.completed);
        assert_eq!(report.progress, 22);
        assert!(ledger.active.is_some());
        assert!(ledger.completed.is_empty());
    }

    #[test]
    fn test_start_by_vote_tie_goes_to_smallest_id() {
        let catalog = ProjectCatalog::default();
        let mut ledger = ProjectLedger::default();
        let mut votes = vec![9, 4, 9, 4, 12];
        let started = ledger.start_by_vote(&mut votes, &catalog).unwrap();
        assert_eq!(started.id, 4);
        assert!(votes.is_empty());
    }

    #[test]
    fn test_start_by_vote_skips_completed_winner() {
        let catalog = ProjectCatalog::default();
        let mut ledger = ProjectLedger {
            active: None,
            completed: vec![catalog.find(3).unwrap().clone()],
        };
        let mut votes = vec![3, 3, 5];
        assert!(ledger.start_by_vote(&mut votes, &catalog).is_none());
        assert!(ledger.active.is_none());
        assert!(votes.is_empty());
    }

    #[test]
    fn test_start_by_vote_keeps_votes_while_building() {
        let catalog = ProjectCatalog::default();
        let mut ledger = ProjectLedger::default();
        ledger.start(catalog.find(1).unwrap().clone());
        let mut votes = vec![2, 2];
        assert!(ledger.start_by_vote(&mut votes, &catalog).is_none());
        assert_eq!(votes.len(), 2);
    }

    #[test]
    fn test_catalog_validation() {
        assert!(matches!(
            ProjectCatalog::new(vec![project(1, 10, BuffKind::MoraleBuff, 1), project(1, 10, BuffKind::MoraleBuff, 1)]),
            Err(ProjectError::Duplicate { id: 1 })
        ));
        assert!(matches!(
            ProjectCatalog::new(vec![project(2, 0, BuffKind::MoraleBuff, 1)]),
            Err(ProjectError::ZeroCost { id: 2 })
        ));
        assert!(matches!(
            ProjectCatalog::new(vec![project(3, 10, BuffKind::ProductionBonus, i32::MAX)]),
            Err(ProjectError::BuffValue { id: 3, .. })
        ));
        assert_eq!(ProjectCatalog::default().projects.len(), 15);
    }
}
