//! Event catalog — templates, options, applicability and the template pool.
//!
//! A template describes one kind of daily decision: a headline, a category,
//! a selection weight, the stat window in which it may appear, and the
//! options the community votes on. The built-in templates live in
//! [`crate::templates`]; admin-authored templates arrive as JSON records
//! and are merged into a [`TemplatePool`] by the host before each selection.

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::TemplateError;
use crate::stats::{StatDeltas, WorldStats, STAT_MAX, STAT_MIN};
use crate::templates;

/// Largest base weight a template may carry.
pub const MAX_TEMPLATE_WEIGHT: u32 = 1_000;

/// Template category. Drives the selector's priority rules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventCategory {
    Crisis,
    Opportunity,
    Narrative,
    #[default]
    #[serde(alias = "daily")]
    General,
}

impl EventCategory {
    pub const ALL: [EventCategory; 4] = [
        EventCategory::Crisis,
        EventCategory::Opportunity,
        EventCategory::Narrative,
        EventCategory::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventCategory::Crisis => "crisis",
            EventCategory::Opportunity => "opportunity",
            EventCategory::Narrative => "narrative",
            EventCategory::General => "general",
        }
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One choice within an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventOption {
    pub key: String,
    pub label: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub deltas: StatDeltas,
}

impl EventOption {
    pub fn new(key: &str, label: &str, deltas: StatDeltas, description: &str) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            description: Some(description.to_string()),
            deltas,
        }
    }
}

/// A reusable event definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventTemplate {
    pub id: String,
    pub headline: String,
    pub description: String,
    pub category: EventCategory,
    pub weight: u32,
    pub min_morale: i32,
    pub max_morale: i32,
    pub min_supplies: i32,
    pub max_supplies: i32,
    pub min_threat: i32,
    pub max_threat: i32,
    pub requires_day: u32,
    pub options: Vec<EventOption>,
}

impl EventTemplate {
    /// An unconstrained template with weight 1 and no options yet.
    pub fn new(id: &str, headline: &str, description: &str, category: EventCategory) -> Self {
        Self {
            id: id.to_string(),
            headline: headline.to_string(),
            description: description.to_string(),
            category,
            weight: 1,
            min_morale: STAT_MIN,
            max_morale: STAT_MAX,
            min_supplies: STAT_MIN,
            max_supplies: STAT_MAX,
            min_threat: STAT_MIN,
            max_threat: STAT_MAX,
            requires_day: 0,
            options: Vec::new(),
        }
    }

    pub fn weight(mut self, weight: u32) -> Self {
        self.weight = weight;
        self
    }

    pub fn min_morale(mut self, v: i32) -> Self {
        self.min_morale = v;
        self
    }

    pub fn max_morale(mut self, v: i32) -> Self {
        self.max_morale = v;
        self
    }

    pub fn min_supplies(mut self, v: i32) -> Self {
        self.min_supplies = v;
        self
    }

    pub fn max_supplies(mut self, v: i32) -> Self {
        self.max_supplies = v;
        self
    }

    pub fn min_threat(mut self, v: i32) -> Self {
        self.min_threat = v;
        self
    }

    pub fn max_threat(mut self, v: i32) -> Self {
        self.max_threat = v;
        self
    }

    pub fn requires_day(mut self, day: u32) -> Self {
        self.requires_day = day;
        self
    }

    /// Append an option with morale/supplies/threat deltas.
    pub fn option(mut self, key: &str, label: &str, deltas: [i32; 3], description: &str) -> Self {
        let [m, s, t] = deltas;
        self.options
            .push(EventOption::new(key, label, StatDeltas::new(m, s, t), description));
        self
    }

    pub fn find_option(&self, key: &str) -> Option<&EventOption> {
        self.options.iter().find(|o| o.key == key)
    }

    /// True when no stat bound narrows the full 0–100 range.
    pub fn is_unconstrained(&self) -> bool {
        self.min_morale <= STAT_MIN
            && self.max_morale >= STAT_MAX
            && self.min_supplies <= STAT_MIN
            && self.max_supplies >= STAT_MAX
            && self.min_threat <= STAT_MIN
            && self.max_threat >= STAT_MAX
    }

    /// Structural checks shared by built-in and custom templates.
    pub fn validate(&self) -> Result<(), TemplateError> {
        if self.id.trim().is_empty() {
            return Err(TemplateError::EmptyId);
        }
        if self.options.len() < 2 {
            return Err(TemplateError::TooFewOptions {
                id: self.id.clone(),
                found: self.options.len(),
            });
        }
        let mut seen = HashSet::new();
        for option in &self.options {
            if !seen.insert(option.key.as_str()) {
                return Err(TemplateError::DuplicateOption {
                    id: self.id.clone(),
                    key: option.key.clone(),
                });
            }
        }
        if self.weight == 0 {
            return Err(TemplateError::ZeroWeight {
                id: self.id.clone(),
            });
        }
        if self.weight > MAX_TEMPLATE_WEIGHT {
            return Err(TemplateError::WeightTooLarge {
                id: self.id.clone(),
                weight: self.weight,
                max: MAX_TEMPLATE_WEIGHT,
            });
        }
        for (stat, min, max) in [
            ("morale", self.min_morale, self.max_morale),
            ("supplies", self.min_supplies, self.max_supplies),
            ("threat", self.min_threat, self.max_threat),
        ] {
            if min > max || min < STAT_MIN || max > STAT_MAX {
                return Err(TemplateError::InvalidBounds {
                    id: self.id.clone(),
                    stat,
                    min,
                    max,
                });
            }
        }
        Ok(())
    }
}

/// Whether `template` may be drawn on `day_number` under `stats`.
///
/// Pure: depends only on its arguments, so repeated calls agree.
pub fn is_event_available(template: &EventTemplate, stats: &WorldStats, day_number: u32) -> bool {
    day_number >= template.requires_day
        && (template.min_morale..=template.max_morale).contains(&stats.morale)
        && (template.min_supplies..=template.max_supplies).contains(&stats.supplies)
        && (template.min_threat..=template.max_threat).contains(&stats.threat)
}

// ── Custom templates ────────────────────────────────────────────────────

fn default_weight() -> u32 {
    1
}

fn default_max() -> i32 {
    STAT_MAX
}

fn default_active() -> bool {
    true
}

/// Admin-authored template as stored by the host application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomTemplateRecord {
    pub event_id: String,
    pub headline: String,
    pub description: String,
    #[serde(default)]
    pub category: EventCategory,
    #[serde(default = "default_weight")]
    pub weight: u32,
    #[serde(default)]
    pub min_morale: i32,
    #[serde(default = "default_max")]
    pub max_morale: i32,
    #[serde(default)]
    pub min_supplies: i32,
    #[serde(default = "default_max")]
    pub max_supplies: i32,
    #[serde(default)]
    pub min_threat: i32,
    #[serde(default = "default_max")]
    pub max_threat: i32,
    #[serde(default)]
    pub requires_day: u32,
    pub options: Vec<EventOption>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

impl From<CustomTemplateRecord> for EventTemplate {
    fn from(r: CustomTemplateRecord) -> Self {
        EventTemplate {
            id: r.event_id,
            headline: r.headline,
            description: r.description,
            category: r.category,
            weight: r.weight,
            min_morale: r.min_morale,
            max_morale: r.max_morale,
            min_supplies: r.min_supplies,
            max_supplies: r.max_supplies,
            min_threat: r.min_threat,
            max_threat: r.max_threat,
            requires_day: r.requires_day,
            options: r.options,
        }
    }
}

/// Parse a JSON array of custom records, keeping only active ones.
pub fn parse_custom_templates(json: &str) -> Result<Vec<EventTemplate>, TemplateError> {
    let records: Vec<CustomTemplateRecord> = serde_json::from_str(json)?;
    let mut templates = Vec::with_capacity(records.len());
    for record in records.into_iter().filter(|r| r.is_active) {
        let template = EventTemplate::from(record);
        template.validate()?;
        templates.push(template);
    }
    Ok(templates)
}

// ── Pool ────────────────────────────────────────────────────────────────

/// The read-only set of templates one selection call draws from:
/// built-ins followed by any active custom templates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplatePool {
    templates: Vec<EventTemplate>,
}

impl TemplatePool {
    /// Validated pool from arbitrary templates. Ids must be unique.
    pub fn new(templates: Vec<EventTemplate>) -> Result<Self, TemplateError> {
        let mut pool = Self::default();
        for template in templates {
            pool.push(template)?;
        }
        Ok(pool)
    }

    /// Pool holding only the built-in catalog.
    pub fn builtin() -> Self {
        Self {
            templates: templates::builtin_templates(),
        }
    }

    /// Validate and append one template.
    pub fn push(&mut self, template: EventTemplate) -> Result<(), TemplateError> {
        template.validate()?;
        if self.find(&template.id).is_some() {
            return Err(TemplateError::DuplicateTemplate { id: template.id });
        }
        self.templates.push(template);
        Ok(())
    }

    /// Append the active templates of a JSON array of custom records.
    ///
    /// A record whose id is already in the pool is skipped with a warning;
    /// the rest of the batch still loads.
    pub fn with_custom_json_str(mut self, json: &str) -> Result<Self, TemplateError> {
        let custom = parse_custom_templates(json)?;
        let mut loaded = 0;
        for template in custom {
            match self.push(template) {
                Ok(()) => loaded += 1,
                Err(TemplateError::DuplicateTemplate { id }) => {
                    log::warn!("Skipping custom template {}: id already in use", id);
                }
                Err(e) => return Err(e),
            }
        }
        log::info!("Loaded {} custom templates", loaded);
        Ok(self)
    }

    pub fn with_custom_file(self, path: &Path) -> Result<Self, TemplateError> {
        let contents = fs::read_to_string(path).map_err(|source| TemplateError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        self.with_custom_json_str(&contents)
    }

    pub fn templates(&self) -> &[EventTemplate] {
        &self.templates
    }

    pub fn iter(&self) -> impl Iterator<Item = &EventTemplate> {
        self.templates.iter()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn find(&self, id: &str) -> Option<&EventTemplate> {
        self.templates.iter().find(|t| t.id == id)
    }

    /// Templates available under `stats` on `day_number`, in pool order.
    pub fn available(&self, stats: &WorldStats, day_number: u32) -> Vec<&EventTemplate> {
        self.templates
            .iter()
            .filter(|t| is_event_available(t, stats, day_number))
            .collect()
    }

    /// The template whose option key set equals `keys` exactly.
    /// Used to match a stored event (which only kept its options) back to
    /// its definition.
    pub fn find_by_option_keys<'a, I>(&self, keys: I) -> Option<&EventTemplate>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let wanted: HashSet<&str> = keys.into_iter().collect();
        if wanted.is_empty() {
            return None;
        }
        self.templates.iter().find(|t| {
            let have: HashSet<&str> = t.options.iter().map(|o| o.key.as_str()).collect();
            have == wanted
        })
    }

    /// Deltas for `option_key`: from `template` when given and it has the
    /// key, else the first template in the pool with that key, else zero.
    pub fn deltas_for_option(&self, option_key: &str, template: Option<&EventTemplate>) -> StatDeltas {
        if let Some(option) = template.and_then(|t| t.find_option(option_key)) {
            return option.deltas;
        }
        self.templates
            .iter()
            .find_map(|t| t.find_option(option_key))
            .map(|o| o.deltas)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> EventTemplate {
        EventTemplate::new("sample", "Sample", "A sample event", EventCategory::General)
            .option("a", "A", [1, 2, 3], "first")
            .option("b", "B", [-1, -2, -3], "second")
    }

    #[test]
    fn test_unconstrained_available_after_required_day() {
        let t = sample().requires_day(3);
        let stats = WorldStats::new(0, 100, 50);
        assert!(!is_event_available(&t, &stats, 2));
        assert!(is_event_available(&t, &stats, 3));
        assert!(t.is_unconstrained());
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let t = sample().max_supplies(20).min_threat(70);
        assert!(is_event_available(&t, &WorldStats::new(50, 20, 70), 1));
        assert!(!is_event_available(&t, &WorldStats::new(50, 21, 70), 1));
        assert!(!is_event_available(&t, &WorldStats::new(50, 20, 69), 1));
    }

    #[test]
    fn test_availability_is_idempotent() {
        let t = sample().min_morale(30).max_morale(60);
        let stats = WorldStats::new(45, 10, 90);
        let first = is_event_available(&t, &stats, 4);
        let second = is_event_available(&t, &stats, 4);
        assert_eq!(first, second);
    }

    #[test]
    fn test_validate_rejects_bad_templates() {
        let one_option =
            EventTemplate::new("x", "X", "", EventCategory::Crisis).option("a", "A", [0, 0, 0], "");
        assert!(matches!(
            one_option.validate(),
            Err(TemplateError::TooFewOptions { found: 1, .. })
        ));

        let dup = sample().option("a", "Again", [0, 0, 0], "");
        assert!(matches!(
            dup.validate(),
            Err(TemplateError::DuplicateOption { .. })
        ));

        assert!(matches!(
            sample().weight(0).validate(),
            Err(TemplateError::ZeroWeight { .. })
        ));

        assert!(matches!(
            sample().min_morale(60).max_morale(40).validate(),
            Err(TemplateError::InvalidBounds { stat: "morale", .. })
        ));
    }

    #[test]
    fn test_pool_rejects_duplicate_ids() {
        let err = TemplatePool::new(vec![sample(), sample()]).unwrap_err();
        assert!(matches!(err, TemplateError::DuplicateTemplate { .. }));
    }

    #[test]
    fn test_custom_json_defaults_and_inactive() {
        let json = r#"[
            {
                "event_id": "well_dry",
                "headline": "The Well Runs Dry",
                "description": "No water comes up.",
                "category": "crisis",
                "max_supplies": 40,
                "options": [
                    {"key": "dig", "label": "Dig Deeper", "deltas": {"morale": -2, "supplies": 6}},
                    {"key": "haul", "label": "Haul From River", "deltas": {"threat": 4}}
                ]
            },
            {
                "event_id": "retired",
                "headline": "Old",
                "description": "Inactive",
                "is_active": false,
                "options": []
            }
        ]"#;
        let pool = TemplatePool::default().with_custom_json_str(json).unwrap();
        assert_eq!(pool.len(), 1);
        let t = pool.find("well_dry").unwrap();
        assert_eq!(t.category, EventCategory::Crisis);
        assert_eq!(t.weight, 1);
        assert_eq!((t.min_supplies, t.max_supplies), (0, 40));
        assert_eq!(t.max_threat, 100);
        assert_eq!(t.options[1].deltas, StatDeltas::new(0, 0, 4));
    }

    #[test]
    fn test_custom_json_unknown_category_fails() {
        let json = r#"[{"event_id": "x", "headline": "X", "description": "",
            "category": "festival", "options": []}]"#;
        assert!(matches!(
            TemplatePool::default().with_custom_json_str(json),
            Err(TemplateError::Parse(_))
        ));
    }

    #[test]
    fn test_custom_json_skips_id_colliding_with_builtin() {
        let json = r#"[
            {"event_id": "guard_duty", "headline": "X", "description": "",
             "options": [{"key": "p", "label": "P"}, {"key": "q", "label": "Q"}]},
            {"event_id": "night_market", "headline": "Night Market", "description": "",
             "options": [{"key": "p", "label": "P"}, {"key": "q", "label": "Q"}]}
        ]"#;
        let builtin = TemplatePool::builtin();
        let builtin_len = builtin.len();
        let pool = builtin.with_custom_json_str(json).unwrap();
        assert_eq!(pool.len(), builtin_len + 1);
        assert!(pool.find("night_market").is_some());
        assert_ne!(pool.find("guard_duty").unwrap().headline, "X");
    }

    #[test]
    fn test_find_by_option_keys_and_deltas() {
        let pool = TemplatePool::new(vec![sample()]).unwrap();
        let t = pool.find_by_option_keys(["b", "a"]).unwrap();
        assert_eq!(t.id, "sample");
        assert!(pool.find_by_option_keys(["a"]).is_none());

        assert_eq!(pool.deltas_for_option("b", Some(t)), StatDeltas::new(-1, -2, -3));
        assert_eq!(pool.deltas_for_option("a", None), StatDeltas::new(1, 2, 3));
        assert_eq!(pool.deltas_for_option("zzz", Some(t)), StatDeltas::ZERO);
    }
}
