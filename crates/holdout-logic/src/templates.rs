//! Built-in event templates.
//!
//! Four families: crises that only surface when a stat is in trouble,
//! opportunities that need a healthy settlement, narrative beats gated on
//! the day count, and general daily decisions that are always on the table.

use crate::catalog::EventCategory::{Crisis, General, Narrative, Opportunity};
use crate::catalog::EventTemplate;

/// Every built-in template, crises first, general last.
pub fn builtin_templates() -> Vec<EventTemplate> {
    let mut all = crisis_templates();
    all.extend(opportunity_templates());
    all.extend(narrative_templates());
    all.extend(general_templates());
    all
}

/// Template used when nothing in the pool is available.
pub fn fallback_template() -> EventTemplate {
    resource_allocation()
}

/// Crises: each is bounded to a stat window where things are going badly.
pub fn crisis_templates() -> Vec<EventTemplate> {
    vec![
        EventTemplate::new(
            "food_shortage_critical",
            "Food Stores Critically Low!",
            "The community's food supplies are nearly depleted. Desperate measures are needed.",
            Crisis,
        )
        .max_supplies(20)
        .option(
            "emergency_rationing",
            "Emergency Rationing",
            [-8, 15, 2],
            "Strict rationing might save us, but morale will suffer",
        )
        .option(
            "desperate_hunt",
            "Desperate Hunt",
            [3, 8, 8],
            "Risk sending everyone out to find food",
        )
        .option(
            "negotiate_outsiders",
            "Seek Outside Help",
            [-5, 20, 15],
            "Reveal our location to potential traders",
        ),
        EventTemplate::new(
            "morale_collapse",
            "Community on the Brink of Collapse",
            "Despair has taken hold. People are talking about giving up or leaving.",
            Crisis,
        )
        .max_morale(25)
        .option(
            "inspirational_speech",
            "Rally the People",
            [15, -3, 0],
            "Remind them why we fight to survive",
        )
        .option(
            "festival",
            "Hold a Festival",
            [20, -10, 5],
            "A celebration might lift spirits despite the cost",
        )
        .option(
            "accept_reality",
            "Accept Losses",
            [5, 5, -3],
            "Let those who want to leave go, keep those who remain",
        ),
        EventTemplate::new(
            "threat_overwhelming",
            "Threat Level Critical!",
            "Danger surrounds the community. Something must be done immediately.",
            Crisis,
        )
        .min_threat(70)
        .option(
            "full_lockdown",
            "Full Lockdown",
            [-10, -5, -20],
            "Seal everything and wait it out",
        )
        .option(
            "preemptive_strike",
            "Preemptive Action",
            [-5, -8, -15],
            "Take the fight to them before they come to us",
        )
        .option(
            "emergency_evacuation",
            "Emergency Relocation",
            [-8, -12, -25],
            "Abandon this location for a safer one",
        ),
        EventTemplate::new(
            "disease_outbreak",
            "Illness Spreading Through Community",
            "Several people have fallen ill. Without proper medicine, it could spread rapidly.",
            Crisis,
        )
        .max_morale(40)
        .option(
            "quarantine_sick",
            "Strict Quarantine",
            [-12, -5, 0],
            "Isolate the sick to prevent spread",
        )
        .option(
            "herbal_remedies",
            "Try Natural Remedies",
            [3, -8, 5],
            "Use whatever plants and herbs we can find",
        )
        .option(
            "push_through",
            "Rest and Hope",
            [-5, -3, 3],
            "Let them recover naturally while continuing work",
        ),
        EventTemplate::new(
            "infrastructure_collapse",
            "Critical Infrastructure Failure",
            "Essential systems are breaking down. Immediate repairs needed or face severe consequences.",
            Crisis,
        )
        .max_supplies(25)
        .max_threat(60)
        .option(
            "emergency_repairs",
            "Emergency Repairs",
            [-5, -10, -8],
            "Use whatever we have to fix it now",
        )
        .option(
            "scavenge_parts",
            "Scavenge for Parts",
            [-3, 5, 12],
            "Send teams to find what we need",
        )
        .option(
            "improvise",
            "Improvise Solutions",
            [5, -15, 5],
            "Get creative with what we have",
        ),
        EventTemplate::new(
            "internal_conflict",
            "Internal Power Struggle",
            "Factions are forming within the community. Leadership is being questioned.",
            Crisis,
        )
        .max_morale(30)
        .requires_day(5)
        .option(
            "reassert_authority",
            "Assert Leadership",
            [-8, 5, -5],
            "Make it clear who's in charge",
        )
        .option(
            "unity_council",
            "Form a Council",
            [10, -5, 8],
            "Share power with different voices",
        )
        .option(
            "exile_troublemakers",
            "Remove Dissenters",
            [-15, 8, -12],
            "Exile those causing problems",
        ),
        EventTemplate::new(
            "water_contamination",
            "Water Supply Contaminated!",
            "The main water source has been tainted. We need clean water immediately.",
            Crisis,
        )
        .max_supplies(30)
        .option(
            "boil_everything",
            "Boil All Water",
            [-5, -8, 0],
            "Use fuel to make it safe",
        )
        .option(
            "find_new_source",
            "Search for New Source",
            [-3, -5, 15],
            "Risky but necessary expedition",
        )
        .option(
            "rain_collection",
            "Emergency Rain Collection",
            [2, 5, 5],
            "Set up systems to catch rainwater",
        ),
    ]
}

/// Opportunities: need a minimum of morale or supplies.
pub fn opportunity_templates() -> Vec<EventTemplate> {
    vec![
        EventTemplate::new(
            "abundant_harvest",
            "Bountiful Discovery",
            "Scouts have found an abandoned supply cache. How should we use it?",
            Opportunity,
        )
        .min_morale(40)
        .min_supplies(40)
        .option(
            "stockpile",
            "Stockpile Everything",
            [5, 20, 0],
            "Save it for harder times",
        )
        .option(
            "share_celebration",
            "Share and Celebrate",
            [15, 10, 3],
            "Boost morale with this windfall",
        )
        .option(
            "trade_supplies",
            "Trade for Security",
            [3, 8, -12],
            "Use some to improve our defenses",
        ),
        EventTemplate::new(
            "survivor_joins",
            "Survivors Request Entry",
            "A small group of survivors has found the community and asks to join.",
            Opportunity,
        )
        .min_morale(30)
        .requires_day(3)
        .option(
            "welcome_all",
            "Welcome Them",
            [8, -8, 5],
            "More people means more strength and diversity",
        )
        .option(
            "cautious_trial",
            "Trial Period",
            [3, -3, 2],
            "Let them prove themselves first",
        )
        .option(
            "turn_away",
            "Turn Them Away",
            [-5, 2, -5],
            "We can't risk unknown variables",
        ),
        EventTemplate::new(
            "tech_discovery",
            "Technological Breakthrough",
            "Someone has figured out how to repurpose old equipment. What should we prioritize?",
            Opportunity,
        )
        .min_supplies(30)
        .requires_day(5)
        .option(
            "improve_farming",
            "Farming Equipment",
            [5, 15, 0],
            "Long-term food security",
        )
        .option(
            "communication",
            "Communication Devices",
            [10, -5, 8],
            "Connect with other communities",
        )
        .option(
            "defense_tech",
            "Defense Systems",
            [3, -5, -15],
            "Better protection from threats",
        ),
        EventTemplate::new(
            "skilled_refugee",
            "Talented Newcomer",
            "A refugee with valuable pre-collapse skills wants to join. What role should they take?",
            Opportunity,
        )
        .min_morale(35)
        .requires_day(4)
        .option(
            "teacher",
            "Teacher and Mentor",
            [12, -3, 0],
            "Share knowledge with the whole community",
        )
        .option(
            "engineer",
            "Engineer and Builder",
            [5, 12, -8],
            "Improve our infrastructure",
        )
        .option(
            "scout",
            "Scout and Explorer",
            [3, 8, 10],
            "Help us find resources",
        ),
        EventTemplate::new(
            "trade_caravan",
            "Trading Caravan Arrives",
            "Merchants have arrived with goods to trade. What should we prioritize?",
            Opportunity,
        )
        .min_morale(40)
        .min_supplies(20)
        .requires_day(6)
        .option(
            "trade_for_food",
            "Trade for Food",
            [5, 18, 3],
            "Stock up on essentials",
        )
        .option(
            "trade_for_weapons",
            "Trade for Weapons",
            [3, -5, -18],
            "Improve our security",
        )
        .option(
            "trade_for_luxuries",
            "Trade for Luxuries",
            [18, -8, 5],
            "Boost morale with comforts",
        ),
        EventTemplate::new(
            "natural_bounty",
            "Nature Provides",
            "The surrounding area is suddenly full of edible plants and game. A rare opportunity!",
            Opportunity,
        )
        .min_morale(30)
        .max_threat(50)
        .option(
            "massive_harvest",
            "All-Out Harvest",
            [8, 25, 8],
            "Send everyone to gather as much as possible",
        )
        .option(
            "sustainable_gather",
            "Sustainable Gathering",
            [5, 15, 3],
            "Take what we need, leave the rest",
        )
        .option(
            "preserve_future",
            "Preserve for Future",
            [10, 8, 0],
            "Establish sustainable practices",
        ),
        EventTemplate::new(
            "allied_community",
            "Alliance Opportunity",
            "Another surviving community has proposed a mutual aid agreement.",
            Opportunity,
        )
        .min_morale(45)
        .requires_day(8)
        .option(
            "full_alliance",
            "Full Alliance",
            [15, -8, -12],
            "Share everything, stronger together",
        )
        .option(
            "trade_only",
            "Trade Agreement Only",
            [5, 5, -5],
            "Maintain independence, trade goods",
        )
        .option(
            "decline",
            "Politely Decline",
            [-3, 3, 8],
            "We're better off alone",
        ),
        EventTemplate::new(
            "generator_find",
            "Working Generator Found!",
            "Scouts discovered a functioning generator. How should we use this power?",
            Opportunity,
        )
        .min_supplies(35)
        .requires_day(7)
        .option(
            "lighting",
            "Community Lighting",
            [15, -5, -8],
            "Safety and morale from light at night",
        )
        .option(
            "workshop",
            "Power Workshop",
            [5, 15, 0],
            "Enable better production",
        )
        .option(
            "communication",
            "Power Radio",
            [10, -3, 12],
            "Connect with the outside world",
        ),
    ]
}

/// Story beats unlocked as the settlement survives longer.
pub fn narrative_templates() -> Vec<EventTemplate> {
    vec![
        EventTemplate::new(
            "mysterious_signal",
            "Strange Signal Detected",
            "The old radio has picked up a repeating signal. It could be other survivors—or a trap.",
            Narrative,
        )
        .requires_day(7)
        .option(
            "investigate_signal",
            "Investigate",
            [5, -5, 10],
            "Risk it to find potential allies",
        )
        .option(
            "ignore_signal",
            "Ignore It",
            [-3, 0, -2],
            "Play it safe",
        )
        .option(
            "monitor_only",
            "Monitor and Wait",
            [0, -2, 3],
            "Gather more information first",
        ),
        EventTemplate::new(
            "old_world_relic",
            "Discovery of the Old World",
            "Someone found a sealed time capsule from before the collapse. Should we open it?",
            Narrative,
        )
        .requires_day(10)
        .option(
            "open_capsule",
            "Open It",
            [10, 5, 0],
            "Remember what we're trying to preserve",
        )
        .option(
            "preserve_sealed",
            "Keep It Sealed",
            [-5, 3, -3],
            "Some things are better left in the past",
        )
        .option(
            "ceremony",
            "Public Ceremony",
            [15, 0, 2],
            "Make it a community moment",
        ),
        EventTemplate::new(
            "prophetic_dream",
            "Disturbing Visions",
            "Multiple people report having the same nightmare. Coincidence or warning?",
            Narrative,
        )
        .requires_day(12)
        .option(
            "investigate_dreams",
            "Take It Seriously",
            [-5, -5, -10],
            "Prepare for what they foresaw",
        )
        .option(
            "dismiss",
            "Dismiss as Stress",
            [5, 0, 5],
            "Don't feed into superstition",
        )
        .option(
            "document",
            "Document and Monitor",
            [0, -2, 0],
            "Keep track but stay rational",
        ),
        EventTemplate::new(
            "abandoned_bunker",
            "Pre-War Bunker Discovered",
            "An underground facility has been found. It's sealed, but we might be able to enter.",
            Narrative,
        )
        .requires_day(9)
        .option(
            "force_entry",
            "Force It Open",
            [8, 15, 15],
            "Unknown risks, unknown rewards",
        )
        .option(
            "cautious_entry",
            "Careful Investigation",
            [5, 8, 5],
            "Take our time and be safe",
        )
        .option(
            "leave_sealed",
            "Leave It Alone",
            [-8, 0, -8],
            "Some doors should stay closed",
        ),
        EventTemplate::new(
            "ghost_town",
            "Nearby Ghost Town",
            "Scouts found an abandoned town nearby. No signs of what happened to the people.",
            Narrative,
        )
        .requires_day(11)
        .option(
            "scavenge_town",
            "Scavenge Everything",
            [-8, 20, 12],
            "Lots of resources, but feels wrong",
        )
        .option(
            "investigate_mystery",
            "Investigate What Happened",
            [-5, 5, 8],
            "Learn from their fate",
        )
        .option(
            "avoid_town",
            "Stay Away",
            [3, -3, -5],
            "There's a reason it's empty",
        ),
        EventTemplate::new(
            "visitor_from_past",
            "Unexpected Reunion",
            "Someone from a community member's past has arrived with news from far away.",
            Narrative,
        )
        .requires_day(13)
        .option(
            "share_information",
            "Exchange Information",
            [12, -5, 8],
            "Learn about the wider world",
        )
        .option(
            "offer_shelter",
            "Offer Them Shelter",
            [8, -8, 3],
            "Help an old friend",
        )
        .option(
            "send_away",
            "Send Them On",
            [-5, 3, -5],
            "Don't want to attract attention",
        ),
        EventTemplate::new(
            "ancient_warning",
            "Mysterious Markings Found",
            "Strange symbols have been found carved into trees around the perimeter. A warning?",
            Narrative,
        )
        .requires_day(8)
        .option(
            "decipher",
            "Try to Decipher",
            [-8, -3, 5],
            "Understanding might protect us",
        )
        .option(
            "erase",
            "Erase Them All",
            [5, 0, 8],
            "Don't let fear control us",
        )
        .option(
            "leave_markings",
            "Leave Them Be",
            [-3, 0, -3],
            "Might be important",
        ),
    ]
}

/// Everyday decisions with baseline weights.
pub fn general_templates() -> Vec<EventTemplate> {
    vec![
        resource_allocation(),
        EventTemplate::new(
            "community_dispute",
            "Community Disagreement",
            "A heated debate has broken out about community priorities. How to resolve it?",
            General,
        )
        .weight(2)
        .option(
            "democratic_vote",
            "Hold a Vote",
            [5, -2, 0],
            "Let everyone have their say",
        )
        .option(
            "leadership_decides",
            "Leadership Decides",
            [-3, 2, -3],
            "Quick decisions, less debate",
        )
        .option(
            "compromise",
            "Find Compromise",
            [3, 0, 1],
            "Make everyone a little happy",
        ),
        EventTemplate::new(
            "weather_challenge",
            "Challenging Weather Ahead",
            "Bad weather is approaching. How should the community prepare?",
            General,
        )
        .weight(2)
        .option(
            "shelter_prep",
            "Reinforce Shelter",
            [2, -5, -5],
            "Protect what we have",
        )
        .option(
            "gather_before_storm",
            "Gather Resources Now",
            [-2, 10, 5],
            "Stock up while we can",
        )
        .option(
            "business_as_usual",
            "Continue Normally",
            [4, -2, 3],
            "Don't let weather control us",
        ),
        EventTemplate::new(
            "skill_development",
            "Community Education",
            "People want to learn new skills. What should we teach?",
            General,
        )
        .weight(2)
        .min_morale(30)
        .option(
            "survival_skills",
            "Survival Training",
            [3, 5, -5],
            "Essential knowledge",
        )
        .option(
            "cultural_arts",
            "Arts and Culture",
            [12, -3, 2],
            "Preserve our humanity",
        )
        .option(
            "technical_training",
            "Technical Skills",
            [5, 8, 0],
            "Practical knowledge",
        ),
        EventTemplate::new(
            "guard_duty",
            "Guard Rotation Decision",
            "How should we organize night watch and security patrols?",
            General,
        )
        .weight(2)
        .option(
            "strict_rotation",
            "Strict Rotation",
            [-5, 0, -10],
            "Everyone takes turns, maximum security",
        )
        .option(
            "volunteer_basis",
            "Volunteer Basis",
            [5, 3, 5],
            "Let people choose when to help",
        )
        .option(
            "professional_guards",
            "Dedicated Guards",
            [3, -5, -8],
            "Train specialists for security",
        ),
        EventTemplate::new(
            "youth_future",
            "Planning for the Next Generation",
            "What should we prioritize for the children in our community?",
            General,
        )
        .weight(2)
        .min_morale(35)
        .option(
            "education",
            "Formal Education",
            [10, -5, 3],
            "Teach reading, math, history",
        )
        .option(
            "apprenticeship",
            "Practical Skills",
            [5, 8, 0],
            "Learn by doing real work",
        )
        .option(
            "childhood",
            "Let Them Be Kids",
            [15, -8, 5],
            "Preserve their innocence",
        ),
        EventTemplate::new(
            "memorial_day",
            "Remembering the Lost",
            "It's been proposed to honor those we've lost. How should we remember?",
            General,
        )
        .weight(2)
        .requires_day(5)
        .option(
            "monument",
            "Build a Monument",
            [8, -8, 0],
            "A permanent reminder",
        )
        .option(
            "ceremony",
            "Hold a Ceremony",
            [12, -3, 2],
            "Come together in remembrance",
        )
        .option(
            "silence",
            "Moment of Silence",
            [5, 0, 0],
            "Simple and personal",
        ),
        EventTemplate::new(
            "animal_encounter",
            "Wildlife in the Area",
            "Animals have been spotted near the community. How should we respond?",
            General,
        )
        .weight(2)
        .option(
            "hunt",
            "Hunt for Food",
            [3, 12, 5],
            "Valuable protein source",
        )
        .option(
            "observe",
            "Observe and Study",
            [8, 3, 2],
            "Learn from nature",
        )
        .option(
            "drive_away",
            "Drive Them Away",
            [-3, 0, -5],
            "Protect our territory",
        ),
        EventTemplate::new(
            "music_night",
            "Community Gathering Proposed",
            "Someone suggests an evening of music and storytelling. Worth the time?",
            General,
        )
        .weight(2)
        .min_morale(25)
        .option(
            "full_celebration",
            "Big Celebration",
            [18, -10, 5],
            "Go all out, everyone needs this",
        )
        .option(
            "modest_gathering",
            "Modest Gathering",
            [10, -3, 2],
            "Small but meaningful",
        )
        .option(
            "skip_it",
            "Focus on Work",
            [-8, 5, -3],
            "We can't afford distractions",
        ),
        EventTemplate::new(
            "tool_maintenance",
            "Equipment Maintenance Day",
            "Our tools and equipment need upkeep. How thorough should we be?",
            General,
        )
        .weight(2)
        .option(
            "full_maintenance",
            "Complete Overhaul",
            [-5, 15, -5],
            "Time-consuming but thorough",
        )
        .option(
            "basic_repairs",
            "Basic Repairs",
            [2, 8, 0],
            "Fix what's broken",
        )
        .option(
            "minimal_upkeep",
            "Quick Check",
            [5, 3, 3],
            "Just enough to keep going",
        ),
        EventTemplate::new(
            "new_crop",
            "Experimental Farming",
            "Someone wants to try growing a new type of crop. Should we allocate resources?",
            General,
        )
        .weight(2)
        .min_supplies(30)
        .option(
            "full_commitment",
            "Full Trial",
            [8, 15, 3],
            "Could pay off big",
        )
        .option(
            "small_test",
            "Small Test Plot",
            [5, 5, 0],
            "Low risk, modest reward",
        )
        .option(
            "stick_traditional",
            "Stick to What Works",
            [-5, 8, -3],
            "Don't risk our food security",
        ),
    ]
}

fn resource_allocation() -> EventTemplate {
    EventTemplate::new(
        "resource_allocation",
        "Daily Resource Allocation",
        "How should we prioritize today's work and resources?",
        General,
    )
    .weight(3)
    .option(
        "balanced",
        "Balanced Approach",
        [2, 3, -2],
        "Spread effort evenly",
    )
    .option(
        "focus_defense",
        "Focus on Defense",
        [-3, -2, -8],
        "Security above all",
    )
    .option(
        "focus_gathering",
        "Focus on Gathering",
        [1, 8, 4],
        "Build up our supplies",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::EventCategory;
    use std::collections::HashSet;

    #[test]
    fn test_builtin_counts() {
        assert_eq!(crisis_templates().len(), 7);
        assert_eq!(opportunity_templates().len(), 8);
        assert_eq!(narrative_templates().len(), 7);
        assert_eq!(general_templates().len(), 11);
        assert_eq!(builtin_templates().len(), 33);
    }

    #[test]
    fn test_builtin_templates_validate() {
        for t in builtin_templates() {
            assert!(t.validate().is_ok(), "{} failed validation", t.id);
        }
    }

    #[test]
    fn test_builtin_ids_unique() {
        let all = builtin_templates();
        let ids: HashSet<&str> = all.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids.len(), all.len());
    }

    #[test]
    fn test_categories_grouped() {
        assert!(crisis_templates().iter().all(|t| t.category == EventCategory::Crisis));
        assert!(opportunity_templates()
            .iter()
            .all(|t| t.category == EventCategory::Opportunity));
        assert!(narrative_templates()
            .iter()
            .all(|t| t.category == EventCategory::Narrative));
        assert!(general_templates().iter().all(|t| t.category == EventCategory::General));
    }

    #[test]
    fn test_fallback_is_unconstrained_general() {
        let t = fallback_template();
        assert_eq!(t.id, "resource_allocation");
        assert_eq!(t.category, EventCategory::General);
        assert_eq!(t.weight, 3);
        assert_eq!(t.requires_day, 0);
        assert!(t.is_unconstrained());
    }

    #[test]
    fn test_food_shortage_window() {
        let all = crisis_templates();
        let t = all.iter().find(|t| t.id == "food_shortage_critical").unwrap();
        assert_eq!(t.max_supplies, 20);
        assert_eq!(t.options[0].key, "emergency_rationing");
    }
}
