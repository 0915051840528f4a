//! Villager jobs - workplace table, activity catalogs and sleep windows.

use crate::building::BuildingType;
use serde::{Deserialize, Serialize};

/// Activities every villager may do regardless of job.
pub const COMMON_ACTIVITIES: [&str; 7] = [
    "Visit the market",
    "Chat with neighbors",
    "Eat at the Inn",
    "Relax at home",
    "Attend town gathering",
    "Go for a walk",
    "Collect water from well",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Job {
    Farmer,
    Blacksmith,
    Merchant,
    Guard,
    Baker,
    Tailor,
    Carpenter,
    Miner,
    Hunter,
    Innkeeper,
}

impl Job {
    pub const ALL: [Job; 10] = [
        Job::Farmer,
        Job::Blacksmith,
        Job::Merchant,
        Job::Guard,
        Job::Baker,
        Job::Tailor,
        Job::Carpenter,
        Job::Miner,
        Job::Hunter,
        Job::Innkeeper,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Job::Farmer => "Farmer",
            Job::Blacksmith => "Blacksmith",
            Job::Merchant => "Merchant",
            Job::Guard => "Guard",
            Job::Baker => "Baker",
            Job::Tailor => "Tailor",
            Job::Carpenter => "Carpenter",
            Job::Miner => "Miner",
            Job::Hunter => "Hunter",
            Job::Innkeeper => "Innkeeper",
        }
    }

    /// Building type this job works in. `None` for jobs worked outside the village.
    pub fn workplace_type(&self) -> Option<BuildingType> {
        match self {
            Job::Baker => Some(BuildingType::Bakery),
            Job::Blacksmith => Some(BuildingType::Smithy),
            Job::Merchant => Some(BuildingType::Store),
            Job::Innkeeper => Some(BuildingType::Inn),
            Job::Farmer => Some(BuildingType::Farm),
            Job::Tailor | Job::Carpenter => Some(BuildingType::Workshop),
            Job::Guard => Some(BuildingType::TownHall),
            Job::Miner | Job::Hunter => None,
        }
    }

    /// Single-worker jobs: one villager per building instance.
    pub fn has_exclusive_workplace(&self) -> bool {
        matches!(self, Job::Blacksmith | Job::Baker | Job::Innkeeper)
    }

    pub fn works_outside_village(&self) -> bool {
        matches!(self, Job::Miner | Job::Hunter)
    }

    /// Fixed job-specific part of a daily schedule.
    pub fn activities(&self) -> &'static [&'static str] {
        match self {
            Job::Baker => &[
                "Wake up early",
                "Prepare dough",
                "Bake bread",
                "Sell goods to customers",
                "Clean bakery",
                "Chat with customers",
                "Return home",
            ],
            Job::Blacksmith => &[
                "Get materials ready",
                "Forge tools and weapons",
                "Repair items",
                "Work on special orders",
                "Sell wares",
                "Return home",
            ],
            Job::Merchant => &[
                "Open shop",
                "Arrange merchandise",
                "Bargain with customers",
                "Restock inventory",
                "Close shop",
                "Count earnings",
                "Return home",
            ],
            Job::Innkeeper => &[
                "Prepare breakfast for guests",
                "Clean rooms",
                "Welcome new travelers",
                "Serve food and drinks",
                "Manage staff",
                "Close up for the night",
            ],
            Job::Farmer => &[
                "Tend to crops",
                "Feed animals",
                "Repair fences",
                "Take produce to market",
                "Plant new seeds",
                "Return home",
            ],
            Job::Tailor => &[
                "Cut fabric",
                "Sew garments",
                "Meet with clients",
                "Design new styles",
                "Make alterations",
                "Return home",
            ],
            Job::Carpenter => &[
                "Select wood",
                "Cut lumber",
                "Build furniture",
                "Make repairs around village",
                "Finish projects",
                "Return home",
            ],
            Job::Miner => &[
                "Prepare equipment",
                "Travel to mines outside village",
                "Dig for ore and minerals",
                "Take breaks for meals",
                "Sort and clean findings",
                "Return to village with materials",
                "Sell findings at market",
                "Return home",
            ],
            Job::Hunter => &[
                "Check hunting equipment",
                "Travel to hunting grounds",
                "Track animals in the forest",
                "Hunt for game",
                "Process catches",
                "Return to village with game",
                "Sell meat and furs at market",
                "Return home",
            ],
            Job::Guard => &[
                "Patrol village",
                "Check on merchants",
                "Stand watch at gate",
                "Train with weapons",
                "Report to captain",
                "Return home",
            ],
        }
    }

    /// Default (wake, sleep) hour ranges, shifted for early and late trades.
    pub fn sleep_window(&self) -> ((f32, f32), (f32, f32)) {
        match self {
            Job::Baker => ((4.5, 6.0), (20.0, 21.5)),
            Job::Innkeeper => ((7.5, 9.5), (22.5, 23.9)),
            _ => ((6.0, 9.0), (21.0, 23.0)),
        }
    }
}

impl std::fmt::Display for Job {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for Job {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Job::ALL
            .iter()
            .copied()
            .find(|job| job.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown job '{}'", s))
    }
}
