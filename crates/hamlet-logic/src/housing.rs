//! Housing allocation - homes, workplaces, schedules and house names.
//!
//! [`assign`] is a pure function of the roster, the building list and the
//! RNG. It never fails: missing data and occupancy exhaustion degrade to
//! recorded [`HousingNotice`]s plus a log line, and the caller proceeds with
//! whatever was assigned.

use crate::building::{Building, BuildingId, BuildingType};
use crate::geometry::{pixel_distance_squared, PixelPos};
use crate::jobs::Job;
use crate::schedule::DailySchedule;
use log::{info, warn};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What the allocator needs to know about a villager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResidentProfile {
    pub name: String,
    pub job: Job,
}

impl ResidentProfile {
    pub fn new(name: impl Into<String>, job: Job) -> Self {
        Self {
            name: name.into(),
            job,
        }
    }
}

/// Village extents used to place external workplaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VillageBounds {
    pub width: i32,
    pub height: i32,
    pub tile_size: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HomeAssignment {
    /// `BuildingId::NONE` when unassigned
    pub building_id: BuildingId,
    pub building_type: Option<BuildingType>,
    pub position: PixelPos,
    /// Every occupant of the building in assignment order, self included
    pub roommates: Vec<String>,
    pub bed_position: Option<PixelPos>,
    pub name: Option<String>,
}

impl HomeAssignment {
    pub fn unassigned() -> Self {
        Self {
            building_id: BuildingId::NONE,
            building_type: None,
            position: (0, 0),
            roommates: Vec::new(),
            bed_position: None,
            name: None,
        }
    }

    pub fn is_assigned(&self) -> bool {
        !self.building_id.is_none()
    }
}

impl Default for HomeAssignment {
    fn default() -> Self {
        Self::unassigned()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkplaceAssignment {
    /// `BuildingId::NONE` for workplaces outside the village
    pub building_id: BuildingId,
    /// Building type label, or "<Job> Workplace" for external ones
    pub label: String,
    pub position: PixelPos,
    pub is_external: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VillagerAssignment {
    pub name: String,
    pub job: Job,
    pub home: HomeAssignment,
    pub workplace: Option<WorkplaceAssignment>,
    pub daily_activities: DailySchedule,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HouseName {
    pub building_id: BuildingId,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgeDirection {
    North,
    East,
    South,
    West,
}

impl EdgeDirection {
    pub const ALL: [EdgeDirection; 4] = [
        EdgeDirection::North,
        EdgeDirection::East,
        EdgeDirection::South,
        EdgeDirection::West,
    ];
}

/// Sanctioned degradations observed during allocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HousingNotice {
    NoBuildingsAvailable,
    /// No House/Cottage/Manor existed; every building was treated as a home
    NoResidentialBuildings,
    /// Every home was full; the villager was placed over the cap
    Overflow {
        villager: String,
        building_id: BuildingId,
    },
    ExternalWorkplace {
        villager: String,
        direction: EdgeDirection,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentSet {
    pub villagers: Vec<VillagerAssignment>,
    pub house_names: Vec<HouseName>,
    pub notices: Vec<HousingNotice>,
}

impl AssignmentSet {
    pub fn get(&self, name: &str) -> Option<&VillagerAssignment> {
        self.villagers.iter().find(|v| v.name == name)
    }

    /// Occupant names of a building, in assignment order.
    pub fn occupants(&self, building_id: BuildingId) -> Vec<&str> {
        self.villagers
            .iter()
            .filter(|v| v.home.building_id == building_id)
            .map(|v| v.name.as_str())
            .collect()
    }

    pub fn house_name(&self, building_id: BuildingId) -> Option<&str> {
        self.house_names
            .iter()
            .find(|h| h.building_id == building_id)
            .map(|h| h.name.as_str())
    }

    pub fn overflow_count(&self) -> usize {
        self.notices
            .iter()
            .filter(|n| matches!(n, HousingNotice::Overflow { .. }))
            .count()
    }
}

/// Assign every resident a home, a workplace where one exists, and a
/// daily schedule.
pub fn assign(
    residents: &[ResidentProfile],
    buildings: &[Building],
    bounds: VillageBounds,
    rng: &mut impl Rng,
) -> AssignmentSet {
    let mut set = AssignmentSet::default();
    if buildings.is_empty() {
        warn!("No buildings available for housing; villagers stay unassigned");
        set.notices.push(HousingNotice::NoBuildingsAvailable);
        return set;
    }

    let mut residential: Vec<Building> = buildings
        .iter()
        .filter(|b| b.building_type.is_residential())
        .cloned()
        .collect();
    if residential.is_empty() {
        warn!("No residential buildings found; using all buildings as homes");
        set.notices.push(HousingNotice::NoResidentialBuildings);
        residential = buildings
            .iter()
            .enumerate()
            .map(|(i, b)| Building {
                id: BuildingId(i as i32),
                ..b.clone()
            })
            .collect();
    }

    let mut occupants: BTreeMap<BuildingId, Vec<String>> = BTreeMap::new();

    for resident in residents {
        let workplace = pick_workplace(resident.job, buildings, &set.villagers);
        let home = pick_home(&residential, &occupants, workplace.as_ref(), rng);

        let home = match home {
            Some(HomeChoice::Free(b)) => Some(b),
            Some(HomeChoice::Overflow(b)) => {
                warn!(
                    "All homes full; {} overflows into building {}",
                    resident.name, b.id
                );
                set.notices.push(HousingNotice::Overflow {
                    villager: resident.name.clone(),
                    building_id: b.id,
                });
                Some(b)
            }
            None => None,
        };

        let home_assignment = match home {
            Some(b) => {
                occupants
                    .entry(b.id)
                    .or_default()
                    .push(resident.name.clone());
                HomeAssignment {
                    building_id: b.id,
                    building_type: Some(b.building_type),
                    position: b.position,
                    roommates: Vec::new(),
                    bed_position: None,
                    name: None,
                }
            }
            None => HomeAssignment::unassigned(),
        };

        set.villagers.push(VillagerAssignment {
            name: resident.name.clone(),
            job: resident.job,
            home: home_assignment,
            workplace,
            daily_activities: DailySchedule::for_job(resident.job, rng),
        });
    }

    // Roommate lists reflect the final roster of each home
    for entry in &mut set.villagers {
        if let Some(roster) = occupants.get(&entry.home.building_id) {
            entry.home.roommates = roster.clone();
        }
    }

    for entry in &mut set.villagers {
        if entry.job.works_outside_village() && entry.workplace.is_none() {
            let (workplace, direction) = external_workplace(entry.job, bounds, rng);
            info!(
                "Assigned external workplace for {} ({}) to the {:?}",
                entry.name, entry.job, direction
            );
            set.notices.push(HousingNotice::ExternalWorkplace {
                villager: entry.name.clone(),
                direction,
            });
            entry.workplace = Some(workplace);
        }
    }

    for (building_id, roster) in &occupants {
        if let Some(name) = house_name(roster) {
            set.house_names.push(HouseName {
                building_id: *building_id,
                name,
            });
        }
    }
    for entry in &mut set.villagers {
        let name = set
            .house_names
            .iter()
            .find(|h| h.building_id == entry.home.building_id)
            .map(|h| h.name.clone());
        entry.home.name = name;
    }

    info!(
        "Assigned homes to {} villagers across {} buildings",
        set.villagers.iter().filter(|v| v.home.is_assigned()).count(),
        occupants.len()
    );
    set
}

/// First building of the job's type that is not taken by an exclusive worker.
fn pick_workplace(
    job: Job,
    buildings: &[Building],
    assigned: &[VillagerAssignment],
) -> Option<WorkplaceAssignment> {
    let wanted = job.workplace_type()?;
    buildings
        .iter()
        .filter(|b| b.building_type == wanted)
        .find(|b| {
            !job.has_exclusive_workplace()
                || !assigned.iter().any(|v| {
                    v.workplace
                        .as_ref()
                        .is_some_and(|w| w.building_id == b.id)
                })
        })
        .map(|b| WorkplaceAssignment {
            building_id: b.id,
            label: wanted.label().to_string(),
            position: b.position,
            is_external: false,
        })
}

enum HomeChoice<'a> {
    Free(&'a Building),
    Overflow(&'a Building),
}

fn pick_home<'a>(
    residential: &'a [Building],
    occupants: &BTreeMap<BuildingId, Vec<String>>,
    workplace: Option<&WorkplaceAssignment>,
    rng: &mut impl Rng,
) -> Option<HomeChoice<'a>> {
    let has_room = |b: &Building| {
        let count = occupants.get(&b.id).map_or(0, Vec::len);
        count < b.occupancy_cap()
    };

    if let Some(work) = workplace {
        let mut nearest: Option<(&Building, i64)> = None;
        for b in residential.iter().filter(|b| has_room(*b)) {
            let d = pixel_distance_squared(b.position, work.position);
            if nearest.map_or(true, |(_, best)| d < best) {
                nearest = Some((b, d));
            }
        }
        if let Some((b, _)) = nearest {
            return Some(HomeChoice::Free(b));
        }
    }

    if let Some(b) = residential.iter().find(|b| has_room(*b)) {
        return Some(HomeChoice::Free(b));
    }

    residential.choose(rng).map(HomeChoice::Overflow)
}

fn external_workplace(
    job: Job,
    bounds: VillageBounds,
    rng: &mut impl Rng,
) -> (WorkplaceAssignment, EdgeDirection) {
    let direction = *EdgeDirection::ALL
        .choose(rng)
        .unwrap_or(&EdgeDirection::North);
    let edge = bounds.tile_size * 2;
    let position = match direction {
        EdgeDirection::North => (inset_coordinate(bounds.width, rng), edge),
        EdgeDirection::East => (bounds.width - edge, inset_coordinate(bounds.height, rng)),
        EdgeDirection::South => (inset_coordinate(bounds.width, rng), bounds.height - edge),
        EdgeDirection::West => (edge, inset_coordinate(bounds.height, rng)),
    };
    let workplace = WorkplaceAssignment {
        building_id: BuildingId::NONE,
        label: format!("{} Workplace", job),
        position,
        is_external: true,
    };
    (workplace, direction)
}

/// Random coordinate at least 100 px from both ends of the axis.
fn inset_coordinate(extent: i32, rng: &mut impl Rng) -> i32 {
    const INSET: i32 = 100;
    if extent - INSET > INSET {
        rng.gen_range(INSET..=extent - INSET)
    } else {
        extent / 2
    }
}

/// Display name for a home from its occupants, in assignment order.
pub fn house_name(occupants: &[String]) -> Option<String> {
    match occupants {
        [] => None,
        [only] => Some(format!("{}'s House", only)),
        [first, second, ..] => {
            let last_names: Vec<&str> = occupants
                .iter()
                .map(|n| n.split_whitespace().last().unwrap_or(n.as_str()))
                .collect();
            if last_names.iter().all(|l| *l == last_names[0]) {
                Some(format!("The {} House", last_names[0]))
            } else if occupants.len() == 2 {
                Some(format!("{} and {}'s House", first, second))
            } else {
                Some(format!("{} and Others' House", first))
            }
        }
    }
}

/// Copy derived house names onto the building records.
pub fn apply_house_names(buildings: &mut [Building], set: &AssignmentSet) {
    for house in &set.house_names {
        if let Some(building) = buildings.iter_mut().find(|b| b.id == house.building_id) {
            building.name = Some(house.name.clone());
        }
    }
}
