//! Interaction coordinator - pairs nearby villagers into short conversations
//!
//! The coordinator only reads positions and sleep state. It writes nothing
//! but the [`Talk`] flag and its own conversation/cooldown bookkeeping.

use crate::components::{Identity, Position, SleepCycle, Talk, VillagerId};
use crate::events::{EventSink, SimEvent};
use hamlet_logic::config::{InteractionConfig, Range};
use hamlet_logic::geometry::Vec2;
use hecs::{Entity, World};
use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// An active two-person conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub first: VillagerId,
    pub second: VillagerId,
    pub first_name: String,
    pub second_name: String,
    /// Simulation seconds at start
    pub started_at: f64,
    pub duration: f64,
}

impl Conversation {
    pub fn involves(&self, id: VillagerId) -> bool {
        self.first == id || self.second == id
    }

    pub fn elapsed(&self, now: f64) -> f64 {
        now - self.started_at
    }
}

/// Snapshot of one villager taken at the start of a scan
struct Participant {
    entity: Entity,
    id: VillagerId,
    name: String,
    position: Vec2,
    sleeping: bool,
}

#[derive(Debug, Clone)]
pub struct InteractionCoordinator {
    settings: InteractionConfig,
    conversations: Vec<Conversation>,
    /// Simulation time at which each villager may talk again
    cooldowns: BTreeMap<VillagerId, f64>,
}

impl Default for InteractionCoordinator {
    fn default() -> Self {
        Self::new(InteractionConfig::default())
    }
}

impl InteractionCoordinator {
    pub fn new(settings: InteractionConfig) -> Self {
        Self {
            settings,
            conversations: Vec::new(),
            cooldowns: BTreeMap::new(),
        }
    }

    pub fn settings(&self) -> &InteractionConfig {
        &self.settings
    }

    pub fn set_conversation_chance(&mut self, chance: f32) {
        self.settings.conversation_chance = chance.clamp(0.0, 1.0);
    }

    pub fn active(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn is_in_conversation(&self, id: VillagerId) -> bool {
        self.conversations.iter().any(|c| c.involves(id))
    }

    pub fn is_on_cooldown(&self, id: VillagerId, now: f64) -> bool {
        self.cooldowns.get(&id).is_some_and(|until| *until > now)
    }

    /// Drop every conversation and cooldown, clearing the talk flags.
    pub fn clear(&mut self, world: &mut World) {
        for (_, talk) in world.query_mut::<&mut Talk>() {
            talk.is_talking = false;
        }
        self.conversations.clear();
        self.cooldowns.clear();
    }

    /// One scan: end finished conversations, start new ones, expire cooldowns.
    pub fn update(
        &mut self,
        world: &mut World,
        now: f64,
        rng: &mut impl Rng,
        sink: &mut dyn EventSink,
    ) {
        let mut roster: Vec<Participant> = world
            .query::<(&VillagerId, &Identity, &Position, &SleepCycle)>()
            .iter()
            .map(|(entity, (id, identity, position, sleep))| Participant {
                entity,
                id: *id,
                name: identity.name.clone(),
                position: position.0,
                sleeping: sleep.is_sleeping,
            })
            .collect();
        roster.sort_by_key(|p| p.id);

        self.end_finished(world, &roster, now, rng, sink);
        self.start_new(world, &roster, now, rng, sink);
        self.cooldowns.retain(|_, until| *until > now);
    }

    fn end_finished(
        &mut self,
        world: &mut World,
        roster: &[Participant],
        now: f64,
        rng: &mut impl Rng,
        sink: &mut dyn EventSink,
    ) {
        let (finished, ongoing): (Vec<Conversation>, Vec<Conversation>) =
            std::mem::take(&mut self.conversations)
                .into_iter()
                .partition(|c| has_finished(c, roster, now));
        self.conversations = ongoing;

        for conversation in finished {
            for id in [conversation.first, conversation.second] {
                if let Some(p) = roster.iter().find(|p| p.id == id) {
                    set_talking(world, p.entity, false);
                }
                let cooldown = sample(self.settings.cooldown_secs, rng) as f64;
                self.cooldowns.insert(id, now + cooldown);
            }
            debug!(
                "{} and {} finished talking after {:.1}s",
                conversation.first_name,
                conversation.second_name,
                conversation.elapsed(now)
            );
            sink.emit(SimEvent::InteractionEnded {
                first: conversation.first_name,
                second: conversation.second_name,
            });
        }
    }

    fn start_new(
        &mut self,
        world: &mut World,
        roster: &[Participant],
        now: f64,
        rng: &mut impl Rng,
        sink: &mut dyn EventSink,
    ) {
        let radius_sq = self.settings.radius * self.settings.radius;
        let mut busy: BTreeSet<VillagerId> = self
            .conversations
            .iter()
            .flat_map(|c| [c.first, c.second])
            .collect();

        for (i, a) in roster.iter().enumerate() {
            for b in &roster[i + 1..] {
                if !self.is_available(a, &busy, now) || !self.is_available(b, &busy, now) {
                    continue;
                }
                if a.position.distance_squared(&b.position) >= radius_sq {
                    continue;
                }
                if rng.gen::<f32>() >= self.settings.conversation_chance {
                    continue;
                }

                set_talking(world, a.entity, true);
                set_talking(world, b.entity, true);
                busy.insert(a.id);
                busy.insert(b.id);
                self.conversations.push(Conversation {
                    first: a.id,
                    second: b.id,
                    first_name: a.name.clone(),
                    second_name: b.name.clone(),
                    started_at: now,
                    duration: sample(self.settings.duration_secs, rng) as f64,
                });

                sink.emit(SimEvent::InteractionStarted {
                    first: a.name.clone(),
                    second: b.name.clone(),
                });
                sink.emit(SimEvent::Discussion {
                    participants: vec![a.name.clone(), b.name.clone()],
                    position: a.position.midpoint(&b.position),
                    topic: "casual".to_string(),
                });
            }
        }
    }

    fn is_available(&self, p: &Participant, busy: &BTreeSet<VillagerId>, now: f64) -> bool {
        !p.sleeping && !busy.contains(&p.id) && !self.is_on_cooldown(p.id, now)
    }
}

fn has_finished(conversation: &Conversation, roster: &[Participant], now: f64) -> bool {
    if conversation.elapsed(now) > conversation.duration {
        return true;
    }
    [conversation.first, conversation.second].iter().any(|id| {
        roster
            .iter()
            .find(|p| p.id == *id)
            .map_or(true, |p| p.sleeping)
    })
}

fn set_talking(world: &mut World, entity: Entity, talking: bool) {
    if let Ok(mut talk) = world.get::<&mut Talk>(entity) {
        talk.is_talking = talking;
    }
}

fn sample(range: Range, rng: &mut impl Rng) -> f32 {
    if range.max > range.min {
        rng.gen_range(range.min..=range.max)
    } else {
        range.min
    }
}
