//! Race state and core simulation types
//!
//! Everything a tick reads or mutates lives here. The state is rebuilt from
//! the static map definition on every (re)load.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::effects::{Effect, EffectKind, EffectLedger, EffectMagnitude};
use super::geometry::Rect;
use super::outcome;
use crate::map::{Entrant, MapDefinition};

/// Walls are static axis-aligned rectangles owned by the map
pub type Wall = Rect;

/// Lifecycle of a loaded race
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RacePhase {
    /// Loaded (or reset) but not started
    Idle,
    /// Ticking
    Running,
    /// Every horse has a standing
    Complete,
}

/// How the race is won
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RaceMode {
    /// First across the line wins
    Finish { line: Rect },
    /// Last horse standing wins
    Survival,
}

/// Power-up types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerUpKind {
    Boost,
    Turbo,
    Teleport,
    Magnet,
    TimeFreeze,
    IceFreezer,
    Ghost,
    Shield,
    Ram,
    WarpZone,
    QuantumDash,
    Nebula,
}

impl PowerUpKind {
    pub const COUNT: usize = 12;

    /// Warp zones are permanent map features, everything else is single-use
    #[inline]
    pub fn is_permanent(self) -> bool {
        self == PowerUpKind::WarpZone
    }

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

/// A live power-up instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerUp {
    pub id: u32,
    pub kind: PowerUpKind,
    pub pos: Vec2,
    pub radius: f32,
}

/// A self-triggered ability a horse can fire from its control input
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    pub kind: PowerUpKind,
    pub cooldown_ms: f32,
}

/// A racing horse
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Horse {
    pub id: u32,
    pub name: String,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    /// Where the horse starts (and returns to on reset)
    pub spawn: Vec2,
    pub eliminated: bool,
    pub finished: bool,
    pub player_controlled: bool,
    /// Product of active speed effects, recomputed every tick
    pub speed_multiplier: f32,
    pub effects: EffectLedger,
    #[serde(default)]
    pub skill: Option<Skill>,
    /// Time until the skill can fire again
    #[serde(default)]
    pub skill_cooldown_ms: f32,
}

impl Horse {
    pub fn new(entrant: &Entrant, spawn: Vec2) -> Self {
        Self {
            id: entrant.id,
            name: entrant.name.clone(),
            pos: spawn,
            vel: Vec2::ZERO,
            radius: entrant.radius,
            spawn,
            eliminated: false,
            finished: false,
            player_controlled: entrant.player_controlled,
            speed_multiplier: 1.0,
            effects: EffectLedger::new(),
            skill: entrant.skill,
            skill_cooldown_ms: 0.0,
        }
    }

    /// Eliminated or finished; terminal horses no longer move or collide
    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.eliminated || self.finished
    }

    /// Mark eliminated. Returns false if the horse was already terminal.
    pub fn eliminate(&mut self) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.eliminated = true;
        true
    }

    /// Mark finished. Returns false if the horse was already terminal.
    pub fn finish(&mut self) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.finished = true;
        true
    }

    #[inline]
    pub fn can_phase(&self) -> bool {
        self.effects.can_phase()
    }

    #[inline]
    pub fn has_shield(&self) -> bool {
        self.effects.is_active(EffectKind::Shield)
    }

    #[inline]
    pub fn has_ram_aura(&self) -> bool {
        self.effects.is_active(EffectKind::RamAura)
    }

    /// Recompute the derived speed multiplier from active effects
    pub fn refresh_speed_multiplier(&mut self) {
        self.speed_multiplier = self.effects.speed_multiplier();
    }

    /// Return to spawn with a clean slate
    pub fn reset(&mut self) {
        self.pos = self.spawn;
        self.vel = Vec2::ZERO;
        self.eliminated = false;
        self.finished = false;
        self.speed_multiplier = 1.0;
        self.effects.clear();
        self.skill_cooldown_ms = 0.0;
    }
}

/// How a horse reached its standing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StandingOutcome {
    Finished,
    Eliminated,
}

/// A horse's final placing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Standing {
    pub horse_id: u32,
    /// 1 is the best outcome
    pub position: u32,
    /// Race time when the horse reached its terminal state
    pub finish_time_ms: f32,
    pub outcome: StandingOutcome,
}

/// Damage delivered by a source outside the physics core
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Hit {
    /// Temporarily stun the horse
    Stun { duration_ms: f32, damping: f32 },
    /// Remove the horse from the race
    Lethal,
}

/// What a [`Hit`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitOutcome {
    /// A shield charge took the hit
    Absorbed,
    Stunned,
    Eliminated,
    /// Target missing or already terminal
    Ignored,
}

/// Complete race state
#[derive(Debug, Clone)]
pub struct RaceState {
    /// Seed the RNG was created from
    pub seed: u64,
    pub rng: Pcg32,
    pub phase: RacePhase,
    pub mode: RaceMode,
    /// Playable area; horses are kept inside it
    pub arena: Rect,
    pub walls: Vec<Wall>,
    /// Roster in spawn order (index order is the tie-break order)
    pub horses: Vec<Horse>,
    /// Live power-ups (sorted by id for determinism)
    pub power_ups: Vec<PowerUp>,
    /// Appended as horses reach a terminal state
    pub standings: Vec<Standing>,
    /// Accumulated race time
    pub elapsed_ms: f32,
    pub tick_count: u64,
}

impl RaceState {
    /// Build a fresh race from a map and its entrants
    ///
    /// The caller is expected to have validated the map against the entrants.
    pub fn new(map: &MapDefinition, entrants: &[Entrant], seed: u64) -> Self {
        let horses = entrants
            .iter()
            .zip(map.spawn_points.iter())
            .map(|(entrant, &spawn)| Horse::new(entrant, spawn))
            .collect();

        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            phase: RacePhase::Idle,
            mode: map.mode,
            arena: map.arena(),
            walls: map.walls.clone(),
            horses,
            power_ups: map.live_power_ups(),
            standings: Vec::new(),
            elapsed_ms: 0.0,
            tick_count: 0,
        }
    }

    /// Reseed from the map: fresh power-ups, horses back to spawn, no standings
    pub fn reset(&mut self, map: &MapDefinition) {
        self.rng = Pcg32::seed_from_u64(self.seed);
        self.phase = RacePhase::Idle;
        self.power_ups = map.live_power_ups();
        self.standings.clear();
        self.elapsed_ms = 0.0;
        self.tick_count = 0;
        for horse in &mut self.horses {
            horse.reset();
        }
    }

    /// Horses still racing
    pub fn active_count(&self) -> usize {
        self.horses.iter().filter(|h| !h.is_terminal()).count()
    }

    pub fn horse_index(&self, id: u32) -> Option<usize> {
        self.horses.iter().position(|h| h.id == id)
    }

    pub fn is_complete(&self) -> bool {
        self.standings.len() == self.horses.len()
    }

    /// Apply external damage to a horse
    ///
    /// Only lands while the race is running. A shield absorbs the hit whatever
    /// its kind. A lethal hit records the standing (and completes the race if
    /// it decides it) right away.
    pub fn apply_hit(&mut self, index: usize, hit: Hit) -> HitOutcome {
        if self.phase != RacePhase::Running {
            return HitOutcome::Ignored;
        }
        let Some(horse) = self.horses.get_mut(index) else {
            return HitOutcome::Ignored;
        };
        if horse.is_terminal() {
            return HitOutcome::Ignored;
        }
        if horse.effects.absorb_hit() {
            log::debug!("Horse {} shield absorbed {:?}", horse.id, hit);
            return HitOutcome::Absorbed;
        }
        match hit {
            Hit::Stun {
                duration_ms,
                damping,
            } => {
                horse.effects.apply(Effect::new(
                    EffectKind::Stunned,
                    duration_ms,
                    EffectMagnitude::Stun { damping },
                ));
                HitOutcome::Stunned
            }
            Hit::Lethal => {
                horse.eliminate();
                log::debug!("Horse {} eliminated by external hit", horse.id);
                outcome::detect(self);
                HitOutcome::Eliminated
            }
        }
    }

    /// Standings ordered by position
    pub fn results(&self) -> Vec<Standing> {
        let mut results = self.standings.clone();
        results.sort_by_key(|s| s.position);
        results
    }
}
