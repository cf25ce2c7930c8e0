//! Read-only views of the race for renderers and other collaborators

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::effects::{Effect, EffectKind};
use super::state::{Horse, PowerUp, PowerUpKind, RacePhase, RaceState, Standing};

/// One active effect on a horse
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EffectSummary {
    pub kind: EffectKind,
    pub remaining_ms: f32,
}

impl From<&Effect> for EffectSummary {
    fn from(effect: &Effect) -> Self {
        Self {
            kind: effect.kind,
            remaining_ms: effect.remaining_ms,
        }
    }
}

/// Compact horse state for rendering/IPC
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HorseSnapshot {
    pub id: u32,
    pub name: String,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub speed_multiplier: f32,
    pub eliminated: bool,
    pub finished: bool,
    pub phasing: bool,
    pub effects: Vec<EffectSummary>,
}

impl From<&Horse> for HorseSnapshot {
    fn from(horse: &Horse) -> Self {
        Self {
            id: horse.id,
            name: horse.name.clone(),
            pos: horse.pos,
            vel: horse.vel,
            radius: horse.radius,
            speed_multiplier: horse.speed_multiplier,
            eliminated: horse.eliminated,
            finished: horse.finished,
            phasing: horse.can_phase(),
            effects: horse.effects.iter().map(EffectSummary::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerUpSnapshot {
    pub id: u32,
    pub kind: PowerUpKind,
    pub pos: Vec2,
    pub radius: f32,
}

impl From<&PowerUp> for PowerUpSnapshot {
    fn from(power_up: &PowerUp) -> Self {
        Self {
            id: power_up.id,
            kind: power_up.kind,
            pos: power_up.pos,
            radius: power_up.radius,
        }
    }
}

/// Compact race snapshot, taken between ticks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceSnapshot {
    pub phase: RacePhase,
    pub elapsed_ms: f32,
    pub tick: u64,
    pub horses: Vec<HorseSnapshot>,
    pub power_ups: Vec<PowerUpSnapshot>,
    pub standings: Vec<Standing>,
}

impl From<&RaceState> for RaceSnapshot {
    fn from(state: &RaceState) -> Self {
        Self {
            phase: state.phase,
            elapsed_ms: state.elapsed_ms,
            tick: state.tick_count,
            horses: state.horses.iter().map(HorseSnapshot::from).collect(),
            power_ups: state.power_ups.iter().map(PowerUpSnapshot::from).collect(),
            standings: state.results(),
        }
    }
}

impl RaceSnapshot {
    pub fn horse(&self, id: u32) -> Option<&HorseSnapshot> {
        self.horses.iter().find(|h| h.id == id)
    }
}
