//! Power-up dispatch
//!
//! Turns a pickup (or a skill activation) into effects on the collecting
//! horse, on every other horse, or on the horse's position.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;

use super::collision::PickupEvent;
use super::effects::{Effect, EffectKind, EffectMagnitude};
use super::geometry::circle_intersects_rect;
use super::state::{PowerUpKind, RaceState};
use crate::config::{PowerUpConfig, SpeedEffectConfig, TeleportConfig, WarpConfig};
use crate::unit_from_angle;

/// Exit spots sampled (random target zone and angle) before a warp gives up
const WARP_EXIT_ATTEMPTS: u32 = 16;

/// What caused a dispatch
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Trigger {
    /// The horse touched a live power-up
    Pickup { power_up_id: u32, pos: Vec2 },
    /// The horse fired its own skill
    Skill,
}

/// Dispatch a pickup event raised by the collision pass
pub fn dispatch_pickup(state: &mut RaceState, config: &PowerUpConfig, event: &PickupEvent) -> bool {
    log::debug!(
        "Horse {} picked up {:?} #{}",
        state.horses.get(event.horse).map_or(0, |h| h.id),
        event.kind,
        event.power_up_id
    );
    dispatch(
        state,
        config,
        event.horse,
        event.kind,
        Trigger::Pickup {
            power_up_id: event.power_up_id,
            pos: event.pos,
        },
    )
}

/// Apply a power-up of `kind` to horse `index`
///
/// Returns false when nothing happened (terminal horse, teleport or warp with
/// no valid destination). Never fails.
pub fn dispatch(
    state: &mut RaceState,
    config: &PowerUpConfig,
    index: usize,
    kind: PowerUpKind,
    trigger: Trigger,
) -> bool {
    let Some(horse) = state.horses.get_mut(index) else {
        return false;
    };
    if horse.is_terminal() {
        return false;
    }

    match kind {
        PowerUpKind::Boost => {
            horse.effects.apply(speed_effect(EffectKind::Boost, config.boost));
            true
        }
        PowerUpKind::Turbo => {
            horse.effects.apply(speed_effect(EffectKind::Turbo, config.turbo));
            true
        }
        PowerUpKind::Ghost => {
            horse.effects.apply(Effect::new(
                EffectKind::Ghost,
                config.ghost_duration_ms,
                EffectMagnitude::None,
            ));
            true
        }
        PowerUpKind::Shield => {
            horse.effects.apply(Effect::new(
                EffectKind::Shield,
                config.shield.duration_ms,
                EffectMagnitude::Shield {
                    absorbs: config.shield.absorbs,
                },
            ));
            true
        }
        PowerUpKind::Magnet => {
            horse.effects.apply(Effect::new(
                EffectKind::Magnet,
                config.magnet.duration_ms,
                EffectMagnitude::Magnet {
                    radius: config.magnet.radius,
                    pull: config.magnet.pull,
                },
            ));
            true
        }
        PowerUpKind::Ram => {
            let radius = config.ram.radius_factor * horse.radius;
            horse.effects.apply(Effect::new(
                EffectKind::RamAura,
                config.ram.duration_ms,
                EffectMagnitude::Aura { radius },
            ));
            true
        }
        PowerUpKind::IceFreezer => {
            let factor = config.ice_freezer.multiplier;
            horse.effects.apply(speed_effect(EffectKind::IceFrozen, config.ice_freezer));
            horse.vel *= factor;
            true
        }
        PowerUpKind::QuantumDash => {
            let dash = config.quantum_dash;
            horse.effects.apply(Effect::new(
                EffectKind::QuantumDash,
                dash.duration_ms,
                EffectMagnitude::Dash {
                    multiplier: dash.multiplier,
                    phase: dash.phase,
                },
            ));
            true
        }
        PowerUpKind::Nebula => {
            let nebula = config.nebula;
            horse.effects.apply(Effect::new(
                EffectKind::Nebula,
                nebula.duration_ms,
                EffectMagnitude::Nebula {
                    multiplier: nebula.multiplier,
                    damage: nebula.damage,
                },
            ));
            true
        }
        PowerUpKind::TimeFreeze => time_freeze(state, index, config),
        PowerUpKind::Teleport => teleport(state, index, &config.teleport),
        PowerUpKind::WarpZone => warp(state, index, trigger, &config.warp),
    }
}

fn speed_effect(kind: EffectKind, cfg: SpeedEffectConfig) -> Effect {
    Effect::new(
        kind,
        cfg.duration_ms,
        EffectMagnitude::Speed {
            multiplier: cfg.multiplier,
        },
    )
}

/// Slow every other active horse; the caster only gets a marker
fn time_freeze(state: &mut RaceState, caster: usize, config: &PowerUpConfig) -> bool {
    let slow = speed_effect(EffectKind::Slowed, config.time_freeze);
    for (i, horse) in state.horses.iter_mut().enumerate() {
        if i == caster {
            horse.effects.apply(Effect::new(
                EffectKind::TimeFreeze,
                config.time_freeze.duration_ms,
                EffectMagnitude::None,
            ));
        } else if !horse.is_terminal() {
            horse.effects.apply(slow);
        }
    }
    true
}

/// Jump to a random wall-free spot in the arena
///
/// Gives up silently after `attempts` misses, leaving the horse where it is.
fn teleport(state: &mut RaceState, index: usize, cfg: &TeleportConfig) -> bool {
    let radius = state.horses[index].radius;
    let min = state.arena.min() + Vec2::splat(radius);
    let max = state.arena.max() - Vec2::splat(radius);
    if max.x < min.x || max.y < min.y {
        return false;
    }

    for _ in 0..cfg.attempts {
        let candidate = Vec2::new(
            min.x + state.rng.random::<f32>() * (max.x - min.x),
            min.y + state.rng.random::<f32>() * (max.y - min.y),
        );
        if state
            .walls
            .iter()
            .any(|w| circle_intersects_rect(candidate, radius, w))
        {
            continue;
        }
        let horse = &mut state.horses[index];
        horse.pos = candidate;
        horse.vel *= cfg.velocity_damping;
        return true;
    }

    log::debug!(
        "Teleport for horse {} found no clear spot after {} attempts",
        state.horses[index].id,
        cfg.attempts
    );
    false
}

/// Exit next to another warp zone and start the re-entry cooldown
///
/// The exit is kept inside the arena and clear of walls; a warp that finds no
/// such spot leaves the horse where it is.
fn warp(state: &mut RaceState, index: usize, trigger: Trigger, cfg: &WarpConfig) -> bool {
    let (entered_id, origin) = match trigger {
        Trigger::Pickup { power_up_id, pos } => (Some(power_up_id), pos),
        Trigger::Skill => (None, state.horses[index].pos),
    };

    let targets: Vec<Vec2> = state
        .power_ups
        .iter()
        .filter(|p| p.kind == PowerUpKind::WarpZone)
        .filter(|p| Some(p.id) != entered_id)
        .filter(|p| p.pos.distance(origin) > cfg.min_separation)
        .map(|p| p.pos)
        .collect();
    if targets.is_empty() {
        return false;
    }

    let radius = state.horses[index].radius;
    let min = state.arena.min() + Vec2::splat(radius);
    let max = state.arena.max() - Vec2::splat(radius);
    if max.x < min.x || max.y < min.y {
        return false;
    }

    for _ in 0..WARP_EXIT_ATTEMPTS {
        let target = targets[state.rng.random_range(0..targets.len())];
        let angle = state.rng.random::<f32>() * TAU;
        let exit = (target + unit_from_angle(angle) * cfg.exit_offset).clamp(min, max);
        if state
            .walls
            .iter()
            .any(|w| circle_intersects_rect(exit, radius, w))
        {
            continue;
        }

        let horse = &mut state.horses[index];
        horse.pos = exit;
        horse.vel *= cfg.velocity_damping;
        horse.effects.apply(Effect::new(
            EffectKind::WarpCooldown,
            cfg.cooldown_ms,
            EffectMagnitude::None,
        ));
        log::debug!("Horse {} warped to {:?}", horse.id, target);
        return true;
    }

    log::debug!(
        "Warp for horse {} found no clear exit after {} attempts",
        state.horses[index].id,
        WARP_EXIT_ATTEMPTS
    );
    false
}

/// Pull every live power-up in range toward each horse holding a magnet
pub fn apply_magnets(state: &mut RaceState, dt_frames: f32) {
    for horse in state.horses.iter().filter(|h| !h.is_terminal()) {
        let Some((radius, pull)) = horse.effects.magnet() else {
            continue;
        };
        let step = (pull * dt_frames).min(1.0);
        for power_up in state.power_ups.iter_mut() {
            let to_horse = horse.pos - power_up.pos;
            if to_horse.length() <= radius {
                power_up.pos += to_horse * step;
            }
        }
    }
}

/// Fire the horse's skill if it is off cooldown
pub fn activate_skill(state: &mut RaceState, config: &PowerUpConfig, index: usize) -> bool {
    let Some(horse) = state.horses.get_mut(index) else {
        return false;
    };
    let Some(skill) = horse.skill else {
        return false;
    };
    if horse.is_terminal() || horse.skill_cooldown_ms > 0.0 {
        return false;
    }
    horse.skill_cooldown_ms = skill.cooldown_ms;
    log::debug!("Horse {} activated {:?}", horse.id, skill.kind);
    dispatch(state, config, index, skill.kind, Trigger::Skill)
}
