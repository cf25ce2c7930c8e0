//! Fixed timestep simulation tick
//!
//! Core race loop that advances the simulation deterministically.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;

use super::collision::{resolve_horse, settle_walls};
use super::geometry::circle_intersects_rect;
use super::outcome;
use super::powerups::{activate_skill, apply_magnets, dispatch_pickup};
use super::state::{Horse, RaceMode, RacePhase, RaceState};
use crate::config::RaceConfig;
use crate::{frames_from_ms, unit_from_angle};

/// How far ahead (in horse radii) AI horses look for walls
const AI_LOOKAHEAD: f32 = 3.0;

/// Control intent for one horse
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HorseControl {
    /// Desired heading; longer than 1 is clamped, zero means coast to a stop
    pub direction: Vec2,
    /// Fire the horse's skill this tick
    pub activate_skill: bool,
}

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Indexed by horse; missing entries mean no intent
    pub controls: Vec<HorseControl>,
}

impl TickInput {
    pub fn control_for(&self, index: usize) -> HorseControl {
        self.controls.get(index).copied().unwrap_or_default()
    }
}

/// Advance the race by one fixed timestep
pub fn tick(state: &mut RaceState, input: &TickInput, config: &RaceConfig, dt_ms: f32) {
    if state.phase != RacePhase::Running || !(dt_ms > 0.0) {
        return;
    }

    let physics = &config.physics;
    let dt = frames_from_ms(dt_ms);

    state.elapsed_ms += dt_ms;
    state.tick_count += 1;

    // 1. Input
    for i in 0..state.horses.len() {
        if state.horses[i].is_terminal() || state.horses[i].effects.stun_damping().is_some() {
            continue;
        }
        let control = input.control_for(i);
        if control.activate_skill {
            activate_skill(state, &config.powerups, i);
        }

        let direction = if state.horses[i].player_controlled {
            control.direction.clamp_length_max(1.0)
        } else {
            ai_heading(state, i)
        };

        let horse = &mut state.horses[i];
        let target = direction * physics.max_speed * horse.speed_multiplier;
        let blend = (physics.acceleration * dt).min(1.0);
        horse.vel += (target - horse.vel) * blend;
    }

    // 2. Continuous effect forces
    apply_magnets(state, dt);
    for horse in state.horses.iter_mut().filter(|h| !h.is_terminal()) {
        if let Some(damping) = horse.effects.stun_damping() {
            horse.vel *= damping.powf(dt);
        }
    }

    // 3. Friction + speed cap, 4. Integrate
    let friction = physics.friction.powf(dt);
    for horse in state.horses.iter_mut().filter(|h| !h.is_terminal()) {
        horse.vel *= friction;
        horse.vel = horse
            .vel
            .clamp_length_max(physics.max_speed * horse.speed_multiplier);
        horse.pos += horse.vel * dt;
    }

    // 5. Collisions, with pickups dispatched as they happen
    for i in 0..state.horses.len() {
        for event in resolve_horse(state, i, physics) {
            dispatch_pickup(state, &config.powerups, &event);
        }
    }
    settle_walls(state, physics);

    // 6. Decay
    for horse in state.horses.iter_mut() {
        for kind in horse.effects.decay(dt_ms) {
            log::trace!("Horse {} lost {:?}", horse.id, kind);
        }
        horse.skill_cooldown_ms = (horse.skill_cooldown_ms - dt_ms).max(0.0);
        horse.refresh_speed_multiplier();
    }

    // 7. Outcome
    outcome::detect(state);
}

/// Heading for a horse without a player behind it
///
/// Finish races steer at the middle of the line, sidestepping a wall that
/// sits right ahead. Survival horses keep their current heading and pick a
/// random one when standing still.
fn ai_heading(state: &mut RaceState, index: usize) -> Vec2 {
    let horse: &Horse = &state.horses[index];
    match state.mode {
        RaceMode::Finish { line } => {
            let heading = (line.center() - horse.pos).normalize_or_zero();
            let probe = horse.pos + heading * horse.radius * AI_LOOKAHEAD;
            let Some(wall) = state
                .walls
                .iter()
                .find(|w| circle_intersects_rect(probe, horse.radius, w))
            else {
                return heading;
            };
            let side = heading.perp();
            let sign = if (horse.pos - wall.center()).dot(side) < 0.0 {
                -1.0
            } else {
                1.0
            };
            (side * sign + heading * 0.25).normalize_or_zero()
        }
        RaceMode::Survival => {
            let heading = horse.vel.normalize_or_zero();
            if heading != Vec2::ZERO {
                heading
            } else {
                unit_from_angle(state.rng.random::<f32>() * TAU)
            }
        }
    }
}
