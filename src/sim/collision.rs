//! Collision detection and response
//!
//! Horses are circles; walls and the arena are axis-aligned rectangles.
//! Two response modes exist and are applied identically at the arena edge,
//! walls and horse-horse contacts:
//! - bounce: the normal component is reflected and scaled by a restitution < 1
//! - preserve-speed: the direction is reflected, the speed is kept

use glam::Vec2;

use super::effects::EffectKind;
use super::geometry::{Rect, circle_rect_contact, circles_overlap};
use super::state::{Horse, PowerUp, PowerUpKind, RaceState};
use crate::config::PhysicsConfig;
use crate::with_speed;

/// Result of a collision check
#[derive(Debug, Clone)]
pub struct CollisionResult {
    /// Whether a collision occurred
    pub hit: bool,
    /// Surface normal at collision (pointing toward the horse, for reflection)
    pub normal: Vec2,
    /// Penetration depth (for position correction)
    pub penetration: f32,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            normal: Vec2::ZERO,
            penetration: 0.0,
        }
    }
}

/// Check a horse against a single wall
pub fn horse_wall_collision(pos: Vec2, radius: f32, wall: &Rect) -> CollisionResult {
    match circle_rect_contact(pos, radius, wall) {
        Some((normal, penetration)) => CollisionResult {
            hit: true,
            normal,
            penetration,
        },
        None => CollisionResult::miss(),
    }
}

/// Reflect velocity off a surface
///
/// Standard reflection: v' = v - 2(v·n)n
#[inline]
pub fn reflect_velocity(velocity: Vec2, normal: Vec2) -> Vec2 {
    velocity - 2.0 * velocity.dot(normal) * normal
}

/// Collision response against a surface with outward normal `normal`
///
/// Velocities already leaving the surface are returned untouched.
pub fn respond(velocity: Vec2, normal: Vec2, bounce: f32, preserve_speed: bool) -> Vec2 {
    let into = velocity.dot(normal);
    if into >= 0.0 {
        return velocity;
    }
    if preserve_speed {
        with_speed(reflect_velocity(velocity, normal), velocity.length())
    } else {
        velocity - (1.0 + bounce) * into * normal
    }
}

/// Keep a horse inside the arena. Returns true on contact.
pub fn resolve_boundary(horse: &mut Horse, arena: &Rect, physics: &PhysicsConfig) -> bool {
    let r = horse.radius;
    let min = arena.min() + Vec2::splat(r);
    let max = (arena.max() - Vec2::splat(r)).max(min);
    let mut touched = false;

    let contacts = [
        (horse.pos.x < min.x, Vec2::X),
        (horse.pos.x > max.x, Vec2::NEG_X),
        (horse.pos.y < min.y, Vec2::Y),
        (horse.pos.y > max.y, Vec2::NEG_Y),
    ];
    for (hit, normal) in contacts {
        if hit {
            horse.vel = respond(
                horse.vel,
                normal,
                physics.wall_bounce,
                physics.preserve_speed_on_collision,
            );
            touched = true;
        }
    }
    horse.pos = horse.pos.clamp(min, max);
    touched
}

/// Push a horse out of every wall it overlaps. Returns the number of contacts.
pub fn resolve_walls(horse: &mut Horse, walls: &[Rect], physics: &PhysicsConfig) -> usize {
    let mut contacts = 0;
    for wall in walls {
        let result = horse_wall_collision(horse.pos, horse.radius, wall);
        if !result.hit {
            continue;
        }
        horse.pos += result.normal * result.penetration;
        horse.vel = respond(
            horse.vel,
            result.normal,
            physics.wall_bounce,
            physics.preserve_speed_on_collision,
        );
        contacts += 1;
    }
    contacts
}

/// What happened between two horses this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairOutcome {
    /// Not touching
    Apart,
    /// Overlapped, separated and exchanged impulse
    Collided,
    /// The first horse's aura eliminated the second
    FirstRammed,
    /// The second horse's aura eliminated the first
    SecondRammed,
}

/// Resolve contact between two active horses
///
/// A ram aura kill replaces the normal response: neither horse is moved or
/// has its velocity changed.
pub fn resolve_pair(a: &mut Horse, b: &mut Horse, physics: &PhysicsConfig) -> PairOutcome {
    let delta = b.pos - a.pos;
    let dist = delta.length();

    if a.effects.ram_radius().is_some_and(|r| dist <= r) {
        b.eliminate();
        return PairOutcome::FirstRammed;
    }
    if b.effects.ram_radius().is_some_and(|r| dist <= r) {
        a.eliminate();
        return PairOutcome::SecondRammed;
    }

    if !circles_overlap(a.pos, a.radius, b.pos, b.radius) {
        return PairOutcome::Apart;
    }

    // Coincident centers: pick a fixed axis so separation stays deterministic
    let normal = if dist > f32::EPSILON {
        delta / dist
    } else {
        Vec2::X
    };
    let half_overlap = (a.radius + b.radius - dist) * 0.5;
    a.pos -= normal * half_overlap;
    b.pos += normal * half_overlap;

    if physics.preserve_speed_on_collision {
        if a.vel.dot(normal) > 0.0 {
            a.vel = reflect_velocity(a.vel, normal);
        }
        if b.vel.dot(normal) < 0.0 {
            b.vel = reflect_velocity(b.vel, normal);
        }
    } else {
        let closing = (a.vel - b.vel).dot(normal);
        if closing > 0.0 {
            let ma = physics.mass_model.mass(a.radius);
            let mb = physics.mass_model.mass(b.radius);
            let impulse = (1.0 + physics.horse_bounce) * closing / (1.0 / ma + 1.0 / mb);
            a.vel -= normal * (impulse / ma);
            b.vel += normal * (impulse / mb);
        }
    }

    PairOutcome::Collided
}

/// A horse touched a live power-up
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickupEvent {
    /// Index of the horse in the roster
    pub horse: usize,
    pub power_up_id: u32,
    pub kind: PowerUpKind,
    /// Where the power-up was when it was touched
    pub pos: Vec2,
}

/// Detect pickups for one horse, removing single-use power-ups as they are taken
///
/// At most one power-up of each kind is taken per call; warp zones are
/// skipped while the horse is on warp cooldown.
pub fn collect_pickups(index: usize, horse: &Horse, power_ups: &mut Vec<PowerUp>) -> Vec<PickupEvent> {
    let mut taken = [false; PowerUpKind::COUNT];
    let warp_blocked = horse.effects.is_active(EffectKind::WarpCooldown);
    let mut events = Vec::new();

    let mut i = 0;
    while i < power_ups.len() {
        let power_up = &power_ups[i];
        let kind = power_up.kind;
        let skip = taken[kind.index()]
            || (kind == PowerUpKind::WarpZone && warp_blocked)
            || !circles_overlap(horse.pos, horse.radius, power_up.pos, power_up.radius);
        if skip {
            i += 1;
            continue;
        }

        taken[kind.index()] = true;
        events.push(PickupEvent {
            horse: index,
            power_up_id: power_up.id,
            kind,
            pos: power_up.pos,
        });

        if kind.is_permanent() {
            i += 1;
        } else {
            power_ups.remove(i);
        }
    }

    events
}

/// Run the full collision pass for one horse
///
/// Order: arena bounds, walls (both skipped while phasing), horses later in
/// the roster, power-ups. Returns the pickups to dispatch.
pub fn resolve_horse(state: &mut RaceState, index: usize, physics: &PhysicsConfig) -> Vec<PickupEvent> {
    if state.horses.get(index).is_none_or(Horse::is_terminal) {
        return Vec::new();
    }

    let (head, tail) = state.horses.split_at_mut(index + 1);
    let horse = &mut head[index];

    if !horse.can_phase() {
        resolve_boundary(horse, &state.arena, physics);
        resolve_walls(horse, &state.walls, physics);
    }

    for other in tail.iter_mut().filter(|h| !h.is_terminal()) {
        match resolve_pair(horse, other, physics) {
            PairOutcome::FirstRammed => {
                log::debug!("Horse {} rammed horse {}", horse.id, other.id);
            }
            PairOutcome::SecondRammed => {
                log::debug!("Horse {} rammed horse {}", other.id, horse.id);
                break;
            }
            PairOutcome::Apart | PairOutcome::Collided => {}
        }
    }

    if horse.is_terminal() {
        return Vec::new();
    }
    collect_pickups(index, horse, &mut state.power_ups)
}

/// Final bounds and wall pass over every solid active horse
///
/// Pair separation and warps can move a horse after its own wall check, so
/// this runs once the whole roster has been resolved. Returns the number of
/// contacts.
pub fn settle_walls(state: &mut RaceState, physics: &PhysicsConfig) -> usize {
    let mut contacts = 0;
    for horse in state
        .horses
        .iter_mut()
        .filter(|h| !h.is_terminal() && !h.can_phase())
    {
        if resolve_boundary(horse, &state.arena, physics) {
            contacts += 1;
        }
        contacts += resolve_walls(horse, &state.walls, physics);
    }
    contacts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::CONTACT_EPSILON;
    use crate::map::Entrant;
    use crate::sim::effects::{Effect, EffectMagnitude};
    use crate::sim::geometry::{circle_intersects_rect, closest_point_on_rect};
    use proptest::prelude::*;

    fn horse_at(id: u32, x: f32, y: f32) -> Horse {
        Horse::new(&Entrant::new(id, format!("H{}", id)), Vec2::new(x, y))
    }

    fn bounce_physics() -> PhysicsConfig {
        PhysicsConfig {
            wall_bounce: 0.8,
            preserve_speed_on_collision: false,
            ..Default::default()
        }
    }

    #[test]
    fn test_wall_hit_bounce_mode() {
        let mut horse = horse_at(1, 10.0, 50.0);
        horse.vel = Vec2::new(5.0, 0.0);
        let wall = Rect::new(15.0, 0.0, 5.0, 100.0);

        let contacts = resolve_walls(&mut horse, &[wall], &bounce_physics());
        assert_eq!(contacts, 1);
        assert!((horse.pos.x - 5.0).abs() < 1e-5);
        assert!((horse.pos.y - 50.0).abs() < 1e-5);
        assert!((horse.vel.x - -4.0).abs() < 1e-5);
        assert!(horse.vel.y.abs() < 1e-6);
    }

    #[test]
    fn test_wall_hit_preserve_speed_mode() {
        let mut horse = horse_at(1, 10.0, 50.0);
        horse.vel = Vec2::new(3.0, 4.0);
        let physics = PhysicsConfig {
            preserve_speed_on_collision: true,
            ..Default::default()
        };

        resolve_walls(&mut horse, &[Rect::new(15.0, 0.0, 5.0, 100.0)], &physics);
        assert!((horse.vel.length() - 5.0).abs() < 1e-5);
        assert!((horse.vel.x - -3.0).abs() < 1e-5);
        assert!((horse.vel.y - 4.0).abs() < 1e-5);
    }

    #[test]
    fn test_boundary_clamps_and_reflects() {
        let arena = Rect::new(0.0, 0.0, 200.0, 100.0);
        let mut horse = horse_at(1, 195.0, 50.0);
        horse.vel = Vec2::new(2.0, 1.0);

        assert!(resolve_boundary(&mut horse, &arena, &bounce_physics()));
        assert_eq!(horse.pos.x, 190.0);
        assert!((horse.vel.x - -1.6).abs() < 1e-5);
        assert_eq!(horse.vel.y, 1.0);
    }

    #[test]
    fn test_boundary_preserve_speed() {
        let arena = Rect::new(0.0, 0.0, 200.0, 100.0);
        let mut horse = horse_at(1, 5.0, 5.0);
        horse.vel = Vec2::new(-3.0, -4.0);
        let physics = PhysicsConfig {
            preserve_speed_on_collision: true,
            ..Default::default()
        };

        assert!(resolve_boundary(&mut horse, &arena, &physics));
        assert_eq!(horse.pos, Vec2::new(10.0, 10.0));
        assert!((horse.vel - Vec2::new(3.0, 4.0)).length() < 1e-5);
    }

    #[test]
    fn test_overlapping_horses_separate_symmetrically() {
        let mut a = horse_at(1, 100.0, 100.0);
        let mut b = horse_at(2, 105.0, 100.0);

        let outcome = resolve_pair(&mut a, &mut b, &PhysicsConfig::default());
        assert_eq!(outcome, PairOutcome::Collided);
        assert!((a.pos.x - 92.5).abs() < 1e-5);
        assert!((b.pos.x - 112.5).abs() < 1e-5);
        assert_eq!(a.pos.y, 100.0);
        assert_eq!(b.pos.y, 100.0);
    }

    #[test]
    fn test_equal_mass_impulse() {
        let mut a = horse_at(1, 100.0, 100.0);
        let mut b = horse_at(2, 115.0, 100.0);
        a.vel = Vec2::new(2.0, 0.0);
        let physics = PhysicsConfig {
            horse_bounce: 0.5,
            ..Default::default()
        };

        resolve_pair(&mut a, &mut b, &physics);
        // j = 1.5 * 2 / 2 = 1.5
        assert!((a.vel.x - 0.5).abs() < 1e-5);
        assert!((b.vel.x - 1.5).abs() < 1e-5);
        // Total momentum is conserved
        assert!(((a.vel + b.vel).x - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_preserve_speed_horse_contact() {
        let mut a = horse_at(1, 100.0, 100.0);
        let mut b = horse_at(2, 115.0, 100.0);
        a.vel = Vec2::new(3.0, 4.0);
        b.vel = Vec2::new(-1.0, 0.0);
        let physics = PhysicsConfig {
            preserve_speed_on_collision: true,
            ..Default::default()
        };

        resolve_pair(&mut a, &mut b, &physics);
        assert!((a.vel.length() - 5.0).abs() < 1e-5);
        assert!(a.vel.x < 0.0);
        assert!((b.vel - Vec2::new(1.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_ram_aura_eliminates_without_response() {
        let mut a = horse_at(1, 100.0, 100.0);
        let mut b = horse_at(2, 115.0, 100.0);
        a.effects.apply(Effect::new(
            EffectKind::RamAura,
            5000.0,
            EffectMagnitude::Aura { radius: 30.0 },
        ));
        a.vel = Vec2::new(2.0, 0.0);
        b.vel = Vec2::new(-1.0, 0.5);

        let outcome = resolve_pair(&mut a, &mut b, &PhysicsConfig::default());
        assert_eq!(outcome, PairOutcome::FirstRammed);
        assert!(b.eliminated);
        assert!(!a.eliminated);
        assert_eq!(a.pos, Vec2::new(100.0, 100.0));
        assert_eq!(b.pos, Vec2::new(115.0, 100.0));
        assert_eq!(a.vel, Vec2::new(2.0, 0.0));
        assert_eq!(b.vel, Vec2::new(-1.0, 0.5));
    }

    #[test]
    fn test_aura_on_second_horse() {
        let mut a = horse_at(1, 100.0, 100.0);
        let mut b = horse_at(2, 125.0, 100.0);
        b.effects.apply(Effect::new(
            EffectKind::RamAura,
            5000.0,
            EffectMagnitude::Aura { radius: 30.0 },
        ));

        assert_eq!(
            resolve_pair(&mut a, &mut b, &PhysicsConfig::default()),
            PairOutcome::SecondRammed
        );
        assert!(a.eliminated);
    }

    #[test]
    fn test_one_pickup_per_kind_per_pass() {
        let horse = horse_at(1, 50.0, 50.0);
        let mut power_ups = vec![
            PowerUp { id: 1, kind: PowerUpKind::Boost, pos: Vec2::new(52.0, 50.0), radius: 5.0 },
            PowerUp { id: 2, kind: PowerUpKind::Boost, pos: Vec2::new(48.0, 50.0), radius: 5.0 },
            PowerUp { id: 3, kind: PowerUpKind::Shield, pos: Vec2::new(50.0, 55.0), radius: 5.0 },
            PowerUp { id: 4, kind: PowerUpKind::Turbo, pos: Vec2::new(150.0, 50.0), radius: 5.0 },
        ];

        let events = collect_pickups(0, &horse, &mut power_ups);
        let ids: Vec<u32> = events.iter().map(|e| e.power_up_id).collect();
        assert_eq!(ids, vec![1, 3]);
        let remaining: Vec<u32> = power_ups.iter().map(|p| p.id).collect();
        assert_eq!(remaining, vec![2, 4]);
    }

    #[test]
    fn test_consumed_power_up_cannot_be_taken_twice() {
        let horse = horse_at(1, 50.0, 50.0);
        let mut power_ups = vec![PowerUp {
            id: 7,
            kind: PowerUpKind::Ram,
            pos: Vec2::new(50.0, 50.0),
            radius: 5.0,
        }];

        assert_eq!(collect_pickups(0, &horse, &mut power_ups).len(), 1);
        assert!(collect_pickups(0, &horse, &mut power_ups).is_empty());
    }

    #[test]
    fn test_warp_zone_persists_and_respects_cooldown() {
        let mut horse = horse_at(1, 50.0, 50.0);
        let mut power_ups = vec![PowerUp {
            id: 1,
            kind: PowerUpKind::WarpZone,
            pos: Vec2::new(50.0, 50.0),
            radius: 12.0,
        }];

        assert_eq!(collect_pickups(0, &horse, &mut power_ups).len(), 1);
        assert_eq!(power_ups.len(), 1);

        horse.effects.apply(Effect::new(EffectKind::WarpCooldown, 1000.0, EffectMagnitude::None));
        assert!(collect_pickups(0, &horse, &mut power_ups).is_empty());
    }

    fn wall_state(phase: bool) -> RaceState {
        let mut map = crate::map::MapDefinition::demo_survival();
        map.walls = vec![Rect::new(100.0, 0.0, 20.0, 400.0)];
        map.power_ups.clear();
        let mut state = RaceState::new(&map, &Entrant::roster(1), 3);
        state.horses[0].pos = Vec2::new(110.0, 200.0);
        state.horses[0].vel = Vec2::new(3.0, 0.0);
        if phase {
            state.horses[0].effects.apply(Effect::new(EffectKind::Ghost, 1000.0, EffectMagnitude::None));
        }
        state
    }

    #[test]
    fn test_phasing_horse_passes_through_walls() {
        let mut state = wall_state(true);
        resolve_horse(&mut state, 0, &PhysicsConfig::default());
        assert_eq!(state.horses[0].pos, Vec2::new(110.0, 200.0));
        assert_eq!(state.horses[0].vel, Vec2::new(3.0, 0.0));
    }

    #[test]
    fn test_solid_horse_is_pushed_out_of_walls() {
        let mut state = wall_state(false);
        resolve_horse(&mut state, 0, &PhysicsConfig::default());
        let horse = &state.horses[0];
        assert_ne!(horse.pos, Vec2::new(110.0, 200.0));
        assert!(!circle_intersects_rect(horse.pos, horse.radius - CONTACT_EPSILON, &state.walls[0]));
    }

    #[test]
    fn test_terminal_horses_are_skipped() {
        let mut state = wall_state(false);
        state.horses[0].eliminate();
        assert!(resolve_horse(&mut state, 0, &PhysicsConfig::default()).is_empty());
        assert_eq!(state.horses[0].pos, Vec2::new(110.0, 200.0));
    }

    #[test]
    fn test_pair_push_into_wall_is_settled() {
        let mut map = crate::map::MapDefinition::demo_survival();
        map.walls = vec![Rect::new(200.0, 100.0, 20.0, 200.0)];
        map.power_ups.clear();
        map.spawn_points = vec![Vec2::new(189.0, 200.0), Vec2::new(180.0, 200.0)];
        let mut big = Entrant::new(2, "Big");
        big.radius = 30.0;
        let entrants = [Entrant::new(1, "Small"), big];
        let mut state = RaceState::new(&map, &entrants, 1);
        let physics = PhysicsConfig::default();

        resolve_horse(&mut state, 0, &physics);
        resolve_horse(&mut state, 1, &physics);
        let wall = state.walls[0];
        assert!(wall.contains(state.horses[0].pos));

        assert!(settle_walls(&mut state, &physics) > 0);
        for horse in &state.horses {
            let closest = closest_point_on_rect(horse.pos, &wall);
            assert!(horse.pos.distance(closest) >= horse.radius - CONTACT_EPSILON);
        }
    }

    proptest! {
        #[test]
        fn prop_no_horse_left_inside_wall(
            x in 0.0f32..300.0,
            y in 0.0f32..300.0,
            vx in -6.0f32..6.0,
            vy in -6.0f32..6.0,
            preserve in any::<bool>(),
        ) {
            let wall = Rect::new(100.0, 120.0, 80.0, 40.0);
            let mut horse = horse_at(1, x, y);
            horse.vel = Vec2::new(vx, vy);
            let physics = PhysicsConfig {
                preserve_speed_on_collision: preserve,
                ..Default::default()
            };
            let speed_before = horse.vel.length();

            resolve_walls(&mut horse, &[wall], &physics);

            let closest = closest_point_on_rect(horse.pos, &wall);
            prop_assert!(horse.pos.distance(closest) >= horse.radius - CONTACT_EPSILON);
            if preserve {
                prop_assert!((horse.vel.length() - speed_before).abs() < 1e-3);
            } else {
                prop_assert!(horse.vel.length() <= speed_before + 1e-3);
            }
        }
    }
}
