//! Deterministic simulation module
//!
//! All race logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by roster index)
//! - No rendering or platform dependencies

pub mod collision;
pub mod effects;
pub mod engine;
pub mod geometry;
pub mod outcome;
pub mod powerups;
pub mod snapshot;
pub mod state;
pub mod tick;

pub use collision::{CollisionResult, PairOutcome, PickupEvent, resolve_horse};
pub use effects::{Effect, EffectKind, EffectLedger, EffectMagnitude};
pub use engine::{RaceEngine, RaceError};
pub use geometry::Rect;
pub use powerups::{Trigger, dispatch};
pub use snapshot::{EffectSummary, HorseSnapshot, PowerUpSnapshot, RaceSnapshot};
pub use state::{
    Hit, HitOutcome, Horse, PowerUp, PowerUpKind, RaceMode, RacePhase, RaceState, Skill,
    Standing, StandingOutcome, Wall,
};
pub use tick::{HorseControl, TickInput, tick};
