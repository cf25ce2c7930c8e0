//! Horse Derby - A multi-entrant horse race simulation engine
//!
//! Core modules:
//! - `sim`: Deterministic simulation (physics, collisions, power-ups, race outcome)
//! - `config`: Physics and power-up tuning, injected into the simulation
//! - `map`: Static arena definitions (walls, spawns, power-ups, finish line)
//! - `payout`: Converts final standings into per-entrant payouts

pub mod config;
pub mod map;
pub mod payout;
pub mod sim;

pub use config::{ConfigError, PhysicsConfig, PowerUpConfig, RaceConfig};
pub use map::{Entrant, MapDefinition, MapError};
pub use payout::{FixedPayout, Payout, PayoutEngine, PayoutMode};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Baseline frame duration the physics constants are tuned against (60 Hz)
    pub const BASELINE_FRAME_MS: f32 = 1000.0 / 60.0;
    /// Fixed simulation timestep used by the native runner
    pub const SIM_DT_MS: f32 = BASELINE_FRAME_MS;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Horse defaults
    pub const DEFAULT_HORSE_RADIUS: f32 = 10.0;
    /// Power-up defaults
    pub const DEFAULT_POWERUP_RADIUS: f32 = 12.0;

    /// Slack allowed when checking that a resolved circle no longer overlaps a wall
    pub const CONTACT_EPSILON: f32 = 1e-3;
}

/// Convert a frame duration in milliseconds to baseline-frame units
#[inline]
pub fn frames_from_ms(dt_ms: f32) -> f32 {
    dt_ms / consts::BASELINE_FRAME_MS
}

/// Unit vector for an angle (radians)
#[inline]
pub fn unit_from_angle(theta: f32) -> Vec2 {
    Vec2::new(theta.cos(), theta.sin())
}

/// Rescale `v` to `speed`, falling back to zero for degenerate vectors
#[inline]
pub fn with_speed(v: Vec2, speed: f32) -> Vec2 {
    v.normalize_or_zero() * speed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frames_from_ms() {
        assert!((frames_from_ms(consts::BASELINE_FRAME_MS) - 1.0).abs() < 1e-6);
        assert!((frames_from_ms(consts::BASELINE_FRAME_MS * 3.0) - 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_with_speed() {
        let v = with_speed(Vec2::new(3.0, 4.0), 10.0);
        assert!((v.length() - 10.0).abs() < 1e-4);
        assert_eq!(with_speed(Vec2::ZERO, 10.0), Vec2::ZERO);
    }
}
