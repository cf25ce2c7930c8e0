//! Physics and power-up tuning
//!
//! Loaded once per race and passed by reference into every simulation step.
//! Every section falls back to its defaults, so a config file only needs to
//! list the values it changes.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Config loading/validation errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid config value `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

/// How horse mass is derived for horse-horse impulses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MassModel {
    /// Every horse weighs the same
    #[default]
    Equal,
    /// Mass proportional to radius squared
    Area,
}

impl MassModel {
    #[inline]
    pub fn mass(&self, radius: f32) -> f32 {
        match self {
            MassModel::Equal => 1.0,
            MassModel::Area => (radius * radius).max(f32::EPSILON),
        }
    }
}

/// Movement and collision constants (per 60 Hz baseline frame)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Velocity kept per baseline frame
    pub friction: f32,
    /// Speed cap before effect multipliers
    pub max_speed: f32,
    /// Fraction of the gap to the target velocity closed per baseline frame
    pub acceleration: f32,
    /// Restitution against walls and arena bounds (bounce mode)
    pub wall_bounce: f32,
    /// Restitution between horses (bounce mode)
    pub horse_bounce: f32,
    /// Redirect without losing speed instead of bouncing
    pub preserve_speed_on_collision: bool,
    pub mass_model: MassModel,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            friction: 0.98,
            max_speed: 4.0,
            acceleration: 0.15,
            wall_bounce: 0.8,
            horse_bounce: 0.9,
            preserve_speed_on_collision: false,
            mass_model: MassModel::Equal,
        }
    }
}

/// Duration plus speed multiplier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeedEffectConfig {
    pub duration_ms: f32,
    pub multiplier: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShieldConfig {
    pub duration_ms: f32,
    pub absorbs: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RamConfig {
    pub duration_ms: f32,
    /// Aura radius as a multiple of the holder's radius
    pub radius_factor: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MagnetConfig {
    pub duration_ms: f32,
    pub radius: f32,
    /// Fraction of the remaining distance pulled per baseline frame
    pub pull: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TeleportConfig {
    pub attempts: u32,
    /// Velocity kept after a successful teleport
    pub velocity_damping: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WarpConfig {
    pub cooldown_ms: f32,
    /// Targets closer than this to the entered zone are skipped
    pub min_separation: f32,
    /// Exit distance from the target zone center
    pub exit_offset: f32,
    pub velocity_damping: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuantumDashConfig {
    pub duration_ms: f32,
    pub multiplier: f32,
    pub phase: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NebulaConfig {
    pub duration_ms: f32,
    pub multiplier: f32,
    pub damage: f32,
}

/// Power-up tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerUpConfig {
    pub boost: SpeedEffectConfig,
    pub turbo: SpeedEffectConfig,
    pub ghost_duration_ms: f32,
    pub shield: ShieldConfig,
    /// Slow applied to every other horse
    pub time_freeze: SpeedEffectConfig,
    /// Slow applied to the collector
    pub ice_freezer: SpeedEffectConfig,
    pub ram: RamConfig,
    pub magnet: MagnetConfig,
    pub teleport: TeleportConfig,
    pub warp: WarpConfig,
    pub quantum_dash: QuantumDashConfig,
    pub nebula: NebulaConfig,
}

impl Default for PowerUpConfig {
    fn default() -> Self {
        Self {
            boost: SpeedEffectConfig {
                duration_ms: 3000.0,
                multiplier: 1.5,
            },
            turbo: SpeedEffectConfig {
                duration_ms: 2000.0,
                multiplier: 2.0,
            },
            ghost_duration_ms: 4000.0,
            shield: ShieldConfig {
                duration_ms: 8000.0,
                absorbs: 1,
            },
            time_freeze: SpeedEffectConfig {
                duration_ms: 3000.0,
                multiplier: 0.5,
            },
            ice_freezer: SpeedEffectConfig {
                duration_ms: 2000.0,
                multiplier: 0.4,
            },
            ram: RamConfig {
                duration_ms: 5000.0,
                radius_factor: 3.0,
            },
            magnet: MagnetConfig {
                duration_ms: 5000.0,
                radius: 150.0,
                pull: 0.08,
            },
            teleport: TeleportConfig {
                attempts: 10,
                velocity_damping: 0.5,
            },
            warp: WarpConfig {
                cooldown_ms: 1000.0,
                min_separation: 50.0,
                exit_offset: 40.0,
                velocity_damping: 0.8,
            },
            quantum_dash: QuantumDashConfig {
                duration_ms: 2500.0,
                multiplier: 1.8,
                phase: true,
            },
            nebula: NebulaConfig {
                duration_ms: 4000.0,
                multiplier: 1.3,
                damage: 10.0,
            },
        }
    }
}

/// Everything the simulation reads, injected at race load
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RaceConfig {
    pub physics: PhysicsConfig,
    pub powerups: PowerUpConfig,
}

impl RaceConfig {
    /// Parse and validate a config from JSON
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded race config from {}", path.as_ref().display());
        Ok(config)
    }

    /// Serialize for saving next to a map
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check values the simulation relies on
    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = &self.physics;
        let invalid = |field: &'static str, reason: &'static str| -> Result<(), ConfigError> {
            Err(ConfigError::Invalid { field, reason })
        };

        if !(p.friction > 0.0 && p.friction <= 1.0) {
            return invalid("physics.friction", "must be in (0, 1]");
        }
        if !(p.max_speed > 0.0) {
            return invalid("physics.max_speed", "must be positive");
        }
        if !(p.acceleration > 0.0 && p.acceleration <= 1.0) {
            return invalid("physics.acceleration", "must be in (0, 1]");
        }
        if !(0.0..1.0).contains(&p.wall_bounce) {
            return invalid("physics.wall_bounce", "must be in [0, 1)");
        }
        if !(0.0..1.0).contains(&p.horse_bounce) {
            return invalid("physics.horse_bounce", "must be in [0, 1)");
        }

        let u = &self.powerups;
        if u.teleport.attempts == 0 {
            return invalid("powerups.teleport.attempts", "must be at least 1");
        }
        if !(0.0..=1.0).contains(&u.magnet.pull) {
            return invalid("powerups.magnet.pull", "must be in [0, 1]");
        }
        if !(u.ram.radius_factor > 0.0) {
            return invalid("powerups.ram.radius_factor", "must be positive");
        }
        if u.shield.absorbs == 0 {
            return invalid("powerups.shield.absorbs", "must be at least 1");
        }
        for (field, factor) in [
            ("powerups.time_freeze.multiplier", u.time_freeze.multiplier),
            ("powerups.ice_freezer.multiplier", u.ice_freezer.multiplier),
        ] {
            if !(factor > 0.0 && factor < 1.0) {
                return invalid(field, "slow factor must be in (0, 1)");
            }
        }
        if u.warp.velocity_damping < 0.0 || u.teleport.velocity_damping < 0.0 {
            log::warn!("Negative teleport/warp damping will reverse horse velocity");
        }

        Ok(())
    }
}
