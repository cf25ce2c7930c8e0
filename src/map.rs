//! Static map definitions
//!
//! A map is read-only for the duration of a race: the simulation copies what
//! it needs (walls, live power-ups) into [`RaceState`](crate::sim::RaceState)
//! at load/reset time. Broken map data is rejected here, never at tick time.

use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_HORSE_RADIUS, DEFAULT_POWERUP_RADIUS};
use crate::sim::geometry::{Rect, circle_intersects_rect};
use crate::sim::state::{PowerUp, PowerUpKind, RaceMode, Skill, Wall};

/// Map loading/validation errors
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("Failed to read map file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse map: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Arena must have a positive size")]
    InvalidArena,
    #[error("Wall {index} must have a positive size")]
    InvalidWall { index: usize },
    #[error("Map has no spawn points")]
    NoSpawnPoints,
    #[error("Race needs at least one entrant")]
    NoEntrants,
    #[error("{entrants} entrants but only {spawns} spawn points")]
    NotEnoughSpawns { entrants: usize, spawns: usize },
    #[error("Duplicate entrant id {0}")]
    DuplicateEntrant(u32),
    #[error("Entrant {id} has an invalid radius")]
    InvalidRadius { id: u32 },
    #[error("Spawn point {index} lies outside the arena")]
    SpawnOutsideArena { index: usize },
    #[error("Spawn point {spawn} overlaps wall {wall}")]
    SpawnInsideWall { spawn: usize, wall: usize },
    #[error("Power-up {index} lies outside the arena or has no radius")]
    InvalidPowerUp { index: usize },
    #[error("Finish line must have a positive size inside the arena")]
    InvalidFinishLine,
}

/// Where a power-up sits on the map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerUpPlacement {
    pub kind: PowerUpKind,
    pub pos: Vec2,
    #[serde(default = "default_power_up_radius")]
    pub radius: f32,
}

fn default_power_up_radius() -> f32 {
    DEFAULT_POWERUP_RADIUS
}

fn default_horse_radius() -> f32 {
    DEFAULT_HORSE_RADIUS
}

/// A horse entered into a race
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entrant {
    pub id: u32,
    pub name: String,
    #[serde(default = "default_horse_radius")]
    pub radius: f32,
    #[serde(default)]
    pub player_controlled: bool,
    #[serde(default)]
    pub skill: Option<Skill>,
}

impl Entrant {
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            radius: DEFAULT_HORSE_RADIUS,
            player_controlled: false,
            skill: None,
        }
    }

    /// `count` AI entrants with ids 1..=count
    pub fn roster(count: usize) -> Vec<Self> {
        (1..=count as u32)
            .map(|id| Self::new(id, format!("Horse {}", id)))
            .collect()
    }
}

/// Static arena description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapDefinition {
    pub name: String,
    pub width: f32,
    pub height: f32,
    #[serde(default)]
    pub walls: Vec<Wall>,
    pub spawn_points: Vec<Vec2>,
    #[serde(default)]
    pub power_ups: Vec<PowerUpPlacement>,
    pub mode: RaceMode,
}

impl MapDefinition {
    /// Parse a map from JSON
    pub fn from_json(json: &str) -> Result<Self, MapError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a map from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, MapError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let map = Self::from_json(&json)?;
        log::info!(
            "Loaded map '{}' ({} walls, {} spawns, {} power-ups)",
            map.name,
            map.walls.len(),
            map.spawn_points.len(),
            map.power_ups.len()
        );
        Ok(map)
    }

    /// The playable rectangle
    pub fn arena(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }

    /// Fresh live copies of every placed power-up, ids assigned in placement order
    pub fn live_power_ups(&self) -> Vec<PowerUp> {
        self.power_ups
            .iter()
            .enumerate()
            .map(|(i, p)| PowerUp {
                id: i as u32 + 1,
                kind: p.kind,
                pos: p.pos,
                radius: p.radius,
            })
            .collect()
    }

    /// Check the map can host these entrants
    pub fn validate(&self, entrants: &[Entrant]) -> Result<(), MapError> {
        let arena = self.arena();
        if !arena.is_valid() {
            return Err(MapError::InvalidArena);
        }

        if let Some(index) = self.walls.iter().position(|w| !w.is_valid()) {
            return Err(MapError::InvalidWall { index });
        }

        if self.spawn_points.is_empty() {
            return Err(MapError::NoSpawnPoints);
        }
        if entrants.is_empty() {
            return Err(MapError::NoEntrants);
        }
        if entrants.len() > self.spawn_points.len() {
            return Err(MapError::NotEnoughSpawns {
                entrants: entrants.len(),
                spawns: self.spawn_points.len(),
            });
        }

        for (i, entrant) in entrants.iter().enumerate() {
            if entrants[..i].iter().any(|e| e.id == entrant.id) {
                return Err(MapError::DuplicateEntrant(entrant.id));
            }
            if !(entrant.radius > 0.0 && entrant.radius.is_finite()) {
                return Err(MapError::InvalidRadius { id: entrant.id });
            }
        }

        // Each spawn must fit the horse that will stand on it
        for (index, (spawn, entrant)) in self.spawn_points.iter().zip(entrants).enumerate() {
            let r = entrant.radius;
            let inner = Rect::new(r, r, self.width - 2.0 * r, self.height - 2.0 * r);
            if !inner.is_valid() || !inner.contains(*spawn) {
                return Err(MapError::SpawnOutsideArena { index });
            }
            if let Some(wall) = self
                .walls
                .iter()
                .position(|w| circle_intersects_rect(*spawn, r, w))
            {
                return Err(MapError::SpawnInsideWall { spawn: index, wall });
            }
        }

        if let Some(index) = self
            .power_ups
            .iter()
            .position(|p| !(p.radius > 0.0) || !arena.contains(p.pos))
        {
            return Err(MapError::InvalidPowerUp { index });
        }

        if let RaceMode::Finish { line } = self.mode {
            if !line.is_valid() || !arena.contains_rect(&line) {
                return Err(MapError::InvalidFinishLine);
            }
        }

        Ok(())
    }

    /// Built-in finish-line map used by the native runner and tests
    pub fn demo() -> Self {
        use PowerUpKind::*;

        let placement = |kind, x: f32, y: f32| PowerUpPlacement {
            kind,
            pos: Vec2::new(x, y),
            radius: DEFAULT_POWERUP_RADIUS,
        };

        Self {
            name: "Meadow Sprint".to_string(),
            width: 1000.0,
            height: 600.0,
            walls: vec![
                Rect::new(300.0, 100.0, 40.0, 150.0),
                Rect::new(300.0, 350.0, 40.0, 150.0),
                Rect::new(550.0, 0.0, 30.0, 200.0),
                Rect::new(550.0, 400.0, 30.0, 200.0),
                Rect::new(750.0, 250.0, 40.0, 100.0),
            ],
            spawn_points: (0..8)
                .map(|i| Vec2::new(40.0, 90.0 + i as f32 * 60.0))
                .collect(),
            power_ups: vec![
                placement(Boost, 200.0, 300.0),
                placement(Shield, 200.0, 100.0),
                placement(Magnet, 200.0, 500.0),
                placement(Turbo, 450.0, 300.0),
                placement(Ghost, 450.0, 150.0),
                placement(TimeFreeze, 450.0, 450.0),
                placement(Ram, 650.0, 300.0),
                placement(IceFreezer, 650.0, 150.0),
                placement(Teleport, 650.0, 450.0),
                placement(QuantumDash, 850.0, 150.0),
                placement(Nebula, 850.0, 450.0),
                placement(WarpZone, 250.0, 40.0),
                placement(WarpZone, 700.0, 560.0),
            ],
            mode: RaceMode::Finish {
                line: Rect::new(940.0, 0.0, 20.0, 600.0),
            },
        }
    }

    /// Small enclosed survival arena
    pub fn demo_survival() -> Self {
        Self {
            name: "Paddock Brawl".to_string(),
            width: 400.0,
            height: 400.0,
            walls: vec![Rect::new(180.0, 180.0, 40.0, 40.0)],
            spawn_points: vec![
                Vec2::new(60.0, 60.0),
                Vec2::new(340.0, 60.0),
                Vec2::new(60.0, 340.0),
                Vec2::new(340.0, 340.0),
            ],
            power_ups: vec![
                PowerUpPlacement {
                    kind: PowerUpKind::Ram,
                    pos: Vec2::new(200.0, 100.0),
                    radius: DEFAULT_POWERUP_RADIUS,
                },
                PowerUpPlacement {
                    kind: PowerUpKind::Ram,
                    pos: Vec2::new(200.0, 300.0),
                    radius: DEFAULT_POWERUP_RADIUS,
                },
            ],
            mode: RaceMode::Survival,
        }
    }
}
