//! Race lifecycle
//!
//! Owns the loaded race and drives it through load, start, tick and reset.
//! Every tick runs on a copy of the state that is only committed once the
//! tick returns, so a fault inside the simulation never leaves a half-applied
//! tick behind.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use super::snapshot::RaceSnapshot;
use super::state::{Hit, HitOutcome, RacePhase, RaceState, Standing};
use super::tick::{TickInput, tick};
use crate::config::RaceConfig;
use crate::map::{Entrant, MapDefinition, MapError};

#[derive(Debug, thiserror::Error)]
pub enum RaceError {
    #[error("No race loaded")]
    NotLoaded,
    #[error("Invalid map: {0}")]
    InvalidMap(#[from] MapError),
    #[error("Tick {tick} faulted: {message}")]
    TickFault { tick: u64, message: String },
    #[error("Race faulted, reset required")]
    Faulted,
}

/// Single-race engine
pub struct RaceEngine {
    config: RaceConfig,
    map: Option<MapDefinition>,
    race: Option<RaceState>,
    /// Cleared by `cancel`, checked at the top of every tick
    running: bool,
    faulted: bool,
    #[cfg(test)]
    inject_fault: bool,
}

impl RaceEngine {
    pub fn new(config: RaceConfig) -> Self {
        Self {
            config,
            map: None,
            race: None,
            running: false,
            faulted: false,
            #[cfg(test)]
            inject_fault: false,
        }
    }

    pub fn config(&self) -> &RaceConfig {
        &self.config
    }

    /// Validate the map against the entrants and build a fresh race
    pub fn load(
        &mut self,
        map: MapDefinition,
        entrants: &[Entrant],
        seed: u64,
    ) -> Result<(), RaceError> {
        map.validate(entrants)?;
        let race = RaceState::new(&map, entrants, seed);
        log::info!(
            "Loaded race on '{}' with {} horses (seed {})",
            map.name,
            race.horses.len(),
            seed
        );
        self.race = Some(race);
        self.map = Some(map);
        self.running = false;
        self.faulted = false;
        Ok(())
    }

    /// Move an idle race to running
    pub fn start(&mut self) -> Result<(), RaceError> {
        if self.faulted {
            return Err(RaceError::Faulted);
        }
        let race = self.race.as_mut().ok_or(RaceError::NotLoaded)?;
        if race.phase == RacePhase::Idle {
            race.phase = RacePhase::Running;
            self.running = true;
            log::info!("Race started");
        }
        Ok(())
    }

    /// Advance one fixed step
    ///
    /// Returns the snapshot after the step, or `None` when the race is not
    /// running (idle, cancelled or complete).
    pub fn tick(
        &mut self,
        input: &TickInput,
        dt_ms: f32,
    ) -> Result<Option<RaceSnapshot>, RaceError> {
        if self.faulted {
            return Err(RaceError::Faulted);
        }
        let race = self.race.as_ref().ok_or(RaceError::NotLoaded)?;
        if !self.running || race.phase != RacePhase::Running {
            return Ok(None);
        }

        let tick_number = race.tick_count + 1;
        let mut next = race.clone();
        let config = &self.config;
        #[cfg(test)]
        let inject_fault = self.inject_fault;
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            #[cfg(test)]
            if inject_fault {
                panic!("injected fault");
            }
            tick(&mut next, input, config, dt_ms);
            next
        }));

        match result {
            Ok(next) => {
                if next.phase == RacePhase::Complete {
                    self.running = false;
                }
                let snapshot = RaceSnapshot::from(&next);
                self.race = Some(next);
                Ok(Some(snapshot))
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                log::error!("Race tick {} faulted: {}", tick_number, message);
                self.faulted = true;
                self.running = false;
                Err(RaceError::TickFault {
                    tick: tick_number,
                    message,
                })
            }
        }
    }

    /// Stop ticking; the race stays as it is
    pub fn cancel(&mut self) {
        if self.running {
            log::info!("Race cancelled");
        }
        self.running = false;
    }

    /// Continue a cancelled race
    pub fn resume(&mut self) -> Result<(), RaceError> {
        if self.faulted {
            return Err(RaceError::Faulted);
        }
        let race = self.race.as_ref().ok_or(RaceError::NotLoaded)?;
        self.running = race.phase == RacePhase::Running;
        Ok(())
    }

    /// Reseed the race from its map and clear any fault
    pub fn reset(&mut self) -> Result<(), RaceError> {
        let (Some(race), Some(map)) = (self.race.as_mut(), self.map.as_ref()) else {
            return Err(RaceError::NotLoaded);
        };
        race.reset(map);
        self.running = false;
        self.faulted = false;
        log::info!("Race reset on '{}'", map.name);
        Ok(())
    }

    /// Deliver external damage between ticks
    ///
    /// Standings are updated before this returns; hits on a race that is not
    /// running are ignored.
    pub fn apply_hit(&mut self, horse_id: u32, hit: Hit) -> Result<HitOutcome, RaceError> {
        if self.faulted {
            return Err(RaceError::Faulted);
        }
        let race = self.race.as_mut().ok_or(RaceError::NotLoaded)?;
        let outcome = match race.horse_index(horse_id) {
            Some(index) => race.apply_hit(index, hit),
            None => HitOutcome::Ignored,
        };
        if race.phase == RacePhase::Complete {
            self.running = false;
        }
        Ok(outcome)
    }

    pub fn snapshot(&self) -> Option<RaceSnapshot> {
        self.race.as_ref().map(RaceSnapshot::from)
    }

    /// Standings so far, ordered by position
    pub fn results(&self) -> Option<Vec<Standing>> {
        self.race.as_ref().map(RaceState::results)
    }

    pub fn phase(&self) -> Option<RacePhase> {
        self.race.as_ref().map(|r| r.phase)
    }

    pub fn state(&self) -> Option<&RaceState> {
        self.race.as_ref()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_faulted(&self) -> bool {
        self.faulted
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
