//! Race outcome detection
//!
//! Runs last in every tick. Finished horses fill positions from the front,
//! eliminated horses from the back; horses that reach a terminal state on the
//! same tick are appended in roster order, and within such a group the lower
//! index gets the better position.

use super::geometry::circle_intersects_rect;
use super::state::{RaceMode, RacePhase, RaceState, Standing, StandingOutcome};

/// Detect finishes and survivors, append standings, and complete the race
///
/// Returns the number of standings appended.
pub fn detect(state: &mut RaceState) -> usize {
    let before = state.standings.len();

    if let RaceMode::Finish { line } = state.mode {
        for horse in state.horses.iter_mut().filter(|h| !h.is_terminal()) {
            if circle_intersects_rect(horse.pos, horse.radius, &line) {
                horse.finish();
                log::debug!("Horse {} crossed the line", horse.id);
            }
        }
    }

    record_new_terminals(state);

    if state.mode == RaceMode::Survival && state.active_count() == 1 {
        if let Some(survivor) = state.horses.iter_mut().find(|h| !h.is_terminal()) {
            survivor.finish();
            log::debug!("Horse {} is the last one standing", survivor.id);
        }
        record_new_terminals(state);
    }

    if state.phase == RacePhase::Running && state.is_complete() {
        state.phase = RacePhase::Complete;
        log::info!(
            "Race complete after {:.0} ms ({} ticks)",
            state.elapsed_ms,
            state.tick_count
        );
    }

    state.standings.len() - before
}

/// Append a standing for every terminal horse that does not have one yet
fn record_new_terminals(state: &mut RaceState) {
    let total = state.horses.len();
    let fresh: Vec<usize> = state
        .horses
        .iter()
        .enumerate()
        .filter(|(_, h)| h.is_terminal())
        .filter(|(_, h)| !state.standings.iter().any(|s| s.horse_id == h.id))
        .map(|(i, _)| i)
        .collect();
    if fresh.is_empty() {
        return;
    }

    let finished_so_far = count_outcome(&state.standings, StandingOutcome::Finished);
    let eliminated_so_far = count_outcome(&state.standings, StandingOutcome::Eliminated);
    let fresh_eliminated = fresh
        .iter()
        .filter(|&&i| state.horses[i].eliminated)
        .count();

    let mut next_front = finished_so_far + 1;
    let mut next_back = total - eliminated_so_far - fresh_eliminated + 1;

    for i in fresh {
        let horse = &state.horses[i];
        let (position, outcome) = if horse.finished {
            next_front += 1;
            (next_front - 1, StandingOutcome::Finished)
        } else {
            next_back += 1;
            (next_back - 1, StandingOutcome::Eliminated)
        };
        state.standings.push(Standing {
            horse_id: horse.id,
            position: position as u32,
            finish_time_ms: state.elapsed_ms,
            outcome,
        });
    }
}

fn count_outcome(standings: &[Standing], outcome: StandingOutcome) -> usize {
    standings.iter().filter(|s| s.outcome == outcome).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::{Entrant, MapDefinition};
    use crate::sim::geometry::Rect;
    use glam::Vec2;

    fn survival_state(horses: usize) -> RaceState {
        let mut state = RaceState::new(&MapDefinition::demo_survival(), &Entrant::roster(horses), 1);
        state.phase = RacePhase::Running;
        state
    }

    fn finish_state(horses: usize) -> RaceState {
        let mut state = RaceState::new(&MapDefinition::demo(), &Entrant::roster(horses), 1);
        state.phase = RacePhase::Running;
        state
    }

    #[test]
    fn test_survival_double_elimination_crowns_survivor() {
        let mut state = survival_state(3);
        state.elapsed_ms = 500.0;
        state.horses[0].eliminate();
        state.horses[1].eliminate();

        assert_eq!(detect(&mut state), 3);
        assert!(state.horses[2].finished);
        assert_eq!(state.phase, RacePhase::Complete);

        let by_id = |id: u32| state.standings.iter().find(|s| s.horse_id == id).unwrap();
        assert_eq!(by_id(3).position, 1);
        assert_eq!(by_id(3).outcome, StandingOutcome::Finished);
        assert_eq!(by_id(1).position, 2);
        assert_eq!(by_id(2).position, 3);
        assert!(state.standings.iter().all(|s| s.finish_time_ms == 500.0));
    }

    #[test]
    fn test_survival_all_eliminated_together() {
        let mut state = survival_state(2);
        state.horses[0].eliminate();
        state.horses[1].eliminate();

        detect(&mut state);
        assert_eq!(state.phase, RacePhase::Complete);
        let positions: Vec<u32> = state.results().iter().map(|s| s.position).collect();
        assert_eq!(positions, vec![1, 2]);
        assert!(state
            .standings
            .iter()
            .all(|s| s.outcome == StandingOutcome::Eliminated));
    }

    #[test]
    fn test_survival_eliminations_fill_from_back() {
        let mut state = survival_state(4);
        state.horses[1].eliminate();
        detect(&mut state);
        assert_eq!(state.standings[0].position, 4);
        assert_eq!(state.phase, RacePhase::Running);

        state.horses[3].eliminate();
        detect(&mut state);
        assert_eq!(state.standings[1].position, 3);
        assert_eq!(state.standings.len(), 2);
    }

    #[test]
    fn test_finish_line_crossing_order() {
        let mut state = finish_state(3);
        let Some(line) = (match state.mode {
            RaceMode::Finish { line } => Some(line),
            RaceMode::Survival => None,
        }) else {
            panic!("demo map is a finish race");
        };

        state.elapsed_ms = 1000.0;
        state.horses[2].pos = line.center();
        state.horses[1].pos = line.center() + Vec2::new(0.0, 50.0);
        detect(&mut state);
        assert_eq!(state.standings.len(), 2);
        assert_eq!(state.standings[0].horse_id, 2);
        assert_eq!(state.standings[0].position, 1);
        assert_eq!(state.standings[1].horse_id, 3);
        assert_eq!(state.standings[1].position, 2);

        state.elapsed_ms = 1500.0;
        state.horses[0].eliminate();
        detect(&mut state);
        assert_eq!(state.standings[2].position, 3);
        assert_eq!(state.standings[2].finish_time_ms, 1500.0);
        assert_eq!(state.phase, RacePhase::Complete);
    }

    #[test]
    fn test_finish_mode_elimination_takes_last_place() {
        let mut state = finish_state(3);
        state.horses[0].eliminate();
        detect(&mut state);
        assert_eq!(state.standings[0].position, 3);

        state.mode = RaceMode::Finish {
            line: Rect::new(0.0, 0.0, 1000.0, 600.0),
        };
        detect(&mut state);
        let positions: Vec<(u32, u32)> = state
            .results()
            .iter()
            .map(|s| (s.horse_id, s.position))
            .collect();
        assert_eq!(positions, vec![(2, 1), (3, 2), (1, 3)]);
    }

    #[test]
    fn test_no_duplicate_standings() {
        let mut state = survival_state(3);
        state.horses[0].eliminate();
        detect(&mut state);
        detect(&mut state);
        assert_eq!(state.standings.len(), 1);
    }
}
