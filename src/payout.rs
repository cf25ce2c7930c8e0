//! Payouts from final standings
//!
//! The engine only hands standings over; the formulas here are fixed per game
//! mode and operate on whole currency units, with rounding leftovers going to
//! the best-placed entrant.

use serde::{Deserialize, Serialize};

use crate::sim::Standing;

/// Share of the pool for the top three in winner-takes-most (percent)
pub const WINNER_TAKES_MOST_SHARES: [u64; 3] = [70, 20, 10];

/// Payout formula
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PayoutMode {
    /// Fixed shares for the podium, nothing for the rest
    #[default]
    WinnerTakesMost,
    /// Every entrant paid by weight `n - position + 1`
    PositionScaledSurvival,
}

/// Amount owed to one entrant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    pub horse_id: u32,
    pub position: u32,
    pub amount: u64,
}

/// Turns standings into payouts
pub trait PayoutEngine {
    fn payouts(&self, standings: &[Standing], pool: u64) -> Vec<Payout>;
}

/// The fixed formulas
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct FixedPayout {
    pub mode: PayoutMode,
}

impl FixedPayout {
    pub fn new(mode: PayoutMode) -> Self {
        Self { mode }
    }

    /// Relative weight of each entrant, in position order
    fn weights(&self, count: usize) -> Vec<u64> {
        match self.mode {
            PayoutMode::WinnerTakesMost => (0..count)
                .map(|i| WINNER_TAKES_MOST_SHARES.get(i).copied().unwrap_or(0))
                .collect(),
            PayoutMode::PositionScaledSurvival => (0..count).map(|i| (count - i) as u64).collect(),
        }
    }
}

impl PayoutEngine for FixedPayout {
    fn payouts(&self, standings: &[Standing], pool: u64) -> Vec<Payout> {
        let mut ordered = standings.to_vec();
        ordered.sort_by_key(|s| s.position);

        let weights = self.weights(ordered.len());
        let total: u64 = weights.iter().sum();
        if total == 0 {
            return Vec::new();
        }

        let mut payouts: Vec<Payout> = ordered
            .iter()
            .zip(&weights)
            .map(|(standing, &weight)| Payout {
                horse_id: standing.horse_id,
                position: standing.position,
                amount: (pool as u128 * weight as u128 / total as u128) as u64,
            })
            .collect();

        let paid: u64 = payouts.iter().map(|p| p.amount).sum();
        if let Some(first) = payouts.first_mut() {
            first.amount += pool - paid;
        }
        payouts
    }
}
