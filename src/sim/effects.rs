//! Per-horse timed effects
//!
//! One slot per [`EffectKind`]: applying an effect of a kind that is already
//! active overwrites it, it never stacks additively.

use serde::{Deserialize, Serialize};

/// Every timed modifier a horse can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    Boost,
    Turbo,
    Ghost,
    Shield,
    Slowed,
    IceFrozen,
    RamAura,
    Magnet,
    TimeFreeze,
    WarpCooldown,
    QuantumDash,
    Nebula,
    Stunned,
}

impl EffectKind {
    pub const COUNT: usize = 13;

    pub const ALL: [EffectKind; Self::COUNT] = [
        EffectKind::Boost,
        EffectKind::Turbo,
        EffectKind::Ghost,
        EffectKind::Shield,
        EffectKind::Slowed,
        EffectKind::IceFrozen,
        EffectKind::RamAura,
        EffectKind::Magnet,
        EffectKind::TimeFreeze,
        EffectKind::WarpCooldown,
        EffectKind::QuantumDash,
        EffectKind::Nebula,
        EffectKind::Stunned,
    ];

    #[inline]
    fn slot(self) -> usize {
        self as usize
    }
}

/// Kind-specific payload of an effect
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectMagnitude {
    /// No payload (ghost, time-freeze marker, warp cooldown)
    None,
    /// Multiplies the horse's speed cap (boost, turbo; slow factors < 1)
    Speed { multiplier: f32 },
    /// Remaining hits the shield can absorb
    Shield { absorbs: u32 },
    /// Elimination radius around the horse
    Aura { radius: f32 },
    /// Power-up attraction radius and per-tick pull fraction
    Magnet { radius: f32, pull: f32 },
    /// Speed multiplier plus the ability to pass through walls
    Dash { multiplier: f32, phase: bool },
    /// Speed multiplier plus damage dealt by collaborators on contact
    Nebula { multiplier: f32, damage: f32 },
    /// Fraction of velocity kept each tick while stunned
    Stun { damping: f32 },
}

/// An active timed effect
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Effect {
    pub kind: EffectKind,
    /// Remaining duration in milliseconds (always > 0 while stored)
    pub remaining_ms: f32,
    pub magnitude: EffectMagnitude,
}

impl Effect {
    pub fn new(kind: EffectKind, duration_ms: f32, magnitude: EffectMagnitude) -> Self {
        Self {
            kind,
            remaining_ms: duration_ms,
            magnitude,
        }
    }

    /// Contribution of this effect to the horse's speed multiplier
    pub fn speed_factor(&self) -> f32 {
        match self.magnitude {
            EffectMagnitude::Speed { multiplier }
            | EffectMagnitude::Dash { multiplier, .. }
            | EffectMagnitude::Nebula { multiplier, .. } => multiplier,
            _ => 1.0,
        }
    }
}

/// Fixed set of effect slots, one per kind
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EffectLedger {
    slots: [Option<Effect>; EffectKind::COUNT],
}

impl EffectLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set or overwrite the slot for `effect.kind`
    ///
    /// Effects with a non-positive duration are never stored.
    pub fn apply(&mut self, effect: Effect) {
        let slot = &mut self.slots[effect.kind.slot()];
        if effect.remaining_ms > 0.0 {
            *slot = Some(effect);
        } else {
            *slot = None;
        }
    }

    pub fn get(&self, kind: EffectKind) -> Option<&Effect> {
        self.slots[kind.slot()].as_ref()
    }

    pub fn get_mut(&mut self, kind: EffectKind) -> Option<&mut Effect> {
        self.slots[kind.slot()].as_mut()
    }

    #[inline]
    pub fn is_active(&self, kind: EffectKind) -> bool {
        self.slots[kind.slot()].is_some()
    }

    pub fn remove(&mut self, kind: EffectKind) -> Option<Effect> {
        self.slots[kind.slot()].take()
    }

    pub fn clear(&mut self) {
        self.slots = [None; EffectKind::COUNT];
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Active effects in kind order
    pub fn iter(&self) -> impl Iterator<Item = &Effect> {
        self.slots.iter().flatten()
    }

    /// Advance every effect by `elapsed_ms`, deleting the ones that run out
    ///
    /// Returns the kinds removed during this call.
    pub fn decay(&mut self, elapsed_ms: f32) -> Vec<EffectKind> {
        let mut expired = Vec::new();
        for slot in self.slots.iter_mut() {
            if let Some(effect) = slot {
                effect.remaining_ms -= elapsed_ms;
                if effect.remaining_ms <= 0.0 {
                    expired.push(effect.kind);
                    *slot = None;
                }
            }
        }
        expired
    }

    /// Product of every multiplicative speed effect (1.0 when none are active)
    pub fn speed_multiplier(&self) -> f32 {
        self.iter().map(Effect::speed_factor).product()
    }

    /// Ghost, or a phase-enabled quantum dash
    pub fn can_phase(&self) -> bool {
        self.is_active(EffectKind::Ghost)
            || matches!(
                self.get(EffectKind::QuantumDash).map(|e| e.magnitude),
                Some(EffectMagnitude::Dash { phase: true, .. })
            )
    }

    /// Radius of an active ram aura
    pub fn ram_radius(&self) -> Option<f32> {
        match self.get(EffectKind::RamAura)?.magnitude {
            EffectMagnitude::Aura { radius } => Some(radius),
            _ => None,
        }
    }

    /// Attraction radius and pull of an active magnet
    pub fn magnet(&self) -> Option<(f32, f32)> {
        match self.get(EffectKind::Magnet)?.magnitude {
            EffectMagnitude::Magnet { radius, pull } => Some((radius, pull)),
            _ => None,
        }
    }

    /// Per-tick velocity damping of an active stun
    pub fn stun_damping(&self) -> Option<f32> {
        match self.get(EffectKind::Stunned)?.magnitude {
            EffectMagnitude::Stun { damping } => Some(damping),
            _ => None,
        }
    }

    /// Consume one shield charge; drops the shield when it runs out
    ///
    /// Returns false if there was no shield to absorb the hit.
    pub fn absorb_hit(&mut self) -> bool {
        let Some(shield) = self.get_mut(EffectKind::Shield) else {
            return false;
        };
        let depleted = match &mut shield.magnitude {
            EffectMagnitude::Shield { absorbs } => {
                *absorbs = absorbs.saturating_sub(1);
                *absorbs == 0
            }
            _ => true,
        };
        if depleted {
            self.remove(EffectKind::Shield);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boost(ms: f32, mult: f32) -> Effect {
        Effect::new(EffectKind::Boost, ms, EffectMagnitude::Speed { multiplier: mult })
    }

    #[test]
    fn test_one_slot_per_kind_overwrites() {
        let mut ledger = EffectLedger::new();
        ledger.apply(boost(3000.0, 1.5));
        ledger.apply(boost(1000.0, 1.2));
        assert_eq!(ledger.iter().count(), 1);
        let active = ledger.get(EffectKind::Boost).unwrap();
        assert_eq!(active.remaining_ms, 1000.0);
        assert!((ledger.speed_multiplier() - 1.2).abs() < 1e-6);
    }

    #[test]
    fn test_boost_expires_after_duration() {
        let mut ledger = EffectLedger::new();
        ledger.apply(boost(3000.0, 1.5));
        assert!((ledger.speed_multiplier() - 1.5).abs() < 1e-6);

        assert!(ledger.decay(2999.0).is_empty());
        assert!(ledger.is_active(EffectKind::Boost));

        let expired = ledger.decay(2.0);
        assert_eq!(expired, vec![EffectKind::Boost]);
        assert!(!ledger.is_active(EffectKind::Boost));
        assert_eq!(ledger.speed_multiplier(), 1.0);
    }

    #[test]
    fn test_no_effect_with_non_positive_duration() {
        let mut ledger = EffectLedger::new();
        ledger.apply(boost(0.0, 2.0));
        assert!(ledger.is_empty());

        ledger.apply(boost(100.0, 2.0));
        ledger.decay(100.0);
        assert!(ledger.iter().all(|e| e.remaining_ms > 0.0));
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_multipliers_compose() {
        let mut ledger = EffectLedger::new();
        ledger.apply(boost(1000.0, 1.5));
        ledger.apply(Effect::new(
            EffectKind::Turbo,
            1000.0,
            EffectMagnitude::Speed { multiplier: 2.0 },
        ));
        ledger.apply(Effect::new(
            EffectKind::Slowed,
            1000.0,
            EffectMagnitude::Speed { multiplier: 0.5 },
        ));
        ledger.apply(Effect::new(EffectKind::Ghost, 1000.0, EffectMagnitude::None));
        assert!((ledger.speed_multiplier() - 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_phase_sources() {
        let mut ledger = EffectLedger::new();
        assert!(!ledger.can_phase());

        ledger.apply(Effect::new(
            EffectKind::QuantumDash,
            500.0,
            EffectMagnitude::Dash { multiplier: 1.8, phase: false },
        ));
        assert!(!ledger.can_phase());

        ledger.apply(Effect::new(
            EffectKind::QuantumDash,
            500.0,
            EffectMagnitude::Dash { multiplier: 1.8, phase: true },
        ));
        assert!(ledger.can_phase());
    }

    #[test]
    fn test_shield_absorbs_until_depleted() {
        let mut ledger = EffectLedger::new();
        assert!(!ledger.absorb_hit());

        ledger.apply(Effect::new(
            EffectKind::Shield,
            5000.0,
            EffectMagnitude::Shield { absorbs: 2 },
        ));
        assert!(ledger.absorb_hit());
        assert!(ledger.is_active(EffectKind::Shield));
        assert!(ledger.absorb_hit());
        assert!(!ledger.is_active(EffectKind::Shield));
    }
}
