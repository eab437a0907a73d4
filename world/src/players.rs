//! Energy pools of the two players.

use std::{collections::BTreeSet, time::Duration};

use action_stage_core::{EnemyConfig, Selection, UnitId, UserConfig};

use crate::timer::{secs, Countdown};

/// Depleting energy meter of the enemy player.
///
/// Energy is derived from elapsed time and accumulated external losses, so
/// it reaches exactly zero at the designed stage length without drift.
#[derive(Clone, Debug)]
pub(crate) struct EnemyPlayer {
    energy_max: f32,
    decay_rate: f32,
    stage_length: Duration,
    elapsed: Duration,
    external_loss: f32,
    depleted: bool,
    pub(crate) units: BTreeSet<UnitId>,
}

impl EnemyPlayer {
    pub(crate) fn from_config(config: &EnemyConfig) -> Self {
        Self {
            energy_max: config.energy_max.max(0.0),
            decay_rate: config.decay_rate(),
            stage_length: secs(config.stage_length_secs),
            elapsed: Duration::ZERO,
            external_loss: 0.0,
            depleted: false,
            units: BTreeSet::new(),
        }
    }

    pub(crate) fn energy(&self) -> f32 {
        if self.depleted || self.elapsed >= self.stage_length {
            return 0.0;
        }
        let decayed = self.decay_rate * self.elapsed.as_secs_f32();
        (self.energy_max - decayed - self.external_loss).max(0.0)
    }

    pub(crate) const fn is_depleted(&self) -> bool {
        self.depleted
    }

    /// Applies natural decay. Returns `true` only on the step that depletes
    /// the meter; later calls are no-ops.
    pub(crate) fn decay(&mut self, dt: Duration) -> bool {
        if self.depleted {
            return false;
        }
        self.elapsed = self.elapsed.saturating_add(dt);
        self.latch()
    }

    /// Applies an external reduction under the same floor and latch.
    pub(crate) fn drain(&mut self, amount: f32) -> bool {
        if self.depleted || !(amount > 0.0) {
            return false;
        }
        self.external_loss += amount;
        self.latch()
    }

    fn latch(&mut self) -> bool {
        if self.energy() <= 0.0 {
            self.depleted = true;
            return true;
        }
        false
    }
}

/// Spendable energy pool and interaction state of the user.
#[derive(Clone, Debug)]
pub(crate) struct UserPlayer {
    energy: f32,
    energy_total: f32,
    generation: Countdown,
    generation_amount: f32,
    pub(crate) selection: Selection,
    pub(crate) units: BTreeSet<UnitId>,
}

impl UserPlayer {
    pub(crate) fn from_config(config: &UserConfig) -> Self {
        Self {
            energy: config.starting_energy.max(0.0),
            energy_total: 0.0,
            generation: Countdown::from_secs(config.generation_period_secs),
            generation_amount: config.generation_amount,
            selection: Selection::Empty,
            units: BTreeSet::new(),
        }
    }

    pub(crate) const fn energy(&self) -> f32 {
        self.energy
    }

    /// Energy gained since the stage began, excluding the starting pool.
    pub(crate) const fn energy_total(&self) -> f32 {
        self.energy_total
    }

    pub(crate) fn can_afford(&self, cost: f32) -> bool {
        self.energy >= cost
    }

    /// Deducts `cost` if affordable. Nothing is deducted otherwise.
    pub(crate) fn try_spend(&mut self, cost: f32) -> bool {
        if !self.can_afford(cost) {
            return false;
        }
        self.energy -= cost.max(0.0);
        true
    }

    pub(crate) fn grant(&mut self, amount: f32) {
        if amount > 0.0 {
            self.energy += amount;
            self.energy_total += amount;
        }
    }

    /// Advances automatic generation, returning the amount granted.
    pub(crate) fn generate(&mut self, dt: Duration) -> Option<f32> {
        if self.generation.advance(dt) && self.generation_amount > 0.0 {
            self.grant(self.generation_amount);
            return Some(self.generation_amount);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enemy() -> EnemyPlayer {
        EnemyPlayer::from_config(&EnemyConfig {
            energy_max: 120.0,
            stage_length_secs: 60.0,
        })
    }

    #[test]
    fn enemy_energy_decays_linearly() {
        let mut enemy = enemy();
        for _ in 0..300 {
            assert!(!enemy.decay(Duration::from_millis(100)));
        }
        assert_eq!(enemy.energy(), 60.0);
    }

    #[test]
    fn enemy_depletes_exactly_once_at_stage_length() {
        let mut enemy = enemy();
        let mut triggers = 0;
        for _ in 0..900 {
            if enemy.decay(Duration::from_millis(100)) {
                triggers += 1;
            }
            assert!(enemy.energy() >= 0.0);
        }
        assert_eq!(triggers, 1);
        assert_eq!(enemy.energy(), 0.0);
        assert!(enemy.is_depleted());
    }

    #[test]
    fn external_drain_shares_the_latch() {
        let mut enemy = enemy();
        assert!(!enemy.drain(100.0));
        assert!(enemy.drain(50.0));
        assert_eq!(enemy.energy(), 0.0);
        assert!(!enemy.drain(5.0));
        assert!(!enemy.decay(Duration::from_secs(1)));
    }

    #[test]
    fn odd_rates_still_reach_zero_at_stage_length() {
        let mut enemy = EnemyPlayer::from_config(&EnemyConfig {
            energy_max: 100.0,
            stage_length_secs: 30.0,
        });
        let mut fired = false;
        for _ in 0..300 {
            fired |= enemy.decay(Duration::from_millis(100));
        }
        assert!(fired);
        assert_eq!(enemy.energy(), 0.0);
    }

    #[test]
    fn spending_is_all_or_nothing() {
        let mut user = UserPlayer::from_config(&UserConfig {
            starting_energy: 50.0,
            generation_period_secs: 0.0,
            generation_amount: 0.0,
        });
        assert!(user.try_spend(30.0));
        assert_eq!(user.energy(), 20.0);
        assert!(!user.can_afford(30.0));
        assert!(!user.try_spend(30.0));
        assert_eq!(user.energy(), 20.0);
    }

    #[test]
    fn generation_grants_on_each_period() {
        let mut user = UserPlayer::from_config(&UserConfig {
            starting_energy: 0.0,
            generation_period_secs: 2.0,
            generation_amount: 25.0,
        });
        assert_eq!(user.generate(Duration::from_secs(1)), None);
        assert_eq!(user.generate(Duration::from_secs(1)), Some(25.0));
        assert_eq!(user.energy(), 25.0);
        assert_eq!(user.energy_total(), 25.0);
    }
}
