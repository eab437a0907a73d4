//! Unit records and their per-kind capabilities.

use std::{collections::BTreeSet, time::Duration};

use action_stage_core::{
    BlasterProfile, DefensePayload, PlayerSide, ProfileId, ProjectileId, TileCoord, TrapProfile,
    UnitId, UnitKind, UnitProfile, UnitRole,
};
use glam::Vec2;

use crate::timer::{secs, Countdown};

/// Damage parameters delivered by a single attack.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Attack {
    pub(crate) power: f32,
    pub(crate) one_hit_kill: bool,
}

/// Authoritative state of a single unit.
#[derive(Clone, Debug)]
pub(crate) struct Unit {
    pub(crate) id: UnitId,
    pub(crate) profile: ProfileId,
    pub(crate) kind: UnitKind,
    pub(crate) owner: Option<PlayerSide>,
    pub(crate) tile: Option<TileCoord>,
    pub(crate) row: u32,
    pub(crate) position: Vec2,
    pub(crate) radius: f32,
    pub(crate) health: f32,
    pub(crate) attack: Attack,
    pub(crate) vulnerable: bool,
    pub(crate) tangible: bool,
    pub(crate) blocks_enemies: bool,
    pub(crate) marks_tile_unusable_on_death: bool,
    pub(crate) dead: bool,
    pub(crate) capability: Capability,
}

impl Unit {
    /// Instantiates a unit from its catalogue profile.
    pub(crate) fn from_profile(
        id: UnitId,
        profile_id: ProfileId,
        profile: &UnitProfile,
        owner: PlayerSide,
        tile: Option<TileCoord>,
        row: u32,
        position: Vec2,
    ) -> Self {
        Self {
            id,
            profile: profile_id,
            kind: profile.kind(),
            owner: Some(owner),
            tile,
            row,
            position,
            radius: profile.radius.max(0.0),
            health: profile.health.max(0.0),
            attack: Attack {
                power: profile.attack_power,
                one_hit_kill: profile.one_hit_kill,
            },
            vulnerable: profile.vulnerable,
            tangible: profile.tangible,
            blocks_enemies: profile.blocks_enemies,
            marks_tile_unusable_on_death: profile.marks_tile_unusable_on_death,
            dead: false,
            capability: Capability::from_role(&profile.role),
        }
    }

    pub(crate) const fn is_live(&self) -> bool {
        !self.dead
    }

    /// Resolves an incoming attack and returns the damage applied.
    ///
    /// One-hit-kill attacks deal exactly the current health. Health never
    /// drops below zero, and dead or invulnerable units take nothing.
    pub(crate) fn receive_attack(&mut self, attack: Attack) -> f32 {
        if self.dead || !self.vulnerable {
            return 0.0;
        }

        let damage = if attack.one_hit_kill {
            self.health
        } else {
            attack.power.max(0.0).min(self.health)
        };
        self.health = (self.health - damage).max(0.0);
        damage
    }

    pub(crate) fn defense(&self) -> Option<&Defense> {
        match &self.capability {
            Capability::Defense(defense) => Some(defense),
            _ => None,
        }
    }

    pub(crate) fn defense_mut(&mut self) -> Option<&mut Defense> {
        match &mut self.capability {
            Capability::Defense(defense) => Some(defense),
            _ => None,
        }
    }

    pub(crate) fn trap(&self) -> Option<&Trap> {
        match self.defense().map(|defense| &defense.payload) {
            Some(Payload::Trap(trap)) => Some(trap),
            _ => None,
        }
    }

    pub(crate) fn trap_mut(&mut self) -> Option<&mut Trap> {
        match self.defense_mut().map(|defense| &mut defense.payload) {
            Some(Payload::Trap(trap)) => Some(trap),
            _ => None,
        }
    }

    pub(crate) fn blaster_mut(&mut self) -> Option<&mut Blaster> {
        match self.defense_mut().map(|defense| &mut defense.payload) {
            Some(Payload::Blaster(blaster)) => Some(blaster),
            _ => None,
        }
    }

    pub(crate) fn walker(&self) -> Option<&Walker> {
        match &self.capability {
            Capability::Enemy(walker) => Some(walker),
            _ => None,
        }
    }
}

/// Behaviour attached to a unit, resolved once from its profile role.
#[derive(Clone, Debug)]
pub(crate) enum Capability {
    Generator(Generation),
    Defense(Defense),
    Enemy(Walker),
}

impl Capability {
    fn from_role(role: &UnitRole) -> Self {
        match role {
            UnitRole::Generator(generator) => Self::Generator(Generation {
                countdown: Countdown::from_secs(generator.period_secs),
                amount: generator.amount,
                daylight_only: generator.daylight_only,
            }),
            UnitRole::Defense(defense) => Self::Defense(Defense {
                cooldown: Duration::ZERO,
                interval: secs(defense.attack_interval_secs),
                attack_energy_cost: defense.attack_energy_cost.max(0.0),
                payload: match &defense.payload {
                    DefensePayload::Blaster(blaster) => Payload::Blaster(Blaster {
                        profile: blaster.clone(),
                        fired: BTreeSet::new(),
                    }),
                    DefensePayload::Trap(trap) => Payload::Trap(Trap {
                        profile: trap.clone(),
                        members: BTreeSet::new(),
                        hits: 0,
                        exhausted: false,
                    }),
                },
            }),
            UnitRole::Enemy(enemy) => Self::Enemy(Walker {
                speed: enemy.speed.max(0.0),
                attack_interval: secs(enemy.attack_interval_secs),
                cooldown: Duration::ZERO,
                energy_drain_per_damage: enemy.energy_drain_per_damage.max(0.0),
                score_value: enemy.score_value,
            }),
        }
    }
}

/// Periodic energy production of a generator unit.
#[derive(Clone, Debug)]
pub(crate) struct Generation {
    pub(crate) countdown: Countdown,
    pub(crate) amount: f32,
    pub(crate) daylight_only: bool,
}

/// Attack cycle of a defense unit.
#[derive(Clone, Debug)]
pub(crate) struct Defense {
    pub(crate) cooldown: Duration,
    pub(crate) interval: Duration,
    pub(crate) attack_energy_cost: f32,
    pub(crate) payload: Payload,
}

impl Defense {
    pub(crate) fn is_ready(&self) -> bool {
        self.cooldown.is_zero()
    }
}

#[derive(Clone, Debug)]
pub(crate) enum Payload {
    Blaster(Blaster),
    Trap(Trap),
}

/// Projectile-firing payload and the projectiles it still owns.
#[derive(Clone, Debug)]
pub(crate) struct Blaster {
    pub(crate) profile: BlasterProfile,
    pub(crate) fired: BTreeSet<ProjectileId>,
}

/// Area-damage payload with its overlap membership table.
#[derive(Clone, Debug)]
pub(crate) struct Trap {
    pub(crate) profile: TrapProfile,
    pub(crate) members: BTreeSet<UnitId>,
    pub(crate) hits: u32,
    pub(crate) exhausted: bool,
}

impl Trap {
    /// Reports whether the hit counter reached a configured limit.
    ///
    /// Traps without a limit never reach it.
    pub(crate) fn limit_reached(&self) -> bool {
        self.profile
            .hit_limit
            .map_or(false, |limit| self.hits >= limit)
    }
}

/// Walking and melee behaviour of an enemy unit.
#[derive(Clone, Debug)]
pub(crate) struct Walker {
    pub(crate) speed: f32,
    pub(crate) attack_interval: Duration,
    pub(crate) cooldown: Duration,
    pub(crate) energy_drain_per_damage: f32,
    pub(crate) score_value: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use action_stage_core::{DefenseProfile, EnemyProfile};

    fn enemy(health: f32) -> Unit {
        let profile = UnitProfile::new(
            "crawler",
            health,
            UnitRole::Enemy(EnemyProfile {
                speed: 1.0,
                attack_interval_secs: 1.0,
                energy_drain_per_damage: 1.0,
                score_value: 10,
            }),
        );
        Unit::from_profile(
            UnitId::new(1),
            ProfileId::new(0),
            &profile,
            PlayerSide::Enemy,
            None,
            0,
            Vec2::new(5.0, 0.5),
        )
    }

    #[test]
    fn damage_is_clamped_at_zero_health() {
        let mut unit = enemy(10.0);
        let applied = unit.receive_attack(Attack {
            power: 4.0,
            one_hit_kill: false,
        });
        assert_eq!(applied, 4.0);
        assert_eq!(unit.health, 6.0);

        let applied = unit.receive_attack(Attack {
            power: 25.0,
            one_hit_kill: false,
        });
        assert_eq!(applied, 6.0);
        assert_eq!(unit.health, 0.0);
    }

    #[test]
    fn one_hit_kill_deals_exactly_current_health() {
        let mut unit = enemy(37.5);
        let applied = unit.receive_attack(Attack {
            power: 1.0,
            one_hit_kill: true,
        });
        assert_eq!(applied, 37.5);
        assert_eq!(unit.health, 0.0);
    }

    #[test]
    fn invulnerable_and_dead_units_ignore_attacks() {
        let mut unit = enemy(10.0);
        unit.vulnerable = false;
        let attack = Attack {
            power: 5.0,
            one_hit_kill: false,
        };
        assert_eq!(unit.receive_attack(attack), 0.0);

        unit.vulnerable = true;
        unit.dead = true;
        assert_eq!(unit.receive_attack(attack), 0.0);
        assert_eq!(unit.health, 10.0);
    }

    #[test]
    fn negative_power_never_heals() {
        let mut unit = enemy(10.0);
        let applied = unit.receive_attack(Attack {
            power: -3.0,
            one_hit_kill: false,
        });
        assert_eq!(applied, 0.0);
        assert_eq!(unit.health, 10.0);
    }

    #[test]
    fn traps_without_limit_never_reach_it() {
        let trap = Trap {
            profile: TrapProfile::new(0.5),
            members: BTreeSet::new(),
            hits: u32::MAX,
            exhausted: false,
        };
        assert!(!trap.limit_reached());
    }

    #[test]
    fn defenses_start_ready() {
        let profile = UnitProfile::new(
            "spikes",
            5.0,
            UnitRole::Defense(DefenseProfile::trap(1.0, TrapProfile::new(0.0))),
        );
        let unit = Unit::from_profile(
            UnitId::new(3),
            ProfileId::new(0),
            &profile,
            PlayerSide::User,
            Some(TileCoord::new(0, 0)),
            0,
            Vec2::new(0.5, 0.5),
        );
        assert!(unit.defense().map_or(false, Defense::is_ready));
        assert!(unit.trap().is_some());
    }
}
