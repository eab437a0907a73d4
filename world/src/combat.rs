//! Damage resolution, unit death, defense attacks and stage conclusion.

use action_stage_core::{
    DeathCause, EnergySource, Event, FiringPattern, PlayerSide, ProjectileEnd, ProjectileId,
    StageOutcome, TargetSides, UnitId, UnitKind,
};
use glam::Vec2;
use tracing::{debug, info};

use crate::{
    next_id,
    projectiles::Projectile,
    units::{Attack, Payload},
    World,
};

impl World {
    /// Applies an attack to `target` and reports the damage dealt.
    ///
    /// Damage to enemy units drains the enemy energy meter. A unit whose
    /// health reaches zero dies before any resulting victory is declared.
    pub(crate) fn damage_unit(
        &mut self,
        target: UnitId,
        attack: Attack,
        out_events: &mut Vec<Event>,
    ) -> f32 {
        let Some(unit) = self.units.get_mut(&target) else {
            return 0.0;
        };
        if !unit.is_live() {
            return 0.0;
        }

        let applied = unit.receive_attack(attack);
        if applied <= 0.0 {
            return 0.0;
        }

        let health = unit.health;
        let drain = unit
            .walker()
            .map_or(0.0, |walker| applied * walker.energy_drain_per_damage);
        out_events.push(Event::UnitDamaged {
            unit: target,
            damage: applied,
            health,
        });

        if health <= 0.0 {
            self.kill_unit(target, DeathCause::Killed, out_events);
        }

        if drain > 0.0 {
            let depleted = self.enemy.drain(drain);
            out_events.push(Event::EnergyChanged {
                side: PlayerSide::Enemy,
                energy: self.enemy.energy(),
            });
            if depleted {
                self.on_enemy_player_death(out_events);
            }
        }

        applied
    }

    /// Kills a unit and detaches it from every collection referencing it.
    ///
    /// Repeated calls for the same unit are ignored, so `UnitDied` is
    /// emitted once. The record itself is reaped after the current command.
    pub(crate) fn kill_unit(&mut self, id: UnitId, cause: DeathCause, out_events: &mut Vec<Event>) {
        let Some(unit) = self.units.get_mut(&id) else {
            return;
        };
        if unit.dead {
            return;
        }
        unit.dead = true;

        let kind = unit.kind;
        let owner = unit.owner.take();
        let tile = unit.tile.take();
        let marks_tile = unit.marks_tile_unusable_on_death;
        let score_value = unit.walker().map_or(0, |walker| walker.score_value);
        let (fired, kill_projectiles) = match unit.blaster_mut() {
            Some(blaster) => (
                std::mem::take(&mut blaster.fired),
                blaster.profile.kill_projectiles_on_death,
            ),
            None => (Default::default(), false),
        };
        if let Some(trap) = unit.trap_mut() {
            trap.members.clear();
        }

        match owner {
            Some(PlayerSide::User) => {
                let _ = self.user.units.remove(&id);
            }
            Some(PlayerSide::Enemy) => {
                let _ = self.enemy.units.remove(&id);
            }
            None => {}
        }
        if let Some(tile) = tile {
            self.tiles.vacate(tile, id);
        }
        for other in self.units.values_mut() {
            if let Some(trap) = other.trap_mut() {
                let _ = trap.members.remove(&id);
            }
        }

        for projectile in fired {
            if kill_projectiles {
                self.destroy_projectile(projectile, ProjectileEnd::ShooterCleanup, out_events);
            } else if let Some(projectile) = self.projectiles.get_mut(&projectile) {
                projectile.shooter = None;
            }
        }

        if kind == UnitKind::Enemy && matches!(cause, DeathCause::Killed | DeathCause::ForceKilled)
        {
            self.score = self.score.saturating_add(score_value);
        }

        debug!(unit = id.get(), ?kind, ?cause, "unit died");
        out_events.push(Event::UnitDied {
            unit: id,
            kind,
            cause,
        });

        if marks_tile && cause != DeathCause::Removed {
            if let Some(tile) = tile {
                if self.tiles.mark_unusable(tile) {
                    out_events.push(Event::TileBecameUnusable { tile });
                }
            }
        }
    }

    /// Removes a projectile and forgets it in its shooter's fired list.
    pub(crate) fn destroy_projectile(
        &mut self,
        id: ProjectileId,
        reason: ProjectileEnd,
        out_events: &mut Vec<Event>,
    ) {
        let Some(projectile) = self.projectiles.remove(&id) else {
            return;
        };
        if let Some(shooter) = projectile.shooter {
            if let Some(blaster) = self
                .units
                .get_mut(&shooter)
                .and_then(|unit| unit.blaster_mut())
            {
                let _ = blaster.fired.remove(&id);
            }
        }
        out_events.push(Event::ProjectileDestroyed {
            projectile: id,
            reason,
        });
    }

    /// Handles the enemy energy meter reaching zero.
    ///
    /// Safe to call repeatedly: only the first call concludes the stage.
    pub(crate) fn on_enemy_player_death(&mut self, out_events: &mut Vec<Event>) {
        if !self.enemy.is_depleted() {
            return;
        }
        if self.stage.state().is_active() {
            out_events.push(Event::EnemyEnergyDepleted);
        }
        self.conclude(StageOutcome::Won, out_events);
    }

    /// Moves the stage into its terminal state exactly once.
    pub(crate) fn conclude(&mut self, outcome: StageOutcome, out_events: &mut Vec<Event>) {
        if !self.stage.conclude(outcome) {
            return;
        }

        let result = self.result();
        info!(
            ?outcome,
            score = result.score,
            elapsed = result.elapsed_seconds,
            "stage concluded"
        );
        out_events.push(Event::StageStateChanged {
            state: self.stage.state(),
        });
        out_events.push(Event::StageConcluded { outcome, result });
    }

    /// Executes the attack of a ready defense.
    pub(crate) fn perform_attack(
        &mut self,
        id: UnitId,
        sides: TargetSides,
        out_events: &mut Vec<Event>,
    ) {
        if !self.gate_open() {
            return;
        }
        let Some(defense) = self
            .units
            .get(&id)
            .filter(|unit| unit.is_live())
            .and_then(|unit| unit.defense())
        else {
            debug!(unit = id.get(), "attack requested by a unit that is not a live defense");
            return;
        };
        if !defense.is_ready() {
            return;
        }

        if matches!(defense.payload, Payload::Trap(_)) {
            self.trigger_trap(id, out_events);
        } else {
            self.fire_blaster(id, sides, out_events);
        }
    }

    fn fire_blaster(&mut self, id: UnitId, sides: TargetSides, out_events: &mut Vec<Event>) {
        let Some(unit) = self.units.get(&id) else {
            return;
        };
        let Some(defense) = unit.defense() else {
            return;
        };
        let Payload::Blaster(blaster) = &defense.payload else {
            return;
        };

        let directions = firing_directions(&blaster.profile.pattern, sides);
        if directions.is_empty() {
            return;
        }

        let origin = unit.position;
        let owner = unit.owner;
        let cached = unit.attack;
        let extra_shot_cost = defense.attack_energy_cost;
        let interval = defense.interval;
        let sfx = blaster.profile.shot_sfx;
        let expend = blaster.profile.kill_on_attack_performed;
        let projectile_profile = blaster.profile.projectile.clone();

        let mut shots = 0;
        for direction in directions {
            if shots > 0 && owner == Some(PlayerSide::User) && extra_shot_cost > 0.0 {
                if !self.user.try_spend(extra_shot_cost) {
                    debug!(unit = id.get(), "extra shot skipped: insufficient energy");
                    break;
                }
                out_events.push(Event::EnergyChanged {
                    side: PlayerSide::User,
                    energy: self.user.energy(),
                });
            }

            let projectile_id = ProjectileId::new(next_id(&mut self.next_projectile_id));
            let projectile = Projectile::fire(
                projectile_id,
                id,
                origin,
                direction,
                &projectile_profile,
                cached,
            );
            out_events.push(Event::ProjectileFired {
                projectile: projectile_id,
                shooter: id,
                position: origin,
                direction: projectile.direction,
            });
            let _ = self.projectiles.insert(projectile_id, projectile);
            if let Some(blaster) = self.units.get_mut(&id).and_then(|unit| unit.blaster_mut()) {
                let _ = blaster.fired.insert(projectile_id);
            }
            shots += 1;
        }

        if let Some(defense) = self.units.get_mut(&id).and_then(|unit| unit.defense_mut()) {
            defense.cooldown = interval;
        }
        out_events.push(Event::AttackPerformed {
            unit: id,
            shots,
            sfx,
        });

        if expend {
            self.kill_unit(id, DeathCause::Expended, out_events);
        }
    }

    fn trigger_trap(&mut self, id: UnitId, out_events: &mut Vec<Event>) {
        let Some(unit) = self.units.get(&id) else {
            return;
        };
        let Some(trap) = unit.trap() else {
            return;
        };
        if trap.exhausted || trap.members.is_empty() {
            return;
        }

        let attack = unit.attack;
        let members: Vec<UnitId> = trap.members.iter().copied().collect();
        let energy_per_damage = trap.profile.energy_per_damage;
        let kill_targets = trap.profile.kill_targets_on_hit_limit;
        let interval = unit.defense().map(|defense| defense.interval).unwrap_or_default();

        let mut shots = 0;
        for member in members {
            let limit_reached = self
                .units
                .get(&id)
                .and_then(|unit| unit.trap())
                .map_or(true, |trap| trap.limit_reached());
            if limit_reached || !self.gate_open() {
                break;
            }

            let dealt = self.damage_unit(member, attack, out_events);
            let reward = dealt * energy_per_damage;
            if reward > 0.0 {
                self.user.grant(reward);
                out_events.push(Event::EnergyGenerated {
                    source: EnergySource::TrapReward(id),
                    amount: reward,
                });
                out_events.push(Event::EnergyChanged {
                    side: PlayerSide::User,
                    energy: self.user.energy(),
                });
            }
            if let Some(trap) = self.units.get_mut(&id).and_then(|unit| unit.trap_mut()) {
                trap.hits = trap.hits.saturating_add(1);
            }
            shots += 1;
        }
        if !self.gate_open() {
            return;
        }

        let Some(unit) = self.units.get_mut(&id) else {
            return;
        };
        if let Some(defense) = unit.defense_mut() {
            defense.cooldown = interval;
        }
        out_events.push(Event::AttackPerformed {
            unit: id,
            shots,
            sfx: shots > 0,
        });

        let Some(trap) = unit.trap_mut() else {
            return;
        };
        if trap.exhausted || !trap.limit_reached() {
            return;
        }
        trap.exhausted = true;
        let remaining: Vec<UnitId> = trap.members.iter().copied().collect();
        info!(trap = id.get(), hits = trap.hits, "trap reached its hit limit");
        out_events.push(Event::TrapHitLimitReached { trap: id });

        if kill_targets {
            for member in remaining {
                self.kill_unit(member, DeathCause::ForceKilled, out_events);
            }
        }
        self.kill_unit(id, DeathCause::HitLimit, out_events);
    }

    /// Records that `enemy` entered the trigger zone of `trap`.
    pub(crate) fn begin_overlap(&mut self, trap: UnitId, enemy: UnitId) {
        if !self.gate_open() {
            return;
        }
        let enemy_is_live = self
            .units
            .get(&enemy)
            .map_or(false, |unit| unit.is_live() && unit.kind == UnitKind::Enemy);
        if !enemy_is_live {
            return;
        }
        if let Some(trap) = self
            .units
            .get_mut(&trap)
            .filter(|unit| unit.is_live())
            .and_then(|unit| unit.trap_mut())
        {
            let _ = trap.members.insert(enemy);
        }
    }

    /// Records that `enemy` left the trigger zone of `trap`.
    pub(crate) fn end_overlap(&mut self, trap: UnitId, enemy: UnitId) {
        if let Some(trap) = self.units.get_mut(&trap).and_then(|unit| unit.trap_mut()) {
            let _ = trap.members.remove(&enemy);
        }
    }
}

/// Unit directions fired by a pattern for the acquired target sides.
fn firing_directions(pattern: &FiringPattern, sides: TargetSides) -> Vec<Vec2> {
    match pattern {
        FiringPattern::Forward => {
            if sides.front {
                vec![Vec2::X]
            } else {
                Vec::new()
            }
        }
        FiringPattern::FrontBack => {
            let mut directions = Vec::with_capacity(2);
            if sides.front {
                directions.push(Vec2::X);
            }
            if sides.back {
                directions.push(Vec2::NEG_X);
            }
            directions
        }
        FiringPattern::Spread { angles_degrees } => {
            if !sides.front {
                return Vec::new();
            }
            angles_degrees
                .iter()
                .map(|degrees| {
                    let radians = degrees.to_radians();
                    Vec2::new(radians.cos(), radians.sin())
                })
                .collect()
        }
    }
}
