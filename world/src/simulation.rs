//! Time-driven phases executed by a gated `Tick`.

use std::time::Duration;

use action_stage_core::{
    DeathCause, EnergySource, Event, PlayerSide, ProjectileEnd, ProjectileId, StageOutcome,
    UnitId, UnitKind,
};
use tracing::info;

use crate::{
    units::{Attack, Capability},
    World,
};

impl World {
    /// Advances every time-based subsystem by `dt`.
    ///
    /// Phases run in a fixed order and each one re-checks the gate, so
    /// nothing mutates after the stage reached a terminal state.
    pub(crate) fn tick(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        if !self.gate_open() {
            return;
        }

        self.elapsed = self.elapsed.saturating_add(dt);
        out_events.push(Event::TimeAdvanced { dt });

        self.decay_enemy_energy(dt, out_events);
        if !self.gate_open() {
            return;
        }
        self.generate_user_energy(dt, out_events);
        self.run_generators(dt, out_events);
        self.cool_down(dt);
        self.advance_enemies(dt, out_events);
        if !self.gate_open() {
            return;
        }
        self.advance_projectiles(dt, out_events);
    }

    fn decay_enemy_energy(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let depleted = self.enemy.decay(dt);
        out_events.push(Event::EnergyChanged {
            side: PlayerSide::Enemy,
            energy: self.enemy.energy(),
        });
        if depleted {
            self.on_enemy_player_death(out_events);
        }
    }

    fn generate_user_energy(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        if let Some(amount) = self.user.generate(dt) {
            out_events.push(Event::EnergyGenerated {
                source: EnergySource::AutoGeneration,
                amount,
            });
            out_events.push(Event::EnergyChanged {
                side: PlayerSide::User,
                energy: self.user.energy(),
            });
        }
    }

    fn run_generators(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let night = self.is_night();
        let mut grants = Vec::new();
        for unit in self.units.values_mut().filter(|unit| unit.is_live()) {
            let Capability::Generator(generation) = &mut unit.capability else {
                continue;
            };
            if generation.daylight_only && night {
                continue;
            }
            if generation.countdown.advance(dt) && generation.amount > 0.0 {
                grants.push((unit.id, generation.amount));
            }
        }

        for (unit, amount) in grants {
            self.user.grant(amount);
            out_events.push(Event::EnergyGenerated {
                source: EnergySource::Generator(unit),
                amount,
            });
            out_events.push(Event::EnergyChanged {
                side: PlayerSide::User,
                energy: self.user.energy(),
            });
        }
    }

    fn cool_down(&mut self, dt: Duration) {
        for unit in self.units.values_mut().filter(|unit| unit.is_live()) {
            match &mut unit.capability {
                Capability::Defense(defense) => {
                    defense.cooldown = defense.cooldown.saturating_sub(dt);
                }
                Capability::Enemy(walker) => {
                    walker.cooldown = walker.cooldown.saturating_sub(dt);
                }
                Capability::Generator(_) => {}
            }
        }
    }

    /// Walks enemies toward the goal line, striking blocking units instead.
    fn advance_enemies(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let enemies: Vec<UnitId> = self.enemy.units.iter().copied().collect();
        for id in enemies {
            if !self.gate_open() {
                return;
            }

            let blocker = self.blocker_of(id);
            let Some(unit) = self.units.get_mut(&id).filter(|unit| unit.is_live()) else {
                continue;
            };
            let attack = unit.attack;
            let row = unit.row;
            let Capability::Enemy(walker) = &mut unit.capability else {
                continue;
            };

            if let Some(blocker) = blocker {
                if walker.cooldown.is_zero() {
                    walker.cooldown = walker.attack_interval;
                    let _ = self.damage_unit(blocker, attack, out_events);
                }
                continue;
            }

            unit.position.x -= walker.speed * dt.as_secs_f32();
            if unit.position.x <= 0.0 {
                info!(unit = id.get(), row, "enemy reached the goal line");
                out_events.push(Event::EnemyReachedGoal { unit: id, row });
                self.kill_unit(id, DeathCause::ReachedGoal, out_events);
                self.conclude(StageOutcome::Lost, out_events);
            }
        }
    }

    /// Nearest live user unit that stops `enemy` from walking further.
    fn blocker_of(&self, enemy: UnitId) -> Option<UnitId> {
        let enemy = self.units.get(&enemy)?;
        self.units
            .values()
            .filter(|unit| {
                unit.is_live()
                    && unit.owner == Some(PlayerSide::User)
                    && unit.blocks_enemies
                    && unit.tangible
                    && unit.row == enemy.row
            })
            .filter(|unit| {
                let gap = enemy.position.x - unit.position.x;
                gap >= 0.0 && gap <= unit.radius + enemy.radius
            })
            .max_by(|a, b| a.position.x.total_cmp(&b.position.x))
            .map(|unit| unit.id)
    }

    fn advance_projectiles(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let ids: Vec<ProjectileId> = self.projectiles.keys().copied().collect();
        for id in ids {
            if !self.gate_open() {
                return;
            }
            let Some(projectile) = self.projectiles.get_mut(&id) else {
                continue;
            };
            projectile.advance(dt);
            if projectile.expired() {
                self.destroy_projectile(id, ProjectileEnd::Expired, out_events);
                continue;
            }

            if self.resolve_contacts(id, out_events) {
                continue;
            }

            let (columns, rows) = (self.tiles.columns(), self.tiles.rows());
            if self
                .projectiles
                .get(&id)
                .map_or(false, |projectile| projectile.out_of_bounds(columns, rows))
            {
                self.destroy_projectile(id, ProjectileEnd::OutOfBounds, out_events);
            }
        }
    }

    /// Resolves first contacts along the projectile's last step, nearest to
    /// the start of the step first. Returns `true` once the projectile was
    /// destroyed.
    fn resolve_contacts(&mut self, id: ProjectileId, out_events: &mut Vec<Event>) -> bool {
        let Some(projectile) = self.projectiles.get(&id) else {
            return true;
        };
        let mut contacts: Vec<(f32, UnitId, UnitKind)> = self
            .units
            .values()
            .filter(|unit| {
                unit.is_live()
                    && unit.tangible
                    && Some(unit.id) != projectile.shooter
                    && !projectile.contacted.contains(&unit.id)
            })
            .filter_map(|unit| {
                let (along, gap) = projectile.closest_approach(unit.position);
                (gap <= unit.radius + projectile.radius).then_some((along, unit.id, unit.kind))
            })
            .collect();
        contacts.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        for (_, target, kind) in contacts {
            if !self.gate_open() {
                return false;
            }
            let Some(projectile) = self.projectiles.get_mut(&id) else {
                return true;
            };
            let _ = projectile.contacted.insert(target);
            if !projectile.accepts(kind) {
                continue;
            }

            let shooter = projectile.shooter;
            let live_shooter: Option<Attack> = shooter
                .and_then(|shooter| self.units.get(&shooter))
                .filter(|unit| unit.is_live())
                .map(|unit| unit.attack);
            let Some(projectile) = self.projectiles.get_mut(&id) else {
                return true;
            };
            let attack = projectile.attack(live_shooter);
            projectile.hits = projectile.hits.saturating_add(1);
            let die_on_contact = projectile.die_on_contact;

            let damage = self.damage_unit(target, attack, out_events);
            out_events.push(Event::ProjectileHit {
                projectile: id,
                target,
                damage,
            });
            if die_on_contact {
                self.destroy_projectile(id, ProjectileEnd::Contact, out_events);
                return true;
            }
        }
        false
    }
}
