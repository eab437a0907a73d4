//! Projectiles in flight.

use std::{collections::BTreeSet, time::Duration};

use action_stage_core::{ProjectileId, ProjectilePower, ProjectileProfile, UnitId, UnitKind};
use glam::Vec2;

use crate::{timer::secs, units::Attack};

/// Authoritative state of a single projectile.
#[derive(Clone, Debug)]
pub(crate) struct Projectile {
    pub(crate) id: ProjectileId,
    pub(crate) shooter: Option<UnitId>,
    pub(crate) position: Vec2,
    previous: Vec2,
    origin: Vec2,
    pub(crate) direction: Vec2,
    speed: f32,
    pub(crate) radius: f32,
    valid_targets: Vec<UnitKind>,
    pub(crate) die_on_contact: bool,
    power: ProjectilePower,
    cached: Attack,
    pub(crate) hits: u32,
    pub(crate) contacted: BTreeSet<UnitId>,
    age: Duration,
    lifetime: Option<Duration>,
}

impl Projectile {
    /// Creates a projectile, caching the shooter's attack at firing time.
    pub(crate) fn fire(
        id: ProjectileId,
        shooter: UnitId,
        position: Vec2,
        direction: Vec2,
        profile: &ProjectileProfile,
        cached: Attack,
    ) -> Self {
        Self {
            id,
            shooter: Some(shooter),
            position,
            previous: position,
            origin: position,
            direction: direction.normalize_or_zero(),
            speed: profile.speed.max(0.0),
            radius: profile.radius.max(0.0),
            valid_targets: profile.valid_targets.clone(),
            die_on_contact: profile.die_on_contact,
            power: profile.power.clone(),
            cached,
            hits: 0,
            contacted: BTreeSet::new(),
            age: Duration::ZERO,
            lifetime: profile.lifetime_secs.map(secs),
        }
    }

    /// Moves the projectile along its direction.
    pub(crate) fn advance(&mut self, dt: Duration) {
        self.previous = self.position;
        self.position += self.direction * self.speed * dt.as_secs_f32();
        self.age = self.age.saturating_add(dt);
    }

    /// Closest approach of the last step to `point`.
    ///
    /// Returns the distance travelled along the step up to the closest
    /// point, paired with the gap between that point and `point`.
    pub(crate) fn closest_approach(&self, point: Vec2) -> (f32, f32) {
        let path = self.position - self.previous;
        let length_squared = path.length_squared();
        let t = if length_squared > 0.0 {
            ((point - self.previous).dot(path) / length_squared).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let closest = self.previous + path * t;
        (t * length_squared.sqrt(), closest.distance(point))
    }

    pub(crate) fn expired(&self) -> bool {
        self.lifetime.map_or(false, |lifetime| self.age >= lifetime)
    }

    /// Reports whether the projectile left `[0, columns] x [0, rows]`.
    pub(crate) fn out_of_bounds(&self, columns: u32, rows: u32) -> bool {
        let Vec2 { x, y } = self.position;
        x < 0.0 || y < 0.0 || x > columns as f32 || y > rows as f32
    }

    /// Reports whether contact with `kind` resolves damage.
    pub(crate) fn accepts(&self, kind: UnitKind) -> bool {
        self.valid_targets.is_empty() || self.valid_targets.contains(&kind)
    }

    /// Attack delivered on contact.
    ///
    /// `shooter` carries the live shooter's stats; the snapshot cached at
    /// firing time is used once the shooter is gone.
    pub(crate) fn attack(&self, shooter: Option<Attack>) -> Attack {
        let base = shooter.unwrap_or(self.cached);
        let power = match self.power {
            ProjectilePower::Constant => base.power,
            ProjectilePower::DistanceScaled {
                target_power,
                max_distance,
            } => {
                let t = if max_distance > 0.0 {
                    (self.position.distance(self.origin) / max_distance).clamp(0.0, 1.0)
                } else {
                    1.0
                };
                base.power + (target_power - base.power) * t
            }
            ProjectilePower::PhaseDecay {
                decay_per_hit,
                min_power,
            } => (base.power - decay_per_hit * self.hits as f32).max(min_power),
        };
        Attack {
            power,
            one_hit_kill: base.one_hit_kill,
        }
    }
}
