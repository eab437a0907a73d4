//! Stage configuration and the unit catalogue ("prefabs").
//!
//! Geometry is expressed in tiles: positions, radii, ranges and speeds all
//! use one tile edge as the unit length.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{ProfileId, Terrain, TileCoord, UnitKind};

const DEFAULT_UNIT_RADIUS: f32 = 0.35;
const DEFAULT_PROJECTILE_RADIUS: f32 = 0.1;
const DEFAULT_TRAP_HALF_WIDTH: f32 = 0.5;

/// Complete description of one playable stage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StageConfig {
    /// Tile grid layout.
    pub grid: GridConfig,
    /// User energy economy.
    pub user: UserConfig,
    /// Enemy energy meter.
    pub enemy: EnemyConfig,
    /// Day/night scalar at which night begins.
    #[serde(default = "default_night_starts_at")]
    pub night_starts_at: f32,
    /// Unit profiles available on this stage.
    #[serde(default)]
    pub units: Vec<UnitProfile>,
}

impl StageConfig {
    /// Looks up a profile by identifier.
    #[must_use]
    pub fn profile(&self, id: ProfileId) -> Option<&UnitProfile> {
        usize::try_from(id.get())
            .ok()
            .and_then(|index| self.units.get(index))
    }

    /// Resolves a profile identifier from its name.
    #[must_use]
    pub fn profile_id(&self, name: &str) -> Option<ProfileId> {
        self.units
            .iter()
            .position(|profile| profile.name == name)
            .and_then(|index| u32::try_from(index).ok())
            .map(ProfileId::new)
    }

    /// Terrain of the provided tile. Tiles without a glyph default to land.
    #[must_use]
    pub fn terrain_at(&self, tile: TileCoord) -> Terrain {
        let Ok(row) = usize::try_from(tile.row()) else {
            return Terrain::Land;
        };
        let Ok(column) = usize::try_from(tile.column()) else {
            return Terrain::Land;
        };
        self.grid
            .terrain
            .get(row)
            .and_then(|line| line.chars().nth(column))
            .and_then(Terrain::from_glyph)
            .unwrap_or(Terrain::Land)
    }

    /// Checks the configuration for values the simulation cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let grid = &self.grid;
        if grid.rows == 0 || grid.columns == 0 {
            return Err(ConfigError::EmptyGrid);
        }

        if !grid.terrain.is_empty() {
            let expected_rows = grid.rows as usize;
            if grid.terrain.len() != expected_rows {
                return Err(ConfigError::TerrainRowCount {
                    expected: expected_rows,
                    found: grid.terrain.len(),
                });
            }
            for (row, line) in grid.terrain.iter().enumerate() {
                let width = line.chars().count();
                if width != grid.columns as usize {
                    return Err(ConfigError::TerrainRowWidth {
                        row,
                        expected: grid.columns as usize,
                        found: width,
                    });
                }
                if let Some((column, glyph)) = line
                    .chars()
                    .enumerate()
                    .find(|(_, glyph)| Terrain::from_glyph(*glyph).is_none())
                {
                    return Err(ConfigError::UnknownTerrain { glyph, row, column });
                }
            }
        }

        if let Some(tile) = grid
            .unusable
            .iter()
            .find(|tile| tile.row() >= grid.rows || tile.column() >= grid.columns)
        {
            return Err(ConfigError::UnusableOutOfBounds {
                row: tile.row(),
                column: tile.column(),
            });
        }

        if self.enemy.stage_length_secs <= 0.0 {
            return Err(ConfigError::NonPositiveStageLength(
                self.enemy.stage_length_secs,
            ));
        }
        if self.enemy.energy_max <= 0.0 {
            return Err(ConfigError::NonPositiveEnergyMax(self.enemy.energy_max));
        }

        let mut names = BTreeSet::new();
        for profile in &self.units {
            if !names.insert(profile.name.as_str()) {
                return Err(ConfigError::DuplicateProfile(profile.name.clone()));
            }
            if profile.health <= 0.0 {
                return Err(ConfigError::NonPositiveHealth(profile.name.clone()));
            }
            if let Some(projectile) = profile.projectile() {
                if projectile.speed <= 0.0 {
                    return Err(ConfigError::InvalidProjectileSpeed(profile.name.clone()));
                }
                if projectile.die_on_contact
                    && matches!(projectile.power, ProjectilePower::PhaseDecay { .. })
                {
                    return Err(ConfigError::PhasingProjectileDiesOnContact(
                        profile.name.clone(),
                    ));
                }
            }
        }

        Ok(())
    }
}

/// Tile grid layout.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    /// Number of rows (lanes).
    pub rows: u32,
    /// Number of columns.
    pub columns: u32,
    /// One string per row, one terrain glyph per column. Empty means all land.
    #[serde(default)]
    pub terrain: Vec<String>,
    /// Tiles that start out unusable.
    #[serde(default)]
    pub unusable: Vec<TileCoord>,
}

/// User energy economy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserConfig {
    /// Energy available when the stage starts.
    pub starting_energy: f32,
    /// Seconds between automatic grants. Zero disables generation.
    #[serde(default)]
    pub generation_period_secs: f32,
    /// Energy granted per automatic grant.
    #[serde(default)]
    pub generation_amount: f32,
}

/// Enemy energy meter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnemyConfig {
    /// Energy the enemy starts with; also the upper bound.
    pub energy_max: f32,
    /// Designed stage duration in seconds.
    pub stage_length_secs: f32,
}

impl EnemyConfig {
    /// Energy lost per second through natural decay.
    #[must_use]
    pub fn decay_rate(&self) -> f32 {
        if self.stage_length_secs <= 0.0 {
            return 0.0;
        }
        self.energy_max / self.stage_length_secs
    }
}

/// Static description of a unit kind, the stage's equivalent of a prefab.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnitProfile {
    /// Catalogue name, unique within a stage.
    pub name: String,
    /// Starting health.
    pub health: f32,
    /// Damage dealt per attack.
    #[serde(default)]
    pub attack_power: f32,
    /// Attacks deal damage equal to the target's current health.
    #[serde(default)]
    pub one_hit_kill: bool,
    /// Whether the unit can take damage.
    #[serde(default = "enabled")]
    pub vulnerable: bool,
    /// Whether projectiles can collide with the unit.
    #[serde(default = "enabled")]
    pub tangible: bool,
    /// Whether enemies stop in front of the unit.
    #[serde(default = "enabled")]
    pub blocks_enemies: bool,
    /// Collision radius in tiles.
    #[serde(default = "default_unit_radius")]
    pub radius: f32,
    /// Energy charged to the user on placement.
    #[serde(default)]
    pub energy_cost: f32,
    /// Terrains accepting this unit. Empty accepts every terrain.
    #[serde(default)]
    pub placeable_on: Vec<Terrain>,
    /// Whether the unit's tile becomes unusable when it dies.
    #[serde(default)]
    pub marks_tile_unusable_on_death: bool,
    /// Capability of the unit.
    pub role: UnitRole,
}

impl UnitProfile {
    /// Creates a profile with default flags for the provided role.
    #[must_use]
    pub fn new(name: impl Into<String>, health: f32, role: UnitRole) -> Self {
        Self {
            name: name.into(),
            health,
            attack_power: 0.0,
            one_hit_kill: false,
            vulnerable: true,
            tangible: true,
            blocks_enemies: true,
            radius: DEFAULT_UNIT_RADIUS,
            energy_cost: 0.0,
            placeable_on: Vec::new(),
            marks_tile_unusable_on_death: false,
            role,
        }
    }

    /// Sets the attack power.
    #[must_use]
    pub fn with_attack_power(mut self, attack_power: f32) -> Self {
        self.attack_power = attack_power;
        self
    }

    /// Sets the placement cost.
    #[must_use]
    pub fn with_energy_cost(mut self, energy_cost: f32) -> Self {
        self.energy_cost = energy_cost;
        self
    }

    /// Subtype of units created from this profile.
    #[must_use]
    pub const fn kind(&self) -> UnitKind {
        match self.role {
            UnitRole::Generator(_) => UnitKind::Generator,
            UnitRole::Defense(_) => UnitKind::Defense,
            UnitRole::Enemy(_) => UnitKind::Enemy,
        }
    }

    /// Reports whether the user may place this profile on a tile.
    #[must_use]
    pub const fn is_user_placeable(&self) -> bool {
        !matches!(self.role, UnitRole::Enemy(_))
    }

    /// Reports whether the profile accepts the provided terrain.
    #[must_use]
    pub fn accepts(&self, terrain: Terrain) -> bool {
        self.placeable_on.is_empty() || self.placeable_on.contains(&terrain)
    }

    fn projectile(&self) -> Option<&ProjectileProfile> {
        match &self.role {
            UnitRole::Defense(DefenseProfile {
                payload: DefensePayload::Blaster(blaster),
                ..
            }) => Some(&blaster.projectile),
            _ => None,
        }
    }
}

/// Capability carried by a unit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UnitRole {
    /// Periodically produces energy.
    Generator(GeneratorProfile),
    /// Attacks enemies.
    Defense(DefenseProfile),
    /// Walks toward the goal.
    Enemy(EnemyProfile),
}

/// Energy production parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeneratorProfile {
    /// Seconds between grants.
    pub period_secs: f32,
    /// Energy granted per period.
    pub amount: f32,
    /// Production stops once night begins.
    #[serde(default)]
    pub daylight_only: bool,
}

/// Attack cycle parameters shared by every defense.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DefenseProfile {
    /// Seconds between attacks; the value the cooldown resets to.
    pub attack_interval_secs: f32,
    /// Energy charged for each shot beyond the first in one attack.
    #[serde(default)]
    pub attack_energy_cost: f32,
    /// What an attack delivers.
    pub payload: DefensePayload,
}

impl DefenseProfile {
    /// Creates a blaster defense.
    #[must_use]
    pub fn blaster(attack_interval_secs: f32, blaster: BlasterProfile) -> Self {
        Self {
            attack_interval_secs,
            attack_energy_cost: 0.0,
            payload: DefensePayload::Blaster(blaster),
        }
    }

    /// Creates a trap defense.
    #[must_use]
    pub fn trap(attack_interval_secs: f32, trap: TrapProfile) -> Self {
        Self {
            attack_interval_secs,
            attack_energy_cost: 0.0,
            payload: DefensePayload::Trap(trap),
        }
    }
}

/// Attack payload of a defense.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DefensePayload {
    /// Fires projectiles.
    Blaster(BlasterProfile),
    /// Damages every enemy in its trigger zone.
    Trap(TrapProfile),
}

/// Projectile-firing defense parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlasterProfile {
    /// Directions fired per attack.
    pub pattern: FiringPattern,
    /// Maximum targeting distance in tiles. `None` covers the whole row.
    #[serde(default)]
    pub range: Option<f32>,
    /// The blaster dies after its first attack.
    #[serde(default)]
    pub kill_on_attack_performed: bool,
    /// Projectiles in flight are destroyed when the blaster dies.
    #[serde(default)]
    pub kill_projectiles_on_death: bool,
    /// Whether attacks request a shot sound.
    #[serde(default = "enabled")]
    pub shot_sfx: bool,
    /// Projectile template.
    pub projectile: ProjectileProfile,
}

impl BlasterProfile {
    /// Creates a blaster with default flags.
    #[must_use]
    pub fn new(pattern: FiringPattern, projectile: ProjectileProfile) -> Self {
        Self {
            pattern,
            range: None,
            kill_on_attack_performed: false,
            kill_projectiles_on_death: false,
            shot_sfx: true,
            projectile,
        }
    }
}

/// Firing geometry of a blaster.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum FiringPattern {
    /// One projectile toward the right.
    Forward,
    /// One projectile per side holding a target.
    FrontBack,
    /// One projectile per angle, measured in degrees from the forward axis.
    Spread {
        /// Angles of each projectile.
        angles_degrees: Vec<f32>,
    },
}

/// Projectile template fired by blasters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectileProfile {
    /// Tiles travelled per second.
    pub speed: f32,
    /// Collision radius in tiles.
    #[serde(default = "default_projectile_radius")]
    pub radius: f32,
    /// Unit kinds the projectile damages. Empty damages every kind.
    #[serde(default)]
    pub valid_targets: Vec<UnitKind>,
    /// Whether the projectile is destroyed after a valid contact.
    #[serde(default = "enabled")]
    pub die_on_contact: bool,
    /// Power model.
    #[serde(default)]
    pub power: ProjectilePower,
    /// Seconds before the projectile expires. `None` never expires.
    #[serde(default)]
    pub lifetime_secs: Option<f32>,
}

impl ProjectileProfile {
    /// Creates a projectile that damages enemies and dies on contact.
    #[must_use]
    pub fn new(speed: f32) -> Self {
        Self {
            speed,
            radius: DEFAULT_PROJECTILE_RADIUS,
            valid_targets: vec![UnitKind::Enemy],
            die_on_contact: true,
            power: ProjectilePower::Constant,
            lifetime_secs: None,
        }
    }
}

/// How a projectile's power evolves during flight.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum ProjectilePower {
    /// The shooter's attack power.
    #[default]
    Constant,
    /// Linear interpolation from the base power toward `target_power` over
    /// `max_distance` tiles travelled, clamped beyond.
    DistanceScaled {
        /// Power reached at `max_distance`.
        target_power: f32,
        /// Travel distance in tiles over which power changes.
        max_distance: f32,
    },
    /// Power drops by `decay_per_hit` for every prior hit, floored at
    /// `min_power`. Such projectiles pass through their targets.
    PhaseDecay {
        /// Power lost per prior hit.
        decay_per_hit: f32,
        /// Lowest power the projectile keeps.
        min_power: f32,
    },
}

/// Area-damage defense parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrapProfile {
    /// Half width of the trigger zone in tiles, measured along the row.
    #[serde(default = "default_trap_half_width")]
    pub trigger_half_width: f32,
    /// Fraction of damage dealt that is granted to the owner as energy.
    #[serde(default)]
    pub energy_per_damage: f32,
    /// Number of member hits before the trap tears itself down.
    #[serde(default)]
    pub hit_limit: Option<u32>,
    /// Kill every remaining member when the hit limit is reached.
    #[serde(default)]
    pub kill_targets_on_hit_limit: bool,
}

impl TrapProfile {
    /// Creates a trap without a hit limit.
    #[must_use]
    pub fn new(energy_per_damage: f32) -> Self {
        Self {
            trigger_half_width: DEFAULT_TRAP_HALF_WIDTH,
            energy_per_damage,
            hit_limit: None,
            kill_targets_on_hit_limit: false,
        }
    }
}

/// Enemy behaviour parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnemyProfile {
    /// Tiles walked per second.
    pub speed: f32,
    /// Seconds between strikes against a blocking unit.
    pub attack_interval_secs: f32,
    /// Enemy player energy lost per point of damage this unit takes.
    #[serde(default = "default_energy_drain")]
    pub energy_drain_per_damage: f32,
    /// Score granted when the unit is killed.
    #[serde(default)]
    pub score_value: u32,
}

/// Reasons a stage configuration is rejected.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    /// The grid has no rows or no columns.
    #[error("grid must have at least one row and one column")]
    EmptyGrid,
    /// The terrain layout does not have one line per row.
    #[error("terrain layout has {found} rows, expected {expected}")]
    TerrainRowCount {
        /// Configured row count.
        expected: usize,
        /// Lines present in the layout.
        found: usize,
    },
    /// A terrain line does not have one glyph per column.
    #[error("terrain row {row} has {found} tiles, expected {expected}")]
    TerrainRowWidth {
        /// Offending row.
        row: usize,
        /// Configured column count.
        expected: usize,
        /// Glyphs present in the line.
        found: usize,
    },
    /// A terrain glyph is not recognised.
    #[error("unknown terrain glyph '{glyph}' at row {row}, column {column}")]
    UnknownTerrain {
        /// Offending glyph.
        glyph: char,
        /// Row of the glyph.
        row: usize,
        /// Column of the glyph.
        column: usize,
    },
    /// An unusable tile lies outside the grid.
    #[error("unusable tile ({row}, {column}) lies outside the grid")]
    UnusableOutOfBounds {
        /// Row of the tile.
        row: u32,
        /// Column of the tile.
        column: u32,
    },
    /// The stage length is zero or negative.
    #[error("stage length must be positive, got {0}")]
    NonPositiveStageLength(f32),
    /// The enemy energy maximum is zero or negative.
    #[error("enemy energy maximum must be positive, got {0}")]
    NonPositiveEnergyMax(f32),
    /// Two profiles share a name.
    #[error("unit profile '{0}' is defined more than once")]
    DuplicateProfile(String),
    /// A profile starts with no health.
    #[error("unit profile '{0}' must start with positive health")]
    NonPositiveHealth(String),
    /// A projectile does not move.
    #[error("projectile of '{0}' must have a positive speed")]
    InvalidProjectileSpeed(String),
    /// A phasing projectile is configured to die on contact.
    #[error("phasing projectile of '{0}' cannot die on contact")]
    PhasingProjectileDiesOnContact(String),
}

const fn enabled() -> bool {
    true
}

const fn default_unit_radius() -> f32 {
    DEFAULT_UNIT_RADIUS
}

const fn default_projectile_radius() -> f32 {
    DEFAULT_PROJECTILE_RADIUS
}

const fn default_trap_half_width() -> f32 {
    DEFAULT_TRAP_HALF_WIDTH
}

const fn default_energy_drain() -> f32 {
    1.0
}

const fn default_night_starts_at() -> f32 {
    1.0
}
