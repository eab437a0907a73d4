#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Action Stage engine.
//!
//! This crate defines the message surface that connects the stage manager,
//! the authoritative world, and pure systems. The manager submits [`Command`]
//! values describing desired mutations, the world executes those commands via
//! its `apply` entry point, and then broadcasts [`Event`] values for systems
//! and presentation hooks to react to deterministically. Systems consume
//! event streams, query immutable views, and respond exclusively with new
//! command batches.

mod config;
mod views;

use std::time::Duration;

use glam::Vec2;
use serde::{Deserialize, Serialize};

pub use config::{
    BlasterProfile, ConfigError, DefensePayload, DefenseProfile, EnemyConfig, EnemyProfile,
    FiringPattern, GeneratorProfile, GridConfig, ProjectilePower, ProjectileProfile, StageConfig,
    TrapProfile, UnitProfile, UnitRole, UserConfig,
};
pub use views::{
    DefenseSnapshot, DefenseTarget, DefenseView, EnemySnapshot, EnemyView, Targeting,
    TrapSnapshot, TrapView,
};

/// Lifecycle of a single stage instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StageState {
    /// The stage was configured but has not begun.
    NotStarted,
    /// Simulation time advances.
    Playing,
    /// Simulation time is frozen; timers retain their values.
    Paused,
    /// The enemy energy meter was depleted. Terminal.
    Won,
    /// An enemy reached the goal line. Terminal.
    Lost,
}

impl StageState {
    /// Reports whether time-based state may advance.
    ///
    /// Every ticking subsystem is gated on this predicate.
    #[must_use]
    pub const fn is_playing_and_unpaused(self) -> bool {
        matches!(self, Self::Playing)
    }

    /// Reports whether the stage reached a terminal outcome.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }

    /// Reports whether the stage is running, paused or not.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Playing | Self::Paused)
    }
}

/// Terminal result of a stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StageOutcome {
    /// The enemy energy meter reached zero.
    Won,
    /// An enemy unit reached the goal line.
    Lost,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Replaces the stage configuration and rebuilds a fresh stage instance.
    ConfigureStage {
        /// Configuration describing grid, players and unit catalogue.
        config: Box<StageConfig>,
    },
    /// Transitions a not-started stage into play.
    StartStage,
    /// Pauses or resumes an active stage.
    SetPaused {
        /// Whether the stage should be paused.
        paused: bool,
    },
    /// Flips between playing and paused.
    TogglePause,
    /// Tears the stage down and re-enters the not-started state.
    ExitStage,
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Selects a unit profile for placement, clearing remove mode.
    SelectUnit {
        /// Profile the user intends to place.
        profile: ProfileId,
    },
    /// Enters remove mode, clearing any unit selection.
    SelectRemoveMode,
    /// Clears the current selection.
    ClearSelection,
    /// Places a unit of the given profile on a tile.
    PlaceUnit {
        /// Profile of the unit to create.
        profile: ProfileId,
        /// Tile that will host the unit.
        tile: TileCoord,
    },
    /// Places the currently selected profile on a tile.
    PlaceSelected {
        /// Tile that will host the unit.
        tile: TileCoord,
    },
    /// Removes the user unit occupying a tile while in remove mode.
    RemoveUnit {
        /// Tile whose occupant should be removed.
        tile: TileCoord,
    },
    /// Spawns an enemy unit at the right edge of a row.
    SpawnEnemy {
        /// Enemy profile to instantiate.
        profile: ProfileId,
        /// Row the enemy walks along.
        row: u32,
    },
    /// Requests that a ready defense unit attacks.
    PerformAttack {
        /// Defense unit performing the attack.
        unit: UnitId,
        /// Sides on which targets were acquired.
        sides: TargetSides,
    },
    /// Records that an enemy started overlapping a trap's trigger zone.
    BeginOverlap {
        /// Trap whose membership table is updated.
        trap: UnitId,
        /// Enemy entering the trigger zone.
        enemy: UnitId,
    },
    /// Records that an enemy stopped overlapping a trap's trigger zone.
    EndOverlap {
        /// Trap whose membership table is updated.
        trap: UnitId,
        /// Enemy leaving the trigger zone.
        enemy: UnitId,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Confirms that a fresh stage instance was built.
    StageConfigured {
        /// Number of tile rows.
        rows: u32,
        /// Number of tile columns.
        columns: u32,
    },
    /// Announces a stage state transition.
    StageStateChanged {
        /// State that became active.
        state: StageState,
    },
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Reports a player's energy after it changed.
    EnergyChanged {
        /// Player whose pool changed.
        side: PlayerSide,
        /// Energy after the change.
        energy: f32,
    },
    /// Reports energy granted to the user.
    EnergyGenerated {
        /// Origin of the energy.
        source: EnergySource,
        /// Amount granted.
        amount: f32,
    },
    /// Reports the user's new selection.
    SelectionChanged {
        /// Selection after the change.
        selection: Selection,
    },
    /// Confirms that a user unit was placed.
    UnitPlaced {
        /// Identifier allocated to the unit.
        unit: UnitId,
        /// Profile the unit was created from.
        profile: ProfileId,
        /// Tile hosting the unit.
        tile: TileCoord,
    },
    /// Reports that a placement request was rejected.
    PlacementRejected {
        /// Requested profile, if one could be resolved.
        profile: Option<ProfileId>,
        /// Requested tile.
        tile: TileCoord,
        /// Specific reason the placement failed.
        reason: PlacementError,
    },
    /// Confirms that a user unit was removed.
    UnitRemoved {
        /// Identifier of the removed unit.
        unit: UnitId,
        /// Tile the unit occupied.
        tile: TileCoord,
    },
    /// Reports that a removal request was rejected.
    RemovalRejected {
        /// Requested tile.
        tile: TileCoord,
        /// Specific reason the removal failed.
        reason: RemovalError,
    },
    /// Confirms that an enemy entered the stage.
    EnemySpawned {
        /// Identifier allocated to the enemy.
        unit: UnitId,
        /// Profile the enemy was created from.
        profile: ProfileId,
        /// Row the enemy walks along.
        row: u32,
    },
    /// Confirms that a defense unit attacked.
    AttackPerformed {
        /// Attacking unit.
        unit: UnitId,
        /// Number of shots or area hits delivered.
        shots: u32,
        /// Whether the attacker requests a shot sound.
        sfx: bool,
    },
    /// Confirms that a projectile was created.
    ProjectileFired {
        /// Identifier allocated to the projectile.
        projectile: ProjectileId,
        /// Unit that fired the projectile.
        shooter: UnitId,
        /// Spawn position.
        position: Vec2,
        /// Unit direction of travel.
        direction: Vec2,
    },
    /// Reports damage resolved by a projectile contact.
    ProjectileHit {
        /// Projectile that made contact.
        projectile: ProjectileId,
        /// Unit that was hit.
        target: UnitId,
        /// Damage applied.
        damage: f32,
    },
    /// Reports that a projectile left the simulation.
    ProjectileDestroyed {
        /// Projectile that was destroyed.
        projectile: ProjectileId,
        /// Reason the projectile ended.
        reason: ProjectileEnd,
    },
    /// Reports damage applied to a unit.
    UnitDamaged {
        /// Unit that took damage.
        unit: UnitId,
        /// Damage applied after clamping.
        damage: f32,
        /// Health remaining.
        health: f32,
    },
    /// Reports that a unit died. Emitted exactly once per unit.
    UnitDied {
        /// Unit that died.
        unit: UnitId,
        /// Kind of the unit.
        kind: UnitKind,
        /// Why the unit died.
        cause: DeathCause,
    },
    /// Reports that a trap exhausted its hit budget.
    TrapHitLimitReached {
        /// Trap that reached its limit.
        trap: UnitId,
    },
    /// Reports that a tile can no longer host units.
    TileBecameUnusable {
        /// Tile that changed.
        tile: TileCoord,
    },
    /// Reports that an enemy crossed the goal line.
    EnemyReachedGoal {
        /// Enemy that reached the goal.
        unit: UnitId,
        /// Row the enemy walked along.
        row: u32,
    },
    /// Reports that the enemy energy meter reached zero.
    EnemyEnergyDepleted,
    /// Reports that the stage reached a terminal outcome. Emitted once.
    StageConcluded {
        /// Outcome of the stage.
        outcome: StageOutcome,
        /// Result snapshot for persistence.
        result: StageResult,
    },
    /// Reports that the stage was exited.
    StageExited {
        /// Result snapshot captured before teardown.
        result: StageResult,
    },
}

/// Owner of a unit or an energy pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PlayerSide {
    /// The human player defending the grid.
    User,
    /// The opposing player whose units walk toward the goal.
    Enemy,
}

/// Subtype discriminator for units.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    /// Produces energy for its owner.
    Generator,
    /// Attacks enemy units.
    Defense,
    /// Walks toward the goal and is the attack target.
    Enemy,
}

/// Origin of user energy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EnergySource {
    /// The user's automatic generation timer.
    AutoGeneration,
    /// A generator unit.
    Generator(UnitId),
    /// Damage converted by a trap.
    TrapReward(UnitId),
}

/// User selection state. Exactly one mode is active at a time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Selection {
    /// Nothing is selected.
    #[default]
    Empty,
    /// A unit profile is selected for placement.
    Place(ProfileId),
    /// Remove mode is active.
    Remove,
}

/// Horizontal side relative to a position within a row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    /// Toward decreasing x, where the goal line lies.
    Left,
    /// Toward increasing x, where enemies enter.
    Right,
}

/// Whether a query includes units located exactly at the query position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Boundary {
    /// Units at the query position count.
    Inclusive,
    /// Units at the query position do not count.
    Exclusive,
}

/// Sides on which a defense acquired targets this step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct TargetSides {
    /// A target exists in front (to the right).
    pub front: bool,
    /// A target exists behind (to the left).
    pub back: bool,
}

impl TargetSides {
    /// Target only in front.
    pub const FRONT: Self = Self {
        front: true,
        back: false,
    };

    /// Reports whether any side holds a target.
    #[must_use]
    pub const fn any(self) -> bool {
        self.front || self.back
    }
}

/// Why a unit died.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DeathCause {
    /// Health reached zero.
    Killed,
    /// Killed by a trap's hit-limit sweep.
    ForceKilled,
    /// A trap tore itself down after exhausting its hits.
    HitLimit,
    /// A single-use blaster expended itself.
    Expended,
    /// The user removed the unit.
    Removed,
    /// An enemy crossed the goal line.
    ReachedGoal,
}

/// Why a projectile left the simulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProjectileEnd {
    /// Destroyed after a valid contact.
    Contact,
    /// Left the stage bounds.
    OutOfBounds,
    /// Exceeded its configured lifetime.
    Expired,
    /// Its shooter died and cleaned it up.
    ShooterCleanup,
}

/// Unique identifier assigned to a unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(u32);

impl UnitId {
    /// Creates a new unit identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a projectile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProjectileId(u32);

impl ProjectileId {
    /// Creates a new projectile identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Index of a unit profile within the stage's unit catalogue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProfileId(u32);

impl ProfileId {
    /// Creates a new profile identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Location of a single tile expressed as row and column indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
    row: u32,
    column: u32,
}

impl TileCoord {
    /// Creates a new tile coordinate.
    #[must_use]
    pub const fn new(row: u32, column: u32) -> Self {
        Self { row, column }
    }

    /// Zero-based row index of the tile.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Zero-based column index of the tile.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Centre of the tile in stage space, measured in tiles.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.column as f32 + 0.5, self.row as f32 + 0.5)
    }
}

/// Ground type of a tile, restricting which units may be placed on it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Terrain {
    /// Regular ground.
    Land,
    /// Water; only units listing it may be placed.
    Water,
    /// Metal plating.
    Metal,
}

impl Terrain {
    /// Parses the single-character glyph used by stage files.
    #[must_use]
    pub const fn from_glyph(glyph: char) -> Option<Self> {
        match glyph {
            'L' | 'l' | '.' => Some(Self::Land),
            'W' | 'w' | '~' => Some(Self::Water),
            'M' | 'm' | '#' => Some(Self::Metal),
            _ => None,
        }
    }
}

/// Overlay state of a tile.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TileOverlay {
    /// The tile accepts placements.
    #[default]
    Normal,
    /// The tile can no longer host units.
    Unusable,
}

/// Immutable representation of a single tile used for queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileSnapshot {
    /// Coordinate of the tile.
    pub coord: TileCoord,
    /// Ground type of the tile.
    pub terrain: Terrain,
    /// Overlay state of the tile.
    pub overlay: TileOverlay,
    /// Unit occupying the tile, if any.
    pub occupant: Option<UnitId>,
}

/// Reasons a placement request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlacementError {
    /// The stage is not playing.
    InvalidState,
    /// The profile does not exist in the catalogue.
    UnknownProfile,
    /// The profile describes a unit the user cannot place.
    NotPlaceable,
    /// `PlaceSelected` was issued without a unit selection.
    NoSelection,
    /// The tile lies outside the grid.
    OutOfBounds,
    /// The tile overlay forbids placement.
    TileUnusable,
    /// The tile's terrain is not accepted by the profile.
    TerrainMismatch,
    /// The tile already hosts a unit.
    Occupied,
    /// The user cannot afford the unit.
    InsufficientEnergy,
}

/// Reasons a removal request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RemovalError {
    /// The stage is not playing.
    InvalidState,
    /// Remove mode is not active.
    NotInRemoveMode,
    /// The tile lies outside the grid.
    OutOfBounds,
    /// The tile hosts no unit.
    EmptyTile,
    /// The occupant is not owned by the user.
    NotRemovable,
}

/// Plain persisted summary of a stage instance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StageResult {
    /// Whether the stage was won.
    pub completed: bool,
    /// Sum of score values of defeated enemies.
    pub score: u32,
    /// Simulated seconds spent playing.
    pub elapsed_seconds: f32,
    /// Total energy the user gained during the stage.
    pub energy_total: f32,
}

#[cfg(test)]
mod tests {
    use super::{
        PlacementError, RemovalError, StageResult, StageState, TargetSides, Terrain, TileCoord,
        UnitId,
    };
    use glam::Vec2;
    use serde::{de::DeserializeOwned, Serialize};

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn stage_result_round_trips_through_bincode() {
        assert_round_trip(&StageResult {
            completed: true,
            score: 340,
            elapsed_seconds: 61.5,
            energy_total: 875.0,
        });
    }

    #[test]
    fn rejection_reasons_round_trip_through_bincode() {
        assert_round_trip(&PlacementError::InsufficientEnergy);
        assert_round_trip(&RemovalError::NotRemovable);
        assert_round_trip(&UnitId::new(12));
    }

    #[test]
    fn only_playing_opens_the_gate() {
        assert!(StageState::Playing.is_playing_and_unpaused());
        for state in [
            StageState::NotStarted,
            StageState::Paused,
            StageState::Won,
            StageState::Lost,
        ] {
            assert!(!state.is_playing_and_unpaused(), "{state:?} must be gated");
        }
        assert!(StageState::Won.is_terminal());
        assert!(StageState::Paused.is_active());
        assert!(!StageState::Lost.is_active());
    }

    #[test]
    fn tile_center_sits_in_the_middle_of_the_cell() {
        assert_eq!(TileCoord::new(2, 3).center(), Vec2::new(3.5, 2.5));
    }

    #[test]
    fn terrain_glyphs_parse() {
        assert_eq!(Terrain::from_glyph('L'), Some(Terrain::Land));
        assert_eq!(Terrain::from_glyph('~'), Some(Terrain::Water));
        assert_eq!(Terrain::from_glyph('#'), Some(Terrain::Metal));
        assert_eq!(Terrain::from_glyph('?'), None);
    }

    #[test]
    fn target_sides_report_presence() {
        assert!(!TargetSides::default().any());
        assert!(TargetSides::FRONT.any());
    }
}
