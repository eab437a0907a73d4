#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for the Action Stage.

mod combat;
mod placement;
mod players;
mod projectiles;
mod simulation;
mod stage;
mod tiles;
mod timer;
mod units;

use std::{collections::BTreeMap, time::Duration};

use action_stage_core::{
    Command, Event, ProjectileId, Selection, StageConfig, StageResult, StageState, UnitId,
};
use tracing::{debug, info};

use crate::{
    players::{EnemyPlayer, UserPlayer},
    projectiles::Projectile,
    stage::StageMachine,
    tiles::TileGrid,
    units::Unit,
};

/// Represents the authoritative state of one stage instance.
#[derive(Debug)]
pub struct World {
    config: StageConfig,
    stage: StageMachine,
    tiles: TileGrid,
    units: BTreeMap<UnitId, Unit>,
    projectiles: BTreeMap<ProjectileId, Projectile>,
    user: UserPlayer,
    enemy: EnemyPlayer,
    elapsed: Duration,
    score: u32,
    next_unit_id: u32,
    next_projectile_id: u32,
}

impl World {
    /// Creates a fresh, not-started stage instance from the provided configuration.
    #[must_use]
    pub fn new(config: StageConfig) -> Self {
        Self {
            stage: StageMachine::new(),
            tiles: TileGrid::from_config(&config),
            units: BTreeMap::new(),
            projectiles: BTreeMap::new(),
            user: UserPlayer::from_config(&config.user),
            enemy: EnemyPlayer::from_config(&config.enemy),
            elapsed: Duration::ZERO,
            score: 0,
            next_unit_id: 0,
            next_projectile_id: 0,
            config,
        }
    }

    /// Single gating predicate for every time-based or state-changing step.
    fn gate_open(&self) -> bool {
        self.stage.state().is_playing_and_unpaused()
    }

    fn day_night(&self) -> f32 {
        let length = self.config.enemy.stage_length_secs;
        if length <= 0.0 {
            return 1.0;
        }
        (self.elapsed.as_secs_f32() / length).clamp(0.0, 1.0)
    }

    fn is_night(&self) -> bool {
        self.day_night() >= self.config.night_starts_at
    }

    fn result(&self) -> StageResult {
        StageResult {
            completed: self.stage.state() == StageState::Won,
            score: self.score,
            elapsed_seconds: self.elapsed.as_secs_f32(),
            energy_total: self.user.energy_total(),
        }
    }

    fn set_paused(&mut self, paused: bool, out_events: &mut Vec<Event>) {
        if self.stage.set_paused(paused) {
            info!(paused, "stage pause toggled");
            out_events.push(Event::StageStateChanged {
                state: self.stage.state(),
            });
        }
    }

    fn reap_dead(&mut self) {
        self.units.retain(|_, unit| unit.is_live());
    }
}

fn next_id(counter: &mut u32) -> u32 {
    let id = *counter;
    *counter = counter.wrapping_add(1);
    id
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ConfigureStage { config } => {
            *world = World::new(*config);
            out_events.push(Event::StageConfigured {
                rows: world.tiles.rows(),
                columns: world.tiles.columns(),
            });
        }
        Command::StartStage => {
            if world.stage.start() {
                info!("stage started");
                out_events.push(Event::StageStateChanged {
                    state: world.stage.state(),
                });
            }
        }
        Command::SetPaused { paused } => world.set_paused(paused, out_events),
        Command::TogglePause => {
            let paused = world.stage.state() == StageState::Playing;
            world.set_paused(paused, out_events);
        }
        Command::ExitStage => {
            let result = world.result();
            info!(score = result.score, "stage exited");
            let config = world.config.clone();
            *world = World::new(config);
            out_events.push(Event::StageExited { result });
            out_events.push(Event::StageStateChanged {
                state: world.stage.state(),
            });
        }
        Command::Tick { dt } => world.tick(dt, out_events),
        Command::SelectUnit { profile } => world.select(Selection::Place(profile), out_events),
        Command::SelectRemoveMode => world.select(Selection::Remove, out_events),
        Command::ClearSelection => world.select(Selection::Empty, out_events),
        Command::PlaceUnit { profile, tile } => {
            if let Err(reason) = world.place_unit(profile, tile, out_events) {
                debug!(?reason, profile = profile.get(), "placement rejected");
                out_events.push(Event::PlacementRejected {
                    profile: Some(profile),
                    tile,
                    reason,
                });
            }
        }
        Command::PlaceSelected { tile } => {
            if let Err((profile, reason)) = world.place_selected(tile, out_events) {
                debug!(?reason, "placement rejected");
                out_events.push(Event::PlacementRejected {
                    profile,
                    tile,
                    reason,
                });
            }
        }
        Command::RemoveUnit { tile } => {
            if let Err(reason) = world.remove_unit(tile, out_events) {
                debug!(?reason, "removal rejected");
                out_events.push(Event::RemovalRejected { tile, reason });
            }
        }
        Command::SpawnEnemy { profile, row } => {
            if world.spawn_enemy(profile, row, out_events).is_none() {
                debug!(profile = profile.get(), row, "enemy spawn ignored");
            }
        }
        Command::PerformAttack { unit, sides } => world.perform_attack(unit, sides, out_events),
        Command::BeginOverlap { trap, enemy } => world.begin_overlap(trap, enemy),
        Command::EndOverlap { trap, enemy } => world.end_overlap(trap, enemy),
    }

    world.reap_dead();
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use action_stage_core::{
        Boundary, DefenseSnapshot, DefenseView, EnemySnapshot, EnemyView, FiringPattern,
        PlayerSide, ProfileId, ProjectileId, Selection, Side, StageConfig, StageResult,
        StageState, Targeting, TileCoord, TileSnapshot, TrapSnapshot, TrapView, UnitId, UnitKind,
    };
    use glam::Vec2;

    use super::World;
    use crate::units::Payload;

    /// Current lifecycle state of the stage.
    #[must_use]
    pub fn stage_state(world: &World) -> StageState {
        world.stage.state()
    }

    /// Reports whether time-based state may advance.
    #[must_use]
    pub fn is_stage_playing_and_unpaused(world: &World) -> bool {
        world.gate_open()
    }

    /// Configuration the stage instance was built from.
    #[must_use]
    pub fn config(world: &World) -> &StageConfig {
        &world.config
    }

    /// Number of rows and columns of the tile grid.
    #[must_use]
    pub fn grid_dimensions(world: &World) -> (u32, u32) {
        (world.tiles.rows(), world.tiles.columns())
    }

    /// Snapshot of a single tile. Tiles outside the grid are absent.
    #[must_use]
    pub fn tile(world: &World, coord: TileCoord) -> Option<TileSnapshot> {
        world.tiles.snapshot(coord)
    }

    /// Occupant of every tile of `row`, ordered by column.
    ///
    /// Rows outside the grid yield an empty vector.
    #[must_use]
    pub fn row_occupancy(world: &World, row: u32) -> Vec<Option<UnitId>> {
        if row >= world.tiles.rows() {
            return Vec::new();
        }
        (0..world.tiles.columns())
            .map(|column| world.tiles.occupant(TileCoord::new(row, column)))
            .collect()
    }

    /// Reports whether the tile hosts a unit the user may remove.
    #[must_use]
    pub fn is_removable_by_user(world: &World, coord: TileCoord) -> bool {
        world
            .tiles
            .occupant(coord)
            .map_or(false, |unit| world.user.units.contains(&unit))
    }

    /// Reports whether the user can currently pay for a profile.
    #[must_use]
    pub fn can_afford(world: &World, profile: ProfileId) -> bool {
        world
            .config
            .profile(profile)
            .map_or(false, |profile| world.user.can_afford(profile.energy_cost))
    }

    /// Spendable energy of the user.
    #[must_use]
    pub fn user_energy(world: &World) -> f32 {
        world.user.energy()
    }

    /// Energy the user gained since the stage began.
    #[must_use]
    pub fn energy_total(world: &World) -> f32 {
        world.user.energy_total()
    }

    /// Remaining energy of the enemy player.
    #[must_use]
    pub fn enemy_energy(world: &World) -> f32 {
        world.enemy.energy()
    }

    /// Current user selection.
    #[must_use]
    pub fn selection(world: &World) -> Selection {
        world.user.selection
    }

    /// Roster of live units owned by `side`, in ascending order.
    #[must_use]
    pub fn roster(world: &World, side: PlayerSide) -> Vec<UnitId> {
        let roster = match side {
            PlayerSide::User => &world.user.units,
            PlayerSide::Enemy => &world.enemy.units,
        };
        roster.iter().copied().collect()
    }

    /// Snapshot of a single unit, if it still exists.
    #[must_use]
    pub fn unit(world: &World, id: UnitId) -> Option<UnitSnapshot> {
        world.units.get(&id).map(|unit| UnitSnapshot {
            id: unit.id,
            profile: unit.profile,
            kind: unit.kind,
            owner: unit.owner,
            tile: unit.tile,
            row: unit.row,
            position: unit.position,
            health: unit.health,
            dead: unit.dead,
        })
    }

    /// Captures a read-only view of the enemy units on the stage.
    #[must_use]
    pub fn enemy_view(world: &World) -> EnemyView {
        let snapshots = world
            .units
            .values()
            .filter(|unit| unit.kind == UnitKind::Enemy)
            .map(|unit| EnemySnapshot {
                id: unit.id,
                profile: unit.profile,
                row: unit.row,
                position: unit.position,
                radius: unit.radius,
                health: unit.health,
                dead: unit.dead,
            })
            .collect();
        EnemyView::from_snapshots(world.tiles.rows(), snapshots)
    }

    /// Reports whether a live enemy in `row` lies on `side` of `x`.
    #[must_use]
    pub fn enemy_in_row(world: &World, row: u32, x: f32, side: Side, boundary: Boundary) -> bool {
        enemy_view(world).any_in_row(row, x, side, boundary, None)
    }

    /// Captures a read-only view of every live defense unit.
    #[must_use]
    pub fn defense_view(world: &World) -> DefenseView {
        let snapshots = world
            .units
            .values()
            .filter(|unit| unit.is_live())
            .filter_map(|unit| {
                let defense = unit.defense()?;
                let (targeting, range, members) = match &defense.payload {
                    Payload::Blaster(blaster) => {
                        let targeting = match blaster.profile.pattern {
                            FiringPattern::FrontBack => Targeting::FrontBack,
                            FiringPattern::Forward | FiringPattern::Spread { .. } => {
                                Targeting::Forward
                            }
                        };
                        (targeting, blaster.profile.range, 0)
                    }
                    Payload::Trap(trap) => (Targeting::Area, None, trap.members.len()),
                };
                Some(DefenseSnapshot {
                    id: unit.id,
                    row: unit.row,
                    position: unit.position,
                    ready: defense.is_ready(),
                    targeting,
                    range,
                    members,
                })
            })
            .collect();
        DefenseView::from_snapshots(snapshots)
    }

    /// Captures a read-only view of every live trap and its membership table.
    #[must_use]
    pub fn trap_view(world: &World) -> TrapView {
        let snapshots = world
            .units
            .values()
            .filter(|unit| unit.is_live())
            .filter_map(|unit| {
                let trap = unit.trap()?;
                Some(TrapSnapshot {
                    id: unit.id,
                    row: unit.row,
                    position: unit.position,
                    half_width: trap.profile.trigger_half_width,
                    members: trap.members.iter().copied().collect(),
                })
            })
            .collect();
        TrapView::from_snapshots(snapshots)
    }

    /// Number of member hits a trap delivered so far.
    #[must_use]
    pub fn trap_hits(world: &World, trap: UnitId) -> Option<u32> {
        world
            .units
            .get(&trap)
            .and_then(|unit| unit.trap())
            .map(|trap| trap.hits)
    }

    /// Snapshots of the projectiles in flight, in ascending id order.
    #[must_use]
    pub fn projectiles(world: &World) -> Vec<ProjectileSnapshot> {
        world
            .projectiles
            .values()
            .map(|projectile| ProjectileSnapshot {
                id: projectile.id,
                shooter: projectile.shooter,
                position: projectile.position,
                direction: projectile.direction,
                hits: projectile.hits,
            })
            .collect()
    }

    /// Simulated time spent playing.
    #[must_use]
    pub fn elapsed(world: &World) -> Duration {
        world.elapsed
    }

    /// Day/night scalar between 0 (dawn) and 1 (end of the designed stage length).
    #[must_use]
    pub fn day_night(world: &World) -> f32 {
        world.day_night()
    }

    /// Reports whether night has fallen.
    #[must_use]
    pub fn is_night(world: &World) -> bool {
        world.is_night()
    }

    /// Sum of score values of defeated enemies.
    #[must_use]
    pub fn score(world: &World) -> u32 {
        world.score
    }

    /// Persistable summary of the stage instance.
    #[must_use]
    pub fn result(world: &World) -> StageResult {
        world.result()
    }

    /// Immutable representation of a single unit used for queries.
    #[derive(Clone, Copy, Debug, PartialEq)]
    pub struct UnitSnapshot {
        /// Identifier of the unit.
        pub id: UnitId,
        /// Profile the unit was created from.
        pub profile: ProfileId,
        /// Subtype of the unit.
        pub kind: UnitKind,
        /// Owning player; cleared on death.
        pub owner: Option<PlayerSide>,
        /// Tile hosting a placed unit.
        pub tile: Option<TileCoord>,
        /// Row the unit occupies.
        pub row: u32,
        /// Position in stage space.
        pub position: Vec2,
        /// Remaining health.
        pub health: f32,
        /// Whether the unit died during the current command.
        pub dead: bool,
    }

    /// Immutable representation of a projectile in flight.
    #[derive(Clone, Copy, Debug, PartialEq)]
    pub struct ProjectileSnapshot {
        /// Identifier of the projectile.
        pub id: ProjectileId,
        /// Unit that fired the projectile, while it lives.
        pub shooter: Option<UnitId>,
        /// Position in stage space.
        pub position: Vec2,
        /// Unit direction of travel.
        pub direction: Vec2,
        /// Number of damaging contacts so far.
        pub hits: u32,
    }
}
