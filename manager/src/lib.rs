#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Orchestrator owning one stage instance and the systems that drive it.
//!
//! The manager applies a `Tick` to the world each step and then runs the
//! pure systems in a fixed order (trap overlap, defense targeting, defense
//! combat, spawning), feeding their commands straight back into the world.

mod hooks;
mod stage_file;

use std::time::Duration;

use action_stage_core::{Command, DefenseTarget, Event, StageResult, StageState};
use action_stage_system_defense_combat::DefenseCombat;
use action_stage_system_defense_targeting::DefenseTargeting;
use action_stage_system_spawning::{Config as SpawningConfig, Spawning};
use action_stage_system_trap_overlap::TrapOverlap;
use action_stage_world::{self as world, query, World};
use tracing::{debug, info, warn};

pub use hooks::{HookError, PresentationHooks, SilentHooks};
pub use stage_file::{LoadError, StageDefinition};

/// Owns the world, its systems and the presentation hooks of one stage.
pub struct ActionManager {
    definition: StageDefinition,
    world: World,
    overlap: TrapOverlap,
    targeting: DefenseTargeting,
    combat: DefenseCombat,
    spawning: Spawning,
    hooks: Box<dyn PresentationHooks>,
    targets: Vec<DefenseTarget>,
    commands: Vec<Command>,
    events: Vec<Event>,
}

impl std::fmt::Debug for ActionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionManager")
            .field("state", &query::stage_state(&self.world))
            .field("elapsed", &query::elapsed(&self.world))
            .field("pending_events", &self.events.len())
            .finish_non_exhaustive()
    }
}

impl ActionManager {
    /// Builds a not-started stage instance from the provided definition.
    #[must_use]
    pub fn new(definition: StageDefinition) -> Self {
        let world = World::new(definition.config.clone());
        let spawning = new_spawning(&definition);
        Self {
            definition,
            world,
            overlap: TrapOverlap::new(),
            targeting: DefenseTargeting::new(),
            combat: DefenseCombat::new(),
            spawning,
            hooks: Box::new(SilentHooks),
            targets: Vec::new(),
            commands: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Replaces the presentation hooks.
    #[must_use]
    pub fn with_hooks(mut self, hooks: impl PresentationHooks + 'static) -> Self {
        self.hooks = Box::new(hooks);
        self
    }

    /// Read-only access to the world for queries.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Current stage state.
    #[must_use]
    pub fn state(&self) -> StageState {
        query::stage_state(&self.world)
    }

    /// Reports whether the stage is playing and not paused.
    #[must_use]
    pub fn is_stage_playing_and_game_unpaused(&self) -> bool {
        query::is_stage_playing_and_unpaused(&self.world)
    }

    /// Snapshot of the values persisted for this stage instance.
    #[must_use]
    pub fn result(&self) -> StageResult {
        query::result(&self.world)
    }

    /// Number of scheduled enemies that have not entered yet.
    #[must_use]
    pub fn pending_spawns(&self) -> usize {
        self.spawning.remaining()
    }

    /// Begins play.
    pub fn start(&mut self) {
        self.submit(Command::StartStage);
    }

    /// Pauses or resumes play.
    pub fn set_paused(&mut self, paused: bool) {
        self.submit(Command::SetPaused { paused });
    }

    /// Flips between playing and paused.
    pub fn toggle_pause(&mut self) {
        self.submit(Command::TogglePause);
    }

    /// Tears the stage down, returning the result captured beforehand.
    ///
    /// The manager is left holding a fresh not-started instance of the
    /// same stage.
    pub fn exit(&mut self) -> StageResult {
        let result = self.result();
        self.submit(Command::ExitStage);
        self.spawning = new_spawning(&self.definition);
        info!(
            completed = result.completed,
            score = result.score,
            "stage exited"
        );
        result
    }

    /// Applies a single command on behalf of the user.
    pub fn submit(&mut self, command: Command) {
        let mut events = Vec::new();
        world::apply(&mut self.world, command, &mut events);
        self.record(events);
    }

    /// Advances the stage by one fixed step.
    pub fn step(&mut self, dt: Duration) {
        let mut tick_events = Vec::new();
        world::apply(&mut self.world, Command::Tick { dt }, &mut tick_events);
        if tick_events.is_empty() {
            return;
        }
        self.record(tick_events.clone());

        self.overlap.handle(
            query::stage_state(&self.world),
            &query::trap_view(&self.world),
            &query::enemy_view(&self.world),
            &mut self.commands,
        );
        self.flush_commands();

        self.targeting.handle(
            query::stage_state(&self.world),
            &query::defense_view(&self.world),
            &query::enemy_view(&self.world),
            &mut self.targets,
        );
        self.combat.handle(
            query::stage_state(&self.world),
            &query::defense_view(&self.world),
            &self.targets,
            &mut self.commands,
        );
        self.flush_commands();

        let (rows, _) = query::grid_dimensions(&self.world);
        self.spawning.handle(
            &tick_events,
            query::stage_state(&self.world),
            rows,
            &mut self.commands,
        );
        self.flush_commands();
    }

    /// Runs fixed steps until the stage concludes or `limit` of simulated
    /// time has passed. Returns the number of steps taken.
    ///
    /// A zero `dt` never advances time, so no step is taken.
    pub fn run_until_concluded(&mut self, dt: Duration, limit: Duration) -> u64 {
        if dt.is_zero() {
            warn!("refusing to run with a zero time step");
            return 0;
        }

        let mut steps = 0;
        let mut simulated = Duration::ZERO;
        while self.is_stage_playing_and_game_unpaused() && simulated < limit {
            self.step(dt);
            simulated = simulated.saturating_add(dt);
            steps += 1;
        }
        debug!(steps, state = ?self.state(), "run finished");
        steps
    }

    /// Removes and returns every event recorded since the previous drain.
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    fn flush_commands(&mut self) {
        for command in std::mem::take(&mut self.commands) {
            let mut events = Vec::new();
            world::apply(&mut self.world, command, &mut events);
            self.record(events);
        }
    }

    fn record(&mut self, events: Vec<Event>) {
        hooks::dispatch(self.hooks.as_mut(), &events);
        self.events.extend(events);
    }
}

fn new_spawning(definition: &StageDefinition) -> Spawning {
    Spawning::new(SpawningConfig::new(
        definition.waves.clone(),
        definition.seed,
    ))
}
