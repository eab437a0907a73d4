use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
    time::Duration,
};

use action_stage_core::{
    BlasterProfile, Command, DefenseProfile, DefenseTarget, EnemyConfig, EnemyProfile, Event,
    FiringPattern, GridConfig, ProfileId, ProjectileProfile, StageConfig, TargetSides, TileCoord,
    UnitId, UnitProfile, UnitRole, UserConfig,
};
use action_stage_system_defense_targeting::DefenseTargeting;
use action_stage_world::{self as world, query, World};

const FORWARD: ProfileId = ProfileId::new(0);
const TWIN: ProfileId = ProfileId::new(1);
const CRAWLER: ProfileId = ProfileId::new(2);

#[test]
fn deterministic_replay_produces_identical_targets() {
    let first = replay(scripted_commands());
    let second = replay(scripted_commands());

    assert_eq!(first, second, "replay diverged between runs");
    assert_eq!(first.fingerprint(), second.fingerprint());
    assert!(
        first.assignments.iter().any(|targets| !targets.is_empty()),
        "expected at least one acquisition"
    );
}

#[test]
fn front_back_blaster_sees_enemies_that_walked_past() {
    let mut config = stage();
    config.units[TWIN.get() as usize].blocks_enemies = false;
    let mut world = World::new(config);
    let mut events = Vec::new();
    world::apply(&mut world, Command::StartStage, &mut events);
    world::apply(
        &mut world,
        Command::PlaceUnit {
            profile: TWIN,
            tile: TileCoord::new(1, 5),
        },
        &mut events,
    );
    let twin = placed(&events).expect("twin placed");
    let spawn = Command::SpawnEnemy {
        profile: CRAWLER,
        row: 1,
    };
    let mut system = DefenseTargeting::new();

    world::apply(&mut world, spawn.clone(), &mut events);
    assert_eq!(sides_of(&mut system, &world, twin), TargetSides::FRONT);

    for _ in 0..16 {
        world::apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(250),
            },
            &mut events,
        );
    }
    assert_eq!(
        sides_of(&mut system, &world, twin),
        TargetSides {
            front: false,
            back: true,
        }
    );

    world::apply(&mut world, spawn, &mut events);
    assert_eq!(
        sides_of(&mut system, &world, twin),
        TargetSides {
            front: true,
            back: true,
        }
    );
}

#[test]
fn empty_rows_yield_no_targets() {
    let mut world = World::new(stage());
    let mut events = Vec::new();
    world::apply(&mut world, Command::StartStage, &mut events);
    world::apply(
        &mut world,
        Command::PlaceUnit {
            profile: FORWARD,
            tile: TileCoord::new(0, 0),
        },
        &mut events,
    );
    world::apply(
        &mut world,
        Command::SpawnEnemy {
            profile: CRAWLER,
            row: 2,
        },
        &mut events,
    );

    let mut system = DefenseTargeting::new();
    let mut targets = Vec::new();
    system.handle(
        query::stage_state(&world),
        &query::defense_view(&world),
        &query::enemy_view(&world),
        &mut targets,
    );
    assert!(targets.is_empty());
}

fn sides_of(system: &mut DefenseTargeting, world: &World, unit: UnitId) -> TargetSides {
    let mut targets = Vec::new();
    system.handle(
        query::stage_state(world),
        &query::defense_view(world),
        &query::enemy_view(world),
        &mut targets,
    );
    targets
        .iter()
        .find(|target| target.unit == unit)
        .map(|target| target.sides)
        .unwrap_or_default()
}

fn placed(events: &[Event]) -> Option<UnitId> {
    events.iter().find_map(|event| match event {
        Event::UnitPlaced { unit, .. } => Some(*unit),
        _ => None,
    })
}

fn stage() -> StageConfig {
    StageConfig {
        grid: GridConfig {
            rows: 3,
            columns: 8,
            terrain: Vec::new(),
            unusable: Vec::new(),
        },
        user: UserConfig {
            starting_energy: 100.0,
            generation_period_secs: 0.0,
            generation_amount: 0.0,
        },
        enemy: EnemyConfig {
            energy_max: 100.0,
            stage_length_secs: 100.0,
        },
        night_starts_at: 1.0,
        units: vec![
            UnitProfile::new(
                "pea",
                10.0,
                UnitRole::Defense(DefenseProfile::blaster(
                    1.0,
                    BlasterProfile::new(FiringPattern::Forward, ProjectileProfile::new(5.0)),
                )),
            ),
            UnitProfile::new(
                "twin",
                10.0,
                UnitRole::Defense(DefenseProfile::blaster(
                    1.0,
                    BlasterProfile::new(FiringPattern::FrontBack, ProjectileProfile::new(5.0)),
                )),
            ),
            UnitProfile::new(
                "crawler",
                30.0,
                UnitRole::Enemy(EnemyProfile {
                    speed: 1.0,
                    attack_interval_secs: 1.0,
                    energy_drain_per_damage: 0.0,
                    score_value: 1,
                }),
            ),
        ],
    }
}

fn scripted_commands() -> Vec<Command> {
    let step = Command::Tick {
        dt: Duration::from_millis(250),
    };
    vec![
        Command::StartStage,
        Command::PlaceUnit {
            profile: FORWARD,
            tile: TileCoord::new(0, 1),
        },
        Command::PlaceUnit {
            profile: TWIN,
            tile: TileCoord::new(1, 4),
        },
        step.clone(),
        Command::SpawnEnemy {
            profile: CRAWLER,
            row: 0,
        },
        Command::SpawnEnemy {
            profile: CRAWLER,
            row: 1,
        },
        step.clone(),
        step.clone(),
        Command::SetPaused { paused: true },
        step.clone(),
        Command::SetPaused { paused: false },
        step,
    ]
}

fn replay(commands: Vec<Command>) -> Replay {
    let mut world = World::new(stage());
    let mut system = DefenseTargeting::new();
    let mut assignments = Vec::with_capacity(commands.len());
    let mut events = Vec::new();

    for command in commands {
        events.clear();
        world::apply(&mut world, command, &mut events);

        let mut targets = Vec::new();
        system.handle(
            query::stage_state(&world),
            &query::defense_view(&world),
            &query::enemy_view(&world),
            &mut targets,
        );
        assignments.push(targets);
    }

    Replay { assignments }
}

#[derive(Debug, PartialEq)]
struct Replay {
    assignments: Vec<Vec<DefenseTarget>>,
}

impl Replay {
    fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        for targets in &self.assignments {
            targets.len().hash(&mut hasher);
            for target in targets {
                target.unit.hash(&mut hasher);
                target.sides.hash(&mut hasher);
            }
        }
        hasher.finish()
    }
}
