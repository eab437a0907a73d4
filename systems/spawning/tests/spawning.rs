use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
    time::Duration,
};

use action_stage_core::{
    Command, EnemyConfig, EnemyProfile, Event, GridConfig, PlayerSide, ProfileId, StageConfig,
    UnitProfile, UnitRole, UserConfig,
};
use action_stage_system_spawning::{Config, Spawning, WaveEntry};
use action_stage_world::{self as world, query, World};

const CRAWLER: ProfileId = ProfileId::new(0);

fn stage() -> StageConfig {
    StageConfig {
        grid: GridConfig {
            rows: 4,
            columns: 9,
            terrain: Vec::new(),
            unusable: Vec::new(),
        },
        user: UserConfig {
            starting_energy: 0.0,
            generation_period_secs: 0.0,
            generation_amount: 0.0,
        },
        enemy: EnemyConfig {
            energy_max: 100.0,
            stage_length_secs: 120.0,
        },
        night_starts_at: 1.0,
        units: vec![UnitProfile::new(
            "crawler",
            20.0,
            UnitRole::Enemy(EnemyProfile {
                speed: 0.5,
                attack_interval_secs: 1.0,
                energy_drain_per_damage: 0.0,
                score_value: 1,
            }),
        )],
    }
}

fn schedule() -> Vec<WaveEntry> {
    vec![
        WaveEntry {
            at: Duration::from_secs(1),
            profile: CRAWLER,
            row: Some(3),
        },
        WaveEntry {
            at: Duration::from_secs(2),
            profile: CRAWLER,
            row: None,
        },
        WaveEntry {
            at: Duration::from_secs(2),
            profile: CRAWLER,
            row: None,
        },
        WaveEntry {
            at: Duration::from_secs(4),
            profile: CRAWLER,
            row: None,
        },
    ]
}

fn process_spawning(world: &mut World, spawning: &mut Spawning, steps: usize) -> Vec<Event> {
    let mut log = Vec::new();
    for _ in 0..steps {
        let mut events = Vec::new();
        world::apply(
            world,
            Command::Tick {
                dt: Duration::from_millis(250),
            },
            &mut events,
        );

        let mut commands = Vec::new();
        let (rows, _) = query::grid_dimensions(world);
        spawning.handle(&events, query::stage_state(world), rows, &mut commands);
        for command in commands {
            world::apply(world, command, &mut events);
        }
        log.extend(events);
    }
    log
}

fn spawned_rows(events: &[Event]) -> Vec<u32> {
    events
        .iter()
        .filter_map(|event| match event {
            Event::EnemySpawned { row, .. } => Some(*row),
            _ => None,
        })
        .collect()
}

#[test]
fn scheduled_enemies_enter_the_world() {
    let mut world = World::new(stage());
    let mut events = Vec::new();
    world::apply(&mut world, Command::StartStage, &mut events);
    let mut spawning = Spawning::new(Config::new(schedule(), 0x5eed));

    let log = process_spawning(&mut world, &mut spawning, 20);

    let rows = spawned_rows(&log);
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0], 3);
    assert!(rows.iter().all(|row| *row < 4));
    assert_eq!(query::roster(&world, PlayerSide::Enemy).len(), 4);
    assert_eq!(spawning.remaining(), 0);
}

#[test]
fn not_started_stage_spawns_nothing() {
    let mut world = World::new(stage());
    let mut spawning = Spawning::new(Config::new(schedule(), 0x5eed));

    let log = process_spawning(&mut world, &mut spawning, 20);

    assert!(spawned_rows(&log).is_empty());
    assert_eq!(spawning.remaining(), 4);
}

#[test]
fn deterministic_replay_produces_identical_spawns() {
    let fingerprint = |seed| {
        let mut world = World::new(stage());
        let mut events = Vec::new();
        world::apply(&mut world, Command::StartStage, &mut events);
        let mut spawning = Spawning::new(Config::new(schedule(), seed));
        let log = process_spawning(&mut world, &mut spawning, 24);

        let mut hasher = DefaultHasher::new();
        for event in &log {
            if let Event::EnemySpawned { unit, row, .. } = event {
                unit.hash(&mut hasher);
                row.hash(&mut hasher);
            }
        }
        hasher.finish()
    };

    assert_eq!(fingerprint(0x1234_5678), fingerprint(0x1234_5678));
}
