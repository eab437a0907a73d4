#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic spawning system responsible for emitting enemy spawn commands.

use std::time::Duration;

use action_stage_core::{Command, Event, ProfileId, StageState};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Single scheduled enemy spawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WaveEntry {
    /// Simulated time at which the enemy enters the stage.
    pub at: Duration,
    /// Enemy profile to instantiate.
    pub profile: ProfileId,
    /// Row the enemy walks along. `None` picks a row at random.
    pub row: Option<u32>,
}

/// Configuration parameters required to construct the spawning system.
#[derive(Clone, Debug)]
pub struct Config {
    waves: Vec<WaveEntry>,
    rng_seed: u64,
}

impl Config {
    /// Creates a new configuration from a wave schedule and a seed.
    #[must_use]
    pub fn new(waves: Vec<WaveEntry>, rng_seed: u64) -> Self {
        Self { waves, rng_seed }
    }
}

/// Pure system that emits spawn commands as simulated time passes.
#[derive(Debug)]
pub struct Spawning {
    waves: Vec<WaveEntry>,
    next: usize,
    elapsed: Duration,
    rng: ChaCha8Rng,
}

impl Spawning {
    /// Creates a new spawning system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let mut waves = config.waves;
        waves.sort_by_key(|entry| entry.at);
        Self {
            waves,
            next: 0,
            elapsed: Duration::ZERO,
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
        }
    }

    /// Number of scheduled spawns not yet emitted.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.waves.len() - self.next
    }

    /// Consumes events to emit the spawns that came due.
    ///
    /// Only time reported through `TimeAdvanced` counts, so the schedule
    /// freezes whenever the world stops advancing.
    pub fn handle(
        &mut self,
        events: &[Event],
        state: StageState,
        rows: u32,
        out: &mut Vec<Command>,
    ) {
        if !state.is_playing_and_unpaused() || rows == 0 {
            return;
        }

        let mut accumulated = Duration::ZERO;
        for event in events {
            if let Event::TimeAdvanced { dt } = event {
                accumulated = accumulated.saturating_add(*dt);
            }
        }
        self.elapsed = self.elapsed.saturating_add(accumulated);

        while let Some(entry) = self.waves.get(self.next).copied() {
            if entry.at > self.elapsed {
                break;
            }
            self.next += 1;

            let row = match entry.row {
                Some(row) if row < rows => row,
                Some(_) => continue,
                None => self.rng.gen_range(0..rows),
            };
            out.push(Command::SpawnEnemy {
                profile: entry.profile,
                row,
            });
        }
    }
}
