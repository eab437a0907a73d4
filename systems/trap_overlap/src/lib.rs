#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure overlap-detection pass that keeps trap membership tables current.
//!
//! Each step the system compares the enemies geometrically inside a trap's
//! trigger zone with the membership table recorded by the world, and emits
//! `BeginOverlap`/`EndOverlap` commands for the difference.

use action_stage_core::{Command, EnemyView, StageState, TrapSnapshot, TrapView, UnitId};

/// Trap overlap system reusing a scratch buffer between steps.
#[derive(Debug, Default)]
pub struct TrapOverlap {
    overlapping: Vec<UnitId>,
}

impl TrapOverlap {
    /// Creates a new trap overlap system with an empty scratch buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits membership changes for every trap.
    pub fn handle(
        &mut self,
        state: StageState,
        traps: &TrapView,
        enemies: &EnemyView,
        out: &mut Vec<Command>,
    ) {
        if !state.is_playing_and_unpaused() {
            return;
        }

        for trap in traps.iter() {
            self.collect_overlapping(trap, enemies);

            for enemy in &self.overlapping {
                if trap.members.binary_search(enemy).is_err() {
                    out.push(Command::BeginOverlap {
                        trap: trap.id,
                        enemy: *enemy,
                    });
                }
            }
            for member in &trap.members {
                if self.overlapping.binary_search(member).is_err() {
                    out.push(Command::EndOverlap {
                        trap: trap.id,
                        enemy: *member,
                    });
                }
            }
        }
    }

    fn collect_overlapping(&mut self, trap: &TrapSnapshot, enemies: &EnemyView) {
        self.overlapping.clear();
        self.overlapping.extend(
            enemies
                .live_in_row(trap.row)
                .filter(|enemy| {
                    (enemy.position.x - trap.position.x).abs() <= trap.half_width + enemy.radius
                })
                .map(|enemy| enemy.id),
        );
        self.overlapping.sort_unstable();
    }
}
