#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that emits attack commands from targeting data.

use action_stage_core::{Command, DefenseTarget, DefenseView, StageState};

/// Defense combat system that queues attack commands for ready defenses.
#[derive(Debug, Default)]
pub struct DefenseCombat {
    scratch: Vec<Command>,
}

impl DefenseCombat {
    /// Creates a new defense combat system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits `Command::PerformAttack` entries for defenses whose cooldown
    /// elapsed and that acquired at least one target.
    pub fn handle(
        &mut self,
        state: StageState,
        defenses: &DefenseView,
        targets: &[DefenseTarget],
        out: &mut Vec<Command>,
    ) {
        if !state.is_playing_and_unpaused() || targets.is_empty() {
            return;
        }

        self.scratch.clear();

        for target in targets {
            if !target.sides.any() {
                continue;
            }
            if defenses
                .get(target.unit)
                .map_or(false, |snapshot| snapshot.ready)
            {
                self.scratch.push(Command::PerformAttack {
                    unit: target.unit,
                    sides: target.sides,
                });
            }
        }

        if self.scratch.is_empty() {
            return;
        }

        out.reserve(self.scratch.len());
        out.append(&mut self.scratch);
    }
}
