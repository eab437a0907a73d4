#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that acquires defense targets through row queries.

use action_stage_core::{
    Boundary, DefenseSnapshot, DefenseTarget, DefenseView, EnemyView, Side, StageState,
    TargetSides, Targeting,
};

/// Defense targeting system recomputing every defense's targets each step.
#[derive(Debug, Default)]
pub struct DefenseTargeting;

impl DefenseTargeting {
    /// Creates a new defense targeting system.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes the sides on which each defense currently sees a target.
    ///
    /// The output buffer is cleared before populating it. Defenses without
    /// any target are omitted.
    pub fn handle(
        &mut self,
        state: StageState,
        defenses: &DefenseView,
        enemies: &EnemyView,
        out: &mut Vec<DefenseTarget>,
    ) {
        out.clear();

        if !state.is_playing_and_unpaused() {
            return;
        }

        for defense in defenses.iter() {
            let sides = acquire(defense, enemies);
            if sides.any() {
                out.push(DefenseTarget {
                    unit: defense.id,
                    sides,
                });
            }
        }
    }
}

fn acquire(defense: &DefenseSnapshot, enemies: &EnemyView) -> TargetSides {
    let row = defense.row;
    let x = defense.position.x;
    let front = || enemies.any_in_row(row, x, Side::Right, Boundary::Inclusive, defense.range);

    match defense.targeting {
        Targeting::Forward => TargetSides {
            front: front(),
            back: false,
        },
        Targeting::FrontBack => TargetSides {
            front: front(),
            back: enemies.any_in_row(row, x, Side::Left, Boundary::Exclusive, defense.range),
        },
        Targeting::Area => TargetSides {
            front: defense.members > 0,
            back: false,
        },
    }
}
