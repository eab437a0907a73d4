//! Read-only views systems consume, including the row-query surface used
//! for target acquisition.

use glam::Vec2;

use crate::{Boundary, ProfileId, Side, TargetSides, UnitId};

/// Immutable representation of a single enemy unit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemySnapshot {
    /// Identifier of the enemy.
    pub id: UnitId,
    /// Profile the enemy was created from.
    pub profile: ProfileId,
    /// Row the enemy walks along.
    pub row: u32,
    /// Position in stage space.
    pub position: Vec2,
    /// Collision radius in tiles.
    pub radius: f32,
    /// Remaining health.
    pub health: f32,
    /// Whether the enemy already died this step.
    pub dead: bool,
}

impl EnemySnapshot {
    fn is_live(&self) -> bool {
        !self.dead && self.health > 0.0
    }
}

/// Read-only snapshot of every enemy on the stage.
#[derive(Clone, Debug, Default)]
pub struct EnemyView {
    rows: u32,
    snapshots: Vec<EnemySnapshot>,
}

impl EnemyView {
    /// Creates a new enemy view for a grid with `rows` rows.
    #[must_use]
    pub fn from_snapshots(rows: u32, mut snapshots: Vec<EnemySnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { rows, snapshots }
    }

    /// Iterator over the captured snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &EnemySnapshot> {
        self.snapshots.iter()
    }

    /// Iterator over live enemies walking along `row`.
    pub fn live_in_row(&self, row: u32) -> impl Iterator<Item = &EnemySnapshot> {
        self.snapshots
            .iter()
            .filter(move |snapshot| snapshot.row == row && snapshot.is_live())
    }

    /// Reports whether a live enemy in `row` lies on `side` of `x`.
    ///
    /// `boundary` decides whether an enemy exactly at `x` counts, and `range`
    /// limits the horizontal distance. Rows outside the grid answer `false`.
    #[must_use]
    pub fn any_in_row(
        &self,
        row: u32,
        x: f32,
        side: Side,
        boundary: Boundary,
        range: Option<f32>,
    ) -> bool {
        if row >= self.rows {
            return false;
        }

        self.live_in_row(row).any(|snapshot| {
            let offset = snapshot.position.x - x;
            let on_side = match (side, boundary) {
                (Side::Right, Boundary::Inclusive) => offset >= 0.0,
                (Side::Right, Boundary::Exclusive) => offset > 0.0,
                (Side::Left, Boundary::Inclusive) => offset <= 0.0,
                (Side::Left, Boundary::Exclusive) => offset < 0.0,
            };
            on_side && range.map_or(true, |range| offset.abs() <= range)
        })
    }
}

/// Target-acquisition geometry of a defense.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Targeting {
    /// Looks to the right only.
    Forward,
    /// Looks both right and left.
    FrontBack,
    /// Targets whatever overlaps its trigger zone.
    Area,
}

/// Immutable representation of a single defense unit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DefenseSnapshot {
    /// Identifier of the defense.
    pub id: UnitId,
    /// Row hosting the defense.
    pub row: u32,
    /// Position in stage space.
    pub position: Vec2,
    /// Whether the attack cooldown reached zero.
    pub ready: bool,
    /// Acquisition geometry.
    pub targeting: Targeting,
    /// Maximum targeting distance in tiles, if limited.
    pub range: Option<f32>,
    /// Number of enemies overlapping a trap's trigger zone.
    pub members: usize,
}

/// Read-only snapshot of every live defense unit.
#[derive(Clone, Debug, Default)]
pub struct DefenseView {
    snapshots: Vec<DefenseSnapshot>,
}

impl DefenseView {
    /// Creates a new defense view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<DefenseSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &DefenseSnapshot> {
        self.snapshots.iter()
    }

    /// Finds the snapshot of a specific defense.
    #[must_use]
    pub fn get(&self, id: UnitId) -> Option<&DefenseSnapshot> {
        self.snapshots
            .binary_search_by_key(&id, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }
}

/// Targets acquired by a defense during one step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DefenseTarget {
    /// Defense that acquired the targets.
    pub unit: UnitId,
    /// Sides holding targets.
    pub sides: TargetSides,
}

/// Immutable representation of a trap's trigger zone and membership table.
#[derive(Clone, Debug, PartialEq)]
pub struct TrapSnapshot {
    /// Identifier of the trap.
    pub id: UnitId,
    /// Row hosting the trap.
    pub row: u32,
    /// Position in stage space.
    pub position: Vec2,
    /// Half width of the trigger zone.
    pub half_width: f32,
    /// Enemies currently recorded as overlapping, in ascending order.
    pub members: Vec<UnitId>,
}

/// Read-only snapshot of every live trap.
#[derive(Clone, Debug, Default)]
pub struct TrapView {
    snapshots: Vec<TrapSnapshot>,
}

impl TrapView {
    /// Creates a new trap view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<TrapSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &TrapSnapshot> {
        self.snapshots.iter()
    }
}
