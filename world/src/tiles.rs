//! Tile grid with terrain, overlay and occupancy bookkeeping.

use action_stage_core::{StageConfig, Terrain, TileCoord, TileOverlay, TileSnapshot, UnitId};

#[derive(Clone, Debug)]
struct Tile {
    terrain: Terrain,
    overlay: TileOverlay,
    occupant: Option<UnitId>,
}

/// Dense row-major grid of tiles.
#[derive(Clone, Debug)]
pub(crate) struct TileGrid {
    rows: u32,
    columns: u32,
    tiles: Vec<Tile>,
}

impl TileGrid {
    pub(crate) fn from_config(config: &StageConfig) -> Self {
        let rows = config.grid.rows;
        let columns = config.grid.columns;
        let capacity = usize::try_from(u64::from(rows) * u64::from(columns)).unwrap_or(0);
        let mut tiles = Vec::with_capacity(capacity);
        for row in 0..rows {
            for column in 0..columns {
                tiles.push(Tile {
                    terrain: config.terrain_at(TileCoord::new(row, column)),
                    overlay: TileOverlay::Normal,
                    occupant: None,
                });
            }
        }

        let mut grid = Self {
            rows,
            columns,
            tiles,
        };
        for tile in &config.grid.unusable {
            let _ = grid.mark_unusable(*tile);
        }
        grid
    }

    pub(crate) const fn rows(&self) -> u32 {
        self.rows
    }

    pub(crate) const fn columns(&self) -> u32 {
        self.columns
    }

    pub(crate) fn snapshot(&self, coord: TileCoord) -> Option<TileSnapshot> {
        self.tile(coord).map(|tile| TileSnapshot {
            coord,
            terrain: tile.terrain,
            overlay: tile.overlay,
            occupant: tile.occupant,
        })
    }

    pub(crate) fn occupant(&self, coord: TileCoord) -> Option<UnitId> {
        self.tile(coord).and_then(|tile| tile.occupant)
    }

    /// Records `unit` as the occupant. Fails when the tile is missing or taken.
    pub(crate) fn occupy(&mut self, coord: TileCoord, unit: UnitId) -> bool {
        match self.tile_mut(coord) {
            Some(tile) if tile.occupant.is_none() => {
                tile.occupant = Some(unit);
                true
            }
            _ => false,
        }
    }

    /// Clears the occupant, but only if it is `unit`.
    pub(crate) fn vacate(&mut self, coord: TileCoord, unit: UnitId) {
        if let Some(tile) = self.tile_mut(coord) {
            if tile.occupant == Some(unit) {
                tile.occupant = None;
            }
        }
    }

    /// Marks the tile unusable. Returns `true` when the overlay changed.
    pub(crate) fn mark_unusable(&mut self, coord: TileCoord) -> bool {
        match self.tile_mut(coord) {
            Some(tile) if tile.overlay != TileOverlay::Unusable => {
                tile.overlay = TileOverlay::Unusable;
                true
            }
            _ => false,
        }
    }

    fn tile(&self, coord: TileCoord) -> Option<&Tile> {
        self.index(coord).and_then(|index| self.tiles.get(index))
    }

    fn tile_mut(&mut self, coord: TileCoord) -> Option<&mut Tile> {
        self.index(coord).and_then(|index| self.tiles.get_mut(index))
    }

    fn index(&self, coord: TileCoord) -> Option<usize> {
        if coord.row() < self.rows && coord.column() < self.columns {
            let row = usize::try_from(coord.row()).ok()?;
            let column = usize::try_from(coord.column()).ok()?;
            let width = usize::try_from(self.columns).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }
}
