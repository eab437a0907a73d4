use std::{fmt, str::FromStr};

use action_stage_core::TileCoord;
use thiserror::Error;

const UNIT_DELIMITER: char = '@';
const COORD_DELIMITER: char = ',';

/// Unit placement requested on the command line as `name@row,col`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct PlacementArg {
    /// Catalogue name of the unit.
    pub(crate) unit: String,
    /// Tile receiving the unit.
    pub(crate) tile: TileCoord,
}

impl FromStr for PlacementArg {
    type Err = PlacementArgError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(PlacementArgError::Empty);
        }

        let (unit, coords) = trimmed
            .split_once(UNIT_DELIMITER)
            .ok_or(PlacementArgError::MissingTile)?;
        if unit.is_empty() {
            return Err(PlacementArgError::MissingUnit);
        }
        let (row, column) = coords
            .split_once(COORD_DELIMITER)
            .ok_or_else(|| PlacementArgError::InvalidTile(coords.to_owned()))?;
        let row = row
            .trim()
            .parse::<u32>()
            .map_err(|_| PlacementArgError::InvalidTile(coords.to_owned()))?;
        let column = column
            .trim()
            .parse::<u32>()
            .map_err(|_| PlacementArgError::InvalidTile(coords.to_owned()))?;

        Ok(Self {
            unit: unit.to_owned(),
            tile: TileCoord::new(row, column),
        })
    }
}

impl fmt::Display for PlacementArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{UNIT_DELIMITER}{}{COORD_DELIMITER}{}",
            self.unit,
            self.tile.row(),
            self.tile.column()
        )
    }
}

/// Errors that can occur while parsing a placement argument.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub(crate) enum PlacementArgError {
    /// The argument was empty.
    #[error("placement is empty")]
    Empty,
    /// No unit name precedes the tile.
    #[error("placement is missing a unit name")]
    MissingUnit,
    /// The `@row,col` part is absent.
    #[error("placement is missing '@row,col'")]
    MissingTile,
    /// The tile could not be parsed.
    #[error("'{0}' is not a tile, expected 'row,col'")]
    InvalidTile(String),
}
