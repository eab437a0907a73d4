//! User placement, removal, selection and enemy spawning.

use action_stage_core::{
    DeathCause, Event, PlacementError, PlayerSide, ProfileId, RemovalError, Selection, TileCoord,
    TileOverlay, UnitId, UnitKind,
};
use glam::Vec2;
use tracing::debug;

use crate::{next_id, units::Unit, World};

impl World {
    /// Places a user unit, deducting its cost atomically with creation.
    ///
    /// Checks run in a fixed order and the first failure is reported.
    pub(crate) fn place_unit(
        &mut self,
        profile_id: ProfileId,
        tile: TileCoord,
        out_events: &mut Vec<Event>,
    ) -> Result<UnitId, PlacementError> {
        if !self.gate_open() {
            return Err(PlacementError::InvalidState);
        }
        let profile = self
            .config
            .profile(profile_id)
            .ok_or(PlacementError::UnknownProfile)?;
        if !profile.is_user_placeable() {
            return Err(PlacementError::NotPlaceable);
        }
        let snapshot = self
            .tiles
            .snapshot(tile)
            .ok_or(PlacementError::OutOfBounds)?;
        if snapshot.overlay == TileOverlay::Unusable {
            return Err(PlacementError::TileUnusable);
        }
        if !profile.accepts(snapshot.terrain) {
            return Err(PlacementError::TerrainMismatch);
        }
        if snapshot.occupant.is_some() {
            return Err(PlacementError::Occupied);
        }
        if !self.user.can_afford(profile.energy_cost) {
            return Err(PlacementError::InsufficientEnergy);
        }

        let id = UnitId::new(next_id(&mut self.next_unit_id));
        let unit = Unit::from_profile(
            id,
            profile_id,
            profile,
            PlayerSide::User,
            Some(tile),
            tile.row(),
            tile.center(),
        );
        let cost = profile.energy_cost;
        if !self.tiles.occupy(tile, id) || !self.user.try_spend(cost) {
            self.tiles.vacate(tile, id);
            return Err(PlacementError::Occupied);
        }
        let _ = self.units.insert(id, unit);
        let _ = self.user.units.insert(id);

        debug!(unit = id.get(), row = tile.row(), column = tile.column(), "unit placed");
        if cost > 0.0 {
            out_events.push(Event::EnergyChanged {
                side: PlayerSide::User,
                energy: self.user.energy(),
            });
        }
        out_events.push(Event::UnitPlaced {
            unit: id,
            profile: profile_id,
            tile,
        });
        Ok(id)
    }

    /// Places the selected profile and clears the selection on success.
    pub(crate) fn place_selected(
        &mut self,
        tile: TileCoord,
        out_events: &mut Vec<Event>,
    ) -> Result<UnitId, (Option<ProfileId>, PlacementError)> {
        let Selection::Place(profile) = self.user.selection else {
            return Err((None, PlacementError::NoSelection));
        };
        let id = self
            .place_unit(profile, tile, out_events)
            .map_err(|reason| (Some(profile), reason))?;
        self.select(Selection::Empty, out_events);
        Ok(id)
    }

    /// Removes the user unit on `tile` while remove mode is active.
    pub(crate) fn remove_unit(
        &mut self,
        tile: TileCoord,
        out_events: &mut Vec<Event>,
    ) -> Result<UnitId, RemovalError> {
        if !self.gate_open() {
            return Err(RemovalError::InvalidState);
        }
        if self.user.selection != Selection::Remove {
            return Err(RemovalError::NotInRemoveMode);
        }
        let snapshot = self.tiles.snapshot(tile).ok_or(RemovalError::OutOfBounds)?;
        let id = snapshot.occupant.ok_or(RemovalError::EmptyTile)?;
        if !self.user.units.contains(&id) {
            return Err(RemovalError::NotRemovable);
        }

        self.kill_unit(id, DeathCause::Removed, out_events);
        out_events.push(Event::UnitRemoved { unit: id, tile });
        Ok(id)
    }

    /// Replaces the selection, announcing it when it changed.
    pub(crate) fn select(&mut self, selection: Selection, out_events: &mut Vec<Event>) {
        if let Selection::Place(profile) = selection {
            let placeable = self
                .config
                .profile(profile)
                .map_or(false, |profile| profile.is_user_placeable());
            if !placeable {
                debug!(profile = profile.get(), "ignoring selection of unplaceable profile");
                return;
            }
        }
        if self.user.selection == selection {
            return;
        }
        self.user.selection = selection;
        out_events.push(Event::SelectionChanged { selection });
    }

    /// Spawns an enemy at the right edge of `row`.
    pub(crate) fn spawn_enemy(
        &mut self,
        profile_id: ProfileId,
        row: u32,
        out_events: &mut Vec<Event>,
    ) -> Option<UnitId> {
        if !self.gate_open() || row >= self.tiles.rows() {
            return None;
        }
        let profile = self
            .config
            .profile(profile_id)
            .filter(|profile| profile.kind() == UnitKind::Enemy)?;

        let id = UnitId::new(next_id(&mut self.next_unit_id));
        let position = Vec2::new(self.tiles.columns() as f32, row as f32 + 0.5);
        let unit = Unit::from_profile(
            id,
            profile_id,
            profile,
            PlayerSide::Enemy,
            None,
            row,
            position,
        );
        let _ = self.units.insert(id, unit);
        let _ = self.enemy.units.insert(id);

        debug!(unit = id.get(), row, "enemy spawned");
        out_events.push(Event::EnemySpawned {
            unit: id,
            profile: profile_id,
            row,
        });
        Some(id)
    }
}
