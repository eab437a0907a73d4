//! Presentation callbacks fired while the stage runs.

use action_stage_core::{
    DeathCause, Event, ProjectileId, StageOutcome, StageResult, UnitId, UnitKind,
};
use glam::Vec2;
use thiserror::Error;
use tracing::warn;

/// Failure reported by a presentation hook.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("presentation hook `{hook}` failed: {message}")]
pub struct HookError {
    hook: &'static str,
    message: String,
}

impl HookError {
    /// Creates a new hook error for the named hook.
    #[must_use]
    pub fn new(hook: &'static str, message: impl Into<String>) -> Self {
        Self {
            hook,
            message: message.into(),
        }
    }
}

/// Receives presentation-relevant moments of the simulation.
///
/// Every method defaults to doing nothing. Failures never affect the
/// simulation; the manager logs them and continues.
pub trait PresentationHooks {
    /// A unit died and its death animation may play.
    fn unit_died(
        &mut self,
        _unit: UnitId,
        _kind: UnitKind,
        _cause: DeathCause,
    ) -> Result<(), HookError> {
        Ok(())
    }

    /// A defense attacked and requested its shot sound.
    fn attack_sfx(&mut self, _unit: UnitId) -> Result<(), HookError> {
        Ok(())
    }

    /// A projectile left its shooter.
    fn projectile_fired(
        &mut self,
        _projectile: ProjectileId,
        _shooter: UnitId,
        _position: Vec2,
    ) -> Result<(), HookError> {
        Ok(())
    }

    /// The stage reached its terminal outcome.
    fn stage_concluded(
        &mut self,
        _outcome: StageOutcome,
        _result: &StageResult,
    ) -> Result<(), HookError> {
        Ok(())
    }
}

/// Hooks that ignore every callback.
#[derive(Clone, Copy, Debug, Default)]
pub struct SilentHooks;

impl PresentationHooks for SilentHooks {}

pub(crate) fn dispatch(hooks: &mut dyn PresentationHooks, events: &[Event]) {
    for event in events {
        let outcome = match event {
            Event::UnitDied { unit, kind, cause } => hooks.unit_died(*unit, *kind, *cause),
            Event::AttackPerformed {
                unit, sfx: true, ..
            } => hooks.attack_sfx(*unit),
            Event::ProjectileFired {
                projectile,
                shooter,
                position,
                ..
            } => hooks.projectile_fired(*projectile, *shooter, *position),
            Event::StageConcluded { outcome, result } => hooks.stage_concluded(*outcome, result),
            _ => Ok(()),
        };

        if let Err(error) = outcome {
            warn!(%error, "ignoring presentation hook failure");
        }
    }
}
