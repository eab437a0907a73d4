//! Loading of TOML stage files.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use action_stage_core::{ConfigError, StageConfig, UnitKind};
use action_stage_system_spawning::WaveEntry;
use serde::Deserialize;
use thiserror::Error;

/// Everything required to build one stage instance.
#[derive(Clone, Debug, PartialEq)]
pub struct StageDefinition {
    /// Grid, economy and unit catalogue.
    pub config: StageConfig,
    /// Enemy spawn schedule.
    pub waves: Vec<WaveEntry>,
    /// Seed for rows chosen at random.
    pub seed: u64,
}

impl StageDefinition {
    /// Creates a definition without any scheduled enemies.
    #[must_use]
    pub fn new(config: StageConfig) -> Self {
        Self {
            config,
            waves: Vec::new(),
            seed: 0,
        }
    }

    /// Reads and validates a stage file from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&source)
    }

    /// Parses and validates a stage file held in memory.
    pub fn parse(source: &str) -> Result<Self, LoadError> {
        let file: StageFile = toml::from_str(source)?;
        file.stage.validate()?;

        let mut waves = Vec::with_capacity(file.spawning.waves.len());
        for wave in &file.spawning.waves {
            let profile = file
                .stage
                .profile_id(&wave.unit)
                .ok_or_else(|| LoadError::UnknownUnit(wave.unit.clone()))?;
            let is_enemy = file
                .stage
                .profile(profile)
                .map_or(false, |unit| unit.kind() == UnitKind::Enemy);
            if !is_enemy {
                return Err(LoadError::NotAnEnemy(wave.unit.clone()));
            }
            let at = Duration::try_from_secs_f32(wave.at_secs)
                .map_err(|_| LoadError::InvalidWaveTime(wave.at_secs))?;
            if let Some(row) = wave.row {
                if row >= file.stage.grid.rows {
                    return Err(LoadError::WaveRowOutOfBounds {
                        unit: wave.unit.clone(),
                        row,
                    });
                }
            }
            waves.push(WaveEntry {
                at,
                profile,
                row: wave.row,
            });
        }

        Ok(Self {
            config: file.stage,
            waves,
            seed: file.spawning.seed,
        })
    }
}

/// Reasons a stage file cannot be loaded.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The file could not be read.
    #[error("failed to read stage file {path}")]
    Io {
        /// Path that was requested.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The file is not valid TOML or does not match the stage layout.
    #[error("malformed stage file")]
    Toml(#[from] toml::de::Error),
    /// The stage configuration is inconsistent.
    #[error("invalid stage configuration")]
    Config(#[from] ConfigError),
    /// A wave names a unit missing from the catalogue.
    #[error("wave references unknown unit '{0}'")]
    UnknownUnit(String),
    /// A wave names a unit that is not an enemy.
    #[error("wave unit '{0}' is not an enemy")]
    NotAnEnemy(String),
    /// A wave time is negative or not finite.
    #[error("wave time {0} is not a valid number of seconds")]
    InvalidWaveTime(f32),
    /// A wave targets a row outside the grid.
    #[error("wave of '{unit}' targets row {row} outside the grid")]
    WaveRowOutOfBounds {
        /// Unit of the wave.
        unit: String,
        /// Requested row.
        row: u32,
    },
}

#[derive(Debug, Deserialize)]
struct StageFile {
    stage: StageConfig,
    #[serde(default)]
    spawning: SpawningSection,
}

#[derive(Debug, Default, Deserialize)]
struct SpawningSection {
    #[serde(default)]
    seed: u64,
    #[serde(default)]
    waves: Vec<WaveSection>,
}

#[derive(Debug, Deserialize)]
struct WaveSection {
    at_secs: f32,
    unit: String,
    #[serde(default)]
    row: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const STAGE: &str = r#"
[stage]
night_starts_at = 0.6

[stage.grid]
rows = 2
columns = 5
terrain = ["LLLLL", "WWLLL"]
unusable = [{ row = 0, column = 4 }]

[stage.user]
starting_energy = 50.0
generation_period_secs = 5.0
generation_amount = 25.0

[stage.enemy]
energy_max = 120.0
stage_length_secs = 60.0

[[stage.units]]
name = "pea"
health = 10.0
attack_power = 5.0
energy_cost = 30.0
role = { kind = "defense", attack_interval_secs = 1.0, payload = { type = "blaster", pattern = { shape = "forward" }, projectile = { speed = 4.0 } } }

[[stage.units]]
name = "crawler"
health = 30.0
role = { kind = "enemy", speed = 0.5, attack_interval_secs = 1.0, score_value = 10 }

[spawning]
seed = 99

[[spawning.waves]]
at_secs = 2.5
unit = "crawler"
row = 1

[[spawning.waves]]
at_secs = 4.0
unit = "crawler"
"#;

    #[test]
    fn parses_a_complete_stage() {
        let definition = StageDefinition::parse(STAGE).expect("stage parses");

        assert_eq!(definition.config.grid.rows, 2);
        assert_eq!(definition.config.units.len(), 2);
        assert_eq!(definition.seed, 99);
        assert_eq!(definition.waves.len(), 2);
        assert_eq!(definition.waves[0].at, Duration::from_millis(2_500));
        assert_eq!(definition.waves[0].row, Some(1));
        assert_eq!(definition.waves[1].row, None);
        assert_eq!(
            Some(definition.waves[0].profile),
            definition.config.profile_id("crawler")
        );
    }

    #[test]
    fn waves_must_name_enemies() {
        let source = STAGE.replace("unit = \"crawler\"\nrow = 1", "unit = \"pea\"\nrow = 1");
        assert!(matches!(
            StageDefinition::parse(&source),
            Err(LoadError::NotAnEnemy(name)) if name == "pea"
        ));

        let source = STAGE.replace("unit = \"crawler\"\nrow = 1", "unit = \"ghost\"\nrow = 1");
        assert!(matches!(
            StageDefinition::parse(&source),
            Err(LoadError::UnknownUnit(name)) if name == "ghost"
        ));
    }

    #[test]
    fn invalid_configuration_is_reported() {
        let source = STAGE.replace("stage_length_secs = 60.0", "stage_length_secs = 0.0");
        assert!(matches!(
            StageDefinition::parse(&source),
            Err(LoadError::Config(ConfigError::NonPositiveStageLength(_)))
        ));
    }

    #[test]
    fn malformed_toml_is_reported() {
        assert!(matches!(
            StageDefinition::parse("[stage"),
            Err(LoadError::Toml(_))
        ));
    }

    #[test]
    fn missing_files_keep_their_path() {
        let error = StageDefinition::load("/nonexistent/stage.toml").expect_err("missing file");
        assert!(error.to_string().contains("/nonexistent/stage.toml"));
    }
}
