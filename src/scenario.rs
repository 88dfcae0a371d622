use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use anyhow::{Context, Result};
use serde::Deserialize;
use thiserror::Error;

use crate::{
    animal::DiseaseParams,
    clock::{Clock, Forecast, Weather},
    spatial::{Grid, DEFAULT_DEPTH, DEFAULT_WIDTH},
    species::{Activity, AnimalKind, Bestiary, PlantKind},
    world::{SeedingTable, World},
};

/// Slack allowed when a probability table is checked against 1.0.
const PROBABILITY_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("scenario is not valid YAML")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid scenario: {0}")]
    Validation(String),
}

fn default_seed() -> u64 {
    42
}

fn default_steps() -> u64 {
    500
}

fn default_depth() -> u32 {
    DEFAULT_DEPTH
}

fn default_width() -> u32 {
    DEFAULT_WIDTH
}

fn default_log_level() -> String {
    "info".into()
}

fn default_plant_seeding() -> Vec<SeedEntry<PlantKind>> {
    SeedingTable::default()
        .plants
        .into_iter()
        .map(|(species, probability)| SeedEntry {
            species,
            probability,
        })
        .collect()
}

fn default_animal_seeding() -> Vec<SeedEntry<AnimalKind>> {
    SeedingTable::default()
        .animals
        .into_iter()
        .map(|(species, probability)| SeedEntry {
            species,
            probability,
        })
        .collect()
}

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default = "default_steps")]
    pub steps: u64,
    /// Wall-clock pause between steps, for watching a run.
    #[serde(default)]
    pub pacing_ms: u64,
    #[serde(default)]
    pub grid: GridConfig,
    #[serde(default)]
    pub clock: ClockConfig,
    #[serde(default)]
    pub seeding: SeedingConfig,
    #[serde(default)]
    pub disease: DiseaseParams,
    #[serde(default)]
    pub species: SpeciesOverrides,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GridConfig {
    #[serde(default = "default_depth")]
    pub depth: u32,
    #[serde(default = "default_width")]
    pub width: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            depth: default_depth(),
            width: default_width(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClockConfig {
    #[serde(default)]
    pub start_step: u64,
    #[serde(default)]
    pub weather: WeatherSetting,
}

/// `random`, or one condition held for the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherSetting {
    #[default]
    Random,
    Sunny,
    Rainy,
    Foggy,
    Stormy,
}

impl WeatherSetting {
    pub fn forecast(self) -> Forecast {
        match self {
            WeatherSetting::Random => Forecast::Random,
            WeatherSetting::Sunny => Forecast::Pinned(Weather::Sunny),
            WeatherSetting::Rainy => Forecast::Pinned(Weather::Rainy),
            WeatherSetting::Foggy => Forecast::Pinned(Weather::Foggy),
            WeatherSetting::Stormy => Forecast::Pinned(Weather::Stormy),
        }
    }
}

impl FromStr for WeatherSetting {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "random" => Ok(WeatherSetting::Random),
            "sunny" => Ok(WeatherSetting::Sunny),
            "rainy" => Ok(WeatherSetting::Rainy),
            "foggy" => Ok(WeatherSetting::Foggy),
            "stormy" | "storm" => Ok(WeatherSetting::Stormy),
            other => Err(format!(
                "unknown weather '{other}', expected random, sunny, rainy, foggy or stormy"
            )),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedEntry<K> {
    pub species: K,
    pub probability: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedingConfig {
    #[serde(default = "default_plant_seeding")]
    pub plants: Vec<SeedEntry<PlantKind>>,
    #[serde(default = "default_animal_seeding")]
    pub animals: Vec<SeedEntry<AnimalKind>>,
}

impl Default for SeedingConfig {
    fn default() -> Self {
        Self {
            plants: default_plant_seeding(),
            animals: default_animal_seeding(),
        }
    }
}

/// Optional replacements for individual fields of a species record.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnimalOverride {
    pub max_age: Option<u32>,
    pub breeding_age: Option<u32>,
    pub breeding_probability: Option<f64>,
    pub max_litter_size: Option<u32>,
    pub hunger_threshold: Option<u32>,
    pub always_hungry: Option<bool>,
    pub requires_mate: Option<bool>,
    pub mate_search_radius: Option<u32>,
    pub activity: Option<Activity>,
    pub initial_food: Option<(u32, u32)>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlantOverride {
    pub maturity_age: Option<u32>,
    pub max_age: Option<u32>,
    pub spread_probability: Option<f64>,
    pub max_offspring: Option<u32>,
    pub requires_daylight: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpeciesOverrides {
    #[serde(default)]
    pub animals: HashMap<AnimalKind, AnimalOverride>,
    #[serde(default)]
    pub plants: HashMap<PlantKind, PlantOverride>,
}

impl SpeciesOverrides {
    pub fn apply(&self, bestiary: &mut Bestiary) {
        for (kind, patch) in &self.animals {
            let traits = bestiary.animal_mut(*kind);
            if let Some(value) = patch.max_age {
                traits.max_age = value;
            }
            if let Some(value) = patch.breeding_age {
                traits.breeding_age = value;
            }
            if let Some(value) = patch.breeding_probability {
                traits.breeding_probability = value;
            }
            if let Some(value) = patch.max_litter_size {
                traits.max_litter_size = value;
            }
            if let Some(value) = patch.hunger_threshold {
                traits.hunger_threshold = value;
            }
            if let Some(value) = patch.always_hungry {
                traits.always_hungry = value;
            }
            if let Some(value) = patch.requires_mate {
                traits.requires_mate = value;
            }
            if let Some(value) = patch.mate_search_radius {
                traits.mate_search_radius = value;
            }
            if let Some(value) = patch.activity {
                traits.activity = value;
            }
            if let Some(value) = patch.initial_food {
                traits.initial_food = value;
            }
        }
        for (kind, patch) in &self.plants {
            let traits = bestiary.plant_mut(*kind);
            if let Some(value) = patch.maturity_age {
                traits.maturity_age = value;
            }
            if let Some(value) = patch.max_age {
                traits.max_age = value;
            }
            if let Some(value) = patch.spread_probability {
                traits.spread_probability = value;
            }
            if let Some(value) = patch.max_offspring {
                traits.max_offspring = value;
            }
            if let Some(value) = patch.requires_daylight {
                traits.requires_daylight = value;
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

pub struct ScenarioLoader {
    base_dir: PathBuf,
}

impl ScenarioLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self, file: impl AsRef<Path>) -> Result<Scenario> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read scenario file {}", path.display()))?;
        let scenario = Scenario::from_yaml(&data)
            .with_context(|| format!("Failed to load {}", path.display()))?;
        Ok(scenario)
    }
}

impl Scenario {
    /// Parse and validate a scenario document.
    pub fn from_yaml(data: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = serde_yaml::from_str(data)?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn validate(&self) -> Result<(), ScenarioError> {
        check_table(
            "seeding.plants",
            self.seeding
                .plants
                .iter()
                .map(|entry| (entry.species.label(), entry.probability)),
        )?;
        check_table(
            "seeding.animals",
            self.seeding
                .animals
                .iter()
                .map(|entry| (entry.species.label(), entry.probability)),
        )?;

        let disease = &self.disease;
        for (field, value) in [
            ("initial_infection_probability", disease.initial_infection_probability),
            ("transmission_probability", disease.transmission_probability),
            ("mortality_per_step", disease.mortality_per_step),
            ("infected_breeding_factor", disease.infected_breeding_factor),
        ] {
            check_probability(&format!("disease.{field}"), value)?;
        }

        for (kind, patch) in &self.species.animals {
            if let Some(value) = patch.breeding_probability {
                check_probability(&format!("species.animals.{}.breeding_probability", kind.label()), value)?;
            }
            if let Some((low, high)) = patch.initial_food {
                if low > high {
                    return Err(ScenarioError::Validation(format!(
                        "species.animals.{}.initial_food range {low}..={high} is empty",
                        kind.label()
                    )));
                }
            }
        }
        for (kind, patch) in &self.species.plants {
            if let Some(value) = patch.spread_probability {
                check_probability(&format!("species.plants.{}.spread_probability", kind.label()), value)?;
            }
        }
        Ok(())
    }

    /// Zero dimensions fall back to the defaults, with a warning.
    pub fn grid(&self) -> Grid {
        Grid::new(self.grid.depth, self.grid.width)
    }

    pub fn bestiary(&self) -> Bestiary {
        let mut bestiary = Bestiary::default();
        self.species.apply(&mut bestiary);
        bestiary
    }

    pub fn seeding_table(&self) -> SeedingTable {
        SeedingTable {
            plants: self
                .seeding
                .plants
                .iter()
                .map(|entry| (entry.species, entry.probability))
                .collect(),
            animals: self
                .seeding
                .animals
                .iter()
                .map(|entry| (entry.species, entry.probability))
                .collect(),
        }
    }

    /// An empty world; the engine seeds it from its own stream.
    pub fn build_world(&self) -> World {
        World::new(
            self.grid(),
            Clock::new(self.clock.start_step, self.clock.weather.forecast()),
            self.bestiary(),
            self.disease.clone(),
        )
    }

    pub fn steps(&self, override_steps: Option<u64>) -> u64 {
        override_steps.unwrap_or(self.steps)
    }
}

fn check_probability(field: &str, value: f64) -> Result<(), ScenarioError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ScenarioError::Validation(format!(
            "{field} must be within [0, 1], got {value}"
        )));
    }
    Ok(())
}

fn check_table<'a>(
    table: &str,
    entries: impl Iterator<Item = (&'a str, f64)>,
) -> Result<(), ScenarioError> {
    let mut total = 0.0;
    for (species, probability) in entries {
        if probability < 0.0 || probability.is_nan() {
            return Err(ScenarioError::Validation(format!(
                "{table}: probability for {species} must not be negative, got {probability}"
            )));
        }
        total += probability;
    }
    if total > 1.0 + PROBABILITY_TOLERANCE {
        return Err(ScenarioError::Validation(format!(
            "{table}: probabilities sum to {total}, which exceeds 1.0"
        )));
    }
    Ok(())
}
