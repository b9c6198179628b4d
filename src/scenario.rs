use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::{
    allocation::HostOrder,
    clock::SimulationClock,
    error::ConfigError,
    planet::{GridSize, Planet},
    population::{CandidateSite, PopulationSample, SampleSet},
    provider::{check_home_deployment, BigProvider, Deployment, ProviderCatalog, HOME_PROVIDER},
    rng::RngManager,
    world::World,
};

fn default_customers() -> f64 {
    1_000.0
}

fn default_time_rate() -> f64 {
    60.0
}

fn default_tick_interval_ms() -> u64 {
    1_000
}

fn default_deployments() -> Vec<Deployment> {
    vec![Deployment::new(HOME_PROVIDER, 1)]
}

fn default_candidate_limit() -> usize {
    25
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub description: Option<String>,
    pub seed: u64,
    #[serde(default = "default_customers")]
    pub customers: f64,
    #[serde(default)]
    pub grid: GridSize,
    /// Simulated seconds per wall-clock second.
    #[serde(default = "default_time_rate")]
    pub time_rate: f64,
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    #[serde(default)]
    pub ticks: Option<u64>,
    #[serde(default)]
    pub account_balance: f64,
    #[serde(default)]
    pub host_order: HostOrder,
    #[serde(default = "default_deployments")]
    pub deployments: Vec<Deployment>,
    #[serde(default = "BigProvider::defaults")]
    pub big_providers: Vec<BigProvider>,
    #[serde(default = "default_candidate_limit")]
    pub candidate_limit: usize,
    /// Explicit candidate sites; derived from population density when absent.
    #[serde(default)]
    pub candidate_sites: Option<Vec<CandidateSite>>,
    pub population: PopulationInput,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PopulationInput {
    pub target_year: i32,
    pub samples: Vec<PopulationSample>,
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
        let scenario: Scenario = serde_yaml::from_str(&data)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        scenario
            .validate()
            .with_context(|| format!("Invalid scenario {}", path.display()))?;
        Ok(scenario)
    }
}

impl Scenario {
    /// Checks that need no population data. Provider names are checked when
    /// the world is built, once the candidate list is known.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid.lat_divisions == 0 || self.grid.lng_divisions == 0 {
            return Err(ConfigError::InvalidGrid {
                lat: self.grid.lat_divisions,
                lng: self.grid.lng_divisions,
            });
        }
        if !self.time_rate.is_finite() || self.time_rate <= 0.0 {
            return Err(ConfigError::InvalidTimeRate(self.time_rate));
        }
        if !self.account_balance.is_finite() || self.account_balance < 0.0 {
            return Err(ConfigError::InvalidBalance(self.account_balance));
        }
        if !self.customers.is_finite() || self.customers < 0.0 {
            return Err(ConfigError::InvalidCustomers(self.customers));
        }
        for provider in &self.big_providers {
            provider.validate()?;
        }
        check_home_deployment(&self.deployments)
    }

    pub fn samples(&self) -> SampleSet {
        SampleSet::for_year(self.population.samples.iter().cloned(), self.population.target_year)
    }

    /// Build the planet, the provider catalog and the account, with the
    /// simulation clock starting at `start`.
    pub fn build_world(&self, start: DateTime<Utc>) -> Result<World, ConfigError> {
        self.validate()?;
        let clock = SimulationClock::new(start, self.time_rate)?;
        let mut planet = Planet::new(self.grid, clock)?;
        let samples = self.samples();
        let mut rng = RngManager::new(self.seed).fork("planet");
        planet.populate(&samples, self.customers, &mut rng)?;

        let home = planet
            .home_region()
            .map(|region| region.center)
            .ok_or(ConfigError::Unpopulated)?;
        let candidates = match &self.candidate_sites {
            Some(sites) => sites.clone(),
            None => samples.candidate_sites(self.candidate_limit),
        };
        let catalog = ProviderCatalog::new(home, &self.big_providers, &candidates);

        World::new(
            planet,
            catalog,
            self.account_balance,
            self.deployments.clone(),
            self.host_order,
        )
    }

    pub fn ticks(&self, override_ticks: Option<u64>) -> Option<u64> {
        override_ticks.or(self.ticks)
    }
}
