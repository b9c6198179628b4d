use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::allocation::{AllocationRecord, HostOrder};
use crate::error::ConfigError;
use crate::geo::Coords;
use crate::planet::{ActiveDemand, Planet};
use crate::provider::{check_home_deployment, Deployment, ProviderCatalog, ProvisionedHost};

/// Scratch data produced and consumed by the systems of a single tick.
#[derive(Debug, Clone, Default)]
pub struct TickState {
    pub sim_time: Option<DateTime<Utc>>,
    pub demand: Option<ActiveDemand>,
    pub hosts: Vec<ProvisionedHost>,
    pub records: Vec<AllocationRecord>,
    pub outages: Vec<String>,
}

/// State that survives between ticks and must be restored if a tick fails.
#[derive(Debug, Clone)]
pub(crate) struct Checkpoint {
    customers: Vec<f64>,
    account_balance: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegionSnapshot {
    pub index: usize,
    pub center: Coords,
    pub population: u64,
    pub customers: f64,
    pub is_home: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub tick: u64,
    pub total_population: u64,
    pub customers: f64,
    pub account_balance: f64,
    pub regions: Vec<RegionSnapshot>,
}

pub struct World {
    tick: u64,
    pub(crate) planet: Planet,
    pub(crate) catalog: ProviderCatalog,
    pub(crate) account_balance: f64,
    pub(crate) deployments: Vec<Deployment>,
    pub(crate) host_order: HostOrder,
    pub(crate) tick_state: TickState,
}

impl World {
    pub fn new(
        planet: Planet,
        catalog: ProviderCatalog,
        account_balance: f64,
        deployments: Vec<Deployment>,
        host_order: HostOrder,
    ) -> Result<Self, ConfigError> {
        if !account_balance.is_finite() || account_balance < 0.0 {
            return Err(ConfigError::InvalidBalance(account_balance));
        }
        for deployment in &deployments {
            if catalog.get(&deployment.provider).is_none() {
                return Err(ConfigError::UnknownProvider(deployment.provider.clone()));
            }
        }
        check_home_deployment(&deployments)?;
        Ok(Self {
            tick: 0,
            planet,
            catalog,
            account_balance,
            deployments,
            host_order,
            tick_state: TickState::default(),
        })
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn planet(&self) -> &Planet {
        &self.planet
    }

    pub fn catalog(&self) -> &ProviderCatalog {
        &self.catalog
    }

    pub fn catalog_mut(&mut self) -> &mut ProviderCatalog {
        &mut self.catalog
    }

    pub fn account_balance(&self) -> f64 {
        self.account_balance
    }

    pub fn deposit(&mut self, amount: f64) {
        if amount.is_finite() && amount > 0.0 {
            self.account_balance += amount;
        }
    }

    pub fn deployments(&self) -> &[Deployment] {
        &self.deployments
    }

    pub fn host_order(&self) -> HostOrder {
        self.host_order
    }

    pub fn set_host_order(&mut self, order: HostOrder) {
        self.host_order = order;
    }

    pub fn total_population(&self) -> u64 {
        self.planet.population()
    }

    pub(crate) fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            customers: self.planet.regions().iter().map(|r| r.customers).collect(),
            account_balance: self.account_balance,
        }
    }

    pub(crate) fn restore(&mut self, checkpoint: Checkpoint) {
        for (region, customers) in self
            .planet
            .regions_mut()
            .iter_mut()
            .zip(checkpoint.customers)
        {
            region.customers = customers;
        }
        self.account_balance = checkpoint.account_balance;
        self.tick_state = TickState::default();
    }

    pub(crate) fn begin_tick(&mut self, sim_time: DateTime<Utc>) {
        self.tick_state = TickState {
            sim_time: Some(sim_time),
            ..TickState::default()
        };
    }

    pub(crate) fn finish_tick(&mut self) -> TickState {
        self.tick += 1;
        std::mem::take(&mut self.tick_state)
    }

    /// Populated regions only.
    pub fn snapshot(&self) -> WorldSnapshot {
        let regions = self
            .planet
            .regions()
            .iter()
            .enumerate()
            .filter(|(_, r)| r.population > 0)
            .map(|(index, r)| RegionSnapshot {
                index,
                center: r.center,
                population: r.population,
                customers: r.customers,
                is_home: r.is_home,
            })
            .collect();
        WorldSnapshot {
            tick: self.tick,
            total_population: self.planet.population(),
            customers: self.planet.customers(),
            account_balance: self.account_balance,
            regions,
        }
    }
}
