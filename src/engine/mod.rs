//! Tick engine.
//!
//! The engine owns no timer: a driver calls [`Engine::tick`] with the current
//! wall-clock instant, and the engine runs every registered system in order.
//! A tick either completes or leaves the world exactly as it found it.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use crate::{
    allocation::AllocationRecord,
    provider::ProvisionedHost,
    rng::{RngManager, SystemRng},
    world::World,
};

pub struct EngineSettings {
    pub scenario_name: String,
    pub seed: u64,
}

pub struct EngineBuilder {
    settings: EngineSettings,
    systems: Vec<Box<dyn System>>,
}

impl EngineBuilder {
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            settings,
            systems: Vec::new(),
        }
    }

    pub fn with_system(mut self, system: impl System + 'static) -> Self {
        self.systems.push(Box::new(system));
        self
    }

    pub fn push_system(&mut self, system: impl System + 'static) {
        self.systems.push(Box::new(system));
    }

    pub fn build(self) -> Engine {
        Engine {
            rng: RngManager::new(self.settings.seed),
            systems: self.systems,
            settings: self.settings,
            state: EngineState::Stopped,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Stopped,
    Running,
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("engine is stopped")]
    NotRunning,

    #[error("tick {tick} aborted and rolled back: {source:#}")]
    TickAborted {
        tick: u64,
        #[source]
        source: anyhow::Error,
    },
}

/// What a tick observer sees.
#[derive(Debug, Clone, Serialize)]
pub struct TickReport {
    pub tick: u64,
    pub simulated_time: DateTime<Utc>,
    pub active_people: u64,
    pub active_customers: u64,
    pub total_population: u64,
    pub customer_ratio: f64,
    /// Customer base after this tick's feedback.
    pub customers: f64,
    pub served: u64,
    pub unserved: u64,
    pub account_balance: f64,
    pub outages: Vec<String>,
    #[serde(skip_serializing)]
    pub hosts: Vec<ProvisionedHost>,
    #[serde(skip_serializing)]
    pub records: Vec<AllocationRecord>,
}

pub struct Engine {
    rng: RngManager,
    systems: Vec<Box<dyn System>>,
    settings: EngineSettings,
    state: EngineState,
}

impl Engine {
    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn start(&mut self) {
        self.state = EngineState::Running;
    }

    /// Takes effect at the next tick boundary; a tick in progress always
    /// completes.
    pub fn stop(&mut self) {
        self.state = EngineState::Stopped;
    }

    pub fn scenario_name(&self) -> &str {
        &self.settings.scenario_name
    }

    pub fn tick(
        &mut self,
        world: &mut World,
        now: DateTime<Utc>,
    ) -> Result<TickReport, EngineError> {
        if self.state != EngineState::Running {
            return Err(EngineError::NotRunning);
        }
        let tick = world.tick() + 1;
        let sim_time = world.planet().game_time(now);
        let checkpoint = world.checkpoint();
        world.begin_tick(sim_time);

        let ctx = SystemContext {
            tick,
            now,
            sim_time,
            scenario_name: &self.settings.scenario_name,
        };
        for system in &mut self.systems {
            let mut rng_stream = self.rng.stream(system.name());
            if let Err(source) = system.run(&ctx, world, &mut rng_stream) {
                world.restore(checkpoint);
                warn!(tick, system = system.name(), error = %source, "tick rolled back");
                return Err(EngineError::TickAborted { tick, source });
            }
        }

        let state = world.finish_tick();
        let demand = state.demand.unwrap_or_default();
        let (served, unserved) = state.records.iter().fold((0_u64, 0_u64), |(s, u), r| {
            if r.is_served() {
                (s.saturating_add(r.count), u)
            } else {
                (s, u.saturating_add(r.count))
            }
        });
        let report = TickReport {
            tick,
            simulated_time: sim_time,
            active_people: demand.people,
            active_customers: demand.customers,
            total_population: world.total_population(),
            customer_ratio: demand.customer_ratio,
            customers: world.planet().customers(),
            served,
            unserved,
            account_balance: world.account_balance(),
            outages: state.outages,
            hosts: state.hosts,
            records: state.records,
        };
        debug!(
            tick,
            simulated_time = %report.simulated_time,
            active_customers = report.active_customers,
            served,
            unserved,
            balance = report.account_balance,
            "tick complete"
        );
        Ok(report)
    }

    /// Start the engine and run up to `ticks` ticks back to back, asking
    /// `now` for the wall-clock instant of each one. Stops early if the hook
    /// stops the engine.
    pub fn run_with_hook<N, H>(
        &mut self,
        world: &mut World,
        ticks: u64,
        mut now: N,
        mut hook: H,
    ) -> Result<(), EngineError>
    where
        N: FnMut() -> DateTime<Utc>,
        H: FnMut(&mut Engine, &TickReport),
    {
        self.start();
        for _ in 0..ticks {
            if self.state == EngineState::Stopped {
                break;
            }
            let report = self.tick(world, now())?;
            hook(self, &report);
        }
        self.stop();
        Ok(())
    }
}

pub struct SystemContext<'a> {
    pub tick: u64,
    pub now: DateTime<Utc>,
    pub sim_time: DateTime<Utc>,
    pub scenario_name: &'a str,
}

pub trait System {
    fn name(&self) -> &str;
    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        rng: &mut SystemRng<'_>,
    ) -> anyhow::Result<()>;
}
