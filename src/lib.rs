pub mod allocation;
pub mod clock;
pub mod distributions;
pub mod engine;
pub mod error;
pub mod geo;
pub mod planet;
pub mod population;
pub mod provider;
pub mod region;
pub mod rng;
pub mod scenario;
pub mod systems;
pub mod world;

pub use engine::{Engine, EngineBuilder, EngineError, EngineSettings, EngineState, TickReport};
pub use error::ConfigError;
pub use scenario::{Scenario, ScenarioLoader};
pub use world::World;
