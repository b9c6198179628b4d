//! Errors reported while turning a scenario into a runnable world.
//!
//! Every variant is fatal and surfaces before the first tick.

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("grid needs at least one division per axis (got {lat} x {lng})")]
    InvalidGrid { lat: u32, lng: u32 },

    #[error("deployment references unknown provider '{0}'")]
    UnknownProvider(String),

    #[error("deployments must include the '{0}' provider")]
    MissingHomeDeployment(String),

    #[error("the '{provider}' deployment needs at least one unit")]
    EmptyHomeDeployment { provider: String },

    #[error("provider '{provider}' price per unit must be finite and non-negative (got {price})")]
    InvalidPrice { provider: String, price: f64 },

    #[error("provider '{provider}' needs a non-zero capacity per unit")]
    InvalidCapacity { provider: String },

    #[error("population source has no populated region to host the home provider")]
    Unpopulated,

    #[error("time rate must be finite and positive (got {0})")]
    InvalidTimeRate(f64),

    #[error("account balance must be finite and non-negative (got {0})")]
    InvalidBalance(f64),

    #[error("total customers must be finite and non-negative (got {0})")]
    InvalidCustomers(f64),
}
