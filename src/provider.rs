//! Hosting providers and the per-tick hosts provisioned from them.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::geo::Coords;
use crate::population::CandidateSite;

pub const HOME_PROVIDER: &str = "home";
const HOME_CAPACITY: u64 = 100;

const CANDIDATE_CAPACITY: u64 = 100;
const CANDIDATE_MAX_UNITS: u32 = 10;
const CANDIDATE_PRICE: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    Home,
    Big,
    Candidate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provider {
    pub name: String,
    pub kind: ProviderKind,
    pub coords: Coords,
    pub capacity_per_unit: u64,
    /// `None` means no limit on units.
    pub max_units: Option<u32>,
    pub price_per_unit: f64,
    pub active: bool,
}

impl Provider {
    pub fn home(coords: Coords) -> Self {
        Self {
            name: HOME_PROVIDER.to_string(),
            kind: ProviderKind::Home,
            coords,
            capacity_per_unit: HOME_CAPACITY,
            max_units: Some(1),
            price_per_unit: 0.0,
            active: true,
        }
    }

    pub fn big(entry: &BigProvider) -> Self {
        Self {
            name: entry.name.clone(),
            kind: ProviderKind::Big,
            coords: Coords::new(entry.lng, entry.lat),
            capacity_per_unit: entry.capacity_per_unit,
            max_units: None,
            price_per_unit: entry.price_per_unit,
            active: true,
        }
    }

    /// Dormant site; capacity and price are placeholders until activation.
    pub fn candidate(site: &CandidateSite) -> Self {
        Self {
            name: site.name.clone(),
            kind: ProviderKind::Candidate,
            coords: site.coords(),
            capacity_per_unit: CANDIDATE_CAPACITY,
            max_units: Some(CANDIDATE_MAX_UNITS),
            price_per_unit: CANDIDATE_PRICE,
            active: false,
        }
    }
}

/// Always-on provider with unlimited units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BigProvider {
    pub name: String,
    pub lng: f64,
    pub lat: f64,
    pub capacity_per_unit: u64,
    pub price_per_unit: f64,
}

impl BigProvider {
    pub fn defaults() -> Vec<Self> {
        vec![
            Self {
                name: "dublin".into(),
                lng: -6.26,
                lat: 53.35,
                capacity_per_unit: 1_000,
                price_per_unit: 25.0,
            },
            Self {
                name: "hong-kong".into(),
                lng: 114.17,
                lat: 22.32,
                capacity_per_unit: 1_000,
                price_per_unit: 25.0,
            },
        ]
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.price_per_unit.is_finite() || self.price_per_unit < 0.0 {
            return Err(ConfigError::InvalidPrice {
                provider: self.name.clone(),
                price: self.price_per_unit,
            });
        }
        if self.capacity_per_unit == 0 {
            return Err(ConfigError::InvalidCapacity {
                provider: self.name.clone(),
            });
        }
        Ok(())
    }
}

/// One configured "run this many units at that provider" entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployment {
    pub provider: String,
    pub quantity: u32,
}

impl Deployment {
    pub fn new(provider: impl Into<String>, quantity: u32) -> Self {
        Self {
            provider: provider.into(),
            quantity,
        }
    }
}

/// The home provider must be deployed with at least one unit.
pub fn check_home_deployment(deployments: &[Deployment]) -> Result<(), ConfigError> {
    let Some(home) = deployments.iter().find(|d| d.provider == HOME_PROVIDER) else {
        return Err(ConfigError::MissingHomeDeployment(HOME_PROVIDER.to_string()));
    };
    if home.quantity == 0 {
        return Err(ConfigError::EmptyHomeDeployment {
            provider: HOME_PROVIDER.to_string(),
        });
    }
    Ok(())
}

#[derive(Debug, Clone, Default)]
pub struct ProviderCatalog {
    providers: Vec<Provider>,
}

impl ProviderCatalog {
    /// Home provider first, then the big providers, then dormant candidates.
    /// Later entries never shadow an earlier name.
    pub fn new(home: Coords, big: &[BigProvider], candidates: &[CandidateSite]) -> Self {
        let mut catalog = Self::default();
        catalog.insert(Provider::home(home));
        for entry in big {
            catalog.insert(Provider::big(entry));
        }
        for site in candidates {
            catalog.insert(Provider::candidate(site));
        }
        catalog
    }

    /// Adds `provider` unless the name is taken. Returns whether it was added.
    pub fn insert(&mut self, provider: Provider) -> bool {
        if self.get(&provider.name).is_some() {
            return false;
        }
        self.providers.push(provider);
        true
    }

    pub fn get(&self, name: &str) -> Option<&Provider> {
        self.providers.iter().find(|p| p.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Provider> {
        self.providers.iter_mut().find(|p| p.name == name)
    }

    pub fn home(&self) -> Option<&Provider> {
        self.get(HOME_PROVIDER)
    }

    pub fn providers(&self) -> &[Provider] {
        &self.providers
    }

    pub fn active(&self) -> impl Iterator<Item = &Provider> {
        self.providers.iter().filter(|p| p.active)
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

/// A provider instantiated at a quantity for a single tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvisionedHost {
    pub provider: String,
    pub coords: Coords,
    pub quantity: u32,
    pub cost: f64,
    pub capacity: u64,
    pub paid: f64,
    pub unallocated: u64,
}

impl ProvisionedHost {
    pub fn from_provider(provider: &Provider, configured: u32) -> Self {
        let quantity = match provider.max_units {
            Some(max) => configured.min(max),
            None => configured,
        };
        let capacity = (quantity as u64).saturating_mul(provider.capacity_per_unit);
        Self {
            provider: provider.name.clone(),
            coords: provider.coords,
            quantity,
            cost: quantity as f64 * provider.price_per_unit,
            capacity,
            paid: 0.0,
            unallocated: capacity,
        }
    }

    pub fn is_paid(&self) -> bool {
        self.paid >= self.cost
    }
}
