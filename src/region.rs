use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::distributions::solar;
use crate::geo::{Bounds, Coords};

const DAY_MS: i64 = 86_400_000;
const HOUR_MS: f64 = 3_600_000.0;

/// One grid cell of the planet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Region {
    pub bounds: Bounds,
    pub center: Coords,
    /// Hours east of the antimeridian, in `[0, 24]`.
    pub timezone: f64,
    pub population: u64,
    /// Share of the planet's population living here.
    pub population_ratio: f64,
    /// Customers per inhabitant at load time.
    pub customer_baseline: f64,
    /// Potential customers; grows or shrinks with service quality.
    pub customers: f64,
    pub is_home: bool,
}

/// People and customers online in one region during one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionActivity {
    pub people: u64,
    pub customers: u64,
}

impl Region {
    pub fn new(bounds: Bounds) -> Self {
        let center = bounds.center();
        Self {
            bounds,
            center,
            timezone: ((center.lng + 180.0) / 360.0) * 24.0,
            population: 0,
            population_ratio: 0.0,
            customer_baseline: 0.0,
            customers: 0.0,
            is_home: false,
        }
    }

    pub fn contains(&self, lat: f64, lng: f64) -> bool {
        self.bounds.contains(lat, lng)
    }

    /// Fraction of the local day elapsed at `sim_time`, in `[0, 1)`.
    pub fn local_day_position(&self, sim_time: DateTime<Utc>) -> f64 {
        let utc_ms = sim_time.timestamp_millis().rem_euclid(DAY_MS) as f64;
        let local_ms = (utc_ms + self.timezone * HOUR_MS).rem_euclid(DAY_MS as f64);
        local_ms / DAY_MS as f64
    }

    pub fn calc_active<R: Rng + ?Sized>(
        &self,
        sim_time: DateTime<Utc>,
        rng: &mut R,
    ) -> RegionActivity {
        if self.population == 0 {
            return RegionActivity::default();
        }
        let population = self.population as f64;
        let mode = self.local_day_position(sim_time) * (population - 1.0) + 1.0;
        let people = solar(1.0, population, mode, rng).floor() as u64;

        let mut customers = ((people as f64 / population) * self.customers.max(0.0)).floor() as u64;
        if self.is_home && customers < 1 && people > 0 {
            customers = 1;
        }
        RegionActivity { people, customers }
    }
}
