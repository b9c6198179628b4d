//! The planet-wide customer base: a fixed lat/lng grid of regions plus the
//! simulated clock that drives their daily activity.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::clock::SimulationClock;
use crate::error::ConfigError;
use crate::geo::Bounds;
use crate::population::PopulationSource;
use crate::region::{Region, RegionActivity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSize {
    pub lat_divisions: u32,
    pub lng_divisions: u32,
}

impl Default for GridSize {
    fn default() -> Self {
        Self {
            lat_divisions: 10,
            lng_divisions: 10,
        }
    }
}

/// Demand for one tick. `per_region` is index-aligned with
/// [`Planet::regions`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActiveDemand {
    pub people: u64,
    pub customers: u64,
    pub people_ratio: f64,
    pub customer_ratio: f64,
    pub per_region: Vec<RegionActivity>,
}

pub struct Planet {
    grid: GridSize,
    regions: Vec<Region>,
    population: u64,
    home: Option<usize>,
    clock: SimulationClock,
}

impl Planet {
    /// Tile the globe into `lat_divisions * lng_divisions` empty regions,
    /// south-west corner first, longitude varying fastest.
    pub fn new(grid: GridSize, clock: SimulationClock) -> Result<Self, ConfigError> {
        if grid.lat_divisions == 0 || grid.lng_divisions == 0 {
            return Err(ConfigError::InvalidGrid {
                lat: grid.lat_divisions,
                lng: grid.lng_divisions,
            });
        }
        let size_lat = 180.0 / grid.lat_divisions as f64;
        let size_lng = 360.0 / grid.lng_divisions as f64;
        let mut regions = Vec::with_capacity((grid.lat_divisions * grid.lng_divisions) as usize);
        for lat in 0..grid.lat_divisions {
            for lng in 0..grid.lng_divisions {
                let south = lat as f64 * size_lat - 90.0;
                let west = lng as f64 * size_lng - 180.0;
                // last row/column snap to the exact edge so nothing falls outside
                let north = if lat + 1 == grid.lat_divisions {
                    90.0
                } else {
                    south + size_lat
                };
                let east = if lng + 1 == grid.lng_divisions {
                    180.0
                } else {
                    west + size_lng
                };
                regions.push(Region::new(Bounds {
                    south,
                    north,
                    west,
                    east,
                }));
            }
        }
        Ok(Self {
            grid,
            regions,
            population: 0,
            home: None,
            clock,
        })
    }

    /// Load each region's population from `source`, spread `customers` over
    /// the regions by population share and pick the home region uniformly
    /// among the populated ones.
    pub fn populate<S, R>(
        &mut self,
        source: &S,
        customers: f64,
        rng: &mut R,
    ) -> Result<(), ConfigError>
    where
        S: PopulationSource + ?Sized,
        R: Rng + ?Sized,
    {
        if !customers.is_finite() || customers < 0.0 {
            return Err(ConfigError::InvalidCustomers(customers));
        }
        let mut total = 0_u64;
        for (index, region) in self.regions.iter_mut().enumerate() {
            let population = match source.population_within(&region.bounds) {
                Some(value) if value.is_finite() && value > 0.0 => value.round() as u64,
                Some(_) => 0,
                None => {
                    debug!(region = index, "no population data, treating as empty");
                    0
                }
            };
            region.population = population;
            region.is_home = false;
            total = total.saturating_add(population);
        }
        self.population = total;

        let populated: Vec<usize> = self
            .regions
            .iter()
            .enumerate()
            .filter(|(_, r)| r.population > 0)
            .map(|(index, _)| index)
            .collect();
        if populated.is_empty() {
            return Err(ConfigError::Unpopulated);
        }

        for region in &mut self.regions {
            region.population_ratio = region.population as f64 / total as f64;
            region.customers = region.population_ratio * customers;
            region.customer_baseline = if region.population > 0 {
                region.customers / region.population as f64
            } else {
                0.0
            };
        }

        let home = populated[rng.gen_range(0..populated.len())];
        self.regions[home].is_home = true;
        self.home = Some(home);

        info!(
            population = total,
            populated_regions = populated.len(),
            home_region = home,
            "planet populated"
        );
        Ok(())
    }

    pub fn calc_active<R: Rng + ?Sized>(
        &self,
        sim_time: DateTime<Utc>,
        rng: &mut R,
    ) -> ActiveDemand {
        let per_region: Vec<RegionActivity> = self
            .regions
            .iter()
            .map(|region| region.calc_active(sim_time, rng))
            .collect();
        let people = per_region
            .iter()
            .fold(0_u64, |sum, a| sum.saturating_add(a.people));
        let customers = per_region
            .iter()
            .fold(0_u64, |sum, a| sum.saturating_add(a.customers));

        let total_customers = self.customers();
        ActiveDemand {
            people,
            customers,
            people_ratio: ratio(people as f64, self.population as f64),
            customer_ratio: ratio(customers as f64, total_customers),
            per_region,
        }
    }

    pub fn game_time(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.clock.game_time(now)
    }

    pub fn clock(&self) -> &SimulationClock {
        &self.clock
    }

    pub fn grid(&self) -> GridSize {
        self.grid
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn regions_mut(&mut self) -> &mut [Region] {
        &mut self.regions
    }

    pub fn population(&self) -> u64 {
        self.population
    }

    /// Current customer base summed over all regions.
    pub fn customers(&self) -> f64 {
        self.regions.iter().map(|r| r.customers).sum()
    }

    pub fn home_index(&self) -> Option<usize> {
        self.home
    }

    pub fn home_region(&self) -> Option<&Region> {
        self.home.map(|index| &self.regions[index])
    }

    /// Index of the region containing the point, if any.
    pub fn region_at(&self, lat: f64, lng: f64) -> Option<usize> {
        self.regions.iter().position(|r| r.contains(lat, lng))
    }
}

fn ratio(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        part / whole
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use crate::population::{PopulationSample, SampleSet};

    fn clock() -> SimulationClock {
        SimulationClock::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(), 60.0).unwrap()
    }

    fn sample(lng: f64, lat: f64, population: f64) -> PopulationSample {
        PopulationSample {
            lng,
            lat,
            year: 2020,
            population,
            area: 1.0,
        }
    }

    #[test]
    fn rejects_empty_grid() {
        let grid = GridSize {
            lat_divisions: 0,
            lng_divisions: 4,
        };
        assert!(matches!(
            Planet::new(grid, clock()),
            Err(ConfigError::InvalidGrid { lat: 0, lng: 4 })
        ));
    }

    #[test]
    fn two_by_two_grid_partitions_the_globe() {
        let grid = GridSize {
            lat_divisions: 2,
            lng_divisions: 2,
        };
        let planet = Planet::new(grid, clock()).unwrap();
        assert_eq!(planet.regions().len(), 4);

        let mut lat = -90.0;
        while lat < 90.0 {
            let mut lng = -180.0;
            while lng < 180.0 {
                let owners = planet
                    .regions()
                    .iter()
                    .filter(|r| r.contains(lat, lng))
                    .count();
                assert_eq!(owners, 1, "point ({lat}, {lng}) owned by {owners} regions");
                lng += 7.5;
            }
            lat += 7.5;
        }

        let area: f64 = planet
            .regions()
            .iter()
            .map(|r| (r.bounds.north - r.bounds.south) * (r.bounds.east - r.bounds.west))
            .sum();
        assert_eq!(area, 180.0 * 360.0);
        assert_eq!(planet.region_at(0.0, 0.0), Some(3));
        assert_eq!(planet.region_at(-90.0, -180.0), Some(0));
    }

    #[test]
    fn populate_spreads_customers_by_population_share() {
        let grid = GridSize {
            lat_divisions: 2,
            lng_divisions: 2,
        };
        let mut planet = Planet::new(grid, clock()).unwrap();
        let source = SampleSet::for_year(
            vec![sample(10.0, 10.0, 300.0), sample(-10.0, -10.0, 100.0)],
            2020,
        );
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        planet.populate(&source, 40.0, &mut rng).unwrap();

        assert_eq!(planet.population(), 400);
        assert!((planet.customers() - 40.0).abs() < 1e-9);
        let north_east = &planet.regions()[3];
        assert_eq!(north_east.population, 300);
        assert!((north_east.customers - 30.0).abs() < 1e-9);
        assert!((north_east.customer_baseline - 0.1).abs() < 1e-9);

        let home = planet.home_region().unwrap();
        assert!(home.population > 0);
        assert_eq!(planet.regions().iter().filter(|r| r.is_home).count(), 1);
    }

    #[test]
    fn populate_without_people_is_a_config_error() {
        let mut planet = Planet::new(GridSize::default(), clock()).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let result = planet.populate(&SampleSet::default(), 10.0, &mut rng);
        assert!(matches!(result, Err(ConfigError::Unpopulated)));
    }

    #[test]
    fn oversized_population_saturates() {
        let grid = GridSize {
            lat_divisions: 1,
            lng_divisions: 2,
        };
        let mut planet = Planet::new(grid, clock()).unwrap();
        let source = SampleSet::for_year(
            vec![sample(-90.0, 0.0, 1e19), sample(90.0, 0.0, 1e19)],
            2020,
        );
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        planet.populate(&source, 100.0, &mut rng).unwrap();
        assert_eq!(planet.population(), u64::MAX);
        assert_eq!(planet.grid(), grid);

        let at = planet.game_time(planet.clock().start());
        let demand = planet.calc_active(at, &mut rng);
        assert!(demand.people > 0);
        assert!(demand.customers as f64 <= planet.customers());
    }

    #[test]
    fn calc_active_aggregates_regions() {
        let mut planet = Planet::new(GridSize::default(), clock()).unwrap();
        let source = SampleSet::for_year(
            vec![
                sample(2.0, 50.0, 5_000.0),
                sample(120.0, 30.0, 8_000.0),
                sample(-75.0, 40.0, 3_000.0),
            ],
            2020,
        );
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        planet.populate(&source, 1_600.0, &mut rng).unwrap();

        let at = planet.game_time(Utc.with_ymd_and_hms(2024, 1, 1, 0, 5, 0).unwrap());
        let demand = planet.calc_active(at, &mut rng);
        assert_eq!(demand.per_region.len(), planet.regions().len());
        assert_eq!(
            demand.people,
            demand.per_region.iter().map(|a| a.people).sum::<u64>()
        );
        assert_eq!(
            demand.customers,
            demand.per_region.iter().map(|a| a.customers).sum::<u64>()
        );
        assert!(demand.people > 0 && demand.people <= planet.population());
        assert!(demand.people_ratio > 0.0 && demand.people_ratio <= 1.0);
        assert!(demand.customer_ratio <= 1.0);
        for (region, active) in planet.regions().iter().zip(&demand.per_region) {
            if region.population == 0 {
                assert_eq!(*active, RegionActivity::default());
            }
        }
    }
}
