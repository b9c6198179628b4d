//! Population-density input.
//!
//! The planet only needs "how many people live inside these bounds". Any
//! dataset that can answer that implements [`PopulationSource`]; the bundled
//! [`SampleSet`] answers it from gridded `(lng, lat, year, population, area)`
//! samples filtered to one year.

use serde::{Deserialize, Serialize};

use crate::geo::{Bounds, Coords};

pub trait PopulationSource {
    /// Summed population inside `bounds`, or `None` when the source has no
    /// usable data for that cell.
    fn population_within(&self, bounds: &Bounds) -> Option<f64>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationSample {
    pub lng: f64,
    pub lat: f64,
    pub year: i32,
    pub population: f64,
    #[serde(default)]
    pub area: f64,
}

impl PopulationSample {
    pub fn density(&self) -> Option<f64> {
        if self.area > 0.0 {
            Some(self.population / self.area)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateSite {
    pub name: String,
    pub lng: f64,
    pub lat: f64,
}

impl CandidateSite {
    pub fn coords(&self) -> Coords {
        Coords::new(self.lng, self.lat)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SampleSet {
    samples: Vec<PopulationSample>,
}

impl SampleSet {
    /// Keep only the samples recorded for `year` with a finite, positive
    /// population.
    pub fn for_year(samples: impl IntoIterator<Item = PopulationSample>, year: i32) -> Self {
        let samples = samples
            .into_iter()
            .filter(|s| s.year == year && s.population.is_finite() && s.population > 0.0)
            .collect();
        Self { samples }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.samples.iter().map(|s| s.population).sum()
    }

    /// The `limit` densest samples, ranked highest first, as candidate
    /// hosting sites. Samples without an area are skipped.
    pub fn candidate_sites(&self, limit: usize) -> Vec<CandidateSite> {
        let mut ranked: Vec<(f64, &PopulationSample)> = self
            .samples
            .iter()
            .filter_map(|s| s.density().map(|d| (d, s)))
            .collect();
        ranked.sort_by(|a, b| b.0.total_cmp(&a.0));
        ranked
            .into_iter()
            .take(limit)
            .enumerate()
            .map(|(rank, (_, sample))| CandidateSite {
                name: format!("site-{}", rank + 1),
                lng: sample.lng,
                lat: sample.lat,
            })
            .collect()
    }
}

impl PopulationSource for SampleSet {
    fn population_within(&self, bounds: &Bounds) -> Option<f64> {
        let mut found = false;
        let mut total = 0.0;
        for sample in &self.samples {
            if bounds.contains(sample.lat, sample.lng) {
                found = true;
                total += sample.population;
            }
        }
        found.then_some(total)
    }
}
