//! Greedy geographic allocation of regional demand onto provisioned hosts.
//!
//! Each function is one step of a tick and works on plain slices, so the
//! systems in [`crate::systems`] only move data between the world and here.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::geo::MAX_DISTANCE;
use crate::provider::{Deployment, ProviderCatalog, ProvisionedHost};
use crate::region::{Region, RegionActivity};

/// Which host a region drains first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostOrder {
    #[default]
    NearestFirst,
    /// Reproduces the legacy comparator, which picked the farthest host.
    FarthestFirst,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AllocationRecord {
    pub region: usize,
    /// Index into the tick's hosts; `None` is unserved demand.
    pub host: Option<usize>,
    pub count: u64,
    pub distance: f64,
}

impl AllocationRecord {
    pub fn unserved(region: usize, count: u64) -> Self {
        Self {
            region,
            host: None,
            count,
            distance: MAX_DISTANCE,
        }
    }

    pub fn is_served(&self) -> bool {
        self.host.is_some()
    }

    /// Positive when served close to the region, `-0.5` when unserved.
    pub fn satisfaction(&self) -> f64 {
        0.5 - (self.distance / MAX_DISTANCE).clamp(0.0, 1.0)
    }
}

/// Instantiate every deployment whose provider exists and is active, in
/// deployment order.
pub fn provision(catalog: &ProviderCatalog, deployments: &[Deployment]) -> Vec<ProvisionedHost> {
    deployments
        .iter()
        .filter_map(|deployment| {
            catalog
                .get(&deployment.provider)
                .filter(|provider| provider.active)
                .map(|provider| ProvisionedHost::from_provider(provider, deployment.quantity))
        })
        .collect()
}

/// Settle each host's cost against `balance` in list order. Later hosts may
/// receive a partial or zero payment; the balance never goes negative.
/// A negative cost is never refunded and a non-finite one is never paid.
pub fn prepay(hosts: &mut [ProvisionedHost], balance: &mut f64) {
    for host in hosts.iter_mut() {
        let due = if host.cost.is_finite() {
            host.cost.max(0.0)
        } else {
            0.0
        };
        let paid = due.min(balance.max(0.0));
        host.paid = paid;
        *balance = (*balance - paid).max(0.0);
    }
}

/// Drain each region's active customers into hosts ordered by distance from
/// the region's center. Any leftover becomes one unserved record.
pub fn assign(
    regions: &[Region],
    demand: &[RegionActivity],
    hosts: &mut [ProvisionedHost],
    order: HostOrder,
) -> Vec<AllocationRecord> {
    let mut records = Vec::new();
    for (index, activity) in demand.iter().enumerate() {
        if activity.customers == 0 {
            continue;
        }
        let Some(region) = regions.get(index) else {
            continue;
        };

        let mut candidates: Vec<(usize, f64)> = hosts
            .iter()
            .enumerate()
            .filter(|(_, host)| host.unallocated > 0)
            .map(|(h, host)| (h, region.center.distance(&host.coords)))
            .collect();
        candidates.sort_by(|a, b| compare_distance(order, a.1, b.1).then(a.0.cmp(&b.0)));

        let mut remaining = activity.customers;
        for (h, distance) in candidates {
            if remaining == 0 {
                break;
            }
            let host = &mut hosts[h];
            let count = host.unallocated.min(remaining);
            host.unallocated -= count;
            remaining -= count;
            records.push(AllocationRecord {
                region: index,
                host: Some(h),
                count,
                distance,
            });
        }
        if remaining > 0 {
            records.push(AllocationRecord::unserved(index, remaining));
        }
    }
    records
}

fn compare_distance(order: HostOrder, a: f64, b: f64) -> Ordering {
    match order {
        HostOrder::NearestFirst => a.total_cmp(&b),
        HostOrder::FarthestFirst => b.total_cmp(&a),
    }
}

/// Turn every record served by a host that was not fully paid into unserved
/// demand. Returns the number of records converted.
pub fn apply_catastrophe(records: &mut [AllocationRecord], hosts: &[ProvisionedHost]) -> usize {
    let mut converted = 0;
    for record in records.iter_mut() {
        let unpaid = record
            .host
            .and_then(|h| hosts.get(h))
            .is_some_and(|host| !host.is_paid());
        if unpaid {
            record.host = None;
            record.distance = MAX_DISTANCE;
            converted += 1;
        }
    }
    converted
}

/// Grow or shrink each origin region's customer base by
/// `satisfaction * count`, never below zero.
pub fn apply_feedback(regions: &mut [Region], records: &[AllocationRecord]) {
    for record in records {
        if let Some(region) = regions.get_mut(record.region) {
            let delta = record.satisfaction() * record.count as f64;
            region.customers = (region.customers + delta).max(0.0);
        }
    }
}
