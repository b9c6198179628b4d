use anyhow::Result;

use crate::{
    allocation::{prepay, provision},
    engine::{System, SystemContext},
    rng::SystemRng,
    world::World,
};

/// Turns the configured deployments into this tick's hosts and settles their
/// cost against the account, in deployment order.
pub struct ProvisioningSystem;

impl ProvisioningSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ProvisioningSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for ProvisioningSystem {
    fn name(&self) -> &str {
        "provisioning"
    }

    fn run(
        &mut self,
        _ctx: &SystemContext,
        world: &mut World,
        _rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        let mut hosts = provision(&world.catalog, &world.deployments);
        prepay(&mut hosts, &mut world.account_balance);
        world.tick_state.hosts = hosts;
        Ok(())
    }
}
