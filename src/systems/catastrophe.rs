use anyhow::Result;
use tracing::info;

use crate::{
    allocation::apply_catastrophe,
    engine::{System, SystemContext},
    rng::SystemRng,
    world::World,
};

/// Hosts that could not be fully paid go dark: everything they served this
/// tick becomes unserved demand.
pub struct CatastropheSystem;

impl CatastropheSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CatastropheSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for CatastropheSystem {
    fn name(&self) -> &str {
        "catastrophe"
    }

    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        _rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        let state = &mut world.tick_state;
        for host in state.hosts.iter().filter(|h| !h.is_paid()) {
            info!(
                tick = ctx.tick,
                host = %host.provider,
                paid = host.paid,
                cost = host.cost,
                "host unpaid, outage"
            );
            state.outages.push(host.provider.clone());
        }
        apply_catastrophe(&mut state.records, &state.hosts);
        Ok(())
    }
}
