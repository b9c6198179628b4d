use anyhow::Result;

use crate::{
    engine::{System, SystemContext},
    rng::SystemRng,
    world::World,
};

/// Samples how many people and customers are online in every region at the
/// tick's simulated time.
pub struct DemandSystem;

impl DemandSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DemandSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for DemandSystem {
    fn name(&self) -> &str {
        "demand"
    }

    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        let demand = world.planet.calc_active(ctx.sim_time, rng);
        world.tick_state.demand = Some(demand);
        Ok(())
    }
}
