use anyhow::{bail, Result};

use crate::{
    allocation::assign,
    engine::{System, SystemContext},
    rng::SystemRng,
    world::World,
};

pub struct AllocationSystem;

impl AllocationSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AllocationSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for AllocationSystem {
    fn name(&self) -> &str {
        "allocation"
    }

    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        _rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        let state = &mut world.tick_state;
        let Some(demand) = state.demand.as_ref() else {
            bail!("no demand computed before allocation in tick {}", ctx.tick);
        };
        state.records = assign(
            world.planet.regions(),
            &demand.per_region,
            &mut state.hosts,
            world.host_order,
        );
        Ok(())
    }
}
