use anyhow::{ensure, Result};

use crate::{
    allocation::apply_feedback,
    engine::{System, SystemContext},
    rng::SystemRng,
    world::World,
};

/// Service quality compounds into next tick's customer base.
pub struct FeedbackSystem;

impl FeedbackSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FeedbackSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for FeedbackSystem {
    fn name(&self) -> &str {
        "feedback"
    }

    fn run(
        &mut self,
        _ctx: &SystemContext,
        world: &mut World,
        _rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        let records = &world.tick_state.records;
        for record in records {
            ensure!(
                record.satisfaction().is_finite(),
                "non-finite satisfaction for region {}",
                record.region
            );
        }
        apply_feedback(world.planet.regions_mut(), records);
        Ok(())
    }
}
