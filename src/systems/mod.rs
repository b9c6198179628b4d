mod allocation;
mod catastrophe;
mod demand;
mod feedback;
mod provisioning;

pub use allocation::AllocationSystem;
pub use catastrophe::CatastropheSystem;
pub use demand::DemandSystem;
pub use feedback::FeedbackSystem;
pub use provisioning::ProvisioningSystem;

use crate::engine::EngineBuilder;

/// Register the tick steps in their required order: demand, provisioning
/// and prepayment, assignment, payment outages, feedback.
pub fn with_tick_systems(builder: EngineBuilder) -> EngineBuilder {
    builder
        .with_system(DemandSystem::new())
        .with_system(ProvisioningSystem::new())
        .with_system(AllocationSystem::new())
        .with_system(CatastropheSystem::new())
        .with_system(FeedbackSystem::new())
}
