use tracing::trace;

use crate::{
    engine::{StepContext, System},
    rng::SimRng,
    world::World,
};

pub struct FloraSystem;

impl FloraSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FloraSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for FloraSystem {
    fn name(&self) -> &'static str {
        "flora"
    }

    fn run(&mut self, ctx: &StepContext<'_>, world: &mut World, rng: &mut SimRng) {
        world.plant_pass(rng);
        let ledger = world.ledger();
        trace!(
            step = ctx.step,
            sprouts = ledger.sprouts,
            withered = ledger.withered,
            "plant pass done"
        );
    }
}
