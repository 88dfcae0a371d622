use tracing::trace;

use crate::{
    engine::{StepContext, System},
    rng::SimRng,
    world::World,
};

pub struct FaunaSystem;

impl FaunaSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FaunaSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for FaunaSystem {
    fn name(&self) -> &'static str {
        "fauna"
    }

    fn run(&mut self, ctx: &StepContext<'_>, world: &mut World, rng: &mut SimRng) {
        world.animal_pass(rng);
        let ledger = world.ledger();
        trace!(
            step = ctx.step,
            births = ledger.births,
            predation = ledger.predation,
            grazed = ledger.grazed,
            starvation = ledger.starvation,
            "animal pass done"
        );
    }
}
