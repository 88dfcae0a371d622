use crate::{
    engine::{StepContext, System},
    rng::SimRng,
    world::World,
};

/// Advances the clock once per step, before any entity acts.
pub struct WeatherSystem;

impl WeatherSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for WeatherSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for WeatherSystem {
    fn name(&self) -> &'static str {
        "weather"
    }

    fn run(&mut self, _ctx: &StepContext<'_>, world: &mut World, rng: &mut SimRng) {
        world.advance_clock(rng);
    }
}
