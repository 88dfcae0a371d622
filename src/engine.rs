use std::time::Instant;

use tracing::{debug, info};

use crate::clock::{TimePhase, Weather};
use crate::report::Census;
use crate::rng::{seeded, SimRng};
use crate::scenario::Scenario;
use crate::systems::{FaunaSystem, FloraSystem, WeatherSystem};
use crate::world::{SeedingTable, StepLedger, World};

pub struct EngineSettings {
    pub scenario_name: String,
    pub seed: u64,
}

pub struct EngineBuilder {
    settings: EngineSettings,
    systems: Vec<Box<dyn System>>,
    seeding: Option<SeedingTable>,
}

impl EngineBuilder {
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            settings,
            systems: Vec::new(),
            seeding: None,
        }
    }

    pub fn with_system(mut self, system: impl System + 'static) -> Self {
        self.systems.push(Box::new(system));
        self
    }

    pub fn push_system(&mut self, system: impl System + 'static) {
        self.systems.push(Box::new(system));
    }

    /// Weather, then animals, then plants.
    pub fn with_default_systems(self) -> Self {
        self.with_system(WeatherSystem::new())
            .with_system(FaunaSystem::new())
            .with_system(FloraSystem::new())
    }

    /// Populate the world from `table` when the engine is built.
    pub fn with_seeding(mut self, table: SeedingTable) -> Self {
        self.seeding = Some(table);
        self
    }

    pub fn build(self, mut world: World) -> Engine {
        let mut rng = seeded(self.settings.seed);
        if let Some(table) = &self.seeding {
            world.seed(table, &mut rng);
        }
        let mut scheduler = Scheduler::default();
        for system in self.systems {
            scheduler.add_system(system);
        }
        Engine {
            world,
            scheduler,
            rng,
            settings: self.settings,
        }
    }
}

pub struct Engine {
    world: World,
    scheduler: Scheduler,
    rng: SimRng,
    settings: EngineSettings,
}

impl Engine {
    pub fn from_scenario(scenario: &Scenario) -> Self {
        let settings = EngineSettings {
            scenario_name: scenario.name.clone(),
            seed: scenario.seed,
        };
        EngineBuilder::new(settings)
            .with_default_systems()
            .with_seeding(scenario.seeding_table())
            .build(scenario.build_world())
    }

    /// Advance one step: clear the next field, run every system, then swap.
    pub fn step(&mut self) -> StepSummary {
        self.world.begin_step();
        let ctx = StepContext {
            step: self.world.clock().step() + 1,
            scenario_name: &self.settings.scenario_name,
        };
        let system_reports = self.scheduler.run(&ctx, &mut self.world, &mut self.rng);
        self.world.finish_step();

        let clock = self.world.clock();
        let census = self.world.census();
        let ledger = self.world.ledger().clone();
        debug!(
            step = clock.step(),
            weather = %clock.weather(),
            population = census.total(),
            births = ledger.births,
            sprouts = ledger.sprouts,
            deaths = ledger.animal_deaths(),
            "step complete"
        );

        StepSummary {
            step: clock.step(),
            day: clock.day(),
            phase: clock.phase(),
            weather: clock.weather(),
            ledger,
            census,
            system_reports,
        }
    }

    pub fn run(&mut self, steps: u64) -> RunSummary {
        self.run_with_hook(steps, |_, _| {})
    }

    /// Run up to `steps` steps, stopping as soon as the world is no longer
    /// viable. The hook sees every summary after the field swap.
    pub fn run_with_hook<F>(&mut self, steps: u64, mut hook: F) -> RunSummary
    where
        F: FnMut(&StepSummary, &World),
    {
        let mut steps_run = 0;
        for _ in 0..steps {
            if !self.world.is_viable() {
                info!(
                    scenario = %self.settings.scenario_name,
                    step = self.world.clock().step(),
                    steps_run,
                    "fewer than two species remain, stopping"
                );
                return RunSummary {
                    steps_run,
                    stopped_early: true,
                };
            }
            let summary = self.step();
            steps_run += 1;
            hook(&summary, &self.world);
        }
        RunSummary {
            steps_run,
            stopped_early: false,
        }
    }

    pub fn current_step(&self) -> u64 {
        self.world.clock().step()
    }

    pub fn scenario_name(&self) -> &str {
        &self.settings.scenario_name
    }

    pub fn system_names(&self) -> Vec<&'static str> {
        self.scheduler.system_names()
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }
}

pub struct StepContext<'a> {
    pub step: u64,
    pub scenario_name: &'a str,
}

pub trait System {
    fn name(&self) -> &'static str;
    fn run(&mut self, ctx: &StepContext<'_>, world: &mut World, rng: &mut SimRng);
}

#[derive(Clone, Debug)]
pub struct SystemRunReport {
    pub name: &'static str,
    pub duration_ms: f64,
}

#[derive(Clone, Debug)]
pub struct StepSummary {
    pub step: u64,
    pub day: u64,
    pub phase: TimePhase,
    pub weather: Weather,
    pub ledger: StepLedger,
    pub census: Census,
    pub system_reports: Vec<SystemRunReport>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunSummary {
    pub steps_run: u64,
    pub stopped_early: bool,
}

#[derive(Default)]
pub struct Scheduler {
    systems: Vec<Box<dyn System>>,
}

impl Scheduler {
    pub fn add_system(&mut self, system: Box<dyn System>) {
        self.systems.push(system);
    }

    pub fn run(
        &mut self,
        ctx: &StepContext<'_>,
        world: &mut World,
        rng: &mut SimRng,
    ) -> Vec<SystemRunReport> {
        let mut reports = Vec::with_capacity(self.systems.len());
        for system in self.systems.iter_mut() {
            let start = Instant::now();
            system.run(ctx, world, rng);
            let elapsed = start.elapsed();
            reports.push(SystemRunReport {
                name: system.name(),
                duration_ms: elapsed.as_secs_f64() * 1_000.0,
            });
        }
        reports
    }

    pub fn system_names(&self) -> Vec<&'static str> {
        self.systems.iter().map(|system| system.name()).collect()
    }
}
