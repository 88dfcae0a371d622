pub mod animal;
pub mod clock;
pub mod engine;
pub mod entity;
pub mod field;
pub mod plant;
pub mod report;
pub mod rng;
pub mod scenario;
pub mod spatial;
pub mod species;
pub mod systems;
pub mod world;

pub use engine::{Engine, EngineBuilder, EngineSettings, RunSummary, StepSummary};
pub use scenario::{Scenario, ScenarioLoader};
pub use world::World;
