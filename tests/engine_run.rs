use std::collections::HashSet;

use canopy::{
    entity::Lifecycle,
    scenario::{Scenario, ScenarioLoader},
    species::{AnimalKind, PlantKind, Species},
    world::CellView,
    Engine,
};

fn small_scenario(seed: u64) -> Scenario {
    let yaml = format!(
        "name: plot\nseed: {seed}\ngrid:\n  depth: 30\n  width: 40\nclock:\n  start_step: 6\n"
    );
    Scenario::from_yaml(&yaml).expect("scenario should parse")
}

fn cells(engine: &Engine) -> Vec<CellView> {
    engine.world().cells().collect()
}

#[test]
fn identical_engines_seed_identical_fields() {
    let scenario = small_scenario(77);
    let first = Engine::from_scenario(&scenario);
    let second = Engine::from_scenario(&scenario);

    assert_eq!(cells(&first), cells(&second));
    assert!(first.world().census().total() > 0);
}

#[test]
fn identical_engines_stay_in_lockstep() {
    let scenario = small_scenario(78);
    let mut first = Engine::from_scenario(&scenario);
    let mut second = Engine::from_scenario(&scenario);

    let mut first_counts = Vec::new();
    first.run_with_hook(60, |summary, _| first_counts.push(summary.census.clone()));
    let mut second_counts = Vec::new();
    second.run_with_hook(60, |summary, _| second_counts.push(summary.census.clone()));

    assert_eq!(first_counts, second_counts);
    assert_eq!(cells(&first), cells(&second));
}

#[test]
fn different_seeds_seed_different_fields() {
    let first = Engine::from_scenario(&small_scenario(1));
    let second = Engine::from_scenario(&small_scenario(2));

    assert_ne!(cells(&first), cells(&second));
}

#[test]
fn single_species_world_runs_zero_steps() {
    let mut engine = Engine::from_scenario(&small_scenario(3));
    for kind in AnimalKind::ALL {
        engine.world_mut().cull(Species::Animal(kind));
    }
    engine.world_mut().cull(Species::Plant(PlantKind::FruitTree));
    let start = engine.current_step();

    assert!(!engine.world().is_viable());
    let summary = engine.run(25);

    assert_eq!(summary.steps_run, 0);
    assert!(summary.stopped_early);
    assert_eq!(engine.current_step(), start);
}

#[test]
fn every_cell_holds_at_most_one_live_occupant_per_layer() {
    let mut engine = Engine::from_scenario(&small_scenario(4));

    let summary = engine.run_with_hook(200, |summary, world| {
        let field = world.current_field();

        let mut seen = HashSet::new();
        for (loc, id) in field.animal_cells() {
            assert!(seen.insert(id), "step {}: animal {id:?} placed twice", summary.step);
            let animal = world
                .animal(id)
                .unwrap_or_else(|| panic!("step {}: dangling animal {id:?}", summary.step));
            assert!(animal.is_alive());
            assert_eq!(animal.location(), Some(loc));
        }
        assert_eq!(seen.len(), field.animal_ids().len());

        let mut seen = HashSet::new();
        for (loc, id) in field.plant_cells() {
            assert!(seen.insert(id), "step {}: plant {id:?} placed twice", summary.step);
            let plant = world
                .plant(id)
                .unwrap_or_else(|| panic!("step {}: dangling plant {id:?}", summary.step));
            assert!(plant.is_alive());
            assert_eq!(plant.location(), Some(loc));
        }
        assert_eq!(seen.len(), field.plant_ids().len());

        assert_eq!(world.animal_count() + world.plant_count(), summary.census.total());
    });

    assert!(summary.steps_run > 0);
}

#[test]
fn hook_sees_consecutive_steps() {
    let mut engine = Engine::from_scenario(&small_scenario(5));
    let start = engine.current_step();

    let mut steps = Vec::new();
    let summary = engine.run_with_hook(12, |summary, _| steps.push(summary.step));

    assert_eq!(steps.len() as u64, summary.steps_run);
    assert_eq!(steps.first().copied(), Some(start + 1));
    assert!(steps.windows(2).all(|pair| pair[1] == pair[0] + 1));
}

#[test]
fn bundled_scenario_runs() {
    let loader = ScenarioLoader::new(env!("CARGO_MANIFEST_DIR"));
    let mut scenario = loader
        .load("scenarios/rainforest.yaml")
        .expect("scenario should load");
    scenario.grid.depth = 25;
    scenario.grid.width = 25;

    let mut engine = Engine::from_scenario(&scenario);
    let summary = engine.run(48);

    assert!(summary.steps_run <= 48);
    assert_eq!(engine.scenario_name(), "rainforest");
}
