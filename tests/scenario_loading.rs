use std::fs;

use canopy::{
    clock::{Forecast, Weather},
    scenario::{ScenarioError, ScenarioLoader, WeatherSetting},
    spatial::{DEFAULT_DEPTH, DEFAULT_WIDTH},
    species::AnimalKind,
    Engine,
};
use tempfile::tempdir;

#[test]
fn bundled_scenario_loads() {
    let loader = ScenarioLoader::new(env!("CARGO_MANIFEST_DIR"));
    let scenario = loader
        .load("scenarios/rainforest.yaml")
        .expect("scenario should load");

    assert_eq!(scenario.name, "rainforest");
    assert_eq!(scenario.steps(None), 500);
    assert_eq!(scenario.steps(Some(10)), 10);
    assert_eq!(scenario.grid().depth(), 80);
    assert_eq!(scenario.grid().width(), 120);
    assert_eq!(scenario.clock.weather, WeatherSetting::Random);
    assert_eq!(scenario.seeding.animals.len(), 4);
}

#[test]
fn zero_dimensions_fall_back_to_defaults() {
    let dir = tempdir().expect("tempdir");
    fs::write(
        dir.path().join("flat.yaml"),
        "name: flat\ngrid:\n  depth: 0\n  width: 12\n",
    )
    .expect("write scenario");

    let scenario = ScenarioLoader::new(dir.path())
        .load("flat.yaml")
        .expect("scenario should load");
    let world = scenario.build_world();

    assert_eq!(world.grid().depth(), DEFAULT_DEPTH);
    assert_eq!(world.grid().width(), DEFAULT_WIDTH);
}

#[test]
fn pinned_weather_reaches_the_clock() {
    let dir = tempdir().expect("tempdir");
    fs::write(
        dir.path().join("wet.yaml"),
        "name: wet\ngrid: { depth: 10, width: 10 }\nclock:\n  start_step: 30\n  weather: rainy\n",
    )
    .expect("write scenario");

    let scenario = ScenarioLoader::new(dir.path())
        .load("wet.yaml")
        .expect("scenario should load");
    let mut engine = Engine::from_scenario(&scenario);

    assert_eq!(engine.world().clock().forecast(), Forecast::Pinned(Weather::Rainy));
    assert_eq!(engine.current_step(), 30);
    engine.run_with_hook(30, |summary, _| assert_eq!(summary.weather, Weather::Rainy));
}

#[test]
fn species_overrides_apply_to_the_world() {
    let dir = tempdir().expect("tempdir");
    fs::write(
        dir.path().join("lazy.yaml"),
        "name: lazy\nspecies:\n  animals:\n    capybara:\n      requires_mate: false\n      max_age: 12\n",
    )
    .expect("write scenario");

    let scenario = ScenarioLoader::new(dir.path())
        .load("lazy.yaml")
        .expect("scenario should load");
    let world = scenario.build_world();
    let capybara = world.bestiary().animal(AnimalKind::Capybara);

    assert!(!capybara.requires_mate);
    assert_eq!(capybara.max_age, 12);
    assert_eq!(capybara.breeding_age, 5);
}

#[test]
fn invalid_scenario_reports_validation_error() {
    let dir = tempdir().expect("tempdir");
    fs::write(
        dir.path().join("bad.yaml"),
        "name: bad\nseeding:\n  plants:\n    - { species: fern, probability: 0.8 }\n    - { species: fruit_tree, probability: 0.3 }\n",
    )
    .expect("write scenario");

    let err = ScenarioLoader::new(dir.path())
        .load("bad.yaml")
        .expect_err("overfull table must be rejected");

    assert!(matches!(
        err.downcast_ref::<ScenarioError>(),
        Some(ScenarioError::Validation(_))
    ));
    assert!(format!("{err:#}").contains("exceeds 1.0"));
}

#[test]
fn unknown_species_is_a_parse_error() {
    let dir = tempdir().expect("tempdir");
    fs::write(
        dir.path().join("zoo.yaml"),
        "name: zoo\nseeding:\n  animals:\n    - { species: penguin, probability: 0.1 }\n",
    )
    .expect("write scenario");

    let err = ScenarioLoader::new(dir.path())
        .load("zoo.yaml")
        .expect_err("unknown species must be rejected");

    assert!(matches!(
        err.downcast_ref::<ScenarioError>(),
        Some(ScenarioError::Parse(_))
    ));
}

#[test]
fn missing_file_names_the_path() {
    let dir = tempdir().expect("tempdir");
    let err = ScenarioLoader::new(dir.path())
        .load("absent.yaml")
        .expect_err("missing file must fail");

    assert!(err.to_string().contains("absent.yaml"));
}
