//! World state: entity registries, the double-buffered field and the
//! per-step ledger.
//!
//! Turns read the current field and write the next one. At the end of a
//! step the next field is purged of anything that died during the step,
//! the two fields swap, and dead entities leave the registries.

use rand::Rng;
use serde::Serialize;
use tracing::{debug, info};

use crate::animal::{Animal, DeathCause, DiseaseParams, Fate, Gender, TurnReport};
use crate::clock::Clock;
use crate::entity::{EntityId, IdAllocator, Lifecycle, Registry};
use crate::field::Field;
use crate::plant::{Plant, PlantReport};
use crate::report::Census;
use crate::rng::{threshold_pick, RngExt, SimRng};
use crate::spatial::{Grid, Location};
use crate::species::{AnimalKind, Bestiary, PlantKind, Species};

/// Read-only inputs shared by every turn in a pass.
pub struct TurnContext<'a> {
    pub current: &'a Field,
    pub clock: &'a Clock,
    pub bestiary: &'a Bestiary,
    pub disease: &'a DiseaseParams,
}

/// The write side of a turn: the next field and the registries that new
/// and dying entities go through.
pub struct Habitat<'a> {
    pub next: &'a mut Field,
    pub animals: &'a mut Registry<Animal>,
    pub plants: &'a mut Registry<Plant>,
    pub ids: &'a mut IdAllocator,
}

/// Ordered per-cell inclusion thresholds used when populating a new world.
#[derive(Debug, Clone, PartialEq)]
pub struct SeedingTable {
    pub plants: Vec<(PlantKind, f64)>,
    pub animals: Vec<(AnimalKind, f64)>,
}

impl Default for SeedingTable {
    fn default() -> Self {
        Self {
            plants: vec![(PlantKind::Fern, 0.30), (PlantKind::FruitTree, 0.25)],
            animals: vec![
                (AnimalKind::Capybara, 0.09),
                (AnimalKind::HowlerMonkey, 0.10),
                (AnimalKind::Jaguar, 0.015),
                (AnimalKind::HarpyEagle, 0.018),
            ],
        }
    }
}

/// Counts of what happened during the latest step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StepLedger {
    pub births: u32,
    pub sprouts: u32,
    /// Plants eaten.
    pub grazed: u32,
    /// Plants that died of age.
    pub withered: u32,
    pub old_age: u32,
    pub starvation: u32,
    pub disease: u32,
    pub predation: u32,
    pub overcrowding: u32,
}

impl StepLedger {
    pub fn record_death(&mut self, cause: DeathCause) {
        match cause {
            DeathCause::OldAge => self.old_age += 1,
            DeathCause::Starvation => self.starvation += 1,
            DeathCause::Disease => self.disease += 1,
            DeathCause::Predation => self.predation += 1,
            DeathCause::Overcrowding => self.overcrowding += 1,
        }
    }

    /// Animal deaths of every cause.
    pub fn animal_deaths(&self) -> u32 {
        self.old_age + self.starvation + self.disease + self.predation + self.overcrowding
    }

    fn record_turn(&mut self, report: &TurnReport) {
        self.births += report.births;
        if let Fate::Died(cause) = report.fate {
            self.record_death(cause);
        }
        match report.meal {
            Some(Species::Animal(_)) => self.record_death(DeathCause::Predation),
            Some(Species::Plant(_)) => self.grazed += 1,
            None => {}
        }
    }

    fn record_plant(&mut self, report: &PlantReport) {
        self.sprouts += report.sprouts;
        if !report.survived {
            self.withered += 1;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AnimalView {
    pub id: EntityId,
    pub kind: AnimalKind,
    pub gender: Gender,
    pub food_level: u32,
    pub infected: bool,
    pub immune: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlantView {
    pub id: EntityId,
    pub kind: PlantKind,
    pub mature: bool,
}

/// Live occupants of one cell of the current field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CellView {
    pub location: Location,
    pub plant: Option<PlantView>,
    pub animal: Option<AnimalView>,
}

pub struct World {
    grid: Grid,
    clock: Clock,
    bestiary: Bestiary,
    disease: DiseaseParams,
    ids: IdAllocator,
    animals: Registry<Animal>,
    plants: Registry<Plant>,
    current: Field,
    next: Field,
    ledger: StepLedger,
}

impl World {
    pub fn new(grid: Grid, clock: Clock, bestiary: Bestiary, disease: DiseaseParams) -> Self {
        Self {
            grid,
            clock,
            bestiary,
            disease,
            ids: IdAllocator::new(),
            animals: Registry::new(),
            plants: Registry::new(),
            current: Field::new(grid),
            next: Field::new(grid),
            ledger: StepLedger::default(),
        }
    }

    /// Replace every occupant with a fresh random population. Each cell
    /// rolls once for a plant and once for an animal.
    pub fn seed(&mut self, table: &SeedingTable, rng: &mut SimRng) {
        self.clear();
        let grid = self.grid;
        for loc in grid.locations() {
            if let Some(kind) = threshold_pick(&table.plants, rng.unit()) {
                let traits = self.bestiary.plant(kind);
                let age = rng.gen_range(0..=traits.max_age);
                let plant = Plant::new(kind, loc, traits).with_age(age);
                self.spawn_plant(plant);
            }
            if let Some(kind) = threshold_pick(&table.animals, rng.unit()) {
                let traits = self.bestiary.animal(kind);
                let age = rng.gen_range(0..=traits.max_age);
                let mut animal = Animal::spawn(kind, loc, traits, rng).with_age(age);
                if rng.chance(self.disease.initial_infection_probability) {
                    animal.catch_infection();
                }
                self.spawn_animal(animal);
            }
        }
        info!(
            depth = self.grid.depth(),
            width = self.grid.width(),
            animals = self.animals.len(),
            plants = self.plants.len(),
            "world seeded"
        );
    }

    /// Register an animal and place it at its location in the current field.
    pub fn spawn_animal(&mut self, animal: Animal) -> EntityId {
        let id = self.ids.allocate();
        if let Some(loc) = animal.location() {
            self.current.place_animal(id, loc);
        }
        self.animals.insert(id, animal);
        id
    }

    pub fn spawn_plant(&mut self, plant: Plant) -> EntityId {
        let id = self.ids.allocate();
        if let Some(loc) = plant.location() {
            self.current.place_plant(Some(id), loc);
        }
        self.plants.insert(id, plant);
        id
    }

    /// Kill every live member of `species` and drop them from the field.
    pub fn cull(&mut self, species: Species) -> usize {
        let mut culled = 0;
        match species {
            Species::Animal(kind) => {
                for &id in self.current.animal_ids() {
                    if let Some(animal) = self.animals.get_mut(id) {
                        if animal.is_alive() && animal.kind() == kind {
                            animal.set_dead();
                            culled += 1;
                        }
                    }
                }
            }
            Species::Plant(kind) => {
                for &id in self.current.plant_ids() {
                    if let Some(plant) = self.plants.get_mut(id) {
                        if plant.is_alive() && plant.kind() == kind {
                            plant.set_dead();
                            culled += 1;
                        }
                    }
                }
            }
        }
        self.current.purge(&self.animals, &self.plants);
        self.animals.sweep();
        self.plants.sweep();
        culled
    }

    pub fn clear(&mut self) {
        self.animals.clear();
        self.plants.clear();
        self.current.clear();
        self.next.clear();
    }

    pub(crate) fn begin_step(&mut self) {
        self.ledger = StepLedger::default();
        self.next.clear();
    }

    pub(crate) fn advance_clock(&mut self, rng: &mut SimRng) {
        self.clock.advance(rng);
    }

    /// Every animal that is live in the current field takes one turn.
    /// The id list is snapshotted first; prey killed earlier in the pass
    /// is skipped.
    pub(crate) fn animal_pass(&mut self, rng: &mut SimRng) {
        let ids = self.current.animal_ids().iter().copied().collect::<Vec<_>>();
        for id in ids {
            let Some(mut animal) = self.animals.take(id) else {
                continue;
            };
            let location = match animal.location() {
                Some(location) if animal.is_alive() => location,
                _ => {
                    self.animals.insert(id, animal);
                    continue;
                }
            };
            let ctx = TurnContext {
                current: &self.current,
                clock: &self.clock,
                bestiary: &self.bestiary,
                disease: &self.disease,
            };
            let mut habitat = Habitat {
                next: &mut self.next,
                animals: &mut self.animals,
                plants: &mut self.plants,
                ids: &mut self.ids,
            };
            let report = animal.act(id, location, &ctx, &mut habitat, rng);
            self.animals.insert(id, animal);
            self.ledger.record_turn(&report);
        }
    }

    /// Every plant still live after the animal pass takes one turn.
    pub(crate) fn plant_pass(&mut self, rng: &mut SimRng) {
        let ids = self.current.plant_ids().iter().copied().collect::<Vec<_>>();
        for id in ids {
            let Some(mut plant) = self.plants.take(id) else {
                continue;
            };
            let location = match plant.location() {
                Some(location) if plant.is_alive() => location,
                _ => {
                    self.plants.insert(id, plant);
                    continue;
                }
            };
            let ctx = TurnContext {
                current: &self.current,
                clock: &self.clock,
                bestiary: &self.bestiary,
                disease: &self.disease,
            };
            let mut habitat = Habitat {
                next: &mut self.next,
                animals: &mut self.animals,
                plants: &mut self.plants,
                ids: &mut self.ids,
            };
            let report = plant.act(id, location, &ctx, &mut habitat, rng);
            self.plants.insert(id, plant);
            self.ledger.record_plant(&report);
        }
    }

    /// Purge the next field, swap it in and drop the dead.
    pub(crate) fn finish_step(&mut self) {
        self.next.purge(&self.animals, &self.plants);
        std::mem::swap(&mut self.current, &mut self.next);
        self.next.clear();
        let animals = self.animals.sweep();
        let plants = self.plants.sweep();
        debug!(step = self.clock.step(), animals, plants, "swept dead entities");
    }

    /// True while at least two distinct species have a live member.
    pub fn is_viable(&self) -> bool {
        self.census().living_species() >= 2
    }

    /// Live members per species in the current field, tallied on each call.
    pub fn census(&self) -> Census {
        let mut census = Census::new();
        for (_, id) in self.current.animal_cells() {
            if let Some(animal) = self.animals.get(id).filter(|animal| animal.is_alive()) {
                census.add(Species::Animal(animal.kind()));
            }
        }
        for (_, id) in self.current.plant_cells() {
            if let Some(plant) = self.plants.get(id).filter(|plant| plant.is_alive()) {
                census.add(Species::Plant(plant.kind()));
            }
        }
        census
    }

    pub fn cell(&self, loc: Location) -> CellView {
        let animal = self
            .current
            .live_animal_at(loc, &self.animals)
            .and_then(|id| self.animals.get(id).map(|animal| (id, animal)))
            .map(|(id, animal)| AnimalView {
                id,
                kind: animal.kind(),
                gender: animal.gender(),
                food_level: animal.food_level(),
                infected: animal.health().is_infected(),
                immune: animal.health().is_immune(),
            });
        let plant = self
            .current
            .live_plant_at(loc, &self.plants)
            .and_then(|id| self.plants.get(id).map(|plant| (id, plant)))
            .map(|(id, plant)| PlantView {
                id,
                kind: plant.kind(),
                mature: plant.is_edible(),
            });
        CellView {
            location: loc,
            plant,
            animal,
        }
    }

    /// Every cell in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = CellView> + '_ {
        self.grid.locations().map(move |loc| self.cell(loc))
    }

    pub fn grid(&self) -> Grid {
        self.grid
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn bestiary(&self) -> &Bestiary {
        &self.bestiary
    }

    pub fn disease(&self) -> &DiseaseParams {
        &self.disease
    }

    pub fn ledger(&self) -> &StepLedger {
        &self.ledger
    }

    pub fn current_field(&self) -> &Field {
        &self.current
    }

    pub fn animal(&self, id: EntityId) -> Option<&Animal> {
        self.animals.get(id)
    }

    pub fn animal_mut(&mut self, id: EntityId) -> Option<&mut Animal> {
        self.animals.get_mut(id)
    }

    pub fn plant(&self, id: EntityId) -> Option<&Plant> {
        self.plants.get(id)
    }

    pub fn animal_count(&self) -> usize {
        self.animals.len()
    }

    pub fn plant_count(&self) -> usize {
        self.plants.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Forecast, Weather};
    use crate::rng::seeded;

    fn small_world(depth: u32, width: u32) -> World {
        World::new(
            Grid::new(depth, width),
            Clock::new(12, Forecast::Pinned(Weather::Sunny)),
            Bestiary::default(),
            DiseaseParams::default(),
        )
    }

    #[test]
    fn test_seeding_respects_grid_and_tables() {
        let mut world = small_world(10, 12);
        let mut rng = seeded(42);
        let table = SeedingTable {
            plants: vec![(PlantKind::Fern, 1.0)],
            animals: vec![],
        };

        world.seed(&table, &mut rng);

        assert_eq!(world.plant_count(), 120);
        assert_eq!(world.animal_count(), 0);
        assert_eq!(world.census().count(Species::Plant(PlantKind::Fern)), 120);
        assert!(!world.is_viable());
    }

    #[test]
    fn test_seeded_ages_within_species_bounds() {
        let mut world = small_world(20, 20);
        let mut rng = seeded(7);
        world.seed(&SeedingTable::default(), &mut rng);

        for cell in world.cells() {
            if let Some(view) = cell.animal {
                let animal = world.animal(view.id).unwrap();
                assert!(animal.age() <= world.bestiary().animal(view.kind).max_age);
            }
            if let Some(view) = cell.plant {
                let plant = world.plant(view.id).unwrap();
                assert!(plant.age() <= world.bestiary().plant(view.kind).max_age);
            }
        }
    }

    #[test]
    fn test_viability_needs_two_species() {
        let mut world = small_world(3, 3);
        let traits = world.bestiary().plant(PlantKind::Fern).clone();
        world.spawn_plant(Plant::new(PlantKind::Fern, Location::new(0, 0), &traits));
        assert!(!world.is_viable());

        world.spawn_animal(Animal::new(AnimalKind::Jaguar, Location::new(1, 1), Gender::Male, 10));
        assert!(world.is_viable());

        assert_eq!(world.cull(Species::Animal(AnimalKind::Jaguar)), 1);
        assert!(!world.is_viable());
        assert_eq!(world.animal_count(), 0);
    }

    #[test]
    fn test_cell_view_reports_disease_flags() {
        let mut world = small_world(2, 2);
        let loc = Location::new(1, 0);
        let mut animal = Animal::new(AnimalKind::Capybara, loc, Gender::Female, 8);
        animal.catch_infection();
        let id = world.spawn_animal(animal);

        let view = world.cell(loc);
        let animal = view.animal.unwrap();
        assert_eq!(animal.id, id);
        assert!(animal.infected);
        assert!(!animal.immune);
        assert!(view.plant.is_none());
        assert_eq!(world.cells().count(), 4);
    }

    #[test]
    fn test_ledger_counts_predation_and_deaths() {
        let mut ledger = StepLedger::default();
        ledger.record_turn(&TurnReport {
            fate: Fate::Moved,
            births: 1,
            meal: Some(Species::Animal(AnimalKind::Capybara)),
        });
        ledger.record_turn(&TurnReport {
            fate: Fate::Died(DeathCause::Starvation),
            births: 0,
            meal: None,
        });

        assert_eq!(ledger.births, 1);
        assert_eq!(ledger.predation, 1);
        assert_eq!(ledger.starvation, 1);
        assert_eq!(ledger.animal_deaths(), 2);
    }
}
