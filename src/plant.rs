//! Plants and the plant turn
//!
//! A plant ages, keeps its own cell in the next field and, once mature,
//! may sprout offspring into neighboring cells.

use crate::entity::{EntityId, Lifecycle, Vitals};
use crate::rng::{RngExt, SimRng};
use crate::spatial::Location;
use crate::species::{PlantKind, PlantTraits};
use crate::world::{Habitat, TurnContext};

/// What happened during one plant turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlantReport {
    pub survived: bool,
    pub sprouts: u32,
}

#[derive(Debug, Clone)]
pub struct Plant {
    kind: PlantKind,
    vitals: Vitals,
    maturity_age: u32,
}

impl Plant {
    /// A fresh, immature plant.
    pub fn new(kind: PlantKind, location: Location, traits: &PlantTraits) -> Self {
        Self {
            kind,
            vitals: Vitals::new(location, 0),
            maturity_age: traits.maturity_age,
        }
    }

    pub fn with_age(mut self, age: u32) -> Self {
        self.vitals.set_age(age);
        self
    }

    pub fn kind(&self) -> PlantKind {
        self.kind
    }

    pub fn maturity_age(&self) -> u32 {
        self.maturity_age
    }

    /// Mature plants can be eaten and can spread.
    pub fn is_edible(&self) -> bool {
        self.age() >= self.maturity_age
    }

    pub(crate) fn act(
        &mut self,
        id: EntityId,
        location: Location,
        ctx: &TurnContext<'_>,
        habitat: &mut Habitat<'_>,
        rng: &mut SimRng,
    ) -> PlantReport {
        let traits = ctx.bestiary.plant(self.kind);

        if !self.vitals.grow_older(traits.max_age) {
            return PlantReport {
                survived: false,
                sprouts: 0,
            };
        }

        habitat.next.place_plant(Some(id), location);

        let sprouts = if self.is_edible() && (!traits.requires_daylight || ctx.clock.is_daylight()) {
            self.spread(location, traits, ctx, habitat, rng)
        } else {
            0
        };

        PlantReport {
            survived: true,
            sprouts,
        }
    }

    /// Examines at most `max_offspring` free neighbours in random order.
    /// A neighbour that already holds a plant still counts against the cap.
    /// Each remaining cell gets its own growth-scaled roll.
    fn spread(
        &self,
        location: Location,
        traits: &PlantTraits,
        ctx: &TurnContext<'_>,
        habitat: &mut Habitat<'_>,
        rng: &mut SimRng,
    ) -> u32 {
        let probability = traits.spread_probability * ctx.clock.plant_growth_factor();
        let candidates = habitat.next.free_adjacent(location, &*habitat.animals, rng);

        let mut sprouts = 0;
        for cell in candidates.into_iter().take(traits.max_offspring as usize) {
            let occupied = ctx.current.live_plant_at(cell, &*habitat.plants).is_some()
                || habitat.next.live_plant_at(cell, &*habitat.plants).is_some();
            if occupied || !rng.chance(probability) {
                continue;
            }
            let seedling = Plant::new(self.kind, cell, traits);
            let seedling_id = habitat.ids.allocate();
            habitat.plants.insert(seedling_id, seedling);
            habitat.next.place_plant(Some(seedling_id), cell);
            sprouts += 1;
        }
        sprouts
    }
}

impl Lifecycle for Plant {
    fn vitals(&self) -> &Vitals {
        &self.vitals
    }

    fn vitals_mut(&mut self) -> &mut Vitals {
        &mut self.vitals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animal::{Animal, DiseaseParams};
    use crate::clock::{Clock, Forecast, Weather};
    use crate::entity::{IdAllocator, Registry};
    use crate::field::Field;
    use crate::rng::seeded;
    use crate::spatial::Grid;
    use crate::species::Bestiary;

    struct Patch {
        current: Field,
        next: Field,
        animals: Registry<Animal>,
        plants: Registry<Plant>,
        ids: IdAllocator,
    }

    impl Patch {
        fn new(depth: u32, width: u32) -> Self {
            let grid = Grid::new(depth, width);
            Self {
                current: Field::new(grid),
                next: Field::new(grid),
                animals: Registry::new(),
                plants: Registry::new(),
                ids: IdAllocator::new(),
            }
        }

        fn plant(&mut self, plant: Plant, loc: Location) -> EntityId {
            let id = self.ids.allocate();
            self.plants.insert(id, plant);
            self.current.place_plant(Some(id), loc);
            id
        }

        fn turn(
            &mut self,
            id: EntityId,
            loc: Location,
            clock: &Clock,
            bestiary: &Bestiary,
            rng: &mut SimRng,
        ) -> PlantReport {
            let disease = DiseaseParams::default();
            let mut plant = self.plants.take(id).unwrap();
            let ctx = TurnContext {
                current: &self.current,
                clock,
                bestiary,
                disease: &disease,
            };
            let mut habitat = Habitat {
                next: &mut self.next,
                animals: &mut self.animals,
                plants: &mut self.plants,
                ids: &mut self.ids,
            };
            let report = plant.act(id, loc, &ctx, &mut habitat, rng);
            self.plants.insert(id, plant);
            report
        }
    }

    #[test]
    fn test_edible_from_maturity_age() {
        let traits = PlantTraits::defaults(PlantKind::Fern);
        let loc = Location::new(0, 0);
        assert!(!Plant::new(PlantKind::Fern, loc, &traits).with_age(9).is_edible());
        assert!(Plant::new(PlantKind::Fern, loc, &traits).with_age(10).is_edible());
    }

    #[test]
    fn test_old_plant_dies_without_reregistering() {
        let bestiary = Bestiary::default();
        let clock = Clock::new(12, Forecast::Pinned(Weather::Sunny));
        let mut rng = seeded(3);
        let mut patch = Patch::new(3, 3);
        let loc = Location::new(1, 1);
        let traits = bestiary.plant(PlantKind::Fern);
        let id = patch.plant(Plant::new(PlantKind::Fern, loc, traits).with_age(traits.max_age), loc);

        let report = patch.turn(id, loc, &clock, &bestiary, &mut rng);

        assert!(!report.survived);
        assert_eq!(patch.next.plant_at(loc), None);
        assert!(patch.next.plant_ids().is_empty());
    }

    #[test]
    fn test_spread_respects_offspring_cap() {
        let mut bestiary = Bestiary::default();
        bestiary.plant_mut(PlantKind::Fern).spread_probability = 1.0;
        bestiary.plant_mut(PlantKind::Fern).max_offspring = 2;
        let clock = Clock::new(12, Forecast::Pinned(Weather::Sunny));
        let mut rng = seeded(3);
        let mut patch = Patch::new(3, 3);
        let loc = Location::new(1, 1);
        let traits = bestiary.plant(PlantKind::Fern).clone();
        let id = patch.plant(Plant::new(PlantKind::Fern, loc, &traits).with_age(20), loc);

        let report = patch.turn(id, loc, &clock, &bestiary, &mut rng);

        assert!(report.survived);
        assert_eq!(report.sprouts, 2);
        assert_eq!(patch.next.plant_ids().len(), 3);
        assert_eq!(patch.next.plant_at(loc), Some(id));
    }

    #[test]
    fn test_occupied_neighbour_counts_against_the_cap() {
        let mut bestiary = Bestiary::default();
        bestiary.plant_mut(PlantKind::Fern).spread_probability = 1.0;
        bestiary.plant_mut(PlantKind::Fern).max_offspring = 1;
        let clock = Clock::new(12, Forecast::Pinned(Weather::Sunny));
        let traits = bestiary.plant(PlantKind::Fern).clone();
        let left = Location::new(0, 0);
        let middle = Location::new(0, 1);

        let mut sprouts = Vec::new();
        for seed in 0..20 {
            let mut rng = seeded(seed);
            let mut patch = Patch::new(1, 3);
            let parent = patch.plant(Plant::new(PlantKind::Fern, middle, &traits).with_age(20), middle);
            patch.plant(Plant::new(PlantKind::Fern, left, &traits), left);
            sprouts.push(patch.turn(parent, middle, &clock, &bestiary, &mut rng).sprouts);
        }

        assert!(sprouts.iter().all(|count| *count <= 1));
        assert!(sprouts.contains(&0));
        assert!(sprouts.contains(&1));
    }

    #[test]
    fn test_spread_skips_cells_with_live_plants() {
        let mut bestiary = Bestiary::default();
        bestiary.plant_mut(PlantKind::Fern).spread_probability = 1.0;
        let clock = Clock::new(12, Forecast::Pinned(Weather::Sunny));
        let mut rng = seeded(9);
        let mut patch = Patch::new(1, 2);
        let traits = bestiary.plant(PlantKind::Fern).clone();
        let left = Location::new(0, 0);
        let right = Location::new(0, 1);
        let parent = patch.plant(Plant::new(PlantKind::Fern, left, &traits).with_age(20), left);
        patch.plant(Plant::new(PlantKind::Fern, right, &traits), right);

        let report = patch.turn(parent, left, &clock, &bestiary, &mut rng);

        assert_eq!(report.sprouts, 0);
    }

    #[test]
    fn test_fruit_tree_waits_for_daylight() {
        let mut bestiary = Bestiary::default();
        bestiary.plant_mut(PlantKind::FruitTree).spread_probability = 1.0;
        let night = Clock::new(1, Forecast::Pinned(Weather::Sunny));
        let mut rng = seeded(9);
        let mut patch = Patch::new(3, 3);
        let traits = bestiary.plant(PlantKind::FruitTree).clone();
        let loc = Location::new(1, 1);
        let id = patch.plant(Plant::new(PlantKind::FruitTree, loc, &traits).with_age(30), loc);

        let report = patch.turn(id, loc, &night, &bestiary, &mut rng);

        assert!(report.survived);
        assert_eq!(report.sprouts, 0);
    }
}
