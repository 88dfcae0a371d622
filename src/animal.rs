//! Animals and the shared animal turn
//!
//! A turn reads the current field and writes only into the next one. The
//! phases run in a fixed order and any of them may end the turn by death:
//! age, disease progression, disease spread, activity gate, hunger, birth,
//! then feeding and movement.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::entity::{EntityId, Lifecycle, Registry, Vitals};
use crate::field::Field;
use crate::rng::{RngExt, SimRng};
use crate::spatial::Location;
use crate::species::{AnimalKind, AnimalTraits, Species};
use crate::world::{Habitat, TurnContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn random(rng: &mut SimRng) -> Self {
        if rng.gen_bool(0.5) {
            Gender::Male
        } else {
            Gender::Female
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Health {
    #[default]
    Susceptible,
    Infected {
        steps: u32,
    },
    Immune {
        remaining: u32,
    },
}

impl Health {
    pub fn is_infected(self) -> bool {
        matches!(self, Health::Infected { .. })
    }

    pub fn is_immune(self) -> bool {
        matches!(self, Health::Immune { .. })
    }
}

fn default_initial_infection() -> f64 {
    0.02
}

fn default_transmission() -> f64 {
    0.04
}

fn default_mortality() -> f64 {
    0.005
}

fn default_infection_duration() -> u32 {
    12
}

fn default_immunity_duration() -> u32 {
    30
}

fn default_infected_breeding_factor() -> f64 {
    0.4
}

/// Disease constants shared by every species.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiseaseParams {
    /// Chance that a seeded animal starts out infected.
    #[serde(default = "default_initial_infection")]
    pub initial_infection_probability: f64,
    /// Per neighbor, per step.
    #[serde(default = "default_transmission")]
    pub transmission_probability: f64,
    /// Per step while infected.
    #[serde(default = "default_mortality")]
    pub mortality_per_step: f64,
    #[serde(default = "default_infection_duration")]
    pub infection_duration: u32,
    #[serde(default = "default_immunity_duration")]
    pub immunity_duration: u32,
    /// Multiplies the breeding probability of an infected parent.
    #[serde(default = "default_infected_breeding_factor")]
    pub infected_breeding_factor: f64,
}

impl Default for DiseaseParams {
    fn default() -> Self {
        Self {
            initial_infection_probability: default_initial_infection(),
            transmission_probability: default_transmission(),
            mortality_per_step: default_mortality(),
            infection_duration: default_infection_duration(),
            immunity_duration: default_immunity_duration(),
            infected_breeding_factor: default_infected_breeding_factor(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeathCause {
    OldAge,
    Starvation,
    Disease,
    Predation,
    Overcrowding,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fate {
    Moved,
    Sheltered,
    Died(DeathCause),
}

/// What happened during one animal turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnReport {
    pub fate: Fate,
    pub births: u32,
    /// Species eaten this turn, if any.
    pub meal: Option<Species>,
}

impl TurnReport {
    fn died(cause: DeathCause) -> Self {
        Self {
            fate: Fate::Died(cause),
            births: 0,
            meal: None,
        }
    }
}

struct Meal {
    location: Location,
    prey: Species,
}

#[derive(Debug, Clone)]
pub struct Animal {
    kind: AnimalKind,
    vitals: Vitals,
    gender: Gender,
    food_level: u32,
    health: Health,
}

impl Animal {
    pub fn new(kind: AnimalKind, location: Location, gender: Gender, food_level: u32) -> Self {
        Self {
            kind,
            vitals: Vitals::new(location, 0),
            gender,
            food_level,
            health: Health::Susceptible,
        }
    }

    /// A newborn: age zero, random gender, food level drawn from the
    /// species range.
    pub fn spawn(kind: AnimalKind, location: Location, traits: &AnimalTraits, rng: &mut SimRng) -> Self {
        let gender = Gender::random(rng);
        let (low, high) = traits.initial_food;
        let food_level = rng.gen_range(low..=high.max(low));
        Self::new(kind, location, gender, food_level)
    }

    pub fn with_age(mut self, age: u32) -> Self {
        self.vitals.set_age(age);
        self
    }

    pub fn with_health(mut self, health: Health) -> Self {
        self.health = health;
        self
    }

    pub fn kind(&self) -> AnimalKind {
        self.kind
    }

    pub fn gender(&self) -> Gender {
        self.gender
    }

    pub fn food_level(&self) -> u32 {
        self.food_level
    }

    pub fn health(&self) -> Health {
        self.health
    }

    /// Infect a susceptible animal. Infected and immune animals are
    /// unaffected.
    pub fn catch_infection(&mut self) -> bool {
        if self.health == Health::Susceptible {
            self.health = Health::Infected { steps: 0 };
            true
        } else {
            false
        }
    }

    pub(crate) fn act(
        &mut self,
        id: EntityId,
        location: Location,
        ctx: &TurnContext<'_>,
        habitat: &mut Habitat<'_>,
        rng: &mut SimRng,
    ) -> TurnReport {
        let traits = ctx.bestiary.animal(self.kind);

        if !self.vitals.grow_older(traits.max_age) {
            return TurnReport::died(DeathCause::OldAge);
        }

        if !self.progress_disease(ctx, rng) {
            return TurnReport::died(DeathCause::Disease);
        }

        if self.health.is_infected() {
            self.spread_disease(location, ctx, habitat.animals, rng);
        }

        if !traits.activity.is_active(ctx.clock) {
            return self.shelter(id, location, habitat, rng);
        }

        if traits.tracks_hunger {
            self.food_level = self.food_level.saturating_sub(1);
            if self.food_level == 0 {
                self.set_dead();
                return TurnReport::died(DeathCause::Starvation);
            }
        }

        let births = self.give_birth(location, traits, ctx, habitat, rng);

        let meal = if traits.ready_to_hunt(self.food_level) {
            self.find_food(location, traits, ctx, habitat, rng)
        } else {
            None
        };
        let mut report = TurnReport {
            fate: Fate::Moved,
            births,
            meal: meal.as_ref().map(|meal| meal.prey),
        };

        // An earlier mover may already hold the food cell in the next field.
        let destination = meal
            .map(|meal| meal.location)
            .filter(|cell| habitat.next.live_animal_at(*cell, &*habitat.animals).is_none())
            .or_else(|| {
                habitat
                    .next
                    .free_adjacent(location, &*habitat.animals, rng)
                    .first()
                    .copied()
            });

        match destination {
            Some(cell) => {
                self.vitals.relocate(cell);
                habitat.next.place_animal(id, cell);
            }
            None => {
                self.set_dead();
                report.fate = Fate::Died(DeathCause::Overcrowding);
            }
        }
        report
    }

    /// Returns false if the disease killed the animal.
    fn progress_disease(&mut self, ctx: &TurnContext<'_>, rng: &mut SimRng) -> bool {
        let params = ctx.disease;
        match self.health {
            Health::Infected { steps } => {
                let steps = steps + 1;
                if rng.chance(params.mortality_per_step) {
                    self.set_dead();
                    return false;
                }
                self.health = if steps >= params.infection_duration {
                    Health::Immune {
                        remaining: params.immunity_duration,
                    }
                } else {
                    Health::Infected { steps }
                };
            }
            Health::Immune { remaining } => {
                self.health = if remaining <= 1 {
                    Health::Susceptible
                } else {
                    Health::Immune {
                        remaining: remaining - 1,
                    }
                };
            }
            Health::Susceptible => {}
        }
        true
    }

    fn spread_disease(
        &self,
        location: Location,
        ctx: &TurnContext<'_>,
        animals: &mut Registry<Animal>,
        rng: &mut SimRng,
    ) {
        for cell in ctx.current.neighbors(location, rng) {
            let Some(neighbor) = ctx.current.animal_at(cell).and_then(|id| animals.get_mut(id)) else {
                continue;
            };
            if neighbor.is_alive() && rng.chance(ctx.disease.transmission_probability) {
                neighbor.catch_infection();
            }
        }
    }

    /// Inactive animals try to hold their cell, then an adjacent free one.
    fn shelter(
        &mut self,
        id: EntityId,
        location: Location,
        habitat: &mut Habitat<'_>,
        rng: &mut SimRng,
    ) -> TurnReport {
        let spot = if habitat.next.live_animal_at(location, &*habitat.animals).is_none() {
            Some(location)
        } else {
            habitat
                .next
                .free_adjacent(location, &*habitat.animals, rng)
                .first()
                .copied()
        };

        match spot {
            Some(cell) => {
                self.vitals.relocate(cell);
                habitat.next.place_animal(id, cell);
                TurnReport {
                    fate: Fate::Sheltered,
                    births: 0,
                    meal: None,
                }
            }
            None => {
                self.set_dead();
                TurnReport::died(DeathCause::Overcrowding)
            }
        }
    }

    /// Offspring go into their own pool of free cells, drawn before the
    /// parent picks where to move.
    fn give_birth(
        &self,
        location: Location,
        traits: &AnimalTraits,
        ctx: &TurnContext<'_>,
        habitat: &mut Habitat<'_>,
        rng: &mut SimRng,
    ) -> u32 {
        let nursery = habitat.next.free_adjacent(location, &*habitat.animals, rng);
        if nursery.is_empty() {
            return 0;
        }
        if traits.requires_mate && !self.has_mate_nearby(location, traits, ctx.current, habitat.animals, rng) {
            return 0;
        }

        let litter = self.litter_size(traits, ctx, rng);
        let mut births = 0;
        for cell in nursery.into_iter().take(litter as usize) {
            let young = Animal::spawn(self.kind, cell, traits, rng);
            let young_id = habitat.ids.allocate();
            habitat.animals.insert(young_id, young);
            habitat.next.place_animal(young_id, cell);
            births += 1;
        }
        births
    }

    fn has_mate_nearby(
        &self,
        location: Location,
        traits: &AnimalTraits,
        current: &Field,
        animals: &Registry<Animal>,
        rng: &mut SimRng,
    ) -> bool {
        current
            .within_radius(location, traits.mate_search_radius, rng)
            .into_iter()
            .filter_map(|cell| current.animal_at(cell).and_then(|id| animals.get(id)))
            .any(|other| other.is_alive() && other.kind == self.kind && other.gender != self.gender)
    }

    /// Number of young this step: zero below breeding age or when the
    /// weather- and disease-scaled breeding roll fails.
    pub fn litter_size(&self, traits: &AnimalTraits, ctx: &TurnContext<'_>, rng: &mut SimRng) -> u32 {
        if self.age() < traits.breeding_age || traits.max_litter_size == 0 {
            return 0;
        }
        let mut probability = traits.breeding_probability * ctx.clock.breeding_factor();
        if self.health.is_infected() {
            probability *= ctx.disease.infected_breeding_factor;
        }
        if !rng.chance(probability) {
            return 0;
        }
        rng.gen_range(1..=traits.max_litter_size)
    }

    /// Animal prey first, behind a weather-scaled success roll; then a
    /// mature plant.
    fn find_food(
        &mut self,
        location: Location,
        traits: &AnimalTraits,
        ctx: &TurnContext<'_>,
        habitat: &mut Habitat<'_>,
        rng: &mut SimRng,
    ) -> Option<Meal> {
        let adjacent = ctx.current.neighbors(location, rng);
        let food_level = self.food_level;

        let target = adjacent.iter().copied().find_map(|cell| {
            let prey_id = ctx.current.animal_at(cell)?;
            let prey = habitat.animals.get(prey_id)?;
            let species = Species::Animal(prey.kind);
            (prey.is_alive() && traits.will_eat(species, food_level)).then_some((cell, prey_id, species))
        });

        if let Some((cell, prey_id, species)) = target {
            if rng.chance(ctx.clock.hunting_success_factor()) {
                if let Some(prey) = habitat.animals.get_mut(prey_id) {
                    prey.set_dead();
                    let prey_infected = prey.health.is_infected();
                    self.food_level = traits.food_value(species);
                    if prey_infected {
                        self.catch_infection();
                    }
                    return Some(Meal {
                        location: cell,
                        prey: species,
                    });
                }
            }
        }

        for cell in adjacent {
            let Some(plant) = ctx.current.plant_at(cell).and_then(|id| habitat.plants.get_mut(id)) else {
                continue;
            };
            let species = Species::Plant(plant.kind());
            if plant.is_alive() && plant.is_edible() && traits.will_eat(species, food_level) {
                plant.set_dead();
                habitat.next.clear_plant(cell);
                self.food_level = traits.food_value(species);
                return Some(Meal {
                    location: cell,
                    prey: species,
                });
            }
        }
        None
    }
}

impl Lifecycle for Animal {
    fn vitals(&self) -> &Vitals {
        &self.vitals
    }

    fn vitals_mut(&mut self) -> &mut Vitals {
        &mut self.vitals
    }
}
