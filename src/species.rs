//! Species as data
//!
//! Every species runs the same turn algorithm; what differs is the
//! parameter record looked up here. Who eats whom lives entirely on the
//! predator's side, in its diet.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

use crate::clock::Clock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimalKind {
    Capybara,
    HowlerMonkey,
    Jaguar,
    HarpyEagle,
}

impl AnimalKind {
    pub const ALL: [AnimalKind; 4] = [
        AnimalKind::Capybara,
        AnimalKind::HowlerMonkey,
        AnimalKind::Jaguar,
        AnimalKind::HarpyEagle,
    ];

    pub fn label(self) -> &'static str {
        match self {
            AnimalKind::Capybara => "capybara",
            AnimalKind::HowlerMonkey => "howler_monkey",
            AnimalKind::Jaguar => "jaguar",
            AnimalKind::HarpyEagle => "harpy_eagle",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlantKind {
    Fern,
    FruitTree,
}

impl PlantKind {
    pub const ALL: [PlantKind; 2] = [PlantKind::Fern, PlantKind::FruitTree];

    pub fn label(self) -> &'static str {
        match self {
            PlantKind::Fern => "fern",
            PlantKind::FruitTree => "fruit_tree",
        }
    }
}

/// Any species on the field, animal or plant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Species {
    Plant(PlantKind),
    Animal(AnimalKind),
}

impl Species {
    /// Plants first, then animals, in declaration order.
    pub fn all() -> impl Iterator<Item = Species> {
        PlantKind::ALL
            .into_iter()
            .map(Species::Plant)
            .chain(AnimalKind::ALL.into_iter().map(Species::Animal))
    }

    pub fn label(self) -> &'static str {
        match self {
            Species::Plant(kind) => kind.label(),
            Species::Animal(kind) => kind.label(),
        }
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Species {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Extra condition a predator applies before eating a prey it could eat.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PreyRule {
    Always,
    /// Only while the predator's food level is below `fraction * value`.
    WhenFoodBelow { value: u32, fraction: f64 },
}

impl PreyRule {
    pub fn allows(self, food_level: u32) -> bool {
        match self {
            PreyRule::Always => true,
            PreyRule::WhenFoodBelow { value, fraction } => {
                (food_level as f64) < value as f64 * fraction
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FoodSource {
    pub prey: Species,
    pub value: u32,
    pub rule: PreyRule,
}

/// When an animal moves, hunts and breeds instead of sheltering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activity {
    /// Outside of night, and only when the weather allows movement.
    Daylight,
    /// Day and night, still sheltering when the weather forbids movement.
    AnyTime,
}

impl Activity {
    pub fn is_active(self, clock: &Clock) -> bool {
        match self {
            Activity::Daylight => clock.is_daylight() && clock.allows_movement(),
            Activity::AnyTime => clock.allows_movement(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnimalTraits {
    pub max_age: u32,
    pub breeding_age: u32,
    pub breeding_probability: f64,
    pub max_litter_size: u32,
    pub diet: Vec<FoodSource>,
    /// Hunts only once the food level is at or below this.
    pub hunger_threshold: u32,
    /// Hunts regardless of food level.
    pub always_hungry: bool,
    pub tracks_hunger: bool,
    pub requires_mate: bool,
    pub mate_search_radius: u32,
    pub activity: Activity,
    /// Inclusive bounds of the food level an animal starts with.
    pub initial_food: (u32, u32),
}

impl AnimalTraits {
    pub fn defaults(kind: AnimalKind) -> Self {
        match kind {
            AnimalKind::Capybara => Self {
                max_age: 80,
                breeding_age: 5,
                breeding_probability: 0.10,
                max_litter_size: 1,
                diet: vec![FoodSource {
                    prey: Species::Plant(PlantKind::Fern),
                    value: 12,
                    rule: PreyRule::Always,
                }],
                hunger_threshold: 6,
                always_hungry: false,
                tracks_hunger: true,
                requires_mate: true,
                mate_search_radius: 10,
                activity: Activity::Daylight,
                initial_food: (6, 17),
            },
            AnimalKind::HowlerMonkey => Self {
                max_age: 80,
                breeding_age: 4,
                breeding_probability: 0.14,
                max_litter_size: 1,
                diet: vec![FoodSource {
                    prey: Species::Plant(PlantKind::FruitTree),
                    value: 14,
                    rule: PreyRule::Always,
                }],
                hunger_threshold: 7,
                always_hungry: false,
                tracks_hunger: true,
                requires_mate: true,
                mate_search_radius: 10,
                activity: Activity::Daylight,
                initial_food: (4, 17),
            },
            AnimalKind::Jaguar => Self {
                max_age: 150,
                breeding_age: 7,
                breeding_probability: 0.10,
                max_litter_size: 1,
                diet: vec![FoodSource {
                    prey: Species::Animal(AnimalKind::Capybara),
                    value: 14,
                    rule: PreyRule::Always,
                }],
                hunger_threshold: 0,
                always_hungry: true,
                tracks_hunger: true,
                requires_mate: true,
                mate_search_radius: 20,
                activity: Activity::AnyTime,
                initial_food: (7, 13),
            },
            AnimalKind::HarpyEagle => Self {
                max_age: 150,
                breeding_age: 7,
                breeding_probability: 0.05,
                max_litter_size: 1,
                diet: vec![
                    FoodSource {
                        prey: Species::Animal(AnimalKind::HowlerMonkey),
                        value: 9,
                        rule: PreyRule::Always,
                    },
                    // Capybara is a fallback, taken only when below half full.
                    FoodSource {
                        prey: Species::Animal(AnimalKind::Capybara),
                        value: 9,
                        rule: PreyRule::WhenFoodBelow {
                            value: 9,
                            fraction: 0.5,
                        },
                    },
                ],
                hunger_threshold: 0,
                always_hungry: true,
                tracks_hunger: true,
                requires_mate: true,
                mate_search_radius: 20,
                activity: Activity::Daylight,
                initial_food: (7, 13),
            },
        }
    }

    /// Nutritional value of `prey`; 0 means not prey.
    pub fn food_value(&self, prey: Species) -> u32 {
        self.source(prey).map_or(0, |source| source.value)
    }

    /// Whether `prey` is food and its eligibility rule holds right now.
    pub fn will_eat(&self, prey: Species, food_level: u32) -> bool {
        self.source(prey)
            .is_some_and(|source| source.value > 0 && source.rule.allows(food_level))
    }

    /// Hunting readiness at the given food level.
    pub fn ready_to_hunt(&self, food_level: u32) -> bool {
        self.always_hungry || food_level <= self.hunger_threshold
    }

    fn source(&self, prey: Species) -> Option<&FoodSource> {
        self.diet.iter().find(|source| source.prey == prey)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlantTraits {
    pub maturity_age: u32,
    pub max_age: u32,
    pub spread_probability: f64,
    /// Hard ceiling on offspring placed per step.
    pub max_offspring: u32,
    pub requires_daylight: bool,
}

impl PlantTraits {
    pub fn defaults(kind: PlantKind) -> Self {
        match kind {
            PlantKind::Fern => Self {
                maturity_age: 10,
                max_age: 80,
                spread_probability: 0.30,
                max_offspring: 5,
                requires_daylight: false,
            },
            PlantKind::FruitTree => Self {
                maturity_age: 8,
                max_age: 150,
                spread_probability: 0.25,
                max_offspring: 5,
                requires_daylight: true,
            },
        }
    }
}

/// The parameter records in effect for one run.
#[derive(Debug, Clone)]
pub struct Bestiary {
    animals: HashMap<AnimalKind, AnimalTraits>,
    plants: HashMap<PlantKind, PlantTraits>,
}

impl Bestiary {
    pub fn animal(&self, kind: AnimalKind) -> &AnimalTraits {
        &self.animals[&kind]
    }

    pub fn animal_mut(&mut self, kind: AnimalKind) -> &mut AnimalTraits {
        self.animals
            .entry(kind)
            .or_insert_with(|| AnimalTraits::defaults(kind))
    }

    pub fn plant(&self, kind: PlantKind) -> &PlantTraits {
        &self.plants[&kind]
    }

    pub fn plant_mut(&mut self, kind: PlantKind) -> &mut PlantTraits {
        self.plants
            .entry(kind)
            .or_insert_with(|| PlantTraits::defaults(kind))
    }
}

impl Default for Bestiary {
    fn default() -> Self {
        Self {
            animals: AnimalKind::ALL
                .into_iter()
                .map(|kind| (kind, AnimalTraits::defaults(kind)))
                .collect(),
            plants: PlantKind::ALL
                .into_iter()
                .map(|kind| (kind, PlantTraits::defaults(kind)))
                .collect(),
        }
    }
}
