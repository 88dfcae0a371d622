//! Dual-layer occupancy grid for one simulation step

use std::collections::HashMap;

use indexmap::IndexSet;

use crate::entity::{EntityId, Liveness};
use crate::rng::SimRng;
use crate::spatial::{Grid, Location};

/// An animal layer and a plant layer over the same grid. Each layer maps a
/// location to at most one id; the membership lists hold every placed id
/// exactly once, in placement order.
#[derive(Debug, Clone)]
pub struct Field {
    grid: Grid,
    animal_layer: HashMap<Location, EntityId>,
    plant_layer: HashMap<Location, EntityId>,
    animals: IndexSet<EntityId>,
    plants: IndexSet<EntityId>,
}

impl Field {
    pub fn new(grid: Grid) -> Self {
        Self {
            grid,
            animal_layer: HashMap::new(),
            plant_layer: HashMap::new(),
            animals: IndexSet::new(),
            plants: IndexSet::new(),
        }
    }

    pub fn grid(&self) -> Grid {
        self.grid
    }

    /// Upsert an animal. A different animal previously at `loc` leaves the
    /// membership list; the plant layer is untouched.
    pub fn place_animal(&mut self, id: EntityId, loc: Location) {
        assert!(self.grid.contains(loc), "animal placed outside the grid at {loc:?}");
        if let Some(previous) = self.animal_layer.insert(loc, id) {
            if previous != id {
                self.animals.shift_remove(&previous);
            }
        }
        self.animals.insert(id);
    }

    /// Upsert a plant, or clear the plant slot when `id` is `None`.
    pub fn place_plant(&mut self, id: Option<EntityId>, loc: Location) {
        assert!(self.grid.contains(loc), "plant placed outside the grid at {loc:?}");
        let previous = match id {
            Some(id) => self.plant_layer.insert(loc, id),
            None => self.plant_layer.remove(&loc),
        };
        if let Some(previous) = previous {
            if Some(previous) != id {
                self.plants.shift_remove(&previous);
            }
        }
        if let Some(id) = id {
            self.plants.insert(id);
        }
    }

    pub fn clear_plant(&mut self, loc: Location) {
        self.place_plant(None, loc);
    }

    pub fn animal_at(&self, loc: Location) -> Option<EntityId> {
        self.animal_layer.get(&loc).copied()
    }

    pub fn plant_at(&self, loc: Location) -> Option<EntityId> {
        self.plant_layer.get(&loc).copied()
    }

    pub fn live_animal_at(&self, loc: Location, animals: &impl Liveness) -> Option<EntityId> {
        self.animal_at(loc).filter(|id| animals.is_live(*id))
    }

    pub fn live_plant_at(&self, loc: Location, plants: &impl Liveness) -> Option<EntityId> {
        self.plant_at(loc).filter(|id| plants.is_live(*id))
    }

    pub fn neighbors(&self, loc: Location, rng: &mut SimRng) -> Vec<Location> {
        self.grid.neighbors(loc, rng)
    }

    pub fn within_radius(&self, loc: Location, radius: u32, rng: &mut SimRng) -> Vec<Location> {
        self.grid.within_radius(loc, radius, rng)
    }

    /// Neighbors whose animal slot is empty or holds a dead animal, shuffled.
    pub fn free_adjacent(
        &self,
        loc: Location,
        animals: &impl Liveness,
        rng: &mut SimRng,
    ) -> Vec<Location> {
        let mut free = self.neighbors(loc, rng);
        free.retain(|cell| self.live_animal_at(*cell, animals).is_none());
        free
    }

    /// Placed animals in placement order.
    pub fn animal_ids(&self) -> &IndexSet<EntityId> {
        &self.animals
    }

    pub fn plant_ids(&self) -> &IndexSet<EntityId> {
        &self.plants
    }

    pub fn animal_cells(&self) -> impl Iterator<Item = (Location, EntityId)> + '_ {
        self.animal_layer.iter().map(|(loc, id)| (*loc, *id))
    }

    pub fn plant_cells(&self) -> impl Iterator<Item = (Location, EntityId)> + '_ {
        self.plant_layer.iter().map(|(loc, id)| (*loc, *id))
    }

    /// Remove members whose entity is no longer alive from both layers.
    pub fn purge(&mut self, animals: &impl Liveness, plants: &impl Liveness) {
        self.animal_layer.retain(|_, id| animals.is_live(*id));
        self.animals.retain(|id| animals.is_live(*id));
        self.plant_layer.retain(|_, id| plants.is_live(*id));
        self.plants.retain(|id| plants.is_live(*id));
    }

    pub fn clear(&mut self) {
        self.animal_layer.clear();
        self.plant_layer.clear();
        self.animals.clear();
        self.plants.clear();
    }
}
