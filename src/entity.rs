//! Entity identity and the lifecycle shared by animals and plants

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::spatial::Location;

/// Stable identity of an animal or plant across steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(u64);

impl EntityId {
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Hands out ids; never reuses one within a run.
#[derive(Debug, Default)]
pub struct IdAllocator {
    next_id: u64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self { next_id: 0 }
    }

    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }
}

/// Alive flag, location and age. The location is `None` iff dead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vitals {
    alive: bool,
    location: Option<Location>,
    age: u32,
}

impl Vitals {
    pub fn new(location: Location, age: u32) -> Self {
        Self {
            alive: true,
            location: Some(location),
            age,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn location(&self) -> Option<Location> {
        self.location
    }

    pub fn age(&self) -> u32 {
        self.age
    }

    pub fn set_age(&mut self, age: u32) {
        self.age = age;
    }

    pub fn set_dead(&mut self) {
        self.alive = false;
        self.location = None;
    }

    pub fn relocate(&mut self, location: Location) {
        debug_assert!(self.alive, "dead entities cannot move");
        self.location = Some(location);
    }

    /// Advance age by one; dies once `max_age` is exceeded. Returns whether
    /// the entity is still alive.
    pub fn grow_older(&mut self, max_age: u32) -> bool {
        self.age += 1;
        if self.age > max_age {
            self.set_dead();
        }
        self.alive
    }
}

/// Shared machinery for anything that lives on the field.
pub trait Lifecycle {
    fn vitals(&self) -> &Vitals;
    fn vitals_mut(&mut self) -> &mut Vitals;

    fn is_alive(&self) -> bool {
        self.vitals().is_alive()
    }

    fn location(&self) -> Option<Location> {
        self.vitals().location()
    }

    fn age(&self) -> u32 {
        self.vitals().age()
    }

    fn set_dead(&mut self) {
        self.vitals_mut().set_dead();
    }
}

/// Answers "is this id a live entity" for field queries.
pub trait Liveness {
    fn is_live(&self, id: EntityId) -> bool;
}

/// Owning storage for one kind of entity. Fields hold ids into it.
#[derive(Debug)]
pub struct Registry<T> {
    entries: HashMap<EntityId, T>,
}

impl<T> Registry<T> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn insert(&mut self, id: EntityId, entity: T) {
        self.entries.insert(id, entity);
    }

    pub fn get(&self, id: EntityId) -> Option<&T> {
        self.entries.get(&id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut T> {
        self.entries.get_mut(&id)
    }

    /// Take an entity out for the duration of its own turn.
    pub fn take(&mut self, id: EntityId) -> Option<T> {
        self.entries.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<T: Lifecycle> Registry<T> {
    /// Drop every dead entity.
    pub fn sweep(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entity| entity.is_alive());
        before - self.entries.len()
    }
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Lifecycle> Liveness for Registry<T> {
    fn is_live(&self, id: EntityId) -> bool {
        self.entries.get(&id).is_some_and(|entity| entity.is_alive())
    }
}
