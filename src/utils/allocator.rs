//! Generational slot storage backing the force registry.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Handle to a force registered with a particle system.
///
/// Removing the force bumps the slot generation, so an old handle can never
/// address a force registered later in the same slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct ForceId {
    slot: u32,
    generation: u32,
}

impl ForceId {
    pub fn new(index: usize, generation: u32) -> Self {
        Self {
            slot: index as u32,
            generation,
        }
    }

    pub fn index(&self) -> usize {
        self.slot as usize
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for ForceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "force#{}v{}", self.slot, self.generation)
    }
}

#[derive(Debug, Clone)]
struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Slot arena with stable, generation-checked handles.
///
/// Iteration follows slot order, which is registration order until a slot is
/// recycled.
#[derive(Debug, Clone)]
pub struct Arena<T> {
    slots: Vec<Slot<T>>,
    vacant: Vec<usize>,
    occupied: usize,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            vacant: Vec::new(),
            occupied: 0,
        }
    }

    pub fn insert(&mut self, value: T) -> ForceId {
        self.occupied += 1;
        match self.vacant.pop() {
            Some(index) => {
                let slot = &mut self.slots[index];
                slot.value = Some(value);
                ForceId::new(index, slot.generation)
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    value: Some(value),
                });
                ForceId::new(self.slots.len() - 1, 0)
            }
        }
    }

    fn slot(&self, id: ForceId) -> Option<&Slot<T>> {
        self.slots
            .get(id.index())
            .filter(|slot| slot.generation == id.generation())
    }

    pub fn get(&self, id: ForceId) -> Option<&T> {
        self.slot(id)?.value.as_ref()
    }

    pub fn get_mut(&mut self, id: ForceId) -> Option<&mut T> {
        self.slots
            .get_mut(id.index())
            .filter(|slot| slot.generation == id.generation())?
            .value
            .as_mut()
    }

    pub fn contains(&self, id: ForceId) -> bool {
        self.get(id).is_some()
    }

    pub fn remove(&mut self, id: ForceId) -> Option<T> {
        let slot = self
            .slots
            .get_mut(id.index())
            .filter(|slot| slot.generation == id.generation())?;
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.vacant.push(id.index());
        self.occupied -= 1;
        Some(value)
    }

    /// Removes every value the predicate rejects and returns the freed ids.
    pub fn retain<F>(&mut self, mut keep: F) -> Vec<ForceId>
    where
        F: FnMut(&T) -> bool,
    {
        let rejected: Vec<ForceId> = self
            .iter()
            .filter_map(|(id, value)| (!keep(value)).then_some(id))
            .collect();
        for id in &rejected {
            self.remove(*id);
        }
        rejected
    }

    /// Empties the arena; every outstanding id becomes stale.
    pub fn clear(&mut self) {
        let ids: Vec<ForceId> = self.ids().collect();
        for id in ids {
            self.remove(id);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (ForceId, &T)> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.value
                .as_ref()
                .map(|value| (ForceId::new(index, slot.generation), value))
        })
    }

    pub fn values(&self) -> impl Iterator<Item = &T> + '_ {
        self.slots.iter().filter_map(|slot| slot.value.as_ref())
    }

    pub fn ids(&self) -> impl Iterator<Item = ForceId> + '_ {
        self.iter().map(|(id, _)| id)
    }

    pub fn len(&self) -> usize {
        self.occupied
    }

    pub fn is_empty(&self) -> bool {
        self.occupied == 0
    }
}
