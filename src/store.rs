//! Generational arena owning every live ride entry.
//!
//! The dispatch heap and the ride index never hold rides directly. Both refer
//! to entries through a [`RideKey`], and each entry records where it currently
//! lives in both structures. Removing an entry bumps the generation of its
//! slot, so a key kept past removal resolves to nothing instead of aliasing a
//! newer ride.

use std::ops::{Index, IndexMut};

use crate::rbtree::{NodeId, NIL};
use crate::ride::Ride;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RideKey {
    index: u32,
    generation: u32,
}

#[derive(Debug, Clone)]
pub struct RideEntry {
    pub ride: Ride,
    /// Position in the dispatch heap.
    pub slot: usize,
    /// Node carrying this ride in the ride index.
    pub node: NodeId,
}

impl RideEntry {
    pub fn new(ride: Ride) -> Self {
        Self { ride, slot: 0, node: NIL }
    }
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    entry: Option<RideEntry>,
}

#[derive(Debug, Default)]
pub struct RideArena {
    slots: Vec<Slot>,
    free: Vec<u32>,
    len: usize,
}

impl RideArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn insert(&mut self, entry: RideEntry) -> RideKey {
        self.len += 1;

        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.entry = Some(entry);
            return RideKey { index, generation: slot.generation };
        }

        let index = self.slots.len() as u32;
        self.slots.push(Slot { generation: 0, entry: Some(entry) });
        RideKey { index, generation: 0 }
    }

    pub fn get(&self, key: RideKey) -> Option<&RideEntry> {
        self.slots
            .get(key.index as usize)
            .filter(|slot| slot.generation == key.generation)
            .and_then(|slot| slot.entry.as_ref())
    }

    pub fn get_mut(&mut self, key: RideKey) -> Option<&mut RideEntry> {
        self.slots
            .get_mut(key.index as usize)
            .filter(|slot| slot.generation == key.generation)
            .and_then(|slot| slot.entry.as_mut())
    }

    pub fn remove(&mut self, key: RideKey) -> Option<RideEntry> {
        let slot = self
            .slots
            .get_mut(key.index as usize)
            .filter(|slot| slot.generation == key.generation)?;

        let entry = slot.entry.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(key.index);
        self.len -= 1;
        Some(entry)
    }

}

impl Index<RideKey> for RideArena {
    type Output = RideEntry;

    fn index(&self, key: RideKey) -> &RideEntry {
        match self.get(key) {
            Some(entry) => entry,
            None => panic!("stale ride key {:?}", key),
        }
    }
}

impl IndexMut<RideKey> for RideArena {
    fn index_mut(&mut self, key: RideKey) -> &mut RideEntry {
        match self.get_mut(key) {
            Some(entry) => entry,
            None => panic!("stale ride key {:?}", key),
        }
    }
}
