//! Indexable min-heap of rides ordered by dispatch priority.
//!
//! The heap only stores [`RideKey`]s. Every move writes the new position back
//! into the arena entry, so a ride can be located (and removed or re-keyed)
//! from its entry in O(log n).

use tracing::trace;

use crate::errors::{HeapError, InvariantError};
use crate::ride::{Duration, Ride};
use crate::store::{RideArena, RideKey};

#[derive(Debug, Default)]
pub struct PriorityHeap {
    slots: Vec<RideKey>,
}

impl PriorityHeap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Key of the ride that would be dispatched next.
    pub fn peek(&self) -> Option<RideKey> {
        self.slots.first().copied()
    }

    pub fn push(&mut self, arena: &mut RideArena, key: RideKey) {
        let slot = self.slots.len();
        self.slots.push(key);
        arena[key].slot = slot;
        self.sift_up(arena, slot);
    }

    /// Removes the highest-priority ride and returns its key.
    pub fn pop(&mut self, arena: &mut RideArena) -> Result<RideKey, HeapError> {
        let last = self.slots.len().checked_sub(1).ok_or(HeapError::EmptyQueue)?;
        self.swap(arena, 0, last);
        let key = self.slots.pop().ok_or(HeapError::EmptyQueue)?;
        self.sift_down(arena, 0);
        Ok(key)
    }

    /// Removes whatever ride occupies `slot`.
    ///
    /// The tail element moved into the hole can belong on either side of it,
    /// so the heap is repaired upward first and downward if nothing moved.
    pub fn remove_at(&mut self, arena: &mut RideArena, slot: usize) -> Option<RideKey> {
        if slot >= self.slots.len() {
            return None;
        }

        let last = self.slots.len() - 1;
        self.swap(arena, slot, last);
        let key = self.slots.pop()?;

        if slot < self.slots.len() && self.sift_up(arena, slot) == slot {
            self.sift_down(arena, slot);
        }

        Some(key)
    }

    /// Rewrites the duration of the ride at `slot` and restores heap order.
    pub fn update_key(&mut self, arena: &mut RideArena, slot: usize, duration: Duration) {
        let Some(&key) = self.slots.get(slot) else {
            return;
        };
        arena[key].ride.duration = duration;

        if slot == 0 || self.ride(arena, parent(slot)).precedes(self.ride(arena, slot)) {
            self.sift_down(arena, slot);
        } else {
            self.sift_up(arena, slot);
        }
    }

    pub fn key_at(&self, slot: usize) -> Option<RideKey> {
        self.slots.get(slot).copied()
    }

    /// Keys in slot order.
    pub fn keys(&self) -> impl Iterator<Item = RideKey> + '_ {
        self.slots.iter().copied()
    }

    /// Checks heap order and that every entry records its own slot.
    pub fn validate(&self, arena: &RideArena) -> Result<(), InvariantError> {
        for (slot, &key) in self.slots.iter().enumerate() {
            let entry = arena.get(key).ok_or(InvariantError::StaleSlot(slot))?;
            if entry.slot != slot {
                return Err(InvariantError::StaleSlot(slot));
            }
            if slot > 0 && !self.ride(arena, parent(slot)).precedes(&entry.ride) {
                return Err(InvariantError::HeapOrder(slot));
            }
        }
        Ok(())
    }

    fn ride<'a>(&self, arena: &'a RideArena, slot: usize) -> &'a Ride {
        &arena[self.slots[slot]].ride
    }

    fn swap(&mut self, arena: &mut RideArena, a: usize, b: usize) {
        if a == b {
            return;
        }
        self.slots.swap(a, b);
        arena[self.slots[a]].slot = a;
        arena[self.slots[b]].slot = b;
    }

    /// Returns the slot the ride settled in.
    fn sift_up(&mut self, arena: &mut RideArena, mut slot: usize) -> usize {
        while slot > 0 {
            let up = parent(slot);
            if !self.ride(arena, slot).precedes(self.ride(arena, up)) {
                break;
            }
            self.swap(arena, slot, up);
            slot = up;
        }
        trace!(slot, "sift up settled");
        slot
    }

    fn sift_down(&mut self, arena: &mut RideArena, mut slot: usize) {
        let len = self.slots.len();
        loop {
            let left = 2 * slot + 1;
            if left >= len {
                break;
            }

            // Left wins ties; right only when strictly smaller.
            let right = left + 1;
            let child = if right < len && !self.ride(arena, left).precedes(self.ride(arena, right)) {
                right
            } else {
                left
            };

            if self.ride(arena, slot).precedes(self.ride(arena, child)) {
                break;
            }
            self.swap(arena, slot, child);
            slot = child;
        }
    }
}

fn parent(slot: usize) -> usize {
    (slot - 1) / 2
}
