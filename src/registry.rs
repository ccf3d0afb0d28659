//! The ride registry: one arena of rides, indexed twice.
//!
//! Every live ride owns exactly one arena entry. That entry sits in the
//! dispatch heap at `entry.slot` and in the id index at `entry.node`, and the
//! index node carries the entry's key back. All mutations go through this
//! type so the two structures are always updated together.

use crate::errors::{HeapError, IndexError, InvariantError, RegistryError};
use crate::heap::PriorityHeap;
use crate::rbtree::RedBlackTree;
use crate::ride::{Cost, Duration, Ride, RideId};
use crate::store::{RideArena, RideEntry, RideKey};

/// Cost added when a trip is lengthened within the grace tier.
pub const GRACE_PENALTY: Cost = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextRide {
    Dispatched(Ride),
    NoActiveRides,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    NotFound,
    /// Duration shrank (or stayed); the ride was re-prioritized in place.
    Shortened(Ride),
    /// Duration grew by at most 2x; the ride was re-queued with a higher cost.
    Penalized(Ride),
    /// Duration more than doubled; the ride was dropped.
    Abandoned(Ride),
}

#[derive(Debug, Default)]
pub struct RideRegistry {
    arena: RideArena,
    heap: PriorityHeap,
    index: RedBlackTree<RideId, RideKey>,
}

impl RideRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn insert_ride(&mut self, ride: Ride) -> Result<(), RegistryError> {
        let key = self.arena.insert(RideEntry::new(ride));

        match self.index.insert(ride.id, key) {
            Ok(node) => self.arena[key].node = node,
            Err(IndexError::DuplicateKey) => {
                self.arena.remove(key);
                return Err(RegistryError::DuplicateRide(ride.id));
            }
        }

        self.heap.push(&mut self.arena, key);
        Ok(())
    }

    /// Dispatches the cheapest ride, shortest first among equal costs.
    pub fn next_ride(&mut self) -> NextRide {
        let key = match self.heap.pop(&mut self.arena) {
            Ok(key) => key,
            Err(HeapError::EmptyQueue) => return NextRide::NoActiveRides,
        };

        let ride = self.arena[key].ride;
        self.index.remove(&ride.id);
        self.arena.remove(key);
        NextRide::Dispatched(ride)
    }

    /// Drops the ride with `id`. Unknown ids are ignored.
    pub fn cancel_ride(&mut self, id: RideId) -> Option<Ride> {
        let key = self.index.remove(&id)?;
        let slot = self.arena[key].slot;
        self.heap.remove_at(&mut self.arena, slot);
        self.arena.remove(key).map(|entry| entry.ride)
    }

    pub fn update_duration(
        &mut self,
        id: RideId,
        duration: Duration,
    ) -> Result<UpdateOutcome, RegistryError> {
        let Some(&key) = self.index.get(&id) else {
            return Ok(UpdateOutcome::NotFound);
        };
        let current = self.arena[key].ride;

        if duration <= current.duration {
            let slot = self.arena[key].slot;
            self.heap.update_key(&mut self.arena, slot, duration);
            return Ok(UpdateOutcome::Shortened(self.arena[key].ride));
        }

        self.cancel_ride(id);

        if duration <= current.duration.saturating_mul(2) {
            let ride = Ride::new(id, current.cost.saturating_add(GRACE_PENALTY), duration);
            self.insert_ride(ride)?;
            Ok(UpdateOutcome::Penalized(ride))
        } else {
            Ok(UpdateOutcome::Abandoned(current))
        }
    }

    pub fn get_ride(&self, id: RideId) -> Option<Ride> {
        self.index.get(&id).map(|&key| self.arena[key].ride)
    }

    /// Rides with `low <= id <= high`, ascending by id.
    pub fn rides_in_range(&self, low: RideId, high: RideId) -> Vec<Ride> {
        self.index
            .range(&low, &high)
            .into_iter()
            .map(|(_, key)| self.arena[key].ride)
            .collect()
    }

    /// Checks both structures and the links between them.
    pub fn validate(&self) -> Result<(), InvariantError> {
        self.heap.validate(&self.arena)?;
        self.index.validate()?;

        for (expected, found) in [
            (self.arena.len(), self.heap.len()),
            (self.arena.len(), self.index.len()),
        ] {
            if expected != found {
                return Err(InvariantError::SizeMismatch { expected, found });
            }
        }

        for (id, key) in self.index.entries() {
            let entry = self.arena.get(key).ok_or(InvariantError::Bijection(id))?;
            let linked = entry.ride.id == id
                && self.heap.key_at(entry.slot) == Some(key)
                && self.index.entry(entry.node) == Some((&id, &key));
            if !linked {
                return Err(InvariantError::Bijection(id));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::collections::BTreeMap;

    fn registry_with(rides: &[(i64, i64, i64)]) -> RideRegistry {
        let mut registry = RideRegistry::new();
        for &(id, cost, duration) in rides {
            registry.insert_ride(Ride::new(id, cost, duration)).unwrap();
        }
        assert_eq!(registry.validate(), Ok(()));
        registry
    }

    #[test]
    fn test_lower_cost_dispatches_first() {
        let mut registry = registry_with(&[(1, 10, 5), (2, 5, 8)]);
        assert_eq!(registry.next_ride(), NextRide::Dispatched(Ride::new(2, 5, 8)));
        assert_eq!(registry.get_ride(2), None);
        assert_eq!(registry.validate(), Ok(()));
    }

    #[test]
    fn test_shorter_duration_breaks_cost_tie() {
        let mut registry = registry_with(&[(1, 10, 5), (2, 10, 3)]);
        assert_eq!(registry.next_ride(), NextRide::Dispatched(Ride::new(2, 10, 3)));
    }

    #[test]
    fn test_next_ride_on_empty() {
        let mut registry = RideRegistry::new();
        assert_eq!(registry.next_ride(), NextRide::NoActiveRides);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_duplicate_insert_leaves_registry_unchanged() {
        let mut registry = registry_with(&[(1, 5, 5)]);
        assert_eq!(
            registry.insert_ride(Ride::new(1, 7, 7)),
            Err(RegistryError::DuplicateRide(1))
        );
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get_ride(1), Some(Ride::new(1, 5, 5)));
        assert_eq!(registry.validate(), Ok(()));
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let mut registry = registry_with(&[(1, 5, 5), (2, 6, 6)]);
        assert_eq!(registry.cancel_ride(1), Some(Ride::new(1, 5, 5)));
        assert_eq!(registry.cancel_ride(1), None);
        assert_eq!(registry.cancel_ride(99), None);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.validate(), Ok(()));
    }

    #[test]
    fn test_update_shorter_keeps_id_and_cost() {
        let mut registry = registry_with(&[(1, 10, 9), (2, 10, 5)]);
        assert_eq!(
            registry.update_duration(1, 2),
            Ok(UpdateOutcome::Shortened(Ride::new(1, 10, 2)))
        );
        assert_eq!(registry.validate(), Ok(()));
        assert_eq!(registry.next_ride(), NextRide::Dispatched(Ride::new(1, 10, 2)));
    }

    #[test]
    fn test_update_within_grace_tier_adds_penalty() {
        let mut registry = registry_with(&[(1, 10, 5)]);
        assert_eq!(
            registry.update_duration(1, 6),
            Ok(UpdateOutcome::Penalized(Ride::new(1, 20, 6)))
        );
        assert_eq!(registry.get_ride(1), Some(Ride::new(1, 20, 6)));
        assert_eq!(registry.validate(), Ok(()));
    }

    #[test]
    fn test_update_at_grace_limit_is_penalized() {
        let mut registry = registry_with(&[(1, 10, 5)]);
        assert_eq!(
            registry.update_duration(1, 10),
            Ok(UpdateOutcome::Penalized(Ride::new(1, 20, 10)))
        );
    }

    #[test]
    fn test_update_past_grace_tier_abandons() {
        let mut registry = registry_with(&[(1, 10, 5)]);
        assert_eq!(
            registry.update_duration(1, 12),
            Ok(UpdateOutcome::Abandoned(Ride::new(1, 10, 5)))
        );
        assert_eq!(registry.get_ride(1), None);
        assert!(registry.is_empty());
        assert_eq!(registry.validate(), Ok(()));
    }

    #[test]
    fn test_update_missing() {
        let mut registry = registry_with(&[(1, 10, 5)]);
        assert_eq!(registry.update_duration(7, 1), Ok(UpdateOutcome::NotFound));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_rides_in_range() {
        let registry = registry_with(&[(25, 1, 1), (5, 2, 2), (15, 3, 3), (40, 4, 4)]);
        let ids: Vec<_> = registry.rides_in_range(5, 25).iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![5, 15, 25]);
        assert!(registry.rides_in_range(16, 24).is_empty());
    }

    #[test]
    fn test_random_operations_keep_every_invariant() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut registry = RideRegistry::new();
        let mut model: BTreeMap<i64, Ride> = BTreeMap::new();

        for _ in 0..5000 {
            let id: i64 = rng.gen_range(0..200);
            match rng.gen_range(0..6) {
                0 | 1 => {
                    let ride = Ride::new(id, rng.gen_range(0..20), rng.gen_range(1..20));
                    let result = registry.insert_ride(ride);
                    if model.contains_key(&id) {
                        assert_eq!(result, Err(RegistryError::DuplicateRide(id)));
                    } else {
                        assert_eq!(result, Ok(()));
                        model.insert(id, ride);
                    }
                }
                2 => match registry.next_ride() {
                    NextRide::Dispatched(ride) => {
                        let best = model.values().map(|r| (r.cost, r.duration)).min();
                        assert_eq!(best, Some((ride.cost, ride.duration)));
                        assert_eq!(model.remove(&ride.id), Some(ride));
                    }
                    NextRide::NoActiveRides => assert!(model.is_empty()),
                },
                3 => assert_eq!(registry.cancel_ride(id), model.remove(&id)),
                4 => {
                    let duration = rng.gen_range(1..40);
                    let outcome = registry.update_duration(id, duration).unwrap();
                    match model.get(&id).copied() {
                        None => assert_eq!(outcome, UpdateOutcome::NotFound),
                        Some(old) if duration <= old.duration => {
                            let ride = Ride::new(id, old.cost, duration);
                            assert_eq!(outcome, UpdateOutcome::Shortened(ride));
                            model.insert(id, ride);
                        }
                        Some(old) if duration <= 2 * old.duration => {
                            let ride = Ride::new(id, old.cost + GRACE_PENALTY, duration);
                            assert_eq!(outcome, UpdateOutcome::Penalized(ride));
                            model.insert(id, ride);
                        }
                        Some(old) => {
                            assert_eq!(outcome, UpdateOutcome::Abandoned(old));
                            model.remove(&id);
                        }
                    }
                }
                _ => {
                    let high = id + rng.gen_range(0..50);
                    let expected: Vec<Ride> = model.range(id..=high).map(|(_, r)| *r).collect();
                    assert_eq!(registry.rides_in_range(id, high), expected);
                    assert_eq!(registry.get_ride(id), model.get(&id).copied());
                }
            }

            assert_eq!(registry.validate(), Ok(()));
            assert_eq!(registry.len(), model.len());
        }
    }
}
