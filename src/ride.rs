use std::fmt;

pub type RideId = i64;
pub type Cost = i64;
pub type Duration = i64;

/// A pending ride request.
///
/// Rides are dispatched by ascending cost, then ascending duration. The id
/// only orders the ride index, never the dispatch queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ride {
    pub id: RideId,
    pub cost: Cost,
    pub duration: Duration,
}

impl Ride {
    pub fn new(id: RideId, cost: Cost, duration: Duration) -> Self {
        Self { id, cost, duration }
    }

    /// Stand-in printed when a lookup finds nothing.
    pub const fn placeholder() -> Self {
        Self { id: 0, cost: 0, duration: 0 }
    }

    /// Returns `true` if `self` may sit above `other` in the dispatch heap.
    ///
    /// Equal priorities precede each other in both directions.
    pub fn precedes(&self, other: &Ride) -> bool {
        self.cost < other.cost || (self.cost == other.cost && self.duration <= other.duration)
    }
}

impl fmt::Display for Ride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{},{})", self.id, self.cost, self.duration)
    }
}
