use std::fmt;

use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::errors::{RegistryError, ServiceError};
use crate::parser::RideCommand;
use crate::registry::{NextRide, RideRegistry, UpdateOutcome};
use crate::ride::{Cost, Duration, Ride, RideId};

/// What to do when a ride id is inserted twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Report the duplicate and stop the command stream.
    #[default]
    Abort,
    /// Report the duplicate and keep going.
    Continue,
}

/// One line of output.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Ride(Ride),
    Rides(Vec<Ride>),
    NoActiveRides,
    DuplicateRide,
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Ride(ride) => write!(f, "{}", ride),
            Reply::Rides(rides) if rides.is_empty() => write!(f, "{}", Ride::placeholder()),
            Reply::Rides(rides) => {
                for (i, ride) in rides.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", ride)?;
                }
                Ok(())
            }
            Reply::NoActiveRides => f.write_str("No active ride requests"),
            Reply::DuplicateRide => f.write_str("Duplicate RideNumber"),
        }
    }
}

pub trait Service {
    fn insert(&mut self, id: RideId, cost: Cost, duration: Duration) -> Result<Option<Reply>, ServiceError>;
    fn update_trip(&mut self, id: RideId, duration: Duration) -> Result<(), ServiceError>;
    fn next_ride(&mut self) -> Reply;
    fn cancel(&mut self, id: RideId);
    fn print(&self, id: RideId) -> Reply;
    fn print_range(&self, low: RideId, high: RideId) -> Reply;
}

#[derive(Debug, Default)]
pub struct DispatchService {
    registry: RideRegistry,
    on_duplicate: DuplicatePolicy,
}

impl DispatchService {
    pub fn new(on_duplicate: DuplicatePolicy) -> Self {
        Self {
            registry: RideRegistry::new(),
            on_duplicate,
        }
    }

    pub fn registry(&self) -> &RideRegistry {
        &self.registry
    }

    /// Applies one command and returns the line it produces, if any.
    ///
    /// Under [`DuplicatePolicy::Abort`] a duplicate insert comes back as
    /// `Err`; its message is the line to report before stopping.
    #[instrument(level = "debug", skip(self))]
    pub fn process_cmd(&mut self, command: RideCommand) -> Result<Option<Reply>, ServiceError> {
        match command {
            RideCommand::Insert(id, cost, duration) => self.insert(id, cost, duration),
            RideCommand::UpdateTrip(id, duration) => self.update_trip(id, duration).map(|_| None),
            RideCommand::GetNextRide => Ok(Some(self.next_ride())),
            RideCommand::CancelRide(id) => {
                self.cancel(id);
                Ok(None)
            }
            RideCommand::Print(id) => Ok(Some(self.print(id))),
            RideCommand::PrintRange(low, high) => Ok(Some(self.print_range(low, high))),
        }
    }
}

impl Service for DispatchService {
    fn insert(&mut self, id: RideId, cost: Cost, duration: Duration) -> Result<Option<Reply>, ServiceError> {
        match self.registry.insert_ride(Ride::new(id, cost, duration)) {
            Ok(()) => Ok(None),
            Err(RegistryError::DuplicateRide(id)) => {
                warn!(id, policy = ?self.on_duplicate, "duplicate ride number");
                match self.on_duplicate {
                    DuplicatePolicy::Abort => Err(ServiceError::DuplicateRide(id)),
                    DuplicatePolicy::Continue => Ok(Some(Reply::DuplicateRide)),
                }
            }
        }
    }

    fn update_trip(&mut self, id: RideId, duration: Duration) -> Result<(), ServiceError> {
        let outcome = self.registry.update_duration(id, duration)?;

        match outcome {
            UpdateOutcome::NotFound => debug!(id, "update for unknown ride ignored"),
            UpdateOutcome::Shortened(ride) => debug!(%ride, "trip shortened"),
            UpdateOutcome::Penalized(ride) => debug!(%ride, "trip lengthened, cost penalty applied"),
            UpdateOutcome::Abandoned(ride) => debug!(%ride, "trip more than doubled, ride dropped"),
        }
        Ok(())
    }

    fn next_ride(&mut self) -> Reply {
        match self.registry.next_ride() {
            NextRide::Dispatched(ride) => Reply::Ride(ride),
            NextRide::NoActiveRides => Reply::NoActiveRides,
        }
    }

    fn cancel(&mut self, id: RideId) {
        if self.registry.cancel_ride(id).is_none() {
            debug!(id, "cancel for unknown ride ignored");
        }
    }

    fn print(&self, id: RideId) -> Reply {
        Reply::Ride(self.registry.get_ride(id).unwrap_or_else(Ride::placeholder))
    }

    fn print_range(&self, low: RideId, high: RideId) -> Reply {
        Reply::Rides(self.registry.rides_in_range(low, high))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup(policy: DuplicatePolicy) -> DispatchService {
        DispatchService::new(policy)
    }

    fn run(service: &mut DispatchService, commands: &[RideCommand]) -> Vec<String> {
        commands
            .iter()
            .filter_map(|cmd| service.process_cmd(*cmd).unwrap())
            .map(|reply| reply.to_string())
            .collect()
    }

    #[test]
    fn test_insert_is_silent() {
        let mut service = setup(DuplicatePolicy::Abort);
        assert_eq!(service.process_cmd(RideCommand::Insert(1, 10, 5)), Ok(None));
    }

    #[test]
    fn test_get_next_ride() {
        let mut service = setup(DuplicatePolicy::Abort);
        let lines = run(
            &mut service,
            &[
                RideCommand::Insert(1, 10, 5),
                RideCommand::Insert(2, 5, 8),
                RideCommand::GetNextRide,
                RideCommand::GetNextRide,
                RideCommand::GetNextRide,
            ],
        );
        assert_eq!(lines, vec!["(2,5,8)", "(1,10,5)", "No active ride requests"]);
    }

    #[test]
    fn test_print_missing_and_empty_range() {
        let mut service = setup(DuplicatePolicy::Abort);
        let lines = run(
            &mut service,
            &[
                RideCommand::Insert(4, 1, 1),
                RideCommand::Print(3),
                RideCommand::PrintRange(5, 9),
                RideCommand::Print(4),
            ],
        );
        assert_eq!(lines, vec!["(0,0,0)", "(0,0,0)", "(4,1,1)"]);
    }

    #[test]
    fn test_print_range_joins_with_commas() {
        let mut service = setup(DuplicatePolicy::Abort);
        let lines = run(
            &mut service,
            &[
                RideCommand::Insert(3, 30, 3),
                RideCommand::Insert(1, 10, 1),
                RideCommand::Insert(2, 20, 2),
                RideCommand::PrintRange(1, 3),
            ],
        );
        assert_eq!(lines, vec!["(1,10,1),(2,20,2),(3,30,3)"]);
    }

    #[test]
    fn test_update_trip_tiers() {
        let mut service = setup(DuplicatePolicy::Abort);
        let lines = run(
            &mut service,
            &[
                RideCommand::Insert(1, 10, 5),
                RideCommand::Insert(2, 10, 5),
                RideCommand::UpdateTrip(1, 6),
                RideCommand::UpdateTrip(2, 12),
                RideCommand::UpdateTrip(9, 1),
                RideCommand::Print(1),
                RideCommand::Print(2),
            ],
        );
        assert_eq!(lines, vec!["(1,20,6)", "(0,0,0)"]);
    }

    #[test]
    fn test_cancel_then_print() {
        let mut service = setup(DuplicatePolicy::Abort);
        let lines = run(
            &mut service,
            &[
                RideCommand::Insert(1, 1, 1),
                RideCommand::CancelRide(1),
                RideCommand::CancelRide(1),
                RideCommand::Print(1),
            ],
        );
        assert_eq!(lines, vec!["(0,0,0)"]);
        assert!(service.registry().is_empty());
    }

    #[test]
    fn test_duplicate_aborts() {
        let mut service = setup(DuplicatePolicy::Abort);
        service.process_cmd(RideCommand::Insert(1, 5, 5)).unwrap();
        let err = service.process_cmd(RideCommand::Insert(1, 5, 5)).unwrap_err();
        assert_eq!(err, ServiceError::DuplicateRide(1));
        assert_eq!(err.to_string(), "Duplicate RideNumber");
    }

    #[test]
    fn test_duplicate_continues() {
        let mut service = setup(DuplicatePolicy::Continue);
        let lines = run(
            &mut service,
            &[
                RideCommand::Insert(1, 5, 5),
                RideCommand::Insert(1, 6, 6),
                RideCommand::Print(1),
            ],
        );
        assert_eq!(lines, vec!["Duplicate RideNumber", "(1,5,5)"]);
    }
}
