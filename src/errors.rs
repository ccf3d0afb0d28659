use thiserror::Error;

use crate::ride::RideId;

#[derive(Error, Debug, PartialEq)]
pub enum HeapError {
    #[error("EmptyQueue no rides are pending")]
    EmptyQueue,
}

#[derive(Error, Debug, PartialEq)]
pub enum IndexError {
    #[error("DuplicateKey key is already indexed")]
    DuplicateKey,
}

#[derive(Error, Debug, PartialEq)]
pub enum RegistryError {
    #[error("DuplicateRide ride {0} already exists")]
    DuplicateRide(RideId),
}

#[derive(Error, Debug, PartialEq)]
pub enum InvariantError {
    #[error("RedRoot root node is red")]
    RedRoot,
    #[error("RedSentinel nil node is red")]
    RedSentinel,
    #[error("RedRedEdge red node {0} has a red child")]
    RedRedEdge(usize),
    #[error("BlackHeight black height differs below node {0}")]
    BlackHeight(usize),
    #[error("UnorderedKeys in-order traversal is not strictly ascending")]
    UnorderedKeys,
    #[error("BrokenParent node {0} does not point back to its parent")]
    BrokenParent(usize),
    #[error("SizeMismatch index reports {expected} nodes but holds {found}")]
    SizeMismatch { expected: usize, found: usize },
    #[error("HeapOrder slot {0} precedes its parent")]
    HeapOrder(usize),
    #[error("StaleSlot ride at slot {0} records a different slot")]
    StaleSlot(usize),
    #[error("Bijection ride {0} is not linked in both structures")]
    Bijection(RideId),
}

#[derive(Error, Debug, PartialEq)]
pub enum ParseError {
    #[error("InvalidCommand couldn't parse `{0}`")]
    InvalidCommand(String),
}

#[derive(Error, Debug, PartialEq)]
pub enum ServiceError {
    #[error("Duplicate RideNumber")]
    DuplicateRide(RideId),
}

impl From<RegistryError> for ServiceError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::DuplicateRide(id) => ServiceError::DuplicateRide(id),
        }
    }
}

#[derive(Error, Debug)]
pub enum RunError {
    #[error("Io couldn't read commands or write results: {0}")]
    Io(#[from] std::io::Error),
}
