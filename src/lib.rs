pub mod errors;
pub mod heap;
pub mod parser;
pub mod rbtree;
pub mod registry;
pub mod ride;
pub mod runner;
pub mod service;
pub mod sink;
pub mod store;
