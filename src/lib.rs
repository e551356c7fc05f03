//! `trellis` - an idea → epic → task tracker with dependency-aware scheduling.
//!
//! The core is a single polymorphic entity store on `SQLite`, a hierarchy
//! resolver that rebuilds typed trees from flat rows, a dependency graph,
//! and a scheduler that answers "what should be worked on next?".

pub mod cascade;
pub mod cli;
pub mod config;
pub mod error;
pub mod graph;
pub mod hierarchy;
pub mod logging;
pub mod model;
pub mod output;
pub mod scheduler;
pub mod storage;
pub mod tracker;
pub mod util;
pub mod validation;

pub use error::{ErrorCode, Result, StructuredError, TrellisError};
pub use tracker::Tracker;
