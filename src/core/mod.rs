#![allow(missing_docs)] // Public items are documented in the submodules

//! Core standard map engine: parameters, batched state, the iteration
//! recurrence and the run history.

pub mod params;
pub mod query;
pub mod run;
pub mod sim;
pub mod state;

pub use params::MapParams;
pub use query::{RunMetadata, Selector, Span};
pub use run::{RunHistory, RunRecord};
pub use sim::{StandardMap, WriteMode};
pub use state::{InitialConditions, Trajectory};
