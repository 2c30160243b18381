//! Experiment event listeners.
//!
//! # Data Flow
//! ```text
//! experiment-step-started     → StepRegistry::insert
//! experiment-target-started   → StepRegistry::get (warn if unknown)
//! experiment-target-completed → StepRegistry::get (warn if unknown)
//! experiment-completed        → StepRegistry::remove_execution
//! ```

pub mod handlers;
pub mod registry;

pub use registry::{StepExecution, StepRegistry};
