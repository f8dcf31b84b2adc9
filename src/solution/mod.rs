//! Candidate solutions: placement, routes, link usage and their evaluation.
//!
//! - [`Solution`] owns all of its state; a clone is fully independent.
//! - Fitness ([`Solution::calculate_fitness`]) is the modeled power draw,
//!   `NaN` when some server is CPU-overloaded.
//! - Validity ([`Solution::check_validity`]) collects every broken
//!   placement, routing, capacity and latency constraint.

mod fitness;
mod format;
mod state;
mod validity;

pub use fitness::{fitness_rank, is_better, FitnessBreakdown};
pub use format::{RouteEntry, SolutionRecord};
pub use state::Solution;
pub use validity::{Validity, Violation};
