//! Construction of the starting solution.

mod initial;

pub use initial::InitialPlacer;
