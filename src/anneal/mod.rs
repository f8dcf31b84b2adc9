//! Simulated annealing with a taboo list.
//!
//! The search moves one component at a time between servers. Every
//! neighbor is re-routed from scratch and must be valid to be scored;
//! neighbors whose routing fails are "dead", and a neighborhood of only
//! dead neighbors sends the search back to the initial solution with a
//! hotter temperature.
//!
//! # References
//!
//! - Kirkpatrick, Gelatt & Vecchi (1983), "Optimization by Simulated Annealing"
//! - Glover (1989), "Tabu Search, Part I"

mod config;
mod neighbors;
mod runner;
mod taboo;

pub use config::AnnealConfig;
pub use neighbors::neighbors;
pub use runner::{AnnealResult, AnnealRunner, Progress, SearchObserver};
pub use taboo::TabooList;
