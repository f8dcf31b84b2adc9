//! Energy-aware placement and routing of virtual network function
//! components.
//!
//! Given servers attached to network nodes, directed links with capacity,
//! power and latency, and service chains of VNF components with pairwise
//! bandwidth demands, the crate searches for a placement of components on
//! servers and a route for every communicating pair that minimizes total
//! power draw while respecting server capacity, link capacity and chain
//! latency limits.
//!
//! A run has three stages:
//!
//! 1. [`placement::InitialPlacer`] packs components onto the most
//!    power-efficient servers.
//! 2. [`routing::Router`] assigns minimum-latency paths over links with
//!    spare capacity.
//! 3. [`anneal::AnnealRunner`] improves the placement by simulated
//!    annealing, re-routing every candidate.
//!
//! [`solve`] chains the three.
//!
//! # Examples
//!
//! ```
//! use vnf_anneal::{parse, solve, AnnealConfig};
//!
//! let text = std::fs::read_to_string(concat!(env!("CARGO_MANIFEST_DIR"), "/data/three_nodes.txt")).unwrap();
//! let problem = parse(&text).unwrap();
//! let config = AnnealConfig::default().with_max_iterations(20).with_seed(7);
//! let result = solve(&problem, &config).unwrap();
//! assert!(result.best.is_valid(&problem));
//! ```

pub mod anneal;
pub mod error;
pub mod placement;
pub mod problem;
pub mod random;
pub mod routing;
pub mod solution;

pub use anneal::{AnnealConfig, AnnealResult, AnnealRunner};
pub use error::{Error, Result};
pub use problem::{parse, Problem, ProblemBuilder};
pub use solution::Solution;

use anneal::SearchObserver;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

/// Places, routes and anneals.
pub fn solve(problem: &Problem, config: &AnnealConfig) -> Result<AnnealResult> {
    solve_observed(problem, config, None, &mut ())
}

/// [`solve`] with a cancellation token and a progress observer.
///
/// Fails when the initial placement runs out of servers or when some pair
/// cannot be routed in the initial solution.
pub fn solve_observed<O: SearchObserver>(
    problem: &Problem,
    config: &AnnealConfig,
    cancel: Option<Arc<AtomicBool>>,
    observer: &mut O,
) -> Result<AnnealResult> {
    config.validate()?;
    let initial = initial_solution(problem, config)?;
    let mut rng = random::rng_from(config.seed);
    AnnealRunner::run_observed(problem, initial, config, &mut rng, cancel, observer)
}

/// The placed, routed and evaluated starting solution.
pub fn initial_solution(problem: &Problem, config: &AnnealConfig) -> Result<Solution> {
    let mut initial = placement::InitialPlacer::place_all(problem)?;
    let outcome = config.router().route(problem, &mut initial)?;
    if !outcome.is_complete() {
        return Err(Error::InitialRouting {
            pairs: outcome.failed_pairs().to_vec(),
        });
    }
    let fitness = initial.evaluate(problem);
    info!(fitness, valid = initial.is_valid(problem), "initial solution ready");
    Ok(initial)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::fixtures;

    #[test]
    fn test_solve_line_problem() {
        let problem = fixtures::line_problem();
        let config = AnnealConfig::default().with_max_iterations(25).with_seed(1);
        let result = solve(&problem, &config).unwrap();
        assert!(result.best.is_valid(&problem));
        assert!(result.best_fitness.is_finite());
        assert!(result.iterations <= 25);
    }

    #[test]
    fn test_two_full_servers_on_one_node() {
        let problem = ProblemBuilder::new()
            .with_node(7.0)
            .with_server(fixtures::server(40.0, 100.0, 8.0, 8.0, 1))
            .with_server(fixtures::server(30.0, 90.0, 8.0, 8.0, 1))
            .with_component(8.0, 8.0)
            .with_component(8.0, 8.0)
            .with_chain(5.0, vec![1, 2])
            .build()
            .unwrap();
        let initial = initial_solution(&problem, &AnnealConfig::default()).unwrap();

        assert_eq!(initial.placement(), &[Some(2), Some(1)]);
        let routes: Vec<_> = initial.routes().collect();
        assert_eq!(routes, vec![((1, 2), &[1][..])]);
        assert!(initial.used_links().is_empty());
        assert!(initial.is_valid(&problem));
        assert!((initial.fitness() - 190.0).abs() < 1e-9);
    }

    #[test]
    fn test_initial_routing_failure() {
        let problem = fixtures::thin_link_problem();
        let err = solve(&problem, &AnnealConfig::default()).unwrap_err();
        assert!(matches!(err, Error::InitialRouting { ref pairs } if pairs == &[(1, 2)]));
    }

    #[test]
    fn test_infeasible_instance() {
        let problem = ProblemBuilder::new()
            .with_node(1.0)
            .with_server(fixtures::server(10.0, 20.0, 2.0, 2.0, 1))
            .with_component(3.0, 1.0)
            .with_chain(1.0, vec![1])
            .build()
            .unwrap();
        let err = solve(&problem, &AnnealConfig::default()).unwrap_err();
        assert!(matches!(err, Error::InfeasibleInstance { component: 1 }));
    }

    #[test]
    fn test_seeded_solve_is_reproducible() {
        let problem = parse(include_str!("../data/three_nodes.txt")).unwrap();
        let config = AnnealConfig::default().with_max_iterations(40).with_seed(99);
        let a = solve(&problem, &config).unwrap();
        let b = solve(&problem, &config).unwrap();
        assert_eq!(a.best.to_string(), b.best.to_string());
        assert_eq!(a.fitness_history, b.fitness_history);
    }
}
