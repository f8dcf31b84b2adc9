//! Power cost of a solution.
//!
//! Fitness is the sum of three parts:
//!
//! - **servers**: every active server draws `min_power` plus the share of
//!   `max_power - min_power` given by its CPU utilization;
//! - **nodes**: a node draws its power when at least one used link touches
//!   it (active servers alone do not switch a node on);
//! - **links**: every link traversed by some route draws its power once.
//!
//! A server loaded past its CPU capacity makes the solution infeasible and
//! the fitness `NaN`. Use [`is_better`] and [`fitness_rank`] instead of
//! raw comparisons.

use super::state::Solution;
use crate::problem::Problem;
use std::collections::BTreeSet;
use tracing::trace;

/// Cost parts of a feasible solution.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FitnessBreakdown {
    pub servers: f64,
    pub nodes: f64,
    pub links: f64,
}

impl FitnessBreakdown {
    pub fn total(&self) -> f64 {
        self.servers + self.nodes + self.links
    }
}

/// Maps the `NaN` sentinel to `+inf` so fitness values can be ordered.
pub fn fitness_rank(fitness: f64) -> f64 {
    if fitness.is_nan() {
        f64::INFINITY
    } else {
        fitness
    }
}

/// `true` when `candidate` is strictly better (lower) than `incumbent`.
/// `NaN` is worse than every number, including another `NaN`.
pub fn is_better(candidate: f64, incumbent: f64) -> bool {
    !candidate.is_nan() && (incumbent.is_nan() || candidate < incumbent)
}

impl Solution {
    /// Cost parts, or `None` when some active server is CPU-overloaded.
    pub fn fitness_breakdown(&self, problem: &Problem) -> Option<FitnessBreakdown> {
        let mut cost = FitnessBreakdown::default();

        for (id, server) in problem.servers() {
            if !self.is_server_active(id) {
                continue;
            }
            let load = self.cpu_load(id);
            if load > server.cpu {
                trace!(server = id, load, available = server.cpu, "server CPU overloaded");
                return None;
            }
            let power = server.power_at(load);
            trace!(server = id, load, power, "server active");
            cost.servers += power;
        }

        let used = self.used_links();
        let active_nodes: BTreeSet<_> = used.iter().flat_map(|&(a, b)| [a, b]).collect();
        for node in active_nodes {
            let power = problem.node_power(node).unwrap_or(0.0);
            trace!(node, power, "node active");
            cost.nodes += power;
        }

        for (from, to) in used {
            let power = problem.link(from, to).map_or(0.0, |l| l.power);
            trace!(from, to, power, "link used");
            cost.links += power;
        }

        Some(cost)
    }

    /// Total power cost, or `NaN` when infeasible. Does not store the result.
    pub fn calculate_fitness(&self, problem: &Problem) -> f64 {
        self.fitness_breakdown(problem)
            .map_or(f64::NAN, |b| b.total())
    }

    /// Computes the fitness and stores it on the solution.
    pub fn evaluate(&mut self, problem: &Problem) -> f64 {
        self.fitness = self.calculate_fitness(problem);
        self.fitness
    }
}
