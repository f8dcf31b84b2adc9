//! Feasibility check of a routed solution.

use super::state::Solution;
use crate::problem::{ChainId, ComponentId, Problem, ServerId};
use std::fmt;

/// One broken constraint.
#[derive(Debug, Clone, PartialEq)]
pub enum Violation {
    /// A component required by a service chain has no server.
    Unplaced { component: ComponentId },
    /// A communicating pair has no recorded route.
    MissingRoute { from: ComponentId, to: ComponentId },
    CpuOverload {
        server: ServerId,
        load: f64,
        available: f64,
    },
    RamOverload {
        server: ServerId,
        load: f64,
        available: f64,
    },
    /// The chain's routes add up to more latency than its budget.
    LatencyExceeded {
        chain: ChainId,
        latency: f64,
        max_latency: f64,
    },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::Unplaced { component } => {
                write!(f, "component {component} is not placed")
            }
            Violation::MissingRoute { from, to } => {
                write!(f, "no route between components {from} and {to}")
            }
            Violation::CpuOverload {
                server,
                load,
                available,
            } => write!(f, "server {server} CPU overloaded ({load}/{available})"),
            Violation::RamOverload {
                server,
                load,
                available,
            } => write!(f, "server {server} RAM overloaded ({load}/{available})"),
            Violation::LatencyExceeded {
                chain,
                latency,
                max_latency,
            } => write!(
                f,
                "service chain {chain} latency {latency} exceeds {max_latency}"
            ),
        }
    }
}

/// Outcome of [`Solution::check_validity`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Validity {
    pub violations: Vec<Violation>,
}

impl Validity {
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    /// Human-readable diagnostics, one per violation.
    pub fn diagnostics(&self) -> Vec<String> {
        self.violations.iter().map(ToString::to_string).collect()
    }
}

impl Solution {
    /// Checks placement, routing, server capacity and chain latency.
    ///
    /// Every check runs and every failure is reported. Link capacity is
    /// not checked here: [`Solution::set_route`] never records a route
    /// that overflows a link.
    pub fn check_validity(&self, problem: &Problem) -> Validity {
        let mut violations = Vec::new();

        for &component in problem.components_to_place() {
            if self.server_of(component).is_none() {
                violations.push(Violation::Unplaced { component });
            }
        }

        for needed in problem.needed_routes() {
            if self.route(needed.from, needed.to).is_none() {
                violations.push(Violation::MissingRoute {
                    from: needed.from,
                    to: needed.to,
                });
            }
        }

        for (server, host) in problem.servers() {
            let cpu = self.cpu_load(server);
            if cpu > host.cpu {
                violations.push(Violation::CpuOverload {
                    server,
                    load: cpu,
                    available: host.cpu,
                });
            }
            let ram = self.ram_load(server);
            if ram > host.ram {
                violations.push(Violation::RamOverload {
                    server,
                    load: ram,
                    available: host.ram,
                });
            }
        }

        for (chain, sc) in problem.service_chains().iter().enumerate() {
            let latency = self.chain_latency(problem, chain);
            if latency > sc.max_latency {
                violations.push(Violation::LatencyExceeded {
                    chain,
                    latency,
                    max_latency: sc.max_latency,
                });
            }
        }

        Validity { violations }
    }

    /// Shorthand for `check_validity(problem).is_valid()`.
    pub fn is_valid(&self, problem: &Problem) -> bool {
        self.check_validity(problem).is_valid()
    }

    /// Summed link latency along the routes of a chain's consecutive pairs.
    /// Missing routes and single-node routes add nothing.
    pub fn chain_latency(&self, problem: &Problem, chain: ChainId) -> f64 {
        let Some(sc) = problem.service_chain(chain) else {
            return 0.0;
        };
        sc.pairs()
            .filter_map(|(c1, c2)| self.route(c1, c2))
            .flat_map(|path| path.windows(2))
            .map(|hop| problem.link(hop[0], hop[1]).map_or(0.0, |l| l.latency))
            .sum()
    }
}
