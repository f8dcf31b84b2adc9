//! Capacity-aware routing of every communicating component pair.

use super::graph::NodeGraph;
use crate::error::{RouteError, RoutingError};
use crate::problem::{ComponentId, Problem};
use crate::solution::Solution;
use tracing::debug;

/// Result of a [`Router::route`] call that did not hit a fatal error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutingOutcome {
    /// Every communicating pair has a route.
    FullyRouted,
    /// The listed pairs have no path once saturated links are excluded;
    /// all other pairs were routed.
    PartiallyRouted {
        failed: Vec<(ComponentId, ComponentId)>,
    },
}

impl RoutingOutcome {
    pub fn is_complete(&self) -> bool {
        matches!(self, RoutingOutcome::FullyRouted)
    }

    pub fn failed_pairs(&self) -> &[(ComponentId, ComponentId)] {
        match self {
            RoutingOutcome::FullyRouted => &[],
            RoutingOutcome::PartiallyRouted { failed } => failed,
        }
    }
}

/// Assigns minimum-latency, capacity-respecting routes.
///
/// Pairs are routed busiest first (most service chains requiring them).
/// For each pair whose components sit on different nodes, the router runs
/// Dijkstra over every non-saturated link and tries to commit the path. A
/// hop without room for the pair's demand is marked saturated on the
/// solution and the search is repeated, at most `max_attempts` times.
///
/// # Examples
///
/// ```
/// use vnf_anneal::placement::InitialPlacer;
/// use vnf_anneal::problem::parse;
/// use vnf_anneal::routing::Router;
///
/// let text = std::fs::read_to_string(concat!(env!("CARGO_MANIFEST_DIR"), "/data/three_nodes.txt")).unwrap();
/// let problem = parse(&text).unwrap();
/// let mut solution = InitialPlacer::place_all(&problem).unwrap();
/// let outcome = Router::new().route(&problem, &mut solution).unwrap();
/// assert!(outcome.is_complete());
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Router {
    max_attempts: Option<usize>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Caps path searches per pair. Without a cap the router allows one
    /// more attempt than there are links, which is always enough since
    /// every failed attempt saturates at least one new link.
    pub fn with_max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = Some(attempts.max(1));
        self
    }

    /// Routes every communicating pair that has no route yet.
    ///
    /// Returns [`RoutingError`] when a pair cannot be routed for a reason
    /// other than capacity, e.g. one of its components is unplaced.
    pub fn route(
        &self,
        problem: &Problem,
        solution: &mut Solution,
    ) -> Result<RoutingOutcome, RoutingError> {
        let max_attempts = self
            .max_attempts
            .unwrap_or_else(|| problem.num_links() + 1);
        let mut failed = Vec::new();

        for needed in problem.needed_routes() {
            let (c1, c2) = needed.pair();
            if solution.route(c1, c2).is_some() {
                continue;
            }
            if !self.route_pair(problem, solution, c1, c2, max_attempts)? {
                failed.push((c1, c2));
            }
        }

        if failed.is_empty() {
            Ok(RoutingOutcome::FullyRouted)
        } else {
            Ok(RoutingOutcome::PartiallyRouted { failed })
        }
    }

    /// `Ok(false)` when no feasible path is left for the pair.
    fn route_pair(
        &self,
        problem: &Problem,
        solution: &mut Solution,
        c1: ComponentId,
        c2: ComponentId,
        max_attempts: usize,
    ) -> Result<bool, RoutingError> {
        let n1 = solution
            .node_of(problem, c1)
            .ok_or(RoutingError::Unplaced(c1))?;
        let n2 = solution
            .node_of(problem, c2)
            .ok_or(RoutingError::Unplaced(c2))?;

        if n1 == n2 {
            solution
                .set_route(problem, c1, c2, vec![n1])
                .map_err(|e| RoutingError::Rejected(c1, c2, e))?;
            return Ok(true);
        }

        for attempt in 1..=max_attempts {
            let graph = NodeGraph::new(problem, solution.saturated_links());
            let Some(path) = graph.shortest_path(n1, n2) else {
                debug!(c1, c2, from = n1, to = n2, attempt, "no path left");
                return Ok(false);
            };
            match solution.set_route(problem, c1, c2, path) {
                Ok(()) => return Ok(true),
                Err(RouteError::CapacityExceeded { links }) => {
                    debug!(c1, c2, attempt, ?links, "links saturated, retrying");
                }
                Err(e) => return Err(RoutingError::Rejected(c1, c2, e)),
            }
        }

        debug!(c1, c2, max_attempts, "route attempts exhausted");
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::{fixtures, ProblemBuilder};
    use crate::solution::Violation;

    #[test]
    fn test_colocated_pair_gets_single_node_route() {
        let problem = fixtures::line_problem();
        let mut sol = Solution::new(&problem);
        // servers 1 and 2 are on different nodes; put everything on server 2
        for c in 1..=3 {
            sol.place(&problem, c, 2, false).unwrap();
        }
        let outcome = Router::new().route(&problem, &mut sol).unwrap();
        assert_eq!(outcome, RoutingOutcome::FullyRouted);
        assert_eq!(sol.route(1, 2), Some(&[2][..]));
        assert_eq!(sol.route(2, 3), Some(&[2][..]));
        assert!(sol.used_links().is_empty());
        assert_eq!(sol.link_usage(1, 2), 0.0);
    }

    #[test]
    fn test_routes_across_nodes() {
        let problem = fixtures::line_problem();
        let mut sol = Solution::new(&problem);
        sol.place(&problem, 1, 1, false).unwrap();
        sol.place(&problem, 2, 2, false).unwrap();
        sol.place(&problem, 3, 3, false).unwrap();
        let outcome = Router::new().route(&problem, &mut sol).unwrap();
        assert!(outcome.is_complete());
        assert_eq!(sol.route(1, 2), Some(&[1, 2][..]));
        assert_eq!(sol.route(2, 3), Some(&[2, 3][..]));
        assert_eq!(sol.link_usage(1, 2), 5.0);
    }

    #[test]
    fn test_unplaced_component_is_fatal() {
        let problem = fixtures::line_problem();
        let mut sol = Solution::new(&problem);
        sol.place(&problem, 1, 1, false).unwrap();
        let err = Router::new().route(&problem, &mut sol).unwrap_err();
        assert_eq!(err, RoutingError::Unplaced(2));
    }

    #[test]
    fn test_thin_link_fails_pair() {
        let problem = fixtures::thin_link_problem();
        let mut sol = Solution::new(&problem);
        sol.place(&problem, 1, 1, false).unwrap();
        sol.place(&problem, 2, 2, false).unwrap();
        let outcome = Router::new().route(&problem, &mut sol).unwrap();
        assert_eq!(outcome.failed_pairs(), &[(1, 2)]);
        assert!(sol.is_saturated(1, 2));
        assert!(sol.route(1, 2).is_none());
        let validity = sol.check_validity(&problem);
        assert!(!validity.is_valid());
        assert_eq!(
            validity.violations,
            vec![Violation::MissingRoute { from: 1, to: 2 }]
        );
    }

    #[test]
    fn test_saturated_link_triggers_detour() {
        // 1 -> 2 direct (latency 1, capacity 5) or 1 -> 3 -> 2 (latency 4, capacity 50)
        let problem = ProblemBuilder::new()
            .with_node(1.0)
            .with_node(1.0)
            .with_node(1.0)
            .with_server(fixtures::server(10.0, 20.0, 10.0, 10.0, 1))
            .with_server(fixtures::server(10.0, 20.0, 10.0, 10.0, 2))
            .with_component(1.0, 1.0)
            .with_component(1.0, 1.0)
            .with_link(1, 2, fixtures::link(5.0, 1.0, 1.0))
            .with_link(1, 3, fixtures::link(50.0, 1.0, 2.0))
            .with_link(3, 2, fixtures::link(50.0, 1.0, 2.0))
            .with_demand(1, 2, 8.0)
            .with_chain(10.0, vec![1, 2])
            .build()
            .unwrap();

        let mut sol = Solution::new(&problem);
        sol.place(&problem, 1, 1, false).unwrap();
        sol.place(&problem, 2, 2, false).unwrap();
        let outcome = Router::new().route(&problem, &mut sol).unwrap();
        assert!(outcome.is_complete());
        assert_eq!(sol.route(1, 2), Some(&[1, 3, 2][..]));
        assert!(sol.is_saturated(1, 2));
        assert_eq!(sol.link_usage(1, 2), 0.0);
        assert_eq!(sol.link_usage(1, 3), 8.0);
    }

    #[test]
    fn test_attempt_cap_gives_up() {
        let problem = ProblemBuilder::new()
            .with_node(1.0)
            .with_node(1.0)
            .with_node(1.0)
            .with_server(fixtures::server(10.0, 20.0, 10.0, 10.0, 1))
            .with_server(fixtures::server(10.0, 20.0, 10.0, 10.0, 2))
            .with_component(1.0, 1.0)
            .with_component(1.0, 1.0)
            .with_link(1, 2, fixtures::link(5.0, 1.0, 1.0))
            .with_link(1, 3, fixtures::link(50.0, 1.0, 2.0))
            .with_link(3, 2, fixtures::link(50.0, 1.0, 2.0))
            .with_demand(1, 2, 8.0)
            .with_chain(10.0, vec![1, 2])
            .build()
            .unwrap();

        let mut sol = Solution::new(&problem);
        sol.place(&problem, 1, 1, false).unwrap();
        sol.place(&problem, 2, 2, false).unwrap();
        let outcome = Router::new()
            .with_max_attempts(1)
            .route(&problem, &mut sol)
            .unwrap();
        assert_eq!(outcome.failed_pairs(), &[(1, 2)]);
    }

    #[test]
    fn test_existing_routes_are_kept() {
        let problem = fixtures::line_problem();
        let mut sol = Solution::new(&problem);
        sol.place(&problem, 1, 1, false).unwrap();
        sol.place(&problem, 2, 2, false).unwrap();
        sol.place(&problem, 3, 2, false).unwrap();
        let router = Router::new();
        router.route(&problem, &mut sol).unwrap();
        router.route(&problem, &mut sol).unwrap();
        assert_eq!(sol.link_usage(1, 2), 5.0);
    }
}
