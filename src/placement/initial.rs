//! Greedy first placement.

use crate::error::Error;
use crate::problem::Problem;
use crate::solution::Solution;
use tracing::{debug, info};

/// Builds the starting solution by packing components onto servers in
/// order of decreasing efficiency (CPU per watt at full load).
///
/// Each chained component goes to the current server; when it does not
/// fit, the cursor advances to the next server and the same component is
/// retried. The cursor never moves back. Components that belong to no
/// service chain are left unplaced.
pub struct InitialPlacer;

impl InitialPlacer {
    /// Places every component that belongs to a service chain.
    ///
    /// Fails with [`Error::InfeasibleInstance`] when the servers run out
    /// before all components are placed.
    pub fn place_all(problem: &Problem) -> Result<Solution, Error> {
        let servers = problem.servers_by_efficiency();
        let mut solution = Solution::new(problem);
        let mut cursor = 0usize;

        for &component in problem.components_to_place() {
            loop {
                let Some(&server) = servers.get(cursor) else {
                    return Err(Error::InfeasibleInstance { component });
                };
                match solution.place(problem, component, server, false) {
                    Ok(()) => break,
                    Err(e) => {
                        debug!(component, server, reason = %e, "server full, advancing");
                        cursor += 1;
                    }
                }
            }
        }

        info!(
            placed = problem.components_to_place().len(),
            servers_used = (1..=problem.num_servers())
                .filter(|&s| solution.is_server_active(s))
                .count(),
            "initial placement done"
        );
        Ok(solution)
    }
}
