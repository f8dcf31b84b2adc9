//! Persisted form of a solution.
//!
//! A solution is written as two blocks: the one-hot assignment matrix `x`
//! (one row per component, one column per server) and the route list.
//!
//! ```text
//! x=[
//! [1,0]
//! [0,1]
//! ];
//!
//! routes={
//! <1,2,[1,2]>
//! };
//! ```

use super::state::Solution;
use crate::error::AssignmentError;
use crate::problem::{ComponentId, NodeId, Problem};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One routed component pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteEntry {
    pub from: ComponentId,
    pub to: ComponentId,
    pub path: Vec<NodeId>,
}

/// Structured snapshot of a solution for persistence collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolutionRecord {
    pub assignment: Vec<Vec<u8>>,
    pub routes: Vec<RouteEntry>,
    /// `None` when the solution is infeasible.
    pub fitness: Option<f64>,
}

impl Solution {
    /// One-hot matrix: `matrix[c - 1][s - 1] == 1` iff component `c` is on
    /// server `s`. Unplaced components get an all-zero row.
    pub fn assignment_matrix(&self) -> Vec<Vec<u8>> {
        let width = self.num_servers();
        self.placement
            .iter()
            .map(|server| {
                let mut row = vec![0u8; width];
                if let Some(s) = server {
                    row[s - 1] = 1;
                }
                row
            })
            .collect()
    }

    pub fn route_list(&self) -> Vec<RouteEntry> {
        self.routes()
            .map(|((from, to), path)| RouteEntry {
                from,
                to,
                path: path.to_vec(),
            })
            .collect()
    }

    pub fn to_record(&self) -> SolutionRecord {
        SolutionRecord {
            assignment: self.assignment_matrix(),
            routes: self.route_list(),
            fitness: (!self.fitness.is_nan()).then_some(self.fitness),
        }
    }

    /// Rebuilds an unrouted solution from an assignment matrix.
    ///
    /// Placement is forced, so an over-capacity matrix is reproduced as-is.
    pub fn from_assignment(
        problem: &Problem,
        matrix: &[Vec<u8>],
    ) -> Result<Self, AssignmentError> {
        if matrix.len() != problem.num_components() {
            return Err(AssignmentError::RowCount {
                expected: problem.num_components(),
                found: matrix.len(),
            });
        }

        let mut solution = Solution::new(problem);
        for (i, row) in matrix.iter().enumerate() {
            let component = i + 1;
            if row.len() != problem.num_servers() {
                return Err(AssignmentError::RowWidth {
                    row: component,
                    expected: problem.num_servers(),
                    found: row.len(),
                });
            }
            let mut servers = row.iter().enumerate().filter(|(_, &x)| x != 0);
            match (servers.next(), servers.next()) {
                (None, _) => {}
                (Some((s, _)), None) => solution.place(problem, component, s + 1, true)?,
                (Some(_), Some(_)) => return Err(AssignmentError::MultipleServers(component)),
            }
        }
        Ok(solution)
    }
}

fn join<T: fmt::Display>(values: &[T]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

impl fmt::Display for Solution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "x=[")?;
        for row in self.assignment_matrix() {
            writeln!(f, "[{}]", join(&row))?;
        }
        writeln!(f, "];")?;
        writeln!(f)?;

        writeln!(f, "routes={{")?;
        let routes: Vec<String> = self
            .route_list()
            .iter()
            .map(|r| format!("<{},{},[{}]>", r.from, r.to, join(&r.path)))
            .collect();
        writeln!(f, "{}", routes.join(",\n"))?;
        write!(f, "}};")
    }
}
