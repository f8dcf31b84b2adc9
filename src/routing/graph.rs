//! Minimum-latency paths over the node graph.

use crate::problem::{NodeId, Problem};
use std::cmp::Ordering;
use std::collections::{BTreeSet, BinaryHeap};

/// Adjacency view of the topology with some links left out.
///
/// Edge weights are link latencies.
#[derive(Debug, Clone)]
pub struct NodeGraph {
    adjacency: Vec<Vec<(NodeId, f64)>>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Frontier {
    cost: f64,
    node: NodeId,
}

impl Eq for Frontier {}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so the max-heap pops the cheapest entry.
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl NodeGraph {
    /// Builds the graph from every link of `problem` not in `excluded`.
    pub fn new(problem: &Problem, excluded: &BTreeSet<(NodeId, NodeId)>) -> Self {
        let mut adjacency = vec![Vec::new(); problem.num_nodes() + 1];
        for ((from, to), link) in problem.links() {
            if !excluded.contains(&(from, to)) {
                adjacency[from].push((to, link.latency));
            }
        }
        Self { adjacency }
    }

    pub fn num_edges(&self) -> usize {
        self.adjacency.iter().map(Vec::len).sum()
    }

    /// Dijkstra from `from` to `to`. Returns the node sequence including
    /// both endpoints, or `None` when `to` is unreachable.
    pub fn shortest_path(&self, from: NodeId, to: NodeId) -> Option<Vec<NodeId>> {
        let n = self.adjacency.len();
        if from == 0 || to == 0 || from >= n || to >= n {
            return None;
        }
        if from == to {
            return Some(vec![from]);
        }

        let mut dist = vec![f64::INFINITY; n];
        let mut prev: Vec<Option<NodeId>> = vec![None; n];
        let mut heap = BinaryHeap::new();
        dist[from] = 0.0;
        heap.push(Frontier {
            cost: 0.0,
            node: from,
        });

        while let Some(Frontier { cost, node }) = heap.pop() {
            if node == to {
                break;
            }
            if cost > dist[node] {
                continue;
            }
            for &(next, latency) in &self.adjacency[node] {
                let candidate = cost + latency;
                if candidate < dist[next] {
                    dist[next] = candidate;
                    prev[next] = Some(node);
                    heap.push(Frontier {
                        cost: candidate,
                        node: next,
                    });
                }
            }
        }

        prev[to]?;
        let mut path = vec![to];
        let mut cursor = to;
        while let Some(p) = prev[cursor] {
            path.push(p);
            cursor = p;
        }
        path.reverse();
        Some(path)
    }
}
