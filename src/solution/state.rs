//! Placement and route state of one candidate solution.

use crate::error::{PlaceError, RouteError};
use crate::problem::{ComponentId, NodeId, Problem, ServerId};
use std::collections::{BTreeMap, BTreeSet};

/// A candidate assignment of components to servers plus the routes between
/// communicating components.
///
/// All per-component and per-server state is kept in flat vectors indexed
/// by `id - 1`, so cloning a solution is a handful of vector copies. Link
/// usage is accumulated incrementally by [`set_route`](Self::set_route) and
/// only ever reset as a whole.
///
/// A solution does not hold a reference to its [`Problem`]; every
/// operation that needs instance data takes it as an argument.
#[derive(Debug, Clone)]
pub struct Solution {
    pub(super) placement: Vec<Option<ServerId>>,
    pub(super) cpu_load: Vec<f64>,
    pub(super) ram_load: Vec<f64>,
    pub(super) hosted: Vec<usize>,
    pub(super) routes: BTreeMap<(ComponentId, ComponentId), Vec<NodeId>>,
    pub(super) link_usage: BTreeMap<(NodeId, NodeId), f64>,
    pub(super) saturated: BTreeSet<(NodeId, NodeId)>,
    pub(super) fitness: f64,
    pub(super) probability: f64,
    pub(super) last_moved: Option<ComponentId>,
}

impl Solution {
    /// An empty solution: nothing placed, nothing routed.
    pub fn new(problem: &Problem) -> Self {
        let num_servers = problem.num_servers();
        Self {
            placement: vec![None; problem.num_components()],
            cpu_load: vec![0.0; num_servers],
            ram_load: vec![0.0; num_servers],
            hosted: vec![0; num_servers],
            routes: BTreeMap::new(),
            link_usage: BTreeMap::new(),
            saturated: BTreeSet::new(),
            fitness: f64::NAN,
            probability: 0.0,
            last_moved: None,
        }
    }

    pub fn num_components(&self) -> usize {
        self.placement.len()
    }

    pub fn num_servers(&self) -> usize {
        self.hosted.len()
    }

    /// Assigns `component` to `server`.
    ///
    /// Unless `force` is set, the call is rejected when the component's CPU
    /// or RAM demand would push the server past its capacity. A rejected
    /// call leaves the solution untouched. Placing a component on the
    /// server it already occupies is a no-op.
    pub fn place(
        &mut self,
        problem: &Problem,
        component: ComponentId,
        server: ServerId,
        force: bool,
    ) -> Result<(), PlaceError> {
        problem
            .component(component)
            .ok_or(PlaceError::ComponentOutOfRange(component))?;
        let host = problem
            .server(server)
            .ok_or(PlaceError::ServerOutOfRange(server))?;

        if self.placement[component - 1] == Some(server) {
            return Ok(());
        }

        if !force {
            let (cpu, ram) = self.summed_demand(problem, server, Some(component));
            if cpu > host.cpu {
                return Err(PlaceError::CpuExceeded {
                    component,
                    server,
                    required: cpu,
                    available: host.cpu,
                });
            }
            if ram > host.ram {
                return Err(PlaceError::RamExceeded {
                    component,
                    server,
                    required: ram,
                    available: host.ram,
                });
            }
        }

        self.unplace(problem, component);
        self.placement[component - 1] = Some(server);
        self.hosted[server - 1] += 1;
        self.refresh_load(problem, server);
        Ok(())
    }

    /// Removes `component` from its server, returning the server it was on.
    pub fn unplace(&mut self, problem: &Problem, component: ComponentId) -> Option<ServerId> {
        problem.component(component)?;
        let server = self.placement.get_mut(component - 1)?.take()?;
        self.hosted[server - 1] -= 1;
        self.refresh_load(problem, server);
        Some(server)
    }

    /// CPU and RAM demand of the components on `server`, plus `extra` if
    /// given, summed in ascending component order.
    fn summed_demand(
        &self,
        problem: &Problem,
        server: ServerId,
        extra: Option<ComponentId>,
    ) -> (f64, f64) {
        problem
            .components()
            .filter(|&(id, _)| Some(id) == extra || self.placement[id - 1] == Some(server))
            .fold((0.0, 0.0), |(cpu, ram), (_, c)| (cpu + c.cpu, ram + c.ram))
    }

    /// Recomputes the stored load of `server` from the current placement,
    /// so it never drifts from the exact sum after moves.
    fn refresh_load(&mut self, problem: &Problem, server: ServerId) {
        let (cpu, ram) = self.summed_demand(problem, server, None);
        self.cpu_load[server - 1] = cpu;
        self.ram_load[server - 1] = ram;
    }

    /// Server hosting `component`, if placed.
    pub fn server_of(&self, component: ComponentId) -> Option<ServerId> {
        component
            .checked_sub(1)
            .and_then(|i| self.placement.get(i))
            .copied()
            .flatten()
    }

    /// Node hosting `component`, if placed.
    pub fn node_of(&self, problem: &Problem, component: ComponentId) -> Option<NodeId> {
        self.server_of(component)
            .and_then(|s| problem.server_node(s))
    }

    /// Placement indexed by `component - 1`.
    pub fn placement(&self) -> &[Option<ServerId>] {
        &self.placement
    }

    /// Summed CPU demand of the components on `server`.
    pub fn cpu_load(&self, server: ServerId) -> f64 {
        server
            .checked_sub(1)
            .and_then(|i| self.cpu_load.get(i))
            .copied()
            .unwrap_or(0.0)
    }

    /// Summed RAM demand of the components on `server`.
    pub fn ram_load(&self, server: ServerId) -> f64 {
        server
            .checked_sub(1)
            .and_then(|i| self.ram_load.get(i))
            .copied()
            .unwrap_or(0.0)
    }

    /// A server is active when it hosts at least one component.
    pub fn is_server_active(&self, server: ServerId) -> bool {
        server
            .checked_sub(1)
            .and_then(|i| self.hosted.get(i))
            .is_some_and(|&n| n > 0)
    }

    /// Records `path` as the route between `c1` and `c2`.
    ///
    /// Every hop must be a link of the topology with room for the pair's
    /// demand on top of the bandwidth already routed over it. When any hop
    /// lacks capacity, those links are marked saturated, nothing else
    /// changes, and [`RouteError::CapacityExceeded`] is returned. Setting a
    /// route for a pair that already has one is a no-op.
    pub fn set_route(
        &mut self,
        problem: &Problem,
        c1: ComponentId,
        c2: ComponentId,
        path: Vec<NodeId>,
    ) -> Result<(), RouteError> {
        for c in [c1, c2] {
            if problem.component(c).is_none() {
                return Err(RouteError::ComponentOutOfRange(c));
            }
        }
        if path.is_empty() {
            return Err(RouteError::EmptyPath(c1, c2));
        }
        if let Some(&node) = path.iter().find(|&&n| n == 0 || n > problem.num_nodes()) {
            return Err(RouteError::NodeOutOfRange(node));
        }
        if self.routes.contains_key(&(c1, c2)) {
            return Ok(());
        }

        let demand = problem.demand(c1, c2);
        let mut over = Vec::new();
        for hop in path.windows(2) {
            let key = (hop[0], hop[1]);
            let link = problem
                .link(key.0, key.1)
                .ok_or(RouteError::UnknownLink(key.0, key.1))?;
            let used = self.link_usage.get(&key).copied().unwrap_or(0.0);
            if used + demand > link.capacity {
                over.push(key);
            }
        }

        if !over.is_empty() {
            self.saturated.extend(over.iter().copied());
            return Err(RouteError::CapacityExceeded { links: over });
        }

        for hop in path.windows(2) {
            *self.link_usage.entry((hop[0], hop[1])).or_insert(0.0) += demand;
        }
        self.routes.insert((c1, c2), path);
        Ok(())
    }

    pub fn route(&self, c1: ComponentId, c2: ComponentId) -> Option<&[NodeId]> {
        self.routes.get(&(c1, c2)).map(Vec::as_slice)
    }

    /// All routes in pair order.
    pub fn routes(&self) -> impl Iterator<Item = ((ComponentId, ComponentId), &[NodeId])> {
        self.routes.iter().map(|(k, v)| (*k, v.as_slice()))
    }

    /// Bandwidth routed over the link `from -> to`.
    pub fn link_usage(&self, from: NodeId, to: NodeId) -> f64 {
        self.link_usage.get(&(from, to)).copied().unwrap_or(0.0)
    }

    /// Links excluded from further path search in this solution.
    pub fn saturated_links(&self) -> &BTreeSet<(NodeId, NodeId)> {
        &self.saturated
    }

    pub fn is_saturated(&self, from: NodeId, to: NodeId) -> bool {
        self.saturated.contains(&(from, to))
    }

    /// Links traversed by at least one route. Single-node routes add none.
    pub fn used_links(&self) -> BTreeSet<(NodeId, NodeId)> {
        self.routes
            .values()
            .flat_map(|path| path.windows(2).map(|w| (w[0], w[1])))
            .collect()
    }

    /// Drops every route together with link usage and saturation marks.
    pub fn clear_routes(&mut self) {
        self.routes.clear();
        self.link_usage.clear();
        self.saturated.clear();
        self.fitness = f64::NAN;
    }

    /// A copy of this solution with `component` force-placed on `server`
    /// and no routes; the copy remembers `component` as its move.
    pub fn moved(&self, problem: &Problem, component: ComponentId, server: ServerId) -> Self {
        let mut next = Self {
            placement: self.placement.clone(),
            cpu_load: self.cpu_load.clone(),
            ram_load: self.ram_load.clone(),
            hosted: self.hosted.clone(),
            routes: BTreeMap::new(),
            link_usage: BTreeMap::new(),
            saturated: BTreeSet::new(),
            fitness: f64::NAN,
            probability: 0.0,
            last_moved: Some(component),
        };
        // Forced placement only fails on out-of-range ids, which leave
        // the copy as it was.
        let _ = next.place(problem, component, server, true);
        next
    }

    /// Last computed fitness (NaN when infeasible or not yet evaluated).
    pub fn fitness(&self) -> f64 {
        self.fitness
    }

    /// Last acceptance probability assigned by the annealer.
    pub fn probability(&self) -> f64 {
        self.probability
    }

    /// The component whose move produced this solution from its parent.
    pub fn last_moved(&self) -> Option<ComponentId> {
        self.last_moved
    }

    pub(crate) fn set_probability(&mut self, probability: f64) {
        self.probability = probability;
    }
}
