//! The immutable problem definition and its read-only queries.

use super::types::{
    ChainId, Component, ComponentId, Link, NeededRoute, NodeId, Server, ServerId, ServiceChain,
};
use std::collections::{BTreeMap, BTreeSet};

/// A fully-built placement instance.
///
/// Created once (through [`ProblemBuilder`](super::ProblemBuilder) or
/// [`parse`](super::parse)) and shared read-only by every stage of a run.
/// All ids are 1-based except [`ChainId`].
#[derive(Debug, Clone)]
pub struct Problem {
    pub(super) servers: Vec<Server>,
    pub(super) components: Vec<Component>,
    pub(super) node_power: Vec<f64>,
    pub(super) links: BTreeMap<(NodeId, NodeId), Link>,
    pub(super) demands: BTreeMap<(ComponentId, ComponentId), f64>,
    pub(super) chains: Vec<ServiceChain>,
    pub(super) placeable: Vec<ComponentId>,
    pub(super) needed_routes: Vec<NeededRoute>,
}

impl Problem {
    /// Fills in the derived tables. Inputs must already be validated.
    pub(super) fn assemble(
        servers: Vec<Server>,
        components: Vec<Component>,
        node_power: Vec<f64>,
        links: BTreeMap<(NodeId, NodeId), Link>,
        demands: BTreeMap<(ComponentId, ComponentId), f64>,
        chains: Vec<ServiceChain>,
    ) -> Self {
        let placeable: BTreeSet<ComponentId> = chains
            .iter()
            .flat_map(|c| c.components.iter().copied())
            .collect();

        let mut counts: BTreeMap<(ComponentId, ComponentId), usize> = BTreeMap::new();
        for chain in &chains {
            for pair in chain.pairs() {
                *counts.entry(pair).or_default() += 1;
            }
        }
        let mut needed_routes: Vec<NeededRoute> = counts
            .into_iter()
            .map(|((from, to), chains)| NeededRoute { from, to, chains })
            .collect();
        // Stable: equal counts keep ascending pair order.
        needed_routes.sort_by(|a, b| b.chains.cmp(&a.chains));

        Self {
            servers,
            components,
            node_power,
            links,
            demands,
            chains,
            placeable: placeable.into_iter().collect(),
            needed_routes,
        }
    }

    pub fn num_servers(&self) -> usize {
        self.servers.len()
    }

    pub fn num_components(&self) -> usize {
        self.components.len()
    }

    pub fn num_nodes(&self) -> usize {
        self.node_power.len()
    }

    pub fn num_links(&self) -> usize {
        self.links.len()
    }

    pub fn server(&self, id: ServerId) -> Option<&Server> {
        id.checked_sub(1).and_then(|i| self.servers.get(i))
    }

    pub fn component(&self, id: ComponentId) -> Option<&Component> {
        id.checked_sub(1).and_then(|i| self.components.get(i))
    }

    pub fn node_power(&self, id: NodeId) -> Option<f64> {
        id.checked_sub(1).and_then(|i| self.node_power.get(i)).copied()
    }

    /// Iterates `(id, server)` in id order.
    pub fn servers(&self) -> impl Iterator<Item = (ServerId, &Server)> {
        self.servers.iter().enumerate().map(|(i, s)| (i + 1, s))
    }

    pub fn components(&self) -> impl Iterator<Item = (ComponentId, &Component)> {
        self.components.iter().enumerate().map(|(i, c)| (i + 1, c))
    }

    pub fn link(&self, from: NodeId, to: NodeId) -> Option<&Link> {
        self.links.get(&(from, to))
    }

    pub fn links(&self) -> impl Iterator<Item = ((NodeId, NodeId), &Link)> {
        self.links.iter().map(|(k, v)| (*k, v))
    }

    /// Bandwidth required between two components, in either orientation.
    /// Zero when no demand was declared.
    pub fn demand(&self, c1: ComponentId, c2: ComponentId) -> f64 {
        self.demands
            .get(&(c1, c2))
            .or_else(|| self.demands.get(&(c2, c1)))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn service_chains(&self) -> &[ServiceChain] {
        &self.chains
    }

    pub fn service_chain(&self, id: ChainId) -> Option<&ServiceChain> {
        self.chains.get(id)
    }

    /// Node a server is attached to.
    pub fn server_node(&self, server: ServerId) -> Option<NodeId> {
        self.server(server).map(|s| s.node)
    }

    /// Components referenced by at least one service chain, ascending.
    /// Components outside every chain are never placed.
    pub fn components_to_place(&self) -> &[ComponentId] {
        &self.placeable
    }

    /// Communicating pairs, busiest (most chains) first.
    pub fn needed_routes(&self) -> &[NeededRoute] {
        &self.needed_routes
    }

    /// Server ids ordered by descending [`Server::efficiency`]; ties keep
    /// ascending id order.
    pub fn servers_by_efficiency(&self) -> Vec<ServerId> {
        let mut ids: Vec<ServerId> = (1..=self.num_servers()).collect();
        ids.sort_by(|&a, &b| {
            let ea = self.servers[a - 1].efficiency();
            let eb = self.servers[b - 1].efficiency();
            eb.total_cmp(&ea)
        });
        ids
    }
}
