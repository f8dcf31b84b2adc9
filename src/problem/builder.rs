//! Incremental construction of a [`Problem`].

use super::model::Problem;
use super::types::{Component, ComponentId, Link, NodeId, Server, ServiceChain};
use crate::error::ProblemError;
use std::collections::BTreeMap;

/// Builder for [`Problem`].
///
/// # Examples
///
/// ```
/// use vnf_anneal::problem::{Link, ProblemBuilder, Server};
///
/// let problem = ProblemBuilder::new()
///     .with_node(10.0)
///     .with_node(10.0)
///     .with_server(Server { min_power: 50.0, max_power: 100.0, cpu: 8.0, ram: 16.0, node: 1 })
///     .with_server(Server { min_power: 50.0, max_power: 100.0, cpu: 8.0, ram: 16.0, node: 2 })
///     .with_component(2.0, 4.0)
///     .with_component(2.0, 4.0)
///     .with_symmetric_link(1, 2, Link { capacity: 100.0, power: 5.0, latency: 1.0 })
///     .with_demand(1, 2, 10.0)
///     .with_chain(5.0, vec![1, 2])
///     .build()
///     .unwrap();
/// assert_eq!(problem.num_servers(), 2);
/// assert_eq!(problem.needed_routes().len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ProblemBuilder {
    servers: Vec<Server>,
    components: Vec<Component>,
    node_power: Vec<f64>,
    links: BTreeMap<(NodeId, NodeId), Link>,
    demands: BTreeMap<(ComponentId, ComponentId), f64>,
    chains: Vec<ServiceChain>,
}

impl ProblemBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node with the given power draw; ids are assigned in order.
    pub fn with_node(mut self, power: f64) -> Self {
        self.node_power.push(power);
        self
    }

    pub fn with_server(mut self, server: Server) -> Self {
        self.servers.push(server);
        self
    }

    pub fn with_component(mut self, cpu: f64, ram: f64) -> Self {
        self.components.push(Component { cpu, ram });
        self
    }

    /// Adds a directed link. A later link between the same nodes replaces it.
    pub fn with_link(mut self, from: NodeId, to: NodeId, link: Link) -> Self {
        self.links.insert((from, to), link);
        self
    }

    /// Adds the link in both directions.
    pub fn with_symmetric_link(self, a: NodeId, b: NodeId, link: Link) -> Self {
        self.with_link(a, b, link).with_link(b, a, link)
    }

    pub fn with_demand(mut self, c1: ComponentId, c2: ComponentId, bandwidth: f64) -> Self {
        self.demands.insert((c1, c2), bandwidth);
        self
    }

    pub fn with_chain(mut self, max_latency: f64, components: Vec<ComponentId>) -> Self {
        self.chains.push(ServiceChain {
            max_latency,
            components,
        });
        self
    }

    /// Validates cross references and builds the problem.
    pub fn build(self) -> Result<Problem, ProblemError> {
        let num_nodes = self.node_power.len();
        let num_components = self.components.len();

        for (i, server) in self.servers.iter().enumerate() {
            let id = i + 1;
            if server.node == 0 || server.node > num_nodes {
                return Err(ProblemError::NodeOutOfRange {
                    entity: "server",
                    id,
                    node: server.node,
                    num_nodes,
                });
            }
            if server.cpu.is_nan() || server.cpu <= 0.0 {
                return Err(ProblemError::InvalidServer {
                    server: id,
                    reason: format!("available CPU must be positive, got {}", server.cpu),
                });
            }
            if server.max_power.is_nan()
                || server.max_power <= 0.0
                || server.max_power < server.min_power
            {
                return Err(ProblemError::InvalidServer {
                    server: id,
                    reason: format!(
                        "power range [{}, {}] is invalid",
                        server.min_power, server.max_power
                    ),
                });
            }
        }

        for &(from, to) in self.links.keys() {
            for node in [from, to] {
                if node == 0 || node > num_nodes {
                    return Err(ProblemError::NodeOutOfRange {
                        entity: "link from node",
                        id: from,
                        node,
                        num_nodes,
                    });
                }
            }
        }

        let check_component = |context: String, component: ComponentId| {
            if component == 0 || component > num_components {
                Err(ProblemError::ComponentOutOfRange {
                    context,
                    component,
                    num_components,
                })
            } else {
                Ok(())
            }
        };

        for &(c1, c2) in self.demands.keys() {
            check_component(format!("demand <{c1},{c2}>"), c1)?;
            check_component(format!("demand <{c1},{c2}>"), c2)?;
        }

        for (id, chain) in self.chains.iter().enumerate() {
            if chain.components.is_empty() {
                return Err(ProblemError::EmptyChain(id));
            }
            for &c in &chain.components {
                check_component(format!("service chain {id}"), c)?;
            }
        }

        Ok(Problem::assemble(
            self.servers,
            self.components,
            self.node_power,
            self.links,
            self.demands,
            self.chains,
        ))
    }
}
