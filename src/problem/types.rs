//! Entities of a placement instance.

use serde::{Deserialize, Serialize};

/// 1-based server index.
pub type ServerId = usize;
/// 1-based component (VM) index.
pub type ComponentId = usize;
/// 1-based network node index.
pub type NodeId = usize;
/// 0-based service chain index.
pub type ChainId = usize;

/// A physical host with a linear power curve between `min_power` (idle)
/// and `max_power` (full CPU utilization).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Server {
    pub min_power: f64,
    pub max_power: f64,
    pub cpu: f64,
    pub ram: f64,
    /// Node the server is attached to.
    pub node: NodeId,
}

impl Server {
    /// CPU capacity per watt at full load.
    pub fn efficiency(&self) -> f64 {
        self.cpu / self.max_power
    }

    /// Power draw at the given CPU load (not clamped).
    pub fn power_at(&self, cpu_load: f64) -> f64 {
        self.min_power + (self.max_power - self.min_power) * (cpu_load / self.cpu)
    }
}

/// Resource demand of one component.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub cpu: f64,
    pub ram: f64,
}

/// Properties of a directed node-to-node link.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Link {
    /// Bandwidth capacity.
    pub capacity: f64,
    /// Power drawn while the link carries any traffic.
    pub power: f64,
    pub latency: f64,
}

/// An ordered sequence of components under an end-to-end latency budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceChain {
    pub max_latency: f64,
    pub components: Vec<ComponentId>,
}

impl ServiceChain {
    /// Consecutive component pairs that must communicate directly.
    pub fn pairs(&self) -> impl Iterator<Item = (ComponentId, ComponentId)> + '_ {
        self.components.windows(2).map(|w| (w[0], w[1]))
    }
}

/// A communicating component pair and how many chains require it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeededRoute {
    pub from: ComponentId,
    pub to: ComponentId,
    pub chains: usize,
}

impl NeededRoute {
    pub fn pair(&self) -> (ComponentId, ComponentId) {
        (self.from, self.to)
    }
}
