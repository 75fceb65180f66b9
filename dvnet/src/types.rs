// DVNet: Simulating Distance-Vector Routing Protocols
// Copyright (C) 2021  Tibor Schneider
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

//! Module containing all type definitions

use petgraph::graph::{NodeIndex, UnGraph};
use thiserror::Error;

pub(crate) type IndexType = u32;

/// Node identification (and index into the topology graph). Node ids are dense in `[0, N)`
/// because the [`Network`](crate::Network) adds all nodes to the graph at construction, in order.
pub type NodeId = NodeIndex<IndexType>;

/// Multicast group identifier. A node may join any number of groups; membership is administered
/// through the network, never by the protocol itself.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy)]
pub struct GroupId(pub u32);

/// Topology graph. Nodes carry no payload (all per-node state lives in the node arena), and
/// edges are unweighted channels: the routing metric is pure hop count.
pub type Topology = UnGraph<(), (), IndexType>;

/// Hop-count "infinity". An entry at this cost describes an unreachable destination, and any
/// advertisement that would meet or exceed it is discarded.
pub const INFINITY_COST: u8 = 16;

/// The distance-vector protocol variant a network simulates.
#[derive(PartialEq, Eq, Hash, Debug, Clone, Copy)]
pub enum Protocol {
    /// Simplified RIP: unicast-only relaxation with mutual-next-hop poisoning.
    Rip,
    /// Simplified DVMRP: multicast-aware relaxation carrying reachable-group sets, with
    /// Truncated Reverse Path Broadcasting on the forwarding side.
    Dvmrp,
}

/// Network Errors
#[derive(Error, Debug, PartialEq)]
pub enum NetworkError {
    /// A node index outside of `[0, N)` was passed to the network.
    #[error("Node index {0} is out of range: the network has {1} nodes")]
    NodeOutOfRange(usize, usize),
    /// Forwarding loop detected while extracting a route
    #[error("Forwarding Loop occurred! path: {0:?}")]
    ForwardingLoop(Vec<NodeId>),
    /// Black hole detected while extracting a route
    #[error("Black hole occurred! path: {0:?}")]
    ForwardingBlackHole(Vec<NodeId>),
    /// The routing tables did not converge within the given number of sweeps.
    #[error("Routing tables cannot converge in the given time!")]
    NoConvergence,
}
