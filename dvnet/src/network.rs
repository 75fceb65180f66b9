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

//! # Top-level Network module
//!
//! This module owns the node population and the topology, spawns the control loops, injects
//! packets and administers group membership.

use crate::node::{NeighborView, Node};
use crate::packet::{Packet, PacketDest, PacketRecord, PacketState};
use crate::route::RoutingEntry;
use crate::types::{GroupId, NetworkError, NodeId, Protocol, Topology};
use crate::Stopper;

use log::*;
use rand::prelude::*;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

/// Upper bound on the full-table sweeps [`Network::relax_until_converged`] will perform before
/// giving up.
pub static DEFAULT_MAX_SWEEPS: usize = 10_000;

/// # Network struct
///
/// The struct owns all virtual routers (an arena of [`Node`]s indexed by [`NodeId`]) and the
/// undirected channel topology connecting them. All mutable state sits behind a single
/// simulation-wide mutex: every relaxation tick, every forwarding tick, every packet injection
/// and every group change acquires it, so any reader observes a consistent snapshot and all
/// mutations are totally ordered.
///
/// The network can be driven in two ways:
///
/// - [`start`](Network::start) spawns the two control loops per node (one distance-vector
///   relaxation loop, one forwarding loop) as threads, reproducing the concurrent simulator.
///   Forwarding records are printed to stdout as they happen.
/// - [`dv_tick`](Network::dv_tick) and [`forward_tick`](Network::forward_tick) perform single
///   steps synchronously, which makes runs deterministic, and
///   [`relax_until_converged`](Network::relax_until_converged) drives full sweeps until a
///   fixpoint.
#[derive(Debug)]
pub struct Network {
    protocol: Protocol,
    node_count: usize,
    state: Arc<Mutex<SimState>>,
    stopper: Stopper,
    handles: Vec<JoinHandle<()>>,
}

/// All mutable simulator state, guarded by the one simulation mutex.
#[derive(Debug)]
pub(crate) struct SimState {
    pub(crate) graph: Topology,
    pub(crate) nodes: Vec<Node>,
}

impl Network {
    /// Generate a network of `node_count` disconnected nodes with ids `0..node_count`. Every
    /// routing table starts all-unreachable (`cost = 16`, no next hop).
    pub fn new(protocol: Protocol, node_count: usize) -> Self {
        let mut graph = Topology::with_capacity(node_count, node_count);
        let mut nodes = Vec::with_capacity(node_count);
        for i in 0..node_count {
            let id = graph.add_node(());
            debug_assert_eq!(id.index(), i);
            nodes.push(Node::new(id, node_count));
        }
        Self {
            protocol,
            node_count,
            state: Arc::new(Mutex::new(SimState { graph, nodes })),
            stopper: Stopper::new(),
            handles: Vec::new(),
        }
    }

    /// Return the protocol variant this network simulates.
    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    /// Return the number of nodes in the network.
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// Install the symmetric channel between `a` and `b`. Installing an existing channel, or a
    /// channel from a node to itself, is a no-op.
    pub fn build_channel(&self, a: usize, b: usize) -> Result<(), NetworkError> {
        let a = self.check_node(a)?;
        let b = self.check_node(b)?;
        self.state.lock().unwrap().add_channel(a, b);
        Ok(())
    }

    /// Build a random topology: draw a single edge-count parameter `k` uniformly from `[1, 3]`,
    /// then attempt `k` edges from every node to a uniformly drawn *different* node. Candidate
    /// edges are folded into an undirected edge set (in insertion order) before they are
    /// realized, so duplicates collapse. The resulting graph is not guaranteed to be
    /// connected; unreachable destinations simply stay at cost 16.
    pub fn build_random_channels(&self) {
        if self.node_count < 2 {
            return;
        }
        let mut rng = thread_rng();
        let edge_cnt: usize = rng.gen_range(1, 4);
        let mut edges: Vec<(usize, usize)> = Vec::new();
        for a in 0..self.node_count {
            for _ in 0..edge_cnt {
                let e = create_edge(a, self.node_count, &mut rng);
                if !edges.iter().any(|&(x, y)| (x, y) == e || (y, x) == e) {
                    edges.push(e);
                }
            }
        }
        info!("realizing {} random channels (k = {})", edges.len(), edge_cnt);
        let mut state = self.state.lock().unwrap();
        for (a, b) in edges {
            state.add_channel(NodeId::new(a), NodeId::new(b));
        }
    }

    /// Spawn the two control loops for every node: a distance-vector loop that cycles through
    /// the destination indices, relaxing one entry per tick, and a forwarding loop that drains
    /// the node's inbox, printing one record per consumed-packet event. Each tick acquires the
    /// simulation mutex once and yields afterwards. The loops run until [`Network::stop`] is
    /// called (or the network is dropped).
    pub fn start(&mut self) {
        if !self.handles.is_empty() {
            warn!("control loops are already running");
            return;
        }
        self.stopper = Stopper::new();
        info!("spawning {} control loops", 2 * self.node_count);
        for i in 0..self.node_count {
            let id = NodeId::new(i);
            let node_count = self.node_count;
            let protocol = self.protocol;

            let state = Arc::clone(&self.state);
            let stop = self.stopper.clone();
            self.handles.push(thread::spawn(move || {
                let mut dest = 0;
                while !stop.is_stop() {
                    state.lock().unwrap().dv_tick(protocol, id, dest);
                    dest = if dest + 1 == node_count { 0 } else { dest + 1 };
                    thread::yield_now();
                }
            }));

            let state = Arc::clone(&self.state);
            let stop = self.stopper.clone();
            self.handles.push(thread::spawn(move || {
                while !stop.is_stop() {
                    let records = state.lock().unwrap().forward_tick(protocol, id);
                    for record in records {
                        println!("\n{}", record);
                    }
                    thread::yield_now();
                }
            }));
        }
    }

    /// Stop and join all control loops. A no-op when none are running.
    pub fn stop(&mut self) {
        if self.handles.is_empty() {
            return;
        }
        self.stopper.send_stop();
        for handle in self.handles.drain(..) {
            if handle.join().is_err() {
                warn!("a control loop panicked before shutdown");
            }
        }
    }

    /// Inject a packet at `src`. A raw destination below the node count addresses a single
    /// node; anything else addresses the group with that id. The packet is written into
    /// `src`'s inbox under the simulation mutex; if the inbox is still occupied, the previous
    /// packet is silently overwritten, so callers are expected to pace their injections.
    pub fn transfer_packet(&self, src: usize, dest: usize, payload: i32) -> Result<(), NetworkError> {
        let src = self.check_node(src)?;
        let dest = if dest < self.node_count {
            PacketDest::Node(NodeId::new(dest))
        } else {
            PacketDest::Group(GroupId(dest as u32))
        };
        let mut state = self.state.lock().unwrap();
        let inbox = &mut state.nodes[src.index()].inbox;
        if inbox.is_some() {
            debug!("node {}: overwriting an undelivered packet", src.index());
        }
        *inbox = Some(Packet { payload, src, dest, from: src });
        Ok(())
    }

    /// Add `group` to the node's membership set.
    pub fn assign_group(&self, node: usize, group: GroupId) -> Result<(), NetworkError> {
        let id = self.check_node(node)?;
        self.state.lock().unwrap().nodes[id.index()].join_group(group);
        Ok(())
    }

    /// Remove `group` from the node's membership set. Cancelling a group the node never
    /// joined is a no-op.
    pub fn cancel_group(&self, node: usize, group: GroupId) -> Result<(), NetworkError> {
        let id = self.check_node(node)?;
        self.state.lock().unwrap().nodes[id.index()].leave_group(group);
        Ok(())
    }

    /// Perform a single distance-vector tick at `node` for the destination index `dest`,
    /// exactly as one iteration of the spawned relaxation loop would.
    pub fn dv_tick(&self, node: usize, dest: usize) -> Result<(), NetworkError> {
        let id = self.check_node(node)?;
        let dest = self.check_node(dest)?;
        self.state.lock().unwrap().dv_tick(self.protocol, id, dest.index());
        Ok(())
    }

    /// Perform a single forwarding tick at `node`, exactly as one iteration of the spawned
    /// forwarding loop would, and return the records it produced instead of printing them.
    /// An empty inbox yields no records.
    pub fn forward_tick(&self, node: usize) -> Result<Vec<PacketRecord>, NetworkError> {
        let id = self.check_node(node)?;
        Ok(self.state.lock().unwrap().forward_tick(self.protocol, id))
    }

    /// Run full relaxation sweeps (every node, every destination, in index order) until one
    /// sweep leaves every table unchanged, and return the number of sweeps performed. Fails
    /// with [`NetworkError::NoConvergence`] if `max_sweeps` is exhausted first.
    pub fn relax_until_converged(&self, max_sweeps: usize) -> Result<usize, NetworkError> {
        let mut state = self.state.lock().unwrap();
        for sweep in 1..=max_sweeps {
            if !state.relax_sweep(self.protocol) {
                debug!("routing tables converged after {} sweeps", sweep);
                return Ok(sweep);
            }
        }
        Err(NetworkError::NoConvergence)
    }

    /// Extract the unicast route from `src` to `dest` by walking the next-hop chain of the
    /// current tables. Fails with [`NetworkError::ForwardingBlackHole`] when the chain hits a
    /// node without a route, and with [`NetworkError::ForwardingLoop`] when it revisits a node.
    pub fn get_route(&self, src: usize, dest: usize) -> Result<Vec<NodeId>, NetworkError> {
        let src = self.check_node(src)?;
        let dest = self.check_node(dest)?;
        let state = self.state.lock().unwrap();
        let mut path = vec![src];
        let mut current = src;
        while current != dest {
            match state.nodes[current.index()].table[dest.index()].next_hop {
                None => return Err(NetworkError::ForwardingBlackHole(path)),
                Some(nh) if nh == current => return Err(NetworkError::ForwardingLoop(path)),
                Some(nh) => {
                    if path.contains(&nh) {
                        path.push(nh);
                        return Err(NetworkError::ForwardingLoop(path));
                    }
                    path.push(nh);
                    current = nh;
                }
            }
        }
        Ok(path)
    }

    /// Return a clone of the node with the given id.
    pub fn get_node(&self, node: usize) -> Result<Node, NetworkError> {
        let id = self.check_node(node)?;
        Ok(self.state.lock().unwrap().nodes[id.index()].clone())
    }

    /// Return a clone of the routing entry `node` holds for `dest`.
    pub fn routing_entry(&self, node: usize, dest: usize) -> Result<RoutingEntry, NetworkError> {
        let id = self.check_node(node)?;
        let dest = self.check_node(dest)?;
        Ok(self.state.lock().unwrap().nodes[id.index()].table[dest.index()].clone())
    }

    /// Return the neighbors of the given node, in the order relaxation visits them.
    pub fn neighbors(&self, node: usize) -> Result<Vec<NodeId>, NetworkError> {
        let id = self.check_node(node)?;
        Ok(self.state.lock().unwrap().graph.neighbors(id).collect())
    }

    /// Return the set of groups the given node has joined.
    pub fn groups_of(&self, node: usize) -> Result<HashSet<GroupId>, NetworkError> {
        let id = self.check_node(node)?;
        Ok(self.state.lock().unwrap().nodes[id.index()].groups.clone())
    }

    fn check_node(&self, id: usize) -> Result<NodeId, NetworkError> {
        if id < self.node_count {
            Ok(NodeId::new(id))
        } else {
            Err(NetworkError::NodeOutOfRange(id, self.node_count))
        }
    }

    #[cfg(test)]
    pub(crate) fn sim_state(&self) -> std::sync::MutexGuard<'_, SimState> {
        self.state.lock().unwrap()
    }
}

impl Drop for Network {
    fn drop(&mut self) {
        self.stop();
    }
}

impl SimState {
    /// Install the symmetric channel if it is absent and not a self-loop.
    pub(crate) fn add_channel(&mut self, a: NodeId, b: NodeId) {
        if a != b && self.graph.find_edge(a, b).is_none() {
            self.graph.add_edge(a, b, ());
        }
    }

    /// One relaxation tick: snapshot every neighbor's entry for `dest_index`, then rewrite the
    /// node's own entry.
    pub(crate) fn dv_tick(&mut self, protocol: Protocol, id: NodeId, dest_index: usize) {
        let views: Vec<NeighborView> = self
            .graph
            .neighbors(id)
            .map(|m| {
                let neighbor = &self.nodes[m.index()];
                let entry = &neighbor.table[dest_index];
                NeighborView {
                    id: m,
                    groups: neighbor.groups.clone(),
                    next_hop: entry.next_hop,
                    cost: entry.cost,
                    advertised: entry.groups.clone(),
                }
            })
            .collect();
        self.nodes[id.index()].relax_entry(protocol, dest_index, &views);
    }

    /// One full sweep over every (node, destination) pair. Returns whether any entry changed.
    pub(crate) fn relax_sweep(&mut self, protocol: Protocol) -> bool {
        let mut changed = false;
        for i in 0..self.nodes.len() {
            let id = NodeId::new(i);
            for dest in 0..self.nodes.len() {
                let before = self.nodes[i].table[dest].clone();
                self.dv_tick(protocol, id, dest);
                if self.nodes[i].table[dest] != before {
                    changed = true;
                }
            }
        }
        changed
    }

    /// One forwarding tick: drain the node's inbox and forward or deliver the packet. The
    /// inbox is cleared on every pass that observes a packet, whatever its fate.
    pub(crate) fn forward_tick(&mut self, protocol: Protocol, id: NodeId) -> Vec<PacketRecord> {
        let pkt = match self.nodes[id.index()].inbox.take() {
            Some(pkt) => pkt,
            None => return Vec::new(),
        };
        match pkt.dest {
            PacketDest::Node(dest) => self.forward_unicast(id, pkt, dest),
            PacketDest::Group(group) => match protocol {
                Protocol::Dvmrp => self.forward_multicast(id, pkt, group),
                Protocol::Rip => {
                    debug!(
                        "node {}: discarding group-addressed packet in a unicast-only network",
                        id.index()
                    );
                    Vec::new()
                }
            },
        }
    }

    /// Unicast forwarding: consult the entry for the destination and either drop, deliver
    /// locally, or write the packet into the next hop's inbox. Exactly one record per
    /// consumed packet.
    fn forward_unicast(&mut self, id: NodeId, pkt: Packet, dest: NodeId) -> Vec<PacketRecord> {
        let next_hop = self.nodes[id.index()].table[dest.index()].next_hop;
        let state = match next_hop {
            None => PacketState::Dropped,
            Some(nh) if nh == id => PacketState::Received,
            Some(nh) => {
                if self.graph.find_edge(id, nh).is_some() {
                    self.write_inbox(nh, Packet { from: id, ..pkt });
                    PacketState::Delivered(nh)
                } else {
                    // the table names a next hop we have no channel to; nothing to do but drop
                    PacketState::Dropped
                }
            }
        };
        debug!("node {}: unicast packet {} {}", id.index(), pkt.payload, state);
        vec![PacketRecord {
            node: id,
            payload: pkt.payload,
            src: pkt.src,
            dest: pkt.dest,
            from: pkt.from,
            state,
        }]
    }

    /// Truncated Reverse Path Broadcasting. Local delivery happens first (members accept the
    /// packet and keep forwarding). The packet is then only propagated if it arrived on the
    /// interface this node would use to reach the source. Forwarding goes over every link that
    /// leads to a destination advertising the group, at most once per link, and only if the
    /// link is a child of this node in the broadcast tree rooted at the source: the neighbor's
    /// cost to the source must be larger than ours, with equal costs broken by the lower id.
    fn forward_multicast(&mut self, id: NodeId, pkt: Packet, group: GroupId) -> Vec<PacketRecord> {
        let mut records = Vec::new();
        let src_index = pkt.src.index();

        if self.nodes[id.index()].groups.contains(&group) {
            records.push(PacketRecord {
                node: id,
                payload: pkt.payload,
                src: pkt.src,
                dest: pkt.dest,
                from: pkt.from,
                state: PacketState::Received,
            });
        }

        let rpf = self.nodes[id.index()].table[src_index].next_hop;
        if Some(pkt.from) != rpf {
            debug!(
                "node {}: multicast packet from {} failed the reverse-path check (rpf {:?})",
                id.index(),
                pkt.from.index(),
                rpf.map(|r| r.index()),
            );
            return records;
        }

        let own_cost = self.nodes[id.index()].table[src_index].cost;
        let mut used: HashSet<NodeId> = HashSet::new();
        let mut targets: Vec<NodeId> = Vec::new();
        for dest in 0..self.nodes.len() {
            let entry = &self.nodes[id.index()].table[dest];
            if !entry.groups.contains(&group) {
                continue;
            }
            let link = match entry.next_hop {
                Some(nh) if nh != id && self.graph.find_edge(id, nh).is_some() => nh,
                _ => continue,
            };
            if used.contains(&link) {
                continue;
            }
            let link_cost = self.nodes[link.index()].table[src_index].cost;
            if own_cost < link_cost || (own_cost == link_cost && id.index() < link.index()) {
                used.insert(link);
                targets.push(link);
            }
        }
        for link in targets {
            debug!(
                "node {}: multicast packet {} forwarded over child link {}",
                id.index(),
                pkt.payload,
                link.index()
            );
            self.write_inbox(link, Packet { from: id, ..pkt });
        }
        records
    }

    fn write_inbox(&mut self, id: NodeId, pkt: Packet) {
        let inbox = &mut self.nodes[id.index()].inbox;
        if inbox.is_some() {
            debug!("node {}: overwriting an undelivered packet", id.index());
        }
        *inbox = Some(pkt);
    }
}

/// Draw a random edge `(a, b)` with `b` sampled uniformly from `[0, n)`, rejecting `b == a`.
fn create_edge<R: Rng>(a: usize, n: usize, rng: &mut R) -> (usize, usize) {
    loop {
        let b = rng.gen_range(0, n);
        if b != a {
            return (a, b);
        }
    }
}
