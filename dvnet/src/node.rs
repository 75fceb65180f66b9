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

//! Module defining a virtual router and its distance-vector relaxation.

use crate::packet::Packet;
use crate::route::RoutingEntry;
use crate::types::{GroupId, NodeId, Protocol, INFINITY_COST};
use log::*;
use std::collections::HashSet;

/// Snapshot of one neighbor, taken under the simulation mutex, as seen by a single relaxation
/// step: the neighbor's identity and joined groups, plus its routing entry for the destination
/// currently being relaxed.
#[derive(Debug, Clone)]
pub(crate) struct NeighborView {
    /// Id of the neighbor.
    pub id: NodeId,
    /// Groups the neighbor itself has joined.
    pub groups: HashSet<GroupId>,
    /// `next_hop` of the neighbor's entry for the destination under relaxation.
    pub next_hop: Option<NodeId>,
    /// `cost` of the neighbor's entry for the destination under relaxation.
    pub cost: u8,
    /// Group set advertised by the neighbor's entry for the destination under relaxation.
    pub advertised: HashSet<GroupId>,
}

/// A virtual router: identity, group memberships, routing table and a single-slot packet inbox.
/// The neighbor relation lives in the network's topology graph, not here.
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) id: NodeId,
    pub(crate) groups: HashSet<GroupId>,
    pub(crate) table: Vec<RoutingEntry>,
    pub(crate) inbox: Option<Packet>,
}

impl Node {
    /// Creates a node with an all-unreachable table of `node_count` entries.
    pub(crate) fn new(id: NodeId, node_count: usize) -> Self {
        Self {
            id,
            groups: HashSet::new(),
            table: (0..node_count).map(|d| RoutingEntry::new(NodeId::new(d))).collect(),
            inbox: None,
        }
    }

    /// Return the id of the node.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Return the set of groups this node has joined.
    pub fn groups(&self) -> &HashSet<GroupId> {
        &self.groups
    }

    /// Return the full routing table, indexed by destination id.
    pub fn table(&self) -> &[RoutingEntry] {
        &self.table
    }

    /// Return the routing entry for the given destination, if it exists.
    pub fn entry(&self, dest: NodeId) -> Option<&RoutingEntry> {
        self.table.get(dest.index())
    }

    /// Return the packet currently occupying the inbox, if any.
    pub fn inbox(&self) -> Option<&Packet> {
        self.inbox.as_ref()
    }

    pub(crate) fn join_group(&mut self, group: GroupId) {
        if self.groups.insert(group) {
            debug!("node {}: joined group {}", self.id.index(), group.0);
        }
    }

    /// Leaving a group the node never joined is a no-op.
    pub(crate) fn leave_group(&mut self, group: GroupId) {
        if self.groups.remove(&group) {
            debug!("node {}: left group {}", self.id.index(), group.0);
        }
    }

    /// One distance-vector tick: rewrites the single entry at `dest_index` from the given
    /// neighbor snapshots. The self and direct-neighbor rules are shared between both protocol
    /// variants; everything beyond one hop is protocol specific.
    pub(crate) fn relax_entry(
        &mut self,
        protocol: Protocol,
        dest_index: usize,
        neighbors: &[NeighborView],
    ) {
        let dest = self.table[dest_index].dest;

        if dest == self.id {
            let own_groups = self.groups.clone();
            let entry = &mut self.table[dest_index];
            entry.next_hop = Some(dest);
            entry.cost = 0;
            if protocol == Protocol::Dvmrp {
                entry.groups = own_groups;
            }
            return;
        }

        if let Some(m) = neighbors.iter().find(|m| m.id == dest) {
            let entry = &mut self.table[dest_index];
            entry.next_hop = Some(dest);
            entry.cost = 1;
            if protocol == Protocol::Dvmrp {
                entry.groups = m.groups.clone();
            }
            return;
        }

        match protocol {
            Protocol::Rip => self.relax_rip(dest_index, neighbors),
            Protocol::Dvmrp => self.relax_dvmrp(dest_index, neighbors),
        }
    }

    /// RIP relaxation for destinations more than one hop away. The entry is updated in place
    /// while scanning the neighbors in order, so an earlier neighbor's poison is visible to a
    /// later neighbor's relaxation within the same tick.
    fn relax_rip(&mut self, dest_index: usize, neighbors: &[NeighborView]) {
        let own_id = self.id;
        for m in neighbors {
            let entry = &mut self.table[dest_index];
            if m.next_hop == Some(own_id) && entry.next_hop == Some(m.id) {
                // the neighbor we route through points back at us: a two-hop loop
                trace!(
                    "node {}: poisoning route to {} (mutual next hop with {})",
                    own_id.index(),
                    dest_index,
                    m.id.index()
                );
                entry.set_unreachable();
            } else if entry.next_hop == Some(m.id) {
                // the current route goes through this neighbor; track its cost
                match m.next_hop {
                    None => entry.set_unreachable(),
                    Some(_) => {
                        entry.cost = (m.cost + 1).min(INFINITY_COST);
                        if entry.cost == INFINITY_COST {
                            entry.next_hop = None;
                        }
                    }
                }
            } else if m.next_hop.is_some()
                && m.cost + 1 < INFINITY_COST
                && m.cost + 1 < entry.cost
            {
                entry.next_hop = Some(m.id);
                entry.cost = m.cost + 1;
            }
        }
    }

    /// DVMRP relaxation for destinations more than one hop away: reset the entry, then adopt
    /// the best usable advertisement, carrying the advertised group set along the shortest
    /// path. On equal cost the first neighbor visited wins, which is stable because the
    /// neighbor order never changes after construction.
    fn relax_dvmrp(&mut self, dest_index: usize, neighbors: &[NeighborView]) {
        let own_id = self.id;
        self.table[dest_index].set_unreachable();
        for m in neighbors {
            if m.next_hop.is_none() || m.next_hop == Some(own_id) || m.cost >= INFINITY_COST - 1 {
                continue;
            }
            let entry = &mut self.table[dest_index];
            if entry.next_hop.is_none() || m.cost + 1 < entry.cost {
                entry.next_hop = Some(m.id);
                entry.cost = m.cost + 1;
                entry.groups = m.advertised.clone();
            }
        }
    }
}
