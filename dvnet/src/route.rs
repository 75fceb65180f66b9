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

//! Module defining a single routing table entry.

use crate::types::{GroupId, NodeId, INFINITY_COST};
use std::collections::HashSet;

/// Per-destination routing record. Every node owns exactly one entry per node in the network,
/// stored at the position of the destination id.
///
/// The two unreachability representations are coupled: `cost == 16` if and only if
/// `next_hop == None`.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutingEntry {
    /// The destination this entry describes how to reach.
    pub dest: NodeId,
    /// The neighbor to forward to, or `None` if no route is known.
    pub next_hop: Option<NodeId>,
    /// Hop count towards the destination, in `[0, 16]`.
    pub cost: u8,
    /// Groups advertised as reachable *at* the destination (only maintained by
    /// [`Protocol::Dvmrp`](crate::Protocol::Dvmrp)).
    pub groups: HashSet<GroupId>,
}

impl RoutingEntry {
    /// A fresh entry knows no route.
    pub(crate) fn new(dest: NodeId) -> Self {
        Self { dest, next_hop: None, cost: INFINITY_COST, groups: HashSet::new() }
    }

    /// Returns `true` if the entry describes a usable route.
    pub fn is_reachable(&self) -> bool {
        self.next_hop.is_some()
    }

    /// Resets the entry to the no-route state.
    pub(crate) fn set_unreachable(&mut self) {
        self.next_hop = None;
        self.cost = INFINITY_COST;
        self.groups.clear();
    }
}
