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

//! # Helper (printer) functions for the Network
//! Module containing helper functions to get formatted strings about routing tables.

use crate::network::Network;
use crate::route::RoutingEntry;
use crate::types::NetworkError;

/// Returns the formatted string for a single routing entry. Group ids are appended in sorted
/// order when the entry advertises any.
pub fn routing_entry(entry: &RoutingEntry) -> String {
    let next_hop = match entry.next_hop {
        Some(nh) => nh.index().to_string(),
        None => String::from("-"),
    };
    let mut result = format!(
        "dest = {}, next hop = {}, cost = {}",
        entry.dest.index(),
        next_hop,
        entry.cost
    );
    if !entry.groups.is_empty() {
        let mut groups: Vec<u32> = entry.groups.iter().map(|g| g.0).collect();
        groups.sort_unstable();
        result.push_str(&format!(", groups = {:?}", groups));
    }
    result
}

/// Get a vector of strings which represent the routing table of the given node. Each `String`
/// in the vector represents one entry (one destination), in destination order.
pub fn routing_table(net: &Network, node: usize) -> Result<Vec<String>, NetworkError> {
    let node = net.get_node(node)?;
    Ok(node.table().iter().map(routing_entry).collect())
}
