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

//! Module for defining packets and the observable forwarding events they produce.

use crate::types::{GroupId, NodeId};
use std::fmt;

/// Where a packet is headed. Injection maps a raw destination integer below the node count to
/// [`PacketDest::Node`], and everything else to [`PacketDest::Group`], so forwarding never has
/// to re-derive the packet kind from a range comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketDest {
    /// Unicast delivery to a single node.
    Node(NodeId),
    /// Multicast delivery to every member of a group.
    Group(GroupId),
}

/// A packet sitting in a node's single-slot inbox. Writing into an occupied inbox overwrites
/// the previous occupant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Packet {
    /// Opaque payload, echoed in every record the packet produces.
    pub payload: i32,
    /// The node the packet was injected at.
    pub src: NodeId,
    /// Destination node or group.
    pub dest: PacketDest,
    /// The node that wrote the packet into the current inbox. Equal to `src` at injection.
    pub from: NodeId,
}

/// Terminal state of one packet-consumption event at one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketState {
    /// No route to the destination; the packet is gone.
    Dropped,
    /// The packet reached a node that accepts it locally.
    Received,
    /// The packet was written into the inbox of the given next hop.
    Delivered(NodeId),
}

impl fmt::Display for PacketState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dropped => write!(f, "dropped"),
            Self::Received => write!(f, "received"),
            Self::Delivered(nh) => write!(f, "delivered to next hop {}", nh.index()),
        }
    }
}

/// One console record, produced when a node consumes a packet from its inbox. Unicast
/// consumption produces exactly one record; multicast consumption produces a record only for
/// local delivery (forwards are silent).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketRecord {
    /// The node that consumed the packet.
    pub node: NodeId,
    /// Payload of the packet.
    pub payload: i32,
    /// Injection source (printed for multicast records only).
    pub src: NodeId,
    /// Destination node or group.
    pub dest: PacketDest,
    /// The neighbor the packet arrived from (printed for multicast records only).
    pub from: NodeId,
    /// What happened to the packet at this node.
    pub state: PacketState,
}

impl fmt::Display for PacketRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "node:\t{}", self.node.index())?;
        writeln!(f, "packet:\t{}", self.payload)?;
        match self.dest {
            PacketDest::Node(dest) => {
                writeln!(f, "dest:\t{}", dest.index())?;
            }
            PacketDest::Group(group) => {
                writeln!(f, "src:\t{}", self.src.index())?;
                writeln!(f, "dest:\t{}", group.0)?;
                writeln!(f, "from:\t{}", self.from.index())?;
            }
        }
        write!(f, "state:\t{}", self.state)
    }
}
