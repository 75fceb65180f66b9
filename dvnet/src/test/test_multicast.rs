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

//! Test the DVMRP relaxation and the TRPB multicast forwarding rule.

use crate::packet::{Packet, PacketDest};
use crate::types::{GroupId, NodeId};
use crate::{Network, PacketState, Protocol};
use lazy_static::lazy_static;
use maplit::hashset;

lazy_static! {
    static ref N0: NodeId = 0.into();
    static ref N1: NodeId = 1.into();
    static ref N2: NodeId = 2.into();
}

/// # Test network
///
/// ```text
/// N0 ---- N1 ---- N2 ---- N3 ---- N4
/// ```
fn get_line_net() -> Network {
    let net = Network::new(Protocol::Dvmrp, 5);
    net.build_channel(0, 1).unwrap();
    net.build_channel(1, 2).unwrap();
    net.build_channel(2, 3).unwrap();
    net.build_channel(3, 4).unwrap();
    net
}

/// # Test network
///
/// ```text
/// N0 ---- N1
///  \      /
///   \    /
///     N2
/// ```
fn get_triangle_net() -> Network {
    let net = Network::new(Protocol::Dvmrp, 3);
    net.build_channel(0, 1).unwrap();
    net.build_channel(1, 2).unwrap();
    net.build_channel(0, 2).unwrap();
    net
}

/// The group joined at the far end of the line is advertised along the reverse shortest path.
#[test]
fn test_group_propagation() {
    let net = get_line_net();
    net.assign_group(4, GroupId(9)).unwrap();
    net.relax_until_converged(64).unwrap();

    for node in 0..4 {
        let entry = net.routing_entry(node, 4).unwrap();
        assert_eq!(entry.groups, hashset! {GroupId(9)}, "entry for 4 at node {}", node);
        assert_eq!(entry.cost, 4 - node as u8);
    }
    assert_eq!(net.routing_entry(0, 4).unwrap().next_hop, Some(*N1));

    // the member's own self entry advertises the group as well
    assert_eq!(net.routing_entry(4, 4).unwrap().groups, hashset! {GroupId(9)});

    // entries for non-member destinations stay empty
    assert!(net.routing_entry(0, 3).unwrap().groups.is_empty());
}

/// Leaving the group withdraws the advertisement after reconvergence.
#[test]
fn test_group_withdrawal() {
    let net = get_line_net();
    net.assign_group(4, GroupId(9)).unwrap();
    net.relax_until_converged(64).unwrap();
    assert!(net.routing_entry(0, 4).unwrap().groups.contains(&GroupId(9)));

    net.cancel_group(4, GroupId(9)).unwrap();
    net.relax_until_converged(64).unwrap();
    assert!(net.routing_entry(0, 4).unwrap().groups.is_empty());
}

/// Multicast along the line: members receive, every hop forwards downstream exactly once, and
/// nothing flows back towards the source.
#[test]
fn test_trpb_line_delivery() {
    let net = get_line_net();
    net.assign_group(2, GroupId(9)).unwrap();
    net.assign_group(4, GroupId(9)).unwrap();
    net.relax_until_converged(64).unwrap();

    net.transfer_packet(0, 9, 1).unwrap();

    // node 0 is not a member; it forwards towards both members over the single link to 1
    assert!(net.forward_tick(0).unwrap().is_empty());
    assert!(net.get_node(1).unwrap().inbox().is_some());
    assert!(net.get_node(2).unwrap().inbox().is_none());

    // node 1 relays
    assert!(net.forward_tick(1).unwrap().is_empty());
    assert!(net.get_node(2).unwrap().inbox().is_some());

    // node 2 is a member: it accepts and keeps forwarding
    let records = net.forward_tick(2).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].state, PacketState::Received);
    assert_eq!(records[0].node, *N2);
    assert!(net.get_node(3).unwrap().inbox().is_some());
    // nothing went back upstream
    assert!(net.get_node(1).unwrap().inbox().is_none());

    // node 3 relays
    assert!(net.forward_tick(3).unwrap().is_empty());

    // node 4 is the last member; the broadcast ends here
    let records = net.forward_tick(4).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].state, PacketState::Received);
    for node in 0..5 {
        assert!(net.get_node(node).unwrap().inbox().is_none());
    }
}

/// A multicast record renders with the source and arrival interface included.
#[test]
fn test_multicast_record_format() {
    let net = get_line_net();
    net.assign_group(2, GroupId(9)).unwrap();
    net.relax_until_converged(64).unwrap();

    net.transfer_packet(0, 9, 7).unwrap();
    net.forward_tick(0).unwrap();
    net.forward_tick(1).unwrap();
    let records = net.forward_tick(2).unwrap();
    assert_eq!(
        records[0].to_string(),
        "node:\t2\npacket:\t7\nsrc:\t0\ndest:\t9\nfrom:\t1\nstate:\treceived"
    );
}

/// In a triangle where everyone is a member, every node receives exactly once and the
/// child test keeps the two non-source nodes from flooding each other.
#[test]
fn test_trpb_triangle() {
    let net = get_triangle_net();
    for node in 0..3 {
        net.assign_group(node, GroupId(5)).unwrap();
    }
    net.relax_until_converged(64).unwrap();

    net.transfer_packet(0, 5, 1).unwrap();

    // the source itself is a member and receives its own packet
    let records = net.forward_tick(0).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].state, PacketState::Received);
    assert!(net.get_node(1).unwrap().inbox().is_some());
    assert!(net.get_node(2).unwrap().inbox().is_some());

    // node 1 receives, and wins the equal-cost child test towards node 2 (1 < 2)
    let records = net.forward_tick(1).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].state, PacketState::Received);

    // node 2 receives, but its copy arrived from node 1 now and fails the reverse-path
    // check, so the broadcast dies out here
    let records = net.forward_tick(2).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].state, PacketState::Received);
    for node in 0..3 {
        assert!(net.get_node(node).unwrap().inbox().is_none());
    }
}

/// The losing side of the equal-cost tie never forwards back to the winner.
#[test]
fn test_child_test_tie_break() {
    let net = get_triangle_net();
    for node in 0..3 {
        net.assign_group(node, GroupId(5)).unwrap();
    }
    net.relax_until_converged(64).unwrap();

    // hand node 2 a copy that legitimately arrived from the source
    net.sim_state().nodes[2].inbox =
        Some(Packet { payload: 1, src: *N0, dest: PacketDest::Group(GroupId(5)), from: *N0 });

    let records = net.forward_tick(2).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].state, PacketState::Received);
    // node 0 is the parent, node 1 loses the tie only at node 2's side (2 > 1): no forwards
    assert!(net.get_node(0).unwrap().inbox().is_none());
    assert!(net.get_node(1).unwrap().inbox().is_none());
}

/// A packet arriving on anything but the reverse-path interface is discarded without any
/// forwarding, even at a member node.
#[test]
fn test_rpf_check_discards() {
    let net = get_line_net();
    net.assign_group(1, GroupId(7)).unwrap();
    net.assign_group(4, GroupId(7)).unwrap();
    net.relax_until_converged(64).unwrap();

    // node 1 reaches node 0 directly, so a copy "from node 2" fails the check
    net.sim_state().nodes[1].inbox =
        Some(Packet { payload: 3, src: *N0, dest: PacketDest::Group(GroupId(7)), from: *N2 });

    // local delivery still happens, forwarding does not
    let records = net.forward_tick(1).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].state, PacketState::Received);
    assert!(net.get_node(0).unwrap().inbox().is_none());
    assert!(net.get_node(2).unwrap().inbox().is_none());
    // and the inbox was cleared
    assert!(net.get_node(1).unwrap().inbox().is_none());
}

/// During one multicast tick no link is used twice, even when several destinations advertise
/// the group through the same next hop.
#[test]
fn test_once_per_link() {
    // N0 -- N1 -- {N2, N3, N4}: three members all behind the same first hop
    let net = Network::new(Protocol::Dvmrp, 5);
    net.build_channel(0, 1).unwrap();
    net.build_channel(1, 2).unwrap();
    net.build_channel(1, 3).unwrap();
    net.build_channel(1, 4).unwrap();
    for node in 2..5 {
        net.assign_group(node, GroupId(11)).unwrap();
    }
    net.relax_until_converged(64).unwrap();

    // three entries at node 0 advertise group 11, all via node 1
    let advertising = (0..5)
        .filter(|d| net.routing_entry(0, *d).unwrap().groups.contains(&GroupId(11)))
        .count();
    assert_eq!(advertising, 3);

    net.transfer_packet(0, 11, 1).unwrap();
    assert!(net.forward_tick(0).unwrap().is_empty());

    // node 1 got exactly one copy; consuming it fans out to all three members
    assert!(net.get_node(1).unwrap().inbox().is_some());
    assert!(net.forward_tick(1).unwrap().is_empty());
    for node in 2..5 {
        let records = net.forward_tick(node).unwrap();
        assert_eq!(records.len(), 1, "member {} received once", node);
        assert_eq!(records[0].state, PacketState::Received);
    }
}
