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

#![deny(missing_docs, missing_debug_implementations)]

//! # DVNet: Simulating Distance-Vector Routing Protocols
//!
//! This is a library for simulating two classical distance-vector routing protocols over an
//! undirected graph of virtual routers: a simplified RIP for unicast delivery, and a
//! simplified DVMRP using Truncated Reverse Path Broadcasting (TRPB) for multicast delivery.
//! Both variants run on the same machinery and are selected with [`Protocol`].
//!
//! Every node owns a routing table with one entry per destination, a set of joined multicast
//! groups, and a single-slot packet inbox. Two control loops drive each node: a
//! distance-vector loop that relaxes one table entry per tick against snapshots of the
//! neighbor tables, and a forwarding loop that drains the inbox and moves packets towards
//! their destination. Hop counts are capped at the poisoned-infinity value 16
//! ([`INFINITY_COST`]); destinations at that cost are unreachable.
//!
//! All mutable state is serialized by a single simulation-wide mutex, so the concurrent
//! simulation ([`Network::start`]) and the synchronous, deterministic drivers
//! ([`Network::dv_tick`], [`Network::forward_tick`], [`Network::relax_until_converged`])
//! produce the same per-tick behavior.
//!
//! ## Example usage
//!
//! The following example builds a three-node line, lets the tables converge, and sends a
//! unicast packet from one end to the other.
//!
//! ```rust
//! use dvnet::{Network, Protocol};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let net = Network::new(Protocol::Rip, 3);
//!     net.build_channel(0, 1)?;
//!     net.build_channel(1, 2)?;
//!
//!     net.relax_until_converged(64)?;
//!     assert_eq!(net.routing_entry(0, 2)?.cost, 2);
//!
//!     net.transfer_packet(0, 2, 42)?;
//!     for node in 0..3 {
//!         for record in net.forward_tick(node)? {
//!             println!("\n{}", record);
//!         }
//!     }
//!     Ok(())
//! }
//! ```

mod network;
mod node;
mod packet;
pub mod printer;
mod route;
mod test;
mod types;

pub use network::{Network, DEFAULT_MAX_SWEEPS};
pub use node::Node;
pub use packet::{Packet, PacketDest, PacketRecord, PacketState};
pub use route::RoutingEntry;
pub use types::{GroupId, NetworkError, NodeId, Protocol, Topology, INFINITY_COST};

use std::sync::{Arc, RwLock};

/// Stopper, to check when to stop, or to send the stop command. Cloning the stopper yields a
/// handle to the same flag.
#[derive(Clone, Debug)]
pub struct Stopper {
    b: Arc<RwLock<bool>>,
}

impl Default for Stopper {
    fn default() -> Self {
        Self::new()
    }
}

impl Stopper {
    /// Create a new stopper
    pub fn new() -> Self {
        Self { b: Arc::new(RwLock::new(false)) }
    }

    /// Send the stop command. This function will block until the write lock can be acquired.
    pub fn send_stop(&self) {
        *self.b.write().unwrap() = true;
    }

    /// Checks if the stop flag is set. This function will block until the read lock can be
    /// acquired.
    pub fn is_stop(&self) -> bool {
        *self.b.read().unwrap()
    }
}
