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

//! Interactive driver for the distance-vector routing simulator. Builds a random topology,
//! spawns the control loops and injects packets read from stdin, one
//! source/destination/payload triple per round.

use dvnet::{GroupId, Network, Protocol};

use clap::Parser;
use log::*;
use std::collections::VecDeque;
use std::error::Error;
use std::io::{self, BufRead, Write};

/// The groups preloaded before the REPL starts, in the multicast variant.
static PRELOADED_MEMBERS: [usize; 5] = [1, 3, 5, 9, 6];
static PRELOADED_GROUP: GroupId = GroupId(18);

#[derive(Parser, Debug)]
#[clap(name = "dvnet_main", about = "Simulate RIP or DVMRP/TRPB routing over a random topology")]
struct CommandLineArguments {
    /// Protocol variant to simulate
    #[clap(short, long, value_enum, default_value = "dvmrp")]
    protocol: ProtocolArg,
    /// Number of virtual routers in the network
    #[clap(short, long, default_value_t = 10)]
    nodes: usize,
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum ProtocolArg {
    Rip,
    Dvmrp,
}

fn main() -> Result<(), Box<dyn Error>> {
    pretty_env_logger::init();
    let args = CommandLineArguments::parse();

    let protocol = match args.protocol {
        ProtocolArg::Rip => Protocol::Rip,
        ProtocolArg::Dvmrp => Protocol::Dvmrp,
    };

    let mut net = Network::new(protocol, args.nodes);
    net.build_random_channels();
    net.start();

    if protocol == Protocol::Dvmrp {
        for node in PRELOADED_MEMBERS.iter().filter(|n| **n < args.nodes) {
            net.assign_group(*node, PRELOADED_GROUP)?;
        }
        info!("preloaded group {} members: {:?}", PRELOADED_GROUP.0, PRELOADED_MEMBERS);
    }

    let stdin = io::stdin();
    let mut reader = TokenReader::new(stdin.lock());
    loop {
        let src = match reader.next_number("Please enter the sending node: ")? {
            Some(v) => v,
            None => break,
        };
        let dest = match reader.next_number("Please enter the receiving node: ")? {
            Some(v) => v,
            None => break,
        };
        let payload = match reader.next_number("Please enter the packet data: ")? {
            Some(v) => v,
            None => break,
        };
        if let Err(e) = net.transfer_packet(src, dest, payload as i32) {
            println!("{}", e);
        }
    }

    Ok(())
}

/// Whitespace-separated integer tokens from stdin. A prompt is only printed when no token is
/// pending, so all three numbers of a round may be entered on a single line.
struct TokenReader<B> {
    lines: io::Lines<B>,
    tokens: VecDeque<String>,
}

impl<B: BufRead> TokenReader<B> {
    fn new(input: B) -> Self {
        Self { lines: input.lines(), tokens: VecDeque::new() }
    }

    /// The next token parsed as a non-negative integer, prompting and skipping over anything
    /// unparsable. `None` on end of input.
    fn next_number(&mut self, prompt: &str) -> Result<Option<usize>, Box<dyn Error>> {
        loop {
            if let Some(token) = self.tokens.pop_front() {
                match token.parse::<usize>() {
                    Ok(v) => return Ok(Some(v)),
                    Err(_) => {
                        println!("not a number: {:?}", token);
                        continue;
                    }
                }
            }
            print!("{}", prompt);
            io::stdout().flush()?;
            match self.lines.next() {
                None => return Ok(None),
                Some(line) => self.tokens.extend(line?.split_whitespace().map(String::from)),
            }
        }
    }
}
