// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use anyhow::Result;
use clap::{Parser, Subcommand};
use rib::Config;
use slog::Drain;
use slog::Logger;

mod table;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None, infer_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Keep adjacent equivalent prefixes apart in the forwarding set
    #[arg(long, env = "RIB_NO_AGGREGATE")]
    no_aggregate: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Replay a file of update messages and show the resulting table.
    Replay(table::ReplayCommand),

    /// Replay a file of update messages and look up an address.
    Lookup(table::LookupCommand),

    /// Convert a network and netmask to CIDR notation.
    Cidr {
        /// Network address, e.g. 192.168.0.0
        network: String,
        /// Dotted-decimal netmask, e.g. 255.255.255.0
        netmask: String,
    },

    /// Print the JSON schema of the update message vocabulary.
    Schema,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let log = init_logger();
    let config = Config {
        aggregate: !cli.no_aggregate,
    };

    match cli.command {
        Commands::Replay(cmd) => table::replay(cmd, config, log)?,
        Commands::Lookup(cmd) => table::lookup(cmd, config, log)?,
        Commands::Cidr { network, netmask } => {
            println!("{}", rib::cidr::to_cidr(&network, &netmask)?)
        }
        Commands::Schema => {
            let schema = schemars::schema_for!(rib::Message);
            println!("{}", serde_json::to_string_pretty(&schema)?);
        }
    }
    Ok(())
}

fn init_logger() -> Logger {
    let decorator = slog_term::TermDecorator::new().stderr().build();
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let drain = slog_envlogger::new(drain).fuse();
    let drain = slog_async::Async::new(drain)
        .chan_size(0x2000)
        .build()
        .fuse();
    slog::Logger::root(drain, slog::o!())
}
