// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use rib::message::TableEntry;
use rib::{Config, ForwardingEntry, Message, Prefix4, Route, RouteTable};
use slog::{info, Logger};
use std::fs::File;
use std::io::{stdout, BufRead, BufReader, Write};
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tabwriter::TabWriter;

#[derive(Debug, Args)]
pub struct ReplayCommand {
    /// File with one JSON update, withdraw or dump message per line.
    filename: PathBuf,

    /// Show the selected route of every prefix instead of the aggregated
    /// forwarding set.
    #[arg(long)]
    selected: bool,

    /// Print the forwarding set as a JSON table message body.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args)]
pub struct LookupCommand {
    /// File with one JSON update, withdraw or dump message per line.
    filename: PathBuf,

    /// Address to look up.
    address: Ipv4Addr,
}

pub fn replay(cmd: ReplayCommand, config: Config, log: Logger) -> Result<()> {
    let table = load(&cmd.filename, config, log)?;

    if cmd.json {
        let entries: Vec<TableEntry> =
            table.forwarding().iter().map(Into::into).collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else if cmd.selected {
        print_selected(&table.dump())?;
    } else {
        print_forwarding(&table.forwarding())?;
    }
    Ok(())
}

pub fn lookup(cmd: LookupCommand, config: Config, log: Logger) -> Result<()> {
    let table = load(&cmd.filename, config, log)?;
    match table.lookup(cmd.address) {
        Some(entry) => print_forwarding(&[entry])?,
        None => println!("no route to {}", cmd.address),
    }
    Ok(())
}

fn load(filename: &Path, config: Config, log: Logger) -> Result<RouteTable> {
    let file = File::open(filename)
        .with_context(|| format!("open {}", filename.display()))?;
    let table = RouteTable::with_config(config, log.clone());
    let responses = replay_lines(BufReader::new(file), &table)?;
    info!(log, "replayed {}", filename.display();
        "generation" => table.generation(),
        "responses" => responses.len()
    );
    for r in responses {
        println!("{}", r.encode()?);
    }
    Ok(table)
}

/// Apply every message in `reader` to `table`, returning the responses to
/// any dump requests. Blank lines and lines starting with `#` are skipped.
pub fn replay_lines<R: BufRead>(
    reader: R,
    table: &RouteTable,
) -> Result<Vec<Message>> {
    let mut responses = Vec::new();
    for (n, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let message = Message::decode(line)
            .with_context(|| format!("line {}: decode message", n + 1))?;
        let response = table.apply(&message).with_context(|| {
            format!(
                "line {}: apply {} from {}",
                n + 1,
                message.kind(),
                message.src()
            )
        })?;
        responses.extend(response);
    }
    Ok(responses)
}

fn print_selected(selected: &[(Prefix4, Arc<Route>)]) -> Result<()> {
    let mut tw = TabWriter::new(stdout());
    write_header(&mut tw)?;
    for (prefix, route) in selected {
        write_route(&mut tw, &prefix.to_string(), route)?;
    }
    tw.flush()?;
    Ok(())
}

fn print_forwarding(entries: &[ForwardingEntry]) -> Result<()> {
    let mut tw = TabWriter::new(stdout());
    write_header(&mut tw)?;
    for e in entries {
        let prefix = if e.is_aggregate() {
            format!("{} (aggregate)", e.prefix)
        } else {
            e.prefix.to_string()
        };
        write_route(&mut tw, &prefix, &e.route)?;
    }
    tw.flush()?;
    Ok(())
}

fn write_header<W: Write>(tw: &mut W) -> Result<()> {
    writeln!(
        tw,
        "{}\t{}\t{}\t{}\t{}\t{}",
        "Prefix".dimmed(),
        "Peer".dimmed(),
        "Local Pref".dimmed(),
        "Self Origin".dimmed(),
        "AS Path".dimmed(),
        "Origin".dimmed(),
    )?;
    Ok(())
}

fn write_route<W: Write>(
    tw: &mut W,
    prefix: &str,
    route: &Route,
) -> Result<()> {
    writeln!(
        tw,
        "{}\t{}\t{}\t{}\t{:?}\t{}",
        prefix,
        route.peer(),
        route.local_pref(),
        route.self_origin(),
        route.as_path(),
        route.origin(),
    )?;
    Ok(())
}
