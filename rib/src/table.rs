// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The route table.
//!
//! The table holds every route announced by every peer (the imported set),
//! the best route for each prefix chosen from it (the selected set) and the
//! aggregated forwarding set derived from the selected set. All three live
//! behind a single mutex so an announcement or withdrawal, including the
//! reselection and reaggregation it causes, is applied as one step.
use crate::aggregate::{aggregate, Forwarding, Selected};
use crate::bestpath::{bestpath, preference};
use crate::config::Config;
use crate::error::Error;
use crate::log::rib_log;
use crate::lookup;
use crate::message::Message;
use crate::types::*;
use rib_common::{lock, read_lock, write_lock};
use slog::Logger;
use std::collections::{BTreeMap, BTreeSet};
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, RwLock};

/// Candidate routes for each prefix, keyed by the peer they came from. A
/// peer has at most one route per prefix.
pub type Rib = BTreeMap<Prefix4, BTreeMap<PeerId, Arc<Route>>>;

#[derive(Default)]
struct TableState {
    /// Every route learned from an announcement.
    rib_in: Rib,

    /// The best route of each prefix in `rib_in`.
    rib_loc: Selected,

    /// `rib_loc` after aggregation. Never edited except by rebuilding it.
    fib: Forwarding,
}

#[derive(Clone)]
pub struct RouteTable {
    state: Arc<Mutex<TableState>>,

    /// Bumped on every mutation that reaches the table.
    generation: Arc<AtomicU64>,

    /// A set of watchers that are notified when selected routes change.
    watchers: Arc<RwLock<Vec<Watcher>>>,

    config: Config,

    log: Logger,
}

#[derive(Clone)]
struct Watcher {
    tag: String,
    sender: Sender<PrefixChangeNotification>,
}

impl RouteTable {
    pub fn new(log: Logger) -> Self {
        Self::with_config(Config::default(), log)
    }

    pub fn with_config(config: Config, log: Logger) -> Self {
        Self {
            state: Arc::new(Mutex::new(TableState::default())),
            generation: Arc::new(AtomicU64::new(0)),
            watchers: Arc::new(RwLock::new(Vec::new())),
            config,
            log,
        }
    }

    /// Register a route table watcher.
    pub fn watch(&self, tag: String, sender: Sender<PrefixChangeNotification>) {
        write_lock!(self.watchers).push(Watcher { tag, sender });
    }

    fn notify(&self, n: PrefixChangeNotification) {
        if n.changed.is_empty() {
            return;
        }
        rib_log!(self, trace, "{n}");
        for Watcher { tag, sender } in read_lock!(self.watchers).iter() {
            if let Err(e) = sender.send(n.clone()) {
                rib_log!(self, error,
                    "failed to send notification to watcher '{tag}': {e}"
                );
            }
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Add a route for `prefix` learned from `peer`, replacing whatever that
    /// peer announced for the same prefix before.
    pub fn announce(&self, prefix: Prefix4, peer: PeerId, attrs: PathAttrs) {
        let route = Arc::new(Route::new(prefix, peer, attrs));
        let prefix = route.prefix();
        rib_log!(self, debug, "announce {prefix} from {peer}";
            "local_pref" => route.local_pref(),
            "as_path" => format!("{:?}", route.as_path()),
            "self_origin" => route.self_origin(),
            "origin" => route.origin().to_string()
        );

        let pcn = {
            let mut state = lock!(self.state);
            state
                .rib_in
                .entry(prefix)
                .or_default()
                .insert(peer, route);
            self.generation.fetch_add(1, Ordering::SeqCst);
            self.commit(&mut state, BTreeSet::from([prefix]))
        };
        self.notify(pcn);
    }

    /// Add a route given as the network and netmask of an announcement. A
    /// malformed netmask rejects the announcement and leaves the table as
    /// it was.
    pub fn announce_mask(
        &self,
        network: Ipv4Addr,
        netmask: Ipv4Addr,
        peer: PeerId,
        attrs: PathAttrs,
    ) -> Result<(), Error> {
        let prefix = match Prefix4::from_netmask(network, netmask) {
            Ok(prefix) => prefix,
            Err(e) => {
                rib_log!(self, warn, "rejecting announcement from {peer}: {e}";
                    "network" => network.to_string(),
                    "netmask" => netmask.to_string()
                );
                return Err(e);
            }
        };
        self.announce(prefix, peer, attrs);
        Ok(())
    }

    /// Remove the route `peer` announced for `prefix`. Withdrawing a route
    /// that is not in the table is not an error.
    pub fn withdraw(&self, prefix: Prefix4, peer: PeerId) {
        let prefix = Prefix4::new(prefix.value, prefix.length);
        let pcn = {
            let mut state = lock!(self.state);
            let removed = state
                .rib_in
                .get_mut(&prefix)
                .and_then(|paths| paths.remove(&peer));
            if removed.is_none() {
                rib_log!(self, debug,
                    "ignoring withdrawal of unknown route {prefix} from {peer}"
                );
                return;
            }
            rib_log!(self, debug, "withdraw {prefix} from {peer}");
            self.generation.fetch_add(1, Ordering::SeqCst);
            self.commit(&mut state, BTreeSet::from([prefix]))
        };
        self.notify(pcn);
    }

    /// Remove every route learned from `peer`, e.g. when the session to it
    /// goes down. Returns the prefixes the peer had routes for.
    pub fn withdraw_peer(&self, peer: PeerId) -> Vec<Prefix4> {
        let (removed, pcn) = {
            let mut state = lock!(self.state);
            let removed: BTreeSet<Prefix4> = state
                .rib_in
                .iter_mut()
                .filter_map(|(prefix, paths)| {
                    paths.remove(&peer).map(|_| *prefix)
                })
                .collect();
            if removed.is_empty() {
                return Vec::new();
            }
            rib_log!(self, info, "withdrew all routes from {peer}";
                "count" => removed.len()
            );
            self.generation.fetch_add(1, Ordering::SeqCst);
            let pcn = self.commit(&mut state, removed.clone());
            (removed, pcn)
        };
        self.notify(pcn);
        removed.into_iter().collect()
    }

    /// Reselect the best route of each prefix in `touched` and rebuild the
    /// forwarding set if any selection changed. Returns the prefixes whose
    /// selection changed.
    fn commit(
        &self,
        state: &mut TableState,
        touched: BTreeSet<Prefix4>,
    ) -> PrefixChangeNotification {
        let mut pcn = PrefixChangeNotification::default();
        for prefix in touched {
            if Self::update_selected(state, prefix) {
                pcn.changed.insert(prefix);
            }
        }
        if !pcn.changed.is_empty() {
            state.fib = if self.config.aggregate {
                aggregate(&state.rib_loc)
            } else {
                state.rib_loc.clone()
            };
            rib_log!(self, debug, "forwarding set rebuilt";
                "selected" => state.rib_loc.len(),
                "forwarding" => state.fib.len()
            );
        }
        pcn
    }

    /// Rerun bestpath for one prefix. Returns true if the selected route
    /// changed. A prefix without candidates is dropped from the table.
    fn update_selected(state: &mut TableState, prefix: Prefix4) -> bool {
        let best = state
            .rib_in
            .get(&prefix)
            .and_then(|paths| bestpath(paths.values()))
            .cloned();

        match best {
            Some(best) => match state.rib_loc.insert(prefix, best.clone()) {
                Some(previous) => previous != best,
                None => true,
            },
            None => {
                state.rib_in.remove(&prefix);
                state.rib_loc.remove(&prefix).is_some()
            }
        }
    }

    /// The selected route for every prefix in the table.
    pub fn dump(&self) -> Vec<(Prefix4, Arc<Route>)> {
        lock!(self.state)
            .rib_loc
            .iter()
            .map(|(prefix, route)| (*prefix, route.clone()))
            .collect()
    }

    /// The aggregated forwarding set.
    pub fn forwarding(&self) -> Vec<ForwardingEntry> {
        lock!(self.state)
            .fib
            .iter()
            .map(|(prefix, route)| ForwardingEntry {
                prefix: *prefix,
                route: route.clone(),
            })
            .collect()
    }

    /// The selected route for `prefix`, if it has any.
    pub fn best(&self, prefix: Prefix4) -> Option<Arc<Route>> {
        let prefix = Prefix4::new(prefix.value, prefix.length);
        lock!(self.state).rib_loc.get(&prefix).cloned()
    }

    /// All candidate routes for `prefix`, best first.
    pub fn candidates(&self, prefix: Prefix4) -> Vec<Arc<Route>> {
        let prefix = Prefix4::new(prefix.value, prefix.length);
        let mut result: Vec<Arc<Route>> = lock!(self.state)
            .rib_in
            .get(&prefix)
            .map(|paths| paths.values().cloned().collect())
            .unwrap_or_default();
        result.sort_by(|a, b| preference(b, a));
        result
    }

    /// Every route in the table, selected or not.
    pub fn imported(&self) -> Vec<Arc<Route>> {
        lock!(self.state)
            .rib_in
            .values()
            .flat_map(|paths| paths.values().cloned())
            .collect()
    }

    /// Longest-prefix match against the forwarding set.
    pub fn lookup(&self, addr: Ipv4Addr) -> Option<ForwardingEntry> {
        lookup::lookup(&lock!(self.state).fib, addr)
    }

    /// Apply a message from the update decoder. A `dump` request is
    /// answered with a `table` message addressed back to the requester.
    pub fn apply(&self, message: &Message) -> Result<Option<Message>, Error> {
        match message {
            Message::Update { src, msg, .. } => {
                self.announce_mask(
                    msg.network,
                    msg.netmask,
                    *src,
                    msg.attrs.clone(),
                )?;
                Ok(None)
            }
            Message::Withdraw { src, msg, .. } => {
                // Validate the whole message before touching the table.
                let prefixes = msg
                    .iter()
                    .map(|w| w.prefix())
                    .collect::<Result<Vec<Prefix4>, Error>>()?;
                for prefix in prefixes {
                    self.withdraw(prefix, *src);
                }
                Ok(None)
            }
            Message::Dump { src, dst, .. } => Ok(Some(Message::Table {
                src: *dst,
                dst: *src,
                msg: self.forwarding().iter().map(Into::into).collect(),
            })),
            Message::Table { src, .. } => {
                rib_log!(self, warn, "ignoring table message from {src}");
                Ok(None)
            }
        }
    }
}
