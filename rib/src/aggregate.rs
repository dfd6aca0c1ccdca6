// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Aggregation of the selected routes into the forwarding set.
//!
//! Two selected prefixes are merged into their common supernet when they
//! are the two halves of that supernet and their routes are forwarding
//! equivalent (same peer, same path attributes). Merging is a pure
//! function of the selected set. The table rebuilds the forwarding set
//! from scratch after every change, so withdrawing a route that took part
//! in an aggregate simply yields a forwarding set without that aggregate.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::types::{Prefix4, Route};

/// Prefix to selected route, before aggregation.
pub type Selected = BTreeMap<Prefix4, Arc<Route>>;

/// Prefix to forwarding route, after aggregation.
pub type Forwarding = BTreeMap<Prefix4, Arc<Route>>;

/// Aggregate `selected` until no two entries can be merged.
///
/// A merge is skipped when the supernet is already selected with different
/// attributes, since that would replace a route rather than summarize two.
/// That supernet may itself merge away later in the same sweep, unblocking
/// the pair below it, so sweeps repeat until one makes no merge. Every merge
/// removes an entry, which bounds the number of sweeps.
pub fn aggregate(selected: &Selected) -> Forwarding {
    let mut fib = selected.clone();
    while sweep(&mut fib) {}
    fib
}

/// One pass over every level from host routes up to /1. Returns true if
/// anything was merged.
fn sweep(fib: &mut Forwarding) -> bool {
    let mut merged = false;

    for length in (1..=Prefix4::HOST_MASK).rev() {
        let level: Vec<Prefix4> = fib
            .keys()
            .filter(|p| p.length == length)
            .copied()
            .collect();

        for prefix in level {
            if let Some((sibling, supernet)) = merge_candidate(fib, prefix) {
                let Some(route) = fib.remove(&prefix) else {
                    continue;
                };
                fib.remove(&sibling);
                // An equivalent selected supernet is replaced by the
                // aggregate so the entry reads as one.
                fib.insert(supernet, route);
                merged = true;
            }
        }
    }

    merged
}

/// Returns the sibling and supernet of `prefix` if the pair can be merged.
/// Pairs are only considered from their lower half so each is visited once.
fn merge_candidate(
    fib: &Forwarding,
    prefix: Prefix4,
) -> Option<(Prefix4, Prefix4)> {
    let sibling = prefix.sibling()?;
    if sibling.value < prefix.value {
        return None;
    }
    let supernet = prefix.supernet()?;

    let lower = fib.get(&prefix)?;
    let upper = fib.get(&sibling)?;
    if !lower.forwarding_equivalent(upper) {
        return None;
    }

    match fib.get(&supernet) {
        Some(existing) if !existing.forwarding_equivalent(lower) => None,
        _ => Some((sibling, supernet)),
    }
}
