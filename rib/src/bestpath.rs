// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::cmp::Ordering;

use crate::types::Route;
use itertools::Itertools;

/// The bestpath algorithm chooses the single best route for a prefix from
/// its candidate set. The candidates are filtered in the following ordered
/// sequence of operations, and the first filter that leaves one route
/// decides.
///
/// - filter to the routes with the largest local preference
/// - filter to the self originated routes, if there are any
/// - filter to the routes with the shortest AS path
/// - filter to the routes with the lowest origin (IGP < EGP < UNK)
/// - pick the route learned from the lowest peer address
///
/// The last step never ties since a peer holds at most one route per
/// prefix, so the result is deterministic for any candidate order.
pub fn bestpath<'a, T, I>(candidates: I) -> Option<&'a T>
where
    T: AsRef<Route> + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let candidates: Vec<&T> = candidates.into_iter().collect();

    // Short-circuit: if there's only 1 candidate, then it is the best
    if candidates.len() <= 1 {
        return candidates.into_iter().next();
    }

    let candidates = candidates
        .into_iter()
        .max_set_by_key(|r| r.as_ref().local_pref());

    let candidates = candidates
        .into_iter()
        .max_set_by_key(|r| r.as_ref().self_origin());

    let candidates = candidates
        .into_iter()
        .min_set_by_key(|r| r.as_ref().as_path().len());

    let candidates = candidates
        .into_iter()
        .min_set_by_key(|r| r.as_ref().origin());

    candidates.into_iter().min_by_key(|r| r.as_ref().peer())
}

/// Total order over routes for the same prefix. `Greater` means `a` is
/// preferred over `b`. Agrees with [`bestpath`]: the maximum under this
/// order is the route `bestpath` selects.
pub fn preference(a: &Route, b: &Route) -> Ordering {
    a.local_pref()
        .cmp(&b.local_pref())
        .then_with(|| a.self_origin().cmp(&b.self_origin()))
        .then_with(|| b.as_path().len().cmp(&a.as_path().len()))
        .then_with(|| b.origin().cmp(&a.origin()))
        .then_with(|| b.peer().cmp(&a.peer()))
}

impl AsRef<Route> for Route {
    fn as_ref(&self) -> &Route {
        self
    }
}
