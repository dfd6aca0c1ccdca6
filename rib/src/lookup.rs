// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::net::Ipv4Addr;

use crate::aggregate::Forwarding;
use crate::types::{ForwardingEntry, Prefix4};

/// Longest-prefix match of `addr` against the forwarding set.
///
/// Rather than scanning every entry, the address is masked to each length
/// from /32 down to /0 and the resulting prefix is probed, so the first hit
/// is the most specific one. The forwarding set holds at most one route per
/// prefix, which leaves nothing to tie-break at equal length.
pub fn lookup(fib: &Forwarding, addr: Ipv4Addr) -> Option<ForwardingEntry> {
    (0..=Prefix4::HOST_MASK).rev().find_map(|length| {
        let prefix = Prefix4::new(addr, length);
        fib.get(&prefix).map(|route| ForwardingEntry {
            prefix,
            route: route.clone(),
        })
    })
}

#[cfg(test)]
mod test {
    use super::lookup;
    use crate::aggregate::{aggregate, Forwarding};
    use crate::{Origin, PathAttrs, Prefix4, Route};
    use std::net::{IpAddr, Ipv4Addr};
    use std::sync::Arc;

    fn insert(fib: &mut Forwarding, prefix: &str, peer: &str) {
        let prefix: Prefix4 = prefix.parse().unwrap();
        let peer: IpAddr = peer.parse().unwrap();
        let attrs = PathAttrs {
            local_pref: 100,
            as_path: vec![64500],
            self_origin: false,
            origin: Origin::Egp,
        };
        fib.insert(prefix, Arc::new(Route::new(prefix, peer, attrs)));
    }

    #[test]
    fn test_lookup_lpm() {
        let mut fib = Forwarding::new();
        insert(&mut fib, "192.0.0.0/16", "198.51.100.1");
        insert(&mut fib, "192.0.2.0/24", "198.51.100.2");
        insert(&mut fib, "192.0.2.128/25", "198.51.100.3");

        let nexthop = |addr: Ipv4Addr| {
            lookup(&fib, addr).map(|e| (e.prefix.to_string(), e.route.peer()))
        };

        assert_eq!(
            nexthop(Ipv4Addr::new(192, 0, 2, 200)),
            Some(("192.0.2.128/25".into(), "198.51.100.3".parse().unwrap()))
        );
        assert_eq!(
            nexthop(Ipv4Addr::new(192, 0, 2, 50)),
            Some(("192.0.2.0/24".into(), "198.51.100.2".parse().unwrap()))
        );
        assert_eq!(
            nexthop(Ipv4Addr::new(192, 0, 77, 1)),
            Some(("192.0.0.0/16".into(), "198.51.100.1".parse().unwrap()))
        );
        assert_eq!(nexthop(Ipv4Addr::new(10, 0, 0, 1)), None);
    }

    #[test]
    fn test_lookup_default_route() {
        let mut fib = Forwarding::new();
        insert(&mut fib, "0.0.0.0/0", "198.51.100.1");
        let entry = lookup(&fib, Ipv4Addr::new(8, 8, 8, 8)).unwrap();
        assert_eq!(entry.prefix.length, 0);
    }

    #[test]
    fn test_lookup_through_aggregate() {
        let mut selected = Forwarding::new();
        insert(&mut selected, "1.2.0.0/24", "198.51.100.1");
        insert(&mut selected, "1.2.1.0/24", "198.51.100.1");
        let fib = aggregate(&selected);

        let entry = lookup(&fib, Ipv4Addr::new(1, 2, 1, 9)).unwrap();
        assert_eq!(entry.prefix.to_string(), "1.2.0.0/23");
        assert!(entry.is_aggregate());
        assert_eq!(entry.route.peer().to_string(), "198.51.100.1");
    }
}
