// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Property-based tests using proptest
//!
//! These tests check the prefix arithmetic, the best-path invariant of the
//! route table across arbitrary announce/withdraw sequences, and that
//! aggregation never changes where an address is forwarded.

#[cfg(test)]
mod proptest {
    use crate::aggregate::{aggregate, Selected};
    use crate::bestpath::preference;
    use crate::cidr::{netmask_from_length, prefix_length};
    use crate::lookup::lookup;
    use crate::{Origin, PathAttrs, Prefix4, Route, RouteTable};
    use proptest::prelude::*;
    use rib_common::log::discard_logger;
    use std::net::{IpAddr, Ipv4Addr};
    use std::sync::Arc;

    // Strategy for generating valid IPv4 prefixes
    fn ipv4_prefix_strategy() -> impl Strategy<Value = Prefix4> {
        (any::<u32>(), 0u8..=32u8).prop_map(|(addr_bits, length)| {
            Prefix4::new(Ipv4Addr::from(addr_bits), length)
        })
    }

    // Small attribute space so that ties and equivalent routes are common
    fn attrs_strategy() -> impl Strategy<Value = PathAttrs> {
        (0u32..3, 0usize..3, any::<bool>(), 0u8..3).prop_map(
            |(lp, len, self_origin, origin)| PathAttrs {
                local_pref: 100 + lp * 10,
                as_path: (0..len as u32).map(|i| 64500 + i).collect(),
                self_origin,
                origin: match origin {
                    0 => Origin::Igp,
                    1 => Origin::Egp,
                    _ => Origin::Unk,
                },
            },
        )
    }

    fn peer(n: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(192, 168, n, 2))
    }

    // Announce (Some) or withdraw (None) from one of four peers
    fn ops_strategy() -> impl Strategy<Value = Vec<(u8, Option<PathAttrs>)>> {
        prop::collection::vec(
            (0u8..4, prop::option::of(attrs_strategy())),
            1..40,
        )
    }

    // Selected routes for prefixes under 10.0.0.0/20, /22 through /24
    fn selected_strategy() -> impl Strategy<Value = Selected> {
        prop::collection::vec(
            (0u32..16, 22u8..=24, 0u8..2, 0u32..2),
            0..24,
        )
        .prop_map(|entries| {
            entries
                .into_iter()
                .map(|(block, length, p, lp)| {
                    let addr = Ipv4Addr::from_bits(0x0a00_0000 | (block << 8));
                    let prefix = Prefix4::new(addr, length);
                    let attrs = PathAttrs {
                        local_pref: 100 + lp,
                        as_path: vec![64500],
                        self_origin: false,
                        origin: Origin::Igp,
                    };
                    (prefix, Arc::new(Route::new(prefix, peer(p), attrs)))
                })
                .collect()
        })
    }

    proptest! {
        /// Property: IPv4 host bits are always unset after construction
        #[test]
        fn prop_ipv4_host_bits_always_unset(prefix in ipv4_prefix_strategy()) {
            prop_assert!(
                prefix.host_bits_are_unset(),
                "IPv4 prefix {prefix} should have host bits unset"
            );
        }

        /// Property: IPv4 prefix is always within itself
        #[test]
        fn prop_ipv4_within_self(prefix in ipv4_prefix_strategy()) {
            prop_assert!(
                prefix.within(&prefix),
                "IPv4 prefix {prefix} should be within itself"
            );
        }

        /// Property: IPv4 default route (0.0.0.0/0) contains all IPv4 prefixes
        #[test]
        fn prop_ipv4_default_contains_all(prefix in ipv4_prefix_strategy()) {
            let default = Prefix4::new(Ipv4Addr::new(0, 0, 0, 0), 0);
            prop_assert!(
                prefix.within(&default),
                "IPv4 prefix {prefix} should be within default route"
            );
        }

        /// Property: a prefix and its sibling share a supernet and are
        /// both within it
        #[test]
        fn prop_ipv4_sibling_shares_supernet(prefix in ipv4_prefix_strategy()) {
            if let (Some(sibling), Some(supernet)) =
                (prefix.sibling(), prefix.supernet())
            {
                prop_assert_ne!(sibling, prefix);
                prop_assert_eq!(sibling.supernet(), Some(supernet));
                prop_assert!(prefix.within(&supernet));
                prop_assert!(sibling.within(&supernet));
                prop_assert!(!sibling.overlaps(&prefix));
            }
        }

        /// Property: prefix display/parse round trip is lossless
        #[test]
        fn prop_ipv4_display_parse(prefix in ipv4_prefix_strategy()) {
            let parsed: Prefix4 = prefix.to_string().parse().unwrap();
            prop_assert_eq!(parsed, prefix);
        }

        /// Property: prefix_length inverts netmask_from_length, and any
        /// non-contiguous mask is rejected
        #[test]
        fn prop_netmask_prefix_length(length in 0u8..=32, bits in any::<u32>()) {
            prop_assert_eq!(prefix_length(netmask_from_length(length)).unwrap(), length);

            let contiguous = bits.leading_ones() == bits.count_ones();
            prop_assert_eq!(prefix_length(Ipv4Addr::from_bits(bits)).is_ok(), contiguous);
        }

        /// Property: after every announce or withdraw the selected route is
        /// the maximum of the remaining candidates
        #[test]
        fn prop_best_is_max_of_candidates(ops in ops_strategy()) {
            let table = RouteTable::new(discard_logger());
            let target: Prefix4 = "198.51.100.0/24".parse().unwrap();

            for (p, attrs) in ops {
                match attrs {
                    Some(attrs) => table.announce(target, peer(p), attrs),
                    None => table.withdraw(target, peer(p)),
                }

                let candidates = table.candidates(target);
                prop_assert!(candidates.len() <= 4);
                let max = candidates
                    .iter()
                    .max_by(|a, b| preference(a, b))
                    .cloned();
                prop_assert_eq!(table.best(target), max.clone());
                prop_assert_eq!(table.dump().is_empty(), max.is_none());
            }
        }

        /// Property: aggregation never changes the peer or attributes an
        /// address is forwarded with
        #[test]
        fn prop_aggregation_preserves_lookup(
            selected in selected_strategy(),
            hosts in prop::collection::vec(0u32..4096, 32),
        ) {
            let fib = aggregate(&selected);
            prop_assert!(fib.len() <= selected.len());
            prop_assert_eq!(&aggregate(&fib), &fib, "aggregation left a mergeable pair");

            for host in hosts {
                let addr = Ipv4Addr::from_bits(0x0a00_0000 | host);
                let before = lookup(&selected, addr);
                let after = lookup(&fib, addr);
                match (before, after) {
                    (None, None) => {}
                    (Some(b), Some(a)) => {
                        prop_assert!(b.route.forwarding_equivalent(&a.route));
                    }
                    (b, a) => prop_assert!(
                        false,
                        "{addr} forwarded differently: {b:?} vs {a:?}"
                    ),
                }
            }
        }
    }
}
