// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::cidr;
use crate::error::Error;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt::{self, Display, Formatter};
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;
use std::sync::Arc;

/// Identifies the neighbor a route was learned from. Neighbors are known by
/// their address, and the numeric order of that address is the final
/// best-path tie-break.
pub type PeerId = IpAddr;

#[derive(
    Debug, Copy, Clone, Serialize, Deserialize, Eq, Hash, PartialEq, JsonSchema,
)]
pub struct Prefix4 {
    pub value: Ipv4Addr,
    pub length: u8,
}

impl PartialOrd for Prefix4 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Prefix4 {
    fn cmp(&self, other: &Self) -> Ordering {
        if self.value != other.value {
            return self.value.cmp(&other.value);
        }
        self.length.cmp(&other.length)
    }
}

impl Prefix4 {
    pub const HOST_MASK: u8 = 32;

    /// Create a new `Prefix4` from an IP address and prefix length.
    /// The newly created `Prefix4` will have its host bits zeroed upon
    /// creation e.g.
    /// ```
    /// use rib::types::Prefix4;
    /// use std::net::Ipv4Addr;
    /// let p4 = Prefix4::new(Ipv4Addr::new(10, 0, 0, 10), 24);
    /// assert_eq!(p4.value, Ipv4Addr::new(10, 0, 0, 0));
    /// ```
    ///
    /// Lengths above 32 are clamped to a host route.
    pub fn new(ip: Ipv4Addr, length: u8) -> Self {
        let length = length.min(Self::HOST_MASK);
        Self {
            value: cidr::network_from_prefix(ip, length),
            length,
        }
    }

    /// Build a prefix from a dotted-decimal network and netmask pair.
    pub fn from_netmask(
        network: Ipv4Addr,
        netmask: Ipv4Addr,
    ) -> Result<Self, Error> {
        Ok(Self::new(network, cidr::prefix_length(netmask)?))
    }

    pub fn netmask(&self) -> Ipv4Addr {
        cidr::netmask_from_length(self.length)
    }

    pub fn host_bits_are_unset(&self) -> bool {
        cidr::network_from_prefix(self.value, self.length) == self.value
    }

    /// Check if this prefix is contained within another prefix.
    /// Returns true if this prefix is equal to or more specific than the other.
    pub fn within(&self, other: &Prefix4) -> bool {
        if self.length < other.length {
            return false;
        }
        cidr::network_from_prefix(self.value, other.length) == other.value
    }

    /// Check if `addr` falls inside this prefix.
    pub fn contains(&self, addr: Ipv4Addr) -> bool {
        cidr::network_from_prefix(addr, self.length) == self.value
    }

    /// Two prefixes overlap when either one is within the other.
    pub fn overlaps(&self, other: &Prefix4) -> bool {
        self.within(other) || other.within(self)
    }

    /// The prefix one bit shorter that covers this one. `None` for the
    /// default route and for lengths past the host mask.
    pub fn supernet(&self) -> Option<Prefix4> {
        match self.length {
            0 => None,
            n if n > Self::HOST_MASK => None,
            n => Some(Prefix4::new(self.value, n - 1)),
        }
    }

    /// The other half of this prefix's supernet. `None` for the default
    /// route and for lengths past the host mask.
    pub fn sibling(&self) -> Option<Prefix4> {
        match self.length {
            0 => None,
            n if n > Self::HOST_MASK => None,
            n => {
                let bit = 1u32 << (Self::HOST_MASK - n);
                Some(Prefix4 {
                    value: Ipv4Addr::from_bits(self.value.to_bits() ^ bit),
                    length: n,
                })
            }
        }
    }
}

impl fmt::Display for Prefix4 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.value, self.length)
    }
}

impl FromStr for Prefix4 {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (value, length) = s
            .split_once('/')
            .ok_or_else(|| Error::MalformedAddress(s.to_string()))?;

        let value: Ipv4Addr = value
            .parse()
            .map_err(|_| Error::MalformedAddress(value.to_string()))?;
        let length: u8 = length
            .parse()
            .map_err(|_| Error::MalformedAddress(s.to_string()))?;
        if length > Self::HOST_MASK {
            return Err(Error::InvalidPrefixLength(length));
        }

        Ok(Self::new(value, length))
    }
}

/// How a route entered the routing system. Declaration order is the
/// selection precedence, lowest first.
#[derive(
    Debug,
    Copy,
    Clone,
    Serialize,
    Deserialize,
    Eq,
    PartialEq,
    Hash,
    PartialOrd,
    Ord,
    JsonSchema,
)]
pub enum Origin {
    #[serde(rename = "IGP")]
    Igp,
    #[serde(rename = "EGP")]
    Egp,
    #[serde(rename = "UNK")]
    Unk,
}

impl Display for Origin {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Origin::Igp => write!(f, "IGP"),
            Origin::Egp => write!(f, "EGP"),
            Origin::Unk => write!(f, "UNK"),
        }
    }
}

impl FromStr for Origin {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "IGP" => Ok(Self::Igp),
            "EGP" => Ok(Self::Egp),
            "UNK" => Ok(Self::Unk),
            _ => Err(format!("unknown origin {s}, must be IGP, EGP or UNK")),
        }
    }
}

/// The attributes an announcement carries alongside its prefix.
#[derive(
    Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Hash, JsonSchema,
)]
pub struct PathAttrs {
    #[serde(rename = "localpref")]
    pub local_pref: u32,
    #[serde(rename = "ASPath")]
    pub as_path: Vec<u32>,
    #[serde(rename = "selfOrigin")]
    pub self_origin: bool,
    pub origin: Origin,
}

/// One announced path to a prefix. A route is never modified after it is
/// built; a new announcement from the same peer produces a new route that
/// replaces this one in the table.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Route {
    prefix: Prefix4,
    peer: PeerId,
    attrs: PathAttrs,
}

impl Route {
    pub fn new(prefix: Prefix4, peer: PeerId, attrs: PathAttrs) -> Self {
        // Prefix4 constructors already mask, but the fields are public.
        let prefix = Prefix4::new(prefix.value, prefix.length);
        Self {
            prefix,
            peer,
            attrs,
        }
    }

    /// Build a route from the network and netmask of an announcement.
    pub fn from_netmask(
        network: Ipv4Addr,
        netmask: Ipv4Addr,
        peer: PeerId,
        attrs: PathAttrs,
    ) -> Result<Self, Error> {
        Ok(Self::new(Prefix4::from_netmask(network, netmask)?, peer, attrs))
    }

    pub fn prefix(&self) -> Prefix4 {
        self.prefix
    }

    pub fn network(&self) -> Ipv4Addr {
        self.prefix.value
    }

    pub fn prefix_length(&self) -> u8 {
        self.prefix.length
    }

    pub fn peer(&self) -> PeerId {
        self.peer
    }

    pub fn attrs(&self) -> &PathAttrs {
        &self.attrs
    }

    pub fn local_pref(&self) -> u32 {
        self.attrs.local_pref
    }

    pub fn as_path(&self) -> &[u32] {
        &self.attrs.as_path
    }

    pub fn self_origin(&self) -> bool {
        self.attrs.self_origin
    }

    pub fn origin(&self) -> Origin {
        self.attrs.origin
    }

    /// Routes are forwarding equivalent when everything but the prefix
    /// matches, which is what makes adjacent prefixes safe to aggregate.
    pub fn forwarding_equivalent(&self, other: &Route) -> bool {
        self.peer == other.peer && self.attrs == other.attrs
    }
}

impl Display for Route {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[prefix={}, peer={}, localpref={}, as_path={:?}, \
             self_origin={}, origin={}]",
            self.prefix,
            self.peer,
            self.attrs.local_pref,
            self.attrs.as_path,
            self.attrs.self_origin,
            self.attrs.origin,
        )
    }
}

/// An entry in the forwarding set. For an aggregate, `prefix` is the
/// covering prefix and `route` is the selected route of one of the
/// aggregated prefixes; all of them share the same peer and attributes.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ForwardingEntry {
    pub prefix: Prefix4,
    pub route: Arc<Route>,
}

impl ForwardingEntry {
    pub fn is_aggregate(&self) -> bool {
        self.prefix != self.route.prefix()
    }
}

#[derive(Clone, Default, Debug)]
pub struct PrefixChangeNotification {
    pub changed: BTreeSet<Prefix4>,
}

impl Display for PrefixChangeNotification {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut pcn = String::new();
        for p in self.changed.iter() {
            pcn.push_str(&format!("{p} "));
        }
        write!(f, "PrefixChangeNotification [ {pcn}]")
    }
}
