// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Messages exchanged with the update decoder and the forwarding layer.
//!
//! Field names follow the decoder's vocabulary exactly (`network`,
//! `netmask`, `localpref`, `ASPath`, `selfOrigin`, `origin`), e.g.
//!
//! ```json
//! {"type": "update", "src": "192.168.0.2", "dst": "192.168.0.1",
//!  "msg": {"network": "192.168.0.0", "netmask": "255.255.255.0",
//!          "localpref": 100, "ASPath": [1], "selfOrigin": true,
//!          "origin": "EGP"}}
//! ```

use crate::error::Error;
use crate::types::{ForwardingEntry, PathAttrs, PeerId, Prefix4};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};

/// A route announcement as carried in an `update` message.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Eq, PartialEq)]
pub struct Announcement {
    pub network: Ipv4Addr,
    pub netmask: Ipv4Addr,
    #[serde(flatten)]
    pub attrs: PathAttrs,
}

impl Announcement {
    pub fn prefix(&self) -> Result<Prefix4, Error> {
        Prefix4::from_netmask(self.network, self.netmask)
    }
}

/// One withdrawn route as carried in a `withdraw` message.
#[derive(
    Debug, Copy, Clone, Serialize, Deserialize, JsonSchema, Eq, PartialEq,
)]
pub struct Withdrawal {
    pub network: Ipv4Addr,
    pub netmask: Ipv4Addr,
}

impl Withdrawal {
    pub fn prefix(&self) -> Result<Prefix4, Error> {
        Prefix4::from_netmask(self.network, self.netmask)
    }
}

/// One row of a `table` response.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Eq, PartialEq)]
pub struct TableEntry {
    pub network: Ipv4Addr,
    pub netmask: Ipv4Addr,
    pub peer: PeerId,
    #[serde(flatten)]
    pub attrs: PathAttrs,
}

impl From<&ForwardingEntry> for TableEntry {
    fn from(value: &ForwardingEntry) -> Self {
        Self {
            network: value.prefix.value,
            netmask: value.prefix.netmask(),
            peer: value.route.peer(),
            attrs: value.route.attrs().clone(),
        }
    }
}

/// The `dump` request carries an empty object.
#[derive(
    Debug, Default, Copy, Clone, Serialize, Deserialize, JsonSchema, Eq, PartialEq,
)]
pub struct Empty {}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Eq, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Message {
    /// A peer announces a route.
    Update {
        src: PeerId,
        dst: IpAddr,
        msg: Announcement,
    },

    /// A peer withdraws one or more routes it announced earlier.
    Withdraw {
        src: PeerId,
        dst: IpAddr,
        msg: Vec<Withdrawal>,
    },

    /// A request for the current forwarding table.
    Dump {
        src: IpAddr,
        dst: IpAddr,
        #[serde(default)]
        msg: Empty,
    },

    /// The response to a `dump`.
    Table {
        src: IpAddr,
        dst: IpAddr,
        msg: Vec<TableEntry>,
    },
}

impl Message {
    pub fn decode(s: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn encode(&self) -> Result<String, Error> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn src(&self) -> IpAddr {
        match self {
            Self::Update { src, .. }
            | Self::Withdraw { src, .. }
            | Self::Dump { src, .. }
            | Self::Table { src, .. } => *src,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Update { .. } => "update",
            Self::Withdraw { .. } => "withdraw",
            Self::Dump { .. } => "dump",
            Self::Table { .. } => "table",
        }
    }
}
