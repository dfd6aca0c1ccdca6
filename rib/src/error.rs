// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::net::Ipv4Addr;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("malformed netmask {0}: ones are not contiguous")]
    MalformedMask(Ipv4Addr),

    #[error("malformed address {0}")]
    MalformedAddress(String),

    #[error("invalid prefix length {0}, must be at most 32")]
    InvalidPrefixLength(u8),

    #[error("serialization error {0}")]
    Serialization(#[from] serde_json::Error),
}
