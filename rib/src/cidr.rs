// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Conversions between dotted-decimal network/netmask pairs and CIDR
//! prefix-length notation.

use crate::error::Error;
use crate::types::Prefix4;
use std::net::Ipv4Addr;

fn mask_bits(length: u8) -> u32 {
    match length {
        0 => 0,
        n if n >= 32 => !0u32,
        n => (!0u32) << (32 - n),
    }
}

/// Number of leading one bits in `netmask`. The mask must be a contiguous
/// run of ones starting at the most significant bit, anything else is a
/// `MalformedMask`.
pub fn prefix_length(netmask: Ipv4Addr) -> Result<u8, Error> {
    let bits = netmask.to_bits();
    let ones = bits.leading_ones();
    if bits.count_ones() != ones {
        return Err(Error::MalformedMask(netmask));
    }
    Ok(ones as u8)
}

/// Zero every bit of `address` beyond the first `length` bits.
pub fn network_from_prefix(address: Ipv4Addr, length: u8) -> Ipv4Addr {
    Ipv4Addr::from_bits(address.to_bits() & mask_bits(length))
}

/// Dotted-decimal netmask for a prefix length. Lengths above 32 yield
/// the host mask.
pub fn netmask_from_length(length: u8) -> Ipv4Addr {
    Ipv4Addr::from_bits(mask_bits(length))
}

/// Render a dotted-decimal network and netmask as `A.B.C.D/N`. The network
/// is rendered with its host bits cleared.
pub fn to_cidr(network: &str, netmask: &str) -> Result<String, Error> {
    let network: Ipv4Addr = network
        .parse()
        .map_err(|_| Error::MalformedAddress(network.to_string()))?;
    let netmask: Ipv4Addr = netmask
        .parse()
        .map_err(|_| Error::MalformedAddress(netmask.to_string()))?;
    Ok(Prefix4::from_netmask(network, netmask)?.to_string())
}
