// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

pub mod aggregate;
pub mod bestpath;
pub mod cidr;
pub mod config;
pub mod error;
pub mod lookup;
pub mod message;
pub mod table;
pub mod types;

mod log;

pub use config::Config;
pub use error::Error;
pub use message::Message;
pub use table::RouteTable;
pub use types::*;

#[cfg(test)]
mod proptest;

pub const COMPONENT_RIB: &str = "rib";
pub const MOD_TABLE: &str = "route table";
