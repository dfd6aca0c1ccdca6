// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Tunables for a [`crate::RouteTable`].
#[derive(
    Debug, Copy, Clone, Serialize, Deserialize, JsonSchema, Eq, PartialEq,
)]
pub struct Config {
    /// Merge adjacent forwarding-equivalent prefixes in the forwarding set.
    /// When disabled the forwarding set is the selected set.
    #[serde(default = "default_aggregate")]
    pub aggregate: bool,
}

fn default_aggregate() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            aggregate: default_aggregate(),
        }
    }
}
