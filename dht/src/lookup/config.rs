// Copyright 2020, The Sift Project
//
// Redistribution and use in source and binary forms, with or without modification, are permitted provided that the
// following conditions are met:
//
// 1. Redistributions of source code must retain the above copyright notice, this list of conditions and the following
// disclaimer.
//
// 2. Redistributions in binary form must reproduce the above copyright notice, this list of conditions and the
// following disclaimer in the documentation and/or other materials provided with the distribution.
//
// 3. Neither the name of the copyright holder nor the names of its contributors may be used to endorse or promote
// products derived from this software without specific prior written permission.
//
// THIS SOFTWARE IS PROVIDED BY THE COPYRIGHT HOLDERS AND CONTRIBUTORS "AS IS" AND ANY EXPRESS OR IMPLIED WARRANTIES,
// INCLUDING, BUT NOT LIMITED TO, THE IMPLIED WARRANTIES OF MERCHANTABILITY AND FITNESS FOR A PARTICULAR PURPOSE ARE
// DISCLAIMED. IN NO EVENT SHALL THE COPYRIGHT HOLDER OR CONTRIBUTORS BE LIABLE FOR ANY DIRECT, INDIRECT, INCIDENTAL,
// SPECIAL, EXEMPLARY, OR CONSEQUENTIAL DAMAGES (INCLUDING, BUT NOT LIMITED TO, PROCUREMENT OF SUBSTITUTE GOODS OR
// SERVICES; LOSS OF USE, DATA, OR PROFITS; OR BUSINESS INTERRUPTION) HOWEVER CAUSED AND ON ANY THEORY OF LIABILITY,
// WHETHER IN CONTRACT, STRICT LIABILITY, OR TORT (INCLUDING NEGLIGENCE OR OTHERWISE) ARISING IN ANY WAY OUT OF THE
// USE OF THIS SOFTWARE, EVEN IF ADVISED OF THE POSSIBILITY OF SUCH DAMAGE.

use std::time::Duration;

use crate::key::{blake2b_256, KeyHasherFn};

/// Tunables for a lookup.
#[derive(Debug, Clone, Copy)]
pub struct LookupConfig {
    /// Degree of parallelism, often called `alpha` in technical papers. Bounds the simultaneous
    /// outstanding queries as well as the capacity of the closest-peer window used to prune the
    /// traversal.
    /// Default: 3
    pub alpha: usize,
    /// Number of closest peers a lookup converges on, often called `K`.
    /// Default: 20
    pub num_results: usize,
    /// Extra peers the finisher phase fans out to beyond `num_results`, tolerating that many
    /// unreachable peers without a second round.
    /// Default: 4
    pub slop: usize,
    /// A dial exceeding this duration counts as a dial failure.
    /// Default: 10s
    pub dial_timeout: Duration,
    /// Hash mapping keys and peer IDs onto the fixed-length XOR key space.
    /// Default: Blake2b-256
    pub key_hasher: KeyHasherFn,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            alpha: 3,
            num_results: 20,
            slop: 4,
            dial_timeout: Duration::from_secs(10),
            key_hasher: blake2b_256,
        }
    }
}

impl LookupConfig {
    /// The finisher fan-out: `num_results + slop`.
    pub fn sloppy_num_results(&self) -> usize {
        self.num_results + self.slop
    }
}
