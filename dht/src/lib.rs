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

//! # Sift DHT
//!
//! The iterative lookup engine of the Sift distributed hash table. Given a target key and a seed
//! set of peers, [`lookup::Lookup`] interrogates peers in parallel, follows "closer peer"
//! referrals and converges on the peers closest to the target under the XOR metric. An optional
//! second phase ([`lookup::RecurseResult::finish`]) performs a terminal action (store, fetch,
//! announce) against the closest survivors.
//!
//! The host network (connection management), the peer address book and the per-peer wire protocol
//! are all supplied by the embedder through the [`connectivity::Connectivity`] and
//! [`peer_store::PeerStore`] seams and the per-peer query function.

#![deny(unused_must_use)]
#![deny(unreachable_patterns)]
#![deny(unknown_lints)]

pub mod connectivity;
pub mod key;
pub mod lookup;
pub mod peer;
pub mod peer_store;

pub use connectivity::{Connectedness, Connectivity, DialError};
pub use key::{Distance, Key, KeyHasherFn};
pub use lookup::{
    FinishFn,
    Lookup,
    LookupConfig,
    LookupError,
    LookupEvent,
    QueryFn,
    QueryOutcome,
    RecurseResult,
};
pub use peer::{PeerId, PeerInfo};
pub use peer_store::{MemoryPeerStore, PeerStore, TEMP_ADDR_TTL};
