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

//! The iterative lookup engine.
//!
//! A lookup runs in two phases. *Recurse* explores the network: seed peers are dialed and
//! queried in parallel (at most `alpha` queries outstanding), referrals said to be closer to the
//! target are fed back into a priority backlog, and peers that can no longer displace a member of
//! the closest-peer window are pruned before they cost a dial. *Finish* takes the surviving
//! peers, sorted by XOR distance, and performs a terminal action against the closest
//! `num_results` of them, fanning out to `num_results + slop` so a few unreachable peers do not
//! force a second round.
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use sift_dht::*;
//! # use sift_shutdown::Shutdown;
//! # async fn docs(
//! #     connectivity: Arc<dyn Connectivity>,
//! #     peer_store: Arc<dyn PeerStore>,
//! #     query_fn: QueryFn,
//! #     seeds: Vec<PeerId>,
//! # ) -> Result<(), LookupError> {
//! let shutdown = Shutdown::new();
//! let lookup = Lookup::new(
//!     LookupConfig::default(),
//!     Key::new(b"target".to_vec()),
//!     PeerId::new(b"self".to_vec()),
//!     connectivity,
//!     peer_store,
//!     query_fn,
//!     shutdown.to_signal(),
//! );
//! let closest = lookup.run(seeds).await?;
//! # Ok(())
//! # }
//! ```

mod closest;
mod config;
mod dial_queue;
mod error;
mod event;
mod finish;
mod peer_sets;
mod pending;
mod queue;
mod runner;

pub use config::LookupConfig;
pub use error::LookupError;
pub use event::LookupEvent;
pub use finish::RecurseResult;
pub use runner::Lookup;

use bytes::Bytes;
use futures::future::BoxFuture;
use sift_shutdown::ShutdownSignal;
use std::sync::Arc;

use crate::peer::{PeerId, PeerInfo};

/// Result of one per-peer query.
#[derive(Debug, Clone)]
pub enum QueryOutcome {
    /// Referrals the peer claims are closer to the target.
    CloserPeers(Vec<PeerInfo>),
    /// The peer terminated the query early with a value. The engine treats this as a success
    /// with no referrals; higher layers consume the value.
    Value(Bytes),
}

pub type QueryFuture = BoxFuture<'static, Result<QueryOutcome, anyhow::Error>>;

/// The user-supplied per-peer query. Must be cancellation-aware: the given signal fires when the
/// lookup is cancelled or torn down.
pub type QueryFn = Arc<dyn Fn(ShutdownSignal, PeerId) -> QueryFuture + Send + Sync>;

pub type FinishFuture = BoxFuture<'static, Result<(), anyhow::Error>>;

/// The optional terminal action run against each of the closest peers during the finish phase.
pub type FinishFn = Arc<dyn Fn(ShutdownSignal, PeerId) -> FinishFuture + Send + Sync>;
