// Copyright 2021, The Sift Project
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

//! The finish phase: a terminal action against the closest surviving peers.

use std::{
    collections::{HashSet, VecDeque},
    sync::Arc,
};

use futures::{stream::FuturesUnordered, StreamExt};
use log::*;
use sift_shutdown::ShutdownSignal;
use tokio::sync::broadcast;

use super::{event::LookupEvent, runner::LookupContext, FinishFn, LookupConfig, LookupError, QueryFn};
use crate::{key::XorMetric, peer::PeerId};

const LOG_TARGET: &str = "dht::lookup::finish";

/// A frozen view of a completed recursion. The peer sets are snapshotted when the recurse phase
/// terminates and are not shared with any still-running machinery.
pub struct RecurseResult {
    config: LookupConfig,
    metric: XorMetric,
    seen: HashSet<PeerId>,
    queried: HashSet<PeerId>,
    failed: HashSet<PeerId>,
    query_fn: QueryFn,
    event_tx: broadcast::Sender<Arc<LookupEvent>>,
    ambient: ShutdownSignal,
}

impl std::fmt::Debug for RecurseResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecurseResult")
            .field("config", &self.config)
            .field("metric", &self.metric)
            .field("seen", &self.seen)
            .field("queried", &self.queried)
            .field("failed", &self.failed)
            .finish_non_exhaustive()
    }
}

impl RecurseResult {
    pub(crate) fn new(ctx: &LookupContext, ambient: ShutdownSignal) -> Self {
        Self {
            config: ctx.config,
            metric: ctx.metric,
            seen: ctx.seen.snapshot(),
            queried: ctx.queried.snapshot(),
            failed: ctx.failed.snapshot(),
            query_fn: ctx.query_fn.clone(),
            event_tx: ctx.event_tx.clone(),
            ambient,
        }
    }

    /// Every peer the recursion considered.
    pub fn seen(&self) -> &HashSet<PeerId> {
        &self.seen
    }

    /// Peers the query function was invoked for.
    pub fn queried(&self) -> &HashSet<PeerId> {
        &self.queried
    }

    /// Peers whose dial or query failed.
    pub fn failed(&self) -> &HashSet<PeerId> {
        &self.failed
    }

    /// Peers that were seen and did not fail, closest to the target first.
    pub fn closest_survivors(&self) -> Vec<PeerId> {
        let mut survivors: Vec<_> = self.seen.difference(&self.failed).cloned().collect();
        self.metric.sort_closest_first(&mut survivors);
        survivors
    }

    /// Runs the terminal action against the closest survivors until `num_results` have succeeded
    /// or the survivors are exhausted, and returns the successful peers closest-first.
    ///
    /// `num_results + slop` actions are kept moving so that up to `slop` unreachable peers cost
    /// no extra round. When no action is supplied the query function stands in for it, and peers
    /// that already answered during the recursion are taken as-is without a second query.
    pub async fn finish(self, action: Option<FinishFn>) -> Result<Vec<PeerId>, LookupError> {
        let num_results = self.config.num_results;
        let sloppy_num_results = self.config.sloppy_num_results();
        let reuse_query = action.is_none();
        let call: FinishFn = match action {
            Some(action) => action,
            None => {
                let query_fn = self.query_fn.clone();
                Arc::new(move |signal, peer| -> super::FinishFuture {
                    let fut = (query_fn)(signal, peer);
                    Box::pin(async move { fut.await.map(|_| ()) })
                })
            },
        };

        let mut remaining: VecDeque<PeerId> = self.closest_survivors().into();
        debug!(
            target: LOG_TARGET,
            "Finishing lookup against {} surviving peer(s) (want {}, fan-out {})",
            remaining.len(),
            num_results,
            sloppy_num_results
        );

        let mut bucket = Vec::with_capacity(num_results);
        let mut in_flight = FuturesUnordered::new();
        // Successes on dispatched actions; each one retires a worker slot for the rest of the
        // phase, keeping total fan-out successes at `sloppy_num_results`
        let mut dispatched_successes = 0usize;

        while bucket.len() < num_results {
            // A peer that already answered during the recursion needs no second query when the
            // action is just the query function again
            if reuse_query
                && matches!(
                    remaining.front(),
                    Some(peer) if self.queried.contains(peer) && !self.failed.contains(peer)
                )
            {
                if let Some(peer) = remaining.pop_front() {
                    self.publish_event(LookupEvent::FinalPeer(peer.clone()));
                    bucket.push(peer);
                }
                continue;
            }

            // Dispatch while worker slots are free
            if dispatched_successes + in_flight.len() < sloppy_num_results {
                if let Some(peer) = remaining.pop_front() {
                    let signal = self.ambient.clone();
                    let call = call.clone();
                    in_flight.push(async move {
                        let result = (call)(signal, peer.clone()).await;
                        (peer, result)
                    });
                    continue;
                }
            }

            if in_flight.is_empty() {
                break;
            }

            tokio::select! {
                biased;
                _ = self.ambient.wait() => {
                    debug!(
                        target: LOG_TARGET,
                        "Lookup finish cancelled with {} result(s) collected",
                        bucket.len()
                    );
                    return Err(LookupError::Cancelled);
                },
                completed = in_flight.next() => {
                    if let Some((peer, result)) = completed {
                        match result {
                            Ok(()) => {
                                dispatched_successes += 1;
                                self.publish_event(LookupEvent::FinalPeer(peer.clone()));
                                bucket.push(peer);
                            },
                            Err(err) => {
                                debug!(
                                    target: LOG_TARGET,
                                    "Finish action failed for peer `{}`: {}",
                                    peer.short_str(),
                                    err
                                );
                                self.publish_event(LookupEvent::QueryError {
                                    peer,
                                    message: err.to_string(),
                                });
                            },
                        }
                    }
                },
            }
        }

        self.metric.sort_closest_first(&mut bucket);
        debug!(
            target: LOG_TARGET,
            "Lookup finished with {} of {} wanted result(s)",
            bucket.len(),
            num_results
        );
        Ok(bucket)
    }

    fn publish_event(&self, event: LookupEvent) {
        // Nobody listening is fine
        let _ = self.event_tx.send(Arc::new(event));
    }
}
