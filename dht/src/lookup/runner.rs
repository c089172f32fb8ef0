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

//! The recurse phase: bounded-concurrency traversal with counter-based termination.

use std::sync::{Arc, Mutex};

use futures::future;
use log::*;
use sift_shutdown::{Shutdown, ShutdownSignal};
use tokio::sync::{broadcast, OwnedSemaphorePermit, Semaphore};

use super::{
    closest::NearestSet,
    dial_queue::DialQueue,
    event::LookupEvent,
    finish::RecurseResult,
    peer_sets::PeerSet,
    pending::PendingWork,
    queue::XorQueue,
    LookupConfig,
    LookupError,
    QueryFn,
    QueryOutcome,
};
use crate::{
    connectivity::Connectivity,
    key::{Key, XorMetric},
    peer::PeerId,
    peer_store::{PeerStore, TEMP_ADDR_TTL},
};

const LOG_TARGET: &str = "dht::lookup::runner";

/// Events buffered for slow subscribers before they start lagging.
const EVENT_CHANNEL_CAPACITY: usize = 128;

/// State shared between the dispatch loop, the dial pool and the query tasks of one lookup.
pub(crate) struct LookupContext {
    pub config: LookupConfig,
    pub local_peer_id: PeerId,
    pub metric: XorMetric,
    pub connectivity: Arc<dyn Connectivity>,
    pub peer_store: Arc<dyn PeerStore>,
    pub query_fn: QueryFn,
    /// Every peer the lookup has ever considered.
    pub seen: PeerSet,
    /// Peers for which the query function was invoked, regardless of outcome.
    pub queried: PeerSet,
    /// Peers whose dial or query returned an error.
    pub failed: PeerSet,
    pub nearest: NearestSet,
    pub pending: PendingWork,
    pub backlog: XorQueue,
    pub errors: Mutex<Vec<LookupError>>,
    pub event_tx: broadcast::Sender<Arc<LookupEvent>>,
}

impl LookupContext {
    pub fn publish_event(&self, event: LookupEvent) {
        // Nobody listening is fine
        let _ = self.event_tx.send(Arc::new(event));
    }

    /// Admits a newly discovered peer into the traversal. A peer is considered at most once per
    /// lookup, and enqueued for dialing only while it can still displace a member of the
    /// closest-peer window.
    pub fn add_peer_to_query(&self, peer: PeerId) {
        if peer == self.local_peer_id {
            return;
        }
        if !self.seen.try_add(&peer) {
            return;
        }
        self.publish_event(LookupEvent::AddingPeer(peer.clone()));
        if !self.nearest.check(&peer) {
            trace!(
                target: LOG_TARGET,
                "Peer `{}` cannot improve on the closest peers, not enqueueing",
                peer.short_str()
            );
            return;
        }
        self.pending.increment(1);
        let distance = self.metric.distance_to(&peer);
        // If shutdown races the enqueue, the peer is dropped and the counter dies with the
        // terminating lookup
        let _ = self.backlog.push(distance, peer);
    }

    /// Marks the peer failed and appends the error to the accumulator in arrival order.
    pub fn record_failure(&self, err: LookupError) {
        if let Some(peer) = err.peer_id() {
            self.failed.try_add(peer);
            self.publish_event(LookupEvent::QueryError {
                peer: peer.clone(),
                message: err.to_string(),
            });
        }
        self.errors.lock().expect("lookup error list poisoned").push(err);
    }
}

/// A single-use lookup runner. See the [module docs](crate::lookup) for an overview.
pub struct Lookup {
    context: Arc<LookupContext>,
    ambient: ShutdownSignal,
}

impl Lookup {
    pub fn new(
        config: LookupConfig,
        target: Key,
        local_peer_id: PeerId,
        connectivity: Arc<dyn Connectivity>,
        peer_store: Arc<dyn PeerStore>,
        query_fn: QueryFn,
        shutdown_signal: ShutdownSignal,
    ) -> Self {
        let metric = XorMetric::new(&target, config.key_hasher);
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let context = LookupContext {
            config,
            local_peer_id,
            metric,
            connectivity,
            peer_store,
            query_fn,
            seen: PeerSet::new(),
            queried: PeerSet::new(),
            failed: PeerSet::new(),
            nearest: NearestSet::new(metric, config.alpha),
            pending: PendingWork::new(),
            backlog: XorQueue::new(),
            errors: Mutex::new(Vec::new()),
            event_tx,
        };
        Self {
            context: Arc::new(context),
            ambient: shutdown_signal,
        }
    }

    /// Subscribe to the advisory event stream before starting the lookup.
    pub fn event_subscription(&self) -> broadcast::Receiver<Arc<LookupEvent>> {
        self.context.event_tx.subscribe()
    }

    /// A handle the per-peer function can use to publish additional events onto the lookup's
    /// event stream.
    pub fn event_publisher(&self) -> broadcast::Sender<Arc<LookupEvent>> {
        self.context.event_tx.clone()
    }

    /// Recurse and then finish with the query function as the terminal action, returning up to
    /// `num_results` of the closest reachable peers.
    pub async fn run(self, seeds: Vec<PeerId>) -> Result<Vec<PeerId>, LookupError> {
        match self.recurse(seeds).await? {
            Some(result) => result.finish(None).await,
            None => Ok(Vec::new()),
        }
    }

    /// The exploration phase. Expands the set of seen peers by following referrals until no peer
    /// remains that could improve the result, then returns a frozen view of the traversal, or
    /// `None` if no seeds were given.
    pub async fn recurse(self, seeds: Vec<PeerId>) -> Result<Option<RecurseResult>, LookupError> {
        if seeds.is_empty() {
            debug!(target: LOG_TARGET, "Lookup given no seed peers");
            return Ok(None);
        }

        let ctx = self.context;
        let ambient = self.ambient;
        debug!(
            target: LOG_TARGET,
            "Starting lookup recursion with {} seed peer(s)",
            seeds.len()
        );

        let mut internal = Shutdown::new();
        for seed in seeds {
            ctx.add_peer_to_query(seed);
        }

        let mut dial_queue = DialQueue::spawn(&ctx, internal.to_signal());
        let rate_limit = Arc::new(Semaphore::new(ctx.config.alpha));
        let mut query_tasks = Vec::new();
        let mut cancelled = false;

        loop {
            let permit = tokio::select! {
                biased;
                _ = ambient.wait() => {
                    cancelled = true;
                    break;
                },
                _ = ctx.pending.done() => break,
                permit = rate_limit.clone().acquire_owned() => {
                    permit.expect("rate limit semaphore is never closed")
                },
            };
            let peer = tokio::select! {
                biased;
                _ = ambient.wait() => {
                    cancelled = true;
                    break;
                },
                _ = ctx.pending.done() => break,
                next = dial_queue.next_ready() => match next {
                    Some(peer) => peer,
                    // Ready channel closure signals shutdown
                    None => {
                        cancelled = true;
                        break;
                    },
                },
            };

            let task_ctx = Arc::clone(&ctx);
            let signal = internal.to_signal();
            query_tasks.push(tokio::spawn(query_peer(task_ctx, signal, peer, permit)));
        }

        // Wind down: refuse new peers, fire the internal scope, and wait for every spawned task
        // to exit before the sets are snapshotted
        ctx.backlog.close();
        internal.trigger();
        dial_queue.join().await;
        future::join_all(query_tasks).await;

        if cancelled {
            debug!(target: LOG_TARGET, "Lookup recursion cancelled");
            return Err(LookupError::Cancelled);
        }
        debug_assert_eq!(ctx.pending.count(), 0, "work counter nonzero after termination");

        {
            let mut errors = ctx.errors.lock().expect("lookup error list poisoned");
            if !errors.is_empty() && errors.len() == ctx.seen.len() {
                warn!(
                    target: LOG_TARGET,
                    "All {} peer(s) seen by the lookup failed",
                    ctx.seen.len()
                );
                return Err(errors.remove(0));
            }
        }

        debug!(
            target: LOG_TARGET,
            "Lookup recursion complete ({} seen, {} queried, {} failed)",
            ctx.seen.len(),
            ctx.queried.len(),
            ctx.failed.len()
        );
        Ok(Some(RecurseResult::new(&ctx, ambient)))
    }
}

/// Queries one dialed peer and feeds its referrals back into the traversal.
async fn query_peer(
    ctx: Arc<LookupContext>,
    signal: ShutdownSignal,
    peer: PeerId,
    permit: OwnedSemaphorePermit,
) {
    // Held until this task exits: the work unit and the rate limit token
    let _work = ctx.pending.guard();
    let _permit = permit;

    // Conditions may have changed while the peer moved through the dial pipeline
    if !ctx.nearest.check(&peer) {
        trace!(
            target: LOG_TARGET,
            "Peer `{}` is no longer among the closest, skipping query",
            peer.short_str()
        );
        return;
    }

    ctx.queried.try_add(&peer);
    ctx.publish_event(LookupEvent::SendingQuery(peer.clone()));
    match (ctx.query_fn)(signal, peer.clone()).await {
        Ok(outcome) => {
            ctx.nearest.add(peer.clone());
            let referrals = match outcome {
                QueryOutcome::CloserPeers(referrals) => referrals,
                QueryOutcome::Value(_) => Vec::new(),
            };
            ctx.publish_event(LookupEvent::PeerResponse {
                peer: peer.clone(),
                num_closer: referrals.len(),
            });
            for referral in referrals {
                if referral.peer_id == ctx.local_peer_id {
                    continue;
                }
                ctx.peer_store
                    .add_peer_addresses(&referral.peer_id, &referral.addresses, TEMP_ADDR_TTL);
                ctx.add_peer_to_query(referral.peer_id);
            }
        },
        Err(err) => {
            debug!(
                target: LOG_TARGET,
                "Query to peer `{}` failed: {}",
                peer.short_str(),
                err
            );
            ctx.record_failure(LookupError::Query { peer, source: err });
        },
    }
}
