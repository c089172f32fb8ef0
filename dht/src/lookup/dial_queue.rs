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

//! The dial pool.
//!
//! Workers drain the XOR-priority backlog, establish connections ahead of demand and surface
//! ready peers on a bounded channel, so that when a query slot frees up a connected peer is
//! typically available immediately.

use std::sync::Arc;

use futures::future;
use log::*;
use sift_shutdown::ShutdownSignal;
use tokio::{sync::mpsc, task::JoinHandle, time};

use super::{event::LookupEvent, runner::LookupContext, LookupError};
use crate::{
    connectivity::{Connectedness, DialError},
    peer::{PeerId, PeerInfo},
};

const LOG_TARGET: &str = "dht::lookup::dial_queue";

/// A fixed pool of `alpha` dial workers feeding a ready channel of capacity `alpha`, keeping at
/// most `2 * alpha` peers warm ahead of the query loop.
pub(crate) struct DialQueue {
    ready_rx: mpsc::Receiver<PeerId>,
    workers: Vec<JoinHandle<()>>,
}

impl DialQueue {
    pub fn spawn(ctx: &Arc<LookupContext>, signal: ShutdownSignal) -> Self {
        let (ready_tx, ready_rx) = mpsc::channel(ctx.config.alpha);
        let workers = (0..ctx.config.alpha)
            .map(|worker_id| {
                tokio::spawn(dial_worker(
                    worker_id,
                    Arc::clone(ctx),
                    ready_tx.clone(),
                    signal.clone(),
                ))
            })
            .collect();
        Self { ready_rx, workers }
    }

    /// The next peer that is connected and ready to be queried. `None` means the pool has shut
    /// down.
    pub async fn next_ready(&mut self) -> Option<PeerId> {
        self.ready_rx.recv().await
    }

    /// Waits for every worker to exit. Callers close the backlog or trigger the shutdown signal
    /// first; dropping the ready channel here unblocks any worker mid-send.
    pub async fn join(self) {
        drop(self.ready_rx);
        future::join_all(self.workers).await;
    }
}

async fn dial_worker(
    worker_id: usize,
    ctx: Arc<LookupContext>,
    ready_tx: mpsc::Sender<PeerId>,
    signal: ShutdownSignal,
) {
    loop {
        let peer = tokio::select! {
            biased;
            _ = signal.wait() => break,
            next = ctx.backlog.pop() => match next {
                Some(peer) => peer,
                None => break,
            },
        };

        // The closest-peer window may have tightened while the peer sat in the backlog
        if !ctx.nearest.check(&peer) {
            trace!(
                target: LOG_TARGET,
                "[worker {}] Peer `{}` is no longer among the closest, dropping",
                worker_id,
                peer.short_str()
            );
            ctx.pending.decrement(1);
            continue;
        }

        ctx.publish_event(LookupEvent::DialingPeer(peer.clone()));
        match dial_peer(&ctx, signal.clone(), &peer).await {
            Ok(()) => {
                if ready_tx.send(peer).await.is_err() {
                    // Consumer has gone away; the lookup is tearing down
                    break;
                }
            },
            Err(err) => {
                debug!(
                    target: LOG_TARGET,
                    "[worker {}] Failed to dial peer `{}`: {}",
                    worker_id,
                    peer.short_str(),
                    err
                );
                ctx.record_failure(LookupError::Dial {
                    peer: peer.clone(),
                    source: err,
                });
                // The peer never reaches a query task, so the dial path settles its own work unit
                ctx.pending.decrement(1);
            },
        }
    }
    trace!(target: LOG_TARGET, "[worker {}] Dial worker exiting", worker_id);
}

async fn dial_peer(ctx: &LookupContext, signal: ShutdownSignal, peer: &PeerId) -> Result<(), DialError> {
    if ctx.connectivity.connectedness(peer) == Connectedness::Connected {
        return Ok(());
    }
    let info = PeerInfo::new(peer.clone(), ctx.peer_store.peer_addresses(peer));
    let timeout = ctx.config.dial_timeout;
    match time::timeout(timeout, ctx.connectivity.connect(signal, &info)).await {
        Ok(result) => result,
        Err(_) => Err(DialError::Timeout { timeout }),
    }
}

#[cfg(test)]
mod test {
    use std::{
        collections::HashSet,
        sync::Mutex,
        time::Duration,
    };

    use sift_shutdown::Shutdown;
    use tokio::sync::broadcast;

    use super::*;
    use crate::{
        key::{Key, XorMetric, KEY_HASH_LEN},
        lookup::{
            closest::NearestSet,
            peer_sets::PeerSet,
            pending::PendingWork,
            queue::XorQueue,
            LookupConfig,
            QueryFn,
            QueryFuture,
            QueryOutcome,
        },
        peer_store::MemoryPeerStore,
    };

    fn identity_hasher(data: &[u8]) -> [u8; KEY_HASH_LEN] {
        let mut out = [0u8; KEY_HASH_LEN];
        out[..data.len()].copy_from_slice(data);
        out
    }

    struct ScriptedConnectivity {
        failures: HashSet<PeerId>,
    }

    #[async_trait::async_trait]
    impl crate::connectivity::Connectivity for ScriptedConnectivity {
        fn connectedness(&self, _peer_id: &PeerId) -> Connectedness {
            Connectedness::NotConnected
        }

        async fn connect(&self, _signal: ShutdownSignal, peer: &PeerInfo) -> Result<(), DialError> {
            if self.failures.contains(&peer.peer_id) {
                return Err(DialError::ConnectFailed {
                    details: "scripted".to_string(),
                });
            }
            Ok(())
        }
    }

    fn build_context(failures: HashSet<PeerId>) -> Arc<LookupContext> {
        let config = LookupConfig {
            alpha: 2,
            num_results: 3,
            key_hasher: identity_hasher,
            ..Default::default()
        };
        let metric = XorMetric::new(&Key::new(vec![0u8]), identity_hasher);
        let (event_tx, _) = broadcast::channel(64);
        let query_fn: QueryFn = Arc::new(|_signal, _peer| -> QueryFuture {
            Box::pin(async { Ok(QueryOutcome::CloserPeers(Vec::new())) })
        });
        Arc::new(LookupContext {
            config,
            local_peer_id: PeerId::new(vec![0xee]),
            metric,
            connectivity: Arc::new(ScriptedConnectivity { failures }),
            peer_store: Arc::new(MemoryPeerStore::new()),
            query_fn,
            seen: PeerSet::new(),
            queried: PeerSet::new(),
            failed: PeerSet::new(),
            nearest: NearestSet::new(metric, config.alpha),
            pending: PendingWork::new(),
            backlog: XorQueue::new(),
            errors: Mutex::new(Vec::new()),
            event_tx,
        })
    }

    async fn wait_for_pending(ctx: &LookupContext, expected: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while ctx.pending.count() != expected {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap_or_else(|_| {
            panic!(
                "pending count never reached {} (now {})",
                expected,
                ctx.pending.count()
            )
        });
    }

    #[tokio::test]
    async fn emits_ready_peers_and_settles_dial_failures() {
        let unreachable = PeerId::new(vec![0x10]);
        let reachable = PeerId::new(vec![0x20]);
        let ctx = build_context([unreachable.clone()].into_iter().collect());
        ctx.add_peer_to_query(unreachable.clone());
        ctx.add_peer_to_query(reachable.clone());
        assert_eq!(ctx.pending.count(), 2);

        let internal = Shutdown::new();
        let mut queue = DialQueue::spawn(&ctx, internal.to_signal());
        let ready = tokio::time::timeout(Duration::from_secs(5), queue.next_ready())
            .await
            .unwrap();
        assert_eq!(ready, Some(reachable));

        // The failed dial settles its own work unit and bookkeeping
        wait_for_pending(&ctx, 1).await;
        assert!(ctx.failed.contains(&unreachable));
        assert_eq!(ctx.errors.lock().unwrap().len(), 1);

        ctx.backlog.close();
        queue.join().await;
    }

    #[tokio::test]
    async fn peers_outside_the_window_are_dropped_before_dialing() {
        let ctx = build_context(HashSet::new());
        // Fill the closest-peer window (capacity 2)
        ctx.nearest.add(PeerId::new(vec![0x01]));
        ctx.nearest.add(PeerId::new(vec![0x02]));

        // Enqueue directly, bypassing add_peer_to_query's own pruning
        let far = PeerId::new(vec![0x80]);
        ctx.pending.increment(1);
        ctx.backlog.push(ctx.metric.distance_to(&far), far.clone()).unwrap();

        let internal = Shutdown::new();
        let queue = DialQueue::spawn(&ctx, internal.to_signal());
        wait_for_pending(&ctx, 0).await;
        assert!(!ctx.failed.contains(&far));

        ctx.backlog.close();
        queue.join().await;
    }
}

