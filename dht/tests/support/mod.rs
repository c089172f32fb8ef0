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

//! A deterministic scripted network for lookup tests.
//!
//! Peer IDs are single bytes and the key space uses an identity hash, so the XOR distance of a
//! peer to the target can be read straight off the test data.

use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use sift_dht::{
    key::KEY_HASH_LEN,
    lookup::{FinishFuture, QueryFuture},
    Connectedness,
    Connectivity,
    DialError,
    FinishFn,
    Key,
    Lookup,
    LookupConfig,
    MemoryPeerStore,
    PeerId,
    PeerInfo,
    QueryFn,
    QueryOutcome,
};
use sift_shutdown::ShutdownSignal;
use tokio::sync::mpsc;

pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Maps an id onto the key space unchanged so distances equal the raw byte values.
pub fn identity_hasher(data: &[u8]) -> [u8; KEY_HASH_LEN] {
    let mut out = [0u8; KEY_HASH_LEN];
    let n = data.len().min(KEY_HASH_LEN);
    out[..n].copy_from_slice(&data[..n]);
    out
}

pub fn test_config(num_results: usize) -> LookupConfig {
    LookupConfig {
        num_results,
        key_hasher: identity_hasher,
        dial_timeout: Duration::from_secs(1),
        ..Default::default()
    }
}

pub fn peer(b: u8) -> PeerId {
    PeerId::new(vec![b])
}

pub fn peers(bytes: &[u8]) -> Vec<PeerId> {
    bytes.iter().map(|b| peer(*b)).collect()
}

pub fn target_key(b: u8) -> Key {
    Key::new(vec![b])
}

#[derive(Default)]
struct MockNetState {
    dial_failures: Mutex<HashSet<PeerId>>,
    stalled_dials: Mutex<HashSet<PeerId>>,
    query_failures: Mutex<HashSet<PeerId>>,
    stalls: Mutex<HashSet<PeerId>>,
    referrals: Mutex<HashMap<PeerId, Vec<PeerInfo>>>,
    values: Mutex<HashMap<PeerId, bytes::Bytes>>,
    query_counts: Mutex<HashMap<PeerId, usize>>,
    dial_counts: Mutex<HashMap<PeerId, usize>>,
    stall_tx: Mutex<Option<mpsc::Sender<PeerId>>>,
}

/// Scripted connectivity and query behaviour, shared between the `Connectivity` seam and the
/// query function handed to the lookup.
#[derive(Clone, Default)]
pub struct MockNet {
    state: Arc<MockNetState>,
}

impl MockNet {
    pub fn new() -> Self {
        Default::default()
    }

    /// Dials to this peer fail.
    pub fn fail_dial(&self, peer: PeerId) -> &Self {
        self.state.dial_failures.lock().unwrap().insert(peer);
        self
    }

    /// Dials to this peer hang until the dial timeout expires.
    pub fn stall_dial(&self, peer: PeerId) -> &Self {
        self.state.stalled_dials.lock().unwrap().insert(peer);
        self
    }

    /// Queries to this peer fail (after a successful dial).
    pub fn fail_query(&self, peer: PeerId) -> &Self {
        self.state.query_failures.lock().unwrap().insert(peer);
        self
    }

    /// The peer terminates the query early with a value instead of referrals.
    pub fn value_response(&self, peer: PeerId, value: bytes::Bytes) -> &Self {
        self.state.values.lock().unwrap().insert(peer, value);
        self
    }

    /// The peer answers the query with these referrals.
    pub fn referrals(&self, peer: PeerId, closer: Vec<PeerId>) -> &Self {
        let infos = closer.into_iter().map(PeerInfo::from_peer_id).collect();
        self.state.referrals.lock().unwrap().insert(peer, infos);
        self
    }

    /// Queries to this peer announce themselves on the given channel and then hang until the
    /// query's cancellation signal fires.
    pub fn stall_query(&self, peer: PeerId, entered_tx: mpsc::Sender<PeerId>) -> &Self {
        self.state.stalls.lock().unwrap().insert(peer);
        *self.state.stall_tx.lock().unwrap() = Some(entered_tx);
        self
    }

    pub fn query_count(&self, peer: &PeerId) -> usize {
        self.state.query_counts.lock().unwrap().get(peer).copied().unwrap_or(0)
    }

    pub fn dial_count(&self, peer: &PeerId) -> usize {
        self.state.dial_counts.lock().unwrap().get(peer).copied().unwrap_or(0)
    }

    pub fn connectivity(&self) -> Arc<dyn Connectivity> {
        Arc::new(self.clone())
    }

    pub fn query_fn(&self) -> QueryFn {
        let state = self.state.clone();
        Arc::new(move |signal, peer| -> QueryFuture {
            let state = state.clone();
            Box::pin(async move {
                *state.query_counts.lock().unwrap().entry(peer.clone()).or_insert(0) += 1;
                if state.stalls.lock().unwrap().contains(&peer) {
                    let entered_tx = state.stall_tx.lock().unwrap().clone();
                    if let Some(tx) = entered_tx {
                        let _ = tx.send(peer.clone()).await;
                    }
                    signal.wait().await;
                    return Err(anyhow::anyhow!("query to {} interrupted by shutdown", peer));
                }
                if state.query_failures.lock().unwrap().contains(&peer) {
                    return Err(anyhow::anyhow!("scripted query failure for {}", peer));
                }
                if let Some(value) = state.values.lock().unwrap().get(&peer) {
                    return Ok(QueryOutcome::Value(value.clone()));
                }
                let referrals = state.referrals.lock().unwrap().get(&peer).cloned().unwrap_or_default();
                Ok(QueryOutcome::CloserPeers(referrals))
            })
        })
    }
}

#[async_trait]
impl Connectivity for MockNet {
    fn connectedness(&self, _peer_id: &PeerId) -> Connectedness {
        // Force every peer through the dial path
        Connectedness::NotConnected
    }

    async fn connect(&self, signal: ShutdownSignal, peer: &PeerInfo) -> Result<(), DialError> {
        *self
            .state
            .dial_counts
            .lock()
            .unwrap()
            .entry(peer.peer_id.clone())
            .or_insert(0) += 1;
        if self.state.stalled_dials.lock().unwrap().contains(&peer.peer_id) {
            signal.wait().await;
            return Err(DialError::Cancelled);
        }
        if self.state.dial_failures.lock().unwrap().contains(&peer.peer_id) {
            return Err(DialError::ConnectFailed {
                details: format!("scripted dial failure for {}", peer.peer_id),
            });
        }
        Ok(())
    }
}

/// A finish action that fails for the given peers and succeeds for everyone else.
pub fn scripted_action(fail_for: HashSet<PeerId>) -> FinishFn {
    Arc::new(move |_signal, peer| -> FinishFuture {
        let fail = fail_for.contains(&peer);
        Box::pin(async move {
            if fail {
                Err(anyhow::anyhow!("scripted action failure for {}", peer))
            } else {
                Ok(())
            }
        })
    })
}

pub fn build_lookup(net: &MockNet, config: LookupConfig, key: Key, local: PeerId, signal: ShutdownSignal) -> Lookup {
    Lookup::new(
        config,
        key,
        local,
        net.connectivity(),
        Arc::new(MemoryPeerStore::new()),
        net.query_fn(),
        signal,
    )
}
