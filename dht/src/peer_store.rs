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

//! Peer address book seam.
//!
//! Referral address hints discovered during a lookup are handed to the store with a short TTL so
//! the host can dial the referred peers without polluting its address book with unverified
//! entries.

use std::{
    collections::HashMap,
    sync::RwLock,
    time::{Duration, Instant},
};

use multiaddr::Multiaddr;

use crate::peer::PeerId;

/// TTL for addresses learned from referrals during a lookup.
pub const TEMP_ADDR_TTL: Duration = Duration::from_secs(2 * 60);

/// Address hint sink/source consumed by the engine.
pub trait PeerStore: Send + Sync {
    fn add_peer_addresses(&self, peer_id: &PeerId, addresses: &[Multiaddr], ttl: Duration);

    fn peer_addresses(&self, peer_id: &PeerId) -> Vec<Multiaddr>;
}

/// An in-process [`PeerStore`] with per-address expiry. Suitable for tests and embedders without
/// a persistent address book.
#[derive(Default)]
pub struct MemoryPeerStore {
    entries: RwLock<HashMap<PeerId, Vec<(Multiaddr, Instant)>>>,
}

impl MemoryPeerStore {
    pub fn new() -> Self {
        Default::default()
    }
}

impl PeerStore for MemoryPeerStore {
    fn add_peer_addresses(&self, peer_id: &PeerId, addresses: &[Multiaddr], ttl: Duration) {
        if addresses.is_empty() {
            return;
        }
        let expires_at = Instant::now() + ttl;
        let mut entries = self.entries.write().expect("peer store lock poisoned");
        let known = entries.entry(peer_id.clone()).or_default();
        for address in addresses {
            match known.iter_mut().find(|(a, _)| a == address) {
                // Refreshing an address only ever extends its lifetime
                Some((_, expiry)) => *expiry = (*expiry).max(expires_at),
                None => known.push((address.clone(), expires_at)),
            }
        }
    }

    fn peer_addresses(&self, peer_id: &PeerId) -> Vec<Multiaddr> {
        let now = Instant::now();
        let mut entries = self.entries.write().expect("peer store lock poisoned");
        match entries.get_mut(peer_id) {
            Some(known) => {
                known.retain(|(_, expiry)| *expiry > now);
                known.iter().map(|(a, _)| a.clone()).collect()
            },
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn addr(s: &str) -> Multiaddr {
        s.parse().unwrap()
    }

    #[test]
    fn stores_and_returns_addresses() {
        let store = MemoryPeerStore::new();
        let peer = PeerId::new(vec![1]);
        store.add_peer_addresses(&peer, &[addr("/ip4/127.0.0.1/tcp/9000")], TEMP_ADDR_TTL);
        assert_eq!(store.peer_addresses(&peer), vec![addr("/ip4/127.0.0.1/tcp/9000")]);
        assert!(store.peer_addresses(&PeerId::new(vec![2])).is_empty());
    }

    #[test]
    fn expired_addresses_are_pruned() {
        let store = MemoryPeerStore::new();
        let peer = PeerId::new(vec![1]);
        store.add_peer_addresses(&peer, &[addr("/ip4/127.0.0.1/tcp/9000")], Duration::from_secs(0));
        assert!(store.peer_addresses(&peer).is_empty());
    }

    #[test]
    fn duplicate_addresses_refresh_expiry() {
        let store = MemoryPeerStore::new();
        let peer = PeerId::new(vec![1]);
        let address = addr("/ip4/127.0.0.1/tcp/9000");
        store.add_peer_addresses(&peer, &[address.clone()], Duration::from_secs(1));
        store.add_peer_addresses(&peer, &[address.clone()], TEMP_ADDR_TTL);
        assert_eq!(store.peer_addresses(&peer), vec![address]);
    }
}
