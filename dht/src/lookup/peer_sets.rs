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

use std::{collections::HashSet, sync::RwLock};

use crate::peer::PeerId;

/// A monotone, internally-synchronized set of peer IDs. Entries are only ever added during a
/// lookup, never removed.
#[derive(Debug, Default)]
pub(crate) struct PeerSet {
    inner: RwLock<HashSet<PeerId>>,
}

impl PeerSet {
    pub fn new() -> Self {
        Default::default()
    }

    /// Inserts the peer, returning true iff it was not already a member.
    pub fn try_add(&self, peer: &PeerId) -> bool {
        self.inner
            .write()
            .expect("peer set lock poisoned")
            .insert(peer.clone())
    }

    pub fn contains(&self, peer: &PeerId) -> bool {
        self.inner.read().expect("peer set lock poisoned").contains(peer)
    }

    pub fn len(&self) -> usize {
        self.inner.read().expect("peer set lock poisoned").len()
    }

    pub fn snapshot(&self) -> HashSet<PeerId> {
        self.inner.read().expect("peer set lock poisoned").clone()
    }
}
