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

use std::{collections::BTreeMap, sync::Mutex};

use crate::{
    key::{Distance, XorMetric},
    peer::PeerId,
};

/// The window of the closest successfully-queried peers, bounded by the lookup's `alpha`.
///
/// `check` is the traversal's pruning gate: a peer that can no longer displace a member is not
/// worth dialing or querying. Members are keyed by distance, which uniquely identifies a peer for
/// a fixed target under the XOR metric.
#[derive(Debug)]
pub(crate) struct NearestSet {
    metric: XorMetric,
    capacity: usize,
    members: Mutex<BTreeMap<Distance, PeerId>>,
}

impl NearestSet {
    pub fn new(metric: XorMetric, capacity: usize) -> Self {
        Self {
            metric,
            capacity,
            members: Mutex::new(BTreeMap::new()),
        }
    }

    /// Returns true iff the peer is already a member or would be admitted by [`add`](Self::add):
    /// the window is not full, or the peer is closer than the farthest member.
    pub fn check(&self, peer: &PeerId) -> bool {
        let distance = self.metric.distance_to(peer);
        let members = self.members.lock().expect("nearest set lock poisoned");
        if members.contains_key(&distance) {
            return true;
        }
        if members.len() < self.capacity {
            return true;
        }
        match members.keys().next_back() {
            Some(farthest) => distance < *farthest,
            None => true,
        }
    }

    /// Inserts the peer, evicting the farthest member if the window would exceed capacity.
    pub fn add(&self, peer: PeerId) {
        let distance = self.metric.distance_to(&peer);
        let mut members = self.members.lock().expect("nearest set lock poisoned");
        members.insert(distance, peer);
        while members.len() > self.capacity {
            let farthest = *members.keys().next_back().expect("nonempty by len check");
            members.remove(&farthest);
        }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.members.lock().expect("nearest set lock poisoned").len()
    }

    #[cfg(test)]
    pub fn members_closest_first(&self) -> Vec<PeerId> {
        self.members
            .lock()
            .expect("nearest set lock poisoned")
            .values()
            .cloned()
            .collect()
    }
}
