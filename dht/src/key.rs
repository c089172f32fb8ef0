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

//! Target keys and the XOR distance metric.
//!
//! All distance computations operate on fixed-length hashes of the raw identifiers. Because the
//! XOR metric is unidirectional, two peers are at the same distance from a target if and only if
//! they hash identically, so [`Distance`] doubles as a unique ordering key for a fixed target.

use std::{cmp::Ordering, fmt};

use blake2::Blake2b;
use digest::{consts::U32, Digest};

use crate::peer::PeerId;

/// Length in bytes of the fixed hash that keys and peer IDs are mapped onto before comparison.
pub const KEY_HASH_LEN: usize = 32;

/// Hashes an opaque identifier onto the fixed-length key space.
pub type KeyHasherFn = fn(&[u8]) -> [u8; KEY_HASH_LEN];

/// The default key hasher.
pub fn blake2b_256(data: &[u8]) -> [u8; KEY_HASH_LEN] {
    let mut hasher = Blake2b::<U32>::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// An opaque lookup target.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Key(Vec<u8>);

impl Key {
    pub fn new<T: Into<Vec<u8>>>(bytes: T) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<&[u8]> for Key {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", data_encoding::HEXLOWER.encode(&self.0))
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({})", self)
    }
}

/// XOR distance between two hashed identifiers, ordered as an unsigned big-endian integer.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Distance([u8; KEY_HASH_LEN]);

impl Distance {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Distance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Distance({})", data_encoding::HEXLOWER.encode(&self.0))
    }
}

/// Precomputed hash of a lookup target together with the hasher, providing the "closer to the
/// target" total order over peer IDs.
#[derive(Clone, Copy)]
pub struct XorMetric {
    target: [u8; KEY_HASH_LEN],
    hasher: KeyHasherFn,
}

impl XorMetric {
    pub fn new(key: &Key, hasher: KeyHasherFn) -> Self {
        Self {
            target: (hasher)(key.as_bytes()),
            hasher,
        }
    }

    /// XOR distance from `peer` to the target.
    pub fn distance_to(&self, peer: &PeerId) -> Distance {
        let hash = (self.hasher)(peer.as_bytes());
        let mut out = [0u8; KEY_HASH_LEN];
        for (i, b) in out.iter_mut().enumerate() {
            *b = hash[i] ^ self.target[i];
        }
        Distance(out)
    }

    /// Orders two peers by closeness to the target.
    pub fn cmp_distance(&self, a: &PeerId, b: &PeerId) -> Ordering {
        self.distance_to(a).cmp(&self.distance_to(b))
    }

    /// Sorts peers ascending by distance to the target (closest first).
    pub fn sort_closest_first(&self, peers: &mut [PeerId]) {
        peers.sort_by(|a, b| self.cmp_distance(a, b));
    }
}

impl fmt::Debug for XorMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "XorMetric({})", data_encoding::HEXLOWER.encode(&self.target))
    }
}
