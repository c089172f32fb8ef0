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

use std::fmt;

use crate::peer::PeerId;

/// Advisory events published on the lookup's event channel. Events are lossy under lag or
/// cancellation; observers must not rely on them for correctness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupEvent {
    /// A newly discovered peer entered the traversal.
    AddingPeer(PeerId),
    /// A connection to the peer is about to be attempted.
    DialingPeer(PeerId),
    /// The per-peer query function is about to be invoked.
    SendingQuery(PeerId),
    /// The peer answered the query.
    PeerResponse { peer: PeerId, num_closer: usize },
    /// The peer's dial or query failed.
    QueryError { peer: PeerId, message: String },
    /// The peer made it into the final result set.
    FinalPeer(PeerId),
}

impl fmt::Display for LookupEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use LookupEvent::*;
        match self {
            AddingPeer(peer) => write!(f, "AddingPeer({})", peer.short_str()),
            DialingPeer(peer) => write!(f, "DialingPeer({})", peer.short_str()),
            SendingQuery(peer) => write!(f, "SendingQuery({})", peer.short_str()),
            PeerResponse { peer, num_closer } => {
                write!(f, "PeerResponse({}, {} closer)", peer.short_str(), num_closer)
            },
            QueryError { peer, message } => write!(f, "QueryError({}, {})", peer.short_str(), message),
            FinalPeer(peer) => write!(f, "FinalPeer({})", peer.short_str()),
        }
    }
}
