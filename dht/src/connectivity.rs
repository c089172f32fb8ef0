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

//! The seam between the lookup engine and the host's network stack.

use std::time::Duration;

use async_trait::async_trait;
use sift_shutdown::ShutdownSignal;

use crate::peer::{PeerId, PeerInfo};

/// Connection state of a peer as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connectedness {
    Connected,
    NotConnected,
}

#[derive(Debug, thiserror::Error)]
pub enum DialError {
    #[error("Failed to establish a connection: {details}")]
    ConnectFailed { details: String },
    #[error("Dial timed out after {timeout:.2?}")]
    Timeout { timeout: Duration },
    #[error("No known addresses for peer")]
    NoAddresses,
    #[error("Dial was cancelled")]
    Cancelled,
}

/// Host network operations consumed by the engine. Implementations must be cancellation-aware:
/// `connect` should abandon the attempt when the given signal fires.
#[async_trait]
pub trait Connectivity: Send + Sync {
    fn connectedness(&self, peer_id: &PeerId) -> Connectedness;

    async fn connect(&self, signal: ShutdownSignal, peer: &PeerInfo) -> Result<(), DialError>;
}
