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

use std::{
    cmp::Reverse,
    collections::BinaryHeap,
    sync::Mutex,
};

use tokio::sync::Notify;

use crate::{key::Distance, peer::PeerId};

/// Peer was not enqueued because the queue has been closed.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct QueueClosed;

/// The backlog of peers awaiting a dial, ordered closest-to-the-target first.
///
/// Producers never block: a push either lands or, after [`close`](Self::close), reports
/// [`QueueClosed`] so the caller can drop the peer. Consumers drain remaining entries after a
/// close and then receive `None`.
#[derive(Debug)]
pub(crate) struct XorQueue {
    state: Mutex<State>,
    notify: Notify,
}

#[derive(Debug)]
struct State {
    heap: BinaryHeap<Reverse<(Distance, PeerId)>>,
    closed: bool,
}

impl XorQueue {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                heap: BinaryHeap::new(),
                closed: false,
            }),
            notify: Notify::new(),
        }
    }

    pub fn push(&self, distance: Distance, peer: PeerId) -> Result<(), QueueClosed> {
        {
            let mut state = self.state.lock().expect("dial backlog lock poisoned");
            if state.closed {
                return Err(QueueClosed);
            }
            state.heap.push(Reverse((distance, peer)));
        }
        self.notify.notify_one();
        Ok(())
    }

    /// Removes and returns the closest queued peer, waiting for one to arrive if the queue is
    /// empty. Returns `None` once the queue is closed and drained.
    pub async fn pop(&self) -> Option<PeerId> {
        loop {
            let notified = self.notify.notified();
            {
                let mut state = self.state.lock().expect("dial backlog lock poisoned");
                if let Some(Reverse((_, peer))) = state.heap.pop() {
                    return Some(peer);
                }
                if state.closed {
                    return None;
                }
            }
            notified.await;
        }
    }

    pub fn close(&self) {
        self.state.lock().expect("dial backlog lock poisoned").closed = true;
        self.notify.notify_waiters();
    }
}
