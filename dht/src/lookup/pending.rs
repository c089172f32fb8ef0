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

use tokio::sync::watch;

/// Counts peers that are queued for dialing or currently being dialed/queried. The lookup
/// terminates when this returns to zero.
///
/// Every increment must be paired with exactly one decrement; an unpaired increment stalls the
/// lookup forever and an unpaired decrement terminates it early. [`guard`](Self::guard) keeps the
/// decrement on the task that owns the unit of work.
#[derive(Debug, Clone)]
pub(crate) struct PendingWork {
    count: watch::Sender<usize>,
}

impl PendingWork {
    pub fn new() -> Self {
        let (count, _) = watch::channel(0);
        Self { count }
    }

    pub fn increment(&self, n: usize) {
        self.count.send_modify(|count| *count += n);
    }

    pub fn decrement(&self, n: usize) {
        self.count.send_modify(|count| {
            debug_assert!(*count >= n, "pending work count underflow");
            *count = count.saturating_sub(n);
        });
    }

    pub fn count(&self) -> usize {
        *self.count.borrow()
    }

    /// Resolves once the count is zero.
    pub async fn done(&self) {
        let mut rx = self.count.subscribe();
        loop {
            if *rx.borrow_and_update() == 0 {
                return;
            }
            if rx.changed().await.is_err() {
                return;
            }
        }
    }

    /// Decrements by one when dropped.
    pub fn guard(&self) -> WorkGuard {
        WorkGuard { work: self.clone() }
    }
}

pub(crate) struct WorkGuard {
    work: PendingWork,
}

impl Drop for WorkGuard {
    fn drop(&mut self) {
        self.work.decrement(1);
    }
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn done_resolves_immediately_at_zero() {
        let work = PendingWork::new();
        work.done().await;
    }

    #[tokio::test]
    async fn done_waits_for_matching_decrements() {
        let work = PendingWork::new();
        work.increment(2);
        let waiter = {
            let work = work.clone();
            tokio::spawn(async move { work.done().await })
        };
        work.decrement(1);
        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());
        drop(work.guard());
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("done did not resolve")
            .unwrap();
    }

    #[tokio::test]
    async fn guard_decrements_once_on_drop() {
        let work = PendingWork::new();
        work.increment(1);
        let guard = work.guard();
        assert_eq!(work.count(), 1);
        drop(guard);
        assert_eq!(work.count(), 0);
    }
}
