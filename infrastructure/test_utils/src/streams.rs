// Copyright 2019, The Sift Project
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

use std::time::Duration;

use tokio::{
    sync::{broadcast, mpsc},
    time,
};

/// Receive the next item from an mpsc channel, panicking if nothing arrives within `timeout`.
pub async fn recv_timeout<T>(rx: &mut mpsc::Receiver<T>, timeout: Duration) -> Option<T> {
    time::timeout(timeout, rx.recv())
        .await
        .expect("Timeout waiting for recv")
}

/// Collect every item published on a broadcast channel until it closes, panicking if the channel
/// stays silent for longer than `timeout`. Lagged gaps are skipped.
pub async fn drain_broadcast<T: Clone>(rx: &mut broadcast::Receiver<T>, timeout: Duration) -> Vec<T> {
    let mut items = Vec::new();
    loop {
        match time::timeout(timeout, rx.recv())
            .await
            .unwrap_or_else(|_| panic!("Timeout waiting for broadcast. Got {} item(s).", items.len()))
        {
            Ok(item) => items.push(item),
            Err(broadcast::error::RecvError::Lagged(_)) => continue,
            Err(broadcast::error::RecvError::Closed) => break items,
        }
    }
}

/// Wait until `predicate` returns `Some` for an item published on a broadcast channel, panicking
/// if the channel closes or stays silent for longer than `timeout`.
pub async fn assert_in_broadcast<T, P, R>(rx: &mut broadcast::Receiver<T>, mut predicate: P, timeout: Duration) -> R
where
    T: Clone,
    P: FnMut(T) -> Option<R>,
{
    loop {
        match time::timeout(timeout, rx.recv())
            .await
            .expect("Timeout before predicate matched")
        {
            Ok(item) => {
                if let Some(r) = predicate(item) {
                    break r;
                }
            },
            Err(broadcast::error::RecvError::Lagged(_)) => continue,
            Err(broadcast::error::RecvError::Closed) => panic!("Broadcast closed before predicate matched"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn drains_until_closed() {
        let (tx, mut rx) = broadcast::channel(8);
        tx.send(1u32).unwrap();
        tx.send(2).unwrap();
        drop(tx);
        let items = drain_broadcast(&mut rx, Duration::from_secs(1)).await;
        assert_eq!(items, [1, 2]);
    }

    #[tokio::test]
    async fn recv_timeout_returns_item() {
        let (tx, mut rx) = mpsc::channel(1);
        tx.send("it").await.unwrap();
        assert_eq!(recv_timeout(&mut rx, Duration::from_secs(1)).await, Some("it"));
        drop(tx);
        assert_eq!(recv_timeout(&mut rx, Duration::from_secs(1)).await, None);
    }
}
