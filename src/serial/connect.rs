// Copyright 2026 Printlink Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Outbound-connect worker.
//!
//! One task per connection attempt. It runs straight through: the
//! handshake either succeeds or fails, and the result is reported to the
//! manager. Cancellation aborts the task, which drops (and thereby closes)
//! any in-flight socket handle; no cancellation flag is polled during the
//! blocking handshake.

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::manager::WorkerEvent;
use super::transport::{Connector, Peer};

/// Handle to an in-flight connection attempt.
pub(crate) struct ConnectHandle {
    generation: u64,
    task: JoinHandle<()>,
}

impl ConnectHandle {
    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    /// Abort the attempt. Safe to call after the handshake completed; the
    /// manager discards reports from superseded generations.
    pub(crate) fn cancel(&self) {
        self.task.abort();
    }
}

/// Spawn a worker attempting to open a socket to `peer`.
pub(crate) fn spawn(
    connector: Arc<dyn Connector>,
    peer: Peer,
    generation: u64,
    reports: mpsc::UnboundedSender<WorkerEvent>,
) -> ConnectHandle {
    let task = tokio::spawn(async move {
        debug!("connect worker started for {}", peer.address);

        let mut socket = match connector.socket(&peer) {
            Ok(socket) => socket,
            Err(e) => {
                warn!("failed to create socket for {}: {}", peer.address, e);
                let _ = reports.send(WorkerEvent::HandshakeFailed { generation });
                return;
            }
        };

        match socket.connect().await {
            Ok(()) => {
                let _ = reports.send(WorkerEvent::HandshakeSucceeded {
                    generation,
                    socket,
                    peer,
                });
            }
            Err(e) => {
                warn!("handshake with {} failed: {}", peer.address, e);
                if let Err(e) = socket.close().await {
                    warn!("closing socket after failed handshake: {}", e);
                }
                let _ = reports.send(WorkerEvent::HandshakeFailed { generation });
            }
        }
    });

    ConnectHandle { generation, task }
}
