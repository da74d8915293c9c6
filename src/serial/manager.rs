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

//! Connection manager and state machine for the serial link.

use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::connect::{self, ConnectHandle};
use super::session::{self, SessionHandle};
use super::transport::{Connector, Peer, TransportSocket};

/// Notice reported when an outbound handshake fails.
pub const NOTICE_CONNECT_FAILED: &str = "Unable to connect device";

/// Notice reported when a live connection drops.
pub const NOTICE_CONNECTION_LOST: &str = "Device connection was lost";

/// Current state of the serial link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// Nothing active.
    None,
    /// Waiting for an inbound connection. Reserved for a future
    /// accept-mode; no outbound flow transitions into it.
    Listening,
    /// An outbound handshake is in flight.
    Connecting,
    /// A live session exists.
    Connected,
}

impl LinkState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkState::None => "None",
            LinkState::Listening => "Listening",
            LinkState::Connecting => "Connecting",
            LinkState::Connected => "Connected",
        }
    }
}

/// Events emitted by the link to its observer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    /// The link state changed.
    StateChanged(LinkState),
    /// A connection was established; carries the peer's display name.
    DeviceIdentified { name: String },
    /// Bytes arrived from the remote device.
    DataReceived(Vec<u8>),
    /// Bytes were delivered to the remote device.
    DataWritten(Vec<u8>),
    /// Human-readable status or failure notice.
    Notice(String),
}

/// Reports from worker tasks back to the manager.
///
/// Each report carries the generation of the worker that produced it;
/// reports from superseded workers are discarded.
pub(crate) enum WorkerEvent {
    HandshakeSucceeded {
        generation: u64,
        socket: Box<dyn TransportSocket>,
        peer: Peer,
    },
    HandshakeFailed {
        generation: u64,
    },
    StreamFailed {
        generation: u64,
    },
}

struct Inner {
    state: LinkState,
    /// Bumped each time a worker is spawned.
    generation: u64,
    connect: Option<ConnectHandle>,
    session: Option<SessionHandle>,
}

/// Manager for a single logical serial connection.
///
/// Owns the state machine and supervises at most one connect worker and at
/// most one session worker at a time. All state transitions and worker
/// substitutions happen under one internal lock; the potentially blocking
/// write in [`SerialLink::send`] runs outside it.
pub struct SerialLink {
    inner: Arc<Mutex<Inner>>,
    connector: Arc<dyn Connector>,
    events: mpsc::UnboundedSender<LinkEvent>,
    worker_tx: mpsc::UnboundedSender<WorkerEvent>,
}

impl SerialLink {
    /// Create a new link reporting to `events`.
    pub fn new(connector: Arc<dyn Connector>, events: mpsc::UnboundedSender<LinkEvent>) -> Self {
        let inner = Arc::new(Mutex::new(Inner {
            state: LinkState::None,
            generation: 0,
            connect: None,
            session: None,
        }));

        let (worker_tx, worker_rx) = mpsc::unbounded_channel();
        // The supervisor holds only a weak sender so it exits once the link
        // and all of its workers are gone.
        tokio::spawn(Self::supervise(
            inner.clone(),
            events.clone(),
            worker_tx.downgrade(),
            worker_rx,
        ));

        Self {
            inner,
            connector,
            events,
            worker_tx,
        }
    }

    /// Return the current link state.
    pub fn state(&self) -> LinkState {
        self.inner.lock().state
    }

    /// Reset the link: cancel any in-flight handshake or live session and
    /// return to [`LinkState::None`]. Idempotent.
    pub fn start(&self) {
        debug!("start");
        let mut inner = self.inner.lock();
        if let Some(worker) = inner.connect.take() {
            worker.cancel();
        }
        if let Some(session) = inner.session.take() {
            session.cancel();
        }
        Self::set_state(&mut inner, &self.events, LinkState::None);
    }

    /// Begin an outbound connection attempt to `peer`.
    ///
    /// Supersedes any handshake already in flight and tears down any live
    /// session first.
    pub fn connect(&self, peer: Peer) {
        debug!("connect to: {}", peer.address);
        let mut inner = self.inner.lock();

        // Cancel any worker attempting to make a connection
        if inner.state == LinkState::Connecting {
            if let Some(worker) = inner.connect.take() {
                worker.cancel();
            }
        }

        // Cancel any worker currently running a connection
        if let Some(session) = inner.session.take() {
            session.cancel();
        }

        inner.generation += 1;
        inner.connect = Some(connect::spawn(
            self.connector.clone(),
            peer,
            inner.generation,
            self.worker_tx.clone(),
        ));
        Self::set_state(&mut inner, &self.events, LinkState::Connecting);
    }

    /// Forward `bytes` to the live session.
    ///
    /// Fire-and-forget: if the link is not connected the request is dropped
    /// and `false` is returned. A write failure on a live session is logged
    /// by the session worker and does not tear the session down; `true`
    /// means only that the write was attempted.
    pub async fn send(&self, bytes: &[u8]) -> bool {
        // Grab the writer under the lock, write outside it, so a stalled
        // write cannot block state queries or a concurrent connect.
        let writer = {
            let inner = self.inner.lock();
            if inner.state != LinkState::Connected {
                return false;
            }
            match &inner.session {
                Some(session) => session.writer(),
                None => return false,
            }
        };
        session::write(writer, bytes, &self.events).await;
        true
    }

    /// Tear everything down and return to [`LinkState::None`].
    pub fn stop(&self) {
        debug!("stop");
        let mut inner = self.inner.lock();
        if let Some(worker) = inner.connect.take() {
            worker.cancel();
        }
        if let Some(session) = inner.session.take() {
            session.cancel();
        }
        Self::set_state(&mut inner, &self.events, LinkState::None);
    }

    fn set_state(
        inner: &mut Inner,
        events: &mpsc::UnboundedSender<LinkEvent>,
        state: LinkState,
    ) {
        debug!("state {} -> {}", inner.state.as_str(), state.as_str());
        inner.state = state;
        let _ = events.send(LinkEvent::StateChanged(state));
    }

    /// Apply worker reports to the state machine.
    ///
    /// Runs for the lifetime of the link; exits once the link and all of
    /// its workers are gone.
    async fn supervise(
        inner: Arc<Mutex<Inner>>,
        events: mpsc::UnboundedSender<LinkEvent>,
        worker_tx: mpsc::WeakUnboundedSender<WorkerEvent>,
        mut worker_rx: mpsc::UnboundedReceiver<WorkerEvent>,
    ) {
        while let Some(event) = worker_rx.recv().await {
            match event {
                WorkerEvent::HandshakeSucceeded {
                    generation,
                    socket,
                    peer,
                } => {
                    let mut inner = inner.lock();
                    if inner.connect.as_ref().map(|w| w.generation()) != Some(generation) {
                        debug!("discarding handshake result from superseded worker");
                        // Dropping the socket closes its handle.
                        continue;
                    }
                    inner.connect = None;

                    // A prior session should already be gone, but never let
                    // two sessions coexist.
                    if let Some(session) = inner.session.take() {
                        session.cancel();
                    }

                    let Some(reports) = worker_tx.upgrade() else {
                        // The link itself is gone; the socket drops closed.
                        continue;
                    };

                    inner.generation += 1;
                    match session::spawn(socket, inner.generation, reports, events.clone()) {
                        Ok(session) => {
                            inner.session = Some(session);
                            let _ = events.send(LinkEvent::DeviceIdentified {
                                name: peer.name.clone(),
                            });
                            Self::set_state(&mut inner, &events, LinkState::Connected);
                        }
                        Err(e) => {
                            warn!("failed to obtain socket streams: {}", e);
                            Self::set_state(&mut inner, &events, LinkState::None);
                            let _ =
                                events.send(LinkEvent::Notice(NOTICE_CONNECT_FAILED.to_string()));
                        }
                    }
                }
                WorkerEvent::HandshakeFailed { generation } => {
                    let mut inner = inner.lock();
                    if inner.connect.as_ref().map(|w| w.generation()) != Some(generation) {
                        continue;
                    }
                    inner.connect = None;
                    Self::set_state(&mut inner, &events, LinkState::None);
                    let _ = events.send(LinkEvent::Notice(NOTICE_CONNECT_FAILED.to_string()));
                }
                WorkerEvent::StreamFailed { generation } => {
                    let mut inner = inner.lock();
                    if inner.session.as_ref().map(|s| s.generation()) != Some(generation) {
                        continue;
                    }
                    inner.session = None;
                    Self::set_state(&mut inner, &events, LinkState::None);
                    let _ = events.send(LinkEvent::Notice(NOTICE_CONNECTION_LOST.to_string()));
                }
            }
        }
    }
}

/// Dropping the link stops it. Like an explicit [`SerialLink::stop`] this
/// always notifies, so a caller that already stopped the link sees one
/// final redundant `StateChanged(None)`; transitions re-notify even when
/// the state does not change, matching [`SerialLink::start`]'s idempotent
/// re-notification.
impl Drop for SerialLink {
    fn drop(&mut self) {
        self.stop();
    }
}
