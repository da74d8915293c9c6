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

//! Transport abstraction consumed by the serial link.

use async_trait::async_trait;
use std::io;
use tokio::io::{AsyncRead, AsyncWrite};

/// Boxed read half of a transport socket.
pub type BoxReader = Box<dyn AsyncRead + Send + Unpin>;

/// Boxed write half of a transport socket.
pub type BoxWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Identity of a remote device, as resolved by the caller.
///
/// The link never interprets the address; it is passed through to the
/// connector. The display name is reported back to the observer once a
/// connection is established.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Peer {
    pub address: String,
    pub name: String,
}

impl Peer {
    pub fn new(address: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            name: name.into(),
        }
    }
}

/// A bidirectional byte-stream connection to a remote peer.
///
/// Sockets are created unconnected by a [`Connector`]; `connect` resolves
/// only once the handshake has succeeded or failed.
#[async_trait]
pub trait TransportSocket: Send {
    /// Establish the connection. Blocks the calling task until the
    /// underlying transport accepts or rejects the handshake.
    async fn connect(&mut self) -> io::Result<()>;

    /// Close the socket. Closing an unopened or already-closed socket is a
    /// no-op.
    async fn close(&mut self) -> io::Result<()>;

    /// Split a connected socket into its read and write halves. Fails with
    /// `NotConnected` if `connect` has not succeeded.
    fn into_split(self: Box<Self>) -> io::Result<(BoxReader, BoxWriter)>;
}

/// Factory producing unconnected sockets for a peer.
pub trait Connector: Send + Sync {
    fn socket(&self, peer: &Peer) -> io::Result<Box<dyn TransportSocket>>;
}
