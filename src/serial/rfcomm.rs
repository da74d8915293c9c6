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

//! Bluetooth RFCOMM transport backed by BlueZ.

use anyhow::Result;
use async_trait::async_trait;
use bluer::rfcomm::{SocketAddr, Stream};
use bluer::Address;
use std::io;
use tracing::info;

use super::transport::{BoxReader, BoxWriter, Connector, Peer, TransportSocket};

/// RFCOMM channel used by the Serial Port Profile on the printers we target.
pub const DEFAULT_CHANNEL: u8 = 1;

/// Ensure the default Bluetooth adapter is powered and carries our alias.
///
/// Outbound RFCOMM connections fail with a powered-off adapter, so the
/// application calls this once at startup.
pub async fn prepare_adapter(alias: &str) -> Result<()> {
    let session = bluer::Session::new().await?;
    let adapter = session.default_adapter().await?;
    info!("Using Bluetooth adapter: {}", adapter.name());

    if !adapter.is_powered().await? {
        info!("Powering on Bluetooth adapter...");
        adapter.set_powered(true).await?;
    }

    adapter.set_alias(alias.to_string()).await?;
    info!("Bluetooth alias set to: {}", alias);
    Ok(())
}

/// Connector producing RFCOMM sockets on a fixed channel.
pub struct RfcommConnector {
    channel: u8,
}

impl RfcommConnector {
    pub fn new(channel: u8) -> Self {
        Self { channel }
    }
}

impl Default for RfcommConnector {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL)
    }
}

impl Connector for RfcommConnector {
    fn socket(&self, peer: &Peer) -> io::Result<Box<dyn TransportSocket>> {
        let address: Address = peer
            .address
            .parse()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, format!("{e}")))?;
        Ok(Box::new(RfcommSocket {
            addr: SocketAddr::new(address, self.channel),
            stream: None,
        }))
    }
}

struct RfcommSocket {
    addr: SocketAddr,
    stream: Option<Stream>,
}

#[async_trait]
impl TransportSocket for RfcommSocket {
    async fn connect(&mut self) -> io::Result<()> {
        let stream = Stream::connect(self.addr).await.map_err(io::Error::other)?;
        info!("RFCOMM connection established to {}", self.addr.addr);
        self.stream = Some(stream);
        Ok(())
    }

    async fn close(&mut self) -> io::Result<()> {
        // Dropping the stream closes the underlying socket.
        self.stream.take();
        Ok(())
    }

    fn into_split(self: Box<Self>) -> io::Result<(BoxReader, BoxWriter)> {
        match self.stream {
            Some(stream) => {
                let (reader, writer) = stream.into_split();
                Ok((Box::new(reader), Box::new(writer)))
            }
            None => Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "socket is not connected",
            )),
        }
    }
}
