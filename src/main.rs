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

//! Printlink command-line bridge.
//!
//! Connects to the configured printer and forwards stdin lines to it as
//! raw bytes. Any printer command-language formatting or text encoding is
//! up to whatever feeds stdin.

use anyhow::Result;
use std::sync::Arc;
use tokio::io::AsyncBufReadExt;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use printlink::config::Config;
use printlink::serial::{self, LinkEvent, Peer, RfcommConnector, SerialLink};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("printlink=info".parse().unwrap()),
        )
        .init();

    info!("Starting Printlink v{}...", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = Config::load()?;
    info!("Configuration loaded");

    // Bring up the local adapter
    serial::prepare_adapter(&config.bluetooth.adapter_alias).await?;

    // Create the serial link
    let (event_tx, mut event_rx) = tokio::sync::mpsc::unbounded_channel::<LinkEvent>();
    let connector = Arc::new(RfcommConnector::new(config.bluetooth.channel));
    let link = SerialLink::new(connector, event_tx);

    // Log observer events as they arrive
    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            match event {
                LinkEvent::StateChanged(state) => info!("Link state: {}", state.as_str()),
                LinkEvent::DeviceIdentified { name } => info!("Connected to: {}", name),
                LinkEvent::DataReceived(bytes) => {
                    info!("Received {} bytes: {:?}", bytes.len(), bytes)
                }
                LinkEvent::DataWritten(bytes) => info!("Delivered {} bytes", bytes.len()),
                LinkEvent::Notice(message) => warn!("{}", message),
            }
        }
    });

    link.connect(Peer::new(&config.printer.address, &config.printer.name));
    info!(
        "Connecting to {} ({})...",
        config.printer.name, config.printer.address
    );

    // Forward stdin lines until EOF or shutdown
    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line? {
                    Some(line) => {
                        let mut bytes = line.into_bytes();
                        bytes.extend_from_slice(b"\r\n");
                        if !link.send(&bytes).await {
                            warn!("Not connected, line dropped");
                        }
                    }
                    None => {
                        info!("stdin closed");
                        break;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    link.stop();
    info!("Printlink stopped");
    Ok(())
}
