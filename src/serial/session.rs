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

//! Connected-session worker.
//!
//! Owns the live socket for the duration of a connection. A read loop
//! delivers inbound bytes to the observer; writes go through a shared
//! writer handle so the manager can forward data without holding its own
//! lock. A read error (or EOF, treated identically) is the only path by
//! which a session ends itself; a write error is logged and the session
//! stays up.

use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use super::manager::{LinkEvent, WorkerEvent};
use super::transport::{BoxReader, BoxWriter, TransportSocket};

/// Size of the inbound read buffer.
const READ_BUFFER_SIZE: usize = 1024;

/// Handle to a live session.
pub(crate) struct SessionHandle {
    generation: u64,
    writer: Arc<tokio::sync::Mutex<BoxWriter>>,
    task: JoinHandle<()>,
}

impl SessionHandle {
    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    /// Shared writer for use outside the manager's lock.
    pub(crate) fn writer(&self) -> Arc<tokio::sync::Mutex<BoxWriter>> {
        self.writer.clone()
    }

    /// Abort the read loop, dropping the socket halves.
    ///
    /// Safe to call with a read in flight. A write racing this cancel may
    /// win or lose the race; which one lands is deliberately left
    /// unspecified.
    pub(crate) fn cancel(&self) {
        self.task.abort();
    }
}

/// Split `socket` and spawn the session's read loop.
///
/// Fails if the socket cannot produce its streams, in which case no
/// session exists and the caller treats the connection as never
/// established.
pub(crate) fn spawn(
    socket: Box<dyn TransportSocket>,
    generation: u64,
    reports: mpsc::UnboundedSender<WorkerEvent>,
    events: mpsc::UnboundedSender<LinkEvent>,
) -> std::io::Result<SessionHandle> {
    let (reader, writer) = socket.into_split()?;
    let task = tokio::spawn(read_loop(reader, generation, reports, events));
    Ok(SessionHandle {
        generation,
        writer: Arc::new(tokio::sync::Mutex::new(writer)),
        task,
    })
}

/// Deliver inbound bytes until the stream fails.
///
/// EOF and read errors are both reported as a lost connection; there is no
/// distinction between an orderly remote close and a failure.
async fn read_loop(
    mut reader: BoxReader,
    generation: u64,
    reports: mpsc::UnboundedSender<WorkerEvent>,
    events: mpsc::UnboundedSender<LinkEvent>,
) {
    debug!("session worker started");
    let mut buffer = vec![0u8; READ_BUFFER_SIZE];

    loop {
        match reader.read(&mut buffer).await {
            Ok(0) => {
                info!("connection closed by remote");
                let _ = reports.send(WorkerEvent::StreamFailed { generation });
                break;
            }
            Ok(n) => {
                let _ = events.send(LinkEvent::DataReceived(buffer[..n].to_vec()));
            }
            Err(e) => {
                error!("read error: {}", e);
                let _ = reports.send(WorkerEvent::StreamFailed { generation });
                break;
            }
        }
    }
}

/// Write `bytes` to the session's output stream.
///
/// On success an acknowledgement carrying the payload is emitted. On
/// failure the error is logged and nothing else happens: a transient write
/// hiccup does not tear the session down, asymmetric with the read path on
/// purpose.
pub(crate) async fn write(
    writer: Arc<tokio::sync::Mutex<BoxWriter>>,
    bytes: &[u8],
    events: &mpsc::UnboundedSender<LinkEvent>,
) {
    let mut writer = writer.lock().await;
    let result = async {
        writer.write_all(bytes).await?;
        writer.flush().await
    }
    .await;

    match result {
        Ok(()) => {
            let _ = events.send(LinkEvent::DataWritten(bytes.to_vec()));
        }
        Err(e) => {
            error!("write error: {}", e);
        }
    }
}
