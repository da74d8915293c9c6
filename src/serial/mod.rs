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

//! Serial link module.
//!
//! Manages a single logical serial connection to a remote printer: the
//! connection-state machine, the outbound-connect worker and the
//! connected-session worker.

mod connect;
mod manager;
mod rfcomm;
mod session;
mod transport;

pub use manager::{
    LinkEvent, LinkState, SerialLink, NOTICE_CONNECT_FAILED, NOTICE_CONNECTION_LOST,
};
pub use rfcomm::{prepare_adapter, RfcommConnector};
pub use transport::{BoxReader, BoxWriter, Connector, Peer, TransportSocket};
