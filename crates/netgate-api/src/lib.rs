// netgate-api: Async Rust client for the NetGate management REST API

pub mod client;
pub mod dns;
pub mod error;
pub mod firewall;
pub mod network;
pub mod system;
pub mod transport;

pub use client::NetgateClient;
pub use error::Error;
pub use transport::{TlsMode, TransportConfig};
