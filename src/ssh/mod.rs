// ABOUTME: SSH client module for certificate-authenticated connections.
// ABOUTME: Access details, host key trust, client configuration, and the connector.

mod access;
mod client;
mod error;
mod trust;

pub use access::{AccessDetails, DEFAULT_PORT, host_of, join_host_port, with_port};
pub use client::{ClientConfig, ConnectOptions, Connection};
pub use error::{Error, Result};
pub use trust::KnownHostKeys;
