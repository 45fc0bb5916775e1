// ABOUTME: Access details issued for one connection attempt.
// ABOUTME: Identity, endpoint, trusted host keys, optional user certificate, and signing key.

use russh::keys::ssh_key::{Certificate, PrivateKey, PublicKey};
use std::fmt;
use std::sync::Arc;

/// Default SSH port.
pub const DEFAULT_PORT: u16 = 22;

/// Everything needed to open one authenticated SSH connection.
///
/// Produced once per invocation by a credential source and never mutated
/// afterwards. An empty `known_host_keys` list means no host can be trusted.
#[derive(Clone)]
pub struct AccessDetails {
    /// Remote login identity.
    pub user: String,
    /// Network endpoint as `host:port`.
    pub address: String,
    /// Acceptable host identities.
    pub known_host_keys: Vec<PublicKey>,
    /// User certificate binding `signer` to `user`, if one was issued.
    pub cert: Option<Certificate>,
    /// Private key used to sign the authentication request.
    pub signer: Option<Arc<PrivateKey>>,
}

impl fmt::Debug for AccessDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessDetails")
            .field("user", &self.user)
            .field("address", &self.address)
            .field("known_host_keys", &self.known_host_keys.len())
            .field("cert", &self.cert.as_ref().map(|c| c.key_id().to_string()))
            .field("signer", &self.signer.as_ref().map(|_| "<private key>"))
            .finish()
    }
}

/// Join a host and port, bracketing IPv6 literals.
pub fn join_host_port(host: &str, port: u16) -> String {
    if host.contains(':') {
        format!("[{host}]:{port}")
    } else {
        format!("{host}:{port}")
    }
}

/// Split `address` into its host part, dropping any port.
pub fn host_of(address: &str) -> &str {
    if let Some(rest) = address.strip_prefix('[') {
        return rest.split_once(']').map_or(rest, |(host, _)| host);
    }
    match address.split_once(':') {
        // A bare IPv6 literal has more than one colon and no port.
        Some((host, port)) if !port.contains(':') => host,
        _ => address,
    }
}

/// Replace the port of `address`, keeping its host.
pub fn with_port(address: &str, port: u16) -> String {
    join_host_port(host_of(address), port)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_plain_host() {
        assert_eq!(join_host_port("10.0.0.1", 22), "10.0.0.1:22");
    }

    #[test]
    fn join_brackets_ipv6() {
        assert_eq!(join_host_port("2001:db8::1", 2222), "[2001:db8::1]:2222");
    }

    #[test]
    fn host_of_strips_port() {
        assert_eq!(host_of("10.0.0.1:22"), "10.0.0.1");
        assert_eq!(host_of("example.test"), "example.test");
        assert_eq!(host_of("[2001:db8::1]:22"), "2001:db8::1");
        assert_eq!(host_of("2001:db8::1"), "2001:db8::1");
    }

    #[test]
    fn with_port_overrides_existing_port() {
        assert_eq!(with_port("10.0.0.1:22", 2222), "10.0.0.1:2222");
        assert_eq!(with_port("[2001:db8::1]:22", 2200), "[2001:db8::1]:2200");
        assert_eq!(with_port("example.test", 22), "example.test:22");
    }
}
