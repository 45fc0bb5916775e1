// ABOUTME: SSH-specific error types.
// ABOUTME: Covers client configuration, host key trust, dialing, and authentication failures.

use russh::keys::ssh_key::certificate::CertType;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("access details carry no private key signer")]
    MissingSigner,

    #[error("expected an SSH user certificate but got: {kind:?}")]
    UnexpectedCertificateKind { kind: CertType },

    #[error("unknown host key: {presented} fingerprint: {fingerprint} (expected fingerprints: {})", expected_list(.expected))]
    UnknownHostKey {
        presented: String,
        fingerprint: String,
        expected: Vec<String>,
    },

    #[error("invalid host key: {0}")]
    InvalidHostKey(String),

    #[error("failed to dial {address}: {source}")]
    Dial {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("connecting to {address} timed out after {timeout:?}")]
    ConnectTimeout { address: String, timeout: Duration },

    #[error("SSH handshake failed: {0}")]
    Handshake(russh::Error),

    #[error("authentication failed for user {user:?}: server rejected the offered key")]
    AuthenticationRejected { user: String },

    #[error("SSH protocol error: {0}")]
    Protocol(#[from] russh::Error),
}

fn expected_list(expected: &[String]) -> String {
    if expected.is_empty() {
        "none".to_string()
    } else {
        expected.join(", ")
    }
}

impl Error {
    /// Whether the failure came from the host key check.
    pub fn is_trust_failure(&self) -> bool {
        matches!(self, Error::UnknownHostKey { .. } | Error::InvalidHostKey(_))
    }

    /// Reclassify a protocol error raised while the handshake was running.
    pub(crate) fn during_handshake(self) -> Self {
        match self {
            Error::Protocol(inner) => Error::Handshake(inner),
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
