// ABOUTME: Decoding of issued key material: host keys, user certificate, private key.
// ABOUTME: Rejects anything the SSH client could not use before a connection is attempted.

use super::error::{Error, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use russh::keys::ssh_key::{Certificate, PrivateKey, PublicKey};

/// Decode a base64 wire-format public key, the form host keys are issued in.
pub fn parse_host_key(index: usize, encoded: &str) -> Result<PublicKey> {
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|e| Error::HostKey {
            index,
            reason: e.to_string(),
        })?;
    PublicKey::from_bytes(&bytes).map_err(|e| Error::HostKey {
        index,
        reason: e.to_string(),
    })
}

/// Parse an authorized-keys style certificate line; only user certificates pass.
pub fn parse_user_certificate(text: &str) -> Result<Certificate> {
    let certificate =
        Certificate::from_openssh(text.trim()).map_err(|e| Error::Certificate(e.to_string()))?;
    let kind = certificate.cert_type();
    if !kind.is_user() {
        return Err(Error::UnexpectedCertificateKind { kind });
    }
    Ok(certificate)
}

/// Parse an unencrypted OpenSSH or PEM private key.
pub fn parse_private_key(pem: &str) -> Result<PrivateKey> {
    Ok(russh::keys::decode_secret_key(pem, None)?)
}
