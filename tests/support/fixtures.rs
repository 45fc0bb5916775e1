// ABOUTME: OpenSSH-generated keys and certificates used across tests.
// ABOUTME: Generated once with ssh-keygen; the signing CA's private half is not kept.

use russh::keys::decode_secret_key;
use russh::keys::ssh_key::{Certificate, PrivateKey, PublicKey};
use sshexec::ssh::AccessDetails;
use std::sync::Arc;

pub const HOST_KEY: &str = include_str!("../fixtures/host_key");
pub const HOST_KEY_PUB: &str = include_str!("../fixtures/host_key.pub");
pub const OTHER_HOST_KEY_PUB: &str = include_str!("../fixtures/other_host_key.pub");
pub const USER_KEY: &str = include_str!("../fixtures/user_key");
pub const USER_KEY_PUB: &str = include_str!("../fixtures/user_key.pub");
pub const USER_CERT: &str = include_str!("../fixtures/user_key-cert.pub");
pub const HOST_CERT: &str = include_str!("../fixtures/host_key-cert.pub");

pub fn private_key(pem: &str) -> PrivateKey {
    decode_secret_key(pem, None).unwrap()
}

pub fn public_key(text: &str) -> PublicKey {
    PublicKey::from_openssh(text.trim()).unwrap()
}

pub fn certificate(text: &str) -> Certificate {
    Certificate::from_openssh(text.trim()).unwrap()
}

/// Plain-key access details for `address`, trusting `known_host_keys`.
pub fn access_details(address: &str, known_host_keys: Vec<PublicKey>) -> AccessDetails {
    AccessDetails {
        user: "ubuntu".to_string(),
        address: address.to_string(),
        known_host_keys,
        cert: None,
        signer: Some(Arc::new(private_key(USER_KEY))),
    }
}
