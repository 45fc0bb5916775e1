// ABOUTME: Host key trust decision against a fixed set of known keys.
// ABOUTME: No trust-on-first-use and no known_hosts file; empty sets reject every host.

use super::error::{Error, Result};
use russh::keys::ssh_key::{HashAlg, PublicKey};

/// The host identities a connection is allowed to accept.
#[derive(Debug, Clone, Default)]
pub struct KnownHostKeys {
    keys: Vec<PublicKey>,
}

impl KnownHostKeys {
    pub fn new(keys: Vec<PublicKey>) -> Self {
        Self { keys }
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Accept `presented` only if its wire encoding equals a known key's.
    ///
    /// Comparison happens on the full canonical encoding, never on
    /// fingerprints. An absent key is always rejected.
    pub fn verify(&self, presented: Option<&PublicKey>) -> Result<()> {
        let presented =
            presented.ok_or_else(|| Error::InvalidHostKey("no host key presented".to_string()))?;

        let got = presented
            .to_bytes()
            .map_err(|e| Error::InvalidHostKey(format!("cannot encode host key: {e}")))?;

        let matched = self
            .keys
            .iter()
            .filter_map(|known| known.to_bytes().ok())
            .any(|want| want == got);
        if matched {
            return Ok(());
        }

        Err(Error::UnknownHostKey {
            presented: presented
                .to_openssh()
                .map(|s| s.trim().to_string())
                .unwrap_or_else(|_| presented.algorithm().to_string()),
            fingerprint: fingerprint(presented),
            expected: self
                .keys
                .iter()
                .map(|known| format!("{} {}", known.algorithm(), fingerprint(known)))
                .collect(),
        })
    }
}

impl From<Vec<PublicKey>> for KnownHostKeys {
    fn from(keys: Vec<PublicKey>) -> Self {
        Self::new(keys)
    }
}

fn fingerprint(key: &PublicKey) -> String {
    key.fingerprint(HashAlg::Sha256).to_string()
}
