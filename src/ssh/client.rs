// ABOUTME: SSH client configuration and connection establishment using russh.
// ABOUTME: Certificate-signed public key auth only; host keys checked against access details.

use super::access::AccessDetails;
use super::error::{Error, Result};
use super::trust::KnownHostKeys;
use russh::client::{self, Handle, Msg};
use russh::keys::PrivateKeyWithHashAlg;
use russh::keys::ssh_key::{self, Certificate, PrivateKey};
use russh::{Channel, Disconnect};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

/// Transport options callers may tune before connecting.
#[derive(Default)]
pub struct ConnectOptions {
    /// Deadline applied separately to the TCP dial and the SSH handshake.
    pub connect_timeout: Option<Duration>,
    /// Options handed to russh as-is.
    pub transport: client::Config,
}

/// The single authentication method offered to the server.
#[derive(Clone)]
enum Identity {
    Certificate {
        key: Arc<PrivateKey>,
        certificate: Certificate,
    },
    Key(Arc<PrivateKey>),
}

/// Connection configuration derived from [`AccessDetails`].
///
/// The host key check and the authentication identity are fixed at
/// construction; overrides only reach [`ConnectOptions`].
pub struct ClientConfig {
    user: String,
    host_keys: KnownHostKeys,
    identity: Identity,
    options: ConnectOptions,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let identity = match &self.identity {
            Identity::Certificate { .. } => "certificate",
            Identity::Key(_) => "key",
        };
        f.debug_struct("ClientConfig")
            .field("user", &self.user)
            .field("host_keys", &self.host_keys)
            .field("identity", &identity)
            .field("connect_timeout", &self.options.connect_timeout)
            .finish()
    }
}

impl ClientConfig {
    /// Build a configuration from access details without touching the network.
    pub fn new(details: &AccessDetails) -> Result<Self> {
        let key = details.signer.clone().ok_or(Error::MissingSigner)?;

        let identity = match &details.cert {
            Some(certificate) => {
                let kind = certificate.cert_type();
                if !kind.is_user() {
                    return Err(Error::UnexpectedCertificateKind { kind });
                }
                Identity::Certificate {
                    key,
                    certificate: certificate.clone(),
                }
            }
            None => Identity::Key(key),
        };

        Ok(Self {
            user: details.user.clone(),
            host_keys: KnownHostKeys::new(details.known_host_keys.clone()),
            identity,
            options: ConnectOptions::default(),
        })
    }

    /// Apply an override to the transport options.
    pub fn with(mut self, apply: impl FnOnce(&mut ConnectOptions)) -> Self {
        apply(&mut self.options);
        self
    }

    pub fn connect_timeout(self, timeout: Duration) -> Self {
        self.with(|o| o.connect_timeout = Some(timeout))
    }

    pub fn inactivity_timeout(self, timeout: Duration) -> Self {
        self.with(|o| o.transport.inactivity_timeout = Some(timeout))
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn uses_certificate(&self) -> bool {
        matches!(self.identity, Identity::Certificate { .. })
    }

    pub fn options(&self) -> &ConnectOptions {
        &self.options
    }
}

/// russh handler that enforces the known host key set.
pub(crate) struct TrustedHost {
    host_keys: KnownHostKeys,
}

impl client::Handler for TrustedHost {
    type Error = Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &ssh_key::PublicKey,
    ) -> std::result::Result<bool, Self::Error> {
        match self.host_keys.verify(Some(server_public_key)) {
            Ok(()) => Ok(true),
            Err(e) => {
                warn!("rejecting host key: {}", e);
                Err(e)
            }
        }
    }
}

/// A handshake-complete, authenticated SSH connection.
pub struct Connection {
    address: String,
    handle: Handle<TrustedHost>,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("address", &self.address)
            .field("handle", &"<russh::Handle>")
            .finish()
    }
}

impl Connection {
    /// Dial `address`, run the handshake, and authenticate.
    pub async fn connect(config: ClientConfig, address: &str) -> Result<Self> {
        let ClientConfig {
            user,
            host_keys,
            identity,
            options,
        } = config;
        let deadline = options.connect_timeout;

        debug!(%address, "dialing");
        let stream = with_deadline(deadline, address, TcpStream::connect(address))
            .await?
            .map_err(|source| Error::Dial {
                address: address.to_string(),
                source,
            })?;

        debug!(%address, "starting SSH handshake");
        let handshake =
            client::connect_stream(Arc::new(options.transport), stream, TrustedHost { host_keys });
        let mut handle = with_deadline(deadline, address, handshake)
            .await?
            .map_err(Error::during_handshake)?;

        let result = match identity {
            Identity::Certificate { key, certificate } => {
                debug!(user = %user, key_id = certificate.key_id(), "authenticating with certificate");
                handle
                    .authenticate_openssh_cert(user.as_str(), key, certificate)
                    .await?
            }
            Identity::Key(key) => {
                debug!(user = %user, "authenticating with public key");
                let hash_alg = handle.best_supported_rsa_hash().await?.flatten();
                handle
                    .authenticate_publickey(user.as_str(), PrivateKeyWithHashAlg::new(key, hash_alg))
                    .await?
            }
        };

        if !result.success() {
            return Err(Error::AuthenticationRejected { user });
        }

        info!(%address, user = %user, "authenticated");

        Ok(Self {
            address: address.to_string(),
            handle,
        })
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Open a new session channel on this connection.
    pub async fn open_session(&self) -> Result<Channel<Msg>> {
        let channel = self.handle.channel_open_session().await?;
        debug!(channel = ?channel.id(), "session channel opened");
        Ok(channel)
    }

    /// Close the connection.
    pub async fn close(self) -> Result<()> {
        debug!(address = %self.address, "disconnecting");
        self.handle
            .disconnect(Disconnect::ByApplication, "", "en")
            .await?;
        Ok(())
    }
}

async fn with_deadline<F: Future>(
    deadline: Option<Duration>,
    address: &str,
    fut: F,
) -> Result<F::Output> {
    match deadline {
        Some(timeout) => tokio::time::timeout(timeout, fut)
            .await
            .map_err(|_| Error::ConnectTimeout {
                address: address.to_string(),
                timeout,
            }),
        None => Ok(fut.await),
    }
}
