// ABOUTME: Minimal in-process SSH server built on russh::server.
// ABOUTME: Admits one key or certificates over it, answers exec and echoes subsystem input.

use russh::keys::ssh_key::{Certificate, PrivateKey, PublicKey};
use russh::server::{self, Auth, Msg, Session};
use russh::{Channel, ChannelId, CryptoVec, Pty};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

/// Exit status returned for commands starting with `fail`.
pub const FAILING_STATUS: u32 = 3;

/// Channel requests the server has seen, in arrival order.
#[derive(Clone, Default)]
pub struct RequestLog(Arc<Mutex<Vec<String>>>);

impl RequestLog {
    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    fn push(&self, entry: String) {
        self.0.lock().unwrap().push(entry);
    }
}

/// Server-side handler that only lets `authorized` in.
struct Handler {
    authorized: PublicKey,
    log: RequestLog,
    /// Input buffered per subsystem channel until EOF.
    subsystems: HashMap<ChannelId, Vec<u8>>,
}

impl Handler {
    fn admit(&self, key: &russh::keys::ssh_key::public::KeyData) -> Auth {
        if key == self.authorized.key_data() {
            return Auth::Accept;
        }
        Auth::Reject {
            proceed_with_methods: None,
            partial_success: false,
        }
    }
}

impl server::Handler for Handler {
    type Error = russh::Error;

    async fn auth_publickey(&mut self, _user: &str, key: &PublicKey) -> Result<Auth, Self::Error> {
        Ok(self.admit(key.key_data()))
    }

    async fn auth_openssh_certificate(
        &mut self,
        user: &str,
        certificate: &Certificate,
    ) -> Result<Auth, Self::Error> {
        self.log.push(format!("certificate {} for {user}", certificate.key_id()));
        Ok(self.admit(certificate.public_key()))
    }

    async fn channel_open_session(
        &mut self,
        _channel: Channel<Msg>,
        _session: &mut Session,
    ) -> Result<bool, Self::Error> {
        Ok(true)
    }

    async fn pty_request(
        &mut self,
        channel: ChannelId,
        term: &str,
        _col_width: u32,
        _row_height: u32,
        _pix_width: u32,
        _pix_height: u32,
        _modes: &[(Pty, u32)],
        session: &mut Session,
    ) -> Result<(), Self::Error> {
        self.log.push(format!("pty {term}"));
        let _ = session.channel_success(channel);
        Ok(())
    }

    async fn exec_request(
        &mut self,
        channel: ChannelId,
        data: &[u8],
        session: &mut Session,
    ) -> Result<(), Self::Error> {
        let command = String::from_utf8_lossy(data).into_owned();
        self.log.push(format!("exec {command}"));
        let status = if command.starts_with("fail") { FAILING_STATUS } else { 0 };

        let _ = session.channel_success(channel);
        let _ = session.data(channel, CryptoVec::from_slice(format!("ran {command}\n").as_bytes()));
        let _ = session.exit_status_request(channel, status);
        let _ = session.eof(channel);
        let _ = session.close(channel);
        Ok(())
    }

    async fn subsystem_request(
        &mut self,
        channel: ChannelId,
        name: &str,
        session: &mut Session,
    ) -> Result<(), Self::Error> {
        self.log.push(format!("subsystem {name}"));
        self.subsystems.insert(channel, Vec::new());
        let _ = session.channel_success(channel);
        Ok(())
    }

    async fn data(
        &mut self,
        channel: ChannelId,
        data: &[u8],
        _session: &mut Session,
    ) -> Result<(), Self::Error> {
        if let Some(buffer) = self.subsystems.get_mut(&channel) {
            buffer.extend_from_slice(data);
        }
        Ok(())
    }

    /// Subsystems answer only once their input has ended.
    async fn channel_eof(&mut self, channel: ChannelId, session: &mut Session) -> Result<(), Self::Error> {
        if let Some(input) = self.subsystems.remove(&channel) {
            let mut reply = b"echo:".to_vec();
            reply.extend_from_slice(&input);
            let _ = session.data(channel, CryptoVec::from_slice(&reply));
            let _ = session.exit_status_request(channel, 0);
            let _ = session.eof(channel);
            let _ = session.close(channel);
        }
        Ok(())
    }
}

/// A running test server.
pub struct TestServer {
    pub address: String,
    pub log: RequestLog,
}

/// Listen on a loopback port, presenting `host_key` and admitting `authorized`.
pub async fn spawn(host_key: PrivateKey, authorized: PublicKey) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap().to_string();
    let log = RequestLog::default();

    let config = Arc::new(server::Config {
        keys: vec![host_key],
        auth_rejection_time: Duration::from_millis(10),
        auth_rejection_time_initial: Some(Duration::ZERO),
        ..Default::default()
    });

    let server_log = log.clone();
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let config = config.clone();
            let handler = Handler {
                authorized: authorized.clone(),
                log: server_log.clone(),
                subsystems: HashMap::new(),
            };
            tokio::spawn(async move {
                if let Ok(session) = server::run_stream(config, stream, handler).await {
                    let _ = session.await;
                }
            });
        }
    });

    TestServer { address, log }
}

/// An address that accepts TCP connections but never speaks SSH.
pub async fn silent() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap().to_string();
    (listener, address)
}

/// An address nothing is listening on.
pub async fn closed_port() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap().to_string();
    drop(listener);
    address
}
