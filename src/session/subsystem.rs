// ABOUTME: Raw byte relay between local stdio and a remote SSH subsystem.
// ABOUTME: Lets scp/sftp-style tools use this connection as their transport.

use super::channel::{self, Pending, RemoteEvent, RemoteEvents, Stdio};
use super::error::{Error, Result};
use crate::ssh::Connection;
use std::io::ErrorKind;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tracing::debug;

/// Invoke a named subsystem and forward bytes until both directions end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subsystem {
    pub name: String,
}

impl Subsystem {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub async fn run(&self, connection: &Connection, stdio: &mut Stdio) -> Result<()> {
        let mut channel = connection.open_session().await?;

        debug!(subsystem = %self.name, "requesting subsystem");
        channel.request_subsystem(true, &self.name).await?;
        let mut pending = Pending::default();
        pending.expect_reply(&mut channel, "subsystem").await?;

        let remote_in = Box::pin(channel.make_writer());
        let mut events = pending.replay(&mut channel);
        let Stdio {
            stdin,
            stdout,
            stderr,
            ..
        } = stdio;
        let result = forward(&mut events, remote_in, stdin, stdout, stderr).await;
        channel::close_after(&channel, result).await
    }
}

/// Copy `local_in` into the channel and the channel's output into
/// `local_out`/`local_err`, concurrently.
///
/// When local input ends the channel's write side is shut down so the
/// remote sees end-of-input, while remote output keeps draining. Failures
/// from both directions are reported together.
pub async fn forward<E, W, I, O, R>(
    events: &mut E,
    mut remote_in: W,
    local_in: &mut I,
    local_out: &mut O,
    local_err: &mut R,
) -> Result<()>
where
    E: RemoteEvents + ?Sized,
    W: AsyncWrite + Unpin,
    I: AsyncRead + Unpin + ?Sized,
    O: AsyncWrite + Unpin + ?Sized,
    R: AsyncWrite + Unpin + ?Sized,
{
    let input = async {
        let copied = tokio::io::copy(local_in, &mut remote_in).await.map(|bytes| {
            debug!(bytes, "local input finished");
        });
        let closed = half_close(&mut remote_in).await;
        Error::join([copied.map_err(Error::from), closed.map_err(Error::from)])
    };

    let output = async {
        loop {
            match events.next_event().await {
                Some(RemoteEvent::Stdout(data)) => {
                    local_out.write_all(&data).await?;
                    local_out.flush().await?;
                }
                Some(RemoteEvent::Stderr(data)) => {
                    local_err.write_all(&data).await?;
                    local_err.flush().await?;
                }
                Some(RemoteEvent::ExitStatus(status)) => {
                    debug!(status, "subsystem exited");
                }
                Some(RemoteEvent::Eof | RemoteEvent::Close) | None => break,
                Some(_) => {}
            }
        }
        debug!("remote output finished");
        Ok::<(), Error>(())
    };

    let (input, output) = tokio::join!(input, output);
    Error::join([input, output])
}

/// Shut down the write direction only; channels without half-close are fine.
async fn half_close<W: AsyncWrite + Unpin + ?Sized>(writer: &mut W) -> std::io::Result<()> {
    match writer.shutdown().await {
        Err(e) if e.kind() == ErrorKind::Unsupported => {
            debug!("channel does not support half-close");
            Ok(())
        }
        other => other,
    }
}
