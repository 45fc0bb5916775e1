// ABOUTME: Drives one remote command or shell to completion.
// ABOUTME: Relays local stdin and remote stdout/stderr until the remote side exits.

use super::channel::{Pending, RemoteEvent, RemoteEvents, Stdio};
use super::error::{Error, Result};
use russh::Channel;
use russh::client::Msg;
use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

/// How the remote process ended.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Outcome {
    Exited(u32),
    Signaled(String),
}

/// Execute `command` on `channel` with the local streams attached.
pub(crate) async fn run_command(
    channel: &mut Channel<Msg>,
    command: &str,
    stdio: &mut Stdio,
) -> Result<()> {
    debug!(command, "executing remote command");
    channel.exec(true, command).await?;
    let mut pending = Pending::default();
    pending.expect_reply(channel, "exec").await?;
    attach(channel, pending, stdio).await
}

/// Relay streams on a channel whose command or shell has been started.
pub(crate) async fn attach(
    channel: &mut Channel<Msg>,
    pending: Pending,
    stdio: &mut Stdio,
) -> Result<()> {
    let remote_in = Box::pin(channel.make_writer());
    let mut events = pending.replay(channel);
    drive(&mut events, remote_in, stdio).await
}

/// Pump bytes until the remote process has exited and its output is drained.
///
/// Local end of input is passed on as channel EOF. The remote exit status is
/// turned into an error when it is not zero.
pub(crate) async fn drive<E, W>(events: &mut E, mut remote_in: W, stdio: &mut Stdio) -> Result<()>
where
    E: RemoteEvents + ?Sized,
    W: AsyncWrite + Unpin,
{
    let mut buf = vec![0u8; 32 * 1024];
    let mut input_open = true;
    let mut eof = false;
    let mut outcome = None;

    loop {
        tokio::select! {
            read = stdio.stdin.read(&mut buf), if input_open => {
                match read {
                    Ok(0) => {
                        input_open = false;
                        if let Err(e) = remote_in.shutdown().await {
                            debug!("failed to send EOF: {}", e);
                        }
                    }
                    Ok(n) => {
                        if let Err(e) = remote_in.write_all(&buf[..n]).await {
                            debug!("remote input closed: {}", e);
                            input_open = false;
                        }
                    }
                    Err(e) => return Err(e.into()),
                }
            }

            event = events.next_event() => {
                match event {
                    Some(RemoteEvent::Stdout(data)) => {
                        stdio.stdout.write_all(&data).await?;
                        stdio.stdout.flush().await?;
                    }
                    Some(RemoteEvent::Stderr(data)) => {
                        stdio.stderr.write_all(&data).await?;
                        stdio.stderr.flush().await?;
                    }
                    Some(RemoteEvent::ExitStatus(status)) => {
                        outcome = Some(Outcome::Exited(status));
                        if eof {
                            break;
                        }
                    }
                    Some(RemoteEvent::ExitSignal(signal)) => {
                        outcome = Some(Outcome::Signaled(signal));
                        if eof {
                            break;
                        }
                    }
                    Some(RemoteEvent::Eof) => {
                        eof = true;
                        if outcome.is_some() {
                            break;
                        }
                    }
                    Some(RemoteEvent::Success | RemoteEvent::Failure) => {}
                    Some(RemoteEvent::Close) | None => break,
                }
            }
        }
    }

    stdio.stdout.flush().await?;
    stdio.stderr.flush().await?;

    match outcome {
        Some(Outcome::Exited(0)) => Ok(()),
        Some(Outcome::Exited(status)) => Err(Error::RemoteExit { status }),
        Some(Outcome::Signaled(signal)) => Err(Error::RemoteSignal { signal }),
        None => Err(Error::ChannelClosed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::channel::Script;
    use std::sync::{Arc, Mutex};
    use std::pin::Pin;
    use std::task::{Context, Poll};

    /// Shared in-memory sink so tests can inspect what was written.
    #[derive(Clone, Default)]
    struct Sink(Arc<Mutex<Vec<u8>>>);

    impl Sink {
        fn contents(&self) -> Vec<u8> {
            self.0.lock().unwrap().clone()
        }
    }

    impl AsyncWrite for Sink {
        fn poll_write(self: Pin<&mut Self>, _: &mut Context<'_>, buf: &[u8]) -> Poll<std::io::Result<usize>> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Poll::Ready(Ok(buf.len()))
        }

        fn poll_flush(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<std::io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<std::io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    fn stdio(input: &'static [u8]) -> (Stdio, Sink, Sink) {
        let out = Sink::default();
        let err = Sink::default();
        (Stdio::new(input, out.clone(), err.clone()), out, err)
    }

    fn script(events: impl IntoIterator<Item = RemoteEvent>) -> Script {
        Script(events.into_iter().collect())
    }

    #[tokio::test]
    async fn zero_exit_status_succeeds_and_relays_output() {
        let (mut stdio, out, err) = stdio(b"");
        let mut remote = script([
            RemoteEvent::Stdout(b"hello\n".to_vec()),
            RemoteEvent::Stderr(b"warn\n".to_vec()),
            RemoteEvent::ExitStatus(0),
            RemoteEvent::Eof,
            RemoteEvent::Close,
        ]);

        drive(&mut remote, Sink::default(), &mut stdio).await.unwrap();

        assert_eq!(out.contents(), b"hello\n");
        assert_eq!(err.contents(), b"warn\n");
    }

    #[tokio::test]
    async fn nonzero_exit_status_is_remote_failure() {
        let (mut stdio, _, _) = stdio(b"");
        let mut remote = script([RemoteEvent::Eof, RemoteEvent::ExitStatus(42)]);

        let err = drive(&mut remote, Sink::default(), &mut stdio).await.unwrap_err();
        assert_eq!(err.remote_exit_status(), Some(42));
    }

    #[tokio::test]
    async fn exit_signal_is_remote_failure() {
        let (mut stdio, _, _) = stdio(b"");
        let mut remote = script([RemoteEvent::ExitSignal("KILL".to_string()), RemoteEvent::Eof]);

        let err = drive(&mut remote, Sink::default(), &mut stdio).await.unwrap_err();
        assert!(matches!(err, Error::RemoteSignal { .. }));
    }

    #[tokio::test]
    async fn close_without_status_is_channel_closed() {
        let (mut stdio, _, _) = stdio(b"");
        let mut remote = script([RemoteEvent::Stdout(b"partial".to_vec())]);

        let err = drive(&mut remote, Sink::default(), &mut stdio).await.unwrap_err();
        assert!(matches!(err, Error::ChannelClosed));
    }
}
