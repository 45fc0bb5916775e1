// ABOUTME: Adapters between russh session channels and local standard streams.
// ABOUTME: Channel messages are reduced to the events the session handlers act on.

use super::error::{Error, Result};
use async_trait::async_trait;
use russh::client::Msg;
use russh::{Channel, ChannelMsg};
use std::collections::VecDeque;
use std::io::IsTerminal;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::debug;

/// Local standard streams wired to a remote session.
pub struct Stdio {
    pub stdin: Box<dyn AsyncRead + Unpin + Send>,
    pub stdout: Box<dyn AsyncWrite + Unpin + Send>,
    pub stderr: Box<dyn AsyncWrite + Unpin + Send>,
    /// Output goes to an interactive terminal, so shells get a pseudo-terminal.
    pub terminal: bool,
}

impl Stdio {
    pub fn new(
        stdin: impl AsyncRead + Unpin + Send + 'static,
        stdout: impl AsyncWrite + Unpin + Send + 'static,
        stderr: impl AsyncWrite + Unpin + Send + 'static,
    ) -> Self {
        Self {
            stdin: Box::new(stdin),
            stdout: Box::new(stdout),
            stderr: Box::new(stderr),
            terminal: false,
        }
    }

    /// The process's own standard streams.
    pub fn inherit() -> Self {
        Self::new(tokio::io::stdin(), tokio::io::stdout(), tokio::io::stderr())
            .with_terminal(std::io::stdout().is_terminal())
    }

    pub fn with_terminal(mut self, terminal: bool) -> Self {
        self.terminal = terminal;
        self
    }
}

/// Close `channel` once its work is done, reporting a failed close with `result`.
pub(crate) async fn close_after(channel: &Channel<Msg>, result: Result<()>) -> Result<()> {
    settle(result, channel.close().await)
}

fn settle(result: Result<()>, closed: std::result::Result<(), russh::Error>) -> Result<()> {
    if let Err(e) = &closed {
        debug!("session channel close: {}", e);
    }
    Error::join([result, closed.map_err(Error::from)])
}

/// What the remote side of a session channel told us.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteEvent {
    Stdout(Vec<u8>),
    Stderr(Vec<u8>),
    /// Positive reply to a channel request.
    Success,
    /// Negative reply to a channel request.
    Failure,
    ExitStatus(u32),
    ExitSignal(String),
    Eof,
    Close,
}

/// A source of remote channel events. `None` means the channel is gone.
#[async_trait]
pub trait RemoteEvents: Send {
    async fn next_event(&mut self) -> Option<RemoteEvent>;
}

#[async_trait]
impl RemoteEvents for Channel<Msg> {
    async fn next_event(&mut self) -> Option<RemoteEvent> {
        loop {
            let event = match self.wait().await? {
                ChannelMsg::Data { data } => RemoteEvent::Stdout(data.to_vec()),
                ChannelMsg::ExtendedData { data, ext: 1 } => RemoteEvent::Stderr(data.to_vec()),
                ChannelMsg::Success => RemoteEvent::Success,
                ChannelMsg::Failure => RemoteEvent::Failure,
                ChannelMsg::ExitStatus { exit_status } => RemoteEvent::ExitStatus(exit_status),
                ChannelMsg::ExitSignal { signal_name, .. } => {
                    RemoteEvent::ExitSignal(format!("{signal_name:?}"))
                }
                ChannelMsg::Eof => RemoteEvent::Eof,
                ChannelMsg::Close => RemoteEvent::Close,
                _ => continue,
            };
            return Some(event);
        }
    }
}

/// Events that arrived while waiting for a request reply.
#[derive(Debug, Default)]
pub(crate) struct Pending {
    events: VecDeque<RemoteEvent>,
}

impl Pending {
    /// Wait for the reply to a request sent with `want_reply`, keeping
    /// anything else that arrives in the meantime.
    pub(crate) async fn expect_reply<E>(&mut self, events: &mut E, request: &'static str) -> Result<()>
    where
        E: RemoteEvents + ?Sized,
    {
        loop {
            match events.next_event().await {
                Some(RemoteEvent::Success) => {
                    debug!(request, "request accepted");
                    return Ok(());
                }
                Some(RemoteEvent::Failure) => return Err(Error::RequestRejected(request)),
                Some(RemoteEvent::Close) | None => return Err(Error::ChannelClosed),
                Some(other) => self.events.push_back(other),
            }
        }
    }

    /// Replay the kept events ahead of the live ones.
    pub(crate) fn replay<E>(self, inner: &mut E) -> Replay<'_, E>
    where
        E: RemoteEvents + ?Sized,
    {
        Replay {
            pending: self.events,
            inner,
        }
    }
}

pub(crate) struct Replay<'a, E: ?Sized> {
    pending: VecDeque<RemoteEvent>,
    inner: &'a mut E,
}

#[async_trait]
impl<E> RemoteEvents for Replay<'_, E>
where
    E: RemoteEvents + ?Sized,
{
    async fn next_event(&mut self) -> Option<RemoteEvent> {
        match self.pending.pop_front() {
            Some(event) => Some(event),
            None => self.inner.next_event().await,
        }
    }
}

/// Scripted event source for tests.
#[cfg(test)]
pub(crate) struct Script(pub VecDeque<RemoteEvent>);

#[cfg(test)]
#[async_trait]
impl RemoteEvents for Script {
    async fn next_event(&mut self) -> Option<RemoteEvent> {
        self.0.pop_front()
    }
}
