// ABOUTME: Interactive shell session, with a pseudo-terminal when local output is a terminal.
// ABOUTME: The local terminal is held in raw mode for the session and always restored.

use super::channel::{self, Pending, Stdio};
use super::error::{Error, Result};
use super::exec;
use super::terminal::{self, RawTerminal};
use crate::ssh::Connection;
use russh::client::Msg;
use russh::{Channel, Pty};
use tracing::debug;

/// Terminal type announced to the remote side.
pub const TERM: &str = "xterm-256color";

/// Run a login shell, or `command` when it is not empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Shell {
    pub command: String,
}

impl Shell {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    pub async fn run(&self, connection: &Connection, stdio: &mut Stdio) -> Result<()> {
        let mut channel = connection.open_session().await?;

        let raw = if stdio.terminal {
            Some(RawTerminal::acquire()?)
        } else {
            None
        };

        let result = self.start(&mut channel, raw.is_some(), stdio).await;
        let result = channel::close_after(&channel, result).await;
        let restored = raw.map_or(Ok(()), RawTerminal::restore);

        Error::join([result, restored.map_err(Error::from)])
    }

    async fn start(&self, channel: &mut Channel<Msg>, with_pty: bool, stdio: &mut Stdio) -> Result<()> {
        if with_pty {
            let (width, height) = terminal::size()?;
            debug!(width, height, "requesting pseudo-terminal");
            channel
                .request_pty(
                    true,
                    TERM,
                    u32::from(width),
                    u32::from(height),
                    0,
                    0,
                    &[(Pty::ECHO, 1)],
                )
                .await?;
            let mut pending = Pending::default();
            pending.expect_reply(channel, "pty").await?;
            return self.launch(channel, pending, stdio).await;
        }
        self.launch(channel, Pending::default(), stdio).await
    }

    async fn launch(&self, channel: &mut Channel<Msg>, mut pending: Pending, stdio: &mut Stdio) -> Result<()> {
        if self.command.is_empty() {
            channel.request_shell(true).await?;
            pending.expect_reply(channel, "shell").await?;
        } else {
            debug!(command = %self.command, "executing remote command");
            channel.exec(true, self.command.as_str()).await?;
            pending.expect_reply(channel, "exec").await?;
        }
        exec::attach(channel, pending, stdio).await
    }
}
