// ABOUTME: Sequential remote commands on one connection.
// ABOUTME: Each command gets a fresh session channel; the first failure stops the batch.

use super::channel::{self, Stdio};
use super::error::Result;
use super::exec;
use crate::ssh::Connection;
use async_trait::async_trait;
use tracing::debug;

/// Runs a single command to completion.
#[async_trait]
pub trait CommandRunner: Send {
    async fn run_command(&mut self, command: &str) -> Result<()>;
}

/// Runs commands on fresh session channels of one connection.
pub struct RemoteCommands<'a> {
    pub connection: &'a Connection,
    pub stdio: &'a mut Stdio,
}

#[async_trait]
impl CommandRunner for RemoteCommands<'_> {
    async fn run_command(&mut self, command: &str) -> Result<()> {
        let mut channel = self.connection.open_session().await?;
        let result = exec::run_command(&mut channel, command, self.stdio).await;
        channel::close_after(&channel, result).await
    }
}

/// Commands executed in order; an empty batch does nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batch {
    pub commands: Vec<String>,
}

impl Batch {
    pub fn new(commands: Vec<String>) -> Self {
        Self { commands }
    }

    pub async fn run(&self, connection: &Connection, stdio: &mut Stdio) -> Result<()> {
        self.run_with(&mut RemoteCommands { connection, stdio }).await
    }

    /// Run every command in order, stopping at the first failure.
    pub async fn run_with<R: CommandRunner + ?Sized>(&self, runner: &mut R) -> Result<()> {
        for (index, command) in self.commands.iter().enumerate() {
            debug!(index, command = %command, "running batch command");
            runner.run_command(command).await?;
        }
        Ok(())
    }
}
