// ABOUTME: Session layer: what runs on the connection once it is established.
// ABOUTME: Chooses between an interactive shell, a command batch, or a subsystem relay.

mod batch;
mod channel;
mod destination;
mod error;
mod exec;
pub mod quote;
mod shell;
mod subsystem;
pub mod terminal;

pub use batch::{Batch, CommandRunner, RemoteCommands};
pub use channel::{RemoteEvent, RemoteEvents, Stdio};
pub use destination::{Destination, Target};
pub use error::{Error, Result};
pub use shell::{Shell, TERM};
pub use subsystem::{Subsystem, forward};

use crate::ssh::Connection;

/// Flags that shape the session, fixed for the whole invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionOptions {
    /// Overrides the user written in the destination.
    pub login_user: Option<String>,
    /// Overrides the port written in the destination.
    pub port: Option<u16>,
    /// Treat the single trailing argument as a subsystem name.
    pub with_subsystem: bool,
    /// Treat each trailing argument as a separate command.
    pub batch_commands: bool,
    pub force_pseudo_terminal: bool,
}

impl SessionOptions {
    fn check(&self) -> Result<()> {
        if self.with_subsystem && self.batch_commands {
            return Err(Error::ConflictingModes);
        }
        Ok(())
    }
}

/// The one thing this invocation does with its connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionHandler {
    Shell(Shell),
    Batch(Batch),
    Subsystem(Subsystem),
}

impl SessionHandler {
    /// Pick the handler for the trailing command arguments.
    pub fn select(options: &SessionOptions, command: &[String]) -> Result<Self> {
        options.check()?;

        if options.with_subsystem {
            return match command {
                [name] => Ok(SessionHandler::Subsystem(Subsystem::new(name.clone()))),
                other => Err(Error::SubsystemArity(other.len())),
            };
        }
        if options.batch_commands {
            return Ok(SessionHandler::Batch(Batch::new(command.to_vec())));
        }
        if command.is_empty() || options.force_pseudo_terminal {
            return Ok(SessionHandler::Shell(Shell::new(quote::join(command))));
        }
        Ok(SessionHandler::Batch(Batch::new(vec![quote::join(command)])))
    }

    pub async fn run(&self, connection: &Connection, stdio: &mut Stdio) -> Result<()> {
        match self {
            SessionHandler::Shell(shell) => shell.run(connection, stdio).await,
            SessionHandler::Batch(batch) => batch.run(connection, stdio).await,
            SessionHandler::Subsystem(subsystem) => subsystem.run(connection, stdio).await,
        }
    }
}

/// A checked invocation: where to connect and what to run there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub handler: SessionHandler,
    pub target: Target,
}

/// Validate options and positional arguments without touching the network.
///
/// `args` holds the destination followed by the remote command, if any.
pub fn plan(options: &SessionOptions, args: &[String]) -> Result<Plan> {
    options.check()?;
    let (destination, command) = args.split_first().ok_or(Error::MissingDestination)?;
    let handler = SessionHandler::select(options, command)?;
    let target = Destination::parse(destination)?.resolve(options.login_user.as_deref(), options.port);
    Ok(Plan { handler, target })
}
