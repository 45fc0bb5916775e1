// ABOUTME: Session-level error types.
// ABOUTME: Configuration mistakes, remote command failures, and channel I/O errors.

use crate::error::{fold, joined};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("destination is not specified")]
    MissingDestination,

    #[error("invalid destination {input:?}: {reason}")]
    InvalidDestination { input: String, reason: String },

    #[error("flags -s and --commands must not be used together")]
    ConflictingModes,

    #[error("subsystem mode needs exactly one argument naming the subsystem, got {0}")]
    SubsystemArity(usize),

    #[error("remote command exited with status {status}")]
    RemoteExit { status: u32 },

    #[error("remote command killed by signal {signal}")]
    RemoteSignal { signal: String },

    #[error("remote side rejected the {0} request")]
    RequestRejected(&'static str),

    #[error("channel closed without an exit status")]
    ChannelClosed,

    #[error(transparent)]
    Ssh(#[from] crate::ssh::Error),

    #[error("SSH protocol error: {0}")]
    Protocol(#[from] russh::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{}", joined(.0))]
    Multiple(Vec<Error>),
}

impl Error {
    pub(crate) fn invalid_destination(input: &str, reason: impl Into<String>) -> Self {
        Error::InvalidDestination {
            input: input.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether this error was detected before any network I/O.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::MissingDestination
                | Error::InvalidDestination { .. }
                | Error::ConflictingModes
                | Error::SubsystemArity(_)
        )
    }

    /// Exit status of a remote command that ran and failed, if this is one.
    pub fn remote_exit_status(&self) -> Option<u32> {
        match self {
            Error::RemoteExit { status } => Some(*status),
            Error::Multiple(errors) => errors.iter().find_map(Error::remote_exit_status),
            _ => None,
        }
    }

    /// Fold results into one, keeping every failure.
    pub fn join(results: impl IntoIterator<Item = Result<()>>) -> Result<()> {
        fold(results, Error::Multiple)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_of_successes_is_ok() {
        assert!(Error::join([Ok(()), Ok(())]).is_ok());
    }

    #[test]
    fn join_keeps_single_error_as_is() {
        let err = Error::join([Ok(()), Err(Error::ChannelClosed)]).unwrap_err();
        assert!(matches!(err, Error::ChannelClosed));
    }

    #[test]
    fn join_reports_every_failure() {
        let err = Error::join([
            Err(Error::RemoteExit { status: 2 }),
            Err(Error::ChannelClosed),
        ])
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "remote command exited with status 2; channel closed without an exit status"
        );
    }

    #[test]
    fn configuration_errors_are_classified() {
        assert!(Error::ConflictingModes.is_configuration());
        assert!(Error::SubsystemArity(2).is_configuration());
        assert!(!Error::ChannelClosed.is_configuration());
        assert_eq!(Error::RemoteExit { status: 3 }.remote_exit_status(), Some(3));
    }
}
