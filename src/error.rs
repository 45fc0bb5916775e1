// ABOUTME: Application-wide error types for sshexec.
// ABOUTME: Wraps each layer's errors and maps failures to process exit codes.

use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Session(#[from] crate::session::Error),

    #[error(transparent)]
    Credential(#[from] crate::authority::Error),

    #[error(transparent)]
    Ssh(#[from] crate::ssh::Error),

    #[error("login user {requested:?} does not match user {issued:?} returned by the credential source")]
    LoginUserMismatch { requested: String, issued: String },

    #[error("{}", joined(.0))]
    Multiple(Vec<Error>),
}

/// Display every error on one line.
pub(crate) fn joined<E: fmt::Display>(errors: &[E]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Fold results into one: success, the only failure, or all failures wrapped by `multiple`.
pub(crate) fn fold<E>(
    results: impl IntoIterator<Item = std::result::Result<(), E>>,
    multiple: fn(Vec<E>) -> E,
) -> std::result::Result<(), E> {
    let mut errors: Vec<E> = results.into_iter().filter_map(std::result::Result::err).collect();
    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0)),
        _ => Err(multiple(errors)),
    }
}

impl Error {
    /// Fold results into one, keeping every failure.
    pub fn join(results: impl IntoIterator<Item = Result<()>>) -> Result<()> {
        fold(results, Error::Multiple)
    }

    /// Process exit status for this failure.
    ///
    /// A remote command's own non-zero status is passed through, like ssh(1);
    /// everything else exits with 1.
    pub fn exit_code(&self) -> i32 {
        self.remote_exit_status()
            .and_then(|status| i32::try_from(status).ok())
            .filter(|&code| code > 0 && code < 256)
            .unwrap_or(1)
    }

    fn remote_exit_status(&self) -> Option<u32> {
        match self {
            Error::Session(e) => e.remote_exit_status(),
            Error::Multiple(errors) => errors.iter().find_map(Error::remote_exit_status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session;

    #[test]
    fn remote_exit_status_passes_through() {
        let err = Error::from(session::Error::RemoteExit { status: 7 });
        assert_eq!(err.exit_code(), 7);
    }

    #[test]
    fn out_of_range_status_maps_to_one() {
        let err = Error::from(session::Error::RemoteExit { status: 300 });
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn other_failures_exit_with_one() {
        assert_eq!(Error::from(session::Error::ChannelClosed).exit_code(), 1);
        assert_eq!(Error::from(crate::ssh::Error::MissingSigner).exit_code(), 1);
        let mismatch = Error::LoginUserMismatch {
            requested: "root".into(),
            issued: "ubuntu".into(),
        };
        assert_eq!(mismatch.exit_code(), 1);
    }

    #[test]
    fn status_survives_cleanup_failures() {
        let err = Error::join([
            Err(session::Error::RemoteExit { status: 4 }.into()),
            Err(crate::ssh::Error::MissingSigner.into()),
        ])
        .unwrap_err();
        assert_eq!(err.exit_code(), 4);
        assert!(err.to_string().contains("; "));
    }

    #[test]
    fn mismatch_names_both_users() {
        let err = Error::LoginUserMismatch {
            requested: "root".into(),
            issued: "ubuntu".into(),
        };
        assert_eq!(
            err.to_string(),
            r#"login user "root" does not match user "ubuntu" returned by the credential source"#
        );
    }
}
