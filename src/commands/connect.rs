// ABOUTME: Connect command: credentials, one SSH connection, one session.
// ABOUTME: Everything that can be checked locally is checked before the network is touched.

use crate::authority::CredentialSource;
use crate::error::{Error, Result};
use crate::session::{self, Plan, SessionOptions, Stdio};
use crate::ssh::{ClientConfig, Connection, with_port};
use std::time::Duration;
use tracing::debug;

/// Everything one run of the program was asked to do.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Invocation {
    pub session: SessionOptions,
    /// Destination followed by the remote command, if any.
    pub args: Vec<String>,
    pub connect_timeout: Option<Duration>,
}

/// Run the invocation against credentials issued by `source`.
///
/// The connection is closed on every path once established; a close
/// failure is reported alongside the session's own result.
pub async fn connect<S>(invocation: &Invocation, source: &S, stdio: &mut Stdio) -> Result<()>
where
    S: CredentialSource + ?Sized,
{
    let Plan { handler, target } = session::plan(&invocation.session, &invocation.args)?;

    let details = source.access_details(&target.instance).await?;
    check_login_user(target.user.as_deref(), &details.user)?;

    let address = with_port(&details.address, target.port);
    let mut config = ClientConfig::new(&details)?;
    if let Some(timeout) = invocation.connect_timeout {
        config = config.connect_timeout(timeout);
    }

    let connection = Connection::connect(config, &address).await?;
    debug!(?handler, "starting session");

    let outcome = handler.run(&connection, stdio).await.map_err(Error::from);
    let closed = connection.close().await.map_err(Error::from);
    Error::join([outcome, closed])
}

/// A user asked for explicitly must be the one credentials were issued to.
pub fn check_login_user(requested: Option<&str>, issued: &str) -> Result<()> {
    match requested {
        Some(requested) if requested != issued => Err(Error::LoginUserMismatch {
            requested: requested.to_string(),
            issued: issued.to_string(),
        }),
        _ => Ok(()),
    }
}
