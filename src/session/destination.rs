// ABOUTME: Destination argument parsing.
// ABOUTME: Accepts [user@]instance and ssh://[user@]instance[:port].

use super::error::{Error, Result};
use crate::ssh::DEFAULT_PORT;
use std::str::FromStr;

const SCHEME: &str = "ssh://";

/// A parsed destination argument. The port is left unset unless written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Destination {
    pub user: Option<String>,
    pub instance: String,
    pub port: Option<u16>,
}

/// Destination after flag overrides, with the port defaulted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub user: Option<String>,
    pub instance: String,
    pub port: u16,
}

impl Destination {
    pub fn parse(input: &str) -> Result<Self> {
        let destination = match input.strip_prefix(SCHEME) {
            Some(rest) => parse_uri(input, rest)?,
            None => {
                let (user, instance) = match input.split_once('@') {
                    Some((user, instance)) => (non_empty(user), instance),
                    None => (None, input),
                };
                Destination {
                    user,
                    instance: instance.to_string(),
                    port: None,
                }
            }
        };

        if destination.instance.is_empty() {
            return Err(Error::invalid_destination(input, "no instance name"));
        }
        Ok(destination)
    }

    /// Apply flag overrides, then fall back to the default port.
    ///
    /// Flags always beat values parsed from the destination.
    pub fn resolve(self, login_user: Option<&str>, port: Option<u16>) -> Target {
        Target {
            user: login_user.map(str::to_string).or(self.user),
            instance: self.instance,
            port: port.or(self.port).unwrap_or(DEFAULT_PORT),
        }
    }
}

impl FromStr for Destination {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}

fn parse_uri(input: &str, rest: &str) -> Result<Destination> {
    let authority = rest
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default();

    let (userinfo, hostport) = match authority.rsplit_once('@') {
        Some((userinfo, hostport)) => (Some(userinfo), hostport),
        None => (None, authority),
    };

    let user = match userinfo {
        Some(info) => {
            let name = info.split(':').next().unwrap_or_default();
            let decoded = urlencoding::decode(name)
                .map_err(|e| Error::invalid_destination(input, format!("bad user name: {e}")))?;
            non_empty(&decoded)
        }
        None => None,
    };

    let (host, port) = if let Some(bracketed) = hostport.strip_prefix('[') {
        let (host, after) = bracketed
            .split_once(']')
            .ok_or_else(|| Error::invalid_destination(input, "missing ']' in host"))?;
        let port = match after {
            "" => None,
            p => Some(
                p.strip_prefix(':')
                    .ok_or_else(|| Error::invalid_destination(input, "unexpected text after host"))?,
            ),
        };
        (host, port)
    } else {
        match hostport.split_once(':') {
            Some((host, port)) => (host, Some(port)),
            None => (hostport, None),
        }
    };

    if let Some(c) = host.chars().find(|c| c.is_whitespace() || c.is_control()) {
        return Err(Error::invalid_destination(
            input,
            format!("invalid character {c:?} in host name"),
        ));
    }

    let port = match port {
        None | Some("") => None,
        Some(p) => Some(
            p.parse::<u16>()
                .map_err(|_| Error::invalid_destination(input, format!("invalid port {p:?}")))?,
        ),
    };

    Ok(Destination {
        user,
        instance: host.to_string(),
        port,
    })
}
