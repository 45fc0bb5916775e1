// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Mirrors the ssh(1) flags scp and sftp rely on, plus AWS selectors.

use clap::Parser;
use sshexec::authority::LightsailOptions;
use sshexec::commands::Invocation;
use sshexec::session::SessionOptions;
use std::ffi::OsString;
use std::time::Duration;

const ABOUT: &str = "OpenSSH remote login client for Amazon Lightsail instances";

const LONG_ABOUT: &str = "\
OpenSSH remote login client for Amazon Lightsail instances.

Host and user authentication are handled with short-lived SSH user
certificates issued by the Lightsail GetInstanceAccessDetails API, so no
local key material is needed.

The destination is either [user@]instanceName or a URI of the form
ssh://[user@]instanceName[:port].

If a command is given it is executed on the instance. Its arguments are
quoted and appended to it, separated by spaces.";

const AFTER_HELP: &str = "\
Usage patterns:
  lightsailssh [flags] destination
  lightsailssh [flags] destination cmd [arg1 arg2 ...]
  lightsailssh --commands [flags] destination [cmd1 cmd2 ...]
  lightsailssh -s [flags] destination subsystem";

#[derive(Parser, Debug)]
#[command(name = "lightsailssh")]
#[command(about = ABOUT, long_about = LONG_ABOUT, after_help = AFTER_HELP)]
#[command(version)]
pub struct Cli {
    /// Treat each argument after the destination as a separate command,
    /// run in sequence on one connection until one fails
    #[arg(long)]
    pub commands: bool,

    /// The user to log in as on the instance
    #[arg(short = 'l', value_name = "USER")]
    pub login_user: Option<String>,

    /// Port to connect to on the instance
    #[arg(short = 'p', value_name = "PORT")]
    pub port: Option<u16>,

    /// Request a subsystem on the remote system (e.g. sftp); the subsystem
    /// is given as the remote command
    #[arg(short = 's')]
    pub subsystem: bool,

    /// Force pseudo-terminal allocation even when a command is given
    #[arg(short = 't')]
    pub force_tty: bool,

    /// Give up if the TCP connection or SSH handshake takes longer (e.g. "10s")
    #[arg(long, value_name = "DURATION", value_parser = humantime::parse_duration)]
    pub connect_timeout: Option<Duration>,

    /// Override the default Lightsail API URL
    #[arg(long, value_name = "URL")]
    pub endpoint_url: Option<String>,

    /// Fresh MFA code for the profile's assume-role settings
    #[arg(long, value_name = "CODE")]
    pub mfa: Option<String>,

    /// AWS CLI profile
    #[arg(long)]
    pub profile: Option<String>,

    /// AWS region to use
    #[arg(long)]
    pub region: Option<String>,

    /// Enable verbose logging on stderr
    #[arg(short, long)]
    pub verbose: bool,

    /// [user@]instance or ssh://[user@]instance[:port]
    pub destination: Option<String>,

    /// Remote command and its arguments
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}

impl Cli {
    /// Parse the process arguments after dropping ssh(1) options we ignore.
    pub fn parse_filtered() -> Self {
        Self::parse_from(drop_unsupported_flags(std::env::args_os()))
    }

    pub fn invocation(&self) -> Invocation {
        Invocation {
            session: SessionOptions {
                login_user: self.login_user.clone(),
                port: self.port,
                with_subsystem: self.subsystem,
                batch_commands: self.commands,
                force_pseudo_terminal: self.force_tty,
            },
            args: self
                .destination
                .iter()
                .chain(&self.command)
                .cloned()
                .collect(),
            connect_timeout: self.connect_timeout,
        }
    }

    pub fn lightsail(&self) -> LightsailOptions {
        LightsailOptions {
            profile: self.profile.clone(),
            region: self.region.clone(),
            endpoint_url: self.endpoint_url.clone(),
            mfa_code: self.mfa.clone(),
        }
    }
}

/// Remove ssh(1) options that tools like scp pass but we do not support.
///
/// Drops `-x`, `-oOption`, and `-o Option` until the first `--`. The
/// program name is never touched.
pub fn drop_unsupported_flags<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator,
    I::Item: Into<OsString>,
{
    let mut kept = Vec::new();
    let mut filtering = true;
    let mut skip_value = false;

    for (index, arg) in args.into_iter().map(Into::into).enumerate() {
        if arg == "--" {
            filtering = false;
        }
        if index != 0 && filtering {
            if skip_value {
                skip_value = false;
                continue;
            }
            if arg == "-x" || is_inline_option(&arg) {
                continue;
            }
            if arg == "-o" {
                skip_value = true;
                continue;
            }
        }
        kept.push(arg);
    }
    kept
}

/// `-oName=value` or `-oName` with the option glued to the flag.
fn is_inline_option(arg: &OsString) -> bool {
    arg.to_str()
        .and_then(|s| s.strip_prefix("-o"))
        .and_then(|rest| rest.chars().next())
        .is_some_and(|c| !c.is_whitespace())
}
