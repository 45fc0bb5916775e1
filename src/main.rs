// ABOUTME: Entry point for the lightsailssh CLI application.
// ABOUTME: Parses arguments, fetches Lightsail credentials, and runs one SSH session.

mod cli;

use cli::Cli;
use sshexec::authority::LightsailAuthority;
use sshexec::commands;
use sshexec::session::{self, Stdio};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse_filtered();

    // Stdout carries the remote byte stream, so logs go to stderr.
    let default = if cli.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let code = match run(&cli).await {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {e}");
            e.exit_code()
        }
    };

    // Exit explicitly: a pending stdin read would otherwise hold the runtime open.
    std::process::exit(code);
}

async fn run(cli: &Cli) -> sshexec::error::Result<()> {
    let invocation = cli.invocation();
    // Reject bad flags and destinations before resolving AWS configuration.
    session::plan(&invocation.session, &invocation.args)?;
    let authority = LightsailAuthority::from_options(&cli.lightsail()).await?;
    commands::connect(&invocation, &authority, &mut Stdio::inherit()).await
}
