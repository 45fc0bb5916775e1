// ABOUTME: Command module aggregator for the lightsailssh CLI.
// ABOUTME: Re-exports the connect orchestration and its invocation settings.

mod connect;

pub use connect::{Invocation, check_login_user, connect};
