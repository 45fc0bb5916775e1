// ABOUTME: Library root for sshexec - certificate-authenticated SSH sessions.
// ABOUTME: The lightsailssh binary is in main.rs.

pub mod authority;
pub mod commands;
pub mod error;
pub mod session;
pub mod ssh;
