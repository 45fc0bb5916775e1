// ABOUTME: Credential sources that issue SSH access details for a named target.
// ABOUTME: Includes the Amazon Lightsail authority, MFA role assumption, and issued key parsing.

mod error;
mod lightsail;
mod material;
mod mfa;

pub use error::{Error, Result};
pub use lightsail::{LightsailAuthority, LightsailOptions};
pub use material::{parse_host_key, parse_private_key, parse_user_certificate};
pub use mfa::MfaRole;

use crate::ssh::AccessDetails;
use async_trait::async_trait;

/// Issues short-lived SSH credentials for a target.
#[async_trait]
pub trait CredentialSource: Send + Sync {
    async fn access_details(&self, target: &str) -> Result<AccessDetails>;
}
