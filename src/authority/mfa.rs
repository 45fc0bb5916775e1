// ABOUTME: Temporary AWS credentials from a profile's assume-role settings and a fresh MFA code.
// ABOUTME: Reads role_arn, mfa_serial and source_profile, then calls STS AssumeRole.

use super::error::{Error, Result};
use aws_config::profile::profile_file::ProfileFiles;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_lightsail::config::Credentials;
use aws_types::os_shim_internal::{Env, Fs};
use std::borrow::Cow;
use std::time::SystemTime;
use tracing::debug;

/// Session name recorded by STS for the assumed role.
const ROLE_SESSION_NAME: &str = "lightsailssh";

/// Assume-role settings of one profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MfaRole {
    pub profile: String,
    pub role_arn: String,
    pub serial_number: String,
    /// Profile holding the long-term credentials used to call STS.
    pub source_profile: Option<String>,
}

impl MfaRole {
    /// Pick the assume-role settings out of `profile`'s properties.
    pub fn from_properties(profile: &str, property: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let role_arn = property("role_arn")
            .filter(|v| !v.is_empty())
            .ok_or_else(|| Error::profile(profile, "no role_arn is configured"))?;
        let serial_number = property("mfa_serial")
            .filter(|v| !v.is_empty())
            .ok_or_else(|| Error::profile(profile, "no mfa_serial is configured"))?;
        Ok(Self {
            profile: profile.to_string(),
            role_arn,
            serial_number,
            source_profile: property("source_profile").filter(|v| !v.is_empty()),
        })
    }

    /// Look up the selected profile in the shared AWS config files.
    pub async fn load(profile: Option<&str>) -> Result<Self> {
        let set = aws_config::profile::load(
            &Fs::real(),
            &Env::real(),
            &ProfileFiles::default(),
            profile.map(|name| Cow::Owned(name.to_string())),
        )
        .await
        .map_err(|e| Error::profile(profile.unwrap_or("default"), e.to_string()))?;

        let name = set.selected_profile().to_string();
        let selected = set
            .get_profile(&name)
            .ok_or_else(|| Error::profile(&name, "profile is not defined"))?;
        Self::from_properties(&name, |key| selected.get(key).map(str::to_string))
    }

    /// Exchange `code` for temporary credentials of the role.
    pub async fn assume(&self, code: &str, region: Option<Region>) -> Result<Credentials> {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(source) = &self.source_profile {
            loader = loader.profile_name(source);
        }
        if let Some(region) = region {
            loader = loader.region(region);
        }
        let source: SdkConfig = loader.load().await;

        debug!(
            profile = %self.profile,
            role = %self.role_arn,
            "assuming role with MFA code"
        );
        let output = aws_sdk_sts::Client::new(&source)
            .assume_role()
            .role_arn(&self.role_arn)
            .role_session_name(ROLE_SESSION_NAME)
            .serial_number(&self.serial_number)
            .token_code(code)
            .send()
            .await
            .map_err(|e| Error::assume_role(&self.role_arn, e))?;

        let issued = output
            .credentials()
            .ok_or_else(|| Error::profile(&self.profile, "AssumeRole returned no credentials"))?;
        Ok(Credentials::new(
            issued.access_key_id(),
            issued.secret_access_key(),
            Some(issued.session_token().to_string()),
            SystemTime::try_from(*issued.expiration()).ok(),
            "lightsailssh-mfa",
        ))
    }
}
