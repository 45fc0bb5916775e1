// ABOUTME: Amazon Lightsail credential source backed by GetInstanceAccessDetails.
// ABOUTME: Turns the issued username, address, host keys, certificate and key into AccessDetails.

use super::error::{Error, Result};
use super::material::{parse_host_key, parse_private_key, parse_user_certificate};
use super::mfa::MfaRole;
use super::CredentialSource;
use crate::ssh::{AccessDetails, DEFAULT_PORT, join_host_port};
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_lightsail::Client;
use aws_sdk_lightsail::types::{InstanceAccessDetails, InstanceAccessProtocol};
use std::sync::Arc;
use tracing::debug;

/// AWS settings layered over the environment and shared profile chain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LightsailOptions {
    pub profile: Option<String>,
    pub region: Option<String>,
    pub endpoint_url: Option<String>,
    /// One-time code for a profile that assumes a role behind MFA.
    pub mfa_code: Option<String>,
}

pub struct LightsailAuthority {
    client: Client,
}

impl LightsailAuthority {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Resolve AWS configuration and build a Lightsail client.
    ///
    /// With an MFA code the profile's role is assumed up front and its
    /// temporary credentials replace the ones the profile chain would use.
    pub async fn from_options(options: &LightsailOptions) -> Result<Self> {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(profile) = &options.profile {
            loader = loader.profile_name(profile);
        }
        if let Some(region) = &options.region {
            loader = loader.region(Region::new(region.clone()));
        }
        let shared = loader.load().await;

        let mut config = aws_sdk_lightsail::config::Builder::from(&shared);
        if let Some(url) = &options.endpoint_url {
            debug!(endpoint = %url, "using custom Lightsail endpoint");
            config = config.endpoint_url(url);
        }
        if let Some(code) = &options.mfa_code {
            let role = MfaRole::load(options.profile.as_deref()).await?;
            let credentials = role.assume(code, shared.region().cloned()).await?;
            config = config.credentials_provider(credentials);
        }
        Ok(Self::new(Client::from_conf(config.build())))
    }
}

#[async_trait]
impl CredentialSource for LightsailAuthority {
    async fn access_details(&self, target: &str) -> Result<AccessDetails> {
        debug!(instance = %target, "requesting instance access details");
        let output = self
            .client
            .get_instance_access_details()
            .instance_name(target)
            .protocol(InstanceAccessProtocol::Ssh)
            .send()
            .await
            .map_err(|e| Error::request(target, e))?;

        let issued = output
            .access_details()
            .ok_or_else(|| Error::missing(target, "accessDetails"))?;
        details_from(target, issued)
    }
}

/// Build access details from what Lightsail issued for `instance`.
///
/// An empty certificate means plain key authentication.
pub fn details_from(instance: &str, issued: &InstanceAccessDetails) -> Result<AccessDetails> {
    let address = issued
        .ip_address()
        .filter(|ip| !ip.is_empty())
        .ok_or_else(|| Error::missing(instance, "ipAddress"))?;
    let user = issued
        .username()
        .filter(|u| !u.is_empty())
        .ok_or_else(|| Error::missing(instance, "username"))?;
    let pem = issued
        .private_key()
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| Error::missing(instance, "privateKey"))?;

    let known_host_keys = issued
        .host_keys()
        .iter()
        .enumerate()
        .filter_map(|(index, attrs)| attrs.public_key().map(|key| (index, key)))
        .map(|(index, key)| parse_host_key(index, key))
        .collect::<Result<Vec<_>>>()?;

    let cert = match issued.cert_key().map(str::trim) {
        Some(text) if !text.is_empty() => Some(parse_user_certificate(text)?),
        _ => None,
    };

    let signer = parse_private_key(pem)?;

    debug!(
        instance,
        user,
        host_keys = known_host_keys.len(),
        certificate = cert.is_some(),
        "access details issued"
    );

    Ok(AccessDetails {
        user: user.to_string(),
        address: join_host_port(address, DEFAULT_PORT),
        known_host_keys,
        cert,
        signer: Some(Arc::new(signer)),
    })
}
