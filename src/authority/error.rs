// ABOUTME: Errors raised while obtaining or decoding issued credentials.
// ABOUTME: AWS SDK failures are flattened into readable messages.

use russh::keys::ssh_key::certificate::CertType;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("GetInstanceAccessDetails for {instance:?} failed: {message}")]
    Request { instance: String, message: String },

    #[error("access details for {instance:?} are missing {field}")]
    MissingField {
        instance: String,
        field: &'static str,
    },

    #[error("host key #{index} is not valid: {reason}")]
    HostKey { index: usize, reason: String },

    #[error("certificate is not valid: {0}")]
    Certificate(String),

    #[error("expected an SSH user certificate but got: {kind:?}")]
    UnexpectedCertificateKind { kind: CertType },

    #[error("private key is not valid: {0}")]
    PrivateKey(#[from] russh::keys::Error),

    #[error("AWS profile {profile:?} cannot be used with an MFA code: {reason}")]
    Profile { profile: String, reason: String },

    #[error("AssumeRole for {role_arn:?} failed: {message}")]
    AssumeRole { role_arn: String, message: String },
}

pub type Result<T> = std::result::Result<T, Error>;

macro_rules! format_sdk_error {
    ($err:expr) => {{
        use aws_sdk_lightsail::error::SdkError;
        match &$err {
            SdkError::ServiceError(service_err) => format!("{:?}", service_err.err()),
            SdkError::TimeoutError(_) => "request timed out".to_string(),
            SdkError::DispatchFailure(dispatch) => {
                if dispatch.is_io() {
                    "network error".to_string()
                } else if dispatch.is_timeout() {
                    "connection timed out".to_string()
                } else {
                    format!("connection error: {:?}", dispatch)
                }
            }
            SdkError::ConstructionFailure(_) => "failed to construct request".to_string(),
            SdkError::ResponseError(resp) => format!("response error: {:?}", resp),
            _ => $err.to_string(),
        }
    }};
}

impl Error {
    pub(crate) fn request<E, R>(instance: &str, err: aws_sdk_lightsail::error::SdkError<E, R>) -> Self
    where
        E: std::error::Error + 'static,
        R: std::fmt::Debug,
    {
        Error::Request {
            instance: instance.to_string(),
            message: format_sdk_error!(err),
        }
    }

    pub(crate) fn assume_role<E, R>(role_arn: &str, err: aws_sdk_lightsail::error::SdkError<E, R>) -> Self
    where
        E: std::error::Error + 'static,
        R: std::fmt::Debug,
    {
        Error::AssumeRole {
            role_arn: role_arn.to_string(),
            message: format_sdk_error!(err),
        }
    }

    pub(crate) fn profile(profile: &str, reason: impl Into<String>) -> Self {
        Error::Profile {
            profile: profile.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn missing(instance: &str, field: &'static str) -> Self {
        Error::MissingField {
            instance: instance.to_string(),
            field,
        }
    }
}
