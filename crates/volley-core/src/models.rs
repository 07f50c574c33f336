use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Credentials exchanged for a session. Never persisted.
#[derive(Clone, Serialize)]
pub struct AuthCredentials {
    pub identifier: String,
    #[serde(rename = "password")]
    pub secret: String,
}

impl AuthCredentials {
    pub fn new(identifier: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            secret: secret.into(),
        }
    }

    /// Read credentials from `HANDLE` and `PASSWORD`.
    pub fn from_env() -> Result<Self, AppError> {
        Self::resolve(std::env::var("HANDLE").ok(), std::env::var("PASSWORD").ok())
    }

    /// Build credentials from optional values, failing on missing or blank ones.
    pub fn resolve(identifier: Option<String>, secret: Option<String>) -> Result<Self, AppError> {
        let identifier = identifier
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| AppError::ConfigError("HANDLE not set. Required to authenticate.".into()))?;
        let secret = secret
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                AppError::ConfigError("PASSWORD not set. Required to authenticate.".into())
            })?;

        Ok(Self { identifier, secret })
    }
}

impl fmt::Debug for AuthCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthCredentials")
            .field("identifier", &self.identifier)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Session returned by a successful authentication.
///
/// Only a non-empty access token is required; everything else defaults when
/// missing. Both the `*Jwt` and `*Token` spellings are accepted, together or
/// alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthResult {
    pub access_token: String,
    pub refresh_token: String,
    pub account_id: String,
    pub handle: String,
    pub email: String,
    pub email_confirmed: bool,
    pub email_auth_factor: bool,
    pub active: bool,
    pub did_doc: DidDocument,
}

/// Wire shape of a session body, one field per accepted name.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionBody {
    access_jwt: Option<String>,
    access_token: Option<String>,
    refresh_jwt: Option<String>,
    refresh_token: Option<String>,
    did: Option<String>,
    account_id: Option<String>,
    #[serde(rename = "accountID")]
    account_id_upper: Option<String>,
    #[serde(default)]
    handle: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    email_confirmed: bool,
    #[serde(default)]
    email_auth_factor: bool,
    #[serde(default)]
    active: bool,
    #[serde(default)]
    did_doc: DidDocument,
}

fn first_non_empty(candidates: [Option<String>; 3]) -> Option<String> {
    candidates.into_iter().flatten().find(|v| !v.is_empty())
}

impl SessionBody {
    fn into_session(self) -> Result<AuthResult, &'static str> {
        let access_token = first_non_empty([self.access_jwt, self.access_token, None])
            .ok_or("missing access token: expected a non-empty accessJwt or accessToken")?;

        Ok(AuthResult {
            access_token,
            refresh_token: first_non_empty([self.refresh_jwt, self.refresh_token, None])
                .unwrap_or_default(),
            account_id: first_non_empty([self.did, self.account_id, self.account_id_upper])
                .unwrap_or_default(),
            handle: self.handle,
            email: self.email,
            email_confirmed: self.email_confirmed,
            email_auth_factor: self.email_auth_factor,
            active: self.active,
            did_doc: self.did_doc,
        })
    }
}

impl<'de> Deserialize<'de> for AuthResult {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        SessionBody::deserialize(deserializer)?
            .into_session()
            .map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for AuthResult {
    /// One-line summary that never includes tokens.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "handle={} did={} active={}",
            self.handle, self.account_id, self.active
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DidDocument {
    #[serde(rename = "@context", default)]
    pub context: Vec<String>,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub also_known_as: Vec<String>,
    #[serde(default)]
    pub verification_method: Vec<VerificationMethod>,
    #[serde(default)]
    pub service: Vec<Service>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationMethod {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default)]
    pub method_type: String,
    #[serde(default)]
    pub controller: String,
    #[serde(default)]
    pub public_key_multibase: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default)]
    pub service_type: String,
    #[serde(default)]
    pub service_endpoint: String,
}

/// Result of one fetch, delivered through the outcome channel.
#[derive(Debug)]
pub enum RequestOutcome {
    Success { url: String, body: Vec<u8> },
    Failure { url: String, error: AppError },
}

impl RequestOutcome {
    pub fn from_result(url: String, result: Result<Vec<u8>, AppError>) -> Self {
        match result {
            Ok(body) => RequestOutcome::Success { url, body },
            Err(error) => RequestOutcome::Failure { url, error },
        }
    }

    pub fn url(&self) -> &str {
        match self {
            RequestOutcome::Success { url, .. } | RequestOutcome::Failure { url, .. } => url,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RequestOutcome::Success { .. })
    }

    pub fn body(&self) -> Option<&[u8]> {
        match self {
            RequestOutcome::Success { body, .. } => Some(body),
            RequestOutcome::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&AppError> {
        match self {
            RequestOutcome::Success { .. } => None,
            RequestOutcome::Failure { error, .. } => Some(error),
        }
    }
}
