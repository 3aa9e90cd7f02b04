use aws_sdk_secretsmanager::error::ProvideErrorMetadata;
use aws_sdk_secretsmanager::Client as SecretsClient;
use serde::Deserialize;
use std::fmt;
use thiserror::Error;
use tracing::{debug, instrument};

#[cfg(test)]
use mockall::automock;

#[cfg(test)]
pub use MockCredentialResolver as Resolver;
#[cfg(not(test))]
pub use CredentialResolver as Resolver;

/// Database credentials resolved from a managed secret.
///
/// Ephemeral: resolved fresh on every persistence attempt and
/// discarded after use. Never logged; `Debug` redacts the password.
#[derive(Clone, Deserialize)]
pub struct DbCredentials {
    pub username: String,
    pub password: String,
    pub host: String,
    pub dbname: String,
}

impl fmt::Debug for DbCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("host", &self.host)
            .field("dbname", &self.dbname)
            .finish()
    }
}

/// Failure to resolve a secret. The variants exist for observability;
/// callers treat them all the same way and skip persistence.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("access denied for secret {name}")]
    AccessDenied { name: String },
    #[error("secret {name} not found")]
    NotFound { name: String },
    #[error("secret {name} is not a valid credential bundle")]
    Malformed { name: String },
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Secret-retrieval capability backed by Secrets Manager
#[derive(Clone, Debug)]
pub struct CredentialResolver {
    inner: SecretsClient,
}

#[cfg_attr(test, automock)]
impl CredentialResolver {
    pub fn new(inner: SecretsClient) -> Self {
        Self { inner }
    }

    /// Resolve database credentials from the named secret.
    ///
    /// Single attempt, no retry, no caching across invocations.
    #[instrument(skip(self))]
    pub async fn resolve(&self, secret_name: &str) -> Result<DbCredentials, CredentialError> {
        debug!(secret = %secret_name, "resolving database credentials");

        let response = self
            .inner
            .get_secret_value()
            .secret_id(secret_name)
            .send()
            .await
            .map_err(|err| match err.code() {
                Some("AccessDeniedException") => CredentialError::AccessDenied {
                    name: secret_name.to_string(),
                },
                Some("ResourceNotFoundException") => CredentialError::NotFound {
                    name: secret_name.to_string(),
                },
                _ => CredentialError::Other(anyhow::Error::new(err)),
            })?;

        let secret_string = response
            .secret_string()
            .ok_or_else(|| CredentialError::Malformed {
                name: secret_name.to_string(),
            })?;

        let credentials = serde_json::from_str(secret_string).map_err(|_| {
            CredentialError::Malformed {
                name: secret_name.to_string(),
            }
        })?;

        debug!(secret = %secret_name, "database credentials resolved");

        Ok(credentials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_parse_from_secret_json() {
        let secret = r#"{
            "username": "test_user",
            "password": "test_pass",
            "host": "test_host",
            "dbname": "test_db"
        }"#;

        let credentials: DbCredentials = serde_json::from_str(secret).expect("valid bundle");

        assert_eq!(credentials.username, "test_user");
        assert_eq!(credentials.password, "test_pass");
        assert_eq!(credentials.host, "test_host");
        assert_eq!(credentials.dbname, "test_db");
    }

    #[test]
    fn test_credentials_with_missing_field_are_malformed() {
        let secret = r#"{"username": "test_user", "password": "test_pass"}"#;
        assert!(serde_json::from_str::<DbCredentials>(secret).is_err());
    }

    #[test]
    fn test_debug_redacts_password() {
        let credentials = DbCredentials {
            username: "test_user".to_string(),
            password: "hunter2".to_string(),
            host: "test_host".to_string(),
            dbname: "test_db".to_string(),
        };

        let rendered = format!("{:?}", credentials);
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("hunter2"));
    }
}
