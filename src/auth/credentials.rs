use crate::utils::from_env::FromEnvVar;
use core::fmt;
use oauth2::{AccessToken, ClientId, ClientSecret, RefreshToken};
use tracing::debug;

/// One of the four secret values needed to call the leaderboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialField {
    /// Application client ID.
    ClientId,
    /// Application client secret.
    ClientSecret,
    /// Bearer token sent with leaderboard requests.
    AccessToken,
    /// Token exchanged for a new access token.
    RefreshToken,
}

impl CredentialField {
    /// All fields, in the order they are checked and reported.
    pub const ALL: [Self; 4] = [
        Self::ClientId,
        Self::ClientSecret,
        Self::AccessToken,
        Self::RefreshToken,
    ];

    /// Key used by the line-oriented `KEY=VALUE` store.
    pub const fn env_key(self) -> &'static str {
        match self {
            Self::ClientId => "CLIENT_ID",
            Self::ClientSecret => "CLIENT_SECRET",
            Self::AccessToken => "ACCESS_TOKEN",
            Self::RefreshToken => "REFRESH_TOKEN",
        }
    }

    /// Key used by the JSON document store.
    pub const fn json_key(self) -> &'static str {
        match self {
            Self::ClientId => "ClientId",
            Self::ClientSecret => "ClientSecret",
            Self::AccessToken => "AccessToken",
            Self::RefreshToken => "RefreshToken",
        }
    }
}

impl fmt::Display for CredentialField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.env_key())
    }
}

/// The credential fields that were empty when a request was attempted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingCredentials(Vec<CredentialField>);

impl MissingCredentials {
    /// The empty fields.
    pub fn fields(&self) -> &[CredentialField] {
        &self.0
    }
}

impl fmt::Display for MissingCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, field) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            fmt::Display::fmt(field, f)?;
        }
        Ok(())
    }
}

impl core::error::Error for MissingCredentials {}

/// The secrets used to authenticate with the leaderboard and token endpoints.
///
/// Values are held in [`oauth2`] secret types, so the [`Debug`] output never
/// contains the secrets themselves. Only the access token changes over the
/// life of the process.
#[derive(Debug, Clone)]
pub struct Credentials {
    client_id: ClientId,
    client_secret: ClientSecret,
    access_token: AccessToken,
    refresh_token: RefreshToken,
}

impl Default for Credentials {
    fn default() -> Self {
        Self::new("", "", "", "")
    }
}

impl Credentials {
    /// Create a new set of credentials.
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
    ) -> Self {
        Self {
            client_id: ClientId::new(client_id.into()),
            client_secret: ClientSecret::new(client_secret.into()),
            access_token: AccessToken::new(access_token.into()),
            refresh_token: RefreshToken::new(refresh_token.into()),
        }
    }

    /// Get the client ID.
    pub const fn client_id(&self) -> &ClientId {
        &self.client_id
    }

    /// Get the client secret.
    pub const fn client_secret(&self) -> &ClientSecret {
        &self.client_secret
    }

    /// Get the current access token.
    pub const fn access_token(&self) -> &AccessToken {
        &self.access_token
    }

    /// Get the refresh token.
    pub const fn refresh_token(&self) -> &RefreshToken {
        &self.refresh_token
    }

    /// Replace the access token, returning the old one.
    pub fn set_access_token(&mut self, access_token: AccessToken) -> AccessToken {
        std::mem::replace(&mut self.access_token, access_token)
    }

    fn value(&self, field: CredentialField) -> &str {
        match field {
            CredentialField::ClientId => self.client_id.as_str(),
            CredentialField::ClientSecret => self.client_secret.secret(),
            CredentialField::AccessToken => self.access_token.secret(),
            CredentialField::RefreshToken => self.refresh_token.secret(),
        }
    }

    /// Fill empty fields from the process environment, under the same keys
    /// as the `KEY=VALUE` store. Values already loaded are never replaced.
    pub fn fill_from_env(&mut self) {
        for field in CredentialField::ALL {
            if !self.value(field).is_empty() {
                continue;
            }
            let Ok(Some(value)) = Option::<String>::from_env_var(field.env_key()) else {
                continue;
            };

            debug!(%field, "credential read from the environment");
            match field {
                CredentialField::ClientId => self.client_id = ClientId::new(value),
                CredentialField::ClientSecret => self.client_secret = ClientSecret::new(value),
                CredentialField::AccessToken => self.access_token = AccessToken::new(value),
                CredentialField::RefreshToken => self.refresh_token = RefreshToken::new(value),
            }
        }
    }

    /// Check that no field is empty.
    pub fn ensure_complete(&self) -> Result<(), MissingCredentials> {
        let missing: Vec<_> = CredentialField::ALL
            .into_iter()
            .filter(|field| self.value(*field).is_empty())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(MissingCredentials(missing))
        }
    }
}
