use crate::auth::{
    store::read_store, CredentialField, CredentialStore, Credentials, LoadError, SaveError,
};
use oauth2::AccessToken;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// On-disk shape of the secrets document. Absent or `null` values load as
/// empty strings.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct SecretsDocument {
    client_id: Option<String>,
    client_secret: Option<String>,
    access_token: Option<String>,
    refresh_token: Option<String>,
}

/// A JSON document holding `ClientId`, `ClientSecret`, `AccessToken` and
/// `RefreshToken` string fields.
///
/// Saving rewrites the whole document, indented. Other keys, including ones
/// this crate does not know about, keep their values and their order.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Create a store backed by the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Get the path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStore for JsonFileStore {
    fn load(&self) -> Result<Credentials, LoadError> {
        let contents = read_store(&self.path, LoadError::NotFound, LoadError::Io)?;
        let doc: SecretsDocument = serde_json::from_str(&contents).map_err(LoadError::Json)?;

        Ok(Credentials::new(
            doc.client_id.unwrap_or_default(),
            doc.client_secret.unwrap_or_default(),
            doc.access_token.unwrap_or_default(),
            doc.refresh_token.unwrap_or_default(),
        ))
    }

    fn save(&self, access_token: &AccessToken) -> Result<(), SaveError> {
        let contents = read_store(&self.path, SaveError::NotFound, SaveError::Write)?;

        let mut doc: serde_json::Value = serde_json::from_str(&contents)
            .map_err(|err| SaveError::Malformed(err.to_string()))?;
        let Some(fields) = doc.as_object_mut() else {
            return Err(SaveError::Malformed("expected a JSON object".to_owned()));
        };
        fields.insert(
            CredentialField::AccessToken.json_key().to_owned(),
            access_token.secret().as_str().into(),
        );

        let updated = serde_json::to_string_pretty(&doc)
            .map_err(|err| SaveError::Malformed(err.to_string()))?;
        std::fs::write(&self.path, updated).map_err(SaveError::Write)?;

        debug!(path = %self.path.display(), "persisted access token");
        Ok(())
    }
}
