use crate::auth::{Credentials, CredentialField, EnvFileStore, JsonFileStore};
use oauth2::AccessToken;
use std::{
    fmt, io,
    path::{Path, PathBuf},
};

/// Errors that can occur when loading credentials from a store.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The backing file does not exist.
    #[error("credential store {} not found", .0.display())]
    NotFound(PathBuf),
    /// The backing file could not be read.
    #[error("failed to read credential store: {0}")]
    Io(#[source] io::Error),
    /// A `KEY=VALUE` store has a malformed entry.
    #[error("malformed credential store entry")]
    Parse(#[source] dotenvy::Error),
    /// A JSON store is not a valid document.
    #[error("malformed credential store document: {0}")]
    Json(#[source] serde_json::Error),
}

/// Errors that can occur when persisting a refreshed access token.
#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    /// The backing file vanished after it was loaded.
    #[error("credential store {} not found", .0.display())]
    NotFound(PathBuf),
    /// The store has no entry for the field being updated.
    #[error("credential store has no {0} entry")]
    MissingEntry(CredentialField),
    /// The store's existing contents could not be parsed for update.
    #[error("credential store document is malformed: {0}")]
    Malformed(String),
    /// Reading or writing the backing file failed.
    #[error("failed to write credential store: {0}")]
    Write(#[source] io::Error),
}

/// Durable storage for [`Credentials`].
///
/// Stores are read once at startup and written whenever the access token is
/// refreshed. Only the access token is ever written back.
pub trait CredentialStore: fmt::Debug + Send + Sync {
    /// Read all credentials from the backing store. Fields that are absent
    /// from the store are returned empty.
    fn load(&self) -> Result<Credentials, LoadError>;

    /// Persist a new access token, leaving every other stored value intact.
    ///
    /// Saving the same token twice leaves the store byte-identical.
    fn save(&self, access_token: &AccessToken) -> Result<(), SaveError>;

    /// Load credentials, falling back to empty values if the store cannot be
    /// read. Missing values are caught by [`Credentials::ensure_complete`]
    /// before any request is made.
    fn load_or_empty(&self) -> Credentials {
        self.load()
            .inspect_err(|err| tracing::error!(%err, "failed to load credentials"))
            .unwrap_or_default()
    }
}

/// Pick a store for the path. A `.json` extension selects the
/// [`JsonFileStore`], anything else the line-oriented [`EnvFileStore`].
pub fn store_for_path(path: impl AsRef<Path>) -> Box<dyn CredentialStore> {
    let path = path.as_ref();
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        Box::new(JsonFileStore::new(path))
    } else {
        Box::new(EnvFileStore::new(path))
    }
}

/// Read the file, mapping a missing file to the store's own not-found error.
pub(crate) fn read_store<E>(
    path: &Path,
    not_found: impl FnOnce(PathBuf) -> E,
    other: impl FnOnce(io::Error) -> E,
) -> Result<String, E> {
    std::fs::read_to_string(path).map_err(|err| match err.kind() {
        io::ErrorKind::NotFound => not_found(path.to_owned()),
        _ => other(err),
    })
}
