//! Line-oriented `KEY=VALUE` credential store, as written by dotenv tooling.

use crate::auth::{
    store::read_store, CredentialField, CredentialStore, Credentials, LoadError, SaveError,
};
use oauth2::AccessToken;
use std::{
    io,
    path::{Path, PathBuf},
};
use tracing::debug;

/// A dotenv-style file holding `CLIENT_ID`, `CLIENT_SECRET`, `ACCESS_TOKEN`
/// and `REFRESH_TOKEN` entries.
///
/// Loading is done by [`dotenvy`]. When a key appears more than once the
/// first entry wins, and that is also the entry rewritten by `save`.
///
/// Saving rewrites only the `ACCESS_TOKEN` line. Comments, blank lines,
/// unrelated entries and line endings are left as they were.
#[derive(Debug, Clone)]
pub struct EnvFileStore {
    path: PathBuf,
}

/// The key of a single line, if it is a well-formed entry.
fn line_key(line: &str) -> Option<String> {
    match dotenvy::from_read_iter(line.as_bytes()).next()? {
        Ok((key, _)) => Some(key),
        Err(_) => None,
    }
}

impl EnvFileStore {
    /// Create a store backed by the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Get the path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_error(&self, err: dotenvy::Error) -> LoadError {
        match err {
            dotenvy::Error::Io(err) if err.kind() == io::ErrorKind::NotFound => {
                LoadError::NotFound(self.path.clone())
            }
            dotenvy::Error::Io(err) => LoadError::Io(err),
            err => LoadError::Parse(err),
        }
    }
}

impl CredentialStore for EnvFileStore {
    fn load(&self) -> Result<Credentials, LoadError> {
        let entries = dotenvy::from_path_iter(&self.path).map_err(|err| self.load_error(err))?;

        let mut values: [Option<String>; 4] = Default::default();
        for entry in entries {
            let (key, value) = entry.map_err(|err| self.load_error(err))?;

            let Some(pos) = CredentialField::ALL
                .iter()
                .position(|field| field.env_key() == key)
            else {
                continue;
            };
            if values[pos].is_none() {
                values[pos] = Some(value);
            }
        }

        let [client_id, client_secret, access_token, refresh_token] =
            values.map(Option::unwrap_or_default);
        Ok(Credentials::new(
            client_id,
            client_secret,
            access_token,
            refresh_token,
        ))
    }

    fn save(&self, access_token: &AccessToken) -> Result<(), SaveError> {
        let key = CredentialField::AccessToken.env_key();
        let contents = read_store(&self.path, SaveError::NotFound, SaveError::Write)?;

        let mut updated = String::with_capacity(contents.len());
        let mut replaced = false;
        for line in contents.split_inclusive('\n') {
            let is_target = !replaced && line_key(line).is_some_and(|k| k == key);
            if !is_target {
                updated.push_str(line);
                continue;
            }

            let body = line.trim_end_matches(['\r', '\n']);
            updated.push_str(key);
            updated.push('=');
            updated.push_str(access_token.secret());
            updated.push_str(&line[body.len()..]);
            replaced = true;
        }

        if !replaced {
            return Err(SaveError::MissingEntry(CredentialField::AccessToken));
        }

        if updated == contents {
            debug!(path = %self.path.display(), "access token unchanged, skipping write");
            return Ok(());
        }

        std::fs::write(&self.path, updated).map_err(SaveError::Write)?;
        debug!(path = %self.path.display(), "persisted access token");
        Ok(())
    }
}
