pub(crate) mod credentials;
pub use credentials::{CredentialField, Credentials, MissingCredentials};

pub(crate) mod env_file;
pub use env_file::EnvFileStore;

pub(crate) mod json_file;
pub use json_file::JsonFileStore;

pub mod refresh;

pub(crate) mod store;
pub use store::{store_for_path, CredentialStore, LoadError, SaveError};
