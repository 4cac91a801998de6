//! Fetch the Twitch bits leaderboard, recovering from an expired access token.
//!
//! The [`LeaderboardClient`] sends a single authenticated request. If the
//! leaderboard answers 401, it exchanges the stored refresh token for a new
//! access token, persists it through a [`CredentialStore`], and retries the
//! request exactly once.
//!
//! [`LeaderboardClient`]: leaderboard::LeaderboardClient
//! [`CredentialStore`]: auth::CredentialStore
#![warn(
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    clippy::missing_const_for_fn,
    rustdoc::all
)]
#![deny(unused_must_use, rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

/// Credentials and the stores that persist them.
pub mod auth;

/// Crate error types.
pub mod error;

/// The leaderboard client and its configuration.
pub mod leaderboard;

pub mod transport;

/// Utilities.
pub mod utils {
    /// Loading configuration from the environment.
    pub mod from_env;

    /// Tracing setup.
    pub mod tracing;
}

/// Re-exports of common dependencies.
pub mod deps {
    pub use oauth2;
    pub use reqwest;
    pub use tracing;
    pub use tracing_subscriber;
    pub use url;
}
