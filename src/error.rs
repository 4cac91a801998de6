use crate::auth::MissingCredentials;
use reqwest::StatusCode;

/// Errors from the HTTP layer, on either the leaderboard or token endpoint.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The request did not complete within the configured timeout.
    #[error("request timed out")]
    Timeout,
    /// Any other network, DNS, TLS or body-read failure.
    #[error("request failed: {0}")]
    Request(#[source] Box<dyn core::error::Error + Send + Sync + 'static>),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Request(Box::new(err))
        }
    }
}

/// Hard failures of a leaderboard fetch.
///
/// Non-success leaderboard statuses other than 401 are not errors; they are
/// returned as the response. A failure to persist a refreshed token is not an
/// error either, see [`LeaderboardResponse::persistence_error`].
///
/// [`LeaderboardResponse::persistence_error`]: crate::leaderboard::LeaderboardResponse::persistence_error
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// One or more credentials are empty. No request was made.
    #[error("missing required credentials: {0}")]
    MissingCredentials(#[from] MissingCredentials),
    /// The token endpoint rejected the refresh exchange.
    #[error("failed to refresh token: {0}")]
    RefreshFailed(StatusCode),
    /// The token endpoint accepted the exchange, but sent no `access_token`.
    #[error("token refresh response did not contain an access token")]
    RefreshTokenFieldMissing,
    /// The token endpoint accepted the exchange, but the body was not JSON.
    #[error("token refresh response is not valid JSON: {0}")]
    MalformedRefreshResponse(#[source] serde_json::Error),
    /// A credential cannot be sent as a header value. No request was made.
    #[error("credential is not a valid header value")]
    InvalidHeader(#[source] reqwest::header::InvalidHeaderValue),
    /// A request could not be completed.
    #[error(transparent)]
    Transport(#[from] TransportError),
}
