//! The OAuth2 `refresh_token` grant, in the shape the Twitch token endpoint
//! accepts: every parameter in the query string, and an empty body.

use crate::{
    auth::Credentials,
    error::FetchError,
    transport::{HttpRequest, HttpTransport},
};
use oauth2::AccessToken;
use serde::Deserialize;
use tracing::{debug, instrument, warn};
use url::Url;

/// The only part of the token response this crate consumes. Twitch also
/// returns a (non-rotated) `refresh_token`, `expires_in`, `scope` and
/// `token_type`, which are ignored.
#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: Option<AccessToken>,
}

/// Build the token-endpoint URL for a refresh exchange.
pub fn refresh_url(token_url: &Url, credentials: &Credentials) -> Url {
    let mut url = token_url.clone();
    url.query_pairs_mut()
        .append_pair("grant_type", "refresh_token")
        .append_pair("refresh_token", credentials.refresh_token().secret())
        .append_pair("client_id", credentials.client_id().as_str())
        .append_pair("client_secret", credentials.client_secret().secret());
    url
}

/// Exchange the refresh token for a new access token.
///
/// Exactly one request is made. Any failure is final for the caller.
#[instrument(skip_all, fields(token_url = %token_url))]
pub async fn exchange<T>(
    transport: &T,
    token_url: &Url,
    credentials: &Credentials,
) -> Result<AccessToken, FetchError>
where
    T: HttpTransport + ?Sized,
{
    let request = HttpRequest::post(refresh_url(token_url, credentials));
    let response = transport.execute(request).await?;

    if !response.status.is_success() {
        warn!(status = %response.status, "token endpoint rejected refresh");
        return Err(FetchError::RefreshFailed(response.status));
    }

    let parsed: RefreshResponse =
        serde_json::from_str(&response.body).map_err(FetchError::MalformedRefreshResponse)?;

    match parsed.access_token {
        Some(token) if !token.secret().is_empty() => {
            debug!("token refreshed");
            Ok(token)
        }
        _ => Err(FetchError::RefreshTokenFieldMissing),
    }
}
