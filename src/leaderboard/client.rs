use crate::{
    auth::{refresh, CredentialStore, Credentials, SaveError},
    error::FetchError,
    leaderboard::LeaderboardConfig,
    transport::{HttpRequest, HttpResponse, HttpTransport},
};
use oauth2::AccessToken;
use reqwest::{
    header::{HeaderName, HeaderValue, AUTHORIZATION},
    StatusCode,
};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

/// The result of a completed fetch.
///
/// The status is not interpreted. A non-success status other than the 401
/// that triggers a refresh is passed through with its body, as is a 401 on
/// the retry.
#[derive(Debug)]
pub struct LeaderboardResponse {
    status: StatusCode,
    body: String,
    refreshed: bool,
    persistence_error: Option<SaveError>,
}

impl LeaderboardResponse {
    /// The status of the final leaderboard request.
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// True if the final leaderboard request succeeded.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// The body of the final leaderboard request.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Consume the response, returning the body.
    pub fn into_body(self) -> String {
        self.body
    }

    /// True if the access token was refreshed during this fetch.
    pub const fn was_refreshed(&self) -> bool {
        self.refreshed
    }

    /// The error from persisting a refreshed token, if that failed. The new
    /// token was still used for the retry and is held in memory, but the
    /// store still has the old one.
    pub const fn persistence_error(&self) -> Option<&SaveError> {
        self.persistence_error.as_ref()
    }
}

/// Outcome of the refresh step of a fetch.
struct Refreshed {
    access_token: AccessToken,
    exchanged: bool,
    persistence_error: Option<SaveError>,
}

/// Client for the bits leaderboard that recovers from an expired access token.
///
/// Each [`fetch`] makes at most two leaderboard requests and at most one
/// token exchange. Credentials are held behind a lock, so a client may be
/// shared between tasks; the exchange, the in-memory update and the store
/// write happen while holding it.
///
/// [`fetch`]: LeaderboardClient::fetch
#[derive(Debug)]
pub struct LeaderboardClient<T> {
    config: LeaderboardConfig,
    transport: T,
    store: Box<dyn CredentialStore>,
    credentials: Mutex<Credentials>,
}

impl<T> LeaderboardClient<T>
where
    T: HttpTransport,
{
    /// Create a client with already-loaded credentials.
    pub fn new(
        config: LeaderboardConfig,
        transport: T,
        store: Box<dyn CredentialStore>,
        credentials: Credentials,
    ) -> Self {
        Self {
            config,
            transport,
            store,
            credentials: Mutex::new(credentials),
        }
    }

    /// Create a client, loading credentials from the store.
    ///
    /// Fields the store leaves empty are filled from the process environment,
    /// see [`Credentials::fill_from_env`]. If the store cannot be read and the
    /// environment has nothing either, every fetch fails with
    /// [`FetchError::MissingCredentials`].
    pub fn from_store(
        config: LeaderboardConfig,
        transport: T,
        store: Box<dyn CredentialStore>,
    ) -> Self {
        let mut credentials = store.load_or_empty();
        credentials.fill_from_env();
        Self::new(config, transport, store, credentials)
    }

    /// Get a reference to the configuration.
    pub const fn config(&self) -> &LeaderboardConfig {
        &self.config
    }

    /// Get a reference to the transport.
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Get a copy of the current credentials.
    pub async fn credentials(&self) -> Credentials {
        self.credentials.lock().await.clone()
    }

    /// Fetch the leaderboard.
    ///
    /// On a 401 the access token is refreshed and the request is retried
    /// once. Whatever the retry returns is the result.
    #[instrument(skip_all, fields(url = %self.config.leaderboard_url))]
    pub async fn fetch(&self) -> Result<LeaderboardResponse, FetchError> {
        let (client_id, access_token) = {
            let credentials = self.credentials.lock().await;
            credentials.ensure_complete()?;
            (
                credentials.client_id().as_str().to_owned(),
                credentials.access_token().clone(),
            )
        };

        let first = self.request(&client_id, &access_token).await?;
        if first.status != StatusCode::UNAUTHORIZED {
            debug!(status = %first.status, "leaderboard request complete");
            return Ok(LeaderboardResponse {
                status: first.status,
                body: first.body,
                refreshed: false,
                persistence_error: None,
            });
        }

        info!("access token rejected, attempting to refresh");
        let refreshed = self.refresh(&access_token).await?;

        let retry = self.request(&client_id, &refreshed.access_token).await?;
        if retry.status == StatusCode::UNAUTHORIZED {
            warn!("refreshed access token rejected, not refreshing again");
        } else {
            debug!(status = %retry.status, "leaderboard retry complete");
        }

        Ok(LeaderboardResponse {
            status: retry.status,
            body: retry.body,
            refreshed: refreshed.exchanged,
            persistence_error: refreshed.persistence_error,
        })
    }

    async fn request(
        &self,
        client_id: &str,
        access_token: &AccessToken,
    ) -> Result<HttpResponse, FetchError> {
        let bearer = format!("Bearer {}", access_token.secret());

        let mut request = HttpRequest::get(self.config.request_url());
        request
            .headers
            .insert(AUTHORIZATION, header_value(&bearer)?);
        request
            .headers
            .insert(HeaderName::from_static("client-id"), header_value(client_id)?);

        self.transport.execute(request).await.map_err(Into::into)
    }

    /// Replace the rejected token, holding the credential lock throughout.
    async fn refresh(&self, rejected: &AccessToken) -> Result<Refreshed, FetchError> {
        let mut credentials = self.credentials.lock().await;

        if credentials.access_token().secret() != rejected.secret() {
            debug!("access token already refreshed by a concurrent fetch");
            return Ok(Refreshed {
                access_token: credentials.access_token().clone(),
                exchanged: false,
                persistence_error: None,
            });
        }

        let access_token =
            refresh::exchange(&self.transport, &self.config.token_url, &credentials).await?;
        credentials.set_access_token(access_token.clone());
        info!("token refreshed successfully");

        let persistence_error = self
            .store
            .save(&access_token)
            .inspect_err(|err| {
                warn!(%err, "failed to persist refreshed access token, it will be lost on restart")
            })
            .err();

        Ok(Refreshed {
            access_token,
            exchanged: true,
            persistence_error,
        })
    }
}

/// Header values built from credentials. Marked sensitive so they are never
/// printed by `Debug`.
fn header_value(value: &str) -> Result<HeaderValue, FetchError> {
    let mut value = HeaderValue::from_str(value).map_err(FetchError::InvalidHeader)?;
    value.set_sensitive(true);
    Ok(value)
}
