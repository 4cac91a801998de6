use crate::{
    auth::{store_for_path, CredentialStore},
    leaderboard::LeaderboardClient,
    transport::ReqwestTransport,
    utils::from_env::FromEnv,
};
use std::{path::PathBuf, str::FromStr, sync::LazyLock, time::Duration};
use url::Url;

/// Default Helix bits leaderboard endpoint.
pub static HELIX_LEADERBOARD_URL: LazyLock<Url> = LazyLock::new(|| {
    Url::parse("https://api.twitch.tv/helix/bits/leaderboard").expect("valid leaderboard url")
});

/// Default Twitch OAuth2 token endpoint.
pub static TWITCH_TOKEN_URL: LazyLock<Url> = LazyLock::new(|| {
    Url::parse("https://id.twitch.tv/oauth2/token").expect("valid token url")
});

const DEFAULT_COUNT: u32 = 5;
const MAX_COUNT: u32 = 100;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// The time window the leaderboard is aggregated over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Period {
    /// The current day.
    Day,
    /// The current week.
    Week,
    /// The current month.
    Month,
    /// The current year.
    Year,
    /// All time.
    #[default]
    All,
}

impl Period {
    /// The value of the `period` query parameter.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
            Self::All => "all",
        }
    }
}

impl core::fmt::Display for Period {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error parsing a [`Period`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown leaderboard period {0:?}, expected one of day, week, month, year, all")]
pub struct ParsePeriodError(String);

impl FromStr for Period {
    type Err = ParsePeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "year" => Ok(Self::Year),
            "all" => Ok(Self::All),
            _ => Err(ParsePeriodError(s.to_owned())),
        }
    }
}

/// Configuration for the leaderboard client.
#[derive(Debug, Clone, FromEnv)]
#[from_env(crate)]
pub struct LeaderboardConfig {
    /// Leaderboard endpoint, without a query.
    #[from_env(
        var = "LEADERBOARD_URL",
        desc = "Leaderboard endpoint, without a query",
        default = HELIX_LEADERBOARD_URL.clone()
    )]
    pub leaderboard_url: Url,
    /// OAuth2 token endpoint used for refresh exchanges.
    #[from_env(
        var = "TOKEN_URL",
        desc = "OAuth2 token endpoint used for refresh exchanges",
        default = TWITCH_TOKEN_URL.clone()
    )]
    pub token_url: Url,
    /// Number of leaderboard entries to request. Clamped to `1..=100` when
    /// building the request.
    #[from_env(
        var = "LEADERBOARD_COUNT",
        desc = "Number of leaderboard entries to request",
        default = DEFAULT_COUNT
    )]
    pub count: u32,
    /// Aggregation window of the leaderboard.
    #[from_env(
        var = "LEADERBOARD_PERIOD",
        desc = "Leaderboard period: day, week, month, year or all",
        default = Period::All
    )]
    pub period: Period,
    /// Path of the credential store. A `.json` extension selects the JSON
    /// document format, anything else the `KEY=VALUE` format.
    #[from_env(
        var = "SECRETS_FILE",
        desc = "Path of the credential store (.env or .json)",
        default = PathBuf::from(".env")
    )]
    pub secrets_file: PathBuf,
    /// Timeout for each request, in milliseconds.
    #[from_env(
        var = "HTTP_TIMEOUT_MS",
        desc = "Timeout for each request, in milliseconds",
        default = DEFAULT_TIMEOUT
    )]
    pub timeout: Duration,
}

impl Default for LeaderboardConfig {
    fn default() -> Self {
        Self {
            leaderboard_url: HELIX_LEADERBOARD_URL.clone(),
            token_url: TWITCH_TOKEN_URL.clone(),
            count: DEFAULT_COUNT,
            period: Period::All,
            secrets_file: PathBuf::from(".env"),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl LeaderboardConfig {
    /// The full leaderboard URL, with `count` and `period` in the query.
    pub fn request_url(&self) -> Url {
        let mut url = self.leaderboard_url.clone();
        url.query_pairs_mut()
            .append_pair("count", &self.count.clamp(1, MAX_COUNT).to_string())
            .append_pair("period", self.period.as_str());
        url
    }

    /// Open the credential store at [`Self::secrets_file`].
    pub fn store(&self) -> Box<dyn CredentialStore> {
        store_for_path(&self.secrets_file)
    }

    /// Build a client over [`reqwest`], loading credentials from the
    /// configured store.
    pub fn connect(&self) -> Result<LeaderboardClient<ReqwestTransport>, reqwest::Error> {
        let transport = ReqwestTransport::new(self.timeout)?;
        Ok(LeaderboardClient::from_store(
            self.clone(),
            transport,
            self.store(),
        ))
    }
}
