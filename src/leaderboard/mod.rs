pub(crate) mod client;
pub use client::{LeaderboardClient, LeaderboardResponse};

pub(crate) mod config;
pub use config::{LeaderboardConfig, ParsePeriodError, Period, HELIX_LEADERBOARD_URL, TWITCH_TOKEN_URL};
