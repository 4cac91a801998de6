use bits_leaderboard::{
    error::FetchError,
    leaderboard::LeaderboardConfig,
    utils::{from_env::FromEnv, tracing::init_tracing},
};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> eyre::Result<ExitCode> {
    init_tracing();

    let config = LeaderboardConfig::from_env()?;
    let client = config.connect()?;

    match client.fetch().await {
        Ok(response) => {
            if let Some(err) = response.persistence_error() {
                eprintln!(
                    "Warning: token refreshed but not saved to {}: {err}",
                    config.secrets_file.display()
                );
            }
            println!("{}", response.body());
            Ok(ExitCode::SUCCESS)
        }
        Err(err @ FetchError::MissingCredentials(_)) => {
            eprintln!("Error: {err}. Check {}", config.secrets_file.display());
            Ok(ExitCode::FAILURE)
        }
        Err(err) => {
            eprintln!("Error: {err}");
            Ok(ExitCode::FAILURE)
        }
    }
}
