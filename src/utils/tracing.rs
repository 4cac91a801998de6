use crate::utils::from_env::FromEnvVar;
use tracing_subscriber::{filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt, Layer};

const TRACING_LOG_JSON: &str = "TRACING_LOG_JSON";

/// Install a format layer writing to stderr, based on the `TRACING_LOG_JSON`
/// environment variable, and then install the registry.
macro_rules! install_fmt {
    (json @ $registry:ident, $filter:ident) => {{
        let fmt = tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_filter($filter);
        $registry.with(fmt).init();
    }};
    (log @ $registry:ident, $filter:ident) => {{
        let fmt = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_filter($filter);
        $registry.with(fmt).init();
    }};
    ($registry:ident, $filter:ident) => {{
        let json = bool::from_env_var(TRACING_LOG_JSON).unwrap_or(false);
        if json {
            install_fmt!(json @ $registry, $filter);
        } else {
            install_fmt!(log @ $registry, $filter);
        }
    }};
}

/// Init tracing.
///
/// Installs a registry with an [`EnvFilter`] read from `RUST_LOG` and a `fmt`
/// layer. Logs go to stderr, so that stdout only ever carries the leaderboard
/// payload.
///
/// ## Env Reads
///
/// - `RUST_LOG` - The filter directives.
/// - `TRACING_LOG_JSON` - If set, will enable JSON logging.
///
/// ## Panics
///
/// This function will panic if a global subscriber has already been set.
pub fn init_tracing() {
    let registry = tracing_subscriber::registry();
    let filter = EnvFilter::from_default_env();

    install_fmt!(registry, filter);
}
