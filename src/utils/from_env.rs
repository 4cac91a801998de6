use std::{env::VarError, path::PathBuf, str::FromStr};

/// The `derive(FromEnv)` macro.
///
/// This macro generates a [`FromEnv`] implementation for the struct it is
/// applied to. It will generate a `from_env` function that loads the struct
/// from the environment. It will also generate an `inventory` function that
/// returns a list of all environment variables that are read by the struct.
///
/// ## Basics
///
/// There are a few usage requirements:
///
/// - Struct props MUST implement either [`FromEnvVar`] or [`FromEnv`].
/// - If the prop implements [`FromEnvVar`], it must be tagged as follows:
///     - `var = "ENV_VAR_NAME"`: The environment variable name to load.
///     - `desc = "description"`: A description of the environment variable.
/// - If the prop is an [`Option<T>`], it must be tagged as follows:
///     - `optional`
/// - A prop may be tagged `default = <expr>`. The expression is used when the
///   variable is missing or empty, and the variable is reported as optional.
///   A variable that is present but fails to parse is still an error.
/// - If used within this crate (`bits_leaderboard`), the entire struct must be
///   tagged with `#[from_env(crate)]` (see [`LeaderboardConfig`] for an
///   example).
///
/// # Examples
///
/// ```
/// # #![allow(proc_macro_derive_resolution_fallback)]
/// use bits_leaderboard::utils::from_env::FromEnv;
///
/// #[derive(Debug, FromEnv)]
/// pub struct MyCfg {
///     #[from_env(var = "RETRIES", desc = "How many times to retry")]
///     pub retries: u8,
///
///     #[from_env(var = "GREETING", desc = "What to say", default = "hi".to_owned())]
///     pub greeting: String,
///
///     #[from_env(var = "MAYBE_NOT_NEEDED", desc = "An optional string", optional)]
///     maybe_not_needed: Option<String>,
/// }
/// ```
///
/// [`LeaderboardConfig`]: crate::leaderboard::LeaderboardConfig
pub use bits_leaderboard_from_env_derive::FromEnv;

/// Details about an environment variable. This is used to generate
/// documentation for the environment variables and by the [`FromEnv`] trait to
/// check if necessary environment variables are present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvItemInfo {
    /// The environment variable name.
    pub var: &'static str,
    /// A description of the environment variable function in the CFG.
    pub description: &'static str,
    /// Whether the environment variable is optional or not.
    pub optional: bool,
}

/// Error type for loading from the environment. See the [`FromEnv`] trait for
/// more information.
#[derive(Debug, thiserror::Error)]
pub enum FromEnvErr {
    /// The environment variable is missing or not unicode.
    #[error("error reading variable {0}: {1}")]
    EnvError(String, VarError),
    /// The environment variable is empty.
    #[error("environment variable {0} is empty")]
    Empty(String),
    /// The environment variable is present, but the value could not be parsed.
    #[error("failed to parse environment variable {var}: {source}")]
    ParseError {
        /// The variable that failed to parse.
        var: String,
        /// The underlying parse error.
        #[source]
        source: Box<dyn core::error::Error + Send + Sync + 'static>,
    },
}

impl FromEnvErr {
    /// Missing env var.
    pub fn env_err(var: &str, e: VarError) -> Self {
        Self::EnvError(var.to_string(), e)
    }

    /// Empty env var.
    pub fn empty(var: &str) -> Self {
        Self::Empty(var.to_string())
    }

    /// Error while parsing.
    pub fn parse_error<E>(var: &str, err: E) -> Self
    where
        E: core::error::Error + Send + Sync + 'static,
    {
        Self::ParseError {
            var: var.to_string(),
            source: Box::new(err),
        }
    }
}

/// Convenience function for parsing a value from the environment, if present
/// and non-empty.
pub fn parse_env_if_present<T>(env_var: &str) -> Result<T, FromEnvErr>
where
    T: FromStr,
    T::Err: core::error::Error + Send + Sync + 'static,
{
    let s = std::env::var(env_var).map_err(|e| FromEnvErr::env_err(env_var, e))?;

    if s.is_empty() {
        Err(FromEnvErr::empty(env_var))
    } else {
        s.parse().map_err(|e| FromEnvErr::parse_error(env_var, e))
    }
}

/// Trait for loading from the environment.
///
/// This trait is for structs or other complex objects, that need to be loaded
/// from the environment. It expects that
///
/// - The struct is [`Sized`] and `'static`.
/// - The struct elements can be parsed from strings.
/// - Struct elements are at fixed env vars, known by the type at compile time.
///
/// As such, unless the env is modified, these are essentially static runtime
/// values.
pub trait FromEnv: core::fmt::Debug + Sized + 'static {
    /// Get the environment variable names read by this type.
    ///
    /// ## Note
    ///
    /// This MUST include the environment variable names for all fields in the
    /// struct, including optional vars.
    fn inventory() -> Vec<&'static EnvItemInfo>;

    /// Get a list of missing environment variables.
    ///
    /// This will check all environment variables in the inventory, and return
    /// a list of those that are non-optional and missing. This is useful for
    /// reporting missing environment variables.
    fn check_inventory() -> Result<(), Vec<&'static EnvItemInfo>> {
        let missing: Vec<_> = Self::inventory()
            .into_iter()
            .filter(|item| !item.optional && std::env::var(item.var).is_err())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(missing)
        }
    }

    /// Load from the environment.
    fn from_env() -> Result<Self, FromEnvErr>;
}

/// Trait for loading primitives from the environment. These are simple types
/// that should correspond to a single environment variable. It has been
/// implemented for common integer types, [`String`], [`PathBuf`],
/// [`url::Url`] and [`std::time::Duration`].
///
/// It aims to make [`FromEnv`] implementations easier to write, by providing a
/// default implementation for common types.
pub trait FromEnvVar: core::fmt::Debug + Sized + 'static {
    /// Load the primitive from the environment at the given variable.
    fn from_env_var(env_var: &str) -> Result<Self, FromEnvErr>;
}

impl<T> FromEnvVar for Option<T>
where
    T: FromEnvVar,
{
    fn from_env_var(env_var: &str) -> Result<Self, FromEnvErr> {
        match std::env::var(env_var) {
            Ok(s) if s.is_empty() => Ok(None),
            Ok(_) => T::from_env_var(env_var).map(Some),
            Err(_) => Ok(None),
        }
    }
}

impl FromEnvVar for String {
    fn from_env_var(env_var: &str) -> Result<Self, FromEnvErr> {
        let s = std::env::var(env_var).map_err(|e| FromEnvErr::env_err(env_var, e))?;
        if s.is_empty() {
            return Err(FromEnvErr::empty(env_var));
        }
        Ok(s)
    }
}

impl FromEnvVar for PathBuf {
    fn from_env_var(env_var: &str) -> Result<Self, FromEnvErr> {
        String::from_env_var(env_var).map(PathBuf::from)
    }
}

/// Durations are read as a whole number of milliseconds.
impl FromEnvVar for std::time::Duration {
    fn from_env_var(env_var: &str) -> Result<Self, FromEnvErr> {
        u64::from_env_var(env_var).map(Self::from_millis)
    }
}

impl FromEnvVar for bool {
    fn from_env_var(env_var: &str) -> Result<Self, FromEnvErr> {
        let s = std::env::var(env_var).map_err(|e| FromEnvErr::env_err(env_var, e))?;
        Ok(!s.is_empty())
    }
}

macro_rules! impl_for_parseable {
    ($($t:ty),*) => {
        $(
            impl FromEnvVar for $t {
                fn from_env_var(env_var: &str) -> Result<Self, FromEnvErr> {
                    parse_env_if_present(env_var)
                }
            }
        )*
    }
}

impl_for_parseable!(
    u8,
    u16,
    u32,
    u64,
    usize,
    i32,
    i64,
    url::Url,
    crate::leaderboard::Period
);
