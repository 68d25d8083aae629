use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use schooldesk_core::AppError;
use tracing_subscriber::EnvFilter;

const DEFAULT_CHANNEL_PREFIX: &str = "schooldesk:changes";
const DEFAULT_PUBLISH_TIMEOUT_MS: u64 = 2_000;
const DEFAULT_TOPIC_CAPACITY: u64 = 256;

/// What the binary was started to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiCommand {
    Serve,
    Migrate,
    Seed,
}

impl ApiCommand {
    fn parse(argument: Option<&str>) -> Result<Self, AppError> {
        match argument {
            None | Some("serve") => Ok(Self::Serve),
            Some("migrate") => Ok(Self::Migrate),
            Some("seed") => Ok(Self::Seed),
            Some(other) => Err(AppError::Validation(format!(
                "unknown command '{other}', expected 'serve', 'migrate' or 'seed'"
            ))),
        }
    }
}

/// Where change notifications travel between writers and live subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeTransportConfig {
    Memory,
    Redis {
        redis_url: String,
        channel_prefix: String,
    },
}

impl ChangeTransportConfig {
    fn parse(
        kind: &str,
        redis_url: Option<String>,
        channel_prefix: Option<String>,
    ) -> Result<Self, AppError> {
        match kind.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "redis" => {
                let redis_url = redis_url
                    .filter(|value| !value.trim().is_empty())
                    .ok_or_else(|| {
                        AppError::Validation(
                            "REDIS_URL is required when CHANGE_TRANSPORT is 'redis'".to_owned(),
                        )
                    })?;
                let channel_prefix = channel_prefix
                    .map(|value| value.trim().to_owned())
                    .filter(|value| !value.is_empty())
                    .unwrap_or_else(|| DEFAULT_CHANNEL_PREFIX.to_owned());

                Ok(Self::Redis {
                    redis_url,
                    channel_prefix,
                })
            }
            other => Err(AppError::Validation(format!(
                "CHANGE_TRANSPORT must be either 'memory' or 'redis', got '{other}'"
            ))),
        }
    }
}

/// Initial administrator created by the `seed` command.
#[derive(Debug, Clone)]
pub struct SeedAdminConfig {
    pub email: String,
    pub password: String,
    pub display_name: String,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub command: ApiCommand,
    pub database_url: String,
    pub frontend_url: String,
    pub api_host: String,
    pub api_port: u16,
    pub cookie_secure: bool,
    pub change_transport: ChangeTransportConfig,
    pub change_publish_timeout: Duration,
    pub change_topic_capacity: usize,
    pub seed_admin: Option<SeedAdminConfig>,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let command = ApiCommand::parse(env::args().nth(1).as_deref())?;
        Self::from_lookup(command, |name| env::var(name).ok())
    }

    /// Builds the configuration from `lookup`, which resolves variable names.
    fn from_lookup(
        command: ApiCommand,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, AppError> {
        let database_url = required(&lookup, "DATABASE_URL")?;
        let frontend_url =
            lookup("FRONTEND_URL").unwrap_or_else(|| "http://localhost:3000".to_owned());

        let api_host = lookup("API_HOST").unwrap_or_else(|| "127.0.0.1".to_owned());
        let api_port = lookup("API_PORT")
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3001);
        let cookie_secure = lookup("SESSION_COOKIE_SECURE")
            .is_some_and(|value| value.eq_ignore_ascii_case("true"));

        let change_transport = ChangeTransportConfig::parse(
            lookup("CHANGE_TRANSPORT")
                .unwrap_or_else(|| "memory".to_owned())
                .as_str(),
            lookup("REDIS_URL"),
            lookup("CHANGE_CHANNEL_PREFIX"),
        )?;
        let change_publish_timeout = Duration::from_millis(parse_positive(
            "CHANGE_PUBLISH_TIMEOUT_MS",
            lookup("CHANGE_PUBLISH_TIMEOUT_MS").as_deref(),
            DEFAULT_PUBLISH_TIMEOUT_MS,
        )?);
        let change_topic_capacity = parse_positive(
            "CHANGE_TOPIC_CAPACITY",
            lookup("CHANGE_TOPIC_CAPACITY").as_deref(),
            DEFAULT_TOPIC_CAPACITY,
        )
        .and_then(|value| {
            usize::try_from(value).map_err(|error| {
                AppError::Validation(format!("invalid CHANGE_TOPIC_CAPACITY: {error}"))
            })
        })?;

        let seed_admin = if command == ApiCommand::Seed {
            Some(SeedAdminConfig {
                email: required_non_empty(&lookup, "SEED_ADMIN_EMAIL")?,
                password: required_non_empty(&lookup, "SEED_ADMIN_PASSWORD")?,
                display_name: lookup("SEED_ADMIN_NAME")
                    .filter(|value| !value.trim().is_empty())
                    .unwrap_or_else(|| "Administrator".to_owned()),
            })
        } else {
            None
        };

        Ok(Self {
            command,
            database_url,
            frontend_url,
            api_host,
            api_port,
            cookie_secure,
            change_transport,
            change_publish_timeout,
            change_topic_capacity,
            seed_admin,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }

    pub fn requires_redis(&self) -> bool {
        matches!(self.change_transport, ChangeTransportConfig::Redis { .. })
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required(lookup: impl Fn(&str) -> Option<String>, name: &str) -> Result<String, AppError> {
    lookup(name).ok_or_else(|| AppError::Validation(format!("{name} is required")))
}

fn required_non_empty(
    lookup: impl Fn(&str) -> Option<String>,
    name: &str,
) -> Result<String, AppError> {
    let value = required(lookup, name)?;
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{name} must not be empty")));
    }

    Ok(value)
}

fn parse_positive(name: &str, value: Option<&str>, default: u64) -> Result<u64, AppError> {
    let Some(value) = value.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(default);
    };

    match value.parse::<u64>() {
        Ok(0) => Err(AppError::Validation(format!(
            "{name} must be greater than zero"
        ))),
        Ok(parsed) => Ok(parsed),
        Err(error) => Err(AppError::Validation(format!("invalid {name}: {error}"))),
    }
}
