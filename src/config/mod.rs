//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{
    net::SocketAddr,
    num::{NonZeroU32, NonZeroU64},
    path::PathBuf,
    str::FromStr,
    time::Duration,
};

use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;
use uuid::Uuid;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "florista";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_GRACEFUL_SHUTDOWN_SECS: u64 = 30;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_CACHE_REQUEST_TIMEOUT_MS: u64 = 2_000;
const DEFAULT_BOUQUET_TTL_SECS: u64 = 1_800;
const DEFAULT_CATEGORY_TTL_SECS: u64 = 3_600;
const DEFAULT_FLOWER_TTL_SECS: u64 = 3_600;
const DEFAULT_TAG_TTL_SECS: u64 = 3_600;
const DEFAULT_SESSION_TTL_SECS: u64 = 7 * 24 * 60 * 60;
const MAX_SESSION_TTL_SECS: u64 = 365 * 24 * 60 * 60;

/// Command-line arguments for the Florista binary.
#[derive(Debug, Parser)]
#[command(name = "florista", version, about = "Florista catalog server")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "FLORISTA_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    /// Key-value REST endpoint used by the cache.
    #[arg(long = "kv-rest-api-url", env = "KV_REST_API_URL", global = true, value_name = "URL")]
    pub kv_rest_api_url: Option<String>,

    /// Bearer token for the key-value REST endpoint.
    #[arg(
        long = "kv-rest-api-token",
        env = "KV_REST_API_TOKEN",
        global = true,
        hide_env_values = true,
        value_name = "TOKEN"
    )]
    pub kv_rest_api_token: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the catalog HTTP API.
    Serve(Box<ServeArgs>),
    /// Delete cache keys or key patterns without going through HTTP.
    Invalidate(InvalidateArgs),
    /// Create a session for an existing profile and print its bearer token.
    #[command(name = "issue-session")]
    IssueSession(IssueSessionArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct DatabaseOverride {
    /// Override the database connection URL.
    #[arg(long = "database-url", value_name = "URL")]
    pub database_url: Option<String>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the graceful shutdown timeout.
    #[arg(long = "server-graceful-shutdown-seconds", value_name = "SECONDS")]
    pub server_graceful_shutdown_seconds: Option<u64>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Override the database connection URL.
    #[arg(long = "database-url", value_name = "URL")]
    pub database_url: Option<String>,

    /// Override the database pool size.
    #[arg(long = "database-max-connections", value_name = "COUNT")]
    pub database_max_connections: Option<u32>,

    /// Override the cache backend (rest|memory|disabled).
    #[arg(long = "cache-backend", value_name = "BACKEND")]
    pub cache_backend: Option<String>,
}

#[derive(Debug, Args, Clone)]
pub struct InvalidateArgs {
    /// Exact key to delete; repeatable.
    #[arg(long = "key", value_name = "KEY")]
    pub keys: Vec<String>,

    /// Glob pattern whose matches are deleted; repeatable.
    #[arg(long = "pattern", value_name = "PATTERN")]
    pub patterns: Vec<String>,
}

#[derive(Debug, Args, Clone)]
pub struct IssueSessionArgs {
    #[command(flatten)]
    pub database: DatabaseOverride,

    /// Profile the session is issued for.
    #[arg(long = "user-id", value_name = "UUID")]
    pub user_id: Uuid,
}

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub database: DatabaseSettings,
    pub cache: CacheSettings,
    pub auth: AuthSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
    pub graceful_shutdown: Duration,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub url: Option<String>,
    pub max_connections: NonZeroU32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheBackendKind {
    Rest,
    Memory,
    Disabled,
}

impl CacheBackendKind {
    pub fn is_enabled(self) -> bool {
        !matches!(self, CacheBackendKind::Disabled)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CacheBackendKind::Rest => "rest",
            CacheBackendKind::Memory => "memory",
            CacheBackendKind::Disabled => "disabled",
        }
    }
}

impl FromStr for CacheBackendKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "rest" => Ok(Self::Rest),
            "memory" => Ok(Self::Memory),
            "disabled" | "off" | "none" => Ok(Self::Disabled),
            other => Err(format!("unknown cache backend `{other}`")),
        }
    }
}

#[derive(Clone)]
pub struct RestCacheSettings {
    pub url: Url,
    pub token: String,
}

impl std::fmt::Debug for RestCacheSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestCacheSettings")
            .field("url", &self.url.as_str())
            .field("token", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct CacheTtlSettings {
    pub bouquets: NonZeroU64,
    pub categories: NonZeroU64,
    pub flowers: NonZeroU64,
    pub tags: NonZeroU64,
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub backend: CacheBackendKind,
    /// Present exactly when `backend` is `Rest`.
    pub rest: Option<RestCacheSettings>,
    pub request_timeout: Duration,
    pub ttl: CacheTtlSettings,
}

#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub session_ttl: time::Duration,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix("FLORISTA").separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    raw.apply_kv_overrides(cli);
    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        Some(Command::IssueSession(args)) => raw.apply_database_override(&args.database),
        Some(Command::Invalidate(_)) => {}
        None => raw.apply_serve_overrides(&ServeOverrides::default()),
    }

    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    database: RawDatabaseSettings,
    cache: RawCacheSettings,
    auth: RawAuthSettings,
}

impl RawSettings {
    fn apply_kv_overrides(&mut self, cli: &CliArgs) {
        if let Some(url) = cli.kv_rest_api_url.as_ref() {
            self.cache.rest_url = Some(url.clone());
        }
        if let Some(token) = cli.kv_rest_api_token.as_ref() {
            self.cache.rest_token = Some(token.clone());
        }
    }

    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(seconds) = overrides.server_graceful_shutdown_seconds {
            self.server.graceful_shutdown_seconds = Some(seconds);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(url) = overrides.database_url.as_ref() {
            self.database.url = Some(url.clone());
        }
        if let Some(max) = overrides.database_max_connections {
            self.database.max_connections = Some(max);
        }
        if let Some(backend) = overrides.cache_backend.as_ref() {
            self.cache.backend = Some(backend.clone());
        }
    }

    fn apply_database_override(&mut self, overrides: &DatabaseOverride) {
        if let Some(url) = overrides.database_url.as_ref() {
            self.database.url = Some(url.clone());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            database,
            cache,
            auth,
        } = raw;

        Ok(Self {
            server: build_server_settings(server)?,
            logging: build_logging_settings(logging)?,
            database: build_database_settings(database)?,
            cache: build_cache_settings(cache)?,
            auth: build_auth_settings(auth)?,
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());

    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }

    let addr = parse_socket_addr(&host, port)
        .map_err(|reason| LoadError::invalid("server.addr", reason))?;

    let graceful_secs = server
        .graceful_shutdown_seconds
        .unwrap_or(DEFAULT_GRACEFUL_SHUTDOWN_SECS);
    if graceful_secs == 0 {
        return Err(LoadError::invalid(
            "server.graceful_shutdown_seconds",
            "must be greater than zero",
        ));
    }

    Ok(ServerSettings {
        addr,
        graceful_shutdown: Duration::from_secs(graceful_secs),
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_database_settings(database: RawDatabaseSettings) -> Result<DatabaseSettings, LoadError> {
    let url = non_blank(database.url);

    let max_connections = non_zero_u32(
        database
            .max_connections
            .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS)
            .into(),
        "database.max_connections",
    )?;

    Ok(DatabaseSettings {
        url,
        max_connections,
    })
}

fn build_cache_settings(cache: RawCacheSettings) -> Result<CacheSettings, LoadError> {
    let rest_url = non_blank(cache.rest_url);
    let rest_token = non_blank(cache.rest_token);

    // Without an explicit backend, the REST store is used whenever credentials exist.
    let backend = match non_blank(cache.backend) {
        Some(value) => CacheBackendKind::from_str(&value)
            .map_err(|reason| LoadError::invalid("cache.backend", reason))?,
        None if rest_url.is_some() && rest_token.is_some() => CacheBackendKind::Rest,
        None => CacheBackendKind::Disabled,
    };

    let rest = if backend == CacheBackendKind::Rest {
        let url = rest_url.ok_or_else(|| {
            LoadError::invalid("cache.rest_url", "required when the rest backend is selected")
        })?;
        let url = Url::parse(&url)
            .map_err(|err| LoadError::invalid("cache.rest_url", format!("invalid url: {err}")))?;
        let token = rest_token.ok_or_else(|| {
            LoadError::invalid(
                "cache.rest_token",
                "required when the rest backend is selected",
            )
        })?;
        Some(RestCacheSettings { url, token })
    } else {
        None
    };

    let timeout_ms = cache
        .request_timeout_ms
        .unwrap_or(DEFAULT_CACHE_REQUEST_TIMEOUT_MS);
    if timeout_ms == 0 {
        return Err(LoadError::invalid(
            "cache.request_timeout_ms",
            "must be greater than zero",
        ));
    }

    let ttl = CacheTtlSettings {
        bouquets: non_zero_u64(
            cache.ttl.bouquets.unwrap_or(DEFAULT_BOUQUET_TTL_SECS),
            "cache.ttl.bouquets",
        )?,
        categories: non_zero_u64(
            cache.ttl.categories.unwrap_or(DEFAULT_CATEGORY_TTL_SECS),
            "cache.ttl.categories",
        )?,
        flowers: non_zero_u64(
            cache.ttl.flowers.unwrap_or(DEFAULT_FLOWER_TTL_SECS),
            "cache.ttl.flowers",
        )?,
        tags: non_zero_u64(
            cache.ttl.tags.unwrap_or(DEFAULT_TAG_TTL_SECS),
            "cache.ttl.tags",
        )?,
    };

    Ok(CacheSettings {
        backend,
        rest,
        request_timeout: Duration::from_millis(timeout_ms),
        ttl,
    })
}

fn build_auth_settings(auth: RawAuthSettings) -> Result<AuthSettings, LoadError> {
    let secs = auth.session_ttl_seconds.unwrap_or(DEFAULT_SESSION_TTL_SECS);
    if secs == 0 || secs > MAX_SESSION_TTL_SECS {
        return Err(LoadError::invalid(
            "auth.session_ttl_seconds",
            format!("must be between 1 and {MAX_SESSION_TTL_SECS}"),
        ));
    }
    let secs = i64::try_from(secs)
        .map_err(|_| LoadError::invalid("auth.session_ttl_seconds", "value out of range"))?;

    Ok(AuthSettings {
        session_ttl: time::Duration::seconds(secs),
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
    graceful_shutdown_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawDatabaseSettings {
    url: Option<String>,
    max_connections: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    backend: Option<String>,
    rest_url: Option<String>,
    rest_token: Option<String>,
    request_timeout_ms: Option<u64>,
    ttl: RawCacheTtlSettings,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheTtlSettings {
    bouquets: Option<u64>,
    categories: Option<u64>,
    flowers: Option<u64>,
    tags: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawAuthSettings {
    session_ttl_seconds: Option<u64>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

fn non_zero_u32(value: u64, key: &'static str) -> Result<NonZeroU32, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    let value_u32: u32 = value
        .try_into()
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for u32"))?;
    NonZeroU32::new(value_u32).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}

fn non_zero_u64(value: u64, key: &'static str) -> Result<NonZeroU64, LoadError> {
    NonZeroU64::new(value).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}
