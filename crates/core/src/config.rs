use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://legion-ia-railway-production.up.railway.app";
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";
pub const DEFAULT_GITHUB_REPOSITORY: &str = "Lingui-primitivo/LEGION-IA-RAILWAY";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub backend: BackendConfig,
    pub github: GitHubConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct BackendConfig {
    pub base_url: String,
    pub auth_token: Option<SecretString>,
    pub query_timeout_secs: u64,
    pub mutation_timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct GitHubConfig {
    pub api_base_url: String,
    pub token: Option<SecretString>,
    pub repository: String,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub transport: TransportMode,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportMode {
    Http,
    Stdio,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub base_url: Option<String>,
    pub github_repository: Option<String>,
    pub bind_address: Option<String>,
    pub port: Option<u16>,
    pub transport: Option<TransportMode>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig {
                base_url: DEFAULT_BASE_URL.to_string(),
                auth_token: None,
                query_timeout_secs: 30,
                mutation_timeout_secs: 60,
            },
            github: GitHubConfig {
                api_base_url: DEFAULT_GITHUB_API_URL.to_string(),
                token: None,
                repository: DEFAULT_GITHUB_REPOSITORY.to_string(),
                timeout_secs: 30,
            },
            server: ServerConfig {
                bind_address: "0.0.0.0".to_string(),
                port: 8080,
                transport: TransportMode::Http,
                graceful_shutdown_secs: 10,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

/// Empty credentials mean "not configured".
fn optional_secret(value: String) -> Option<SecretString> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value.into())
    }
}

impl std::str::FromStr for TransportMode {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "http" | "sse" | "streamable-http" => Ok(Self::Http),
            "stdio" => Ok(Self::Stdio),
            other => Err(ConfigError::Validation(format!(
                "unsupported transport `{other}` (expected http|stdio)"
            ))),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("legion.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    pub fn github_configured(&self) -> bool {
        self.github.token.is_some()
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(backend) = patch.backend {
            if let Some(base_url) = backend.base_url {
                self.backend.base_url = base_url;
            }
            if let Some(auth_token_value) = backend.auth_token {
                self.backend.auth_token = optional_secret(auth_token_value);
            }
            if let Some(query_timeout_secs) = backend.query_timeout_secs {
                self.backend.query_timeout_secs = query_timeout_secs;
            }
            if let Some(mutation_timeout_secs) = backend.mutation_timeout_secs {
                self.backend.mutation_timeout_secs = mutation_timeout_secs;
            }
        }

        if let Some(github) = patch.github {
            if let Some(api_base_url) = github.api_base_url {
                self.github.api_base_url = api_base_url;
            }
            if let Some(github_token_value) = github.token {
                self.github.token = optional_secret(github_token_value);
            }
            if let Some(repository) = github.repository {
                self.github.repository = repository;
            }
            if let Some(timeout_secs) = github.timeout_secs {
                self.github.timeout_secs = timeout_secs;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(transport) = server.transport {
                self.server.transport = transport;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("LEGION_BASE_URL") {
            self.backend.base_url = value;
        }
        if let Some(value) = read_env("LEGION_AUTH_TOKEN") {
            self.backend.auth_token = optional_secret(value);
        }
        if let Some(value) = read_env("LEGION_QUERY_TIMEOUT_SECS") {
            self.backend.query_timeout_secs = parse_u64("LEGION_QUERY_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("LEGION_MUTATION_TIMEOUT_SECS") {
            self.backend.mutation_timeout_secs =
                parse_u64("LEGION_MUTATION_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("GITHUB_TOKEN") {
            self.github.token = optional_secret(value);
        }
        if let Some(value) = read_env("GITHUB_REPO") {
            self.github.repository = value;
        }
        if let Some(value) = read_env("GITHUB_API_URL") {
            self.github.api_base_url = value;
        }
        if let Some(value) = read_env("GITHUB_TIMEOUT_SECS") {
            self.github.timeout_secs = parse_u64("GITHUB_TIMEOUT_SECS", &value)?;
        }

        let bind_address = read_env("LEGION_BIND_ADDRESS").or_else(|| read_env("HOST"));
        if let Some(value) = bind_address {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("PORT") {
            self.server.port = parse_u16("PORT", &value)?;
        }
        if let Some(value) = read_env("LEGION_TRANSPORT") {
            self.server.transport = value.parse()?;
        }
        if let Some(value) = read_env("LEGION_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs = parse_u64("LEGION_SHUTDOWN_SECS", &value)?;
        }

        if let Some(value) = read_env("LEGION_LOG_LEVEL") {
            self.logging.level = value;
        }
        if let Some(value) = read_env("LEGION_LOG_FORMAT") {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(base_url) = overrides.base_url {
            self.backend.base_url = base_url;
        }
        if let Some(github_repository) = overrides.github_repository {
            self.github.repository = github_repository;
        }
        if let Some(bind_address) = overrides.bind_address {
            self.server.bind_address = bind_address;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(transport) = overrides.transport {
            self.server.transport = transport;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_backend(&self.backend)?;
        validate_github(&self.github)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("legion.toml"), PathBuf::from("config/legion.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

fn validate_timeout(field: &str, value: u64) -> Result<(), ConfigError> {
    if value == 0 || value > 300 {
        return Err(ConfigError::Validation(format!("{field} must be in range 1..=300")));
    }
    Ok(())
}

fn validate_backend(backend: &BackendConfig) -> Result<(), ConfigError> {
    if !is_http_url(backend.base_url.trim()) {
        return Err(ConfigError::Validation(
            "backend.base_url must start with http:// or https://".to_string(),
        ));
    }

    validate_timeout("backend.query_timeout_secs", backend.query_timeout_secs)?;
    validate_timeout("backend.mutation_timeout_secs", backend.mutation_timeout_secs)?;

    Ok(())
}

fn validate_github(github: &GitHubConfig) -> Result<(), ConfigError> {
    if !is_http_url(github.api_base_url.trim()) {
        return Err(ConfigError::Validation(
            "github.api_base_url must start with http:// or https://".to_string(),
        ));
    }

    // Without a token the GitHub tools never build a repository URL.
    let well_formed = github
        .repository
        .split_once('/')
        .map(|(owner, name)| !owner.is_empty() && !name.is_empty() && !name.contains('/'))
        .unwrap_or(false);
    if github.token.is_some() && !well_formed {
        return Err(ConfigError::Validation(format!(
            "github.repository must look like `owner/name`, got `{}`",
            github.repository
        )));
    }

    validate_timeout("github.timeout_secs", github.timeout_secs)
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    backend: Option<BackendPatch>,
    github: Option<GitHubPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct BackendPatch {
    base_url: Option<String>,
    auth_token: Option<String>,
    query_timeout_secs: Option<u64>,
    mutation_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct GitHubPatch {
    api_base_url: Option<String>,
    token: Option<String>,
    repository: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    transport: Option<TransportMode>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
