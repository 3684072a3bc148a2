//! Application configuration structures.
//!
//! Values come from defaults, then an optional TOML file, then environment
//! variables. An unparsable environment value is logged and ignored.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use scraper::Selector;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Where to harvest from and how much
    #[serde(default)]
    pub source: SourceConfig,

    /// HTTP fetch behavior
    #[serde(default)]
    pub fetch: FetchConfig,

    /// CSS selectors for quote extraction
    #[serde(default)]
    pub extract: ExtractConfig,

    /// Cache backend settings
    #[serde(default)]
    pub cache: CacheConfig,

    /// Read API settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Log settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Defaults overridden by the process environment and `.env`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Override fields from the process environment.
    ///
    /// Variables missing from the process are looked up in a `.env` file in
    /// the working directory or one of its parents.
    pub fn apply_env(&mut self) -> Vec<&'static str> {
        let dotenv = dotenv_vars();
        self.apply_env_from(|key| std::env::var(key).ok().or_else(|| dotenv.get(key).cloned()))
    }

    /// Override fields from an arbitrary variable lookup.
    ///
    /// Returns the keys whose values could not be parsed; those fields keep
    /// their previous value.
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Vec<&'static str>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut env = EnvLookup {
            lookup,
            rejected: Vec::new(),
        };

        env.string("BASE_URL", &mut self.source.base_url);
        env.parsed("DEFAULT_COUNT", &mut self.source.desired_count);
        env.parsed("MAX_PAGES", &mut self.source.max_pages);

        env.string("USER_AGENT", &mut self.fetch.user_agent);
        env.parsed("FETCH_TIMEOUT_SECS", &mut self.fetch.timeout_secs);
        env.parsed("FETCH_MAX_ATTEMPTS", &mut self.fetch.max_attempts);
        env.parsed("RETRY_DELAY_MS", &mut self.fetch.retry_delay_ms);
        env.parsed("RATE_LIMIT_MS", &mut self.fetch.rate_limit_ms);

        env.string("ELASTICACHE_URL", &mut self.cache.url);
        env.string("CACHE_PROVIDER", &mut self.cache.provider);
        env.string("AWS_REGION", &mut self.cache.region);
        env.flag("RUN_LOCAL_MODE", &mut self.cache.local_mode);
        env.string("LOCAL_CACHE_DIR", &mut self.cache.local_dir);
        env.string("CACHE_KEY_PREFIX", &mut self.cache.key_prefix);
        env.parsed("CACHE_KEY_STRATEGY", &mut self.cache.key_strategy);

        env.string("SERVER_ADDRESS", &mut self.server.address);
        env.string("LOG_LEVEL", &mut self.logging.level);

        env.rejected
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.source.base_url)
            .map_err(|e| AppError::validation(format!("source.base_url is invalid: {e}")))?;
        if self.source.desired_count == 0 {
            return Err(AppError::validation("source.desired_count must be > 0"));
        }
        if self.source.max_pages == 0 {
            return Err(AppError::validation("source.max_pages must be > 0"));
        }
        if self.fetch.user_agent.trim().is_empty() {
            return Err(AppError::validation("fetch.user_agent is empty"));
        }
        if self.fetch.timeout_secs == 0 {
            return Err(AppError::validation("fetch.timeout_secs must be > 0"));
        }
        if self.fetch.max_attempts == 0 {
            return Err(AppError::validation("fetch.max_attempts must be > 0"));
        }
        for selector in [
            &self.extract.container_selector,
            &self.extract.text_selector,
            &self.extract.author_selector,
        ] {
            Selector::parse(selector).map_err(|e| AppError::selector(selector, format!("{e:?}")))?;
        }
        if self.cache.key_prefix.trim().is_empty() {
            return Err(AppError::validation("cache.key_prefix is empty"));
        }
        if !self.cache.use_local() && self.cache.url.trim().is_empty() {
            return Err(AppError::validation(
                "cache.url is required outside local mode",
            ));
        }
        Ok(())
    }
}

/// Harvest source settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Base URL; pages live under `{base_url}/page/{n}/`
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// Number of quotes a harvest aims for
    #[serde(default = "defaults::desired_count")]
    pub desired_count: usize,

    /// Upper bound on page attempts per harvest
    #[serde(default = "defaults::max_pages")]
    pub max_pages: u32,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            desired_count: defaults::desired_count(),
            max_pages: defaults::max_pages(),
        }
    }
}

/// HTTP client and fetch behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Attempts per page before giving up on it
    #[serde(default = "defaults::max_attempts")]
    pub max_attempts: u32,

    /// Pause between failed attempts in milliseconds
    #[serde(default = "defaults::retry_delay")]
    pub retry_delay_ms: u64,

    /// Minimum spacing between outbound requests in milliseconds
    #[serde(default = "defaults::rate_limit")]
    pub rate_limit_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            max_attempts: defaults::max_attempts(),
            retry_delay_ms: defaults::retry_delay(),
            rate_limit_ms: defaults::rate_limit(),
        }
    }
}

/// CSS selectors locating quotes in a page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractConfig {
    #[serde(default = "defaults::container_selector")]
    pub container_selector: String,

    #[serde(default = "defaults::text_selector")]
    pub text_selector: String,

    #[serde(default = "defaults::author_selector")]
    pub author_selector: String,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            container_selector: defaults::container_selector(),
            text_selector: defaults::text_selector(),
            author_selector: defaults::author_selector(),
        }
    }
}

/// How entry keys are assigned on write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyStrategy {
    /// `{prefix}:1`, `{prefix}:2`, ... restarting with every write call
    #[default]
    Sequence,
    /// `{prefix}:{digest}` derived from the quote's content
    Content,
}

impl FromStr for KeyStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sequence" => Ok(Self::Sequence),
            "content" => Ok(Self::Content),
            other => Err(format!("unknown key strategy '{other}'")),
        }
    }
}

impl fmt::Display for KeyStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sequence => f.write_str("sequence"),
            Self::Content => f.write_str("content"),
        }
    }
}

/// Cache backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Redis endpoint, `host:port` or a full `redis://` URL
    #[serde(default = "defaults::cache_url")]
    pub url: String,

    /// Provider label (`elasticache`, `redis`, `local`)
    #[serde(default = "defaults::cache_provider")]
    pub provider: String,

    /// Region label, informational only
    #[serde(default = "defaults::region")]
    pub region: String,

    /// Use the file-backed local store instead of Redis
    #[serde(default = "defaults::local_mode")]
    pub local_mode: bool,

    /// Directory of the local store
    #[serde(default = "defaults::local_dir")]
    pub local_dir: String,

    /// Entry key prefix, keys look like `{prefix}:{id}`
    #[serde(default = "defaults::key_prefix")]
    pub key_prefix: String,

    #[serde(default)]
    pub key_strategy: KeyStrategy,
}

impl CacheConfig {
    /// Whether the file-backed store should be used.
    pub fn use_local(&self) -> bool {
        self.local_mode || self.provider.eq_ignore_ascii_case("local")
    }

    /// Connection URL for the Redis client.
    pub fn redis_url(&self) -> String {
        if self.url.contains("://") {
            self.url.clone()
        } else {
            format!("redis://{}", self.url)
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            url: defaults::cache_url(),
            provider: defaults::cache_provider(),
            region: defaults::region(),
            local_mode: defaults::local_mode(),
            local_dir: defaults::local_dir(),
            key_prefix: defaults::key_prefix(),
            key_strategy: KeyStrategy::default(),
        }
    }
}

/// Read API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address; `:8080` binds every interface
    #[serde(default = "defaults::server_address")]
    pub address: String,
}

impl ServerConfig {
    /// Socket address string suitable for `TcpListener::bind`.
    pub fn bind_address(&self) -> String {
        if self.address.starts_with(':') {
            format!("0.0.0.0{}", self.address)
        } else {
            self.address.clone()
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: defaults::server_address(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "defaults::log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
        }
    }
}

/// Environment lookup with the override rules shared by every field.
struct EnvLookup<F> {
    lookup: F,
    rejected: Vec<&'static str>,
}

impl<F> EnvLookup<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, key: &str) -> Option<String> {
        (self.lookup)(key).filter(|v| !v.is_empty())
    }

    fn string(&mut self, key: &'static str, target: &mut String) {
        if let Some(value) = self.get(key) {
            *target = value;
        }
    }

    fn parsed<T>(&mut self, key: &'static str, target: &mut T)
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        if let Some(raw) = self.get(key) {
            match raw.trim().parse() {
                Ok(value) => *target = value,
                Err(e) => {
                    log::warn!("Invalid value for {key}: {raw} ({e}). Keeping current value");
                    self.rejected.push(key);
                }
            }
        }
    }

    fn flag(&mut self, key: &'static str, target: &mut bool) {
        if let Some(raw) = self.get(key) {
            match parse_bool(&raw) {
                Some(value) => *target = value,
                None => {
                    log::warn!("Invalid value for {key}: {raw}. Keeping current value");
                    self.rejected.push(key);
                }
            }
        }
    }
}

/// Variables from the nearest `.env` file, empty when there is none.
fn dotenv_vars() -> HashMap<String, String> {
    match dotenvy::dotenv_iter() {
        Ok(iter) => collect_dotenv(iter),
        Err(e) if e.not_found() => {
            log::debug!("No .env file found");
            HashMap::new()
        }
        Err(e) => {
            log::warn!("Failed to read .env: {e}");
            HashMap::new()
        }
    }
}

fn collect_dotenv<R: Read>(iter: dotenvy::Iter<R>) -> HashMap<String, String> {
    let mut vars = HashMap::new();
    for item in iter {
        match item {
            Ok((key, value)) => {
                vars.insert(key, value);
            }
            Err(e) => log::warn!("Skipping malformed .env entry: {e}"),
        }
    }
    vars
}

/// Accepts the usual spellings: `1`, `t`, `true`, `0`, `f`, `false`, any case.
fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "t" | "true" => Some(true),
        "0" | "f" | "false" => Some(false),
        _ => None,
    }
}

mod defaults {
    // Source defaults
    pub fn base_url() -> String {
        "https://quotes.toscrape.com".into()
    }
    pub fn desired_count() -> usize {
        100
    }
    pub fn max_pages() -> u32 {
        1000
    }

    // Fetch defaults
    pub fn user_agent() -> String {
        concat!("Mozilla/5.0 (compatible; harvester/", env!("CARGO_PKG_VERSION"), ")").into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn max_attempts() -> u32 {
        3
    }
    pub fn retry_delay() -> u64 {
        2000
    }
    pub fn rate_limit() -> u64 {
        500
    }

    // Extraction defaults
    pub fn container_selector() -> String {
        "div.quote".into()
    }
    pub fn text_selector() -> String {
        "span.text".into()
    }
    pub fn author_selector() -> String {
        "small.author".into()
    }

    // Cache defaults
    pub fn cache_url() -> String {
        "redis:6379".into()
    }
    pub fn cache_provider() -> String {
        "elasticache".into()
    }
    pub fn region() -> String {
        "us-east-1".into()
    }
    pub fn local_mode() -> bool {
        true
    }
    pub fn local_dir() -> String {
        "storage".into()
    }
    pub fn key_prefix() -> String {
        "entry".into()
    }

    pub fn server_address() -> String {
        ":8080".into()
    }
    pub fn log_level() -> String {
        "info".into()
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.source.base_url, "https://quotes.toscrape.com");
        assert_eq!(config.source.desired_count, 100);
        assert_eq!(config.fetch.max_attempts, 3);
        assert_eq!(config.fetch.retry_delay_ms, 2000);
        assert_eq!(config.fetch.rate_limit_ms, 500);
        assert_eq!(config.server.address, ":8080");
        assert_eq!(config.cache.provider, "elasticache");
        assert!(config.cache.local_mode);
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = Config::default();
        config.apply_env_from(lookup(&[
            ("BASE_URL", "http://localhost:9000"),
            ("DEFAULT_COUNT", "25"),
            ("SERVER_ADDRESS", "127.0.0.1:3000"),
            ("ELASTICACHE_URL", "cache.internal:6380"),
            ("RUN_LOCAL_MODE", "FALSE"),
            ("CACHE_KEY_STRATEGY", "content"),
        ]));

        assert_eq!(config.source.base_url, "http://localhost:9000");
        assert_eq!(config.source.desired_count, 25);
        assert_eq!(config.server.address, "127.0.0.1:3000");
        assert_eq!(config.cache.redis_url(), "redis://cache.internal:6380");
        assert!(!config.cache.local_mode);
        assert_eq!(config.cache.key_strategy, KeyStrategy::Content);
    }

    #[test]
    fn invalid_env_values_keep_previous() {
        let mut config = Config::default();
        let rejected = config.apply_env_from(lookup(&[
            ("DEFAULT_COUNT", "lots"),
            ("RUN_LOCAL_MODE", "maybe"),
            ("BASE_URL", ""),
        ]));

        assert_eq!(rejected, vec!["DEFAULT_COUNT", "RUN_LOCAL_MODE"]);
        assert_eq!(config.source.desired_count, 100);
        assert!(config.cache.local_mode);
        assert_eq!(config.source.base_url, "https://quotes.toscrape.com");
    }

    #[test]
    fn valid_env_values_are_not_rejected() {
        let mut config = Config::default();
        let rejected = config.apply_env_from(lookup(&[("DEFAULT_COUNT", "7"), ("RUN_LOCAL_MODE", "t")]));
        assert!(rejected.is_empty());
        assert_eq!(config.source.desired_count, 7);
    }

    #[test]
    fn dotenv_file_supplies_overrides() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(".env");
        fs::write(
            &path,
            "# local settings\nBASE_URL=http://localhost:8000\nDEFAULT_COUNT=12\nRUN_LOCAL_MODE=false\n",
        )
        .unwrap();

        let vars = collect_dotenv(dotenvy::from_path_iter(&path).unwrap());
        let mut config = Config::default();
        let rejected = config.apply_env_from(|key| vars.get(key).cloned());

        assert!(rejected.is_empty());
        assert_eq!(config.source.base_url, "http://localhost:8000");
        assert_eq!(config.source.desired_count, 12);
        assert!(!config.cache.local_mode);
    }

    #[test]
    fn toml_sections_fill_missing_fields_with_defaults() {
        let config: Config = toml::from_str(
            r#"
            [source]
            desired_count = 10

            [cache]
            local_mode = false
            url = "redis://10.0.0.5:6379"
            "#,
        )
        .unwrap();

        assert_eq!(config.source.desired_count, 10);
        assert_eq!(config.source.base_url, "https://quotes.toscrape.com");
        assert_eq!(config.cache.redis_url(), "redis://10.0.0.5:6379");
        assert_eq!(config.fetch.max_attempts, 3);
    }

    #[test]
    fn bind_address_expands_bare_port() {
        assert_eq!(ServerConfig::default().bind_address(), "0.0.0.0:8080");
        let server = ServerConfig {
            address: "127.0.0.1:9999".into(),
        };
        assert_eq!(server.bind_address(), "127.0.0.1:9999");
    }

    #[test]
    fn local_provider_label_selects_local_store() {
        let cache = CacheConfig {
            local_mode: false,
            provider: "LOCAL".into(),
            ..CacheConfig::default()
        };
        assert!(cache.use_local());
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut config = Config::default();
        config.fetch.max_attempts = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.extract.container_selector = "[[invalid".into();
        assert!(matches!(
            config.validate(),
            Err(AppError::Selector { .. })
        ));

        let mut config = Config::default();
        config.source.base_url = "not a url".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn parse_bool_spellings() {
        assert_eq!(parse_bool("T"), Some(true));
        assert_eq!(parse_bool("1"), Some(true));
        assert_eq!(parse_bool("False"), Some(false));
        assert_eq!(parse_bool("yes"), None);
    }
}
