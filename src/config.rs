use anyhow::Context;
use std::env::VarError;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://xam150.azurewebsites.net/api/books/";

/// How the per-book URL for an update is joined onto the base URL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PathStyle {
    /// `<base>/<isbn>`: the double slash the catalog has always received on update.
    #[default]
    Legacy,
    /// `<base><isbn>`, the same shape delete uses.
    Normalized,
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    base_url: String,
    path_style: PathStyle,
    strict_status: bool,
    timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Self {
        let mut base_url = base_url.trim().to_string();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Self {
            base_url,
            path_style: PathStyle::default(),
            strict_status: false,
            timeout: None,
        }
    }

    #[must_use]
    pub fn with_path_style(mut self, path_style: PathStyle) -> Self {
        self.path_style = path_style;
        self
    }

    /// Treat non-success statuses on create, update and delete as errors.
    #[must_use]
    pub fn with_strict_status(mut self, strict_status: bool) -> Self {
        self.strict_status = strict_status;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub const fn path_style(&self) -> PathStyle {
        self.path_style
    }

    pub const fn strict_status(&self) -> bool {
        self.strict_status
    }

    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn login_url(&self) -> String {
        format!("{}login", self.base_url)
    }

    pub fn collection_url(&self) -> &str {
        &self.base_url
    }

    pub fn update_url(&self, isbn: &str) -> String {
        match self.path_style {
            PathStyle::Legacy => format!("{}/{isbn}", self.base_url),
            PathStyle::Normalized => format!("{}{isbn}", self.base_url),
        }
    }

    pub fn delete_url(&self, isbn: &str) -> String {
        format!("{}{isbn}", self.base_url)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

#[derive(Debug)]
pub struct Config {
    api_url: String,
    strict_status: bool,
    normalized_paths: bool,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let api_url = load_env("BOOKS_API_URL")?;
        let strict_status = load_optional_env("BOOKS_STRICT_STATUS")?.unwrap_or(false);
        let normalized_paths = load_optional_env("BOOKS_NORMALIZED_PATHS")?.unwrap_or(false);
        Ok(Self {
            api_url,
            strict_status,
            normalized_paths,
        })
    }

    #[must_use]
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    #[must_use]
    pub fn client_config(&self) -> ClientConfig {
        let path_style = if self.normalized_paths {
            PathStyle::Normalized
        } else {
            PathStyle::Legacy
        };
        ClientConfig::new(&self.api_url)
            .with_path_style(path_style)
            .with_strict_status(self.strict_status)
    }
}

fn load_env<T>(key: &str) -> anyhow::Result<T>
where
    T: FromStr,
    <T as FromStr>::Err: std::error::Error + Send + Sync + 'static,
{
    let val =
        std::env::var(key).with_context(|| format!("Failed to load environment variable {key}"))?;
    parse_env(key, &val)
}

fn load_optional_env<T>(key: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    <T as FromStr>::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(val) => parse_env(key, &val).map(Some),
        Err(VarError::NotPresent) => Ok(None),
        Err(err) => {
            Err(err).with_context(|| format!("Failed to load environment variable {key}"))
        }
    }
}

fn parse_env<T>(key: &str, val: &str) -> anyhow::Result<T>
where
    T: FromStr,
    <T as FromStr>::Err: std::error::Error + Send + Sync + 'static,
{
    val.trim()
        .parse::<T>()
        .with_context(|| format!("Failed to parse environment variable {key}"))
}
