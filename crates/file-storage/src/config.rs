use std::env;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "/uds/utility/files";
pub const DEFAULT_OWNER: &str = "fstor";
pub const DEFAULT_DATABASE_URL: &str = "postgres://localhost/uds";
const DEFAULT_CACHE_CAPACITY: u64 = 10_000;
/// Snapshots live for one hour after their last refresh
pub const CACHE_TTL_SECS: u64 = 3600;

/// Which cache overlay a configuration asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheSelection {
    Disabled,
    Memory,
    /// A backend name this build does not know how to resolve
    Unknown(String),
}

/// File storage configuration parsed from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Base path joined with record UUIDs; always ends in `/`
    pub base_url: String,
    pub cache_backend: Option<String>,
    pub owner: String,
    pub cache_capacity: u64,
    pub database_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: with_trailing_slash(DEFAULT_BASE_URL),
            cache_backend: None,
            owner: DEFAULT_OWNER.to_string(),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            database_url: DEFAULT_DATABASE_URL.to_string(),
        }
    }
}

impl Config {
    /// Parse configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let base_url = lookup("FILE_STORAGE")
            .map(|v| with_trailing_slash(&v))
            .unwrap_or_else(|| with_trailing_slash(DEFAULT_BASE_URL));

        let cache_backend = lookup("FILE_CACHE")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        let owner = lookup("FILE_STORAGE_OWNER").unwrap_or_else(|| DEFAULT_OWNER.to_string());

        let cache_capacity = lookup("FILE_CACHE_CAPACITY")
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_CACHE_CAPACITY);

        let database_url =
            lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

        Self {
            base_url,
            cache_backend,
            owner,
            cache_capacity,
            database_url,
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = with_trailing_slash(base_url);
        self
    }

    #[must_use]
    pub fn with_cache_backend(mut self, name: Option<&str>) -> Self {
        self.cache_backend = name.map(str::to_string);
        self
    }

    #[must_use]
    pub fn with_owner(mut self, owner: &str) -> Self {
        self.owner = owner.to_string();
        self
    }

    pub fn cache_selection(&self) -> CacheSelection {
        match self.cache_backend.as_deref() {
            None | Some("none") => CacheSelection::Disabled,
            Some("memory") => CacheSelection::Memory,
            Some(other) => CacheSelection::Unknown(other.to_string()),
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(CACHE_TTL_SECS)
    }
}

fn with_trailing_slash(url: &str) -> String {
    let trimmed = url.trim_end_matches('/');
    format!("{}/", trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]);
        assert_eq!(config.base_url, "/uds/utility/files/");
        assert_eq!(config.cache_backend, None);
        assert_eq!(config.owner, "fstor");
        assert_eq!(config.cache_capacity, 10_000);
        assert_eq!(config.database_url, "postgres://localhost/uds");
        assert_eq!(config.cache_selection(), CacheSelection::Disabled);
        assert_eq!(config.cache_ttl(), Duration::from_secs(3600));
    }

    #[test]
    fn test_default_matches_empty_env() {
        let a = Config::default();
        let b = config_from(&[]);
        assert_eq!(a.base_url, b.base_url);
        assert_eq!(a.owner, b.owner);
    }

    #[test]
    fn test_env_overrides() {
        let config = config_from(&[
            ("FILE_STORAGE", "/files"),
            ("FILE_CACHE", "memory"),
            ("FILE_STORAGE_OWNER", "tunnel"),
            ("FILE_CACHE_CAPACITY", "42"),
            ("DATABASE_URL", "postgres://db/broker"),
        ]);
        assert_eq!(config.base_url, "/files/");
        assert_eq!(config.cache_selection(), CacheSelection::Memory);
        assert_eq!(config.owner, "tunnel");
        assert_eq!(config.cache_capacity, 42);
        assert_eq!(config.database_url, "postgres://db/broker");
    }

    #[test]
    fn test_single_trailing_slash() {
        assert_eq!(with_trailing_slash("/x"), "/x/");
        assert_eq!(with_trailing_slash("/x/"), "/x/");
        assert_eq!(with_trailing_slash("/x//"), "/x/");
        assert_eq!(with_trailing_slash(""), "/");
    }

    #[test]
    fn test_cache_selection() {
        let config = Config::default();
        assert_eq!(
            config.clone().with_cache_backend(Some("none")).cache_selection(),
            CacheSelection::Disabled
        );
        assert_eq!(
            config.clone().with_cache_backend(Some("memcached")).cache_selection(),
            CacheSelection::Unknown("memcached".to_string())
        );
        assert_eq!(
            config.with_cache_backend(Some("memory")).cache_selection(),
            CacheSelection::Memory
        );
    }

    #[test]
    fn test_blank_cache_name_disables() {
        let config = config_from(&[("FILE_CACHE", "  ")]);
        assert_eq!(config.cache_selection(), CacheSelection::Disabled);
    }

    #[test]
    fn test_invalid_capacity_falls_back() {
        let config = config_from(&[("FILE_CACHE_CAPACITY", "lots")]);
        assert_eq!(config.cache_capacity, 10_000);
    }
}
