use std::env;

use crate::services::timezone::parse_timezone;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub jwt_secret: String,
    pub jwt_expiry_seconds: u64,
    pub host: String,
    pub port: u16,
    pub default_timezone: String,
    /// `None` means any origin is allowed (`CORS_ORIGINS=*`).
    pub cors_origins: Option<Vec<String>>,
    pub rate_limit_window_secs: u64,
    pub rate_limit_max: u64,
    pub suggestion_cache_ttl_secs: u64,
    pub suggestion_sample_size: usize,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup (the process env in production).
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| -> String {
            lookup(key)
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let jwt_secret = lookup("JWT_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or_else(|| anyhow::anyhow!("Missing required env var: JWT_SECRET"))?;
        if jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters");
        }

        let default_timezone = get("DEFAULT_TIMEZONE", "Asia/Bangkok");
        parse_timezone(&default_timezone)?;

        let cors_raw = get("CORS_ORIGINS", "*");
        let cors_origins = if cors_raw.trim() == "*" {
            None
        } else {
            Some(
                cors_raw
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            )
        };

        Ok(Self {
            database_url: lookup("DATABASE_URL")
                .filter(|s| !s.is_empty())
                .ok_or_else(|| anyhow::anyhow!("Missing required env var: DATABASE_URL"))?,
            redis_url: get("REDIS_URL", "redis://127.0.0.1:6379"),
            jwt_secret,
            jwt_expiry_seconds: get("JWT_EXPIRY_SECONDS", "604800").parse()?,
            host: get("HOST", "0.0.0.0"),
            port: get("PORT", "3000").parse()?,
            default_timezone,
            cors_origins,
            rate_limit_window_secs: get("RATE_LIMIT_WINDOW_SECS", "60").parse()?,
            rate_limit_max: get("RATE_LIMIT_MAX", "120").parse()?,
            suggestion_cache_ttl_secs: get("SUGGESTION_CACHE_TTL_SECS", "300").parse()?,
            suggestion_sample_size: get("SUGGESTION_SAMPLE_SIZE", "10").parse()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    #[test]
    fn test_defaults_applied() {
        let cfg = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/meals"),
            ("JWT_SECRET", SECRET),
        ]))
        .unwrap();

        assert_eq!(cfg.port, 3000);
        assert_eq!(cfg.jwt_expiry_seconds, 604_800);
        assert_eq!(cfg.default_timezone, "Asia/Bangkok");
        assert_eq!(cfg.suggestion_cache_ttl_secs, 300);
        assert_eq!(cfg.suggestion_sample_size, 10);
        assert!(cfg.cors_origins.is_none());
    }

    #[test]
    fn test_short_jwt_secret_rejected() {
        let res = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/meals"),
            ("JWT_SECRET", "too-short"),
        ]));
        assert!(res.is_err());
    }

    #[test]
    fn test_missing_database_url_rejected() {
        let res = Config::from_lookup(lookup_from(&[("JWT_SECRET", SECRET)]));
        assert!(res.is_err());
    }

    #[test]
    fn test_unknown_default_timezone_rejected() {
        let res = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/meals"),
            ("JWT_SECRET", SECRET),
            ("DEFAULT_TIMEZONE", "Mars/Olympus_Mons"),
        ]));
        assert!(res.is_err());
    }

    #[test]
    fn test_cors_origin_list_parsed() {
        let cfg = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/meals"),
            ("JWT_SECRET", SECRET),
            ("CORS_ORIGINS", "http://localhost:5173, https://meals.example.com"),
        ]))
        .unwrap();
        assert_eq!(
            cfg.cors_origins.unwrap(),
            vec!["http://localhost:5173", "https://meals.example.com"]
        );
    }
}
