use std::env;
use std::str::FromStr;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub emias_base_url: String,
    pub emias_timeout_seconds: u64,
    pub schedule_cache_ttl_seconds: u64,
    pub schedule_cache_capacity: usize,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    pub mail_from: String,
    pub smtp_timeout_seconds: u64,
    pub poll_interval_seconds: u64,
    pub poll_max_concurrent_requests: usize,
    pub supabase_url: String,
    pub supabase_service_key: String,
    pub supabase_timeout_seconds: u64,
    pub server_port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            emias_base_url: "https://emias.info/api/new".to_string(),
            emias_timeout_seconds: 15,
            schedule_cache_ttl_seconds: 3600,
            schedule_cache_capacity: 100,
            smtp_host: "smtp.gmail.com".to_string(),
            smtp_port: 465,
            smtp_username: String::new(),
            smtp_password: String::new(),
            mail_from: String::new(),
            smtp_timeout_seconds: 30,
            poll_interval_seconds: 300,
            poll_max_concurrent_requests: 4,
            supabase_url: String::new(),
            supabase_service_key: String::new(),
            supabase_timeout_seconds: 10,
            server_port: 3000,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let smtp_username = string_var("SMTP_USERNAME", defaults.smtp_username);
        let mail_from = env::var("MAIL_FROM").unwrap_or_else(|_| {
            warn!("MAIL_FROM not set, sending as SMTP_USERNAME");
            smtp_username.clone()
        });

        let config = Self {
            emias_base_url: string_var("EMIAS_BASE_URL", defaults.emias_base_url),
            emias_timeout_seconds: parsed_var("EMIAS_TIMEOUT_SECONDS", defaults.emias_timeout_seconds),
            schedule_cache_ttl_seconds: parsed_var(
                "SCHEDULE_CACHE_TTL_SECONDS",
                defaults.schedule_cache_ttl_seconds,
            ),
            schedule_cache_capacity: parsed_var(
                "SCHEDULE_CACHE_CAPACITY",
                defaults.schedule_cache_capacity,
            ),
            smtp_host: string_var("SMTP_HOST", defaults.smtp_host),
            smtp_port: parsed_var("SMTP_PORT", defaults.smtp_port),
            smtp_username,
            smtp_password: string_var("SMTP_PASSWORD", defaults.smtp_password),
            mail_from,
            smtp_timeout_seconds: parsed_var("SMTP_TIMEOUT_SECONDS", defaults.smtp_timeout_seconds),
            poll_interval_seconds: parsed_var("POLL_INTERVAL_SECONDS", defaults.poll_interval_seconds),
            poll_max_concurrent_requests: parsed_var(
                "POLL_MAX_CONCURRENT_REQUESTS",
                defaults.poll_max_concurrent_requests,
            ),
            supabase_url: string_var("SUPABASE_URL", defaults.supabase_url),
            supabase_service_key: string_var("SUPABASE_SERVICE_KEY", defaults.supabase_service_key),
            supabase_timeout_seconds: parsed_var(
                "SUPABASE_TIMEOUT_SECONDS",
                defaults.supabase_timeout_seconds,
            ),
            server_port: parsed_var("SERVER_PORT", defaults.server_port),
        };

        if !config.is_mail_configured() {
            warn!("Mail relay not fully configured - notifications will fail until SMTP credentials are set");
        }

        config
    }

    pub fn is_mail_configured(&self) -> bool {
        !self.smtp_host.is_empty()
            && !self.smtp_username.is_empty()
            && !self.smtp_password.is_empty()
            && !self.mail_from.is_empty()
    }

    pub fn is_store_configured(&self) -> bool {
        !self.supabase_url.is_empty() && !self.supabase_service_key.is_empty()
    }
}

fn string_var(key: &str, default: String) -> String {
    env::var(key).unwrap_or_else(|_| {
        if default.is_empty() {
            warn!("{} not set, using empty value", key);
        } else {
            warn!("{} not set, using default", key);
        }
        default
    })
}

fn parsed_var<T>(key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => parse_or(key, &raw, default),
        Err(_) => default,
    }
}

fn parse_or<T>(key: &str, raw: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display,
{
    raw.trim().parse().unwrap_or_else(|_| {
        warn!("{}={:?} is not valid, using default {}", key, raw, default);
        default
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_upstream_contract() {
        let config = AppConfig::default();

        assert_eq!(config.emias_base_url, "https://emias.info/api/new");
        assert_eq!(config.schedule_cache_ttl_seconds, 3600);
        assert_eq!(config.schedule_cache_capacity, 100);
        assert_eq!(config.smtp_port, 465);
        assert_eq!(config.supabase_timeout_seconds, 10);
        assert!(!config.is_mail_configured());
        assert!(!config.is_store_configured());
    }

    #[test]
    fn test_parse_or_falls_back_on_garbage() {
        assert_eq!(parse_or("POLL_INTERVAL_SECONDS", "120", 300u64), 120);
        assert_eq!(parse_or("POLL_INTERVAL_SECONDS", " 90 ", 300u64), 90);
        assert_eq!(parse_or("POLL_INTERVAL_SECONDS", "soon", 300u64), 300);
        assert_eq!(parse_or("SMTP_PORT", "-1", 465u16), 465);
    }

    #[test]
    fn test_configured_predicates() {
        let config = AppConfig {
            smtp_username: "watcher@example.com".to_string(),
            smtp_password: "secret".to_string(),
            mail_from: "watcher@example.com".to_string(),
            supabase_url: "http://localhost:54321".to_string(),
            supabase_service_key: "service-key".to_string(),
            ..AppConfig::default()
        };

        assert!(config.is_mail_configured());
        assert!(config.is_store_configured());
    }
}
