//! Service settings
//!
//! Database connection parameters live in [`common::database::DatabaseConfig`];
//! everything else the service needs is read here from the environment.

use config::{Config, ConfigError, Environment};
use serde::Deserialize;
use std::time::Duration;

/// Upper bound on the geolocation lookup
pub const MAX_GEOLOCATION_TIMEOUT_SECONDS: u64 = 5;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server_host: String,
    pub server_port: u16,
    /// Lifetime of a session token, also applied on refresh
    pub session_ttl_seconds: i64,
    /// Argon2 memory cost in KiB
    pub password_memory_kib: u32,
    pub password_iterations: u32,
    pub geolocation_enabled: bool,
    /// Lookup URL, `{ip}` is replaced with the client address
    pub geolocation_url: String,
    pub geolocation_timeout_seconds: u64,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_host: "0.0.0.0".to_string(),
            server_port: 3000,
            session_ttl_seconds: 3600,
            password_memory_kib: 19456,
            password_iterations: 2,
            geolocation_enabled: false,
            geolocation_url: "http://ip-api.com/json/{ip}".to_string(),
            geolocation_timeout_seconds: MAX_GEOLOCATION_TIMEOUT_SECONDS,
            admin_email: None,
            admin_password: None,
        }
    }
}

impl Settings {
    /// Load settings from environment variables on top of the defaults
    pub fn load() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        Config::builder()
            .set_default("server_host", defaults.server_host)?
            .set_default("server_port", i64::from(defaults.server_port))?
            .set_default("session_ttl_seconds", defaults.session_ttl_seconds)?
            .set_default("password_memory_kib", i64::from(defaults.password_memory_kib))?
            .set_default("password_iterations", i64::from(defaults.password_iterations))?
            .set_default("geolocation_enabled", defaults.geolocation_enabled)?
            .set_default("geolocation_url", defaults.geolocation_url)?
            .set_default(
                "geolocation_timeout_seconds",
                defaults.geolocation_timeout_seconds as i64,
            )?
            .add_source(Environment::default().ignore_empty(true).try_parsing(true))
            .build()?
            .try_deserialize()
    }

    /// Address the HTTP listener binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.session_ttl_seconds)
    }

    /// Geolocation timeout, never above five seconds
    pub fn geolocation_timeout(&self) -> Duration {
        Duration::from_secs(
            self.geolocation_timeout_seconds
                .min(MAX_GEOLOCATION_TIMEOUT_SECONDS),
        )
    }

    /// Admin credentials, when both are configured
    pub fn admin_credentials(&self) -> Option<(&str, &str)> {
        match (self.admin_email.as_deref(), self.admin_password.as_deref()) {
            (Some(email), Some(password)) => Some((email, password)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    const VARS: &[&str] = &[
        "SERVER_HOST",
        "SERVER_PORT",
        "SESSION_TTL_SECONDS",
        "PASSWORD_MEMORY_KIB",
        "PASSWORD_ITERATIONS",
        "GEOLOCATION_ENABLED",
        "GEOLOCATION_URL",
        "GEOLOCATION_TIMEOUT_SECONDS",
        "ADMIN_EMAIL",
        "ADMIN_PASSWORD",
    ];

    fn clear_env() {
        for var in VARS.iter().copied() {
            unsafe {
                env::remove_var(var);
            }
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();

        let settings = Settings::load().unwrap();
        assert_eq!(settings.bind_address(), "0.0.0.0:3000");
        assert_eq!(settings.session_ttl(), chrono::Duration::hours(1));
        assert_eq!(settings.password_memory_kib, 19456);
        assert!(!settings.geolocation_enabled);
        assert_eq!(settings.geolocation_timeout(), Duration::from_secs(5));
        assert!(settings.admin_credentials().is_none());
    }

    #[test]
    #[serial]
    fn test_environment_overrides() {
        clear_env();
        unsafe {
            env::set_var("SERVER_PORT", "8080");
            env::set_var("SESSION_TTL_SECONDS", "600");
            env::set_var("GEOLOCATION_ENABLED", "true");
            env::set_var("ADMIN_EMAIL", "root@x.io");
            env::set_var("ADMIN_PASSWORD", "changeme");
        }

        let settings = Settings::load().unwrap();
        assert_eq!(settings.server_port, 8080);
        assert_eq!(settings.session_ttl(), chrono::Duration::minutes(10));
        assert!(settings.geolocation_enabled);
        assert_eq!(
            settings.admin_credentials(),
            Some(("root@x.io", "changeme"))
        );

        clear_env();
    }

    #[test]
    #[serial]
    fn test_geolocation_timeout_is_clamped() {
        clear_env();
        unsafe {
            env::set_var("GEOLOCATION_TIMEOUT_SECONDS", "30");
        }

        let settings = Settings::load().unwrap();
        assert_eq!(settings.geolocation_timeout(), Duration::from_secs(5));

        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_port_fails() {
        clear_env();
        unsafe {
            env::set_var("SERVER_PORT", "not-a-port");
        }

        assert!(Settings::load().is_err());

        clear_env();
    }
}
