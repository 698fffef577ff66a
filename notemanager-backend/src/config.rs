use std::env;
use std::ops::RangeInclusive;

/// Environment variable names - single source of truth
pub mod env_vars {
    pub const PORT: &str = "PORT";
    pub const BIND_ADDRESS: &str = "BIND_ADDRESS";
    pub const DATABASE_URL: &str = "DATABASE_URL";
    /// Hours an auth session stays valid after its last use.
    pub const SESSION_TTL_HOURS: &str = "SESSION_TTL_HOURS";
    /// When both username and password are set, a privileged user with this
    /// username is created on boot if it does not exist yet.
    pub const BOOTSTRAP_ADMIN_USERNAME: &str = "BOOTSTRAP_ADMIN_USERNAME";
    pub const BOOTSTRAP_ADMIN_PASSWORD: &str = "BOOTSTRAP_ADMIN_PASSWORD";
    pub const BOOTSTRAP_ADMIN_EMAIL: &str = "BOOTSTRAP_ADMIN_EMAIL";
}

/// Default values
pub mod defaults {
    pub const PORT: u16 = 8080;
    pub const BIND_ADDRESS: &str = "127.0.0.1";
    pub const DATABASE_URL: &str = "./.db/notemanager.db";
    pub const SESSION_TTL_HOURS: i64 = 24;
    /// Upper bound for SESSION_TTL_HOURS (one year)
    pub const MAX_SESSION_TTL_HOURS: i64 = 24 * 365;
}

/// Credentials for the administrator created on first boot
#[derive(Clone, Debug)]
pub struct BootstrapAdmin {
    pub username: String,
    pub password: String,
    pub email: String,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub bind_address: String,
    pub database_url: String,
    pub session_ttl_hours: i64,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: defaults::PORT,
            bind_address: defaults::BIND_ADDRESS.to_string(),
            database_url: defaults::DATABASE_URL.to_string(),
            session_ttl_hours: defaults::SESSION_TTL_HOURS,
            bootstrap_admin: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let bootstrap_admin = match (
            non_empty_var(env_vars::BOOTSTRAP_ADMIN_USERNAME),
            non_empty_var(env_vars::BOOTSTRAP_ADMIN_PASSWORD),
        ) {
            (Some(username), Some(password)) => Some(BootstrapAdmin {
                username,
                password,
                email: env::var(env_vars::BOOTSTRAP_ADMIN_EMAIL).unwrap_or_default(),
            }),
            (Some(_), None) | (None, Some(_)) => {
                log::warn!(
                    "Both {} and {} must be set to bootstrap an admin; skipping",
                    env_vars::BOOTSTRAP_ADMIN_USERNAME,
                    env_vars::BOOTSTRAP_ADMIN_PASSWORD
                );
                None
            }
            (None, None) => None,
        };

        Self {
            port: parse_var(env_vars::PORT, defaults::PORT),
            bind_address: env::var(env_vars::BIND_ADDRESS)
                .unwrap_or_else(|_| defaults::BIND_ADDRESS.to_string()),
            database_url: env::var(env_vars::DATABASE_URL)
                .unwrap_or_else(|_| defaults::DATABASE_URL.to_string()),
            session_ttl_hours: parse_ranged_var(
                env_vars::SESSION_TTL_HOURS,
                1..=defaults::MAX_SESSION_TTL_HOURS,
                defaults::SESSION_TTL_HOURS,
            ),
            bootstrap_admin,
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Parse a numeric env var, falling back to the default (with a warning) on garbage
fn parse_var<T>(name: &str, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                log::warn!("Invalid {} value {:?}, using default {}", name, raw, default);
                default
            }
        },
        Err(_) => default,
    }
}

/// Like [`parse_var`], but values outside `range` also fall back to the default
fn parse_ranged_var(name: &str, range: RangeInclusive<i64>, default: i64) -> i64 {
    let value = parse_var(name, default);
    if range.contains(&value) {
        value
    } else {
        log::warn!(
            "{} value {} is outside {}..={}, using default {}",
            name,
            value,
            range.start(),
            range.end(),
            default
        );
        default
    }
}
