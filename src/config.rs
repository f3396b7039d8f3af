// Process-wide configuration, read once at startup and passed down explicitly

use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use thiserror::Error;

use crate::geocoder::DEFAULT_NOMINATIM_BASE_URL;
use crate::lookup::HttpSettings;
use crate::parcel::DEFAULT_EASYPOST_BASE_URL;
use crate::registry::DEFAULT_GLEIF_BASE_URL;
use crate::sea_route::{DEFAULT_CRUISE_SPEED_KNOTS, DEFAULT_SEAROUTES_BASE_URL};

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

// How the independent lookups of one trace are dispatched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchMode {
    #[default]
    Sequential,
    /// Registry and both geocodes run together; the sea leg and the parcel
    /// tracker run together once those have succeeded.
    Concurrent,
}

impl FromStr for DispatchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sequential" => Ok(DispatchMode::Sequential),
            "concurrent" | "parallel" => Ok(DispatchMode::Concurrent),
            other => Err(format!("expected sequential or concurrent, got {}", other)),
        }
    }
}

impl fmt::Display for DispatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchMode::Sequential => write!(f, "sequential"),
            DispatchMode::Concurrent => write!(f, "concurrent"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    pub debug: bool,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
}

#[derive(Debug, Clone)]
pub struct LookupConfig {
    pub http: HttpSettings,
    pub gleif_base_url: String,
    pub nominatim_base_url: String,
    pub searoutes_base_url: String,
    pub searoutes_key: Option<String>,
    pub cruise_speed_knots: f64,
    pub easypost_base_url: String,
    pub easypost_api_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub log: LogConfig,
    pub dispatch: DispatchMode,
    pub lookups: LookupConfig,
}

impl AppConfig {
    /// Load `.env` (if any) and build the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_vars<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let debug = match var("FLASK_DEBUG") {
            Some(raw) => parse_flag("FLASK_DEBUG", &raw)?,
            None => var("DEBUG")
                .map(|raw| parse_flag("DEBUG", &raw))
                .transpose()?
                .unwrap_or(false),
        };

        let server = ServerConfig {
            host: parse_or("HOST", var("HOST"), IpAddr::from([127, 0, 0, 1]))?,
            port: parse_or("PORT", var("PORT"), 5000u16)?,
            debug,
        };

        let default_level = if debug { "debug" } else { "info" };
        let log = LogConfig {
            level: var("LOG_LEVEL").unwrap_or_else(|| default_level.to_string()),
            json: var("LOG_JSON")
                .map(|raw| parse_flag("LOG_JSON", &raw))
                .transpose()?
                .unwrap_or(false),
        };

        let dispatch = parse_or("TRACE_DISPATCH", var("TRACE_DISPATCH"), DispatchMode::default())?;

        let timeout_secs: u64 = parse_or("HTTP_TIMEOUT_SECS", var("HTTP_TIMEOUT_SECS"), 10)?;
        if timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "HTTP_TIMEOUT_SECS",
                value: "0".to_string(),
                reason: "must be at least one second".to_string(),
            });
        }
        let timeout_ms = timeout_secs.checked_mul(1000).ok_or_else(|| ConfigError::Invalid {
            key: "HTTP_TIMEOUT_SECS",
            value: timeout_secs.to_string(),
            reason: "too large".to_string(),
        })?;
        let mut http = HttpSettings {
            timeout_ms,
            ..HttpSettings::default()
        };
        if let Some(user_agent) = var("HTTP_USER_AGENT") {
            http.user_agent = user_agent;
        }

        let cruise_speed_knots: f64 = parse_or(
            "CRUISE_SPEED_KNOTS",
            var("CRUISE_SPEED_KNOTS"),
            DEFAULT_CRUISE_SPEED_KNOTS,
        )?;
        if !cruise_speed_knots.is_finite() || cruise_speed_knots < 0.0 {
            return Err(ConfigError::Invalid {
                key: "CRUISE_SPEED_KNOTS",
                value: cruise_speed_knots.to_string(),
                reason: "must be a non-negative number".to_string(),
            });
        }

        let lookups = LookupConfig {
            http,
            gleif_base_url: var("GLEIF_BASE_URL").unwrap_or_else(|| DEFAULT_GLEIF_BASE_URL.into()),
            nominatim_base_url: var("NOMINATIM_BASE_URL")
                .unwrap_or_else(|| DEFAULT_NOMINATIM_BASE_URL.into()),
            searoutes_base_url: var("SEAROUTES_BASE_URL")
                .unwrap_or_else(|| DEFAULT_SEAROUTES_BASE_URL.into()),
            searoutes_key: var("SEAROUTES_KEY"),
            cruise_speed_knots,
            easypost_base_url: var("EASYPOST_BASE_URL")
                .unwrap_or_else(|| DEFAULT_EASYPOST_BASE_URL.into()),
            easypost_api_key: var("EASYPOST_API_KEY"),
        };

        Ok(AppConfig {
            server,
            log,
            dispatch,
            lookups,
        })
    }
}

fn parse_flag(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            value: raw.to_string(),
            reason: "expected a boolean flag".to_string(),
        }),
    }
}

fn parse_or<T>(key: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            value: raw.clone(),
            reason: e.to_string(),
        }),
    }
}
