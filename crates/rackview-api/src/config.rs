use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use rackview_state::{ControllerSettings, MIN_REFRESH_INTERVAL_SECS};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} is invalid: {value:?}")]
    Invalid { name: &'static str, value: String },

    #[error("REFRESH_INTERVAL_SECS must be at least {min}, got {value}")]
    IntervalTooShort { value: u64, min: u64 },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub listen_addr: SocketAddr,
    pub state_dir: PathBuf,
    pub auto_refresh: bool,
    pub refresh_interval_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let listen_addr = parse(&lookup, "LISTEN_ADDR", "0.0.0.0:8080")?;
        let state_dir = lookup("STATE_DIR").unwrap_or_else(|| ".rackview".into()).into();
        let auto_refresh = parse(&lookup, "AUTO_REFRESH", "true")?;
        let refresh_interval_secs = parse(&lookup, "REFRESH_INTERVAL_SECS", "30")?;

        if refresh_interval_secs < MIN_REFRESH_INTERVAL_SECS {
            return Err(ConfigError::IntervalTooShort {
                value: refresh_interval_secs,
                min: MIN_REFRESH_INTERVAL_SECS,
            });
        }

        Ok(Self {
            listen_addr,
            state_dir,
            auto_refresh,
            refresh_interval_secs,
        })
    }

    pub fn controller_settings(&self) -> ControllerSettings {
        ControllerSettings {
            auto_refresh: self.auto_refresh,
            refresh_interval_secs: self.refresh_interval_secs,
        }
    }
}

fn parse<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: &str,
) -> Result<T, ConfigError> {
    let value = lookup(name).unwrap_or_else(|| default.to_string());
    value.parse().map_err(|_| ConfigError::Invalid { name, value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults() {
        let config = config(&[]).unwrap();

        assert_eq!(config.listen_addr, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(config.state_dir, PathBuf::from(".rackview"));
        assert!(config.auto_refresh);
        assert_eq!(config.refresh_interval_secs, 30);
    }

    #[test]
    fn overrides() {
        let config = config(&[
            ("LISTEN_ADDR", "127.0.0.1:3000"),
            ("STATE_DIR", "/var/lib/rackview"),
            ("AUTO_REFRESH", "false"),
            ("REFRESH_INTERVAL_SECS", "120"),
        ])
        .unwrap();

        assert_eq!(config.listen_addr.port(), 3000);
        assert_eq!(config.state_dir, PathBuf::from("/var/lib/rackview"));
        assert!(!config.auto_refresh);
        assert_eq!(config.refresh_interval_secs, 120);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            config(&[("AUTO_REFRESH", "sometimes")]),
            Err(ConfigError::Invalid { name: "AUTO_REFRESH", .. })
        ));
        assert!(matches!(
            config(&[("REFRESH_INTERVAL_SECS", "2")]),
            Err(ConfigError::IntervalTooShort { value: 2, .. })
        ));
    }
}
