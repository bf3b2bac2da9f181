use std::env;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::topics::DEFAULT_TOPIC_BASE;

#[derive(Debug, Clone)]
pub struct Config {
    pub wifi: WifiConfig,
    pub mqtt: MqttConfig,
    pub telemetry: TelemetryConfig,
}

/// Credentials handed to the network collaborator; never interpreted here.
#[derive(Debug, Clone)]
pub struct WifiConfig {
    pub ssid: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct MqttConfig {
    pub broker_host: String,
    pub broker_port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub client_id: String,
    pub topic_base: String,
}

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub interval_secs: u64,
}

impl TelemetryConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{key} has invalid value {value:?}")]
    InvalidValue { key: &'static str, value: String },

    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("{0} must be > 0")]
    Zero(&'static str),

    #[error("WIFI_PASS is set but WIFI_SSID is empty")]
    PasswordWithoutSsid,

    #[error("TOPIC_BASE {0:?} must not contain wildcards or a trailing '/'")]
    InvalidTopicBase(String),
}

/// Reads settings through a lookup so tests never touch the process environment.
struct Source<F> {
    lookup: F,
}

impl<F> Source<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn optional(&self, key: &str) -> Option<String> {
        (self.lookup)(key).filter(|v| !v.is_empty())
    }

    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    fn parsed_or<T: FromStr>(&self, key: &'static str, default: T) -> Result<T, ConfigError> {
        match self.optional(key) {
            Some(value) => value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue { key, value }),
            None => Ok(default),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let src = Source { lookup };

        let config = Self {
            wifi: WifiConfig {
                ssid: src.or_default("WIFI_SSID", ""),
                password: src.or_default("WIFI_PASS", ""),
            },
            mqtt: MqttConfig {
                broker_host: src.or_default("MQTT_BROKER", "test.mosquitto.org"),
                broker_port: src.parsed_or("MQTT_PORT", 1883)?,
                username: src.optional("MQTT_USERNAME"),
                password: src.optional("MQTT_PASSWORD"),
                client_id: src.or_default("MQTT_CLIENT_ID", "room-controller"),
                topic_base: src.or_default("TOPIC_BASE", DEFAULT_TOPIC_BASE),
            },
            telemetry: TelemetryConfig {
                interval_secs: src.parsed_or("TELEMETRY_INTERVAL_SECS", 30)?,
            },
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.mqtt.broker_host.trim().is_empty() {
            return Err(ConfigError::Empty("MQTT_BROKER"));
        }
        if self.mqtt.broker_port == 0 {
            return Err(ConfigError::Zero("MQTT_PORT"));
        }
        if self.mqtt.client_id.trim().is_empty() {
            return Err(ConfigError::Empty("MQTT_CLIENT_ID"));
        }
        if self.telemetry.interval_secs == 0 {
            return Err(ConfigError::Zero("TELEMETRY_INTERVAL_SECS"));
        }
        if self.wifi.ssid.is_empty() && !self.wifi.password.is_empty() {
            return Err(ConfigError::PasswordWithoutSsid);
        }
        let base = &self.mqtt.topic_base;
        if base.contains(['#', '+']) || base.ends_with('/') {
            return Err(ConfigError::InvalidTopicBase(base.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(move |key| map.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.mqtt.broker_host, "test.mosquitto.org");
        assert_eq!(config.mqtt.broker_port, 1883);
        assert_eq!(config.mqtt.client_id, "room-controller");
        assert_eq!(config.mqtt.topic_base, "home/room1");
        assert_eq!(config.mqtt.username, None);
        assert_eq!(config.telemetry.interval(), Duration::from_secs(30));
        assert!(config.wifi.ssid.is_empty());
    }

    #[test]
    fn overrides() {
        let config = load(&[
            ("WIFI_SSID", "attic"),
            ("WIFI_PASS", "hunter2"),
            ("MQTT_BROKER", "broker.lan"),
            ("MQTT_PORT", "8883"),
            ("MQTT_USERNAME", "room"),
            ("MQTT_PASSWORD", "secret"),
            ("TOPIC_BASE", "home/attic"),
            ("TELEMETRY_INTERVAL_SECS", "5"),
        ])
        .unwrap();
        assert_eq!(config.wifi.ssid, "attic");
        assert_eq!(config.wifi.password, "hunter2");
        assert_eq!(config.mqtt.broker_host, "broker.lan");
        assert_eq!(config.mqtt.broker_port, 8883);
        assert_eq!(config.mqtt.username.as_deref(), Some("room"));
        assert_eq!(config.mqtt.password.as_deref(), Some("secret"));
        assert_eq!(config.mqtt.topic_base, "home/attic");
        assert_eq!(config.telemetry.interval_secs, 5);
    }

    #[test]
    fn empty_values_fall_back_to_defaults() {
        let config = load(&[("MQTT_BROKER", ""), ("MQTT_USERNAME", "")]).unwrap();
        assert_eq!(config.mqtt.broker_host, "test.mosquitto.org");
        assert_eq!(config.mqtt.username, None);
    }

    #[test]
    fn rejects_bad_port() {
        assert_eq!(
            load(&[("MQTT_PORT", "70000")]).unwrap_err(),
            ConfigError::InvalidValue {
                key: "MQTT_PORT",
                value: "70000".to_string()
            }
        );
        assert_eq!(
            load(&[("MQTT_PORT", "0")]).unwrap_err(),
            ConfigError::Zero("MQTT_PORT")
        );
    }

    #[test]
    fn rejects_zero_interval() {
        assert_eq!(
            load(&[("TELEMETRY_INTERVAL_SECS", "0")]).unwrap_err(),
            ConfigError::Zero("TELEMETRY_INTERVAL_SECS")
        );
    }

    #[test]
    fn rejects_password_without_ssid() {
        assert_eq!(
            load(&[("WIFI_PASS", "hunter2")]).unwrap_err(),
            ConfigError::PasswordWithoutSsid
        );
    }

    #[test]
    fn rejects_wildcard_topic_base() {
        for base in ["home/#", "home/+/x", "home/"] {
            assert!(matches!(
                load(&[("TOPIC_BASE", base)]).unwrap_err(),
                ConfigError::InvalidTopicBase(_)
            ));
        }
    }
}
