use crate::error::{BatonError, Result};
use crate::request::CONTROLLER_ATTRIBUTE;
use dashmap::DashMap;
use std::env;
use std::str::FromStr;
use std::sync::Arc;

pub const BODY_LIMIT_KEY: &str = "BATON_BODY_LIMIT";
pub const EXPOSE_ERRORS_KEY: &str = "BATON_EXPOSE_ERRORS";
pub const CONTROLLER_ATTRIBUTE_KEY: &str = "BATON_CONTROLLER_ATTRIBUTE";

const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Key/value configuration, seeded from the process environment.
#[derive(Clone, Default)]
pub struct ConfigService {
    config: Arc<DashMap<String, String>>,
}

impl ConfigService {
    /// An empty service; use [`ConfigService::from_env`] for the environment.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let service = Self::default();
        for (key, value) in env::vars() {
            service.set(&key, &value);
        }
        service
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.config.get(key).map(|v| v.clone())
    }

    pub fn set(&self, key: &str, value: &str) {
        self.config.insert(key.to_string(), value.to_string());
    }

    /// Parse `key` as `T`; `Ok(None)` when it is unset.
    pub fn get_parsed<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.get(key)
            .map(|raw| {
                raw.trim().parse::<T>().map_err(|e| BatonError::Config {
                    key: key.to_string(),
                    message: e.to_string(),
                })
            })
            .transpose()
    }
}

/// Settings the kernel reads at startup.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct KernelConfig {
    /// Largest request body buffered before dispatch, in bytes.
    pub body_limit: usize,
    /// Show 5xx error messages to clients.
    pub expose_errors: bool,
    /// Request attribute the routing stage writes the controller name to.
    pub controller_attribute: String,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            body_limit: DEFAULT_BODY_LIMIT,
            expose_errors: false,
            controller_attribute: CONTROLLER_ATTRIBUTE.to_string(),
        }
    }
}

impl KernelConfig {
    pub fn from_config(config: &ConfigService) -> Result<Self> {
        let defaults = Self::default();

        let body_limit = config
            .get_parsed::<usize>(BODY_LIMIT_KEY)?
            .unwrap_or(defaults.body_limit);

        let expose_errors = match config.get(EXPOSE_ERRORS_KEY) {
            Some(raw) => parse_flag(&raw).ok_or_else(|| BatonError::Config {
                key: EXPOSE_ERRORS_KEY.to_string(),
                message: format!("expected a boolean, got {:?}", raw),
            })?,
            None => defaults.expose_errors,
        };

        let controller_attribute = match config.get(CONTROLLER_ATTRIBUTE_KEY) {
            Some(raw) if raw.trim().is_empty() => {
                return Err(BatonError::Config {
                    key: CONTROLLER_ATTRIBUTE_KEY.to_string(),
                    message: "must not be empty".to_string(),
                });
            }
            Some(raw) => raw.trim().to_string(),
            None => defaults.controller_attribute,
        };

        Ok(Self {
            body_limit,
            expose_errors,
            controller_attribute,
        })
    }

    pub fn from_env() -> Result<Self> {
        Self::from_config(&ConfigService::from_env())
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = KernelConfig::from_config(&ConfigService::new()).unwrap();
        assert_eq!(config, KernelConfig::default());
        assert_eq!(config.body_limit, 2 * 1024 * 1024);
    }

    #[test]
    fn test_overrides() {
        let service = ConfigService::new();
        service.set(BODY_LIMIT_KEY, "1024");
        service.set(EXPOSE_ERRORS_KEY, "yes");
        service.set(CONTROLLER_ATTRIBUTE_KEY, "_action");

        let config = KernelConfig::from_config(&service).unwrap();
        assert_eq!(config.body_limit, 1024);
        assert!(config.expose_errors);
        assert_eq!(config.controller_attribute, "_action");
    }

    #[test]
    fn test_invalid_values() {
        let service = ConfigService::new();
        service.set(BODY_LIMIT_KEY, "lots");
        assert!(matches!(
            KernelConfig::from_config(&service),
            Err(BatonError::Config { ref key, .. }) if key == BODY_LIMIT_KEY
        ));

        let service = ConfigService::new();
        service.set(EXPOSE_ERRORS_KEY, "maybe");
        assert!(KernelConfig::from_config(&service).is_err());
    }
}
