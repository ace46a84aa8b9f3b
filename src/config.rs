use std::{fmt::Display, str::FromStr};

use log::{info, warn};

use crate::error::ConfigError;
use crate::route::DEFAULT_HOME_ROUTE;

pub const SUPABASE_URL_KEY: &str = "UNBLOT_SUPABASE_URL";
pub const SUPABASE_ANON_KEY_KEY: &str = "UNBLOT_SUPABASE_ANON_KEY";
pub const HOME_ROUTE_KEY: &str = "UNBLOT_HOME_ROUTE";
pub const TOAST_MILLIS_KEY: &str = "UNBLOT_TOAST_MILLIS";
pub const REDIRECT_MILLIS_KEY: &str = "UNBLOT_REDIRECT_MILLIS";
pub const EXPORT_DELAY_MILLIS_KEY: &str = "UNBLOT_EXPORT_DELAY_MILLIS";
pub const HEARTBEAT_MILLIS_KEY: &str = "UNBLOT_HEARTBEAT_MILLIS";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub supabase_url: String,
    pub anon_key: String,
    pub home_route: String,
    /// How long a toast stays up.
    pub toast_millis: u32,
    /// Delay between a success toast and the follow-up navigation.
    pub redirect_millis: u32,
    /// Delay between closing the share modal and starting an image export.
    pub export_delay_millis: u32,
    pub heartbeat_millis: u32,
}

impl Config {
    pub fn new(supabase_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Config {
            supabase_url: supabase_url.into().trim_end_matches('/').to_owned(),
            anon_key: anon_key.into(),
            home_route: DEFAULT_HOME_ROUTE.to_owned(),
            toast_millis: 2000,
            redirect_millis: 1000,
            export_delay_millis: 300,
            heartbeat_millis: 30_000,
        }
    }

    /// Builds the configuration from a key lookup, e.g. environment variables
    /// or globals set by the hosting page.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let supabase_url = required(&lookup, SUPABASE_URL_KEY)?;
        if !(supabase_url.starts_with("https://") || supabase_url.starts_with("http://")) {
            return Err(ConfigError::Invalid {
                key: SUPABASE_URL_KEY,
                reason: format!("{supabase_url} is not an http(s) url"),
            });
        }
        let anon_key = required(&lookup, SUPABASE_ANON_KEY_KEY)?;

        let mut config = Config::new(supabase_url, anon_key);

        if let Some(home_route) = lookup(HOME_ROUTE_KEY) {
            if !home_route.starts_with('#') {
                return Err(ConfigError::Invalid {
                    key: HOME_ROUTE_KEY,
                    reason: format!("{home_route} does not start with #"),
                });
            }
            config.home_route = home_route;
        }
        config.toast_millis = try_load(&lookup, TOAST_MILLIS_KEY, config.toast_millis)?;
        config.redirect_millis = try_load(&lookup, REDIRECT_MILLIS_KEY, config.redirect_millis)?;
        config.export_delay_millis =
            try_load(&lookup, EXPORT_DELAY_MILLIS_KEY, config.export_delay_millis)?;
        config.heartbeat_millis = try_load(&lookup, HEARTBEAT_MILLIS_KEY, config.heartbeat_millis)?;

        Ok(config)
    }

    pub fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.supabase_url, table)
    }

    pub fn rpc_url(&self, function: &str) -> String {
        format!("{}/rest/v1/rpc/{}", self.supabase_url, function)
    }

    pub fn auth_url(&self, endpoint: &str) -> String {
        format!("{}/auth/v1/{}", self.supabase_url, endpoint)
    }

    pub fn realtime_url(&self) -> String {
        let socket_base = if let Some(rest) = self.supabase_url.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = self.supabase_url.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            self.supabase_url.clone()
        };
        format!(
            "{}/realtime/v1/websocket?apikey={}&vsn=1.0.0",
            socket_base,
            urlencoding::encode(&self.anon_key)
        )
    }
}

fn required<F>(lookup: &F, key: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| {
            warn!("{key} is not set");
            ConfigError::Missing(key)
        })
}

fn try_load<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + Display,
    T::Err: Display,
{
    match lookup(key) {
        None => {
            info!("{key} not set, using default: {default}");
            Ok(default)
        }
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| {
            warn!("Invalid {key} value: {e}");
            ConfigError::Invalid {
                key,
                reason: e.to_string(),
            }
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn loads_required_values_and_defaults() {
        let config = Config::from_lookup(lookup(&[
            (SUPABASE_URL_KEY, "https://demo.supabase.co/"),
            (SUPABASE_ANON_KEY_KEY, "anon"),
            (TOAST_MILLIS_KEY, "1500"),
        ]))
        .unwrap();

        assert_eq!(config.supabase_url, "https://demo.supabase.co");
        assert_eq!(config.toast_millis, 1500);
        assert_eq!(config.redirect_millis, 1000);
        assert_eq!(config.home_route, "#home");
        assert_eq!(config.rest_url("poems"), "https://demo.supabase.co/rest/v1/poems");
        assert_eq!(
            config.realtime_url(),
            "wss://demo.supabase.co/realtime/v1/websocket?apikey=anon&vsn=1.0.0"
        );
    }

    #[test]
    fn rejects_missing_and_malformed_values() {
        assert_eq!(
            Config::from_lookup(lookup(&[(SUPABASE_ANON_KEY_KEY, "anon")])),
            Err(ConfigError::Missing(SUPABASE_URL_KEY))
        );
        assert!(matches!(
            Config::from_lookup(lookup(&[
                (SUPABASE_URL_KEY, "demo.supabase.co"),
                (SUPABASE_ANON_KEY_KEY, "anon"),
            ])),
            Err(ConfigError::Invalid { key: SUPABASE_URL_KEY, .. })
        ));
        assert!(matches!(
            Config::from_lookup(lookup(&[
                (SUPABASE_URL_KEY, "https://demo.supabase.co"),
                (SUPABASE_ANON_KEY_KEY, "anon"),
                (REDIRECT_MILLIS_KEY, "soon"),
            ])),
            Err(ConfigError::Invalid { key: REDIRECT_MILLIS_KEY, .. })
        ));
    }
}
