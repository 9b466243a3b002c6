// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Application configuration management.
//!
//! Configuration is stored as TOML through `confy`. Every field has a serde
//! default so a partial or older file still loads.

use std::path::{Path, PathBuf};
use std::time::Duration;

use log::info;
use serde::{Deserialize, Serialize};
use whazzup_feed::aggregate::DEFAULT_DISPLAY_CAP;
use whazzup_feed::pipelines::{
    AIRPORT_WEATHER_INTERVAL, DEFAULT_WEATHER_STATIONS, LIVE_CONTROLLERS_INTERVAL,
    LIVE_TRAFFIC_INTERVAL, SECTOR_TRAFFIC_INTERVAL,
};
use whazzup_feed::source::AVWX_TOKEN_ENV;
use whazzup_feed::{AVWX_METAR_URL, LEGACY_URL, TRACKER_URL};

const APP_NAME: &str = "firboard";
const CONFIG_NAME: &str = "config";

/// Application configuration stored in TOML format
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AppConfig {
    /// Configuration schema version for migrations
    #[serde(default = "default_config_version")]
    pub config_version: u32,

    /// Structured tracker JSON endpoint
    #[serde(default = "default_tracker_url")]
    pub tracker_url: String,

    /// Legacy whazzup text endpoint
    #[serde(default = "default_legacy_url")]
    pub legacy_url: String,

    /// AVWX METAR endpoint (station is appended)
    #[serde(default = "default_avwx_url")]
    pub avwx_url: String,

    /// AVWX API token (optional, env var takes precedence)
    #[serde(default)]
    pub avwx_api_token: Option<String>,

    /// Airports shown by the weather widget
    #[serde(default = "default_weather_stations")]
    pub weather_stations: Vec<String>,

    #[serde(default = "default_sector_interval")]
    pub sector_interval_secs: u64,

    #[serde(default = "default_traffic_interval")]
    pub traffic_interval_secs: u64,

    #[serde(default = "default_controllers_interval")]
    pub controllers_interval_secs: u64,

    #[serde(default = "default_weather_interval")]
    pub weather_interval_secs: u64,

    /// Per-request HTTP timeout
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Flights listed per FIR on the traffic board
    #[serde(default = "default_display_cap")]
    pub display_cap: usize,

    /// Region table override; the built-in table is used when unset
    #[serde(default)]
    pub regions_path: Option<PathBuf>,
}

// Default value functions for serde
fn default_config_version() -> u32 {
    1 // Current schema version
}

fn default_tracker_url() -> String {
    TRACKER_URL.to_string()
}

fn default_legacy_url() -> String {
    LEGACY_URL.to_string()
}

fn default_avwx_url() -> String {
    AVWX_METAR_URL.to_string()
}

fn default_weather_stations() -> Vec<String> {
    DEFAULT_WEATHER_STATIONS.iter().map(ToString::to_string).collect()
}

fn default_sector_interval() -> u64 {
    SECTOR_TRAFFIC_INTERVAL.as_secs()
}

fn default_traffic_interval() -> u64 {
    LIVE_TRAFFIC_INTERVAL.as_secs()
}

fn default_controllers_interval() -> u64 {
    LIVE_CONTROLLERS_INTERVAL.as_secs()
}

fn default_weather_interval() -> u64 {
    AIRPORT_WEATHER_INTERVAL.as_secs()
}

fn default_request_timeout() -> u64 {
    15
}

fn default_display_cap() -> usize {
    DEFAULT_DISPLAY_CAP
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_version: default_config_version(),
            tracker_url: default_tracker_url(),
            legacy_url: default_legacy_url(),
            avwx_url: default_avwx_url(),
            avwx_api_token: None,
            weather_stations: default_weather_stations(),
            sector_interval_secs: default_sector_interval(),
            traffic_interval_secs: default_traffic_interval(),
            controllers_interval_secs: default_controllers_interval(),
            weather_interval_secs: default_weather_interval(),
            request_timeout_secs: default_request_timeout(),
            display_cap: default_display_cap(),
            regions_path: None,
        }
    }
}

/// Environment token wins over the config token; blank values count as unset.
fn pick_token(env_token: Option<String>, config_token: Option<&str>) -> Option<String> {
    if let Some(key) = env_token.filter(|k| !k.trim().is_empty()) {
        return Some(key);
    }
    config_token.map(str::to_string).filter(|s| !s.trim().is_empty())
}

impl AppConfig {
    /// Load configuration from the default location, creating it on first run
    pub fn load() -> Result<Self, confy::ConfyError> {
        let config: AppConfig = confy::load(APP_NAME, CONFIG_NAME)?;
        info!("Loaded configuration (version {})", config.config_version);
        Ok(config)
    }

    /// Load configuration from an explicit file
    pub fn load_from(path: &Path) -> Result<Self, confy::ConfyError> {
        let config: AppConfig = confy::load_path(path)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Get the config file path for display to user
    pub fn get_config_path() -> Result<PathBuf, confy::ConfyError> {
        confy::get_configuration_file_path(APP_NAME, CONFIG_NAME)
    }

    /// Resolve the AVWX token from environment variable or config
    pub fn resolve_avwx_token(&self) -> Option<String> {
        pick_token(std::env::var(AVWX_TOKEN_ENV).ok(), self.avwx_api_token.as_deref())
    }

    /// Where the token came from, for the startup log
    pub fn avwx_token_source(&self) -> Option<&'static str> {
        if std::env::var(AVWX_TOKEN_ENV).is_ok_and(|k| !k.trim().is_empty()) {
            Some("environment variable")
        } else if self.avwx_api_token.as_deref().is_some_and(|k| !k.trim().is_empty()) {
            Some("config file")
        } else {
            None
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}
