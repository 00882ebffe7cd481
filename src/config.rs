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
//! Layer toggles, device hints, and icon settings are stored in TOML via
//! `confy`. Missing keys fall back to their defaults so older files keep
//! loading after new settings are added.

use std::cmp::Ordering;

use log::{info, warn};
use overlay_core::indicator::DEFAULT_INDICATOR_HEIGHT_PX;
use overlay_core::style::DEFAULT_ICON_BASE_PATH;
use overlay_core::{OverlayConfig, OverlayFlags};
use serde::{Deserialize, Serialize};

const APP_NAME: &str = "weather-overlay";
const CONFIG_NAME: &str = "config";

/// Schema version written by this build. Files without a version predate it.
const CONFIG_VERSION: u32 = 1;

/// Application configuration stored in TOML format
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AppConfig {
    /// Configuration schema version, bumped on load when the file is older
    #[serde(default)]
    pub config_version: u32,

    /// Draw weather icons on cells
    #[serde(default = "default_true")]
    pub show_weather_cells: bool,

    /// Draw S2 cell outlines
    #[serde(default)]
    pub show_s2_cells: bool,

    /// Fill cells that carry a weather alert
    #[serde(default = "default_true")]
    pub show_weather_alerts: bool,

    /// Treat the display as a touch/handheld device (lowers the zoom gate)
    #[serde(default)]
    pub handheld: bool,

    /// URL prefix of the weather icon images
    #[serde(default = "default_icon_base_path")]
    pub icon_base_path: String,

    /// Height of the top-bar weather icon in pixels
    #[serde(default = "default_indicator_height_px")]
    pub indicator_height_px: u32,

    /// Zoom level assumed when none is given on the command line
    #[serde(default = "default_zoom")]
    pub default_zoom: f64,
}

// Default value functions for serde
fn default_true() -> bool {
    true
}

fn default_icon_base_path() -> String {
    DEFAULT_ICON_BASE_PATH.to_string()
}

fn default_indicator_height_px() -> u32 {
    DEFAULT_INDICATOR_HEIGHT_PX
}

fn default_zoom() -> f64 {
    15.0
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_version: CONFIG_VERSION,
            show_weather_cells: true,
            show_s2_cells: false,
            show_weather_alerts: true,
            handheld: false,
            icon_base_path: default_icon_base_path(),
            indicator_height_px: default_indicator_height_px(),
            default_zoom: default_zoom(),
        }
    }
}

impl AppConfig {
    /// Load configuration from disk, creating it with defaults if absent
    pub fn load() -> Result<Self, confy::ConfyError> {
        let mut config: Self = confy::load(APP_NAME, CONFIG_NAME)?;
        if config.upgrade() {
            config.save()?;
        }
        Ok(config)
    }

    /// Bring an older file up to the current schema version.
    ///
    /// Returns `true` if the configuration changed and should be saved.
    fn upgrade(&mut self) -> bool {
        match self.config_version.cmp(&CONFIG_VERSION) {
            Ordering::Less => {
                info!(
                    "Upgrading configuration from version {} to {}",
                    self.config_version, CONFIG_VERSION
                );
                self.config_version = CONFIG_VERSION;
                true
            }
            Ordering::Equal => false,
            Ordering::Greater => {
                warn!(
                    "Configuration version {} is newer than supported version {}",
                    self.config_version, CONFIG_VERSION
                );
                false
            }
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<(), confy::ConfyError> {
        confy::store(APP_NAME, CONFIG_NAME, self)
    }

    /// Get the config file path for display to user
    pub fn get_config_path() -> Result<std::path::PathBuf, confy::ConfyError> {
        confy::get_configuration_file_path(APP_NAME, CONFIG_NAME)
    }

    /// Layer flags as the overlay controller expects them
    pub fn flags(&self) -> OverlayFlags {
        OverlayFlags {
            show_weather_cells: self.show_weather_cells,
            show_s2_cells: self.show_s2_cells,
            show_weather_alerts: self.show_weather_alerts,
        }
    }

    /// Controller configuration derived from these settings
    pub fn overlay_config(&self) -> OverlayConfig {
        OverlayConfig {
            flags: self.flags(),
            icon_base_path: self.icon_base_path.clone(),
            ..Default::default()
        }
    }
}
