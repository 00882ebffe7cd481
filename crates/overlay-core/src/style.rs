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

//! Icon and polygon style resolution.
//!
//! Maps weather codes, time of day, and alert severity onto weather icon
//! paths and polygon fill styles. Every lookup is total over the documented
//! code ranges; anything outside them is reported as a [`StyleError`].

use thiserror::Error;

use crate::record::WeatherCell;

/// Default location of the weather icon images.
pub const DEFAULT_ICON_BASE_PATH: &str = "/static/images/weather/";

const WARNING_ICON_INDEX: i32 = 15;
const SEVERE_ICON_INDEX: i32 = 16;
const NIGHT_ICON_OFFSET: i32 = 10;

/// Pixel anchor of weather markers; icons are 64x64 and centred on the cell.
const MARKER_ANCHOR: (u32, u32) = (32, 32);

/// Errors raised when a record cannot be mapped to a visual.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StyleError {
    #[error("no weather icon for gameplay weather code {0}")]
    UnknownWeatherCode(i32),

    #[error("record has neither a gameplay weather code nor an alert severity")]
    MissingWeatherCode,

    #[error("unknown alert severity {0}")]
    UnknownSeverity(i32),

    #[error("unknown world time {0}")]
    UnknownWorldTime(i32),
}

/// Gameplay weather condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WeatherCondition {
    None,
    Clear,
    Rainy,
    PartlyCloudy,
    Overcast,
    Windy,
    Snow,
    Fog,
}

impl WeatherCondition {
    /// Feed name of the condition.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Clear => "CLEAR",
            Self::Rainy => "RAINY",
            Self::PartlyCloudy => "PARTLY_CLOUDY",
            Self::Overcast => "OVERCAST",
            Self::Windy => "WINDY",
            Self::Snow => "SNOW",
            Self::Fog => "FOG",
        }
    }

    /// Whether the day icon is also used at night.
    #[must_use]
    pub fn shares_night_icon(self) -> bool {
        !matches!(self, Self::Clear | Self::PartlyCloudy)
    }
}

impl TryFrom<i32> for WeatherCondition {
    type Error = StyleError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::None),
            1 => Ok(Self::Clear),
            2 => Ok(Self::Rainy),
            3 => Ok(Self::PartlyCloudy),
            4 => Ok(Self::Overcast),
            5 => Ok(Self::Windy),
            6 => Ok(Self::Snow),
            7 => Ok(Self::Fog),
            other => Err(StyleError::UnknownWeatherCode(other)),
        }
    }
}

/// Weather alert severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlertSeverity {
    None,
    Moderate,
    Extreme,
}

impl AlertSeverity {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Moderate => "MODERATE",
            Self::Extreme => "EXTREME",
        }
    }
}

impl TryFrom<i32> for AlertSeverity {
    type Error = StyleError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::None),
            1 => Ok(Self::Moderate),
            2 => Ok(Self::Extreme),
            other => Err(StyleError::UnknownSeverity(other)),
        }
    }
}

/// In-game time of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorldTime {
    None,
    Day,
    Night,
}

impl WorldTime {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Day => "DAY",
            Self::Night => "NIGHT",
        }
    }
}

impl TryFrom<i32> for WorldTime {
    type Error = StyleError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::None),
            1 => Ok(Self::Day),
            2 => Ok(Self::Night),
            other => Err(StyleError::UnknownWorldTime(other)),
        }
    }
}

/// Icon asset family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IconVariant {
    /// Dark icons, drawn on the map.
    #[default]
    Dark,
    /// Light icons, used on the top bar.
    Light,
}

/// File name of the icon at `index`, if one exists.
fn icon_file(index: i32) -> Option<&'static str> {
    match index {
        1 => Some("weather_sunny.png"),
        2 => Some("weather_rain.png"),
        3 => Some("weather_partlycloudy_day.png"),
        4 => Some("weather_cloudy.png"),
        5 => Some("weather_windy.png"),
        6 => Some("weather_snow.png"),
        7 => Some("weather_fog.png"),
        11 => Some("weather_clear_night.png"),
        13 => Some("weather_partlycloudy_night.png"),
        15 => Some("weather_moderate.png"),
        16 => Some("weather_extreme.png"),
        _ => None,
    }
}

/// Resolves weather icons relative to a base path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconSet {
    base_path: String,
}

impl IconSet {
    /// Create an icon set rooted at `base_path`. A trailing `/` is added if missing.
    #[must_use]
    pub fn new(base_path: impl Into<String>) -> Self {
        let mut base_path = base_path.into();
        if !base_path.is_empty() && !base_path.ends_with('/') {
            base_path.push('/');
        }
        Self { base_path }
    }

    #[must_use]
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Icon path for a weather record.
    ///
    /// Severity wins over the weather code. At night, clear and partly cloudy
    /// skies switch to dedicated night icons; every other condition keeps its
    /// day icon.
    pub fn weather_icon(&self, record: &WeatherCell, variant: IconVariant) -> Result<String, StyleError> {
        let severity = record.severity.map(AlertSeverity::try_from).transpose()?;

        let index = match severity {
            Some(AlertSeverity::Extreme) => SEVERE_ICON_INDEX,
            Some(AlertSeverity::Moderate) => WARNING_ICON_INDEX,
            Some(AlertSeverity::None) | None => {
                let code = record.gameplay_weather.ok_or(StyleError::MissingWeatherCode)?;
                let condition = WeatherCondition::try_from(code)?;
                let time = record.world_time.map(WorldTime::try_from).transpose()?;

                if time == Some(WorldTime::Night) && !condition.shares_night_icon() {
                    code + NIGHT_ICON_OFFSET
                } else {
                    code
                }
            }
        };

        let file = icon_file(index).ok_or(StyleError::UnknownWeatherCode(
            record.gameplay_weather.unwrap_or(index),
        ))?;

        Ok(match variant {
            IconVariant::Dark => format!("{}{}", self.base_path, file),
            IconVariant::Light => format!(
                "{}{}",
                self.base_path,
                file.replacen("weather_", "weather_light_", 1)
            ),
        })
    }
}

impl Default for IconSet {
    fn default() -> Self {
        Self::new(DEFAULT_ICON_BASE_PATH)
    }
}

/// Image descriptor for a map marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerIcon {
    pub url: String,
    /// Top-left pixel of the image to draw.
    pub origin: (u32, u32),
    /// Pixel of the image placed on the marker position.
    pub anchor: (u32, u32),
}

impl MarkerIcon {
    #[must_use]
    pub fn new(url: String) -> Self {
        Self {
            url,
            origin: (0, 0),
            anchor: MARKER_ANCHOR,
        }
    }
}

/// Stroke and fill of a map polygon. Colours are `#rrggbb` strings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolygonStyle {
    pub stroke_color: &'static str,
    pub stroke_opacity: f32,
    pub stroke_weight: f32,
    pub fill_color: &'static str,
    pub fill_opacity: f32,
}

/// Thin black outline with no fill, used for plain S2 cells.
#[must_use]
pub fn s2_outline_style() -> PolygonStyle {
    PolygonStyle {
        stroke_color: "#000000",
        stroke_opacity: 0.8,
        stroke_weight: 1.0,
        fill_color: "#00ff00",
        fill_opacity: 0.0,
    }
}

/// Filled region for an alert of the given raw severity. Alerts have no outline.
pub fn resolve_alert_style(severity: i32) -> Result<PolygonStyle, StyleError> {
    let mut style = s2_outline_style();
    style.stroke_opacity = 0.0;

    match AlertSeverity::try_from(severity)? {
        AlertSeverity::None => {
            style.fill_opacity = 0.0;
        }
        AlertSeverity::Moderate => {
            style.fill_color = "#ffff00";
            style.fill_opacity = 0.2;
        }
        AlertSeverity::Extreme => {
            style.fill_color = "#ff0000";
            style.fill_opacity = 0.2;
        }
    }

    Ok(style)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weather(code: Option<i32>, world_time: Option<i32>, severity: Option<i32>) -> WeatherCell {
        WeatherCell {
            s2_cell_id: None,
            gameplay_weather: code,
            world_time,
            severity,
            ..WeatherCell::with_id("style")
        }
    }

    #[test]
    fn test_day_icons() {
        let icons = IconSet::default();
        let url = icons.weather_icon(&weather(Some(2), Some(1), None), IconVariant::Dark).unwrap();
        assert_eq!(url, "/static/images/weather/weather_rain.png");

        // No time information falls back to the day icon
        let url = icons.weather_icon(&weather(Some(3), None, None), IconVariant::Dark).unwrap();
        assert_eq!(url, "/static/images/weather/weather_partlycloudy_day.png");
    }

    #[test]
    fn test_night_clear_uses_offset_icon() {
        let icons = IconSet::default();
        let url = icons.weather_icon(&weather(Some(1), Some(2), None), IconVariant::Dark).unwrap();
        assert_eq!(url, "/static/images/weather/weather_clear_night.png");

        let url = icons.weather_icon(&weather(Some(3), Some(2), None), IconVariant::Dark).unwrap();
        assert_eq!(url, "/static/images/weather/weather_partlycloudy_night.png");
    }

    #[test]
    fn test_night_shared_icons() {
        let icons = IconSet::default();
        let url = icons.weather_icon(&weather(Some(6), Some(2), None), IconVariant::Dark).unwrap();
        assert_eq!(url, "/static/images/weather/weather_snow.png");
    }

    #[test]
    fn test_severity_takes_priority() {
        let icons = IconSet::default();
        let url = icons.weather_icon(&weather(Some(1), Some(2), Some(1)), IconVariant::Dark).unwrap();
        assert_eq!(url, "/static/images/weather/weather_moderate.png");

        let url = icons.weather_icon(&weather(None, None, Some(2)), IconVariant::Dark).unwrap();
        assert_eq!(url, "/static/images/weather/weather_extreme.png");

        // Severity NONE falls through to the weather code
        let url = icons.weather_icon(&weather(Some(7), None, Some(0)), IconVariant::Dark).unwrap();
        assert_eq!(url, "/static/images/weather/weather_fog.png");
    }

    #[test]
    fn test_light_variant() {
        let icons = IconSet::default();
        let url = icons.weather_icon(&weather(Some(5), Some(1), None), IconVariant::Light).unwrap();
        assert_eq!(url, "/static/images/weather/weather_light_windy.png");
    }

    #[test]
    fn test_icons_total_over_valid_domain() {
        let icons = IconSet::new("/icons");
        for code in 1..=7 {
            for world_time in [None, Some(0), Some(1), Some(2)] {
                for variant in [IconVariant::Dark, IconVariant::Light] {
                    let url = icons.weather_icon(&weather(Some(code), world_time, None), variant).unwrap();
                    assert!(url.starts_with("/icons/weather_"), "{url}");
                    assert!(url.ends_with(".png"));
                }
            }
        }
        for severity in [1, 2] {
            let url = icons.weather_icon(&weather(None, None, Some(severity)), IconVariant::Dark).unwrap();
            assert!(url.ends_with(".png"));
        }
    }

    #[test]
    fn test_out_of_range_codes_are_errors() {
        let icons = IconSet::default();
        assert_eq!(
            icons.weather_icon(&weather(Some(0), None, None), IconVariant::Dark),
            Err(StyleError::UnknownWeatherCode(0))
        );
        assert_eq!(
            icons.weather_icon(&weather(Some(8), Some(2), None), IconVariant::Dark),
            Err(StyleError::UnknownWeatherCode(8))
        );
        assert_eq!(
            icons.weather_icon(&weather(None, None, None), IconVariant::Dark),
            Err(StyleError::MissingWeatherCode)
        );
        assert_eq!(
            icons.weather_icon(&weather(Some(1), None, Some(3)), IconVariant::Dark),
            Err(StyleError::UnknownSeverity(3))
        );
        assert_eq!(
            icons.weather_icon(&weather(Some(1), Some(9), None), IconVariant::Dark),
            Err(StyleError::UnknownWorldTime(9))
        );
    }

    #[test]
    fn test_alert_styles() {
        let none = resolve_alert_style(0).unwrap();
        assert!(none.fill_opacity.abs() < f32::EPSILON);

        let warning = resolve_alert_style(1).unwrap();
        assert_eq!(warning.fill_color, "#ffff00");
        assert!((warning.fill_opacity - 0.2).abs() < f32::EPSILON);

        let severe = resolve_alert_style(2).unwrap();
        assert_eq!(severe.fill_color, "#ff0000");
        assert!((severe.fill_opacity - 0.2).abs() < f32::EPSILON);

        for style in [none, warning, severe] {
            assert!(style.stroke_opacity.abs() < f32::EPSILON);
        }

        assert_eq!(resolve_alert_style(5), Err(StyleError::UnknownSeverity(5)));
    }

    #[test]
    fn test_icon_set_normalises_base_path() {
        assert_eq!(IconSet::new("/img").base_path(), "/img/");
        assert_eq!(IconSet::new("/img/").base_path(), "/img/");
    }
}
