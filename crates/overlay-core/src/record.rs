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

//! Cell records as delivered by the map data feed.
//!
//! Records are plain data. The visual drawn for a record lives in the
//! overlay registry next to it, never inside the record itself.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// S2 cell identifier.
///
/// The feed sends ids either as JSON integers (signed or unsigned 64-bit) or
/// as strings; both forms are normalised to their textual representation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "RawCellId")]
pub struct CellId(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCellId {
    Signed(i64),
    Unsigned(u64),
    Text(String),
}

impl From<RawCellId> for CellId {
    fn from(raw: RawCellId) -> Self {
        match raw {
            RawCellId::Signed(id) => Self(id.to_string()),
            RawCellId::Unsigned(id) => Self(id.to_string()),
            RawCellId::Text(id) => Self(id),
        }
    }
}

impl CellId {
    /// Borrow the id as text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CellId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for CellId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<u64> for CellId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A geographic point in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Axis-aligned lat/lng rectangle described by its north-east and
/// south-west corners. Used both for the map viewport and for cell bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLngBounds {
    pub north_east: LatLng,
    pub south_west: LatLng,
}

impl LatLngBounds {
    #[must_use]
    pub const fn new(north_east: LatLng, south_west: LatLng) -> Self {
        Self {
            north_east,
            south_west,
        }
    }

    /// Smallest bounds containing every point, or `None` for an empty slice.
    #[must_use]
    pub fn from_points(points: &[LatLng]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut bounds = Self::new(*first, *first);
        for point in rest {
            bounds.extend(*point);
        }
        Some(bounds)
    }

    /// Grow the bounds to include `point`.
    pub fn extend(&mut self, point: LatLng) {
        self.north_east.lat = self.north_east.lat.max(point.lat);
        self.north_east.lng = self.north_east.lng.max(point.lng);
        self.south_west.lat = self.south_west.lat.min(point.lat);
        self.south_west.lng = self.south_west.lng.min(point.lng);
    }

    #[must_use]
    pub fn contains(&self, point: LatLng) -> bool {
        (self.south_west.lat..=self.north_east.lat).contains(&point.lat)
            && (self.south_west.lng..=self.north_east.lng).contains(&point.lng)
    }
}

/// Common view over every kind of cell record.
pub trait CellRecord {
    /// Cell id, if the feed supplied one.
    fn cell_id(&self) -> Option<&CellId>;

    /// Polygon ring of the cell.
    fn vertices(&self) -> &[LatLng];

    /// Bounding box of the cell's vertices.
    fn bounds(&self) -> Option<LatLngBounds> {
        LatLngBounds::from_points(self.vertices())
    }
}

/// Weather conditions reported for one S2 cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherCell {
    #[serde(default)]
    pub s2_cell_id: Option<CellId>,
    #[serde(default)]
    pub vertices: Vec<LatLng>,
    #[serde(default)]
    pub center: Option<LatLng>,
    /// Raw gameplay weather code (see [`crate::style::WeatherCondition`]).
    #[serde(default)]
    pub gameplay_weather: Option<i32>,
    /// Raw time-of-day value (see [`crate::style::WorldTime`]).
    #[serde(default)]
    pub world_time: Option<i32>,
    /// Alert severity attached to the weather reading, if any.
    #[serde(default)]
    pub severity: Option<i32>,
    #[serde(default)]
    pub cloud_level: Option<i32>,
    #[serde(default)]
    pub rain_level: Option<i32>,
    #[serde(default)]
    pub wind_level: Option<i32>,
    #[serde(default)]
    pub snow_level: Option<i32>,
    #[serde(default)]
    pub fog_level: Option<i32>,
    /// Wind direction in degrees, clockwise from north.
    #[serde(default)]
    pub wind_direction: Option<i32>,
    #[serde(default)]
    pub warn_weather: Option<bool>,
    /// Last feed update in milliseconds since the Unix epoch.
    #[serde(default)]
    pub last_updated: Option<i64>,
}

impl WeatherCell {
    /// Cell with only an id set; handy as a base for struct update syntax.
    #[must_use]
    pub fn with_id(id: impl Into<CellId>) -> Self {
        Self {
            s2_cell_id: Some(id.into()),
            vertices: Vec::new(),
            center: None,
            gameplay_weather: None,
            world_time: None,
            severity: None,
            cloud_level: None,
            rain_level: None,
            wind_level: None,
            snow_level: None,
            fog_level: None,
            wind_direction: None,
            warn_weather: None,
            last_updated: None,
        }
    }

    /// Time of the last feed update, if it was reported and is in range.
    #[must_use]
    pub fn last_updated_at(&self) -> Option<DateTime<Utc>> {
        self.last_updated.and_then(DateTime::from_timestamp_millis)
    }
}

impl CellRecord for WeatherCell {
    fn cell_id(&self) -> Option<&CellId> {
        self.s2_cell_id.as_ref()
    }

    fn vertices(&self) -> &[LatLng] {
        &self.vertices
    }
}

/// Bare S2 cell outline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct S2Cell {
    #[serde(default)]
    pub s2_cell_id: Option<CellId>,
    #[serde(default)]
    pub vertices: Vec<LatLng>,
}

impl CellRecord for S2Cell {
    fn cell_id(&self) -> Option<&CellId> {
        self.s2_cell_id.as_ref()
    }

    fn vertices(&self) -> &[LatLng] {
        &self.vertices
    }
}

/// Weather alert covering one S2 cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherAlert {
    #[serde(default)]
    pub s2_cell_id: Option<CellId>,
    #[serde(default)]
    pub vertices: Vec<LatLng>,
    /// Raw severity (see [`crate::style::AlertSeverity`]).
    #[serde(default)]
    pub severity: Option<i32>,
}

impl CellRecord for WeatherAlert {
    fn cell_id(&self) -> Option<&CellId> {
        self.s2_cell_id.as_ref()
    }

    fn vertices(&self) -> &[LatLng] {
        &self.vertices
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_id_accepts_numbers_and_strings() {
        let ids: Vec<CellId> =
            serde_json::from_str(r#"[9926595610352287744, -8520148863887114240, "abc"]"#).unwrap();
        assert_eq!(ids[0].as_str(), "9926595610352287744");
        assert_eq!(ids[1].as_str(), "-8520148863887114240");
        assert_eq!(ids[2], CellId::from("abc"));
    }

    #[test]
    fn test_weather_cell_decodes_feed_fields() {
        let json = r#"{
            "s2_cell_id": 9926595610352287744,
            "vertices": [{"lat": 1.0, "lng": 2.0}, {"lat": 1.5, "lng": 2.0}, {"lat": 1.5, "lng": 2.5}],
            "center": {"lat": 1.25, "lng": 2.25},
            "gameplay_weather": 3,
            "world_time": 2,
            "cloud_level": 1,
            "rain_level": 0,
            "wind_level": 2,
            "snow_level": 0,
            "fog_level": 3,
            "wind_direction": 225,
            "warn_weather": false,
            "last_updated": 1514764800000
        }"#;
        let cell: WeatherCell = serde_json::from_str(json).unwrap();
        assert_eq!(cell.cell_id().map(CellId::as_str), Some("9926595610352287744"));
        assert_eq!(cell.gameplay_weather, Some(3));
        assert_eq!(cell.world_time, Some(2));
        assert_eq!(cell.severity, None);
        assert_eq!(cell.vertices().len(), 3);
        assert_eq!(cell.cloud_level, Some(1));
        assert_eq!(cell.fog_level, Some(3));
        assert_eq!(cell.wind_direction, Some(225));
        assert_eq!(cell.warn_weather, Some(false));
        assert_eq!(
            cell.last_updated_at().map(|t| t.to_rfc3339()),
            Some("2018-01-01T00:00:00+00:00".to_string())
        );
    }

    #[test]
    fn test_with_id_leaves_readings_empty() {
        let cell = WeatherCell::with_id("abc");
        assert_eq!(cell.cell_id(), Some(&CellId::from("abc")));
        assert!(cell.gameplay_weather.is_none());
        assert!(cell.last_updated_at().is_none());
    }

    #[test]
    fn test_missing_id_decodes_as_none() {
        let alert: WeatherAlert = serde_json::from_str(r#"{"severity": 1}"#).unwrap();
        assert!(alert.cell_id().is_none());
        assert!(alert.vertices.is_empty());
    }

    #[test]
    fn test_bounds_cover_all_vertices() {
        let cell = S2Cell {
            s2_cell_id: Some(CellId::from("a")),
            vertices: vec![
                LatLng::new(40.70, -74.02),
                LatLng::new(40.72, -74.01),
                LatLng::new(40.71, -74.03),
            ],
        };
        let bounds = cell.bounds().unwrap();
        assert_eq!(bounds.north_east, LatLng::new(40.72, -74.01));
        assert_eq!(bounds.south_west, LatLng::new(40.70, -74.03));
        assert!(bounds.contains(LatLng::new(40.71, -74.02)));
        assert!(!bounds.contains(LatLng::new(40.73, -74.02)));
    }

    #[test]
    fn test_bounds_of_empty_cell() {
        let cell = S2Cell {
            s2_cell_id: None,
            vertices: Vec::new(),
        };
        assert!(cell.bounds().is_none());
    }
}
