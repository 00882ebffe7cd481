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

//! Map data snapshots and how they are applied to the overlays.

use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use overlay_core::{
    AlertSetSummary, MapSurface, OverlayController, OverlayError, Reconciled, S2Cell, WeatherAlert,
    WeatherCell,
};
use serde::de::{DeserializeOwned, Error as _, Unexpected};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// A record collection, sent either as an array or as an object keyed by cell id.
///
/// Records keep the order they have in the document for both forms.
#[derive(Debug)]
pub struct RecordSet<T>(Vec<T>);

impl<T> RecordSet<T> {
    pub fn into_vec(self) -> Vec<T> {
        self.0
    }
}

fn shape(value: &Value) -> Unexpected<'_> {
    match value {
        Value::Null => Unexpected::Unit,
        Value::Bool(b) => Unexpected::Bool(*b),
        Value::Number(_) => Unexpected::Other("number"),
        Value::String(s) => Unexpected::Str(s),
        Value::Array(_) => Unexpected::Seq,
        Value::Object(_) => Unexpected::Map,
    }
}

impl<'de, T> Deserialize<'de> for RecordSet<T>
where
    T: DeserializeOwned,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        fn record<T, E>(key: &dyn std::fmt::Display, value: Value) -> Result<T, E>
        where
            T: DeserializeOwned,
            E: serde::de::Error,
        {
            serde_json::from_value(value).map_err(|e| E::custom(format!("record {key}: {e}")))
        }

        match Value::deserialize(deserializer)? {
            Value::Array(items) => items
                .into_iter()
                .enumerate()
                .map(|(index, value)| record(&index, value))
                .collect::<Result<_, _>>()
                .map(Self),
            // Object iteration follows document order (serde_json `preserve_order`)
            Value::Object(items) => items
                .into_iter()
                .map(|(key, value)| record(&key, value))
                .collect::<Result<_, _>>()
                .map(Self),
            other => Err(D::Error::invalid_type(
                shape(&other),
                &"an array or an object keyed by cell id",
            )),
        }
    }
}

/// One response of the map data endpoint.
///
/// A missing key means that feed was not requested, which is different from
/// an empty collection: an empty alert set clears every alert, a missing one
/// leaves alerts untouched.
#[derive(Debug, Default, Deserialize)]
pub struct MapSnapshot {
    #[serde(default)]
    pub weather: Option<RecordSet<WeatherCell>>,

    #[serde(default)]
    pub s2cells: Option<RecordSet<S2Cell>>,

    #[serde(default, rename = "weatherAlerts")]
    pub weather_alerts: Option<RecordSet<WeatherAlert>>,
}

impl MapSnapshot {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn load(path: &Path) -> Result<Self, SnapshotError> {
        let json = fs::read_to_string(path).map_err(|source| SnapshotError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json).map_err(|source| SnapshotError::Decode {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Per-kind counters for one applied snapshot.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ApplyStats {
    pub weather_drawn: usize,
    pub s2_cells_drawn: usize,
    pub alerts: Option<AlertSetSummary>,
}

/// Feed every record of `snapshot` through the controller.
pub fn apply<S>(
    overlays: &mut OverlayController,
    surface: &mut S,
    snapshot: MapSnapshot,
) -> Result<ApplyStats, OverlayError>
where
    S: MapSurface + ?Sized,
{
    let mut stats = ApplyStats::default();

    if let Some(weather) = snapshot.weather {
        for record in weather.into_vec() {
            if matches!(
                overlays.reconcile_weather_cell(surface, record)?,
                Reconciled::Created | Reconciled::Replaced
            ) {
                stats.weather_drawn += 1;
            }
        }
    }

    if let Some(s2cells) = snapshot.s2cells {
        for record in s2cells.into_vec() {
            if overlays.reconcile_s2_cell(surface, record)? == Reconciled::Created {
                stats.s2_cells_drawn += 1;
            }
        }
    }

    if let Some(alerts) = snapshot.weather_alerts {
        stats.alerts = Some(overlays.reconcile_alert_set(surface, alerts.into_vec())?);
    }

    info!(
        "Applied snapshot: {} weather icons drawn, {} s2 cells drawn",
        stats.weather_drawn, stats.s2_cells_drawn
    );

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use overlay_core::{CellId, HeadlessMap, LatLng, LatLngBounds, OverlayConfig, OverlayFlags, OverlayKind};

    use super::*;

    const SNAPSHOT: &str = r#"{
        "weather": [
            {
                "s2_cell_id": 9926595610352287744,
                "vertices": [{"lat": 0, "lng": 0}, {"lat": 1, "lng": 0}, {"lat": 1, "lng": 1}, {"lat": 0, "lng": 1}],
                "center": {"lat": 0.5, "lng": 0.5},
                "gameplay_weather": 1,
                "world_time": 2,
                "severity": null
            }
        ],
        "s2cells": [
            {"s2_cell_id": "s2-a", "vertices": [{"lat": 0, "lng": 0}, {"lat": 1, "lng": 0}, {"lat": 1, "lng": 1}]}
        ],
        "weatherAlerts": {
            "9926595610352287744": {
                "s2_cell_id": 9926595610352287744,
                "vertices": [{"lat": 0, "lng": 0}, {"lat": 1, "lng": 0}, {"lat": 1, "lng": 1}],
                "severity": 2
            }
        }
    }"#;

    fn setup() -> (OverlayController, HeadlessMap) {
        let overlays = OverlayController::new(OverlayConfig {
            flags: OverlayFlags::all(),
            ..Default::default()
        });
        let map = HeadlessMap::new(
            LatLngBounds::new(LatLng::new(1.0, 1.0), LatLng::new(0.0, 0.0)),
            15.0,
        );
        (overlays, map)
    }

    #[test]
    fn test_decode_list_and_keyed_sets() {
        let snapshot = MapSnapshot::from_json(SNAPSHOT).unwrap();
        assert_eq!(snapshot.weather.unwrap().into_vec().len(), 1);
        assert_eq!(snapshot.s2cells.unwrap().into_vec().len(), 1);

        let alerts = snapshot.weather_alerts.unwrap().into_vec();
        assert_eq!(alerts[0].severity, Some(2));
        assert_eq!(alerts[0].s2_cell_id, Some(CellId::from("9926595610352287744")));
    }

    #[test]
    fn test_apply_draws_every_kind() {
        let (mut overlays, mut map) = setup();
        let stats = apply(&mut overlays, &mut map, MapSnapshot::from_json(SNAPSHOT).unwrap()).unwrap();

        assert_eq!(stats.weather_drawn, 1);
        assert_eq!(stats.s2_cells_drawn, 1);
        assert_eq!(stats.alerts.unwrap().created, 1);
        assert_eq!(map.attached_count(), 3);
    }

    #[test]
    fn test_missing_alert_key_does_not_prune() {
        let (mut overlays, mut map) = setup();
        apply(&mut overlays, &mut map, MapSnapshot::from_json(SNAPSHOT).unwrap()).unwrap();

        let stats = apply(&mut overlays, &mut map, MapSnapshot::from_json("{}").unwrap()).unwrap();
        assert!(stats.alerts.is_none());
        assert_eq!(overlays.len(OverlayKind::WeatherAlert), 1);

        let stats = apply(
            &mut overlays,
            &mut map,
            MapSnapshot::from_json(r#"{"weatherAlerts": []}"#).unwrap(),
        )
        .unwrap();
        assert_eq!(stats.alerts.unwrap().removed, 1);
        assert_eq!(overlays.len(OverlayKind::WeatherAlert), 0);
    }

    #[test]
    fn test_keyed_set_keeps_document_order() {
        let json = r#"{
            "weather": {
                "9926595610352287744": {"s2_cell_id": 9926595610352287744, "gameplay_weather": 1, "center": {"lat": 0.5, "lng": 0.5}},
                "-8520148863887114240": {"s2_cell_id": -8520148863887114240, "gameplay_weather": 2, "center": {"lat": 0.5, "lng": 0.5}},
                "1234": {"s2_cell_id": "1234", "gameplay_weather": 3, "center": {"lat": 0.5, "lng": 0.5}}
            }
        }"#;

        let (mut overlays, mut map) = setup();
        apply(&mut overlays, &mut map, MapSnapshot::from_json(json).unwrap()).unwrap();

        let cells = overlays.weather_cells();
        let drawn: Vec<_> = cells.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(drawn, ["9926595610352287744", "-8520148863887114240", "1234"]);
    }

    #[test]
    fn test_bad_record_error_names_the_record() {
        let json = r#"{
            "s2cells": [
                {"s2_cell_id": "a", "vertices": []},
                {"s2_cell_id": "b", "vertices": "not a ring"}
            ]
        }"#;
        let message = MapSnapshot::from_json(json).unwrap_err().to_string();
        assert!(message.contains("record 1"), "{message}");
        assert!(message.contains("invalid type"), "{message}");

        let json = r#"{"weatherAlerts": {"x": {"severity": "high"}}}"#;
        let message = MapSnapshot::from_json(json).unwrap_err().to_string();
        assert!(message.contains("record x"), "{message}");
    }

    #[test]
    fn test_record_set_rejects_other_shapes() {
        let message = MapSnapshot::from_json(r#"{"weather": 5}"#).unwrap_err().to_string();
        assert!(message.contains("an array or an object keyed by cell id"), "{message}");
    }

    #[test]
    fn test_load_reports_path_on_decode_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{not json").unwrap();

        let err = MapSnapshot::load(file.path()).unwrap_err();
        assert!(matches!(err, SnapshotError::Decode { .. }));
        assert!(err.to_string().contains(&file.path().display().to_string()));
    }

    #[test]
    fn test_load_missing_file() {
        let err = MapSnapshot::load(Path::new("/nonexistent/snapshot.json")).unwrap_err();
        assert!(matches!(err, SnapshotError::Read { .. }));
    }
}
