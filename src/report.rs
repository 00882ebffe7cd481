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

//! Plain-text reports of the overlay state.

use std::fmt::Write;

use overlay_core::{
    AlertSeverity, CellId, OverlayController, OverlayKind, WeatherCondition, WeatherIndicator,
    WorldTime,
};

/// Rows shown per page of the weather status table.
pub const ROWS_PER_PAGE: usize = 25;

const HEADERS: [&str; 14] = [
    "#",
    "Cell",
    "CloudLv",
    "RainLv",
    "WindLv",
    "SnowLv",
    "FogLv",
    "WindDir",
    "Gameplay",
    "Severity",
    "Warn",
    "LastUpdated",
    "Time",
    "Drawn",
];

const CARDINALS: [&str; 16] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW", "NNW",
];

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Number of pages needed for `rows` rows (at least one).
pub fn page_count(rows: usize) -> usize {
    rows.div_ceil(ROWS_PER_PAGE).max(1)
}

/// Clamp a 1-based page number into range.
pub fn clamp_page(page: usize, rows: usize) -> usize {
    page.clamp(1, page_count(rows))
}

/// Sixteen-point compass name for a bearing in degrees.
pub fn degrees_to_cardinal(degrees: i32) -> &'static str {
    // Each point spans 22.5 degrees, centred on its bearing
    let tenths = i64::from(degrees.rem_euclid(360)) * 10;
    let index = usize::try_from((tenths + 112) / 225 % 16).unwrap_or(0);
    CARDINALS[index]
}

fn or_dash<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

fn name_or_raw<T>(raw: Option<i32>, name: impl Fn(T) -> &'static str) -> String
where
    T: TryFrom<i32>,
{
    match raw {
        None => "-".to_string(),
        Some(value) => T::try_from(value).map_or_else(|_| format!("?({value})"), |v| name(v).to_string()),
    }
}

/// Paginated table of drawn weather cells, first-drawn first.
pub fn weather_table(overlays: &OverlayController, page: usize) -> String {
    let cells = overlays.weather_cells();
    let page = clamp_page(page, cells.len());

    let mut out = String::new();
    let _ = writeln!(out, "{}", HEADERS.join("\t"));

    for (index, (_, entry)) in cells
        .iter()
        .enumerate()
        .skip((page - 1) * ROWS_PER_PAGE)
        .take(ROWS_PER_PAGE)
    {
        let record = &entry.record;
        let center = record
            .center
            .map_or_else(|| "-".to_string(), |c| format!("{:.6}, {:.6}", c.lat, c.lng));
        // The feed reports "no alert" as null
        let severity = name_or_raw(Some(record.severity.unwrap_or(0)), AlertSeverity::name);

        let warn = match record.warn_weather {
            Some(true) => "Yes",
            Some(false) => "No",
            None => "-",
        };
        let columns = [
            (index + 1).to_string(),
            center,
            or_dash(record.cloud_level),
            or_dash(record.rain_level),
            or_dash(record.wind_level),
            or_dash(record.snow_level),
            or_dash(record.fog_level),
            or_dash(record.wind_direction.map(degrees_to_cardinal)),
            name_or_raw(record.gameplay_weather, WeatherCondition::name),
            severity,
            warn.to_string(),
            or_dash(record.last_updated_at().map(|t| t.format(TIME_FORMAT))),
            name_or_raw(record.world_time, WorldTime::name),
            entry.drawn_at.format(TIME_FORMAT).to_string(),
        ];
        let _ = writeln!(out, "{}", columns.join("\t"));
    }

    let _ = writeln!(out, "Page {} of {}", page, page_count(cells.len()));
    out
}

/// One-line count of drawn visuals per layer.
pub fn summary(overlays: &OverlayController) -> String {
    format!(
        "weather: {}, s2 cells: {}, weather alerts: {}",
        overlays.len(OverlayKind::Weather),
        overlays.len(OverlayKind::S2Cell),
        overlays.len(OverlayKind::WeatherAlert),
    )
}

/// Describe what the top-bar indicator shows.
pub fn indicator_line(shown: Option<&CellId>, indicator: &WeatherIndicator) -> String {
    match (shown, indicator.image()) {
        (Some(id), Some(image)) => format!("dominant cell {id}: {}", image.src),
        _ => "no dominant cell".to_string(),
    }
}
