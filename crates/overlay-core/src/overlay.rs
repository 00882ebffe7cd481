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

//! Overlay state and reconciliation.
//!
//! [`OverlayController`] owns one registry per overlay kind. Each incoming
//! record is reconciled against the registry: a visual is created the first
//! time a cell is seen, replaced when the attribute it depicts changes, and
//! otherwise left alone. The controller also answers which weather cell
//! dominates the viewport, for the top-bar indicator.

use std::collections::{HashMap, HashSet};
use std::fmt;

use chrono::{DateTime, Utc};
use log::{debug, info};
use thiserror::Error;
use tokio::sync::broadcast;

use crate::geometry;
use crate::indicator::WeatherIndicator;
use crate::record::{CellId, CellRecord, LatLngBounds, S2Cell, WeatherAlert, WeatherCell};
use crate::style::{
    resolve_alert_style, s2_outline_style, IconSet, IconVariant, MarkerIcon, StyleError,
    DEFAULT_ICON_BASE_PATH,
};
use crate::surface::{MapSurface, Visual, VisualHandle};

/// Below this zoom the viewport may span many cells (mouse/trackpad displays).
const POINTER_MIN_ZOOM: f64 = 13.0;
/// Same gate for touch/handheld displays, which show less area per zoom level.
const HANDHELD_MIN_ZOOM: f64 = 12.0;

/// Errors raised while reconciling records.
#[derive(Debug, Error)]
pub enum OverlayError {
    #[error("{0} record without an s2 cell id")]
    MissingCellId(OverlayKind),

    #[error("weather cell {0} has no center to place its marker")]
    MissingCenter(CellId),

    #[error(transparent)]
    Style(#[from] StyleError),
}

/// The kinds of overlay the controller manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverlayKind {
    Weather,
    S2Cell,
    WeatherAlert,
}

impl OverlayKind {
    pub const ALL: [Self; 3] = [Self::Weather, Self::S2Cell, Self::WeatherAlert];
}

impl fmt::Display for OverlayKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Weather => "weather",
            Self::S2Cell => "s2 cell",
            Self::WeatherAlert => "weather alert",
        })
    }
}

/// Which overlay layers are enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OverlayFlags {
    pub show_weather_cells: bool,
    pub show_s2_cells: bool,
    pub show_weather_alerts: bool,
}

impl OverlayFlags {
    /// Every layer enabled.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            show_weather_cells: true,
            show_s2_cells: true,
            show_weather_alerts: true,
        }
    }

    /// Whether the layer holding `kind` is enabled.
    #[must_use]
    pub const fn shows(self, kind: OverlayKind) -> bool {
        match kind {
            OverlayKind::Weather => self.show_weather_cells,
            OverlayKind::S2Cell => self.show_s2_cells,
            OverlayKind::WeatherAlert => self.show_weather_alerts,
        }
    }
}

/// Configuration for the overlay controller.
#[derive(Debug, Clone)]
pub struct OverlayConfig {
    /// Enabled layers.
    pub flags: OverlayFlags,
    /// Directory (URL prefix) holding the weather icons.
    pub icon_base_path: String,
    /// Broadcast channel capacity for events.
    pub event_channel_capacity: usize,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            flags: OverlayFlags::default(),
            icon_base_path: DEFAULT_ICON_BASE_PATH.to_string(),
            event_channel_capacity: 256,
        }
    }
}

/// Result of reconciling a single record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciled {
    /// Layer disabled or the record carries nothing to draw.
    Skipped,
    /// Already drawn with the same value; nothing touched.
    Unchanged,
    /// First visual for this cell.
    Created,
    /// Old visual detached and a new one attached.
    Replaced,
}

/// Change kinds reported to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayChange {
    Created,
    Replaced,
    Removed,
}

/// Event emitted whenever a visual is created, replaced, or removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayEvent {
    pub kind: OverlayKind,
    pub cell_id: CellId,
    pub change: OverlayChange,
}

/// Outcome of applying a full alert snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlertSetSummary {
    pub removed: usize,
    pub created: usize,
    pub replaced: usize,
    pub unchanged: usize,
    pub skipped: usize,
}

/// A drawn record and the handle of its visual.
#[derive(Debug, Clone)]
pub struct DrawnEntry<R> {
    pub record: R,
    pub handle: VisualHandle,
    pub drawn_at: DateTime<Utc>,
    order: u64,
}

/// Cell id → drawn entry, iterated in first-insertion order.
#[derive(Debug)]
struct Registry<R> {
    entries: HashMap<CellId, DrawnEntry<R>>,
    next_order: u64,
}

impl<R> Registry<R> {
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
            next_order: 0,
        }
    }

    fn get(&self, id: &CellId) -> Option<&DrawnEntry<R>> {
        self.entries.get(id)
    }

    fn contains(&self, id: &CellId) -> bool {
        self.entries.contains_key(id)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    /// Store `record`. A replaced entry keeps its place in iteration order.
    fn put(&mut self, id: CellId, record: R, handle: VisualHandle) {
        let order = if let Some(existing) = self.entries.get(&id) {
            existing.order
        } else {
            let order = self.next_order;
            self.next_order += 1;
            order
        };

        self.entries.insert(
            id,
            DrawnEntry {
                record,
                handle,
                drawn_at: Utc::now(),
                order,
            },
        );
    }

    fn remove(&mut self, id: &CellId) -> Option<DrawnEntry<R>> {
        self.entries.remove(id)
    }

    fn ordered(&self) -> Vec<(&CellId, &DrawnEntry<R>)> {
        let mut entries: Vec<_> = self.entries.iter().collect();
        entries.sort_by_key(|(_, entry)| entry.order);
        entries
    }

    /// Empty the registry, returning the handles that were attached.
    fn drain_handles(&mut self) -> Vec<(CellId, VisualHandle)> {
        let mut drained: Vec<_> = self
            .entries
            .drain()
            .map(|(id, entry)| (entry.order, id, entry.handle))
            .collect();
        drained.sort_by_key(|(order, _, _)| *order);
        drained.into_iter().map(|(_, id, handle)| (id, handle)).collect()
    }

    /// Create or replace the visual for `id`.
    ///
    /// `changed` decides whether an existing entry is stale. The new visual is
    /// built before anything is detached, so a record that cannot be drawn
    /// leaves the current visual in place.
    fn upsert<S>(
        &mut self,
        surface: &mut S,
        id: &CellId,
        record: R,
        changed: impl FnOnce(&R, &R) -> bool,
        build: impl FnOnce(&R) -> Result<Visual, OverlayError>,
    ) -> Result<Reconciled, OverlayError>
    where
        S: MapSurface + ?Sized,
    {
        let stale = match self.get(id) {
            None => None,
            Some(existing) => {
                if !changed(&existing.record, &record) {
                    return Ok(Reconciled::Unchanged);
                }
                Some(existing.handle)
            }
        };

        let visual = build(&record)?;

        if let Some(handle) = stale {
            surface.detach(handle);
        }
        let handle = surface.attach(&visual);
        self.put(id.clone(), record, handle);

        Ok(if stale.is_some() {
            Reconciled::Replaced
        } else {
            Reconciled::Created
        })
    }
}

fn required_id<R: CellRecord>(record: &R, kind: OverlayKind) -> Result<CellId, OverlayError> {
    record
        .cell_id()
        .cloned()
        .ok_or(OverlayError::MissingCellId(kind))
}

fn weather_marker(icons: &IconSet, id: &CellId, record: &WeatherCell) -> Result<Visual, OverlayError> {
    let position = record
        .center
        .ok_or_else(|| OverlayError::MissingCenter(id.clone()))?;
    let url = icons.weather_icon(record, IconVariant::Dark)?;
    Ok(Visual::Marker {
        position,
        icon: MarkerIcon::new(url),
    })
}

/// Strictly more than half of the viewport.
fn covers_majority(viewport_area: f64, covered_area: f64) -> bool {
    viewport_area < covered_area * 2.0
}

/// Owns the drawn state of every overlay layer for one map view.
pub struct OverlayController {
    flags: OverlayFlags,
    icons: IconSet,
    weather: Registry<WeatherCell>,
    s2_cells: Registry<S2Cell>,
    weather_alerts: Registry<WeatherAlert>,
    event_tx: broadcast::Sender<OverlayEvent>,
}

impl fmt::Debug for OverlayController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OverlayController")
            .field("flags", &self.flags)
            .field("weather_count", &self.weather.len())
            .field("s2_cell_count", &self.s2_cells.len())
            .field("weather_alert_count", &self.weather_alerts.len())
            .finish_non_exhaustive()
    }
}

impl OverlayController {
    /// Create a controller with empty registries.
    #[must_use]
    pub fn new(config: OverlayConfig) -> Self {
        let (event_tx, _) = broadcast::channel(config.event_channel_capacity.max(1));

        Self {
            flags: config.flags,
            icons: IconSet::new(config.icon_base_path),
            weather: Registry::new(),
            s2_cells: Registry::new(),
            weather_alerts: Registry::new(),
            event_tx,
        }
    }

    #[must_use]
    pub fn flags(&self) -> OverlayFlags {
        self.flags
    }

    /// Replace the layer flags and clear every layer that is now disabled.
    ///
    /// Returns how many visuals were detached. Enabled layers are drawn again
    /// by the next reconcile calls.
    pub fn set_flags<S>(&mut self, surface: &mut S, flags: OverlayFlags) -> usize
    where
        S: MapSurface + ?Sized,
    {
        self.flags = flags;

        let removed: usize = OverlayKind::ALL
            .into_iter()
            .filter(|kind| !flags.shows(*kind))
            .map(|kind| self.clear_kind(surface, kind))
            .sum();
        if removed > 0 {
            info!("Layer flags changed: {} visuals removed", removed);
        }
        removed
    }

    /// Subscribe to overlay change events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<OverlayEvent> {
        self.event_tx.subscribe()
    }

    fn notify(&self, kind: OverlayKind, cell_id: CellId, change: OverlayChange) {
        debug!("{} {}: {:?}", kind, cell_id, change);
        // No subscribers is fine
        let _ = self.event_tx.send(OverlayEvent {
            kind,
            cell_id,
            change,
        });
    }

    fn notify_outcome(&self, kind: OverlayKind, cell_id: CellId, outcome: Reconciled) {
        match outcome {
            Reconciled::Created => self.notify(kind, cell_id, OverlayChange::Created),
            Reconciled::Replaced => self.notify(kind, cell_id, OverlayChange::Replaced),
            Reconciled::Skipped | Reconciled::Unchanged => {}
        }
    }

    /// Draw or update the weather icon of one cell.
    pub fn reconcile_weather_cell<S>(
        &mut self,
        surface: &mut S,
        record: WeatherCell,
    ) -> Result<Reconciled, OverlayError>
    where
        S: MapSurface + ?Sized,
    {
        if !self.flags.show_weather_cells || record.gameplay_weather.is_none() {
            return Ok(Reconciled::Skipped);
        }

        let id = required_id(&record, OverlayKind::Weather)?;
        let icons = &self.icons;
        let outcome = self.weather.upsert(
            surface,
            &id,
            record,
            |old, new| old.gameplay_weather != new.gameplay_weather,
            |record| weather_marker(icons, &id, record),
        )?;

        self.notify_outcome(OverlayKind::Weather, id, outcome);
        Ok(outcome)
    }

    /// Draw the outline of a cell the first time it is seen.
    ///
    /// Cell geometry never changes, so existing outlines are left alone.
    pub fn reconcile_s2_cell<S>(&mut self, surface: &mut S, record: S2Cell) -> Result<Reconciled, OverlayError>
    where
        S: MapSurface + ?Sized,
    {
        if !self.flags.show_s2_cells {
            return Ok(Reconciled::Skipped);
        }

        let id = required_id(&record, OverlayKind::S2Cell)?;
        if self.s2_cells.contains(&id) {
            return Ok(Reconciled::Unchanged);
        }

        let handle = surface.create_polygon(&record.vertices, &s2_outline_style());
        self.s2_cells.put(id.clone(), record, handle);
        self.notify(OverlayKind::S2Cell, id, OverlayChange::Created);
        Ok(Reconciled::Created)
    }

    /// Draw or update the severity fill of one alert cell.
    pub fn reconcile_weather_alert<S>(
        &mut self,
        surface: &mut S,
        record: WeatherAlert,
    ) -> Result<Reconciled, OverlayError>
    where
        S: MapSurface + ?Sized,
    {
        let Some(severity) = record.severity else {
            return Ok(Reconciled::Skipped);
        };
        if !self.flags.show_weather_alerts {
            return Ok(Reconciled::Skipped);
        }

        let id = required_id(&record, OverlayKind::WeatherAlert)?;
        let outcome = self.weather_alerts.upsert(
            surface,
            &id,
            record,
            |old, new| old.severity != new.severity,
            |record| {
                Ok(Visual::Polygon {
                    path: record.vertices.clone(),
                    style: resolve_alert_style(severity)?,
                })
            },
        )?;

        self.notify_outcome(OverlayKind::WeatherAlert, id, outcome);
        Ok(outcome)
    }

    /// Apply a complete alert snapshot.
    ///
    /// Alerts missing from `alerts` are removed first, then every alert in the
    /// snapshot is reconciled. A snapshot containing a record without an id is
    /// rejected before anything is touched.
    pub fn reconcile_alert_set<S>(
        &mut self,
        surface: &mut S,
        alerts: Vec<WeatherAlert>,
    ) -> Result<AlertSetSummary, OverlayError>
    where
        S: MapSurface + ?Sized,
    {
        let mut incoming = HashSet::with_capacity(alerts.len());
        for alert in &alerts {
            incoming.insert(required_id(alert, OverlayKind::WeatherAlert)?);
        }

        let mut summary = AlertSetSummary::default();

        let obsolete: Vec<CellId> = self
            .weather_alerts
            .ordered()
            .into_iter()
            .map(|(id, _)| id)
            .filter(|id| !incoming.contains(*id))
            .cloned()
            .collect();

        for id in obsolete {
            if let Some(entry) = self.weather_alerts.remove(&id) {
                surface.detach(entry.handle);
                self.notify(OverlayKind::WeatherAlert, id, OverlayChange::Removed);
                summary.removed += 1;
            }
        }

        for alert in alerts {
            match self.reconcile_weather_alert(surface, alert)? {
                Reconciled::Skipped => summary.skipped += 1,
                Reconciled::Unchanged => summary.unchanged += 1,
                Reconciled::Created => summary.created += 1,
                Reconciled::Replaced => summary.replaced += 1,
            }
        }

        info!(
            "Weather alerts: {} removed, {} created, {} replaced, {} unchanged",
            summary.removed, summary.created, summary.replaced, summary.unchanged
        );

        Ok(summary)
    }

    /// Weather cell covering more than half of `viewport`, if any.
    ///
    /// Nothing is reported below the zoom gate. When several cells qualify
    /// the one drawn last wins.
    #[must_use]
    pub fn find_dominant_cell(
        &self,
        viewport: &LatLngBounds,
        zoom: f64,
        is_handheld: bool,
    ) -> Option<&DrawnEntry<WeatherCell>> {
        let min_zoom = if is_handheld {
            HANDHELD_MIN_ZOOM
        } else {
            POINTER_MIN_ZOOM
        };
        if zoom < min_zoom {
            return None;
        }

        let viewport_polygon = geometry::viewport_polygon(viewport);
        let viewport_area = geometry::area(&viewport_polygon);

        let mut dominant = None;
        for (_, entry) in self.weather.ordered() {
            let cell = geometry::polygon_from_ring(&entry.record.vertices);
            let covered = geometry::intersection_area(&viewport_polygon, &cell);
            if covers_majority(viewport_area, covered) {
                dominant = Some(entry);
            }
        }
        dominant
    }

    /// [`Self::find_dominant_cell`] using the surface's current view.
    #[must_use]
    pub fn dominant_cell<S>(&self, surface: &S, is_handheld: bool) -> Option<&DrawnEntry<WeatherCell>>
    where
        S: MapSurface + ?Sized,
    {
        self.find_dominant_cell(&surface.viewport(), surface.zoom(), is_handheld)
    }

    /// Show the dominant cell's weather on the top-bar indicator.
    ///
    /// The indicator is always cleared first; it stays empty when no cell
    /// dominates. Returns the id of the cell shown.
    pub fn refresh_indicator<S>(
        &self,
        surface: &S,
        is_handheld: bool,
        indicator: &mut WeatherIndicator,
    ) -> Result<Option<CellId>, OverlayError>
    where
        S: MapSurface + ?Sized,
    {
        indicator.clear();

        let Some(entry) = self.dominant_cell(surface, is_handheld) else {
            return Ok(None);
        };

        let src = self.icons.weather_icon(&entry.record, IconVariant::Light)?;
        indicator.show(src);
        Ok(entry.record.s2_cell_id.clone())
    }

    /// Detach and forget every visual of one kind. Returns how many were removed.
    pub fn clear_kind<S>(&mut self, surface: &mut S, kind: OverlayKind) -> usize
    where
        S: MapSurface + ?Sized,
    {
        let drained = match kind {
            OverlayKind::Weather => self.weather.drain_handles(),
            OverlayKind::S2Cell => self.s2_cells.drain_handles(),
            OverlayKind::WeatherAlert => self.weather_alerts.drain_handles(),
        };

        let removed = drained.len();
        for (id, handle) in drained {
            surface.detach(handle);
            self.notify(kind, id, OverlayChange::Removed);
        }
        removed
    }

    /// Detach every visual. Call when the map view is torn down.
    pub fn clear<S>(&mut self, surface: &mut S)
    where
        S: MapSurface + ?Sized,
    {
        for kind in OverlayKind::ALL {
            self.clear_kind(surface, kind);
        }
    }

    /// Number of drawn entries of `kind`.
    #[must_use]
    pub fn len(&self, kind: OverlayKind) -> usize {
        match kind {
            OverlayKind::Weather => self.weather.len(),
            OverlayKind::S2Cell => self.s2_cells.len(),
            OverlayKind::WeatherAlert => self.weather_alerts.len(),
        }
    }

    /// Check if nothing is drawn at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        OverlayKind::ALL.iter().all(|kind| self.len(*kind) == 0)
    }

    #[must_use]
    pub fn weather_cell(&self, id: &CellId) -> Option<&DrawnEntry<WeatherCell>> {
        self.weather.get(id)
    }

    #[must_use]
    pub fn s2_cell(&self, id: &CellId) -> Option<&DrawnEntry<S2Cell>> {
        self.s2_cells.get(id)
    }

    #[must_use]
    pub fn weather_alert(&self, id: &CellId) -> Option<&DrawnEntry<WeatherAlert>> {
        self.weather_alerts.get(id)
    }

    /// Drawn weather cells in the order they were first drawn.
    #[must_use]
    pub fn weather_cells(&self) -> Vec<(&CellId, &DrawnEntry<WeatherCell>)> {
        self.weather.ordered()
    }

    /// Drawn S2 cell outlines in the order they were first drawn.
    #[must_use]
    pub fn s2_cells(&self) -> Vec<(&CellId, &DrawnEntry<S2Cell>)> {
        self.s2_cells.ordered()
    }

    /// Drawn alerts in the order they were first drawn.
    #[must_use]
    pub fn weather_alerts(&self) -> Vec<(&CellId, &DrawnEntry<WeatherAlert>)> {
        self.weather_alerts.ordered()
    }
}

impl Default for OverlayController {
    fn default() -> Self {
        Self::new(OverlayConfig::default())
    }
}
