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

//! Rendering surface abstraction.
//!
//! The overlay layer never draws anything itself. It describes visuals and
//! hands them to a [`MapSurface`], keeping only the returned handle.

use std::collections::BTreeMap;

use log::warn;

use crate::record::{LatLng, LatLngBounds};
use crate::style::{MarkerIcon, PolygonStyle};

/// Opaque handle to a visual attached to a map surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VisualHandle(u64);

impl VisualHandle {
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Description of something to draw.
#[derive(Debug, Clone, PartialEq)]
pub enum Visual {
    /// Image pinned at a point.
    Marker { position: LatLng, icon: MarkerIcon },
    /// Filled and/or stroked region.
    Polygon { path: Vec<LatLng>, style: PolygonStyle },
}

/// Trait for map widgets that can display overlay visuals.
///
/// Implement this for a concrete map widget to render overlays on it.
pub trait MapSurface {
    /// Attach a marker and return its handle.
    fn create_marker(&mut self, position: LatLng, icon: &MarkerIcon) -> VisualHandle;

    /// Attach a polygon and return its handle.
    fn create_polygon(&mut self, path: &[LatLng], style: &PolygonStyle) -> VisualHandle;

    /// Remove a previously attached visual from the map.
    fn detach(&mut self, handle: VisualHandle);

    /// Currently visible region.
    fn viewport(&self) -> LatLngBounds;

    /// Current zoom level.
    fn zoom(&self) -> f64;

    /// Attach any visual description.
    fn attach(&mut self, visual: &Visual) -> VisualHandle {
        match visual {
            Visual::Marker { position, icon } => self.create_marker(*position, icon),
            Visual::Polygon { path, style } => self.create_polygon(path, style),
        }
    }
}

/// In-memory map surface that records what is attached.
///
/// Used by the command-line replay tool and by tests.
#[derive(Debug, Clone)]
pub struct HeadlessMap {
    visuals: BTreeMap<VisualHandle, Visual>,
    next_handle: u64,
    viewport: LatLngBounds,
    zoom: f64,
    created_total: u64,
    detached_total: u64,
}

impl HeadlessMap {
    #[must_use]
    pub fn new(viewport: LatLngBounds, zoom: f64) -> Self {
        Self {
            visuals: BTreeMap::new(),
            next_handle: 1,
            viewport,
            zoom,
            created_total: 0,
            detached_total: 0,
        }
    }

    /// Move the camera.
    pub fn set_view(&mut self, viewport: LatLngBounds, zoom: f64) {
        self.viewport = viewport;
        self.zoom = zoom;
    }

    /// Visual attached under `handle`, if it is still on the map.
    #[must_use]
    pub fn visual(&self, handle: VisualHandle) -> Option<&Visual> {
        self.visuals.get(&handle)
    }

    #[must_use]
    pub fn is_attached(&self, handle: VisualHandle) -> bool {
        self.visuals.contains_key(&handle)
    }

    /// Number of visuals currently on the map.
    #[must_use]
    pub fn attached_count(&self) -> usize {
        self.visuals.len()
    }

    /// Iterate attached visuals in creation order.
    pub fn visuals(&self) -> impl Iterator<Item = (VisualHandle, &Visual)> {
        self.visuals.iter().map(|(handle, visual)| (*handle, visual))
    }

    /// Total visuals ever attached.
    #[must_use]
    pub fn created_total(&self) -> u64 {
        self.created_total
    }

    /// Total visuals ever detached.
    #[must_use]
    pub fn detached_total(&self) -> u64 {
        self.detached_total
    }

    fn insert(&mut self, visual: Visual) -> VisualHandle {
        let handle = VisualHandle(self.next_handle);
        self.next_handle += 1;
        self.created_total += 1;
        self.visuals.insert(handle, visual);
        handle
    }
}

impl MapSurface for HeadlessMap {
    fn create_marker(&mut self, position: LatLng, icon: &MarkerIcon) -> VisualHandle {
        self.insert(Visual::Marker {
            position,
            icon: icon.clone(),
        })
    }

    fn create_polygon(&mut self, path: &[LatLng], style: &PolygonStyle) -> VisualHandle {
        self.insert(Visual::Polygon {
            path: path.to_vec(),
            style: *style,
        })
    }

    fn detach(&mut self, handle: VisualHandle) {
        if self.visuals.remove(&handle).is_some() {
            self.detached_total += 1;
        } else {
            warn!("Detach requested for unknown visual {}", handle.raw());
        }
    }

    fn viewport(&self) -> LatLngBounds {
        self.viewport
    }

    fn zoom(&self) -> f64 {
        self.zoom
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::s2_outline_style;

    fn map() -> HeadlessMap {
        HeadlessMap::new(
            LatLngBounds::new(LatLng::new(1.0, 1.0), LatLng::new(0.0, 0.0)),
            14.0,
        )
    }

    #[test]
    fn test_attach_and_detach() {
        let mut map = map();
        let marker = map.create_marker(LatLng::new(0.5, 0.5), &MarkerIcon::new("a.png".to_string()));
        let polygon = map.attach(&Visual::Polygon {
            path: vec![LatLng::new(0.0, 0.0), LatLng::new(1.0, 0.0), LatLng::new(1.0, 1.0)],
            style: s2_outline_style(),
        });

        assert_ne!(marker, polygon);
        assert_eq!(map.attached_count(), 2);
        assert!(matches!(map.visual(marker), Some(Visual::Marker { .. })));

        let handles: Vec<_> = map.visuals().map(|(handle, _)| handle).collect();
        assert_eq!(handles, vec![marker, polygon]);

        map.detach(marker);
        assert!(!map.is_attached(marker));
        assert!(map.is_attached(polygon));
        assert_eq!(map.created_total(), 2);
        assert_eq!(map.detached_total(), 1);
    }

    #[test]
    fn test_detach_unknown_handle_is_ignored() {
        let mut map = map();
        map.detach(VisualHandle::from_raw(42));
        assert_eq!(map.detached_total(), 0);
    }

    #[test]
    fn test_set_view() {
        let mut map = map();
        let bounds = LatLngBounds::new(LatLng::new(5.0, 5.0), LatLng::new(4.0, 4.0));
        map.set_view(bounds, 12.0);
        assert_eq!(map.viewport(), bounds);
        assert!((map.zoom() - 12.0).abs() < f64::EPSILON);
    }
}
