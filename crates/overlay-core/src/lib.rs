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

//! Weather and S2 cell overlays for interactive maps.
//!
//! This library turns weather cell, S2 cell, and weather alert records into
//! map visuals and keeps them in sync as new data arrives. It is organised
//! in layers that can be used on their own:
//!
//! - **Records**: serde types for the map data feed
//! - **Style**: weather icon paths and polygon styles
//! - **Geometry**: polygon construction and intersection areas
//! - **Surface**: the [`MapSurface`] trait a map widget implements, plus an
//!   in-memory [`HeadlessMap`]
//! - **Overlay**: the [`OverlayController`] that reconciles records against
//!   what is already drawn and finds the cell dominating the viewport
//!
//! # Quick Start
//!
//! ```
//! use overlay_core::{
//!     HeadlessMap, LatLng, LatLngBounds, OverlayConfig, OverlayController,
//!     OverlayFlags, WeatherCell, WeatherIndicator,
//! };
//!
//! let mut map = HeadlessMap::new(
//!     LatLngBounds::new(LatLng::new(40.72, -74.00), LatLng::new(40.71, -74.01)),
//!     15.0,
//! );
//! let mut overlays = OverlayController::new(OverlayConfig {
//!     flags: OverlayFlags::all(),
//!     ..Default::default()
//! });
//!
//! overlays
//!     .reconcile_weather_cell(&mut map, WeatherCell {
//!         vertices: vec![
//!             LatLng::new(40.70, -74.02),
//!             LatLng::new(40.73, -74.02),
//!             LatLng::new(40.73, -73.99),
//!             LatLng::new(40.70, -73.99),
//!         ],
//!         center: Some(LatLng::new(40.715, -74.005)),
//!         gameplay_weather: Some(2),
//!         world_time: Some(1),
//!         ..WeatherCell::with_id("9926595610352287744")
//!     })
//!     .unwrap();
//!
//! let mut indicator = WeatherIndicator::default();
//! overlays.refresh_indicator(&map, false, &mut indicator).unwrap();
//! assert!(indicator.image().is_some());
//! ```

pub mod geometry;
pub mod indicator;
pub mod overlay;
pub mod record;
pub mod style;
pub mod surface;

pub use indicator::{IndicatorImage, WeatherIndicator};
pub use overlay::{
    AlertSetSummary, DrawnEntry, OverlayChange, OverlayConfig, OverlayController, OverlayError,
    OverlayEvent, OverlayFlags, OverlayKind, Reconciled,
};
pub use record::{CellId, CellRecord, LatLng, LatLngBounds, S2Cell, WeatherAlert, WeatherCell};
pub use style::{
    resolve_alert_style, s2_outline_style, AlertSeverity, IconSet, IconVariant, MarkerIcon,
    PolygonStyle, StyleError, WeatherCondition, WorldTime,
};
pub use surface::{HeadlessMap, MapSurface, Visual, VisualHandle};
