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

//! Planar polygon helpers.
//!
//! Coordinates are used as-is in degrees (x = latitude, y = longitude). Areas
//! are therefore only meaningful relative to each other, which is all the
//! viewport coverage test needs.

use geo::{Area, BooleanOps, Coord, LineString, Polygon};

use crate::record::{LatLng, LatLngBounds};

/// A closed ring needs at least three distinct points plus the closing point.
const MIN_CLOSED_RING_LEN: usize = 4;

/// Build a polygon from an ordered ring, closing it if the first and last
/// points differ.
#[must_use]
pub fn polygon_from_ring(ring: &[LatLng]) -> Polygon<f64> {
    let mut coords: Vec<Coord<f64>> = ring.iter().map(|p| Coord { x: p.lat, y: p.lng }).collect();

    if let (Some(first), Some(last)) = (coords.first().copied(), coords.last().copied()) {
        if first != last {
            coords.push(first);
        }
    }

    Polygon::new(LineString::new(coords), Vec::new())
}

/// Polygon covering the viewport, walked NE, NW, SW, SE.
#[must_use]
pub fn viewport_polygon(bounds: &LatLngBounds) -> Polygon<f64> {
    let ne = bounds.north_east;
    let sw = bounds.south_west;
    polygon_from_ring(&[
        LatLng::new(ne.lat, ne.lng),
        LatLng::new(ne.lat, sw.lng),
        LatLng::new(sw.lat, sw.lng),
        LatLng::new(sw.lat, ne.lng),
    ])
}

/// Unsigned planar area.
#[must_use]
pub fn area(polygon: &Polygon<f64>) -> f64 {
    polygon.unsigned_area()
}

fn is_degenerate(polygon: &Polygon<f64>) -> bool {
    let ring = &polygon.exterior().0;
    ring.len() < MIN_CLOSED_RING_LEN || ring.iter().any(|c| !c.x.is_finite() || !c.y.is_finite())
}

/// Area of the region shared by both polygons. Degenerate rings (too short,
/// or with a NaN/infinite vertex) share nothing.
#[must_use]
pub fn intersection_area(a: &Polygon<f64>, b: &Polygon<f64>) -> f64 {
    if is_degenerate(a) || is_degenerate(b) {
        return 0.0;
    }
    a.intersection(b).unsigned_area()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(lat: f64, lng: f64, size: f64) -> Vec<LatLng> {
        vec![
            LatLng::new(lat, lng),
            LatLng::new(lat + size, lng),
            LatLng::new(lat + size, lng + size),
            LatLng::new(lat, lng + size),
        ]
    }

    #[test]
    fn test_ring_is_closed() {
        let polygon = polygon_from_ring(&square(0.0, 0.0, 1.0));
        let ring = &polygon.exterior().0;
        assert_eq!(ring.len(), 5);
        assert_eq!(ring.first(), ring.last());
    }

    #[test]
    fn test_closed_ring_not_duplicated() {
        let mut ring = square(0.0, 0.0, 1.0);
        ring.push(ring[0]);
        let polygon = polygon_from_ring(&ring);
        assert_eq!(polygon.exterior().0.len(), 5);
    }

    #[test]
    fn test_viewport_area() {
        let bounds = LatLngBounds::new(LatLng::new(2.0, 3.0), LatLng::new(0.0, 0.0));
        assert!((area(&viewport_polygon(&bounds)) - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_intersection_area_of_overlapping_squares() {
        let a = polygon_from_ring(&square(0.0, 0.0, 2.0));
        let b = polygon_from_ring(&square(1.0, 1.0, 2.0));
        assert!((intersection_area(&a, &b) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_disjoint_and_degenerate() {
        let a = polygon_from_ring(&square(0.0, 0.0, 1.0));
        let b = polygon_from_ring(&square(5.0, 5.0, 1.0));
        assert!(intersection_area(&a, &b).abs() < 1e-12);

        let empty = polygon_from_ring(&[]);
        assert!(intersection_area(&a, &empty).abs() < 1e-12);
    }

    #[test]
    fn test_non_finite_ring_shares_nothing() {
        let a = polygon_from_ring(&square(0.0, 0.0, 1.0));

        let mut ring = square(0.0, 0.0, 1.0);
        ring[1].lat = f64::NAN;
        let nan = polygon_from_ring(&ring);
        assert!(intersection_area(&a, &nan).abs() < 1e-12);
        assert!(intersection_area(&nan, &a).abs() < 1e-12);

        ring[1].lat = f64::INFINITY;
        assert!(intersection_area(&a, &polygon_from_ring(&ring)).abs() < 1e-12);
    }
}
