// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use crate::Point;

/// Radius of the sphere used by the Web Mercator projection, in meters.
/// Source: https://epsg.io/3857
const MERCATOR_RADIUS: f64 = 6378137.0;

/// Calculates the straight-line distance between two [Points](Point)
/// in the normalized map space.
#[inline]
pub fn euclidean_distance(a: Point, b: Point) -> f64 {
    (a.x - b.x).hypot(a.y - b.y)
}

/// Projects a longitude (in degrees) onto the x axis of the
/// [Web Mercator projection](https://en.wikipedia.org/wiki/Web_Mercator_projection).
/// Returns the result in meters.
#[inline]
pub(crate) fn lon_to_x(lon: f64) -> f64 {
    MERCATOR_RADIUS * lon.to_radians()
}

/// Projects a latitude (in degrees) onto the y axis of the
/// [Web Mercator projection](https://en.wikipedia.org/wiki/Web_Mercator_projection).
/// Returns the result in meters.
#[inline]
pub(crate) fn lat_to_y(lat: f64) -> f64 {
    MERCATOR_RADIUS * (std::f64::consts::FRAC_PI_4 + lat.to_radians() * 0.5).tan().ln()
}

/// Inverse of [lon_to_x].
#[inline]
pub(crate) fn x_to_lon(x: f64) -> f64 {
    (x / MERCATOR_RADIUS).to_degrees()
}

/// Inverse of [lat_to_y].
#[inline]
pub(crate) fn y_to_lat(y: f64) -> f64 {
    (2.0 * (y / MERCATOR_RADIUS).exp().atan() - std::f64::consts::FRAC_PI_2).to_degrees()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn euclidean() {
        let a = Point { x: 0.0, y: 0.0 };
        let b = Point { x: 3.0, y: 4.0 };
        assert_eq!(euclidean_distance(a, b), 5.0);
        assert_eq!(euclidean_distance(b, a), 5.0);
        assert_eq!(euclidean_distance(a, a), 0.0);
    }

    #[test]
    fn mercator_inverse() {
        for &(lat, lon) in &[(0.0, 0.0), (52.2297, 21.0122), (-33.8688, 151.2093)] {
            assert_almost_eq!(y_to_lat(lat_to_y(lat)), lat);
            assert_almost_eq!(x_to_lon(lon_to_x(lon)), lon);
        }
    }

    #[test]
    fn mercator_stretches_away_from_equator() {
        // One degree of latitude spans more projected meters at 60°N than at the equator
        let at_equator = lat_to_y(1.0) - lat_to_y(0.0);
        let at_60 = lat_to_y(61.0) - lat_to_y(60.0);
        assert!(at_60 > 1.9 * at_equator);
    }
}
