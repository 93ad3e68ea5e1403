// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use crate::distance::{lat_to_y, lon_to_x, x_to_lon, y_to_lat};
use crate::Point;

/// Ordered sequence of [Point] indices, shared by roads, railways and area rings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Way {
    pub nodes: Vec<usize>,
}

impl Way {
    /// Returns `true` if the way has at least 2 nodes and starts where it ends.
    pub fn is_closed(&self) -> bool {
        self.nodes.len() > 1 && self.nodes.first() == self.nodes.last()
    }
}

/// Classification of a [Road], derived from the
/// [highway](https://wiki.openstreetmap.org/wiki/Key:highway) tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoadType {
    Invalid,
    Unclassified,
    Service,
    Residential,
    Tertiary,
    Secondary,
    Primary,
    Trunk,
    Motorway,
    Footway,
}

impl RoadType {
    /// Maps a value of the `highway` tag onto a [RoadType].
    /// Unrecognized values map to [RoadType::Invalid].
    pub fn from_highway(value: &str) -> Self {
        match value {
            "motorway" => Self::Motorway,
            "trunk" => Self::Trunk,
            "primary" => Self::Primary,
            "secondary" => Self::Secondary,
            "tertiary" => Self::Tertiary,
            "residential" | "living_street" => Self::Residential,
            "service" => Self::Service,
            "unclassified" => Self::Unclassified,
            "footway" | "bridleway" | "steps" | "path" | "pedestrian" => Self::Footway,
            _ => Self::Invalid,
        }
    }

    /// Returns `false` for pedestrian-only roads, which are excluded from the [Graph](crate::Graph).
    #[inline]
    pub fn is_drivable(self) -> bool {
        self != Self::Footway
    }
}

/// A classified [Way].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Road {
    pub way: usize,
    pub type_: RoadType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Railway {
    pub way: usize,
}

/// Classification of a landuse [Area], derived from the
/// [landuse](https://wiki.openstreetmap.org/wiki/Key:landuse) tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LanduseType {
    Invalid,
    Commercial,
    Construction,
    Grass,
    Forest,
    Industrial,
    Railway,
    Residential,
}

impl LanduseType {
    /// Maps a value of the `landuse` tag onto a [LanduseType].
    /// Unrecognized values map to [LanduseType::Invalid].
    pub fn from_landuse(value: &str) -> Self {
        match value {
            "commercial" => Self::Commercial,
            "construction" => Self::Construction,
            "grass" => Self::Grass,
            "forest" => Self::Forest,
            "industrial" => Self::Industrial,
            "railway" => Self::Railway,
            "residential" => Self::Residential,
            _ => Self::Invalid,
        }
    }
}

/// Semantic tag of a polygonal [Area].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AreaKind {
    Building,
    Leisure,
    Water,
    Landuse(LanduseType),
}

/// Polygonal map feature. Both `outer` and `inner` contain indices
/// of closed [Ways](Way), one per ring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Area {
    pub kind: AreaKind,
    pub outer: Vec<usize>,
    pub inner: Vec<usize>,
}

/// Geographic extent of a [Model], in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

impl Bounds {
    /// Returns `true` if all values are finite and the bounds span
    /// a non-empty area.
    pub fn is_valid(&self) -> bool {
        [self.min_lat, self.min_lon, self.max_lat, self.max_lon]
            .iter()
            .all(|x| x.is_finite())
            && self.min_lat < self.max_lat
            && self.min_lon < self.max_lon
    }
}

/// Projection of [Bounds] onto the normalized map space.
///
/// The shorter side of the Web Mercator projected bounds is mapped onto `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Normalization {
    min_x: f64,
    min_y: f64,
    extent: f64,
    metric_scale: f64,
}

impl Normalization {
    pub(crate) fn new(bounds: &Bounds) -> Self {
        let min_x = lon_to_x(bounds.min_lon);
        let min_y = lat_to_y(bounds.min_lat);
        let dx = lon_to_x(bounds.max_lon) - min_x;
        let dy = lat_to_y(bounds.max_lat) - min_y;
        let extent = dx.min(dy);

        // Mercator meters are stretched by 1/cos(lat); undo it at the center of the map.
        let center_lat = (bounds.min_lat + bounds.max_lat) * 0.5;
        let metric_scale = extent * center_lat.to_radians().cos();

        Self {
            min_x,
            min_y,
            extent,
            metric_scale,
        }
    }

    pub(crate) fn project(&self, lat: f64, lon: f64) -> Point {
        Point {
            x: (lon_to_x(lon) - self.min_x) / self.extent,
            y: (lat_to_y(lat) - self.min_y) / self.extent,
        }
    }

    fn unproject(&self, p: Point) -> (f64, f64) {
        (
            y_to_lat(p.y * self.extent + self.min_y),
            x_to_lon(p.x * self.extent + self.min_x),
        )
    }
}

/// In-memory representation of a map extract.
///
/// All collections are addressed by position: [Ways](Way) refer to [Points](Point)
/// by index, [Roads](Road), [Railways](Railway) and [Areas](Area) refer to
/// [Ways](Way) by index. A [Model] is immutable once built - use
/// [osm::model_from_buffer](crate::osm::model_from_buffer) and friends to create one.
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    pub(crate) points: Vec<Point>,
    pub(crate) ways: Vec<Way>,
    pub(crate) roads: Vec<Road>,
    pub(crate) railways: Vec<Railway>,
    pub(crate) areas: Vec<Area>,
    pub(crate) bounds: Bounds,
    pub(crate) normalization: Normalization,
}

impl Model {
    /// Factor converting distances between normalized [Points](Point) into meters.
    pub fn metric_scale(&self) -> f64 {
        self.normalization.metric_scale
    }

    /// Geographic extent used to normalize coordinates.
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn ways(&self) -> &[Way] {
        &self.ways
    }

    pub fn roads(&self) -> &[Road] {
        &self.roads
    }

    pub fn railways(&self) -> &[Railway] {
        &self.railways
    }

    /// Returns all polygonal features, regardless of their [AreaKind].
    pub fn areas(&self) -> &[Area] {
        &self.areas
    }

    pub fn buildings(&self) -> impl Iterator<Item = &Area> {
        self.areas.iter().filter(|a| a.kind == AreaKind::Building)
    }

    pub fn leisures(&self) -> impl Iterator<Item = &Area> {
        self.areas.iter().filter(|a| a.kind == AreaKind::Leisure)
    }

    pub fn waters(&self) -> impl Iterator<Item = &Area> {
        self.areas.iter().filter(|a| a.kind == AreaKind::Water)
    }

    pub fn landuses(&self) -> impl Iterator<Item = &Area> {
        self.areas
            .iter()
            .filter(|a| matches!(a.kind, AreaKind::Landuse(_)))
    }

    /// Converts a normalized [Point] back into a (latitude, longitude) pair.
    pub fn to_lat_lon(&self, p: Point) -> (f64, f64) {
        self.normalization.unproject(p)
    }
}
