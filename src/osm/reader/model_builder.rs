// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::HashMap;

use super::elements::{self, Element, ElementType};
use super::rings::assemble_rings;
use super::Options;
use crate::model::{
    Area, AreaKind, Bounds, LanduseType, Model, Normalization, Railway, Road, RoadType, Way,
};
use crate::osm::ParseError;

/// Helper object used for storing state related to converting [OSM elements](Element)
/// into a [Model].
pub(super) struct ModelBuilder<'a> {
    options: &'a Options,
    file_bounds: Option<Bounds>,
    node_index: HashMap<i64, usize>,
    way_index: HashMap<i64, usize>,
    positions: Vec<(f64, f64)>,
    ways: Vec<Way>,
    roads: Vec<Road>,
    railways: Vec<Railway>,
    areas: Vec<Area>,
    dropped_refs: usize,
}

impl<'a> ModelBuilder<'a> {
    /// Create a new, empty model builder.
    pub(super) fn new(options: &'a Options) -> Self {
        Self {
            options,
            file_bounds: None,
            node_index: HashMap::default(),
            way_index: HashMap::default(),
            positions: Vec::default(),
            ways: Vec::default(),
            roads: Vec::default(),
            railways: Vec::default(),
            areas: Vec::default(),
            dropped_refs: 0,
        }
    }

    /// Consume all elements and build the [Model]. Any error aborts the whole process.
    pub(super) fn build<I: Iterator<Item = Result<Element, ParseError>>>(
        mut self,
        elements: I,
    ) -> Result<Model, ParseError> {
        for e in elements {
            self.add_element(e?);
        }
        self.finish()
    }

    fn add_element(&mut self, e: Element) {
        match e {
            Element::Bounds(b) => self.add_bounds(b),
            Element::Node(n) => self.add_node(n),
            Element::Way(w) => self.add_way(w),
            Element::Relation(r) => self.add_relation(r),
        }
    }

    fn add_bounds(&mut self, b: Bounds) {
        if self.file_bounds.is_none() {
            self.file_bounds = Some(b);
        } else {
            log::debug!("ignoring extra <bounds> element: {:?}", b);
        }
    }

    fn add_node(&mut self, n: elements::Node) {
        if self.node_index.contains_key(&n.id) {
            log::warn!("duplicate node {} - keeping the first occurrence", n.id);
            return;
        }

        self.node_index.insert(n.id, self.positions.len());
        self.positions.push((n.lat, n.lon));
    }

    fn add_way(&mut self, w: elements::Way) {
        let idx = self.ways.len();
        let nodes = self.resolve_way_nodes(&w);
        self.ways.push(Way { nodes });
        self.way_index.insert(w.id, idx);

        let tag = |k: &str| w.tags.get(k).map(String::as_str);

        if let Some(highway) = tag("highway") {
            let type_ = RoadType::from_highway(highway);
            if type_ != RoadType::Invalid {
                self.roads.push(Road { way: idx, type_ });
            }
        }

        if tag("railway").is_some() {
            self.railways.push(Railway { way: idx });
        }

        for kind in area_kinds(&w.tags) {
            self.areas.push(Area {
                kind,
                outer: vec![idx],
                inner: vec![],
            });
        }
    }

    /// Maps OSM node ids to [Point](crate::Point) indices,
    /// removing references to unknown nodes.
    fn resolve_way_nodes(&mut self, w: &elements::Way) -> Vec<usize> {
        let mut nodes = Vec::with_capacity(w.nodes.len());
        for &node_id in &w.nodes {
            match self.node_index.get(&node_id) {
                Some(&idx) => nodes.push(idx),
                None => {
                    log::debug!("way {} references unknown node {}", w.id, node_id);
                    self.dropped_refs += 1;
                }
            }
        }
        nodes
    }

    fn add_relation(&mut self, r: elements::Relation) {
        if r.tags.get("type").map(String::as_str) != Some("multipolygon") {
            return;
        }

        let Some(kind) = area_kinds(&r.tags).into_iter().next() else {
            return;
        };

        let mut outer = Vec::default();
        let mut inner = Vec::default();
        for m in &r.members {
            if m.type_ != ElementType::Way {
                continue;
            }

            let Some(&idx) = self.way_index.get(&m.ref_) else {
                log::debug!("relation {} references unknown way {}", r.id, m.ref_);
                continue;
            };

            match m.role.as_str() {
                "outer" => outer.push(idx),
                "inner" => inner.push(idx),
                _ => {}
            }
        }

        let outer = assemble_rings(&mut self.ways, &outer);
        let inner = assemble_rings(&mut self.ways, &inner);

        if outer.is_empty() {
            log::debug!("relation {} has no closed outer ring - skipping", r.id);
            return;
        }

        self.areas.push(Area { kind, outer, inner });
    }

    /// Returns the bounds used for normalization: the [Options::bbox],
    /// the `<bounds>` element, or the extent of all nodes - in that order.
    fn resolve_bounds(&self) -> Result<Bounds, ParseError> {
        let bounds = self
            .options
            .bounding_box()
            .or(self.file_bounds)
            .or_else(|| self.nodes_extent())
            .ok_or(ParseError::MissingBounds)?;

        if bounds.is_valid() {
            Ok(bounds)
        } else {
            Err(ParseError::DegenerateBounds(bounds))
        }
    }

    fn nodes_extent(&self) -> Option<Bounds> {
        let &(lat, lon) = self.positions.first()?;
        let initial = Bounds {
            min_lat: lat,
            min_lon: lon,
            max_lat: lat,
            max_lon: lon,
        };

        Some(
            self.positions
                .iter()
                .fold(initial, |b, &(lat, lon)| Bounds {
                    min_lat: b.min_lat.min(lat),
                    min_lon: b.min_lon.min(lon),
                    max_lat: b.max_lat.max(lat),
                    max_lon: b.max_lon.max(lon),
                }),
        )
    }

    fn finish(self) -> Result<Model, ParseError> {
        let bounds = self.resolve_bounds()?;
        let normalization = Normalization::new(&bounds);

        if self.dropped_refs > 0 {
            log::warn!(
                "dropped {} reference(s) to nodes missing from the data",
                self.dropped_refs
            );
        }

        let points = self
            .positions
            .iter()
            .map(|&(lat, lon)| normalization.project(lat, lon))
            .collect::<Vec<_>>();

        log::info!(
            "loaded {} points, {} ways, {} roads, {} railways and {} areas",
            points.len(),
            self.ways.len(),
            self.roads.len(),
            self.railways.len(),
            self.areas.len(),
        );

        Ok(Model {
            points,
            ways: self.ways,
            roads: self.roads,
            railways: self.railways,
            areas: self.areas,
            bounds,
            normalization,
        })
    }
}

/// Returns all kinds of polygonal features described by the provided tags,
/// in order: building, water, landuse, leisure.
fn area_kinds(tags: &HashMap<String, String>) -> Vec<AreaKind> {
    let tag = |k: &str| tags.get(k).map(String::as_str);
    let mut kinds = Vec::default();

    if tag("building").is_some() {
        kinds.push(AreaKind::Building);
    }

    if tag("natural") == Some("water") {
        kinds.push(AreaKind::Water);
    }

    if let Some(landuse) = tag("landuse") {
        let type_ = LanduseType::from_landuse(landuse);
        if type_ != LanduseType::Invalid {
            kinds.push(AreaKind::Landuse(type_));
        }
    }

    if tag("leisure").is_some()
        || matches!(
            tag("natural"),
            Some("wood") | Some("tree_row") | Some("scrub") | Some("grassland")
        )
        || tag("landcover") == Some("grass")
    {
        kinds.push(AreaKind::Leisure);
    }

    kinds
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! tags {
        {} => { HashMap::default() };
        {$( $k:literal : $v:literal ),+} => {
            HashMap::from_iter([ $( ($k.to_string(), $v.to_string()) ),+ ])
        };
    }

    fn node(id: i64, lat: f64, lon: f64) -> Result<Element, ParseError> {
        Ok(Element::Node(elements::Node { id, lat, lon }))
    }

    fn way(id: i64, nodes: &[i64], tags: HashMap<String, String>) -> Result<Element, ParseError> {
        Ok(Element::Way(elements::Way {
            id,
            nodes: nodes.to_vec(),
            tags,
        }))
    }

    fn relation(
        id: i64,
        outer: &[i64],
        tags: HashMap<String, String>,
    ) -> Result<Element, ParseError> {
        Ok(Element::Relation(elements::Relation {
            id,
            members: outer
                .iter()
                .map(|&ref_| elements::RelationMember {
                    type_: ElementType::Way,
                    ref_,
                    role: "outer".to_string(),
                })
                .collect(),
            tags,
        }))
    }

    #[test]
    fn area_kinds_from_tags() {
        assert!(area_kinds(&tags! {}).is_empty());
        assert_eq!(area_kinds(&tags! {"building": "house"}), [AreaKind::Building]);
        assert_eq!(area_kinds(&tags! {"natural": "scrub"}), [AreaKind::Leisure]);
        assert_eq!(area_kinds(&tags! {"landcover": "grass"}), [AreaKind::Leisure]);
        assert!(area_kinds(&tags! {"landuse": "farmland"}).is_empty());
        assert_eq!(
            area_kinds(&tags! {"building": "yes", "landuse": "industrial"}),
            [
                AreaKind::Building,
                AreaKind::Landuse(LanduseType::Industrial)
            ]
        );
    }

    #[test]
    fn bounds_fall_back_to_node_extent() -> Result<(), ParseError> {
        let options = Options::default();
        let model = ModelBuilder::new(&options).build(
            [
                node(1, 10.0, 20.0),
                node(2, 10.5, 20.2),
                node(3, 10.2, 21.0),
            ]
            .into_iter(),
        )?;

        assert_eq!(
            model.bounds(),
            Bounds {
                min_lat: 10.0,
                min_lon: 20.0,
                max_lat: 10.5,
                max_lon: 21.0,
            }
        );
        Ok(())
    }

    #[test]
    fn bbox_overrides_file_bounds() -> Result<(), ParseError> {
        let options = Options {
            bbox: [20.0, 10.0, 21.0, 11.0],
            ..Options::default()
        };
        let model = ModelBuilder::new(&options).build(
            [
                Ok(Element::Bounds(Bounds {
                    min_lat: 0.0,
                    min_lon: 0.0,
                    max_lat: 50.0,
                    max_lon: 50.0,
                })),
                node(1, 10.5, 20.5),
            ]
            .into_iter(),
        )?;

        assert_eq!(model.bounds().min_lat, 10.0);
        assert_eq!(model.bounds().max_lon, 21.0);
        Ok(())
    }

    #[test]
    fn no_bounds_at_all() {
        let options = Options::default();
        let result = ModelBuilder::new(&options).build(std::iter::empty());
        assert!(matches!(result, Err(ParseError::MissingBounds)));
    }

    #[test]
    fn single_node_bounds_are_degenerate() {
        let options = Options::default();
        let result = ModelBuilder::new(&options).build([node(1, 10.0, 20.0)].into_iter());
        assert!(matches!(result, Err(ParseError::DegenerateBounds(_))));
    }

    #[test]
    fn errors_abort_the_build() {
        let options = Options::default();
        let result = ModelBuilder::new(&options).build(
            [
                node(1, 10.0, 20.0),
                Err(ParseError::Truncated("way")),
                node(2, 11.0, 21.0),
            ]
            .into_iter(),
        );
        assert!(matches!(result, Err(ParseError::Truncated("way"))));
    }

    #[test]
    fn duplicate_nodes_and_unknown_refs() -> Result<(), ParseError> {
        let options = Options::default();
        let model = ModelBuilder::new(&options).build(
            [
                node(1, 10.0, 20.0),
                node(2, 11.0, 21.0),
                node(1, 50.0, 50.0),
                way(10, &[1, 3, 2], tags! {"highway": "trunk"}),
            ]
            .into_iter(),
        )?;

        assert_eq!(model.points().len(), 2);
        assert_eq!(model.ways()[0].nodes, [0, 1]);
        assert_eq!(
            model.roads(),
            [Road {
                way: 0,
                type_: RoadType::Trunk
            }]
        );
        Ok(())
    }

    #[test]
    fn multipolygon_without_closed_outer_ring_is_dropped() -> Result<(), ParseError> {
        let options = Options::default();
        let model = ModelBuilder::new(&options).build(
            [
                node(1, 10.0, 20.0),
                node(2, 10.5, 20.5),
                node(3, 11.0, 21.0),
                way(10, &[1, 2], tags! {}),
                way(11, &[2, 3], tags! {}),
                relation(20, &[10, 11], tags! {"type": "multipolygon", "natural": "water"}),
            ]
            .into_iter(),
        )?;

        assert!(model.areas().is_empty());
        assert_eq!(model.ways().len(), 2);
        Ok(())
    }

    #[test]
    fn multipolygon_uses_the_first_area_kind() -> Result<(), ParseError> {
        let options = Options::default();
        let model = ModelBuilder::new(&options).build(
            [
                node(1, 10.0, 20.0),
                node(2, 10.5, 20.5),
                node(3, 11.0, 20.0),
                way(10, &[1, 2, 3, 1], tags! {}),
                relation(
                    20,
                    &[10],
                    tags! {"type": "multipolygon", "landuse": "industrial", "building": "yes"},
                ),
            ]
            .into_iter(),
        )?;

        assert_eq!(
            model.areas(),
            [Area {
                kind: AreaKind::Building,
                outer: vec![0],
                inner: vec![],
            }]
        );
        Ok(())
    }
}
