// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::io;
use std::str::{from_utf8, FromStr};

use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesStart, Event};

use super::elements::{Element, ElementType, Node, Relation, RelationMember, Way};
use crate::model::Bounds;
use crate::osm::ParseError;

/// Parser is a trait for objects which can parse XML.
///
/// This trait only exists to fix the mismatch of
/// [quick_xml::Reader::read_event] when working on buffered data
/// and [quick_xml::Reader::read_event_into] when working on IO.
pub(super) trait Parser {
    fn read_event<'a>(&'a mut self) -> quick_xml::Result<Event<'a>>;
}

/// IoParser implements [Parser] over an [std::io::BufRead].
pub(super) struct IoParser<R: io::BufRead>(quick_xml::Reader<R>, Vec<u8>);

impl<R: io::BufRead> IoParser<R> {
    #[inline]
    fn new(reader: R) -> Self {
        Self(quick_xml::Reader::from_reader(reader), Vec::default())
    }
}

impl<R: io::BufRead> Parser for IoParser<R> {
    #[inline]
    fn read_event<'a>(&'a mut self) -> quick_xml::Result<Event<'a>> {
        self.1.clear();
        self.0.read_event_into(&mut self.1)
    }
}

/// BufParser implements [Parser] over a slice of bytes (`&[u8]`).
pub(super) struct BufParser<'a>(quick_xml::Reader<&'a [u8]>);

impl<'a> BufParser<'a> {
    #[inline]
    fn new(data: &'a [u8]) -> Self {
        Self(quick_xml::Reader::from_reader(data))
    }
}

impl<'a> Parser for BufParser<'a> {
    #[inline]
    fn read_event<'b>(&'b mut self) -> quick_xml::Result<Event<'b>> {
        self.0.read_event()
    }
}

/// Reader reads [Elements](Element) from an OSM XML file.
///
/// Iteration stops after the first error.
pub(super) struct Reader<P: Parser> {
    parser: P,
    current: Option<Element>,
    eof: bool,
}

impl<P: Parser> Reader<P> {
    #[inline]
    fn new(parser: P) -> Self {
        Self {
            parser,
            current: None,
            eof: false,
        }
    }

    /// Consumes a single XML event, returning an element if it was completed by that event.
    fn step(&mut self) -> Result<Option<Element>, ParseError> {
        match self.parser.read_event()? {
            Event::Empty(start) => match start.local_name().as_ref() {
                b"bounds" => return parse_bounds(&start).map(|b| Some(Element::Bounds(b))),
                b"node" => return parse_node(&start).map(|n| Some(Element::Node(n))),
                b"way" => return parse_way(&start).map(|w| Some(Element::Way(w))),
                b"relation" => return parse_relation(&start).map(|r| Some(Element::Relation(r))),
                b"tag" => {
                    if let Some(tags) = element_tags(&mut self.current) {
                        let (k, v) = parse_tag(&start)?;
                        tags.insert(k, v);
                    }
                }
                b"nd" => {
                    if let Some(nodes) = element_nodes(&mut self.current) {
                        nodes.push(parse_nd(&start)?);
                    }
                }
                b"member" => {
                    if let Some(members) = element_members(&mut self.current) {
                        members.push(parse_member(&start)?);
                    }
                }
                _ => {}
            },

            Event::Start(start) => match start.local_name().as_ref() {
                b"bounds" => return parse_bounds(&start).map(|b| Some(Element::Bounds(b))),
                b"node" => self.current = Some(Element::Node(parse_node(&start)?)),
                b"way" => self.current = Some(Element::Way(parse_way(&start)?)),
                b"relation" => self.current = Some(Element::Relation(parse_relation(&start)?)),
                // "tag", "nd" and "member" must be self-closing
                _ => {}
            },

            Event::End(end) => match end.local_name().as_ref() {
                b"node" | b"way" | b"relation" => return Ok(self.current.take()),
                _ => {}
            },

            Event::Eof => {
                self.eof = true;
                if let Some(e) = self.current.take() {
                    return Err(ParseError::Truncated(element_name(&e)));
                }
            }

            _ => {}
        }

        Ok(None)
    }
}

impl<P: Parser> Iterator for Reader<P> {
    type Item = Result<Element, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.eof {
            match self.step() {
                Ok(Some(e)) => return Some(Ok(e)),
                Ok(None) => {}
                Err(e) => {
                    self.eof = true;
                    return Some(Err(e));
                }
            }
        }
        None
    }
}

impl<'a> Reader<BufParser<'a>> {
    #[inline]
    pub(super) fn from_buffer(data: &'a [u8]) -> Self {
        Self::new(BufParser::new(data))
    }
}

impl<R: io::BufRead> Reader<IoParser<R>> {
    #[inline]
    pub(super) fn from_io(reader: R) -> Self {
        Self::new(IoParser::new(reader))
    }
}

fn parse_value<T: FromStr>(
    element: &'static str,
    attribute: &'static str,
    attr: &Attribute<'_>,
) -> Result<T, ParseError> {
    from_utf8(&attr.value)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or(ParseError::InvalidAttribute { element, attribute })
}

#[inline]
fn required<T>(
    element: &'static str,
    attribute: &'static str,
    value: Option<T>,
) -> Result<T, ParseError> {
    value.ok_or(ParseError::InvalidAttribute { element, attribute })
}

fn parse_bounds(start: &BytesStart<'_>) -> Result<Bounds, ParseError> {
    let mut min_lat = None;
    let mut min_lon = None;
    let mut max_lat = None;
    let mut max_lon = None;

    for attr in start.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        match attr.key.as_ref() {
            b"minlat" => min_lat = Some(parse_value("bounds", "minlat", &attr)?),
            b"minlon" => min_lon = Some(parse_value("bounds", "minlon", &attr)?),
            b"maxlat" => max_lat = Some(parse_value("bounds", "maxlat", &attr)?),
            b"maxlon" => max_lon = Some(parse_value("bounds", "maxlon", &attr)?),
            _ => {}
        }
    }

    Ok(Bounds {
        min_lat: required("bounds", "minlat", min_lat)?,
        min_lon: required("bounds", "minlon", min_lon)?,
        max_lat: required("bounds", "maxlat", max_lat)?,
        max_lon: required("bounds", "maxlon", max_lon)?,
    })
}

fn parse_node(start: &BytesStart<'_>) -> Result<Node, ParseError> {
    let mut id = None;
    let mut lat = None;
    let mut lon = None;

    for attr in start.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        match attr.key.as_ref() {
            b"id" => id = Some(parse_value("node", "id", &attr)?),
            b"lat" => lat = Some(parse_value::<f64>("node", "lat", &attr)?),
            b"lon" => lon = Some(parse_value::<f64>("node", "lon", &attr)?),
            _ => {}
        }
    }

    Ok(Node {
        id: required("node", "id", id)?,
        lat: required("node", "lat", lat.filter(|x| x.is_finite()))?,
        lon: required("node", "lon", lon.filter(|x| x.is_finite()))?,
    })
}

fn parse_id(element: &'static str, start: &BytesStart<'_>) -> Result<i64, ParseError> {
    let mut id = None;

    for attr in start.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        if attr.key.as_ref() == b"id" {
            id = Some(parse_value(element, "id", &attr)?);
        }
    }

    required(element, "id", id)
}

fn parse_way(start: &BytesStart<'_>) -> Result<Way, ParseError> {
    Ok(Way {
        id: parse_id("way", start)?,
        nodes: Vec::default(),
        tags: HashMap::default(),
    })
}

fn parse_relation(start: &BytesStart<'_>) -> Result<Relation, ParseError> {
    Ok(Relation {
        id: parse_id("relation", start)?,
        members: Vec::default(),
        tags: HashMap::default(),
    })
}

fn parse_tag(start: &BytesStart<'_>) -> Result<(String, String), ParseError> {
    let mut k = None;
    let mut v = None;

    for attr in start.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        match attr.key.as_ref() {
            b"k" => k = Some(attr.unescape_value()?.into_owned()),
            b"v" => v = Some(attr.unescape_value()?.into_owned()),
            _ => {}
        }
    }

    Ok((required("tag", "k", k)?, v.unwrap_or_default()))
}

fn parse_nd(start: &BytesStart<'_>) -> Result<i64, ParseError> {
    let mut ref_ = None;

    for attr in start.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        if attr.key.as_ref() == b"ref" {
            ref_ = Some(parse_value("nd", "ref", &attr)?);
        }
    }

    required("nd", "ref", ref_)
}

fn parse_member(start: &BytesStart<'_>) -> Result<RelationMember, ParseError> {
    let mut ref_ = None;
    let mut type_ = None;
    let mut role = None;

    for attr in start.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        match attr.key.as_ref() {
            b"ref" => ref_ = Some(parse_value("member", "ref", &attr)?),
            b"type" => type_ = parse_element_type(&attr.value),
            b"role" => role = Some(attr.unescape_value()?.into_owned()),
            _ => {}
        }
    }

    Ok(RelationMember {
        type_: required("member", "type", type_)?,
        ref_: required("member", "ref", ref_)?,
        role: role.unwrap_or_default(),
    })
}

fn parse_element_type(s: &[u8]) -> Option<ElementType> {
    match s {
        b"node" => Some(ElementType::Node),
        b"way" => Some(ElementType::Way),
        b"relation" => Some(ElementType::Relation),
        _ => None,
    }
}

fn element_name(e: &Element) -> &'static str {
    match e {
        Element::Bounds(_) => "bounds",
        Element::Node(_) => "node",
        Element::Way(_) => "way",
        Element::Relation(_) => "relation",
    }
}

fn element_tags<'a>(e: &'a mut Option<Element>) -> Option<&'a mut HashMap<String, String>> {
    match e {
        Some(Element::Way(ref mut w)) => Some(&mut w.tags),
        Some(Element::Relation(ref mut r)) => Some(&mut r.tags),
        _ => None,
    }
}

fn element_nodes<'a>(e: &'a mut Option<Element>) -> Option<&'a mut Vec<i64>> {
    match e {
        Some(Element::Way(ref mut w)) => Some(&mut w.nodes),
        _ => None,
    }
}

fn element_members<'a>(e: &'a mut Option<Element>) -> Option<&'a mut Vec<RelationMember>> {
    match e {
        Some(Element::Relation(ref mut r)) => Some(&mut r.members),
        _ => None,
    }
}
