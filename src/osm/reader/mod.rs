// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::fs::File;
use std::io::{self, BufRead};
use std::path::Path;

use model_builder::ModelBuilder;

use crate::model::{Bounds, Model};
use crate::osm::ParseError;

mod elements;
mod model_builder;
mod rings;
mod xml;

/// Format of the input OSM file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileFormat {
    /// Unknown format - guess the format based on the content
    #[default]
    Unknown,

    /// Force uncompressed [OSM XML](https://wiki.openstreetmap.org/wiki/OSM_XML)
    Xml,

    /// Force [OSM XML](https://wiki.openstreetmap.org/wiki/OSM_XML)
    /// with [gzip](https://en.wikipedia.org/wiki/Gzip) compression
    XmlGz,

    /// Force [OSM XML](https://wiki.openstreetmap.org/wiki/OSM_XML)
    /// with [bzip2](https://en.wikipedia.org/wiki/Bzip2) compression
    XmlBz2,
}

impl FileFormat {
    /// Guesses the format of a file by looking at its first bytes.
    /// Anything not recognized as a compressed stream is assumed to be plain XML.
    pub fn detect(data: &[u8]) -> Self {
        if data.starts_with(&[0x1f, 0x8b]) {
            Self::XmlGz
        } else if data.starts_with(b"BZh") {
            Self::XmlBz2
        } else {
            Self::Xml
        }
    }
}

/// Additional controls for interpreting OSM data as a [Model].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Options {
    /// Format of the input data.
    pub file_format: FileFormat,

    /// Override the bounding box used for coordinate normalization. In order: left (min lon),
    /// bottom (min lat), right (max lon), top (max lat). Ignored if all values are set to zero,
    /// or at least one of them is not finite - in that case the `<bounds>` element of the file
    /// is used, or, if that is missing, the extent of all nodes.
    pub bbox: [f64; 4],
}

impl Options {
    /// Returns the [Options::bbox] as [Bounds], unless it should be ignored.
    fn bounding_box(&self) -> Option<Bounds> {
        if self.bbox.iter().all(|&x| x == 0.0) || self.bbox.iter().any(|x| !x.is_finite()) {
            return None;
        }

        let [min_lon, min_lat, max_lon, max_lat] = self.bbox;
        Some(Bounds {
            min_lat,
            min_lon,
            max_lat,
            max_lon,
        })
    }
}

/// Parse OSM data from a reader into a [Model] as per the provided [Options].
///
/// The provided stream will be automatically wrapped in a buffered reader when needed.
pub fn model_from_io<R: io::Read>(options: &Options, reader: R) -> Result<Model, ParseError> {
    let mut b = io::BufReader::new(reader);
    let format = match options.file_format {
        FileFormat::Unknown => FileFormat::detect(b.fill_buf()?),
        format => format,
    };
    log::debug!("reading OSM data as {:?}", format);

    let builder = ModelBuilder::new(options);
    match format {
        FileFormat::Unknown | FileFormat::Xml => builder.build(xml::Reader::from_io(b)),

        FileFormat::XmlGz => {
            let d = flate2::read::MultiGzDecoder::new(b);
            builder.build(xml::Reader::from_io(io::BufReader::new(d)))
        }

        FileFormat::XmlBz2 => {
            let d = bzip2::read::MultiBzDecoder::new(b);
            builder.build(xml::Reader::from_io(io::BufReader::new(d)))
        }
    }
}

/// Parse OSM data from a file at the provided path into a [Model] as per the provided [Options].
pub fn model_from_file<P: AsRef<Path>>(options: &Options, path: P) -> Result<Model, ParseError> {
    let f = File::open(path)?;
    model_from_io(options, f)
}

/// Parse OSM data from a static buffer into a [Model] as per the provided [Options].
pub fn model_from_buffer(options: &Options, data: &[u8]) -> Result<Model, ParseError> {
    let format = match options.file_format {
        FileFormat::Unknown => FileFormat::detect(data),
        format => format,
    };

    if format == FileFormat::Xml {
        // Fast path is available for in-memory XML data
        ModelBuilder::new(options).build(xml::Reader::from_buffer(data))
    } else {
        // Wrap the buffer in a cursor and use the IO path
        let options = Options {
            file_format: format,
            ..*options
        };
        model_from_io(&options, io::Cursor::new(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_file_format() {
        assert_eq!(FileFormat::detect(b"<?xml version='1.0'?>"), FileFormat::Xml);
        assert_eq!(FileFormat::detect(&[0x1f, 0x8b, 0x08, 0x00]), FileFormat::XmlGz);
        assert_eq!(FileFormat::detect(b"BZh91AY&SY"), FileFormat::XmlBz2);
        assert_eq!(FileFormat::detect(b""), FileFormat::Xml);
    }

    #[test]
    fn bounding_box_is_ignored_when_unset() {
        assert_eq!(Options::default().bounding_box(), None);

        let options = Options {
            bbox: [0.0, f64::NAN, 1.0, 1.0],
            ..Options::default()
        };
        assert_eq!(options.bounding_box(), None);

        let options = Options {
            bbox: [21.0, 52.0, 21.1, 52.1],
            ..Options::default()
        };
        assert_eq!(
            options.bounding_box(),
            Some(Bounds {
                min_lat: 52.0,
                min_lon: 21.0,
                max_lat: 52.1,
                max_lon: 21.1,
            })
        );
    }
}
