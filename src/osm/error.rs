// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::io;

use crate::model::Bounds;

/// Error which can occur when loading a [Model](crate::Model) from OSM data.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("xml: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("io: {0}")]
    Io(#[from] io::Error),

    #[error("<{element}>: missing or invalid {attribute:?} attribute")]
    InvalidAttribute {
        element: &'static str,
        attribute: &'static str,
    },

    #[error("unexpected end of data inside <{0}>")]
    Truncated(&'static str),

    #[error("no bounds: the data has no <bounds> element and no nodes")]
    MissingBounds,

    #[error("degenerate bounds: {0:?}")]
    DegenerateBounds(Bounds),
}
