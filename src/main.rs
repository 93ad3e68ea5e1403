// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::error::Error;
use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};

#[derive(Debug, thiserror::Error)]
#[error("{0}: {1}")]
struct ModelLoadError(PathBuf, #[source] routeplan::osm::ParseError);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
enum Format {
    /// Guess the format based on the content
    #[default]
    Auto,

    /// Uncompressed OSM XML
    Xml,

    /// OSM XML with gzip compression
    XmlGz,

    /// OSM XML with bzip2 compression
    XmlBz2,
}

impl From<Format> for routeplan::osm::FileFormat {
    fn from(f: Format) -> Self {
        match f {
            Format::Auto => Self::Unknown,
            Format::Xml => Self::Xml,
            Format::XmlGz => Self::XmlGz,
            Format::XmlBz2 => Self::XmlBz2,
        }
    }
}

#[derive(Parser)]
struct Cli {
    /// The path to the OSM file
    osm_file: PathBuf,

    /// Horizontal position of the start point, in percent of the shorter side of the map
    start_x: f64,

    /// Vertical position of the start point, in percent of the shorter side of the map
    start_y: f64,

    /// Horizontal position of the end point, in percent of the shorter side of the map
    end_x: f64,

    /// Vertical position of the end point, in percent of the shorter side of the map
    end_y: f64,

    /// Format of the OSM file
    #[arg(long, value_enum, default_value_t)]
    format: Format,

    /// Snap positions to nodes with a k-d tree instead of a linear scan
    #[arg(long)]
    kd_tree: bool,
}

pub fn main() -> Result<(), Box<dyn Error>> {
    colog::init();
    let cli = Cli::parse();

    let model = load_model(&cli.osm_file, cli.format)?;
    let g = routeplan::Graph::new(model);

    let mut planner = if cli.kd_tree {
        let tree = routeplan::KDTree::from_graph(&g).ok_or(routeplan::AStarError::NoDrivableRoads)?;
        let start = tree.find_nearest_node(cli.start_x * 0.01, cli.start_y * 0.01);
        let end = tree.find_nearest_node(cli.end_x * 0.01, cli.end_y * 0.01);
        routeplan::RoutePlanner::from_nodes(&g, start.id, end.id)?
    } else {
        routeplan::RoutePlanner::new(&g, cli.start_x, cli.start_y, cli.end_x, cli.end_y)?
    };

    let route = planner.a_star_search()?;
    log::info!(
        "found route with {} nodes, {:.1} m long",
        route.nodes.len(),
        route.distance
    );

    println!("{{");
    println!("  \"type\": \"FeatureCollection\",");
    println!("  \"features\": [");
    println!("    {{");
    println!("      \"type\": \"Feature\",");
    println!("      \"properties\": {{");
    println!("        \"distance\": {}", route.distance);
    println!("      }},");

    println!("      \"geometry\": {{");
    println!("        \"type\": \"LineString\",");
    println!("        \"coordinates\": [");

    let mut nodes = route.nodes.iter().peekable();
    while let Some(node) = nodes.next() {
        let (lat, lon) = g.model().to_lat_lon(node.point);
        let suffix = if nodes.peek().is_some() { "," } else { "" };
        println!("          [{}, {}]{}", lon, lat, suffix);
    }

    println!("        ]");
    println!("      }}");
    println!("    }}");
    println!("  ]");
    println!("}}");

    Ok(())
}

fn load_model<P: AsRef<Path>>(path: P, format: Format) -> Result<routeplan::Model, ModelLoadError> {
    let options = routeplan::osm::Options {
        file_format: format.into(),
        ..routeplan::osm::Options::default()
    };
    match routeplan::osm::model_from_file(&options, path.as_ref()) {
        Ok(model) => Ok(model),
        Err(e) => Err(ModelLoadError(PathBuf::from(path.as_ref()), e)),
    }
}
