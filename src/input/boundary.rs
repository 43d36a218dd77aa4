//! Code for reading region boundaries from GeoJSON files.
use super::{check_input_exists, input_err_msg};
use crate::boundary::{Point, Polygon, RegionBoundary};
use anyhow::{Context, Result, bail, ensure};
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Names of coordinate reference systems equivalent to WGS84 longitude/latitude
const WGS84_CRS_NAMES: [&str; 3] = [
    "urn:ogc:def:crs:OGC:1.3:CRS84",
    "urn:ogc:def:crs:EPSG::4326",
    "EPSG:4326",
];

/// A position is at least (longitude, latitude), possibly followed by an altitude
type Position = Vec<f64>;

#[derive(Deserialize)]
struct FeatureCollection {
    features: Vec<Feature>,
}

#[derive(Deserialize)]
struct Feature {
    geometry: Option<Geometry>,
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum Geometry {
    Polygon {
        coordinates: Vec<Vec<Position>>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Vec<Position>>>,
    },
}

impl Geometry {
    fn into_polygons(self) -> Result<Vec<Polygon>> {
        match self {
            Self::Polygon { coordinates } => Ok(vec![polygon_from_rings(coordinates)?]),
            Self::MultiPolygon { coordinates } => {
                coordinates.into_iter().map(polygon_from_rings).collect()
            }
        }
    }
}

/// Read a region boundary from a GeoJSON file.
///
/// The file may contain a Feature, a FeatureCollection or a bare Polygon or MultiPolygon
/// geometry. Coordinates must be WGS84 longitude/latitude.
pub fn read_boundary(file_path: &Path) -> Result<RegionBoundary> {
    check_input_exists(file_path)?;
    let contents = fs::read_to_string(file_path).with_context(|| input_err_msg(file_path))?;
    parse_boundary(&contents).with_context(|| input_err_msg(file_path))
}

/// Parse a region boundary from a GeoJSON string
pub fn parse_boundary(contents: &str) -> Result<RegionBoundary> {
    let value: Value = serde_json::from_str(contents).context("Invalid JSON")?;
    check_crs(&value)?;

    let geometries: Vec<Geometry> = match value.get("type").and_then(Value::as_str) {
        Some("FeatureCollection") => {
            let collection: FeatureCollection =
                serde_json::from_value(value).context("Invalid GeoJSON FeatureCollection")?;
            collection
                .features
                .into_iter()
                .filter_map(|feature| feature.geometry)
                .collect()
        }
        Some("Feature") => {
            let feature: Feature =
                serde_json::from_value(value).context("Invalid GeoJSON Feature")?;
            feature.geometry.into_iter().collect()
        }
        Some(_) => vec![serde_json::from_value(value).context("Invalid GeoJSON geometry")?],
        None => bail!("GeoJSON object has no type"),
    };

    let mut polygons = Vec::new();
    for geometry in geometries {
        polygons.extend(geometry.into_polygons()?);
    }
    ensure!(!polygons.is_empty(), "GeoJSON contains no polygons");

    Ok(RegionBoundary::new(polygons))
}

/// Reject a legacy `crs` member which names anything other than WGS84
fn check_crs(value: &Value) -> Result<()> {
    let Some(crs) = value.get("crs") else {
        return Ok(());
    };

    let name = crs
        .pointer("/properties/name")
        .and_then(Value::as_str)
        .context("Unrecognised crs member")?;
    if !WGS84_CRS_NAMES.contains(&name) {
        bail!("Unsupported coordinate reference system {name} (only EPSG:4326 is supported)");
    }

    Ok(())
}

fn polygon_from_rings(rings: Vec<Vec<Position>>) -> Result<Polygon> {
    let mut rings = rings.into_iter().map(ring_from_positions);
    let exterior = rings.next().context("Polygon has no rings")??;
    let holes = rings.collect::<Result<_>>()?;

    Ok(Polygon { exterior, holes })
}

fn ring_from_positions(positions: Vec<Position>) -> Result<Vec<Point>> {
    ensure!(positions.len() >= 3, "Polygon ring has fewer than 3 positions");
    positions
        .into_iter()
        .map(|position| match position[..] {
            [lon, lat, ..] => Ok((lon, lat)),
            _ => bail!("Position has fewer than 2 coordinates"),
        })
        .collect()
}
