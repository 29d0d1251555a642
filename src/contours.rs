//! Atmospheric pressure contours drawn as a colored layer under the routes.
//! The contours come from a GeoJSON FeatureCollection where every feature is a (multi)polygon with
//! the properties `level-value`, `level-index`, `title` and `stroke`.
//! Date: 2025-06-13

use crate::*;   // To use everything from the crate

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::{fs, io, path::Path};

// Structs and Enums
//----------------------------------------------------
/// One pressure band of the contour layer
#[derive(Debug, Clone, PartialEq)]
pub struct PressureContour {
    /// Pressure level the band is colored by
    pub level_value: f64,
    /// Index of the level in the contouring run, when the file has one
    pub level_index: Option<i64>,
    /// Hover text, e.g. "1010.00-1015.00 Pa"
    pub title: String,
    /// Stroke color the contouring tool assigned to the level, used as the outline of the band.
    /// Empty when the file has none.
    pub stroke: String,
    pub geometry: geo::MultiPolygon,
}

/// The whole contour layer, loaded once and shared read only
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContourLayer {
    contours: Vec<PressureContour>,
}

// GeoJSON as found in the contour file. Only what the layer needs is read.
#[derive(Debug, Deserialize)]
struct RawFeatureCollection {
    features: Vec<RawFeature>,
}

#[derive(Debug, Deserialize)]
struct RawFeature {
    geometry: Option<RawGeometry>,
    properties: RawProperties,
}

#[derive(Debug, Deserialize)]
struct RawProperties {
    #[serde(rename = "level-value")]
    level_value: f64,
    #[serde(rename = "level-index", default)]
    level_index: Option<i64>,
    #[serde(default)]
    title: String,
    #[serde(default)]
    stroke: String,
}

/// Positions are kept as plain arrays, altitude is allowed and ignored
type RawRing = Vec<Vec<f64>>;

#[derive(Debug, Deserialize)]
struct RawGeometry {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    coordinates: serde_json::Value,
}

/// Serialized form of a contour, a GeoJSON Feature whose id is its index in the layer
#[derive(Debug, Serialize)]
struct FeatureOut<'a> {
    #[serde(rename = "type")]
    type_: &'static str,
    id: usize,
    geometry: serde_json::Value,
    properties: PropertiesOut<'a>,
}

#[derive(Debug, Serialize)]
struct PropertiesOut<'a> {
    #[serde(rename = "level-value")]
    level_value: f64,
    #[serde(rename = "level-index", skip_serializing_if = "Option::is_none")]
    level_index: Option<i64>,
    title: &'a str,
    stroke: &'a str,
}

// Implementation of the ContourLayer struct
//----------------------------------------------------
impl ContourLayer {
    pub fn new(contours: Vec<PressureContour>) -> ContourLayer {
        ContourLayer { contours }
    }

    /// Reads the contour layer from GeoJSON.
    /// Features without geometry are skipped, anything that is not a (multi)polygon is an error.
    pub fn from_reader<R: io::Read>(reader: R) -> Result<ContourLayer> {
        let collection: RawFeatureCollection = serde_json::from_reader(reader)?;
        return ContourLayer::from_raw(collection);
    }

    /// Reads the contour layer from a GeoJSON string, see [`ContourLayer::from_reader`]
    pub fn from_geojson_str(geojson: &str) -> Result<ContourLayer> {
        let collection: RawFeatureCollection = serde_json::from_str(geojson)?;
        return ContourLayer::from_raw(collection);
    }

    /// Reads the contour layer from a GeoJSON file, see [`ContourLayer::from_reader`]
    pub fn from_path<P: AsRef<Path>>(file_path: P) -> Result<ContourLayer> {
        let file = fs::File::open(file_path)?;
        return ContourLayer::from_reader(io::BufReader::new(file));
    }

    fn from_raw(collection: RawFeatureCollection) -> Result<ContourLayer> {
        let mut contours: Vec<PressureContour> = Vec::with_capacity(collection.features.len());
        for (index, feature) in collection.features.into_iter().enumerate() {
            let geometry = match feature.geometry {
                Some(geometry) => raw_multi_polygon(index, geometry)?,
                None => {
                    log::warn!("Skipping contour feature {} without geometry", index);
                    continue;
                }
            };

            contours.push(PressureContour {
                level_value: feature.properties.level_value,
                level_index: feature.properties.level_index,
                title: feature.properties.title,
                stroke: feature.properties.stroke,
                geometry,
            });
        }

        log::info!("Loaded {} pressure contours", contours.len());
        return Ok(ContourLayer::new(contours));
    }

    pub fn contours(&self) -> &[PressureContour] {
        &self.contours
    }

    pub fn len(&self) -> usize {
        self.contours.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contours.is_empty()
    }

    /// Pressure level of every contour, in layer order
    pub fn levels(&self) -> Vec<f64> {
        return self.contours.iter().map(|contour| contour.level_value).collect();
    }

    /// Title of every contour, in layer order
    pub fn titles(&self) -> Vec<&str> {
        return self.contours.iter().map(|contour| contour.title.as_str()).collect();
    }

    /// The layer as a GeoJSON FeatureCollection, feature ids are the contour indices
    pub fn to_geojson(&self) -> serde_json::Value {
        let features: Vec<FeatureOut> = self
            .contours
            .iter()
            .enumerate()
            .map(|(id, contour)| FeatureOut {
                type_: "Feature",
                id,
                geometry: multi_polygon_to_geojson(&contour.geometry),
                properties: PropertiesOut {
                    level_value: contour.level_value,
                    level_index: contour.level_index,
                    title: &contour.title,
                    stroke: &contour.stroke,
                },
            })
            .collect();

        return json!({
            "type": "FeatureCollection",
            "features": features,
        });
    }
}

impl Serialize for ContourLayer {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_geojson().serialize(serializer)
    }
}

// Helper functions
//----------------------------------------------------
/// Reads a GeoJSON Polygon or MultiPolygon geometry as a multi polygon
fn raw_multi_polygon(index: usize, geometry: RawGeometry) -> Result<geo::MultiPolygon> {
    let invalid = |error: serde_json::Error| Error::InvalidGeometry { index, reason: error.to_string() };
    let polygons = match geometry.kind.as_str() {
        "Polygon" => {
            let rings: Vec<RawRing> = serde_json::from_value(geometry.coordinates).map_err(invalid)?;
            vec![raw_polygon(index, rings)?]
        }
        "MultiPolygon" => {
            let polygons: Vec<Vec<RawRing>> = serde_json::from_value(geometry.coordinates).map_err(invalid)?;
            polygons.into_iter().map(|rings| raw_polygon(index, rings)).collect::<Result<Vec<_>>>()?
        }
        other => {
            return Err(Error::InvalidGeometry { index, reason: format!("expected Polygon or MultiPolygon, got {}", other) });
        }
    };
    return Ok(geo::MultiPolygon::new(polygons));
}

/// Builds a polygon from GeoJSON rings, the first ring is the exterior
fn raw_polygon(index: usize, rings: Vec<RawRing>) -> Result<geo::Polygon> {
    let mut rings = rings.into_iter();
    let exterior = match rings.next() {
        Some(ring) => raw_line_string(index, ring)?,
        None => return Err(Error::InvalidGeometry { index, reason: "polygon without rings".to_string() }),
    };
    let interiors = rings.map(|ring| raw_line_string(index, ring)).collect::<Result<Vec<_>>>()?;
    return Ok(geo::Polygon::new(exterior, interiors));
}

fn raw_line_string(index: usize, ring: RawRing) -> Result<geo::LineString> {
    let mut coords: Vec<geo::Coord> = Vec::with_capacity(ring.len());
    for position in ring {
        if position.len() < 2 {
            return Err(Error::InvalidGeometry { index, reason: format!("position with {} values", position.len()) });
        }
        coords.push(geo::Coord { x: position[0], y: position[1] });
    }
    return Ok(geo::LineString::new(coords));
}

/// GeoJSON geometry object for a multi polygon
fn multi_polygon_to_geojson(multi_polygon: &geo::MultiPolygon) -> serde_json::Value {
    let ring_to_positions = |ring: &geo::LineString| -> Vec<[f64; 2]> { ring.coords().map(|coord| [coord.x, coord.y]).collect() };

    let polygons: Vec<Vec<Vec<[f64; 2]>>> = multi_polygon
        .iter()
        .map(|polygon| {
            std::iter::once(polygon.exterior())
                .chain(polygon.interiors().iter())
                .map(ring_to_positions)
                .collect()
        })
        .collect();

    return json!({
        "type": "MultiPolygon",
        "coordinates": polygons,
    });
}
