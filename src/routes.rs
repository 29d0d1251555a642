//! Route geometry for the voyage calculator. Every voyage has a route id and every route id has an
//! ordered list of waypoints that draws the route on the map.
//! Date: 2025-06-12

use crate::*;   // To use everything from the crate

use geo::Length as _;   // Line string length in a metric space
use serde::{Deserialize, Serialize};
use std::{fs, io, path::Path};

// Structs and Enums
//----------------------------------------------------
/// One point of a route
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteWaypoint {
    pub route_id: u32,
    /// Longitude in degrees
    pub lon: f64,
    /// Latitude in degrees
    pub lat: f64,
}

impl RouteWaypoint {
    pub fn point(&self) -> geo::Point {
        return geo::Point::new(self.lon, self.lat);
    }
}

/// A connected line through the waypoints of one route, in stored order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutePolyline {
    pub route_id: u32,
    pub lon: Vec<f64>,
    pub lat: Vec<f64>,
}

impl RoutePolyline {
    pub fn len(&self) -> usize {
        self.lon.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lon.is_empty()
    }

    pub fn to_line_string(&self) -> geo::LineString {
        return self.lon.iter().zip(self.lat.iter()).map(|(lon, lat)| (*lon, *lat)).collect();
    }

    /// Length of the drawn line, measured the way the voyage was planned.
    /// Great circle legs are measured on the sphere, rhumb line legs along constant courses.
    pub fn length(&self, navigation: Navigation) -> uom::si::f64::Length {
        let line = self.to_line_string();
        let meters = match navigation {
            Navigation::GreatCircle => geo::Haversine.length(&line),
            Navigation::RhumbLine => geo::Rhumb.length(&line),
        };
        return uom::si::f64::Length::new::<uom::si::length::meter>(meters);
    }
}

/// All waypoints of all routes in the order they were stored
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteGeometry {
    waypoints: Vec<RouteWaypoint>,
}

// Implementation of the RouteGeometry struct
//----------------------------------------------------
impl RouteGeometry {
    pub fn new(waypoints: Vec<RouteWaypoint>) -> RouteGeometry {
        RouteGeometry { waypoints }
    }

    /// Reads route geometry from a semicolon delimited CSV with the header route_id;lon;lat.
    /// Row order is kept, it is the drawing order of each route.
    pub fn from_reader<R: io::Read>(reader: R) -> Result<RouteGeometry> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(b';')
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers = csv_reader.headers()?.clone();

        let mut waypoints: Vec<RouteWaypoint> = Vec::new();
        let mut raw = csv::StringRecord::new();
        while csv_reader.read_record(&mut raw)? {
            let line = raw.position().map_or(0, |position| position.line());
            let waypoint: RouteWaypoint = raw.deserialize(Some(&headers))?;

            // Longitudes may be given as -180..180 or 0..360, routes crossing the antimeridian
            // are often stored in the latter so the line does not wrap around the map
            if !(-180.0..=360.0).contains(&waypoint.lon) || !(-90.0..=90.0).contains(&waypoint.lat) {
                return Err(Error::InvalidRecord {
                    line,
                    reason: format!("coordinate out of range: lon {}, lat {}", waypoint.lon, waypoint.lat),
                });
            }
            waypoints.push(waypoint);
        }

        let geometry = RouteGeometry::new(waypoints);
        log::info!("Loaded {} waypoints for {} routes", geometry.len(), geometry.route_ids().len());
        return Ok(geometry);
    }

    /// Reads route geometry from a CSV file, see [`RouteGeometry::from_reader`]
    pub fn from_path<P: AsRef<Path>>(file_path: P) -> Result<RouteGeometry> {
        let file = fs::File::open(file_path)?;
        return RouteGeometry::from_reader(io::BufReader::new(file));
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// Distinct route ids in order of first appearance
    pub fn route_ids(&self) -> Vec<u32> {
        let mut route_ids: Vec<u32> = Vec::new();
        for waypoint in &self.waypoints {
            if !route_ids.contains(&waypoint.route_id) {
                route_ids.push(waypoint.route_id);
            }
        }
        return route_ids;
    }

    /// Waypoints of one route in stored order
    pub fn waypoints(&self, route_id: u32) -> impl Iterator<Item = &RouteWaypoint> + '_ {
        self.waypoints.iter().filter(move |waypoint| waypoint.route_id == route_id)
    }

    /// One polyline per distinct route id among the waypoints of `route_id`.
    /// Empty when the route has no stored geometry.
    pub fn polylines(&self, route_id: u32) -> Vec<RoutePolyline> {
        return group_polylines(self.waypoints(route_id));
    }
}

// Helper functions
//----------------------------------------------------
/// Groups waypoints into polylines by route id. Groups come out in order of first appearance and
/// each keeps the relative order of its waypoints.
pub fn group_polylines<'a>(waypoints: impl Iterator<Item = &'a RouteWaypoint>) -> Vec<RoutePolyline> {
    let mut polylines: Vec<RoutePolyline> = Vec::new();
    for waypoint in waypoints {
        // Find the polyline of this route or start a new one
        let index = match polylines.iter().position(|polyline| polyline.route_id == waypoint.route_id) {
            Some(index) => index,
            None => {
                polylines.push(RoutePolyline { route_id: waypoint.route_id, lon: Vec::new(), lat: Vec::new() });
                polylines.len() - 1
            }
        };
        polylines[index].lon.push(waypoint.lon);
        polylines[index].lat.push(waypoint.lat);
    }
    return polylines;
}

// Tests
//----------------------------------------------------
#[cfg(test)]
mod tests {
    use super::*;

    fn waypoint(route_id: u32, lon: f64, lat: f64) -> RouteWaypoint {
        RouteWaypoint { route_id, lon, lat }
    }

    #[test]
    fn polylines_keep_stored_order() {
        // Route 1 is interleaved with route 2 on purpose
        let geometry = RouteGeometry::new(vec![
            waypoint(1, -79.9, 9.3),
            waypoint(2, 0.0, 0.0),
            waypoint(1, -120.0, 20.0),
            waypoint(1, 140.7, 35.9),
            waypoint(2, 1.0, 1.0),
        ]);
        let polylines = geometry.polylines(1);
        assert_eq!(polylines.len(), 1);
        assert_eq!(polylines[0].route_id, 1);
        assert_eq!(polylines[0].lon, vec![-79.9, -120.0, 140.7]);
        assert_eq!(polylines[0].lat, vec![9.3, 20.0, 35.9]);
        assert_eq!(geometry.route_ids(), vec![1, 2]);
    }

    #[test]
    fn route_without_waypoints_has_no_polylines() {
        let geometry = RouteGeometry::new(vec![waypoint(1, 0.0, 0.0)]);
        assert!(geometry.polylines(9).is_empty());
        assert_eq!(geometry.waypoints(9).count(), 0);
    }

    #[test]
    fn grouping_splits_by_route_in_order_of_first_appearance() {
        let waypoints = [waypoint(3, 0.0, 0.0), waypoint(1, 5.0, 5.0), waypoint(3, 1.0, 1.0)];
        let polylines = group_polylines(waypoints.iter());
        assert_eq!(polylines.iter().map(|polyline| polyline.route_id).collect::<Vec<_>>(), vec![3, 1]);
        assert_eq!(polylines[0].len(), 2);
        assert_eq!(polylines[1].len(), 1);
    }

    #[test]
    fn csv_rows_keep_their_order() {
        let csv_text = "route_id;lon;lat\n0;-79.9;9.35\n0;-79.55;8.9\n1;129.0;35.1\n0;140.7;35.9\n";
        let geometry = RouteGeometry::from_reader(csv_text.as_bytes()).unwrap();
        assert_eq!(geometry.len(), 4);
        assert_eq!(geometry.polylines(0)[0].lon, vec![-79.9, -79.55, 140.7]);
    }

    #[test]
    fn csv_with_latitude_out_of_range_is_rejected() {
        let csv_text = "route_id;lon;lat\n0;-79.9;99.0\n";
        match RouteGeometry::from_reader(csv_text.as_bytes()) {
            Err(Error::InvalidRecord { line, .. }) => assert_eq!(line, 2),
            other => panic!("Expected an invalid record, got {:?}", other),
        }
    }

    #[test]
    fn csv_accepts_longitudes_past_the_antimeridian() {
        let csv_text = "route_id;lon;lat\n0;170.0;40.0\n0;200.0;30.0\n0;-160.0;20.0\n";
        let geometry = RouteGeometry::from_reader(csv_text.as_bytes()).unwrap();
        assert_eq!(geometry.polylines(0)[0].lon, vec![170.0, 200.0, -160.0]);

        let csv_text = "route_id;lon;lat\n0;361.0;40.0\n";
        assert!(matches!(RouteGeometry::from_reader(csv_text.as_bytes()), Err(Error::InvalidRecord { line: 2, .. })));
        let csv_text = "route_id;lon;lat\n0;-181.0;40.0\n";
        assert!(matches!(RouteGeometry::from_reader(csv_text.as_bytes()), Err(Error::InvalidRecord { line: 2, .. })));
    }

    #[test]
    fn great_circle_along_the_equator_matches_rhumb_line() {
        // Along the equator both metrics follow the same line
        let polyline = RoutePolyline { route_id: 0, lon: vec![0.0, 10.0, 20.0], lat: vec![0.0, 0.0, 0.0] };
        let great_circle = polyline.length(Navigation::GreatCircle).get::<uom::si::length::nautical_mile>();
        let rhumb_line = polyline.length(Navigation::RhumbLine).get::<uom::si::length::nautical_mile>();
        assert!((great_circle - rhumb_line).abs() < 1e-6);
        // 20 degrees of arc on a 6371 km sphere
        let expected = 6_371_008.8 * 20.0_f64.to_radians() / 1852.0;
        assert!((great_circle - expected).abs() < 1.0);
    }

    #[test]
    fn rhumb_line_is_longer_off_the_equator() {
        let polyline = RoutePolyline { route_id: 0, lon: vec![-120.0, 140.0], lat: vec![40.0, 40.0] };
        let great_circle = polyline.length(Navigation::GreatCircle);
        let rhumb_line = polyline.length(Navigation::RhumbLine);
        assert!(rhumb_line > great_circle);
    }
}
