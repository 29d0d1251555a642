//! The dashboard ties the static datasets together and answers every selector change with the
//! four statistic strings and the map.
//! Date: 2025-06-16

use crate::*;   // To use everything from the crate

use serde::Serialize;
use std::path::Path;

/// File names looked up in the data directory
pub const VOYAGES_FILE: &str = "voyages.csv";
pub const ROUTES_FILE: &str = "routes.csv";
pub const CONTOURS_FILE: &str = "contour.geojson";

/// A value and its label for a radio selector
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    pub label: &'static str,
    pub value: &'static str,
}

/// Everything the page needs to build its selectors
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardOptions {
    pub navigation: Vec<SelectOption>,
    pub passage: Vec<SelectOption>,
    pub destination_ports: Vec<String>,
    pub bunker_ports: Vec<String>,
    /// Shown in the port dropdowns until a port is picked
    pub placeholder: &'static str,
    pub defaults: Selection,
}

/// The datasets, loaded once and never written to afterwards
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub voyages: VoyageTable,
    pub routes: RouteGeometry,
    pub contours: ContourLayer,
    pub view: MapView,
}

impl Dashboard {
    pub fn new(voyages: VoyageTable, routes: RouteGeometry, contours: ContourLayer, view: MapView) -> Dashboard {
        Dashboard { voyages, routes, contours, view }
    }

    /// Loads the datasets from `data_dir`.
    /// Routes and contours are required. The voyage table falls back to the builtin one when the
    /// directory has no voyages.csv.
    pub fn load<P: AsRef<Path>>(data_dir: P, view: MapView) -> Result<Dashboard> {
        let data_dir = data_dir.as_ref();

        let voyages = load_voyages(data_dir)?;
        let routes = RouteGeometry::from_path(data_dir.join(ROUTES_FILE))?;
        let contours = ContourLayer::from_path(data_dir.join(CONTOURS_FILE))?;

        // A voyage without geometry still works, the map just shows the fallback marker
        for voyage in voyages.records() {
            if routes.waypoints(voyage.route_id).next().is_none() {
                log::warn!("Route {} has no waypoints in {}", voyage.route_id, ROUTES_FILE);
            }
        }

        return Ok(Dashboard::new(voyages, routes, contours, view));
    }

    pub fn options(&self) -> DashboardOptions {
        DashboardOptions {
            navigation: Navigation::ALL.iter().map(|navigation| SelectOption { label: navigation.label(), value: navigation.code() }).collect(),
            passage: Passage::ALL.iter().map(|passage| SelectOption { label: passage.label(), value: passage.label() }).collect(),
            destination_ports: self.voyages.discharge_ports(),
            bunker_ports: self.voyages.bunker_ports(),
            placeholder: PORT_PLACEHOLDER,
            defaults: Selection::default(),
        }
    }

    /// The four statistic strings for a selection, "NA" in each when nothing matches
    pub fn summary(&self, selection: &Selection) -> VoyageSummary {
        return VoyageSummary::from_lookup(self.voyages.lookup(selection));
    }

    pub fn map(&self, selection: &Selection) -> MapState<'_> {
        return select_map(&self.voyages, &self.routes, &self.contours, selection);
    }

    /// plotly figure of the map for a selection
    pub fn figure(&self, selection: &Selection) -> plotly::Plot {
        return figure(&self.map(selection), &self.view);
    }
}

/// Voyage table from `data_dir`, or the builtin one when the directory has no voyages.csv
pub fn load_voyages<P: AsRef<Path>>(data_dir: P) -> Result<VoyageTable> {
    let data_dir = data_dir.as_ref();
    let voyages_path = data_dir.join(VOYAGES_FILE);
    if !voyages_path.exists() {
        log::info!("No {} in {}, using the builtin voyage table", VOYAGES_FILE, data_dir.display());
        return Ok(VoyageTable::builtin());
    }
    return VoyageTable::from_path(&voyages_path);
}

// Tests
//----------------------------------------------------
#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const CONTOURS: &str = r#"{"type": "FeatureCollection", "features": [
        {"type": "Feature", "geometry": {"type": "Polygon", "coordinates": [[[0, 0], [10, 0], [10, 10], [0, 0]]]}, "properties": {"level-value": 1010, "title": "1010 Pa"}}
    ]}"#;

    fn data_dir(with_voyages: bool) -> tempfile::TempDir {
        let directory = tempfile::tempdir().unwrap();
        fs::write(directory.path().join(ROUTES_FILE), "route_id;lon;lat\n0;-79.9;9.35\n0;140.7;35.9\n").unwrap();
        fs::write(directory.path().join(CONTOURS_FILE), CONTOURS).unwrap();
        if with_voyages {
            fs::write(
                directory.path().join(VOYAGES_FILE),
                "route;passage;bunker;discharge;navigation;miles;speed;bunker_price;bunker_consumption\n\
                 0;Panama Canal;Balboa;Kashima;GC;8500;6.0;400;600\n",
            )
            .unwrap();
        }
        return directory;
    }

    #[test]
    fn loads_builtin_voyages_when_the_csv_is_missing() {
        let directory = data_dir(false);
        let dashboard = Dashboard::load(directory.path(), MapView::default()).unwrap();
        assert_eq!(dashboard.voyages, VoyageTable::builtin());
        assert_eq!(dashboard.routes.len(), 2);
        assert_eq!(dashboard.contours.len(), 1);
    }

    #[test]
    fn loads_voyages_from_the_data_directory() {
        let directory = data_dir(true);
        let dashboard = Dashboard::load(directory.path(), MapView::default()).unwrap();
        assert_eq!(dashboard.voyages.len(), 1);
        let summary = dashboard.summary(&Selection::new("Balboa", "Kashima", "GC", "Panama Canal"));
        assert_eq!(summary.miles, "8,500");
        assert_eq!(summary.speed, "6.0");
    }

    #[test]
    fn missing_routes_file_is_an_io_error() {
        let directory = tempfile::tempdir().unwrap();
        fs::write(directory.path().join(CONTOURS_FILE), CONTOURS).unwrap();
        assert!(matches!(Dashboard::load(directory.path(), MapView::default()), Err(Error::Io(_))));
    }

    #[test]
    fn options_list_ports_and_defaults() {
        let directory = data_dir(false);
        let dashboard = Dashboard::load(directory.path(), MapView::default()).unwrap();
        let options = dashboard.options();
        assert_eq!(options.destination_ports, vec!["Kashima", "Qingdao"]);
        assert_eq!(options.bunker_ports, vec!["Busan", "Cristobal", "Kashima"]);
        assert_eq!(options.navigation[0], SelectOption { label: "Great Circle Navigation", value: "GC" });
        assert_eq!(options.passage[1], SelectOption { label: "Cape Horn", value: "Cape Horn" });
        assert_eq!(options.placeholder, "All");
        assert_eq!(options.defaults, Selection::default());
    }

    #[test]
    fn one_selection_gives_summary_and_map() {
        let directory = data_dir(false);
        let dashboard = Dashboard::load(directory.path(), MapView::default()).unwrap();
        let selection = Selection::new("Cristobal", "Kashima", "GC", "Panama Canal").with_overlay(true);

        let summary = dashboard.summary(&selection);
        assert_eq!(summary, VoyageSummary {
            speed: "6.1".to_string(),
            miles: "8,531".to_string(),
            consumption: "638".to_string(),
            price: "$425/MT".to_string(),
        });
        let map = dashboard.map(&selection);
        assert!(map.overlay().is_some());
        assert_eq!(map.routes().len(), 1);
        assert_eq!(dashboard.figure(&selection).data().len(), 2);
    }
}
