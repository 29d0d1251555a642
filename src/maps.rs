//! Map selection for the voyage calculator.
//! Decides what the map shows for a selection: the route of the matching voyage, the pressure
//! layer, both, or a single fallback marker when there is nothing to locate.
//! Date: 2025-06-13

use crate::*;   // To use everything from the crate

use serde::Serialize;

// Constants
//----------------------------------------------------
/// Marker drawn when there is no route to show
pub const FALLBACK_MARKER: MapPoint = MapPoint { lon: -80.0, lat: 45.1 };

/// Where the map camera starts, between the Caribbean and the Pacific entrance of the canal
pub const DEFAULT_CENTER: MapPoint = MapPoint { lon: -85.00, lat: 8.93 };

pub const DEFAULT_ZOOM: u8 = 2;

/// Base map used when no Mapbox style is configured. Needs no access token.
pub const DEFAULT_MAP_STYLE: &str = "carto-darkmatter";

/// Base map styles plotly can draw. The carto, stamen, open-street-map and white-bg styles need
/// no access token, the others are Mapbox hosted.
pub const MAP_STYLES: [&str; 14] = [
    "carto-darkmatter", "carto-positron", "open-street-map", "stamen-terrain", "stamen-toner", "stamen-watercolor", "white-bg",
    "basic", "streets", "outdoors", "light", "dark", "satellite", "satellite-streets",
];

/// Pressure range the color scale spans, in Pa as labelled on the color bar
pub const PRESSURE_RANGE: (f64, f64) = (900.0, 1100.0);

/// Reversed Inferno, light yellow for low pressure through to black for high pressure
pub const INFERNO_REVERSED: [&str; 10] = [
    "#fcffa4", "#f7d13d", "#fb9b06", "#ed6925", "#cf4446", "#a52c60", "#781c6d", "#4a0c6b", "#1b0c41", "#000004",
];

// Structs and Enums
//----------------------------------------------------
/// A point on the map in degrees
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct MapPoint {
    pub lon: f64,
    pub lat: f64,
}

/// Continuous color scale of the pressure layer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColorScale {
    /// Evenly spaced colors from `min` to `max`
    pub colors: Vec<&'static str>,
    pub min: f64,
    pub max: f64,
    /// Color bar title
    pub label: &'static str,
    pub opacity: f64,
}

impl ColorScale {
    /// The scale the pressure layer is always drawn with
    pub fn pressure() -> ColorScale {
        ColorScale {
            colors: INFERNO_REVERSED.to_vec(),
            min: PRESSURE_RANGE.0,
            max: PRESSURE_RANGE.1,
            label: "Pa",
            opacity: 0.3,
        }
    }

    /// Color of the stop closest to `value`, values outside the scale take the end colors
    pub fn color_at(&self, value: f64) -> &'static str {
        let Some(last) = self.colors.len().checked_sub(1) else {
            return "";
        };
        let position = ((value - self.min) / (self.max - self.min)).clamp(0.0, 1.0);
        return self.colors[(position * last as f64).round() as usize];
    }

    /// The scale as [position, color] stops from 0 to 1
    pub fn stops(&self) -> Vec<(f64, &'static str)> {
        let last = self.colors.len().saturating_sub(1).max(1) as f64;
        return self.colors.iter().enumerate().map(|(i, color)| (i as f64 / last, *color)).collect();
    }
}

/// The pressure layer together with the scale it is colored by
#[derive(Debug, Clone, Serialize)]
pub struct ContourOverlay<'a> {
    pub contours: &'a ContourLayer,
    pub scale: ColorScale,
}

/// One route drawn as connected markers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteTrace {
    pub route_id: u32,
    pub lon: Vec<f64>,
    pub lat: Vec<f64>,
    /// Length of the drawn line in nautical miles, measured as the voyage navigates
    pub plotted_miles: f64,
}

impl RouteTrace {
    pub fn from_polyline(polyline: RoutePolyline, navigation: Navigation) -> RouteTrace {
        let plotted_miles = polyline.length(navigation).get::<uom::si::length::nautical_mile>();
        RouteTrace {
            route_id: polyline.route_id,
            lon: polyline.lon,
            lat: polyline.lat,
            plotted_miles,
        }
    }
}

/// What the map shows.
/// One variant per combination of "is there a route to draw" and "is the pressure layer on".
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MapState<'a> {
    /// Pressure layer on, nothing matched
    PressureOverlay { overlay: ContourOverlay<'a> },
    /// Pressure layer on with the matching route on top
    PressureOverlayWithRoute { overlay: ContourOverlay<'a>, routes: Vec<RouteTrace> },
    /// Minimal base map with the matching route
    Route { routes: Vec<RouteTrace> },
    /// Minimal base map with the fallback marker
    Unlocated { marker: MapPoint },
}

impl<'a> MapState<'a> {
    pub fn overlay(&self) -> Option<&ContourOverlay<'a>> {
        match self {
            MapState::PressureOverlay { overlay } | MapState::PressureOverlayWithRoute { overlay, .. } => Some(overlay),
            MapState::Route { .. } | MapState::Unlocated { .. } => None,
        }
    }

    /// Route traces, empty for the variants without a route
    pub fn routes(&self) -> &[RouteTrace] {
        match self {
            MapState::PressureOverlayWithRoute { routes, .. } | MapState::Route { routes } => routes,
            MapState::PressureOverlay { .. } | MapState::Unlocated { .. } => &[],
        }
    }

    pub fn marker(&self) -> Option<MapPoint> {
        match self {
            MapState::Unlocated { marker } => Some(*marker),
            _ => None,
        }
    }
}

/// Layout of the map figure that does not depend on the selection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapView {
    /// Base map style, one of [`MAP_STYLES`]
    pub style: String,
    /// Mapbox access token, only needed for Mapbox hosted styles
    pub access_token: Option<String>,
    pub center: MapPoint,
    pub zoom: u8,
    /// Figure height in pixels
    pub height: u32,
    pub title: String,
    pub background_color: String,
    pub font_color: String,
}

impl Default for MapView {
    fn default() -> Self {
        MapView {
            style: DEFAULT_MAP_STYLE.to_string(),
            access_token: None,
            center: DEFAULT_CENTER,
            zoom: DEFAULT_ZOOM,
            height: 400,
            title: "<b>Route Summary</b>".to_string(),
            background_color: "#30333D".to_string(),
            font_color: "#B2B2B2".to_string(),
        }
    }
}

impl MapView {
    pub fn with_style(mut self, style: &str, access_token: Option<String>) -> MapView {
        self.style = style.to_string();
        self.access_token = access_token;
        return self;
    }
}

// Functions
//----------------------------------------------------
/// Route traces of the voyage matching the selection, one per polyline of its route.
/// Empty when nothing matches or the matching route has no geometry.
pub fn route_traces(voyages: &VoyageTable, routes: &RouteGeometry, selection: &Selection) -> Vec<RouteTrace> {
    match voyages.lookup(selection) {
        Some(voyage) => routes
            .polylines(voyage.route_id)
            .into_iter()
            .map(|polyline| RouteTrace::from_polyline(polyline, voyage.navigation))
            .collect(),
        None => Vec::new(),
    }
}

/// Picks the map for a selection.
///
/// | route to draw | pressure layer | map                                  |
/// |---------------|----------------|--------------------------------------|
/// | no            | on             | pressure layer only                  |
/// | yes           | on             | pressure layer and route             |
/// | yes           | off            | route on the minimal base map        |
/// | no            | off            | fallback marker on the minimal map   |
///
/// A voyage whose route has no stored waypoints counts as "no route to draw", so the map falls
/// back to the marker (or the bare pressure layer) instead of an empty route.
pub fn select_map<'a>(voyages: &VoyageTable, routes: &RouteGeometry, contours: &'a ContourLayer, selection: &Selection) -> MapState<'a> {
    let traces = route_traces(voyages, routes, selection);

    return match (selection.overlay, traces.is_empty()) {
        (true, true) => MapState::PressureOverlay {
            overlay: ContourOverlay { contours, scale: ColorScale::pressure() },
        },
        (true, false) => MapState::PressureOverlayWithRoute {
            overlay: ContourOverlay { contours, scale: ColorScale::pressure() },
            routes: traces,
        },
        (false, false) => MapState::Route { routes: traces },
        (false, true) => MapState::Unlocated { marker: FALLBACK_MARKER },
    };
}
