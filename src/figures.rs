//! Turns a map state into a plotly figure (data, layout and config) that the browser renders
//! with `Plotly.react`, or into a standalone HTML page.
//! Date: 2025-06-16

use crate::*;   // To use everything from the crate

use serde::Serialize;
use std::{fs, path::Path};

// Structs and Enums
//----------------------------------------------------
/// Choropleth on a mapbox subplot, one location per pressure contour.
/// plotly has no trace for this, so it is serialized as plotly.js expects it.
#[derive(Debug, Clone, Serialize)]
pub struct ChoroplethMapbox {
    #[serde(rename = "type")]
    r#type: &'static str,
    geojson: serde_json::Value,
    locations: Vec<usize>,
    z: Vec<f64>,
    #[serde(rename = "hovertext")]
    hover_text: Vec<String>,
    #[serde(rename = "hoverinfo")]
    hover_info: &'static str,
    #[serde(rename = "colorscale")]
    color_scale: Vec<(f64, &'static str)>,
    zmin: f64,
    zmax: f64,
    marker: ChoroplethMarker,
    #[serde(rename = "colorbar")]
    color_bar: ColorBar,
}

#[derive(Debug, Clone, Serialize)]
struct ChoroplethMarker {
    opacity: f64,
    line: ChoroplethLine,
}

/// Outline of each contour, colored with the stroke of its level
#[derive(Debug, Clone, Serialize)]
struct ChoroplethLine {
    width: f64,
    color: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
struct ColorBar {
    title: ColorBarTitle,
}

#[derive(Debug, Clone, Serialize)]
struct ColorBarTitle {
    text: &'static str,
}

impl ChoroplethMapbox {
    /// Choropleth of the pressure layer, colored by level and hovered by title
    pub fn from_overlay(overlay: &ContourOverlay) -> Box<ChoroplethMapbox> {
        let scale = &overlay.scale;

        // Contours without a stroke of their own are outlined in the color of their level
        let strokes: Vec<String> = overlay
            .contours
            .contours()
            .iter()
            .map(|contour| match contour.stroke.is_empty() {
                true => scale.color_at(contour.level_value).to_string(),
                false => contour.stroke.clone(),
            })
            .collect();

        Box::new(ChoroplethMapbox {
            r#type: "choroplethmapbox",
            geojson: overlay.contours.to_geojson(),
            locations: (0..overlay.contours.len()).collect(),
            z: overlay.contours.levels(),
            hover_text: overlay.contours.titles().into_iter().map(str::to_string).collect(),
            hover_info: "text",
            color_scale: scale.stops(),
            zmin: scale.min,
            zmax: scale.max,
            marker: ChoroplethMarker { opacity: scale.opacity, line: ChoroplethLine { width: 1.0, color: strokes } },
            color_bar: ColorBar { title: ColorBarTitle { text: scale.label } },
        })
    }
}

impl plotly::Trace for ChoroplethMapbox {
    fn to_json(&self) -> String {
        // Only strings and numbers, serializing cannot fail
        serde_json::to_string(self).unwrap_or_default()
    }
}

// Functions
//----------------------------------------------------
/// plotly base map style for a style name, None for names plotly does not know
pub fn mapbox_style(name: &str) -> Option<plotly::layout::MapboxStyle> {
    use plotly::layout::MapboxStyle;

    let style = match name {
        "carto-darkmatter" => MapboxStyle::CartoDarkMatter,
        "carto-positron" => MapboxStyle::CartoPositron,
        "open-street-map" => MapboxStyle::OpenStreetMap,
        "stamen-terrain" => MapboxStyle::StamenTerrain,
        "stamen-toner" => MapboxStyle::StamenToner,
        "stamen-watercolor" => MapboxStyle::StamenWatercolor,
        "white-bg" => MapboxStyle::WhiteBg,
        "basic" => MapboxStyle::Basic,
        "streets" => MapboxStyle::Streets,
        "outdoors" => MapboxStyle::Outdoors,
        "light" => MapboxStyle::Light,
        "dark" => MapboxStyle::Dark,
        "satellite" => MapboxStyle::Satellite,
        "satellite-streets" => MapboxStyle::SatelliteStreets,
        _ => return None,
    };
    return Some(style);
}

/// Builds the plotly figure for a map state
pub fn figure(map: &MapState, view: &MapView) -> plotly::Plot {
    let mut plot = plotly::Plot::new();

    // Pressure layer first so the routes are drawn on top of it
    if let Some(overlay) = map.overlay() {
        plot.add_trace(ChoroplethMapbox::from_overlay(overlay));
    }
    for route in map.routes() {
        plot.add_trace(
            plotly::ScatterMapbox::new(route.lat.clone(), route.lon.clone())
                .mode(plotly::common::Mode::LinesMarkers)
                .name(format!("Route {}", route.route_id))
                .hover_template(format!("Route {} (%{{lat:.2f}}, %{{lon:.2f}})<extra>{:.0} NM plotted</extra>", route.route_id, route.plotted_miles)),
        );
    }
    if let Some(marker) = map.marker() {
        plot.add_trace(plotly::ScatterMapbox::new(vec![marker.lat], vec![marker.lon]).mode(plotly::common::Mode::Markers));
    }

    plot.set_layout(layout(view));
    plot.set_configuration(
        plotly::Configuration::new()
            .display_logo(false)
            .mode_bar_buttons_to_remove(vec![plotly::configuration::ModeBarButtonName::AutoScale2d])
            .responsive(true),
    );
    return plot;
}

/// Layout shared by every map
fn layout(view: &MapView) -> plotly::Layout {
    let style = match mapbox_style(&view.style) {
        Some(style) => style,
        None => {
            log::warn!("Unknown map style \"{}\", using {}", view.style, DEFAULT_MAP_STYLE);
            plotly::layout::MapboxStyle::CartoDarkMatter
        }
    };
    let mut mapbox = plotly::layout::Mapbox::new()
        .style(style)
        .center(plotly::layout::Center::new(view.center.lat, view.center.lon))
        .zoom(view.zoom);
    if let Some(token) = &view.access_token {
        mapbox = mapbox.access_token(token);
    }

    return plotly::Layout::new()
        .height(view.height as usize)
        .paper_background_color(view.background_color.clone())
        .plot_background_color(view.background_color.clone())
        .margin(plotly::layout::Margin::new().left(10).right(10).bottom(10).top(40))
        .hover_mode(plotly::layout::HoverMode::Closest)
        .font(plotly::common::Font::new().family("HelveticaNeue").size(17).color(view.font_color.clone()))
        .legend(
            plotly::layout::Legend::new()
                .font(plotly::common::Font::new().size(10))
                .orientation(plotly::common::Orientation::Horizontal),
        )
        .title(view.title.as_str())
        .mapbox(mapbox)
        .show_legend(false);
}

/// Saves a figure as a standalone HTML page, overwriting any file at `file_path`
pub fn write_html<P: AsRef<Path>>(plot: &plotly::Plot, file_path: P) -> Result<()> {
    // plotly's own write_html panics on I/O errors
    fs::write(file_path, plot.to_html())?;
    return Ok(());
}

// Tests
//----------------------------------------------------
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn datasets() -> (VoyageTable, RouteGeometry, ContourLayer) {
        let routes = RouteGeometry::new(vec![
            RouteWaypoint { route_id: 0, lon: -79.9, lat: 9.35 },
            RouteWaypoint { route_id: 0, lon: 140.7, lat: 35.9 },
        ]);
        let contours = ContourLayer::from_geojson_str(
            r##"{"type": "FeatureCollection", "features": [
                {"type": "Feature", "geometry": {"type": "Polygon", "coordinates": [[[0, 0], [10, 0], [10, 10], [0, 0]]]}, "properties": {"level-value": 1010, "title": "1010 Pa", "stroke": "#ed6925"}},
                {"type": "Feature", "geometry": {"type": "Polygon", "coordinates": [[[20, 0], [30, 0], [30, 10], [20, 0]]]}, "properties": {"level-value": 900, "title": "900 Pa"}}
            ]}"##,
        )
        .unwrap();
        return (VoyageTable::builtin(), routes, contours);
    }

    fn to_json(plot: &plotly::Plot) -> serde_json::Value {
        serde_json::to_value(plot).unwrap()
    }

    #[test]
    fn route_over_pressure_layer() {
        let (voyages, routes, contours) = datasets();
        let selection = Selection::new("Cristobal", "Kashima", "GC", "Panama Canal").with_overlay(true);
        let map = select_map(&voyages, &routes, &contours, &selection);
        let plot = to_json(&figure(&map, &MapView::default()));

        let data = plot["data"].as_array().unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data[0]["type"], "choroplethmapbox");
        assert_eq!(data[0]["locations"], json!([0, 1]));
        assert_eq!(data[0]["z"], json!([1010.0, 900.0]));
        assert_eq!(data[0]["hovertext"], json!(["1010 Pa", "900 Pa"]));
        assert_eq!(data[0]["zmin"], 900.0);
        assert_eq!(data[0]["zmax"], 1100.0);
        assert_eq!(data[0]["colorbar"]["title"]["text"], "Pa");
        assert_eq!(data[0]["marker"]["opacity"], 0.3);
        assert_eq!(data[0]["colorscale"][0], json!([0.0, "#fcffa4"]));
        assert_eq!(data[0]["geojson"]["features"][1]["id"], 1);
        assert_eq!(data[1]["type"], "scattermapbox");
        assert_eq!(data[1]["mode"], "lines+markers");
        assert_eq!(data[1]["lon"], json!([-79.9, 140.7]));
        assert_eq!(data[1]["lat"], json!([9.35, 35.9]));
    }

    #[test]
    fn contour_outlines_use_their_stroke() {
        let (voyages, routes, contours) = datasets();
        let selection = Selection::default().with_overlay(true);
        let map = select_map(&voyages, &routes, &contours, &selection);
        let plot = to_json(&figure(&map, &MapView::default()));

        // The second contour has no stroke and falls back to the color of its level
        assert_eq!(plot["data"][0]["marker"]["line"]["color"], json!(["#ed6925", "#fcffa4"]));
    }

    #[test]
    fn fallback_marker_figure() {
        let (voyages, routes, contours) = datasets();
        let map = select_map(&voyages, &routes, &contours, &Selection::new("Unknown", "Nowhere", "GC", "Cape Horn"));
        let plot = to_json(&figure(&map, &MapView::default()));

        let data = plot["data"].as_array().unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(data[0]["type"], "scattermapbox");
        assert_eq!(data[0]["mode"], "markers");
        assert_eq!(data[0]["lat"], json!([45.1]));
        assert_eq!(data[0]["lon"], json!([-80.0]));
    }

    #[test]
    fn layout_follows_the_view() {
        let (voyages, routes, contours) = datasets();
        let map = select_map(&voyages, &routes, &contours, &Selection::default());

        let plot = to_json(&figure(&map, &MapView::default()));
        assert_eq!(plot["layout"]["height"], 400);
        assert_eq!(plot["layout"]["paper_bgcolor"], "#30333D");
        assert_eq!(plot["layout"]["title"]["text"], "<b>Route Summary</b>");
        assert_eq!(plot["layout"]["showlegend"], false);
        assert_eq!(plot["layout"]["mapbox"]["style"], DEFAULT_MAP_STYLE);
        assert_eq!(plot["layout"]["mapbox"]["center"]["lon"], -85.0);
        assert_eq!(plot["layout"]["mapbox"]["center"]["lat"], 8.93);
        assert_eq!(plot["layout"]["mapbox"]["zoom"], 2);
        assert!(plot["layout"]["mapbox"].get("accesstoken").is_none());
        assert_eq!(plot["config"]["displaylogo"], false);
        assert_eq!(plot["config"]["modeBarButtonsToRemove"], json!(["autoScale2d"]));

        let view = MapView::default().with_style("satellite-streets", Some("pk.test".to_string()));
        let plot = to_json(&figure(&map, &view));
        assert_eq!(plot["layout"]["mapbox"]["style"], "satellite-streets");
        assert_eq!(plot["layout"]["mapbox"]["accesstoken"], "pk.test");
    }

    #[test]
    fn unknown_style_falls_back_to_the_default() {
        let (voyages, routes, contours) = datasets();
        let map = select_map(&voyages, &routes, &contours, &Selection::default());
        let view = MapView::default().with_style("mapbox://styles/someone/route", None);
        assert!(mapbox_style(&view.style).is_none());

        let plot = to_json(&figure(&map, &view));
        assert_eq!(plot["layout"]["mapbox"]["style"], "carto-darkmatter");
    }

    #[test]
    fn every_listed_style_is_known() {
        for name in MAP_STYLES {
            assert!(mapbox_style(name).is_some(), "{} is not a plotly style", name);
        }
    }

    #[test]
    fn html_export_embeds_the_figure() {
        let (voyages, routes, contours) = datasets();
        let map = select_map(&voyages, &routes, &contours, &Selection::new("Cristobal", "Kashima", "GC", "Panama Canal"));
        let plot = figure(&map, &MapView::default());

        let directory = tempfile::tempdir().unwrap();
        let file_path = directory.path().join("route.html");
        write_html(&plot, &file_path).unwrap();

        let html = fs::read_to_string(&file_path).unwrap();
        assert!(html.contains("Plotly.newPlot"));
        assert!(html.contains("scattermapbox"));
    }

    #[test]
    fn contour_title_cannot_close_the_script() {
        let contours_with_title = |title: &str| {
            let feature = json!({"type": "Feature", "geometry": {"type": "Polygon", "coordinates": [[[0, 0], [10, 0], [10, 10], [0, 0]]]}, "properties": {"level-value": 1010, "title": title}});
            ContourLayer::from_geojson_str(&json!({"type": "FeatureCollection", "features": [feature]}).to_string()).unwrap()
        };
        let page = |contours: &ContourLayer| {
            let map = select_map(&VoyageTable::builtin(), &RouteGeometry::default(), contours, &Selection::default().with_overlay(true));
            figure(&map, &MapView::default()).to_html()
        };

        let plain = page(&contours_with_title("1010 Pa"));
        let hostile = page(&contours_with_title("</script><b>x"));
        assert_eq!(hostile.matches("</script>").count(), plain.matches("</script>").count());
    }
}
