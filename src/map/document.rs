/// Standalone Leaflet page for a [`MapView`].
///
/// The page is a fixed template; the map data is injected as one JSON value.
/// JSON is not HTML-safe inside a `<script>` element, so every `<` is written
/// as the `\u003c` escape, which parses to the same string in JSON and JS.

use serde_json::json;

use super::assembler::{MapState, MapView};
use super::popup::escape_html;
use crate::config::MapSettings;

const MAP_DATA_PLACEHOLDER: &str = "__MAP_DATA__";

pub const MAP_HTML: &str = r#"<!doctype html>
<html lang="en">

<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Customer Network Map</title>

  <!-- Leaflet 1.9.4 -->
  <link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css" crossorigin="" />
  <script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js" crossorigin=""></script>
  <!-- Leaflet.heat 0.2.0 -->
  <script src="https://unpkg.com/leaflet.heat@0.2.0/dist/leaflet-heat.js"></script>

  <style>
    html, body { height: 100%; margin: 0; }
    #map { position: absolute; inset: 0; }
    .popup-thumb { display: block; max-width: 100%; height: auto; margin-bottom: 6px; border-radius: 4px; }
    .popup-thumb-placeholder {
      display: flex; align-items: center; justify-content: center;
      width: 120px; height: 60px; margin-bottom: 6px;
      border-radius: 4px; background: #e5e7eb; color: #6b7280; font-size: 12px;
    }
  </style>
</head>

<body>
  <div id="map"></div>
  <script>
    const MAP_DATA = __MAP_DATA__;

    const map = L.map('map').setView([MAP_DATA.center.lat, MAP_DATA.center.lon], MAP_DATA.zoom);
    L.tileLayer(MAP_DATA.tiles.url, {
      maxZoom: 19,
      attribution: MAP_DATA.tiles.attribution,
    }).addTo(map);

    for (const m of MAP_DATA.markers) {
      L.circleMarker([m.lat, m.lon], {
        radius: 9,
        color: m.color,
        fillColor: m.color,
        fillOpacity: 0.85,
        weight: 2,
      })
        .bindTooltip(m.tooltip)
        .bindPopup(m.popup, { maxWidth: 300 })
        .addTo(map);
    }

    if (L.heatLayer) {
      L.heatLayer(MAP_DATA.heat.points, { radius: MAP_DATA.heat.radius }).addTo(map);
    }
  </script>
</body>

</html>
"#;

pub const EMPTY_HTML: &str = r#"<!doctype html>
<html lang="en">

<head>
  <meta charset="UTF-8" />
  <title>Customer Network Map</title>
  <style>
    body { font-family: system-ui, sans-serif; display: flex; height: 100vh; margin: 0;
           align-items: center; justify-content: center; color: #374151; }
  </style>
</head>

<body>
  <p>No customers in your network yet. Start by adding your first customer.</p>
</body>

</html>
"#;

/// Render the page for `view`.
pub fn render_document(view: &MapView, settings: &MapSettings) -> String {
    match view {
        MapView::Empty => EMPTY_HTML.to_string(),
        MapView::Map(state) => {
            let data = script_safe_json(&map_data(state, settings));
            MAP_HTML.replace(MAP_DATA_PLACEHOLDER, &data)
        }
    }
}

fn map_data(state: &MapState, settings: &MapSettings) -> serde_json::Value {
    let markers: Vec<serde_json::Value> = state
        .markers
        .iter()
        .map(|marker| {
            json!({
                "lat": marker.position.lat,
                "lon": marker.position.lon,
                "color": marker.color.as_str(),
                // Leaflet renders tooltip strings as HTML
                "tooltip": escape_html(&marker.tooltip),
                "popup": marker.popup,
            })
        })
        .collect();

    let heat_points: Vec<[f64; 2]> = state.heat_points.iter().map(|p| [p.lat, p.lon]).collect();

    json!({
        "center": state.center,
        "zoom": state.zoom,
        "tiles": {
            "url": settings.tile_url,
            "attribution": settings.tile_attribution,
        },
        "markers": markers,
        "heat": {
            "points": heat_points,
            "radius": state.heat_radius,
        },
    })
}

fn script_safe_json(value: &serde_json::Value) -> String {
    // `<` only ever appears inside JSON strings
    value.to_string().replace('<', "\\u003c")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Coordinate;
    use crate::map::assembler::{Marker, MarkerColor};
    use crate::map::popup::MarkupBuilder;

    fn state_with_notes(notes: &str) -> MapState {
        let position = Coordinate { lat: 11.55, lon: 104.91 };
        MapState {
            center: position,
            zoom: 15,
            markers: vec![Marker {
                position,
                color: MarkerColor::Red,
                tooltip: "Ana <b>".to_string(),
                popup: MarkupBuilder::new().text(notes).build(),
            }],
            heat_points: vec![position],
            heat_radius: 15,
        }
    }

    fn embedded_json(html: &str) -> serde_json::Value {
        let start = html.find("const MAP_DATA = ").unwrap() + "const MAP_DATA = ".len();
        let end = start + html[start..].find(";\n").unwrap();
        serde_json::from_str(&html[start..end]).unwrap()
    }

    #[test]
    fn test_empty_view_renders_notice() {
        let html = render_document(&MapView::Empty, &MapSettings::default());
        assert!(html.contains("No customers in your network yet"));
        assert!(!html.contains(MAP_DATA_PLACEHOLDER));
    }

    #[test]
    fn test_map_view_embeds_markers_and_heat() {
        let html = render_document(&MapView::Map(state_with_notes("hi")), &MapSettings::default());
        assert!(!html.contains(MAP_DATA_PLACEHOLDER));

        let data = embedded_json(&html);
        assert_eq!(data["center"]["lat"], 11.55);
        assert_eq!(data["center"]["lon"], 104.91);
        assert_eq!(data["zoom"], 15);
        assert_eq!(data["markers"][0]["color"], "red");
        assert_eq!(data["markers"][0]["tooltip"], "Ana &lt;b&gt;");
        assert_eq!(data["heat"]["points"][0][0], 11.55);
        assert_eq!(data["heat"]["radius"], 15);
        assert_eq!(data["tiles"]["url"], MapSettings::default().tile_url);
    }

    #[test]
    fn test_script_terminators_are_neutralised() {
        let mut state = state_with_notes("x");
        state.markers[0].tooltip = "</script><script>alert(1)</script>".to_string();
        let settings = MapSettings {
            tile_attribution: "<!-- </script>".to_string(),
            ..MapSettings::default()
        };

        let html = render_document(&MapView::Map(state), &settings);

        // Only the template's own script elements close
        assert_eq!(html.matches("</script>").count(), 3);
        assert!(!html.contains("<!-- </"));
        assert_eq!(embedded_json(&html)["tiles"]["attribution"], "<!-- </script>");
    }
}
