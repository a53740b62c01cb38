use super::popup::{Markup, PopupRenderer};
use crate::geo::Coordinate;
use crate::state::{CustomerType, LocationRecord};

/// Initial zoom of the customer network map
pub const DEFAULT_ZOOM: u8 = 15;

/// Radius of each point in the density overlay
pub const HEAT_RADIUS: u32 = 15;

/// Marker colors. Unknown customer types fall back to `Gray`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerColor {
    Red,
    Orange,
    Green,
    Blue,
    Gray,
}

impl MarkerColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarkerColor::Red => "red",
            MarkerColor::Orange => "orange",
            MarkerColor::Green => "green",
            MarkerColor::Blue => "blue",
            MarkerColor::Gray => "gray",
        }
    }
}

pub fn marker_color(customer_type: &CustomerType) -> MarkerColor {
    match customer_type {
        CustomerType::Vip => MarkerColor::Red,
        CustomerType::Prospect => MarkerColor::Orange,
        CustomerType::Existing => MarkerColor::Green,
        CustomerType::Repeat => MarkerColor::Blue,
        CustomerType::Unknown(_) => MarkerColor::Gray,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub position: Coordinate,
    pub color: MarkerColor,
    /// Plain text; escaped by whatever renders it
    pub tooltip: String,
    pub popup: Markup,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapState {
    pub center: Coordinate,
    pub zoom: u8,
    pub markers: Vec<Marker>,
    pub heat_points: Vec<Coordinate>,
    pub heat_radius: u32,
}

/// What a view request produces. There is no meaningful center for zero
/// records, so an empty set gets its own state instead of a map.
#[derive(Debug, Clone, PartialEq)]
pub enum MapView {
    Empty,
    Map(MapState),
}

/// Arithmetic mean of all latitudes and of all longitudes.
/// `None` for an empty record set.
pub fn centroid(records: &[LocationRecord]) -> Option<Coordinate> {
    if records.is_empty() {
        return None;
    }

    let (lat_sum, lon_sum) = records.iter().fold((0.0, 0.0), |(lat, lon), r| {
        (lat + r.coordinate.lat, lon + r.coordinate.lon)
    });
    let n = records.len() as f64;

    Some(Coordinate {
        lat: lat_sum / n,
        lon: lon_sum / n,
    })
}

/// Raw, unweighted coordinates of every record
pub fn build_heat_layer(records: &[LocationRecord]) -> Vec<Coordinate> {
    records.iter().map(|r| r.coordinate).collect()
}

/// Builds the full map state from a freshly loaded record set.
pub struct MapAssembler<'a> {
    popups: PopupRenderer<'a>,
    zoom: u8,
    heat_radius: u32,
}

impl<'a> MapAssembler<'a> {
    pub fn new(popups: PopupRenderer<'a>) -> Self {
        Self {
            popups,
            zoom: DEFAULT_ZOOM,
            heat_radius: HEAT_RADIUS,
        }
    }

    pub fn with_zoom(mut self, zoom: u8) -> Self {
        self.zoom = zoom;
        self
    }

    pub fn with_heat_radius(mut self, heat_radius: u32) -> Self {
        self.heat_radius = heat_radius;
        self
    }

    pub fn build_markers(&self, records: &[LocationRecord]) -> Vec<Marker> {
        records
            .iter()
            .map(|record| Marker {
                position: record.coordinate,
                color: marker_color(&record.customer_type),
                tooltip: record.name.clone(),
                popup: self.popups.render(record),
            })
            .collect()
    }

    /// Pure function of `records`; callers re-run it on every view.
    pub fn assemble(&self, records: &[LocationRecord]) -> MapView {
        let Some(center) = centroid(records) else {
            return MapView::Empty;
        };

        MapView::Map(MapState {
            center,
            zoom: self.zoom,
            markers: self.build_markers(records),
            heat_points: build_heat_layer(records),
            heat_radius: self.heat_radius,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{AssetPath, Thumbnail, ThumbnailSource};
    use crate::state::RecordId;
    use chrono::Utc;

    struct NoThumbnails;

    impl ThumbnailSource for NoThumbnails {
        fn thumbnail(&self, _path: &AssetPath, _max_dim: u32) -> Thumbnail {
            Thumbnail::Placeholder
        }
    }

    fn record(id: i64, customer_type: CustomerType, lat: f64, lon: f64) -> LocationRecord {
        LocationRecord {
            id: RecordId(id),
            name: format!("customer {id}"),
            phone: "012".to_string(),
            customer_type,
            address: None,
            notes: None,
            coordinate: Coordinate { lat, lon },
            image_path: None,
            created_at: Utc::now(),
        }
    }

    fn assert_close(actual: Coordinate, lat: f64, lon: f64) {
        assert!((actual.lat - lat).abs() < 1e-9, "lat {} != {}", actual.lat, lat);
        assert!((actual.lon - lon).abs() < 1e-9, "lon {} != {}", actual.lon, lon);
    }

    #[test]
    fn test_centroid_of_empty_set_is_none() {
        assert_eq!(centroid(&[]), None);
    }

    #[test]
    fn test_centroid_of_single_record_is_its_coordinate() {
        let records = [record(1, CustomerType::Vip, 11.55, 104.91)];
        assert_eq!(centroid(&records), Some(Coordinate { lat: 11.55, lon: 104.91 }));
    }

    #[test]
    fn test_centroid_is_mean() {
        let records = [
            record(1, CustomerType::Vip, 11.0, 104.0),
            record(2, CustomerType::Vip, 11.5, 104.5),
            record(3, CustomerType::Vip, 12.0, 105.0),
        ];
        assert_close(centroid(&records).unwrap(), 11.5, 104.5);
    }

    #[test]
    fn test_marker_colors() {
        assert_eq!(marker_color(&CustomerType::Vip), MarkerColor::Red);
        assert_eq!(marker_color(&CustomerType::Prospect), MarkerColor::Orange);
        assert_eq!(marker_color(&CustomerType::Existing), MarkerColor::Green);
        assert_eq!(marker_color(&CustomerType::Repeat), MarkerColor::Blue);
        assert_eq!(
            marker_color(&CustomerType::Unknown("Wholesale".to_string())),
            MarkerColor::Gray
        );
        assert_eq!(MarkerColor::Gray.as_str(), "gray");
    }

    #[test]
    fn test_assemble_empty_set() {
        let popups = PopupRenderer::new(&NoThumbnails, 64);
        assert_eq!(MapAssembler::new(popups).assemble(&[]), MapView::Empty);
    }

    #[test]
    fn test_assemble_builds_one_marker_and_heat_point_per_record() {
        let records = [
            record(1, CustomerType::Prospect, 10.0, 100.0),
            record(2, CustomerType::Unknown("Partner".to_string()), 20.0, 110.0),
        ];
        let popups = PopupRenderer::new(&NoThumbnails, 64);

        let MapView::Map(state) = MapAssembler::new(popups).with_zoom(12).assemble(&records) else {
            panic!("expected a map");
        };

        assert_close(state.center, 15.0, 105.0);
        assert_eq!(state.zoom, 12);
        assert_eq!(state.heat_radius, HEAT_RADIUS);
        assert_eq!(state.heat_points, vec![records[0].coordinate, records[1].coordinate]);

        let colors: Vec<MarkerColor> = state.markers.iter().map(|m| m.color).collect();
        assert_eq!(colors, vec![MarkerColor::Orange, MarkerColor::Gray]);
        assert_eq!(state.markers[1].tooltip, "customer 2");
        assert_eq!(state.markers[1].position, records[1].coordinate);
        assert!(state.markers[1].popup.as_str().contains("<b>customer 2</b>"));
    }
}
