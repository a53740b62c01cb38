/// Map layer
///
/// This module turns the stored record set into something to look at:
/// - Centroid, markers and density overlay (assembler.rs)
/// - Escaped popup markup per record (popup.rs)
/// - The standalone Leaflet page (document.rs)

pub mod assembler;
pub mod document;
pub mod popup;

pub use assembler::{
    build_heat_layer, centroid, marker_color, MapAssembler, MapState, MapView, Marker,
    MarkerColor, DEFAULT_ZOOM, HEAT_RADIUS,
};
pub use document::render_document;
pub use popup::{escape_html, MapLink, Markup, MarkupBuilder, PopupRenderer};
