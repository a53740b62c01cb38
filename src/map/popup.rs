/// Popup markup for map markers.
///
/// All markup goes through [`MarkupBuilder`]: tags are compile-time string
/// literals and every piece of record text passes through [`escape_html`], so
/// a customer's notes can't inject elements or scripts into the map page.

use serde::Serialize;

use crate::assets::{Thumbnail, ThumbnailSource};
use crate::geo::Coordinate;
use crate::state::LocationRecord;

/// Escape text for use in HTML element content or a quoted attribute value.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// An HTML fragment that is safe to embed verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Markup(String);

impl Markup {
    pub fn as_str(&self) -> &str {
        &self.0
    }

}

/// External map views offered for each customer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapLink {
    Standard,
    Satellite,
    StreetView,
}

impl MapLink {
    pub const ALL: [MapLink; 3] = [MapLink::Standard, MapLink::Satellite, MapLink::StreetView];

    pub fn label(&self) -> &'static str {
        match self {
            MapLink::Standard => "Standard",
            MapLink::Satellite => "Satellite",
            MapLink::StreetView => "Street View",
        }
    }

    /// Google Maps URL centered on `at`. Only the two numbers vary.
    pub fn url(&self, at: Coordinate) -> String {
        let Coordinate { lat, lon } = at;
        match self {
            MapLink::Standard => format!("https://www.google.com/maps?q={lat},{lon}"),
            MapLink::Satellite => format!(
                "https://www.google.com/maps/@?api=1&map_action=map&basemap=satellite&zoom=15&center={lat},{lon}"
            ),
            MapLink::StreetView => format!("https://www.google.com/maps?layer=c&cbll={lat},{lon}"),
        }
    }
}

/// Builds [`Markup`]. There is no way to push unescaped text.
#[derive(Debug, Default)]
pub struct MarkupBuilder {
    buf: String,
}

impl MarkupBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(mut self, tag: &'static str) -> Self {
        self.buf.push('<');
        self.buf.push_str(tag);
        self.buf.push('>');
        self
    }

    pub fn open_with_class(mut self, tag: &'static str, class: &'static str) -> Self {
        self.buf.push_str(&format!("<{tag} class=\"{class}\">"));
        self
    }

    pub fn close(mut self, tag: &'static str) -> Self {
        self.buf.push_str("</");
        self.buf.push_str(tag);
        self.buf.push('>');
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.buf.push_str(&escape_html(text));
        self
    }

    pub fn line_break(mut self) -> Self {
        self.buf.push_str("<br>");
        self
    }

    /// `label` is a literal, `value` is record text
    pub fn field(self, label: &'static str, value: &str) -> Self {
        self.open("b").text(label).close("b").text(": ").text(value).line_break()
    }

    pub fn image(mut self, src: &str, width: u32, height: u32, alt: &str) -> Self {
        self.buf.push_str(&format!(
            "<img class=\"popup-thumb\" src=\"{}\" width=\"{}\" height=\"{}\" alt=\"{}\">",
            escape_html(src),
            width,
            height,
            escape_html(alt)
        ));
        self
    }

    /// Anchor opening `kind` for `at` in a new tab
    pub fn link(mut self, kind: MapLink, at: Coordinate) -> Self {
        self.buf.push_str(&format!(
            "<a href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\">",
            escape_html(&kind.url(at))
        ));
        self.text(kind.label()).close("a")
    }

    pub fn build(self) -> Markup {
        Markup(self.buf)
    }
}

/// Turns a record into the detail fragment shown when its marker is clicked.
pub struct PopupRenderer<'a> {
    thumbnails: &'a dyn ThumbnailSource,
    max_dim: u32,
}

impl<'a> PopupRenderer<'a> {
    pub fn new(thumbnails: &'a dyn ThumbnailSource, max_dim: u32) -> Self {
        Self { thumbnails, max_dim }
    }

    pub fn render(&self, record: &LocationRecord) -> Markup {
        let thumbnail = match &record.image_path {
            Some(path) => self.thumbnails.thumbnail(path, self.max_dim),
            None => Thumbnail::Placeholder,
        };

        let mut markup = match thumbnail {
            Thumbnail::Inline(image) => MarkupBuilder::new().image(
                &image.data_uri,
                image.width,
                image.height,
                &record.name,
            ),
            Thumbnail::Placeholder => MarkupBuilder::new()
                .open_with_class("div", "popup-thumb-placeholder")
                .text("No photo")
                .close("div"),
        };

        markup = markup
            .open("b")
            .text(&record.name)
            .close("b")
            .line_break()
            .field("Type", record.customer_type.as_str())
            .field("Phone", &record.phone)
            .field("Last visit", &record.last_visit());

        if let Some(address) = non_blank(&record.address) {
            markup = markup.field("Address", address);
        }

        markup = markup.open("b").text("Google Maps").close("b").text(": ");
        for (i, kind) in MapLink::ALL.into_iter().enumerate() {
            if i > 0 {
                markup = markup.text(" | ");
            }
            markup = markup.link(kind, record.coordinate);
        }
        markup = markup.line_break();

        if let Some(notes) = non_blank(&record.notes) {
            markup = markup.open("i").text(notes).close("i");
        }

        markup.build()
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{AssetPath, InlineImage};
    use crate::geo::Coordinate;
    use crate::state::{CustomerType, RecordId};
    use chrono::{TimeZone, Utc};

    struct FixedThumbnail(Thumbnail);

    impl ThumbnailSource for FixedThumbnail {
        fn thumbnail(&self, _path: &AssetPath, _max_dim: u32) -> Thumbnail {
            self.0.clone()
        }
    }

    fn record() -> LocationRecord {
        LocationRecord {
            id: RecordId(7),
            name: "Ana".to_string(),
            phone: "012".to_string(),
            customer_type: CustomerType::Vip,
            address: Some("St. 240".to_string()),
            notes: Some("rooftop shop".to_string()),
            coordinate: Coordinate { lat: 11.55, lon: 104.91 },
            image_path: None,
            created_at: Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap(),
        }
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn test_render_lists_fields() {
        let source = FixedThumbnail(Thumbnail::Placeholder);
        let popup = PopupRenderer::new(&source, 64).render(&record());
        let html = popup.as_str();

        assert!(html.starts_with("<div class=\"popup-thumb-placeholder\">No photo</div>"));
        assert!(html.contains("<b>Ana</b><br>"));
        assert!(html.contains("<b>Type</b>: VIP<br>"));
        assert!(html.contains("<b>Phone</b>: 012<br>"));
        assert!(html.contains("<b>Last visit</b>: 2025-01-02 03:04:05 UTC<br>"));
        assert!(html.contains("<b>Address</b>: St. 240<br>"));
        assert!(html.ends_with("<i>rooftop shop</i>"));
    }

    #[test]
    fn test_render_escapes_free_text() {
        let mut hostile = record();
        hostile.name = "<img src=x onerror=alert(1)>".to_string();
        hostile.address = Some("\"><svg onload=alert(2)>".to_string());
        hostile.notes = Some("<script>alert('x')</script>".to_string());

        let source = FixedThumbnail(Thumbnail::Placeholder);
        let popup = PopupRenderer::new(&source, 64).render(&hostile);
        let html = popup.as_str();

        assert!(!html.contains("<script>"));
        assert!(!html.contains("<img src=x"));
        assert!(!html.contains("<svg"));
        assert!(html.contains("&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt;"));
        assert!(html.contains("&lt;img src=x onerror=alert(1)&gt;"));
    }

    #[test]
    fn test_render_inline_thumbnail() {
        let mut with_photo = record();
        with_photo.image_path = Some(AssetPath::from("20250102_030405.jpg"));
        let source = FixedThumbnail(Thumbnail::Inline(InlineImage {
            width: 64,
            height: 32,
            data_uri: "data:image/jpeg;base64,AAAA".to_string(),
        }));

        let popup = PopupRenderer::new(&source, 64).render(&with_photo);
        let html = popup.as_str();

        assert!(html.starts_with(
            "<img class=\"popup-thumb\" src=\"data:image/jpeg;base64,AAAA\" width=\"64\" height=\"32\" alt=\"Ana\">"
        ));
        assert!(!html.contains("No photo"));
    }

    #[test]
    fn test_blank_optional_fields_are_omitted() {
        let mut sparse = record();
        sparse.address = Some("  ".to_string());
        sparse.notes = None;

        let source = FixedThumbnail(Thumbnail::Placeholder);
        let popup = PopupRenderer::new(&source, 64).render(&sparse);
        let html = popup.as_str();

        assert!(!html.contains("Address"));
        assert!(!html.contains("<i>"));
    }

    #[test]
    fn test_render_google_maps_links() {
        let source = FixedThumbnail(Thumbnail::Placeholder);
        let popup = PopupRenderer::new(&source, 64).render(&record());
        let html = popup.as_str();

        assert!(html.contains(
            "<a href=\"https://www.google.com/maps?q=11.55,104.91\" target=\"_blank\" rel=\"noopener noreferrer\">Standard</a>"
        ));
        assert!(html.contains(
            "href=\"https://www.google.com/maps/@?api=1&amp;map_action=map&amp;basemap=satellite&amp;zoom=15&amp;center=11.55,104.91\""
        ));
        assert!(html.contains(
            "href=\"https://www.google.com/maps?layer=c&amp;cbll=11.55,104.91\" target=\"_blank\" rel=\"noopener noreferrer\">Street View</a>"
        ));
        assert!(html.contains("Satellite</a> | <a"));
    }

    #[test]
    fn test_link_url_uses_only_the_coordinate() {
        let at = Coordinate { lat: -33.8688, lon: 151.2093 };

        assert_eq!(MapLink::Standard.url(at), "https://www.google.com/maps?q=-33.8688,151.2093");
        let markup = MarkupBuilder::new().link(MapLink::StreetView, at).build();
        assert_eq!(
            markup.as_str(),
            "<a href=\"https://www.google.com/maps?layer=c&amp;cbll=-33.8688,151.2093\" target=\"_blank\" rel=\"noopener noreferrer\">Street View</a>"
        );
    }
}
