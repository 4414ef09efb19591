use crate::model::PlacedItem;
use base64::{engine::general_purpose, Engine as _};
use std::fmt::Write as _;
use std::path::Path;

/// Shared style for every rendered document: transparent body, absolutely
/// positioned items so stacking follows input order (first = bottom).
const DOCUMENT_STYLE: &str = "\
body { margin: 0; overflow: hidden; background-color: transparent; } \
.overlay-item { position: absolute; user-select: none; }";

/// Render an ordered item list into a self-contained HTML document.
///
/// Image bytes are inlined as data URIs so the document needs no further
/// file access once handed to the overlay session. An unreadable path skips
/// that item with a warning instead of failing the whole render. Returns
/// `None` when nothing could be rendered.
pub fn render(items: &[PlacedItem]) -> Option<String> {
    let mut body = String::new();
    for item in items {
        let path = Path::new(&item.path);
        let bytes = match std::fs::read(path) {
            Ok(b) => b,
            Err(e) => {
                tracing::warn!("skipping unreadable overlay image {}: {e}", item.path);
                continue;
            }
        };
        let encoded = general_purpose::STANDARD.encode(&bytes);
        let _ = write!(
            body,
            "<img class=\"overlay-item\" style=\"left: {}%; top: {}%; width: {}px; height: {}px; transform: rotate({}deg);\" src=\"data:{};base64,{}\">",
            item.left,
            item.top,
            item.width,
            item.height,
            item.rotation,
            mime_type(path),
            encoded
        );
    }
    if body.is_empty() {
        return None;
    }
    Some(format!(
        "<!DOCTYPE html>\n<html>\n  <head>\n    <style>{DOCUMENT_STYLE}</style>\n  </head>\n  <body>{body}</body>\n</html>\n"
    ))
}

/// MIME type for an image path, resolved from the file extension. Unknown
/// or missing extensions fall back to PNG.
fn mime_type(path: &Path) -> &'static str {
    path.extension()
        .and_then(image::ImageFormat::from_extension)
        .map(|f| f.to_mime_type())
        .unwrap_or("image/png")
}
