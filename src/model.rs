use serde::{Deserialize, Serialize};

/// A single imported image. The file behind `path` lives inside the store's
/// gallery directory and is owned by the store: it is created on import and
/// removed together with the record on deletion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GalleryItem {
    pub id: String,
    pub path: String,
}

/// One positioned image inside an overlay arrangement. Offsets are
/// percentages of the primary display, sizes are pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedItem {
    pub path: String,
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
    /// Rotation in degrees. Defaults to `0` when the field is missing so
    /// arrangements saved before rotation existed keep loading.
    #[serde(default)]
    pub rotation: f64,
    /// Back-reference to the gallery record this item was placed from.
    /// Used to invalidate preset entries when the record is deleted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gallery_id: Option<String>,
}

/// A named, ordered arrangement of placed items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub id: String,
    pub name: String,
    pub items: Vec<PlacedItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Register the application as a login item.
    #[serde(default)]
    pub start_on_startup: bool,
    /// Re-apply the last overlay when launched in the background.
    #[serde(default = "default_load_last_preset")]
    pub load_last_preset: bool,
    /// When enabled the application initialises the logger at debug level.
    /// Defaults to `false` when the field is missing in the state file.
    #[serde(default)]
    pub debug_logging: bool,
}

fn default_load_last_preset() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            start_on_startup: false,
            load_last_preset: true,
            debug_logging: false,
        }
    }
}

/// The single persisted aggregate. Serialized as one pretty-printed JSON
/// document; missing fields fall back to their defaults on load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppState {
    pub gallery: Vec<GalleryItem>,
    pub presets: Vec<Preset>,
    pub settings: Settings,
    pub last_applied_overlay_items: Vec<PlacedItem>,
}

#[cfg(test)]
mod tests {
    use super::{PlacedItem, Settings};

    #[test]
    fn placed_item_defaults_rotation_and_gallery_id() {
        let item: PlacedItem = serde_json::from_str(
            r#"{"path":"a.png","left":10.0,"top":20.0,"width":100.0,"height":50.0}"#,
        )
        .expect("parse placed item");
        assert_eq!(item.rotation, 0.0);
        assert_eq!(item.gallery_id, None);
    }

    #[test]
    fn settings_backfill_missing_keys() {
        let settings: Settings = serde_json::from_str(r#"{"startOnStartup":true}"#)
            .expect("parse settings");
        assert!(settings.start_on_startup);
        assert!(settings.load_last_preset);
        assert!(!settings.debug_logging);
    }
}
