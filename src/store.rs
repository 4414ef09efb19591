use crate::model::{AppState, GalleryItem, PlacedItem, Preset, Settings};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::{Path, PathBuf};

pub const STATE_FILE: &str = "state.json";
pub const GALLERY_DIR: &str = "gallery";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("gallery item not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Default store root used when the host does not supply one.
pub fn default_dir() -> PathBuf {
    dirs_next::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("OverlayCreator")
}

/// Owns the persisted application state and the gallery directory. Every
/// mutating method writes the state file back before returning, so two
/// writes never interleave and a crash loses at most the current call.
pub struct Store {
    state: AppState,
    root: PathBuf,
}

impl Store {
    /// Open the store rooted at `root`. Never fails: a missing, corrupt or
    /// partially-shaped state file degrades to defaults section by section.
    pub fn open(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let state = load_state(&root.join(STATE_FILE));
        Self { state, root }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn settings(&self) -> &Settings {
        &self.state.settings
    }

    /// Directory holding the imported image files.
    pub fn gallery_dir(&self) -> PathBuf {
        self.root.join(GALLERY_DIR)
    }

    pub fn save(&self) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.root)?;
        let json = serde_json::to_string_pretty(&self.state)?;
        std::fs::write(self.root.join(STATE_FILE), json)?;
        Ok(())
    }

    /// Copy each source file into the gallery directory and append a record
    /// for it. A per-file copy failure is logged and skipped without
    /// aborting the remaining imports; the returned list contains only the
    /// imports that succeeded.
    pub fn import_gallery_files(&mut self, sources: &[PathBuf]) -> Vec<GalleryItem> {
        let mut imported = Vec::new();
        for src in sources {
            match self.copy_into_gallery(src) {
                Ok(dest) => {
                    let item = GalleryItem {
                        id: uuid::Uuid::new_v4().to_string(),
                        path: dest.to_string_lossy().to_string(),
                    };
                    self.state.gallery.push(item.clone());
                    imported.push(item);
                }
                Err(e) => {
                    tracing::warn!("failed to import {}: {e}", src.display());
                }
            }
        }
        if !imported.is_empty() {
            if let Err(e) = self.save() {
                tracing::error!("failed to persist gallery after import: {e}");
            }
        }
        imported
    }

    fn copy_into_gallery(&self, src: &Path) -> Result<PathBuf, StoreError> {
        let dir = self.gallery_dir();
        std::fs::create_dir_all(&dir)?;
        let base = src
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "image".to_string());
        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let mut idx = 0;
        loop {
            let name = if idx == 0 {
                format!("{stamp}_{base}")
            } else {
                format!("{stamp}_{idx}_{base}")
            };
            let dest = dir.join(name);
            if !dest.exists() {
                std::fs::copy(src, &dest)?;
                return Ok(dest);
            }
            idx += 1;
        }
    }

    /// Delete a gallery item together with everything that references it:
    /// the owned file (best effort, absence is not an error), the record
    /// itself, matching preset entries and matching last-applied entries.
    /// The updated state is returned so the caller can refresh its view
    /// without a second load.
    pub fn delete_gallery_item(&mut self, id: &str) -> Result<AppState, StoreError> {
        let removed = cascade_delete(&mut self.state, id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        let path = Path::new(&removed.path);
        if path.exists() {
            if let Err(e) = std::fs::remove_file(path) {
                tracing::warn!("failed to remove gallery file {}: {e}", removed.path);
            }
        }
        self.save()?;
        Ok(self.state.clone())
    }

    /// Replace the gallery and preset collections wholesale. Used by the
    /// host shell when the user edits arrangements in the primary window.
    pub fn replace_collections(
        &mut self,
        gallery: Vec<GalleryItem>,
        presets: Vec<Preset>,
    ) -> Result<(), StoreError> {
        self.state.gallery = gallery;
        self.state.presets = presets;
        self.save()
    }

    pub fn set_settings(&mut self, next: Settings) -> Result<(), StoreError> {
        self.state.settings = next;
        self.save()
    }

    /// Remember the arrangement that was just shown so a relaunch can
    /// restore it.
    pub fn record_last_applied(&mut self, items: &[PlacedItem]) -> Result<(), StoreError> {
        self.state.last_applied_overlay_items = items.to_vec();
        self.save()
    }
}

/// Remove the gallery record with `id` from `state` and strip every
/// reference to it: preset entries carrying the id and last-applied entries
/// carrying the removed file's path. Presets themselves are never deleted,
/// only filtered. Returns the removed record, or `None` when the id is
/// unknown, in which case `state` is untouched.
///
/// The whole cascade is one mutation over the aggregate so a partially
/// applied delete cannot exist.
pub fn cascade_delete(state: &mut AppState, id: &str) -> Option<GalleryItem> {
    let idx = state.gallery.iter().position(|g| g.id == id)?;
    let removed = state.gallery.remove(idx);
    for preset in &mut state.presets {
        preset.items.retain(|item| item.gallery_id.as_deref() != Some(id));
    }
    state
        .last_applied_overlay_items
        .retain(|item| item.path != removed.path);
    Some(removed)
}

fn load_state(path: &Path) -> AppState {
    let content = std::fs::read_to_string(path).unwrap_or_default();
    if content.is_empty() {
        return AppState::default();
    }
    match serde_json::from_str::<Value>(&content) {
        Ok(doc) => AppState {
            gallery: section(&doc, "gallery"),
            presets: section(&doc, "presets"),
            settings: section(&doc, "settings"),
            last_applied_overlay_items: section(&doc, "lastAppliedOverlayItems"),
        },
        Err(e) => {
            tracing::warn!("state file is not valid JSON, starting from defaults: {e}");
            AppState::default()
        }
    }
}

/// Deserialize one top-level section of the state document, falling back to
/// its default when the section is missing or malformed. A corrupt settings
/// object must not discard a valid gallery array, so each section is
/// salvaged independently.
fn section<T: DeserializeOwned + Default>(doc: &Value, key: &str) -> T {
    match doc.get(key) {
        None | Some(Value::Null) => T::default(),
        Some(v) => serde_json::from_value(v.clone()).unwrap_or_else(|e| {
            tracing::warn!("ignoring malformed '{key}' section in state file: {e}");
            T::default()
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::cascade_delete;
    use crate::model::{AppState, GalleryItem, PlacedItem, Preset};

    fn placed(path: &str, gallery_id: Option<&str>) -> PlacedItem {
        PlacedItem {
            path: path.into(),
            left: 0.0,
            top: 0.0,
            width: 100.0,
            height: 100.0,
            rotation: 0.0,
            gallery_id: gallery_id.map(Into::into),
        }
    }

    #[test]
    fn cascade_strips_presets_and_last_applied() {
        let mut state = AppState {
            gallery: vec![
                GalleryItem { id: "a".into(), path: "/g/a.png".into() },
                GalleryItem { id: "b".into(), path: "/g/b.png".into() },
            ],
            presets: vec![Preset {
                id: "p".into(),
                name: "both".into(),
                items: vec![placed("/g/a.png", Some("a")), placed("/g/b.png", Some("b"))],
            }],
            last_applied_overlay_items: vec![placed("/g/a.png", Some("a"))],
            ..Default::default()
        };

        let removed = cascade_delete(&mut state, "a").expect("item exists");
        assert_eq!(removed.path, "/g/a.png");
        assert_eq!(state.gallery.len(), 1);
        assert_eq!(state.gallery[0].id, "b");
        assert_eq!(state.presets.len(), 1, "presets are filtered, never deleted");
        assert_eq!(state.presets[0].items.len(), 1);
        assert_eq!(state.presets[0].items[0].gallery_id.as_deref(), Some("b"));
        assert!(state.last_applied_overlay_items.is_empty());
    }

    #[test]
    fn cascade_unknown_id_leaves_state_untouched() {
        let mut state = AppState {
            gallery: vec![GalleryItem { id: "a".into(), path: "/g/a.png".into() }],
            ..Default::default()
        };
        let before = state.clone();
        assert!(cascade_delete(&mut state, "missing").is_none());
        assert_eq!(state, before);
    }
}
