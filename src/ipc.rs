use crate::model::{AppState, GalleryItem, PlacedItem, Preset, Settings};
use crate::overlay::{OverlayController, SurfaceEvent, SurfaceHost};
use crate::render;
use crate::store::Store;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Native facilities the primary window and tray need from the platform,
/// on top of the surface operations the overlay session drives.
pub trait HostShell: SurfaceHost {
    /// Open the native file picker and return the chosen image paths.
    fn pick_image_files(&mut self) -> Vec<PathBuf>;
    /// Register or unregister the application as a login item.
    fn set_launch_at_startup(&mut self, enabled: bool);
}

/// Commands the host shell sends into the core. Each variant is a JSON
/// message with `"cmd"` as the tag field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "kebab-case")]
pub enum Request {
    ApplyOverlay { items: Vec<PlacedItem> },
    RemoveOverlay,
    LoadData,
    SaveData { gallery: Vec<GalleryItem>, presets: Vec<Preset> },
    GetSettings,
    SetSettings { settings: Settings },
    ImportGalleryFiles,
    DeleteGalleryItem { id: String },
    GetScreenSize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "kebab-case")]
pub enum Response {
    /// Fire-and-forget commands acknowledge without a payload.
    Ack,
    Data {
        state: AppState,
    },
    Saved {
        success: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    Settings {
        settings: Settings,
    },
    Imported {
        items: Vec<GalleryItem>,
    },
    ScreenSize {
        width: u32,
        height: u32,
    },
}

/// Facade tying the store and the overlay session together behind the
/// command surface. The host shell owns the event loop and calls in; the
/// core calls back out only through the `HostShell`/`SurfaceHost` traits.
pub struct App {
    store: Store,
    overlay: OverlayController,
}

impl App {
    pub fn new(store: Store, overlay: OverlayController) -> Self {
        Self { store, overlay }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn overlay(&self) -> &OverlayController {
        &self.overlay
    }

    /// Dispatch one host-shell command.
    pub fn handle(&mut self, request: Request, host: &mut impl HostShell) -> Response {
        match request {
            Request::ApplyOverlay { items } => {
                self.apply_overlay(&items, host);
                Response::Ack
            }
            Request::RemoveOverlay => {
                self.overlay.remove(host);
                Response::Ack
            }
            Request::LoadData => Response::Data {
                state: self.store.state().clone(),
            },
            Request::SaveData { gallery, presets } => {
                saved(self.store.replace_collections(gallery, presets))
            }
            Request::GetSettings => Response::Settings {
                settings: self.store.settings().clone(),
            },
            Request::SetSettings { settings } => {
                let enabled = settings.start_on_startup;
                let response = saved(self.store.set_settings(settings));
                // Launch registration is a host-owned side effect,
                // re-applied after every settings change.
                host.set_launch_at_startup(enabled);
                response
            }
            Request::ImportGalleryFiles => {
                let picked = host.pick_image_files();
                let items = self.store.import_gallery_files(&picked);
                Response::Imported { items }
            }
            Request::DeleteGalleryItem { id } => match self.store.delete_gallery_item(&id) {
                Ok(state) => Response::Data { state },
                Err(e) => Response::Saved {
                    success: false,
                    error: Some(e.to_string()),
                },
            },
            Request::GetScreenSize => {
                let (width, height) = host.screen_size();
                Response::ScreenSize { width, height }
            }
        }
    }

    /// Render `items` and hand the document to the overlay session. An
    /// arrangement that renders to nothing never creates a surface; a
    /// dispatched one is recorded so a relaunch can restore it.
    pub fn apply_overlay(&mut self, items: &[PlacedItem], host: &mut impl HostShell) {
        let Some(document) = render::render(items) else {
            tracing::warn!("overlay content is empty, no surface created");
            return;
        };
        self.overlay.apply(document, host);
        if let Err(e) = self.store.record_last_applied(items) {
            tracing::error!("failed to record last applied overlay: {e}");
        }
    }

    /// Forward a surface notification from the host into the session.
    pub fn handle_surface_event(&mut self, event: SurfaceEvent, host: &mut impl HostShell) {
        self.overlay.handle_event(event, host);
    }

    /// Launch-time restore. When started in the background and the user
    /// opted in, the most recently applied arrangement is shown again
    /// without any main-window involvement. Returns whether an apply was
    /// dispatched.
    pub fn startup(&mut self, launched_hidden: bool, host: &mut impl HostShell) -> bool {
        if !launched_hidden || !self.store.settings().load_last_preset {
            return false;
        }
        let items = self.store.state().last_applied_overlay_items.clone();
        if items.is_empty() {
            return false;
        }
        tracing::info!(count = items.len(), "restoring last applied overlay");
        self.apply_overlay(&items, host);
        true
    }

    /// App-quit path: tear the overlay session down and reclaim its
    /// artifact.
    pub fn shutdown(&mut self, host: &mut impl HostShell) {
        self.overlay.shutdown(host);
    }
}

fn saved(result: Result<(), crate::store::StoreError>) -> Response {
    match result {
        Ok(()) => Response::Saved {
            success: true,
            error: None,
        },
        Err(e) => Response::Saved {
            success: false,
            error: Some(e.to_string()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::Request;

    #[test]
    fn requests_parse_from_tagged_wire_form() {
        let req: Request =
            serde_json::from_str(r#"{"cmd":"delete-gallery-item","id":"abc"}"#).expect("parse");
        match req {
            Request::DeleteGalleryItem { id } => assert_eq!(id, "abc"),
            other => panic!("unexpected request: {other:?}"),
        }

        let req: Request = serde_json::from_str(r#"{"cmd":"get-screen-size"}"#).expect("parse");
        assert!(matches!(req, Request::GetScreenSize));
    }
}
