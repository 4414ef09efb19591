use std::path::{Path, PathBuf};

/// Identifier the host assigns to a created surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceId(pub u64);

/// Host-side windowing operations the overlay session drives.
///
/// A created surface covers the primary display, is transparent,
/// click-through and always on top, and stays hidden until `show_surface`
/// is called. Those properties are fixed at creation and never change over
/// the surface's life. The host reports `ContentReady` once the surface has
/// finished loading its document and `Closed` once teardown is complete.
pub trait SurfaceHost {
    fn create_surface(&mut self, artifact: &Path, size: (u32, u32)) -> anyhow::Result<SurfaceId>;
    fn show_surface(&mut self, id: SurfaceId);
    fn close_surface(&mut self, id: SurfaceId);
    fn screen_size(&self) -> (u32, u32);
}

/// Notifications the host feeds back into the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceEvent {
    /// The surface finished loading its document and can be shown.
    ContentReady(SurfaceId),
    /// The surface is gone; its backing artifact can be reclaimed.
    Closed(SurfaceId),
}

/// Lifecycle of the single overlay surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No surface exists.
    Idle,
    /// Backing artifact written and a hidden surface requested.
    Preparing,
    /// Surface visible.
    Showing,
    /// Surface teardown and artifact deletion in progress.
    Closing,
}

struct ActiveSurface {
    id: SurfaceId,
    artifact: PathBuf,
}

/// Owns the lifecycle of at most one overlay surface and its temporary
/// backing artifact.
///
/// The artifact's lifetime is exactly the surface's: written just before
/// the surface is requested, deleted exactly once after the surface closes.
/// A replacement request never interrupts an in-flight teardown; it is
/// parked until the `Closing -> Idle` transition completes, so two surfaces
/// or two artifacts can never coexist. Everything runs on the host's event
/// loop: the state gate alone sequences the multi-step operations, no lock
/// is involved.
pub struct OverlayController {
    state: SessionState,
    active: Option<ActiveSurface>,
    /// Document parked while an earlier surface finishes closing. Replaced
    /// on every new apply, so the newest request always wins.
    pending: Option<String>,
    temp_dir: PathBuf,
}

impl OverlayController {
    pub fn new(temp_dir: impl Into<PathBuf>) -> Self {
        Self {
            state: SessionState::Idle,
            active: None,
            pending: None,
            temp_dir: temp_dir.into(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Show `document` on a fresh overlay surface.
    ///
    /// From `Idle` the artifact is written and a hidden surface requested
    /// immediately. While a surface is still up, the document is parked and
    /// the current surface asked to close; a surface that has not shown yet
    /// is closed without ever becoming visible, so stale content is never
    /// flashed on a replace.
    pub fn apply(&mut self, document: String, host: &mut dyn SurfaceHost) {
        match self.state {
            SessionState::Idle => self.begin_prepare(document, host),
            SessionState::Showing | SessionState::Preparing => {
                self.pending = Some(document);
                self.begin_close(host);
            }
            SessionState::Closing => {
                self.pending = Some(document);
            }
        }
    }

    /// Close the current surface, if any. Idempotent: calling this while
    /// `Idle` or already `Closing` does nothing. A parked replacement is
    /// dropped too, so a remove issued after an apply wins.
    pub fn remove(&mut self, host: &mut dyn SurfaceHost) {
        self.pending = None;
        match self.state {
            SessionState::Showing | SessionState::Preparing => self.begin_close(host),
            SessionState::Idle | SessionState::Closing => {}
        }
    }

    /// Feed a host notification into the state machine. Events for a
    /// surface the session no longer owns are ignored.
    pub fn handle_event(&mut self, event: SurfaceEvent, host: &mut dyn SurfaceHost) {
        match event {
            SurfaceEvent::ContentReady(id) => {
                // Only show once the content has loaded, and only if no
                // close was requested in the meantime.
                if self.state == SessionState::Preparing && self.owns(id) {
                    host.show_surface(id);
                    self.state = SessionState::Showing;
                }
            }
            SurfaceEvent::Closed(id) => {
                if self.owns(id) {
                    self.finish_close();
                    if let Some(document) = self.pending.take() {
                        self.begin_prepare(document, host);
                    }
                }
            }
        }
    }

    /// App-quit path: close whatever is live and reclaim the artifact
    /// without waiting for the host's close notification.
    pub fn shutdown(&mut self, host: &mut dyn SurfaceHost) {
        self.pending = None;
        if let Some(active) = &self.active {
            host.close_surface(active.id);
        }
        self.finish_close();
    }

    fn owns(&self, id: SurfaceId) -> bool {
        self.active.as_ref().map(|a| a.id == id).unwrap_or(false)
    }

    fn begin_prepare(&mut self, document: String, host: &mut dyn SurfaceHost) {
        let artifact = match self.write_artifact(&document) {
            Ok(path) => path,
            Err(e) => {
                // Nothing was created; the session stays Idle.
                tracing::error!("failed to write overlay artifact: {e}");
                return;
            }
        };
        let size = host.screen_size();
        match host.create_surface(&artifact, size) {
            Ok(id) => {
                self.active = Some(ActiveSurface { id, artifact });
                self.state = SessionState::Preparing;
            }
            Err(e) => {
                tracing::error!("failed to create overlay surface: {e}");
                remove_artifact(&artifact);
            }
        }
    }

    fn begin_close(&mut self, host: &mut dyn SurfaceHost) {
        if let Some(active) = &self.active {
            host.close_surface(active.id);
            self.state = SessionState::Closing;
        }
    }

    /// Reclaim the backing artifact and return to `Idle`. Taking `active`
    /// is what guarantees the artifact is deleted at most once per surface.
    fn finish_close(&mut self) {
        if let Some(active) = self.active.take() {
            remove_artifact(&active.artifact);
        }
        self.state = SessionState::Idle;
    }

    fn write_artifact(&self, document: &str) -> std::io::Result<PathBuf> {
        std::fs::create_dir_all(&self.temp_dir)?;
        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let mut idx = 0;
        loop {
            let name = if idx == 0 {
                format!("overlay_{stamp}.html")
            } else {
                format!("overlay_{stamp}_{idx}.html")
            };
            let path = self.temp_dir.join(name);
            if !path.exists() {
                std::fs::write(&path, document)?;
                return Ok(path);
            }
            idx += 1;
        }
    }
}

/// Delete a backing artifact, tolerating a file that is already gone. The
/// cleanup may race an external deletion of the temp directory.
fn remove_artifact(path: &Path) {
    if path.exists() {
        if let Err(e) = std::fs::remove_file(path) {
            tracing::warn!("failed to delete overlay artifact {}: {e}", path.display());
        }
    }
}
