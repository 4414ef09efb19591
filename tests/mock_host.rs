use overlay_creator::ipc::HostShell;
use overlay_creator::overlay::{SurfaceHost, SurfaceId};
use std::path::{Path, PathBuf};

/// Recording host for lifecycle and command tests. Surfaces are numbered in
/// creation order; close completion is reported back by each test through
/// `SurfaceEvent::Closed`, mirroring how a real windowing host notifies.
pub struct MockHost {
    next_id: u64,
    pub created: Vec<SurfaceId>,
    pub created_artifacts: Vec<PathBuf>,
    pub shown: Vec<SurfaceId>,
    pub close_requested: Vec<SurfaceId>,
    pub fail_create: bool,
    pub picked_files: Vec<PathBuf>,
    pub launch_at_startup: Option<bool>,
}

impl Default for MockHost {
    fn default() -> Self {
        Self {
            next_id: 1,
            created: Vec::new(),
            created_artifacts: Vec::new(),
            shown: Vec::new(),
            close_requested: Vec::new(),
            fail_create: false,
            picked_files: Vec::new(),
            launch_at_startup: None,
        }
    }
}

impl SurfaceHost for MockHost {
    fn create_surface(&mut self, artifact: &Path, _size: (u32, u32)) -> anyhow::Result<SurfaceId> {
        if self.fail_create {
            anyhow::bail!("surface creation refused");
        }
        let id = SurfaceId(self.next_id);
        self.next_id += 1;
        self.created.push(id);
        self.created_artifacts.push(artifact.to_path_buf());
        Ok(id)
    }

    fn show_surface(&mut self, id: SurfaceId) {
        self.shown.push(id);
    }

    fn close_surface(&mut self, id: SurfaceId) {
        self.close_requested.push(id);
    }

    fn screen_size(&self) -> (u32, u32) {
        (1920, 1080)
    }
}

impl HostShell for MockHost {
    fn pick_image_files(&mut self) -> Vec<PathBuf> {
        self.picked_files.clone()
    }

    fn set_launch_at_startup(&mut self, enabled: bool) {
        self.launch_at_startup = Some(enabled);
    }
}
