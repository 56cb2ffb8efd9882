use std::fmt;

use glam::Vec3;
use mirrorlight_common::NodeId;
use mirrorlight_scene::{NodeKind, PerspectiveCamera, SceneGraph};

use crate::backend::{RenderBackend, RenderError, RenderTarget};

/// What one render call saw.
#[derive(Debug, Clone)]
pub struct PassRecord {
    pub target: RenderTarget,
    pub camera_position: Vec3,
    pub camera_aspect: f32,
    /// Meshes that would have been drawn, in traversal order.
    pub drawn_meshes: Vec<NodeId>,
    /// Every node reached by the visible traversal.
    pub visible_nodes: Vec<NodeId>,
    pub lights: usize,
}

impl PassRecord {
    pub fn is_visible(&self, id: NodeId) -> bool {
        self.visible_nodes.contains(&id)
    }
}

impl fmt::Display for PassRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let target = match self.target {
            RenderTarget::Screen => "screen".to_string(),
            RenderTarget::Offscreen(id) => format!("target#{}", id.0),
        };
        write!(
            f,
            "pass -> {target}: camera=({:.1}, {:.1}, {:.1}) aspect={:.3} meshes={} lights={}",
            self.camera_position.x,
            self.camera_position.y,
            self.camera_position.z,
            self.camera_aspect,
            self.drawn_meshes.len(),
            self.lights,
        )
    }
}

/// Backend that records passes instead of drawing them.
///
/// Useful for headless runs and for checking pass ordering in tests.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    size: (u32, u32),
    passes: Vec<PassRecord>,
    fail_on: Option<RenderTarget>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend whose `render` into `target` always fails.
    pub fn failing_on(target: RenderTarget) -> Self {
        Self {
            fail_on: Some(target),
            ..Self::default()
        }
    }

    pub fn passes(&self) -> &[PassRecord] {
        &self.passes
    }

    /// Drain and return the recorded passes.
    pub fn take_passes(&mut self) -> Vec<PassRecord> {
        std::mem::take(&mut self.passes)
    }
}

impl RenderBackend for RecordingBackend {
    fn set_size(&mut self, width: u32, height: u32) {
        self.size = (width, height);
    }

    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn render(
        &mut self,
        scene: &SceneGraph,
        camera: &PerspectiveCamera,
        target: RenderTarget,
    ) -> Result<(), RenderError> {
        if self.fail_on == Some(target) {
            return Err(RenderError::SurfaceUnavailable(format!(
                "recording backend set to fail on {target:?}"
            )));
        }
        if let RenderTarget::Offscreen(id) = target {
            scene.render_target(id)?;
        }

        let visible_nodes = scene.visible_nodes();
        let mut drawn_meshes = Vec::new();
        let mut lights = 0;
        for id in &visible_nodes {
            match scene.get(*id).map(|n| &n.kind) {
                Some(NodeKind::Mesh(_)) => drawn_meshes.push(*id),
                Some(NodeKind::SpotLight(_)) => lights += 1,
                _ => {}
            }
        }

        let record = PassRecord {
            target,
            camera_position: camera.position,
            camera_aspect: camera.aspect,
            drawn_meshes,
            visible_nodes,
            lights,
        };
        tracing::debug!("{record}");
        self.passes.push(record);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mirrorlight_scene::{Node, RenderTargetDesc, RenderTargetId, SpotLight, TextureFormat};

    fn camera() -> PerspectiveCamera {
        PerspectiveCamera::new(45.0, 1.5, 0.1, 100.0)
    }

    #[test]
    fn records_visible_nodes() {
        let mut scene = SceneGraph::new();
        let lights = scene.add(Node::group("lights"));
        let key = Node::spot_light("key", SpotLight::new(0xffffff, 1.0));
        scene.add_child(lights, key).unwrap();
        let hidden = scene.add(Node::group("hidden"));
        scene.set_visible(hidden, false).unwrap();

        let mut backend = RecordingBackend::new();
        let result = backend.render(&scene, &camera(), RenderTarget::Screen);
        result.unwrap();

        let pass = &backend.passes()[0];
        assert_eq!(pass.lights, 1);
        assert!(pass.is_visible(lights));
        assert!(!pass.is_visible(hidden));
        assert_eq!(pass.camera_aspect, 1.5);
    }

    #[test]
    fn unknown_offscreen_target_is_an_error() {
        let scene = SceneGraph::new();
        let mut backend = RecordingBackend::new();
        let missing = RenderTarget::Offscreen(RenderTargetId(0));
        let result = backend.render(&scene, &camera(), missing);
        assert!(matches!(result, Err(RenderError::Scene(_))));
        assert!(backend.passes().is_empty());
    }

    #[test]
    fn registered_offscreen_target_records() {
        let mut scene = SceneGraph::new();
        let desc = RenderTargetDesc::new("mirror", 512, 512, TextureFormat::Rgb);
        let target = RenderTarget::Offscreen(scene.add_render_target(desc));
        let mut backend = RecordingBackend::new();
        backend.render(&scene, &camera(), target).unwrap();
        assert_eq!(backend.passes()[0].target, target);
        assert!(format!("{}", backend.passes()[0]).contains("target#0"));
    }

    #[test]
    fn failing_backend_fails_only_on_its_target() {
        let scene = SceneGraph::new();
        let mut backend = RecordingBackend::failing_on(RenderTarget::Screen);
        let result = backend.render(&scene, &camera(), RenderTarget::Screen);
        assert!(result.is_err());
        assert_eq!(backend.take_passes().len(), 0);
    }

    #[test]
    fn set_size_is_reported() {
        let mut backend = RecordingBackend::new();
        backend.set_size(800, 600);
        assert_eq!(backend.size(), (800, 600));
    }
}
