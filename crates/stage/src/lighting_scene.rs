use std::f32::consts::FRAC_PI_2;
use std::sync::Arc;

use glam::Vec3;
use mirrorlight_common::{Color, NodeId, Transform};
use mirrorlight_geometry::{
    Geometry, box_geometry, plane_geometry, text_geometry, torus_knot_geometry,
};
use mirrorlight_render::{RenderBackend, RenderError, RenderTarget};
use mirrorlight_scene::{
    Fog, Material, Mesh, Node, PerspectiveCamera, RenderTargetDesc, RenderTargetId, SceneGraph,
    SpotLight, TextureFormat,
};

use crate::animation::{Animator, Spin};
use crate::orbit::CameraOrbit;
use crate::settings::StageSettings;
use crate::viewport::ViewportSize;

const FAR_PLANE: f32 = 20000.0;

/// The lighting scene and its frame loop.
///
/// Construction only allocates. Call [`start`](Self::start), then once per
/// display refresh [`update`](Self::update) followed by
/// [`render`](Self::render); call [`resize`](Self::resize) whenever the
/// output size changes.
pub struct LightingScene {
    graph: SceneGraph,
    camera: PerspectiveCamera,
    texture_camera: NodeId,
    mirror_target: RenderTargetId,
    flip_target: RenderTargetId,
    plane: NodeId,
    orbit: CameraOrbit,
    animator: Animator,
    running: bool,
}

impl Default for LightingScene {
    fn default() -> Self {
        Self::new(&StageSettings::default())
    }
}

impl LightingScene {
    pub fn new(settings: &StageSettings) -> Self {
        let mut graph = SceneGraph::new();
        graph.fog = Some(Fog::exp2(Color::WHITE, 0.005));
        graph.clear_color = Color::WHITE;

        let viewport = ViewportSize::new(settings.viewport_width, settings.viewport_height);
        let camera = main_camera(viewport.aspect());

        let mirror_target = graph.add_render_target(RenderTargetDesc::new(
            "mirror",
            settings.mirror_size,
            settings.mirror_size,
            TextureFormat::Rgb,
        ));
        // Reserved for the disabled flip-correction pass.
        let flip_target = graph.add_render_target(RenderTargetDesc::new(
            "flip",
            settings.mirror_size,
            settings.mirror_size,
            TextureFormat::Rgb,
        ));

        let texture_camera = graph.add(Node::camera("texture_camera", texture_camera()));
        let plane = add_mirror_plane(&mut graph, mirror_target);
        add_lighting(&mut graph, settings.shadow_map_size);

        let mut animator = Animator::new();
        let cube = graph.add(animated_mesh(
            "box",
            box_geometry(10.0, 10.0, 10.0),
            0xff0000,
            Vec3::new(0.0, 10.0, 0.0),
        ));
        animator.register(cube, Spin::new(0.0, 0.07, 0.07));

        let knot = graph.add(animated_mesh(
            "knot",
            torus_knot_geometry(10.0, 2.0, 64, 64, 1, 3),
            0x0000ff,
            Vec3::new(30.0, 20.0, 0.0),
        ));
        animator.register(knot, Spin::new(0.05, 0.0, 0.0));

        let text = graph.add(animated_mesh(
            "text",
            text_geometry(&settings.text, 10.0, 2.0),
            0xffff00,
            Vec3::new(-50.0, 20.0, 0.0),
        ));
        animator.register(text, Spin::new(-0.03, 0.0, 0.0));

        tracing::info!(nodes = graph.node_count(), "lighting scene assembled");

        Self {
            graph,
            camera,
            texture_camera,
            mirror_target,
            flip_target,
            plane,
            orbit: CameraOrbit::new(),
            animator,
            running: false,
        }
    }

    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    /// The main (screen) camera.
    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    /// The camera that renders the mirror texture.
    pub fn texture_camera(&self) -> Option<&PerspectiveCamera> {
        self.graph.camera(self.texture_camera).ok()
    }

    pub fn plane(&self) -> NodeId {
        self.plane
    }

    pub fn mirror_target(&self) -> RenderTargetId {
        self.mirror_target
    }

    pub fn flip_target(&self) -> RenderTargetId {
        self.flip_target
    }

    pub fn animator(&self) -> &Animator {
        &self.animator
    }

    /// Frames advanced since construction.
    pub fn frame(&self) -> u64 {
        self.orbit.ticks()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Begin animating. Places the camera on the orbit for the current frame.
    pub fn start(&mut self) {
        if self.running {
            return;
        }
        self.running = true;
        self.orbit.apply(&mut self.camera);
        tracing::info!(frame = self.frame(), "animation started");
    }

    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        tracing::info!(frame = self.frame(), "animation stopped");
    }

    /// Advance one frame: spin every animated mesh, then move the camera
    /// along its orbit. Does nothing while stopped.
    pub fn update(&mut self) {
        if !self.running {
            return;
        }
        self.animator.step(&mut self.graph);
        self.orbit.advance(&mut self.camera);
        tracing::trace!(frame = self.frame(), "frame updated");
    }

    /// Resize the output and refresh both camera projections.
    ///
    /// Only the main camera's aspect follows the viewport; the texture
    /// camera keeps its square aspect.
    pub fn resize<B: RenderBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        viewport: ViewportSize,
    ) -> Result<(), RenderError> {
        backend.set_size(viewport.width, viewport.height);
        self.camera.aspect = viewport.aspect();
        self.camera.update_projection_matrix();
        self.graph
            .camera_mut(self.texture_camera)?
            .update_projection_matrix();
        tracing::debug!(width = viewport.width, height = viewport.height, "resized");
        Ok(())
    }

    /// Draw one frame: the mirror pass into the mirror target with the floor
    /// hidden, then the screen pass with the floor shown.
    ///
    /// The floor is shown again even if the mirror pass fails.
    pub fn render<B: RenderBackend + ?Sized>(
        &mut self,
        backend: &mut B,
    ) -> Result<(), RenderError> {
        let texture_camera = self.graph.camera(self.texture_camera)?.clone();

        self.graph.set_visible(self.plane, false)?;
        let mirror = backend.render(
            &self.graph,
            &texture_camera,
            RenderTarget::Offscreen(self.mirror_target),
        );
        self.graph.set_visible(self.plane, true)?;
        mirror?;

        // The captured reflection is mirrored left-right. Nothing is drawn
        // into the flip target to correct it.
        backend.render(&self.graph, &self.camera, RenderTarget::Screen)
    }

    /// [`update`](Self::update) followed by [`render`](Self::render).
    pub fn advance_frame<B: RenderBackend + ?Sized>(
        &mut self,
        backend: &mut B,
    ) -> Result<(), RenderError> {
        self.update();
        self.render(backend)
    }
}

fn main_camera(aspect: f32) -> PerspectiveCamera {
    let mut camera = PerspectiveCamera::new(40.0, aspect, 1.0, FAR_PLANE);
    camera.position = Vec3::new(0.0, 100.0, -1000.0);
    camera.look_at(Vec3::ZERO);
    camera
}

fn texture_camera() -> PerspectiveCamera {
    let mut camera = PerspectiveCamera::new(45.0, 1.0, 0.1, FAR_PLANE);
    camera.position = Vec3::new(0.0, -117.0, 0.0);
    camera.look_at(Vec3::new(0.0, 1.0, 0.0));
    camera
}

fn spotlight(hex: u32, position: Vec3, shadow_map_size: u32) -> Node {
    let mut light = SpotLight::new(hex, 1.0);
    light.target = Vec3::ZERO;
    light.shadow.darkness = 0.5;
    light.shadow.map_size = shadow_map_size;
    Node::spot_light("spotlight", light)
        .with_position(position)
        .with_shadows(true, false)
}

fn add_lighting(graph: &mut SceneGraph, shadow_map_size: u32) -> NodeId {
    let positions = [
        Vec3::new(100.0, 100.0, -100.0),
        Vec3::new(-100.0, 100.0, -100.0),
    ];
    let lights = positions.map(|position| spotlight(0xcccccc, position, shadow_map_size));
    graph.add_tree(Node::group("lighting"), lights)
}

/// Floor: one geometry drawn twice, first with the mirror texture, then a
/// translucent phong layer on top.
fn add_mirror_plane(graph: &mut SceneGraph, mirror: RenderTargetId) -> NodeId {
    let geometry = Arc::new(plane_geometry(100.0, 100.0, 10, 10));
    let floor = Node::group("floor").with_transform(Transform {
        rotation: Vec3::new(-FRAC_PI_2, 0.0, -FRAC_PI_2),
        ..Transform::default()
    });

    let glass = Material::Phong {
        color: Color::WHITE,
        specular: Color::from_hex(0x111111),
        shininess: 60.0,
        opacity: 0.4,
        transparent: true,
    };
    let mirrored = Material::basic_map(mirror);
    let layers = [
        Node::mesh("floor_mirror", Mesh::new(Arc::clone(&geometry), mirrored)),
        Node::mesh("floor_glass", Mesh::new(geometry, glass)),
    ];
    graph.add_tree(floor, layers)
}

fn animated_mesh(name: &str, geometry: Geometry, hex: u32, position: Vec3) -> Node {
    Node::mesh(name, Mesh::new(Arc::new(geometry), Material::lambert(hex)))
        .with_position(position)
        .with_shadows(true, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mirrorlight_render::RecordingBackend;
    use mirrorlight_scene::NodeKind;

    fn started() -> LightingScene {
        let mut scene = LightingScene::default();
        scene.start();
        scene
    }

    fn rotation(scene: &LightingScene, name: &str) -> Vec3 {
        scene
            .graph()
            .nodes()
            .find(|(_, n)| n.name == name)
            .map(|(_, n)| n.transform.rotation)
            .unwrap()
    }

    fn assert_rotation(scene: &LightingScene, name: &str, expected: Vec3) {
        let actual = rotation(scene, name);
        assert!(actual.abs_diff_eq(expected, 1e-3), "{name}: {actual:?}");
    }

    #[test]
    fn construction_builds_the_fixed_scene() {
        let scene = LightingScene::default();
        let g = scene.graph();

        assert_eq!(g.count(|n| matches!(n.kind, NodeKind::SpotLight(_))), 2);
        assert_eq!(g.count(|n| matches!(n.kind, NodeKind::Camera(_))), 1);
        assert_eq!(g.count(|n| n.name == "floor"), 1);
        assert_eq!(scene.animator().len(), 3);
        for id in scene.animator().nodes() {
            let node = g.get(id).unwrap();
            assert!(node.as_mesh().is_some());
            assert!(node.cast_shadow && node.receive_shadow);
        }
        assert_eq!(g.get(scene.plane()).unwrap().children().len(), 2);
        assert_eq!(g.node_count(), 1 + 3 + 3 + 3);
    }

    #[test]
    fn construction_has_no_animation_side_effects() {
        let scene = LightingScene::default();
        assert!(!scene.is_running());
        assert_eq!(scene.frame(), 0);
        assert_eq!(scene.camera().position, Vec3::new(0.0, 100.0, -1000.0));
        assert_eq!(rotation(&scene, "box"), Vec3::ZERO);
    }

    #[test]
    fn cameras_use_the_scene_defaults() {
        let scene = LightingScene::default();
        let cam = scene.camera();
        assert_eq!(cam.fov, 40.0);
        assert_eq!((cam.near, cam.far), (1.0, 20000.0));
        assert!((cam.aspect - 1280.0 / 720.0).abs() < 1e-6);

        let tex = scene.texture_camera().unwrap();
        assert_eq!(tex.fov, 45.0);
        assert_eq!(tex.aspect, 1.0);
        assert_eq!(tex.position, Vec3::new(0.0, -117.0, 0.0));
        assert!(tex.forward().y > 0.999);
    }

    #[test]
    fn floor_samples_the_mirror_target() {
        let scene = LightingScene::default();
        let g = scene.graph();
        let first = g.get(scene.plane()).unwrap().children()[0];
        let material = &g.get(first).unwrap().as_mesh().unwrap().material;
        assert_eq!(material.map(), Some(scene.mirror_target()));
        assert_ne!(scene.mirror_target(), scene.flip_target());
        assert_eq!(g.render_target(scene.mirror_target()).unwrap().width, 512);
    }

    #[test]
    fn orbit_after_n_frames() {
        let mut scene = started();
        for n in 0..=300u64 {
            let a = n as f32 * 0.01;
            let expected = Vec3::new(100.0 * a.sin(), 100.0, 100.0 * a.cos());
            assert!(scene.camera().position.abs_diff_eq(expected, 1e-3));
            assert_eq!(scene.frame(), n);
            scene.update();
        }
    }

    #[test]
    fn spins_after_n_frames() {
        let mut scene = started();
        for _ in 0..100 {
            scene.update();
        }
        assert_rotation(&scene, "box", Vec3::new(0.0, 7.0, 7.0));
        assert_rotation(&scene, "knot", Vec3::new(5.0, 0.0, 0.0));
        assert_rotation(&scene, "text", Vec3::new(-3.0, 0.0, 0.0));
    }

    #[test]
    fn stop_freezes_the_frame_counter() {
        let mut scene = started();
        scene.update();
        scene.stop();
        let frozen = scene.camera().position;
        scene.update();
        scene.update();
        assert_eq!(scene.frame(), 1);
        assert_eq!(scene.camera().position, frozen);

        scene.start();
        scene.update();
        assert_eq!(scene.frame(), 2);
    }

    #[test]
    fn resize_is_idempotent() {
        let mut scene = LightingScene::default();
        let mut backend = RecordingBackend::new();
        let viewport = ViewportSize::new(1024, 512);

        scene.resize(&mut backend, viewport).unwrap();
        let once = (backend.size(), scene.camera().aspect, scene.camera().projection_matrix());
        scene.resize(&mut backend, viewport).unwrap();
        let twice = (backend.size(), scene.camera().aspect, scene.camera().projection_matrix());

        assert_eq!(once, twice);
        assert_eq!(backend.size(), (1024, 512));
        assert_eq!(scene.camera().aspect, 2.0);
    }

    #[test]
    fn resize_leaves_texture_camera_aspect() {
        let mut scene = LightingScene::default();
        let mut backend = RecordingBackend::new();
        let viewport = ViewportSize::new(1920, 1080);
        scene.resize(&mut backend, viewport).unwrap();
        assert_eq!(scene.texture_camera().unwrap().aspect, 1.0);
    }

    #[test]
    fn render_hides_floor_only_for_the_mirror_pass() {
        let mut scene = LightingScene::default();
        let mut backend = RecordingBackend::new();
        scene.render(&mut backend).unwrap();

        let passes = backend.passes();
        assert_eq!(passes.len(), 2);
        let mirror = RenderTarget::Offscreen(scene.mirror_target());
        assert_eq!(passes[0].target, mirror);
        assert!(!passes[0].is_visible(scene.plane()));
        assert_eq!(passes[0].camera_position, Vec3::new(0.0, -117.0, 0.0));
        assert_eq!(passes[0].drawn_meshes.len(), 3);

        assert_eq!(passes[1].target, RenderTarget::Screen);
        assert!(passes[1].is_visible(scene.plane()));
        assert_eq!(passes[1].drawn_meshes.len(), 5);
        assert!(scene.graph().get(scene.plane()).unwrap().visible);
    }

    #[test]
    fn failed_mirror_pass_restores_the_floor() {
        let mut scene = LightingScene::default();
        let mirror = scene.mirror_target();
        let mut backend = RecordingBackend::failing_on(RenderTarget::Offscreen(mirror));
        assert!(scene.render(&mut backend).is_err());
        assert!(scene.graph().get(scene.plane()).unwrap().visible);
        assert!(backend.passes().is_empty());
    }

    #[test]
    fn flip_target_is_never_drawn() {
        let mut scene = started();
        let mut backend = RecordingBackend::new();
        for _ in 0..3 {
            scene.advance_frame(&mut backend).unwrap();
        }
        let flip = RenderTarget::Offscreen(scene.flip_target());
        assert!(backend.passes().iter().all(|p| p.target != flip));
        assert_eq!(backend.passes().len(), 6);
    }

    #[test]
    fn updates_land_before_the_passes() {
        let mut scene = started();
        let mut backend = RecordingBackend::new();
        scene.advance_frame(&mut backend).unwrap();
        let screen = &backend.passes()[1];
        assert_eq!(screen.camera_position, scene.camera().position);
        assert_eq!(scene.frame(), 1);
    }

    #[test]
    fn end_to_end_800_by_600() {
        let mut scene = LightingScene::default();
        let mut backend = RecordingBackend::new();
        let viewport = ViewportSize::new(800, 600);
        scene.resize(&mut backend, viewport).unwrap();
        scene.render(&mut backend).unwrap();

        assert_eq!(backend.size(), (800, 600));
        assert!(scene.graph().get(scene.plane()).unwrap().visible);
        let aspect = backend.passes()[1].camera_aspect;
        assert!((aspect - 800.0 / 600.0).abs() < 1e-6);
    }

    #[test]
    fn custom_text_is_used() {
        let settings = StageSettings {
            text: "HI".into(),
            ..StageSettings::default()
        };
        let scene = LightingScene::new(&settings);
        let text = scene
            .graph()
            .nodes()
            .find(|(_, n)| n.name == "text")
            .and_then(|(_, n)| n.as_mesh().cloned())
            .unwrap();
        let (_, max) = text.geometry.bounds();
        assert!((max.x - 10.0 * 10.0 / 7.0).abs() < 1e-4);
    }
}
