use std::sync::Arc;

use glam::{Mat4, Quat, Vec3};
use mirrorlight_common::{Color, NodeId, Transform};
use mirrorlight_geometry::Geometry;

use crate::camera::{PerspectiveCamera, look_rotation};
use crate::target::RenderTargetId;

/// Surface shading model.
#[derive(Debug, Clone, PartialEq)]
pub enum Material {
    /// Unlit colour, optionally multiplied by a render target's contents.
    Basic {
        color: Color,
        map: Option<RenderTargetId>,
    },
    /// Diffuse-only lighting.
    Lambert { color: Color },
    /// Diffuse plus Blinn-Phong specular.
    Phong {
        color: Color,
        specular: Color,
        shininess: f32,
        opacity: f32,
        transparent: bool,
    },
}

impl Material {
    pub fn basic_map(map: RenderTargetId) -> Self {
        Self::Basic {
            color: Color::WHITE,
            map: Some(map),
        }
    }

    pub fn lambert(hex: u32) -> Self {
        Self::Lambert {
            color: Color::from_hex(hex),
        }
    }

    pub fn color(&self) -> Color {
        match self {
            Self::Basic { color, .. } | Self::Lambert { color } | Self::Phong { color, .. } => {
                *color
            }
        }
    }

    pub fn opacity(&self) -> f32 {
        match self {
            Self::Phong { opacity, .. } => *opacity,
            _ => 1.0,
        }
    }

    /// Whether the material is drawn in the blended pass after opaque meshes.
    pub fn is_transparent(&self) -> bool {
        match self {
            Self::Phong { transparent, .. } => *transparent,
            _ => false,
        }
    }

    pub fn map(&self) -> Option<RenderTargetId> {
        match self {
            Self::Basic { map, .. } => *map,
            _ => None,
        }
    }
}

/// Geometry drawn with one material. Geometry is shared between the meshes
/// of a multi-material object.
#[derive(Debug, Clone)]
pub struct Mesh {
    pub geometry: Arc<Geometry>,
    pub material: Material,
}

impl Mesh {
    pub fn new(geometry: Arc<Geometry>, material: Material) -> Self {
        Self { geometry, material }
    }
}

/// Shadow map parameters for a spotlight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowSettings {
    /// Fraction of light removed in shadow.
    pub darkness: f32,
    pub map_size: u32,
    pub near: f32,
    pub far: f32,
}

impl Default for ShadowSettings {
    fn default() -> Self {
        Self {
            darkness: 0.5,
            map_size: 512,
            near: 50.0,
            far: 5000.0,
        }
    }
}

/// Cone light. Position comes from the owning node; the light points at
/// `target` in world space.
#[derive(Debug, Clone, PartialEq)]
pub struct SpotLight {
    pub color: Color,
    pub intensity: f32,
    pub target: Vec3,
    /// Half-angle of the cone in radians.
    pub angle: f32,
    pub shadow: ShadowSettings,
}

impl SpotLight {
    pub fn new(hex: u32, intensity: f32) -> Self {
        Self {
            color: Color::from_hex(hex),
            intensity,
            target: Vec3::ZERO,
            angle: std::f32::consts::FRAC_PI_3,
            shadow: ShadowSettings::default(),
        }
    }

    /// View-projection of the shadow camera for a light placed at `position`.
    ///
    /// The shadow frustum is square and spans the full cone.
    pub fn shadow_view_projection(&self, position: Vec3) -> Mat4 {
        let rotation = look_rotation(position, self.target, Vec3::Y);
        let view = Mat4::from_rotation_translation(Quat::from_mat3(&rotation), position).inverse();
        let projection = Mat4::perspective_rh(
            self.angle * 2.0,
            1.0,
            self.shadow.near,
            self.shadow.far,
        );
        projection * view
    }
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    Group,
    Mesh(Mesh),
    SpotLight(SpotLight),
    Camera(PerspectiveCamera),
}

impl NodeKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Group => "group",
            Self::Mesh(_) => "mesh",
            Self::SpotLight(_) => "spotlight",
            Self::Camera(_) => "camera",
        }
    }
}

/// A scene graph node. Hierarchy links are owned by the graph.
#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    pub kind: NodeKind,
    pub transform: Transform,
    pub visible: bool,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

impl Node {
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            transform: Transform::default(),
            visible: true,
            cast_shadow: false,
            receive_shadow: false,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn group(name: impl Into<String>) -> Self {
        Self::new(name, NodeKind::Group)
    }

    pub fn mesh(name: impl Into<String>, mesh: Mesh) -> Self {
        Self::new(name, NodeKind::Mesh(mesh))
    }

    pub fn spot_light(name: impl Into<String>, light: SpotLight) -> Self {
        Self::new(name, NodeKind::SpotLight(light))
    }

    pub fn camera(name: impl Into<String>, camera: PerspectiveCamera) -> Self {
        Self::new(name, NodeKind::Camera(camera))
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.transform.position = position;
        self
    }

    pub fn with_shadows(mut self, cast: bool, receive: bool) -> Self {
        self.cast_shadow = cast;
        self.receive_shadow = receive;
        self
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn as_mesh(&self) -> Option<&Mesh> {
        match &self.kind {
            NodeKind::Mesh(mesh) => Some(mesh),
            _ => None,
        }
    }

    pub fn as_spot_light(&self) -> Option<&SpotLight> {
        match &self.kind {
            NodeKind::SpotLight(light) => Some(light),
            _ => None,
        }
    }

    pub fn as_camera(&self) -> Option<&PerspectiveCamera> {
        match &self.kind {
            NodeKind::Camera(camera) => Some(camera),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phong_transparency() {
        let m = Material::Phong {
            color: Color::WHITE,
            specular: Color::from_hex(0x111111),
            shininess: 60.0,
            opacity: 0.4,
            transparent: true,
        };
        assert!(m.is_transparent());
        assert_eq!(m.opacity(), 0.4);
        assert!(!Material::lambert(0xff0000).is_transparent());
    }

    #[test]
    fn basic_map_carries_target() {
        let m = Material::basic_map(RenderTargetId(3));
        assert_eq!(m.map(), Some(RenderTargetId(3)));
        assert_eq!(m.color(), Color::WHITE);
    }

    #[test]
    fn shadow_camera_sees_target() {
        let light = SpotLight::new(0xcccccc, 1.0);
        let vp = light.shadow_view_projection(Vec3::new(100.0, 100.0, -100.0));
        let clip = vp * Vec3::ZERO.extend(1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-4 && ndc.y.abs() < 1e-4);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }

    #[test]
    fn builder_sets_flags() {
        let n = Node::group("g")
            .with_position(Vec3::ONE)
            .with_shadows(true, false);
        assert!(n.visible);
        assert!(n.cast_shadow);
        assert!(!n.receive_shadow);
        assert_eq!(n.transform.position, Vec3::ONE);
        assert!(n.parent().is_none());
    }
}
