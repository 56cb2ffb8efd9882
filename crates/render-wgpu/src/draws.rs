use glam::{Mat4, Vec3};
use mirrorlight_common::NodeId;
use mirrorlight_scene::{Mesh, NodeKind, PerspectiveCamera, SceneGraph};

use crate::uniforms::{LightUniform, MAX_LIGHTS};

/// One mesh to draw, resolved to world space.
#[derive(Debug)]
pub struct Draw<'a> {
    pub node: NodeId,
    pub mesh: &'a Mesh,
    pub model: Mat4,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
}

impl Draw<'_> {
    pub fn is_transparent(&self) -> bool {
        self.mesh.material.is_transparent()
    }

    fn center(&self) -> Vec3 {
        self.model.transform_point3(Vec3::ZERO)
    }
}

/// Visible meshes in draw order: opaque ones in scene order, then
/// transparent ones from farthest to nearest.
pub fn collect_draws<'a>(scene: &'a SceneGraph, camera: &PerspectiveCamera) -> Vec<Draw<'a>> {
    let mut opaque = Vec::new();
    let mut transparent = Vec::new();
    for id in scene.visible_nodes() {
        let Some(node) = scene.get(id) else {
            continue;
        };
        let NodeKind::Mesh(mesh) = &node.kind else {
            continue;
        };
        let draw = Draw {
            node: id,
            mesh,
            model: scene.world_matrix(id),
            cast_shadow: node.cast_shadow,
            receive_shadow: node.receive_shadow,
        };
        if draw.is_transparent() {
            transparent.push(draw);
        } else {
            opaque.push(draw);
        }
    }

    let eye = camera.position;
    transparent.sort_by(|a, b| {
        let da = a.center().distance_squared(eye);
        let db = b.center().distance_squared(eye);
        db.total_cmp(&da)
    });
    opaque.extend(transparent);
    opaque
}

/// Visible spotlights, in scene order, capped at [`MAX_LIGHTS`].
pub fn collect_lights(scene: &SceneGraph) -> Vec<(LightUniform, u32)> {
    let mut lights = Vec::new();
    for id in scene.visible_nodes() {
        let Some(node) = scene.get(id) else {
            continue;
        };
        let Some(light) = node.as_spot_light() else {
            continue;
        };
        if lights.len() == MAX_LIGHTS {
            tracing::warn!(?id, max = MAX_LIGHTS, "spotlight ignored");
            continue;
        }
        let uniform = LightUniform::new(light, scene.world_position(id), node.cast_shadow);
        lights.push((uniform, light.shadow.map_size));
    }
    lights
}

#[cfg(test)]
mod tests {
    use super::*;
    use mirrorlight_common::Color;
    use mirrorlight_geometry::box_geometry;
    use mirrorlight_scene::{Material, Node, SpotLight};
    use std::sync::Arc;

    fn mesh(material: Material) -> Mesh {
        Mesh::new(Arc::new(box_geometry(1.0, 1.0, 1.0)), material)
    }

    fn glass() -> Material {
        Material::Phong {
            color: Color::WHITE,
            specular: Color::BLACK,
            shininess: 30.0,
            opacity: 0.5,
            transparent: true,
        }
    }

    fn glass_at(name: &str, z: f32) -> Node {
        Node::mesh(name, mesh(glass())).with_position(Vec3::new(0.0, 0.0, z))
    }

    #[test]
    fn transparent_meshes_come_last_far_to_near() {
        let mut g = SceneGraph::new();
        let near = g.add(glass_at("near", 10.0));
        let solid = g.add(Node::mesh("solid", mesh(Material::lambert(0xff0000))));
        let far = g.add(glass_at("far", -50.0));

        let mut cam = PerspectiveCamera::new(40.0, 1.0, 1.0, 1000.0);
        cam.position = Vec3::new(0.0, 0.0, 20.0);

        let order: Vec<NodeId> = collect_draws(&g, &cam).iter().map(|d| d.node).collect();
        assert_eq!(order, vec![solid, far, near]);
    }

    #[test]
    fn hidden_subtrees_are_not_drawn() {
        let mut g = SceneGraph::new();
        let group = g.add(Node::group("floor"));
        let a = Node::mesh("a", mesh(Material::lambert(0xffffff)));
        g.add_child(group, a).unwrap();
        let cam = PerspectiveCamera::new(40.0, 1.0, 1.0, 1000.0);
        assert_eq!(collect_draws(&g, &cam).len(), 1);

        g.set_visible(group, false).unwrap();
        assert!(collect_draws(&g, &cam).is_empty());
    }

    #[test]
    fn lights_use_world_position_and_cap() {
        let mut g = SceneGraph::new();
        let parent = g.add(Node::group("rig").with_position(Vec3::new(0.0, 50.0, 0.0)));
        for x in [10.0, 20.0, 30.0] {
            let light = Node::spot_light("spot", SpotLight::new(0xffffff, 1.0))
                .with_position(Vec3::new(x, 0.0, 0.0))
                .with_shadows(true, false);
            g.add_child(parent, light).unwrap();
        }
        let lights = collect_lights(&g);
        assert_eq!(lights.len(), MAX_LIGHTS);
        assert_eq!(&lights[0].0.position[..3], &[10.0, 50.0, 0.0]);
        assert!(lights[1].0.casts_shadow());
        assert_eq!(lights[0].1, 512);
    }
}
