use std::collections::BTreeMap;

use glam::{Mat4, Vec3};
use mirrorlight_common::{Color, NodeId};

use crate::camera::PerspectiveCamera;
use crate::node::{Node, NodeKind};
use crate::target::{RenderTargetDesc, RenderTargetId};

/// Errors from scene graph operations.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("node not found: {0:?}")]
    NodeNotFound(NodeId),
    #[error("node {0:?} is not a camera")]
    NotACamera(NodeId),
    #[error("render target not found: {0:?}")]
    TargetNotFound(RenderTargetId),
}

/// Exponential-squared distance fog.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fog {
    pub color: Color,
    pub density: f32,
}

impl Fog {
    pub fn exp2(color: Color, density: f32) -> Self {
        Self { color, density }
    }

    /// Fraction of the fog colour mixed in at `distance` from the eye.
    pub fn factor(&self, distance: f32) -> f32 {
        let d = self.density * distance;
        (1.0 - (-d * d).exp()).clamp(0.0, 1.0)
    }
}

/// The scene graph.
///
/// Nodes live in a BTreeMap keyed by sequential ids, so every traversal is
/// deterministic and follows insertion order among siblings.
#[derive(Debug, Clone)]
pub struct SceneGraph {
    nodes: BTreeMap<NodeId, Node>,
    roots: Vec<NodeId>,
    next_id: u64,
    render_targets: BTreeMap<RenderTargetId, RenderTargetDesc>,
    pub fog: Option<Fog>,
    pub clear_color: Color,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self {
            nodes: BTreeMap::new(),
            roots: Vec::new(),
            next_id: 0,
            render_targets: BTreeMap::new(),
            fog: None,
            clear_color: Color::BLACK,
        }
    }
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// All nodes in id (insertion) order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().map(|(id, node)| (*id, node))
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    /// Add a top-level node.
    pub fn add(&mut self, node: Node) -> NodeId {
        let id = self.insert(node, None);
        self.roots.push(id);
        id
    }

    /// Add `node` under `parent`.
    pub fn add_child(&mut self, parent: NodeId, node: Node) -> Result<NodeId, SceneError> {
        let id = self.insert(node, Some(parent));
        match self.nodes.get_mut(&parent) {
            Some(p) => {
                p.children.push(id);
                Ok(id)
            }
            None => {
                self.nodes.remove(&id);
                Err(SceneError::NodeNotFound(parent))
            }
        }
    }

    /// Add a top-level node together with its direct children.
    pub fn add_tree(&mut self, node: Node, children: impl IntoIterator<Item = Node>) -> NodeId {
        let parent = self.add(node);
        for child in children {
            let id = self.insert(child, Some(parent));
            if let Some(p) = self.nodes.get_mut(&parent) {
                p.children.push(id);
            }
        }
        parent
    }

    fn insert(&mut self, mut node: Node, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        node.parent = parent;
        node.children.clear();
        tracing::trace!(?id, name = %node.name, kind = node.kind.label(), "node added");
        self.nodes.insert(id, node);
        id
    }

    pub fn set_visible(&mut self, id: NodeId, visible: bool) -> Result<(), SceneError> {
        let node = self.nodes.get_mut(&id).ok_or(SceneError::NodeNotFound(id))?;
        node.visible = visible;
        Ok(())
    }

    /// Whether `id` and every ancestor are visible. Unknown ids are not visible.
    pub fn is_effectively_visible(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(cur) = current {
            match self.nodes.get(&cur) {
                Some(node) if node.visible => current = node.parent,
                _ => return false,
            }
        }
        true
    }

    /// Local-to-world matrix, composing every ancestor's transform.
    pub fn world_matrix(&self, id: NodeId) -> Mat4 {
        let mut matrix = Mat4::IDENTITY;
        let mut current = Some(id);
        while let Some(cur) = current {
            let Some(node) = self.nodes.get(&cur) else {
                break;
            };
            matrix = node.transform.matrix() * matrix;
            current = node.parent;
        }
        matrix
    }

    pub fn world_position(&self, id: NodeId) -> Vec3 {
        self.world_matrix(id).transform_point3(Vec3::ZERO)
    }

    /// Depth-first walk from the roots, skipping hidden subtrees.
    pub fn visible_nodes(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(&id) else {
                continue;
            };
            if !node.visible {
                continue;
            }
            out.push(id);
            stack.extend(node.children.iter().rev().copied());
        }
        out
    }

    /// Number of nodes for which `pred` holds.
    pub fn count(&self, pred: impl Fn(&Node) -> bool) -> usize {
        self.nodes.values().filter(|n| pred(n)).count()
    }

    pub fn camera(&self, id: NodeId) -> Result<&PerspectiveCamera, SceneError> {
        let node = self.nodes.get(&id).ok_or(SceneError::NodeNotFound(id))?;
        node.as_camera().ok_or(SceneError::NotACamera(id))
    }

    pub fn camera_mut(&mut self, id: NodeId) -> Result<&mut PerspectiveCamera, SceneError> {
        let node = self.nodes.get_mut(&id).ok_or(SceneError::NodeNotFound(id))?;
        match &mut node.kind {
            NodeKind::Camera(camera) => Ok(camera),
            _ => Err(SceneError::NotACamera(id)),
        }
    }

    pub fn add_render_target(&mut self, desc: RenderTargetDesc) -> RenderTargetId {
        let id = RenderTargetId(self.render_targets.len() as u32);
        self.render_targets.insert(id, desc);
        id
    }

    pub fn render_target(&self, id: RenderTargetId) -> Result<&RenderTargetDesc, SceneError> {
        self.render_targets
            .get(&id)
            .ok_or(SceneError::TargetNotFound(id))
    }

    pub fn render_targets(&self) -> impl Iterator<Item = (RenderTargetId, &RenderTargetDesc)> {
        self.render_targets.iter().map(|(id, desc)| (*id, desc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::TextureFormat;
    use mirrorlight_common::Transform;

    #[test]
    fn graph_starts_empty() {
        let g = SceneGraph::new();
        assert_eq!(g.node_count(), 0);
        assert!(g.visible_nodes().is_empty());
        assert!(g.fog.is_none());
    }

    #[test]
    fn ids_follow_insertion_order() {
        let mut g = SceneGraph::new();
        let a = g.add(Node::group("a"));
        let b = g.add(Node::group("b"));
        let c = g.add_child(a, Node::group("c")).unwrap();
        assert!(a < b && b < c);
        let names: Vec<&str> = g.nodes().map(|(_, n)| n.name.as_str()).collect();
        assert_eq!(names, ["a", "b", "c"]);
    }

    #[test]
    fn add_child_to_missing_parent_fails() {
        let mut g = SceneGraph::new();
        let err = g.add_child(NodeId(7), Node::group("orphan")).unwrap_err();
        assert!(matches!(err, SceneError::NodeNotFound(NodeId(7))));
        assert_eq!(g.node_count(), 0);
    }

    #[test]
    fn hidden_parent_hides_children() {
        let mut g = SceneGraph::new();
        let parent = g.add(Node::group("parent"));
        let child = g.add_child(parent, Node::group("child")).unwrap();
        assert!(g.is_effectively_visible(child));

        g.set_visible(parent, false).unwrap();
        assert!(!g.is_effectively_visible(child));
        assert!(g.get(child).unwrap().visible);
        assert!(g.visible_nodes().is_empty());

        g.set_visible(parent, true).unwrap();
        assert_eq!(g.visible_nodes(), vec![parent, child]);
    }

    #[test]
    fn visible_nodes_is_depth_first() {
        let mut g = SceneGraph::new();
        let a = g.add(Node::group("a"));
        let a1 = g.add_child(a, Node::group("a1")).unwrap();
        let b = g.add(Node::group("b"));
        let a2 = g.add_child(a, Node::group("a2")).unwrap();
        assert_eq!(g.visible_nodes(), vec![a, a1, a2, b]);
    }

    #[test]
    fn world_matrix_composes_parents() {
        let mut g = SceneGraph::new();
        let parent = g.add(Node::group("p").with_position(Vec3::new(10.0, 0.0, 0.0)));
        let offset = Transform::from_position(Vec3::new(0.0, 5.0, 0.0));
        let child = Node::group("c").with_transform(offset);
        let child = g.add_child(parent, child).unwrap();
        let expected = Vec3::new(10.0, 5.0, 0.0);
        assert!(g.world_position(child).abs_diff_eq(expected, 1e-6));
    }

    #[test]
    fn camera_lookup_checks_kind() {
        let mut g = SceneGraph::new();
        let group = g.add(Node::group("g"));
        let camera = PerspectiveCamera::new(45.0, 1.0, 0.1, 10.0);
        let cam = g.add(Node::camera("cam", camera));
        assert!(g.camera(cam).is_ok());
        assert!(matches!(g.camera(group), Err(SceneError::NotACamera(_))));
        g.camera_mut(cam).unwrap().aspect = 2.0;
        assert_eq!(g.camera(cam).unwrap().aspect, 2.0);
    }

    #[test]
    fn render_target_registry() {
        let mut g = SceneGraph::new();
        let a = g.add_render_target(RenderTargetDesc::new("a", 512, 512, TextureFormat::Rgb));
        let b = g.add_render_target(RenderTargetDesc::new("b", 256, 256, TextureFormat::Rgba));
        assert_ne!(a, b);
        assert_eq!(g.render_target(b).unwrap().width, 256);
        assert!(g.render_target(RenderTargetId(9)).is_err());
        assert_eq!(g.render_targets().count(), 2);
    }

    #[test]
    fn fog_factor_grows_with_distance() {
        let fog = Fog::exp2(Color::WHITE, 0.005);
        assert_eq!(fog.factor(0.0), 0.0);
        assert!(fog.factor(100.0) < fog.factor(500.0));
        assert!(fog.factor(1.0e6) <= 1.0);
    }
}
