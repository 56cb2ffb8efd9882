use mirrorlight_common::NodeId;
use mirrorlight_scene::{NodeKind, SceneGraph};
use serde::Serialize;

/// Scene inspector for developer tooling.
///
/// Provides read-only queries against a scene graph for debugging and
/// development UI.
pub struct SceneInspector;

impl SceneInspector {
    /// Produce a summary of the scene graph.
    pub fn summary(graph: &SceneGraph) -> SceneSummary {
        let mut summary = SceneSummary {
            nodes: graph.node_count(),
            visible: graph.visible_nodes().len(),
            render_targets: graph.render_targets().count(),
            fog: graph.fog.is_some(),
            ..SceneSummary::default()
        };
        for (_, node) in graph.nodes() {
            match node.kind {
                NodeKind::Group => summary.groups += 1,
                NodeKind::Mesh(_) => summary.meshes += 1,
                NodeKind::SpotLight(_) => summary.spotlights += 1,
                NodeKind::Camera(_) => summary.cameras += 1,
            }
        }
        summary
    }

    /// Details of one node, with its world-space position.
    pub fn inspect_node(graph: &SceneGraph, id: NodeId) -> Option<NodeInfo> {
        graph.get(id).map(|node| {
            let t = &node.transform;
            NodeInfo {
                id,
                name: node.name.clone(),
                kind: node.kind.label(),
                position: t.position.to_array(),
                rotation: t.rotation.to_array(),
                scale: t.scale.to_array(),
                world_position: graph.world_position(id).to_array(),
                visible: node.visible,
                effectively_visible: graph.is_effectively_visible(id),
                parent: node.parent(),
                children: node.children().to_vec(),
            }
        })
    }

    /// Every node, depth-first from the roots, paired with its depth.
    /// Hidden subtrees are included.
    pub fn list_nodes(graph: &SceneGraph) -> Vec<(usize, NodeId)> {
        let mut out = Vec::with_capacity(graph.node_count());
        let roots = graph.roots().iter().rev();
        let mut stack: Vec<(usize, NodeId)> = roots.map(|id| (0, *id)).collect();
        while let Some((depth, id)) = stack.pop() {
            out.push((depth, id));
            if let Some(node) = graph.get(id) {
                stack.extend(node.children().iter().rev().map(|c| (depth + 1, *c)));
            }
        }
        out
    }
}

/// Summary of scene state for the inspector.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SceneSummary {
    pub nodes: usize,
    pub groups: usize,
    pub meshes: usize,
    pub spotlights: usize,
    pub cameras: usize,
    pub visible: usize,
    pub render_targets: usize,
    pub fog: bool,
}

impl std::fmt::Display for SceneSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let fog = if self.fog { "on" } else { "off" };
        write!(
            f,
            "Scene: nodes={} groups={} meshes={} spotlights={}",
            self.nodes, self.groups, self.meshes, self.spotlights
        )?;
        write!(
            f,
            " cameras={} visible={} targets={} fog={fog}",
            self.cameras, self.visible, self.render_targets
        )
    }
}

/// Detailed info about a single node.
#[derive(Debug, Clone, Serialize)]
pub struct NodeInfo {
    pub id: NodeId,
    pub name: String,
    pub kind: &'static str,
    pub position: [f32; 3],
    pub rotation: [f32; 3],
    pub scale: [f32; 3],
    pub world_position: [f32; 3],
    pub visible: bool,
    pub effectively_visible: bool,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

impl std::fmt::Display for NodeInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}] #{} pos=({:.2}, {:.2}, {:.2}) rot=({:.2}, {:.2}, {:.2}){}",
            self.name,
            self.kind,
            self.id.0,
            self.position[0],
            self.position[1],
            self.position[2],
            self.rotation[0],
            self.rotation[1],
            self.rotation[2],
            if self.effectively_visible { "" } else { " hidden" },
        )
    }
}
