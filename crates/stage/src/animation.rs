use glam::Vec3;
use mirrorlight_common::{NodeId, Transform};
use mirrorlight_scene::SceneGraph;

/// Constant per-frame rotation, in radians per axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spin {
    pub delta: Vec3,
}

impl Spin {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self {
            delta: Vec3::new(x, y, z),
        }
    }

    pub fn apply(&self, transform: &mut Transform) {
        transform.rotation += self.delta;
    }
}

/// Ordered list of `(node, rule)` pairs stepped once per frame.
#[derive(Debug, Clone, Default)]
pub struct Animator {
    rules: Vec<(NodeId, Spin)>,
}

impl Animator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, node: NodeId, spin: Spin) {
        self.rules.push((node, spin));
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Registered nodes in registration order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.rules.iter().map(|(id, _)| *id)
    }

    pub fn rule(&self, node: NodeId) -> Option<Spin> {
        self.rules
            .iter()
            .find(|(id, _)| *id == node)
            .map(|(_, spin)| *spin)
    }

    /// Apply every rule once, in registration order.
    pub fn step(&self, graph: &mut SceneGraph) {
        for (id, spin) in &self.rules {
            match graph.get_mut(*id) {
                Some(node) => spin.apply(&mut node.transform),
                None => tracing::warn!(?id, "animated node missing from scene graph"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mirrorlight_scene::Node;

    #[test]
    fn step_applies_each_rule_once() {
        let mut graph = SceneGraph::new();
        let a = graph.add(Node::group("a"));
        let b = graph.add(Node::group("b"));
        let mut animator = Animator::new();
        animator.register(a, Spin::new(0.0, 0.07, 0.07));
        animator.register(b, Spin::new(-0.03, 0.0, 0.0));

        for _ in 0..10 {
            animator.step(&mut graph);
        }

        let ra = graph.get(a).unwrap().transform.rotation;
        let rb = graph.get(b).unwrap().transform.rotation;
        assert!(ra.abs_diff_eq(Vec3::new(0.0, 0.7, 0.7), 1e-5));
        assert!(rb.abs_diff_eq(Vec3::new(-0.3, 0.0, 0.0), 1e-5));
    }

    #[test]
    fn missing_nodes_are_skipped() {
        let mut graph = SceneGraph::new();
        let mut animator = Animator::new();
        animator.register(NodeId(42), Spin::new(1.0, 0.0, 0.0));
        animator.step(&mut graph);
        assert_eq!(animator.len(), 1);
    }

    #[test]
    fn registration_order_is_kept() {
        let mut animator = Animator::new();
        animator.register(NodeId(5), Spin::new(0.0, 0.0, 0.0));
        animator.register(NodeId(2), Spin::new(0.0, 0.0, 0.0));
        let order: Vec<NodeId> = animator.nodes().collect();
        assert_eq!(order, vec![NodeId(5), NodeId(2)]);
        assert!(animator.rule(NodeId(2)).is_some());
        assert!(animator.rule(NodeId(3)).is_none());
    }
}
