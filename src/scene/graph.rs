//! Arena-backed scene graph.

use hecs::World;
use log::debug;
use thiserror::Error;

use crate::transform::{TransformError, Transformation};

use super::node::{Node, Selection};

/// Handle to a node in a [`SceneGraph`].
///
/// Handles are cheap to copy and stay valid until the node is removed. They
/// double as keys for per-node side tables such as the rasterizer's cached
/// geometry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) hecs::Entity);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "node#{}", self.0.id())
    }
}

/// Structural errors when editing a scene graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SceneError {
    #[error("{0} does not exist")]
    UnknownNode(NodeId),
    #[error("{0} is not a group node")]
    NotAGroup(NodeId),
    #[error("the root node cannot be removed")]
    RemoveRoot,
    #[error("a group must be added without children; attach them with add_child")]
    PrefilledGroup,
    #[error(transparent)]
    Transform(#[from] TransformError),
}

/// A tree of [`Node`]s rooted at a group.
///
/// Nodes live in a [`hecs::World`]: each node is an entity carrying its
/// [`Node`] and, for primitives, a [`Selection`]. Groups own their children
/// through an ordered list of handles, so every node has exactly one parent.
///
/// # Example
///
/// ```
/// use twinpass::scene::{Node, SceneGraph, SphereNode};
/// use twinpass::transform::Transformation;
/// use glam::Vec3;
///
/// let mut graph = SceneGraph::new(Transformation::translation(Vec3::new(0.0, 0.0, -5.0)));
/// let sphere = graph.add_child(graph.root(), Node::Sphere(SphereNode::default())).unwrap();
/// assert_eq!(graph.children(graph.root()), &[sphere]);
/// ```
pub struct SceneGraph {
    world: World,
    root: NodeId,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new(Transformation::identity())
    }
}

impl SceneGraph {
    /// An empty graph whose root group applies `root_transform`.
    pub fn new(root_transform: Transformation) -> Self {
        let mut world = World::new();
        let root = NodeId(world.spawn((Node::group(root_transform),)));
        Self { world, root }
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of nodes, including the root.
    pub fn len(&self) -> usize {
        self.world.len() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.world.contains(id.0)
    }

    /// Append `node` as the last child of the group `parent`.
    ///
    /// Groups must arrive empty. Every child is attached through this call,
    /// so each node has exactly one parent and the graph stays acyclic.
    pub fn add_child(&mut self, parent: NodeId, node: Node) -> Result<NodeId, SceneError> {
        if let Node::Group(group) = &node
            && !group.children.is_empty()
        {
            return Err(SceneError::PrefilledGroup);
        }
        match &*self.node(parent)? {
            Node::Group(_) => {}
            _ => return Err(SceneError::NotAGroup(parent)),
        }

        let child = if node.is_primitive() {
            self.world.spawn((node, Selection::Unevaluated))
        } else {
            self.world.spawn((node,))
        };
        let child = NodeId(child);

        if let Node::Group(group) = self.node_mut(parent)? {
            group.children.push(child);
        }
        Ok(child)
    }

    /// Add a new group under `parent` and return its handle.
    pub fn add_group(
        &mut self,
        parent: NodeId,
        transform: Transformation,
    ) -> Result<NodeId, SceneError> {
        self.add_child(parent, Node::group(transform))
    }

    /// Borrow a node.
    pub fn node(&self, id: NodeId) -> Result<hecs::Ref<'_, Node>, SceneError> {
        self.world
            .get::<&Node>(id.0)
            .map_err(|_| SceneError::UnknownNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, SceneError> {
        self.world
            .query_one_mut::<&mut Node>(id.0)
            .map_err(|_| SceneError::UnknownNode(id))
    }

    /// Children of a group in traversal order. Empty for leaves and unknown
    /// handles.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        match self.node(id).as_deref() {
            Ok(Node::Group(group)) => group.children.clone(),
            _ => Vec::new(),
        }
    }

    /// Local transformation of a group.
    pub fn transform(&self, id: NodeId) -> Result<Transformation, SceneError> {
        match &*self.node(id)? {
            Node::Group(group) => Ok(group.transform),
            _ => Err(SceneError::NotAGroup(id)),
        }
    }

    /// Replace a group's transformation wholesale.
    pub fn set_transform(
        &mut self,
        id: NodeId,
        transform: Transformation,
    ) -> Result<(), SceneError> {
        match self.node_mut(id)? {
            Node::Group(group) => {
                group.transform = transform;
                Ok(())
            }
            _ => Err(SceneError::NotAGroup(id)),
        }
    }

    /// Selection state of a primitive; `None` for groups, lights, cameras
    /// and unknown handles.
    pub fn selection(&self, id: NodeId) -> Option<Selection> {
        self.world.get::<&Selection>(id.0).ok().map(|s| *s)
    }

    /// Overwrite a primitive's selection state. Ignored for non-primitives.
    pub fn set_selection(&mut self, id: NodeId, selection: Selection) {
        if let Ok(state) = self.world.query_one_mut::<&mut Selection>(id.0) {
            *state = selection;
        }
    }

    /// Reset every primitive to [`Selection::Unevaluated`].
    pub fn clear_selection(&mut self) {
        for (_, state) in self.world.query_mut::<&mut Selection>() {
            *state = Selection::Unevaluated;
        }
    }

    /// The currently selected primitive, if any.
    pub fn selected(&self) -> Option<NodeId> {
        self.world
            .query::<&Selection>()
            .iter()
            .find(|(_, state)| **state == Selection::Selected)
            .map(|(entity, _)| NodeId(entity))
    }

    /// Detach `id` from its parent and despawn it with all descendants.
    pub fn remove_subtree(&mut self, id: NodeId) -> Result<(), SceneError> {
        if id == self.root {
            return Err(SceneError::RemoveRoot);
        }
        if !self.contains(id) {
            return Err(SceneError::UnknownNode(id));
        }

        for (_, node) in self.world.query_mut::<&mut Node>() {
            if let Node::Group(group) = node {
                group.children.retain(|&child| child != id);
            }
        }

        let mut pending = vec![id];
        let mut removed = 0usize;
        while let Some(next) = pending.pop() {
            pending.extend(self.children(next));
            if self.world.despawn(next.0).is_ok() {
                removed += 1;
            }
        }
        debug!("removed {removed} nodes under {id}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collect::SceneCollector;
    use crate::scene::node::{GroupNode, PyramidNode, SphereNode};
    use glam::{Vec3, Vec4};

    #[test]
    fn children_keep_insertion_order() {
        let mut graph = SceneGraph::default();
        let root = graph.root();
        let a = graph.add_child(root, Node::Light).unwrap();
        let b = graph.add_child(root, Node::Sphere(SphereNode::default())).unwrap();
        let c = graph.add_group(root, Transformation::identity()).unwrap();
        assert_eq!(graph.children(root), vec![a, b, c]);
        assert_eq!(graph.len(), 4);
    }

    #[test]
    fn leaves_cannot_have_children() {
        let mut graph = SceneGraph::default();
        let light = graph.add_child(graph.root(), Node::Light).unwrap();
        assert_eq!(
            graph.add_child(light, Node::Light),
            Err(SceneError::NotAGroup(light))
        );
        assert_eq!(
            graph.set_transform(light, Transformation::identity()),
            Err(SceneError::NotAGroup(light))
        );
    }

    #[test]
    fn primitives_start_unevaluated() {
        let mut graph = SceneGraph::default();
        let sphere = graph.add_child(graph.root(), Node::Sphere(SphereNode::default())).unwrap();
        let light = graph.add_child(graph.root(), Node::Light).unwrap();
        assert_eq!(graph.selection(sphere), Some(Selection::Unevaluated));
        assert_eq!(graph.selection(light), None);

        graph.set_selection(sphere, Selection::Selected);
        assert_eq!(graph.selected(), Some(sphere));
        graph.clear_selection();
        assert_eq!(graph.selected(), None);
    }

    #[test]
    fn set_transform_replaces_wholesale() {
        let mut graph = SceneGraph::default();
        let group = graph.add_group(graph.root(), Transformation::identity()).unwrap();
        let moved = Transformation::translation(Vec3::new(1.0, 2.0, 3.0));
        graph.set_transform(group, moved).unwrap();
        assert_eq!(graph.transform(group), Ok(moved));
    }

    #[test]
    fn remove_subtree_detaches_and_despawns() {
        let mut graph = SceneGraph::default();
        let root = graph.root();
        let group = graph.add_group(root, Transformation::identity()).unwrap();
        let pyramid = graph
            .add_child(group, Node::Pyramid(PyramidNode::new(Vec4::ONE)))
            .unwrap();
        let keep = graph.add_child(root, Node::Light).unwrap();

        graph.remove_subtree(group).unwrap();
        assert!(!graph.contains(group));
        assert!(!graph.contains(pyramid));
        assert_eq!(graph.children(root), vec![keep]);
        assert_eq!(graph.remove_subtree(root), Err(SceneError::RemoveRoot));
    }

    fn group_holding(children: Vec<NodeId>) -> Node {
        Node::Group(GroupNode {
            transform: Transformation::identity(),
            children,
        })
    }

    #[test]
    fn groups_cannot_adopt_existing_nodes() {
        let mut graph = SceneGraph::default();
        let root = graph.root();
        let light = graph.add_child(root, Node::Light).unwrap();

        assert_eq!(
            graph.add_child(root, group_holding(vec![light])),
            Err(SceneError::PrefilledGroup)
        );
        assert_eq!(graph.len(), 2);
        assert_eq!(graph.children(root), vec![light]);

        let mut collector = SceneCollector::new(10, 10, 1.0);
        collector.collect(&graph);
        assert_eq!(collector.lights(), &[Vec3::ONE]);
    }

    #[test]
    fn groups_cannot_close_a_cycle() {
        let mut graph = SceneGraph::default();
        let root = graph.root();
        let group = graph.add_group(root, Transformation::identity()).unwrap();

        for children in [vec![root], vec![group]] {
            assert_eq!(
                graph.add_child(group, group_holding(children)),
                Err(SceneError::PrefilledGroup)
            );
        }
        assert_eq!(graph.len(), 2);
        assert!(graph.children(group).is_empty());

        // A walk over the rejected edits still terminates.
        let mut collector = SceneCollector::new(10, 10, 1.0);
        collector.collect(&graph);
        assert!(collector.lights().is_empty());
    }
}
