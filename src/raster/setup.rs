use std::collections::HashMap;

use log::{debug, warn};

use crate::bounds::BoundingSphere;
use crate::config::RenderConfig;
use crate::geometry::Geometry;
use crate::raster::ShadingPipeline;
use crate::scene::{Node, NodeId, SceneGraph};
use crate::traversal::{Frame, Visitor};

/// Per-node render data built by [`RasterSetup`].
#[derive(Clone, Debug)]
pub struct Renderable<M> {
    /// Local-space triangles, kept for hit testing.
    pub geometry: Geometry,
    /// Local-space bounding sphere of `geometry`.
    pub bounds: BoundingSphere,
    /// Pipeline handle of the uploaded geometry.
    pub mesh: M,
}

/// Side table from primitive nodes to their render data.
pub type Renderables<M> = HashMap<NodeId, Renderable<M>>;

/// Builds [`Renderable`]s for every primitive that does not have one yet.
#[derive(Clone, Debug, Default)]
pub struct RasterSetup {
    config: RenderConfig,
}

impl RasterSetup {
    pub fn new(config: &RenderConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Walk `graph` and fill `renderables`.
    ///
    /// Entries for nodes no longer in the graph are dropped. Nodes whose
    /// geometry or upload fails are logged and left without an entry, so
    /// they are neither drawn nor pickable.
    ///
    /// Returns the number of renderables created.
    pub fn run<P: ShadingPipeline>(
        &self,
        graph: &SceneGraph,
        pipeline: &mut P,
        renderables: &mut Renderables<P::Mesh>,
    ) -> usize {
        renderables.retain(|id, _| graph.contains(*id));

        let mut pass = SetupPass {
            config: &self.config,
            pipeline,
            renderables,
            created: 0,
        };
        graph.walk(&mut pass);

        debug!(
            "raster setup: {} created, {} total",
            pass.created,
            pass.renderables.len()
        );
        pass.created
    }
}

struct SetupPass<'a, P: ShadingPipeline> {
    config: &'a RenderConfig,
    pipeline: &'a mut P,
    renderables: &'a mut Renderables<P::Mesh>,
    created: usize,
}

impl<P: ShadingPipeline> Visitor for SetupPass<'_, P> {
    fn visit(&mut self, id: NodeId, node: &Node, _frame: &Frame) {
        if self.renderables.contains_key(&id) {
            return;
        }
        let geometry = match Geometry::for_node(node, self.config) {
            Ok(Some(geometry)) => geometry,
            Ok(None) => return,
            Err(e) => {
                warn!("{} {id} has no geometry: {e}", node.kind_name());
                return;
            }
        };
        let mesh = match self.pipeline.create_mesh(&geometry) {
            Ok(mesh) => mesh,
            Err(e) => {
                warn!("failed to upload {} {id}: {e}", node.kind_name());
                return;
            }
        };
        let bounds = geometry.bounding_sphere();
        self.renderables.insert(
            id,
            Renderable {
                geometry,
                bounds,
                mesh,
            },
        );
        self.created += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::pipeline::recording::RecordingPipeline;
    use crate::scene::{AaBoxNode, ObjNode, SphereNode};
    use crate::transform::Transformation;
    use glam::{Vec3, Vec4};

    fn scene() -> (SceneGraph, NodeId, NodeId) {
        let mut graph = SceneGraph::default();
        let group = graph
            .add_group(graph.root(), Transformation::translation(Vec3::X))
            .unwrap();
        let sphere = graph.add_child(group, Node::Sphere(SphereNode::default())).unwrap();
        let cube = graph
            .add_child(graph.root(), Node::AaBox(AaBoxNode::new(Vec4::ONE)))
            .unwrap();
        graph.add_child(graph.root(), Node::Light).unwrap();
        (graph, sphere, cube)
    }

    #[test]
    fn builds_one_renderable_per_primitive() {
        let (graph, sphere, cube) = scene();
        let mut pipeline = RecordingPipeline::default();
        let mut renderables = Renderables::new();

        let created = RasterSetup::default().run(&graph, &mut pipeline, &mut renderables);
        assert_eq!(created, 2);
        assert_eq!(renderables.len(), 2);
        assert!(renderables.contains_key(&sphere));

        let cube = &renderables[&cube];
        assert_eq!(cube.geometry.triangle_count(), 12);
        assert!(cube.bounds.contains(Vec3::splat(0.5)));
    }

    #[test]
    fn second_run_reuses_existing_entries() {
        let (mut graph, _, _) = scene();
        let mut pipeline = RecordingPipeline::default();
        let mut renderables = Renderables::new();
        let setup = RasterSetup::default();

        setup.run(&graph, &mut pipeline, &mut renderables);
        assert_eq!(setup.run(&graph, &mut pipeline, &mut renderables), 0);

        graph
            .add_child(graph.root(), Node::AaBox(AaBoxNode::new(Vec4::ONE)))
            .unwrap();
        assert_eq!(setup.run(&graph, &mut pipeline, &mut renderables), 1);
        assert_eq!(pipeline.created(), 3);
    }

    #[test]
    fn removed_nodes_lose_their_entry() {
        let (mut graph, sphere, _) = scene();
        let mut pipeline = RecordingPipeline::default();
        let mut renderables = Renderables::new();
        let setup = RasterSetup::default();
        setup.run(&graph, &mut pipeline, &mut renderables);

        graph.remove_subtree(sphere).unwrap();
        setup.run(&graph, &mut pipeline, &mut renderables);
        assert_eq!(renderables.len(), 1);
        assert!(!renderables.contains_key(&sphere));
    }

    #[test]
    fn failures_skip_the_node() {
        let mut graph = SceneGraph::default();
        graph
            .add_child(graph.root(), Node::Obj(ObjNode::from_source("v 0 0 0\nf 1 2 3")))
            .unwrap();
        graph
            .add_child(graph.root(), Node::Sphere(SphereNode::default()))
            .unwrap();
        let cube = graph
            .add_child(graph.root(), Node::AaBox(AaBoxNode::new(Vec4::ONE)))
            .unwrap();

        let mut pipeline = RecordingPipeline {
            max_triangles: Some(12),
            ..RecordingPipeline::default()
        };
        let mut renderables = Renderables::new();
        RasterSetup::default().run(&graph, &mut pipeline, &mut renderables);
        assert_eq!(renderables.keys().collect::<Vec<_>>(), vec![&cube]);
    }
}
