//! The card scene: an arena tree of nodes addressed by stable [`NodeId`] handles.
//!
//! Only the geometry builder adds nodes. After construction the sole mutable part of a node
//! is its [`Transform`], reachable crate-internally through a handle. Each frame the tree is
//! walked once to produce world-space draw items for the renderer.

mod material;
mod mesh;
mod transform;

pub use material::{Material, TextureSlot};
pub use mesh::{Mesh, MeshVertex};
pub use transform::{Mat4, Point3, Transform, Vec3};

use crate::id::{MeshId, NodeId};
use crate::text::TextBlock;
use easy_tree::Tree;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_SCENE_EPOCH: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PanelKind {
    FrontCover,
    InsideLeft,
    InsideRight,
    BackCover,
    Spine,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Root,
    /// Fixed presentation tilt of the whole card.
    Stage,
    /// Receives the idle float and yaw.
    CardGroup,
    /// Carries the spine and both hinges of a folding card.
    Spread,
    /// Pivot that swings a leaf open about the spine.
    Hinge,
    Panel(PanelKind),
    /// Frame strips and the greeting ring.
    Trim,
    Motif,
    Text,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeContent {
    Group,
    Mesh { mesh: MeshId, material: Material },
    Text(TextBlock),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub kind: NodeKind,
    pub transform: Transform,
    pub content: NodeContent,
}

impl SceneNode {
    pub fn group(kind: NodeKind, transform: Transform) -> Self {
        Self {
            kind,
            transform,
            content: NodeContent::Group,
        }
    }

    pub fn mesh(kind: NodeKind, transform: Transform, mesh: MeshId, material: Material) -> Self {
        Self {
            kind,
            transform,
            content: NodeContent::Mesh { mesh, material },
        }
    }

    pub fn text(transform: Transform, block: TextBlock) -> Self {
        Self {
            kind: NodeKind::Text,
            transform,
            content: NodeContent::Text(block),
        }
    }

    pub fn material(&self) -> Option<&Material> {
        match &self.content {
            NodeContent::Mesh { material, .. } => Some(material),
            _ => None,
        }
    }

    pub fn text_block(&self) -> Option<&TextBlock> {
        match &self.content {
            NodeContent::Text(block) => Some(block),
            _ => None,
        }
    }

    fn requires_card_image(&self) -> bool {
        self.material()
            .is_some_and(|material| material.requires_card_image())
    }
}

/// One mesh to draw this frame, in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawItem {
    pub node: NodeId,
    pub kind: NodeKind,
    pub mesh: MeshId,
    pub world: Mat4,
    /// The node's material with this frame's shimmer applied.
    pub material: Material,
}

/// A text block to draw this frame, in world space.
#[derive(Debug, Clone, Copy)]
pub struct TextItem<'a> {
    pub node: NodeId,
    pub world: Mat4,
    pub block: &'a TextBlock,
}

pub struct Scene {
    tree: Tree<SceneNode>,
    meshes: Vec<Mesh>,
    root: NodeId,
    epoch: u64,
}

impl std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("nodes", &self.tree.len())
            .field("meshes", &self.meshes.len())
            .field("epoch", &self.epoch)
            .finish()
    }
}

impl Scene {
    pub(crate) fn new() -> Self {
        let mut tree = Tree::new();
        let root = tree.add_node(SceneNode::group(NodeKind::Root, Transform::IDENTITY));
        Self {
            tree,
            meshes: Vec::new(),
            root: NodeId(root),
            epoch: NEXT_SCENE_EPOCH.fetch_add(1, Ordering::Relaxed),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Unique per constructed scene. Renderers key their GPU mesh caches on it.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.tree.get(id.0)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        if id.0 >= self.tree.len() {
            return None;
        }
        self.tree.parent_index_unchecked(id.0).map(NodeId)
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        if id.0 >= self.tree.len() {
            return Vec::new();
        }
        self.tree.children(id.0).iter().copied().map(NodeId).collect()
    }

    pub fn mesh(&self, id: MeshId) -> Option<&Mesh> {
        self.meshes.get(id.0)
    }

    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &SceneNode)> + '_ {
        (0..self.tree.len()).filter_map(|index| self.tree.get(index).map(|node| (NodeId(index), node)))
    }

    pub fn nodes_of_kind(&self, kind: NodeKind) -> Vec<NodeId> {
        self.nodes()
            .filter(|(_, node)| node.kind == kind)
            .map(|(id, _)| id)
            .collect()
    }

    pub fn transform(&self, id: NodeId) -> Option<&Transform> {
        self.node(id).map(|node| &node.transform)
    }

    /// Composes local transforms from `id` up to the root.
    pub fn world_transform(&self, id: NodeId) -> Option<Mat4> {
        let mut world = self.node(id)?.transform.to_matrix();
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            world = world.then(&self.node(parent)?.transform.to_matrix());
            current = parent;
        }
        Some(world)
    }

    pub(crate) fn add_mesh(&mut self, mesh: Mesh) -> MeshId {
        self.meshes.push(mesh);
        MeshId(self.meshes.len() - 1)
    }

    pub(crate) fn add_child(&mut self, parent: NodeId, node: SceneNode) -> NodeId {
        NodeId(self.tree.add_child(parent.0, node))
    }

    pub(crate) fn transform_mut(&mut self, id: NodeId) -> Option<&mut Transform> {
        self.tree.get_mut(id.0).map(|node| &mut node.transform)
    }

    /// Walks the tree once, filling `scratch` with world-space draws and text placements.
    ///
    /// While the card image is not ready, every node whose material samples it is skipped
    /// together with its whole subtree.
    pub(crate) fn extract(&self, scratch: &mut SnapshotScratch, image_ready: bool, shimmer: f32) {
        scratch.begin();

        self.tree.traverse(
            |index, node, state: &mut SnapshotScratch| {
                if state.hidden_depth > 0 {
                    state.hidden_depth += 1;
                    return;
                }
                if !image_ready && node.requires_card_image() {
                    state.hidden_depth = 1;
                    state.hidden_nodes += 1;
                    return;
                }

                let local = node.transform.to_matrix();
                let world = match state.stack.last() {
                    Some(parent) => local.then(parent),
                    None => local,
                };
                state.stack.push(world);

                match &node.content {
                    NodeContent::Group => {}
                    NodeContent::Mesh { mesh, material } => {
                        let mut material = *material;
                        material.emissive_intensity = material.effective_emissive_intensity(shimmer);
                        state.draws.push(DrawItem {
                            node: NodeId(index),
                            kind: node.kind,
                            mesh: *mesh,
                            world,
                            material,
                        });
                    }
                    NodeContent::Text(_) => state.texts.push((NodeId(index), world)),
                }
            },
            |_index, _node, state: &mut SnapshotScratch| {
                if state.hidden_depth > 0 {
                    state.hidden_depth -= 1;
                    return;
                }
                state.stack.pop();
            },
            scratch,
        );
    }

    /// Resolves the text placements of the last extraction against this scene.
    pub(crate) fn text_items<'a>(&'a self, scratch: &SnapshotScratch) -> Vec<TextItem<'a>> {
        scratch
            .texts
            .iter()
            .filter_map(|(id, world)| {
                let block = self.node(*id)?.text_block()?;
                Some(TextItem {
                    node: *id,
                    world: *world,
                    block,
                })
            })
            .collect()
    }
}

/// Reusable buffers for [`Scene::extract`].
#[derive(Debug, Default)]
pub(crate) struct SnapshotScratch {
    stack: Vec<Mat4>,
    hidden_depth: usize,
    pub(crate) hidden_nodes: usize,
    pub(crate) draws: Vec<DrawItem>,
    pub(crate) texts: Vec<(NodeId, Mat4)>,
}

impl SnapshotScratch {
    fn begin(&mut self) {
        self.stack.clear();
        self.hidden_depth = 0;
        self.hidden_nodes = 0;
        self.draws.clear();
        self.texts.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Color;

    fn scene_with_hidden_branch() -> (Scene, NodeId, NodeId, NodeId) {
        let mut scene = Scene::new();
        let plane = scene.add_mesh(Mesh::plane(1.0, 1.0));
        let group = scene.add_child(
            scene.root(),
            SceneNode::group(NodeKind::Hinge, Transform::from_position(1.0, 0.0, 0.0)),
        );
        let image = scene.add_child(
            group,
            SceneNode::mesh(
                NodeKind::Panel(PanelKind::FrontCover),
                Transform::IDENTITY,
                plane,
                Material::textured(TextureSlot::CardImage),
            ),
        );
        let trim = scene.add_child(
            image,
            SceneNode::mesh(
                NodeKind::Trim,
                Transform::IDENTITY,
                plane,
                Material::color(Color::WHITE),
            ),
        );
        let page = scene.add_child(
            group,
            SceneNode::mesh(
                NodeKind::Panel(PanelKind::InsideLeft),
                Transform::from_position(0.0, 2.0, 0.0),
                plane,
                Material::color(Color::WHITE).with_emissive(Color::WHITE, 0.5).with_shimmer(),
            ),
        );
        let _ = trim;
        (scene, group, image, page)
    }

    #[test]
    fn epochs_are_unique() {
        assert_ne!(Scene::new().epoch(), Scene::new().epoch());
    }

    #[test]
    fn world_transform_composes_parents() {
        let (scene, _, _, page) = scene_with_hidden_branch();
        let world = scene.world_transform(page).unwrap();
        let origin = world.transform_point3d(Point3::origin()).unwrap();
        assert_eq!(origin, Point3::new(1.0, 2.0, 0.0));
    }

    #[test]
    fn extraction_hides_image_subtree_until_ready() {
        let (scene, _, image, page) = scene_with_hidden_branch();
        let mut scratch = SnapshotScratch::default();

        scene.extract(&mut scratch, false, 1.0);
        let nodes: Vec<NodeId> = scratch.draws.iter().map(|draw| draw.node).collect();
        assert_eq!(nodes, vec![page]);
        assert_eq!(scratch.hidden_nodes, 1);

        scene.extract(&mut scratch, true, 1.0);
        assert_eq!(scratch.draws.len(), 3);
        assert!(scratch.draws.iter().any(|draw| draw.node == image));
        assert_eq!(scratch.hidden_nodes, 0);
    }

    #[test]
    fn extraction_matches_world_transform() {
        let (scene, _, _, page) = scene_with_hidden_branch();
        let mut scratch = SnapshotScratch::default();
        scene.extract(&mut scratch, true, 1.0);

        let draw = scratch.draws.iter().find(|draw| draw.node == page).unwrap();
        assert_eq!(draw.world, scene.world_transform(page).unwrap());
    }

    #[test]
    fn extraction_applies_shimmer_without_mutating_materials() {
        let (scene, _, _, page) = scene_with_hidden_branch();
        let mut scratch = SnapshotScratch::default();
        scene.extract(&mut scratch, true, 1.5);

        let draw = scratch.draws.iter().find(|draw| draw.node == page).unwrap();
        assert_eq!(draw.material.emissive_intensity, 0.75);
        assert_eq!(
            scene.node(page).unwrap().material().unwrap().emissive_intensity,
            0.5
        );
    }

    #[test]
    fn transform_mutation_keeps_structure() {
        let (mut scene, group, _, _) = scene_with_hidden_branch();
        let before = scene.len();
        scene.transform_mut(group).unwrap().rotation.y = 1.0;
        assert_eq!(scene.len(), before);
        assert_eq!(scene.transform(group).unwrap().rotation.y, 1.0);
        assert_eq!(scene.children(group).len(), 2);
    }
}
