//! Procedural card construction for each [`CardFormat`].
//!
//! The builder creates the whole node hierarchy in one go:
//!
//! ```text
//! root
//! └── stage (fixed tilt)
//!     └── card group (idle float and yaw)
//!         └── spread (turns and slides a quadfold so its open V faces the viewer)
//!             ├── spine
//!             ├── front hinge ── front cover (image), frame strips, inside-left page [motifs]
//!             └── back hinge ─── inside-right page [title, ring, body], back cover [branding]
//! ```
//!
//! A single card has no spine or hinges; the image plane hangs directly off the card group.

use crate::animator::open_angle;
use crate::cache::Cache;
use crate::config::{CardFormat, ImageSource};
use crate::id::NodeId;
use crate::overlay::{self, DECORATION_LIFT, MOTIF_SLOTS};
use crate::scene::{
    Material, Mesh, NodeKind, PanelKind, Scene, SceneNode, TextureSlot, Transform,
};
use crate::text::TextBlock;
use crate::theme::ThemeProfile;
use lyon::tessellation::FillTessellator;
use smallvec::SmallVec;
use std::f32::consts::{FRAC_PI_2, PI};

pub const CARD_WIDTH: f32 = 2.0;
/// 3:4 portrait.
pub const CARD_HEIGHT: f32 = 2.67;
pub const PAGE_THICKNESS: f32 = 0.02;
/// Air between the two leaves when closed.
pub const LEAF_GAP: f32 = 0.01;
pub const SPINE_WIDTH: f32 = 0.03;
pub const FRAME_WIDTH: f32 = 0.06;
pub const FRAME_DEPTH: f32 = 0.01;
/// Constant backward tilt of the whole card, radians about X.
pub const STAGE_TILT: f32 = 0.1;

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("failed to tessellate {shape} outline: {message}")]
    Tessellation { shape: &'static str, message: String },
}

/// A pivot the animator swings. Its Y rotation is `sign * share * fold_angle`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hinge {
    pub node: NodeId,
    pub sign: f32,
    pub share: f32,
}

impl Hinge {
    pub fn rotation_for(&self, fold_angle: f32) -> f32 {
        self.sign * self.share * fold_angle
    }
}

/// The group carrying the spine and both hinges. Its pose is linear in the fold angle.
///
/// A bifold keeps it still. A quadfold opens both leaves symmetrically about the spine, so
/// the spread turns a quarter turn and slides the spine to the card centre by the time the
/// fold is fully open, leaving both inside pages facing the viewer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spread {
    pub node: NodeId,
    /// Spine position along X while closed.
    pub rest_x: f32,
    pub slide_per_radian: f32,
    pub yaw_per_radian: f32,
}

impl Spread {
    pub fn position_x_for(&self, fold_angle: f32) -> f32 {
        self.rest_x + self.slide_per_radian * fold_angle
    }

    pub fn yaw_for(&self, fold_angle: f32) -> f32 {
        self.yaw_per_radian * fold_angle
    }
}

/// The constructed card: its scene plus handles to the nodes that matter.
#[derive(Debug)]
pub struct CardAssembly {
    scene: Scene,
    format: CardFormat,
    image: ImageSource,
    card_group: NodeId,
    hinges: SmallVec<[Hinge; 2]>,
    spread: Option<Spread>,
    panels: SmallVec<[(PanelKind, NodeId); 5]>,
    motifs: Vec<NodeId>,
    greeting_body: Option<NodeId>,
}

impl CardAssembly {
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub(crate) fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn format(&self) -> CardFormat {
        self.format
    }

    pub fn image(&self) -> &ImageSource {
        &self.image
    }

    pub fn card_group(&self) -> NodeId {
        self.card_group
    }

    pub fn hinges(&self) -> &[Hinge] {
        &self.hinges
    }

    pub fn spread(&self) -> Option<Spread> {
        self.spread
    }

    /// Every panel node with its role, spine included.
    pub fn panels(&self) -> &[(PanelKind, NodeId)] {
        &self.panels
    }

    pub fn panel(&self, kind: PanelKind) -> Option<NodeId> {
        self.panels
            .iter()
            .find(|(panel_kind, _)| *panel_kind == kind)
            .map(|(_, id)| *id)
    }

    /// Faces carrying printed content, i.e. every panel except the spine.
    pub fn face_count(&self) -> usize {
        self.panels
            .iter()
            .filter(|(kind, _)| *kind != PanelKind::Spine)
            .count()
    }

    pub fn motifs(&self) -> &[NodeId] {
        &self.motifs
    }

    /// The message shown on the greeting page.
    pub fn greeting_body(&self) -> Option<&TextBlock> {
        self.scene.node(self.greeting_body?)?.text_block()
    }

    /// Local transforms of every node in arena order.
    pub fn pose(&self) -> Vec<Transform> {
        self.scene.nodes().map(|(_, node)| node.transform).collect()
    }
}

/// Builds card assemblies, keeping decorative tessellations cached between builds.
pub struct GeometryBuilder {
    tessellator: FillTessellator,
    cache: Cache,
}

impl Default for GeometryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GeometryBuilder {
    pub fn new() -> Self {
        Self {
            tessellator: FillTessellator::new(),
            cache: Cache::default(),
        }
    }

    pub fn cached_shapes(&self) -> usize {
        self.cache.len()
    }

    pub fn build(
        &mut self,
        format: CardFormat,
        profile: &ThemeProfile,
        image: &ImageSource,
        custom_message: Option<&str>,
    ) -> Result<CardAssembly, BuildError> {
        let mut scene = Scene::new();
        let root = scene.root();
        let stage = scene.add_child(
            root,
            SceneNode::group(
                NodeKind::Stage,
                Transform::IDENTITY.with_rotation(STAGE_TILT, 0.0, 0.0),
            ),
        );
        let card_group = scene.add_child(
            stage,
            SceneNode::group(NodeKind::CardGroup, Transform::IDENTITY),
        );
        let page_mesh = scene.add_mesh(Mesh::plane(CARD_WIDTH, CARD_HEIGHT));

        let mut assembly = CardAssembly {
            scene,
            format,
            image: image.clone(),
            card_group,
            hinges: SmallVec::new(),
            spread: None,
            panels: SmallVec::new(),
            motifs: Vec::new(),
            greeting_body: None,
        };

        match format {
            CardFormat::Single => {
                let front = assembly.scene.add_child(
                    card_group,
                    SceneNode::mesh(
                        NodeKind::Panel(PanelKind::FrontCover),
                        Transform::IDENTITY,
                        page_mesh,
                        Material::textured(TextureSlot::CardImage),
                    ),
                );
                assembly.panels.push((PanelKind::FrontCover, front));
            }
            CardFormat::Bifold | CardFormat::Quadfold => {
                self.build_folding(&mut assembly, profile, custom_message, page_mesh)?;
            }
        }

        tracing::debug!(
            format = %format,
            nodes = assembly.scene.len(),
            meshes = assembly.scene.meshes().len(),
            "card geometry built"
        );

        Ok(assembly)
    }

    fn build_folding(
        &mut self,
        assembly: &mut CardAssembly,
        profile: &ThemeProfile,
        custom_message: Option<&str>,
        page_mesh: crate::id::MeshId,
    ) -> Result<(), BuildError> {
        // Tessellate first so a failure leaves nothing half-built behind.
        let motif_parts = match assembly.format {
            CardFormat::Quadfold => Some(overlay::motif_parts(
                profile.decorative_motif,
                profile,
                &mut self.tessellator,
                &mut self.cache,
            )?),
            _ => None,
        };
        let ring = overlay::ring_part(profile, &mut self.tessellator, &mut self.cache)?;

        let (front_share, back_share) = match assembly.format {
            CardFormat::Quadfold => (0.5, 0.5),
            _ => (1.0, 0.0),
        };

        let half_width = CARD_WIDTH * 0.5;
        let leaf_offset = (PAGE_THICKNESS + LEAF_GAP) * 0.5;
        let scene = &mut assembly.scene;
        let card_group = assembly.card_group;

        let spread_node = scene.add_child(
            card_group,
            SceneNode::group(NodeKind::Spread, Transform::from_position(-half_width, 0.0, 0.0)),
        );
        let spread = match assembly.format {
            CardFormat::Quadfold => {
                let full = open_angle(CardFormat::Quadfold);
                Spread {
                    node: spread_node,
                    rest_x: -half_width,
                    slide_per_radian: half_width / full,
                    yaw_per_radian: -FRAC_PI_2 / full,
                }
            }
            _ => Spread {
                node: spread_node,
                rest_x: -half_width,
                slide_per_radian: 0.0,
                yaw_per_radian: 0.0,
            },
        };

        let spine_mesh = scene.add_mesh(Mesh::slab(
            SPINE_WIDTH,
            CARD_HEIGHT,
            2.0 * PAGE_THICKNESS + LEAF_GAP,
        ));
        let spine = scene.add_child(
            spread_node,
            SceneNode::mesh(
                NodeKind::Panel(PanelKind::Spine),
                Transform::from_position(-SPINE_WIDTH * 0.5, 0.0, 0.0),
                spine_mesh,
                Material::color(profile.primary_color),
            ),
        );

        let front_hinge = scene.add_child(
            spread_node,
            SceneNode::group(
                NodeKind::Hinge,
                Transform::from_position(0.0, 0.0, leaf_offset),
            ),
        );
        let back_hinge = scene.add_child(
            spread_node,
            SceneNode::group(
                NodeKind::Hinge,
                Transform::from_position(0.0, 0.0, -leaf_offset),
            ),
        );

        // Front leaf: the image, its frame, and the page behind it.
        let front = scene.add_child(
            front_hinge,
            SceneNode::mesh(
                NodeKind::Panel(PanelKind::FrontCover),
                Transform::from_position(half_width, 0.0, PAGE_THICKNESS * 0.5),
                page_mesh,
                Material::textured(TextureSlot::CardImage),
            ),
        );

        let frame_material = Material::metallic(profile.secondary_color);
        let frame_z = PAGE_THICKNESS * 0.5 + FRAME_DEPTH * 0.5;
        let horizontal = scene.add_mesh(Mesh::slab(CARD_WIDTH, FRAME_WIDTH, FRAME_DEPTH));
        let vertical = scene.add_mesh(Mesh::slab(
            FRAME_WIDTH,
            CARD_HEIGHT - 2.0 * FRAME_WIDTH,
            FRAME_DEPTH,
        ));
        let strips = [
            (horizontal, half_width, CARD_HEIGHT * 0.5 - FRAME_WIDTH * 0.5),
            (horizontal, half_width, -CARD_HEIGHT * 0.5 + FRAME_WIDTH * 0.5),
            (vertical, FRAME_WIDTH * 0.5, 0.0),
            (vertical, CARD_WIDTH - FRAME_WIDTH * 0.5, 0.0),
        ];
        for (mesh, x, y) in strips {
            scene.add_child(
                front_hinge,
                SceneNode::mesh(
                    NodeKind::Trim,
                    Transform::from_position(x, y, frame_z),
                    mesh,
                    frame_material,
                ),
            );
        }

        let inside_left = scene.add_child(
            front_hinge,
            SceneNode::mesh(
                NodeKind::Panel(PanelKind::InsideLeft),
                Transform::from_position(half_width, 0.0, -PAGE_THICKNESS * 0.5)
                    .with_rotation(0.0, PI, 0.0),
                page_mesh,
                Material::color(profile.page_color),
            ),
        );

        if let Some(parts) = motif_parts {
            let part_meshes: SmallVec<[_; 3]> = parts
                .into_iter()
                .map(|part| (scene.add_mesh(part.mesh), part.material))
                .collect();
            for slot in MOTIF_SLOTS {
                let motif = scene.add_child(
                    inside_left,
                    SceneNode::group(
                        NodeKind::Motif,
                        Transform::from_position(slot.x, slot.y, DECORATION_LIFT)
                            .with_scale(slot.scale),
                    ),
                );
                for (index, (mesh, material)) in part_meshes.iter().enumerate() {
                    // Stack parts slightly so overlapping pieces resolve deterministically.
                    let lift = index as f32 * DECORATION_LIFT;
                    scene.add_child(
                        motif,
                        SceneNode::mesh(
                            NodeKind::Motif,
                            Transform::from_position(0.0, 0.0, lift),
                            *mesh,
                            *material,
                        ),
                    );
                }
                assembly.motifs.push(motif);
            }
        }

        // Back leaf: greeting page facing the reader, branding on the outside.
        let inside_right = scene.add_child(
            back_hinge,
            SceneNode::mesh(
                NodeKind::Panel(PanelKind::InsideRight),
                Transform::from_position(half_width, 0.0, PAGE_THICKNESS * 0.5),
                page_mesh,
                Material::color(profile.page_color),
            ),
        );

        let greeting = overlay::greeting_layout(profile, custom_message);
        scene.add_child(
            inside_right,
            SceneNode::text(
                Transform::from_position(
                    greeting.title_origin[0],
                    greeting.title_origin[1],
                    DECORATION_LIFT,
                ),
                greeting.title,
            ),
        );
        let ring_mesh = scene.add_mesh(ring.mesh);
        scene.add_child(
            inside_right,
            SceneNode::mesh(
                NodeKind::Trim,
                Transform::from_position(
                    greeting.ring_center[0],
                    greeting.ring_center[1],
                    DECORATION_LIFT,
                )
                .with_scale(greeting.ring_radius),
                ring_mesh,
                ring.material,
            ),
        );
        let body = scene.add_child(
            inside_right,
            SceneNode::text(
                Transform::from_position(
                    greeting.body_origin[0],
                    greeting.body_origin[1],
                    DECORATION_LIFT,
                ),
                greeting.body,
            ),
        );

        let back_cover = scene.add_child(
            back_hinge,
            SceneNode::mesh(
                NodeKind::Panel(PanelKind::BackCover),
                Transform::from_position(half_width, 0.0, -PAGE_THICKNESS * 0.5)
                    .with_rotation(0.0, PI, 0.0),
                page_mesh,
                Material::color(profile.primary_color),
            ),
        );
        let (branding, branding_origin) = overlay::branding_layout(profile);
        scene.add_child(
            back_cover,
            SceneNode::text(
                Transform::from_position(branding_origin[0], branding_origin[1], DECORATION_LIFT),
                branding,
            ),
        );

        assembly.hinges.push(Hinge {
            node: front_hinge,
            sign: -1.0,
            share: front_share,
        });
        assembly.hinges.push(Hinge {
            node: back_hinge,
            sign: 1.0,
            share: back_share,
        });
        assembly.spread = Some(spread);
        assembly.panels.extend([
            (PanelKind::FrontCover, front),
            (PanelKind::InsideLeft, inside_left),
            (PanelKind::InsideRight, inside_right),
            (PanelKind::BackCover, back_cover),
            (PanelKind::Spine, spine),
        ]);
        assembly.greeting_body = Some(body);

        Ok(())
    }
}

/// Builds a card with a throwaway builder. Prefer [`GeometryBuilder`] when rebuilding.
pub fn build(
    format: CardFormat,
    profile: &ThemeProfile,
    image: &ImageSource,
    custom_message: Option<&str>,
) -> Result<CardAssembly, BuildError> {
    GeometryBuilder::new().build(format, profile, image, custom_message)
}
