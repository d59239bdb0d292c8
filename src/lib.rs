//! Animated 3D preview of fold-out greeting cards.
//!
//! A [`CardConfiguration`] (image, theme, format, optional message) is turned into a scene of
//! hinged panels by the [`GeometryBuilder`]. A [`CardPreview`] owns that scene together with
//! the fold animation, the ambient particle cloud, the camera and its orbit controls, and
//! produces one [`FrameSnapshot`] per frame for the [`Renderer`].
//!
//! ```rust,no_run
//! use foldcard::{CardConfiguration, CardFormat, CardPreview, ImageSource, InputEvent, PreviewSettings, Theme};
//!
//! let config = CardConfiguration::new(
//!     ImageSource::data_uri("data:image/png;base64,..."),
//!     Theme::Lunar,
//!     CardFormat::Bifold,
//! );
//! let mut preview = CardPreview::mount(config, PreviewSettings::default(), || {}).unwrap();
//! preview.handle_input(InputEvent::Toggle);
//! if let Some(frame) = preview.frame(0.016) {
//!     println!("{} draws", frame.draws.len());
//! }
//! ```

pub use wgpu;

mod animator;
mod cache;
mod camera;
mod color;
mod config;
mod geometry;
mod id;
mod lighting;
mod overlay;
mod particles;
mod pipeline;
mod preview;
mod renderer;
mod scene;
mod text;
mod texture;
mod texture_manager;
mod theme;
mod util;

pub use animator::{
    open_angle, FoldAnimator, FoldState, IdleMotion, BIFOLD_OPEN_ANGLE, DEFAULT_SMOOTHING,
    QUADFOLD_OPEN_ANGLE,
};
pub use camera::{Camera, OrbitControls};
pub use color::Color;
pub use config::{
    offers_fold_preview, CardConfiguration, CardFormat, CardStyle, ConfigError, ImageSource,
};
pub use geometry::{
    build, BuildError, CardAssembly, GeometryBuilder, Hinge, Spread, CARD_HEIGHT, CARD_WIDTH,
    PAGE_THICKNESS,
};
pub use id::{MeshId, NodeId, TextureId};
pub use lighting::{AmbientLight, DirectionalLight, LightingRig, PointLight, SpotLight};
pub use overlay::{
    branding_layout, greeting_layout, star_outline, GreetingLayout, MotifSlot, Shimmer,
    MOTIF_SLOTS,
};
pub use particles::{Particle, ParticleField, DEFAULT_PARTICLE_COUNT, FIELD_EXTENT};
pub use pipeline::{DrawUniforms, FrameUniforms};
pub use preview::{
    CardPreview, FrameClock, FrameSnapshot, InputEvent, ParticleDraw, PreviewError,
    PreviewSettings,
};
pub use renderer::{Renderer, RendererError};
pub use scene::{
    DrawItem, Mat4, Material, Mesh, MeshVertex, NodeContent, NodeKind, PanelKind, Point3, Scene,
    SceneNode, TextItem, TextureSlot, Transform, Vec3,
};
pub use text::{TextAlignment, TextBlock, TextLayout};
pub use texture::{decode_image, DecodedImage, TextureError, TextureLoader, TextureState};
pub use texture_manager::{TextureManager, TextureManagerError};
pub use theme::{resolve, Motif, Theme, ThemeProfile};
