//! The interactive preview session.
//!
//! [`CardPreview`] owns everything a mounted card needs: the built assembly, the fold
//! animator, the particle field, camera, orbit controls and the pending image load. The
//! host drives it with [`CardPreview::handle_input`] and one [`CardPreview::frame`] call per
//! display refresh, then hands the returned [`FrameSnapshot`] to a renderer.

use crate::animator::{FoldAnimator, FoldState, DEFAULT_SMOOTHING};
use crate::camera::{Camera, OrbitControls};
use crate::config::{CardConfiguration, CardFormat};
use crate::geometry::{BuildError, CardAssembly, GeometryBuilder};
use crate::lighting::LightingRig;
use crate::overlay::Shimmer;
use crate::particles::{
    Particle, ParticleField, DEFAULT_PARTICLE_COUNT, DEFAULT_PARTICLE_SEED, POINT_OPACITY,
    POINT_SIZE,
};
use crate::scene::{DrawItem, Mat4, Scene, SnapshotScratch, TextItem};
use crate::texture::{DecodedImage, TextureLoader, TextureState};
use crate::theme::ThemeProfile;
use crate::Color;
use std::sync::Arc;
use std::time::Instant;

/// Input routed into a running preview.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// Open a closed card, close an open one.
    Toggle,
    /// Pointer drag in physical pixels.
    Drag { dx: f32, dy: f32 },
    /// Wheel notches; positive zooms out.
    Scroll { delta: f32 },
    Resize { width: u32, height: u32 },
    /// Leave the preview. Fires the close callback.
    Close,
}

#[derive(Debug, thiserror::Error)]
pub enum PreviewError {
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error("the preview has been closed")]
    Closed,
}

/// Tunables of a preview session.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewSettings {
    pub smoothing: f32,
    pub particle_count: usize,
    pub particle_seed: u64,
    pub shimmer: Shimmer,
    pub orbit: OrbitControls,
    pub lighting: LightingRig,
    pub viewport: (u32, u32),
}

impl Default for PreviewSettings {
    fn default() -> Self {
        Self {
            smoothing: DEFAULT_SMOOTHING,
            particle_count: DEFAULT_PARTICLE_COUNT,
            particle_seed: DEFAULT_PARTICLE_SEED,
            shimmer: Shimmer::default(),
            orbit: OrbitControls::default(),
            lighting: LightingRig::default(),
            viewport: (800, 600),
        }
    }
}

impl PreviewSettings {
    pub fn with_smoothing(mut self, smoothing: f32) -> Self {
        self.smoothing = smoothing;
        self
    }

    pub fn with_particle_count(mut self, count: usize) -> Self {
        self.particle_count = count;
        self
    }

    pub fn with_particle_seed(mut self, seed: u64) -> Self {
        self.particle_seed = seed;
        self
    }

    pub fn with_shimmer(mut self, shimmer: Shimmer) -> Self {
        self.shimmer = shimmer;
        self
    }

    pub fn with_orbit(mut self, orbit: OrbitControls) -> Self {
        self.orbit = orbit;
        self
    }

    pub fn with_lighting(mut self, lighting: LightingRig) -> Self {
        self.lighting = lighting;
        self
    }

    pub fn with_viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport = (width, height);
        self
    }
}

/// Wall-clock time source for hosts that do not track time themselves.
#[derive(Debug, Clone, Copy)]
pub struct FrameClock {
    start: Instant,
    last: Instant,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last: now,
        }
    }

    /// Returns `(elapsed since start, delta since last tick)` in seconds.
    pub fn tick(&mut self) -> (f32, f32) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.start).as_secs_f32();
        let dt = now.duration_since(self.last).as_secs_f32();
        self.last = now;
        (elapsed, dt)
    }
}

/// The particle cloud as the renderer needs it.
#[derive(Debug, Clone, Copy)]
pub struct ParticleDraw<'a> {
    /// Identifies the field the points belong to.
    pub generation: u64,
    pub points: &'a [Particle],
    pub world: Mat4,
    pub size: f32,
    pub opacity: f32,
}

/// Everything needed to draw one frame. Borrowed from the preview until the next frame.
#[derive(Debug)]
pub struct FrameSnapshot<'a> {
    /// Identifies the scene the draws refer to. Changes whenever the card is rebuilt.
    pub epoch: u64,
    pub scene: &'a Scene,
    pub draws: &'a [DrawItem],
    pub texts: Vec<TextItem<'a>>,
    pub particles: ParticleDraw<'a>,
    pub card_image: Option<&'a Arc<DecodedImage>>,
    pub clear_color: Color,
    pub camera: Camera,
    pub aspect: f32,
    pub lighting: &'a LightingRig,
    pub fold: FoldState,
    pub elapsed: f32,
    /// Number of subtrees left out because the card image is not available.
    pub image_hidden: usize,
}

impl FrameSnapshot<'_> {
    pub fn view_projection(&self) -> Mat4 {
        self.camera.view_projection(self.aspect)
    }
}

pub struct CardPreview {
    config: CardConfiguration,
    profile: ThemeProfile,
    builder: GeometryBuilder,
    assembly: CardAssembly,
    animator: FoldAnimator,
    particles: ParticleField,
    camera: Camera,
    controls: OrbitControls,
    lighting: LightingRig,
    shimmer: Shimmer,
    loader: Option<TextureLoader>,
    card_image: Option<Arc<DecodedImage>>,
    scratch: SnapshotScratch,
    on_close: Option<Box<dyn FnOnce()>>,
    closed: bool,
    last_elapsed: Option<f32>,
    aspect: f32,
}

impl std::fmt::Debug for CardPreview {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardPreview")
            .field("theme", &self.config.theme)
            .field("format", &self.config.format)
            .field("fold", &self.animator.state())
            .field("image_ready", &self.card_image.is_some())
            .field("closed", &self.closed)
            .finish()
    }
}

impl CardPreview {
    /// Builds the card for `config` and starts the image load. Geometry is complete before
    /// this returns, so the first frame already animates a finished assembly.
    pub fn mount(
        config: CardConfiguration,
        settings: PreviewSettings,
        on_close: impl FnOnce() + 'static,
    ) -> Result<Self, PreviewError> {
        let profile = config.theme.profile();
        let mut builder = GeometryBuilder::new();
        let assembly = builder.build(
            config.format,
            &profile,
            &config.image,
            config.effective_custom_message(),
        )?;
        let animator = FoldAnimator::new(config.format).with_smoothing(settings.smoothing);
        let particles = ParticleField::build(
            settings.particle_count,
            profile.secondary_color,
            settings.particle_seed,
        );

        let mut controls = settings.orbit;
        let (width, height) = settings.viewport;
        controls.set_viewport_height(height as f32);
        let mut camera = Camera::default();
        controls.apply(&mut camera);

        let loader = TextureLoader::spawn(config.image.clone());

        tracing::info!(
            theme = %config.theme,
            format = %config.format,
            particles = particles.len(),
            "card preview mounted"
        );

        Ok(Self {
            config,
            profile,
            builder,
            assembly,
            animator,
            particles,
            camera,
            controls,
            lighting: settings.lighting,
            shimmer: settings.shimmer,
            loader: Some(loader),
            card_image: None,
            scratch: SnapshotScratch::default(),
            on_close: Some(Box::new(on_close)),
            closed: false,
            last_elapsed: None,
            aspect: aspect_ratio(width, height),
        })
    }

    pub fn config(&self) -> &CardConfiguration {
        &self.config
    }

    pub fn profile(&self) -> &ThemeProfile {
        &self.profile
    }

    pub fn assembly(&self) -> &CardAssembly {
        &self.assembly
    }

    pub fn fold_state(&self) -> FoldState {
        self.animator.state()
    }

    pub fn particles(&self) -> &ParticleField {
        &self.particles
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn controls(&self) -> &OrbitControls {
        &self.controls
    }

    pub fn texture_state(&self) -> Option<&TextureState> {
        self.loader.as_ref().map(TextureLoader::state)
    }

    pub fn card_image(&self) -> Option<&Arc<DecodedImage>> {
        self.card_image.as_ref()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Applies one input. Returns `false` once the preview is closed.
    pub fn handle_input(&mut self, event: InputEvent) -> bool {
        if self.closed {
            return false;
        }
        match event {
            InputEvent::Toggle => {
                let open = self.animator.toggle();
                tracing::debug!(open, "fold toggled");
            }
            InputEvent::Drag { dx, dy } => self.controls.drag(dx, dy),
            InputEvent::Scroll { delta } => self.controls.scroll(delta),
            InputEvent::Resize { width, height } => {
                self.aspect = aspect_ratio(width, height);
                self.controls.set_viewport_height(height as f32);
            }
            InputEvent::Close => {
                self.close();
                return false;
            }
        }
        true
    }

    /// Rebuilds the card for another format. The fold resets to closed; the image, theme and
    /// message are kept. Selecting the current format again changes nothing.
    pub fn set_format(&mut self, format: CardFormat) -> Result<(), PreviewError> {
        if self.closed {
            return Err(PreviewError::Closed);
        }
        if format == self.config.format {
            return Ok(());
        }
        let assembly = self.builder.build(
            format,
            &self.profile,
            &self.config.image,
            self.config.effective_custom_message(),
        )?;
        self.assembly = assembly;
        self.config.format = format;
        self.animator.reset(format);
        tracing::debug!(
            format = %format,
            cached_shapes = self.builder.cached_shapes(),
            "card rebuilt for new format"
        );
        Ok(())
    }

    /// Advances the session to `elapsed` seconds since mount and returns what to draw.
    /// Returns `None` after [`close`](Self::close).
    pub fn frame(&mut self, elapsed: f32) -> Option<FrameSnapshot<'_>> {
        if self.closed {
            return None;
        }
        let dt = self
            .last_elapsed
            .map(|last| (elapsed - last).max(0.0))
            .unwrap_or(0.0);
        self.last_elapsed = Some(elapsed);

        self.poll_texture();

        self.animator.update(&mut self.assembly, elapsed);
        self.particles.update(elapsed);
        let shimmer = self.shimmer.factor(elapsed);

        let fold = self.animator.state();
        self.controls.update(dt, !fold.is_open);
        self.controls.apply(&mut self.camera);

        let scene = self.assembly.scene();
        scene.extract(&mut self.scratch, self.card_image.is_some(), shimmer);

        Some(FrameSnapshot {
            epoch: scene.epoch(),
            scene,
            draws: &self.scratch.draws,
            texts: scene.text_items(&self.scratch),
            particles: ParticleDraw {
                generation: self.particles.generation(),
                points: self.particles.particles(),
                world: self.particles.world(),
                size: POINT_SIZE,
                opacity: POINT_OPACITY,
            },
            card_image: self.card_image.as_ref(),
            clear_color: self.profile.background_color,
            camera: self.camera,
            aspect: self.aspect,
            lighting: &self.lighting,
            fold,
            elapsed,
            image_hidden: self.scratch.hidden_nodes,
        })
    }

    /// Tears the session down: cancels a pending image load and fires the close callback.
    /// Idempotent.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Some(loader) = self.loader.as_mut() {
            loader.cancel();
        }
        if let Some(on_close) = self.on_close.take() {
            on_close();
        }
        tracing::info!("card preview closed");
    }

    fn poll_texture(&mut self) {
        if self.card_image.is_some() {
            return;
        }
        if let Some(loader) = self.loader.as_mut() {
            if let TextureState::Ready(image) = loader.poll() {
                self.card_image = Some(image.clone());
            }
        }
    }
}

fn aspect_ratio(width: u32, height: u32) -> f32 {
    if width == 0 || height == 0 {
        1.0
    } else {
        width as f32 / height as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ImageSource;
    use crate::scene::{NodeKind, PanelKind};
    use crate::theme::Theme;
    use std::cell::Cell;
    use std::rc::Rc;

    fn rgba_image() -> ImageSource {
        ImageSource::Rgba {
            width: 2,
            height: 2,
            pixels: Arc::from(vec![255u8; 16]),
        }
    }

    fn mount(format: CardFormat, image: ImageSource) -> (CardPreview, Rc<Cell<u32>>) {
        let closes = Rc::new(Cell::new(0));
        let counter = closes.clone();
        let preview = CardPreview::mount(
            CardConfiguration::new(image, Theme::NewYear, format),
            PreviewSettings::default().with_particle_count(20),
            move || counter.set(counter.get() + 1),
        )
        .unwrap();
        (preview, closes)
    }

    #[test]
    fn front_cover_appears_once_the_image_resolves() {
        let (mut preview, _) = mount(CardFormat::Bifold, rgba_image());
        let snapshot = preview.frame(0.0).unwrap();
        assert!(snapshot.card_image.is_some());
        assert_eq!(snapshot.image_hidden, 0);
        assert!(snapshot
            .draws
            .iter()
            .any(|draw| draw.kind == NodeKind::Panel(PanelKind::FrontCover)));
    }

    #[test]
    fn broken_image_hides_only_the_front_cover() {
        let (mut preview, _) = mount(CardFormat::Bifold, ImageSource::data_uri("bogus"));
        let snapshot = preview.frame(0.0).unwrap();
        assert!(snapshot.card_image.is_none());
        assert_eq!(snapshot.image_hidden, 1);
        assert!(!snapshot
            .draws
            .iter()
            .any(|draw| draw.kind == NodeKind::Panel(PanelKind::FrontCover)));
        assert!(snapshot
            .draws
            .iter()
            .any(|draw| draw.kind == NodeKind::Panel(PanelKind::BackCover)));
        assert!(matches!(preview.texture_state(), Some(TextureState::Failed(_))));
    }

    #[test]
    fn toggle_opens_and_auto_rotate_pauses() {
        let (mut preview, _) = mount(CardFormat::Bifold, rgba_image());
        preview.frame(0.0);
        assert!(preview.handle_input(InputEvent::Toggle));
        let azimuth = preview.controls().azimuth();
        for frame in 1..=30 {
            preview.frame(frame as f32 / 60.0);
        }
        assert!(preview.fold_state().is_open);
        assert!(preview.fold_state().current_angle > 0.0);
        // Residual motion from before the toggle is still damped out, but no new drift.
        assert!((preview.controls().azimuth() - azimuth).abs() < 1e-3);
    }

    #[test]
    fn close_fires_once_and_stops_frames() {
        let (mut preview, closes) = mount(CardFormat::Quadfold, rgba_image());
        assert!(!preview.handle_input(InputEvent::Close));
        preview.close();
        assert_eq!(closes.get(), 1);
        assert!(preview.is_closed());
        assert!(preview.frame(1.0).is_none());
        assert!(!preview.handle_input(InputEvent::Toggle));
        assert!(matches!(
            preview.set_format(CardFormat::Bifold),
            Err(PreviewError::Closed)
        ));
    }

    #[test]
    fn set_format_rebuilds_closed() {
        let (mut preview, _) = mount(CardFormat::Bifold, rgba_image());
        preview.handle_input(InputEvent::Toggle);
        preview.frame(0.0);
        let epoch = preview.assembly().scene().epoch();

        preview.set_format(CardFormat::Quadfold).unwrap();
        assert_eq!(preview.config().format, CardFormat::Quadfold);
        assert_eq!(preview.fold_state(), FoldState::CLOSED);
        assert_ne!(preview.assembly().scene().epoch(), epoch);
        let snapshot = preview.frame(0.1).unwrap();
        assert_eq!(snapshot.epoch, snapshot.scene.epoch());
        assert!(!snapshot.fold.is_open);
    }

    #[test]
    fn resize_updates_aspect() {
        let (mut preview, _) = mount(CardFormat::Single, rgba_image());
        preview.handle_input(InputEvent::Resize {
            width: 1600,
            height: 800,
        });
        assert_eq!(preview.frame(0.0).unwrap().aspect, 2.0);
        preview.handle_input(InputEvent::Resize {
            width: 0,
            height: 0,
        });
        assert_eq!(preview.frame(0.1).unwrap().aspect, 1.0);
    }

    #[test]
    fn clear_color_is_the_theme_background() {
        let closes = Rc::new(Cell::new(0));
        let mut preview = CardPreview::mount(
            CardConfiguration::new(rgba_image(), Theme::Lunar, CardFormat::Single),
            PreviewSettings::default(),
            move || closes.set(1),
        )
        .unwrap();
        let expected = Theme::Lunar.profile().background_color;
        assert_eq!(preview.frame(0.0).unwrap().clear_color, expected);
    }

    #[test]
    fn frame_clock_is_monotonic() {
        let mut clock = FrameClock::new();
        let (first, _) = clock.tick();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let (second, dt) = clock.tick();
        assert!(second > first);
        assert!(dt > 0.0 && dt <= second);
    }

    #[test]
    fn set_format_to_the_current_format_is_a_no_op() {
        let (mut preview, _) = mount(CardFormat::Bifold, rgba_image());
        preview.handle_input(InputEvent::Toggle);
        for frame in 0..60 {
            preview.frame(frame as f32 / 60.0);
        }
        let before = preview.fold_state();
        assert!(before.current_angle > 2.0);

        preview.set_format(CardFormat::Bifold).unwrap();
        assert_eq!(preview.fold_state(), before);
    }
}
