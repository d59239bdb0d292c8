//! Turning the opaque [`ImageSource`] into RGBA8 pixels.
//!
//! Decoding is wrapped in a boxed local future that the preview polls once per frame with a
//! no-op waker. Dropping the [`TextureLoader`] cancels a load that has not finished.

use crate::config::ImageSource;
use crate::id::TextureId;
use base64::{engine::general_purpose::STANDARD, Engine};
use futures::task::noop_waker_ref;
use regex::Regex;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::task::{Context, Poll};

#[derive(Debug, thiserror::Error)]
pub enum TextureError {
    #[error("not a base64 image data URI")]
    InvalidDataUri,
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("image has no pixels ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },
    #[error("expected {expected} bytes of RGBA pixels, got {actual}")]
    PixelCount { expected: usize, actual: usize },
}

static NEXT_IMAGE_ID: AtomicU64 = AtomicU64::new(1);

/// Tightly packed RGBA8 pixels.
///
/// Every decode gets a fresh [`TextureId`]; clones share it. Equality compares pixels only.
#[derive(Clone)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
    id: TextureId,
}

impl PartialEq for DecodedImage {
    fn eq(&self, other: &Self) -> bool {
        self.width == other.width && self.height == other.height && self.pixels == other.pixels
    }
}

impl std::fmt::Debug for DecodedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodedImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("id", &self.id)
            .finish()
    }
}

impl DecodedImage {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self {
            width,
            height,
            pixels,
            id: TextureId(NEXT_IMAGE_ID.fetch_add(1, Ordering::Relaxed)),
        }
    }

    /// Identity of this decode on the GPU side.
    pub fn texture_id(&self) -> TextureId {
        self.id
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

fn data_uri_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"(?s)^data:image/[\w.+-]+;base64,(?P<payload>.*)$").ok())
        .as_ref()
}

/// Extracts the base64 payload of a `data:image/...;base64,` URI.
pub fn data_uri_payload(uri: &str) -> Result<&str, TextureError> {
    data_uri_pattern()
        .and_then(|pattern| pattern.captures(uri.trim()))
        .and_then(|captures| captures.name("payload"))
        .map(|payload| payload.as_str())
        .ok_or(TextureError::InvalidDataUri)
}

fn check_dimensions(width: u32, height: u32) -> Result<(), TextureError> {
    if width == 0 || height == 0 {
        return Err(TextureError::EmptyImage { width, height });
    }
    Ok(())
}

fn decode_encoded(bytes: &[u8]) -> Result<DecodedImage, TextureError> {
    let rgba = image::load_from_memory(bytes)?.to_rgba8();
    let (width, height) = rgba.dimensions();
    check_dimensions(width, height)?;
    Ok(DecodedImage::new(width, height, rgba.into_raw()))
}

/// Decodes any supported image reference to RGBA8.
pub fn decode_image(source: &ImageSource) -> Result<DecodedImage, TextureError> {
    match source {
        ImageSource::DataUri(uri) => {
            let payload = data_uri_payload(uri)?;
            let bytes = STANDARD.decode(payload.trim())?;
            decode_encoded(&bytes)
        }
        ImageSource::Encoded(bytes) => decode_encoded(bytes),
        ImageSource::Rgba {
            width,
            height,
            pixels,
        } => {
            check_dimensions(*width, *height)?;
            let expected = *width as usize * *height as usize * 4;
            if pixels.len() != expected {
                return Err(TextureError::PixelCount {
                    expected,
                    actual: pixels.len(),
                });
            }
            Ok(DecodedImage::new(*width, *height, pixels.to_vec()))
        }
    }
}

type DecodeFuture = Pin<Box<dyn Future<Output = Result<DecodedImage, TextureError>>>>;

#[derive(Debug, Clone)]
pub enum TextureState {
    Pending,
    Ready(Arc<DecodedImage>),
    Failed(Arc<TextureError>),
    /// The load was dropped before it finished.
    Cancelled,
}

impl TextureState {
    pub fn is_ready(&self) -> bool {
        matches!(self, TextureState::Ready(_))
    }
}

/// A single-threaded, cancellable image load.
pub struct TextureLoader {
    future: Option<DecodeFuture>,
    state: TextureState,
}

impl std::fmt::Debug for TextureLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextureLoader")
            .field("in_flight", &self.future.is_some())
            .field("state", &self.state)
            .finish()
    }
}

impl TextureLoader {
    /// Starts decoding `source`. Nothing happens until the first [`poll`](Self::poll).
    pub fn spawn(source: ImageSource) -> Self {
        Self::from_future(async move { decode_image(&source) })
    }

    /// Wraps any decode future, e.g. one that fetches bytes from a host cache first.
    pub fn from_future(
        future: impl Future<Output = Result<DecodedImage, TextureError>> + 'static,
    ) -> Self {
        Self {
            future: Some(Box::pin(future)),
            state: TextureState::Pending,
        }
    }

    /// Polls the load once. Never blocks.
    pub fn poll(&mut self) -> &TextureState {
        if let Some(future) = self.future.as_mut() {
            let mut context = Context::from_waker(noop_waker_ref());
            if let Poll::Ready(result) = future.as_mut().poll(&mut context) {
                self.future = None;
                self.state = match result {
                    Ok(image) => {
                        tracing::debug!(
                            width = image.width,
                            height = image.height,
                            "card image decoded"
                        );
                        TextureState::Ready(Arc::new(image))
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "card image failed to load; front panel stays hidden");
                        TextureState::Failed(Arc::new(err))
                    }
                };
            }
        }
        &self.state
    }

    pub fn state(&self) -> &TextureState {
        &self.state
    }

    pub fn is_in_flight(&self) -> bool {
        self.future.is_some()
    }

    /// Drops an unfinished load.
    pub fn cancel(&mut self) {
        if self.future.take().is_some() {
            tracing::debug!("pending card image load cancelled");
            self.state = TextureState::Cancelled;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let image = image::RgbaImage::from_pixel(width, height, image::Rgba([10, 20, 30, 255]));
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn decodes_png_data_uri() {
        let uri = format!("data:image/png;base64,{}", STANDARD.encode(png_bytes(3, 2)));
        let decoded = decode_image(&ImageSource::data_uri(uri)).unwrap();
        assert_eq!((decoded.width, decoded.height), (3, 2));
        assert_eq!(&decoded.pixels[..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn every_decode_gets_its_own_texture_id() {
        let source = ImageSource::Encoded(Arc::from(png_bytes(2, 2)));
        let first = decode_image(&source).unwrap();
        let second = decode_image(&source).unwrap();
        assert_eq!(first, second);
        assert_ne!(first.texture_id(), second.texture_id());
        assert_eq!(first.clone().texture_id(), first.texture_id());
    }

    #[test]
    fn rejects_non_image_uri() {
        let error = decode_image(&ImageSource::data_uri("data:text/plain;base64,AAAA")).unwrap_err();
        assert!(matches!(error, TextureError::InvalidDataUri));
    }

    #[test]
    fn rejects_bad_base64_and_bad_bytes() {
        assert!(matches!(
            decode_image(&ImageSource::data_uri("data:image/png;base64,@@@")),
            Err(TextureError::Base64(_))
        ));
        assert!(matches!(
            decode_image(&ImageSource::Encoded(Arc::from(&b"not an image"[..]))),
            Err(TextureError::Decode(_))
        ));
    }

    #[test]
    fn validates_raw_rgba() {
        let empty = ImageSource::Rgba {
            width: 0,
            height: 4,
            pixels: Arc::from(Vec::new()),
        };
        assert!(matches!(
            decode_image(&empty),
            Err(TextureError::EmptyImage { .. })
        ));

        let short = ImageSource::Rgba {
            width: 2,
            height: 2,
            pixels: Arc::from(vec![0u8; 15]),
        };
        assert!(matches!(
            decode_image(&short),
            Err(TextureError::PixelCount { expected: 16, actual: 15 })
        ));
    }

    #[test]
    fn loader_resolves_on_first_poll() {
        let mut loader = TextureLoader::spawn(ImageSource::Encoded(Arc::from(png_bytes(1, 1))));
        assert!(loader.is_in_flight());
        assert!(loader.poll().is_ready());
        assert!(!loader.is_in_flight());
    }

    #[test]
    fn loader_stays_pending_until_future_completes() {
        let mut loader = TextureLoader::from_future(futures::future::pending());
        assert!(matches!(loader.poll(), TextureState::Pending));
        assert!(matches!(loader.poll(), TextureState::Pending));
        loader.cancel();
        assert!(matches!(loader.state(), TextureState::Cancelled));
        assert!(matches!(loader.poll(), TextureState::Cancelled));
    }

    #[test]
    fn failed_load_is_reported_once() {
        let mut loader = TextureLoader::spawn(ImageSource::data_uri("nope"));
        assert!(matches!(loader.poll(), TextureState::Failed(_)));
        loader.cancel();
        assert!(matches!(loader.state(), TextureState::Failed(_)));
    }
}
