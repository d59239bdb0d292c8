use lru::LruCache;
use lyon::tessellation::VertexBuffers;
use std::num::NonZeroUsize;

/// Identifies a tessellated decorative outline. Outlines are built at unit scale and
/// positioned by their node transform, so the shape alone is a sufficient key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum ShapeKey {
    Star,
    LanternBody,
    LanternCap,
    LanternTassel,
    Ring,
}

impl ShapeKey {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            ShapeKey::Star => "star",
            ShapeKey::LanternBody => "lantern body",
            ShapeKey::LanternCap => "lantern cap",
            ShapeKey::LanternTassel => "lantern tassel",
            ShapeKey::Ring => "ring",
        }
    }
}

pub(crate) struct Cache {
    tessellation_cache: LruCache<ShapeKey, VertexBuffers<[f32; 2], u16>>,
}

impl Cache {
    pub(crate) fn new(size: NonZeroUsize) -> Self {
        Self {
            tessellation_cache: LruCache::new(size),
        }
    }

    pub fn len(&self) -> usize {
        self.tessellation_cache.len()
    }

    pub(crate) fn get_vertex_buffers(
        &mut self,
        cache_key: &ShapeKey,
    ) -> Option<VertexBuffers<[f32; 2], u16>> {
        self.tessellation_cache.get(cache_key).cloned()
    }

    pub(crate) fn insert_vertex_buffers(
        &mut self,
        cache_key: ShapeKey,
        vertex_buffers: VertexBuffers<[f32; 2], u16>,
    ) {
        self.tessellation_cache.put(cache_key, vertex_buffers);
    }
}

impl Default for Cache {
    fn default() -> Self {
        Self::new(NonZeroUsize::new(16).unwrap_or(NonZeroUsize::MIN))
    }
}
