use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

static NEXT_STATE_ID: AtomicU32 = AtomicU32::new(1);

/// Immutable shading and rasterization configuration handed out by the
/// graphics backend.
///
/// Batches always carry a state. A state the backend failed to build is kept
/// as an invalid placeholder so the renderer can skip it instead of
/// dereferencing nothing.
#[derive(Debug)]
pub struct PipelineState {
    id: u32,
    shader_hash: u32,
    valid: bool,
}

impl PipelineState {
    pub fn new(shader_hash: u32) -> Arc<Self> {
        Arc::new(Self {
            id: NEXT_STATE_ID.fetch_add(1, Ordering::Relaxed),
            shader_hash,
            valid: true,
        })
    }

    pub fn invalid() -> Arc<Self> {
        Arc::new(Self {
            id: NEXT_STATE_ID.fetch_add(1, Ordering::Relaxed),
            shader_hash: 0,
            valid: false,
        })
    }

    /// Unique per created state, used as a sort key.
    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn shader_hash(&self) -> u32 {
        self.shader_hash
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }
}
