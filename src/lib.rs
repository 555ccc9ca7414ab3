//! CPU side of a forward/deferred scene render pipeline.
//!
//! Each frame the [`renderer::SceneProcessor`] culls drawables against the
//! camera, assigns per-object lights, sets up shadow cameras and shadow
//! map space, collects and sorts draw batches for every scene pass, and
//! resolves their pipeline states through a cache.

pub mod asset;
pub mod error;
pub mod math;
pub mod renderer;
pub mod scene;
pub mod settings;

pub use error::{PipelineError, Result};
pub use renderer::{FrameInfo, SceneProcessor};
pub use settings::PipelineSettings;

/// Installs the `env_logger` backend at `Info` unless `RUST_LOG` says
/// otherwise. Safe to call more than once.
pub fn init_logging() {
    let _ = env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .try_init();
}
