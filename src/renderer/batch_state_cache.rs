use std::collections::HashMap;
use std::sync::Arc;

use log::warn;

use super::pipeline_state::PipelineState;
use crate::asset::{AssetLibrary, Geometry, GeometryType, Handle, Material, Pass};
use crate::scene::{Camera, Light};

/// Everything that selects a pipeline state for a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BatchStateLookupKey {
    /// Drawable hash combined with its vertex light count.
    pub drawable_hash: u32,
    /// Zero for unlit batches.
    pub pixel_light_hash: u32,
    pub geometry_type: GeometryType,
    pub geometry: Handle<Geometry>,
    pub material: Handle<Material>,
    pub pass: Handle<Pass>,
}

/// Lookup key plus the batch it was built from, for the creation callback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchStateCreateKey {
    pub key: BatchStateLookupKey,
    pub drawable_index: usize,
    pub source_batch_index: usize,
    /// Index into the frame's visible lights.
    pub pixel_light_index: Option<usize>,
}

/// Information passed to the backend that is not part of the key.
#[derive(Debug, Clone, Copy)]
pub struct BatchStateCreateContext<'a> {
    /// Name of the scene pass requesting the state.
    pub pass_name: &'a str,
    /// 0 unlit base, 1 lit base, 2 light; always 0 for shadow passes.
    pub subpass_index: usize,
    pub camera: &'a Camera,
    pub light: Option<&'a Light>,
}

/// Key of a deferred light volume state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LightVolumeStateKey {
    pub light_hash: u32,
    pub light_index: usize,
}

/// Graphics backend hook. Called only from the single-threaded resolution step.
pub trait BatchStateCacheCallback {
    /// Returns `None` if the backend rejects the configuration.
    fn create_batch_pipeline_state(
        &mut self,
        key: &BatchStateCreateKey,
        ctx: &BatchStateCreateContext<'_>,
    ) -> Option<Arc<PipelineState>>;

    fn create_light_volume_pipeline_state(
        &mut self,
        key: &LightVolumeStateKey,
        light: &Light,
        camera: &Camera,
    ) -> Option<Arc<PipelineState>>;
}

#[derive(Debug)]
struct CachedBatchState {
    geometry_hash: u32,
    material_hash: u32,
    pass_hash: u32,
    state: Arc<PipelineState>,
    invalidated: bool,
}

impl CachedBatchState {
    fn is_up_to_date(&self, key: &BatchStateLookupKey, assets: &AssetLibrary) -> bool {
        !self.invalidated
            && self.geometry_hash == assets.geometry_hash(key.geometry)
            && self.material_hash == assets.material_hash(key.material)
            && self.pass_hash == assets.pass_hash(key.pass)
    }
}

/// Pipeline states of one sub-pass, persistent across frames.
///
/// [`BatchStateCache::lookup`] takes `&self` and is safe to call from any
/// number of workers. Creation goes through `&mut self`, so it only happens
/// on the thread that owns the cache.
#[derive(Debug, Default)]
pub struct BatchStateCache {
    entries: HashMap<BatchStateLookupKey, CachedBatchState>,
}

impl BatchStateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Valid, up-to-date state for the key, if one exists.
    pub fn lookup(
        &self,
        key: &BatchStateLookupKey,
        assets: &AssetLibrary,
    ) -> Option<Arc<PipelineState>> {
        let entry = self.entries.get(key)?;
        if entry.is_up_to_date(key, assets) && entry.state.is_valid() {
            Some(entry.state.clone())
        } else {
            None
        }
    }

    /// Returns the cached state or asks the backend for a new one.
    ///
    /// A state the backend rejects is stored as invalid and returned as is
    /// until the key's resources change or the cache is invalidated.
    pub fn get_or_create(
        &mut self,
        create_key: &BatchStateCreateKey,
        ctx: &BatchStateCreateContext<'_>,
        assets: &AssetLibrary,
        callback: &mut dyn BatchStateCacheCallback,
    ) -> Arc<PipelineState> {
        let key = &create_key.key;
        if let Some(entry) = self.entries.get(key) {
            if entry.is_up_to_date(key, assets) {
                return entry.state.clone();
            }
        }

        let state = callback
            .create_batch_pipeline_state(create_key, ctx)
            .filter(|state| state.is_valid())
            .unwrap_or_else(|| {
                warn!(
                    "Failed to create pipeline state for pass '{}' (subpass {}), \
                     drawable {} batch {}",
                    ctx.pass_name,
                    ctx.subpass_index,
                    create_key.drawable_index,
                    create_key.source_batch_index
                );
                PipelineState::invalid()
            });

        self.entries.insert(
            *key,
            CachedBatchState {
                geometry_hash: assets.geometry_hash(key.geometry),
                material_hash: assets.material_hash(key.material),
                pass_hash: assets.pass_hash(key.pass),
                state: state.clone(),
                invalidated: false,
            },
        );
        state
    }

    /// Forces every entry to be recreated on next use.
    pub fn invalidate(&mut self) {
        for entry in self.entries.values_mut() {
            entry.invalidated = true;
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Pipeline states of deferred light volumes.
#[derive(Debug, Default)]
pub struct LightVolumeStateCache {
    entries: HashMap<u32, CachedLightVolumeState>,
}

#[derive(Debug)]
struct CachedLightVolumeState {
    state: Arc<PipelineState>,
    invalidated: bool,
}

impl LightVolumeStateCache {
    pub fn lookup(&self, light_hash: u32) -> Option<Arc<PipelineState>> {
        self.entries
            .get(&light_hash)
            .filter(|entry| !entry.invalidated && entry.state.is_valid())
            .map(|entry| entry.state.clone())
    }

    pub fn get_or_create(
        &mut self,
        key: &LightVolumeStateKey,
        light: &Light,
        camera: &Camera,
        callback: &mut dyn BatchStateCacheCallback,
    ) -> Arc<PipelineState> {
        if let Some(entry) = self.entries.get(&key.light_hash) {
            if !entry.invalidated {
                return entry.state.clone();
            }
        }

        let state = callback
            .create_light_volume_pipeline_state(key, light, camera)
            .filter(|state| state.is_valid())
            .unwrap_or_else(|| {
                warn!("Failed to create light volume pipeline state for light {:?}", light.id);
                PipelineState::invalid()
            });
        self.entries.insert(
            key.light_hash,
            CachedLightVolumeState {
                state: state.clone(),
                invalidated: false,
            },
        );
        state
    }

    pub fn invalidate(&mut self) {
        for entry in self.entries.values_mut() {
            entry.invalidated = true;
        }
    }
}
