use std::cmp::Ordering;

use super::batch::PipelineBatch;
use crate::asset::AssetLibrary;

/// Sort entry minimizing state changes: pipeline state, then material and
/// geometry, then back to front.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineBatchByState {
    /// 8 bits render order, 32 bits shader, 24 bits pipeline state.
    pub state_key: u64,
    /// 32 bits material and lightmap, 32 bits geometry.
    pub material_geometry_key: u64,
    pub distance: f32,
    /// Index of the batch in the sorted list's source.
    pub batch_index: usize,
}

impl PipelineBatchByState {
    pub fn new(batch: &PipelineBatch, batch_index: usize, render_order: u8) -> Self {
        let state = &batch.pipeline_state;
        let state_id = state.id();

        let mut state_key = u64::from(render_order) << 56;
        state_key |= u64::from(state.shader_hash()) << 24;
        state_key |= u64::from((state_id & 0x00ff_ffff) ^ (state_id >> 24));

        let material = batch.material.index() as u64 ^ u64::from(batch.lightmap_index);
        let geometry = batch.geometry.index() as u64;
        let material_geometry_key = ((material & 0xffff_ffff) << 32) | (geometry & 0xffff_ffff);

        Self {
            state_key,
            material_geometry_key,
            distance: batch.distance,
            batch_index,
        }
    }

    fn compare(&self, other: &Self) -> Ordering {
        self.state_key
            .cmp(&other.state_key)
            .then(self.material_geometry_key.cmp(&other.material_geometry_key))
            .then(other.distance.total_cmp(&self.distance))
    }
}

/// Sort entry for blended geometry: render order, then farthest first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineBatchBackToFront {
    pub render_order: u8,
    pub distance: f32,
    pub batch_index: usize,
}

impl PipelineBatchBackToFront {
    pub fn new(batch: &PipelineBatch, batch_index: usize, render_order: u8) -> Self {
        Self {
            render_order,
            distance: batch.distance,
            batch_index,
        }
    }

    fn compare(&self, other: &Self) -> Ordering {
        self.render_order
            .cmp(&other.render_order)
            .then(other.distance.total_cmp(&self.distance))
    }
}

/// Appends by-state entries for `batches` (indices offset by `base_index`)
/// and sorts the whole output.
pub fn sort_batches_by_state(
    batches: &[PipelineBatch],
    base_index: usize,
    assets: &AssetLibrary,
    sorted: &mut Vec<PipelineBatchByState>,
) {
    sorted.extend(batches.iter().enumerate().map(|(i, batch)| {
        PipelineBatchByState::new(batch, base_index + i, assets.render_order(batch.material))
    }));
    sorted.sort_by(PipelineBatchByState::compare);
}

pub fn sort_batches_back_to_front(
    batches: &[PipelineBatch],
    base_index: usize,
    assets: &AssetLibrary,
    sorted: &mut Vec<PipelineBatchBackToFront>,
) {
    sorted.extend(batches.iter().enumerate().map(|(i, batch)| {
        PipelineBatchBackToFront::new(batch, base_index + i, assets.render_order(batch.material))
    }));
    sorted.sort_by(PipelineBatchBackToFront::compare);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::{GeometryType, Handle, Material};
    use crate::renderer::pipeline_state::PipelineState;
    use std::sync::Arc;

    fn batch(
        material: usize,
        geometry: usize,
        distance: f32,
        state: &Arc<PipelineState>,
    ) -> PipelineBatch {
        PipelineBatch {
            drawable_index: 0,
            source_batch_index: 0,
            light_index: None,
            geometry_type: GeometryType::Static,
            geometry: Handle::new(geometry),
            material: Handle::new(material),
            pass: Handle::new(0),
            lightmap_index: 0,
            distance,
            pipeline_state: state.clone(),
        }
    }

    fn library() -> AssetLibrary {
        let mut assets = AssetLibrary::new();
        assets.materials.insert(Material::new("opaque", 0));
        assets.materials.insert(Material::new("early", 0).with_render_order(10));
        assets
    }

    #[test]
    fn by_state_groups_equal_states() {
        let assets = library();
        let a = PipelineState::new(1);
        let b = PipelineState::new(1);
        let batches = vec![
            batch(0, 0, 1.0, &a),
            batch(0, 0, 1.0, &b),
            batch(0, 1, 1.0, &a),
            batch(0, 0, 5.0, &b),
        ];

        let mut sorted = Vec::new();
        sort_batches_by_state(&batches, 0, &assets, &mut sorted);

        let ids: Vec<u32> = sorted
            .iter()
            .map(|s| batches[s.batch_index].pipeline_state.id())
            .collect();

        assert_eq!(ids[0], ids[1]);
        assert_eq!(ids[2], ids[3]);
        // far batch of the same state and material comes first
        let b_entries: Vec<usize> = sorted
            .iter()
            .filter(|s| Arc::ptr_eq(&batches[s.batch_index].pipeline_state, &b))
            .map(|s| s.batch_index)
            .collect();
        assert_eq!(b_entries, vec![3, 1]);
    }

    #[test]
    fn render_order_dominates_state() {
        let assets = library();
        let late = PipelineState::new(0);
        let early = PipelineState::new(u32::MAX);
        let batches = vec![batch(0, 0, 1.0, &late), batch(1, 0, 1.0, &early)];

        let mut sorted = Vec::new();
        sort_batches_by_state(&batches, 0, &assets, &mut sorted);
        assert_eq!(sorted[0].batch_index, 1);
    }

    #[test]
    fn back_to_front_orders_by_distance() {
        let assets = library();
        let state = PipelineState::new(0);
        let batches = vec![
            batch(0, 0, 2.0, &state),
            batch(0, 0, 8.0, &state),
            batch(1, 0, 1.0, &state),
            batch(0, 0, 4.0, &state),
        ];

        let mut sorted = Vec::new();
        sort_batches_back_to_front(&batches, 10, &assets, &mut sorted);
        let order: Vec<usize> = sorted.iter().map(|s| s.batch_index).collect();
        assert_eq!(order, vec![12, 11, 13, 10]);
    }

    #[test]
    fn sorting_is_stable_for_equal_keys() {
        let assets = library();
        let state = PipelineState::new(3);
        let batches: Vec<_> = (0..5).map(|_| batch(0, 0, 1.0, &state)).collect();

        let mut sorted = Vec::new();
        sort_batches_back_to_front(&batches, 0, &assets, &mut sorted);
        let order: Vec<usize> = sorted.iter().map(|s| s.batch_index).collect();
        assert_eq!(order, vec![0, 1, 2, 3, 4]);
    }
}
