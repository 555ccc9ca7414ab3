use std::collections::HashMap;
use std::sync::{Arc, Weak};

use log::debug;
use rayon::prelude::*;

use super::light_processor::LightProcessor;
use crate::scene::{Light, LightId};
use crate::settings::LightCacheSettings;

#[derive(Debug)]
struct CacheEntry {
    processor: LightProcessor,
    light: Weak<Light>,
    last_used_frame: u64,
}

/// Light processors kept across frames, keyed by light identity.
///
/// Entries live in an arena so a frame's processors can be updated in
/// parallel; slots are recycled after eviction.
#[derive(Debug, Default)]
pub struct LightProcessorCache {
    entries: Vec<Option<CacheEntry>>,
    slots: HashMap<LightId, usize>,
    free: Vec<usize>,
    max_unused_frames: u64,
}

impl LightProcessorCache {
    pub fn new(settings: &LightCacheSettings) -> Self {
        Self {
            max_unused_frames: settings.max_unused_frames,
            ..Self::default()
        }
    }

    /// Returns the slot of the light's processor, creating one on first use.
    pub fn get_or_create(&mut self, light: &Arc<Light>, frame_number: u64) -> usize {
        if let Some(&slot) = self.slots.get(&light.id) {
            if let Some(entry) = self.entries[slot].as_mut() {
                if !Weak::ptr_eq(&entry.light, &Arc::downgrade(light)) {
                    entry.light = Arc::downgrade(light);
                }
                entry.last_used_frame = frame_number;
                return slot;
            }
        }

        let entry = CacheEntry {
            processor: LightProcessor::new(light.id),
            light: Arc::downgrade(light),
            last_used_frame: frame_number,
        };
        let slot = match self.free.pop() {
            Some(slot) => {
                self.entries[slot] = Some(entry);
                slot
            }
            None => {
                self.entries.push(Some(entry));
                self.entries.len() - 1
            }
        };
        self.slots.insert(light.id, slot);
        slot
    }

    pub fn get(&self, slot: usize) -> Option<&LightProcessor> {
        self.entries.get(slot)?.as_ref().map(|entry| &entry.processor)
    }

    pub fn get_mut(&mut self, slot: usize) -> Option<&mut LightProcessor> {
        self.entries.get_mut(slot)?.as_mut().map(|entry| &mut entry.processor)
    }

    pub fn find(&self, id: LightId) -> Option<&LightProcessor> {
        self.slots.get(&id).and_then(|&slot| self.get(slot))
    }

    /// Processors at `slots` paired with their position in `slots`, for
    /// parallel update. Entries not listed are left untouched.
    pub(crate) fn par_slots_mut<'a>(
        &'a mut self,
        slots: &[usize],
    ) -> impl ParallelIterator<Item = (usize, &'a mut LightProcessor)> + 'a {
        let mut positions = vec![None; self.entries.len()];
        for (position, &slot) in slots.iter().enumerate() {
            if let Some(entry) = positions.get_mut(slot) {
                *entry = Some(position);
            }
        }
        self.entries
            .par_iter_mut()
            .zip(positions)
            .filter_map(|(entry, position)| Some((position?, &mut entry.as_mut()?.processor)))
    }

    /// Drops processors whose light is gone or was not used for too long.
    /// Returns the number of evicted entries.
    pub fn evict_unused(&mut self, frame_number: u64) -> usize {
        let max_unused_frames = self.max_unused_frames;
        let mut evicted = 0;

        for (slot, entry) in self.entries.iter_mut().enumerate() {
            let expired = entry.as_ref().is_some_and(|entry| {
                entry.light.strong_count() == 0
                    || frame_number.saturating_sub(entry.last_used_frame) > max_unused_frames
            });
            if !expired {
                continue;
            }
            if let Some(entry) = entry.take() {
                debug!("Evicting light processor for {:?}", entry.processor.light_id());
                self.slots.remove(&entry.processor.light_id());
                self.free.push(slot);
                evicted += 1;
            }
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
