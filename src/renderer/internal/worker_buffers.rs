use rayon::prelude::*;

/// One output buffer per worker, merged in worker order.
///
/// Input is split into one contiguous chunk per buffer, so the merged output
/// has the same order no matter how rayon schedules the chunks.
#[derive(Debug)]
pub(crate) struct WorkerBuffers<T> {
    buffers: Vec<Vec<T>>,
}

impl<T> Default for WorkerBuffers<T> {
    fn default() -> Self {
        Self { buffers: Vec::new() }
    }
}

impl<T: Send> WorkerBuffers<T> {
    /// Clears all buffers and resizes to `num_workers`, keeping allocations.
    pub(crate) fn reset(&mut self, num_workers: usize) {
        self.buffers.resize_with(num_workers.max(1), Vec::new);
        for buffer in &mut self.buffers {
            buffer.clear();
        }
    }

    pub(crate) fn drain(&mut self) -> impl Iterator<Item = T> + '_ {
        self.buffers.iter_mut().flat_map(|buffer| buffer.drain(..))
    }

    /// Runs `f` over `items` in parallel, one chunk per worker buffer.
    pub(crate) fn for_each_chunk<I, F>(&mut self, items: &[I], f: F)
    where
        I: Sync,
        F: Fn(&I, &mut Vec<T>) + Sync,
    {
        if items.is_empty() {
            return;
        }
        if self.buffers.is_empty() {
            self.buffers.push(Vec::new());
        }
        let chunk_size = items.len().div_ceil(self.buffers.len().max(1));
        self.buffers
            .par_iter_mut()
            .zip(items.par_chunks(chunk_size))
            .for_each(|(buffer, chunk)| {
                for item in chunk {
                    f(item, buffer);
                }
            });
    }
}
