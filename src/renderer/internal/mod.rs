mod worker_buffers;

pub(crate) use worker_buffers::WorkerBuffers;
