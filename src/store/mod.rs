/// Frame record.
pub mod frame;
/// The authoritative frame sequence.
pub mod frame_store;
/// Batch import of many sources.
pub mod ingest;
/// Persistence backends.
pub mod storage;
