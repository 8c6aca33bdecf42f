pub mod jsonl;
pub mod trait_def;

pub use jsonl::JsonLinesStore;
pub use trait_def::{EventStore, StorageError, StorageResult};
