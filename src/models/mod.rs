pub mod event;

pub use event::{EventRecord, UNKNOWN};
