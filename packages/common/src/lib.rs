pub mod storage;

pub use storage::{ImageStore, StorageError};
