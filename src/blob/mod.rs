mod storage;

pub use storage::{BlobStorage, BlobStorageError, ObjectInfo, ObjectReader};
