mod file_storage;

pub use file_storage::{public_path, FileStorage, UPLOADS_URL_PREFIX};
