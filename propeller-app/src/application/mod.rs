mod send_message;
mod upload_files;

pub use send_message::{HistoryEntry, SendMessage, SendMessageOutcome, SendMessageRequest};
pub use upload_files::{IncomingFile, UploadError, UploadFiles, MAX_FILES_PER_UPLOAD, MAX_FILE_BYTES};
