use crate::domain::Attachment;
use crate::infrastructure::security::{InputSanitizer, UploadLimitError, UploadQuota};
use crate::infrastructure::store::DataStore;
use crate::infrastructure::uploads::{public_path, FileStorage};
use chrono::{DateTime, Utc};
use propeller_errors::AppError;
use std::sync::Arc;

pub const MAX_FILES_PER_UPLOAD: usize = 5;
pub const MAX_FILE_BYTES: usize = 10 * 1024 * 1024;

/// One multipart file, already read into memory.
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub original_name: String,
    pub mimetype: String,
    pub bytes: Vec<u8>,
}

impl IncomingFile {
    fn is_image(&self) -> bool {
        self.mimetype.starts_with("image/")
    }
}

#[derive(Debug)]
pub enum UploadError {
    Rejected(AppError),
    Quota(UploadLimitError),
}

impl From<AppError> for UploadError {
    fn from(err: AppError) -> Self {
        Self::Rejected(err)
    }
}

impl From<UploadLimitError> for UploadError {
    fn from(err: UploadLimitError) -> Self {
        Self::Quota(err)
    }
}

pub struct UploadFiles {
    quota: UploadQuota,
    files: FileStorage,
    store: Arc<DataStore>,
}

impl UploadFiles {
    pub fn new(store: Arc<DataStore>, quota: UploadQuota, files: FileStorage) -> Self {
        Self {
            quota,
            files,
            store,
        }
    }

    /// Validates the batch, charges its images to the user's quota and stores
    /// every file. Nothing is written when any check fails, and a failed write
    /// removes the files already stored and refunds the charge.
    pub async fn execute(
        &self,
        user_id: &str,
        incoming: Vec<IncomingFile>,
        public_origin: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<Attachment>, UploadError> {
        if incoming.is_empty() {
            return Err(AppError::BadRequest("No files uploaded".to_string()).into());
        }
        if incoming.len() > MAX_FILES_PER_UPLOAD {
            return Err(AppError::BadRequest(format!(
                "Too many files. At most {} files per upload.",
                MAX_FILES_PER_UPLOAD
            ))
            .into());
        }

        for file in &incoming {
            if file.bytes.len() > MAX_FILE_BYTES {
                return Err(AppError::PayloadTooLarge(format!(
                    "File {} exceeds the 10MB limit",
                    file.original_name
                ))
                .into());
            }
            InputSanitizer::validate_upload(&file.original_name, &file.mimetype)?;
        }

        let images = incoming.iter().filter(|f| f.is_image()).count() as u32;
        if let Err(err) = self.quota.try_consume(user_id, images, now) {
            tracing::warn!("Upload quota hit for user {}: {}", user_id, err.message());
            return Err(err.into());
        }
        if images > 0 {
            self.store.persist().await;
        }

        let origin = public_origin.trim_end_matches('/');
        let mut attachments: Vec<Attachment> = Vec::with_capacity(incoming.len());
        for file in incoming {
            let filename = match self.files.save(&file.original_name, &file.bytes).await {
                Ok(filename) => filename,
                Err(e) => {
                    tracing::error!("Upload for user {} failed: {}", user_id, e);
                    self.roll_back(user_id, images, &attachments).await;
                    return Err(e.into());
                }
            };
            let path = public_path(&filename);
            attachments.push(Attachment {
                url: format!("{}{}", origin, path),
                filename,
                original_name: file.original_name,
                mimetype: file.mimetype,
                size: file.bytes.len() as u64,
                path,
            });
        }
        Ok(attachments)
    }

    /// Undoes a partly stored batch: deletes what was written and refunds the images.
    async fn roll_back(&self, user_id: &str, images: u32, written: &[Attachment]) {
        for attachment in written {
            self.files.remove(&attachment.filename).await;
        }
        if images > 0 {
            self.quota.refund(user_id, images);
            self.store.persist().await;
        }
    }
}
