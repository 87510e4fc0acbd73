use crate::domain::Attachment;
use crate::infrastructure::security::InputSanitizer;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use propeller_errors::AppError;
use std::path::{Path, PathBuf};

/// URL prefix under which stored uploads are served.
pub const UPLOADS_URL_PREFIX: &str = "/uploads";

#[derive(Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub async fn init(root: impl Into<PathBuf>) -> Result<Self, AppError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes the bytes under a fresh name and returns that name.
    pub async fn save(&self, original_name: &str, bytes: &[u8]) -> Result<String, AppError> {
        let filename = InputSanitizer::stored_filename(original_name);
        tokio::fs::write(self.root.join(&filename), bytes).await?;
        tracing::debug!("Stored upload {} ({} bytes)", filename, bytes.len());
        Ok(filename)
    }

    pub async fn remove(&self, filename: &str) {
        if let Err(e) = tokio::fs::remove_file(self.root.join(filename)).await {
            tracing::warn!("Could not remove upload {}: {}", filename, e);
        }
    }

    /// Maps a public `/uploads/<name>` path to the file on disk. Only the last
    /// path component is used, so the result always stays inside the root.
    pub fn resolve(&self, public_path: &str) -> Option<PathBuf> {
        Path::new(public_path)
            .file_name()
            .map(|name| self.root.join(name))
    }

    /// Reads an uploaded image as a `data:` URL for the vision model.
    pub async fn read_data_url(&self, attachment: &Attachment) -> Result<String, AppError> {
        let path = self
            .resolve(&attachment.path)
            .ok_or_else(|| AppError::BadRequest(format!("Invalid attachment path: {}", attachment.path)))?;
        let bytes = tokio::fs::read(&path).await?;
        Ok(format!(
            "data:{};base64,{}",
            attachment.mimetype,
            BASE64.encode(bytes)
        ))
    }
}

pub fn public_path(filename: &str) -> String {
    format!("{}/{}", UPLOADS_URL_PREFIX, filename)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn storage() -> FileStorage {
        let dir = std::env::temp_dir().join(format!("propeller-uploads-{}", uuid::Uuid::new_v4()));
        FileStorage::init(dir).await.unwrap()
    }

    fn attachment(path: &str) -> Attachment {
        Attachment {
            filename: String::new(),
            original_name: "dot.png".into(),
            mimetype: "image/png".into(),
            size: 3,
            path: path.into(),
            url: String::new(),
        }
    }

    #[tokio::test]
    async fn test_save_and_read_back_as_data_url() {
        let files = storage().await;
        let name = files.save("dot.png", &[1, 2, 3]).await.unwrap();
        assert!(name.ends_with("-dot.png"));

        let url = files
            .read_data_url(&attachment(&public_path(&name)))
            .await
            .unwrap();
        assert_eq!(url, "data:image/png;base64,AQID");
    }

    #[tokio::test]
    async fn test_resolve_stays_inside_root() {
        let files = storage().await;
        let resolved = files.resolve("/uploads/../../etc/passwd").unwrap();
        assert_eq!(resolved, files.root().join("passwd"));
        assert!(files.resolve("/uploads/..").is_none());

        let err = files.read_data_url(&attachment("/uploads/missing.png")).await;
        assert!(matches!(err, Err(AppError::Storage(_))));
    }
}
