use propeller_errors::AppError;
use rand::Rng;
use regex_lite::Regex;
use std::path::Path;
use std::sync::LazyLock;

const ALLOWED_TYPES: &[&str] = &[
    "jpeg", "jpg", "png", "gif", "webp", "pdf", "txt", "doc", "docx",
];
const MAX_STORED_NAME_CHARS: usize = 100;
const TITLE_FALLBACK_CHARS: usize = 40;
const INVALID_FILE_TYPE: &str = "Invalid file type. Only images and documents are allowed.";

static UNSAFE_FILENAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9._-]").expect("static pattern"));

pub struct InputSanitizer;

impl InputSanitizer {
    /// Accepts images and common documents. Both the extension and the
    /// declared MIME type have to agree with the allow-list.
    pub fn validate_upload(original_name: &str, mimetype: &str) -> Result<(), AppError> {
        let extension = Path::new(original_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
            .filter(|ext| ALLOWED_TYPES.contains(&ext.as_str()))
            .ok_or_else(|| AppError::UnsupportedMediaType(INVALID_FILE_TYPE.to_string()))?;

        let mimetype = mimetype.trim().to_lowercase();
        let mime_ok = ALLOWED_TYPES.iter().any(|t| mimetype.contains(t))
            || canonical_mime(&extension) == Some(mimetype.as_str());

        if !mime_ok {
            tracing::warn!(
                "Rejected upload {:?} with type {:?}",
                original_name,
                mimetype
            );
            return Err(AppError::UnsupportedMediaType(INVALID_FILE_TYPE.to_string()));
        }
        Ok(())
    }

    /// Keeps the file name portable and free of path separators.
    pub fn sanitize_filename(original_name: &str) -> String {
        let base = Path::new(original_name)
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("");
        let cleaned = UNSAFE_FILENAME_CHARS.replace_all(base, "_");
        let cleaned = cleaned.trim_start_matches('.');

        let chars = cleaned.chars().count();
        let cleaned: String = if chars > MAX_STORED_NAME_CHARS {
            cleaned.chars().skip(chars - MAX_STORED_NAME_CHARS).collect()
        } else {
            cleaned.to_string()
        };

        if cleaned.is_empty() {
            "file".to_string()
        } else {
            cleaned
        }
    }

    /// `<epoch ms>-<random>-<sanitized name>`, unique enough for one directory.
    pub fn stored_filename(original_name: &str) -> String {
        let suffix: u32 = rand::thread_rng().gen_range(0..=1_000_000_000);
        format!(
            "{}-{}-{}",
            chrono::Utc::now().timestamp_millis(),
            suffix,
            Self::sanitize_filename(original_name)
        )
    }

    /// Tidies a model-generated title: trims it and drops surrounding quotes.
    pub fn clean_generated_title(raw: &str) -> String {
        let title = raw.trim();
        let title = title
            .strip_prefix(&['"', '\''][..])
            .unwrap_or(title);
        let title = title
            .strip_suffix(&['"', '\''][..])
            .unwrap_or(title);
        title.trim().to_string()
    }

    pub fn fallback_title(message: &str) -> String {
        let message = message.trim();
        if message.chars().count() > TITLE_FALLBACK_CHARS {
            let head: String = message.chars().take(TITLE_FALLBACK_CHARS).collect();
            format!("{}...", head)
        } else {
            message.to_string()
        }
    }
}

fn canonical_mime(extension: &str) -> Option<&'static str> {
    match extension {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "pdf" => Some("application/pdf"),
        "txt" => Some("text/plain"),
        "doc" => Some("application/msword"),
        "docx" => Some("application/vnd.openxmlformats-officedocument.wordprocessingml.document"),
        _ => None,
    }
}
