use crate::session::AuthUser;
use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use propeller_app::application::{IncomingFile, UploadError};
use propeller_app::infrastructure::security::UploadLimitError;
use propeller_app::AppContext;
use propeller_errors::AppError;
use serde_json::{json, Value};

const FILES_FIELD: &str = "files";
const UPLOAD_LIMIT_REACHED: &str = "Upload limit reached";

pub async fn upload(
    State(ctx): State<AppContext>,
    AuthUser(user): AuthUser,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    let mut files = Vec::new();
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return multipart_error(e).into_response(),
        };
        if field.name() != Some(FILES_FIELD) {
            continue;
        }

        let original_name = field.file_name().unwrap_or_default().to_string();
        let mimetype = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = match field.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => return multipart_error(e).into_response(),
        };

        files.push(IncomingFile {
            original_name,
            mimetype,
            bytes: bytes.to_vec(),
        });
    }

    let origin = public_origin(&headers).unwrap_or_else(|| ctx.config.app_url.clone());
    match ctx
        .upload_files
        .execute(&user.id, files, &origin, chrono::Utc::now())
        .await
    {
        Ok(attachments) => Json(json!({ "success": true, "files": attachments })).into_response(),
        Err(UploadError::Rejected(e)) => {
            tracing::warn!("File upload rejected: {}", e);
            e.into_response()
        }
        Err(UploadError::Quota(limit)) => {
            (StatusCode::TOO_MANY_REQUESTS, Json(quota_body(&limit))).into_response()
        }
    }
}

pub async fn usage(State(ctx): State<AppContext>, AuthUser(user): AuthUser) -> Json<Value> {
    let status = ctx.upload_quota.status(&user.id, chrono::Utc::now());
    Json(json!({ "imageUploads": status }))
}

fn quota_body(limit: &UploadLimitError) -> Value {
    match limit {
        UploadLimitError::Cooldown {
            cooldown_until,
            remaining_minutes,
        } => json!({
            "error": UPLOAD_LIMIT_REACHED,
            "message": limit.message(),
            "cooldownUntil": cooldown_until.timestamp_millis(),
            "remainingMinutes": remaining_minutes,
        }),
        UploadLimitError::LimitExceeded {
            limit: max,
            used,
            remaining,
        } => json!({
            "error": UPLOAD_LIMIT_REACHED,
            "message": limit.message(),
            "limit": max,
            "used": used,
            "remaining": remaining,
        }),
    }
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge("Upload is too large".to_string())
    } else {
        AppError::BadRequest(err.body_text())
    }
}

/// `scheme://host` the client used, for absolute file URLs.
fn public_origin(headers: &HeaderMap) -> Option<String> {
    let host = headers.get(header::HOST)?.to_str().ok()?;
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("http");
    Some(format!("{}://{}", scheme, host))
}
