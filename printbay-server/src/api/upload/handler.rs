//! Upload handler
//!
//! Checks size, then extension, then stores the bytes. A configured store
//! that fails falls back to the in-process store so the upload survives.

use axum::body::Bytes;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use http::{HeaderMap, StatusCode};
use sha2::{Digest, Sha256};
use shared::models::{UploadedFile, content_type_for, file_extension, is_supported_model};
use shared::{ApiResponse, AppError, AppResult, ErrorCode};
use uuid::Uuid;

use crate::api::CUSTOMER_ID_HEADER;
use crate::integrations::{BlobObject, BlobStore};
use crate::state::AppState;

struct FilePart {
    file_name: String,
    bytes: Bytes,
}

fn calculate_hash(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// `50MB`, `512KB` or `16 bytes`, whichever unit divides the limit
fn describe_limit(max: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = 1024 * KB;
    match max {
        m if m >= MB && m % MB == 0 => format!("{}MB", m / MB),
        m if m >= KB && m % KB == 0 => format!("{}KB", m / KB),
        m => format!("{m} bytes"),
    }
}

fn too_large(max: usize) -> AppError {
    AppError::with_message(
        ErrorCode::FileTooLarge,
        format!("File size exceeds maximum limit of {}", describe_limit(max)),
    )
    .with_detail("maxFileSize", max)
}

/// Read the `file` field, ignoring any other parts
async fn read_file_part(multipart: &mut Multipart, max: usize) -> AppResult<Option<FilePart>> {
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            too_large(max)
        } else {
            AppError::with_message(ErrorCode::InvalidMultipart, e.body_text())
        }
    })? {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload").to_string();
        let bytes = field.bytes().await.map_err(|e| {
            if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                too_large(max)
            } else {
                AppError::with_message(ErrorCode::InvalidMultipart, e.body_text())
            }
        })?;
        return Ok(Some(FilePart { file_name, bytes }));
    }
    Ok(None)
}

/// POST /api/files-upload
pub async fn upload(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<ApiResponse<UploadedFile>> {
    let mut multipart = multipart.map_err(|e| {
        AppError::with_message(ErrorCode::InvalidMultipart, e.body_text())
    })?;
    let max = state.config.max_upload_bytes;

    let part = read_file_part(&mut multipart, max)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::NoFileProvided))?;
    let file_size = part.bytes.len();

    if file_size > max {
        return Err(too_large(max)
            .with_detail("fileId", "")
            .with_detail("fileName", part.file_name)
            .with_detail("fileSize", file_size));
    }

    if !is_supported_model(&part.file_name) {
        return Err(AppError::with_message(
            ErrorCode::UnsupportedFileFormat,
            "Unsupported file type. Supported formats: .stl, .obj, .ply, .3mf",
        )
        .with_detail("fileId", "")
        .with_detail("fileName", part.file_name.clone())
        .with_detail("fileSize", file_size)
        .with_detail("fileType", file_extension(&part.file_name).unwrap_or_default()));
    }

    if file_size == 0 {
        return Err(AppError::new(ErrorCode::EmptyFile));
    }

    let customer_id = headers
        .get(CUSTOMER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(String::from)
        .unwrap_or_else(|| format!("anonymous-{}", shared::util::now_millis()));

    let object = BlobObject {
        file_id: Uuid::new_v4().to_string(),
        content_type: content_type_for(&part.file_name),
        checksum: calculate_hash(&part.bytes),
        file_name: part.file_name,
        customer_id,
        bytes: part.bytes,
    };

    let upload_url = match state.blobs.put(&object).await {
        Ok(url) => url,
        Err(e) => {
            tracing::warn!(
                file_id = %object.file_id,
                error = %e,
                "Blob store rejected upload, keeping it in the local cache"
            );
            state.local_blobs.put(&object).await?
        }
    };

    tracing::info!(
        file_id = %object.file_id,
        customer_id = %object.customer_id,
        size = file_size,
        sha256 = %object.checksum,
        "Model uploaded"
    );

    Ok(ApiResponse::success(UploadedFile {
        file_id: object.file_id,
        file_type: object.content_type.to_string(),
        file_name: object.file_name,
        file_size: file_size as u64,
        upload_url,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_limit() {
        assert_eq!(describe_limit(50 * 1024 * 1024), "50MB");
        assert_eq!(describe_limit(512 * 1024), "512KB");
        assert_eq!(describe_limit(1536 * 1024), "1536KB");
        assert_eq!(describe_limit(16), "16 bytes");
        assert_eq!(describe_limit(1000), "1000 bytes");
    }

    #[test]
    fn test_too_large_never_reports_zero() {
        let err = too_large(16);
        assert_eq!(err.message, "File size exceeds maximum limit of 16 bytes");
        assert_eq!(err.details.unwrap()["maxFileSize"], 16);
    }
}
