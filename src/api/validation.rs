use std::path::Path;

use crate::api::errors::ApiError;

pub(crate) fn validate_upload(
    filename: &str,
    size_bytes: usize,
    allowed_extensions: &[String],
    max_size_mb: u64,
) -> Result<String, ApiError> {
    if size_bytes == 0 {
        return Err(ApiError::BadRequest("Uploaded file is empty".to_string()));
    }

    let max_bytes = max_size_mb.saturating_mul(1024 * 1024);
    if size_bytes as u64 > max_bytes {
        return Err(ApiError::BadRequest(format!("File exceeds the {max_size_mb} MB limit")));
    }

    let extension = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .ok_or_else(|| ApiError::BadRequest("File must have an extension".to_string()))?;

    if !allowed_extensions.iter().any(|allowed| allowed == &extension) {
        return Err(ApiError::BadRequest(format!("File extension '{extension}' is not allowed")));
    }

    Ok(extension)
}

/// MIME type forwarded for an accepted extension.
pub(crate) fn content_type_for(extension: &str) -> &'static str {
    match extension {
        "pdf" => "application/pdf",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "md" => "text/markdown",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}
