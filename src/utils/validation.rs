/// Content types accepted for an archive upload. A missing content type is
/// also accepted; browsers do not always send one.
pub const ALLOWED_ARCHIVE_MIME_TYPES: &[&str] = &[
    "application/zip",
    "application/x-zip",
    "application/x-zip-compressed",
    "application/octet-stream",
    "multipart/x-zip",
];

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub code: &'static str,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Validates file size against maximum limit
pub fn validate_file_size(size: usize, max_size: usize) -> Result<(), ValidationError> {
    if size == 0 {
        return Err(ValidationError {
            code: "EMPTY_FILE",
            message: "Uploaded archive is empty".to_string(),
        });
    }
    if size > max_size {
        return Err(ValidationError {
            code: "FILE_TOO_LARGE",
            message: format!(
                "File size {} bytes exceeds maximum allowed {} bytes ({} MB)",
                size,
                max_size,
                max_size / 1024 / 1024
            ),
        });
    }
    Ok(())
}

/// Only `.zip` names are accepted (case-sensitive)
pub fn validate_archive_name(filename: &str) -> Result<(), ValidationError> {
    if filename.trim().is_empty() {
        return Err(ValidationError {
            code: "MISSING_FILENAME",
            message: "Uploaded file has no name".to_string(),
        });
    }
    if !filename.ends_with(".zip") {
        return Err(ValidationError {
            code: "UNSUPPORTED_FORMAT",
            message: "Only ZIP archives are supported".to_string(),
        });
    }
    Ok(())
}

/// Validates the declared content type against the archive allowlist
pub fn validate_content_type(content_type: Option<&str>) -> Result<(), ValidationError> {
    let Some(raw) = content_type else {
        return Ok(());
    };

    let parsed: mime::Mime = raw.parse().map_err(|_| ValidationError {
        code: "INVALID_MIME_TYPE",
        message: format!("Content type '{}' could not be parsed", raw),
    })?;

    let essence = parsed.essence_str().to_lowercase();
    if ALLOWED_ARCHIVE_MIME_TYPES.contains(&essence.as_str()) {
        return Ok(());
    }

    Err(ValidationError {
        code: "INVALID_MIME_TYPE",
        message: format!("Content type '{}' is not an archive type", raw),
    })
}

/// Full validation pipeline run before an upload reaches the engine
pub fn validate_archive_upload(
    filename: &str,
    content_type: Option<&str>,
    size: usize,
    max_size: usize,
) -> Result<(), ValidationError> {
    validate_archive_name(filename)?;
    validate_content_type(content_type)?;
    validate_file_size(size, max_size)?;
    Ok(())
}
