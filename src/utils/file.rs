use crate::errors::{AppError, Result};

/// Extensions accepted for upload, checked against the client-supplied name.
pub const ALLOWED_EXTENSIONS: [&str; 4] = ["jpeg", "jpg", "png", "webp"];

pub fn validate_mime_type(mime_type: &str, allowed_types: &[String]) -> Result<()> {
    if !allowed_types.iter().any(|allowed| allowed == mime_type) {
        return Err(AppError::Validation(format!(
            "File type '{}' is not allowed, only images (jpeg, png, webp) are accepted",
            mime_type
        )));
    }
    Ok(())
}

/// Extension of a client-supplied file name, lowercased and stripped of
/// anything that is not ASCII alphanumeric. Directory components are ignored,
/// so a name like `../../etc/cron.d/job.png` yields just `png`.
pub fn file_extension(original_name: &str) -> Option<String> {
    let ext: String = std::path::Path::new(original_name)
        .extension()?
        .to_str()?
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_lowercase();

    if ext.is_empty() {
        None
    } else {
        Some(ext)
    }
}

pub fn validate_extension(original_name: &str) -> Result<String> {
    let ext = file_extension(original_name).ok_or_else(|| {
        AppError::Validation(format!("'{}' has no usable file extension", original_name))
    })?;

    if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        return Err(AppError::Validation(format!(
            "File extension '.{}' is not allowed, only images (jpeg, png, webp) are accepted",
            ext
        )));
    }

    Ok(ext)
}
