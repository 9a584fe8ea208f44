use std::path::Path;

/// Size and extension limits for one document kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadPolicy {
    pub max_bytes: u64,
    pub allowed_extensions: &'static [&'static str],
}

impl UploadPolicy {
    /// Clamp the per-kind cap to the service-wide ceiling.
    pub fn with_ceiling(self, ceiling: u64) -> Self {
        Self {
            max_bytes: self.max_bytes.min(ceiling),
            ..self
        }
    }

    pub fn validate(&self, upload: &FileUpload) -> Result<(), UploadError> {
        let name = upload.file_name();
        if name.is_empty() {
            return Err(UploadError::MissingFileName);
        }

        let extension = upload.extension().unwrap_or_default();
        if !self
            .allowed_extensions
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(&extension))
        {
            return Err(UploadError::DisallowedExtension {
                file_name: name.to_string(),
                allowed: self.allowed_extensions.join(", "),
            });
        }

        let size = upload.size();
        if size == 0 {
            return Err(UploadError::Empty);
        }
        if size > self.max_bytes {
            return Err(UploadError::TooLarge {
                size,
                max: self.max_bytes,
            });
        }

        Ok(())
    }
}

/// File received from a multipart form, optionally tied to a section such as `q3`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub section: Option<String>,
    pub bytes: Vec<u8>,
}

impl FileUpload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            section: None,
            bytes,
        }
    }

    pub fn in_section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self
    }

    /// Base name with any client-side directories removed.
    pub fn file_name(&self) -> &str {
        let trimmed = self.file_name.trim();
        trimmed
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(trimmed)
            .trim()
    }

    /// Trimmed section name; blank sections count as the main attachment.
    pub fn section(&self) -> Option<&str> {
        self.section
            .as_deref()
            .map(str::trim)
            .filter(|section| !section.is_empty())
    }

    pub fn extension(&self) -> Option<String> {
        Path::new(self.file_name())
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
    }

    /// Declared content type, or one guessed from the extension.
    pub fn content_type(&self) -> String {
        match self.content_type.as_deref().map(str::trim) {
            Some(declared)
                if !declared.is_empty()
                    && declared != mime::APPLICATION_OCTET_STREAM.essence_str() =>
            {
                declared.to_string()
            }
            _ => mime_guess::from_path(self.file_name())
                .first_or_octet_stream()
                .to_string(),
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadError {
    #[error("uploaded file has no name")]
    MissingFileName,
    #[error("uploaded file is empty")]
    Empty,
    #[error("file type of '{file_name}' is not allowed (accepted: {allowed})")]
    DisallowedExtension { file_name: String, allowed: String },
    #[error("file is {size} bytes, larger than the {max} byte limit")]
    TooLarge { size: u64, max: u64 },
}
