use async_trait::async_trait;

/// A file received from a multipart form, held in memory
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Where the media host placed an uploaded file
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedMedia {
    pub url: String,
}

#[derive(Debug, thiserror::Error)]
pub enum MediaStorageError {
    #[error("empty file")]
    EmptyFile,
    #[error("upload request failed: {0}")]
    Request(String),
    #[error("media host rejected upload ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("media host response had no URL")]
    MissingUrl,
}

/// Storage for user images. Abstracts the media host (Cloudinary, S3, ...).
#[async_trait]
pub trait MediaStorage: Send + Sync {
    /// Upload a file and return its public URL
    async fn upload(&self, file: UploadFile) -> Result<UploadedMedia, MediaStorageError>;
}
