use thiserror::Error;

#[derive(Error, Debug)]
pub enum SplitError {
    #[error("Invalid split plan: {0}")]
    InvalidPlan(String),

    #[error("Page {page} is out of range (1-{page_count})")]
    PageOutOfBounds { page: u32, page_count: u32 },

    #[error("Malformed PDF: {0}")]
    MalformedDocument(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Failed to write PDF: {0}")]
    Serialize(String),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SplitError {
    /// Whether the failure stems from the request or document the caller supplied.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            SplitError::InvalidPlan(_)
                | SplitError::PageOutOfBounds { .. }
                | SplitError::MalformedDocument(_)
                | SplitError::InvalidInput(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, SplitError>;
