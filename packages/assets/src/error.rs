use thiserror::Error;

pub type AssetResult<T> = Result<T, AssetError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssetError {
    #[error("Asset '{id}' not found")]
    NotFound { id: String },

    #[error("Handle '{handle}' does not refer to a live asset")]
    UnknownHandle { handle: String },

    #[error("Asset '{id}' already exists")]
    DuplicateId { id: String },

    #[error("Invalid asset id '{id}'")]
    InvalidId { id: String },
}

impl AssetError {
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    pub fn unknown_handle(handle: impl Into<String>) -> Self {
        Self::UnknownHandle {
            handle: handle.into(),
        }
    }

    /// Both lookup failures mean "asset absent" to callers
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::UnknownHandle { .. })
    }
}
