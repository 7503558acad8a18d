#[derive(Debug, thiserror::Error)]
pub enum TreemapError {
    #[error("invalid data at `{path}`: {reason}")]
    InvalidData { path: String, reason: String },
    #[error("degenerate layout area: {reason}")]
    DegenerateArea { reason: String },
    #[error("failed to fetch `{source_name}`: {reason}")]
    Fetch { source_name: String, reason: String },
    #[error("invalid options: {0}")]
    InvalidOptions(String),
}

impl TreemapError {
    pub(crate) fn invalid(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidData {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn degenerate(reason: impl Into<String>) -> Self {
        Self::DegenerateArea {
            reason: reason.into(),
        }
    }

    pub(crate) fn fetch(source_name: impl Into<String>, reason: impl ToString) -> Self {
        Self::Fetch {
            source_name: source_name.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TreemapError>;
