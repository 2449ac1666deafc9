/// Convenience result type used across the renderer.
pub type ArtResult<T> = Result<T, ArtError>;

/// Top-level error taxonomy for rendering, asset loading and publishing.
#[derive(thiserror::Error, Debug)]
pub enum ArtError {
    /// Missing or malformed render / request parameters. Raised before any drawing.
    #[error("validation error: {0}")]
    Validation(String),

    /// A required image or font could not be read or decoded.
    #[error("asset error: {0}")]
    Asset(String),

    /// A bounded wait (headless page, asset load) expired.
    #[error("timeout error: {0}")]
    Timeout(String),

    /// Upload, on-chain update or notification failure. Never fatal to a reveal.
    #[error("collaborator error: {0}")]
    Collaborator(String),

    /// Surface allocation, drawing or encoding failure.
    #[error("render error: {0}")]
    Render(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ArtError {
    /// Build an [`ArtError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build an [`ArtError::Asset`] value.
    pub fn asset(msg: impl Into<String>) -> Self {
        Self::Asset(msg.into())
    }

    /// Build an [`ArtError::Timeout`] value.
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// Build an [`ArtError::Collaborator`] value.
    pub fn collaborator(msg: impl Into<String>) -> Self {
        Self::Collaborator(msg.into())
    }

    /// Build an [`ArtError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build an [`ArtError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Whether the error must abort the user-visible render.
    ///
    /// Only collaborator failures are non-fatal: they happen after pixels are shown.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Collaborator(_))
    }
}

impl From<serde_json::Error> for ArtError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde(err.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
