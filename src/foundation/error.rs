/// Convenience result type used across fogmask.
pub type FogResult<T> = Result<T, FogError>;

/// Top-level error taxonomy used by engine APIs.
///
/// Out-of-bounds shapes and transition-pool exhaustion are not errors: both degrade silently so the
/// renderer always has a usable mask.
#[derive(thiserror::Error, Debug)]
pub enum FogError {
    /// Invalid user-provided options or data.
    #[error("validation error: {0}")]
    Validation(String),

    /// A mesh or convex footprint lacks the geometry needed to rasterize it.
    #[error("missing footprint geometry: {0}")]
    MissingGeometry(String),

    /// The external texture sink rejected an allocation or upload.
    #[error("upload error: {0}")]
    Upload(String),

    /// Errors when serializing or deserializing options and snapshots.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FogError {
    /// Build a [`FogError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`FogError::MissingGeometry`] value.
    pub fn missing_geometry(msg: impl Into<String>) -> Self {
        Self::MissingGeometry(msg.into())
    }

    /// Build a [`FogError::Upload`] value.
    pub fn upload(msg: impl Into<String>) -> Self {
        Self::Upload(msg.into())
    }

    /// Build a [`FogError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
