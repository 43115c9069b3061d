//! Error type shared by the loader, the GPU binder and the viewer registry.

use thiserror::Error;

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, ViewerError>;

/// Everything that can go wrong while building or driving a viewer.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ViewerError {
    /// An OBJ or MTL file could not be fetched, or came back empty.
    #[error("failed to load asset `{url}`: {reason}")]
    AssetLoadFailure {
        /// The URL (or path) that failed.
        url: String,
        /// Human readable cause.
        reason: String,
    },

    /// The canvas could not provide a rendering context.
    #[error("no rendering context available for canvas `{canvas}`")]
    GlContextUnavailable {
        /// Identifier of the canvas.
        canvas: String,
    },

    /// The model has no geometry, so its bounding box is infinite.
    #[error("model `{path}` has no geometry to frame")]
    DegenerateExtents {
        /// Source path of the offending model.
        path: String,
    },

    /// Malformed OBJ or MTL text.
    #[error("parse error at line {line}: {reason}")]
    Parse {
        /// 1-based line number.
        line: usize,
        /// What was wrong with it.
        reason: String,
    },

    /// A catalog index outside of the catalog.
    #[error("no model at catalog index {0}")]
    UnknownModel(usize),

    /// An index outside of the selected-models list.
    #[error("no selected model at index {0}")]
    UnknownSelection(usize),

    /// The viewer was already disposed.
    #[error("viewer instance has been disposed")]
    Disposed,
}

impl ViewerError {
    pub(crate) fn asset(url: impl Into<String>, reason: impl Into<String>) -> Self {
        ViewerError::AssetLoadFailure {
            url: url.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn parse(line: usize, reason: impl Into<String>) -> Self {
        ViewerError::Parse {
            line,
            reason: reason.into(),
        }
    }
}
