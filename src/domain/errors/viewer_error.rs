//! External viewer error types.

use thiserror::Error;

/// Failures while handing media to an external program.
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum ExternalViewerError {
    #[error("failed to write temporary media file: {message}")]
    TempFile { message: String },

    #[error("failed to launch viewer '{program}': {message}")]
    Launch { program: String, message: String },
}

impl ExternalViewerError {
    /// Creates a temp file error.
    #[must_use]
    pub fn temp_file(message: impl Into<String>) -> Self {
        Self::TempFile {
            message: message.into(),
        }
    }

    /// Creates a launch error.
    #[must_use]
    pub fn launch(program: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Launch {
            program: program.into(),
            message: message.into(),
        }
    }
}
