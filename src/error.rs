//! Error type shared by every init system backend.
//!
//! A failed version probe is deliberately absent here: it never reaches the
//! caller and instead downgrades to [`Version::Unknown`](crate::init::upstart::Version).

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    /// The description asks for something this backend cannot provide.
    #[error("unsupported configuration: {reason}")]
    UnsupportedConfiguration { reason: String },

    /// A service definition is already installed at this path.
    #[error("init already exists: {}", path.display())]
    AlreadyExists { path: PathBuf },

    /// No service definition is installed at this path.
    #[error("init not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// The service definition could not be rendered; nothing was written.
    #[error("cannot render service definition: {message}")]
    Render { message: String },

    /// The init system's control command failed.
    #[error("{command} failed with exit code {code:?}: {output}")]
    ControlCommandFailed {
        command: String,
        code: Option<i32>,
        output: String,
    },

    /// The service description itself is malformed.
    #[error("invalid service description: {message}")]
    Config { message: String },

    /// The cause is reachable through `source()`, not the message.
    #[error("{context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// Error returned by the caller's business logic during `run`.
    #[error(transparent)]
    Program(#[from] anyhow::Error),
}

impl ServiceError {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Short stable label for logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ServiceError::UnsupportedConfiguration { .. } => "unsupported_configuration",
            ServiceError::AlreadyExists { .. } => "already_exists",
            ServiceError::NotFound { .. } => "not_found",
            ServiceError::Render { .. } => "render_failure",
            ServiceError::ControlCommandFailed { .. } => "control_command_failed",
            ServiceError::Config { .. } => "invalid_description",
            ServiceError::Io { .. } => "io",
            ServiceError::Program(_) => "program",
        }
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;
