use thiserror::Error;

/// Errors reported while writing a mesh to disk.
#[derive(Debug, Error)]
pub enum WriteError {
    /// A required input is missing, such as the output path or the mesh.
    #[error("Error: {0}")]
    Configuration(String),

    /// The format tag is not one of the known writer formats.
    #[error("Error: unsupported format {0}.")]
    UnsupportedFormat(String),

    /// The mesh cannot be expressed in the requested format.
    #[error("Invalid mesh: {0}")]
    InvalidMesh(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A writer backend failed.
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl WriteError {
    pub fn no_output_path() -> Self {
        WriteError::Configuration("no OutputFileName.".to_string())
    }

    pub fn no_mesh() -> Self {
        WriteError::Configuration("no Mesh.".to_string())
    }
}

pub type WriteResult<T> = std::result::Result<T, WriteError>;
