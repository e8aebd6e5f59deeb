use std::path::PathBuf;

use thiserror::Error;

/// Library error type for cardsmith operations.
#[derive(Debug, Error)]
pub enum Error {
    /// An operation that needs a decoded photo ran before one was loaded.
    #[error("no photo loaded")]
    NoPhoto,

    /// The uploaded file could not be decoded as an image.
    #[error("failed to decode photo {path}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// The file decoded, but to a raster with a zero dimension.
    #[error("photo {path} decoded to an empty raster")]
    EmptyImage { path: PathBuf },

    /// A background decode task was lost before completing.
    #[error("decode task failed")]
    Join(#[from] tokio::task::JoinError),

    /// Underlying IO error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// YAML/serde configuration error.
    #[error(transparent)]
    Config(#[from] serde_yaml::Error),

    /// Card composition failed; any previously generated card is untouched.
    #[error("compose error: {0}")]
    Compose(anyhow::Error),
}
