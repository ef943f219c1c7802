use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    InvalidArgument(String),

    /// Any argument mentioning help; the caller prints usage and exits cleanly.
    #[error("help requested")]
    HelpRequested,

    #[error("Failed to discover chapters: {0}")]
    ChapterDiscovery(#[source] anyhow::Error),

    /// Empty listing; reported as a chapter discovery failure.
    #[error("No chapters found for manga '{manga}'")]
    NoChapters { manga: String },

    #[error("Can't finish request with {attempts} tries: {url}")]
    ImageFetchExhausted {
        url: String,
        attempts: usize,
        #[source]
        source: anyhow::Error,
    },

    #[error("Image request to {url} failed with status {status}")]
    ImageStatus { url: String, status: u16 },

    #[error("Failed to process image {url}: {source}")]
    Image {
        url: String,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to write {}: {source}", path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
