use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// An underlying model invocation failed (transport, HTTP status,
    /// or the provider reported a failed task).
    #[error("model call failed: {0}")]
    Model(String),

    /// The text model's response could not be parsed into storyline frames.
    #[error("unparseable storyline response: {0}")]
    Format(String),

    /// Rendered images and narration clips do not line up.
    #[error("image/audio mismatch: {0}")]
    Mismatch(String),

    /// Video muxing or encoding failed.
    #[error("video encoding failed: {0}")]
    Encoding(String),

    /// Working-directory or artifact I/O failed.
    #[error("filesystem error: {0}")]
    Filesystem(String),
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Filesystem(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Model(e.to_string())
    }
}

impl From<hound::Error> for Error {
    fn from(e: hound::Error) -> Self {
        Error::Filesystem(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
